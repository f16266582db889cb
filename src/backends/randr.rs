//! RandR backend.
//!
//! Displays are the connected outputs currently driven by a CRTC, in the
//! server's output order. RandR counts rotations counter-clockwise, so a
//! clockwise quarter turn is `ROTATE_270`.
//!
//! Rotating a CRTC onto the other axis changes its footprint, and the
//! framebuffer has to hold every CRTC at all times. It is grown before the
//! CRTC changes and shrunk to fit afterwards.

use std::sync::Arc;

use x11rb::connection::Connection;
use x11rb::protocol::randr::{
    self, ConnectionExt as _, Crtc, GetScreenResourcesCurrentReply, Rotation, SetConfig,
};
use x11rb::protocol::xproto::ConnectionExt as _;
use x11rb::CURRENT_TIME;

use super::{DeviceId, DisplayApi, DisplayMode};
use crate::error::{Error, Result};
use crate::orientation::Orientation;
use crate::x11::XSession;

const ROTATION_BITS: u16 = 0x0f;
const REFLECTION_BITS: u16 = 0x10 | 0x20;

fn to_randr(orientation: Orientation) -> u16 {
    let rotation = match orientation {
        Orientation::Normal => Rotation::ROTATE0,
        Orientation::RightUp => Rotation::ROTATE270,
        Orientation::Flipped => Rotation::ROTATE180,
        Orientation::LeftUp => Rotation::ROTATE90,
    };
    u16::from(rotation)
}

fn from_randr(rotation: u16) -> Option<Orientation> {
    Orientation::ALL
        .iter()
        .copied()
        .find(|o| to_randr(*o) == rotation & ROTATION_BITS)
}

fn as_query_error(e: Error) -> Error {
    match e {
        Error::X11(message) => Error::QueryFailed(message),
        other => other,
    }
}

fn as_apply_error(e: Error) -> Error {
    match e {
        Error::X11(message) => Error::ApplyFailed(message),
        other => other,
    }
}

/// Position and size of one enabled CRTC.
#[derive(Clone, Copy)]
struct Footprint {
    x: i32,
    y: i32,
    width: u32,
    height: u32,
}

pub struct RandrBackend {
    session: Arc<XSession>,
}

impl RandrBackend {
    pub fn new(session: Arc<XSession>) -> Result<Self> {
        let version = session.conn.randr_query_version(1, 3)?.reply()?;
        if (version.major_version, version.minor_version) < (1, 3) {
            return Err(Error::X11(format!(
                "RandR 1.3 required, server has {}.{}",
                version.major_version, version.minor_version
            )));
        }
        Ok(RandrBackend { session })
    }

    fn resources(&self) -> Result<GetScreenResourcesCurrentReply> {
        Ok(self
            .session
            .conn
            .randr_get_screen_resources_current(self.session.root())?
            .reply()?)
    }

    /// Connected outputs with a CRTC, paired with that CRTC.
    fn active_outputs(&self, res: &GetScreenResourcesCurrentReply) -> Result<Vec<(DeviceId, Crtc)>> {
        let conn = &self.session.conn;
        let mut active = Vec::new();
        for output in &res.outputs {
            let info = conn
                .randr_get_output_info(*output, res.config_timestamp)?
                .reply()?;
            if info.connection != randr::Connection::CONNECTED || info.crtc == 0 {
                continue;
            }
            let name = String::from_utf8_lossy(&info.name).into_owned();
            active.push((DeviceId(name), info.crtc));
        }
        Ok(active)
    }

    fn crtc_of(&self, res: &GetScreenResourcesCurrentReply, device: &DeviceId) -> Result<Crtc> {
        self.active_outputs(res)?
            .into_iter()
            .find(|(id, _)| id == device)
            .map(|(_, crtc)| crtc)
            .ok_or_else(|| Error::X11(format!("{}: not connected", device)))
    }

    fn read_mode(&self, device: &DeviceId) -> Result<DisplayMode> {
        let res = self.resources()?;
        let crtc = self.crtc_of(&res, device)?;
        let info = self
            .session
            .conn
            .randr_get_crtc_info(crtc, res.config_timestamp)?
            .reply()?;
        let orientation = from_randr(u16::from(info.rotation)).ok_or_else(|| {
            Error::X11(format!("{}: unknown rotation {:#x}", device, u16::from(info.rotation)))
        })?;
        Ok(DisplayMode {
            device: device.clone(),
            orientation,
            width: u32::from(info.width),
            height: u32::from(info.height),
        })
    }

    /// Framebuffer size needed once `target` occupies `footprint`.
    fn framebuffer_for(
        &self,
        res: &GetScreenResourcesCurrentReply,
        target: Crtc,
        footprint: &Footprint,
    ) -> Result<(u32, u32)> {
        let conn = &self.session.conn;
        let (mut width, mut height) = (0u32, 0u32);
        for crtc in &res.crtcs {
            let fp = if *crtc == target {
                *footprint
            } else {
                let info = conn.randr_get_crtc_info(*crtc, res.config_timestamp)?.reply()?;
                if info.mode == 0 {
                    continue;
                }
                Footprint {
                    x: i32::from(info.x),
                    y: i32::from(info.y),
                    width: u32::from(info.width),
                    height: u32::from(info.height),
                }
            };
            width = width.max(fp.x.max(0) as u32 + fp.width);
            height = height.max(fp.y.max(0) as u32 + fp.height);
        }
        Ok((width, height))
    }

    fn set_screen_size(&self, width: u32, height: u32) -> Result<()> {
        let screen = self.session.screen();
        // Keep the DPI the server started with.
        let mm = |px: u32, ref_px: u16, ref_mm: u16| {
            u32::from(ref_mm) * px / u32::from(ref_px.max(1))
        };
        self.session
            .conn
            .randr_set_screen_size(
                screen.root,
                width as u16,
                height as u16,
                mm(width, screen.width_in_pixels, screen.width_in_millimeters),
                mm(height, screen.height_in_pixels, screen.height_in_millimeters),
            )?
            .check()?;
        Ok(())
    }

    fn write_mode(&self, mode: &DisplayMode) -> Result<()> {
        let conn = &self.session.conn;
        let res = self.resources()?;
        let crtc = self.crtc_of(&res, &mode.device)?;
        let info = conn.randr_get_crtc_info(crtc, res.config_timestamp)?.reply()?;

        let rotation = to_randr(mode.orientation);
        if u16::from(info.rotations) & rotation == 0 {
            return Err(Error::ApplyFailed(format!(
                "{} does not support {}",
                mode.device, mode.orientation
            )));
        }
        let rotation = rotation | (u16::from(info.rotation) & REFLECTION_BITS);

        let footprint = Footprint {
            x: i32::from(info.x),
            y: i32::from(info.y),
            width: mode.width,
            height: mode.height,
        };
        let (fb_width, fb_height) = self.framebuffer_for(&res, crtc, &footprint)?;
        let range = conn.randr_get_screen_size_range(self.session.root())?.reply()?;
        if fb_width > u32::from(range.max_width) || fb_height > u32::from(range.max_height) {
            return Err(Error::ApplyFailed(format!(
                "{}x{} framebuffer exceeds the server maximum {}x{}",
                fb_width, fb_height, range.max_width, range.max_height
            )));
        }
        let fb_width = fb_width.max(u32::from(range.min_width));
        let fb_height = fb_height.max(u32::from(range.min_height));

        let geometry = conn.get_geometry(self.session.root())?.reply()?;
        let current = (u32::from(geometry.width), u32::from(geometry.height));
        let grown = (current.0.max(fb_width), current.1.max(fb_height));
        if grown != current {
            self.set_screen_size(grown.0, grown.1)?;
        }

        let status = conn
            .randr_set_crtc_config(
                crtc,
                CURRENT_TIME,
                res.config_timestamp,
                info.x,
                info.y,
                info.mode,
                Rotation::from(rotation),
                &info.outputs,
            )?
            .reply()
            .map(|reply| reply.status);
        if status.as_ref().ok() != Some(&SetConfig::SUCCESS) {
            if grown != current {
                if let Err(e) = self.set_screen_size(current.0, current.1) {
                    tracing::warn!("Unable to restore framebuffer size: {}", e);
                }
            }
            return Err(Error::ApplyFailed(format!(
                "{}: server refused {} ({:?})",
                mode.device, mode.orientation, status
            )));
        }

        if grown != (fb_width, fb_height) {
            if let Err(e) = self.set_screen_size(fb_width, fb_height) {
                tracing::warn!("Unable to shrink framebuffer to {}x{}: {}", fb_width, fb_height, e);
            }
        }
        conn.flush()?;
        Ok(())
    }
}

impl DisplayApi for RandrBackend {
    fn displays(&mut self) -> Result<Vec<DeviceId>> {
        let res = self.resources().map_err(as_query_error)?;
        let outputs = self.active_outputs(&res).map_err(as_query_error)?;
        Ok(outputs.into_iter().map(|(id, _)| id).collect())
    }

    fn current_mode(&mut self, device: &DeviceId) -> Result<DisplayMode> {
        self.read_mode(device).map_err(as_query_error)
    }

    fn apply_mode(&mut self, mode: &DisplayMode, persist: bool) -> Result<()> {
        self.write_mode(mode).map_err(as_apply_error)?;
        if persist {
            // The X server keeps no display settings across restarts.
            tracing::debug!("{}: mode applied for this X session only", mode.device);
        }
        tracing::info!(
            "{} rotated to {} ({}x{})",
            mode.device,
            mode.orientation,
            mode.width,
            mode.height
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clockwise_maps_to_counter_clockwise_bits() {
        assert_eq!(to_randr(Orientation::Normal), 0x01);
        assert_eq!(to_randr(Orientation::RightUp), 0x08);
        assert_eq!(to_randr(Orientation::Flipped), 0x04);
        assert_eq!(to_randr(Orientation::LeftUp), 0x02);
    }

    #[test]
    fn reads_rotation_ignoring_reflection() {
        for orientation in Orientation::ALL.iter().copied() {
            assert_eq!(from_randr(to_randr(orientation)), Some(orientation));
            assert_eq!(
                from_randr(to_randr(orientation) | REFLECTION_BITS),
                Some(orientation)
            );
        }
        assert_eq!(from_randr(0), None);
    }

    #[test]
    fn transport_errors_become_query_or_apply_failures() {
        assert!(matches!(
            as_query_error(Error::X11("gone".into())),
            Error::QueryFailed(_)
        ));
        assert!(matches!(
            as_apply_error(Error::X11("gone".into())),
            Error::ApplyFailed(_)
        ));
        assert!(matches!(
            as_apply_error(Error::ApplyFailed("no".into())),
            Error::ApplyFailed(_)
        ));
    }
}
