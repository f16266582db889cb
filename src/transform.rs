//! Orientation transform.
//!
//! Pixel dimensions follow the rotation axis, not the absolute angle:
//! turning from 90 to 270 degrees keeps the already swapped resolution,
//! while 0 to 90 or 90 to 180 swaps it.

use crate::backends::{DisplayApi, DisplayMode};
use crate::error::{Error, Result};
use crate::orientation::Orientation;

/// The mode `current` becomes once turned to `target`.
pub fn transformed(current: &DisplayMode, target: Orientation) -> DisplayMode {
    let mut next = current.clone();
    if current.orientation.axis() != target.axis() {
        std::mem::swap(&mut next.width, &mut next.height);
    }
    next.orientation = target;
    next
}

/// Rotate the display at `display_index` to `target`.
///
/// The current mode is always read first so the resolution baseline comes
/// from the display server. Nothing is retried; on error the display keeps
/// the mode it had.
pub fn apply(
    api: &mut dyn DisplayApi,
    display_index: usize,
    target: Orientation,
) -> Result<DisplayMode> {
    let displays = api.displays()?;
    let device = displays
        .get(display_index)
        .ok_or(Error::InvalidDisplayIndex {
            index: display_index,
            count: displays.len(),
        })?;

    let current = api.current_mode(device)?;
    let next = transformed(&current, target);
    tracing::debug!(
        "{}: {} {}x{} -> {} {}x{}",
        device,
        current.orientation,
        current.width,
        current.height,
        next.orientation,
        next.width,
        next.height
    );

    api.apply_mode(&next, true)?;
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::dummy::DummyBackend;
    use crate::backends::DeviceId;
    use crate::orientation::Axis;

    fn mode(orientation: Orientation, width: u32, height: u32) -> DisplayMode {
        DisplayMode {
            device: DeviceId("DUMMY-0".into()),
            orientation,
            width,
            height,
        }
    }

    #[test]
    fn swaps_iff_axis_changes() -> Result<()> {
        for current in Orientation::ALL.iter().copied() {
            for target in Orientation::ALL.iter().copied() {
                let before = mode(current, 1920, 1080);
                let after = transformed(&before, target);
                let swapped = (after.width, after.height) == (1080, 1920);

                assert_eq!(
                    swapped,
                    current.axis() != target.axis(),
                    "{} -> {}",
                    current,
                    target
                );
                assert_eq!(after.orientation, target);
                assert_eq!(after.device, before.device);
            }
        }
        Ok(())
    }

    #[test]
    fn worked_examples() -> Result<()> {
        let landscape = mode(Orientation::Normal, 1920, 1080);
        assert_eq!(
            transformed(&landscape, Orientation::RightUp),
            mode(Orientation::RightUp, 1080, 1920)
        );
        assert_eq!(
            transformed(&landscape, Orientation::Flipped),
            mode(Orientation::Flipped, 1920, 1080)
        );

        let portrait = mode(Orientation::RightUp, 1080, 1920);
        assert_eq!(
            transformed(&portrait, Orientation::LeftUp),
            mode(Orientation::LeftUp, 1080, 1920)
        );
        assert_eq!(
            transformed(&portrait, Orientation::Flipped),
            mode(Orientation::Flipped, 1920, 1080)
        );
        Ok(())
    }

    #[test]
    fn applies_through_backend() -> Result<()> {
        let backend = DummyBackend::single_1080p();
        let mut api = backend.clone();

        let applied = apply(&mut api, 0, Orientation::LeftUp)?;
        assert_eq!(applied.orientation.axis(), Axis::Swapped);
        assert_eq!(backend.mode(0), Some(applied));
        Ok(())
    }

    #[test]
    fn invalid_index_does_not_touch_displays() -> Result<()> {
        let backend = DummyBackend::single_1080p();
        backend.add_display("DUMMY-1", 2560, 1440, Orientation::Normal);
        let mut api = backend.clone();

        match apply(&mut api, 5, Orientation::RightUp) {
            Err(Error::InvalidDisplayIndex { index: 5, count: 2 }) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(backend.applied().is_empty());
        Ok(())
    }

    #[test]
    fn query_failure_is_reported() -> Result<()> {
        let backend = DummyBackend::single_1080p();
        backend.fail_queries(true);
        let mut api = backend.clone();

        assert!(matches!(
            apply(&mut api, 0, Orientation::RightUp),
            Err(Error::QueryFailed(_))
        ));
        assert!(backend.applied().is_empty());
        Ok(())
    }

    #[test]
    fn rejected_mode_keeps_previous_one() -> Result<()> {
        let backend = DummyBackend::single_1080p();
        backend.reject(0, Orientation::Flipped);
        let mut api = backend.clone();

        assert!(matches!(
            apply(&mut api, 0, Orientation::Flipped),
            Err(Error::ApplyFailed(_))
        ));
        assert_eq!(
            backend.mode(0),
            Some(mode(Orientation::Normal, 1920, 1080))
        );
        Ok(())
    }
}
