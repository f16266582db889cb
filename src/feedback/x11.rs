//! Feedback popups as small override-redirect windows: no border
//! decoration from the window manager, stacked above everything else.

use std::collections::HashMap;
use std::sync::Arc;

use x11rb::connection::Connection;
use x11rb::protocol::xproto::{
    ConfigureWindowAux, ConnectionExt as _, CreateGCAux, CreateWindowAux, EventMask, Gcontext,
    StackMode, Window, WindowClass,
};
use x11rb::{COPY_DEPTH_FROM_PARENT, COPY_FROM_PARENT};

use super::{FeedbackId, Notifier};
use crate::error::{Error, Result};
use crate::orientation::Orientation;
use crate::x11::XSession;

const WIDTH: u16 = 180;
const HEIGHT: u16 = 90;
const FONTS: [&str; 2] = ["-misc-fixed-bold-r-normal--18-*-*-*-*-*-iso10646-1", "fixed"];

#[derive(Clone, Copy)]
struct Pen {
    gc: Gcontext,
    char_width: i16,
    ascent: i16,
    descent: i16,
}

struct Popup {
    window: Window,
    lines: [Vec<u8>; 2],
}

pub struct XPopupNotifier {
    session: Arc<XSession>,
    pen: Option<Pen>,
    popups: HashMap<FeedbackId, Popup>,
    next_id: FeedbackId,
}

impl XPopupNotifier {
    pub fn new(session: Arc<XSession>) -> Self {
        XPopupNotifier {
            session,
            pen: None,
            popups: HashMap::new(),
            next_id: 0,
        }
    }

    fn pen(&mut self) -> Result<Pen> {
        if let Some(pen) = self.pen {
            return Ok(pen);
        }
        let conn = &self.session.conn;
        let screen = self.session.screen();

        for name in FONTS.iter() {
            let font = conn.generate_id()?;
            if conn.open_font(font, name.as_bytes())?.check().is_err() {
                tracing::debug!("Font {} unavailable", name);
                continue;
            }
            let info = conn.query_font(font)?.reply()?;
            let gc = conn.generate_id()?;
            conn.create_gc(
                gc,
                screen.root,
                &CreateGCAux::new()
                    .foreground(screen.black_pixel)
                    .background(screen.white_pixel)
                    .font(font),
            )?;
            conn.close_font(font)?;

            let pen = Pen {
                gc,
                char_width: info.max_bounds.character_width.max(1),
                ascent: info.font_ascent,
                descent: info.font_descent,
            };
            self.pen = Some(pen);
            return Ok(pen);
        }
        Err(Error::X11("no usable core font".into()))
    }

    fn draw(&self, popup: &Popup, pen: Pen) -> Result<()> {
        let conn = &self.session.conn;
        let line_height = pen.ascent + pen.descent;
        let top = (HEIGHT as i16 - 2 * line_height) / 2;

        for (row, text) in popup.lines.iter().enumerate() {
            let text_width = pen.char_width * text.len() as i16;
            let x = ((WIDTH as i16 - text_width) / 2).max(0);
            let y = top + row as i16 * line_height + pen.ascent;
            conn.image_text8(popup.window, pen.gc, x, y, text)?;
        }
        conn.flush()?;
        Ok(())
    }
}

impl Notifier for XPopupNotifier {
    fn show(&mut self, orientation: Orientation) -> Result<FeedbackId> {
        self.pen()?;
        let conn = &self.session.conn;
        let screen = self.session.screen();

        // The root may have been resized by the rotation that triggered us.
        let root = conn.get_geometry(screen.root)?.reply()?;
        let x = (i32::from(root.width) - i32::from(WIDTH)) / 2;
        let y = (i32::from(root.height) - i32::from(HEIGHT)) / 2;

        let window = conn.generate_id()?;
        conn.create_window(
            COPY_DEPTH_FROM_PARENT,
            window,
            screen.root,
            x.max(0) as i16,
            y.max(0) as i16,
            WIDTH,
            HEIGHT,
            1,
            WindowClass::INPUT_OUTPUT,
            COPY_FROM_PARENT,
            &CreateWindowAux::new()
                .background_pixel(screen.white_pixel)
                .border_pixel(screen.black_pixel)
                .override_redirect(1)
                .event_mask(EventMask::EXPOSURE),
        )?;
        conn.map_window(window)?;
        conn.configure_window(window, &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE))?;
        conn.flush()?;

        let mut angle = orientation.to_degrees().to_string().into_bytes();
        // Latin-1 degree sign.
        angle.push(0xb0);

        self.next_id += 1;
        self.popups.insert(
            self.next_id,
            Popup {
                window,
                lines: [b"Current angle".to_vec(), angle],
            },
        );
        Ok(self.next_id)
    }

    fn close(&mut self, id: FeedbackId) {
        let popup = match self.popups.remove(&id) {
            Some(popup) => popup,
            None => return,
        };
        let conn = &self.session.conn;
        let closed = conn
            .destroy_window(popup.window)
            .and_then(|_| conn.flush());
        if let Err(e) = closed {
            tracing::warn!("Unable to close feedback popup: {}", e);
        }
    }

    fn expose(&mut self, surface: u32) {
        let pen = match self.pen {
            Some(pen) => pen,
            None => return,
        };
        if let Some(popup) = self.popups.values().find(|p| p.window == surface) {
            if let Err(e) = self.draw(popup, pen) {
                tracing::warn!("Unable to draw feedback popup: {}", e);
            }
        }
    }
}

impl Drop for XPopupNotifier {
    fn drop(&mut self) {
        let ids: Vec<FeedbackId> = self.popups.keys().copied().collect();
        for id in ids {
            self.close(id);
        }
        if let Some(pen) = self.pen.take() {
            let _ = self.session.conn.free_gc(pen.gc);
            let _ = self.session.conn.flush();
        }
    }
}
