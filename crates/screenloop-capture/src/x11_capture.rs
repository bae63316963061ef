//! X11 screen capture using the MIT-SHM extension

use crate::CaptureSource;
use screenloop_core::frame::BYTES_PER_PIXEL;
use screenloop_core::{Error, Frame, Region, Result};
use std::ptr;
use tracing::{debug, info};

/// Captures the root window (or a sub-rectangle of it) over MIT-SHM
///
/// One shared memory segment sized for the full display is attached at
/// construction; every capture is served from it, so grabbing a small region
/// and grabbing the whole display cost the same setup.
pub struct X11Capture {
    conn: xcb::Connection,
    root: xcb::x::Window,
    shm_seg: xcb::shm::Seg,
    shm_id: i32,
    shm_addr: *mut libc::c_void,
    display_width: u16,
    display_height: u16,
    sequence: u64,
}

// Safety: X11 connection and SHM are managed properly
unsafe impl Send for X11Capture {}

impl X11Capture {
    /// Connect to the X server and attach a display-sized SHM segment
    pub fn new() -> Result<Self> {
        let (conn, screen_num) = xcb::Connection::connect(None)
            .map_err(|e| Error::X11Connection(e.to_string()))?;

        let shm_cookie = conn.send_request(&xcb::shm::QueryVersion {});
        conn.wait_for_reply(shm_cookie)
            .map_err(|_| Error::X11ExtensionMissing("MIT-SHM".to_string()))?;

        info!("MIT-SHM extension available");

        let setup = conn.get_setup();
        let screen = setup
            .roots()
            .nth(screen_num as usize)
            .ok_or_else(|| Error::X11Connection("Invalid screen".to_string()))?;
        let root = screen.root();
        let display_width = screen.width_in_pixels();
        let display_height = screen.height_in_pixels();

        // Segment sized for the full root window; sub-regions reuse it
        let buffer_size =
            display_width as usize * display_height as usize * BYTES_PER_PIXEL;

        let shm_id = unsafe {
            libc::shmget(libc::IPC_PRIVATE, buffer_size, libc::IPC_CREAT | 0o777)
        };

        if shm_id < 0 {
            return Err(Error::CaptureError(format!(
                "shmget failed: {}",
                std::io::Error::last_os_error()
            )));
        }

        let shm_addr = unsafe { libc::shmat(shm_id, ptr::null(), 0) };
        if shm_addr == libc::MAP_FAILED {
            unsafe { libc::shmctl(shm_id, libc::IPC_RMID, ptr::null_mut()) };
            return Err(Error::CaptureError(format!(
                "shmat failed: {}",
                std::io::Error::last_os_error()
            )));
        }

        let shm_seg: xcb::shm::Seg = conn.generate_id();

        conn.send_request(&xcb::shm::Attach {
            shmseg: shm_seg,
            shmid: shm_id as u32,
            read_only: false,
        });

        conn.flush()
            .map_err(|e| Error::X11Connection(e.to_string()))?;

        debug!(
            "X11 capture initialized for a {}x{} display",
            display_width, display_height
        );

        Ok(Self {
            conn,
            root,
            shm_seg,
            shm_id,
            shm_addr,
            display_width,
            display_height,
            sequence: 0,
        })
    }

    /// Full display dimensions in pixels
    pub fn display_size(&self) -> (u32, u32) {
        (self.display_width as u32, self.display_height as u32)
    }

    /// Resolve the requested region against the display bounds
    fn capture_rect(&self, region: Option<&Region>) -> Result<(i16, i16, u16, u16)> {
        let Some(region) = region else {
            return Ok((0, 0, self.display_width, self.display_height));
        };

        region.validate()?;
        if region.right > self.display_width as i32
            || region.bottom > self.display_height as i32
        {
            return Err(Error::InvalidRegion(format!(
                "({}, {}, {}, {}) exceeds the {}x{} display",
                region.left,
                region.top,
                region.right,
                region.bottom,
                self.display_width,
                self.display_height
            )));
        }

        Ok((
            region.left as i16,
            region.top as i16,
            region.width() as u16,
            region.height() as u16,
        ))
    }
}

impl CaptureSource for X11Capture {
    fn capture(&mut self, region: Option<&Region>) -> Result<Frame> {
        let (x, y, width, height) = self.capture_rect(region)?;

        let cookie = self.conn.send_request(&xcb::shm::GetImage {
            drawable: xcb::x::Drawable::Window(self.root),
            x,
            y,
            width,
            height,
            plane_mask: !0,
            format: xcb::x::ImageFormat::ZPixmap as u8,
            shmseg: self.shm_seg,
            offset: 0,
        });

        self.conn
            .wait_for_reply(cookie)
            .map_err(|e| Error::CaptureError(format!("GetImage failed: {:?}", e)))?;

        let buffer_size = width as usize * height as usize * BYTES_PER_PIXEL;
        let data = unsafe {
            std::slice::from_raw_parts(self.shm_addr as *const u8, buffer_size).to_vec()
        };

        self.sequence += 1;

        Ok(Frame::new(data, width as u32, height as u32, self.sequence))
    }
}

impl Drop for X11Capture {
    fn drop(&mut self) {
        self.conn.send_request(&xcb::shm::Detach {
            shmseg: self.shm_seg,
        });
        let _ = self.conn.flush();

        unsafe {
            libc::shmdt(self.shm_addr);
            libc::shmctl(self.shm_id, libc::IPC_RMID, ptr::null_mut());
        }

        debug!("X11 capture resources cleaned up");
    }
}
