//! Window capture operation
//!
//! Activates a window, optionally waits for it to redraw, clips it to the
//! desktop and asks the platform to copy the visible pixels. Against live
//! windows almost every step can fail for ordinary reasons, so the operation
//! reports "no image" as `None` and logs why at `debug` level.

use tracing::debug;

use super::ImageBuffer;
use crate::{
    model::{BlitRequest, CaptureArea, CaptureOptions, Point, Rect, WindowHandle},
    platform::WindowSystem,
};

/// Captures a window into a new image
///
/// Returns `None` when the window is gone or invisible, refuses foreground
/// activation, has an empty or unreadable rectangle, lies entirely outside
/// the desktop, or when the pixel copy fails.
///
/// If `options.redraw_delay` is set the calling thread blocks for that long
/// after activation.
///
/// # Examples
///
/// ```
/// use window_snapshot::{
///     capture::capture_window,
///     model::{CaptureOptions, Rect, WindowHandle},
///     platform::{MockWindow, MockWindowSystem},
/// };
///
/// let handle = WindowHandle::from_raw(0x10);
/// let system =
///     MockWindowSystem::new().with_window(MockWindow::new(handle, Rect::new(0, 0, 320, 240)));
///
/// let image = capture_window(&system, handle, &CaptureOptions::default()).unwrap();
/// assert_eq!(image.dimensions(), (320, 240));
/// ```
pub fn capture_window(
    system: &dyn WindowSystem,
    handle: WindowHandle,
    options: &CaptureOptions,
) -> Option<ImageBuffer> {
    if handle.is_null() || !system.is_window(handle) {
        debug!("No image: window {} does not exist", handle);
        return None;
    }
    if !system.is_window_visible(handle) {
        debug!("No image: window {} is not visible", handle);
        return None;
    }

    if system.is_minimized(handle) {
        debug!("Showing minimized window {} with {}", handle, options.show_style);
        system.show_window(handle, options.show_style);
    }

    if !system.set_foreground(handle) {
        debug!("No image: window {} refused foreground activation", handle);
        return None;
    }

    if let Some(delay) = options.redraw_delay {
        debug!("Waiting {:?} for window {} to redraw", delay, handle);
        std::thread::sleep(delay);
    }

    let rect = capture_rect(system, handle, options.area)?;

    let Some(desktop) = system.desktop_rect() else {
        debug!("No image: desktop bounds unavailable");
        return None;
    };
    let Some(visible) = rect.intersect(&desktop) else {
        debug!("No image: window {} at {} lies outside the desktop", handle, rect);
        return None;
    };

    let request = BlitRequest {
        area:   options.area,
        // Offset of the visible part within the window's own surface
        source: Point::new(
            visible.left.saturating_sub(rect.left),
            visible.top.saturating_sub(rect.top),
        ),
        width:  visible.width(),
        height: visible.height(),
    };

    let image = system.blit(handle, &request);
    if image.is_none() {
        debug!("No image: pixel copy from window {} failed", handle);
    }
    image
}

/// Screen rectangle of the requested capture area
fn capture_rect(
    system: &dyn WindowSystem,
    handle: WindowHandle,
    area: CaptureArea,
) -> Option<Rect> {
    let rect = match area {
        CaptureArea::Window => system.window_rect(handle),
        CaptureArea::Client => system.client_rect(handle),
    };

    let Some(rect) = rect.filter(|r| r.width() > 0 && r.height() > 0) else {
        debug!("No image: window {} has an empty {:?} rectangle", handle, area);
        return None;
    };

    match area {
        CaptureArea::Window => Some(rect),
        CaptureArea::Client => {
            let top_left = system.client_to_screen(handle, Point::new(rect.left, rect.top));
            let bottom_right = system.client_to_screen(handle, Point::new(rect.right, rect.bottom));
            match (top_left, bottom_right) {
                (Some(tl), Some(br)) => Some(Rect::new(tl.x, tl.y, br.x, br.y)),
                _ => {
                    debug!("No image: client corners of window {} not convertible", handle);
                    None
                }
            }
        }
    }
}
