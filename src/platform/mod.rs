//! Window system abstraction
//!
//! The resolver and the capture operation never call the OS directly. They
//! go through [`WindowSystem`], a thin, synchronous view of the window
//! manager: geometry, visibility, activation, thread-window enumeration,
//! process listing and the device-context blit.
//!
//! # Implementations
//!
//! | Implementation | Platform | Notes |
//! |----------------|----------|-------|
//! | [`Win32WindowSystem`] | Windows | `user32`/`gdi32`/ToolHelp via `windows-sys` |
//! | [`MockWindowSystem`] | all | Scriptable in-memory desktop for tests |
//!
//! Use [`default_window_system()`] to get the implementation for the
//! current platform.

use std::sync::Arc;

use crate::{
    capture::ImageBuffer,
    error::SnapshotResult,
    model::{BlitRequest, Point, ProcessInfo, Rect, ShowStyle, WindowHandle},
};

pub mod mock;

#[cfg(target_os = "windows")]
pub mod windows;

pub use mock::{MockWindow, MockWindowSystem};
#[cfg(target_os = "windows")]
pub use windows::Win32WindowSystem;

/// Synchronous primitives over the OS window manager
///
/// Every query tolerates handles that have gone stale: failures are reported
/// as `false`, `None` or an empty collection rather than as errors, because
/// any window can close between two calls.
///
/// Implementations must be thread-safe (`Send + Sync`), but callers drive
/// them from a single thread; there is no internal scheduling.
pub trait WindowSystem: Send + Sync {
    /// Bounds of the desktop window (the full virtual screen)
    fn desktop_rect(&self) -> Option<Rect>;

    /// Whether the handle still names an existing window
    fn is_window(&self, handle: WindowHandle) -> bool;

    /// Whether the window has the visible style
    fn is_window_visible(&self, handle: WindowHandle) -> bool;

    /// Whether the window is minimized (iconic)
    fn is_minimized(&self, handle: WindowHandle) -> bool;

    /// Window bounds in screen coordinates, including non-client chrome
    fn window_rect(&self, handle: WindowHandle) -> Option<Rect>;

    /// Client-area bounds in client coordinates (origin at 0,0)
    fn client_rect(&self, handle: WindowHandle) -> Option<Rect>;

    /// Converts a client-area point to screen coordinates
    fn client_to_screen(&self, handle: WindowHandle, point: Point) -> Option<Point>;

    /// Every window owned by the given thread, in enumeration order
    fn thread_windows(&self, thread_id: u32) -> Vec<WindowHandle>;

    /// Changes the window's show state
    fn show_window(&self, handle: WindowHandle, style: ShowStyle);

    /// Brings the window to the foreground; false if activation was refused
    fn set_foreground(&self, handle: WindowHandle) -> bool;

    /// Window that currently has the foreground, NULL if none
    fn foreground_window(&self) -> WindowHandle;

    /// Window title, empty if unavailable
    fn window_text(&self, handle: WindowHandle) -> String;

    /// Window class name, empty if unavailable
    fn class_name(&self, handle: WindowHandle) -> String;

    /// Snapshot of the running processes
    fn processes(&self) -> SnapshotResult<Vec<ProcessInfo>>;

    /// Copies pixels from the window's device context into a new image
    ///
    /// Uses the client-area context or the full-window context depending on
    /// `request.area`. All native resources acquired for the copy are
    /// released before returning, on success and on failure alike.
    fn blit(&self, handle: WindowHandle, request: &BlitRequest) -> Option<ImageBuffer>;
}

/// Creates the window system for the current platform
///
/// - **Windows**: [`Win32WindowSystem`]
/// - **Other platforms**: `BackendNotAvailable`; there is no equivalent
///   windowing model to resolve or capture against
pub fn default_window_system() -> SnapshotResult<Arc<dyn WindowSystem>> {
    #[cfg(target_os = "windows")]
    {
        Ok(Arc::new(Win32WindowSystem::new()))
    }

    #[cfg(not(target_os = "windows"))]
    {
        Err(crate::error::SnapshotError::BackendNotAvailable {
            platform: std::env::consts::OS.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(target_os = "windows"))]
    #[test]
    fn test_default_window_system_unavailable() {
        let result = default_window_system();
        assert!(matches!(
            result,
            Err(crate::error::SnapshotError::BackendNotAvailable { .. })
        ));
    }

    #[cfg(target_os = "windows")]
    #[test]
    fn test_default_window_system_available() {
        assert!(default_window_system().is_ok());
    }

    #[test]
    fn test_trait_object_from_mock() {
        let system: Arc<dyn WindowSystem> = Arc::new(MockWindowSystem::new());
        assert!(!system.is_window(WindowHandle::NULL));
    }
}
