//! Mock window system for testing
//!
//! `MockWindowSystem` implements [`WindowSystem`] over a scripted, in-memory
//! desktop. It needs no real window manager, so the resolver heuristics and
//! the capture sequence can be exercised on any platform.
//!
//! # Features
//!
//! - **Scripted windows:** geometry, visibility, minimized state and whether
//!   foreground activation is accepted, per window
//! - **Thread windows:** explicit thread → window lists, in enumeration order
//! - **Process snapshots:** a fixed process list, or an injected failure
//! - **Call recording:** counts enumerations and records activation,
//!   show-window and blit requests for assertions
//! - **Live mutation:** windows can be moved or closed between calls to
//!   simulate a changing desktop
//!
//! # Examples
//!
//! ```
//! use window_snapshot::{
//!     capture::resolve,
//!     model::{ProcessInfo, Rect, WindowHandle},
//!     platform::{MockWindow, MockWindowSystem},
//! };
//!
//! let main = WindowHandle::from_raw(0x100);
//! let system = MockWindowSystem::new()
//!     .with_window(MockWindow::new(main, Rect::new(10, 10, 810, 610)).with_title("Editor"));
//!
//! let app = resolve(&system, &ProcessInfo::new(1, "editor.exe", main)).unwrap();
//! assert_eq!(app.handle, main);
//! assert_eq!(app.title, "Editor");
//! ```

use std::collections::HashMap;

use parking_lot::Mutex;

use super::WindowSystem;
use crate::{
    capture::ImageBuffer,
    error::{SnapshotError, SnapshotResult},
    model::{BlitRequest, Point, ProcessInfo, Rect, ShowStyle, WindowHandle},
};

/// Default desktop used by [`MockWindowSystem::new`]
const DEFAULT_DESKTOP: Rect = Rect::new(0, 0, 1920, 1080);

/// A scripted window on the mock desktop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockWindow {
    pub handle:             WindowHandle,
    pub title:              String,
    pub class:              String,
    /// Window bounds in screen coordinates
    pub rect:               Rect,
    /// Client-area bounds in client coordinates
    pub client_rect:        Rect,
    /// Screen position of the client area's origin
    pub client_origin:      Point,
    pub visible:            bool,
    pub minimized:          bool,
    pub accepts_foreground: bool,
}

impl MockWindow {
    /// Creates a visible, activatable window whose client area covers the
    /// whole window
    pub fn new(handle: WindowHandle, rect: Rect) -> Self {
        Self {
            handle,
            title: String::new(),
            class: "MockWindowClass".to_string(),
            rect,
            client_rect: Rect::new(0, 0, rect.width(), rect.height()),
            client_origin: Point::new(rect.left, rect.top),
            visible: true,
            minimized: false,
            accepts_foreground: true,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = class.into();
        self
    }

    /// Places the client area at the given screen rectangle
    pub fn with_client_area(mut self, screen: Rect) -> Self {
        self.client_rect = Rect::new(0, 0, screen.width(), screen.height());
        self.client_origin = Point::new(screen.left, screen.top);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn minimized(mut self) -> Self {
        self.minimized = true;
        self
    }

    /// Makes `set_foreground` fail, as when another process holds the
    /// foreground lock
    pub fn refusing_foreground(mut self) -> Self {
        self.accepts_foreground = false;
        self
    }
}

/// Calls recorded by the mock for test assertions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockCalls {
    /// Number of `thread_windows` calls
    pub thread_enumerations: usize,
    /// `show_window` calls in order
    pub show_window:         Vec<(WindowHandle, ShowStyle)>,
    /// `set_foreground` calls in order
    pub foreground:          Vec<WindowHandle>,
    /// `blit` calls in order
    pub blits:               Vec<(WindowHandle, BlitRequest)>,
}

#[derive(Debug, Default)]
struct MockState {
    desktop:        Option<Rect>,
    windows:        Vec<MockWindow>,
    thread_windows: HashMap<u32, Vec<WindowHandle>>,
    processes:      Vec<ProcessInfo>,
    process_error:  Option<String>,
    fail_blit:      bool,
    foreground:     WindowHandle,
    calls:          MockCalls,
}

impl MockState {
    fn window(&self, handle: WindowHandle) -> Option<&MockWindow> {
        self.windows.iter().find(|w| w.handle == handle)
    }

    fn window_mut(&mut self, handle: WindowHandle) -> Option<&mut MockWindow> {
        self.windows.iter_mut().find(|w| w.handle == handle)
    }
}

/// Mock window system for tests and the CLI's `--mock` mode
///
/// # Thread Safety
///
/// State lives behind a `parking_lot::Mutex`, so the mock can record calls
/// through `&self` and be shared with `Arc`.
#[derive(Debug)]
pub struct MockWindowSystem {
    state: Mutex<MockState>,
}

impl MockWindowSystem {
    /// Creates an empty 1920x1080 desktop
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                desktop: Some(DEFAULT_DESKTOP),
                ..MockState::default()
            }),
        }
    }

    /// Creates a small desktop with a few typical processes
    ///
    /// - `notepad.exe` (pid 1000): ordinary visible main window
    /// - `launcher.exe` (pid 2000): zero-sized dummy main window; the real
    ///   window is owned by one of its threads
    /// - `tray.exe` (pid 3000): main window parked off-screen
    /// - `service.exe` (pid 4000): no window at all
    pub fn with_sample_desktop() -> Self {
        let notepad = WindowHandle::from_raw(0x1001);
        let launcher_dummy = WindowHandle::from_raw(0x2001);
        let launcher_splash = WindowHandle::from_raw(0x2002);
        let launcher_real = WindowHandle::from_raw(0x2003);
        let tray = WindowHandle::from_raw(0x3001);

        Self::new()
            .with_window(
                MockWindow::new(notepad, Rect::new(100, 100, 900, 700))
                    .with_title("Untitled - Notepad")
                    .with_class("Notepad")
                    .with_client_area(Rect::new(108, 131, 892, 692)),
            )
            .with_window(
                MockWindow::new(launcher_dummy, Rect::new(0, 0, 0, 0))
                    .with_class("LauncherHost"),
            )
            .with_window(
                MockWindow::new(launcher_splash, Rect::new(860, 440, 1060, 640))
                    .with_title("Loading…")
                    .with_class("LauncherSplash"),
            )
            .with_window(
                MockWindow::new(launcher_real, Rect::new(200, 80, 1400, 900))
                    .with_title("Game Launcher")
                    .with_class("LauncherMain"),
            )
            .with_window(
                MockWindow::new(tray, Rect::new(-32000, -32000, -31840, -31973))
                    .with_title("Tray Helper")
                    .with_class("TrayWnd"),
            )
            .with_thread_windows(2100, [launcher_dummy, launcher_splash])
            .with_thread_windows(2101, [launcher_real])
            .with_process(ProcessInfo::new(1000, "notepad.exe", notepad).with_threads([1100]))
            .with_process(
                ProcessInfo::new(2000, "launcher.exe", launcher_dummy).with_threads([2100, 2101]),
            )
            .with_process(ProcessInfo::new(3000, "tray.exe", tray).with_threads([3100]))
            .with_process(ProcessInfo::new(4000, "service.exe", WindowHandle::NULL))
    }

    /// Replaces the desktop bounds
    pub fn with_desktop(self, desktop: Rect) -> Self {
        self.state.lock().desktop = Some(desktop);
        self
    }

    /// Makes `desktop_rect` fail
    pub fn without_desktop(self) -> Self {
        self.state.lock().desktop = None;
        self
    }

    /// Adds a window to the desktop
    pub fn with_window(self, window: MockWindow) -> Self {
        self.state.lock().windows.push(window);
        self
    }

    /// Assigns windows to a thread, in enumeration order
    pub fn with_thread_windows(
        self,
        thread_id: u32,
        handles: impl IntoIterator<Item = WindowHandle>,
    ) -> Self {
        self.state
            .lock()
            .thread_windows
            .entry(thread_id)
            .or_default()
            .extend(handles);
        self
    }

    /// Adds a process to the snapshot returned by `processes`
    pub fn with_process(self, process: ProcessInfo) -> Self {
        self.state.lock().processes.push(process);
        self
    }

    /// Makes `processes` fail with the given reason
    pub fn with_process_error(self, reason: impl Into<String>) -> Self {
        self.state.lock().process_error = Some(reason.into());
        self
    }

    /// Sets the window that initially has the foreground
    pub fn with_foreground(self, handle: WindowHandle) -> Self {
        self.state.lock().foreground = handle;
        self
    }

    /// Makes every `blit` fail, as when context or bitmap creation fails
    pub fn with_failing_blit(self) -> Self {
        self.state.lock().fail_blit = true;
        self
    }

    /// Destroys a window; its handle becomes stale
    pub fn close_window(&self, handle: WindowHandle) {
        self.state.lock().windows.retain(|w| w.handle != handle);
    }

    /// Moves or resizes a window
    pub fn set_window_rect(&self, handle: WindowHandle, rect: Rect) {
        if let Some(window) = self.state.lock().window_mut(handle) {
            window.rect = rect;
        }
    }

    /// Returns the current state of a window
    pub fn window(&self, handle: WindowHandle) -> Option<MockWindow> {
        self.state.lock().window(handle).cloned()
    }

    /// Returns the calls recorded so far
    pub fn calls(&self) -> MockCalls {
        self.state.lock().calls.clone()
    }
}

impl Default for MockWindowSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowSystem for MockWindowSystem {
    fn desktop_rect(&self) -> Option<Rect> {
        self.state.lock().desktop
    }

    fn is_window(&self, handle: WindowHandle) -> bool {
        !handle.is_null() && self.state.lock().window(handle).is_some()
    }

    fn is_window_visible(&self, handle: WindowHandle) -> bool {
        self.state
            .lock()
            .window(handle)
            .is_some_and(|w| w.visible)
    }

    fn is_minimized(&self, handle: WindowHandle) -> bool {
        self.state
            .lock()
            .window(handle)
            .is_some_and(|w| w.minimized)
    }

    fn window_rect(&self, handle: WindowHandle) -> Option<Rect> {
        self.state.lock().window(handle).map(|w| w.rect)
    }

    fn client_rect(&self, handle: WindowHandle) -> Option<Rect> {
        self.state.lock().window(handle).map(|w| w.client_rect)
    }

    fn client_to_screen(&self, handle: WindowHandle, point: Point) -> Option<Point> {
        self.state
            .lock()
            .window(handle)
            .map(|w| {
                Point::new(
                    w.client_origin.x.saturating_add(point.x),
                    w.client_origin.y.saturating_add(point.y),
                )
            })
    }

    fn thread_windows(&self, thread_id: u32) -> Vec<WindowHandle> {
        let mut state = self.state.lock();
        state.calls.thread_enumerations += 1;
        state
            .thread_windows
            .get(&thread_id)
            .cloned()
            .unwrap_or_default()
    }

    fn show_window(&self, handle: WindowHandle, style: ShowStyle) {
        let mut state = self.state.lock();
        state.calls.show_window.push((handle, style));

        if let Some(window) = state.window_mut(handle) {
            match style {
                ShowStyle::Hide => window.visible = false,
                ShowStyle::ShowMinimized
                | ShowStyle::Minimize
                | ShowStyle::ShowMinNoActivate
                | ShowStyle::ForceMinimized => window.minimized = true,
                _ => {
                    window.visible = true;
                    window.minimized = false;
                }
            }
        }
    }

    fn set_foreground(&self, handle: WindowHandle) -> bool {
        let mut state = self.state.lock();
        state.calls.foreground.push(handle);

        let accepted = state.window(handle).is_some_and(|w| w.accepts_foreground);
        if accepted {
            state.foreground = handle;
        }
        accepted
    }

    fn foreground_window(&self) -> WindowHandle {
        self.state.lock().foreground
    }

    fn window_text(&self, handle: WindowHandle) -> String {
        self.state
            .lock()
            .window(handle)
            .map(|w| w.title.clone())
            .unwrap_or_default()
    }

    fn class_name(&self, handle: WindowHandle) -> String {
        self.state
            .lock()
            .window(handle)
            .map(|w| w.class.clone())
            .unwrap_or_default()
    }

    fn processes(&self) -> SnapshotResult<Vec<ProcessInfo>> {
        let state = self.state.lock();
        if let Some(reason) = &state.process_error {
            return Err(SnapshotError::ProcessEnumerationFailed {
                reason: reason.clone(),
            });
        }
        Ok(state.processes.clone())
    }

    fn blit(&self, handle: WindowHandle, request: &BlitRequest) -> Option<ImageBuffer> {
        let mut state = self.state.lock();
        state.calls.blits.push((handle, *request));

        if state.fail_blit || state.window(handle).is_none() {
            return None;
        }
        if request.width <= 0 || request.height <= 0 {
            return None;
        }

        Some(ImageBuffer::from_test_pattern(
            request.width as u32,
            request.height as u32,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CaptureArea;

    fn handle(raw: isize) -> WindowHandle {
        WindowHandle::from_raw(raw)
    }

    #[test]
    fn test_mock_window_system_new() {
        let system = MockWindowSystem::new();
        assert_eq!(system.desktop_rect(), Some(DEFAULT_DESKTOP));
        assert!(system.processes().unwrap().is_empty());
        assert_eq!(system.calls(), MockCalls::default());
    }

    #[test]
    fn test_mock_window_defaults() {
        let window = MockWindow::new(handle(1), Rect::new(10, 20, 110, 220));
        assert!(window.visible);
        assert!(!window.minimized);
        assert!(window.accepts_foreground);
        assert_eq!(window.client_rect, Rect::new(0, 0, 100, 200));
        assert_eq!(window.client_origin, Point::new(10, 20));
    }

    #[test]
    fn test_queries_on_unknown_handle() {
        let system = MockWindowSystem::new();
        let ghost = handle(0xdead);

        assert!(!system.is_window(ghost));
        assert!(!system.is_window(WindowHandle::NULL));
        assert!(!system.is_window_visible(ghost));
        assert!(system.window_rect(ghost).is_none());
        assert!(system.client_to_screen(ghost, Point::default()).is_none());
        assert!(system.window_text(ghost).is_empty());
        assert!(!system.set_foreground(ghost));
    }

    #[test]
    fn test_client_to_screen_offsets_by_client_origin() {
        let system = MockWindowSystem::new().with_window(
            MockWindow::new(handle(1), Rect::new(100, 100, 500, 400))
                .with_client_area(Rect::new(108, 130, 492, 392)),
        );

        assert_eq!(system.client_rect(handle(1)), Some(Rect::new(0, 0, 384, 262)));
        assert_eq!(
            system.client_to_screen(handle(1), Point::new(384, 262)),
            Some(Point::new(492, 392))
        );
    }

    #[test]
    fn test_thread_windows_records_enumerations() {
        let system = MockWindowSystem::new().with_thread_windows(7, [handle(1), handle(2)]);

        assert_eq!(system.thread_windows(7), vec![handle(1), handle(2)]);
        assert!(system.thread_windows(8).is_empty());
        assert_eq!(system.calls().thread_enumerations, 2);
    }

    #[test]
    fn test_show_window_restores_minimized() {
        let system = MockWindowSystem::new()
            .with_window(MockWindow::new(handle(1), Rect::new(0, 0, 10, 10)).minimized());

        assert!(system.is_minimized(handle(1)));
        system.show_window(handle(1), ShowStyle::Restore);
        assert!(!system.is_minimized(handle(1)));

        system.show_window(handle(1), ShowStyle::Minimize);
        assert!(system.is_minimized(handle(1)));

        system.show_window(handle(1), ShowStyle::Hide);
        assert!(!system.is_window_visible(handle(1)));
        assert_eq!(system.calls().show_window.len(), 3);
    }

    #[test]
    fn test_refusing_foreground() {
        let system = MockWindowSystem::new()
            .with_window(MockWindow::new(handle(1), Rect::new(0, 0, 10, 10)).refusing_foreground())
            .with_window(MockWindow::new(handle(2), Rect::new(0, 0, 10, 10)));

        assert!(!system.set_foreground(handle(1)));
        assert!(system.set_foreground(handle(2)));
        assert_eq!(system.calls().foreground, vec![handle(1), handle(2)]);
    }

    #[test]
    fn test_foreground_tracks_accepted_activation() {
        let system = MockWindowSystem::new()
            .with_window(MockWindow::new(handle(1), Rect::new(0, 0, 10, 10)))
            .with_window(MockWindow::new(handle(2), Rect::new(0, 0, 10, 10)).refusing_foreground())
            .with_foreground(handle(1));

        assert_eq!(system.foreground_window(), handle(1));
        assert!(!system.set_foreground(handle(2)));
        assert_eq!(system.foreground_window(), handle(1));
    }

    #[test]
    fn test_process_error_injection() {
        let system = MockWindowSystem::new().with_process_error("snapshot denied");
        let result = system.processes();
        assert!(matches!(
            result,
            Err(SnapshotError::ProcessEnumerationFailed { .. })
        ));
    }

    #[test]
    fn test_blit_returns_requested_size() {
        let system = MockWindowSystem::new()
            .with_window(MockWindow::new(handle(1), Rect::new(0, 0, 10, 10)));
        let request = BlitRequest {
            area:   CaptureArea::Window,
            source: Point::default(),
            width:  64,
            height: 48,
        };

        let image = system.blit(handle(1), &request).unwrap();
        assert_eq!(image.dimensions(), (64, 48));
        assert_eq!(system.calls().blits, vec![(handle(1), request)]);
    }

    #[test]
    fn test_failing_blit() {
        let system = MockWindowSystem::new()
            .with_window(MockWindow::new(handle(1), Rect::new(0, 0, 10, 10)))
            .with_failing_blit();
        let request = BlitRequest {
            area:   CaptureArea::Window,
            source: Point::default(),
            width:  10,
            height: 10,
        };

        assert!(system.blit(handle(1), &request).is_none());
    }

    #[test]
    fn test_close_and_move_window() {
        let system = MockWindowSystem::new()
            .with_window(MockWindow::new(handle(1), Rect::new(0, 0, 10, 10)));

        system.set_window_rect(handle(1), Rect::new(5, 5, 50, 50));
        assert_eq!(system.window_rect(handle(1)), Some(Rect::new(5, 5, 50, 50)));

        system.close_window(handle(1));
        assert!(!system.is_window(handle(1)));
        assert!(system.window(handle(1)).is_none());
    }

    #[test]
    fn test_sample_desktop_processes() {
        let system = MockWindowSystem::with_sample_desktop();
        let processes = system.processes().unwrap();

        assert_eq!(processes.len(), 4);
        assert_eq!(processes[0].name, "notepad.exe");
        assert!(processes[3].main_window.is_null());
    }
}
