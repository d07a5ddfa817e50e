//! Shared mock desktops for integration tests

use window_snapshot::{
    model::{ProcessInfo, Rect, WindowHandle},
    platform::{MockWindow, MockWindowSystem},
};

pub fn handle(raw: isize) -> WindowHandle {
    WindowHandle::from_raw(raw)
}

/// Process whose primary window is a hidden message-only host; the real
/// window lives on a worker thread next to a smaller tool window
pub fn hidden_host_desktop() -> (MockWindowSystem, ProcessInfo) {
    let system = MockWindowSystem::new()
        .with_window(
            MockWindow::new(handle(0x10), Rect::new(0, 0, 1, 1))
                .hidden()
                .with_class("HostMessageWindow"),
        )
        .with_window(
            MockWindow::new(handle(0x11), Rect::new(40, 40, 340, 240))
                .with_title("Tools")
                .with_class("ToolWindow"),
        )
        .with_window(
            MockWindow::new(handle(0x12), Rect::new(100, 80, 1300, 880))
                .with_title("Photo Studio")
                .with_class("StudioMain"),
        )
        .with_thread_windows(500, [handle(0x10)])
        .with_thread_windows(501, [handle(0x11), handle(0x12)]);

    let process = ProcessInfo::new(42, "studio.exe", handle(0x10)).with_threads([500, 501]);
    (system, process)
}

/// Process whose candidates never dominate each other: a wide banner first,
/// then a tall sidebar
pub fn non_dominating_desktop() -> (MockWindowSystem, ProcessInfo) {
    let system = MockWindowSystem::new()
        .with_window(MockWindow::new(handle(0x20), Rect::new(0, 0, 0, 0)))
        .with_window(
            MockWindow::new(handle(0x21), Rect::new(0, 0, 1600, 120)).with_title("Banner"),
        )
        .with_window(
            MockWindow::new(handle(0x22), Rect::new(0, 0, 300, 1000)).with_title("Sidebar"),
        )
        .with_thread_windows(600, [handle(0x21), handle(0x22)]);

    let process = ProcessInfo::new(43, "dock.exe", handle(0x20)).with_threads([600]);
    (system, process)
}
