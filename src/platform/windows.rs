//! Win32 window system
//!
//! Implements [`WindowSystem`] with `user32`, `gdi32` and ToolHelp calls
//! through `windows-sys`. The type is stateless; every call goes straight to
//! the OS.
//!
//! Every GDI object acquired by [`Win32WindowSystem::blit`] is held by an RAII
//! guard, so early returns release whatever has been acquired so far.

use std::{
    collections::HashMap,
    ffi::{OsString, c_void},
    mem,
    os::windows::ffi::OsStringExt,
};

use windows_sys::{
    Win32::{
        Foundation::{CloseHandle, HANDLE, HWND, INVALID_HANDLE_VALUE, LPARAM, POINT, RECT},
        Graphics::Gdi::{
            BI_RGB, BITMAPINFO, BITMAPINFOHEADER, BitBlt, ClientToScreen, CreateCompatibleBitmap,
            CreateCompatibleDC, DIB_RGB_COLORS, DeleteDC, DeleteObject, GetDC, GetDIBits,
            GetWindowDC, HBITMAP, HDC, HGDIOBJ, ReleaseDC, SRCCOPY, SelectObject,
        },
        System::Diagnostics::ToolHelp::{
            CreateToolhelp32Snapshot, PROCESSENTRY32W, Process32FirstW, Process32NextW,
            TH32CS_SNAPPROCESS, TH32CS_SNAPTHREAD, THREADENTRY32, Thread32First, Thread32Next,
        },
        UI::WindowsAndMessaging::{
            EnumThreadWindows, EnumWindows, GW_OWNER, GetClassNameW, GetClientRect,
            GetDesktopWindow, GetForegroundWindow, GetWindow, GetWindowRect,
            GetWindowTextLengthW, GetWindowTextW, GetWindowThreadProcessId, IsIconic, IsWindow,
            IsWindowVisible, SetForegroundWindow, ShowWindow,
        },
    },
    core::BOOL,
};

use super::WindowSystem;
use crate::{
    capture::ImageBuffer,
    error::{SnapshotError, SnapshotResult},
    model::{BlitRequest, CaptureArea, Point, ProcessInfo, Rect, ShowStyle, WindowHandle},
};

/// Enumeration callbacks return this to keep going
const CONTINUE_ENUMERATION: BOOL = 1;

/// Longest class name Win32 allows
const MAX_CLASS_NAME: usize = 256;

fn to_hwnd(handle: WindowHandle) -> HWND {
    handle.as_raw() as HWND
}

fn from_hwnd(hwnd: HWND) -> WindowHandle {
    WindowHandle::from_raw(hwnd as isize)
}

fn from_rect(rect: RECT) -> Rect {
    Rect::new(rect.left, rect.top, rect.right, rect.bottom)
}

/// Decodes a UTF-16 buffer up to its first NUL
fn from_wide(buffer: &[u16]) -> String {
    let len = buffer.iter().position(|&c| c == 0).unwrap_or(buffer.len());
    OsString::from_wide(&buffer[..len])
        .to_string_lossy()
        .into_owned()
}

/// Win32 implementation of [`WindowSystem`]
///
/// # Thread Safety
///
/// Stateless, so `Send + Sync`. Foreground activation rules still apply per
/// calling process: Windows may refuse `SetForegroundWindow` when another
/// process holds the foreground lock.
#[derive(Debug, Default)]
pub struct Win32WindowSystem {
    _private: (),
}

impl Win32WindowSystem {
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl WindowSystem for Win32WindowSystem {
    fn desktop_rect(&self) -> Option<Rect> {
        // SAFETY: GetDesktopWindow has no preconditions and never returns an
        // invalid handle.
        let desktop = unsafe { GetDesktopWindow() };
        self.window_rect(from_hwnd(desktop))
    }

    fn is_window(&self, handle: WindowHandle) -> bool {
        // SAFETY: IsWindow accepts any value, including stale handles.
        !handle.is_null() && unsafe { IsWindow(to_hwnd(handle)) } != 0
    }

    fn is_window_visible(&self, handle: WindowHandle) -> bool {
        // SAFETY: returns FALSE for invalid handles.
        unsafe { IsWindowVisible(to_hwnd(handle)) != 0 }
    }

    fn is_minimized(&self, handle: WindowHandle) -> bool {
        // SAFETY: returns FALSE for invalid handles.
        unsafe { IsIconic(to_hwnd(handle)) != 0 }
    }

    fn window_rect(&self, handle: WindowHandle) -> Option<Rect> {
        let mut rect: RECT = RECT { left: 0, top: 0, right: 0, bottom: 0 };
        // SAFETY: `rect` is a valid out-pointer for the duration of the call.
        let ok = unsafe { GetWindowRect(to_hwnd(handle), &mut rect) };
        (ok != 0).then(|| from_rect(rect))
    }

    fn client_rect(&self, handle: WindowHandle) -> Option<Rect> {
        let mut rect: RECT = RECT { left: 0, top: 0, right: 0, bottom: 0 };
        // SAFETY: `rect` is a valid out-pointer for the duration of the call.
        let ok = unsafe { GetClientRect(to_hwnd(handle), &mut rect) };
        (ok != 0).then(|| from_rect(rect))
    }

    fn client_to_screen(&self, handle: WindowHandle, point: Point) -> Option<Point> {
        let mut native = POINT { x: point.x, y: point.y };
        // SAFETY: `native` is a valid in/out pointer for the duration of the call.
        let ok = unsafe { ClientToScreen(to_hwnd(handle), &mut native) };
        (ok != 0).then(|| Point::new(native.x, native.y))
    }

    fn thread_windows(&self, thread_id: u32) -> Vec<WindowHandle> {
        unsafe extern "system" fn collect(hwnd: HWND, lparam: LPARAM) -> BOOL {
            // SAFETY: lparam is the `&mut Vec` passed below, alive for the
            // whole synchronous enumeration.
            let handles = unsafe { &mut *(lparam as *mut Vec<WindowHandle>) };
            handles.push(from_hwnd(hwnd));
            CONTINUE_ENUMERATION
        }

        let mut handles: Vec<WindowHandle> = Vec::new();
        // SAFETY: the callback only touches `handles`, which outlives the call.
        // A FALSE return just means the thread owns no windows.
        unsafe {
            EnumThreadWindows(
                thread_id,
                Some(collect),
                &mut handles as *mut Vec<WindowHandle> as LPARAM,
            );
        }
        handles
    }

    fn show_window(&self, handle: WindowHandle, style: ShowStyle) {
        // SAFETY: ShowWindow tolerates invalid handles. The return value is
        // the previous visibility, not an error.
        unsafe {
            ShowWindow(to_hwnd(handle), style.as_raw());
        }
    }

    fn set_foreground(&self, handle: WindowHandle) -> bool {
        // SAFETY: returns FALSE for invalid handles or refused activation.
        unsafe { SetForegroundWindow(to_hwnd(handle)) != 0 }
    }

    fn foreground_window(&self) -> WindowHandle {
        // SAFETY: no preconditions; returns NULL while activation is changing.
        from_hwnd(unsafe { GetForegroundWindow() })
    }

    fn window_text(&self, handle: WindowHandle) -> String {
        let hwnd = to_hwnd(handle);
        // SAFETY: returns 0 for invalid handles.
        let len = unsafe { GetWindowTextLengthW(hwnd) };
        if len <= 0 {
            return String::new();
        }

        // +1 for the terminating NUL
        let mut buffer: Vec<u16> = vec![0; len as usize + 1];
        // SAFETY: the buffer length passed matches the allocation.
        let copied = unsafe { GetWindowTextW(hwnd, buffer.as_mut_ptr(), buffer.len() as i32) };
        if copied <= 0 {
            return String::new();
        }
        buffer.truncate(copied as usize);
        from_wide(&buffer)
    }

    fn class_name(&self, handle: WindowHandle) -> String {
        let mut buffer: Vec<u16> = vec![0; MAX_CLASS_NAME];
        // SAFETY: the buffer length passed matches the allocation.
        let len =
            unsafe { GetClassNameW(to_hwnd(handle), buffer.as_mut_ptr(), buffer.len() as i32) };
        if len <= 0 {
            return String::new();
        }
        buffer.truncate(len as usize);
        from_wide(&buffer)
    }

    fn processes(&self) -> SnapshotResult<Vec<ProcessInfo>> {
        let main_windows = main_windows_by_pid();
        let mut threads = threads_by_pid()?;

        let snapshot = ToolhelpSnapshot::take(TH32CS_SNAPPROCESS)?;
        // SAFETY: PROCESSENTRY32W is plain data; all-zero is a valid value.
        let mut entry: PROCESSENTRY32W = unsafe { mem::zeroed() };
        entry.dwSize = mem::size_of::<PROCESSENTRY32W>() as u32;

        let mut processes = Vec::new();
        // SAFETY: `entry` has dwSize set and outlives each call.
        let mut more = unsafe { Process32FirstW(snapshot.0, &mut entry) } != 0;
        while more {
            let pid = entry.th32ProcessID;
            let main_window = main_windows.get(&pid).copied().unwrap_or(WindowHandle::NULL);
            processes.push(
                ProcessInfo::new(pid, from_wide(&entry.szExeFile), main_window)
                    .with_threads(threads.remove(&pid).unwrap_or_default()),
            );
            // SAFETY: as above.
            more = unsafe { Process32NextW(snapshot.0, &mut entry) } != 0;
        }

        tracing::debug!(
            "Enumerated {} processes, {} with a main window",
            processes.len(),
            main_windows.len()
        );
        Ok(processes)
    }

    fn blit(&self, handle: WindowHandle, request: &BlitRequest) -> Option<ImageBuffer> {
        if request.width <= 0 || request.height <= 0 {
            return None;
        }

        let window_dc = WindowDc::acquire(to_hwnd(handle), request.area)?;
        let memory_dc = MemoryDc::compatible_with(&window_dc)?;
        let bitmap = Bitmap::compatible_with(&window_dc, request.width, request.height)?;

        {
            let _selected = SelectedObject::select(&memory_dc, &bitmap)?;
            // SAFETY: both contexts are live for the whole call and the
            // destination bitmap is at least width x height.
            let copied = unsafe {
                BitBlt(
                    memory_dc.0,
                    0,
                    0,
                    request.width,
                    request.height,
                    window_dc.hdc,
                    request.source.x,
                    request.source.y,
                    SRCCOPY,
                )
            };
            if copied == 0 {
                tracing::warn!("BitBlt from window {} failed", handle);
                return None;
            }
        }

        // The bitmap must be deselected before GetDIBits reads it
        let pixels = bitmap.read_bgra(&memory_dc, request.width, request.height)?;
        ImageBuffer::from_bgra(request.width as u32, request.height as u32, &pixels)
            .map_err(|e| tracing::warn!("Cannot build image from window {}: {}", handle, e))
            .ok()
    }
}

/// First visible, unowned top-level window of each process, in `EnumWindows`
/// order
fn main_windows_by_pid() -> HashMap<u32, WindowHandle> {
    unsafe extern "system" fn collect(hwnd: HWND, lparam: LPARAM) -> BOOL {
        // SAFETY: lparam is the `&mut HashMap` passed below, alive for the
        // whole synchronous enumeration.
        let windows = unsafe { &mut *(lparam as *mut HashMap<u32, WindowHandle>) };

        // SAFETY: hwnd comes from the enumeration; `pid` is a valid out-pointer.
        unsafe {
            if IsWindowVisible(hwnd) == 0 || !GetWindow(hwnd, GW_OWNER).is_null() {
                return CONTINUE_ENUMERATION;
            }
            let mut pid: u32 = 0;
            GetWindowThreadProcessId(hwnd, &mut pid);
            if pid != 0 {
                windows.entry(pid).or_insert_with(|| from_hwnd(hwnd));
            }
        }
        CONTINUE_ENUMERATION
    }

    let mut windows: HashMap<u32, WindowHandle> = HashMap::new();
    // SAFETY: the callback only touches `windows`, which outlives the call.
    unsafe {
        EnumWindows(
            Some(collect),
            &mut windows as *mut HashMap<u32, WindowHandle> as LPARAM,
        );
    }
    windows
}

fn threads_by_pid() -> SnapshotResult<HashMap<u32, Vec<u32>>> {
    let snapshot = ToolhelpSnapshot::take(TH32CS_SNAPTHREAD)?;
    // SAFETY: THREADENTRY32 is plain data; all-zero is a valid value.
    let mut entry: THREADENTRY32 = unsafe { mem::zeroed() };
    entry.dwSize = mem::size_of::<THREADENTRY32>() as u32;

    let mut threads: HashMap<u32, Vec<u32>> = HashMap::new();
    // SAFETY: `entry` has dwSize set and outlives each call.
    let mut more = unsafe { Thread32First(snapshot.0, &mut entry) } != 0;
    while more {
        threads
            .entry(entry.th32OwnerProcessID)
            .or_default()
            .push(entry.th32ThreadID);
        // SAFETY: as above.
        more = unsafe { Thread32Next(snapshot.0, &mut entry) } != 0;
    }
    Ok(threads)
}

/// Owned ToolHelp snapshot handle, closed on drop
struct ToolhelpSnapshot(HANDLE);

impl ToolhelpSnapshot {
    fn take(flags: u32) -> SnapshotResult<Self> {
        // SAFETY: no pointers are passed; failure is signalled by the return value.
        let handle = unsafe { CreateToolhelp32Snapshot(flags, 0) };
        if handle == INVALID_HANDLE_VALUE || handle.is_null() {
            let reason = std::io::Error::last_os_error();
            tracing::warn!("CreateToolhelp32Snapshot failed: {}", reason);
            return Err(SnapshotError::ProcessEnumerationFailed {
                reason: format!("CreateToolhelp32Snapshot failed: {}", reason),
            });
        }
        Ok(Self(handle))
    }
}

impl Drop for ToolhelpSnapshot {
    fn drop(&mut self) {
        // SAFETY: the handle was returned by CreateToolhelp32Snapshot and is
        // closed exactly once.
        unsafe {
            CloseHandle(self.0);
        }
    }
}

/// Device context of a window, released with `ReleaseDC`
struct WindowDc {
    hwnd: HWND,
    hdc:  HDC,
}

impl WindowDc {
    fn acquire(hwnd: HWND, area: CaptureArea) -> Option<Self> {
        // SAFETY: both functions return NULL for invalid windows.
        let hdc = unsafe {
            match area {
                CaptureArea::Client => GetDC(hwnd),
                CaptureArea::Window => GetWindowDC(hwnd),
            }
        };
        if hdc.is_null() {
            tracing::warn!("Cannot get {:?} device context of window {:p}", area, hwnd);
            return None;
        }
        Some(Self { hwnd, hdc })
    }
}

impl Drop for WindowDc {
    fn drop(&mut self) {
        // SAFETY: hdc was obtained from GetDC/GetWindowDC for this hwnd.
        unsafe {
            ReleaseDC(self.hwnd, self.hdc);
        }
    }
}

/// Memory device context, deleted with `DeleteDC`
struct MemoryDc(HDC);

impl MemoryDc {
    fn compatible_with(window_dc: &WindowDc) -> Option<Self> {
        // SAFETY: window_dc holds a live device context.
        let hdc = unsafe { CreateCompatibleDC(window_dc.hdc) };
        if hdc.is_null() {
            tracing::warn!("CreateCompatibleDC failed");
            return None;
        }
        Some(Self(hdc))
    }
}

impl Drop for MemoryDc {
    fn drop(&mut self) {
        // SAFETY: created by CreateCompatibleDC, deleted exactly once.
        unsafe {
            DeleteDC(self.0);
        }
    }
}

/// Device-dependent bitmap, deleted with `DeleteObject`
struct Bitmap(HBITMAP);

impl Bitmap {
    fn compatible_with(window_dc: &WindowDc, width: i32, height: i32) -> Option<Self> {
        // SAFETY: window_dc holds a live device context.
        let bitmap = unsafe { CreateCompatibleBitmap(window_dc.hdc, width, height) };
        if bitmap.is_null() {
            tracing::warn!("CreateCompatibleBitmap({}x{}) failed", width, height);
            return None;
        }
        Some(Self(bitmap))
    }

    /// Reads the bitmap as top-down 32-bit BGRA rows
    ///
    /// The bitmap must not be selected into any device context.
    fn read_bgra(&self, memory_dc: &MemoryDc, width: i32, height: i32) -> Option<Vec<u8>> {
        // SAFETY: BITMAPINFO is plain data; all-zero is a valid value.
        let mut info: BITMAPINFO = unsafe { mem::zeroed() };
        info.bmiHeader = BITMAPINFOHEADER {
            biSize: mem::size_of::<BITMAPINFOHEADER>() as u32,
            biWidth: width,
            // Negative height requests top-down rows
            biHeight: -height,
            biPlanes: 1,
            biBitCount: 32,
            biCompression: BI_RGB as u32,
            ..info.bmiHeader
        };

        let mut pixels: Vec<u8> = vec![0; width as usize * height as usize * 4];
        // SAFETY: `pixels` holds exactly height rows of width 32-bit pixels,
        // matching the header; both GDI objects are live.
        let lines = unsafe {
            GetDIBits(
                memory_dc.0,
                self.0,
                0,
                height as u32,
                pixels.as_mut_ptr() as *mut c_void,
                &mut info,
                DIB_RGB_COLORS,
            )
        };
        if lines != height {
            tracing::warn!("GetDIBits copied {} of {} lines", lines, height);
            return None;
        }
        Some(pixels)
    }
}

impl Drop for Bitmap {
    fn drop(&mut self) {
        // SAFETY: created by CreateCompatibleBitmap and no longer selected
        // into a device context (SelectedObject drops first).
        unsafe {
            DeleteObject(self.0 as HGDIOBJ);
        }
    }
}

/// Selection of an object into a memory DC; re-selects the previous object
/// on drop
struct SelectedObject<'a> {
    dc:       &'a MemoryDc,
    previous: HGDIOBJ,
}

impl<'a> SelectedObject<'a> {
    fn select(dc: &'a MemoryDc, bitmap: &Bitmap) -> Option<Self> {
        // SAFETY: both objects are live GDI objects.
        let previous = unsafe { SelectObject(dc.0, bitmap.0 as HGDIOBJ) };
        if previous.is_null() {
            tracing::warn!("SelectObject failed");
            return None;
        }
        Some(Self { dc, previous })
    }
}

impl Drop for SelectedObject<'_> {
    fn drop(&mut self) {
        // SAFETY: `previous` was returned by SelectObject on this DC.
        unsafe {
            SelectObject(self.dc.0, self.previous);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CaptureOptions;

    #[test]
    fn test_win32_window_system_new() {
        let system = Win32WindowSystem::new();
        assert!(system.desktop_rect().is_some());
    }

    #[test]
    fn test_from_wide_stops_at_nul() {
        let buffer: Vec<u16> = "notepad.exe\0garbage".encode_utf16().collect();
        assert_eq!(from_wide(&buffer), "notepad.exe");
    }

    #[test]
    fn test_null_handle_queries() {
        let system = Win32WindowSystem::new();
        let null = WindowHandle::NULL;

        assert!(!system.is_window(null));
        assert!(!system.is_window_visible(null));
        assert!(system.window_rect(null).is_none());
        assert!(system.window_text(null).is_empty());
        assert!(system.class_name(null).is_empty());
    }

    #[test]
    fn test_blit_rejects_empty_request() {
        let system = Win32WindowSystem::new();
        let request = BlitRequest {
            area:   CaptureArea::Window,
            source: Point::default(),
            width:  0,
            height: 10,
        };
        assert!(system.blit(WindowHandle::NULL, &request).is_none());
    }

    #[test]
    #[ignore = "requires Windows desktop environment"]
    fn test_processes_include_current_process() {
        let system = Win32WindowSystem::new();
        let processes = system.processes().unwrap();

        let me = processes
            .iter()
            .find(|p| p.pid == std::process::id())
            .expect("current process missing from snapshot");
        assert!(!me.thread_ids.is_empty());
    }

    #[test]
    #[ignore = "requires Windows desktop environment"]
    fn test_capture_first_gui_application() {
        let system = Win32WindowSystem::new();
        let apps = crate::capture::list_valid_gui_processes(&system, None).unwrap();
        let app = apps.first().expect("no GUI application running");

        // Capture may legitimately be refused by the foreground lock
        if let Some(image) = app.capture(&system, &CaptureOptions::default()) {
            assert!(image.width() > 0 && image.height() > 0);
        }
    }
}
