//! Data models and type definitions for window-snapshot
//!
//! This module defines the value types shared by the resolver, the capture
//! operation and the platform layer:
//! - Geometry (`Rect`, `Point`)
//! - Opaque window handles and process snapshots
//! - Capture options and the blit request handed to the platform

use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

use crate::error::SnapshotError;

/// A rectangle described by its four edges, in screen pixels
///
/// Mirrors the Win32 `RECT` layout. Width and height are absolute
/// differences, so they never go negative regardless of edge order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub left:   i32,
    pub top:    i32,
    pub right:  i32,
    pub bottom: i32,
}

impl Rect {
    /// Creates a rectangle from its edges
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Absolute horizontal extent, saturating at `i32::MAX`
    pub fn width(&self) -> i32 {
        saturating_extent(self.left, self.right)
    }

    /// Absolute vertical extent, saturating at `i32::MAX`
    pub fn height(&self) -> i32 {
        saturating_extent(self.top, self.bottom)
    }

    /// Returns true if the rectangle has no area (`IsRectEmpty` semantics)
    pub fn is_empty(&self) -> bool {
        self.right <= self.left || self.bottom <= self.top
    }

    /// Intersects two rectangles (`IntersectRect` semantics)
    ///
    /// Returns `None` when the overlap is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use window_snapshot::model::Rect;
    ///
    /// let desktop = Rect::new(0, 0, 1920, 1080);
    /// let window = Rect::new(1800, 1000, 2000, 1200);
    /// assert_eq!(window.intersect(&desktop), Some(Rect::new(1800, 1000, 1920, 1080)));
    ///
    /// let offscreen = Rect::new(-32000, -32000, -31800, -31900);
    /// assert_eq!(offscreen.intersect(&desktop), None);
    /// ```
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let result = Rect {
            left:   self.left.max(other.left),
            top:    self.top.max(other.top),
            right:  self.right.min(other.right),
            bottom: self.bottom.min(other.bottom),
        };

        if result.is_empty() {
            None
        } else {
            Some(result)
        }
    }

    /// Returns true if the two rectangles share a non-empty region
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.intersect(other).is_some()
    }
}

fn saturating_extent(from: i32, to: i32) -> i32 {
    i32::try_from(from.abs_diff(to)).unwrap_or(i32::MAX)
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Left = {}, Top = {}, Right = {}, Bottom = {}",
            self.left, self.top, self.right, self.bottom
        )
    }
}

/// A point in client or screen coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Opaque reference to a window owned by the OS window manager
///
/// A handle never owns anything; the window it names may vanish at any
/// moment. It is stored as a pointer-sized integer so it can be copied,
/// compared and sent between threads freely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowHandle(isize);

impl WindowHandle {
    /// The null handle
    pub const NULL: WindowHandle = WindowHandle(0);

    pub const fn from_raw(raw: isize) -> Self {
        Self(raw)
    }

    pub const fn as_raw(&self) -> isize {
        self.0
    }

    pub const fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Snapshot of an OS process as seen by the resolver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessInfo {
    /// Process identifier
    pub pid:         u32,
    /// Executable name (e.g. `notepad.exe`)
    pub name:        String,
    /// Primary window handle, `WindowHandle::NULL` if the process has none
    pub main_window: WindowHandle,
    /// Identifiers of the threads owned by the process
    pub thread_ids:  Vec<u32>,
}

impl ProcessInfo {
    pub fn new(pid: u32, name: impl Into<String>, main_window: WindowHandle) -> Self {
        Self {
            pid,
            name: name.into(),
            main_window,
            thread_ids: Vec::new(),
        }
    }

    /// Adds the thread identifiers owned by this process
    pub fn with_threads(mut self, thread_ids: impl IntoIterator<Item = u32>) -> Self {
        self.thread_ids.extend(thread_ids);
        self
    }
}

/// How a minimized window is shown before capture (the Win32 `SW_*` values)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShowStyle {
    Hide,
    ShowNormal,
    ShowMinimized,
    /// Also covers `SW_MAXIMIZE`, which shares the value
    ShowMaximized,
    ShowNormalNoActivate,
    Show,
    Minimize,
    ShowMinNoActivate,
    ShowNoActivate,
    #[default]
    Restore,
    ShowDefault,
    ForceMinimized,
}

impl ShowStyle {
    /// Raw `SW_*` value passed to `ShowWindow`
    pub fn as_raw(&self) -> i32 {
        match self {
            ShowStyle::Hide => 0,
            ShowStyle::ShowNormal => 1,
            ShowStyle::ShowMinimized => 2,
            ShowStyle::ShowMaximized => 3,
            ShowStyle::ShowNormalNoActivate => 4,
            ShowStyle::Show => 5,
            ShowStyle::Minimize => 6,
            ShowStyle::ShowMinNoActivate => 7,
            ShowStyle::ShowNoActivate => 8,
            ShowStyle::Restore => 9,
            ShowStyle::ShowDefault => 10,
            ShowStyle::ForceMinimized => 11,
        }
    }

    /// Returns the kebab-case name
    pub fn as_str(&self) -> &'static str {
        match self {
            ShowStyle::Hide => "hide",
            ShowStyle::ShowNormal => "show-normal",
            ShowStyle::ShowMinimized => "show-minimized",
            ShowStyle::ShowMaximized => "show-maximized",
            ShowStyle::ShowNormalNoActivate => "show-normal-no-activate",
            ShowStyle::Show => "show",
            ShowStyle::Minimize => "minimize",
            ShowStyle::ShowMinNoActivate => "show-min-no-activate",
            ShowStyle::ShowNoActivate => "show-no-activate",
            ShowStyle::Restore => "restore",
            ShowStyle::ShowDefault => "show-default",
            ShowStyle::ForceMinimized => "force-minimized",
        }
    }
}

impl fmt::Display for ShowStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShowStyle {
    type Err = SnapshotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let style = match s.to_ascii_lowercase().as_str() {
            "hide" => ShowStyle::Hide,
            "show-normal" => ShowStyle::ShowNormal,
            "show-minimized" => ShowStyle::ShowMinimized,
            "show-maximized" | "maximize" => ShowStyle::ShowMaximized,
            "show-normal-no-activate" => ShowStyle::ShowNormalNoActivate,
            "show" => ShowStyle::Show,
            "minimize" => ShowStyle::Minimize,
            "show-min-no-activate" => ShowStyle::ShowMinNoActivate,
            "show-no-activate" => ShowStyle::ShowNoActivate,
            "restore" => ShowStyle::Restore,
            "show-default" => ShowStyle::ShowDefault,
            "force-minimized" => ShowStyle::ForceMinimized,
            _ => {
                return Err(SnapshotError::InvalidParameter {
                    parameter: "show_style".to_string(),
                    reason:    format!("unknown show style '{}'", s),
                });
            }
        };
        Ok(style)
    }
}

/// Which part of the window is captured
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureArea {
    /// Whole window including title bar and borders
    #[default]
    Window,
    /// Client area only
    Client,
}

/// Options for a single window capture
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureOptions {
    /// Full window or client area
    pub area:         CaptureArea,
    /// Show style applied if the window is minimized
    pub show_style:   ShowStyle,
    /// Time to block after activation so the window can redraw
    pub redraw_delay: Option<Duration>,
}

impl CaptureOptions {
    /// Starts a builder with default options
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use window_snapshot::model::{CaptureArea, CaptureOptions};
    ///
    /// let opts = CaptureOptions::builder()
    ///     .client_area(true)
    ///     .redraw_delay(Duration::from_secs(1))
    ///     .build();
    /// assert_eq!(opts.area, CaptureArea::Client);
    /// ```
    pub fn builder() -> CaptureOptionsBuilder {
        CaptureOptionsBuilder::default()
    }

    pub fn is_client_area(&self) -> bool {
        self.area == CaptureArea::Client
    }
}

/// Builder for [`CaptureOptions`]
#[derive(Debug, Clone, Default)]
pub struct CaptureOptionsBuilder {
    options: CaptureOptions,
}

impl CaptureOptionsBuilder {
    pub fn area(mut self, area: CaptureArea) -> Self {
        self.options.area = area;
        self
    }

    /// Shortcut for `area(CaptureArea::Client)` / `area(CaptureArea::Window)`
    pub fn client_area(self, client: bool) -> Self {
        self.area(if client {
            CaptureArea::Client
        } else {
            CaptureArea::Window
        })
    }

    pub fn show_style(mut self, style: ShowStyle) -> Self {
        self.options.show_style = style;
        self
    }

    pub fn redraw_delay(mut self, delay: Duration) -> Self {
        self.options.redraw_delay = Some(delay);
        self
    }

    pub fn build(self) -> CaptureOptions {
        self.options
    }
}

/// A device-context copy requested from the platform
///
/// `source` is the offset into the window's device context; `width` and
/// `height` are the size of the visible part of the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlitRequest {
    pub area:   CaptureArea,
    pub source: Point,
    pub width:  i32,
    pub height: i32,
}
