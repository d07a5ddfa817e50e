//! window-snapshot: find and capture the real window of a running process
//!
//! This library resolves the visible top-level window that represents a
//! process (even when its primary window is a hidden or zero-sized dummy)
//! and captures that window into an in-memory image.
//!
//! All OS access goes through [`platform::WindowSystem`]. On Windows the
//! implementation is [`platform::Win32WindowSystem`]; everywhere else
//! [`platform::MockWindowSystem`] provides a scripted desktop.

pub mod capture;
pub mod error;
pub mod model;
pub mod platform;

pub use capture::{
    ImageBuffer, ResolvedApplication, capture_window, list_valid_gui_processes, resolve,
};
pub use error::{SnapshotError, SnapshotResult};
pub use platform::{WindowSystem, default_window_system};
