//! Window resolver
//!
//! Picks the window a user would call "the application window" for a
//! process. Most processes expose it directly as their primary window. Some
//! (launchers, splash-screen hosts, apps with a hidden message window as the
//! main window) do not, and the real window has to be found among the
//! windows owned by the process's threads.

use std::fmt;

use serde::Serialize;
use tracing::{debug, info};

use super::{ImageBuffer, snapshot::capture_window};
use crate::{
    error::{SnapshotError, SnapshotResult},
    model::{CaptureOptions, ProcessInfo, Rect, WindowHandle},
    platform::WindowSystem,
};

/// A process together with the window chosen to represent it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedApplication {
    pub pid:          u32,
    pub process_name: String,
    /// The chosen window
    pub handle:       WindowHandle,
    /// Every window enumerated from the process's threads; empty when the
    /// primary window was accepted directly
    pub candidates:   Vec<WindowHandle>,
    /// Desktop bounds at resolution time
    pub desktop:      Rect,
    pub title:        String,
    pub class:        String,
}

impl ResolvedApplication {
    /// `"{process_name}:{title}"`
    pub fn description(&self) -> String {
        format!("{}:{}", self.process_name, self.title)
    }

    /// Copy of the candidate window list
    pub fn window_handles(&self) -> Vec<WindowHandle> {
        self.candidates.clone()
    }

    /// Re-checks the chosen window against the desktop cached at resolution
    pub fn is_valid_gui_window(&self, system: &dyn WindowSystem) -> bool {
        is_valid_gui_window(system, self.handle, &self.desktop)
    }

    /// Captures the chosen window
    pub fn capture(
        &self,
        system: &dyn WindowSystem,
        options: &CaptureOptions,
    ) -> Option<ImageBuffer> {
        capture_window(system, self.handle, options)
    }
}

impl fmt::Display for ResolvedApplication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.title.trim().is_empty() {
            f.write_str(&self.class)
        } else {
            f.write_str(&self.title)
        }
    }
}

/// Whether a window is worth presenting as an application window
///
/// The window must exist, be visible, have a readable rect with positive
/// width and height, and overlap `desktop` in a non-empty region.
pub fn is_valid_gui_window(
    system: &dyn WindowSystem,
    handle: WindowHandle,
    desktop: &Rect,
) -> bool {
    if handle.is_null() || !system.is_window(handle) || !system.is_window_visible(handle) {
        return false;
    }

    match system.window_rect(handle) {
        Some(rect) => rect.width() > 0 && rect.height() > 0 && rect.overlaps(desktop),
        None => false,
    }
}

/// Resolves the representative window of a process
///
/// # Errors
///
/// Returns [`SnapshotError::NoMainWindow`] if the process has no primary
/// window.
pub fn resolve(
    system: &dyn WindowSystem,
    process: &ProcessInfo,
) -> SnapshotResult<ResolvedApplication> {
    let desktop = system.desktop_rect().unwrap_or_default();

    if process.main_window.is_null() {
        return Err(SnapshotError::NoMainWindow { pid: process.pid });
    }

    let mut candidates = Vec::new();
    let handle = if is_valid_gui_window(system, process.main_window, &desktop) {
        process.main_window
    } else {
        for &thread_id in &process.thread_ids {
            candidates.extend(system.thread_windows(thread_id));
        }

        match largest_visible_window(system, &candidates, &desktop) {
            Some(handle) => {
                debug!(
                    "Process {} ({}): primary window {} rejected, using thread window {}",
                    process.pid, process.name, process.main_window, handle
                );
                handle
            }
            None => {
                debug!(
                    "Process {} ({}): no thread window qualifies among {} candidates, keeping {}",
                    process.pid,
                    process.name,
                    candidates.len(),
                    process.main_window
                );
                process.main_window
            }
        }
    };

    Ok(ResolvedApplication {
        pid: process.pid,
        process_name: process.name.clone(),
        handle,
        candidates,
        desktop,
        title: system.window_text(handle),
        class: system.class_name(handle),
    })
}

/// Walks candidates in order and keeps the one that strictly dominates the
/// current maximum in both height and width
///
/// A window that is taller but narrower (or wider but shorter) never replaces
/// the current maximum, so between two non-dominating windows the first seen
/// wins.
fn largest_visible_window(
    system: &dyn WindowSystem,
    candidates: &[WindowHandle],
    desktop: &Rect,
) -> Option<WindowHandle> {
    let mut max_rect = Rect::default();
    let mut max_handle = WindowHandle::NULL;

    for &candidate in candidates {
        if !system.is_window_visible(candidate) {
            continue;
        }
        let Some(rect) = system.window_rect(candidate) else {
            continue;
        };

        if rect.height() > max_rect.height()
            && rect.width() > max_rect.width()
            && rect.overlaps(desktop)
        {
            max_rect = rect;
            max_handle = candidate;
        }
    }

    (!max_handle.is_null() && max_rect.width() > 0 && max_rect.height() > 0).then_some(max_handle)
}

/// Lists the processes that currently show a usable GUI window
///
/// With `processes` set to `None` the process list is taken from
/// `system.processes()`. Processes without a primary window are skipped, and
/// an application is kept only if its resolved window is valid.
///
/// # Errors
///
/// Propagates the failure of `system.processes()`.
pub fn list_valid_gui_processes(
    system: &dyn WindowSystem,
    processes: Option<Vec<ProcessInfo>>,
) -> SnapshotResult<Vec<ResolvedApplication>> {
    let processes = match processes {
        Some(processes) => processes,
        None => system.processes()?,
    };
    let total = processes.len();

    let mut apps = Vec::new();
    for process in processes.iter().filter(|p| !p.main_window.is_null()) {
        let app = resolve(system, process)?;
        if app.is_valid_gui_window(system) {
            apps.push(app);
        } else {
            debug!("Skipping {} ({}): no valid window", process.pid, process.name);
        }
    }

    info!("Found {} GUI applications among {} processes", apps.len(), total);
    Ok(apps)
}
