//! window-snapshot: list GUI applications and capture their windows
//!
//! Without `--mock` the real window system is used, which exists only on
//! Windows. `--mock` swaps in a built-in sample desktop so every command can
//! be tried anywhere.

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Result;
use clap::{Parser, Subcommand};
use regex::RegexBuilder;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt};
use window_snapshot::{
    ImageBuffer, ResolvedApplication, SnapshotError, SnapshotResult, WindowSystem,
    default_window_system, list_valid_gui_processes,
    model::{CaptureOptions, ShowStyle},
    platform::MockWindowSystem,
};

#[derive(Parser)]
#[command(name = "window-snapshot")]
#[command(version, about = "Find the real window of a running process and capture it")]
struct Cli {
    /// Use the built-in sample desktop instead of the OS window system
    #[arg(long, global = true)]
    mock: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List processes that show a usable GUI window
    List {
        /// Print a JSON array instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Capture the window of one application
    Capture {
        /// Process id of the application
        #[arg(long, conflicts_with = "title", required_unless_present = "title")]
        pid: Option<u32>,
        /// Case-insensitive regex matched against window titles
        #[arg(long)]
        title: Option<String>,
        /// Capture only the client area
        #[arg(long)]
        client: bool,
        /// Show style applied if the window is minimized
        #[arg(long, default_value = "restore")]
        show_style: ShowStyle,
        /// Milliseconds to wait after activation so the window can redraw
        #[arg(long, default_value_t = 1000)]
        redraw_ms: u64,
        /// Output file path; format follows the extension
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Respects RUST_LOG, defaults to info for this crate
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("window_snapshot=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let system = window_system(cli.mock).map_err(with_hint)?;

    match cli.command {
        Commands::List { json } => list(system.as_ref(), json),
        Commands::Capture {
            pid,
            title,
            client,
            show_style,
            redraw_ms,
            out,
        } => {
            let opts = CaptureOptions::builder()
                .client_area(client)
                .show_style(show_style)
                .redraw_delay(Duration::from_millis(redraw_ms))
                .build();
            capture(system.as_ref(), pid, title.as_deref(), &opts, out)
        }
    }
}

fn window_system(mock: bool) -> SnapshotResult<Arc<dyn WindowSystem>> {
    if mock {
        info!("Using the sample mock desktop");
        Ok(Arc::new(MockWindowSystem::with_sample_desktop()))
    } else {
        default_window_system()
    }
}

fn with_hint(err: SnapshotError) -> anyhow::Error {
    anyhow::anyhow!("{}\nHint: {}", err, err.remediation_hint())
}

fn list(system: &dyn WindowSystem, json: bool) -> Result<()> {
    let apps = list_valid_gui_processes(system, None).map_err(with_hint)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&apps)?);
        return Ok(());
    }

    println!("Found {} GUI applications:\n", apps.len());
    for app in &apps {
        println!("  {:>6}  {:<24} {:>12}  {}", app.pid, app.process_name, app.handle, app);
    }
    Ok(())
}

fn capture(
    system: &dyn WindowSystem,
    pid: Option<u32>,
    title: Option<&str>,
    opts: &CaptureOptions,
    out: Option<PathBuf>,
) -> Result<()> {
    let apps = list_valid_gui_processes(system, None).map_err(with_hint)?;
    let app = find_target(&apps, pid, title).map_err(with_hint)?;
    println!("Capturing {} (window {})...", app.description(), app.handle);

    let Some(image) = capture_returning_focus(system, app, opts) else {
        anyhow::bail!("No image: the window is off-screen, closed, empty or refused activation");
    };

    let out = out.unwrap_or_else(default_output_path);
    image.save(&out).map_err(with_hint)?;

    println!("✓ {}x{} snapshot saved to {}", image.width(), image.height(), out.display());
    Ok(())
}

/// Captures the application, then hands the foreground back to the window
/// that held it before
fn capture_returning_focus(
    system: &dyn WindowSystem,
    app: &ResolvedApplication,
    opts: &CaptureOptions,
) -> Option<ImageBuffer> {
    let previous = system.foreground_window();
    let image = app.capture(system, opts);

    if !previous.is_null() && previous != app.handle && !system.set_foreground(previous) {
        debug!("Could not return the foreground to window {}", previous);
    }
    image
}

/// Picks the application matching a pid or a case-insensitive title regex
fn find_target<'a>(
    apps: &'a [ResolvedApplication],
    pid: Option<u32>,
    title: Option<&str>,
) -> SnapshotResult<&'a ResolvedApplication> {
    match (pid, title) {
        (Some(pid), _) => apps
            .iter()
            .find(|app| app.pid == pid)
            .ok_or_else(|| SnapshotError::TargetNotFound {
                selector: format!("pid {}", pid),
            }),
        (None, Some(pattern)) => {
            let regex = RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| SnapshotError::InvalidParameter {
                    parameter: "title".to_string(),
                    reason:    e.to_string(),
                })?;
            apps.iter()
                .find(|app| regex.is_match(&app.title))
                .ok_or_else(|| SnapshotError::TargetNotFound {
                    selector: format!("title ~ /{}/", pattern),
                })
        }
        (None, None) => Err(SnapshotError::InvalidParameter {
            parameter: "target".to_string(),
            reason:    "either --pid or --title is required".to_string(),
        }),
    }
}

fn default_output_path() -> PathBuf {
    PathBuf::from(
        chrono::Local::now()
            .format("snapshot_%Y%m%d_%H%M%S.png")
            .to_string(),
    )
}

#[cfg(test)]
mod tests {
    use window_snapshot::{
        model::{Rect, WindowHandle},
        platform::MockWindow,
    };

    use super::*;

    fn sample_apps() -> Vec<ResolvedApplication> {
        let system = MockWindowSystem::with_sample_desktop();
        list_valid_gui_processes(&system, None).unwrap()
    }

    #[test]
    fn test_cli_parses_capture_by_title() {
        let cli = Cli::try_parse_from([
            "window-snapshot",
            "--mock",
            "capture",
            "--title",
            "notepad",
            "--client",
            "--show-style",
            "show-maximized",
        ])
        .unwrap();

        assert!(cli.mock);
        match cli.command {
            Commands::Capture {
                title,
                client,
                show_style,
                redraw_ms,
                ..
            } => {
                assert_eq!(title.as_deref(), Some("notepad"));
                assert!(client);
                assert_eq!(show_style, ShowStyle::ShowMaximized);
                assert_eq!(redraw_ms, 1000);
            }
            Commands::List { .. } => panic!("expected capture"),
        }
    }

    #[test]
    fn test_cli_requires_a_target() {
        assert!(Cli::try_parse_from(["window-snapshot", "capture"]).is_err());
        assert!(
            Cli::try_parse_from(["window-snapshot", "capture", "--pid", "1", "--title", "x"])
                .is_err()
        );
    }

    #[test]
    fn test_cli_rejects_unknown_show_style() {
        let result = Cli::try_parse_from([
            "window-snapshot",
            "capture",
            "--pid",
            "1",
            "--show-style",
            "sideways",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_find_target_by_pid() {
        let apps = sample_apps();
        assert_eq!(find_target(&apps, Some(2000), None).unwrap().process_name, "launcher.exe");
        assert!(matches!(
            find_target(&apps, Some(9999), None),
            Err(SnapshotError::TargetNotFound { .. })
        ));
    }

    #[test]
    fn test_find_target_by_title_is_case_insensitive() {
        let apps = sample_apps();
        assert_eq!(find_target(&apps, None, Some("NOTEPAD")).unwrap().pid, 1000);
        assert_eq!(find_target(&apps, None, Some("game.*launcher")).unwrap().pid, 2000);
    }

    #[test]
    fn test_find_target_invalid_regex() {
        let apps = sample_apps();
        assert!(matches!(
            find_target(&apps, None, Some("(unclosed")),
            Err(SnapshotError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_capture_returns_foreground_to_previous_window() {
        let console = WindowHandle::from_raw(0x9001);
        let system = MockWindowSystem::with_sample_desktop()
            .with_window(MockWindow::new(console, Rect::new(0, 0, 600, 400)))
            .with_foreground(console);
        let apps = list_valid_gui_processes(&system, None).unwrap();
        let notepad = find_target(&apps, Some(1000), None).unwrap();

        let image = capture_returning_focus(&system, notepad, &CaptureOptions::default());
        assert!(image.is_some());
        assert_eq!(system.calls().foreground, vec![notepad.handle, console]);
        assert_eq!(system.foreground_window(), console);
    }

    #[test]
    fn test_failed_capture_still_returns_foreground() {
        let console = WindowHandle::from_raw(0x9001);
        let system = MockWindowSystem::with_sample_desktop()
            .with_window(MockWindow::new(console, Rect::new(0, 0, 600, 400)))
            .with_foreground(console)
            .with_failing_blit();
        let apps = list_valid_gui_processes(&system, None).unwrap();
        let notepad = find_target(&apps, Some(1000), None).unwrap();

        assert!(capture_returning_focus(&system, notepad, &CaptureOptions::default()).is_none());
        assert_eq!(system.foreground_window(), console);
    }

    #[test]
    fn test_default_output_path_format() {
        let path = default_output_path();
        let name = path.to_string_lossy();
        assert!(name.starts_with("snapshot_"));
        assert!(name.ends_with(".png"));
        assert_eq!(name.len(), "snapshot_20240101_120000.png".len());
    }
}
