//! Error types for window resolution and snapshot output
//!
//! Only structural failures are errors. A capture that cannot produce an
//! image (window minimized, moved off-screen, closed mid-capture, foreground
//! lock held by another process) is reported as `None` by the capture
//! operation instead, because against live windows that outcome is routine.
//!
//! Each error carries a user-facing message and a remediation hint.

/// Result type alias for window-snapshot operations
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Error type for window-snapshot operations
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// The process exposes no primary window, so it cannot be resolved
    #[error("Process {pid} has no main window")]
    NoMainWindow {
        /// Process identifier
        pid: u32,
    },

    /// The OS process or thread listing could not be taken
    #[error("Failed to enumerate processes: {reason}")]
    ProcessEnumerationFailed {
        /// Reason for the failure
        reason: String,
    },

    /// No valid GUI application matched the requested target
    #[error("No GUI application matches {selector}")]
    TargetNotFound {
        /// Human-readable description of the target (pid or title pattern)
        selector: String,
    },

    /// Invalid parameter provided
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// Name of the invalid parameter
        parameter: String,
        /// Reason why it's invalid
        reason:    String,
    },

    /// No window system is available on this platform
    #[error("No window system backend is available on {platform}")]
    BackendNotAvailable {
        /// Operating system name
        platform: String,
    },

    /// I/O error occurred
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Image encoding or saving failed
    #[error("Image processing error: {0}")]
    ImageError(String),
}

impl From<image::ImageError> for SnapshotError {
    fn from(err: image::ImageError) -> Self {
        SnapshotError::ImageError(err.to_string())
    }
}

impl SnapshotError {
    /// Whether retrying the same call later may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SnapshotError::ProcessEnumerationFailed { .. } | SnapshotError::TargetNotFound { .. }
        )
    }

    /// Returns actionable guidance for resolving the error
    pub fn remediation_hint(&self) -> &'static str {
        match self {
            SnapshotError::NoMainWindow { .. } => {
                "The process has no top-level window. Console and background processes cannot be \
                 captured; pick a process from the `list` command instead."
            }
            SnapshotError::ProcessEnumerationFailed { .. } => {
                "The process snapshot could not be taken. Retry; if it keeps failing, check that \
                 the session has access to the process list."
            }
            SnapshotError::TargetNotFound { .. } => {
                "Run the `list` command to see which applications currently have a visible \
                 window. Window titles may change while the application runs."
            }
            SnapshotError::InvalidParameter { parameter, .. } => match parameter.as_str() {
                "show_style" => {
                    "Use one of: hide, show-normal, show-minimized, show-maximized, \
                     show-normal-no-activate, show, minimize, show-min-no-activate, \
                     show-no-activate, restore, show-default, force-minimized."
                }
                "title" => "The title pattern must be a valid regular expression.",
                _ => "Check the parameter value against the command help.",
            },
            SnapshotError::BackendNotAvailable { .. } => {
                "Window capture needs the Win32 window manager. Run on Windows, or pass --mock \
                 to use the built-in sample desktop."
            }
            SnapshotError::IoError(_) => {
                "An I/O error occurred. Check file permissions, disk space, and that the output \
                 directory exists."
            }
            SnapshotError::ImageError(_) => {
                "Image encoding failed. Use a supported extension (.png, .jpg, .bmp) for the \
                 output file."
            }
        }
    }
}
