//! Window resolution and capture
//!
//! This module holds the two operations of the crate and the image type they
//! produce:
//!
//! - `resolver`: picks the user-relevant window of a process
//!   ([`resolve`], [`list_valid_gui_processes`])
//! - `snapshot`: activates, clips and copies a window ([`capture_window`])
//! - `image_buffer`: [`ImageBuffer`], the captured pixels
//!
//! Both operations are synchronous and talk to the OS only through
//! [`WindowSystem`](crate::platform::WindowSystem).

pub mod image_buffer;
pub mod resolver;
pub mod snapshot;

pub use image_buffer::ImageBuffer;
pub use resolver::{ResolvedApplication, is_valid_gui_window, list_valid_gui_processes, resolve};
pub use snapshot::capture_window;
