//! Shared utilities.
//!
//! Includes:
//! - Failure message shaping (truncation, first-line extraction)
//! - Secret scrubbing for free-form error text

pub mod text;

pub use text::{first_line, scrub_secrets, truncate_with_ellipsis};
