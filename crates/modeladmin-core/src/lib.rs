//! # modeladmin-core
//!
//! Error types, settings, and logging shared by the modeladmin crates.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`settings`] - Admin site configuration
//! - [`settings_loader`] - Loading settings from TOML and the environment
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;

pub use error::{AdminError, AdminResult, ValidationError};
pub use settings::AdminSettings;
