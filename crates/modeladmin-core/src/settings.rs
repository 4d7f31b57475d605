//! Admin site settings.
//!
//! [`AdminSettings`] holds everything the admin site reads at construction
//! time. Every field has a default so partial configuration files work.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration for an admin site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminSettings {
    /// Title shown in the page `<title>` and the sidebar header.
    pub title: String,
    /// Path the admin is mounted under (e.g. `/admin`).
    pub base_url: String,
    /// Optional logo shown instead of the title in the sidebar.
    pub logo_url: Option<String>,
    /// Directory with templates overriding the built-in ones by name.
    pub templates_dir: Option<PathBuf>,
    /// Default number of rows per list page.
    pub page_size: usize,
    /// Page sizes offered in the list view.
    pub page_size_options: Vec<usize>,
    /// Enables pretty, verbose logging.
    pub debug: bool,
    /// Tracing filter directive (e.g. `info`, `modeladmin=debug`).
    pub log_level: String,
}

impl Default for AdminSettings {
    fn default() -> Self {
        Self {
            title: "Admin".to_string(),
            base_url: "/admin".to_string(),
            logo_url: None,
            templates_dir: None,
            page_size: 10,
            page_size_options: vec![10, 25, 50, 100],
            debug: false,
            log_level: "info".to_string(),
        }
    }
}

impl AdminSettings {
    /// Returns the base URL with a leading `/` and no trailing `/`.
    ///
    /// An empty or root base URL normalizes to the empty string, meaning the
    /// admin is served from the application root.
    pub fn normalized_base_url(&self) -> String {
        normalize_base_url(&self.base_url)
    }
}

/// Normalizes a mount path to a leading `/` and no trailing `/`.
///
/// # Examples
///
/// ```
/// use modeladmin_core::settings::normalize_base_url;
///
/// assert_eq!(normalize_base_url("admin/"), "/admin");
/// assert_eq!(normalize_base_url("/"), "");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}
