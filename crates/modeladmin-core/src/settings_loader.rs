//! Settings loading from configuration files and the environment.
//!
//! ## Loading Order
//!
//! 1. Start with default settings.
//! 2. Load from a TOML file (overriding defaults).
//! 3. Apply environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `MODELADMIN_TITLE` | `title` |
//! | `MODELADMIN_BASE_URL` | `base_url` |
//! | `MODELADMIN_LOGO_URL` | `logo_url` |
//! | `MODELADMIN_TEMPLATES_DIR` | `templates_dir` |
//! | `MODELADMIN_PAGE_SIZE` | `page_size` |
//! | `MODELADMIN_DEBUG` | `debug` |
//! | `MODELADMIN_LOG_LEVEL` | `log_level` |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use modeladmin_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file_with_env("admin.toml").unwrap();
//! ```

use std::path::{Path, PathBuf};

use crate::error::AdminError;
use crate::settings::AdminSettings;

/// Loads settings from a TOML string. Missing keys keep their defaults.
pub fn from_toml_str(toml_str: &str) -> Result<AdminSettings, AdminError> {
    let settings: AdminSettings = toml::from_str(toml_str)
        .map_err(|e| AdminError::Configuration(format!("Failed to parse TOML: {e}")))?;
    validate(&settings)?;
    Ok(settings)
}

/// Loads settings from a TOML file.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<AdminSettings, AdminError> {
    let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
        AdminError::Configuration(format!(
            "Failed to read TOML file '{}': {e}",
            path.as_ref().display()
        ))
    })?;
    from_toml_str(&content)
}

/// Loads settings from a TOML file and then applies environment variable overrides.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> Result<AdminSettings, AdminError> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings);
    validate(&settings)?;
    Ok(settings)
}

/// Loads settings from just environment variables (starting from defaults).
pub fn from_env() -> AdminSettings {
    let mut settings = AdminSettings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Applies `MODELADMIN_*` environment variable overrides.
pub fn apply_env_overrides(settings: &mut AdminSettings) {
    apply_overrides_from(settings, |key| std::env::var(key).ok());
}

/// Applies overrides using an arbitrary variable lookup.
///
/// Unparseable numeric values are ignored.
pub fn apply_overrides_from<F>(settings: &mut AdminSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup("MODELADMIN_TITLE") {
        settings.title = val;
    }

    if let Some(val) = lookup("MODELADMIN_BASE_URL") {
        settings.base_url = val;
    }

    if let Some(val) = lookup("MODELADMIN_LOGO_URL") {
        settings.logo_url = if val.is_empty() { None } else { Some(val) };
    }

    if let Some(val) = lookup("MODELADMIN_TEMPLATES_DIR") {
        settings.templates_dir = if val.is_empty() {
            None
        } else {
            Some(PathBuf::from(val))
        };
    }

    if let Some(val) = lookup("MODELADMIN_PAGE_SIZE") {
        if let Ok(size) = val.parse::<usize>() {
            settings.page_size = size;
        }
    }

    if let Some(val) = lookup("MODELADMIN_DEBUG") {
        settings.debug = matches!(val.to_lowercase().as_str(), "true" | "1" | "yes");
    }

    if let Some(val) = lookup("MODELADMIN_LOG_LEVEL") {
        settings.log_level = val;
    }
}

fn validate(settings: &AdminSettings) -> Result<(), AdminError> {
    if settings.page_size == 0 {
        return Err(AdminError::Configuration(
            "page_size must be greater than zero".to_string(),
        ));
    }
    if settings.title.trim().is_empty() {
        return Err(AdminError::Configuration("title must not be empty".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    #[test]
    fn test_from_toml_str_partial() {
        let settings = from_toml_str(
            r#"
            title = "Backoffice"
            logo_url = "https://example.com/logo.svg"
            page_size = 25
            "#,
        )
        .unwrap();
        assert_eq!(settings.title, "Backoffice");
        assert_eq!(settings.logo_url.as_deref(), Some("https://example.com/logo.svg"));
        assert_eq!(settings.page_size, 25);
        assert_eq!(settings.base_url, "/admin");
    }

    #[test]
    fn test_from_toml_str_malformed() {
        let err = from_toml_str("title = ").unwrap_err();
        assert!(matches!(err, AdminError::Configuration(_)));
    }

    #[test]
    fn test_from_toml_str_rejects_zero_page_size() {
        let err = from_toml_str("page_size = 0").unwrap_err();
        assert!(err.to_string().contains("page_size"));
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "base_url = \"/dashboard\"").unwrap();
        let settings = from_toml_file(file.path()).unwrap();
        assert_eq!(settings.base_url, "/dashboard");
    }

    #[test]
    fn test_from_toml_file_missing() {
        let err = from_toml_file("/definitely/not/here.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read TOML file"));
    }

    #[test]
    fn test_apply_overrides_from() {
        let vars: HashMap<&str, &str> = [
            ("MODELADMIN_TITLE", "Ops"),
            ("MODELADMIN_BASE_URL", "/ops"),
            ("MODELADMIN_LOGO_URL", "/static/logo.png"),
            ("MODELADMIN_PAGE_SIZE", "50"),
            ("MODELADMIN_DEBUG", "yes"),
            ("MODELADMIN_LOG_LEVEL", "debug"),
        ]
        .into_iter()
        .collect();

        let mut settings = AdminSettings::default();
        apply_overrides_from(&mut settings, |key| vars.get(key).map(ToString::to_string));

        assert_eq!(settings.title, "Ops");
        assert_eq!(settings.base_url, "/ops");
        assert_eq!(settings.logo_url.as_deref(), Some("/static/logo.png"));
        assert_eq!(settings.page_size, 50);
        assert!(settings.debug);
        assert_eq!(settings.log_level, "debug");
    }

    #[test]
    fn test_apply_overrides_ignores_bad_numbers() {
        let mut settings = AdminSettings::default();
        apply_overrides_from(&mut settings, |key| {
            (key == "MODELADMIN_PAGE_SIZE").then(|| "lots".to_string())
        });
        assert_eq!(settings.page_size, 10);
    }

    #[test]
    fn test_empty_logo_override_clears() {
        let mut settings = AdminSettings {
            logo_url: Some("x.png".to_string()),
            ..AdminSettings::default()
        };
        apply_overrides_from(&mut settings, |key| {
            (key == "MODELADMIN_LOGO_URL").then(String::new)
        });
        assert!(settings.logo_url.is_none());
    }
}
