//! HTML rendering with tera.
//!
//! The admin pages are compiled into the binary. A `templates_dir` can
//! override any of them by file name; templates missing from the directory
//! fall back to the built-in version.

use std::path::Path;

use tera::{Context, Tera};

use modeladmin_core::{AdminError, AdminResult};

/// Built-in templates, in load order.
pub const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("templates/base.html")),
    ("index.html", include_str!("templates/index.html")),
    ("list.html", include_str!("templates/list.html")),
    ("details.html", include_str!("templates/details.html")),
    ("form.html", include_str!("templates/form.html")),
    ("error.html", include_str!("templates/error.html")),
];

/// The compiled admin templates.
#[derive(Debug)]
pub struct Templates {
    tera: Tera,
}

impl Templates {
    /// Loads the built-in templates only.
    pub fn builtin() -> AdminResult<Self> {
        Self::load(None)
    }

    /// Loads the templates, preferring files found in `dir`.
    pub fn load(dir: Option<&Path>) -> AdminResult<Self> {
        let mut sources = Vec::with_capacity(BUILTIN_TEMPLATES.len());
        for (name, builtin) in BUILTIN_TEMPLATES {
            let source = match dir.map(|d| d.join(name)).filter(|p| p.is_file()) {
                Some(path) => {
                    tracing::debug!(template = name, path = %path.display(), "Using template override");
                    std::fs::read_to_string(&path)?
                }
                None => (*builtin).to_string(),
            };
            sources.push((*name, source));
        }

        let mut tera = Tera::default();
        tera.autoescape_on(vec![".html"]);
        tera.add_raw_templates(sources).map_err(template_error)?;
        Ok(Self { tera })
    }

    /// Renders template `name` with `context`.
    pub fn render(&self, name: &str, context: &Context) -> AdminResult<String> {
        self.tera.render(name, context).map_err(template_error)
    }
}

/// Flattens a tera error chain into one message.
fn template_error(err: tera::Error) -> AdminError {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(&err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    AdminError::Template(message)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn base_context() -> Context {
        let mut context = Context::new();
        context.insert("title", "Admin");
        context.insert("index_url", "/admin");
        context.insert("logo_url", &Option::<String>::None);
        context.insert("menu", &json!([]));
        context.insert("views", &json!([]));
        context
    }

    #[test]
    fn test_builtin_templates_parse() {
        let templates = Templates::builtin().unwrap();
        let html = templates.render("index.html", &base_context()).unwrap();
        assert!(html.contains("<title>Admin</title>"));
        assert!(html.contains("<h3>Admin</h3>"));
        assert!(html.contains("No models have been registered yet."));
    }

    #[test]
    fn test_logo_replaces_heading() {
        let templates = Templates::builtin().unwrap();
        let mut context = base_context();
        context.insert("logo_url", "https://example.com/logo.svg");
        let html = templates.render("index.html", &context).unwrap();
        assert!(html.contains(r#"<img src="https://example.com/logo.svg" width="64" height="64""#));
        assert!(!html.contains("<h3>Admin</h3>"));
    }

    #[test]
    fn test_title_is_escaped() {
        let templates = Templates::builtin().unwrap();
        let mut context = base_context();
        context.insert("title", "<Admin>");
        let html = templates.render("index.html", &context).unwrap();
        assert!(html.contains("<title>&lt;Admin&gt;</title>"));
    }

    #[test]
    fn test_menu_renders_categories() {
        let templates = Templates::builtin().unwrap();
        let mut context = base_context();
        context.insert(
            "menu",
            &json!([
                {"name": "Accounts", "icon": null, "active": false, "url": null, "is_category": true,
                 "children": [{"name": "Users", "icon": null, "active": true, "url": "/admin/user/list"}]},
            ]),
        );
        let html = templates.render("index.html", &context).unwrap();
        assert!(html.contains("Accounts"));
        assert!(html.contains(r#"<a href="/admin/user/list">Users</a>"#));
    }

    #[test]
    fn test_error_page() {
        let templates = Templates::builtin().unwrap();
        let mut context = base_context();
        context.insert("status_code", &404);
        context.insert("message", "Not found: user 7");
        let html = templates.render("error.html", &context).unwrap();
        assert!(html.contains("<h1>404</h1>"));
        assert!(html.contains("Not found: user 7"));
    }

    #[test]
    fn test_directory_override() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("index.html"),
            "{% extends \"base.html\" %}{% block content %}custom index{% endblock content %}",
        )
        .unwrap();
        let templates = Templates::load(Some(dir.path())).unwrap();
        let html = templates.render("index.html", &base_context()).unwrap();
        assert!(html.contains("custom index"));
        assert!(html.contains("<title>Admin</title>"));
    }

    #[test]
    fn test_broken_override_is_template_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("error.html"), "{% if %}").unwrap();
        let err = Templates::load(Some(dir.path())).unwrap_err();
        assert!(matches!(err, AdminError::Template(_)));
    }

    #[test]
    fn test_unknown_template() {
        let templates = Templates::builtin().unwrap();
        let err = templates.render("missing.html", &base_context()).unwrap_err();
        assert!(matches!(err, AdminError::Template(_)));
    }
}
