//! The admin site: view registry, navigation, and router generation.
//!
//! [`Admin`] holds the registered [`ModelView`]s and the [`Engine`] they
//! read and write through. It produces an axum sub-application that is
//! nested into the host application under the configured base URL.
//!
//! # Examples
//!
//! ```
//! use std::sync::{Arc, LazyLock};
//!
//! use axum::Router;
//! use modeladmin::db::InMemoryEngine;
//! use modeladmin::model::{FieldDef, Model, ModelMeta};
//! use modeladmin::model_view::ModelView;
//! use modeladmin::site::Admin;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct User {
//!     id: i64,
//!     name: String,
//! }
//!
//! impl Model for User {
//!     fn meta() -> &'static ModelMeta {
//!         static META: LazyLock<ModelMeta> = LazyLock::new(|| {
//!             ModelMeta::new("User", "users")
//!                 .field(FieldDef::integer("id").primary_key())
//!                 .field(FieldDef::string("name", Some(32)))
//!         });
//!         &META
//!     }
//! }
//!
//! let mut admin = Admin::new(Arc::new(InMemoryEngine::new())).title("Backoffice");
//! admin.add_view(ModelView::for_model::<User>().category("Accounts"));
//! let app = admin.mount(Router::new()).unwrap();
//! ```

use std::collections::HashMap;
use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::Request;
use axum::response::IntoResponse;
use axum::routing::{delete, get, Route};
use axum::Router;
use http::HeaderMap;
use tower::{Layer, Service};
use tower_http::trace::TraceLayer;
use url::Url;

use modeladmin_core::logging::request_span;
use modeladmin_core::settings::normalize_base_url;
use modeladmin_core::{AdminResult, AdminSettings};

use crate::db::Engine;
use crate::forms;
use crate::menu::{Menu, MenuItem, ViewMenu};
use crate::model::{object_identifier, to_record, Model, ModelMeta, Record};
use crate::model_view::ModelView;
use crate::redirect::{save_redirect_url, SaveAction};
use crate::templates::Templates;
use crate::urls::AdminUrls;
use crate::views;

type Middleware = Arc<dyn Fn(Router) -> Router + Send + Sync>;

/// An admin site.
#[derive(Clone)]
pub struct Admin {
    settings: AdminSettings,
    engine: Arc<dyn Engine>,
    views: Vec<ModelView>,
    menu: Menu,
    middlewares: Vec<Middleware>,
}

impl Admin {
    /// Creates a site with default settings.
    pub fn new(engine: Arc<dyn Engine>) -> Self {
        Self::with_settings(AdminSettings::default(), engine)
    }

    /// Creates a site from loaded settings.
    pub fn with_settings(mut settings: AdminSettings, engine: Arc<dyn Engine>) -> Self {
        settings.base_url = settings.normalized_base_url();
        Self {
            settings,
            engine,
            views: Vec::new(),
            menu: Menu::new(),
            middlewares: Vec::new(),
        }
    }

    /// Sets the title shown in the page title and the sidebar.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.settings.title = title.into();
        self
    }

    /// Sets a logo shown instead of the sidebar title.
    #[must_use]
    pub fn logo_url(mut self, url: impl Into<String>) -> Self {
        self.settings.logo_url = Some(url.into());
        self
    }

    /// Sets the path the site is mounted under.
    #[must_use]
    pub fn base_url(mut self, base_url: &str) -> Self {
        self.settings.base_url = normalize_base_url(base_url);
        self
    }

    /// Sets a directory whose templates override the built-in ones.
    #[must_use]
    pub fn templates_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.settings.templates_dir = Some(dir.into());
        self
    }

    /// Adds a tower layer around the admin sub-application.
    ///
    /// Layers are applied in the order they are added, so the last one
    /// added is the outermost.
    #[must_use]
    pub fn middleware<L>(mut self, layer: L) -> Self
    where
        L: Layer<Route> + Clone + Send + Sync + 'static,
        L::Service: Service<Request> + Clone + Send + Sync + 'static,
        <L::Service as Service<Request>>::Response: IntoResponse + 'static,
        <L::Service as Service<Request>>::Error: Into<Infallible> + 'static,
        <L::Service as Service<Request>>::Future: Send + 'static,
    {
        self.middlewares
            .push(Arc::new(move |router: Router| router.layer(layer.clone())));
        self
    }

    /// Returns the effective settings.
    pub const fn settings(&self) -> &AdminSettings {
        &self.settings
    }

    /// Returns the engine views read and write through.
    pub fn engine(&self) -> &Arc<dyn Engine> {
        &self.engine
    }

    /// Registers a view and adds it to the menu.
    ///
    /// Registering a second view with the same identity replaces the first.
    pub fn add_view(&mut self, view: ModelView) {
        if let Some(index) = self.views.iter().position(|v| v.identity == view.identity) {
            tracing::warn!(identity = %view.identity, "Replacing already registered view");
            self.menu.remove(&view.identity);
            self.views.remove(index);
        }

        let entry = ViewMenu {
            name: view.name_plural.clone(),
            identity: view.identity.clone(),
            icon: view.icon.clone(),
        };
        let item = match &view.category {
            Some(category) => MenuItem::Category {
                name: category.clone(),
                icon: view.category_icon.clone(),
                children: vec![entry],
            },
            None => MenuItem::View(entry),
        };
        self.menu.add(item);

        tracing::debug!(
            identity = %view.identity,
            model = %view.meta.name,
            category = view.category.as_deref().unwrap_or(""),
            "Registered admin view"
        );
        self.views.push(view);
    }

    /// Returns the registered views in registration order.
    pub fn views(&self) -> &[ModelView] {
        &self.views
    }

    /// Returns the sidebar menu.
    pub const fn menu(&self) -> &Menu {
        &self.menu
    }

    /// Looks up a view by identity.
    pub fn find_view(&self, identity: &str) -> Option<&ModelView> {
        self.views.iter().find(|v| v.identity == identity)
    }

    /// Returns a URL builder for the origin of a request.
    pub fn urls(&self, headers: &HeaderMap) -> AdminResult<AdminUrls> {
        AdminUrls::from_headers(headers, self.settings.base_url.clone())
    }

    /// Returns where to redirect after saving `record` through `view`.
    ///
    /// The action is read from the `save` field of the submitted form.
    pub fn get_save_redirect_url(
        &self,
        headers: &HeaderMap,
        form: &HashMap<String, String>,
        view: &ModelView,
        record: &Record,
    ) -> AdminResult<Url> {
        let urls = self.urls(headers)?;
        let action = SaveAction::from_label(form.get("save").map(String::as_str));
        let pk = object_identifier(view.meta, record)?;
        Ok(save_redirect_url(&urls, action, view, &pk))
    }

    /// Returns the reserved attributes of `obj` under their form names.
    pub fn normalize_form_data<M: Model>(&self, obj: &M) -> AdminResult<Record> {
        Ok(forms::normalize_form_data(&to_record(obj)?))
    }

    /// Maps form names back to the attribute names of `meta`.
    pub fn denormalize_form_data(&self, form: &Record, meta: &ModelMeta) -> Record {
        forms::denormalize_form_data(form, meta)
    }

    /// Builds the admin sub-application.
    ///
    /// Routes are relative to the base URL; use [`Admin::mount`] to nest
    /// them into a host application.
    pub fn router(&self) -> AdminResult<Router> {
        let templates = Templates::load(self.settings.templates_dir.as_deref())?;
        let state = Arc::new(AdminState {
            admin: self.clone(),
            templates,
        });

        let mut router = Router::new()
            .route("/", get(views::index))
            .route("/{identity}/list", get(views::list))
            .route("/{identity}/details/{pk}", get(views::details))
            .route(
                "/{identity}/create",
                get(views::create_form).post(views::create),
            )
            .route(
                "/{identity}/edit/{pk}",
                get(views::edit_form).post(views::edit),
            )
            .route("/{identity}/delete", delete(views::delete))
            .with_state(state)
            .layer(TraceLayer::new_for_http().make_span_with(|req: &Request| {
                request_span(req.method().as_str(), req.uri().path())
            }));

        for middleware in &self.middlewares {
            router = middleware(router);
        }
        Ok(router)
    }

    /// Nests the admin sub-application into `app` under the base URL.
    pub fn mount(&self, app: Router) -> AdminResult<Router> {
        let router = self.router()?;
        let base_url = &self.settings.base_url;
        tracing::info!(
            base_url = %base_url,
            views = self.views.len(),
            middlewares = self.middlewares.len(),
            "Mounting admin site"
        );
        if base_url.is_empty() {
            Ok(app.merge(router))
        } else {
            Ok(app.nest(base_url, router))
        }
    }
}

impl std::fmt::Debug for Admin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let identities: Vec<&str> = self.views.iter().map(|v| v.identity.as_str()).collect();
        f.debug_struct("Admin")
            .field("title", &self.settings.title)
            .field("base_url", &self.settings.base_url)
            .field("views", &identities.join(", "))
            .field("middlewares", &self.middlewares.len())
            .finish_non_exhaustive()
    }
}

/// Shared state for the admin handlers.
pub(crate) struct AdminState {
    pub(crate) admin: Admin,
    pub(crate) templates: Templates,
}
