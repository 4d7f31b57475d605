//! # modeladmin
//!
//! An admin interface for axum applications. Models describe their fields
//! through [`model::ModelMeta`]; each registered [`model_view::ModelView`]
//! gets list, details, create, edit, and delete pages backed by an
//! [`db::Engine`].
//!
//! ## Modules
//!
//! - [`model`] - Model metadata and record conversion
//! - [`db`] - The engine trait, list parameters, and an in-memory engine
//! - [`sqlite`] - A SQLite engine (feature `sqlite`)
//! - [`model_view`] - Per-model admin configuration
//! - [`forms`] - Form field naming and value coercion
//! - [`redirect`] - Post-save redirect targets
//! - [`urls`] - Absolute URLs for admin pages
//! - [`menu`] - Sidebar navigation
//! - [`templates`] - Built-in tera templates
//! - [`site`] - The [`Admin`] site and its router

pub mod db;
pub mod forms;
pub mod menu;
pub mod model;
pub mod model_view;
pub mod redirect;
pub mod site;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod templates;
pub mod urls;
mod views;

pub use db::{Engine, InMemoryEngine, ListParams, Page, SortDirection};
pub use model::{FieldDef, FieldType, Model, ModelMeta, Record};
pub use model_view::ModelView;
pub use modeladmin_core::{AdminError, AdminResult, AdminSettings, ValidationError};
pub use redirect::SaveAction;
pub use site::Admin;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteEngine;
