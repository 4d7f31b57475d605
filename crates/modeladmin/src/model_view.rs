//! Per-model admin configuration.
//!
//! A [`ModelView`] controls how one model is listed, displayed, and edited.
//! It is built with a builder pattern from the model's [`ModelMeta`]:
//!
//! ```
//! use std::sync::LazyLock;
//!
//! use modeladmin::model::{FieldDef, Model, ModelMeta};
//! use modeladmin::model_view::ModelView;
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
//! let view = ModelView::for_model::<User>()
//!     .category("Accounts")
//!     .column_searchable_list(["name"])
//!     .save_as(true);
//! assert_eq!(view.identity, "user");
//! assert_eq!(view.name_plural, "Users");
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use modeladmin_core::ValidationError;

use crate::db::{ListParams, SortDirection};
use crate::forms::{coerce_form, form_field_name};
use crate::model::{FieldDef, FieldType, Model, ModelMeta, Record};

/// A form input generated for one model field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormField {
    /// The input name, normalized for reserved attributes.
    pub name: String,
    /// The model attribute behind the input.
    pub attribute: String,
    /// Human-readable label.
    pub label: String,
    /// The HTML input type.
    pub input_type: String,
    /// Whether the input must be filled in.
    pub required: bool,
    /// Maximum length for bounded strings.
    pub max_length: Option<usize>,
    /// Help text shown under the input.
    pub help_text: String,
}

/// Query string accepted by the list view.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    /// Requested page.
    pub page: Option<usize>,
    /// Requested page size.
    pub page_size: Option<usize>,
    /// Search term.
    pub search: Option<String>,
    /// Column to sort by.
    pub sort_by: Option<String>,
    /// `asc` or `desc`.
    pub sort: Option<String>,
}

/// Configuration for how a model is managed in the admin.
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct ModelView {
    /// Metadata of the managed model.
    pub meta: &'static ModelMeta,
    /// URL slug, derived from the model class name.
    pub identity: String,
    /// Singular display name.
    pub name: String,
    /// Plural display name.
    pub name_plural: String,
    /// Optional icon CSS class.
    pub icon: Option<String>,
    /// Menu category this view is grouped under.
    pub category: Option<String>,
    /// Icon CSS class of the category.
    pub category_icon: Option<String>,
    /// Columns shown in the list view; empty means every field.
    pub column_list: Vec<String>,
    /// Columns shown in the details view; empty means every field.
    pub column_details_list: Vec<String>,
    /// Columns the search box applies to.
    pub column_searchable_list: Vec<String>,
    /// Columns the list can be sorted by.
    pub column_sortable_list: Vec<String>,
    /// Sort used when the request does not ask for one.
    pub column_default_sort: Option<(String, SortDirection)>,
    /// Fields included in forms; empty means every non-key field.
    pub form_columns: Vec<String>,
    /// Fields excluded from forms.
    pub form_excluded_columns: Vec<String>,
    /// Default number of rows per page, overriding the site default.
    pub page_size: Option<usize>,
    /// Page sizes offered in the list view, overriding the site default.
    pub page_size_options: Option<Vec<usize>>,
    /// Whether records can be created.
    pub can_create: bool,
    /// Whether records can be edited.
    pub can_edit: bool,
    /// Whether records can be deleted.
    pub can_delete: bool,
    /// Whether the details page is available.
    pub can_view_details: bool,
    /// Offers a "Save as new" button on the edit form.
    pub save_as: bool,
    /// After "Save as new", continue editing the new record instead of
    /// opening a blank create form.
    pub save_as_continue: bool,
}

fn strings<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}

impl ModelView {
    /// Creates a view for a model with default configuration.
    pub fn new(meta: &'static ModelMeta) -> Self {
        let name = meta.display_name();
        Self {
            meta,
            identity: meta.identity(),
            name_plural: format!("{name}s"),
            name,
            icon: None,
            category: None,
            category_icon: None,
            column_list: Vec::new(),
            column_details_list: Vec::new(),
            column_searchable_list: Vec::new(),
            column_sortable_list: Vec::new(),
            column_default_sort: None,
            form_columns: Vec::new(),
            form_excluded_columns: Vec::new(),
            page_size: None,
            page_size_options: None,
            can_create: true,
            can_edit: true,
            can_delete: true,
            can_view_details: true,
            save_as: false,
            save_as_continue: true,
        }
    }

    /// Creates a view for a [`Model`] type.
    pub fn for_model<M: Model>() -> Self {
        Self::new(M::meta())
    }

    /// Sets the singular display name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the plural display name.
    #[must_use]
    pub fn name_plural(mut self, name: impl Into<String>) -> Self {
        self.name_plural = name.into();
        self
    }

    /// Overrides the URL slug.
    #[must_use]
    pub fn identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = identity.into();
        self
    }

    /// Sets the icon.
    #[must_use]
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Groups the view under a menu category.
    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Sets the category icon.
    #[must_use]
    pub fn category_icon(mut self, icon: impl Into<String>) -> Self {
        self.category_icon = Some(icon.into());
        self
    }

    /// Sets the list columns.
    #[must_use]
    pub fn column_list<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.column_list = strings(columns);
        self
    }

    /// Sets the details columns.
    #[must_use]
    pub fn column_details_list<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.column_details_list = strings(columns);
        self
    }

    /// Sets the searchable columns.
    #[must_use]
    pub fn column_searchable_list<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.column_searchable_list = strings(columns);
        self
    }

    /// Sets the sortable columns.
    #[must_use]
    pub fn column_sortable_list<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.column_sortable_list = strings(columns);
        self
    }

    /// Sets the default sort.
    #[must_use]
    pub fn column_default_sort(
        mut self,
        column: impl Into<String>,
        direction: SortDirection,
    ) -> Self {
        self.column_default_sort = Some((column.into(), direction));
        self
    }

    /// Sets the form fields.
    #[must_use]
    pub fn form_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.form_columns = strings(columns);
        self
    }

    /// Sets the fields excluded from forms.
    #[must_use]
    pub fn form_excluded_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.form_excluded_columns = strings(columns);
        self
    }

    /// Sets the default page size.
    #[must_use]
    pub const fn page_size(mut self, size: usize) -> Self {
        self.page_size = Some(size);
        self
    }

    /// Sets the page size options.
    #[must_use]
    pub fn page_size_options(mut self, options: Vec<usize>) -> Self {
        self.page_size_options = Some(options);
        self
    }

    /// Enables or disables creating records.
    #[must_use]
    pub const fn can_create(mut self, enabled: bool) -> Self {
        self.can_create = enabled;
        self
    }

    /// Enables or disables editing records.
    #[must_use]
    pub const fn can_edit(mut self, enabled: bool) -> Self {
        self.can_edit = enabled;
        self
    }

    /// Enables or disables deleting records.
    #[must_use]
    pub const fn can_delete(mut self, enabled: bool) -> Self {
        self.can_delete = enabled;
        self
    }

    /// Enables or disables the details page.
    #[must_use]
    pub const fn can_view_details(mut self, enabled: bool) -> Self {
        self.can_view_details = enabled;
        self
    }

    /// Enables the "Save as new" button.
    #[must_use]
    pub const fn save_as(mut self, enabled: bool) -> Self {
        self.save_as = enabled;
        self
    }

    /// Chooses where "Save as new" leads.
    #[must_use]
    pub const fn save_as_continue(mut self, enabled: bool) -> Self {
        self.save_as_continue = enabled;
        self
    }

    fn resolve_columns(&self, configured: &[String]) -> Vec<&FieldDef> {
        if configured.is_empty() {
            self.meta.fields.iter().collect()
        } else {
            configured
                .iter()
                .filter_map(|name| self.meta.get_field(name))
                .collect()
        }
    }

    /// Returns the fields shown in the list view.
    pub fn list_columns(&self) -> Vec<&FieldDef> {
        self.resolve_columns(&self.column_list)
    }

    /// Returns the fields shown on the details page.
    pub fn details_columns(&self) -> Vec<&FieldDef> {
        self.resolve_columns(&self.column_details_list)
    }

    /// Returns the model fields editable through forms.
    ///
    /// Engine-generated primary keys are left out; natural keys are editable.
    pub fn form_model_fields(&self) -> Vec<&FieldDef> {
        self.resolve_columns(&self.form_columns)
            .into_iter()
            .filter(|f| {
                !(f.primary_key && f.auto_increment) && !self.form_excluded_columns.contains(&f.name)
            })
            .collect()
    }

    /// Returns the form inputs for this view.
    pub fn form_fields(&self) -> Vec<FormField> {
        self.form_model_fields()
            .into_iter()
            .map(|field| FormField {
                name: form_field_name(&field.name),
                attribute: field.name.clone(),
                label: field.label.clone(),
                input_type: field.field_type.input_type().to_string(),
                required: field.is_required(),
                max_length: match field.field_type {
                    FieldType::String { max_length } => max_length,
                    _ => None,
                },
                help_text: field.help_text.clone(),
            })
            .collect()
    }

    /// Returns whether the list can be sorted by `column`.
    pub fn is_sortable(&self, column: &str) -> bool {
        self.column_sortable_list.iter().any(|c| c == column)
    }

    /// Returns whether the list view offers a search box.
    pub fn is_searchable(&self) -> bool {
        !self.column_searchable_list.is_empty()
    }

    /// Returns the effective page size options.
    pub fn effective_page_size_options(&self, site_default: &[usize]) -> Vec<usize> {
        self.page_size_options
            .clone()
            .unwrap_or_else(|| site_default.to_vec())
    }

    /// Builds engine list parameters from a list query.
    ///
    /// Sorting by a column outside `column_sortable_list` falls back to the
    /// default sort; page sizes outside the offered options fall back to the
    /// view's default.
    pub fn list_params(
        &self,
        query: &ListQuery,
        site_page_size: usize,
        site_options: &[usize],
    ) -> ListParams {
        let default_size = self.page_size.unwrap_or(site_page_size);
        let options = self.effective_page_size_options(site_options);
        let page_size = query
            .page_size
            .filter(|size| options.contains(size))
            .unwrap_or(default_size);

        let mut params = ListParams::new()
            .page(query.page.unwrap_or(1))
            .page_size(page_size);

        if let Some(term) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
            params = params.search(term, self.column_searchable_list.clone());
        }

        let requested = query.sort_by.as_deref().filter(|c| self.is_sortable(c));
        if let Some(column) = requested {
            let direction = if query.sort.as_deref() == Some("desc") {
                SortDirection::Desc
            } else {
                SortDirection::Asc
            };
            params = params.sort(column, direction);
        } else if let Some((column, direction)) = &self.column_default_sort {
            params = params.sort(column.clone(), *direction);
        }
        params
    }

    /// Validates submitted form data into a record of model attributes.
    pub fn parse_form(&self, form: &HashMap<String, String>) -> Result<Record, ValidationError> {
        coerce_form(&self.form_model_fields(), form)
    }
}
