//! HTTP handlers for the admin pages.
//!
//! Every handler resolves the view from the `{identity}` path segment,
//! checks the view's capability flags, and renders a tera template. Errors
//! are rendered through `error.html` with the status code of the
//! [`AdminError`].

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Form, Path, Query, RawQuery, State};
use axum::response::{Html, IntoResponse, Response};
use http::header::LOCATION;
use http::{HeaderMap, StatusCode};
use percent_encoding::percent_decode_str;
use serde_json::{json, Value};
use tera::Context;
use url::Url;

use modeladmin_core::{AdminError, AdminResult, ValidationError};

use crate::db::SortDirection;
use crate::menu::MenuItem;
use crate::model::{object_identifier, value_to_string, FieldType, Record};
use crate::model_view::{ListQuery, ModelView};
use crate::redirect::SaveAction;
use crate::site::AdminState;
use crate::urls::{relative, AdminUrls};

type SharedState = State<Arc<AdminState>>;

/// An error rendered as an HTML error page.
struct PageError {
    error: AdminError,
    identity: Option<String>,
}

impl PageError {
    fn new(error: AdminError, identity: Option<&str>) -> Self {
        Self {
            error,
            identity: identity.map(str::to_string),
        }
    }
}

impl AdminState {
    fn view(&self, identity: &str) -> AdminResult<&ModelView> {
        self.admin
            .find_view(identity)
            .ok_or_else(|| AdminError::NotFound(format!("No admin view registered for '{identity}'")))
    }

    /// Builds the context shared by all pages.
    fn base_context(&self, urls: &AdminUrls, active: Option<&str>) -> Context {
        let settings = self.admin.settings();
        let menu: Vec<Value> = self
            .admin
            .menu()
            .items
            .iter()
            .map(|item| match item {
                MenuItem::View(view) => json!({
                    "is_category": false,
                    "name": view.name,
                    "icon": view.icon,
                    "url": relative(&urls.list(&view.identity)),
                    "active": active == Some(view.identity.as_str()),
                }),
                MenuItem::Category {
                    name,
                    icon,
                    children,
                } => json!({
                    "is_category": true,
                    "name": name,
                    "icon": icon,
                    "active": active.is_some_and(|id| item.is_active(id)),
                    "children": children.iter().map(|child| json!({
                        "name": child.name,
                        "icon": child.icon,
                        "url": relative(&urls.list(&child.identity)),
                        "active": active == Some(child.identity.as_str()),
                    })).collect::<Vec<_>>(),
                }),
            })
            .collect();

        let mut context = Context::new();
        context.insert("title", &settings.title);
        context.insert("logo_url", &settings.logo_url);
        context.insert("index_url", &relative(&urls.index()));
        context.insert("menu", &menu);
        context
    }

    fn render(&self, status: StatusCode, template: &str, context: &Context) -> AdminResult<Response> {
        let html = self.templates.render(template, context)?;
        Ok((status, Html(html)).into_response())
    }

    fn error_page(&self, headers: &HeaderMap, err: PageError) -> Response {
        let status = StatusCode::from_u16(err.error.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error = %err.error, "Admin request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %err.error, "Admin request rejected");
        }

        let page = self.admin.urls(headers).and_then(|urls| {
            let mut context = self.base_context(&urls, err.identity.as_deref());
            context.insert("status_code", &status.as_u16());
            context.insert("message", &err.error.to_string());
            self.render(status, "error.html", &context)
        });
        page.unwrap_or_else(|_| (status, err.error.to_string()).into_response())
    }
}

fn respond(state: &AdminState, headers: &HeaderMap, result: Result<Response, PageError>) -> Response {
    result.unwrap_or_else(|err| state.error_page(headers, err))
}

fn permission(allowed: bool, action: &str, view: &ModelView) -> AdminResult<()> {
    if allowed {
        Ok(())
    } else {
        Err(AdminError::PermissionDenied(format!(
            "Cannot {action} {}",
            view.name_plural
        )))
    }
}

fn view_json(view: &ModelView) -> Value {
    json!({
        "identity": view.identity,
        "name": view.name,
        "name_plural": view.name_plural,
        "searchable": view.is_searchable(),
        "save_as": view.save_as,
    })
}

/// Handler for `GET /`.
pub(crate) async fn index(State(state): SharedState, headers: HeaderMap) -> Response {
    let result = index_page(&state, &headers).map_err(|e| PageError::new(e, None));
    respond(&state, &headers, result)
}

fn index_page(state: &AdminState, headers: &HeaderMap) -> AdminResult<Response> {
    let urls = state.admin.urls(headers)?;
    let views: Vec<Value> = state
        .admin
        .views()
        .iter()
        .map(|view| {
            json!({
                "name": view.name,
                "name_plural": view.name_plural,
                "url": relative(&urls.list(&view.identity)),
                "create_url": view.can_create.then(|| relative(&urls.create(&view.identity))),
            })
        })
        .collect();
    let mut context = state.base_context(&urls, None);
    context.insert("views", &views);
    state.render(StatusCode::OK, "index.html", &context)
}

/// Handler for `GET /{identity}/list`.
pub(crate) async fn list(
    State(state): SharedState,
    Path(identity): Path<String>,
    Query(query): Query<ListQuery>,
    headers: HeaderMap,
) -> Response {
    let result = list_page(&state, &identity, &query, &headers)
        .await
        .map_err(|e| PageError::new(e, Some(&identity)));
    respond(&state, &headers, result)
}

async fn list_page(
    state: &AdminState,
    identity: &str,
    query: &ListQuery,
    headers: &HeaderMap,
) -> AdminResult<Response> {
    let view = state.view(identity)?;
    let settings = state.admin.settings();
    let urls = state.admin.urls(headers)?;
    let params = view.list_params(query, settings.page_size, &settings.page_size_options);
    let page = state.admin.engine().list(view.meta, &params).await?;

    let list_url = urls.list(identity);
    let link = |page_no: usize, size: usize, sort_by: Option<&str>, direction: SortDirection| {
        let mut url = list_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("page", &page_no.to_string());
            pairs.append_pair("pageSize", &size.to_string());
            if let Some(term) = params.effective_search() {
                pairs.append_pair("search", term);
            }
            if let Some(column) = sort_by {
                pairs.append_pair("sortBy", column);
                pairs.append_pair("sort", direction_name(direction));
            }
        }
        relative(&url)
    };
    let current_sort = params.sort_by.as_deref();

    let columns: Vec<Value> = view
        .list_columns()
        .into_iter()
        .map(|field| {
            let sorted = match current_sort {
                Some(column) if column == field.name => direction_name(params.direction),
                _ => "",
            };
            let next_direction = if sorted == "asc" {
                SortDirection::Desc
            } else {
                SortDirection::Asc
            };
            json!({
                "name": field.name,
                "label": field.label,
                "sorted": sorted,
                "sort_url": view.is_sortable(&field.name)
                    .then(|| link(1, page.page_size, Some(&field.name), next_direction)),
            })
        })
        .collect();

    let mut rows = Vec::with_capacity(page.rows.len());
    for record in &page.rows {
        let pk = object_identifier(view.meta, record)?;
        let cells: Vec<String> = view
            .list_columns()
            .iter()
            .map(|field| record.get(&field.name).map(value_to_string).unwrap_or_default())
            .collect();
        rows.push(json!({
            "pk": pk,
            "cells": cells,
            "details_url": view.can_view_details.then(|| relative(&urls.details(identity, &pk))),
            "edit_url": view.can_edit.then(|| relative(&urls.edit(identity, &pk))),
        }));
    }

    let page_size_options: Vec<Value> = view
        .effective_page_size_options(&settings.page_size_options)
        .into_iter()
        .map(|size| {
            json!({
                "size": size,
                "selected": size == page.page_size,
                "url": link(1, size, current_sort, params.direction),
            })
        })
        .collect();

    let pagination = json!({
        "page": page.page,
        "total_pages": page.total_pages,
        "count": page.count,
        "previous_url": page.has_previous
            .then(|| link(page.page - 1, page.page_size, current_sort, params.direction)),
        "next_url": page.has_next
            .then(|| link(page.page + 1, page.page_size, current_sort, params.direction)),
    });

    let search_placeholder = view
        .column_searchable_list
        .iter()
        .filter_map(|name| view.meta.get_field(name))
        .map(|field| field.label.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    tracing::debug!(identity, count = page.count, page = page.page, "Rendering list view");

    let mut context = state.base_context(&urls, Some(identity));
    context.insert("view", &view_json(view));
    context.insert("list_url", &relative(&list_url));
    context.insert("create_url", &view.can_create.then(|| relative(&urls.create(identity))));
    context.insert("delete_url", &view.can_delete.then(|| relative(&urls.delete(identity))));
    context.insert("search", params.effective_search().unwrap_or(""));
    context.insert("search_placeholder", &search_placeholder);
    context.insert("columns", &columns);
    context.insert("rows", &rows);
    context.insert("pagination", &pagination);
    context.insert("page_size_options", &page_size_options);
    state.render(StatusCode::OK, "list.html", &context)
}

/// Handler for `GET /{identity}/details/{pk}`.
pub(crate) async fn details(
    State(state): SharedState,
    Path((identity, pk)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    let result = details_page(&state, &identity, &pk, &headers)
        .await
        .map_err(|e| PageError::new(e, Some(&identity)));
    respond(&state, &headers, result)
}

async fn details_page(
    state: &AdminState,
    identity: &str,
    pk: &str,
    headers: &HeaderMap,
) -> AdminResult<Response> {
    let view = state.view(identity)?;
    permission(view.can_view_details, "view details of", view)?;
    let urls = state.admin.urls(headers)?;
    let record = fetch(state, view, pk).await?;

    let fields: Vec<Value> = view
        .details_columns()
        .into_iter()
        .map(|field| {
            json!({
                "label": field.label,
                "value": record.get(&field.name).map(value_to_string).unwrap_or_default(),
            })
        })
        .collect();

    let mut context = state.base_context(&urls, Some(identity));
    context.insert("view", &view_json(view));
    context.insert("pk", pk);
    context.insert("fields", &fields);
    context.insert("list_url", &relative(&urls.list(identity)));
    context.insert("edit_url", &view.can_edit.then(|| relative(&urls.edit(identity, pk))));
    context.insert("delete_url", &view.can_delete.then(|| relative(&urls.delete(identity))));
    state.render(StatusCode::OK, "details.html", &context)
}

/// Handler for `GET /{identity}/create`.
pub(crate) async fn create_form(
    State(state): SharedState,
    Path(identity): Path<String>,
    headers: HeaderMap,
) -> Response {
    let result =
        create_page(&state, &identity, &headers).map_err(|e| PageError::new(e, Some(&identity)));
    respond(&state, &headers, result)
}

fn create_page(state: &AdminState, identity: &str, headers: &HeaderMap) -> AdminResult<Response> {
    let view = state.view(identity)?;
    permission(view.can_create, "create", view)?;
    let values = default_values(view);
    form_page(state, view, None, &values, &ValidationError::default(), headers)
}

/// Handler for `POST /{identity}/create`.
pub(crate) async fn create(
    State(state): SharedState,
    Path(identity): Path<String>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let result = create_submit(&state, &identity, &form, &headers)
        .await
        .map_err(|e| PageError::new(e, Some(&identity)));
    respond(&state, &headers, result)
}

async fn create_submit(
    state: &AdminState,
    identity: &str,
    form: &HashMap<String, String>,
    headers: &HeaderMap,
) -> AdminResult<Response> {
    let view = state.view(identity)?;
    permission(view.can_create, "create", view)?;
    let record = match view.parse_form(form) {
        Ok(record) => record,
        Err(errors) => return form_page(state, view, None, form, &errors, headers),
    };
    let saved = state.admin.engine().insert(view.meta, record).await?;
    let new_pk = object_identifier(view.meta, &saved)?;
    tracing::info!(identity, pk = %new_pk, "Created object");
    let target = state.admin.get_save_redirect_url(headers, form, view, &saved)?;
    Ok(redirect(&target))
}

/// Handler for `GET /{identity}/edit/{pk}`.
pub(crate) async fn edit_form(
    State(state): SharedState,
    Path((identity, pk)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    let result = edit_page(&state, &identity, &pk, &headers)
        .await
        .map_err(|e| PageError::new(e, Some(&identity)));
    respond(&state, &headers, result)
}

async fn edit_page(
    state: &AdminState,
    identity: &str,
    pk: &str,
    headers: &HeaderMap,
) -> AdminResult<Response> {
    let view = state.view(identity)?;
    permission(view.can_edit, "edit", view)?;
    let record = fetch(state, view, pk).await?;
    let values = record_values(view, &record);
    form_page(state, view, Some(pk), &values, &ValidationError::default(), headers)
}

/// Handler for `POST /{identity}/edit/{pk}`.
pub(crate) async fn edit(
    State(state): SharedState,
    Path((identity, pk)): Path<(String, String)>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let result = edit_submit(&state, &identity, &pk, &form, &headers)
        .await
        .map_err(|e| PageError::new(e, Some(&identity)));
    respond(&state, &headers, result)
}

async fn edit_submit(
    state: &AdminState,
    identity: &str,
    pk: &str,
    form: &HashMap<String, String>,
    headers: &HeaderMap,
) -> AdminResult<Response> {
    let view = state.view(identity)?;
    permission(view.can_edit, "edit", view)?;
    fetch(state, view, pk).await?;
    let record = match view.parse_form(form) {
        Ok(record) => record,
        Err(errors) => return form_page(state, view, Some(pk), form, &errors, headers),
    };

    let action = SaveAction::from_label(form.get("save").map(String::as_str));
    let engine = state.admin.engine();
    let saved = if action == SaveAction::SaveAsNew && view.save_as {
        let saved = engine.insert(view.meta, record).await?;
        let new_pk = object_identifier(view.meta, &saved)?;
        tracing::info!(identity, from = pk, pk = %new_pk, "Saved object as new");
        saved
    } else {
        let saved = engine.update(view.meta, pk, record).await?;
        let new_pk = object_identifier(view.meta, &saved)?;
        tracing::info!(identity, pk = %new_pk, previous = pk, "Updated object");
        saved
    };
    let target = state.admin.get_save_redirect_url(headers, form, view, &saved)?;
    Ok(redirect(&target))
}

/// Handler for `DELETE /{identity}/delete?pks=a,b`.
///
/// Responds with the list URL so the page can navigate back.
pub(crate) async fn delete(
    State(state): SharedState,
    Path(identity): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Response {
    let pks = selected_pks(query.as_deref());
    let result = delete_objects(&state, &identity, &pks, &headers)
        .await
        .map_err(|e| PageError::new(e, Some(&identity)));
    respond(&state, &headers, result)
}

async fn delete_objects(
    state: &AdminState,
    identity: &str,
    pks: &[String],
    headers: &HeaderMap,
) -> AdminResult<Response> {
    let view = state.view(identity)?;
    permission(view.can_delete, "delete", view)?;
    let urls = state.admin.urls(headers)?;

    if pks.is_empty() {
        return Err(AdminError::BadRequest("No objects selected".into()));
    }

    let mut deleted = 0usize;
    for pk in pks {
        if state.admin.engine().delete(view.meta, pk).await? {
            deleted += 1;
        } else {
            tracing::warn!(identity, pk, "Object to delete was not found");
        }
    }
    tracing::info!(identity, requested = pks.len(), deleted, "Deleted objects");
    Ok(urls.list(identity).to_string().into_response())
}

/// Extracts the selected keys from the raw delete query.
///
/// Keys are split on literal commas before decoding, so a key containing a
/// comma must arrive percent-encoded. Repeated `pks` parameters are merged.
fn selected_pks(query: Option<&str>) -> Vec<String> {
    query
        .unwrap_or_default()
        .split('&')
        .filter_map(|pair| pair.strip_prefix("pks="))
        .flat_map(|value| value.split(','))
        .map(|raw| {
            percent_decode_str(&raw.replace('+', " "))
                .decode_utf8_lossy()
                .trim()
                .to_string()
        })
        .filter(|pk| !pk.is_empty())
        .collect()
}

const fn direction_name(direction: SortDirection) -> &'static str {
    match direction {
        SortDirection::Asc => "asc",
        SortDirection::Desc => "desc",
    }
}

fn redirect(target: &Url) -> Response {
    (StatusCode::FOUND, [(LOCATION, target.as_str())]).into_response()
}

async fn fetch(state: &AdminState, view: &ModelView, pk: &str) -> AdminResult<Record> {
    state
        .admin
        .engine()
        .get(view.meta, pk)
        .await?
        .ok_or_else(|| AdminError::NotFound(format!("{} with identifier '{pk}' not found", view.name)))
}

/// Initial form values for a new object.
fn default_values(view: &ModelView) -> HashMap<String, String> {
    view.form_fields()
        .into_iter()
        .filter_map(|field| {
            let default = view.meta.get_field(&field.attribute)?.default.as_ref()?;
            Some((field.name, form_value(view, &field.attribute, default)))
        })
        .collect()
}

/// Form values of a stored object, keyed by form field name.
fn record_values(view: &ModelView, record: &Record) -> HashMap<String, String> {
    view.form_fields()
        .into_iter()
        .filter_map(|field| {
            let value = record.get(&field.attribute)?;
            Some((field.name, form_value(view, &field.attribute, value)))
        })
        .collect()
}

fn form_value(view: &ModelView, attribute: &str, value: &Value) -> String {
    let field_type = view.meta.get_field(attribute).map(|f| f.field_type);
    match (field_type, value) {
        (Some(FieldType::Boolean), Value::Bool(true)) => "on".into(),
        (Some(FieldType::Boolean), Value::Number(n)) if n.as_i64() == Some(1) => "on".into(),
        (Some(FieldType::Boolean), _) => String::new(),
        (Some(FieldType::DateTime), Value::String(s)) => s.replacen(' ', "T", 1),
        _ => value_to_string(value),
    }
}

fn form_page(
    state: &AdminState,
    view: &ModelView,
    pk: Option<&str>,
    values: &HashMap<String, String>,
    errors: &ValidationError,
    headers: &HeaderMap,
) -> AdminResult<Response> {
    let urls = state.admin.urls(headers)?;
    let fields: Vec<Value> = view
        .form_fields()
        .into_iter()
        .map(|field| {
            let value = values.get(&field.name).cloned().unwrap_or_default();
            let checked = field.input_type == "checkbox" && !value.is_empty();
            let field_errors = errors.field(&field.name);
            json!({
                "name": field.name,
                "label": field.label,
                "input_type": field.input_type,
                "required": field.required,
                "max_length": field.max_length,
                "help_text": field.help_text,
                "value": value,
                "checked": checked,
                "errors": field_errors,
            })
        })
        .collect();

    let action_url = pk.map_or_else(|| urls.create(&view.identity), |pk| urls.edit(&view.identity, pk));
    let status = if errors.has_errors() {
        tracing::warn!(identity = %view.identity, errors = %errors, "Form submission rejected");
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::OK
    };

    let mut context = state.base_context(&urls, Some(&view.identity));
    context.insert("view", &view_json(view));
    context.insert("pk", &pk);
    context.insert("fields", &fields);
    context.insert("error", &errors.message);
    context.insert("action_url", &relative(&action_url));
    context.insert("list_url", &relative(&urls.list(&view.identity)));
    state.render(status, "form.html", &context)
}
