//! End-to-end create, read, update, and delete flows through the admin pages.

mod common;

use std::sync::Arc;

use axum::Router;
use serde_json::json;

use modeladmin::db::Engine;
use modeladmin::{Admin, InMemoryEngine, Model, ModelView, SortDirection, SqliteEngine};
use modeladmin_test::TestClient;

use common::{Book, Tag};

fn book_view() -> ModelView {
    ModelView::for_model::<Book>()
        .column_list(["id", "title", "pages"])
        .column_searchable_list(["title"])
        .column_sortable_list(["title", "pages"])
        .column_default_sort("id", SortDirection::Asc)
        .save_as(true)
}

fn client_for(engine: Arc<dyn Engine>, view: ModelView) -> TestClient {
    let mut admin = Admin::new(engine);
    admin.add_view(view);
    TestClient::new(admin.mount(Router::new()).unwrap())
}

async fn seed(engine: &dyn Engine, titles: &[&str]) {
    for (i, title) in titles.iter().enumerate() {
        let record = json!({"title": title, "pages": (i + 1) * 100, "available": true, "published": null});
        engine
            .insert(Book::meta(), record.as_object().cloned().unwrap())
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_create_form_renders_inputs() {
    let client = client_for(Arc::new(InMemoryEngine::new()), book_view());
    let response = client.get("/admin/book/create").await;
    assert_eq!(response.status_code(), 200);
    assert!(response.contains(r#"name="title""#));
    assert!(response.contains(r#"maxlength="100""#));
    assert!(response.contains(r#"type="checkbox""#));
    assert!(response.contains(r#"type="date""#));
    assert!(response.contains(r#"value="Save and add another""#));
    assert!(!response.contains(r#"name="id""#));
}

#[tokio::test]
async fn test_create_redirects_and_stores() {
    let engine = Arc::new(InMemoryEngine::new());
    let client = client_for(engine.clone(), book_view());

    let response = client
        .post(
            "/admin/book/create",
            &[("title", "Dune"), ("pages", "412"), ("available", "on"), ("save", "Save")],
        )
        .await;
    assert_eq!(response.status_code(), 302);
    assert_eq!(response.location(), Some("http://testserver/admin/book/list"));

    let rows = engine.all_rows("books");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["title"], "Dune");
    assert_eq!(rows[0]["pages"], 412);
    assert_eq!(rows[0]["available"], true);
    assert_eq!(rows[0]["published"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_create_and_continue_editing() {
    let client = client_for(Arc::new(InMemoryEngine::new()), book_view());
    let response = client
        .post(
            "/admin/book/create",
            &[("title", "Dune"), ("save", "Save and continue editing")],
        )
        .await;
    assert_eq!(response.location(), Some("http://testserver/admin/book/edit/1"));

    let response = client
        .post("/admin/book/create", &[("title", "Emma"), ("save", "Save and add another")])
        .await;
    assert_eq!(response.location(), Some("http://testserver/admin/book/create"));
}

#[tokio::test]
async fn test_create_validation_errors() {
    let engine = Arc::new(InMemoryEngine::new());
    let client = client_for(engine.clone(), book_view());

    let response = client
        .post("/admin/book/create", &[("title", ""), ("pages", "many"), ("save", "Save")])
        .await;
    assert_eq!(response.status_code(), 400);
    assert!(response.contains("This field is required."));
    assert!(response.contains("Not a valid integer value."));
    assert!(response.contains(r#"value="many""#));
    assert_eq!(engine.count("books"), 0);
}

#[tokio::test]
async fn test_list_search_sort_and_paginate() {
    let engine = Arc::new(InMemoryEngine::new());
    seed(engine.as_ref(), &["Ulysses", "Beloved", "Dune", "Dracula", "Emma"]).await;
    let client = client_for(engine, book_view().page_size(2).page_size_options(vec![2, 5]));

    let response = client.get("/admin/book/list").await;
    assert_eq!(response.status_code(), 200);
    assert!(response.contains("<td>Ulysses</td>"));
    assert!(response.contains("<td>Beloved</td>"));
    assert!(!response.contains("<td>Dune</td>"));
    assert!(response.contains("Page 1 of 3"));

    let response = client.get("/admin/book/list?page=3").await;
    assert!(response.contains("<td>Emma</td>"));
    assert!(response.contains("Page 3 of 3"));

    let response = client.get("/admin/book/list?search=du&pageSize=5").await;
    assert!(response.contains("<td>Dune</td>"));
    assert!(!response.contains("<td>Dracula</td>"));
    assert!(response.contains("Showing 1 of 1"));

    let response = client
        .get("/admin/book/list?sortBy=title&sort=desc&pageSize=5")
        .await;
    let text = response.text();
    let ulysses = text.find("<td>Ulysses</td>").unwrap();
    let beloved = text.find("<td>Beloved</td>").unwrap();
    assert!(ulysses < beloved);
}

#[tokio::test]
async fn test_details_page() {
    let engine = Arc::new(InMemoryEngine::new());
    seed(engine.as_ref(), &["Dune"]).await;
    let client = client_for(engine, book_view());

    let response = client.get("/admin/book/details/1").await;
    assert_eq!(response.status_code(), 200);
    assert!(response.contains("<th>Title</th><td>Dune</td>"));
    assert!(response.contains(r#"href="/admin/book/edit/1""#));

    assert_eq!(client.get("/admin/book/details/99").await.status_code(), 404);
}

#[tokio::test]
async fn test_edit_updates_record() {
    let engine = Arc::new(InMemoryEngine::new());
    seed(engine.as_ref(), &["Dune"]).await;
    let client = client_for(engine.clone(), book_view());

    let response = client.get("/admin/book/edit/1").await;
    assert_eq!(response.status_code(), 200);
    assert!(response.contains(r#"value="Dune""#));
    assert!(response.contains(r#"value="Save as new""#));

    let response = client
        .post(
            "/admin/book/edit/1",
            &[("title", "Dune Messiah"), ("pages", "256"), ("save", "Save")],
        )
        .await;
    assert_eq!(response.status_code(), 302);
    assert_eq!(response.location(), Some("http://testserver/admin/book/list"));

    let rows = engine.all_rows("books");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["title"], "Dune Messiah");
    assert_eq!(rows[0]["available"], false);
}

#[tokio::test]
async fn test_edit_save_as_new_inserts_copy() {
    let engine = Arc::new(InMemoryEngine::new());
    seed(engine.as_ref(), &["Dune"]).await;
    let client = client_for(engine.clone(), book_view());

    let response = client
        .post(
            "/admin/book/edit/1",
            &[("title", "Dune (2nd edition)"), ("save", "Save as new")],
        )
        .await;
    assert_eq!(response.location(), Some("http://testserver/admin/book/edit/2"));

    let rows = engine.all_rows("books");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["title"], "Dune");
    assert_eq!(rows[1]["title"], "Dune (2nd edition)");
}

#[tokio::test]
async fn test_edit_missing_record() {
    let client = client_for(Arc::new(InMemoryEngine::new()), book_view());
    assert_eq!(client.get("/admin/book/edit/5").await.status_code(), 404);
    let response = client
        .post("/admin/book/edit/5", &[("title", "Ghost"), ("save", "Save")])
        .await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_delete_returns_list_url() {
    let engine = Arc::new(InMemoryEngine::new());
    seed(engine.as_ref(), &["Ulysses", "Beloved", "Dune"]).await;
    let client = client_for(engine.clone(), book_view());

    let response = client.delete("/admin/book/delete?pks=1,3").await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.text(), "http://testserver/admin/book/list");

    let rows = engine.all_rows("books");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["title"], "Beloved");

    assert_eq!(client.delete("/admin/book/delete").await.status_code(), 400);
}

#[tokio::test]
async fn test_disabled_capabilities_are_forbidden() {
    let engine = Arc::new(InMemoryEngine::new());
    seed(engine.as_ref(), &["Dune"]).await;
    let view = book_view()
        .can_create(false)
        .can_edit(false)
        .can_delete(false)
        .can_view_details(false);
    let client = client_for(engine.clone(), view);

    assert_eq!(client.get("/admin/book/create").await.status_code(), 403);
    assert_eq!(
        client
            .post("/admin/book/create", &[("title", "Emma")])
            .await
            .status_code(),
        403
    );
    assert_eq!(client.get("/admin/book/edit/1").await.status_code(), 403);
    assert_eq!(client.get("/admin/book/details/1").await.status_code(), 403);
    assert_eq!(client.delete("/admin/book/delete?pks=1").await.status_code(), 403);
    assert_eq!(engine.count("books"), 1);

    let response = client.get("/admin/book/list").await;
    assert_eq!(response.status_code(), 200);
    assert!(!response.contains(r#"href="/admin/book/create""#));
    assert!(!response.contains(r#"href="/admin/book/edit/1""#));
}

#[tokio::test]
async fn test_sqlite_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let engine = SqliteEngine::open(dir.path().join("admin.db")).unwrap();
    engine.create_all(&[Book::meta()]).await.unwrap();
    let engine = Arc::new(engine);
    let client = client_for(engine.clone(), book_view());

    let response = client
        .post(
            "/admin/book/create",
            &[
                ("title", "Beloved"),
                ("pages", "324"),
                ("available", "on"),
                ("published", "1987-09-02"),
                ("save", "Save and continue editing"),
            ],
        )
        .await;
    assert_eq!(response.location(), Some("http://testserver/admin/book/edit/1"));

    let response = client.get("/admin/book/edit/1").await;
    assert!(response.contains(r#"value="Beloved""#));
    assert!(response.contains(r#"value="1987-09-02""#));
    assert!(response.contains(" checked"));

    let response = client
        .post("/admin/book/edit/1", &[("title", "Beloved"), ("save", "Save")])
        .await;
    assert_eq!(response.status_code(), 302);
    let stored = engine.get(Book::meta(), "1").await.unwrap().unwrap();
    assert_eq!(stored["available"], false);
    assert_eq!(stored["pages"], serde_json::Value::Null);

    let response = client.get("/admin/book/list?search=bel").await;
    assert!(response.contains("<td>Beloved</td>"));

    let response = client.delete("/admin/book/delete?pks=1").await;
    assert_eq!(response.text(), "http://testserver/admin/book/list");
    assert!(engine.get(Book::meta(), "1").await.unwrap().is_none());
}

async fn natural_key_flow(engine: Arc<dyn Engine>) {
    let client = client_for(engine.clone(), ModelView::for_model::<Tag>());

    let response = client.get("/admin/tag/create").await;
    assert!(response.contains(r#"name="code""#));

    let response = client
        .post("/admin/tag/create", &[("label", "Rust"), ("save", "Save")])
        .await;
    assert_eq!(response.status_code(), 400);
    assert!(engine.get(Tag::meta(), "").await.unwrap().is_none());

    let response = client
        .post(
            "/admin/tag/create",
            &[("code", "rust"), ("label", "Rust"), ("save", "Save")],
        )
        .await;
    assert_eq!(response.status_code(), 302);
    assert_eq!(response.location(), Some("http://testserver/admin/tag/list"));

    let response = client.get("/admin/tag/edit/rust").await;
    assert!(response.contains(r#"value="rust""#));

    let response = client
        .post(
            "/admin/tag/edit/rust",
            &[
                ("code", "rustlang"),
                ("label", "Rust language"),
                ("save", "Save and continue editing"),
            ],
        )
        .await;
    assert_eq!(response.location(), Some("http://testserver/admin/tag/edit/rustlang"));
    assert!(engine.get(Tag::meta(), "rust").await.unwrap().is_none());
    let stored = engine.get(Tag::meta(), "rustlang").await.unwrap().unwrap();
    assert_eq!(stored["label"], "Rust language");
}

#[tokio::test]
async fn test_natural_key_create_and_edit() {
    natural_key_flow(Arc::new(InMemoryEngine::new())).await;
}

#[tokio::test]
async fn test_natural_key_create_and_edit_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let engine = SqliteEngine::open(dir.path().join("tags.db")).unwrap();
    engine.create_all(&[Tag::meta()]).await.unwrap();
    natural_key_flow(Arc::new(engine)).await;
}

#[tokio::test]
async fn test_delete_keys_with_commas() {
    let engine = Arc::new(InMemoryEngine::new());
    for code in ["a,b", "c"] {
        let record = json!({"code": code, "label": code});
        engine
            .insert(Tag::meta(), record.as_object().cloned().unwrap())
            .await
            .unwrap();
    }
    let client = client_for(engine.clone(), ModelView::for_model::<Tag>());

    let response = client.delete("/admin/tag/delete?pks=a%2Cb").await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(engine.count("tags"), 1);
    assert!(engine.get(Tag::meta(), "c").await.unwrap().is_some());
}

#[tokio::test]
async fn test_list_script_quotes_plural_name() {
    let engine = Arc::new(InMemoryEngine::new());
    seed(engine.as_ref(), &["Dune"]).await;
    let client = client_for(engine, book_view().name_plural(r#"Editor's "picks""#));

    let response = client.get("/admin/book/list").await;
    assert!(response.contains(r#"pks.length + " " + "Editor's \"picks\"" + "?""#));
}
