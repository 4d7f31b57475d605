//! Library catalog models and their admin views.

use std::sync::LazyLock;

use modeladmin::db::Engine;
use modeladmin::model::{to_record, FieldDef, Model, ModelMeta};
use modeladmin::{AdminResult, ModelView, SortDirection};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub id: Option<i64>,
    pub name: String,
    pub born: Option<String>,
}

impl Model for Author {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new("Author", "authors")
                .field(FieldDef::integer("id").primary_key())
                .field(FieldDef::string("name", Some(120)))
                .field(FieldDef::date("born").nullable().help_text("YYYY-MM-DD"))
        });
        &META
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: Option<i64>,
    pub title: String,
    pub author_id: i64,
    pub isbn: Option<String>,
    pub available: bool,
    pub published: Option<String>,
    pub summary: Option<String>,
}

impl Model for Book {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new("Book", "books")
                .field(FieldDef::integer("id").primary_key())
                .field(FieldDef::string("title", Some(200)))
                .field(FieldDef::integer("author_id").label("Author"))
                .field(FieldDef::string("isbn", Some(13)).nullable().label("ISBN"))
                .field(FieldDef::boolean("available").default_value(json!(true)))
                .field(FieldDef::date("published").nullable())
                .field(FieldDef::text("summary").nullable())
        });
        &META
    }
}

/// The admin views of the catalog.
pub fn views() -> Vec<ModelView> {
    vec![
        ModelView::for_model::<Author>()
            .category("Catalog")
            .icon("fa-solid fa-user")
            .column_searchable_list(["name"])
            .column_sortable_list(["name", "born"])
            .column_default_sort("name", SortDirection::Asc),
        ModelView::for_model::<Book>()
            .category("Catalog")
            .icon("fa-solid fa-book")
            .column_list(["id", "title", "author_id", "available", "published"])
            .column_searchable_list(["title", "isbn"])
            .column_sortable_list(["title", "published"])
            .column_default_sort("published", SortDirection::Desc)
            .save_as(true),
    ]
}

/// Inserts a few authors and books.
pub async fn seed(engine: &dyn Engine) -> AdminResult<()> {
    let authors = [
        ("Toni Morrison", Some("1931-02-18")),
        ("Frank Herbert", Some("1920-10-08")),
        ("Jane Austen", None),
    ];
    let mut ids = Vec::with_capacity(authors.len());
    for (name, born) in authors {
        let author = Author {
            id: None,
            name: name.to_string(),
            born: born.map(str::to_string),
        };
        let saved = engine.insert(Author::meta(), to_record(&author)?).await?;
        ids.push(saved.get("id").and_then(serde_json::Value::as_i64).unwrap_or_default());
    }

    let books = [
        ("Beloved", 0, Some("1987-09-02")),
        ("Song of Solomon", 0, Some("1977-09-01")),
        ("Dune", 1, Some("1965-08-01")),
        ("Emma", 2, None),
    ];
    for (title, author, published) in books {
        let book = Book {
            id: None,
            title: title.to_string(),
            author_id: ids[author],
            isbn: None,
            available: true,
            published: published.map(str::to_string),
            summary: None,
        };
        engine.insert(Book::meta(), to_record(&book)?).await?;
    }
    tracing::info!(authors = ids.len(), books = books.len(), "Seeded library catalog");
    Ok(())
}
