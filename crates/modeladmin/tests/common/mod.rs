//! Models shared by the integration tests.

#![allow(dead_code)]

use std::sync::LazyLock;

use modeladmin::model::{FieldDef, Model, ModelMeta};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
}

impl Model for User {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new("User", "users")
                .field(FieldDef::integer("id").primary_key())
                .field(FieldDef::string("name", Some(32)).default_value(json!("SQLAdmin")))
        });
        &META
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DataModel {
    pub id: i64,
    pub data: Option<String>,
}

impl Model for DataModel {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new("DataModel", "datamodel")
                .field(FieldDef::integer("id").primary_key())
                .field(FieldDef::string("data", None).nullable())
        });
        &META
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub pages: Option<i64>,
    pub available: bool,
    pub published: Option<String>,
}

impl Model for Book {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new("Book", "books")
                .field(FieldDef::integer("id").primary_key())
                .field(FieldDef::string("title", Some(100)))
                .field(FieldDef::integer("pages").nullable())
                .field(FieldDef::boolean("available"))
                .field(FieldDef::date("published").nullable())
        });
        &META
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Tag {
    pub code: String,
    pub label: String,
}

impl Model for Tag {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new("Tag", "tags")
                .field(FieldDef::string("code", Some(8)).primary_key())
                .field(FieldDef::string("label", None))
        });
        &META
    }
}
