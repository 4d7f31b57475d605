//! Model metadata and introspection.
//!
//! The admin is generic over any model that can describe itself with a
//! [`ModelMeta`]: the class name, the backing table, and an ordered list of
//! [`FieldDef`]s. Instances travel through the admin as [`Record`]s, a JSON
//! object keyed by attribute name, and are converted to and from typed models
//! through serde.
//!
//! # Examples
//!
//! ```
//! use std::sync::LazyLock;
//!
//! use modeladmin::model::{FieldDef, Model, ModelMeta};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct User {
//!     id: i64,
//!     name: Option<String>,
//! }
//!
//! impl Model for User {
//!     fn meta() -> &'static ModelMeta {
//!         static META: LazyLock<ModelMeta> = LazyLock::new(|| {
//!             ModelMeta::new("User", "users")
//!                 .field(FieldDef::integer("id").primary_key())
//!                 .field(FieldDef::string("name", Some(32)).nullable())
//!         });
//!         &META
//!     }
//! }
//!
//! assert_eq!(User::meta().identity(), "user");
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use modeladmin_core::{AdminError, AdminResult};

/// A single model instance as seen by engines and views.
pub type Record = serde_json::Map<String, Value>;

/// The storage type of a model field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    /// A 64-bit signed integer.
    Integer,
    /// A 64-bit float.
    Float,
    /// A boolean flag.
    Boolean,
    /// A bounded or unbounded single-line string.
    String {
        /// Maximum number of characters, if bounded.
        max_length: Option<usize>,
    },
    /// Multi-line text.
    Text,
    /// A calendar date, stored as `YYYY-MM-DD`.
    Date,
    /// A date and time, stored as `YYYY-MM-DD HH:MM:SS`.
    DateTime,
}

impl FieldType {
    /// Returns the SQL column type used when creating tables.
    pub const fn sql_type(self) -> &'static str {
        match self {
            Self::Integer | Self::Boolean => "INTEGER",
            Self::Float => "REAL",
            Self::String { .. } | Self::Text | Self::Date | Self::DateTime => "TEXT",
        }
    }

    /// Returns the HTML input type used in generated forms.
    pub const fn input_type(self) -> &'static str {
        match self {
            Self::Integer | Self::Float => "number",
            Self::Boolean => "checkbox",
            Self::String { .. } => "text",
            Self::Text => "textarea",
            Self::Date => "date",
            Self::DateTime => "datetime-local",
        }
    }
}

/// Metadata about a single model field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    /// The attribute (and column) name.
    pub name: String,
    /// The storage type.
    pub field_type: FieldType,
    /// Whether this field is (part of) the primary key.
    pub primary_key: bool,
    /// Whether the engine generates the value on insert.
    pub auto_increment: bool,
    /// Whether `null` is accepted.
    pub nullable: bool,
    /// Value used when the form leaves the field empty.
    pub default: Option<Value>,
    /// Human-readable label.
    pub label: String,
    /// Help text shown under the form input.
    pub help_text: String,
}

impl FieldDef {
    /// Creates a field of the given type.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();
        let label = humanize(&name);
        Self {
            name,
            field_type,
            primary_key: false,
            auto_increment: false,
            nullable: false,
            default: None,
            label,
            help_text: String::new(),
        }
    }

    /// Creates an integer field.
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Integer)
    }

    /// Creates a float field.
    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Float)
    }

    /// Creates a boolean field. Booleans default to `false`.
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Boolean).default_value(Value::Bool(false))
    }

    /// Creates a string field with an optional length bound.
    pub fn string(name: impl Into<String>, max_length: Option<usize>) -> Self {
        Self::new(name, FieldType::String { max_length })
    }

    /// Creates a text field.
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Text)
    }

    /// Creates a date field.
    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Date)
    }

    /// Creates a date-time field.
    pub fn datetime(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::DateTime)
    }

    /// Marks this field as the primary key. Integer keys auto-increment.
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.auto_increment = self.field_type == FieldType::Integer;
        self
    }

    /// Overrides whether the engine generates the value.
    #[must_use]
    pub const fn auto_increment(mut self, enabled: bool) -> Self {
        self.auto_increment = enabled;
        self
    }

    /// Marks this field as nullable.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Sets the human-readable label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the help text.
    #[must_use]
    pub fn help_text(mut self, text: impl Into<String>) -> Self {
        self.help_text = text.into();
        self
    }

    /// Returns whether a form must supply a value for this field.
    pub fn is_required(&self) -> bool {
        !self.nullable && self.default.is_none() && self.field_type != FieldType::Boolean
    }
}

/// Static metadata describing a model class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMeta {
    /// The model class name (e.g. `DataModel`).
    pub name: String,
    /// The backing table name.
    pub table: String,
    /// The fields in declaration order.
    pub fields: Vec<FieldDef>,
}

impl ModelMeta {
    /// Creates metadata with no fields.
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            fields: Vec::new(),
        }
    }

    /// Appends a field.
    #[must_use]
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Looks up a field by attribute name.
    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns whether the model declares the given attribute.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.get_field(name).is_some()
    }

    /// Returns the primary key fields in declaration order.
    pub fn pk_fields(&self) -> Vec<&FieldDef> {
        self.fields.iter().filter(|f| f.primary_key).collect()
    }

    /// Returns the URL slug of the model: `DataModel` becomes `data-model`.
    pub fn identity(&self) -> String {
        slugify_class_name(&self.name)
    }

    /// Returns the display name: `DataModel` becomes `Data Model`.
    pub fn display_name(&self) -> String {
        prettify_class_name(&self.name)
    }
}

/// A type the admin can manage.
///
/// Implementors describe their fields once through [`Model::meta`]; values
/// cross the admin boundary through serde using attribute names as keys.
pub trait Model: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Returns the static metadata for this model type.
    fn meta() -> &'static ModelMeta;
}

/// Converts a model instance into a [`Record`].
pub fn to_record<M: Model>(obj: &M) -> AdminResult<Record> {
    match serde_json::to_value(obj)? {
        Value::Object(map) => Ok(map),
        other => Err(AdminError::Serialization(format!(
            "{} serialized to {other}, expected an object",
            M::meta().name
        ))),
    }
}

/// Builds a model instance from a [`Record`].
pub fn from_record<M: Model>(record: Record) -> AdminResult<M> {
    Ok(serde_json::from_value(Value::Object(record))?)
}

/// Returns the identifier of a record: its primary key values joined by `;`.
pub fn object_identifier(meta: &ModelMeta, record: &Record) -> AdminResult<String> {
    let pks = meta.pk_fields();
    if pks.is_empty() {
        return Err(AdminError::Configuration(format!(
            "Model '{}' has no primary key",
            meta.name
        )));
    }
    let parts = pks
        .iter()
        .map(|field| match record.get(&field.name) {
            Some(Value::Null) | None => Err(AdminError::BadRequest(format!(
                "Object of '{}' has no value for primary key '{}'",
                meta.name, field.name
            ))),
            Some(value) => Ok(value_to_string(value)),
        })
        .collect::<AdminResult<Vec<_>>>()?;
    Ok(parts.join(";"))
}

/// Renders a JSON value the way it appears in URLs and forms.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn slugify_class_name(name: &str) -> String {
    let mut slug = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_uppercase() && i > 0 {
            slug.push('-');
        }
        slug.extend(ch.to_lowercase());
    }
    slug
}

fn prettify_class_name(name: &str) -> String {
    let mut pretty = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_uppercase() && i > 0 {
            pretty.push(' ');
        }
        pretty.push(ch);
    }
    pretty
}

fn humanize(name: &str) -> String {
    let spaced = name.replace('_', " ");
    let mut chars = spaced.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
