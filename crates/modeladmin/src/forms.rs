//! Form field naming and value coercion.
//!
//! Generated forms reserve a handful of attribute names for their own use
//! (`data`, `errors`, ...). A model attribute with one of those names is
//! exposed in the form under the name with a trailing `_`, so a `data`
//! column becomes the `data_` input. [`form_field_name`] and
//! [`attribute_name`] translate between the two conventions;
//! [`normalize_form_data`] and [`denormalize_form_data`] apply the mapping to
//! whole objects.
//!
//! [`coerce_form`] turns submitted strings into a typed [`Record`] following
//! each field's [`FieldType`].

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

use modeladmin_core::ValidationError;

use crate::model::{FieldDef, FieldType, ModelMeta, Record};

/// Attribute names owned by the form layer.
pub const RESERVED_FORM_ATTRS: &[&str] = &[
    "data",
    "errors",
    "form",
    "meta",
    "populate_obj",
    "process",
    "validate",
];

/// Returns whether `name` collides with a form attribute.
pub fn is_reserved(name: &str) -> bool {
    RESERVED_FORM_ATTRS.contains(&name)
}

/// Maps a model attribute name to its form field name.
///
/// # Examples
///
/// ```
/// use modeladmin::forms::form_field_name;
///
/// assert_eq!(form_field_name("data"), "data_");
/// assert_eq!(form_field_name("title"), "title");
/// ```
pub fn form_field_name(attr: &str) -> String {
    if is_reserved(attr) {
        format!("{attr}_")
    } else {
        attr.to_string()
    }
}

/// Maps a form field name back to the model attribute name.
///
/// The inverse of [`form_field_name`].
pub fn attribute_name(field: &str) -> String {
    match field.strip_suffix('_') {
        Some(stripped) if is_reserved(stripped) => stripped.to_string(),
        _ => field.to_string(),
    }
}

/// Extracts the reserved-name attributes of an object under their form names.
///
/// Only attributes with a truthy value are included, so an object with
/// `data = "abcdef"` yields `{"data_": "abcdef"}`.
pub fn normalize_form_data(record: &Record) -> Record {
    RESERVED_FORM_ATTRS
        .iter()
        .filter_map(|attr| {
            record
                .get(*attr)
                .filter(|value| is_truthy(value))
                .map(|value| (form_field_name(attr), value.clone()))
        })
        .collect()
}

/// Renames reserved form fields back to the model's attribute names.
///
/// A `data_` key becomes `data` only when the model declares a `data`
/// attribute; everything else is copied unchanged.
pub fn denormalize_form_data(form: &Record, meta: &ModelMeta) -> Record {
    let mut data = form.clone();
    for attr in RESERVED_FORM_ATTRS {
        let field = form_field_name(attr);
        if meta.has_attribute(attr) {
            if let Some(value) = data.remove(&field) {
                data.insert((*attr).to_string(), value);
            }
        }
    }
    data
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Converts submitted form strings into a typed record.
///
/// `fields` lists the model fields the form exposes; `form` is keyed by form
/// field name. Errors are reported against form field names.
pub fn coerce_form(
    fields: &[&FieldDef],
    form: &HashMap<String, String>,
) -> Result<Record, ValidationError> {
    let mut record = Record::new();
    let mut errors = ValidationError::default();

    for field in fields {
        let input_name = form_field_name(&field.name);
        let raw = form.get(&input_name).map(|s| s.trim());
        match coerce_value(field, raw) {
            Ok(value) => {
                record.insert(field.name.clone(), value);
            }
            Err(message) => errors.add(input_name, message),
        }
    }

    if errors.has_errors() {
        Err(errors)
    } else {
        Ok(record)
    }
}

fn coerce_value(field: &FieldDef, raw: Option<&str>) -> Result<Value, String> {
    if field.field_type == FieldType::Boolean {
        return Ok(Value::Bool(raw.is_some_and(parse_checkbox)));
    }

    let raw = match raw {
        Some(s) if !s.is_empty() => s,
        _ => {
            if let Some(default) = &field.default {
                return Ok(default.clone());
            }
            if field.nullable {
                return Ok(Value::Null);
            }
            return Err("This field is required.".to_string());
        }
    };

    match field.field_type {
        FieldType::Integer => raw
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| "Not a valid integer value.".to_string()),
        FieldType::Float => raw
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| "Not a valid float value.".to_string()),
        FieldType::String { max_length } => {
            if let Some(max) = max_length {
                if raw.chars().count() > max {
                    return Err(format!(
                        "Field cannot be longer than {max} characters."
                    ));
                }
            }
            Ok(Value::String(raw.to_string()))
        }
        FieldType::Text => Ok(Value::String(raw.to_string())),
        FieldType::Date => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
            .map_err(|_| "Not a valid date value.".to_string()),
        FieldType::DateTime => parse_datetime(raw)
            .map(|dt| Value::String(dt.format("%Y-%m-%d %H:%M:%S").to_string()))
            .ok_or_else(|| "Not a valid datetime value.".to_string()),
        FieldType::Boolean => Ok(Value::Bool(parse_checkbox(raw))),
    }
}

fn parse_checkbox(raw: &str) -> bool {
    matches!(
        raw.to_lowercase().as_str(),
        "on" | "true" | "1" | "y" | "yes"
    )
}

fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn meta() -> ModelMeta {
        ModelMeta::new("DataModel", "datamodel")
            .field(FieldDef::integer("id").primary_key())
            .field(FieldDef::string("data", None).nullable())
    }

    fn form(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_form_field_name_reserved() {
        for attr in RESERVED_FORM_ATTRS {
            assert_eq!(form_field_name(attr), format!("{attr}_"));
        }
    }

    #[test]
    fn test_names_are_mutual_inverses() {
        for name in ["title", "name", "data", "errors", "validated", "meta_data"] {
            assert_eq!(attribute_name(&form_field_name(name)), name, "{name}");
        }
        for name in ["title", "name", "validated", "meta_data"] {
            assert_eq!(form_field_name(name), name);
            assert_eq!(attribute_name(name), name);
        }
    }

    #[test]
    fn test_normalize_form_data() {
        let mut record = Record::new();
        record.insert("id".into(), json!(1));
        record.insert("data".into(), json!("abcdef"));
        let normalized = normalize_form_data(&record);
        assert_eq!(Value::Object(normalized), json!({"data_": "abcdef"}));
    }

    #[test]
    fn test_normalize_skips_falsy_values() {
        let mut record = Record::new();
        record.insert("data".into(), json!(""));
        record.insert("meta".into(), Value::Null);
        assert!(normalize_form_data(&record).is_empty());
    }

    #[test]
    fn test_denormalize_form_data() {
        let mut form = Record::new();
        form.insert("data_".into(), json!("abcdef"));
        let data = denormalize_form_data(&form, &meta());
        assert_eq!(Value::Object(data), json!({"data": "abcdef"}));
    }

    #[test]
    fn test_denormalize_leaves_unknown_attributes() {
        let mut form = Record::new();
        form.insert("errors_".into(), json!("x"));
        form.insert("title".into(), json!("t"));
        let data = denormalize_form_data(&form, &meta());
        assert_eq!(Value::Object(data), json!({"errors_": "x", "title": "t"}));
    }

    #[test]
    fn test_coerce_form_uses_form_names() {
        let meta = meta();
        let fields: Vec<&FieldDef> = meta.fields.iter().filter(|f| !f.primary_key).collect();
        let record = coerce_form(&fields, &form(&[("data_", " abc ")])).unwrap();
        assert_eq!(record.get("data"), Some(&json!("abc")));
    }

    #[test]
    fn test_coerce_form_types() {
        let fields = [
            FieldDef::integer("age"),
            FieldDef::float("score"),
            FieldDef::boolean("active"),
            FieldDef::boolean("admin"),
            FieldDef::date("born"),
            FieldDef::datetime("seen"),
        ];
        let refs: Vec<&FieldDef> = fields.iter().collect();
        let record = coerce_form(
            &refs,
            &form(&[
                ("age", "42"),
                ("score", "9.5"),
                ("active", "on"),
                ("born", "1990-04-01"),
                ("seen", "2024-01-02T03:04"),
            ]),
        )
        .unwrap();
        assert_eq!(record["age"], json!(42));
        assert_eq!(record["score"], json!(9.5));
        assert_eq!(record["active"], json!(true));
        assert_eq!(record["admin"], json!(false));
        assert_eq!(record["born"], json!("1990-04-01"));
        assert_eq!(record["seen"], json!("2024-01-02 03:04:00"));
    }

    #[test]
    fn test_coerce_form_errors() {
        let fields = [
            FieldDef::integer("age"),
            FieldDef::string("name", Some(3)),
            FieldDef::date("born"),
            FieldDef::text("bio"),
        ];
        let refs: Vec<&FieldDef> = fields.iter().collect();
        let err = coerce_form(
            &refs,
            &form(&[("age", "old"), ("name", "abcd"), ("born", "yesterday")]),
        )
        .unwrap_err();
        assert_eq!(err.field("age"), ["Not a valid integer value."]);
        assert_eq!(err.field("name"), ["Field cannot be longer than 3 characters."]);
        assert_eq!(err.field("born"), ["Not a valid date value."]);
        assert_eq!(err.field("bio"), ["This field is required."]);
    }

    #[test]
    fn test_coerce_empty_values() {
        let fields = [
            FieldDef::string("nick", None).nullable(),
            FieldDef::string("name", Some(32)).default_value(json!("modeladmin")),
        ];
        let refs: Vec<&FieldDef> = fields.iter().collect();
        let record = coerce_form(&refs, &form(&[("nick", "")])).unwrap();
        assert_eq!(record["nick"], Value::Null);
        assert_eq!(record["name"], json!("modeladmin"));
    }
}
