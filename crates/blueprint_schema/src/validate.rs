//! Structural validation of payload values.
//!
//! Validation walks a value against an [`EntitySchema`], fills declared
//! defaults, and rebuilds objects in declaration order. The first violation
//! stops the walk and reports the dotted path of the offending field.

use crate::schema::{EntitySchema, FieldSchema, FieldType};
use blueprint_core::{BlueprintError, BlueprintResult};
use serde_json::{Map, Value};

/// Validate a value against a schema, returning the normalized value
///
/// # Errors
///
/// Returns [`BlueprintError::SchemaViolation`] naming the path of the first
/// offending field.
pub fn validate_value(schema: &EntitySchema, value: Value) -> BlueprintResult<Value> {
    let tag = schema.tag();
    Walker { tag: &tag }.entity(schema, value, "")
}

struct Walker<'a> {
    tag: &'a str,
}

impl Walker<'_> {
    fn entity(&self, schema: &EntitySchema, value: Value, path: &str) -> BlueprintResult<Value> {
        let fields: Vec<&FieldSchema> = schema.fields.values().collect();
        self.record(&fields, schema.closed, value, path)
    }

    fn record(
        &self,
        fields: &[&FieldSchema],
        closed: bool,
        value: Value,
        path: &str,
    ) -> BlueprintResult<Value> {
        let mut input = match value {
            Value::Object(map) => map,
            other => return Err(self.mismatch(path, "mapping", &other)),
        };

        let mut output = Map::new();
        for field in fields {
            let field_path = join(path, &field.name);
            match input.remove(&field.name) {
                Some(Value::Null) if field.nullable => {
                    output.insert(field.name.clone(), Value::Null);
                }
                Some(Value::Null) | None => {
                    if let Some(default) = &field.default {
                        output.insert(field.name.clone(), default.clone());
                    } else if field.required {
                        return Err(self.violation(&field_path, "missing required field"));
                    }
                }
                Some(present) => {
                    let normalized = self.field(&field.ty, present, &field_path)?;
                    output.insert(field.name.clone(), normalized);
                }
            }
        }

        if closed {
            if let Some(unknown) = input.keys().next() {
                return Err(self.violation(&join(path, unknown), "unexpected field"));
            }
        } else {
            output.extend(input);
        }

        Ok(Value::Object(output))
    }

    fn field(&self, ty: &FieldType, value: Value, path: &str) -> BlueprintResult<Value> {
        match ty {
            FieldType::Text => match value {
                Value::String(_) => Ok(value),
                other => Err(self.mismatch(path, "text", &other)),
            },
            FieldType::Integer => {
                if value.is_i64() || value.is_u64() {
                    Ok(value)
                } else {
                    Err(self.mismatch(path, "integer", &value))
                }
            }
            FieldType::Bool => match value {
                Value::Bool(_) => Ok(value),
                other => Err(self.mismatch(path, "bool", &other)),
            },
            FieldType::Enum(allowed) => match value.as_str() {
                Some(s) if allowed.contains(&s) => Ok(value),
                _ => Err(self.violation(
                    path,
                    format!("expected one of {}, found {}", allowed.join(", "), value),
                )),
            },
            FieldType::Object => match value {
                Value::Object(_) => Ok(value),
                other => Err(self.mismatch(path, "mapping", &other)),
            },
            FieldType::Map(inner) => match value {
                Value::Object(map) => {
                    let mut output = Map::new();
                    for (key, item) in map {
                        let normalized = self.field(inner, item, &join(path, &key))?;
                        output.insert(key, normalized);
                    }
                    Ok(Value::Object(output))
                }
                other => Err(self.mismatch(path, "mapping", &other)),
            },
            FieldType::List(inner) => match value {
                Value::Array(items) => items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| self.field(inner, item, &format!("{}[{}]", path, i)))
                    .collect::<BlueprintResult<Vec<_>>>()
                    .map(Value::Array),
                other => Err(self.mismatch(path, "list", &other)),
            },
            FieldType::Record(fields) => {
                let fields: Vec<&FieldSchema> = fields.iter().collect();
                self.record(&fields, true, value, path)
            }
            FieldType::Entity(schema) => self.entity(schema, value, path),
            FieldType::Any => Ok(value),
        }
    }

    fn mismatch(&self, path: &str, expected: &str, found: &Value) -> BlueprintError {
        self.violation(
            path,
            format!("expected {}, found {}", expected, type_name(found)),
        )
    }

    fn violation(&self, path: &str, reason: impl Into<String>) -> BlueprintError {
        let path = if path.is_empty() { "$" } else { path };
        BlueprintError::violation(self.tag, path, reason)
    }
}

fn join(path: &str, field: &str) -> String {
    if path.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", path, field)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "text",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}
