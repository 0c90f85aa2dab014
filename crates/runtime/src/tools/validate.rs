//! Shallow argument checks against a tool's declared input schema.
//!
//! Only the top level is checked: the argument value must be an object,
//! `required` properties must be present, declared primitive `type`s must
//! match and `additionalProperties: false` is honoured. Nested schemas are left
//! to the server.

use serde_json::{Map, Value};

/// Check `arguments` against `schema`, returning the argument object on success.
pub fn validate(schema: &Value, arguments: Value) -> Result<Map<String, Value>, String> {
    let Value::Object(arguments) = arguments else {
        return Err(format!(
            "expected a JSON object, got {}",
            type_name(&arguments)
        ));
    };

    let Some(schema) = schema.as_object() else {
        return Ok(arguments);
    };

    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        let missing: Vec<&str> = required
            .iter()
            .filter_map(Value::as_str)
            .filter(|key| !arguments.contains_key(*key))
            .collect();
        if !missing.is_empty() {
            return Err(format!("missing required argument(s): {}", missing.join(", ")));
        }
    }

    let properties = schema.get("properties").and_then(Value::as_object);
    let closed = schema.get("additionalProperties") == Some(&Value::Bool(false));

    for (key, value) in &arguments {
        match properties.and_then(|p| p.get(key)) {
            Some(property) => {
                if let Some(expected) = property.get("type")
                    && !matches_type(expected, value)
                {
                    return Err(format!(
                        "argument `{key}` should be {}, got {}",
                        describe(expected),
                        type_name(value)
                    ));
                }
            }
            None if closed => return Err(format!("unexpected argument `{key}`")),
            None => {}
        }
    }

    Ok(arguments)
}

fn matches_type(expected: &Value, value: &Value) -> bool {
    match expected {
        Value::String(name) => matches_named(name, value),
        Value::Array(names) => names
            .iter()
            .filter_map(Value::as_str)
            .any(|name| matches_named(name, value)),
        _ => true,
    }
}

fn matches_named(name: &str, value: &Value) -> bool {
    match name {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => {
            value.is_i64()
                || value.is_u64()
                || value.as_f64().is_some_and(|n| n.fract() == 0.0)
        }
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn describe(expected: &Value) -> String {
    match expected {
        Value::String(name) => name.clone(),
        other => other.to_string(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
