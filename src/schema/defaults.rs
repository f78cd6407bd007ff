//! Default value injection
//!
//! `ifabsent` expressions are opaque literals. They are parsed once at load
//! against the slot's primitive kind, and injected into a fresh copy of the
//! input before validation. Both the LinkML wrapper form (`int(0)`,
//! `float(0.5)`, `string(abc)`, `bool(true)`) and bare literals are accepted.

use serde_json::{Map, Value};

use super::resolver::InducedClassView;
use super::types::{Literal, PrimitiveKind};

/// Parses a default expression into a literal of the given kind.
pub fn parse_default(expr: &str, kind: PrimitiveKind) -> Result<Literal, String> {
    let expr = expr.trim();

    let (tag, body) = match split_wrapper(expr) {
        Some((tag, body)) => (Some(tag), body),
        None => (None, expr),
    };

    if let Some(tag) = tag {
        let tag_kind = wrapper_kind(tag)
            .ok_or_else(|| format!("unknown default wrapper '{}'", tag))?;
        // an integer literal is a valid float default
        let compatible = tag_kind == kind
            || (tag_kind == PrimitiveKind::Integer && kind == PrimitiveKind::Float);
        if !compatible {
            return Err(format!("'{}' default given for a {} slot", tag, kind));
        }
    }

    match kind {
        PrimitiveKind::Integer => body
            .parse::<i64>()
            .map(Literal::Integer)
            .map_err(|_| format!("'{}' is not an integer", body)),
        PrimitiveKind::Float => body
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Literal::Float)
            .ok_or_else(|| format!("'{}' is not a finite float", body)),
        PrimitiveKind::Boolean => match body {
            "true" | "True" => Ok(Literal::Boolean(true)),
            "false" | "False" => Ok(Literal::Boolean(false)),
            other => Err(format!("'{}' is not a boolean", other)),
        },
        PrimitiveKind::String => Ok(Literal::String(unquote(body).to_string())),
    }
}

/// Returns a copy of `data` with every absent defaulted slot filled in.
///
/// A JSON `null` counts as absent, and so does `[]` on a single-valued slot.
/// The view is never modified.
pub fn apply_defaults(data: &Map<String, Value>, view: &InducedClassView) -> Map<String, Value> {
    let mut filled = data.clone();

    for (name, slot) in view.iter() {
        let Some(default) = &slot.spec.default else {
            continue;
        };
        let absent = filled.get(name).map_or(true, |value| {
            value.is_null() || (!slot.spec.multivalued && value.as_array().is_some_and(Vec::is_empty))
        });
        if absent {
            let value = if slot.spec.multivalued {
                Value::Array(vec![default.to_json()])
            } else {
                default.to_json()
            };
            filled.insert(name.to_string(), value);
        }
    }

    filled
}

fn split_wrapper(expr: &str) -> Option<(&str, &str)> {
    let open = expr.find('(')?;
    let inner = expr.strip_suffix(')')?;
    let tag = &expr[..open];
    if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    Some((tag, inner[open + 1..].trim()))
}

fn wrapper_kind(tag: &str) -> Option<PrimitiveKind> {
    match tag {
        "int" | "integer" => Some(PrimitiveKind::Integer),
        "float" | "double" | "decimal" => Some(PrimitiveKind::Float),
        "string" | "str" => Some(PrimitiveKind::String),
        "bool" | "boolean" => Some(PrimitiveKind::Boolean),
        _ => None,
    }
}

fn unquote(body: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = body
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::loader::load_schema_str;
    use crate::schema::MICROSCOPY_CORE_SCHEMA;
    use serde_json::json;

    #[test]
    fn test_wrapped_literals() {
        assert_eq!(parse_default("int(128)", PrimitiveKind::Integer), Ok(Literal::Integer(128)));
        assert_eq!(parse_default("float(0.5)", PrimitiveKind::Float), Ok(Literal::Float(0.5)));
        assert_eq!(parse_default("bool(true)", PrimitiveKind::Boolean), Ok(Literal::Boolean(true)));
        assert_eq!(
            parse_default("string(hello world)", PrimitiveKind::String),
            Ok(Literal::String("hello world".into()))
        );
    }

    #[test]
    fn test_bare_literals() {
        assert_eq!(parse_default("0", PrimitiveKind::Integer), Ok(Literal::Integer(0)));
        assert_eq!(parse_default(" 2.5 ", PrimitiveKind::Float), Ok(Literal::Float(2.5)));
        assert_eq!(parse_default("False", PrimitiveKind::Boolean), Ok(Literal::Boolean(false)));
        assert_eq!(parse_default("'abc'", PrimitiveKind::String), Ok(Literal::String("abc".into())));
    }

    #[test]
    fn test_int_wrapper_is_valid_float_default() {
        assert_eq!(parse_default("int(2)", PrimitiveKind::Float), Ok(Literal::Float(2.0)));
    }

    #[test]
    fn test_incompatible_wrapper_rejected() {
        assert!(parse_default("float(1.5)", PrimitiveKind::Integer).is_err());
        assert!(parse_default("string(x)", PrimitiveKind::Boolean).is_err());
        assert!(parse_default("color(red)", PrimitiveKind::String).is_err());
    }

    #[test]
    fn test_unparseable_rejected() {
        assert!(parse_default("int(abc)", PrimitiveKind::Integer).is_err());
        assert!(parse_default("yes", PrimitiveKind::Boolean).is_err());
        assert!(parse_default("NaN", PrimitiveKind::Float).is_err());
    }

    #[test]
    fn test_apply_fills_absent_and_null() {
        let model = load_schema_str(MICROSCOPY_CORE_SCHEMA).unwrap();
        let view = model.induced_view("Color").unwrap();

        let data = json!({"r": 10, "g": null});
        let filled = apply_defaults(data.as_object().unwrap(), &view);

        assert_eq!(filled["r"], json!(10));
        assert_eq!(filled["g"], json!(128));
        assert_eq!(filled["b"], json!(128));
        assert_eq!(filled["alpha"], json!(255));
    }

    #[test]
    fn test_apply_treats_empty_list_as_absent() {
        let model = load_schema_str(MICROSCOPY_CORE_SCHEMA).unwrap();
        let view = model.induced_view("Color").unwrap();

        let data = json!({"g": [], "b": [7]});
        let filled = apply_defaults(data.as_object().unwrap(), &view);

        assert_eq!(filled["g"], json!(128));
        assert_eq!(filled["b"], json!([7]));
    }

    #[test]
    fn test_apply_keeps_present_values_and_input() {
        let model = load_schema_str(MICROSCOPY_CORE_SCHEMA).unwrap();
        let view = model.induced_view("Mask").unwrap();

        let data = json!({"x": 7});
        let filled = apply_defaults(data.as_object().unwrap(), &view);

        assert_eq!(filled["x"], json!(7));
        assert_eq!(filled["y"], json!(0));
        assert!(!filled.contains_key("mask"));
        assert_eq!(data, json!({"x": 7}));
    }
}
