//! Engine result values and their string encoding

/// Significant digits used for numbers, matching C's `%g`
const NUMBER_PRECISION: usize = 6;

/// A JavaScript value as returned by the engine, detached from any toolkit.
///
/// Objects, arrays and other kinds carry whatever representations the engine
/// could produce: `json` is the engine's JSON serialization and `text` its
/// string coercion. Either may be missing.
#[derive(Debug, Clone, PartialEq)]
pub enum JsValue {
    Null,
    Undefined,
    Boolean(bool),
    Number(f64),
    String(String),
    Object {
        json: Option<String>,
        text: Option<String>,
    },
    Array {
        json: Option<String>,
        text: Option<String>,
    },
    /// Functions, symbols and anything else without a JSON form
    Other { text: Option<String> },
}

impl JsValue {
    /// Encode the value the way responses carry it.
    ///
    /// Strings are JSON-quoted, numbers use `%g` formatting with literal
    /// `NaN`/`Infinity`/`-Infinity`, objects and arrays are their JSON text.
    pub fn encode(&self) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Undefined => "undefined".to_string(),
            Self::Boolean(value) => value.to_string(),
            Self::Number(value) => format_number(*value),
            Self::String(value) => quote(value),
            Self::Object { json, text } | Self::Array { json, text } => json
                .clone()
                .or_else(|| text.clone())
                .unwrap_or_else(|| "[Object]".to_string()),
            Self::Other { text } => text.clone().unwrap_or_else(|| "undefined".to_string()),
        }
    }
}

impl From<serde_json::Value> for JsValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Boolean(b),
            Value::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) => Self::String(s),
            Value::Array(_) => Self::Array {
                json: Some(value.to_string()),
                text: None,
            },
            Value::Object(_) => Self::Object {
                json: Some(value.to_string()),
                text: None,
            },
        }
    }
}

fn quote(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{value}\""))
}

/// Format a number like C's `%g`, with JavaScript names for non-finite values.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    // Round to the target precision first; the exponent of the rounded value
    // picks between fixed and scientific notation.
    let scientific = format!("{:.*e}", NUMBER_PRECISION - 1, value);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= NUMBER_PRECISION as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{}{:02}",
            trim_fraction(mantissa),
            sign,
            exponent.unsigned_abs()
        )
    } else {
        let decimals = (NUMBER_PRECISION as i32 - 1 - exponent) as usize;
        trim_fraction(&format!("{value:.decimals$}")).to_string()
    }
}

fn trim_fraction(digits: &str) -> &str {
    if digits.contains('.') {
        digits.trim_end_matches('0').trim_end_matches('.')
    } else {
        digits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_primitives() {
        assert_eq!(JsValue::Null.encode(), "null");
        assert_eq!(JsValue::Undefined.encode(), "undefined");
        assert_eq!(JsValue::Boolean(true).encode(), "true");
        assert_eq!(JsValue::Boolean(false).encode(), "false");
    }

    #[test]
    fn test_non_finite_numbers() {
        assert_eq!(JsValue::Number(f64::NAN).encode(), "NaN");
        assert_eq!(JsValue::Number(f64::INFINITY).encode(), "Infinity");
        assert_eq!(JsValue::Number(f64::NEG_INFINITY).encode(), "-Infinity");
    }

    #[test]
    fn test_general_number_formatting() {
        assert_eq!(format_number(2.0), "2");
        assert_eq!(format_number(42.0), "42");
        assert_eq!(format_number(-1.5), "-1.5");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(3.14159265), "3.14159");
        assert_eq!(format_number(100000.0), "100000");
        assert_eq!(format_number(0.0001), "0.0001");
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(-0.0), "-0");
    }

    #[test]
    fn test_scientific_number_formatting() {
        assert_eq!(format_number(1_000_000.0), "1e+06");
        assert_eq!(format_number(123_456_789.0), "1.23457e+08");
        assert_eq!(format_number(999_999.7), "1e+06");
        assert_eq!(format_number(0.00001), "1e-05");
        assert_eq!(format_number(-2.5e-7), "-2.5e-07");
        assert_eq!(format_number(1e100), "1e+100");
    }

    #[test]
    fn test_strings_are_quoted() {
        assert_eq!(JsValue::String("hello".into()).encode(), "\"hello\"");
        assert_eq!(JsValue::String(String::new()).encode(), "\"\"");
        assert_eq!(
            JsValue::String("say \"hi\"\n".into()).encode(),
            r#""say \"hi\"\n""#
        );
    }

    #[test]
    fn test_objects_and_arrays_use_engine_json() {
        let object = JsValue::Object {
            json: Some(r#"{"a":1,"b":[true,null]}"#.into()),
            text: Some("[object Object]".into()),
        };
        assert_eq!(object.encode(), r#"{"a":1,"b":[true,null]}"#);

        let array = JsValue::Array {
            json: Some("[1,2,3]".into()),
            text: Some("1,2,3".into()),
        };
        assert_eq!(array.encode(), "[1,2,3]");
    }

    #[test]
    fn test_object_fallbacks() {
        let cyclic = JsValue::Object {
            json: None,
            text: Some("[object Object]".into()),
        };
        assert_eq!(cyclic.encode(), "[object Object]");

        let opaque = JsValue::Array {
            json: None,
            text: None,
        };
        assert_eq!(opaque.encode(), "[Object]");
    }

    #[test]
    fn test_other_kinds_use_string_coercion() {
        let function = JsValue::Other {
            text: Some("function f() { return 1; }".into()),
        };
        assert_eq!(function.encode(), "function f() { return 1; }");
        assert_eq!(JsValue::Other { text: None }.encode(), "undefined");
    }

    #[test]
    fn test_from_json_value() {
        assert_eq!(JsValue::from(json!(null)), JsValue::Null);
        assert_eq!(JsValue::from(json!(7)).encode(), "7");
        assert_eq!(JsValue::from(json!("x")).encode(), "\"x\"");
        assert_eq!(JsValue::from(json!({"k": [1, 2]})).encode(), r#"{"k":[1,2]}"#);
    }
}
