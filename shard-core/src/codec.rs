use crate::{OrmError, Result, SemanticType, Value, logged};
use atoi::{FromRadix10Checked, FromRadix10SignedChecked};

/// What to do with a driver value that does not parse as the field's type.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodePolicy {
    /// Substitute the zero value of the field and log a warning.
    #[default]
    Lenient,
    /// Fail with [`OrmError::Decoding`].
    Strict,
}

/// Convert an untyped driver value into the canonical variant for `semantic`.
///
/// Text encoded values (`Varchar` and `Blob`) are parsed in base 10, native numbers are
/// reinterpreted through their text form. The result is always `Varchar`, `Int64`,
/// `UInt64` or `Float64` matching `semantic`.
pub fn decode(semantic: SemanticType, value: Value, policy: DecodePolicy) -> Result<Value> {
    let text = match value {
        Value::Float64(v) if semantic == SemanticType::Float64 => return Ok(Value::Float64(v)),
        Value::Varchar(v) => Some(v),
        v => v.to_text(),
    };
    let decoded = text.as_deref().and_then(|text| match semantic {
        SemanticType::Text => Some(Value::Varchar(text.to_owned())),
        SemanticType::SignedInteger64 => parse_i64(text).map(Value::Int64),
        SemanticType::UnsignedInteger64 => parse_u64(text).map(Value::UInt64),
        SemanticType::Float64 => parse_f64(text).map(Value::Float64),
    });
    match (decoded, policy) {
        (Some(v), _) => Ok(v),
        (None, DecodePolicy::Lenient) => {
            log::warn!(
                "Cannot decode {} as {}, using the zero value instead",
                text.as_deref().unwrap_or("NULL"),
                semantic,
            );
            Ok(semantic.zero_value())
        }
        (None, DecodePolicy::Strict) => Err(logged(OrmError::Decoding {
            semantic,
            value: text.unwrap_or_else(|| "NULL".into()),
        })),
    }
}

fn parse_i64(text: &str) -> Option<i64> {
    match i64::from_radix_10_signed_checked(text.as_bytes()) {
        (Some(v), len) if len == text.len() && text.bytes().any(|b| b.is_ascii_digit()) => Some(v),
        _ => None,
    }
}

fn parse_u64(text: &str) -> Option<u64> {
    match u64::from_radix_10_checked(text.as_bytes()) {
        (Some(v), len) if len == text.len() && len > 0 => Some(v),
        _ => None,
    }
}

fn parse_f64(text: &str) -> Option<f64> {
    fast_float::parse::<f64, _>(text).ok()
}
