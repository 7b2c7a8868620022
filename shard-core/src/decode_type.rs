use crate::Value;
use std::fmt::{self, Display};

/// Value category a model field belongs to, drives both decoding and encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticType {
    Text,
    SignedInteger64,
    UnsignedInteger64,
    Float64,
}

impl SemanticType {
    /// Infer the category from a Rust type name as returned by `std::any::type_name`.
    ///
    /// Only `String`, `i64`, `u64` and `f64` are mapped, anything else (including
    /// `Option` and references) returns `None`.
    pub fn from_type_name(type_name: &str) -> Option<Self> {
        match type_name {
            "alloc::string::String" | "std::string::String" | "String" => Some(Self::Text),
            "i64" => Some(Self::SignedInteger64),
            "u64" => Some(Self::UnsignedInteger64),
            "f64" => Some(Self::Float64),
            _ => None,
        }
    }

    /// The value substituted when a driver value cannot be decoded leniently.
    pub fn zero_value(&self) -> Value {
        match self {
            Self::Text => Value::Varchar(String::new()),
            Self::SignedInteger64 => Value::Int64(0),
            Self::UnsignedInteger64 => Value::UInt64(0),
            Self::Float64 => Value::Float64(0.0),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::SignedInteger64 => "signed 64-bit integer",
            Self::UnsignedInteger64 => "unsigned 64-bit integer",
            Self::Float64 => "64-bit float",
        }
    }
}

impl Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
