use crate::{Error, Result, SemanticType, Value};
use std::any;

/// Conversion between a native field type and its [`Value`] representation.
///
/// Implemented for the four field types a model can map: `String`, `i64`, `u64` and
/// `f64`. `as_value` is the encode direction (the value handed to the driver as a
/// statement argument), `try_from_value` accepts only the canonical variant produced
/// by [`decode`](crate::decode) for the matching [`SemanticType`].
pub trait AsValue {
    const SEMANTIC_TYPE: SemanticType;

    fn as_value(self) -> Value;

    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
}

impl<T: AsValue> From<T> for Value {
    fn from(value: T) -> Self {
        value.as_value()
    }
}

macro_rules! impl_as_value {
    ($source:ty, $semantic:expr, $destination:path) => {
        impl AsValue for $source {
            const SEMANTIC_TYPE: SemanticType = $semantic;

            fn as_value(self) -> Value {
                $destination(self)
            }

            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    $destination(v) => Ok(v),
                    _ => Err(Error::msg(format!(
                        "Cannot convert {value:?} to {}",
                        any::type_name::<Self>(),
                    ))),
                }
            }
        }
    };
}

impl_as_value!(String, SemanticType::Text, Value::Varchar);
impl_as_value!(i64, SemanticType::SignedInteger64, Value::Int64);
impl_as_value!(u64, SemanticType::UnsignedInteger64, Value::UInt64);
impl_as_value!(f64, SemanticType::Float64, Value::Float64);
