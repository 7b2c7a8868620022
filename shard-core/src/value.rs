/// Untyped value exchanged with a driver.
///
/// Drivers produce these when decoding result rows and accept them as positional
/// statement arguments. Text protocols usually hand everything back as `Blob`, binary
/// protocols use the native numeric variants.
#[derive(Default, Debug, Clone, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Int64(i64),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    Varchar(String),
    Blob(Box<[u8]>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Text rendering used when a value must be reinterpreted through its string form.
    ///
    /// Integers go through `itoa`. Floating point values are written in plain decimal,
    /// never with an exponent, using the shortest digits that parse back to the same
    /// number. Blobs are read as UTF-8.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Boolean(v) => Some(if *v { "true" } else { "false" }.to_owned()),
            Value::Int64(v) => Some(itoa::Buffer::new().format(*v).to_owned()),
            Value::UInt64(v) => Some(itoa::Buffer::new().format(*v).to_owned()),
            Value::Float32(v) => Some(v.to_string()),
            Value::Float64(v) => Some(v.to_string()),
            Value::Varchar(v) => Some(v.clone()),
            Value::Blob(v) => Some(String::from_utf8_lossy(v).into_owned()),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Varchar(value.into())
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Blob(value.into())
    }
}
