use shard_core::Value;

pub(crate) struct ValueWrap(pub(crate) Value);

impl From<Value> for ValueWrap {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
impl From<ValueWrap> for Value {
    fn from(value: ValueWrap) -> Self {
        value.0
    }
}

/// Dates and times have no counterpart in [`Value`], they come back in their text form.
impl From<mysql_async::Value> for ValueWrap {
    fn from(value: mysql_async::Value) -> Self {
        type MySQLValue = mysql_async::Value;
        Self(match value {
            MySQLValue::NULL => Value::Null,
            MySQLValue::Bytes(v) => Value::Blob(v.into()),
            MySQLValue::Int(v) => Value::Int64(v),
            MySQLValue::UInt(v) => Value::UInt64(v),
            MySQLValue::Float(v) => Value::Float32(v),
            MySQLValue::Double(v) => Value::Float64(v),
            MySQLValue::Date(year, month, day, hour, minute, second, micro) => {
                Value::Varchar(format!(
                    "{:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:06}",
                    year, month, day, hour, minute, second, micro
                ))
            }
            MySQLValue::Time(negative, days, hours, minutes, seconds, micro) => {
                Value::Varchar(format!(
                    "{}{:02}:{:02}:{:02}.{:06}",
                    if negative { "-" } else { "" },
                    days as u64 * 24 + hours as u64,
                    minutes,
                    seconds,
                    micro
                ))
            }
        })
    }
}

impl From<ValueWrap> for mysql_async::Value {
    fn from(value: ValueWrap) -> Self {
        type MySQLValue = mysql_async::Value;
        match value.0 {
            Value::Null => MySQLValue::NULL,
            Value::Boolean(v) => MySQLValue::from(v),
            Value::Int64(v) => MySQLValue::Int(v),
            Value::UInt64(v) => MySQLValue::UInt(v),
            Value::Float32(v) => MySQLValue::Float(v),
            Value::Float64(v) => MySQLValue::Double(v),
            Value::Varchar(v) => MySQLValue::Bytes(v.into_bytes()),
            Value::Blob(v) => MySQLValue::Bytes(v.into_vec()),
        }
    }
}
