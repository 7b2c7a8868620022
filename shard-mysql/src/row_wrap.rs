use crate::ValueWrap;
use shard_core::{Row, RowLabeled, RowNames, Value};

pub(crate) struct RowWrap(pub(crate) RowLabeled);

impl mysql_async::prelude::FromRow for RowWrap {
    fn from_row_opt(row: mysql_async::Row) -> Result<Self, mysql_async::FromRowError>
    where
        Self: Sized,
    {
        let names: RowNames = row
            .columns_ref()
            .iter()
            .map(|v| v.name_str().into_owned())
            .collect();
        let values: Row = row
            .unwrap_raw()
            .into_iter()
            .map(|v| v.map_or(Value::Null, |v| ValueWrap::from(v).0))
            .collect();
        Ok(RowWrap(RowLabeled::new(names, values)))
    }
}
