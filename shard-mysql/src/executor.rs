use crate::{RowWrap, ValueWrap};
use async_stream::try_stream;
use mysql_async::{Params, prelude::Queryable};
use shard_core::{
    Error, Query, QueryResult, Result, RowsAffected,
    stream::{Stream, StreamExt, TryStreamExt},
};
use std::sync::Arc;

/// Runs `query` on a connection or a transaction, rows first, then a single
/// [`RowsAffected`] when the statement returned no rows.
pub(crate) fn run_queryable<'s, Q: Queryable + Send>(
    executor: &'s mut Q,
    query: Query,
) -> impl Stream<Item = Result<QueryResult>> + Send + 's {
    let context = Arc::new(format!("While running the query:\n{}", query));
    try_stream! {
        let Query { sql, args } = query;
        let mut rows = 0;
        if args.is_empty() {
            let mut result = executor.query_iter(sql).await?;
            while let Some(mut stream) = result.stream::<RowWrap>().await? {
                while let Some(row) = stream.next().await.transpose()? {
                    rows += 1;
                    yield QueryResult::Row(row.0)
                }
            }
            if rows == 0 {
                yield QueryResult::Affected(RowsAffected {
                    rows_affected: result.affected_rows(),
                    last_affected_id: result.last_insert_id().map(|v| v as _),
                });
            }
        } else {
            let params = Params::Positional(
                args.into_iter()
                    .map(|v| ValueWrap(v).into())
                    .collect(),
            );
            let mut result = executor.exec_iter(sql, params).await?;
            while let Some(mut stream) = result.stream::<RowWrap>().await? {
                while let Some(row) = stream.next().await.transpose()? {
                    rows += 1;
                    yield QueryResult::Row(row.0)
                }
            }
            if rows == 0 {
                yield QueryResult::Affected(RowsAffected {
                    rows_affected: result.affected_rows(),
                    last_affected_id: result.last_insert_id().map(|v| v as _),
                });
            }
        }
    }
    .map_err(move |e: Error| {
        let error = e.context(context.clone());
        log::error!("{:#}", error);
        error
    })
}
