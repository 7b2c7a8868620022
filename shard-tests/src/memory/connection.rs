use super::store::Store;
use crate::{MemoryDriver, MemoryTransaction};
use shard::{
    Connection, Context, Driver, Error, Executor, PoolOptions, Query, QueryResult, Result,
    stream::{self, Stream},
};
use std::{
    borrow::Cow,
    sync::{Arc, Mutex, MutexGuard},
};

/// A statement received by the memory database.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementRecord {
    pub sql: String,
    pub transactional: bool,
}

#[derive(Debug, Default)]
pub(crate) struct Shared {
    pub(crate) store: Store,
    /// Bumped to invalidate every open transaction.
    pub(crate) generation: u64,
    pub(crate) statements: Vec<StatementRecord>,
}

pub(crate) fn lock(shared: &Mutex<Shared>) -> Result<MutexGuard<'_, Shared>> {
    shared
        .lock()
        .map_err(|_| Error::msg("The memory database lock is poisoned"))
}

/// Runs `query` against `store`, recording it, and collects the results for a stream.
pub(crate) fn run_on(
    shared: &Mutex<Shared>,
    store: Option<&mut Store>,
    query: Query,
    text_protocol: bool,
) -> Vec<Result<QueryResult>> {
    let result = lock(shared).and_then(|mut shared| {
        shared.statements.push(StatementRecord {
            sql: query.sql.clone(),
            transactional: store.is_some(),
        });
        match store {
            Some(store) => store.execute(&query, text_protocol),
            None => shared.store.execute(&query, text_protocol),
        }
    });
    match result.with_context(|| format!("While executing the query:\n{}", query)) {
        Ok(results) => results.into_iter().map(Ok).collect(),
        Err(e) => {
            log::error!("{:#}", e);
            vec![Err(e)]
        }
    }
}

/// In-memory database understanding the statements generated by shard.
///
/// Clones share the same tables. Urls look like `memory://name`, `memory://offline`
/// connects but fails every ping, `?protocol=text` returns every value as text.
#[derive(Debug, Clone)]
pub struct MemoryConnection {
    pub(crate) shared: Arc<Mutex<Shared>>,
    pub(crate) text_protocol: bool,
    reachable: bool,
}

impl MemoryConnection {
    pub fn new() -> Self {
        Self {
            shared: Default::default(),
            text_protocol: false,
            reachable: true,
        }
    }

    pub fn with_text_protocol(mut self, text_protocol: bool) -> Self {
        self.text_protocol = text_protocol;
        self
    }

    /// Statements received so far, oldest first.
    pub fn statements(&self) -> Result<Vec<StatementRecord>> {
        Ok(lock(&self.shared)?.statements.clone())
    }

    pub fn clear_statements(&self) -> Result<()> {
        lock(&self.shared)?.statements.clear();
        Ok(())
    }

    /// Make every open transaction fail on commit and rollback, like a dropped server connection.
    pub fn kill_transactions(&self) -> Result<()> {
        lock(&self.shared)?.generation += 1;
        Ok(())
    }
}

impl Executor for MemoryConnection {
    type Driver = MemoryDriver;

    fn run<'s>(&'s mut self, query: Query) -> impl Stream<Item = Result<QueryResult>> + Send + 's {
        stream::iter(run_on(&self.shared, None, query, self.text_protocol))
    }
}

impl Connection for MemoryConnection {
    async fn connect(url: Cow<'static, str>, _options: &PoolOptions) -> Result<Self> {
        let prefix = format!("{}://", MemoryDriver::NAME);
        let Some(rest) = url.strip_prefix(&prefix) else {
            let error = Error::msg(format!(
                "Memory connection url must start with `{}`",
                &prefix
            ));
            log::error!("{:#}", error);
            return Err(error);
        };
        let (host, params) = rest.split_once('?').unwrap_or((rest, ""));
        let text_protocol = params.split('&').any(|v| v == "protocol=text");
        Ok(Self {
            reachable: host != "offline",
            ..Self::new().with_text_protocol(text_protocol)
        })
    }

    async fn ping(&mut self) -> Result<()> {
        if self.reachable {
            Ok(())
        } else {
            Err(Error::msg("The memory database is offline"))
        }
    }

    async fn begin(&mut self) -> Result<MemoryTransaction> {
        let shared = lock(&self.shared)?;
        Ok(MemoryTransaction {
            shared: self.shared.clone(),
            snapshot: shared.store.clone(),
            generation: shared.generation,
            text_protocol: self.text_protocol,
        })
    }
}
