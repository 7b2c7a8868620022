use super::{
    connection::{Shared, lock, run_on},
    store::Store,
};
use crate::MemoryDriver;
use shard::{
    Error, Executor, OrmError, Query, QueryResult, Result, Transaction,
    stream::{self, Stream},
};
use std::sync::{Arc, Mutex, MutexGuard};

/// Works on a copy of the tables, written back on commit.
pub struct MemoryTransaction {
    pub(crate) shared: Arc<Mutex<Shared>>,
    pub(crate) snapshot: Store,
    pub(crate) generation: u64,
    pub(crate) text_protocol: bool,
}

impl MemoryTransaction {
    fn finish(&self) -> Result<MutexGuard<'_, Shared>> {
        let shared = lock(&self.shared)?;
        if shared.generation != self.generation {
            return Err(Error::new(OrmError::TransactionNotBegan));
        }
        Ok(shared)
    }
}

impl Executor for MemoryTransaction {
    type Driver = MemoryDriver;

    fn run<'s>(&'s mut self, query: Query) -> impl Stream<Item = Result<QueryResult>> + Send + 's {
        stream::iter(run_on(
            &self.shared,
            Some(&mut self.snapshot),
            query,
            self.text_protocol,
        ))
    }
}

impl Transaction for MemoryTransaction {
    async fn commit(self) -> Result<()> {
        let mut shared = self.finish()?;
        shared.store = self.snapshot.clone();
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.finish().map(|_| ())
    }
}
