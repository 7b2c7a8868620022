use crate::{MySQLDriver, run_queryable};
use shard_core::{
    Context, Executor, Query, QueryResult, Result, Transaction, stream::Stream,
};

pub struct MySQLTransaction {
    pub(crate) transaction: mysql_async::Transaction<'static>,
}

impl Executor for MySQLTransaction {
    type Driver = MySQLDriver;

    fn run<'s>(&'s mut self, query: Query) -> impl Stream<Item = Result<QueryResult>> + Send + 's {
        run_queryable(&mut self.transaction, query)
    }
}

impl Transaction for MySQLTransaction {
    async fn commit(self) -> Result<()> {
        self.transaction
            .commit()
            .await
            .context("While committing the transaction")
    }

    async fn rollback(self) -> Result<()> {
        self.transaction
            .rollback()
            .await
            .context("While rolling back the transaction")
    }
}
