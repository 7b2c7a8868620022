use crate::{MySQLDriver, MySQLTransaction, run_queryable};
use async_stream::try_stream;
use mysql_async::{Opts, OptsBuilder, Pool, PoolConstraints, PoolOpts, TxOpts, prelude::Queryable};
use shard_core::{
    Connection, Context, Driver, Error, Executor, PoolOptions, Query, QueryResult, Result,
    stream::{Stream, TryStreamExt},
    truncate_long,
};
use std::{borrow::Cow, pin::pin};
use url::Url;

/// Pool of MySQL connections, clones share the same pool.
#[derive(Debug, Clone)]
pub struct MySQLConnection {
    pub(crate) pool: Pool,
}

impl Executor for MySQLConnection {
    type Driver = MySQLDriver;

    fn run<'s>(&'s mut self, query: Query) -> impl Stream<Item = Result<QueryResult>> + Send + 's {
        let pool = &self.pool;
        try_stream! {
            let mut connection = pool.get_conn().await.map_err(|e| {
                let e = Error::new(e).context("While getting a connection from the pool");
                log::error!("{:#}", e);
                e
            })?;
            let mut stream = pin!(run_queryable(&mut connection, query));
            while let Some(result) = stream.try_next().await? {
                yield result
            }
        }
    }
}

fn constraints(options: &PoolOptions) -> Result<PoolConstraints> {
    let default = PoolConstraints::default();
    let max = options.max_open.unwrap_or(default.max());
    let min = options.max_idle.unwrap_or(default.min()).min(max);
    PoolConstraints::new(min, max).filter(|_| max > 0).ok_or_else(|| {
        Error::msg(format!(
            "Invalid pool limits, {} idle connections and {} open connections",
            min, max
        ))
    })
}

impl Connection for MySQLConnection {
    async fn connect(url: Cow<'static, str>, options: &PoolOptions) -> Result<MySQLConnection> {
        let context = || format!("While trying to connect to `{}`", truncate_long!(url));
        let prefix = format!("{}://", <Self::Driver as Driver>::NAME);
        if !url.starts_with(&prefix) {
            let error = Error::msg(format!(
                "MySQL connection url must start with `{}`",
                &prefix
            ))
            .context(context());
            log::error!("{:#}", error);
            return Err(error);
        }
        let url = Url::parse(&url).with_context(context)?;
        let opts = Opts::from_url(url.as_str()).with_context(context)?;
        let constraints = constraints(options).with_context(context)?;
        let opts: Opts = OptsBuilder::from_opts(opts)
            .pool_opts(PoolOpts::default().with_constraints(constraints))
            .into();
        Ok(MySQLConnection {
            pool: Pool::new(opts),
        })
    }

    async fn ping(&mut self) -> Result<()> {
        let mut connection = self
            .pool
            .get_conn()
            .await
            .context("While getting a connection from the pool")?;
        connection.ping().await.context("While pinging MySQL")?;
        Ok(())
    }

    async fn begin(&mut self) -> Result<MySQLTransaction> {
        let transaction = self
            .pool
            .start_transaction(TxOpts::default())
            .await
            .map_err(|e| {
                let e = Error::new(e).context("While starting a transaction");
                log::error!("{:#}", e);
                e
            })?;
        Ok(MySQLTransaction { transaction })
    }

    async fn disconnect(self) -> Result<()> {
        self.pool
            .disconnect()
            .await
            .context("While disconnecting the MySQL pool")
    }
}
