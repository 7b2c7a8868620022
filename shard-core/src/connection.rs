use crate::{Driver, Executor, PoolOptions, Result};
use std::{borrow::Cow, future::Future};

/// Cloneable handle to a connection pool.
pub trait Connection: Executor + Clone + Sync {
    /// Create a connection pool to the given url.
    fn connect(
        url: Cow<'static, str>,
        options: &PoolOptions,
    ) -> impl Future<Output = Result<Self>> + Send;

    /// Round trip to check the store is reachable.
    fn ping(&mut self) -> impl Future<Output = Result<()>> + Send;

    fn begin(
        &mut self,
    ) -> impl Future<Output = Result<<Self::Driver as Driver>::Transaction>> + Send;

    fn disconnect(self) -> impl Future<Output = Result<()>> + Send {
        async { Ok(()) }
    }
}
