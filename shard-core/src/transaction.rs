use crate::{Executor, Result};
use std::future::Future;

/// Open transaction of a driver, consumed when it ends.
///
/// When the store already ended the transaction on its own (connection lost, killed by the
/// server) both [`Transaction::commit`] and [`Transaction::rollback`] must fail with
/// [`crate::OrmError::TransactionNotBegan`], so callers see the same error whatever the driver.
pub trait Transaction: Executor + 'static {
    fn commit(self) -> impl Future<Output = Result<()>> + Send;
    fn rollback(self) -> impl Future<Output = Result<()>> + Send;
}
