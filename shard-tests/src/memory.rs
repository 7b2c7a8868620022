mod connection;
mod driver;
mod store;
mod transaction;

pub use connection::{MemoryConnection, StatementRecord};
pub use driver::*;
pub use transaction::*;
