mod connection;
mod driver;
mod executor;
mod row_wrap;
mod transaction;
mod value_wrap;

pub use connection::*;
pub use driver::*;
pub(crate) use executor::*;
pub(crate) use row_wrap::*;
pub use transaction::*;
pub(crate) use value_wrap::*;
