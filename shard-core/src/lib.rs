mod as_value;
mod catalog;
mod codec;
mod connection;
mod decode_type;
mod directive;
mod driver;
mod error;
mod executor;
mod model;
mod options;
mod query;
mod registry;
mod session;
mod sql_writer;
mod transaction;
mod util;
mod value;

pub use ::anyhow::Context;
pub use as_value::*;
pub use catalog::*;
pub use codec::*;
pub use connection::*;
pub use decode_type::*;
pub use directive::*;
pub use driver::*;
pub use error::*;
pub use executor::*;
pub use model::*;
pub use options::*;
pub use query::*;
pub use registry::*;
pub use session::*;
pub use sql_writer::*;
pub use transaction::*;
pub use util::*;
pub use value::*;
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
