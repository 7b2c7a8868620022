use crate::{Connection, Transaction};

/// Entry point of a database backend.
pub trait Driver: Default + Send + Sync + 'static {
    type Connection: Connection<Driver = Self>;
    type Transaction: Transaction<Driver = Self>;

    /// Scheme expected at the beginning of connection urls.
    const NAME: &'static str;
}
