use crate::{MySQLConnection, MySQLTransaction};
use shard_core::Driver;

#[derive(Clone, Copy, Default, Debug)]
pub struct MySQLDriver;
impl MySQLDriver {
    pub const fn new() -> Self {
        Self
    }
}

impl Driver for MySQLDriver {
    type Connection = MySQLConnection;
    type Transaction = MySQLTransaction;

    const NAME: &'static str = "mysql";
}
