use crate::{MemoryConnection, MemoryTransaction};
use shard::Driver;

#[derive(Clone, Copy, Default, Debug)]
pub struct MemoryDriver;

impl Driver for MemoryDriver {
    type Connection = MemoryConnection;
    type Transaction = MemoryTransaction;

    const NAME: &'static str = "memory";
}
