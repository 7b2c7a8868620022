mod accounts;
mod collection;
mod limits;
mod memory;
mod transactions;

pub use accounts::{Account, accounts};
use collection::collection;
use limits::limits;
use log::LevelFilter;
pub use memory::*;
use shard::Driver;
use std::env;
use transactions::transactions;

/// Alias every section registers its connection under.
pub const DEFAULT_ALIAS: &str = "default";

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

pub async fn execute_tests<D: Driver>(connection: D::Connection) {
    accounts::<D>(connection.clone()).await;
    limits::<D>(connection.clone()).await;
    transactions::<D>(connection.clone()).await;
    collection::<D>(connection).await;
}

/// Runs the code with logging disabled, for the steps expected to fail.
#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        let result = { $($code)+ };
        log::set_max_level(level);
        result
    }};
}
