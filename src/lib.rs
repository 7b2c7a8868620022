pub use shard_core::*;
pub use shard_macros::Model;
