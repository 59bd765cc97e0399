pub mod shard_pool;

pub use shard_pool::run_shard_pool;
