pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod memory;
pub mod queue;
pub mod redis_pool;
pub mod store;
pub mod types;
