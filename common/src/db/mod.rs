// Database layer module
// PostgreSQL pool and repositories over the ERP schema

pub mod pool;
pub mod repositories;

pub use pool::DbPool;
