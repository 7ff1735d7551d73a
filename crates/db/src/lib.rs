mod error;
mod memory;
pub mod models;
mod pool;
pub mod repositories;
pub mod traits;

pub use error::*;
pub use memory::{MemoryCatalog, MemoryStatusStore};
pub use pool::*;
pub use sqlx::SqlitePool;
pub use repositories::*;
pub use traits::{Catalog, StatusStore};
