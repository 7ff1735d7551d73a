mod health;
pub mod resources;
pub mod sql;

pub use health::*;
