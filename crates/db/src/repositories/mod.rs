mod resource_repository;
mod state_repository;

pub use resource_repository::*;
pub use state_repository::*;
