mod resource;
mod state;

pub use resource::ResourceRow;
pub use state::StateRow;
