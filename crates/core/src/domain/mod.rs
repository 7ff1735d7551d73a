mod descriptor;
mod intent;
mod status;

pub use descriptor::ResourceDescriptor;
pub use intent::{CreateIntent, ResourceArgs, ShardArgs};
pub use status::{ResourceStatus, StatusKey, StatusRecord};
