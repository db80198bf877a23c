pub mod actor;
pub mod media;
pub mod operation;

pub use actor::Actor;
pub use media::{CustomProperties, MediaRecord, OwnerRef};
pub use operation::{MediaAction, MediaBatch, OperationInput};
