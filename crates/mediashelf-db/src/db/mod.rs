// Media records attached to owner collections
pub mod media;

pub use media::{MediaRepository, MediaRow};
