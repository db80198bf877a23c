pub mod health;
pub mod thumbs;
pub mod upload;
pub mod view;
