pub mod identity;
pub mod media;
