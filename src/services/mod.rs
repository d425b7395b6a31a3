pub mod catalog;
pub mod player;
pub mod session;
pub mod sweeper;
