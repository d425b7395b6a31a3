pub mod health;
pub mod watch;
