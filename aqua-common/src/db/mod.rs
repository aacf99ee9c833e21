//! SQLite pool initialisation

pub mod init;

pub use init::*;
