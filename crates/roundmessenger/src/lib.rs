// Library root: re-exports all modules so integration tests and the binary
// can access the crate's public API.

pub mod chat;
pub mod cli;
pub mod config;
pub mod directory;
pub mod dispatch;
pub mod draw;
pub mod tabbycat;
