pub mod bookmark;
pub mod clear;
pub mod common;
pub mod completions;
pub mod config;
pub mod list;
pub mod remove;
pub mod status;
pub mod sync;
