//! sakuga-dl scrapes sakugabooru posts into per-post folders and re-chunks
//! the accumulated metadata into batched JSONL archives.

pub static USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

pub mod batch;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod extract;
pub mod models;
pub mod scrape;

pub use error::{Error, Result};
