//! cimxml-std: Filesystem loader, schema cache and CLI utilities
//!
//! This crate provides convenience utilities for native Rust usage of
//! [`cimxml_core`]: loading declaration files from disk into a
//! [`Schema`](cimxml_core::Schema), caching loaded schemas, and the
//! `cimxml-dump` tool.

pub mod cache;
pub mod loader;

pub use cimxml_core;
pub use loader::{load_schema_dir, load_schema_files, LoaderError};
