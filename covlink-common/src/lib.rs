//! # covlink Common Library
//!
//! Shared code for the covlink services:
//! - Error types
//! - Bootstrap configuration loading and resolution

pub mod config;
pub mod error;

pub use error::{Error, Result};
