//! # DFD Common Library
//!
//! Shared code for the deepfake-detection services:
//! - Error type for configuration and I/O
//! - TOML configuration loading and config file discovery
//! - Event types (DetectionEvent) and the broadcast EventBus

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
