//! # CrashLens Common Library
//!
//! Shared code for the CrashLens services including:
//! - Incident model and bounding box parsing
//! - Normalization of raw upstream traffic incidents
//! - Incident tallies for analytics
//! - Configuration file loading
//! - Common error types

pub mod analytics;
pub mod config;
pub mod error;
pub mod models;
pub mod normalize;

pub use error::{Error, Result};
pub use models::{Bbox, Incident};
