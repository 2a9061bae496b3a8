//! Normalization of raw upstream traffic incidents
//!
//! The upstream API is inconsistent about field shapes: descriptive text may
//! arrive as a string, an object with labeled sub-fields, or a list of those,
//! and coordinates may live in several places. This module turns one raw record
//! into an [`Incident`](crate::Incident) without ever failing the whole batch.

pub mod field_text;
pub mod geolocation;
pub mod incident;

pub use field_text::{extract_text, FieldText};
pub use geolocation::{resolve_coordinates, Coordinates};
pub use incident::{normalize_batch, normalize_incident, NormalizeError};
