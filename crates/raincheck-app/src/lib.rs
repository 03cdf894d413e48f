//! Collaborator layer for the raincheck engine
//!
//! Owns the trigger surface UI collaborators call into: location
//! selection with request-generation tracking, the geolocation error
//! taxonomy, and shareable bookmark references. Rendering stays with the
//! caller; everything here resolves to a terminal, renderable outcome.

pub mod bookmark;
pub mod location;
pub mod service;

pub use location::{LocationError, LocationSource};
pub use service::{RaincheckService, ServiceOutcome};
