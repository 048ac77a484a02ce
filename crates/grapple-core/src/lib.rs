//! Core data types for the grapple dependency resolver.
//!
//! This crate defines the value types the rest of the workspace is built
//! on: Maven artifact coordinates, repository URL layout, the resolution
//! event sink, and the Gradle manifest adapter.
//!
//! This crate is intentionally free of async code and network I/O.

pub mod artifact;
pub mod events;
pub mod gradle;
pub mod repository;

pub use artifact::Artifact;
pub use events::EventSink;
pub use repository::Repository;
