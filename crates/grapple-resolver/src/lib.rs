//! Transitive dependency resolution engine.
//!
//! Walks the dependency graph of a project concurrently across remote
//! Maven repositories, memoizes per-coordinate resolutions, and collapses
//! the result to one artifact per `group:artifact` under a newest-wins
//! policy (a deliberate divergence from Maven's own nearest-wins — see
//! [`resolve::DependencyResolver`]).

pub mod cache;
pub mod conflict;
pub mod graph;
pub mod resolve;
pub mod version;
pub mod walker;

pub use resolve::{DependencyResolver, Resolution};
