//! Resolution layer for wirecore
//!
//! Holds the candidate registry, the typesafe resolution engine and the
//! producer/disposer linker. The registry is built once by a single writer
//! during deployment and is immutable afterwards; resolution results are
//! memoized per distinct injection request for the lifetime of the snapshot.

pub mod discovery;
mod disposal;
pub mod registry;
pub mod resolve;

pub use discovery::{
    CANDIDATE_SOURCES, CandidateSourceEntry, apply_candidate_sources, list_candidate_sources,
};
pub use registry::{Registry, RegistryBuilder};
pub use resolve::ResolutionEngine;
