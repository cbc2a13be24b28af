//! Candidate source registration
//!
//! Auto-registration bridge for metadata discovery backends using linkme
//! distributed slices. A discovery backend (annotation scanner, config
//! reader, test fixture) registers itself at compile time and is applied to
//! the registry builder during deployment; the core itself never parses
//! annotations or configuration files.
//!
//! ## Registering a source
//!
//! ```ignore
//! use wirecore_resolver::{CANDIDATE_SOURCES, CandidateSourceEntry};
//!
//! #[linkme::distributed_slice(CANDIDATE_SOURCES)]
//! static FIXTURES: CandidateSourceEntry = CandidateSourceEntry {
//!     name: "fixtures",
//!     description: "Hand-written test fixtures",
//!     register: |builder| {
//!         builder.register(console_greeter()?);
//!         Ok(())
//!     },
//! };
//! ```

use tracing::info;
use wirecore_domain::{Error, Result};

use crate::registry::RegistryBuilder;

/// Registry entry for one metadata discovery backend
pub struct CandidateSourceEntry {
    /// Unique source name
    pub name: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// Populate the builder with this source's descriptors
    pub register: fn(&mut RegistryBuilder) -> std::result::Result<(), String>,
}

// Auto-collection via linkme distributed slices - sources submit entries at compile time
#[linkme::distributed_slice]
pub static CANDIDATE_SOURCES: [CandidateSourceEntry] = [..];

/// Apply every registered candidate source to the builder.
///
/// Sources run in registration order; a failing source is reported as a
/// configuration error naming the source.
pub fn apply_candidate_sources(builder: &mut RegistryBuilder) -> Result<()> {
    for entry in CANDIDATE_SOURCES {
        (entry.register)(builder).map_err(|e| {
            Error::configuration(format!("candidate source '{}' failed: {e}", entry.name))
        })?;
        info!(source = entry.name, "applied candidate source");
    }
    Ok(())
}

/// List all registered candidate sources
///
/// Returns (name, description) tuples, useful for diagnostics.
pub fn list_candidate_sources() -> Vec<(&'static str, &'static str)> {
    CANDIDATE_SOURCES
        .iter()
        .map(|e| (e.name, e.description))
        .collect()
}
