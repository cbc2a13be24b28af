//! Typesafe resolution engine
//!
//! Given an injection request, picks the single winning candidate descriptor
//! or fails with a typed outcome. The algorithm, in order: reject wildcard or
//! type-variable requests outright; keep candidates with an assignable
//! contract; keep candidates whose qualifiers form a superset of the required
//! ones; drop disabled candidates and non-activated alternatives; drop the
//! requesting component itself when its scope forbids self-injection; then
//! let specialization break ties before reporting unsatisfied or ambiguous
//! outcomes.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, trace};
use wirecore_domain::{
    CandidateDescriptor, CandidateSummary, DescriptorId, Error, InjectionRequest, Result,
};

use crate::registry::Registry;

/// Resolves injection requests against an immutable registry snapshot.
///
/// Results are memoized per distinct request value. The memo map tolerates
/// concurrent readers and writers; recomputing and overwriting with an equal
/// result is harmless, so no exclusive locking is needed.
pub struct ResolutionEngine {
    registry: Arc<Registry>,
    cache: DashMap<InjectionRequest, DescriptorId>,
}

impl ResolutionEngine {
    /// Create an engine over a frozen registry
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            cache: DashMap::new(),
        }
    }

    /// The registry this engine resolves against
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Resolve exactly one winning descriptor for the request
    pub fn resolve(&self, request: &InjectionRequest) -> Result<Arc<CandidateDescriptor>> {
        if !request.contract().is_concrete() {
            return Err(Error::configuration(format!(
                "injection request for {} contains a wildcard or type variable",
                request.contract()
            )));
        }

        if let Some(hit) = self.cache.get(request) {
            if let Some(descriptor) = self.registry.get(*hit) {
                trace!(request = %request, "resolution cache hit");
                return Ok(descriptor.clone());
            }
        }

        let winner = self.resolve_uncached(request, false)?;
        self.cache.insert(request.clone(), winner.id());
        Ok(winner)
    }

    /// Resolve against the producer subset only (used by disposer linking)
    pub fn resolve_producer(&self, request: &InjectionRequest) -> Result<Arc<CandidateDescriptor>> {
        if !request.contract().is_concrete() {
            return Err(Error::configuration(format!(
                "injection request for {} contains a wildcard or type variable",
                request.contract()
            )));
        }
        self.resolve_uncached(request, true)
    }

    fn resolve_uncached(
        &self,
        request: &InjectionRequest,
        producers_only: bool,
    ) -> Result<Arc<CandidateDescriptor>> {
        let required = request.qualifiers().normalized();

        let mut matches: Vec<Arc<CandidateDescriptor>> = self
            .registry
            .candidates_for(request.contract().raw_type())
            .filter(|d| !producers_only || d.is_producer())
            .filter(|d| d.matches(request.contract(), &required))
            .filter(|d| {
                d.enabled() || (d.alternative() && request.activates_alternatives())
            })
            .filter(|d| {
                // self-injection is only legal through a normal-scope proxy
                match request.site() {
                    Some(site) => {
                        d.scope().is_normal() || d.backing_type() != &site.declaring_type
                    }
                    None => true,
                }
            })
            .cloned()
            .collect();

        debug!(
            request = %request,
            candidates = matches.len(),
            "filtered assignable candidates"
        );

        if matches.len() > 1 {
            matches = apply_specialization(matches);
        }

        match matches.len() {
            0 => Err(Error::unsatisfied(
                request.contract().clone(),
                required,
                request.site().cloned(),
            )),
            1 => Ok(matches.swap_remove(0)),
            _ => Err(Error::ambiguous(
                request.contract().clone(),
                required,
                matches.iter().map(|d| summarize(d)).collect(),
            )),
        }
    }
}

/// Remove specialized candidates while their specializing candidate is in
/// the set, repeating until no further specialization applies.
pub(crate) fn apply_specialization(
    mut candidates: Vec<Arc<CandidateDescriptor>>,
) -> Vec<Arc<CandidateDescriptor>> {
    loop {
        let superseded = candidates.iter().position(|candidate| {
            candidates.iter().any(|other| {
                other.id() != candidate.id()
                    && other.specializes() == Some(candidate.backing_type())
            })
        });
        match superseded {
            Some(pos) => {
                candidates.remove(pos);
            }
            None => return candidates,
        }
    }
}

pub(crate) fn summarize(descriptor: &CandidateDescriptor) -> CandidateSummary {
    CandidateSummary {
        id: descriptor.id(),
        backing_type: descriptor.backing_type().clone(),
        qualifiers: descriptor.qualifiers().clone(),
    }
}
