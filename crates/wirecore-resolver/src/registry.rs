//! Candidate registry
//!
//! The registry holds every known component descriptor, indexed by raw
//! contract type. Registration is single-writer: the builder is consumed by
//! `build()`, which validates the whole deployment, links disposers to their
//! producers and freezes an immutable snapshot. All deployment-time problems
//! are aggregated before startup is rejected, so one broken descriptor does
//! not hide the faults of another.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};
use wirecore_domain::{
    CandidateDescriptor, DescriptorId, DisposerDescriptor, Error, Result, TypeKey,
};

use crate::disposal;

/// Single-writer deployment-phase accumulator for descriptors and disposers
#[derive(Default)]
pub struct RegistryBuilder {
    descriptors: Vec<CandidateDescriptor>,
    disposers: Vec<DisposerDescriptor>,
}

impl RegistryBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a candidate descriptor
    pub fn register(&mut self, descriptor: CandidateDescriptor) -> &mut Self {
        debug!(backing_type = %descriptor.backing_type(), "registering candidate");
        self.descriptors.push(descriptor);
        self
    }

    /// Register a disposer method found during scanning
    pub fn register_disposer(&mut self, disposer: DisposerDescriptor) -> &mut Self {
        debug!(
            declaring_type = %disposer.declaring_type(),
            method = disposer.method(),
            "registering disposer"
        );
        self.disposers.push(disposer);
        self
    }

    /// Number of registered descriptors
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether no descriptor has been registered yet
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Validate the deployment, link disposers and freeze the snapshot.
    ///
    /// Every problem found across all descriptors is collected; a non-empty
    /// problem list rejects the whole deployment as a single aggregated
    /// error.
    pub fn build(self) -> Result<Registry> {
        let mut descriptors: HashMap<DescriptorId, Arc<CandidateDescriptor>> = HashMap::new();
        let mut by_raw_type: HashMap<TypeKey, Vec<DescriptorId>> = HashMap::new();

        for descriptor in self.descriptors {
            let id = descriptor.id();
            for contract in descriptor.contracts() {
                let ids = by_raw_type.entry(contract.raw_type().clone()).or_default();
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
            descriptors.insert(id, Arc::new(descriptor));
        }

        let (links, problems) = disposal::link_disposers(&descriptors, &self.disposers);

        if !problems.is_empty() {
            return Err(Error::deployment(problems));
        }

        info!(
            descriptors = descriptors.len(),
            disposers = links.len(),
            "candidate registry built"
        );

        Ok(Registry {
            descriptors,
            by_raw_type,
            links,
        })
    }
}

/// Immutable registry snapshot. No locking is required for reads; rebinding
/// at runtime is not supported.
pub struct Registry {
    descriptors: HashMap<DescriptorId, Arc<CandidateDescriptor>>,
    by_raw_type: HashMap<TypeKey, Vec<DescriptorId>>,
    links: HashMap<DescriptorId, Arc<DisposerDescriptor>>,
}

impl Registry {
    /// Look up a descriptor by identity
    pub fn get(&self, id: DescriptorId) -> Option<&Arc<CandidateDescriptor>> {
        self.descriptors.get(&id)
    }

    /// All descriptors declaring a contract with the given raw type
    pub fn candidates_for<'a>(
        &'a self,
        raw: &TypeKey,
    ) -> impl Iterator<Item = &'a Arc<CandidateDescriptor>> + 'a {
        self.by_raw_type
            .get(raw)
            .into_iter()
            .flatten()
            .filter_map(|id| self.descriptors.get(id))
    }

    /// Iterate every registered descriptor
    pub fn descriptors(&self) -> impl Iterator<Item = &Arc<CandidateDescriptor>> {
        self.descriptors.values()
    }

    /// The disposer linked to the given producer descriptor, if any
    pub fn disposer_for(&self, producer: DescriptorId) -> Option<&Arc<DisposerDescriptor>> {
        self.links.get(&producer)
    }

    /// Number of registered descriptors
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether the registry holds no descriptors
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("descriptors", &self.descriptors.len())
            .field("contract_types", &self.by_raw_type.len())
            .field("disposer_links", &self.links.len())
            .finish()
    }
}
