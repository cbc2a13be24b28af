//! Producer/disposer linking
//!
//! A disposer method names exactly one disposed-value parameter; its contract
//! and qualifiers are resolved against the producer subset of the registry.
//! The producer and its disposer must live on the same backing type, a
//! producer accepts at most one disposer, and a disposer method must not
//! simultaneously be an injection initializer, an observer or a producer.
//! All violations are collected per disposer so one broken pairing does not
//! hide another.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;
use wirecore_domain::{
    CandidateDescriptor, DescriptorId, DescriptorKind, DisposerDescriptor, Error,
};

use crate::resolve::{apply_specialization, summarize};

/// Link every disposer to its producer descriptor.
///
/// Returns the producer-to-disposer link table and the list of problems
/// found. Linking is idempotent: the same disposers against an unchanged
/// descriptor set always produce the same links.
pub(crate) fn link_disposers(
    descriptors: &HashMap<DescriptorId, Arc<CandidateDescriptor>>,
    disposers: &[DisposerDescriptor],
) -> (HashMap<DescriptorId, Arc<DisposerDescriptor>>, Vec<Error>) {
    let mut links: HashMap<DescriptorId, Arc<DisposerDescriptor>> = HashMap::new();
    let mut problems = Vec::new();

    for disposer in disposers {
        match link_one(descriptors, disposer) {
            Ok(producer_id) => {
                if links.contains_key(&producer_id) {
                    problems.push(Error::configuration(format!(
                        "multiple disposal methods for one producer on {}",
                        disposer.declaring_type()
                    )));
                } else {
                    debug!(
                        producer = %producer_id,
                        disposer = disposer.method(),
                        "linked disposer to producer"
                    );
                    links.insert(producer_id, Arc::new(disposer.clone()));
                }
            }
            Err(problem) => problems.push(problem),
        }
    }

    (links, problems)
}

fn link_one(
    descriptors: &HashMap<DescriptorId, Arc<CandidateDescriptor>>,
    disposer: &DisposerDescriptor,
) -> Result<DescriptorId, Error> {
    let roles = disposer.roles().conflicting();
    if !roles.is_empty() {
        return Err(Error::configuration(format!(
            "disposer method {} on {} must not also be: {}",
            disposer.method(),
            disposer.declaring_type(),
            roles.join(", ")
        )));
    }

    if !disposer.disposed_contract().is_concrete() {
        return Err(Error::configuration(format!(
            "disposed parameter of {} on {} contains a wildcard or type variable",
            disposer.method(),
            disposer.declaring_type()
        )));
    }

    let required = disposer.disposed_qualifiers().normalized();
    let mut matches: Vec<Arc<CandidateDescriptor>> = descriptors
        .values()
        .filter(|d| d.is_producer())
        .filter(|d| d.enabled())
        .filter(|d| d.matches(disposer.disposed_contract(), &required))
        .cloned()
        .collect();

    if matches.len() > 1 {
        matches = apply_specialization(matches);
    }

    let producer = match matches.len() {
        0 => {
            return Err(Error::unsatisfied(
                disposer.disposed_contract().clone(),
                required,
                None,
            ));
        }
        1 => matches.swap_remove(0),
        _ => {
            return Err(Error::ambiguous(
                disposer.disposed_contract().clone(),
                required,
                matches.iter().map(|d| summarize(d)).collect(),
            ));
        }
    };

    let DescriptorKind::Producer { declaring_type, .. } = producer.kind() else {
        unreachable!("producer subset contains only producer descriptors");
    };

    if declaring_type != disposer.declaring_type() {
        return Err(Error::configuration(format!(
            "disposer method {} on {} pairs with a producer declared on {}; \
             producer and disposer must share a backing type",
            disposer.method(),
            disposer.declaring_type(),
            declaring_type
        )));
    }

    Ok(producer.id())
}
