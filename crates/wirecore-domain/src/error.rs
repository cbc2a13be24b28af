//! Error handling types
//!
//! The four-way taxonomy of the container core: unsatisfied and ambiguous
//! resolution outcomes, structural configuration faults detected at
//! deployment time, and proxy generation failures. Deployment-time faults are
//! aggregated across descriptors before startup is rejected.

use thiserror::Error;

use crate::descriptor::DescriptorId;
use crate::qualifier::QualifierSet;
use crate::request::InjectionPoint;
use crate::types::{ContractKey, TypeKey};

/// Result type alias for operations that can fail
pub type Result<T> = std::result::Result<T, Error>;

/// Candidate identity carried inside ambiguity reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSummary {
    /// Descriptor identity
    pub id: DescriptorId,
    /// Backing type of the candidate
    pub backing_type: TypeKey,
    /// Declared qualifiers
    pub qualifiers: QualifierSet,
}

impl std::fmt::Display for CandidateSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.backing_type, self.qualifiers)
    }
}

/// Main error type for the wirecore container core
#[derive(Error, Debug)]
pub enum Error {
    /// No candidate matches the request
    #[error("unsatisfied dependency: no candidate for {contract} with qualifiers {qualifiers}{}", display_site(.site.as_ref()))]
    Unsatisfied {
        /// The requested contract
        contract: ContractKey,
        /// The required qualifiers (normalized)
        qualifiers: QualifierSet,
        /// The originating declaration site, if known
        site: Option<InjectionPoint>,
    },

    /// More than one candidate survives specialization
    #[error("ambiguous dependency: {contract} with qualifiers {qualifiers} matches {} candidates: {}", .candidates.len(), display_candidates(.candidates))]
    Ambiguous {
        /// The requested contract
        contract: ContractKey,
        /// The required qualifiers (normalized)
        qualifiers: QualifierSet,
        /// All surviving candidates
        candidates: Vec<CandidateSummary>,
    },

    /// Structural violation detected ahead of resolution
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the violation
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Proxy synthesis or materialization failure
    #[error("proxy generation error: {message}")]
    ProxyGeneration {
        /// Description of the failure
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Privileged and fallback instantiation paths both unavailable
    #[error("instantiation error: {message}")]
    Instantiation {
        /// Description of the failure
        message: String,
    },

    /// Aggregated deployment-time faults (fail-fast batch reporting)
    #[error("deployment failed with {} problem(s)", .problems.len())]
    Deployment {
        /// Every problem found across all descriptors
        problems: Vec<Error>,
    },
}

fn display_site(site: Option<&InjectionPoint>) -> String {
    match site {
        Some(site) => format!(" (injection point: {site})"),
        None => String::new(),
    }
}

fn display_candidates(candidates: &[CandidateSummary]) -> String {
    candidates
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl Error {
    /// Create an unsatisfied-resolution error
    pub fn unsatisfied(
        contract: ContractKey,
        qualifiers: QualifierSet,
        site: Option<InjectionPoint>,
    ) -> Self {
        Self::Unsatisfied {
            contract,
            qualifiers,
            site,
        }
    }

    /// Create an ambiguous-resolution error
    pub fn ambiguous(
        contract: ContractKey,
        qualifiers: QualifierSet,
        candidates: Vec<CandidateSummary>,
    ) -> Self {
        Self::Ambiguous {
            contract,
            qualifiers,
            candidates,
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration error with source
    pub fn configuration_with_source<
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    >(
        message: S,
        source: E,
    ) -> Self {
        Self::Configuration {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a proxy generation error
    pub fn proxy_generation<S: Into<String>>(message: S) -> Self {
        Self::ProxyGeneration {
            message: message.into(),
            source: None,
        }
    }

    /// Create a proxy generation error with source
    pub fn proxy_generation_with_source<
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    >(
        message: S,
        source: E,
    ) -> Self {
        Self::ProxyGeneration {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an instantiation error
    pub fn instantiation<S: Into<String>>(message: S) -> Self {
        Self::Instantiation {
            message: message.into(),
        }
    }

    /// Aggregate deployment problems into a single failure
    pub fn deployment(problems: Vec<Error>) -> Self {
        Self::Deployment { problems }
    }

    /// Whether this is an unsatisfied-resolution outcome
    pub fn is_unsatisfied(&self) -> bool {
        matches!(self, Self::Unsatisfied { .. })
    }

    /// Whether this is an ambiguous-resolution outcome
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::Ambiguous { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsatisfied_display_names_request_context() {
        let error = Error::unsatisfied(
            ContractKey::raw("demo.Greeter"),
            QualifierSet::of([crate::qualifier::Qualifier::default_qualifier()]),
            Some(InjectionPoint::field("demo.App", "greeter")),
        );
        let text = error.to_string();
        assert!(text.contains("demo.Greeter"));
        assert!(text.contains("@Default"));
        assert!(text.contains("field greeter of demo.App"));
    }

    #[test]
    fn test_ambiguous_display_lists_all_candidates() {
        let error = Error::ambiguous(
            ContractKey::raw("demo.Greeter"),
            QualifierSet::new(),
            vec![
                CandidateSummary {
                    id: DescriptorId::new(),
                    backing_type: TypeKey::new("demo.FormalGreeter"),
                    qualifiers: QualifierSet::new(),
                },
                CandidateSummary {
                    id: DescriptorId::new(),
                    backing_type: TypeKey::new("demo.CasualGreeter"),
                    qualifiers: QualifierSet::new(),
                },
            ],
        );
        let text = error.to_string();
        assert!(text.contains("2 candidates"));
        assert!(text.contains("demo.FormalGreeter"));
        assert!(text.contains("demo.CasualGreeter"));
    }

    #[test]
    fn test_deployment_aggregates_problem_count() {
        let error = Error::deployment(vec![
            Error::configuration("first"),
            Error::configuration("second"),
        ]);
        assert!(error.to_string().contains("2 problem(s)"));
    }
}
