//! Injection requests and injection points

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::qualifier::{Qualifier, QualifierSet};
use crate::types::{ContractKey, TypeKey};

/// Which kind of declaration site originated a request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InjectionPointKind {
    /// An injected field
    Field,
    /// An injected initializer method
    Method,
    /// A parameter of a method or constructor, by position
    Parameter(usize),
}

/// The declaration site a request originated from, kept for diagnostics and
/// for the self-injection exclusion rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InjectionPoint {
    /// Type declaring the injection point
    pub declaring_type: TypeKey,
    /// Member name (field or method)
    pub member: String,
    /// Site kind
    pub kind: InjectionPointKind,
}

impl InjectionPoint {
    /// An injected field site
    pub fn field(declaring_type: impl Into<TypeKey>, member: impl Into<String>) -> Self {
        Self {
            declaring_type: declaring_type.into(),
            member: member.into(),
            kind: InjectionPointKind::Field,
        }
    }

    /// An injected method site
    pub fn method(declaring_type: impl Into<TypeKey>, member: impl Into<String>) -> Self {
        Self {
            declaring_type: declaring_type.into(),
            member: member.into(),
            kind: InjectionPointKind::Method,
        }
    }

    /// A parameter site
    pub fn parameter(
        declaring_type: impl Into<TypeKey>,
        member: impl Into<String>,
        index: usize,
    ) -> Self {
        Self {
            declaring_type: declaring_type.into(),
            member: member.into(),
            kind: InjectionPointKind::Parameter(index),
        }
    }
}

impl fmt::Display for InjectionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            InjectionPointKind::Field => {
                write!(f, "field {} of {}", self.member, self.declaring_type)
            }
            InjectionPointKind::Method => {
                write!(f, "method {} of {}", self.member, self.declaring_type)
            }
            InjectionPointKind::Parameter(index) => write!(
                f,
                "parameter {} of {}.{}",
                index, self.declaring_type, self.member
            ),
        }
    }
}

/// A request submitted to the resolution engine: the wanted contract, the
/// required qualifiers and the originating site.
///
/// The request value is the memoization key for resolution results, so it is
/// `Eq + Hash` over all discriminating parts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InjectionRequest {
    contract: ContractKey,
    qualifiers: QualifierSet,
    site: Option<InjectionPoint>,
    activate_alternatives: bool,
}

impl InjectionRequest {
    /// Request the given contract with no explicit qualifiers (the implicit
    /// default applies during resolution)
    pub fn new(contract: impl Into<ContractKey>) -> Self {
        Self {
            contract: contract.into(),
            qualifiers: QualifierSet::new(),
            site: None,
            activate_alternatives: false,
        }
    }

    /// Require an additional qualifier
    pub fn with_qualifier(mut self, qualifier: Qualifier) -> Self {
        self.qualifiers.insert(qualifier);
        self
    }

    /// Replace the required qualifier set
    pub fn with_qualifiers(mut self, qualifiers: QualifierSet) -> Self {
        self.qualifiers = qualifiers;
        self
    }

    /// Attach the originating declaration site
    pub fn at(mut self, site: InjectionPoint) -> Self {
        self.site = Some(site);
        self
    }

    /// Explicitly activate alternative candidates for this request
    pub fn activating_alternatives(mut self) -> Self {
        self.activate_alternatives = true;
        self
    }

    /// The requested contract
    pub fn contract(&self) -> &ContractKey {
        &self.contract
    }

    /// The required qualifiers as declared (possibly empty)
    pub fn qualifiers(&self) -> &QualifierSet {
        &self.qualifiers
    }

    /// The originating site, if known
    pub fn site(&self) -> Option<&InjectionPoint> {
        self.site.as_ref()
    }

    /// Whether alternatives are explicitly activated for this request
    pub fn activates_alternatives(&self) -> bool {
        self.activate_alternatives
    }
}

impl fmt::Display for InjectionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.contract, self.qualifiers)?;
        if let Some(site) = &self.site {
            write!(f, " at {site}")?;
        }
        Ok(())
    }
}
