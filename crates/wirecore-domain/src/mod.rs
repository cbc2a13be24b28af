//! Domain layer for wirecore
//!
//! Pure data model for the dependency-injection container core: contract and
//! qualifier identity, candidate descriptors, injection requests, proxy
//! blueprints and the shared error taxonomy. This crate has no behavior
//! beyond value semantics; resolution and proxy synthesis live in the
//! `wirecore-resolver` and `wirecore-proxy` layers.

pub mod blueprint;
pub mod descriptor;
pub mod error;
pub mod qualifier;
pub mod request;
pub mod types;
pub mod value;

pub use blueprint::{
    BackingKind, MethodSignature, Modifiers, ParamType, ProxyBlueprint, ProxyMethod,
};
pub use descriptor::{
    CandidateDescriptor, CandidateDescriptorBuilder, ComponentFactory, CreationContext,
    DescriptorId, DescriptorKind, DisposeFn, DisposerDescriptor, MemberRoles, ProducerMember,
    Scope,
};
pub use error::{CandidateSummary, Error, Result};
pub use qualifier::{DEFAULT_QUALIFIER, Qualifier, QualifierSet, QualifierValue};
pub use request::{InjectionPoint, InjectionPointKind, InjectionRequest};
pub use types::{ContractKey, TypeArg, TypeKey};
pub use value::{Instance, Value, ValueKind};
