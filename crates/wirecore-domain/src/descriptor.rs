//! Candidate descriptors
//!
//! A candidate descriptor is the metadata record for one injectable
//! component: its contract closure, qualifiers, scope, enablement and a
//! factory capability. Descriptors are produced by an external metadata
//! discovery collaborator and are immutable once registered.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::qualifier::{Qualifier, QualifierSet};
use crate::types::{ContractKey, TypeKey};
use crate::value::Instance;

/// Unique identity of a registered descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DescriptorId(Uuid);

impl DescriptorId {
    /// Mint a fresh descriptor id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DescriptorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DescriptorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A lifecycle scope marker. Opaque to the resolution core except for the
/// `normal` flag: normal scopes are client-proxied, which is what makes
/// self-injection legal for them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    name: String,
    normal: bool,
}

impl Scope {
    /// Create a scope marker
    pub fn new(name: impl Into<String>, normal: bool) -> Self {
        Self {
            name: name.into(),
            normal,
        }
    }

    /// The dependent pseudo-scope
    pub fn dependent() -> Self {
        Self::new("Dependent", false)
    }

    /// The application-wide normal scope
    pub fn application() -> Self {
        Self::new("ApplicationScoped", true)
    }

    /// The per-request normal scope
    pub fn request() -> Self {
        Self::new("RequestScoped", true)
    }

    /// Scope name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this is a normal (proxied) scope
    pub fn is_normal(&self) -> bool {
        self.normal
    }
}

/// Context passed to factory create/destroy calls
#[derive(Debug, Clone, Default)]
pub struct CreationContext {
    /// Descriptor on whose behalf the instance is being built, if any
    pub requestor: Option<DescriptorId>,
}

/// The create/destroy capability backing a descriptor.
///
/// The container's object-creation path calls `create` whenever an injection
/// point requests the contract; `destroy` releases an instance when its scope
/// ends (producer-backed descriptors route destruction through their linked
/// disposer instead).
pub trait ComponentFactory: Send + Sync {
    /// Construct a new instance
    fn create(&self, ctx: &CreationContext) -> Result<Instance>;

    /// Release an instance
    fn destroy(&self, instance: Instance, ctx: &CreationContext) -> Result<()> {
        let _ = (instance, ctx);
        Ok(())
    }
}

/// Reference to the producer member backing a producer descriptor
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProducerMember {
    /// A producer method, by name
    Method(String),
    /// A producer field, by name
    Field(String),
}

/// What kind of component a descriptor describes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DescriptorKind {
    /// An ordinary managed component
    Managed,
    /// A producer method or field
    Producer {
        /// Type declaring the producer member
        declaring_type: TypeKey,
        /// The producer member itself
        member: ProducerMember,
    },
}

/// Metadata record for one injectable component
#[derive(Clone)]
pub struct CandidateDescriptor {
    id: DescriptorId,
    backing_type: TypeKey,
    contracts: Vec<ContractKey>,
    qualifiers: QualifierSet,
    scope: Scope,
    enabled: bool,
    alternative: bool,
    specializes: Option<TypeKey>,
    kind: DescriptorKind,
    passivation_id: Option<String>,
    factory: Arc<dyn ComponentFactory>,
}

impl CandidateDescriptor {
    /// Start building a descriptor for the given backing type
    pub fn builder(backing_type: impl Into<TypeKey>) -> CandidateDescriptorBuilder {
        CandidateDescriptorBuilder::new(backing_type)
    }

    /// Descriptor identity
    pub fn id(&self) -> DescriptorId {
        self.id
    }

    /// Backing type of the component
    pub fn backing_type(&self) -> &TypeKey {
        &self.backing_type
    }

    /// The contract closure
    pub fn contracts(&self) -> &[ContractKey] {
        &self.contracts
    }

    /// Declared qualifiers (normalized: never empty)
    pub fn qualifiers(&self) -> &QualifierSet {
        &self.qualifiers
    }

    /// Lifecycle scope
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Whether the descriptor participates in resolution unconditionally
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Whether the descriptor is an alternative
    pub fn alternative(&self) -> bool {
        self.alternative
    }

    /// Backing type of the descriptor this one specializes, if any
    pub fn specializes(&self) -> Option<&TypeKey> {
        self.specializes.as_ref()
    }

    /// Managed component or producer
    pub fn kind(&self) -> &DescriptorKind {
        &self.kind
    }

    /// Whether this descriptor is backed by a producer member
    pub fn is_producer(&self) -> bool {
        matches!(self.kind, DescriptorKind::Producer { .. })
    }

    /// Stable passivation identifier, when passivation capable
    pub fn passivation_id(&self) -> Option<&str> {
        self.passivation_id.as_deref()
    }

    /// The factory capability
    pub fn factory(&self) -> &Arc<dyn ComponentFactory> {
        &self.factory
    }

    /// Whether this descriptor satisfies the given contract and qualifiers
    pub fn matches(&self, contract: &ContractKey, required: &QualifierSet) -> bool {
        self.contracts.iter().any(|c| c.is_assignable_to(contract))
            && self.qualifiers.satisfies(required)
    }
}

impl fmt::Debug for CandidateDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CandidateDescriptor")
            .field("id", &self.id)
            .field("backing_type", &self.backing_type)
            .field("contracts", &self.contracts)
            .field("qualifiers", &self.qualifiers)
            .field("scope", &self.scope)
            .field("enabled", &self.enabled)
            .field("alternative", &self.alternative)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Builder for [`CandidateDescriptor`]
pub struct CandidateDescriptorBuilder {
    backing_type: TypeKey,
    contracts: Vec<ContractKey>,
    qualifiers: QualifierSet,
    scope: Scope,
    enabled: bool,
    alternative: bool,
    specializes: Option<TypeKey>,
    kind: DescriptorKind,
    passivation_id: Option<String>,
}

impl CandidateDescriptorBuilder {
    fn new(backing_type: impl Into<TypeKey>) -> Self {
        Self {
            backing_type: backing_type.into(),
            contracts: Vec::new(),
            qualifiers: QualifierSet::new(),
            scope: Scope::dependent(),
            enabled: true,
            alternative: false,
            specializes: None,
            kind: DescriptorKind::Managed,
            passivation_id: None,
        }
    }

    /// Declare an additional contract
    pub fn with_contract(mut self, contract: impl Into<ContractKey>) -> Self {
        self.contracts.push(contract.into());
        self
    }

    /// Declare a qualifier
    pub fn with_qualifier(mut self, qualifier: Qualifier) -> Self {
        self.qualifiers.insert(qualifier);
        self
    }

    /// Set the scope
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Mark the descriptor disabled
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Mark the descriptor as an alternative (excluded unless a request
    /// explicitly activates alternatives)
    pub fn as_alternative(mut self) -> Self {
        self.alternative = true;
        self.enabled = false;
        self
    }

    /// Declare that this descriptor specializes the one backed by `target`
    pub fn specializing(mut self, target: impl Into<TypeKey>) -> Self {
        self.specializes = Some(target.into());
        self
    }

    /// Mark this descriptor as backed by a producer method
    pub fn as_producer_method(
        mut self,
        declaring_type: impl Into<TypeKey>,
        method: impl Into<String>,
    ) -> Self {
        self.kind = DescriptorKind::Producer {
            declaring_type: declaring_type.into(),
            member: ProducerMember::Method(method.into()),
        };
        self
    }

    /// Mark this descriptor as backed by a producer field
    pub fn as_producer_field(
        mut self,
        declaring_type: impl Into<TypeKey>,
        field: impl Into<String>,
    ) -> Self {
        self.kind = DescriptorKind::Producer {
            declaring_type: declaring_type.into(),
            member: ProducerMember::Field(field.into()),
        };
        self
    }

    /// Set the passivation identifier
    pub fn with_passivation_id(mut self, id: impl Into<String>) -> Self {
        self.passivation_id = Some(id.into());
        self
    }

    /// Finish the descriptor with its factory capability.
    ///
    /// The backing type itself always joins the contract closure, and an
    /// empty qualifier declaration gains the implicit default.
    pub fn build(self, factory: Arc<dyn ComponentFactory>) -> Result<CandidateDescriptor> {
        let mut contracts = self.contracts;
        let backing_contract = ContractKey::raw(self.backing_type.clone());
        if !contracts.contains(&backing_contract) {
            contracts.push(backing_contract);
        }
        if self.specializes.as_ref() == Some(&self.backing_type) {
            return Err(Error::configuration(format!(
                "descriptor for {} cannot specialize itself",
                self.backing_type
            )));
        }
        Ok(CandidateDescriptor {
            id: DescriptorId::new(),
            backing_type: self.backing_type,
            contracts,
            qualifiers: self.qualifiers.normalized(),
            scope: self.scope,
            enabled: self.enabled,
            alternative: self.alternative,
            specializes: self.specializes,
            kind: self.kind,
            passivation_id: self.passivation_id,
            factory,
        })
    }
}

/// Mutually exclusive member roles a disposer method must not also carry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemberRoles {
    /// The method is an injection initializer
    pub initializer: bool,
    /// The method observes events
    pub observer: bool,
    /// The method is itself a producer
    pub producer: bool,
}

impl MemberRoles {
    /// Names of the roles that are set, for diagnostics
    pub fn conflicting(&self) -> Vec<&'static str> {
        let mut roles = Vec::new();
        if self.initializer {
            roles.push("initializer");
        }
        if self.observer {
            roles.push("observer");
        }
        if self.producer {
            roles.push("producer");
        }
        roles
    }
}

/// Callback releasing a produced instance
pub type DisposeFn = Arc<dyn Fn(Instance) -> Result<()> + Send + Sync>;

/// A disposer method found during scanning, before it is linked to its
/// producer.
#[derive(Clone)]
pub struct DisposerDescriptor {
    declaring_type: TypeKey,
    method: String,
    disposed_contract: ContractKey,
    disposed_qualifiers: QualifierSet,
    roles: MemberRoles,
    callback: DisposeFn,
}

impl DisposerDescriptor {
    /// Create a disposer for the given disposed-value parameter
    pub fn new(
        declaring_type: impl Into<TypeKey>,
        method: impl Into<String>,
        disposed_contract: impl Into<ContractKey>,
        callback: DisposeFn,
    ) -> Self {
        Self {
            declaring_type: declaring_type.into(),
            method: method.into(),
            disposed_contract: disposed_contract.into(),
            disposed_qualifiers: QualifierSet::new(),
            roles: MemberRoles::default(),
            callback,
        }
    }

    /// Add a qualifier on the disposed-value parameter
    pub fn with_qualifier(mut self, qualifier: Qualifier) -> Self {
        self.disposed_qualifiers.insert(qualifier);
        self
    }

    /// Record the other roles the method carries (validated at link time)
    pub fn with_roles(mut self, roles: MemberRoles) -> Self {
        self.roles = roles;
        self
    }

    /// Type declaring the disposer method
    pub fn declaring_type(&self) -> &TypeKey {
        &self.declaring_type
    }

    /// Disposer method name
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Contract of the disposed-value parameter
    pub fn disposed_contract(&self) -> &ContractKey {
        &self.disposed_contract
    }

    /// Qualifiers of the disposed-value parameter
    pub fn disposed_qualifiers(&self) -> &QualifierSet {
        &self.disposed_qualifiers
    }

    /// Other roles the method carries
    pub fn roles(&self) -> MemberRoles {
        self.roles
    }

    /// Invoke the disposer on a produced instance
    pub fn dispose(&self, instance: Instance) -> Result<()> {
        (self.callback)(instance)
    }
}

impl fmt::Debug for DisposerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisposerDescriptor")
            .field("declaring_type", &self.declaring_type)
            .field("method", &self.method)
            .field("disposed_contract", &self.disposed_contract)
            .field("disposed_qualifiers", &self.disposed_qualifiers)
            .finish_non_exhaustive()
    }
}
