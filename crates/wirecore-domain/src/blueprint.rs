//! Proxy blueprints
//!
//! A blueprint is the specification for one generated delegating/intercepting
//! type: the backing type, its proxyable method surface partitioned into
//! intercepted and plain lists, an optional explicit constructor and the
//! passivation identifier of the underlying bean when it is passivation
//! capable.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::TypeKey;
use crate::value::ValueKind;

/// Name of the method that is never proxyable regardless of modifiers
pub const FINALIZER_METHOD: &str = "finalize";

/// One parameter or return slot: its nominal type and boundary kind
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParamType {
    /// Nominal type of the slot
    pub key: TypeKey,
    /// Kind at the proxy boundary
    pub kind: ValueKind,
}

impl ParamType {
    /// A reference-typed slot
    pub fn reference(key: impl Into<TypeKey>) -> Self {
        Self {
            key: key.into(),
            kind: ValueKind::Reference,
        }
    }

    /// An array-typed slot
    pub fn array(element: &TypeKey) -> Self {
        Self {
            key: TypeKey::array_of(element),
            kind: ValueKind::Array,
        }
    }

    /// A primitive slot of the given kind
    pub fn primitive(key: impl Into<TypeKey>, kind: ValueKind) -> Self {
        Self {
            key: key.into(),
            kind,
        }
    }

    /// The void return slot
    pub fn void() -> Self {
        Self {
            key: TypeKey::new("void"),
            kind: ValueKind::Void,
        }
    }
}

/// A method signature: name, parameter types and return type.
///
/// Two methods are the same signature when name, return type and parameter
/// types all match; this is the key used when duplicate methods reachable
/// through more than one supertype are merged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodSignature {
    /// Method name
    pub name: String,
    /// Parameter slots in declaration order
    pub params: Vec<ParamType>,
    /// Return slot
    pub ret: ParamType,
}

impl MethodSignature {
    /// A niladic method returning a reference type
    pub fn nullary(name: impl Into<String>, ret: ParamType) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            ret,
        }
    }

    /// A method with the given parameters and return slot
    pub fn new(name: impl Into<String>, params: Vec<ParamType>, ret: ParamType) -> Self {
        Self {
            name: name.into(),
            params,
            ret,
        }
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", p.key)?;
        }
        write!(f, "): {}", self.ret.key)
    }
}

/// Method modifiers relevant to proxyability
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Modifiers {
    /// Private methods are invisible to the proxy
    pub is_private: bool,
    /// Static methods have no receiver to delegate to
    pub is_static: bool,
    /// Final methods cannot be overridden
    pub is_final: bool,
    /// Native methods have no delegable body
    pub is_native: bool,
    /// Compiler-generated bridge methods are never business methods
    pub is_bridge: bool,
}

/// One proxyable-or-not method of a backing type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProxyMethod {
    /// The method signature
    pub signature: MethodSignature,
    /// Its modifiers
    pub modifiers: Modifiers,
}

impl ProxyMethod {
    /// A plain public instance method
    pub fn public(signature: MethodSignature) -> Self {
        Self {
            signature,
            modifiers: Modifiers::default(),
        }
    }

    /// Whether this method may appear in a blueprint's method lists at all
    pub fn proxyable(&self) -> bool {
        let m = self.modifiers;
        !(m.is_private || m.is_static || m.is_final || m.is_native || m.is_bridge)
            && self.signature.name != FINALIZER_METHOD
    }
}

/// Whether the backing type is a concrete class or a purely abstract contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackingKind {
    /// The generated type extends the backing class
    Class,
    /// The generated type implements the contract plus a marker contract
    Interface,
}

/// The specification for one generated delegating/intercepting type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProxyBlueprint {
    /// Concrete backing type of the target contract
    pub backing_type: TypeKey,
    /// Class or purely abstract contract
    pub backing_kind: BackingKind,
    /// Methods routed through the interceptor chain
    pub intercepted: Vec<ProxyMethod>,
    /// Methods delegated directly with no hook
    pub plain: Vec<ProxyMethod>,
    /// Explicit constructor signature, if the backing type needs one
    pub constructor: Option<MethodSignature>,
    /// Stable passivation identifier when the underlying bean supports
    /// passivation
    pub passivation_id: Option<String>,
}

impl ProxyBlueprint {
    /// Blueprint for a backing class with empty method lists
    pub fn for_class(backing_type: impl Into<TypeKey>) -> Self {
        Self {
            backing_type: backing_type.into(),
            backing_kind: BackingKind::Class,
            intercepted: Vec::new(),
            plain: Vec::new(),
            constructor: None,
            passivation_id: None,
        }
    }

    /// Blueprint for a purely abstract contract with empty method lists
    pub fn for_interface(backing_type: impl Into<TypeKey>) -> Self {
        Self {
            backing_kind: BackingKind::Interface,
            ..Self::for_class(backing_type)
        }
    }

    /// Add an intercepted method
    pub fn with_intercepted(mut self, method: ProxyMethod) -> Self {
        self.intercepted.push(method);
        self
    }

    /// Add a plain delegated method
    pub fn with_plain(mut self, method: ProxyMethod) -> Self {
        self.plain.push(method);
        self
    }

    /// Set the explicit constructor signature
    pub fn with_constructor(mut self, constructor: MethodSignature) -> Self {
        self.constructor = Some(constructor);
        self
    }

    /// Set the passivation identifier
    pub fn with_passivation_id(mut self, id: impl Into<String>) -> Self {
        self.passivation_id = Some(id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(name: &str) -> MethodSignature {
        MethodSignature::nullary(name, ParamType::void())
    }

    #[test]
    fn test_public_instance_method_is_proxyable() {
        assert!(ProxyMethod::public(sig("doWork")).proxyable());
    }

    #[test]
    fn test_finalizer_is_never_proxyable() {
        assert!(!ProxyMethod::public(sig(FINALIZER_METHOD)).proxyable());
    }

    #[test]
    fn test_restricted_modifiers_are_not_proxyable() {
        for set in [
            Modifiers {
                is_private: true,
                ..Modifiers::default()
            },
            Modifiers {
                is_static: true,
                ..Modifiers::default()
            },
            Modifiers {
                is_final: true,
                ..Modifiers::default()
            },
            Modifiers {
                is_native: true,
                ..Modifiers::default()
            },
            Modifiers {
                is_bridge: true,
                ..Modifiers::default()
            },
        ] {
            let method = ProxyMethod {
                signature: sig("doWork"),
                modifiers: set,
            };
            assert!(!method.proxyable());
        }
    }
}
