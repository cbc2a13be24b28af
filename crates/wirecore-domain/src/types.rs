//! Contract and type identity
//!
//! Components declare the contracts they satisfy as nominal types, possibly
//! parameterized. The container never sees language-level types directly;
//! metadata discovery hands it fully-qualified names, and resolution works on
//! these keys alone.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a raw (unparameterized) type known to the container.
///
/// Array types are first-class: they keep their element type in the name
/// (`demo.Greeter[]`) so a producer returning an array does not collapse to
/// the implicit top contract.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeKey(String);

impl TypeKey {
    /// Create a type key from a fully-qualified name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Create the array type of the given element type
    pub fn array_of(element: &TypeKey) -> Self {
        Self(format!("{}[]", element.0))
    }

    /// The fully-qualified name
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Whether this key names an array type
    pub fn is_array(&self) -> bool {
        self.0.ends_with("[]")
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TypeKey {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// One type argument of a parameterized contract
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeArg {
    /// A fully-resolved argument
    Concrete(ContractKey),
    /// An unresolved wildcard (`?`)
    Wildcard,
    /// An unresolved type variable, kept by name for diagnostics
    Variable(String),
}

/// A contract a component claims to satisfy: a raw type plus its arguments.
///
/// Requests carrying a wildcard or type variable anywhere are rejected by the
/// resolution engine before any candidate is considered; declaration sites
/// may carry them (a declared wildcard argument accepts any requested
/// argument).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContractKey {
    raw: TypeKey,
    args: Vec<TypeArg>,
}

impl ContractKey {
    /// An unparameterized contract
    pub fn raw(raw: impl Into<TypeKey>) -> Self {
        Self {
            raw: raw.into(),
            args: Vec::new(),
        }
    }

    /// A parameterized contract
    pub fn parameterized(raw: impl Into<TypeKey>, args: Vec<TypeArg>) -> Self {
        Self {
            raw: raw.into(),
            args,
        }
    }

    /// The raw type key
    pub fn raw_type(&self) -> &TypeKey {
        &self.raw
    }

    /// The type arguments
    pub fn args(&self) -> &[TypeArg] {
        &self.args
    }

    /// Whether no wildcard or type variable appears anywhere in this contract
    pub fn is_concrete(&self) -> bool {
        self.args.iter().all(|arg| match arg {
            TypeArg::Concrete(inner) => inner.is_concrete(),
            TypeArg::Wildcard | TypeArg::Variable(_) => false,
        })
    }

    /// Whether a declaration of `self` satisfies a request for `requested`.
    ///
    /// Raw types must match exactly; the declared side may be looser than the
    /// requested side (a declared wildcard or variable argument accepts any
    /// requested argument). A raw request matches any parameterization of the
    /// same raw type.
    pub fn is_assignable_to(&self, requested: &ContractKey) -> bool {
        if self.raw != requested.raw {
            return false;
        }
        if requested.args.is_empty() {
            return true;
        }
        if self.args.len() != requested.args.len() {
            return false;
        }
        self.args
            .iter()
            .zip(requested.args.iter())
            .all(|(declared, wanted)| match (declared, wanted) {
                (TypeArg::Wildcard | TypeArg::Variable(_), _) => true,
                (TypeArg::Concrete(d), TypeArg::Concrete(w)) => d.is_assignable_to(w),
                (TypeArg::Concrete(_), _) => false,
            })
    }
}

impl fmt::Display for ContractKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)?;
        if !self.args.is_empty() {
            write!(f, "<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                match arg {
                    TypeArg::Concrete(c) => write!(f, "{c}")?,
                    TypeArg::Wildcard => write!(f, "?")?,
                    TypeArg::Variable(name) => write!(f, "{name}")?,
                }
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}

impl From<&str> for ContractKey {
    fn from(name: &str) -> Self {
        Self::raw(name)
    }
}

impl From<String> for ContractKey {
    fn from(name: String) -> Self {
        Self::raw(name)
    }
}

impl From<&TypeKey> for ContractKey {
    fn from(key: &TypeKey) -> Self {
        Self::raw(key.clone())
    }
}
