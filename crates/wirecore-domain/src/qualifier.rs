//! Qualifiers and qualifier sets
//!
//! A qualifier is a named disambiguating marker attached to both declaration
//! sites and injection requests. Members explicitly marked nonbinding are
//! ignored when two qualifier instances are compared during resolution.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Name of the implicit qualifier assumed when a site declares none
pub const DEFAULT_QUALIFIER: &str = "Default";

/// A qualifier member value.
///
/// Restricted to totally ordered, hashable kinds so qualifier equality and
/// hashing stay consistent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualifierValue {
    /// Boolean member
    Bool(bool),
    /// Integer member
    Int(i64),
    /// String member
    Str(String),
}

impl From<bool> for QualifierValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for QualifierValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for QualifierValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

/// One named member of a qualifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualifierMember {
    /// Member name
    pub name: String,
    /// Member value
    pub value: QualifierValue,
    /// Nonbinding members do not participate in qualifier comparison
    pub nonbinding: bool,
}

/// A named disambiguating marker, optionally carrying member values.
///
/// Equality and hashing consider the qualifier name and its *binding*
/// members only: two instances differing solely in nonbinding members are
/// the same qualifier for resolution purposes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Qualifier {
    name: String,
    // kept sorted by member name so comparison and hashing are order-free
    members: Vec<QualifierMember>,
}

impl Qualifier {
    /// Create a qualifier with no members
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    /// The implicit qualifier assumed when a site declares none
    pub fn default_qualifier() -> Self {
        Self::new(DEFAULT_QUALIFIER)
    }

    /// Add a binding member
    pub fn with_member(self, name: impl Into<String>, value: impl Into<QualifierValue>) -> Self {
        self.push_member(name.into(), value.into(), false)
    }

    /// Add a nonbinding member (ignored during comparison)
    pub fn with_nonbinding_member(
        self,
        name: impl Into<String>,
        value: impl Into<QualifierValue>,
    ) -> Self {
        self.push_member(name.into(), value.into(), true)
    }

    fn push_member(mut self, name: String, value: QualifierValue, nonbinding: bool) -> Self {
        match self.members.binary_search_by(|m| m.name.cmp(&name)) {
            Ok(pos) => {
                self.members[pos] = QualifierMember {
                    name,
                    value,
                    nonbinding,
                };
            }
            Err(pos) => self.members.insert(
                pos,
                QualifierMember {
                    name,
                    value,
                    nonbinding,
                },
            ),
        }
        self
    }

    /// Qualifier name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All members, binding and nonbinding
    pub fn members(&self) -> &[QualifierMember] {
        &self.members
    }

    /// Whether this is the implicit default qualifier
    pub fn is_default(&self) -> bool {
        self.name == DEFAULT_QUALIFIER
    }

    fn binding_members(&self) -> impl Iterator<Item = &QualifierMember> {
        self.members.iter().filter(|m| !m.nonbinding)
    }
}

impl PartialEq for Qualifier {
    fn eq(&self, other: &Self) -> bool {
        if self.name != other.name {
            return false;
        }
        let mut mine = self.binding_members();
        let mut theirs = other.binding_members();
        loop {
            match (mine.next(), theirs.next()) {
                (None, None) => return true,
                (Some(a), Some(b)) if a.name == b.name && a.value == b.value => {}
                _ => return false,
            }
        }
    }
}

impl Eq for Qualifier {}

impl Hash for Qualifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        for member in self.binding_members() {
            member.name.hash(state);
            member.value.hash(state);
        }
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name)
    }
}

/// A set of qualifiers, deduplicated by name and kept sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QualifierSet {
    items: Vec<Qualifier>,
}

impl QualifierSet {
    /// The empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from the given qualifiers
    pub fn of(qualifiers: impl IntoIterator<Item = Qualifier>) -> Self {
        let mut set = Self::new();
        for q in qualifiers {
            set.insert(q);
        }
        set
    }

    /// Insert a qualifier, replacing any existing one of the same name
    pub fn insert(&mut self, qualifier: Qualifier) {
        match self
            .items
            .binary_search_by(|q| q.name().cmp(qualifier.name()))
        {
            Ok(pos) => self.items[pos] = qualifier,
            Err(pos) => self.items.insert(pos, qualifier),
        }
    }

    /// Number of qualifiers in the set
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate the qualifiers in name order
    pub fn iter(&self) -> impl Iterator<Item = &Qualifier> {
        self.items.iter()
    }

    /// Whether the set contains a qualifier equal to `wanted`
    /// (nonbinding members ignored)
    pub fn contains(&self, wanted: &Qualifier) -> bool {
        self.items.iter().any(|q| q == wanted)
    }

    /// Superset check used by resolution: every required qualifier must be
    /// present among the declared ones.
    pub fn satisfies(&self, required: &QualifierSet) -> bool {
        required.iter().all(|q| self.contains(q))
    }

    /// The set with the implicit default applied: an empty set becomes
    /// `{Default}`, a non-empty set is unchanged.
    pub fn normalized(&self) -> QualifierSet {
        if self.items.is_empty() {
            QualifierSet::of([Qualifier::default_qualifier()])
        } else {
            self.clone()
        }
    }
}

impl FromIterator<Qualifier> for QualifierSet {
    fn from_iter<T: IntoIterator<Item = Qualifier>>(iter: T) -> Self {
        Self::of(iter)
    }
}

impl fmt::Display for QualifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, q) in self.items.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{q}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonbinding_members_are_ignored_in_equality() {
        let a = Qualifier::new("Timed")
            .with_member("unit", "seconds")
            .with_nonbinding_member("comment", "first");
        let b = Qualifier::new("Timed")
            .with_member("unit", "seconds")
            .with_nonbinding_member("comment", "second");
        assert_eq!(a, b);
    }

    #[test]
    fn test_binding_members_discriminate() {
        let a = Qualifier::new("Timed").with_member("unit", "seconds");
        let b = Qualifier::new("Timed").with_member("unit", "millis");
        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_set_normalizes_to_default() {
        let set = QualifierSet::new();
        let normalized = set.normalized();
        assert_eq!(normalized.len(), 1);
        assert!(normalized.contains(&Qualifier::default_qualifier()));
    }

    #[test]
    fn test_non_empty_set_does_not_gain_default() {
        let set = QualifierSet::of([Qualifier::new("Formal")]);
        let normalized = set.normalized();
        assert_eq!(normalized.len(), 1);
        assert!(!normalized.contains(&Qualifier::default_qualifier()));
    }

    #[test]
    fn test_satisfies_is_a_superset_check() {
        let declared = QualifierSet::of([Qualifier::new("Formal"), Qualifier::new("Loud")]);
        let required = QualifierSet::of([Qualifier::new("Formal")]);
        assert!(declared.satisfies(&required));
        assert!(!required.satisfies(&declared));
    }

    #[test]
    fn test_insert_deduplicates_by_name() {
        let mut set = QualifierSet::new();
        set.insert(Qualifier::new("Formal"));
        set.insert(Qualifier::new("Formal"));
        assert_eq!(set.len(), 1);
    }
}
