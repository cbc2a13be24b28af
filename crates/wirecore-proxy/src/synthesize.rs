//! Proxy synthesis
//!
//! Turns a proxy blueprint into a generated type: the method surface is
//! deduplicated by signature (the same method can be reachable through more
//! than one supertype), partitioned into intercepted and plain bodies, and
//! completed with exactly one generated constructor, the passivation-id
//! field and, for purely abstract contracts, a private marker contract.
//! Unproxyable methods in either input list are a contract violation of the
//! caller and fail synthesis outright.

use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use seahash::SeaHasher;
use tracing::debug;
use wirecore_domain::{
    BackingKind, Error, MethodSignature, ParamType, ProxyBlueprint, ProxyMethod, Result, TypeKey,
};

/// Suffix appended to the backing type name for generated proxy types
pub const PROXY_TYPE_SUFFIX: &str = "$$WcProxy";

/// Marker contract implemented by proxies over purely abstract contracts
pub const MARKER_CONTRACT: &str = "wirecore.proxy.GeneratedProxy";

/// Name of the field carrying the passivation id of the bean a proxy serves.
/// Reserved so it can never collide with user-declared members.
pub const PASSIVATION_ID_FIELD: &str = "wcBeanPassivationId";

/// How a generated method body behaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodBody {
    /// Direct forwarding call to the delegate, no hook
    Delegate,
    /// Routed through the interceptor chain with boxed arguments
    Intercept,
}

/// One method of a generated type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedMethod {
    /// The business method signature
    pub signature: MethodSignature,
    /// Delegate directly or intercept
    pub body: MethodBody,
}

/// The synthesized runtime type, before materialization
#[derive(Debug, Clone)]
pub struct GeneratedType {
    /// Proposed name of the generated type
    pub name: String,
    /// Backing type the proxy extends or implements
    pub backing_type: TypeKey,
    /// Class or purely abstract contract
    pub backing_kind: BackingKind,
    /// All generated methods, intercepted first
    pub methods: Vec<GeneratedMethod>,
    /// The single generated constructor (forwards to the superclass and
    /// initializes delegation state)
    pub constructor: MethodSignature,
    /// Marker contract, present for purely abstract backings
    pub marker: Option<&'static str>,
    /// Passivation id stored in the reserved proxy field
    pub passivation_id: Option<String>,
    /// Stable fingerprint of the originating blueprint
    pub fingerprint: u64,
}

impl GeneratedType {
    /// Look up a generated method by signature
    pub fn method(&self, signature: &MethodSignature) -> Option<&GeneratedMethod> {
        self.methods.iter().find(|m| &m.signature == signature)
    }
}

/// Synthesizes generated types from blueprints
#[derive(Debug, Default)]
pub struct ProxySynthesizer;

impl ProxySynthesizer {
    /// Create a synthesizer
    pub fn new() -> Self {
        Self
    }

    /// Synthesize a generated type from the blueprint.
    ///
    /// Exact duplicate signatures within a list are silently merged; a
    /// signature appearing in both lists keeps its intercepted form. The
    /// presence of an unproxyable method in either list is fatal.
    pub fn synthesize(&self, blueprint: &ProxyBlueprint) -> Result<GeneratedType> {
        for method in blueprint.intercepted.iter().chain(blueprint.plain.iter()) {
            if !method.proxyable() {
                return Err(Error::proxy_generation(format!(
                    "method {} of {} is not proxyable and must not appear in a blueprint",
                    method.signature, blueprint.backing_type
                )));
            }
        }

        let mut seen: HashSet<MethodSignature> = HashSet::new();
        let mut methods = Vec::new();

        // intercepted classification wins on duplicates, so it goes first
        for method in dedup_by_signature(&blueprint.intercepted) {
            seen.insert(method.signature.clone());
            methods.push(GeneratedMethod {
                signature: method.signature.clone(),
                body: MethodBody::Intercept,
            });
        }
        for method in dedup_by_signature(&blueprint.plain) {
            if seen.insert(method.signature.clone()) {
                methods.push(GeneratedMethod {
                    signature: method.signature.clone(),
                    body: MethodBody::Delegate,
                });
            }
        }

        let constructor = blueprint
            .constructor
            .clone()
            .unwrap_or_else(|| MethodSignature::new("<init>", Vec::new(), ParamType::void()));

        let generated = GeneratedType {
            name: proxy_type_name(&blueprint.backing_type),
            backing_type: blueprint.backing_type.clone(),
            backing_kind: blueprint.backing_kind,
            methods,
            constructor,
            marker: match blueprint.backing_kind {
                BackingKind::Interface => Some(MARKER_CONTRACT),
                BackingKind::Class => None,
            },
            passivation_id: blueprint.passivation_id.clone(),
            fingerprint: fingerprint(blueprint),
        };

        debug!(
            backing_type = %generated.backing_type,
            methods = generated.methods.len(),
            fingerprint = generated.fingerprint,
            "synthesized proxy type"
        );

        Ok(generated)
    }
}

/// Proposed proxy type name for a backing type
pub fn proxy_type_name(backing: &TypeKey) -> String {
    format!("{}{}", backing.name(), PROXY_TYPE_SUFFIX)
}

/// Stable fingerprint of a blueprint, used as the materialization cache key
pub fn fingerprint(blueprint: &ProxyBlueprint) -> u64 {
    let mut hasher = SeaHasher::new();
    blueprint.hash(&mut hasher);
    hasher.finish()
}

fn dedup_by_signature(methods: &[ProxyMethod]) -> Vec<&ProxyMethod> {
    let mut seen: HashSet<&MethodSignature> = HashSet::new();
    methods
        .iter()
        .filter(|m| seen.insert(&m.signature))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wirecore_domain::Modifiers;

    fn method(name: &str) -> ProxyMethod {
        ProxyMethod::public(MethodSignature::nullary(
            name,
            ParamType::reference("java.lang.String"),
        ))
    }

    #[test]
    fn test_duplicate_within_list_is_merged_silently() {
        let blueprint = ProxyBlueprint::for_class("demo.Service")
            .with_plain(method("doWork"))
            .with_plain(method("doWork"));
        let generated = ProxySynthesizer::new().synthesize(&blueprint).unwrap();
        assert_eq!(generated.methods.len(), 1);
        assert_eq!(generated.methods[0].body, MethodBody::Delegate);
    }

    #[test]
    fn test_duplicate_across_lists_keeps_intercepted_form() {
        let blueprint = ProxyBlueprint::for_class("demo.Service")
            .with_intercepted(method("doWork"))
            .with_plain(method("doWork"));
        let generated = ProxySynthesizer::new().synthesize(&blueprint).unwrap();
        assert_eq!(generated.methods.len(), 1);
        assert_eq!(generated.methods[0].body, MethodBody::Intercept);
    }

    #[test]
    fn test_unproxyable_method_fails_synthesis() {
        let mut bad = method("doWork");
        bad.modifiers = Modifiers {
            is_final: true,
            ..Modifiers::default()
        };
        let blueprint = ProxyBlueprint::for_class("demo.Service").with_plain(bad);
        let err = ProxySynthesizer::new()
            .synthesize(&blueprint)
            .unwrap_err();
        assert!(matches!(err, Error::ProxyGeneration { .. }));
    }

    #[test]
    fn test_interface_backing_gains_marker_contract() {
        let blueprint = ProxyBlueprint::for_interface("demo.Greeter").with_plain(method("greet"));
        let generated = ProxySynthesizer::new().synthesize(&blueprint).unwrap();
        assert_eq!(generated.marker, Some(MARKER_CONTRACT));
    }

    #[test]
    fn test_class_backing_has_no_marker() {
        let blueprint = ProxyBlueprint::for_class("demo.Service").with_plain(method("doWork"));
        let generated = ProxySynthesizer::new().synthesize(&blueprint).unwrap();
        assert_eq!(generated.marker, None);
    }

    #[test]
    fn test_generated_constructor_defaults_to_no_arg_form() {
        let blueprint = ProxyBlueprint::for_class("demo.Service");
        let generated = ProxySynthesizer::new().synthesize(&blueprint).unwrap();
        assert_eq!(generated.constructor.name, "<init>");
        assert!(generated.constructor.params.is_empty());
    }

    #[test]
    fn test_equal_blueprints_share_a_fingerprint() {
        let a = ProxyBlueprint::for_class("demo.Service").with_plain(method("doWork"));
        let b = ProxyBlueprint::for_class("demo.Service").with_plain(method("doWork"));
        let c = ProxyBlueprint::for_class("demo.Service").with_intercepted(method("doWork"));
        assert_eq!(fingerprint(&a), fingerprint(&b));
        assert_ne!(fingerprint(&a), fingerprint(&c));
    }

    #[test]
    fn test_passivation_id_is_carried_through() {
        let blueprint = ProxyBlueprint::for_class("demo.Service").with_passivation_id("svc-1");
        let generated = ProxySynthesizer::new().synthesize(&blueprint).unwrap();
        assert_eq!(generated.passivation_id.as_deref(), Some("svc-1"));
    }
}
