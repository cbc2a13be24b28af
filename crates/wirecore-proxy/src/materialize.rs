//! Runtime type materialization
//!
//! Installs synthesized types into a type loader under a collision-free name
//! and hands out invocable proxy instances. Definition is atomic per name;
//! when two threads materialize the same blueprint concurrently, the loser of
//! the define race adopts the winner's type instead of failing. Names that
//! would land in a reserved namespace are rewritten into the custom namespace
//! before definition.

use std::fmt;
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{debug, warn};
use wirecore_domain::{Error, Instance, MethodSignature, ProxyBlueprint, Result, TypeKey, Value};

use crate::chain::{InterceptorChain, Invocation, MethodDispatcher, PassthroughChain};
use crate::marshal;
use crate::synthesize::{GeneratedType, MethodBody, ProxySynthesizer, fingerprint};

/// Upper bound on name-collision retries for a single definition
pub const MAX_DEFINE_RETRIES: u32 = 10_000;

/// Namespaces the loader refuses to define into
pub const RESERVED_NAMESPACES: &[&str] = &["core.", "runtime.", "unsafe."];

/// Prefix substituted for reserved namespaces
pub const CUSTOM_NAMESPACE: &str = "wirecore.custom.";

/// How proxy instances are brought to life
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AllocationStrategy {
    /// Allocate without running any constructor; delegation state is
    /// installed afterwards
    #[default]
    Bypass,
    /// Run the generated constructor; requires a no-argument form
    Constructor,
}

/// A defined runtime type: the generated surface bound to the terminal
/// dispatcher of its backing type
pub struct RuntimeType {
    /// Name the type was defined under (post rewrite, post collision retry)
    pub name: String,
    /// The synthesized surface
    pub generated: GeneratedType,
    dispatcher: Arc<dyn MethodDispatcher>,
}

impl RuntimeType {
    /// The backing type this runtime type proxies
    pub fn backing_type(&self) -> &TypeKey {
        &self.generated.backing_type
    }

    /// Fingerprint of the originating blueprint
    pub fn fingerprint(&self) -> u64 {
        self.generated.fingerprint
    }
}

impl fmt::Debug for RuntimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeType")
            .field("name", &self.name)
            .field("backing_type", &self.generated.backing_type)
            .field("fingerprint", &self.generated.fingerprint)
            .finish_non_exhaustive()
    }
}

/// Holds defined runtime types and the per-backing-type terminal dispatchers.
///
/// Definition is first-writer-wins per name; a second definition under an
/// occupied name is reported back with the occupant so callers can decide
/// whether the occupant is the type they wanted.
#[derive(Default)]
pub struct TypeLoader {
    types: DashMap<String, Arc<RuntimeType>>,
    dispatchers: DashMap<TypeKey, Arc<dyn MethodDispatcher>>,
}

impl TypeLoader {
    /// Create an empty loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the terminal dispatcher for a backing type
    pub fn register_dispatcher(&self, backing: TypeKey, dispatcher: Arc<dyn MethodDispatcher>) {
        self.dispatchers.insert(backing, dispatcher);
    }

    /// Look up the terminal dispatcher for a backing type
    pub fn dispatcher_for(&self, backing: &TypeKey) -> Option<Arc<dyn MethodDispatcher>> {
        self.dispatchers.get(backing).map(|d| Arc::clone(d.value()))
    }

    /// Look up a defined type by name
    pub fn lookup(&self, name: &str) -> Option<Arc<RuntimeType>> {
        self.types.get(name).map(|t| Arc::clone(t.value()))
    }

    /// Number of defined types
    pub fn defined_count(&self) -> usize {
        self.types.len()
    }

    /// Atomically define `ty` under its name.
    ///
    /// Returns the freshly defined type, or the existing occupant as the
    /// error value when the name is already taken.
    fn define(&self, ty: RuntimeType) -> std::result::Result<Arc<RuntimeType>, Arc<RuntimeType>> {
        match self.types.entry(ty.name.clone()) {
            Entry::Occupied(occupied) => Err(Arc::clone(occupied.get())),
            Entry::Vacant(vacant) => {
                let defined = Arc::new(ty);
                vacant.insert(Arc::clone(&defined));
                Ok(defined)
            }
        }
    }
}

impl fmt::Debug for TypeLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeLoader")
            .field("types", &self.types.len())
            .field("dispatchers", &self.dispatchers.len())
            .finish_non_exhaustive()
    }
}

/// An invocable proxy instance over one runtime type.
///
/// Delegation state is write-once: the delegate and the interceptor chain can
/// each be installed a single time after allocation. Invocations before the
/// delegate is installed fail; an absent chain means intercepted methods run
/// straight through to the terminal dispatcher.
pub struct ProxyInstance {
    runtime_type: Arc<RuntimeType>,
    delegate: OnceLock<Instance>,
    chain: OnceLock<Arc<dyn InterceptorChain>>,
}

impl ProxyInstance {
    fn allocated(runtime_type: Arc<RuntimeType>) -> Self {
        Self {
            runtime_type,
            delegate: OnceLock::new(),
            chain: OnceLock::new(),
        }
    }

    /// The runtime type of this instance
    pub fn runtime_type(&self) -> &Arc<RuntimeType> {
        &self.runtime_type
    }

    /// Passivation identifier carried by this proxy, if any
    pub fn passivation_id(&self) -> Option<&str> {
        self.runtime_type.generated.passivation_id.as_deref()
    }

    /// Install the delegate the proxy forwards to
    pub fn set_delegate(&self, delegate: Instance) -> Result<()> {
        self.delegate
            .set(delegate)
            .map_err(|_| Error::instantiation("proxy delegate is already installed"))
    }

    /// Install the interceptor chain wrapped around intercepted methods
    pub fn set_chain(&self, chain: Arc<dyn InterceptorChain>) -> Result<()> {
        self.chain
            .set(chain)
            .map_err(|_| Error::instantiation("proxy interceptor chain is already installed"))
    }

    /// Invoke a business method on this proxy.
    ///
    /// Plain methods go straight to the terminal dispatcher; intercepted
    /// methods travel through the installed chain with boxed arguments, and
    /// the result is unboxed against the declared return slot.
    pub fn invoke(&self, method: &MethodSignature, args: Vec<Value>) -> Result<Value> {
        let Some(generated) = self.runtime_type.generated.method(method) else {
            return Err(Error::proxy_generation(format!(
                "type {} has no method {}",
                self.runtime_type.name, method
            )));
        };
        let Some(delegate) = self.delegate.get() else {
            return Err(Error::instantiation(format!(
                "proxy {} invoked before its delegate was installed",
                self.runtime_type.name
            )));
        };

        let args = marshal::box_args(&generated.signature, args)?;
        let dispatcher = self.runtime_type.dispatcher.as_ref();
        let result = match generated.body {
            MethodBody::Delegate => dispatcher.dispatch(delegate, &generated.signature, args),
            MethodBody::Intercept => {
                let invocation = Invocation::new(generated.signature.clone(), args);
                match self.chain.get() {
                    Some(chain) => chain.invoke(delegate, invocation, dispatcher),
                    None => PassthroughChain.invoke(delegate, invocation, dispatcher),
                }
            }
        }?;
        marshal::unbox_return(&generated.signature.ret, result)
    }
}

impl fmt::Debug for ProxyInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyInstance")
            .field("type", &self.runtime_type.name)
            .field("delegate_installed", &self.delegate.get().is_some())
            .finish_non_exhaustive()
    }
}

/// Synthesizes blueprints and installs the result into a type loader.
///
/// One runtime type is defined per distinct blueprint per loader; repeated
/// materialization of an equal blueprint returns the already-defined type.
pub struct ClassMaterializer {
    loader: Arc<TypeLoader>,
    synthesizer: ProxySynthesizer,
    allocation: AllocationStrategy,
    by_blueprint: DashMap<(TypeKey, u64), Arc<RuntimeType>>,
}

impl ClassMaterializer {
    /// Create a materializer over the given loader
    pub fn new(loader: Arc<TypeLoader>) -> Self {
        Self {
            loader,
            synthesizer: ProxySynthesizer::new(),
            allocation: AllocationStrategy::default(),
            by_blueprint: DashMap::new(),
        }
    }

    /// Override the allocation strategy
    pub fn with_allocation(mut self, allocation: AllocationStrategy) -> Self {
        self.allocation = allocation;
        self
    }

    /// The loader this materializer defines into
    pub fn loader(&self) -> &Arc<TypeLoader> {
        &self.loader
    }

    /// Materialize a blueprint into a defined runtime type.
    ///
    /// Equal blueprints share one runtime type. Name collisions with
    /// unrelated types are retried with a numeric suffix up to
    /// [`MAX_DEFINE_RETRIES`]; a concurrent definition of the same blueprint
    /// under a candidate name is adopted rather than treated as a collision.
    pub fn materialize(&self, blueprint: &ProxyBlueprint) -> Result<Arc<RuntimeType>> {
        let key = (blueprint.backing_type.clone(), fingerprint(blueprint));
        if let Some(existing) = self.by_blueprint.get(&key) {
            return Ok(Arc::clone(existing.value()));
        }

        let defined = match self.by_blueprint.entry(key) {
            Entry::Occupied(occupied) => Arc::clone(occupied.get()),
            Entry::Vacant(vacant) => {
                let defined = self.define_fresh(blueprint)?;
                vacant.insert(Arc::clone(&defined));
                defined
            }
        };
        Ok(defined)
    }

    /// Bring a proxy instance of a materialized type to life.
    ///
    /// The bypass strategy allocates without running any constructor. The
    /// constructor strategy requires the generated no-argument form; a
    /// constructor that takes parameters cannot be invoked here.
    pub fn instantiate(&self, runtime_type: &Arc<RuntimeType>) -> Result<ProxyInstance> {
        match self.allocation {
            AllocationStrategy::Bypass => Ok(ProxyInstance::allocated(Arc::clone(runtime_type))),
            AllocationStrategy::Constructor => {
                let constructor = &runtime_type.generated.constructor;
                if constructor.params.is_empty() {
                    Ok(ProxyInstance::allocated(Arc::clone(runtime_type)))
                } else {
                    Err(Error::instantiation(format!(
                        "constructor of {} takes {} argument(s) and cannot be invoked \
                         without allocation bypass",
                        runtime_type.name,
                        constructor.params.len()
                    )))
                }
            }
        }
    }

    fn define_fresh(&self, blueprint: &ProxyBlueprint) -> Result<Arc<RuntimeType>> {
        let generated = self.synthesizer.synthesize(blueprint)?;
        let Some(dispatcher) = self.loader.dispatcher_for(&generated.backing_type) else {
            return Err(Error::configuration(format!(
                "no dispatcher registered for backing type {}",
                generated.backing_type
            )));
        };

        let base = loadable_name(&generated.name);
        for attempt in 0..MAX_DEFINE_RETRIES {
            let candidate = if attempt == 0 {
                base.clone()
            } else {
                format!("{base}{}", attempt - 1)
            };
            let ty = RuntimeType {
                name: candidate,
                generated: generated.clone(),
                dispatcher: Arc::clone(&dispatcher),
            };
            match self.loader.define(ty) {
                Ok(defined) => {
                    debug!(name = %defined.name, backing_type = %defined.generated.backing_type,
                        attempt, "defined proxy type");
                    return Ok(defined);
                }
                Err(occupant) => {
                    // a concurrent materialization of the same blueprint is a
                    // success in disguise; anything else is a true collision
                    if occupant.backing_type() == &generated.backing_type
                        && occupant.fingerprint() == generated.fingerprint
                    {
                        debug!(name = %occupant.name, "adopted concurrently defined proxy type");
                        return Ok(occupant);
                    }
                    warn!(name = %occupant.name, attempt, "proxy type name collision, retrying");
                }
            }
        }
        Err(Error::configuration(format!(
            "could not find a free name for proxy type {base} after {MAX_DEFINE_RETRIES} attempts"
        )))
    }
}

impl fmt::Debug for ClassMaterializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassMaterializer")
            .field("allocation", &self.allocation)
            .field("materialized", &self.by_blueprint.len())
            .finish_non_exhaustive()
    }
}

/// Rewrite names that fall inside a reserved namespace into the custom
/// namespace; any other name is used as-is.
pub fn loadable_name(name: &str) -> String {
    if RESERVED_NAMESPACES.iter().any(|ns| name.starts_with(ns)) {
        format!("{CUSTOM_NAMESPACE}{name}")
    } else {
        name.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wirecore_domain::{ParamType, ProxyMethod};

    struct EchoDispatcher {
        calls: AtomicUsize,
    }

    impl EchoDispatcher {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl MethodDispatcher for EchoDispatcher {
        fn dispatch(
            &self,
            _target: &Instance,
            _method: &MethodSignature,
            mut args: Vec<Value>,
        ) -> Result<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(args.pop().unwrap_or(Value::Null))
        }
    }

    fn greet_method() -> ProxyMethod {
        ProxyMethod::public(MethodSignature::new(
            "greet",
            vec![ParamType::reference("java.lang.String")],
            ParamType::reference("java.lang.String"),
        ))
    }

    fn loader_with_dispatcher(backing: &str) -> (Arc<TypeLoader>, Arc<EchoDispatcher>) {
        let loader = Arc::new(TypeLoader::new());
        let dispatcher = EchoDispatcher::new();
        loader.register_dispatcher(TypeKey::new(backing), dispatcher.clone());
        (loader, dispatcher)
    }

    fn target() -> Instance {
        Arc::new(()) as Instance
    }

    #[test]
    fn test_equal_blueprints_materialize_once() {
        let (loader, _) = loader_with_dispatcher("demo.Greeter");
        let materializer = ClassMaterializer::new(loader.clone());
        let blueprint = ProxyBlueprint::for_class("demo.Greeter").with_plain(greet_method());
        let first = materializer.materialize(&blueprint).unwrap();
        let second = materializer.materialize(&blueprint).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loader.defined_count(), 1);
    }

    #[test]
    fn test_missing_dispatcher_is_a_configuration_error() {
        let materializer = ClassMaterializer::new(Arc::new(TypeLoader::new()));
        let blueprint = ProxyBlueprint::for_class("demo.Greeter");
        let err = materializer.materialize(&blueprint).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_reserved_namespace_is_rewritten() {
        assert_eq!(
            loadable_name("core.Service$$WcProxy"),
            "wirecore.custom.core.Service$$WcProxy"
        );
        assert_eq!(
            loadable_name("unsafe.Thing$$WcProxy"),
            "wirecore.custom.unsafe.Thing$$WcProxy"
        );
        assert_eq!(loadable_name("demo.Service$$WcProxy"), "demo.Service$$WcProxy");
    }

    #[test]
    fn test_name_collision_retries_with_numeric_suffix() {
        let (loader, dispatcher) = loader_with_dispatcher("demo.Greeter");
        // squat on the base name with an unrelated type
        let squatter = RuntimeType {
            name: "demo.Greeter$$WcProxy".to_owned(),
            generated: ProxySynthesizer::new()
                .synthesize(&ProxyBlueprint::for_class("demo.Other"))
                .unwrap(),
            dispatcher: dispatcher.clone(),
        };
        loader.define(squatter).unwrap();

        let materializer = ClassMaterializer::new(loader.clone());
        let blueprint = ProxyBlueprint::for_class("demo.Greeter").with_plain(greet_method());
        let defined = materializer.materialize(&blueprint).unwrap();
        assert_eq!(defined.name, "demo.Greeter$$WcProxy0");
    }

    #[test]
    fn test_concurrent_same_blueprint_definition_is_adopted() {
        let (loader, _) = loader_with_dispatcher("demo.Greeter");
        let blueprint = ProxyBlueprint::for_class("demo.Greeter").with_plain(greet_method());

        let mut handles = Vec::new();
        for _ in 0..4 {
            let loader = Arc::clone(&loader);
            let blueprint = blueprint.clone();
            handles.push(std::thread::spawn(move || {
                ClassMaterializer::new(loader).materialize(&blueprint).map(|t| t.name.clone())
            }));
        }
        let names: Vec<String> = handles
            .into_iter()
            .map(|h| h.join().unwrap().unwrap())
            .collect();
        assert!(names.iter().all(|n| n == &names[0]));
        assert_eq!(loader.defined_count(), 1);
    }

    #[test]
    fn test_invocation_routes_plain_method_to_dispatcher() {
        let (loader, dispatcher) = loader_with_dispatcher("demo.Greeter");
        let materializer = ClassMaterializer::new(loader);
        let blueprint = ProxyBlueprint::for_class("demo.Greeter").with_plain(greet_method());
        let ty = materializer.materialize(&blueprint).unwrap();
        let proxy = materializer.instantiate(&ty).unwrap();
        proxy.set_delegate(target()).unwrap();

        let result = proxy
            .invoke(&greet_method().signature, vec![Value::from("hello")])
            .unwrap();
        assert_eq!(result, Value::from("hello"));
        assert_eq!(dispatcher.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_invocation_before_delegate_install_fails() {
        let (loader, _) = loader_with_dispatcher("demo.Greeter");
        let materializer = ClassMaterializer::new(loader);
        let blueprint = ProxyBlueprint::for_class("demo.Greeter").with_plain(greet_method());
        let ty = materializer.materialize(&blueprint).unwrap();
        let proxy = materializer.instantiate(&ty).unwrap();

        let err = proxy
            .invoke(&greet_method().signature, vec![Value::from("hello")])
            .unwrap_err();
        assert!(matches!(err, Error::Instantiation { .. }));
    }

    #[test]
    fn test_delegate_is_write_once() {
        let (loader, _) = loader_with_dispatcher("demo.Greeter");
        let materializer = ClassMaterializer::new(loader);
        let ty = materializer
            .materialize(&ProxyBlueprint::for_class("demo.Greeter"))
            .unwrap();
        let proxy = materializer.instantiate(&ty).unwrap();
        proxy.set_delegate(target()).unwrap();
        assert!(proxy.set_delegate(target()).is_err());
    }

    #[test]
    fn test_constructor_strategy_rejects_parameterized_constructor() {
        let (loader, _) = loader_with_dispatcher("demo.Greeter");
        let materializer =
            ClassMaterializer::new(loader).with_allocation(AllocationStrategy::Constructor);
        let blueprint = ProxyBlueprint::for_class("demo.Greeter").with_constructor(
            MethodSignature::new(
                "<init>",
                vec![ParamType::reference("java.lang.String")],
                ParamType::void(),
            ),
        );
        let ty = materializer.materialize(&blueprint).unwrap();
        let err = materializer.instantiate(&ty).unwrap_err();
        assert!(matches!(err, Error::Instantiation { .. }));
    }

    #[test]
    fn test_intercepted_method_passes_through_without_chain() {
        let (loader, dispatcher) = loader_with_dispatcher("demo.Greeter");
        let materializer = ClassMaterializer::new(loader);
        let blueprint = ProxyBlueprint::for_class("demo.Greeter").with_intercepted(greet_method());
        let ty = materializer.materialize(&blueprint).unwrap();
        let proxy = materializer.instantiate(&ty).unwrap();
        proxy.set_delegate(target()).unwrap();

        let result = proxy
            .invoke(&greet_method().signature, vec![Value::from("hi")])
            .unwrap();
        assert_eq!(result, Value::from("hi"));
        assert_eq!(dispatcher.calls.load(Ordering::SeqCst), 1);
    }
}
