//! Container bootstrap and lifecycle
//!
//! Wires the candidate registry, the resolution engine and the proxy
//! materializer into one facade. Deployment is two-phase: descriptors and
//! disposers are registered (or discovered from linked candidate sources)
//! into a builder, then `deploy` validates the whole set, links disposers to
//! their producers and freezes the container.

use std::sync::Arc;

use tracing::{debug, info};
use wirecore_domain::{
    CandidateDescriptor, CreationContext, DescriptorId, DisposerDescriptor, InjectionRequest,
    Instance, ProxyBlueprint, Result, TypeKey,
};
use wirecore_proxy::{ClassMaterializer, MethodDispatcher, ProxyInstance, RuntimeType, TypeLoader};
use wirecore_resolver::{Registry, RegistryBuilder, ResolutionEngine, apply_candidate_sources};

use crate::config::ContainerConfig;

/// Deployment-phase builder for a [`Container`]
pub struct ContainerBuilder {
    config: ContainerConfig,
    registry: RegistryBuilder,
    loader: Arc<TypeLoader>,
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerBuilder {
    /// Start a deployment with default configuration
    pub fn new() -> Self {
        Self::with_config(ContainerConfig::default())
    }

    /// Start a deployment with the given configuration
    pub fn with_config(config: ContainerConfig) -> Self {
        Self {
            config,
            registry: RegistryBuilder::new(),
            loader: Arc::new(TypeLoader::new()),
        }
    }

    /// Register a candidate descriptor
    pub fn register(&mut self, descriptor: CandidateDescriptor) -> &mut Self {
        self.registry.register(descriptor);
        self
    }

    /// Register a disposer method
    pub fn register_disposer(&mut self, disposer: DisposerDescriptor) -> &mut Self {
        self.registry.register_disposer(disposer);
        self
    }

    /// Register the terminal dispatcher for a backing type
    pub fn register_dispatcher(
        &mut self,
        backing: TypeKey,
        dispatcher: Arc<dyn MethodDispatcher>,
    ) -> &mut Self {
        self.loader.register_dispatcher(backing, dispatcher);
        self
    }

    /// Apply every compile-time linked candidate source to this deployment
    pub fn discover(&mut self) -> Result<&mut Self> {
        apply_candidate_sources(&mut self.registry)?;
        Ok(self)
    }

    /// Validate the deployment and freeze the container.
    ///
    /// All deployment-time problems are aggregated into a single error; a
    /// container is only handed out for a fully valid deployment.
    pub fn deploy(self) -> Result<Container> {
        let allocation = self.config.proxy.allocation_strategy()?;
        let registry = Arc::new(self.registry.build()?);
        let engine = ResolutionEngine::new(Arc::clone(&registry));
        let materializer = ClassMaterializer::new(self.loader).with_allocation(allocation);

        info!(descriptors = registry.len(), "container deployed");
        Ok(Container {
            config: self.config,
            registry,
            engine,
            materializer,
        })
    }
}

/// A created instance together with the descriptor that produced it.
///
/// Handles are consumed by [`Container::destroy`]; an instance is released
/// exactly once, either through its linked disposer or through its factory.
#[derive(Debug)]
pub struct ComponentHandle {
    descriptor: Arc<CandidateDescriptor>,
    instance: Instance,
}

impl ComponentHandle {
    /// The descriptor that produced this instance
    pub fn descriptor(&self) -> &Arc<CandidateDescriptor> {
        &self.descriptor
    }

    /// Identity of the producing descriptor
    pub fn descriptor_id(&self) -> DescriptorId {
        self.descriptor.id()
    }

    /// The instance itself
    pub fn instance(&self) -> &Instance {
        &self.instance
    }
}

/// The deployed container facade: resolution, instance lifecycle and proxy
/// materialization over one frozen registry.
pub struct Container {
    config: ContainerConfig,
    registry: Arc<Registry>,
    engine: ResolutionEngine,
    materializer: ClassMaterializer,
}

impl Container {
    /// Start building a container
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    /// The active configuration
    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// The frozen candidate registry
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// The proxy materializer of this container
    pub fn materializer(&self) -> &ClassMaterializer {
        &self.materializer
    }

    /// Resolve exactly one winning descriptor for the request.
    ///
    /// When the configuration activates alternatives globally, every request
    /// submitted through the facade resolves with alternatives active.
    pub fn resolve(&self, request: &InjectionRequest) -> Result<Arc<CandidateDescriptor>> {
        let request = self.effective_request(request);
        self.engine.resolve(&request)
    }

    /// Resolve and create one instance for the request
    pub fn create(&self, request: &InjectionRequest) -> Result<ComponentHandle> {
        let descriptor = self.resolve(request)?;
        let ctx = CreationContext::default();
        let instance = descriptor.factory().create(&ctx)?;
        debug!(backing_type = %descriptor.backing_type(), "created instance");
        Ok(ComponentHandle {
            descriptor,
            instance,
        })
    }

    /// Release an instance.
    ///
    /// A producer-backed instance with a linked disposer is routed to that
    /// disposer; everything else goes back through its factory. Consuming
    /// the handle guarantees the release runs at most once per instance.
    pub fn destroy(&self, handle: ComponentHandle) -> Result<()> {
        let ComponentHandle {
            descriptor,
            instance,
        } = handle;
        if let Some(disposer) = self.registry.disposer_for(descriptor.id()) {
            debug!(
                backing_type = %descriptor.backing_type(),
                disposer = disposer.method(),
                "routing instance to linked disposer"
            );
            return disposer.dispose(instance);
        }
        let ctx = CreationContext::default();
        descriptor.factory().destroy(instance, &ctx)
    }

    /// Materialize a proxy blueprint into a runtime type
    pub fn materialize(&self, blueprint: &ProxyBlueprint) -> Result<Arc<RuntimeType>> {
        self.materializer.materialize(blueprint)
    }

    /// Materialize a blueprint and bring one proxy instance to life with the
    /// given delegate installed
    pub fn proxy(&self, blueprint: &ProxyBlueprint, delegate: Instance) -> Result<ProxyInstance> {
        let runtime_type = self.materializer.materialize(blueprint)?;
        let proxy = self.materializer.instantiate(&runtime_type)?;
        proxy.set_delegate(delegate)?;
        Ok(proxy)
    }

    fn effective_request(&self, request: &InjectionRequest) -> InjectionRequest {
        if self.config.resolution.activate_alternatives && !request.activates_alternatives() {
            request.clone().activating_alternatives()
        } else {
            request.clone()
        }
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("registry", &self.registry)
            .field("materializer", &self.materializer)
            .finish_non_exhaustive()
    }
}
