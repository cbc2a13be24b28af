//! End-to-end container tests: deployment, resolution, producer/disposer
//! lifecycle and interception proxies through the public facade.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use wirecore::config::ConfigLoader;
use wirecore::domain::{
    CandidateDescriptor, ComponentFactory, CreationContext, DisposeFn, DisposerDescriptor, Error,
    InjectionRequest, Instance, MethodSignature, ParamType, ProxyBlueprint, ProxyMethod,
    Qualifier, Result, TypeKey, Value,
};
use wirecore::proxy::{InterceptorChain, Invocation, MethodDispatcher};
use wirecore::{Container, ContainerConfig};

#[derive(Default)]
struct CountingFactory {
    created: AtomicUsize,
    destroyed: AtomicUsize,
}

impl ComponentFactory for CountingFactory {
    fn create(&self, _ctx: &CreationContext) -> Result<Instance> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new("instance".to_string()))
    }

    fn destroy(&self, _instance: Instance, _ctx: &CreationContext) -> Result<()> {
        self.destroyed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn greeter_descriptor(factory: Arc<CountingFactory>) -> CandidateDescriptor {
    CandidateDescriptor::builder("demo.ConsoleGreeter")
        .with_contract("demo.Greeter")
        .build(factory)
        .unwrap()
}

#[test]
fn test_deploy_resolve_create_destroy_through_factory() {
    let factory = Arc::new(CountingFactory::default());
    let mut builder = Container::builder();
    builder.register(greeter_descriptor(factory.clone()));
    let container = builder.deploy().unwrap();

    let request = InjectionRequest::new("demo.Greeter");
    let handle = container.create(&request).unwrap();
    assert_eq!(handle.descriptor().backing_type().name(), "demo.ConsoleGreeter");
    assert_eq!(factory.created.load(Ordering::SeqCst), 1);

    container.destroy(handle).unwrap();
    assert_eq!(factory.destroyed.load(Ordering::SeqCst), 1);
}

#[test]
fn test_unsatisfied_request_reports_contract() {
    let container = Container::builder().deploy().unwrap();
    let err = container
        .resolve(&InjectionRequest::new("demo.Greeter"))
        .unwrap_err();
    assert!(err.is_unsatisfied());
    assert!(err.to_string().contains("demo.Greeter"));
}

#[test]
fn test_produced_instance_routes_to_linked_disposer_not_factory() {
    let factory = Arc::new(CountingFactory::default());
    let disposed = Arc::new(AtomicUsize::new(0));

    let producer = CandidateDescriptor::builder("demo.ConnectionFactory.open")
        .with_contract("demo.Connection")
        .as_producer_method("demo.ConnectionFactory", "open")
        .build(factory.clone())
        .unwrap();

    let counter = disposed.clone();
    let callback: DisposeFn = Arc::new(move |_instance| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    let disposer = DisposerDescriptor::new(
        "demo.ConnectionFactory",
        "close",
        "demo.Connection",
        callback,
    );

    let mut builder = Container::builder();
    builder.register(producer);
    builder.register_disposer(disposer);
    let container = builder.deploy().unwrap();

    let handle = container
        .create(&InjectionRequest::new("demo.Connection"))
        .unwrap();
    container.destroy(handle).unwrap();

    // released exactly once, through the disposer only
    assert_eq!(disposed.load(Ordering::SeqCst), 1);
    assert_eq!(factory.destroyed.load(Ordering::SeqCst), 0);
}

#[test]
fn test_disposer_without_matching_producer_rejects_deployment() {
    let callback: DisposeFn = Arc::new(|_| Ok(()));
    let mut builder = Container::builder();
    builder.register_disposer(DisposerDescriptor::new(
        "demo.ConnectionFactory",
        "close",
        "demo.Connection",
        callback,
    ));
    let err = builder.deploy().unwrap_err();
    assert!(matches!(err, Error::Deployment { .. }));
}

#[test]
fn test_deployment_aggregates_independent_problems() {
    let callback: DisposeFn = Arc::new(|_| Ok(()));
    let mut builder = Container::builder();
    // two unrelated broken pairings; neither may hide the other
    builder.register_disposer(DisposerDescriptor::new(
        "demo.ConnectionFactory",
        "close",
        "demo.Connection",
        callback.clone(),
    ));
    builder.register_disposer(DisposerDescriptor::new(
        "demo.PoolFactory",
        "shutdown",
        "demo.Pool",
        callback,
    ));

    let err = builder.deploy().unwrap_err();
    match err {
        Error::Deployment { problems } => assert_eq!(problems.len(), 2),
        other => panic!("expected aggregated deployment failure, got {other}"),
    }
}

#[test]
fn test_qualified_resolution_picks_the_qualified_candidate() {
    let factory = Arc::new(CountingFactory::default());
    let plain = greeter_descriptor(factory.clone());
    let formal = CandidateDescriptor::builder("demo.FormalGreeter")
        .with_contract("demo.Greeter")
        .with_qualifier(Qualifier::new("Formal"))
        .build(factory)
        .unwrap();

    let mut builder = Container::builder();
    builder.register(plain);
    builder.register(formal);
    let container = builder.deploy().unwrap();

    let winner = container
        .resolve(&InjectionRequest::new("demo.Greeter").with_qualifier(Qualifier::new("Formal")))
        .unwrap();
    assert_eq!(winner.backing_type().name(), "demo.FormalGreeter");
}

#[test]
fn test_config_activates_alternatives_for_all_requests() {
    let factory = Arc::new(CountingFactory::default());
    let mock = CandidateDescriptor::builder("demo.MockGreeter")
        .with_contract("demo.Greeter")
        .as_alternative()
        .build(factory)
        .unwrap();

    let mut config = ContainerConfig::default();
    config.resolution.activate_alternatives = true;
    let mut builder = wirecore::ContainerBuilder::with_config(config);
    builder.register(mock);
    let container = builder.deploy().unwrap();

    let winner = container
        .resolve(&InjectionRequest::new("demo.Greeter"))
        .unwrap();
    assert_eq!(winner.backing_type().name(), "demo.MockGreeter");
}

struct UppercaseDispatcher;

impl MethodDispatcher for UppercaseDispatcher {
    fn dispatch(
        &self,
        _target: &Instance,
        _method: &MethodSignature,
        mut args: Vec<Value>,
    ) -> Result<Value> {
        match args.pop() {
            Some(Value::Str(s)) => Ok(Value::from(s.to_uppercase())),
            other => Ok(other.unwrap_or(Value::Null)),
        }
    }
}

struct RecordingChain {
    order: Arc<std::sync::Mutex<Vec<&'static str>>>,
}

impl InterceptorChain for RecordingChain {
    fn invoke(
        &self,
        target: &Instance,
        invocation: Invocation,
        terminal: &dyn MethodDispatcher,
    ) -> Result<Value> {
        self.order.lock().unwrap().push("enter");
        let result = terminal.dispatch(target, &invocation.method, invocation.args);
        self.order.lock().unwrap().push("leave");
        result
    }
}

fn greet_signature() -> MethodSignature {
    MethodSignature::new(
        "greet",
        vec![ParamType::reference("java.lang.String")],
        ParamType::reference("java.lang.String"),
    )
}

#[test]
fn test_intercepted_proxy_runs_hooks_around_business_method() {
    let mut builder = Container::builder();
    builder.register_dispatcher(TypeKey::new("demo.Greeter"), Arc::new(UppercaseDispatcher));
    let container = builder.deploy().unwrap();

    let blueprint = ProxyBlueprint::for_interface("demo.Greeter")
        .with_intercepted(ProxyMethod::public(greet_signature()));
    let proxy = container
        .proxy(&blueprint, Arc::new(()) as Instance)
        .unwrap();

    let order = Arc::new(std::sync::Mutex::new(Vec::new()));
    proxy
        .set_chain(Arc::new(RecordingChain {
            order: order.clone(),
        }))
        .unwrap();

    let result = proxy
        .invoke(&greet_signature(), vec![Value::from("hello")])
        .unwrap();
    assert_eq!(result, Value::from("HELLO"));
    assert_eq!(*order.lock().unwrap(), vec!["enter", "leave"]);
}

#[test]
fn test_plain_proxy_method_skips_the_chain() {
    let mut builder = Container::builder();
    builder.register_dispatcher(TypeKey::new("demo.Greeter"), Arc::new(UppercaseDispatcher));
    let container = builder.deploy().unwrap();

    let blueprint = ProxyBlueprint::for_interface("demo.Greeter")
        .with_plain(ProxyMethod::public(greet_signature()));
    let proxy = container
        .proxy(&blueprint, Arc::new(()) as Instance)
        .unwrap();

    let order = Arc::new(std::sync::Mutex::new(Vec::new()));
    proxy
        .set_chain(Arc::new(RecordingChain {
            order: order.clone(),
        }))
        .unwrap();

    let result = proxy
        .invoke(&greet_signature(), vec![Value::from("hello")])
        .unwrap();
    assert_eq!(result, Value::from("HELLO"));
    assert!(order.lock().unwrap().is_empty());
}

#[test]
fn test_config_file_drives_container_deployment() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wirecore.toml");
    std::fs::write(&path, "[proxy]\nallocation = \"constructor\"\n").unwrap();

    let config = ConfigLoader::new().with_config_path(&path).load().unwrap();
    let container = wirecore::ContainerBuilder::with_config(config)
        .deploy()
        .unwrap();
    assert_eq!(container.config().proxy.allocation, "constructor");
}
