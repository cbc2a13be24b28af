//! Proxy layer for wirecore
//!
//! Synthesizes delegating/intercepting runtime types from proxy blueprints
//! and materializes them into a type loader. Calling code observes a
//! contract-conformant instance while enter/leave hooks run transparently
//! around each intercepted business method; plain methods delegate directly
//! with no hook.

pub mod chain;
pub mod marshal;
pub mod materialize;
pub mod synthesize;

pub use chain::{InterceptorChain, Invocation, MethodDispatcher, PassthroughChain};
pub use materialize::{
    AllocationStrategy, ClassMaterializer, MAX_DEFINE_RETRIES, ProxyInstance, RuntimeType,
    TypeLoader,
};
pub use synthesize::{GeneratedMethod, GeneratedType, MethodBody, ProxySynthesizer};
