//! Interceptor chain call-site contracts
//!
//! The chain-execution primitive itself is supplied by the interception
//! runtime; this module only defines the seams the generated proxy methods
//! call through. Invocation context travels explicitly as a parameter, never
//! through ambient state.

use wirecore_domain::{Instance, MethodSignature, Result, Value};

/// One intercepted call: the method identity and the boxed argument array
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Identity of the invoked business method
    pub method: MethodSignature,
    /// Arguments in the uniform boxed representation
    pub args: Vec<Value>,
}

impl Invocation {
    /// Create an invocation record
    pub fn new(method: MethodSignature, args: Vec<Value>) -> Self {
        Self { method, args }
    }
}

/// Terminal dispatch primitive: runs the real business method on the
/// delegate instance. Registered per backing type with the type loader.
pub trait MethodDispatcher: Send + Sync {
    /// Invoke `method` on `target` with the given boxed arguments
    fn dispatch(&self, target: &Instance, method: &MethodSignature, args: Vec<Value>)
    -> Result<Value>;
}

/// User-supplied interceptor logic wrapped around intercepted methods.
///
/// Implementations run their enter hooks, call `terminal.dispatch` to reach
/// the business method, then run their leave hooks; the result or error is
/// returned/rethrown to the proxy caller unchanged.
pub trait InterceptorChain: Send + Sync {
    /// Execute the chain around one invocation
    fn invoke(
        &self,
        target: &Instance,
        invocation: Invocation,
        terminal: &dyn MethodDispatcher,
    ) -> Result<Value>;
}

/// A chain with no interceptors: goes straight to the terminal dispatcher
pub struct PassthroughChain;

impl InterceptorChain for PassthroughChain {
    fn invoke(
        &self,
        target: &Instance,
        invocation: Invocation,
        terminal: &dyn MethodDispatcher,
    ) -> Result<Value> {
        terminal.dispatch(target, &invocation.method, invocation.args)
    }
}
