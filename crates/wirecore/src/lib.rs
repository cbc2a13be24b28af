//! # wirecore
//!
//! A typesafe dependency-injection container core: candidate resolution,
//! producer/disposer linking and interception proxies.
//!
//! This crate is the public facade. It re-exports the layered crates and
//! adds container bootstrap, configuration loading and logging setup.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use wirecore::domain::{CandidateDescriptor, InjectionRequest};
//! use wirecore::Container;
//!
//! let mut builder = Container::builder();
//! builder.register(console_greeter_descriptor()?);
//! let container = builder.deploy()?;
//!
//! let handle = container.create(&InjectionRequest::new("demo.Greeter"))?;
//! container.destroy(handle)?;
//! ```
//!
//! ## Architecture
//!
//! - `domain` - descriptors, contracts, qualifiers, values, errors
//! - `resolver` - candidate registry, resolution engine, disposer linking
//! - `proxy` - proxy synthesis, marshalling and type materialization
//! - this crate - bootstrap, configuration and logging

/// Domain layer - descriptors, contracts, qualifiers and errors
///
/// Re-exports from the domain crate for convenience
pub mod domain {
    pub use wirecore_domain::*;
}

/// Resolution layer - registry, resolution engine and discovery
///
/// Re-exports from the resolver crate for convenience
pub mod resolver {
    pub use wirecore_resolver::*;
}

/// Proxy layer - synthesis, marshalling and materialization
///
/// Re-exports from the proxy crate for convenience
pub mod proxy {
    pub use wirecore_proxy::*;
}

pub mod bootstrap;
pub mod config;
pub mod constants;
pub mod logging;

pub use bootstrap::{ComponentHandle, Container, ContainerBuilder};
pub use config::{ConfigLoader, ContainerConfig};
pub use wirecore_domain::{Error, Result};
