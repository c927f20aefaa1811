// src/resource/mod.rs

//! Runtime resource model.
//!
//! - [`spec`] holds the naming contract (`<project>-runtime`, the three-clause
//!   selector) and [`RuntimeTaskSpec`].
//! - [`descriptor`] models the Kubernetes objects podrun creates.
//! - [`builder`] turns a spec into descriptors. It is pure: no I/O and no
//!   failure modes.

pub mod builder;
pub mod descriptor;
pub mod spec;

pub use builder::{build_deployment, build_service};
pub use descriptor::{DeploymentDescriptor, ServiceDescriptor};
pub use spec::{
    LabelSelector, MAX_PROJECT_NAME_LEN, RuntimeTaskSpec, is_dns_label, runtime_name,
};
