//! Infrastructure shared between the binaries of this workspace.

pub mod arguments;
pub mod metrics;
pub mod tracing;
