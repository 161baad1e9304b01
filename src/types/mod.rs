// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Phantom-typed scheduler IDs, service names, and image references.

mod id;
mod image_ref;
mod service_name;

pub use id::{AllocationId, DeploymentId, EvalId, Id};
pub use image_ref::{ImageRef, ParseImageRefError};
pub use service_name::{ServiceName, ServiceNameError};
