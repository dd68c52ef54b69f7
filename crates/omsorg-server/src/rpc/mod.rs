//! The RPC layer: wire types, errors, the method registry and the handlers.

pub mod context;
pub mod errors;
pub mod handlers;
pub mod registry;
pub mod types;

pub use context::RpcContext;
pub use errors::{ESCALATION_NOT_FOUND, METHOD_NOT_FOUND, RpcError};
pub use registry::{MethodHandler, MethodRegistry};
pub use types::{ErrorBody, RpcRequest};
