pub mod client;
pub mod orchestrator;
pub mod registry;
pub mod session;

pub use client::{LtmClient, LtmError};
pub use orchestrator::{ProfileOrchestrator, SoftFailure, SslObject};
pub use registry::HostRegistry;
pub use session::BigIpSession;
