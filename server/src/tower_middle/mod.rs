/// Tower middleware module
///
/// Layers wrapped around the routed application service:
/// - Admin gate (session-cookie check for the protected prefix)
/// - Request timeouts
pub mod admin_gate;
pub mod timeout;

pub use admin_gate::{AdminGateLayer, AdminGateService};
pub use timeout::{TimeoutLayer, TimeoutService};
