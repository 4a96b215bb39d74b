//! Admin access control: session-token verification, the identity policy,
//! the per-request gate decision and the token issuer used by login.

pub mod gate;
pub mod identity;
pub mod issuer;
pub mod password;
pub mod verifier;

pub use gate::{AccessGate, GateDecision};
pub use identity::{AuthorizedAdmins, IdentityPolicy};
pub use issuer::TokenIssuer;
pub use password::{hash_password, verify_password};
pub use verifier::{AccessCheck, AccessDenial, SessionVerifier};
