pub mod login;
pub mod logout;
pub mod session;

// Re-export main handlers
pub use login::handle_login;
pub use logout::handle_logout;
pub use session::{handle_status, handle_verify_admin};
