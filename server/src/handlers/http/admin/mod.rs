pub mod analytics;

pub use analytics::{handle_analytics, handle_record_streams};
