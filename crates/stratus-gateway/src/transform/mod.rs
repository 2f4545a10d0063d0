//! Claims-driven request transform engine.

mod engine;
pub mod template;

pub use engine::ClaimsTransform;
pub use template::UNRESOLVED_SEGMENT;
