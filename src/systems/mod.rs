//! Concrete systems that ship with the crate.

pub mod propagation;
pub mod render_hook;

pub use propagation::PropagationSystem;
pub use render_hook::RenderHookSystem;
