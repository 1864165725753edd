//! Plain configuration structs. No file or environment parsing lives here —
//! callers construct these in code, typically from whatever configuration
//! layer the host application already has.

/// Configuration for [`crate::component::ComponentStore`]'s handle allocator.
#[derive(Debug, Clone, Copy)]
pub struct StoreConfig {
    pub max_live: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig { max_live: 100_000 }
    }
}

/// Configuration for [`crate::buffer::PositionBuffer`].
#[derive(Debug, Clone, Copy)]
pub struct BufferConfig {
    pub capacity: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        BufferConfig { capacity: 100_000 }
    }
}

/// Configuration for [`crate::propagator::hybrid::HybridController`].
#[derive(Debug, Clone, Copy)]
pub struct HybridConfig {
    pub sgp4_interval_ms: f64,
    pub stagger_offset_ms: f64,
    pub jump_threshold_s: f64,
    pub use_rk2: bool,
}

impl Default for HybridConfig {
    fn default() -> Self {
        HybridConfig {
            sgp4_interval_ms: 60_000.0,
            stagger_offset_ms: 0.0,
            jump_threshold_s: 1000.0,
            use_rk2: true,
        }
    }
}
