//! Real-time space-object simulation core.
//!
//! Composes a stable-handle entity table, typed component tables, a
//! shared packed position buffer for the renderer, a hybrid SGP4/RK2
//! orbital propagator, and a priority-ordered per-frame scheduler.
//!
//! [`World`] is the single entry point: it owns every subsystem and is
//! responsible for keeping the handle allocator, component tables, and
//! position buffer in sync on creation and destruction.

pub mod buffer;
pub mod component;
pub mod config;
pub mod error;
pub mod frame;
pub mod handle;
pub mod host;
pub mod ingest;
pub mod propagator;
pub mod query;
pub mod system;
pub mod systems;
pub mod time;
pub mod tle;

pub use buffer::{PositionBuffer, Slot};
pub use component::{ComponentKind, ComponentStore, EntityTable};
pub use config::{BufferConfig, HybridConfig, StoreConfig};
pub use error::{BufferError, PropagationError, SimError, StoreError, TleError};
pub use frame::FrameLoop;
pub use handle::Handle;
pub use host::Host;
pub use ingest::{channel as ingest_channel, IngestQueue, IngestResult, IngestSender};
pub use propagator::{HybridController, PropagatedState, Propagator, Rk2Propagator, Sgp4Propagator};
pub use query::{Frustum, QueryService};
pub use system::{Scheduler, SimTimeMs, System};
pub use time::Clock;
pub use tle::Tle;

/// Top-level handle for the whole simulation state. Creation and
/// destruction here are the only operations that must touch more than one
/// subsystem at once: a handle's component rows and its position-buffer
/// slot are allocated and released together, so neither can outlive the
/// other (SPEC_FULL.md §3's entity/component/buffer consistency
/// invariant).
pub struct World {
    entities: EntityTable,
    store: ComponentStore,
    buffer: PositionBuffer,
    clock: Clock,
}

impl World {
    pub fn new(store_config: StoreConfig, buffer_config: BufferConfig) -> Self {
        World {
            entities: EntityTable::new(store_config.max_live),
            store: ComponentStore::new(),
            buffer: PositionBuffer::new(buffer_config.capacity),
            clock: Clock::new(0.0),
        }
    }

    pub fn create(&mut self) -> Result<Handle, StoreError> {
        self.entities.create()
    }

    /// Remove every component row for `handle` and release its
    /// position-buffer slot. A no-op for a handle that is already dead or
    /// was never created by this world.
    pub fn destroy(&mut self, handle: Handle) {
        if self.entities.destroy(handle) {
            self.store.destroy(handle);
            self.buffer.release(handle);
        }
    }

    pub fn is_alive(&self, handle: Handle) -> bool {
        self.entities.is_alive(handle)
    }

    pub fn store(&self) -> &ComponentStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ComponentStore {
        &mut self.store
    }

    pub fn buffer(&self) -> &PositionBuffer {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut PositionBuffer {
        &mut self.buffer
    }

    /// Disjoint mutable borrows of the component store and position
    /// buffer, for callers (e.g. a [`system::Scheduler`] or a system's
    /// own tests) that need both at once without aliasing `&mut self`.
    pub fn store_and_buffer_mut(&mut self) -> (&mut ComponentStore, &mut PositionBuffer) {
        (&mut self.store, &mut self.buffer)
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    pub fn query(&self) -> QueryService<'_> {
        QueryService::new(&self.store, &self.buffer)
    }

    /// Drain a [`ingest::IngestQueue`] and attach the `orbital-elements`
    /// it carries. Called once per frame on the frame thread, per
    /// SPEC_FULL.md §5's "deliver results via component attach" contract.
    /// A result naming a handle that is no longer alive is silently
    /// dropped, not an error — the object was destroyed before its fetch
    /// completed.
    pub fn apply_ingest(&mut self, queue: &ingest::IngestQueue) {
        for result in queue.drain() {
            match result {
                ingest::IngestResult::Elements(handle, elements) => {
                    if self.is_alive(handle) {
                        let _ = self.store.attach_orbital_elements(handle, elements);
                    }
                }
                ingest::IngestResult::Failed(_, _) => {}
            }
        }
    }
}

impl Default for World {
    fn default() -> Self {
        World::new(StoreConfig::default(), BufferConfig::default())
    }
}
