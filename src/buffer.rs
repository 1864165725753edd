//! The shared position buffer: a single packed `f32[3 * capacity]` array
//! with stable per-handle slot allocation, independent of creation order.
//!
//! This is the one piece of state with a single writer (the propagation
//! system) and many read-only views (§5, §9 "hidden coupling via a
//! globally shared float array" is formalized exactly here).

use fxhash::FxHashMap;

use crate::error::BufferError;
use crate::handle::Handle;

/// Index into the packed position buffer. Stable per-handle for the
/// object's lifetime, independent of entity creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot(u32);

impl Slot {
    pub fn raw(self) -> u32 {
        self.0
    }
}

pub struct PositionBuffer {
    capacity: usize,
    data: Vec<f32>,
    handle_to_slot: FxHashMap<Handle, Slot>,
    slot_to_handle: FxHashMap<Slot, Handle>,
    free: Vec<Slot>,
    hwm: u32,
}

impl PositionBuffer {
    pub fn new(capacity: usize) -> Self {
        PositionBuffer {
            capacity,
            data: vec![0.0; capacity * 3],
            handle_to_slot: FxHashMap::default(),
            slot_to_handle: FxHashMap::default(),
            free: Vec::new(),
            hwm: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn slot_of(&self, handle: Handle) -> Option<Slot> {
        self.handle_to_slot.get(&handle).copied()
    }

    pub fn handle_at(&self, slot: Slot) -> Option<Handle> {
        self.slot_to_handle.get(&slot).copied()
    }

    /// Idempotent: returns the existing slot if one is already allocated.
    pub fn allocate(&mut self, handle: Handle) -> Result<Slot, BufferError> {
        if let Some(slot) = self.handle_to_slot.get(&handle) {
            return Ok(*slot);
        }

        let slot = if let Some(s) = self.free.pop() {
            s
        } else if (self.hwm as usize) < self.capacity {
            let s = Slot(self.hwm);
            self.hwm += 1;
            s
        } else {
            return Err(BufferError::Full);
        };

        self.handle_to_slot.insert(handle, slot);
        self.slot_to_handle.insert(slot, handle);
        Ok(slot)
    }

    /// Return a slot to the free list, zeroing its three floats.
    pub fn release(&mut self, handle: Handle) {
        if let Some(slot) = self.handle_to_slot.remove(&handle) {
            self.slot_to_handle.remove(&slot);
            self.write(slot, 0.0, 0.0, 0.0);
            self.free.push(slot);
        }
    }

    pub fn write(&mut self, slot: Slot, x: f32, y: f32, z: f32) {
        let i = slot.0 as usize * 3;
        self.data[i] = x;
        self.data[i + 1] = y;
        self.data[i + 2] = z;
    }

    pub fn read(&self, slot: Slot) -> (f32, f32, f32) {
        let i = slot.0 as usize * 3;
        (self.data[i], self.data[i + 1], self.data[i + 2])
    }

    /// Zero-copy view for the renderer: `raw()[0..hwm*3]` is always valid.
    pub fn raw(&self) -> &[f32] {
        &self.data
    }

    pub fn high_water_mark(&self) -> usize {
        self.hwm as usize
    }
}
