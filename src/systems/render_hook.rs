//! The render-hook system: the seam where a host application plugs in its
//! own draw call. This crate ships a no-op default; real renderers
//! replace it by registering their own [`System`] at the same priority
//! band (1000) instead of subclassing this one.

use crate::buffer::PositionBuffer;
use crate::component::{ComponentKind, ComponentStore};
use crate::handle::Handle;
use crate::host::Host;
use crate::system::System;

/// A callback invoked once per frame with the handles carrying `billboard`,
/// `mesh`, or `label`, and read-only access to the shared position buffer.
pub type RenderCallback = Box<dyn FnMut(&ComponentStore, &PositionBuffer, &[Handle]) + Send>;

pub struct RenderHookSystem {
    required: [ComponentKind; 0],
    callback: Option<RenderCallback>,
}

impl Default for RenderHookSystem {
    fn default() -> Self {
        RenderHookSystem { required: [], callback: None }
    }
}

impl RenderHookSystem {
    pub fn new() -> Self {
        RenderHookSystem::default()
    }

    pub fn with_callback(callback: RenderCallback) -> Self {
        RenderHookSystem { required: [], callback: Some(callback) }
    }

    pub fn set_callback(&mut self, callback: RenderCallback) {
        self.callback = Some(callback);
    }
}

impl System for RenderHookSystem {
    fn name(&self) -> &str {
        "render-hook"
    }

    fn priority(&self) -> i32 {
        1000
    }

    fn required_kinds(&self) -> &[ComponentKind] {
        &self.required
    }

    fn step(
        &mut self,
        _host: &mut Host,
        store: &mut ComponentStore,
        buffer: &mut PositionBuffer,
        _dt_ms: f64,
        _matching: &[Handle],
    ) {
        if let Some(callback) = &mut self.callback {
            let renderable = store.handles_with_kind(ComponentKind::Billboard);
            callback(store, buffer, &renderable);
        }
    }
}
