//! The serialization point between an out-of-process TLE loader and the
//! frame thread.
//!
//! SPEC_FULL.md §5: "TLE loading and any network fetch happen outside the
//! scheduler (external collaborators) and deliver results via component
//! attach, which is safe to call from the frame thread or from a
//! completion callback serialized onto it." A loader thread (or any other
//! completion callback) sends results down an unbounded channel; the
//! frame thread drains it once per frame and attaches `orbital-elements`
//! to the handles it names. This crate never spawns the loader itself —
//! only the channel that lets one hand results back safely.

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::component::OrbitalElements;
use crate::handle::Handle;

/// One pending ingest result for a handle: either the elements a fetch
/// produced, or a load failure the host may want to surface.
pub enum IngestResult {
    Elements(Handle, OrbitalElements),
    Failed(Handle, String),
}

/// Sending half. Clone and hand to whatever external collaborator
/// produces orbital elements out of band (HTTP fetch, disk load); safe to
/// call from any thread.
#[derive(Clone)]
pub struct IngestSender(Sender<IngestResult>);

impl IngestSender {
    pub fn send_elements(&self, handle: Handle, elements: OrbitalElements) {
        let _ = self.0.send(IngestResult::Elements(handle, elements));
    }

    pub fn send_failure(&self, handle: Handle, reason: impl Into<String>) {
        let _ = self.0.send(IngestResult::Failed(handle, reason.into()));
    }
}

/// Receiving half. Owned by whoever drives the frame loop; drained once
/// per frame on the frame thread, never blocking.
pub struct IngestQueue(Receiver<IngestResult>);

impl IngestQueue {
    /// Drain every result queued since the last drain.
    pub fn drain(&self) -> Vec<IngestResult> {
        self.0.try_iter().collect()
    }
}

/// A fresh ingest channel; typically created once and its sender cloned
/// out to background loaders.
pub fn channel() -> (IngestSender, IngestQueue) {
    let (tx, rx) = unbounded();
    (IngestSender(tx), IngestQueue(rx))
}
