//! The per-frame scheduler: a priority-ordered list of systems, each
//! matched against the component store by required/optional kind sets,
//! with per-system timing and pause semantics.
//!
//! Systems are matched against entities by kind set rather than by
//! archetype or chunk, since the component store has no archetype
//! concept to track.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use tracing::{debug, warn};

use crate::buffer::PositionBuffer;
use crate::component::{ComponentKind, ComponentStore};
use crate::handle::Handle;
use crate::host::Host;

/// Simulation time in milliseconds for the frame currently being stepped,
/// stashed in the [`Host`] by [`crate::frame::FrameLoop`] before each
/// [`Scheduler::step`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimTimeMs(pub f64);

/// A unit of per-frame work matched against entities by component kind.
///
/// Object-safe so a [`Scheduler`] can hold a heterogeneous,
/// priority-ordered `Vec<Box<dyn System>>`.
pub trait System: Send {
    fn name(&self) -> &str;

    /// Lower runs first. Matches SPEC_FULL.md §4.4's fixed priority bands:
    /// celestial-body update 50, propagation 100, transform 200 (optional),
    /// render-hook 1000, selection 1100 (optional).
    fn priority(&self) -> i32;

    /// Kinds an entity must carry to be matched at all.
    fn required_kinds(&self) -> &[ComponentKind];

    /// Kinds consulted if present, but that don't gate matching.
    fn optional_kinds(&self) -> &[ComponentKind] {
        &[]
    }

    /// Called once when the system is added to a [`Scheduler`].
    fn init(&mut self, _host: &mut Host) {}

    /// Run one frame's worth of work against the matching handles.
    fn step(
        &mut self,
        host: &mut Host,
        store: &mut ComponentStore,
        buffer: &mut PositionBuffer,
        dt_ms: f64,
        matching: &[Handle],
    );

    /// Called when the system is removed from a [`Scheduler`].
    fn teardown(&mut self, _host: &mut Host) {}
}

struct Entry {
    system: Box<dyn System>,
    last_step_nanos: AtomicU64,
}

/// Drives a priority-ordered list of systems against a shared
/// [`ComponentStore`] and [`Host`], once per frame.
///
/// A paused scheduler still clears the dirty set but runs no systems,
/// per the "pause leaves rendered state exactly where it was" invariant
/// (SPEC_FULL.md §8 scenario 5): every system's `last_step_ms` reads
/// `0.0` on a frame it didn't run.
#[derive(Default)]
pub struct Scheduler {
    entries: Vec<Entry>,
    paused: bool,
}

impl Scheduler {
    pub fn new() -> Self {
        Scheduler::default()
    }

    /// Add a system, calling its `init` hook and resorting by priority.
    pub fn add_system(&mut self, mut system: Box<dyn System>, host: &mut Host) {
        system.init(host);
        self.entries.push(Entry {
            system,
            last_step_nanos: AtomicU64::new(0),
        });
        self.entries.sort_by_key(|e| e.system.priority());
    }

    /// Remove a system by name, calling its `teardown` hook.
    pub fn remove_system(&mut self, name: &str, host: &mut Host) -> bool {
        if let Some(pos) = self.entries.iter().position(|e| e.system.name() == name) {
            let mut entry = self.entries.remove(pos);
            entry.system.teardown(host);
            true
        } else {
            false
        }
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    /// Wall-clock-to-nanosecond timing for the named system's last run;
    /// `0` if it has never run or the scheduler was paused this frame.
    ///
    /// This is the scheduler's realization of SPEC_FULL.md §4.4/§6's named
    /// per-system counters — e.g. `last_step_nanos("propagation")` is
    /// `propagation.last_pass_ms` (see [`Scheduler::last_step_ms`] for the
    /// millisecond form named in the spec).
    pub fn last_step_nanos(&self, name: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|e| e.system.name() == name)
            .map(|e| e.last_step_nanos.load(Ordering::Relaxed))
    }

    /// `last_step_nanos` converted to milliseconds, matching the spec's
    /// `last_pass_ms` naming. `0.0` if the system has never run or the
    /// scheduler was paused this frame.
    pub fn last_step_ms(&self, name: &str) -> Option<f64> {
        self.last_step_nanos(name).map(|ns| ns as f64 / 1_000_000.0)
    }

    /// Run every system once, in priority order, against handles matching
    /// its required/optional kinds. Clears the store's dirty set at the
    /// end, regardless of whether any system ran.
    pub fn step(&mut self, host: &mut Host, store: &mut ComponentStore, buffer: &mut PositionBuffer, dt_ms: f64) {
        if self.paused {
            debug!("scheduler paused, skipping frame");
            for entry in &self.entries {
                entry.last_step_nanos.store(0, Ordering::Relaxed);
            }
            store.clear_dirty();
            return;
        }

        for entry in &mut self.entries {
            let required = entry.system.required_kinds();
            let matching = match_handles(store, required);

            let started = Instant::now();
            entry.system.step(host, store, buffer, dt_ms, &matching);
            let elapsed = started.elapsed().as_nanos() as u64;
            entry.last_step_nanos.store(elapsed, Ordering::Relaxed);

            #[cfg(feature = "metrics")]
            {
                metrics::histogram!("orbit_core.system.step_nanos", "system" => entry.system.name().to_string())
                    .record(elapsed as f64);
                metrics::gauge!("orbit_core.system.matched_entities", "system" => entry.system.name().to_string())
                    .set(matching.len() as f64);
            }

            if elapsed > 16_000_000 {
                warn!(system = entry.system.name(), elapsed_ns = elapsed, "system exceeded one frame budget");
            }
        }

        store.clear_dirty();
    }
}

fn match_handles(store: &ComponentStore, required: &[ComponentKind]) -> Vec<Handle> {
    let Some(&smallest) = required.iter().min_by_key(|k| store.table_len(**k)) else {
        return Vec::new();
    };
    store
        .handles_with_kind(smallest)
        .into_iter()
        .filter(|h| store.kinds_of(*h).contains_all(required))
        .collect()
}
