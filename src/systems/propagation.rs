//! The propagation system: advances every entity carrying
//! `orbital-elements` + `propagator`, writing results into the
//! `position`/`velocity` tables (creating those rows if this is the
//! entity's first pass) and the shared position buffer.
//!
//! Failures are logged at a sampled rate (at most one in a thousand) so a
//! systematically failing propagator doesn't flood the log. A failed step
//! leaves the entity's previous position untouched rather than writing
//! `NaN`.
//!
//! The spec's `propagation.last_pass_ms` counter is realized by the
//! scheduler rather than this struct: `Scheduler::last_step_ms("propagation")`
//! (backed by the same per-system `AtomicU64` timer every system gets, see
//! `crate::system::Scheduler`), since the scheduler is what already times
//! and stores every system's wall-clock pass regardless of which system it
//! is. Reads `0` on a frame the scheduler skipped while paused.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::warn;

#[cfg(feature = "par-iter")]
use rayon::prelude::*;

use crate::buffer::PositionBuffer;
use crate::component::{ComponentKind, ComponentStore, OrbitalElements, Position, PropagatorComponent, Velocity};
use crate::handle::Handle;
use crate::host::Host;
use crate::propagator::{PropagatedState, Propagator};
use crate::system::{SimTimeMs, System};

/// Above this many matching entities, the per-entity propagation step is
/// fanned out across a rayon thread pool and joined before this system
/// returns, keeping the frame's systems cooperatively single-threaded
/// from the scheduler's point of view.
const PARALLEL_THRESHOLD: usize = 256;

pub struct PropagationSystem {
    required: [ComponentKind; 2],
    failures_seen: AtomicU64,
}

impl Default for PropagationSystem {
    fn default() -> Self {
        PropagationSystem {
            required: [ComponentKind::OrbitalElements, ComponentKind::Propagator],
            failures_seen: AtomicU64::new(0),
        }
    }
}

impl PropagationSystem {
    pub fn new() -> Self {
        PropagationSystem::default()
    }

    fn log_failure_sampled(&self, handle: Handle, err: &crate::error::PropagationError) {
        let n = self.failures_seen.fetch_add(1, Ordering::Relaxed);
        if n % 1000 == 0 {
            warn!(handle = %handle, error = %err, seen = n, "propagation step failed");
        }
    }
}

/// A propagator pulled out of the store for the duration of one step, so
/// that entities can be advanced independently (and, above
/// `PARALLEL_THRESHOLD`, in parallel) without aliasing a shared `&mut
/// ComponentStore`.
struct Extracted {
    handle: Handle,
    elements: OrbitalElements,
    propagator: PropagatorComponent,
}

struct Stepped {
    handle: Handle,
    propagator: PropagatorComponent,
    result: Result<PropagatedState, crate::error::PropagationError>,
}

impl System for PropagationSystem {
    fn name(&self) -> &str {
        "propagation"
    }

    fn priority(&self) -> i32 {
        100
    }

    fn required_kinds(&self) -> &[ComponentKind] {
        &self.required
    }

    fn step(
        &mut self,
        host: &mut Host,
        store: &mut ComponentStore,
        buffer: &mut PositionBuffer,
        _dt_ms: f64,
        matching: &[Handle],
    ) {
        let t_sim_ms = host.get::<SimTimeMs>().map(|t| t.0).unwrap_or(0.0);

        let extracted: Vec<Extracted> = matching
            .iter()
            .filter_map(|&handle| {
                let elements = store.orbital_elements(handle)?.clone();
                let propagator = store.detach_propagator(handle)?;
                Some(Extracted { handle, elements, propagator })
            })
            .collect();

        let stepped = run_steps(extracted, t_sim_ms);

        for entry in stepped {
            let _ = store.attach_propagator(entry.handle, entry.propagator);

            match entry.result {
                Ok(state) => {
                    let _ = store.attach_position(
                        entry.handle,
                        Position {
                            x: state.position_km[0],
                            y: state.position_km[1],
                            z: state.position_km[2],
                            frame: state.frame,
                        },
                    );
                    let _ = store.attach_velocity(
                        entry.handle,
                        Velocity {
                            vx: state.velocity_km_s[0],
                            vy: state.velocity_km_s[1],
                            vz: state.velocity_km_s[2],
                            frame: state.frame,
                        },
                    );
                    if let Ok(slot) = buffer.allocate(entry.handle) {
                        buffer.write(slot, state.position_km[0] as f32, state.position_km[1] as f32, state.position_km[2] as f32);
                    }
                }
                Err(err) => self.log_failure_sampled(entry.handle, &err),
            }
        }
    }
}

fn step_one(mut entry: Extracted, t_sim_ms: f64) -> Stepped {
    let result = entry.propagator.propagator.step(&entry.elements, t_sim_ms);
    Stepped { handle: entry.handle, propagator: entry.propagator, result }
}

#[cfg(feature = "par-iter")]
fn run_steps(extracted: Vec<Extracted>, t_sim_ms: f64) -> Vec<Stepped> {
    if extracted.len() >= PARALLEL_THRESHOLD {
        extracted.into_par_iter().map(|entry| step_one(entry, t_sim_ms)).collect()
    } else {
        extracted.into_iter().map(|entry| step_one(entry, t_sim_ms)).collect()
    }
}

#[cfg(not(feature = "par-iter"))]
fn run_steps(extracted: Vec<Extracted>, t_sim_ms: f64) -> Vec<Stepped> {
    extracted.into_iter().map(|entry| step_one(entry, t_sim_ms)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Cartesian, ElementsData, EntityTable, Frame};
    use crate::propagator::rk2::Rk2Propagator;

    fn seeded_entity(store: &mut ComponentStore, entities: &mut EntityTable) -> Handle {
        let handle = entities.create().unwrap();
        let elements = OrbitalElements {
            data: ElementsData::Cartesian(Cartesian {
                position_km: [7000.0, 0.0, 0.0],
                velocity_km_s: [0.0, 7.5, 0.0],
                frame: Frame::Eci,
            }),
            epoch_ms: 0.0,
        };
        store.attach_orbital_elements(handle, elements).unwrap();

        let mut rk2 = Rk2Propagator::new();
        rk2.seed([7000.0, 0.0, 0.0], [0.0, 7.5, 0.0], Frame::Eci, 0.0);
        store
            .attach_propagator(handle, PropagatorComponent { propagator: Box::new(rk2) })
            .unwrap();
        handle
    }

    /// The normal creation order — ingest elements, attach a propagator,
    /// nothing else — must still be matched by the scheduler's own
    /// `required_kinds()` gate, not just by a test that hands the handle
    /// to `step` directly.
    #[test]
    fn scheduler_matches_an_entity_with_no_preexisting_position_row() {
        let mut entities = EntityTable::new(10);
        let mut store = ComponentStore::new();
        let mut buffer = PositionBuffer::new(10);
        let mut host = Host::new();
        let handle = seeded_entity(&mut store, &mut entities);
        assert!(store.position(handle).is_none());

        host.insert(SimTimeMs(1000.0));
        let mut scheduler = crate::system::Scheduler::new();
        scheduler.add_system(Box::new(PropagationSystem::new()), &mut host);
        scheduler.step(&mut host, &mut store, &mut buffer, 16.0);

        let pos = store.position(handle).expect("propagation should have created a position row");
        let vel = store.velocity(handle).expect("propagation should have created a velocity row");
        assert_eq!(pos.frame, vel.frame);
    }

    #[test]
    fn advances_position_and_writes_buffer() {
        let mut entities = EntityTable::new(10);
        let mut store = ComponentStore::new();
        let mut buffer = PositionBuffer::new(10);
        let mut host = Host::new();
        let handle = seeded_entity(&mut store, &mut entities);

        host.insert(SimTimeMs(1000.0));
        let mut system = PropagationSystem::new();
        system.step(&mut host, &mut store, &mut buffer, 16.0, &[handle]);

        let pos = store.position(handle).unwrap();
        assert!(pos.x.is_finite());
        let slot = buffer.slot_of(handle).unwrap();
        let (x, _, _) = buffer.read(slot);
        assert_eq!(x, pos.x as f32);
    }

    #[test]
    fn failed_step_leaves_position_untouched() {
        let mut entities = EntityTable::new(10);
        let mut store = ComponentStore::new();
        let mut buffer = PositionBuffer::new(10);
        let mut host = Host::new();
        let handle = entities.create().unwrap();

        let elements = OrbitalElements {
            data: ElementsData::Cartesian(Cartesian { position_km: [1.0, 0.0, 0.0], velocity_km_s: [0.0, 0.0, 0.0], frame: Frame::Eci }),
            epoch_ms: 0.0,
        };
        store.attach_orbital_elements(handle, elements).unwrap();
        // unseeded rk2 propagator always fails with NotInitialized
        store
            .attach_propagator(handle, PropagatorComponent { propagator: Box::new(Rk2Propagator::new()) })
            .unwrap();
        store
            .attach_position(handle, Position { x: 42.0, y: 0.0, z: 0.0, frame: Frame::Eci })
            .unwrap();

        host.insert(SimTimeMs(0.0));
        let mut system = PropagationSystem::new();
        system.step(&mut host, &mut store, &mut buffer, 16.0, &[handle]);

        assert_eq!(store.position(handle).unwrap().x, 42.0);
        assert!(buffer.slot_of(handle).is_none());
    }
}
