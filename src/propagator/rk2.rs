//! Two-body RK2 (midpoint-style) integrator. Stateful: caches the last
//! `(r, v)` and advances from there on every call.

use super::{PropagatedState, Propagator};
use crate::component::{Frame, OrbitalElements};
use crate::error::PropagationError;

/// Earth's gravitational parameter, km^3/s^2.
pub const MU_EARTH: f64 = 398_600.4418;

#[derive(Debug, Clone, Copy)]
struct CachedState {
    r: [f64; 3],
    v: [f64; 3],
    frame: Frame,
    t_ms: f64,
}

#[derive(Default)]
pub struct Rk2Propagator {
    cached: Option<CachedState>,
}

impl Rk2Propagator {
    pub fn new() -> Self {
        Rk2Propagator { cached: None }
    }

    /// Seed the integrator's cached state, typically right after an
    /// authoritative SGP4 step (see `crate::propagator::hybrid`).
    pub fn seed(&mut self, r: [f64; 3], v: [f64; 3], frame: Frame, t_ms: f64) {
        self.cached = Some(CachedState { r, v, frame, t_ms });
    }
}

impl Propagator for Rk2Propagator {
    fn step(&mut self, _elements: &OrbitalElements, t_sim_ms: f64) -> Result<PropagatedState, PropagationError> {
        let state = self.cached.ok_or(PropagationError::NotInitialized)?;
        let dt_s = (t_sim_ms - state.t_ms) / 1000.0;
        let (r, v) = advance(state.r, state.v, dt_s);

        self.cached = Some(CachedState { r, v, frame: state.frame, t_ms: t_sim_ms });

        Ok(PropagatedState {
            position_km: r,
            velocity_km_s: v,
            frame: state.frame,
        })
    }
}

fn accel(r: [f64; 3]) -> [f64; 3] {
    let norm = (r[0] * r[0] + r[1] * r[1] + r[2] * r[2]).sqrt();
    let factor = -MU_EARTH / (norm * norm * norm);
    [r[0] * factor, r[1] * factor, r[2] * factor]
}

fn add(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

fn scale(a: [f64; 3], s: f64) -> [f64; 3] {
    [a[0] * s, a[1] * s, a[2] * s]
}

/// `a1 = -mu r/|r|^3`, `r' = r + dt v`, `a2 = -mu r'/|r'|^3`,
/// `v <- v + (dt/2)(a1+a2)`, `r <- r + dt v_new`.
fn advance(r: [f64; 3], v: [f64; 3], dt: f64) -> ([f64; 3], [f64; 3]) {
    let a1 = accel(r);
    let r_pred = add(r, scale(v, dt));
    let a2 = accel(r_pred);
    let v_new = add(v, scale(add(a1, a2), dt / 2.0));
    let r_new = add(r, scale(v_new, dt));
    (r_new, v_new)
}
