//! Propagator library: the `Propagator` capability and its three concrete
//! implementations — SGP4, RK2, and the hybrid controller that mixes them.
//!
//! Per the "polymorphism over propagators" redesign note (SPEC_FULL.md
//! §9), dispatch is by tag via one object-safe trait and three flat
//! variants, not a deep type hierarchy.

pub mod hybrid;
pub mod rk2;
pub mod sgp4;

use crate::component::{Frame, OrbitalElements};
use crate::buffer::{PositionBuffer, Slot};
use crate::error::PropagationError;

/// Output of a single propagator step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropagatedState {
    pub position_km: [f64; 3],
    pub velocity_km_s: [f64; 3],
    pub frame: Frame,
}

/// Capability every propagator implements.
///
/// `step` may fail with [`PropagationError::NotInitialized`] (construction
/// never succeeded) or [`PropagationError::Failed`] (a transient per-step
/// failure). `step_into` is the fast path that writes straight into the
/// shared position buffer, avoiding an intermediate allocation at the call
/// site; the default implementation simply forwards through `step`.
pub trait Propagator: Send {
    fn step(&mut self, elements: &OrbitalElements, t_sim_ms: f64) -> Result<PropagatedState, PropagationError>;

    fn step_into(
        &mut self,
        elements: &OrbitalElements,
        t_sim_ms: f64,
        buffer: &mut PositionBuffer,
        slot: Slot,
    ) -> Result<Frame, PropagationError> {
        let state = self.step(elements, t_sim_ms)?;
        buffer.write(
            slot,
            state.position_km[0] as f32,
            state.position_km[1] as f32,
            state.position_km[2] as f32,
        );
        Ok(state.frame)
    }
}

pub use hybrid::HybridController;
pub use rk2::Rk2Propagator;
pub use sgp4::Sgp4Propagator;
