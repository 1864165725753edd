//! The hybrid controller: the central piece of the propagator library. On
//! every call it decides whether to take an authoritative-but-expensive
//! SGP4 step or a cheap RK2 step from cached state, per the decision tree
//! in SPEC_FULL.md §4.3.

use super::rk2::Rk2Propagator;
use super::sgp4::Sgp4Propagator;
use super::{PropagatedState, Propagator};
use crate::component::OrbitalElements;
use crate::config::HybridConfig;
use crate::error::PropagationError;
use crate::tle::Tle;

pub struct HybridController {
    sgp4: Sgp4Propagator,
    rk2: Rk2Propagator,
    config: HybridConfig,
    t_last_sgp4: Option<f64>,
    t_last_call: Option<f64>,
}

impl HybridController {
    pub fn new(tle: &Tle, config: HybridConfig) -> Self {
        HybridController {
            sgp4: Sgp4Propagator::from_tle(tle),
            rk2: Rk2Propagator::new(),
            config,
            t_last_sgp4: None,
            t_last_call: None,
        }
    }

    /// Clear the SGP4 refresh timer so the next call takes an SGP4 step
    /// regardless of the interval/stagger window (Open Question #3, see
    /// DESIGN.md).
    pub fn force_resync(&mut self) {
        self.t_last_sgp4 = None;
    }

    pub fn last_sgp4_time(&self) -> Option<f64> {
        self.t_last_sgp4
    }

    fn wants_sgp4(&self, t: f64) -> bool {
        let Some(t_last_sgp4) = self.t_last_sgp4 else {
            return true;
        };
        if !self.config.use_rk2 {
            return true;
        }
        if t - t_last_sgp4 >= self.config.sgp4_interval_ms + self.config.stagger_offset_ms {
            return true;
        }
        if let Some(t_last_call) = self.t_last_call {
            if ((t - t_last_call).abs() / 1000.0) > self.config.jump_threshold_s {
                return true;
            }
        }
        false
    }
}

impl Propagator for HybridController {
    fn step(&mut self, elements: &OrbitalElements, t_sim_ms: f64) -> Result<PropagatedState, PropagationError> {
        let result = if self.wants_sgp4(t_sim_ms) {
            let result = self.sgp4.step(elements, t_sim_ms);
            if let Ok(state) = &result {
                self.rk2.seed(state.position_km, state.velocity_km_s, state.frame, t_sim_ms);
                self.t_last_sgp4 = Some(t_sim_ms);
            }
            result
        } else {
            self.rk2.step(elements, t_sim_ms)
        };

        self.t_last_call = Some(t_sim_ms);
        result
    }
}
