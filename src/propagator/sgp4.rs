//! Wrapper around the `sgp4` crate. Output frame is always TEME, per the
//! model's own convention.

use time::{OffsetDateTime, PrimitiveDateTime};

use super::{PropagatedState, Propagator};
use crate::component::{Frame, OrbitalElements};
use crate::error::PropagationError;
use crate::tle::Tle;

struct Initialized {
    constants: ::sgp4::Constants,
    epoch: PrimitiveDateTime,
}

/// SGP4 propagator bound to a single TLE. The satellite record is
/// precomputed once at construction; malformed input yields a propagator
/// that permanently reports [`PropagationError::NotInitialized`].
pub struct Sgp4Propagator {
    inner: Option<Initialized>,
}

impl Sgp4Propagator {
    pub fn from_tle(tle: &Tle) -> Self {
        let inner = ::sgp4::Elements::from_tle(
            tle.name.clone(),
            &tle.line1,
            &tle.line2,
        )
        .ok()
        .and_then(|elements| {
            let epoch = elements.datetime;
            ::sgp4::Constants::from_elements(&elements)
                .ok()
                .map(|constants| Initialized { constants, epoch })
        });

        Sgp4Propagator { inner }
    }

    fn minutes_since_epoch(epoch: PrimitiveDateTime, t_sim_ms: f64) -> f64 {
        let nanos = (t_sim_ms * 1_000_000.0) as i128;
        let dt = OffsetDateTime::from_unix_timestamp_nanos(nanos)
            .unwrap_or(OffsetDateTime::UNIX_EPOCH);
        let target = PrimitiveDateTime::new(dt.date(), dt.time());
        (target - epoch).as_seconds_f64() / 60.0
    }
}

impl Propagator for Sgp4Propagator {
    fn step(&mut self, _elements: &OrbitalElements, t_sim_ms: f64) -> Result<PropagatedState, PropagationError> {
        let initialized = self.inner.as_ref().ok_or(PropagationError::NotInitialized)?;
        let minutes = Self::minutes_since_epoch(initialized.epoch, t_sim_ms);

        let prediction = initialized
            .constants
            .propagate(::sgp4::MinutesSinceEpoch(minutes))
            .map_err(|e| PropagationError::Failed(e.to_string()))?;

        Ok(PropagatedState {
            position_km: prediction.position,
            velocity_km_s: prediction.velocity,
            frame: Frame::Teme,
        })
    }
}
