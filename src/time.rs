//! The simulation clock: a monotonic-when-playing timestamp with rate
//! scaling and tick subscribers.

/// Token returned by [`Clock::on_tick`]; drop it or pass it to
/// [`Clock::unsubscribe`] to stop receiving callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickSubscription(usize);

/// Milliseconds since the Unix epoch, f64 resolution (the clock's native
/// unit throughout this crate).
pub type SimMillis = f64;

/// Simulation time authority.
///
/// Holds `t_sim` and a playback `rate`. The clock is monotonic only while
/// playing with `rate >= 0` and no explicit [`Clock::set`] call; the
/// hybrid propagator (`crate::propagator::hybrid`) is built to tolerate
/// both reverse play and arbitrary jumps.
pub struct Clock {
    t_sim: SimMillis,
    rate: f64,
    playing: bool,
    last_advance_ms: SimMillis,
    callbacks: Vec<Option<Box<dyn FnMut(SimMillis) + Send>>>,
    free_slots: Vec<usize>,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl Clock {
    pub fn new(t0: SimMillis) -> Self {
        Clock {
            t_sim: t0,
            rate: 1.0,
            playing: true,
            last_advance_ms: 0.0,
            callbacks: Vec::new(),
            free_slots: Vec::new(),
        }
    }

    pub fn now(&self) -> SimMillis {
        self.t_sim
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn set_rate(&mut self, rate: f64) {
        self.rate = rate;
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    pub fn paused(&self) -> bool {
        !self.playing
    }

    /// Wall-clock delta actually applied on the last `advance`, in sim ms
    /// (zero while paused).
    pub fn dt_ms_since_last_tick(&self) -> SimMillis {
        self.last_advance_ms
    }

    /// Jump the clock to an absolute sim time and fire subscribers.
    pub fn set(&mut self, t: SimMillis) {
        self.t_sim = t;
        self.last_advance_ms = 0.0;
        self.fire();
    }

    /// Advance by a wall-clock delta, scaled by `rate`, if playing.
    pub fn advance(&mut self, dt_wall_ms: f64) {
        if !self.playing {
            return;
        }
        let dt = dt_wall_ms * self.rate;
        self.t_sim += dt;
        self.last_advance_ms = dt;
        self.fire();
    }

    /// Subscribe to every `advance`/`set`. Returns a token to unsubscribe.
    pub fn on_tick<F>(&mut self, cb: F) -> TickSubscription
    where
        F: FnMut(SimMillis) + Send + 'static,
    {
        let boxed: Box<dyn FnMut(SimMillis) + Send> = Box::new(cb);
        let slot = if let Some(s) = self.free_slots.pop() {
            self.callbacks[s] = Some(boxed);
            s
        } else {
            self.callbacks.push(Some(boxed));
            self.callbacks.len() - 1
        };
        TickSubscription(slot)
    }

    pub fn unsubscribe(&mut self, token: TickSubscription) {
        if let Some(slot) = self.callbacks.get_mut(token.0) {
            *slot = None;
            self.free_slots.push(token.0);
        }
    }

    fn fire(&mut self) {
        let t = self.t_sim;
        for cb in self.callbacks.iter_mut().flatten() {
            cb(t);
        }
    }
}
