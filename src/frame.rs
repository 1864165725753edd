//! The frame loop: ties the clock, scheduler, and host together into the
//! single synchronous `tick` a host application calls once per rendered
//! frame.

use crate::buffer::PositionBuffer;
use crate::component::ComponentStore;
use crate::host::Host;
use crate::system::{Scheduler, SimTimeMs};
use crate::time::Clock;

/// Owns the clock and system scheduler, and drives one cooperative,
/// single-threaded pass over all systems per call to [`FrameLoop::tick`].
///
/// `start`/`stop` gate the loop entirely: a stopped loop's `tick` is a
/// complete no-op (clock does not advance, no system runs). This is
/// distinct from [`Scheduler::pause`], which still lets the loop run so the
/// renderer hook keeps being invoked against the last published positions
/// (SPEC_FULL.md §4.5).
pub struct FrameLoop {
    clock: Clock,
    scheduler: Scheduler,
    running: bool,
}

impl FrameLoop {
    pub fn new(clock: Clock, scheduler: Scheduler) -> Self {
        FrameLoop { clock, scheduler, running: true }
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    /// Start (or resume) the loop; subsequent `tick` calls run normally.
    pub fn start(&mut self) {
        self.running = true;
    }

    /// Halt the loop at the next boundary: `tick` becomes a no-op until
    /// [`FrameLoop::start`] is called again. In-flight work is unaffected —
    /// this only gates future ticks.
    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn running(&self) -> bool {
        self.running
    }

    /// Advance the clock by `dt_wall_ms`, stash the resulting sim time in
    /// `host`, and run every system once. A no-op entirely while stopped
    /// (see [`FrameLoop::stop`]). A paused clock still advances the
    /// scheduler call (which itself becomes a no-op while paused, per
    /// [`Scheduler::step`]'s pause semantics) so `last_step_nanos` reads
    /// stay consistent from frame to frame.
    pub fn tick(&mut self, host: &mut Host, store: &mut ComponentStore, buffer: &mut PositionBuffer, dt_wall_ms: f64) {
        if !self.running {
            return;
        }
        self.clock.advance(dt_wall_ms);
        host.insert(SimTimeMs(self.clock.now()));
        self.scheduler.step(host, store, buffer, dt_wall_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentKind, EntityTable, Position, Frame};
    use crate::handle::Handle;
    use crate::system::System;

    struct TickCounter {
        count: std::sync::Arc<std::sync::atomic::AtomicUsize>,
    }

    impl System for TickCounter {
        fn name(&self) -> &str {
            "tick-counter"
        }
        fn priority(&self) -> i32 {
            50
        }
        fn required_kinds(&self) -> &[ComponentKind] {
            &[]
        }
        fn step(&mut self, _h: &mut Host, _s: &mut ComponentStore, _b: &mut PositionBuffer, _dt: f64, _m: &[Handle]) {
            self.count.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        }
    }

    #[test]
    fn tick_advances_clock_and_runs_systems() {
        let mut host = Host::new();
        let mut store = ComponentStore::new();
        let mut buffer = PositionBuffer::new(10);
        let mut scheduler = Scheduler::new();
        let count = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        scheduler.add_system(Box::new(TickCounter { count: count.clone() }), &mut host);

        let mut frame_loop = FrameLoop::new(Clock::new(0.0), scheduler);
        frame_loop.tick(&mut host, &mut store, &mut buffer, 16.0);

        assert_eq!(frame_loop.clock().now(), 16.0);
        assert_eq!(count.load(std::sync::atomic::Ordering::Relaxed), 1);
        assert_eq!(host.get::<SimTimeMs>(), Some(&SimTimeMs(16.0)));
    }

    #[test]
    fn paused_clock_still_runs_a_no_op_scheduler_pass() {
        let mut host = Host::new();
        let mut store = ComponentStore::new();
        let mut buffer = PositionBuffer::new(10);
        let mut entities = EntityTable::new(10);
        let handle = entities.create().unwrap();
        store.attach_position(handle, Position { x: 1.0, y: 1.0, z: 1.0, frame: Frame::Eci }).unwrap();

        let mut scheduler = Scheduler::new();
        scheduler.pause();
        let mut frame_loop = FrameLoop::new(Clock::new(0.0), scheduler);
        frame_loop.clock_mut().pause();
        frame_loop.tick(&mut host, &mut store, &mut buffer, 16.0);

        assert_eq!(frame_loop.clock().now(), 0.0);
        assert!(!store.is_dirty(handle));
    }

    #[test]
    fn stopped_loop_does_not_advance_clock_or_run_systems() {
        let mut host = Host::new();
        let mut store = ComponentStore::new();
        let mut buffer = PositionBuffer::new(10);
        let mut scheduler = Scheduler::new();
        let count = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        scheduler.add_system(Box::new(TickCounter { count: count.clone() }), &mut host);

        let mut frame_loop = FrameLoop::new(Clock::new(0.0), scheduler);
        frame_loop.stop();
        assert!(!frame_loop.running());
        frame_loop.tick(&mut host, &mut store, &mut buffer, 16.0);

        assert_eq!(frame_loop.clock().now(), 0.0);
        assert_eq!(count.load(std::sync::atomic::Ordering::Relaxed), 0);

        frame_loop.start();
        frame_loop.tick(&mut host, &mut store, &mut buffer, 16.0);
        assert_eq!(frame_loop.clock().now(), 16.0);
        assert_eq!(count.load(std::sync::atomic::Ordering::Relaxed), 1);
    }
}
