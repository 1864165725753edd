//! Benchmarks for the propagation system's hot path: how long a per-frame
//! pass takes as the matched entity count grows past the internal
//! parallel-fan-out threshold.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use orbit_core::component::{Cartesian, ElementsData, Frame, OrbitalElements, PropagatorComponent};
use orbit_core::config::{BufferConfig, StoreConfig};
use orbit_core::propagator::Rk2Propagator;
use orbit_core::system::{SimTimeMs, System};
use orbit_core::systems::PropagationSystem;
use orbit_core::{Handle, Host, World};

fn seeded_world(n: usize) -> (World, Vec<Handle>) {
    let mut world = World::new(StoreConfig::default(), BufferConfig::default());
    let mut handles = Vec::with_capacity(n);

    for i in 0..n {
        let handle = world.create().unwrap();
        let r = 7000.0 + (i % 50) as f64;
        let elements = OrbitalElements {
            data: ElementsData::Cartesian(Cartesian {
                position_km: [r, 0.0, 0.0],
                velocity_km_s: [0.0, 7.5, 0.0],
                frame: Frame::Eci,
            }),
            epoch_ms: 0.0,
        };
        world.store_mut().attach_orbital_elements(handle, elements).unwrap();

        let mut rk2 = Rk2Propagator::new();
        rk2.seed([r, 0.0, 0.0], [0.0, 7.5, 0.0], Frame::Eci, 0.0);
        world
            .store_mut()
            .attach_propagator(handle, PropagatorComponent { propagator: Box::new(rk2) })
            .unwrap();
        handles.push(handle);
    }

    (world, handles)
}

fn bench_propagation_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("propagation_pass");

    for &n in &[10usize, 100, 256, 1000, 10_000] {
        let (mut world, handles) = seeded_world(n);
        let mut host = Host::new();
        host.insert(SimTimeMs(16.0));
        let mut system = PropagationSystem::new();

        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                let (store, buffer) = world.store_and_buffer_mut();
                system.step(&mut host, store, buffer, 16.0, black_box(&handles));
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_propagation_pass);
criterion_main!(benches);
