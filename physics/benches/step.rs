use std::iter::repeat_with;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::{Mat2, Vec3};
use physics::{Integrator, Model, SemiImplicit, State};
use rand::Rng;

fn init_cloth_model(num_particles: usize) -> Model {
    let mut model = Model::new(Vec3::new(0.0, -9.81, 0.0));

    model.particle_mass = repeat_with(|| 1.0).take(num_particles).collect();
    model.particle_inv_mass = repeat_with(|| 1.0).take(num_particles).collect();

    let num_tris = num_particles.saturating_sub(2) / 3;
    model.tri_indices = (0..num_tris).map(|t| [t * 3, t * 3 + 1, t * 3 + 2]).collect();
    model.tri_poses = repeat_with(|| Mat2::IDENTITY).take(num_tris).collect();
    model.tri_activations = repeat_with(|| 0.0).take(num_tris).collect();
    model.tri_ke = 1.0e4;
    model.tri_ka = 1.0e4;
    model.tri_kd = 1.0e1;

    model
}

fn init_cloth_state(model: &Model, num_particles: usize) -> State {
    let mut state = State::zeros(model);
    let mut rng = rand::thread_rng();
    let pos_limit = 50.0;
    for i in 0..num_particles {
        state.particle_q[i] = Vec3::new(
            (i as f32) * 0.1,
            rng.gen_range(-pos_limit..pos_limit) * 0.01,
            rng.gen_range(-pos_limit..pos_limit) * 0.01,
        );
    }
    state
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("semi_implicit_step");
    for num_particles in [30, 90, 300, 900, 3000] {
        let model = init_cloth_model(num_particles);
        let initial_state = init_cloth_state(&model, num_particles);
        group.bench_with_input(
            BenchmarkId::new("step cloth patch", num_particles),
            &num_particles,
            |b, _| {
                b.iter(|| {
                    let dt = 1.0 / 60.0;
                    let mut integrator = SemiImplicit;
                    let mut out = initial_state.clone();
                    integrator
                        .simulate(&model, black_box(&initial_state), &mut out, black_box(dt))
                        .unwrap();
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
