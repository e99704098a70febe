use glam::{Mat3, Quat, Vec3};
use physics::spatial::{SpatialTransform, SpatialVector};
use physics::{compute_forces, Integrator, JointType, Model, SemiImplicit, State};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    let fmt_layer = fmt::layer().compact();
    let filter_layer = EnvFilter::from_default_env();
    let _ = tracing_subscriber::registry().with(fmt_layer).with(filter_layer).try_init();
}

#[test]
fn single_spring_matches_closed_form() {
    init_tracing();
    let mut model = Model::new(Vec3::ZERO);
    model.particle_mass = vec![1.0, 1.0];
    model.particle_inv_mass = vec![1.0, 1.0];
    model.spring_indices = vec![[0, 1]];
    model.spring_rest_length = vec![1.0];
    model.spring_stiffness = vec![10.0];
    model.spring_damping = vec![0.0];

    let mut state = State::zeros(&model);
    state.particle_q[0] = Vec3::new(0.0, 0.0, 0.0);
    state.particle_q[1] = Vec3::new(2.0, 0.0, 0.0);

    let mut particle_f = vec![Vec3::ZERO; 2];
    let mut body_f = vec![];
    compute_forces(&model, &state, &mut particle_f, &mut body_f);

    assert!(particle_f[0].abs_diff_eq(Vec3::new(10.0, 0.0, 0.0), 1e-4));
    assert!(particle_f[1].abs_diff_eq(Vec3::new(-10.0, 0.0, 0.0), 1e-4));
}

#[test]
fn free_particle_one_semi_implicit_step() {
    let mut model = Model::new(Vec3::new(0.0, -9.81, 0.0));
    model.particle_mass = vec![1.0];
    model.particle_inv_mass = vec![1.0];

    let state_in = State::zeros(&model);
    let mut state_in = state_in;
    state_in.particle_q[0] = Vec3::new(0.0, 10.0, 0.0);
    let mut state_out = State::zeros(&model);

    let mut integrator = SemiImplicit;
    integrator.simulate(&model, &state_in, &mut state_out, 0.01).unwrap();

    assert!(state_out.particle_qd[0].abs_diff_eq(Vec3::new(0.0, -0.0981, 0.0), 1e-4));
    assert!(state_out.particle_q[0].abs_diff_eq(Vec3::new(0.0, 9.999019, 0.0), 1e-4));
}

#[test]
fn pinned_particle_is_unaffected_by_gravity() {
    let mut model = Model::new(Vec3::new(0.0, -9.81, 0.0));
    model.particle_mass = vec![1.0];
    model.particle_inv_mass = vec![0.0];

    let mut state_in = State::zeros(&model);
    state_in.particle_q[0] = Vec3::new(0.0, 10.0, 0.0);
    let mut state_out = State::zeros(&model);

    let mut integrator = SemiImplicit;
    integrator.simulate(&model, &state_in, &mut state_out, 0.01).unwrap();

    assert_eq!(state_out.particle_qd[0], Vec3::ZERO);
    assert_eq!(state_out.particle_q[0], state_in.particle_q[0]);
}

#[test]
fn single_rigid_body_under_constant_wrench() {
    let mut model = Model::new(Vec3::ZERO);
    model.body_mass = vec![1.0];
    model.body_com = vec![Vec3::ZERO];
    model.body_inertia = vec![Mat3::IDENTITY];
    model.body_inv_mass = vec![1.0];
    model.body_inv_inertia = vec![Mat3::IDENTITY];

    let state_in = State::zeros(&model);
    let mut state_out = State::zeros(&model);
    let body_f = vec![SpatialVector::new(Vec3::ZERO, Vec3::new(0.0, -1.0, 0.0))];

    physics::kernels::integrate::integrate_bodies(
        &model,
        &state_in,
        0.1,
        &body_f,
        &mut state_out.body_q,
        &mut state_out.body_qd,
    );

    assert!(state_out.body_qd[0].bottom.abs_diff_eq(Vec3::new(0.0, -0.1, 0.0), 1e-4));
    assert!(state_out.body_q[0].p.abs_diff_eq(Vec3::new(0.0, -0.01, 0.0), 1e-4));
    assert!((state_out.body_q[0].q.length() - 1.0).abs() < 1e-6);
    assert!(state_out.body_q[0].q.dot(Quat::IDENTITY).abs() > 1.0 - 1e-6);
}

#[test]
fn edge_edge_closest_point_crossing_segments() {
    let (s, t) = physics::geometry::closest_point_edge_edge(
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(1.0, 1.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        1e-6,
    );
    assert!((s - 0.5).abs() < 1e-4);
    assert!((t - 0.5).abs() < 1e-4);
}

#[test]
fn revolute_joint_aligned_has_no_swing_restoring_torque() {
    let mut model = Model::new(Vec3::ZERO);
    model.body_mass = vec![1.0, 1.0];
    model.body_com = vec![Vec3::ZERO; 2];
    model.body_inertia = vec![Mat3::IDENTITY; 2];
    model.body_inv_mass = vec![1.0, 1.0];
    model.body_inv_inertia = vec![Mat3::IDENTITY; 2];

    model.joint_type = vec![JointType::Revolute as i32];
    model.joint_parent = vec![-1];
    model.joint_x_p = vec![SpatialTransform::IDENTITY];
    model.joint_x_c = vec![SpatialTransform::IDENTITY];
    model.joint_axis = vec![Vec3::Z];
    model.joint_target = vec![0.0];
    model.joint_act = vec![0.0];
    model.joint_target_ke = vec![0.0];
    model.joint_target_kd = vec![0.0];
    model.joint_limit_lower = vec![-10.0];
    model.joint_limit_upper = vec![10.0];
    model.joint_limit_ke = vec![0.0];
    model.joint_limit_kd = vec![0.0];

    let mut state = State::zeros(&model);
    // child body (body index = joint tid = 0) rotated pi/4 about the joint axis.
    state.body_q[0] = SpatialTransform::new(Vec3::ZERO, Quat::from_rotation_z(std::f32::consts::FRAC_PI_4));

    let mut body_f = vec![SpatialVector::ZERO; 2];
    physics::kernels::joints::eval_body_joints(&model, &state, &mut body_f);

    // rotation is purely a twist about the joint axis, so the swing (off-axis)
    // component of the restoring torque must vanish; the on-axis component is
    // the (zero-gain) target drive, also zero here.
    let t = body_f[0].top;
    assert!(t.x.abs() < 1e-4 && t.y.abs() < 1e-4);
}
