//! The immutable `Model`: element topology and material parameters shared by
//! every force kernel and integrator. Lives across steps; never mutated by
//! the core (an external model builder is responsible for constructing it).

use glam::{Mat2, Mat3, Vec3, Vec4};

use crate::error::{SimError, SimResult};
use crate::spatial::SpatialTransform;

/// `joint_type` discriminant, stored per-joint in `Model::joint_type`.
/// Values outside this set are a configuration error (see [`Model::validate`]);
/// the force kernel treats them as a no-op at runtime instead of panicking,
/// since a mid-dispatch element cannot raise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum JointType {
    Prismatic = 0,
    Revolute = 1,
    Ball = 2,
    Fixed = 3,
    Free = 4,
}

impl JointType {
    pub fn from_code(code: i32) -> Option<JointType> {
        match code {
            0 => Some(JointType::Prismatic),
            1 => Some(JointType::Revolute),
            2 => Some(JointType::Ball),
            3 => Some(JointType::Fixed),
            4 => Some(JointType::Free),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Model {
    // particles
    pub particle_mass: Vec<f32>,
    pub particle_inv_mass: Vec<f32>,
    pub gravity: Vec3,

    // springs
    pub spring_indices: Vec<[usize; 2]>,
    pub spring_rest_length: Vec<f32>,
    pub spring_stiffness: Vec<f32>,
    pub spring_damping: Vec<f32>,

    // triangles
    pub tri_indices: Vec<[usize; 3]>,
    pub tri_poses: Vec<Mat2>,
    pub tri_activations: Vec<f32>,
    pub tri_ke: f32,
    pub tri_ka: f32,
    pub tri_kd: f32,
    pub tri_drag: f32,
    pub tri_lift: f32,
    pub enable_tri_collisions: bool,

    // bending edges
    pub edge_indices: Vec<[usize; 4]>,
    pub edge_rest_angle: Vec<f32>,
    pub edge_ke: f32,
    pub edge_kd: f32,

    // tetrahedra
    pub tet_indices: Vec<[usize; 4]>,
    pub tet_poses: Vec<Mat3>,
    pub tet_activations: Vec<f32>,
    /// (mu, lambda, damping) per tet.
    pub tet_materials: Vec<[f32; 3]>,

    // rigid bodies
    pub body_com: Vec<Vec3>,
    pub body_mass: Vec<f32>,
    pub body_inertia: Vec<Mat3>,
    pub body_inv_mass: Vec<f32>,
    pub body_inv_inertia: Vec<Mat3>,
    /// Angular velocity damping factor applied each body-integration step.
    /// Exposed per the source's `todo: expose`; default matches the source (`0.1`).
    pub body_angular_damping: f32,

    // joints
    pub joint_type: Vec<i32>,
    pub joint_parent: Vec<i32>,
    pub joint_x_p: Vec<SpatialTransform>,
    pub joint_x_c: Vec<SpatialTransform>,
    pub joint_axis: Vec<Vec3>,
    pub joint_target: Vec<f32>,
    pub joint_act: Vec<f32>,
    pub joint_target_ke: Vec<f32>,
    pub joint_target_kd: Vec<f32>,
    pub joint_limit_lower: Vec<f32>,
    pub joint_limit_upper: Vec<f32>,
    pub joint_limit_ke: Vec<f32>,
    pub joint_limit_kd: Vec<f32>,
    /// Attachment-penalty gains; hard-coded `1e3`/`1e2` in the source, exposed here.
    pub joint_attach_ke: f32,
    pub joint_attach_kd: f32,

    // muscles
    /// CSR row-start offsets, length `muscle_count + 1`.
    pub muscle_start: Vec<usize>,
    pub muscle_links: Vec<usize>,
    pub muscle_points: Vec<Vec3>,
    pub muscle_activation: Vec<f32>,

    // contacts (body-ground, via shape contact points)
    pub contact_body0: Vec<usize>,
    pub contact_point0: Vec<Vec3>,
    pub contact_dist: Vec<f32>,
    pub contact_material: Vec<usize>,
    /// (ke, kd, kf, mu) per shape material.
    pub shape_materials: Vec<Vec4>,
    pub ground: bool,
    /// (nx, ny, nz, d): unit normal and offset of the ground plane.
    pub ground_plane: Vec4,

    // soft contacts (particle <-> body)
    pub soft_contact_count: usize,
    pub soft_contact_particle: Vec<usize>,
    pub soft_contact_body: Vec<i32>,
    pub soft_contact_body_pos: Vec<Vec3>,
    pub soft_contact_body_vel: Vec<Vec3>,
    pub soft_contact_normal: Vec<Vec3>,
    pub soft_contact_max: usize,
    pub soft_contact_ke: f32,
    pub soft_contact_kd: f32,
    pub soft_contact_kf: f32,
    pub soft_contact_mu: f32,
    pub soft_contact_distance: f32,

    pub shape_count: usize,
}

impl Model {
    pub fn new(gravity: Vec3) -> Self {
        Model {
            gravity,
            body_angular_damping: 0.1,
            joint_attach_ke: 1.0e3,
            joint_attach_kd: 1.0e2,
            ..Default::default()
        }
    }

    pub fn particle_count(&self) -> usize {
        self.particle_mass.len()
    }

    pub fn spring_count(&self) -> usize {
        self.spring_indices.len()
    }

    pub fn tri_count(&self) -> usize {
        self.tri_indices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_indices.len()
    }

    pub fn tet_count(&self) -> usize {
        self.tet_indices.len()
    }

    pub fn body_count(&self) -> usize {
        self.body_mass.len()
    }

    pub fn joint_count(&self) -> usize {
        self.joint_type.len()
    }

    pub fn muscle_count(&self) -> usize {
        self.muscle_activation.len()
    }

    pub fn contact_count(&self) -> usize {
        self.contact_body0.len()
    }

    /// Validates configuration invariants that a host driver may want to
    /// check once at setup time (not on the per-step hot path, where an
    /// invalid joint type is instead treated as a no-op and logged).
    pub fn validate(&self) -> SimResult<()> {
        for (i, &code) in self.joint_type.iter().enumerate() {
            if JointType::from_code(code).is_none() {
                return Err(SimError::InvalidJointType { joint: i, code });
            }
        }
        Ok(())
    }
}
