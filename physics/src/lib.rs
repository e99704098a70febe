//! Physics integration core: force kernels and time integrators for
//! particle- and rigid-body dynamics (springs, cloth, soft bodies, rigid
//! articulations, contacts, muscles), plus the dense linear algebra and
//! first-order optimizer contracts the implicit integrator rests on.

pub mod dense;
pub mod error;
pub mod geometry;
pub mod integrator;
pub mod kernels;
pub mod model;
pub mod optimizer;
pub mod spatial;
pub mod state;

pub use error::{SimError, SimResult};
pub use integrator::{compute_forces, Integrator, SemiImplicit, VariationalImplicit};
pub use model::{JointType, Model};
pub use optimizer::{Mode as OptimizerMode, Optimizer};
pub use spatial::{SpatialTransform, SpatialVector};
pub use state::State;
