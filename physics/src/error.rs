use thiserror::Error;

/// Errors raised to the host driver. Degenerate per-element geometry is not
/// represented here: it is absorbed silently (with a `warn!` log) at the
/// kernel that detects it, never surfaced as an `Err`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimError {
    #[error("variational implicit integrator requires state_in and state_out to be distinct buffers")]
    AliasedState,

    #[error("joint {joint} has unrecognized type code {code}, expected 0..=4")]
    InvalidJointType { joint: usize, code: i32 },
}

pub type SimResult<T> = Result<T, SimError>;
