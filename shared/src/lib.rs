//! Records exchanged between the foraging core and its external collaborators.

pub mod api;
pub mod util;

pub use api::*;
pub use util::{fast_sin_cos, ring_direction, ring_heading};
