// Wheel geometry and spin parameters
//
// Everything in here is pure: the coordinator feeds it candidates and random
// numbers and gets back segments, rotations and winners.

pub use selector::{candidate_weight, normalize_angle, segments, select_winner, Segment, Weighted};
pub use spin::{random_rotation, SpinMagnitude, ELIMINATION_SPIN, FULL_SPIN};

pub mod selector;
mod spin;
