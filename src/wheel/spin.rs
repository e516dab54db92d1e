use rand::Rng;
use std::f64::consts::TAU;

/// How many full turns a spin makes before the random offset is added
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpinMagnitude {
    pub min_turns: f64,
    pub max_turns: f64,
}

/// Regular spin that picks the winner
pub const FULL_SPIN: SpinMagnitude = SpinMagnitude {
    min_turns: 5.0,
    max_turns: 8.0,
};

/// Shorter spin used to knock a candidate out during elimination rounds
pub const ELIMINATION_SPIN: SpinMagnitude = SpinMagnitude {
    min_turns: 2.0,
    max_turns: 4.0,
};

/// Total rotation for a new spin: a random number of turns plus a random end angle
pub fn random_rotation<R: Rng + ?Sized>(rng: &mut R, magnitude: SpinMagnitude) -> f64 {
    let turns = rng.random_range(magnitude.min_turns..magnitude.max_turns);
    let end_angle = rng.random_range(0.0..TAU);
    turns * TAU + end_angle
}
