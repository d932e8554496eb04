use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of the executor's random draws. Rolls are uniform in [0, 1).
pub trait Dice: Send {
    fn roll(&mut self) -> f64;
}

pub struct RandomDice {
    rng: StdRng,
}

impl RandomDice {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible sequence of rolls.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Dice for RandomDice {
    fn roll(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Scripted rolls for tests. Once the script runs out the last value repeats.
pub struct FixedDice {
    rolls: VecDeque<f64>,
    last: f64,
}

impl FixedDice {
    pub fn always(value: f64) -> Self {
        Self {
            rolls: VecDeque::new(),
            last: value,
        }
    }

    pub fn sequence(rolls: impl IntoIterator<Item = f64>) -> Self {
        let rolls: VecDeque<f64> = rolls.into_iter().collect();
        let last = rolls.back().copied().unwrap_or(0.0);
        Self { rolls, last }
    }
}

impl Dice for FixedDice {
    fn roll(&mut self) -> f64 {
        self.rolls.pop_front().unwrap_or(self.last)
    }
}
