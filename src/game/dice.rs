//! Uniform integer sources for damage rolls.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Uniform integer generator over an inclusive range.
pub trait Dice: Send {
    /// Roll uniformly in `min..=max`. `max < min` is treated as `min..=min`.
    fn roll(&mut self, min: i32, max: i32) -> i32;
}

/// Process-entropy dice backed by `rand::thread_rng`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadDice;

impl Dice for ThreadDice {
    fn roll(&mut self, min: i32, max: i32) -> i32 {
        rand::thread_rng().gen_range(min..=max.max(min))
    }
}

/// Reproducible dice from a fixed seed.
#[derive(Debug, Clone)]
pub struct SeededDice {
    rng: StdRng,
}

impl SeededDice {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Dice for SeededDice {
    fn roll(&mut self, min: i32, max: i32) -> i32 {
        self.rng.gen_range(min..=max.max(min))
    }
}

/// Replays a fixed list of results, clamped into the requested range.
///
/// Once the script runs out every roll returns `min`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDice {
    script: VecDeque<i32>,
}

impl ScriptedDice {
    pub fn new(rolls: impl IntoIterator<Item = i32>) -> Self {
        Self {
            script: rolls.into_iter().collect(),
        }
    }

    pub fn push(&mut self, roll: i32) {
        self.script.push_back(roll);
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl Dice for ScriptedDice {
    fn roll(&mut self, min: i32, max: i32) -> i32 {
        let max = max.max(min);
        self.script
            .pop_front()
            .map(|r| r.clamp(min, max))
            .unwrap_or(min)
    }
}
