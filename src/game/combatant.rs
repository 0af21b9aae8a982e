//! Player and enemy state with their mutation primitives.
//!
//! All setters coerce instead of failing: levels and stages below 1 are treated as 1 and HP is
//! kept inside `0..=max_hp` after every change.

use serde::{Deserialize, Serialize};

/// Player HP at level 1.
pub const BASE_PLAYER_HP: i32 = 100;
/// Extra player HP per level above 1.
pub const PLAYER_HP_PER_LEVEL: i32 = 8;
/// Enemy HP independent of stage.
pub const BASE_ENEMY_HP: i32 = 35;
/// Extra enemy HP per stage.
pub const ENEMY_HP_PER_STAGE: i32 = 14;

/// `100 + (level - 1) * 8`
pub fn player_max_hp(level: u32) -> i32 {
    let level = level.max(1).min(i32::MAX as u32) as i32;
    BASE_PLAYER_HP.saturating_add((level - 1).saturating_mul(PLAYER_HP_PER_LEVEL))
}

/// `35 + stage * 14`
pub fn enemy_max_hp(stage: u32) -> i32 {
    let stage = stage.max(1).min(i32::MAX as u32) as i32;
    BASE_ENEMY_HP.saturating_add(stage.saturating_mul(ENEMY_HP_PER_STAGE))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub max_hp: i32,
    pub hp: i32,
    pub level: u32,
    /// Deepest dungeon stage reached.
    pub stage: u32,
    /// One-shot guard consumed by the next enemy attack.
    pub is_blocking: bool,
}

impl Player {
    /// Level 1, stage 1, full HP.
    pub fn new(name: impl Into<String>) -> Self {
        Player {
            name: name.into(),
            max_hp: BASE_PLAYER_HP,
            hp: BASE_PLAYER_HP,
            level: 1,
            stage: 1,
            is_blocking: false,
        }
    }

    pub fn take_damage(&mut self, amount: i32) {
        self.hp = self.hp.saturating_sub(amount.max(0)).max(0);
    }

    pub fn heal_full(&mut self) {
        self.hp = self.max_hp;
    }

    /// Raise the level to `new_level` if higher. Max HP follows the level; HP is only re-clamped.
    pub fn increase_level(&mut self, new_level: u32) {
        self.level = self.level.max(new_level.max(1));
        self.max_hp = player_max_hp(self.level);
        self.hp = self.hp.min(self.max_hp);
    }

    pub fn set_stage(&mut self, new_stage: u32) {
        self.stage = new_stage.max(1);
    }

    pub fn is_defeated(&self) -> bool {
        self.hp <= 0
    }
}

impl Default for Player {
    fn default() -> Self {
        Player::new("Traveler")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enemy {
    /// Stage this enemy was spawned for.
    pub stage: u32,
    pub name: String,
    pub max_hp: i32,
    pub hp: i32,
}

impl Enemy {
    /// Fresh, full-HP enemy for `stage`.
    pub fn spawn(stage: u32) -> Self {
        let stage = stage.max(1);
        let max_hp = enemy_max_hp(stage);
        Enemy {
            stage,
            name: format!("DUNGEON FOE {}", stage),
            max_hp,
            hp: max_hp,
        }
    }

    pub fn take_damage(&mut self, amount: i32) {
        self.hp = self.hp.saturating_sub(amount.max(0)).max(0);
    }

    pub fn is_defeated(&self) -> bool {
        self.hp <= 0
    }
}
