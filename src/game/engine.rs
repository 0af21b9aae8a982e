//! Combat engine: resolves one player action and the enemy reply in a single call.
//!
//! ```text
//! HIT ENEMY ─► player damage ─► enemy down? ─yes─► defeat sequence (stage+1, maybe level+1,
//!                                  │                save progress, new enemy)
//!                                  no
//!                                  ▼
//! BLOCK ─────────────────────► enemy turn ─► player down? ─yes─► restore to full HP
//! ```
//!
//! Damage ranges (inclusive):
//! - player hit: `9 + level ..= 15 + level`
//! - enemy hit: `6 + stage ..= 12 + stage`, reduced to `floor(base * 0.35)` while blocking

use async_trait::async_trait;
use log::{debug, info, warn};

use super::combatant::{Enemy, Player};
use super::dice::Dice;
use super::parser::CombatAction;
use super::presenter::{hp_ratio, Cue, Presenter, Side, Snapshot, Turn};
use crate::auth::{AuthError, AuthService, LevelUpdate};
use crate::errors::GameError;
use crate::metrics;

/// Fraction of enemy damage that gets through a block.
pub const BLOCK_FACTOR: f64 = 0.35;

/// Where the engine saves the level after a victory.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn save_level(&self, level: u32) -> Result<(), AuthError>;
}

/// Saves progress for a signed-in account through the account capability.
pub struct AccountProgress<'a> {
    pub auth: &'a dyn AuthService,
    pub username: &'a str,
}

#[async_trait]
impl ProgressSink for AccountProgress<'_> {
    async fn save_level(&self, level: u32) -> Result<(), AuthError> {
        let update = LevelUpdate {
            username: self.username.to_string(),
            level,
        };
        self.auth.update_level(&update).await.map(|_| ())
    }
}

pub struct CombatEngine {
    player: Player,
    enemy: Enemy,
    turn: Turn,
    status: Option<String>,
    last_save_failure: Option<AuthError>,
    dice: Box<dyn Dice>,
    presenter: Box<dyn Presenter>,
}

impl CombatEngine {
    /// Start a fight against a fresh enemy for the player's current stage.
    pub fn new(player: Player, dice: Box<dyn Dice>, presenter: Box<dyn Presenter>) -> Self {
        let enemy = Enemy::spawn(player.stage);
        let mut engine = CombatEngine {
            player,
            enemy,
            turn: Turn::Player,
            status: None,
            last_save_failure: None,
            dice,
            presenter,
        };
        engine.sync(Turn::Player);
        engine
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn enemy(&self) -> &Enemy {
        &self.enemy
    }

    pub fn turn(&self) -> Turn {
        self.turn
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Failure of the most recent progress save, cleared by the next successful one.
    pub fn last_save_failure(&self) -> Option<&AuthError> {
        self.last_save_failure.as_ref()
    }

    /// Current state as the presentation port sees it.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            player_hp_pct: hp_ratio(self.player.hp, self.player.max_hp),
            enemy_hp_pct: hp_ratio(self.enemy.hp, self.enemy.max_hp),
            player_level: self.player.level,
            enemy_name: self.enemy.name.clone(),
            turn: self.turn,
            status: self.status.clone(),
        }
    }

    /// Adopt an account's stored level: raise level and stage (never lower them), heal, and
    /// begin the resulting stage with a new enemy.
    pub fn load_progress(&mut self, level: u32, status: &str) {
        self.player.increase_level(level);
        let stage = self.player.stage.max(level);
        self.player.set_stage(stage);
        self.player.is_blocking = false;
        self.player.heal_full();
        self.enemy = Enemy::spawn(self.player.stage);
        self.status = Some(status.to_string());
        self.sync(Turn::Player);
        info!(
            "progress loaded: level {} stage {}",
            self.player.level, self.player.stage
        );
    }

    /// Resolve one combat action. `progress` is `None` when nobody is signed in.
    pub async fn perform(
        &mut self,
        action: CombatAction,
        progress: Option<&dyn ProgressSink>,
    ) -> String {
        match action {
            CombatAction::Hit => self.perform_hit(progress).await,
            CombatAction::Block => self.perform_block(),
        }
    }

    pub async fn perform_hit(&mut self, progress: Option<&dyn ProgressSink>) -> String {
        self.sync(Turn::Player);
        let level = self.player.level.min(i32::MAX as u32 - 15) as i32;
        let damage = self.dice.roll(9 + level, 15 + level);
        self.enemy.take_damage(damage);
        self.animate(Cue::hit(Side::Enemy));
        self.status = Some(format!("You hit for {}.", damage));
        metrics::inc_hits();
        self.sync(Turn::Enemy);

        if self.enemy.is_defeated() {
            return self.handle_enemy_defeat(progress).await;
        }

        let enemy_result = self.enemy_turn();
        self.sync(Turn::Player);
        format!("You deal {}. {}", damage, enemy_result)
    }

    pub fn perform_block(&mut self) -> String {
        self.sync(Turn::Player);
        self.player.is_blocking = true;
        self.animate(Cue::block(Side::Player));
        self.status = Some("You brace for the next hit.".to_string());
        metrics::inc_blocks();
        self.sync(Turn::Enemy);

        let enemy_result = self.enemy_turn();
        self.sync(Turn::Player);
        format!("Block ready. {}", enemy_result)
    }

    fn enemy_turn(&mut self) -> String {
        let stage = self.player.stage.min(i32::MAX as u32 - 12) as i32;
        let base = self.dice.roll(6 + stage, 12 + stage);
        let damage = if self.player.is_blocking {
            (f64::from(base) * BLOCK_FACTOR).floor() as i32
        } else {
            base
        };
        self.player.is_blocking = false;
        self.player.take_damage(damage);

        if damage > 0 {
            self.animate(Cue::hit(Side::Player));
        } else {
            self.animate(Cue::block(Side::Player));
        }

        if self.player.is_defeated() {
            self.player.heal_full();
            self.status = Some("You were defeated. HP restored.".to_string());
            metrics::inc_player_defeats();
            debug!("player defeated at stage {}, restored", self.player.stage);
            self.sync(Turn::Player);
            return format!(
                "Enemy deals {}. You were defeated and restored to full HP.",
                damage
            );
        }

        self.status = Some(format!("Enemy dealt {}.", damage));
        format!("Enemy deals {}.", damage)
    }

    async fn handle_enemy_defeat(&mut self, progress: Option<&dyn ProgressSink>) -> String {
        self.player.set_stage(self.player.stage.saturating_add(1));
        if self.player.stage > self.player.level {
            self.player.increase_level(self.player.level + 1);
        }
        metrics::inc_enemies_defeated();
        info!(
            "enemy defeated: stage {} level {}",
            self.player.stage, self.player.level
        );

        let mut save_note = None;
        if let Some(sink) = progress {
            match sink.save_level(self.player.level).await {
                Ok(()) => self.last_save_failure = None,
                Err(e) => {
                    warn!("progress save failed: {}", e);
                    metrics::inc_save_failures();
                    self.last_save_failure = Some(e.clone());
                    save_note = Some(GameError::Persistence(e).to_string());
                }
            }
        }

        self.enemy = Enemy::spawn(self.player.stage);
        let mut status = format!("Enemy defeated. Stage {} begins.", self.player.stage);
        if let Some(note) = save_note {
            status.push(' ');
            status.push_str(&note);
        }
        self.status = Some(status);
        self.sync(Turn::Player);
        format!(
            "Enemy defeated. You advance to stage {}.",
            self.player.stage
        )
    }

    fn sync(&mut self, turn: Turn) {
        self.turn = turn;
        let snapshot = self.snapshot();
        self.presenter.render(&snapshot);
    }

    fn animate(&mut self, cue: Cue) {
        self.presenter.animate(cue);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::FailureKind;
    use crate::game::dice::ScriptedDice;
    use crate::game::presenter::{CueKind, RecordingPresenter};
    use std::sync::Mutex;

    fn engine(rolls: &[i32]) -> (CombatEngine, RecordingPresenter) {
        let rec = RecordingPresenter::new();
        let engine = CombatEngine::new(
            Player::default(),
            Box::new(ScriptedDice::new(rolls.iter().copied())),
            Box::new(rec.clone()),
        );
        (engine, rec)
    }

    struct FakeSink {
        fail: bool,
        saved: Mutex<Vec<u32>>,
    }

    impl FakeSink {
        fn new(fail: bool) -> Self {
            Self {
                fail,
                saved: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ProgressSink for FakeSink {
        async fn save_level(&self, level: u32) -> Result<(), AuthError> {
            self.saved.lock().unwrap().push(level);
            if self.fail {
                Err(AuthError::rejected(FailureKind::NotFound, "User not found."))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn hit_then_enemy_reply() {
        let (mut e, rec) = engine(&[12, 9]);
        let text = e.perform_hit(None).await;
        assert_eq!(text, "You deal 12. Enemy deals 9.");
        assert_eq!(e.enemy().hp, 49 - 12);
        assert_eq!(e.player().hp, 91);
        assert_eq!(e.turn(), Turn::Player);
        assert_eq!(
            rec.cues(),
            vec![Cue::hit(Side::Enemy), Cue::hit(Side::Player)]
        );
        assert_eq!(e.status(), Some("Enemy dealt 9."));
    }

    #[tokio::test]
    async fn player_damage_range_tracks_level() {
        let (mut e, _) = engine(&[0, 0, 1_000, 0]);
        e.perform_hit(None).await;
        // min roll at level 1 is 10
        assert_eq!(e.enemy().hp, 39);
        e.perform_hit(None).await;
        // max roll at level 1 is 16
        assert_eq!(e.enemy().hp, 23);
    }

    #[tokio::test]
    async fn block_reduces_once() {
        let (mut e, rec) = engine(&[10, 10]);
        let text = e.perform_block();
        assert_eq!(text, "Block ready. Enemy deals 3.");
        assert_eq!(e.player().hp, 97);
        assert!(!e.player().is_blocking);

        let text = e.perform_block();
        assert_eq!(text, "Block ready. Enemy deals 3.");

        // Unblocked turn takes the full roll.
        let (mut e2, _) = engine(&[10, 10, 10]);
        e2.perform_block();
        e2.perform_hit(None).await;
        assert_eq!(e2.player().hp, 100 - 3 - 10);
        assert!(rec.cues().iter().all(|c| c.side == Side::Player));
    }

    #[tokio::test]
    async fn pre_set_block_applies_to_next_enemy_turn() {
        let mut player = Player::default();
        player.is_blocking = true;
        let rec = RecordingPresenter::new();
        let mut e = CombatEngine::new(
            player,
            Box::new(ScriptedDice::new([10, 2])),
            Box::new(rec.clone()),
        );
        // Stage 1 enemy minimum is 7 -> floor(7 * 0.35) = 2, still a hit.
        e.perform_hit(None).await;
        assert_eq!(e.player().hp, 98);
        let last = *rec.cues().last().unwrap();
        assert_eq!(last.kind, CueKind::Hit);
    }

    #[tokio::test]
    async fn defeat_sequence_advances_stage_and_level() {
        let (mut e, rec) = engine(&[15, 7, 15, 7, 15, 7, 15]);
        for _ in 0..3 {
            e.perform_hit(None).await;
        }
        assert_eq!(e.enemy().hp, 4);
        let text = e.perform_hit(None).await;
        assert_eq!(text, "Enemy defeated. You advance to stage 2.");
        assert_eq!(e.player().stage, 2);
        assert_eq!(e.player().level, 2);
        assert_eq!(e.player().max_hp, 108);
        assert_eq!(e.enemy().max_hp, 63);
        assert_eq!(e.enemy().hp, 63);
        assert_eq!(e.enemy().name, "DUNGEON FOE 2");
        // The enemy did not answer the killing blow.
        assert_eq!(e.player().hp, 100 - 21);
        let last = rec.last_snapshot().unwrap();
        assert_eq!(last.turn, Turn::Player);
        assert_eq!(last.status.as_deref(), Some("Enemy defeated. Stage 2 begins."));
    }

    #[tokio::test]
    async fn no_level_up_when_level_is_ahead() {
        let mut player = Player::default();
        player.increase_level(5);
        player.heal_full();
        let mut e = CombatEngine::new(
            player,
            Box::new(ScriptedDice::new([1_000; 8])),
            Box::new(RecordingPresenter::new()),
        );
        // Stage 1 enemy has 49 HP, level 5 hits for up to 20.
        while e.player().stage == 1 {
            e.perform_hit(None).await;
        }
        assert_eq!(e.player().stage, 2);
        assert_eq!(e.player().level, 5);
    }

    #[tokio::test]
    async fn progress_is_saved_after_victory() {
        let (mut e, _) = engine(&[16, 7, 16, 7, 16, 7, 16]);
        let sink = FakeSink::new(false);
        for _ in 0..4 {
            e.perform_hit(Some(&sink)).await;
        }
        assert_eq!(*sink.saved.lock().unwrap(), vec![2]);
        assert!(e.last_save_failure().is_none());
    }

    #[tokio::test]
    async fn save_failure_keeps_local_progress() {
        let (mut e, rec) = engine(&[16, 7, 16, 7, 16, 7, 16]);
        let sink = FakeSink::new(true);
        let mut text = String::new();
        for _ in 0..4 {
            text = e.perform_hit(Some(&sink)).await;
        }
        assert_eq!(text, "Enemy defeated. You advance to stage 2.");
        assert_eq!(e.player().stage, 2);
        assert_eq!(e.player().level, 2);
        assert_eq!(e.enemy().max_hp, 63);
        assert_eq!(
            e.last_save_failure().and_then(|f| f.kind()),
            Some(FailureKind::NotFound)
        );
        let status = rec.last_snapshot().unwrap().status.unwrap();
        assert_eq!(
            status,
            "Enemy defeated. Stage 2 begins. Progress save failed: User not found."
        );
    }

    #[tokio::test]
    async fn player_defeat_is_a_soft_reset() {
        let mut player = Player::default();
        player.take_damage(95);
        let mut e = CombatEngine::new(
            player,
            Box::new(ScriptedDice::new([10, 13])),
            Box::new(RecordingPresenter::new()),
        );
        let text = e.perform_hit(None).await;
        assert_eq!(
            text,
            "You deal 10. Enemy deals 13. You were defeated and restored to full HP."
        );
        assert_eq!(e.player().hp, e.player().max_hp);
        assert_eq!(e.player().stage, 1);
        assert_eq!(e.enemy().hp, 39);
        assert_eq!(e.status(), Some("You were defeated. HP restored."));
    }

    #[test]
    fn load_progress_never_lowers() {
        let (mut e, _) = engine(&[]);
        e.load_progress(4, "Welcome back, alice.");
        assert_eq!(e.player().level, 4);
        assert_eq!(e.player().stage, 4);
        assert_eq!(e.player().hp, 124);
        assert_eq!(e.enemy().max_hp, 35 + 4 * 14);

        e.load_progress(2, "again");
        assert_eq!(e.player().level, 4);
        assert_eq!(e.player().stage, 4);
    }

    #[test]
    fn snapshot_percentages() {
        let (e, rec) = engine(&[]);
        let s = e.snapshot();
        assert_eq!(s.player_hp_pct, 100);
        assert_eq!(s.enemy_hp_pct, 100);
        assert_eq!(s.enemy_name, "DUNGEON FOE 1");
        assert_eq!(rec.snapshots().len(), 1);
    }
}
