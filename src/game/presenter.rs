//! Presentation port: the engine pushes snapshots and animation cues here and never reads back.
//!
//! Presenters are sinks. Their methods return nothing, and implementations swallow their own
//! I/O failures so rendering can never interrupt a combat turn.

use std::io::Write;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Turn {
    Player,
    Enemy,
}

impl Turn {
    pub fn label(self) -> &'static str {
        match self {
            Turn::Player => "PLAYER",
            Turn::Enemy => "ENEMY",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Player,
    Enemy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CueKind {
    Hit,
    Block,
}

/// Discrete animation cue for one side of the fight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cue {
    pub kind: CueKind,
    pub side: Side,
}

impl Cue {
    pub fn hit(side: Side) -> Self {
        Cue { kind: CueKind::Hit, side }
    }

    pub fn block(side: Side) -> Self {
        Cue { kind: CueKind::Block, side }
    }
}

/// Everything a renderer needs after a state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Player HP as a percentage of max, 0..=100.
    pub player_hp_pct: u8,
    /// Enemy HP as a percentage of max, 0..=100.
    pub enemy_hp_pct: u8,
    pub player_level: u32,
    pub enemy_name: String,
    pub turn: Turn,
    pub status: Option<String>,
}

/// `hp / max * 100`, clamped to 0..=100; a non-positive max gives 0.
pub fn hp_ratio(hp: i32, max: i32) -> u8 {
    if max <= 0 {
        return 0;
    }
    let pct = (i64::from(hp) * 100) / i64::from(max);
    pct.clamp(0, 100) as u8
}

pub trait Presenter: Send {
    fn render(&mut self, snapshot: &Snapshot);
    fn animate(&mut self, cue: Cue);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn render(&mut self, _snapshot: &Snapshot) {}
    fn animate(&mut self, _cue: Cue) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenterEvent {
    Render(Snapshot),
    Animate(Cue),
}

/// Keeps every event in a shared log. Clones share the same log, so a handle can be kept
/// after the presenter is moved into an engine.
#[derive(Debug, Default, Clone)]
pub struct RecordingPresenter {
    events: Arc<Mutex<Vec<PresenterEvent>>>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PresenterEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn snapshots(&self) -> Vec<Snapshot> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                PresenterEvent::Render(s) => Some(s),
                PresenterEvent::Animate(_) => None,
            })
            .collect()
    }

    pub fn cues(&self) -> Vec<Cue> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                PresenterEvent::Animate(c) => Some(c),
                PresenterEvent::Render(_) => None,
            })
            .collect()
    }

    pub fn last_snapshot(&self) -> Option<Snapshot> {
        self.snapshots().pop()
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }

    fn push(&self, event: PresenterEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}

impl Presenter for RecordingPresenter {
    fn render(&mut self, snapshot: &Snapshot) {
        self.push(PresenterEvent::Render(snapshot.clone()));
    }

    fn animate(&mut self, cue: Cue) {
        self.push(PresenterEvent::Animate(cue));
    }
}

const BAR_WIDTH: usize = 10;

fn bar(pct: u8) -> String {
    let filled = (usize::from(pct) * BAR_WIDTH + 50) / 100;
    let filled = filled.min(BAR_WIDTH);
    format!("[{}{}]", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

fn marker(cues: &[Cue], side: Side) -> &'static str {
    match cues.iter().rev().find(|c| c.side == side).map(|c| c.kind) {
        Some(CueKind::Hit) => " *hit*",
        Some(CueKind::Block) => " *block*",
        None => "",
    }
}

/// One-line ASCII HUD for a snapshot, with markers for the cues since the last line.
pub fn hud_line(snapshot: &Snapshot, cues: &[Cue]) -> String {
    format!(
        "[LVL {}] YOU {} {}%{} | {} {} {}%{} | TURN: {}",
        snapshot.player_level,
        bar(snapshot.player_hp_pct),
        snapshot.player_hp_pct,
        marker(cues, Side::Player),
        snapshot.enemy_name,
        bar(snapshot.enemy_hp_pct),
        snapshot.enemy_hp_pct,
        marker(cues, Side::Enemy),
        snapshot.turn.label(),
    )
}

/// Terminal HUD. Prints at the end of each round (player-turn snapshots) and skips repeats.
pub struct HudPresenter {
    out: Box<dyn Write + Send>,
    pending_cues: Vec<Cue>,
    last_printed: Option<Snapshot>,
}

impl HudPresenter {
    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out,
            pending_cues: Vec::new(),
            last_printed: None,
        }
    }
}

impl Presenter for HudPresenter {
    fn render(&mut self, snapshot: &Snapshot) {
        if snapshot.turn != Turn::Player {
            return;
        }
        if self.pending_cues.is_empty() && self.last_printed.as_ref() == Some(snapshot) {
            return;
        }
        let mut text = hud_line(snapshot, &self.pending_cues);
        if let Some(status) = &snapshot.status {
            text.push_str("\n  ");
            text.push_str(status);
        }
        self.pending_cues.clear();
        if writeln!(self.out, "{}", text).is_err() {
            log::trace!("hud write failed");
        }
        let _ = self.out.flush();
        self.last_printed = Some(snapshot.clone());
    }

    fn animate(&mut self, cue: Cue) {
        self.pending_cues.push(cue);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(p: u8, e: u8, turn: Turn) -> Snapshot {
        Snapshot {
            player_hp_pct: p,
            enemy_hp_pct: e,
            player_level: 2,
            enemy_name: "DUNGEON FOE 2".into(),
            turn,
            status: None,
        }
    }

    #[test]
    fn ratio_is_clamped() {
        assert_eq!(hp_ratio(50, 100), 50);
        assert_eq!(hp_ratio(49, 49), 100);
        assert_eq!(hp_ratio(0, 49), 0);
        assert_eq!(hp_ratio(-5, 49), 0);
        assert_eq!(hp_ratio(500, 49), 100);
        assert_eq!(hp_ratio(10, 0), 0);
    }

    #[test]
    fn hud_line_layout() {
        let line = hud_line(&snap(50, 100, Turn::Player), &[Cue::hit(Side::Enemy)]);
        assert_eq!(
            line,
            "[LVL 2] YOU [#####.....] 50% | DUNGEON FOE 2 [##########] 100% *hit* | TURN: PLAYER"
        );
        let line = hud_line(&snap(0, 3, Turn::Enemy), &[Cue::block(Side::Player)]);
        assert!(line.starts_with("[LVL 2] YOU [..........] 0% *block*"));
        assert!(line.ends_with("TURN: ENEMY"));
    }

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn hud_presenter_prints_player_turns_once() {
        let buf = SharedBuf::default();
        let mut hud = HudPresenter::new(Box::new(buf.clone()));
        hud.render(&snap(100, 100, Turn::Player));
        hud.animate(Cue::hit(Side::Enemy));
        hud.render(&snap(100, 80, Turn::Enemy));
        hud.render(&snap(90, 80, Turn::Player));
        hud.render(&snap(90, 80, Turn::Player));

        let text = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("80% *hit*"));
    }

    #[test]
    fn recording_presenter_shares_log_between_clones() {
        let rec = RecordingPresenter::new();
        let mut moved = rec.clone();
        moved.animate(Cue::block(Side::Player));
        moved.render(&snap(1, 2, Turn::Player));
        assert_eq!(rec.cues(), vec![Cue::block(Side::Player)]);
        assert_eq!(rec.last_snapshot().unwrap().enemy_hp_pct, 2);
        rec.clear();
        assert!(rec.events().is_empty());
    }
}
