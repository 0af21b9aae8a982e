//! Process-wide combat and session counters.
//! Read by the `play` command on exit and by tests; nothing is exported over the network.
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};

static HITS: AtomicU64 = AtomicU64::new(0);
static BLOCKS: AtomicU64 = AtomicU64::new(0);
static ENEMIES_DEFEATED: AtomicU64 = AtomicU64::new(0);
static PLAYER_DEFEATS: AtomicU64 = AtomicU64::new(0);
static SAVE_FAILURES: AtomicU64 = AtomicU64::new(0);

static SESSIONS: OnceLock<Mutex<SessionCounter>> = OnceLock::new();

pub fn inc_hits() {
    HITS.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_blocks() {
    BLOCKS.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_enemies_defeated() {
    ENEMIES_DEFEATED.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_player_defeats() {
    PLAYER_DEFEATS.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_save_failures() {
    SAVE_FAILURES.fetch_add(1, Ordering::Relaxed);
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionCounter {
    pub entries: u64,
    pub exits: u64,
    pub currently_active: u64,
    pub concurrent_peak: u64,
}

fn session_lock() -> std::sync::MutexGuard<'static, SessionCounter> {
    SESSIONS
        .get_or_init(|| Mutex::new(SessionCounter::default()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub fn record_session_entry() -> SessionCounter {
    let mut counter = session_lock();
    counter.entries = counter.entries.saturating_add(1);
    counter.currently_active = counter.currently_active.saturating_add(1);
    if counter.currently_active > counter.concurrent_peak {
        counter.concurrent_peak = counter.currently_active;
    }
    *counter
}

pub fn record_session_exit() -> SessionCounter {
    let mut counter = session_lock();
    counter.exits = counter.exits.saturating_add(1);
    if counter.currently_active > 0 {
        counter.currently_active -= 1;
    }
    *counter
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub hits: u64,
    pub blocks: u64,
    pub enemies_defeated: u64,
    pub player_defeats: u64,
    pub save_failures: u64,
    pub sessions: SessionCounter,
}

pub fn snapshot() -> Snapshot {
    Snapshot {
        hits: HITS.load(Ordering::Relaxed),
        blocks: BLOCKS.load(Ordering::Relaxed),
        enemies_defeated: ENEMIES_DEFEATED.load(Ordering::Relaxed),
        player_defeats: PLAYER_DEFEATS.load(Ordering::Relaxed),
        save_failures: SAVE_FAILURES.load(Ordering::Relaxed),
        sessions: *session_lock(),
    }
}

impl Snapshot {
    /// One-line summary for the exit log.
    pub fn summary(&self) -> String {
        format!(
            "hits={} blocks={} enemies_defeated={} player_defeats={} save_failures={}",
            self.hits, self.blocks, self.enemies_defeated, self.player_defeats, self.save_failures
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Counters are global and tests run in parallel, so only deltas are checked.
    #[test]
    fn counters_only_grow() {
        let before = snapshot();
        inc_hits();
        inc_blocks();
        inc_save_failures();
        let after = snapshot();
        assert!(after.hits > before.hits);
        assert!(after.blocks > before.blocks);
        assert!(after.save_failures > before.save_failures);
        assert!(after.summary().starts_with("hits="));
    }

    #[test]
    fn session_entry_exit_tracks_peak() {
        let entry = record_session_entry();
        assert!(entry.currently_active >= 1);
        assert!(entry.concurrent_peak >= entry.currently_active);
        let exit = record_session_exit();
        assert!(exit.exits >= 1);
        assert!(exit.concurrent_peak >= 1);
    }
}
