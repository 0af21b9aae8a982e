//! Test utilities & fixtures.
//! Stores live in temp dirs with the cheapest Argon2 parameters so hashing stays fast.

use std::sync::Arc;

use argon2::Params;
use dungeon_fighter::auth::LocalAuth;
use dungeon_fighter::game::{CombatEngine, GameSession, Player, RecordingPresenter, ScriptedDice};
use dungeon_fighter::storage::AccountStore;

/// Account store rooted at `<tmp>/data`.
pub async fn fast_store(tmp: &tempfile::TempDir) -> AccountStore {
    let datadir = tmp.path().join("data");
    let params = Params::new(8, 1, 1, None).unwrap();
    AccountStore::new_with_params(datadir.to_str().unwrap(), Some(params))
        .await
        .unwrap()
}

pub async fn local_auth(tmp: &tempfile::TempDir) -> Arc<LocalAuth> {
    Arc::new(LocalAuth::new(fast_store(tmp).await))
}

/// Session with scripted dice and a recording presenter over the given backend.
#[allow(dead_code)] // Not every test binary drives a full session.
pub fn scripted_session(
    auth: Arc<LocalAuth>,
    rolls: &[i32],
) -> (GameSession, RecordingPresenter) {
    let recorder = RecordingPresenter::new();
    let engine = CombatEngine::new(
        Player::default(),
        Box::new(ScriptedDice::new(rolls.iter().copied())),
        Box::new(recorder.clone()),
    );
    (GameSession::new(engine, auth), recorder)
}
