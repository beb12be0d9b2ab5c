//! Startup state reconciliation
//!
//! Before anything reads the stored state, [`reconcile`] merges the three
//! places state can come from into one valid [`AppState`]:
//!
//! 1. a credential passed in the launch location (`?apiKey=...`), which wins
//!    over everything and ends the pass with [`ReconcileOutcome::Restart`];
//! 2. entries left behind by the legacy flat layout (`chats`, `apiKey`,
//!    `theme`), which are migrated once and then deleted;
//! 3. the structured state itself, whose session list and index are repaired
//!    when they violate the startup invariants.
//!
//! Running it again on an already-valid store changes nothing.
//!
//! [`AppState`]: crate::core::state::AppState

use crate::core::navigation::Navigator;
use crate::core::session::ChatSession;
use crate::core::state::Theme;
use crate::core::storage::{
    KeyValueStore, StoreError, LEGACY_CREDENTIAL_KEY, LEGACY_SESSIONS_KEY, LEGACY_THEME_KEY,
};
use crate::core::store::Store;
use tracing::{debug, info, warn};

/// Query parameter carrying a credential in the launch location.
pub const CREDENTIAL_PARAM: &str = "apiKey";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum ReconcileOutcome {
    /// A credential was applied from the launch location. Everything that may
    /// hold the previous credential must be rebuilt, so the caller restarts
    /// startup from the beginning (re-opening the store and reconciling
    /// again). Nothing else was reconciled in this pass.
    Restart,
    /// The state is consistent and ready to be read.
    Ready { changed: bool },
}

/// Result of decoding the legacy `chats` entry.
#[derive(Debug)]
pub enum LegacySessions {
    Parsed(Vec<ChatSession>),
    Malformed(serde_json::Error),
}

impl LegacySessions {
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str::<Vec<ChatSession>>(raw) {
            Ok(sessions) => LegacySessions::Parsed(sessions),
            Err(err) => LegacySessions::Malformed(err),
        }
    }
}

/// Run startup reconciliation once.
///
/// Only storage failures are returned; malformed legacy data and invalid
/// indexes are repaired in place.
pub fn reconcile<B, N>(
    store: &mut Store<B>,
    navigator: &mut N,
) -> Result<ReconcileOutcome, StoreError>
where
    B: KeyValueStore,
    N: Navigator,
{
    if apply_location_credential(store, navigator)? {
        return Ok(ReconcileOutcome::Restart);
    }

    let mut changed = migrate_legacy_settings(store)?;
    changed |= match store.backend().get(LEGACY_SESSIONS_KEY)? {
        // Only the empty string counts as no legacy data; whitespace is
        // parsed and fails like any other malformed payload.
        Some(raw) if !raw.is_empty() => {
            migrate_legacy_sessions(store, &raw)?;
            store.backend_mut().remove(LEGACY_SESSIONS_KEY)?;
            true
        }
        Some(_) => {
            debug!("dropping empty legacy session entry");
            store.backend_mut().remove(LEGACY_SESSIONS_KEY)?;
            repair_sessions(store)?;
            true
        }
        None => repair_sessions(store)?,
    };

    if changed {
        info!(
            sessions = store.sessions().len(),
            current = store.current_index(),
            "reconciled stored state"
        );
    }
    Ok(ReconcileOutcome::Ready { changed })
}

fn apply_location_credential<B, N>(
    store: &mut Store<B>,
    navigator: &mut N,
) -> Result<bool, StoreError>
where
    B: KeyValueStore,
    N: Navigator,
{
    let credential = match navigator.location().query_param(CREDENTIAL_PARAM) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => return Ok(false),
    };

    store.set_credential(Some(credential))?;
    // A stale legacy credential would otherwise overwrite this one on the
    // next pass.
    store.backend_mut().remove(LEGACY_CREDENTIAL_KEY)?;

    let stripped = navigator.location().without_query_param(CREDENTIAL_PARAM);
    navigator.replace(stripped);
    info!("applied credential from launch location, restart required");
    Ok(true)
}

fn migrate_legacy_settings<B: KeyValueStore>(store: &mut Store<B>) -> Result<bool, StoreError> {
    let mut changed = false;

    if let Some(credential) = store.backend().get(LEGACY_CREDENTIAL_KEY)? {
        if !credential.is_empty() {
            info!("migrating legacy credential");
            store.set_credential(Some(credential))?;
        }
        store.backend_mut().remove(LEGACY_CREDENTIAL_KEY)?;
        changed = true;
    }

    if let Some(raw) = store.backend().get(LEGACY_THEME_KEY)? {
        match raw.parse::<Theme>() {
            Ok(theme) => {
                info!(%theme, "migrating legacy theme");
                store.set_theme(theme)?;
            }
            Err(err) => warn!(error = %err, "ignoring legacy theme"),
        }
        store.backend_mut().remove(LEGACY_THEME_KEY)?;
        changed = true;
    }

    Ok(changed)
}

fn migrate_legacy_sessions<B: KeyValueStore>(
    store: &mut Store<B>,
    raw: &str,
) -> Result<(), StoreError> {
    let sessions = match LegacySessions::parse(raw) {
        LegacySessions::Parsed(sessions) if !sessions.is_empty() => {
            info!(count = sessions.len(), "migrating legacy sessions");
            sessions
        }
        LegacySessions::Parsed(_) => {
            info!("legacy session list is empty, starting with a new session");
            vec![store.create_session(None, None)]
        }
        LegacySessions::Malformed(err) => {
            warn!(error = %err, "legacy sessions are unreadable, starting with a new session");
            vec![store.create_session(None, None)]
        }
    };

    store.mutate(|state| {
        state.sessions = sessions;
        state.current_index = 0;
    })
}

fn repair_sessions<B: KeyValueStore>(store: &mut Store<B>) -> Result<bool, StoreError> {
    let mut changed = false;

    if store.sessions().is_empty() {
        let session = store.create_session(None, None);
        debug!(id = %session.id, "no sessions stored, creating one");
        store.mutate(|state| {
            state.sessions = vec![session];
            state.current_index = 0;
        })?;
        changed = true;
    }

    if !store.state().index_in_range() {
        debug!(index = store.current_index(), "resetting out-of-range session index");
        store.set_current_index(0)?;
        changed = true;
    }

    Ok(changed)
}

#[cfg(test)]
mod tests;
