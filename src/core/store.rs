//! The state handle shared by the startup controller and the front end.
//!
//! [`Store`] owns the decoded [`AppState`] together with the storage backend
//! it came from. Every mutator writes the structured state back before
//! returning, so readers never observe unsaved changes.

use crate::core::generation::GenerationConfig;
use crate::core::session::{create_session, ChatSession};
use crate::core::state::{AppState, Theme};
use crate::core::storage::{KeyValueStore, StoreError, APP_STATE_BACKUP_KEY, APP_STATE_KEY};
use tracing::{debug, warn};

pub struct Store<B: KeyValueStore> {
    backend: B,
    state: AppState,
}

impl<B: KeyValueStore> Store<B> {
    /// Load the structured state from `backend`.
    ///
    /// A missing entry yields the default state. An entry that does not
    /// decode in full is first copied to [`APP_STATE_BACKUP_KEY`], then
    /// salvaged field by field (see [`AppState::salvage`]) and written back,
    /// so the next open reads a clean payload. Startup reconciliation then
    /// restores the session invariants.
    pub fn open(mut backend: B) -> Result<Self, StoreError> {
        let Some(raw) = backend.get(APP_STATE_KEY)? else {
            debug!("no stored app state, starting from defaults");
            return Ok(Self {
                backend,
                state: AppState::default(),
            });
        };

        let err = match serde_json::from_str::<AppState>(&raw) {
            Ok(state) => return Ok(Self { backend, state }),
            Err(err) => err,
        };

        if backend.get(APP_STATE_BACKUP_KEY)?.as_deref() != Some(raw.as_str()) {
            backend.set(APP_STATE_BACKUP_KEY, &raw)?;
        }
        let state = match AppState::salvage(&raw) {
            Some(state) => {
                warn!(
                    error = %err,
                    sessions = state.sessions.len(),
                    backup = APP_STATE_BACKUP_KEY,
                    "stored app state is partly unreadable, keeping what decodes"
                );
                state
            }
            None => {
                warn!(
                    error = %err,
                    backup = APP_STATE_BACKUP_KEY,
                    "stored app state is unreadable, starting from defaults"
                );
                AppState::default()
            }
        };

        let mut store = Self { backend, state };
        store.persist()?;
        Ok(store)
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub(crate) fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Apply `mutator` to the state and persist the result.
    pub fn mutate<F, T>(&mut self, mutator: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut AppState) -> T,
    {
        let result = mutator(&mut self.state);
        self.persist()?;
        Ok(result)
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(&self.state).map_err(StoreError::Encode)?;
        self.backend.set(APP_STATE_KEY, &encoded)
    }

    pub fn sessions(&self) -> &[ChatSession] {
        &self.state.sessions
    }

    pub fn current_index(&self) -> i64 {
        self.state.current_index
    }

    pub fn current_session(&self) -> Option<&ChatSession> {
        self.state.current_session()
    }

    /// The provider credential, read fresh on every call. Request builders
    /// must not cache it: startup may replace it before the first request.
    pub fn credential(&self) -> Option<&str> {
        self.state.credential.as_deref()
    }

    pub fn theme(&self) -> Theme {
        self.state.theme
    }

    pub fn default_system_message(&self) -> &str {
        &self.state.default_system_message
    }

    pub fn default_generation_config(&self) -> &GenerationConfig {
        &self.state.default_generation_config
    }

    pub fn set_current_index(&mut self, index: i64) -> Result<(), StoreError> {
        self.mutate(|state| state.current_index = index)
    }

    pub fn set_credential(&mut self, credential: Option<String>) -> Result<(), StoreError> {
        self.mutate(|state| state.credential = credential)
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<(), StoreError> {
        self.mutate(|state| state.theme = theme)
    }

    pub fn set_default_system_message(&mut self, message: String) -> Result<(), StoreError> {
        self.mutate(|state| state.default_system_message = message)
    }

    pub fn set_default_generation_config(
        &mut self,
        config: GenerationConfig,
    ) -> Result<(), StoreError> {
        self.mutate(|state| state.default_generation_config = config)
    }

    /// Build a session from the current defaults without adding it.
    pub fn create_session(&self, title: Option<String>, folder: Option<String>) -> ChatSession {
        create_session(&self.state, title, folder)
    }

    /// Create a session, put it at the top of the list, and select it.
    pub fn start_new_session(
        &mut self,
        title: Option<String>,
        folder: Option<String>,
    ) -> Result<&ChatSession, StoreError> {
        let session = self.create_session(title, folder);
        debug!(id = %session.id, "starting new session");
        self.mutate(|state| {
            state.sessions.insert(0, session);
            state.current_index = 0;
        })?;
        Ok(&self.state.sessions[0])
    }

    /// Select the session at `index`; returns `false` if it does not exist.
    pub fn select_session(&mut self, index: usize) -> Result<bool, StoreError> {
        if index >= self.state.sessions.len() {
            return Ok(false);
        }
        let index = i64::try_from(index).unwrap_or(i64::MAX);
        self.set_current_index(index)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::ModelId;
    use crate::core::storage::MemoryStore;

    fn open_empty() -> Store<MemoryStore> {
        Store::open(MemoryStore::new()).expect("open memory store")
    }

    #[test]
    fn missing_state_opens_with_defaults() {
        let store = open_empty();
        assert_eq!(store.state(), &AppState::default());
        assert_eq!(store.backend().writes(), 0);
    }

    #[test]
    fn unreadable_state_falls_back_to_defaults() {
        let backend = MemoryStore::with_entries([(APP_STATE_KEY, "{not json")]);
        let store = Store::open(backend).expect("open");
        assert_eq!(store.state(), &AppState::default());
        assert_eq!(
            store.backend().get(APP_STATE_BACKUP_KEY).expect("get").as_deref(),
            Some("{not json")
        );
    }

    #[test]
    fn partly_unreadable_state_keeps_readable_fields() {
        let raw = r#"{"sessions":[{"id":"a","title":"kept","messages":[]}],
            "currentIndex":"first","credential":"sk-live","theme":"sepia"}"#;
        let backend = MemoryStore::with_entries([(APP_STATE_KEY, raw)]);
        let store = Store::open(backend).expect("open");

        assert_eq!(store.sessions().len(), 1);
        assert_eq!(store.sessions()[0].title, "kept");
        assert_eq!(store.current_index(), 0);
        assert_eq!(store.credential(), Some("sk-live"));
        assert_eq!(store.theme(), Theme::Dark);
        assert_eq!(
            store.backend().get(APP_STATE_BACKUP_KEY).expect("get").as_deref(),
            Some(raw)
        );

        let writes = store.backend().writes();
        let reopened = Store::open(store.into_backend()).expect("reopen");
        assert_eq!(reopened.backend().writes(), writes);
        assert_eq!(reopened.credential(), Some("sk-live"));
    }

    #[test]
    fn session_with_unreadable_settings_keeps_its_messages() {
        let raw = r#"{"sessions":[{"id":"a","title":"t",
            "messages":[{"role":"user","content":"hi"}],
            "config":{"temperature":"hot"}}]}"#;
        let store = Store::open(MemoryStore::with_entries([(APP_STATE_KEY, raw)])).expect("open");

        let session = &store.sessions()[0];
        assert_eq!(session.messages.len(), 1);
        assert_eq!(session.config, GenerationConfig::default());
    }

    #[test]
    fn mutators_persist_immediately() {
        let mut store = open_empty();
        store.set_theme(Theme::Light).expect("set theme");
        store
            .set_credential(Some("sk-live".to_string()))
            .expect("set credential");

        let reopened = Store::open(store.into_backend()).expect("reopen");
        assert_eq!(reopened.theme(), Theme::Light);
        assert_eq!(reopened.credential(), Some("sk-live"));
    }

    #[test]
    fn new_sessions_go_first_and_are_selected() {
        let mut store = open_empty();
        store
            .start_new_session(Some("first".to_string()), None)
            .expect("first");
        let id = store
            .start_new_session(Some("second".to_string()), Some("work".to_string()))
            .expect("second")
            .id
            .clone();

        assert_eq!(store.sessions().len(), 2);
        assert_eq!(store.current_index(), 0);
        assert_eq!(store.current_session().map(|s| s.id.as_str()), Some(id.as_str()));
        assert_eq!(store.sessions()[1].title, "first");
    }

    #[test]
    fn factory_reads_defaults_at_call_time() {
        let mut store = open_empty();
        let before = store.create_session(None, None);

        let mut config = store.default_generation_config().clone();
        config.model = ModelId::Gpt4;
        store
            .set_default_generation_config(config)
            .expect("set defaults");
        store
            .set_default_system_message(String::new())
            .expect("clear system message");

        let after = store.create_session(None, None);
        assert_eq!(before.config.model, ModelId::Gpt35Turbo);
        assert_eq!(before.messages.len(), 1);
        assert_eq!(after.config.model, ModelId::Gpt4);
        assert!(after.messages.is_empty());
    }

    #[test]
    fn select_rejects_out_of_range() {
        let mut store = open_empty();
        store.start_new_session(None, None).expect("new");
        store.start_new_session(None, None).expect("new");

        assert!(store.select_session(1).expect("select"));
        assert_eq!(store.current_index(), 1);
        assert!(!store.select_session(2).expect("select"));
        assert_eq!(store.current_index(), 1);
    }
}
