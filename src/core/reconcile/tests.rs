use super::*;
use crate::core::catalog::ModelId;
use crate::core::message::Role;
use crate::core::session::DEFAULT_TITLE;
use crate::core::state::AppState;
use crate::core::storage::{FileStore, MemoryStore, APP_STATE_BACKUP_KEY, APP_STATE_KEY};
use crate::utils::location::Location;
use std::fs;
use tempfile::TempDir;

/// Navigator double that records every replacement.
#[derive(Default)]
struct RecordingNavigator {
    location: Location,
    replacements: Vec<Location>,
}

impl RecordingNavigator {
    fn at(location: &str) -> Self {
        Self {
            location: Location::parse(location),
            replacements: Vec::new(),
        }
    }
}

impl Navigator for RecordingNavigator {
    fn location(&self) -> &Location {
        &self.location
    }

    fn replace(&mut self, location: Location) {
        self.replacements.push(location.clone());
        self.location = location;
    }
}

fn store_with(entries: &[(&str, &str)]) -> Store<MemoryStore> {
    let backend = MemoryStore::with_entries(entries.iter().copied());
    Store::open(backend).expect("open memory store")
}

fn structured_state(sessions: usize, current_index: i64) -> String {
    let mut state = AppState::default();
    for n in 0..sessions {
        let session = crate::core::session::create_session(&state, Some(format!("chat {n}")), None);
        state.sessions.push(session);
    }
    state.current_index = current_index;
    serde_json::to_string(&state).expect("encode state")
}

fn run(store: &mut Store<MemoryStore>) -> ReconcileOutcome {
    let mut navigator = RecordingNavigator::default();
    reconcile(store, &mut navigator).expect("reconcile")
}

#[test]
fn valid_store_is_left_untouched() {
    let encoded = structured_state(2, 1);
    let mut store = store_with(&[(APP_STATE_KEY, encoded.as_str())]);
    let before = store.backend().entries().clone();

    assert_eq!(run(&mut store), ReconcileOutcome::Ready { changed: false });
    assert_eq!(store.backend().entries(), &before);
    assert_eq!(store.backend().writes(), 0);
}

#[test]
fn second_run_after_repair_is_a_no_op() {
    let mut store = store_with(&[("chats", "not-json"), ("theme", "light")]);
    assert_eq!(run(&mut store), ReconcileOutcome::Ready { changed: true });

    let snapshot = store.backend().entries().clone();
    let writes = store.backend().writes();
    let mut reopened = Store::open(store.into_backend()).expect("reopen");

    assert_eq!(run(&mut reopened), ReconcileOutcome::Ready { changed: false });
    assert_eq!(reopened.backend().entries(), &snapshot);
    assert_eq!(reopened.backend().writes(), writes);
}

#[test]
fn empty_legacy_list_becomes_one_default_session() {
    let mut store = store_with(&[("chats", "[]")]);

    assert_eq!(run(&mut store), ReconcileOutcome::Ready { changed: true });
    assert_eq!(store.sessions().len(), 1);
    assert_eq!(store.current_index(), 0);
    assert_eq!(store.sessions()[0].title, DEFAULT_TITLE);
    assert!(!store.backend().contains(LEGACY_SESSIONS_KEY));
}

#[test]
fn malformed_legacy_list_is_replaced_without_error() {
    let mut store = store_with(&[("chats", "not-json")]);

    assert_eq!(run(&mut store), ReconcileOutcome::Ready { changed: true });
    assert_eq!(store.sessions().len(), 1);
    assert_eq!(store.current_index(), 0);
    assert!(!store.backend().contains(LEGACY_SESSIONS_KEY));
}

#[test]
fn malformed_legacy_list_uses_current_defaults() {
    let mut store = store_with(&[]);
    store
        .set_default_system_message("Be terse.".to_string())
        .expect("set system message");
    store
        .backend_mut()
        .set(LEGACY_SESSIONS_KEY, "{\"oops\":")
        .expect("seed legacy");

    let _ = run(&mut store);
    let session = &store.sessions()[0];
    assert_eq!(session.messages.len(), 1);
    assert_eq!(session.messages[0].role, Role::System);
    assert_eq!(session.messages[0].content, "Be terse.");
}

#[test]
fn legacy_sessions_replace_structured_ones_in_order() {
    let legacy = r#"[
        {"id":"a","title":"First","titleSet":true,"messages":[{"role":"user","content":"hi"}],
         "config":{"model":"gpt-4","max_tokens":2000,"temperature":0.7,"presence_penalty":0,"top_p":1,"frequency_penalty":0}},
        {"id":"b","title":"Second","titleSet":false,"messages":[],
         "config":{"model":"gpt-4-o","max_tokens":4000,"temperature":1,"presence_penalty":0,"top_p":1,"frequency_penalty":0},
         "folder":"work"}
    ]"#;
    let encoded = structured_state(3, 2);
    let mut store = store_with(&[(APP_STATE_KEY, encoded.as_str()), ("chats", legacy)]);

    assert_eq!(run(&mut store), ReconcileOutcome::Ready { changed: true });
    let ids: Vec<&str> = store.sessions().iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, ["a", "b"]);
    assert_eq!(store.current_index(), 0);
    assert!(store.sessions()[0].title_set);
    assert_eq!(store.sessions()[0].config.model, ModelId::Gpt4);
    assert_eq!(store.sessions()[1].config.model, ModelId::Gpt4o);
    assert_eq!(store.sessions()[1].folder.as_deref(), Some("work"));
    assert!(!store.backend().contains(LEGACY_SESSIONS_KEY));
}

#[test]
fn legacy_session_with_retired_model_falls_back() {
    let legacy = r#"[{"id":"x","title":"Old","messages":[],"config":{"model":"gpt-4-0314","max_tokens":1000}}]"#;
    let mut store = store_with(&[("chats", legacy)]);

    let _ = run(&mut store);
    assert_eq!(store.sessions().len(), 1);
    assert_eq!(store.sessions()[0].id, "x");
    assert_eq!(store.sessions()[0].config.model, ModelId::default());
    assert_eq!(store.sessions()[0].config.max_tokens, 1000);
}

#[test]
fn legacy_credential_and_theme_are_migrated_independently() {
    let encoded = structured_state(1, 0);
    let mut store = store_with(&[
        (APP_STATE_KEY, encoded.as_str()),
        ("apiKey", "sk-legacy"),
        ("theme", "light"),
    ]);

    assert_eq!(run(&mut store), ReconcileOutcome::Ready { changed: true });
    assert_eq!(store.credential(), Some("sk-legacy"));
    assert_eq!(store.theme(), Theme::Light);
    assert_eq!(store.sessions().len(), 1);
    assert!(!store.backend().contains(LEGACY_CREDENTIAL_KEY));
    assert!(!store.backend().contains(LEGACY_THEME_KEY));
}

#[test]
fn unknown_legacy_theme_is_dropped() {
    let mut store = store_with(&[("theme", "solarized")]);

    let _ = run(&mut store);
    assert_eq!(store.theme(), Theme::Dark);
    assert!(!store.backend().contains(LEGACY_THEME_KEY));
}

#[test]
fn empty_legacy_session_text_routes_to_validation() {
    let encoded = structured_state(2, 1);
    let mut store = store_with(&[(APP_STATE_KEY, encoded.as_str()), ("chats", "")]);

    assert_eq!(run(&mut store), ReconcileOutcome::Ready { changed: true });
    assert_eq!(store.sessions().len(), 2);
    assert_eq!(store.current_index(), 1);
    assert!(!store.backend().contains(LEGACY_SESSIONS_KEY));
}

#[test]
fn whitespace_legacy_session_text_is_malformed() {
    let encoded = structured_state(2, 1);
    let mut store = store_with(&[(APP_STATE_KEY, encoded.as_str()), ("chats", "   ")]);

    assert!(matches!(
        LegacySessions::parse("   "),
        LegacySessions::Malformed(_)
    ));
    assert_eq!(run(&mut store), ReconcileOutcome::Ready { changed: true });
    assert_eq!(store.sessions().len(), 1);
    assert_eq!(store.sessions()[0].title, DEFAULT_TITLE);
    assert_eq!(store.current_index(), 0);
    assert!(!store.backend().contains(LEGACY_SESSIONS_KEY));
}

/// Structured state with one field of the encoded JSON rewritten.
fn corrupted_state(sessions: usize, corrupt: impl FnOnce(&mut serde_json::Value)) -> String {
    let mut value: serde_json::Value =
        serde_json::from_str(&structured_state(sessions, 1)).expect("decode state");
    corrupt(&mut value);
    value.to_string()
}

#[test]
fn null_index_keeps_sessions_and_resets_to_first() {
    let encoded = corrupted_state(3, |value| value["currentIndex"] = serde_json::Value::Null);
    let mut store = store_with(&[(APP_STATE_KEY, encoded.as_str())]);

    assert_eq!(run(&mut store), ReconcileOutcome::Ready { changed: false });
    let titles: Vec<_> = store.sessions().iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, ["chat 0", "chat 1", "chat 2"]);
    assert_eq!(store.current_index(), 0);
    assert_eq!(
        store.backend().get(APP_STATE_BACKUP_KEY).expect("get"),
        Some(encoded)
    );
}

#[test]
fn unknown_message_role_only_drops_that_message() {
    let encoded = corrupted_state(3, |value| {
        value["sessions"][1]["messages"][0]["role"] = serde_json::Value::from("tool")
    });
    let mut store = store_with(&[(APP_STATE_KEY, encoded.as_str())]);

    assert_eq!(run(&mut store), ReconcileOutcome::Ready { changed: false });
    let titles: Vec<_> = store.sessions().iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, ["chat 0", "chat 1", "chat 2"]);
    assert_eq!(store.current_index(), 1);
    assert!(store.sessions()[1].messages.is_empty());
    assert_eq!(store.sessions()[0].messages.len(), 1);

    let reopened = Store::open(store.into_backend()).expect("reopen");
    assert_eq!(reopened.sessions().len(), 3);
}

#[test]
fn unreadable_session_is_skipped_alone() {
    let encoded = corrupted_state(3, |value| value["sessions"][2] = serde_json::Value::from(7));
    let mut store = store_with(&[(APP_STATE_KEY, encoded.as_str())]);

    assert_eq!(run(&mut store), ReconcileOutcome::Ready { changed: false });
    let titles: Vec<_> = store.sessions().iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, ["chat 0", "chat 1"]);
    assert_eq!(store.current_index(), 1);
}

#[test]
fn out_of_range_index_is_clamped() {
    let encoded = structured_state(2, 7);
    let mut store = store_with(&[(APP_STATE_KEY, encoded.as_str())]);

    assert_eq!(run(&mut store), ReconcileOutcome::Ready { changed: true });
    assert_eq!(store.current_index(), 0);
    assert_eq!(store.sessions().len(), 2);
}

#[test]
fn negative_index_is_clamped() {
    let encoded = structured_state(1, -1);
    let mut store = store_with(&[(APP_STATE_KEY, encoded.as_str())]);

    let _ = run(&mut store);
    assert_eq!(store.current_index(), 0);
}

#[test]
fn empty_structured_state_gets_a_session() {
    let encoded = structured_state(0, 4);
    let mut store = store_with(&[(APP_STATE_KEY, encoded.as_str())]);

    assert_eq!(run(&mut store), ReconcileOutcome::Ready { changed: true });
    assert_eq!(store.sessions().len(), 1);
    assert_eq!(store.current_index(), 0);
}

#[test]
fn fresh_install_gets_a_session() {
    let mut store = store_with(&[]);

    assert_eq!(run(&mut store), ReconcileOutcome::Ready { changed: true });
    assert_eq!(store.sessions().len(), 1);
    assert!(store.backend().contains(APP_STATE_KEY));
}

#[test]
fn location_credential_overrides_and_requests_restart() {
    let encoded = serde_json::to_string(&AppState {
        credential: Some("old".to_string()),
        ..AppState::default()
    })
    .expect("encode");
    let mut store = store_with(&[(APP_STATE_KEY, encoded.as_str()), ("chats", "[]")]);
    let mut navigator = RecordingNavigator::at("chatdeck://chat?apiKey=abc123&lang=en");

    let outcome = reconcile(&mut store, &mut navigator).expect("reconcile");

    assert_eq!(outcome, ReconcileOutcome::Restart);
    assert_eq!(store.credential(), Some("abc123"));
    assert_eq!(navigator.replacements.len(), 1);
    assert_eq!(navigator.location().query_param(CREDENTIAL_PARAM), None);
    assert_eq!(navigator.location().to_string(), "chatdeck://chat?lang=en");
    // The rest of the pass did not run.
    assert!(store.backend().contains(LEGACY_SESSIONS_KEY));
    assert!(store.sessions().is_empty());
}

#[test]
fn restarted_pass_completes_without_another_restart() {
    let mut navigator = RecordingNavigator::at("chatdeck://chat?apiKey=abc123");
    let mut store = store_with(&[("chats", "[]"), ("apiKey", "stale")]);

    assert_eq!(
        reconcile(&mut store, &mut navigator).expect("first pass"),
        ReconcileOutcome::Restart
    );

    let mut store = Store::open(store.into_backend()).expect("reopen");
    assert_eq!(
        reconcile(&mut store, &mut navigator).expect("second pass"),
        ReconcileOutcome::Ready { changed: true }
    );
    assert_eq!(navigator.replacements.len(), 1);
    assert_eq!(store.credential(), Some("abc123"));
    assert_eq!(store.sessions().len(), 1);
    assert!(!store.backend().contains(LEGACY_SESSIONS_KEY));
    assert!(!store.backend().contains(LEGACY_CREDENTIAL_KEY));
}

#[test]
fn empty_location_credential_is_ignored() {
    let encoded = structured_state(1, 0);
    let mut store = store_with(&[(APP_STATE_KEY, encoded.as_str())]);
    let mut navigator = RecordingNavigator::at("chatdeck://chat?apiKey=");

    assert_eq!(
        reconcile(&mut store, &mut navigator).expect("reconcile"),
        ReconcileOutcome::Ready { changed: false }
    );
    assert!(navigator.replacements.is_empty());
    assert_eq!(store.credential(), None);
}

#[test]
fn legacy_sessions_parse_result_is_explicit() {
    assert!(matches!(LegacySessions::parse("[]"), LegacySessions::Parsed(ref s) if s.is_empty()));
    assert!(matches!(
        LegacySessions::parse("not-json"),
        LegacySessions::Malformed(_)
    ));
    assert!(matches!(
        LegacySessions::parse(r#"{"title":"not a list"}"#),
        LegacySessions::Malformed(_)
    ));
}

#[test]
fn file_backed_store_is_byte_identical_after_idempotent_run() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = temp_dir.path().join("store.toml");

    let backend = FileStore::open(&path).expect("open");
    let mut store = Store::open(backend).expect("store");
    store
        .backend_mut()
        .set(LEGACY_SESSIONS_KEY, "[]")
        .expect("seed legacy");
    let mut navigator = RecordingNavigator::default();
    let _ = reconcile(&mut store, &mut navigator).expect("first run");

    let before = fs::read(&path).expect("read store");
    let mut store = Store::open(FileStore::open(&path).expect("reopen")).expect("store");
    assert_eq!(
        reconcile(&mut store, &mut navigator).expect("second run"),
        ReconcileOutcome::Ready { changed: false }
    );
    assert_eq!(fs::read(&path).expect("read store"), before);
}
