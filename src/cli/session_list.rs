//! Session listing functionality

use crate::core::storage::KeyValueStore;
use crate::core::store::Store;

pub fn list_sessions<B: KeyValueStore>(store: &Store<B>) {
    println!("💬 Chat Sessions");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();

    if store.sessions().is_empty() {
        println!("No sessions stored.");
        return;
    }

    let current = usize::try_from(store.current_index()).ok();
    for (index, session) in store.sessions().iter().enumerate() {
        let marker = if Some(index) == current { "*" } else { " " };
        println!("{marker} {}. {}", index + 1, session.title);
        if let Some(folder) = &session.folder {
            println!("    Folder: {folder}");
        }
        println!(
            "    Messages: {} · Model: {}",
            session.messages.len(),
            session.config.model
        );
    }
    println!();
    println!("* = current session");
}
