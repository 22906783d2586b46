//! Show sync status.

use std::time::{SystemTime, UNIX_EPOCH};
use sync_store::PersistentStore;
use sync_types::{SyncKind, SyncStatus};

/// Run the status command.
pub fn run(store: &PersistentStore) {
    println!("=== portal-sync status ===");

    for kind in SyncKind::ALL {
        println!();
        println!("{}:", capitalize(kind.storage_key()));

        let status: Option<SyncStatus> = store.get(kind.status_key(), None);
        let Some(status) = status else {
            println!("  Status: NEVER SYNCED");
            continue;
        };

        let now = now_ms();
        println!("  Items:        {}", status.item_count);
        println!("  Last attempt: {}", format_age(now, status.last_attempt_ms));
        match status.last_success_ms {
            Some(ts) => println!("  Last success: {}", format_age(now, ts)),
            None => println!("  Last success: never"),
        }
        if let Some(error) = &status.last_error {
            println!("  Last error:   {}", error);
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Format a Unix millisecond timestamp relative to `now`.
fn format_age(now: u64, ts: u64) -> String {
    let diff = now.saturating_sub(ts) / 1000;

    if diff < 60 {
        "just now".to_string()
    } else if diff < 3600 {
        format!("{} minutes ago", diff / 60)
    } else if diff < 86400 {
        format!("{} hours ago", diff / 3600)
    } else {
        format!("{} days ago", diff / 86400)
    }
}
