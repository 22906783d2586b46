//! Run the sync coordinator.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use sync_coordinator::{session_channel, Config, HttpSource, SyncCoordinator, Triggers};
use sync_core::CoordinatorEvent;
use sync_store::PersistentStore;
use sync_types::{Role, User};
use tokio::sync::broadcast::error::RecvError;

/// Arguments of the `run` command.
#[derive(Debug)]
pub struct RunArgs {
    pub role: Role,
    pub user_id: String,
    pub name: Option<String>,
    pub duration_secs: Option<u64>,
}

/// Sign in as the given user and sync until ctrl-c or the duration elapses.
pub async fn run(store: PersistentStore, config_path: &Path, args: RunArgs) -> Result<()> {
    let config = Config::load_or_default(config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let source = HttpSource::new(&config.remote).context("Failed to build HTTP client")?;
    tracing::info!("Syncing against {}", source.base_url());

    let triggers = Triggers::pull(Arc::new(source), store);
    let (publisher, session) = session_channel();
    let mut coordinator = SyncCoordinator::spawn(config.policy(), session, triggers);
    let mut events = coordinator.subscribe();

    let mut user = User::new(&args.user_id, args.role);
    if let Some(name) = &args.name {
        user = user.with_name(name);
    }
    publisher.login(user);

    let deadline = async {
        match args.duration_secs {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => report(&event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Missed {} coordinator events", skipped);
                }
                Err(RecvError::Closed) => break,
            },
            _ = &mut deadline => {
                tracing::info!("Run duration elapsed");
                break;
            }
            result = tokio::signal::ctrl_c() => {
                result.context("Failed to listen for ctrl-c")?;
                tracing::info!("Interrupted");
                break;
            }
        }
    }

    publisher.logout();
    coordinator.teardown();
    Ok(())
}

fn report(event: &CoordinatorEvent) {
    match event {
        CoordinatorEvent::Activated { role } => println!("Signed in as {}", role),
        CoordinatorEvent::RoleChanged { from, to } => println!("Role changed: {} -> {}", from, to),
        CoordinatorEvent::Deactivated { role } => println!("Signed out ({})", role),
        CoordinatorEvent::SyncTriggered { kind, source } => {
            println!("Syncing {} ({:?})", kind, source);
        }
        CoordinatorEvent::Terminated => println!("Stopped"),
    }
}
