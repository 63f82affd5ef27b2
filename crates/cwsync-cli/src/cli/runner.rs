use std::time::Duration;

use anyhow::{Context, Result};
use cwsync_core::{HttpTransport, PersonId, SyncClient, SyncError};

use super::config::CliConfig;
use super::output::{chat_json, person_json, render, room_json};

/// Consecutive failed cycles after which `watch` logs in again. The gateway
/// reports an expired session as an ordinary failed status, so a run of
/// failures is the only sign of one.
const RELOGIN_AFTER_FAILURES: u32 = 3;

/// What the CLI was asked to do
#[derive(Debug, Clone)]
pub enum CliCommand {
    /// Poll forever, printing chats as they arrive
    Watch,
    /// Run a single poll cycle
    Poll,
    /// List rooms from the login snapshot
    Rooms,
    /// Look people up by account id
    People { ids: Vec<PersonId> },
    /// Post a message to a room
    Send { room_id: String, text: String },
}

#[tokio::main]
pub async fn run(command: CliCommand, config: CliConfig, pretty: bool) -> Result<()> {
    let mut client = SyncClient::connect(config.sync.clone())
        .context("Failed to set up gateway transport")?;
    client
        .login(&config.credentials)
        .await
        .context("Login failed")?;

    match command {
        CliCommand::Watch => watch(&mut client, &config, pretty).await,
        CliCommand::Poll => {
            for chat in client.poll().await.context("Poll failed")? {
                println!("{}", render(&chat_json(&chat), pretty));
            }
            Ok(())
        }
        CliCommand::Rooms => {
            let rooms: Vec<_> = client.rooms().iter().map(|room| room_json(room)).collect();
            println!("{}", render(&serde_json::Value::Array(rooms), pretty));
            Ok(())
        }
        CliCommand::People { ids } => {
            let people = client
                .lookup_people(&ids)
                .await
                .context("People lookup failed")?;
            let people: Vec<_> = people.iter().map(|person| person_json(person)).collect();
            println!("{}", render(&serde_json::Value::Array(people), pretty));
            Ok(())
        }
        CliCommand::Send { room_id, text } => {
            client
                .send_message(&room_id, &text)
                .await
                .context("Send failed")?;
            Ok(())
        }
    }
}

/// Counts consecutive failed poll cycles.
#[derive(Debug)]
struct FailureStreak {
    count: u32,
    limit: u32,
}

impl FailureStreak {
    fn new(limit: u32) -> Self {
        Self { count: 0, limit }
    }

    /// Record a failure. Returns true once the streak reaches the limit,
    /// and starts counting again from zero.
    fn record(&mut self) -> bool {
        self.count += 1;
        if self.count >= self.limit {
            self.count = 0;
            return true;
        }
        false
    }

    fn reset(&mut self) {
        self.count = 0;
    }
}

/// Poll until interrupted. Failed cycles are logged and retried on the next
/// tick; an auth failure, or a run of other failures, triggers a fresh login
/// first.
async fn watch(
    client: &mut SyncClient<HttpTransport>,
    config: &CliConfig,
    pretty: bool,
) -> Result<()> {
    let interval = Duration::from_secs(config.poll_interval_secs);
    tracing::info!(interval_secs = config.poll_interval_secs, "watching for new chats");

    let mut failures = FailureStreak::new(RELOGIN_AFTER_FAILURES);
    loop {
        let relogin = match client.poll().await {
            Ok(chats) => {
                failures.reset();
                for chat in chats {
                    println!("{}", render(&chat_json(&chat), pretty));
                }
                false
            }
            Err(err) if err.is_auth() => {
                tracing::warn!(error = %err, "session lost, logging in again");
                true
            }
            Err(err) => {
                log_cycle_error(&err);
                let relogin = failures.record();
                if relogin {
                    tracing::warn!(
                        failures = RELOGIN_AFTER_FAILURES,
                        "repeated poll failures, logging in again"
                    );
                }
                relogin
            }
        };

        if relogin {
            failures.reset();
            if let Err(err) = client.login(&config.credentials).await {
                tracing::error!(error = %err, "re-login failed");
            }
        }

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted, stopping");
                client.logout();
                return Ok(());
            }
            _ = tokio::time::sleep(interval) => {}
        }
    }
}

fn log_cycle_error(err: &SyncError) {
    match err {
        SyncError::UnresolvedPerson(id) => {
            tracing::warn!(person_id = id, "poll cycle aborted on unknown sender")
        }
        other => tracing::warn!(error = %other, "poll cycle failed, retrying"),
    }
}
