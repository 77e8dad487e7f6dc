//! Operator console
//!
//! The owning application's side of the broker: shares files it controls by
//! handing out tokens with time-scoped grants, and tunes runtime settings.
//! Raw paths are accepted here only, never over the network.

use log::{info, warn};
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::access::{GrantPermission, GrantTable};
use crate::broker::AccessBroker;
use crate::config::SharedRuntimeConfig;

const HELP: &str = "commands: share <path> [ro|rw] [ttl_secs] | revoke <token> | grants | prune | roots | ttl <secs> | clients <n> | help";

/// Reads console lines until EOF, writing one reply per line.
pub async fn run_console<R, W>(
    input: R,
    mut output: W,
    broker: &AccessBroker,
    grants: &GrantTable,
    runtime: &SharedRuntimeConfig,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let reply = execute_console_command(&line, broker, grants, runtime).await;
        output.write_all(reply.as_bytes()).await?;
        output.write_all(b"\n").await?;
        output.flush().await?;
    }
    info!("Console input closed");
    Ok(())
}

/// Executes one console command and returns the text to show.
pub async fn execute_console_command(
    line: &str,
    broker: &AccessBroker,
    grants: &GrantTable,
    runtime: &SharedRuntimeConfig,
) -> String {
    let mut words: Vec<&str> = line.split_whitespace().collect();
    if words.is_empty() {
        return HELP.to_string();
    }
    let command = words.remove(0).to_ascii_lowercase();

    match (command.as_str(), words.as_slice()) {
        ("share", rest @ [_, ..]) => share(rest.to_vec(), broker, grants, runtime).await,
        ("revoke", [token]) => {
            if grants.revoke(token).await {
                format!("revoked {}", token)
            } else {
                format!("no grant for {}", token)
            }
        }
        ("grants", []) => {
            let now = Instant::now();
            let active = grants.active().await;
            if active.is_empty() {
                return "no active grants".to_string();
            }
            active
                .iter()
                .map(|g| format!("{} {} {}s", g.token, g.permission, g.remaining(now).as_secs()))
                .collect::<Vec<_>>()
                .join("\n")
        }
        ("prune", []) => format!("pruned {} expired grants", grants.prune().await),
        ("roots", []) => broker
            .registry()
            .roots()
            .iter()
            .map(|root| {
                if root.is_catch_all() {
                    format!("{} -> <filesystem>", root.name())
                } else {
                    format!("{} -> {}", root.name(), root.canonical_path().display())
                }
            })
            .collect::<Vec<_>>()
            .join("\n"),
        ("ttl", [secs]) => match secs.parse::<u64>() {
            Ok(secs) if secs > 0 => {
                runtime.write().await.grant_ttl_secs = secs;
                info!("Grant TTL set to {}s", secs);
                format!("grant ttl set to {}s", secs)
            }
            _ => "ttl must be a positive number of seconds".to_string(),
        },
        ("clients", [n]) => match n.parse::<usize>() {
            Ok(n) if n > 0 => {
                runtime.write().await.max_clients = n;
                info!("Max clients set to {}", n);
                format!("max clients set to {}", n)
            }
            _ => "clients must be a positive number".to_string(),
        },
        _ => HELP.to_string(),
    }
}

/// `share <path> [ro|rw] [ttl_secs]`; the path may contain single spaces.
async fn share(
    mut words: Vec<&str>,
    broker: &AccessBroker,
    grants: &GrantTable,
    runtime: &SharedRuntimeConfig,
) -> String {
    let mut ttl = runtime.read().await.grant_ttl();
    if let Some(secs) = words.last().and_then(|w| w.parse::<u64>().ok()) {
        if words.len() > 1 {
            ttl = Duration::from_secs(secs);
            words.pop();
        }
    }

    let mut permission = GrantPermission::Read;
    if words.len() > 1 {
        match words.last().copied() {
            Some("ro") => {
                words.pop();
            }
            Some("rw") => {
                permission = GrantPermission::ReadWrite;
                words.pop();
            }
            _ => {}
        }
    }

    let path = words.join(" ");
    match broker.encode(Path::new(&path)) {
        Ok(token) => {
            let token = token.to_string();
            grants.grant(&token, permission, ttl).await;
            format!("{} ({}, {}s)", token, permission, ttl.as_secs())
        }
        Err(e) => {
            warn!("Cannot share {}: {}", path, e);
            format!("cannot share {}: {}", path, e)
        }
    }
}
