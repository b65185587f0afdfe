// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trigger listener: allow-list gate, bounded read, decode, dispatch.
//!
//! Connections are handled inline on the control thread; a connection
//! occupies the loop for at most the protocol read timeout. Protocol and
//! shape problems are logged and dropped; only handler failures propagate.

use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};

use shq_core::Clock;
use shq_engine::{Engine, EngineError, Spawner};
use shq_storage::EventHandler;
use tokio::net::TcpStream;
use tracing::{info, warn};

use crate::protocol::{self, Trigger, TriggerKind};

/// Peer addresses allowed to submit triggers.
///
/// Configured hostnames are forward-resolved once at startup; a peer is
/// admitted when its address matches any resolution.
#[derive(Debug, Default)]
pub struct AllowList {
    ips: HashSet<IpAddr>,
}

impl AllowList {
    /// Resolve every configured server name. Unresolvable names are logged
    /// and skipped.
    pub async fn resolve(servers: &[String]) -> Self {
        let mut ips = HashSet::new();
        for server in servers {
            match tokio::net::lookup_host((server.as_str(), 0u16)).await {
                Ok(addrs) => ips.extend(addrs.map(|a| a.ip())),
                Err(e) => warn!(server = %server, error = %e, "could not resolve allow-listed host"),
            }
        }
        Self { ips }
    }

    pub fn permits(&self, ip: IpAddr) -> bool {
        self.ips.contains(&ip)
    }

    #[cfg(test)]
    pub fn from_ips(ips: impl IntoIterator<Item = IpAddr>) -> Self {
        Self {
            ips: ips.into_iter().collect(),
        }
    }
}

/// Handle one trigger connection end to end.
pub async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    allow: &AllowList,
    engine: &mut crate::lifecycle::DaemonEngine,
) -> Result<(), EngineError> {
    if !allow.permits(peer.ip()) {
        warn!(peer = %peer, "connection from unlisted host refused");
        return Ok(());
    }

    let bytes = match protocol::read_document(stream).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(peer = %peer, error = %e, "failed to read trigger document");
            return Ok(());
        }
    };

    let trigger = match protocol::decode(&bytes) {
        Ok(trigger) => trigger,
        Err(e) => {
            warn!(peer = %peer, error = %e, "dropping malformed trigger");
            return Ok(());
        }
    };

    info!(peer = %peer, id = %trigger.record.id, action = %trigger.action, "received trigger");
    dispatch_trigger(trigger, engine).await
}

/// Route a decoded trigger into the resolver.
pub async fn dispatch_trigger<H, S, C>(
    trigger: Trigger,
    engine: &mut Engine<H, S, C>,
) -> Result<(), EngineError>
where
    H: EventHandler,
    S: Spawner,
    C: Clock,
{
    match trigger.kind {
        TriggerKind::Origin => engine.process_origin(trigger.record, &trigger.action).await,
        TriggerKind::Cancel => engine.process_cancel(trigger.record),
        TriggerKind::Other(_) => engine.process_other(trigger.record, &trigger.action),
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
