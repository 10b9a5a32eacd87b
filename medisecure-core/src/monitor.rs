//! Service health monitoring
//!
//! Keeps a best-effort picture of which backend services are reachable.
//! Status lives in a typed [`StatusBoard`]; the UI renders it as a pure
//! projection. Probes for the three services run as independent tasks, so a
//! hung or dead endpoint never delays the others' results.
//!
//! Lifecycle: spawned on login (one pass immediately, then on a fixed
//! interval), shut down on logout. A manual refresh runs an extra pass
//! without resetting the recurring schedule.

use std::time::Duration;

use reqwest::Client;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::client::probe;
use crate::protocol::ServerCreds;

/// The fixed set of monitored services
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceId {
    Middleware,
    RegistrationCenter,
    ResourceServer,
}

impl ServiceId {
    pub const ALL: [ServiceId; 3] = [
        ServiceId::Middleware,
        ServiceId::RegistrationCenter,
        ServiceId::ResourceServer,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ServiceId::Middleware => "Middleware",
            ServiceId::RegistrationCenter => "Registration Center",
            ServiceId::ResourceServer => "Resource Server",
        }
    }
}

/// Probe verdict for one service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Reachability {
    /// No probe has settled yet
    #[default]
    Unknown,
    Online,
    Offline,
}

/// Identity metadata reported by the resource server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerIdentity {
    pub id: String,
    pub location: String,
}

impl From<ServerCreds> for ServerIdentity {
    fn from(creds: ServerCreds) -> Self {
        Self {
            id: creds.id,
            location: creds.location,
        }
    }
}

/// Result of a single settled probe
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub service: ServiceId,
    pub reachable: bool,
    pub identity: Option<ServerIdentity>,
}

/// Current status of one monitored service
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceStatus {
    pub reachable: Reachability,
    pub identity: Option<ServerIdentity>,
}

/// Per-service status, recomputed as probe outcomes arrive
///
/// `apply` is order-independent across services: outcomes only ever touch
/// their own service's entry.
#[derive(Debug, Clone, Default)]
pub struct StatusBoard {
    middleware: ServiceStatus,
    registration_center: ServiceStatus,
    resource_server: ServiceStatus,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self, service: ServiceId) -> &ServiceStatus {
        match service {
            ServiceId::Middleware => &self.middleware,
            ServiceId::RegistrationCenter => &self.registration_center,
            ServiceId::ResourceServer => &self.resource_server,
        }
    }

    pub fn apply(&mut self, outcome: ProbeOutcome) {
        let entry = match outcome.service {
            ServiceId::Middleware => &mut self.middleware,
            ServiceId::RegistrationCenter => &mut self.registration_center,
            ServiceId::ResourceServer => &mut self.resource_server,
        };

        if outcome.reachable {
            entry.reachable = Reachability::Online;
            if outcome.identity.is_some() {
                entry.identity = outcome.identity;
            }
        } else {
            entry.reachable = Reachability::Offline;
            // A dead service gets no stale identity next to its badge
            entry.identity = None;
        }
    }
}

/// Base URLs of the three monitored services
#[derive(Debug, Clone)]
pub struct MonitorEndpoints {
    pub middleware_url: String,
    pub registration_center_url: String,
    pub resource_server_url: String,
}

impl MonitorEndpoints {
    fn url(&self, service: ServiceId) -> &str {
        match service {
            ServiceId::Middleware => &self.middleware_url,
            ServiceId::RegistrationCenter => &self.registration_center_url,
            ServiceId::ResourceServer => &self.resource_server_url,
        }
    }
}

/// Handle to a running monitor task
#[derive(Debug)]
pub struct MonitorHandle {
    refresh_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Run an extra pass now; the recurring schedule is untouched
    pub fn refresh(&self) {
        // A full refresh queue means a pass is already pending
        let _ = self.refresh_tx.try_send(());
    }

    /// Stop probing; called on logout
    pub fn shutdown(self) {
        self.task.abort();
    }
}

/// Start the monitor: one pass immediately, then one per `poll_interval`
///
/// Every settled probe sends its [`ProbeOutcome`] on `outcomes`; the owner
/// applies them to a [`StatusBoard`] in arrival order.
pub fn spawn(
    http: Client,
    endpoints: MonitorEndpoints,
    poll_interval: Duration,
    outcomes: mpsc::Sender<ProbeOutcome>,
) -> MonitorHandle {
    let (refresh_tx, mut refresh_rx) = mpsc::channel(1);

    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                refresh = refresh_rx.recv() => {
                    if refresh.is_none() {
                        break;
                    }
                }
            }
            run_pass(&http, &endpoints, &outcomes);
        }
    });

    MonitorHandle { refresh_tx, task }
}

/// Issue the three probes as independent fire-and-forget tasks
fn run_pass(http: &Client, endpoints: &MonitorEndpoints, outcomes: &mpsc::Sender<ProbeOutcome>) {
    for service in ServiceId::ALL {
        let http = http.clone();
        let url = endpoints.url(service).to_string();
        let tx = outcomes.clone();

        tokio::spawn(async move {
            let outcome = match probe(&http, &url).await {
                Ok(creds) => ProbeOutcome {
                    service,
                    reachable: true,
                    identity: creds.map(ServerIdentity::from),
                },
                Err(err) => {
                    // Probe failures are silent degradation, never a
                    // user-facing error
                    tracing::debug!(service = service.label(), %url, error = %err, "probe failed");
                    ProbeOutcome {
                        service,
                        reachable: false,
                        identity: None,
                    }
                }
            };

            let _ = tx.send(outcome).await;
        });
    }
}
