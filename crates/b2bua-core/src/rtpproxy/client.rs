//! Driver running a [`RelayMachine`] against a transport and a scheduler.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::address::RelayAddress;
use super::command::RelayCommand;
use super::machine::{RelayAction, RelayMachine, RelayStatus, RelayTimer};
use super::transport::{ControlTransport, UdpControlTransport};
use crate::config::RelayConfig;
use crate::errors::Result;
use crate::timer::{Scheduler, TokioScheduler};

/// Inputs serialized through the client task
#[derive(Debug)]
enum RelayInput {
    Reply {
        command: RelayCommand,
        reply: Option<String>,
    },
    Timer(RelayTimer),
}

/// Handle to a running RTP proxy control client.
///
/// The client checks the proxy version, probes its capabilities, and polls
/// statistics while it is online. All of its state lives in a single task;
/// observers read [`RelayStatus`] snapshots.
///
/// ```no_run
/// use rvoip_b2bua_core::config::RelayConfig;
/// use rvoip_b2bua_core::rtpproxy::RelayClient;
///
/// # tokio_test::block_on(async {
/// let config = RelayConfig {
///     address: "udp:127.0.0.1:22222".to_string(),
///     ..Default::default()
/// };
/// let client = RelayClient::connect(&config).await.unwrap();
/// let mut status = client.subscribe();
/// status.wait_for(|s| s.online).await.unwrap();
/// client.shutdown();
/// # });
/// ```
pub struct RelayClient {
    address: RelayAddress,
    is_local: bool,
    shutdown: Arc<AtomicBool>,
    status: watch::Receiver<RelayStatus>,
    task: JoinHandle<()>,
}

impl RelayClient {
    /// Open the transport matching `config.address` and start the client
    pub async fn connect(config: &RelayConfig) -> Result<Self> {
        let address = config.relay_address()?;
        let transport: Arc<dyn ControlTransport> = match &address {
            RelayAddress::Udp(remote) => Arc::new(
                UdpControlTransport::bind(*remote, config.command_timeout(), config.command_retries).await?,
            ),
            #[cfg(unix)]
            RelayAddress::Local(path) => Arc::new(super::transport::LocalControlTransport::new(
                path.clone(),
                config.command_timeout(),
            )),
            #[cfg(not(unix))]
            RelayAddress::Local(_) => {
                return Err(crate::errors::B2buaError::InvalidAddress(
                    "local control sockets need a unix platform".into(),
                ))
            }
        };
        Ok(Self::spawn(address, transport, Arc::new(TokioScheduler::new()), config))
    }

    /// Start a client over an already built transport
    pub fn spawn(
        address: RelayAddress,
        transport: Arc<dyn ControlTransport>,
        scheduler: Arc<dyn Scheduler>,
        config: &RelayConfig,
    ) -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        let machine = RelayMachine::new(
            address.to_string(),
            shutdown.clone(),
            config.heartbeat_interval(),
            config.version_retry(),
        );
        let (status_tx, status_rx) = watch::channel(machine.status());
        let is_local = transport.is_local();
        let task = tokio::spawn(run_client(machine, transport, scheduler, status_tx));
        info!(relay = %address, is_local, "RTP proxy client started");

        Self {
            address,
            is_local,
            shutdown,
            status: status_rx,
            task,
        }
    }

    pub fn address(&self) -> &RelayAddress {
        &self.address
    }

    pub fn is_local(&self) -> bool {
        self.is_local
    }

    pub fn status(&self) -> RelayStatus {
        self.status.borrow().clone()
    }

    pub fn is_online(&self) -> bool {
        self.status.borrow().online
    }

    /// Receiver notified on every status change
    pub fn subscribe(&self) -> watch::Receiver<RelayStatus> {
        self.status.clone()
    }

    /// Request shutdown. Pending timers and replies still run but stop at the
    /// shutdown check; the first one to see it releases the transport.
    pub fn shutdown(&self) {
        if !self.shutdown.swap(true, Ordering::AcqRel) {
            info!(relay = %self.address, "RTP proxy client shutting down");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for RelayClient {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
    }
}

async fn run_client(
    mut machine: RelayMachine,
    transport: Arc<dyn ControlTransport>,
    scheduler: Arc<dyn Scheduler>,
    status_tx: watch::Sender<RelayStatus>,
) {
    let (input_tx, mut input_rx) = mpsc::unbounded_channel();
    let mut worker = Some(transport);

    let actions = machine.start();
    execute(actions, &mut worker, scheduler.as_ref(), &input_tx).await;

    while let Some(input) = input_rx.recv().await {
        let actions = match input {
            RelayInput::Reply { command, reply } => machine.on_reply(command, reply.as_deref()),
            RelayInput::Timer(timer) => machine.on_timer(timer),
        };
        execute(actions, &mut worker, scheduler.as_ref(), &input_tx).await;
        status_tx.send_if_modified(|status| {
            let current = machine.status();
            if *status == current {
                return false;
            }
            *status = current;
            true
        });
        if machine.worker_released() {
            break;
        }
    }
    debug!("RTP proxy client task finished");
}

async fn execute(
    actions: Vec<RelayAction>,
    worker: &mut Option<Arc<dyn ControlTransport>>,
    scheduler: &dyn Scheduler,
    input_tx: &mpsc::UnboundedSender<RelayInput>,
) {
    for action in actions {
        match action {
            RelayAction::Send(command) => {
                let Some(transport) = worker.clone() else {
                    debug!(%command, "Worker released, not sending");
                    continue;
                };
                let input_tx = input_tx.clone();
                tokio::spawn(async move {
                    let reply = transport.send_command(&command.to_string()).await;
                    let _ = input_tx.send(RelayInput::Reply { command, reply });
                });
            }
            RelayAction::Schedule { timer, after } => {
                let input_tx = input_tx.clone();
                scheduler.schedule_after(
                    after,
                    Box::new(move || {
                        let _ = input_tx.send(RelayInput::Timer(timer));
                    }),
                );
            }
            RelayAction::ReleaseWorker => {
                if let Some(transport) = worker.take() {
                    transport.shutdown().await;
                    debug!("Transport worker released");
                }
            }
        }
    }
}
