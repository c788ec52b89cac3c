use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use engine_logging::{engine_info, engine_warn};
use scout_core::{OriginPolicy, RowId, ScoutConfig, Status};
use tokio::sync::mpsc as async_mpsc;
use url::Url;

use crate::channel::ResultChannel;
use crate::orchestrator::Orchestrator;
use crate::queue::{StatusSink, Task, TaskRunner, WorkQueue};
use crate::render::IsolatedRenderer;
use crate::render_service::HttpRenderer;
use crate::transport::ReqwestTransport;
use crate::{EngineError, EngineEvent, EngineSettings};

enum EngineCommand {
    Enqueue { row_id: RowId, url: String },
}

/// Synchronous front of the engine for UI hosts.
///
/// The work queue runs on a single-threaded Tokio runtime owned by a
/// background thread. Status changes come back as [`EngineEvent`]s.
pub struct EngineHandle {
    cmd_tx: async_mpsc::UnboundedSender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    /// Builds the reqwest transport, the optional rendering-service renderer,
    /// the result channel and the origin policy from `config`.
    pub fn new(config: &ScoutConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let settings = EngineSettings::from(config);
        let policy = Arc::new(OriginPolicy::from_config(config)?);
        let transport = Arc::new(ReqwestTransport::new(&settings, policy.clone())?);
        let renderer = match config.render_endpoint.as_deref() {
            Some(endpoint) => {
                let renderer = HttpRenderer::new(endpoint, settings.page_load_timeout)?;
                Some(Arc::new(renderer) as Arc<dyn IsolatedRenderer>)
            }
            None => None,
        };
        let channel = ResultChannel::new(config.embedder_origin()?);
        let orchestrator = Orchestrator::new(transport, renderer, channel, policy, settings);
        Self::spawn(Arc::new(orchestrator), config.max_concurrent)
    }

    /// Starts the engine thread around an arbitrary task runner.
    pub fn spawn(runner: Arc<dyn TaskRunner>, max_concurrent: usize) -> Result<Self, EngineError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let queue = WorkQueue::with_runtime(runner, max_concurrent, runtime.handle().clone())?;
        let (cmd_tx, mut cmd_rx) = async_mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            runtime.block_on(async move {
                while let Some(command) = cmd_rx.recv().await {
                    handle_command(&queue, command, &event_tx);
                }
                queue.wait_idle().await;
            });
        });

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn enqueue(&self, row_id: RowId, url: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::Enqueue {
            row_id,
            url: url.into(),
        });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

fn handle_command(queue: &WorkQueue, command: EngineCommand, event_tx: &mpsc::Sender<EngineEvent>) {
    match command {
        EngineCommand::Enqueue { row_id, url } => {
            let sink = ChannelStatusSink {
                row_id,
                tx: event_tx.clone(),
            };
            sink.progress(Status::Pending);
            match Url::parse(&url) {
                Ok(address) => {
                    engine_info!("Enqueue row_id={} url={}", row_id, address);
                    queue.submit(Task::new(address, sink));
                }
                Err(err) => {
                    engine_warn!("Row {} has an unusable address '{}': {}", row_id, url, err);
                    Box::new(sink).complete(Status::Blocked);
                }
            }
        }
    }
}

struct ChannelStatusSink {
    row_id: RowId,
    tx: mpsc::Sender<EngineEvent>,
}

impl StatusSink for ChannelStatusSink {
    fn progress(&self, status: Status) {
        let _ = self.tx.send(EngineEvent::StatusChanged {
            row_id: self.row_id,
            status,
        });
    }

    fn complete(self: Box<Self>, status: Status) {
        self.progress(status);
    }
}
