use std::sync::Arc;

use engine_logging::{engine_debug, engine_info};
use scout_core::{OriginPolicy, Status};
use url::Url;

use crate::channel::ResultChannel;
use crate::direct::{direct_fetch, DirectOutcome};
use crate::queue::{StatusSink, Task, TaskRunner};
use crate::render::{isolated_render, IsolatedRenderer};
use crate::transport::Transport;
use crate::EngineSettings;

/// Where a task is in its resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskState {
    Start,
    DirectFetchInFlight,
    IsolatedRenderInFlight,
    Terminal(Status),
}

/// Resolves one task: policy check, direct fetch, isolated render on an
/// inconclusive fetch, then a single terminal status to the task's sink.
pub struct Orchestrator {
    transport: Arc<dyn Transport>,
    renderer: Option<Arc<dyn IsolatedRenderer>>,
    channel: ResultChannel,
    policy: Arc<OriginPolicy>,
    settings: EngineSettings,
}

impl Orchestrator {
    /// Without a renderer an inconclusive fetch resolves to `NotFound`.
    pub fn new(
        transport: Arc<dyn Transport>,
        renderer: Option<Arc<dyn IsolatedRenderer>>,
        channel: ResultChannel,
        policy: Arc<OriginPolicy>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            transport,
            renderer,
            channel,
            policy,
            settings,
        }
    }

    /// Runs the task to its terminal status.
    ///
    /// The sink receives `Loading` once the first attempt starts and the
    /// terminal status as soon as it is known. After any network attempt the
    /// call lingers for the inter-attempt delay before returning, so a freed
    /// queue slot does not immediately hit the next page.
    pub async fn resolve(&self, task: Task) {
        let (address, sink) = task.into_parts();
        let mut attempted = false;
        let mut state = TaskState::Start;

        let status = loop {
            state = match state {
                TaskState::Start => self.check_policy(&address, sink.as_ref()),
                TaskState::DirectFetchInFlight => {
                    attempted = true;
                    let outcome =
                        direct_fetch(self.transport.as_ref(), &address, &self.settings).await;
                    self.after_direct_fetch(&address, outcome).await
                }
                TaskState::IsolatedRenderInFlight => {
                    TaskState::Terminal(self.render(&address).await)
                }
                TaskState::Terminal(status) => break status,
            };
        };

        engine_info!("Resolved {} as {}", address, status);
        sink.complete(status);

        if attempted {
            self.pause().await;
        }
    }

    fn check_policy(&self, address: &Url, sink: &dyn StatusSink) -> TaskState {
        if !self.policy.permits(address) {
            engine_info!("Host of {} is not allowed; not contacting it", address);
            return TaskState::Terminal(Status::Blocked);
        }
        sink.progress(Status::Loading);
        TaskState::DirectFetchInFlight
    }

    async fn after_direct_fetch(&self, address: &Url, outcome: DirectOutcome) -> TaskState {
        match outcome {
            DirectOutcome::Terminal(status) => TaskState::Terminal(status),
            DirectOutcome::Inconclusive if self.renderer.is_none() => {
                engine_debug!("No isolated renderer configured; {} has no subtitles", address);
                TaskState::Terminal(Status::NotFound)
            }
            DirectOutcome::Inconclusive => {
                engine_debug!("Direct fetch of {} inconclusive; escalating", address);
                self.pause().await;
                TaskState::IsolatedRenderInFlight
            }
            DirectOutcome::Refused
                if self.settings.escalate_on_network_error && self.renderer.is_some() =>
            {
                engine_debug!("Direct fetch of {} refused; escalating", address);
                self.pause().await;
                TaskState::IsolatedRenderInFlight
            }
            DirectOutcome::Refused => TaskState::Terminal(Status::Blocked),
        }
    }

    async fn render(&self, address: &Url) -> Status {
        let Some(renderer) = &self.renderer else {
            return Status::NotFound;
        };
        isolated_render(
            renderer.as_ref(),
            &self.channel,
            address,
            self.settings.page_load_timeout,
        )
        .await
    }

    async fn pause(&self) {
        tokio::time::sleep(self.settings.inter_attempt_delay).await;
    }
}

#[async_trait::async_trait]
impl TaskRunner for Orchestrator {
    async fn run(&self, task: Task) {
        self.resolve(task).await;
    }
}
