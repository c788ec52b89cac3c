//! Scout engine: bounded work queue, retrieval strategies and result correlation.
mod channel;
mod decode;
mod direct;
mod engine;
mod extract;
mod orchestrator;
mod queue;
mod render;
mod render_service;
mod transport;
mod types;

pub use channel::{
    report_page, ChannelMessage, ChannelPort, ContextId, DiscardReason, Listener, ResultChannel,
    ResultPayload, Verdict, ANY_ORIGIN,
};
pub use decode::{decode_body, DecodeError};
pub use direct::{direct_fetch, DirectOutcome};
pub use engine::EngineHandle;
pub use extract::visible_text;
pub use orchestrator::Orchestrator;
pub use queue::{StatusSink, Task, TaskRunner, WorkQueue};
pub use render::{isolated_render, IsolatedRenderer, RenderContext};
pub use render_service::HttpRenderer;
pub use transport::{ReqwestTransport, Transport};
pub use types::{
    EngineError, EngineEvent, EngineSettings, RenderError, TransportError, TransportErrorKind,
    TransportResponse,
};
