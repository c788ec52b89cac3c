#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use scout_core::{OriginPolicy, Status};
use scout_engine::{
    report_page, ChannelPort, ContextId, EngineSettings, IsolatedRenderer, Orchestrator,
    RenderContext, RenderError, ResultChannel, StatusSink, Transport, TransportError,
    TransportErrorKind, TransportResponse,
};
use url::Url;

pub const EMBEDDER: &str = "http://radarr.intra";
pub const ALLOWED_HOST: &str = "tracker.test";

pub fn test_settings() -> EngineSettings {
    EngineSettings {
        fetch_timeout: Duration::from_secs(15),
        connect_timeout: Duration::from_secs(10),
        page_load_timeout: Duration::from_millis(5_000),
        inter_attempt_delay: Duration::from_millis(1_000),
        max_body_bytes: 1024 * 1024,
        allowed_content_types: vec!["text/html".to_string()],
        escalate_on_network_error: false,
    }
}

pub fn test_policy() -> Arc<OriginPolicy> {
    Arc::new(OriginPolicy::new(
        ["radarr.intra", ALLOWED_HOST, "observed-only.test"],
        [ALLOWED_HOST, "contact-only.test"],
    ))
}

pub fn page(path: &str) -> Url {
    Url::parse(&format!("https://{ALLOWED_HOST}{path}")).unwrap()
}

pub fn orchestrator(
    transport: Arc<FakeTransport>,
    renderer: Option<Arc<FakeRenderer>>,
    settings: EngineSettings,
) -> Orchestrator {
    engine_logging::initialize_for_tests();
    Orchestrator::new(
        transport,
        renderer.map(|r| r as Arc<dyn IsolatedRenderer>),
        ResultChannel::new(EMBEDDER),
        test_policy(),
        settings,
    )
}

#[derive(Debug, Clone)]
pub enum Reply {
    Page {
        status: u16,
        content_type: Option<String>,
        body: Vec<u8>,
    },
    NetworkError,
    Hang,
}

impl Reply {
    pub fn html(status: u16, body: &str) -> Self {
        Reply::Page {
            status,
            content_type: Some("text/html; charset=utf-8".to_string()),
            body: body.as_bytes().to_vec(),
        }
    }
}

/// In-memory transport answering from a table; unknown addresses hang.
#[derive(Default)]
pub struct FakeTransport {
    replies: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<String>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, address: &Url, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .insert(address.as_str().to_string(), reply);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Transport for FakeTransport {
    async fn get(
        &self,
        address: &Url,
        _timeout: Duration,
    ) -> Result<TransportResponse, TransportError> {
        self.calls.lock().unwrap().push(address.as_str().to_string());
        let reply = self.replies.lock().unwrap().get(address.as_str()).cloned();
        match reply {
            Some(Reply::Page {
                status,
                content_type,
                body,
            }) => Ok(TransportResponse {
                status,
                content_type,
                body,
            }),
            Some(Reply::NetworkError) => Err(TransportError::new(
                TransportErrorKind::Network,
                "connection refused",
            )),
            Some(Reply::Hang) | None => std::future::pending().await,
        }
    }
}

/// What a fake rendering context posts as soon as it is opened.
#[derive(Debug, Clone)]
pub enum Post {
    /// Correct sender and address, classifying `text`.
    Report(String),
    /// Pretends to be another context.
    ReportAs(ContextId, String),
    /// Reports for a different address, as after navigating away.
    ReportUrl(String, String),
    /// Arbitrary payload from the correct sender.
    Raw(String),
    /// Correct payload addressed to the wrong origin.
    WrongOrigin(String),
}

pub struct FakeRenderer {
    posts: Vec<Post>,
    fail: bool,
    opened: Mutex<Vec<(ContextId, String)>>,
    closed: Arc<Mutex<Vec<ContextId>>>,
    ports: Mutex<Vec<ChannelPort>>,
}

impl FakeRenderer {
    pub fn posting(posts: Vec<Post>) -> Arc<Self> {
        Arc::new(Self {
            posts,
            fail: false,
            opened: Mutex::new(Vec::new()),
            closed: Arc::new(Mutex::new(Vec::new())),
            ports: Mutex::new(Vec::new()),
        })
    }

    pub fn silent() -> Arc<Self> {
        Self::posting(Vec::new())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            posts: Vec::new(),
            fail: true,
            opened: Mutex::new(Vec::new()),
            closed: Arc::new(Mutex::new(Vec::new())),
            ports: Mutex::new(Vec::new()),
        })
    }

    pub fn opened(&self) -> Vec<(ContextId, String)> {
        self.opened.lock().unwrap().clone()
    }

    pub fn closed(&self) -> Vec<ContextId> {
        self.closed.lock().unwrap().clone()
    }

    pub fn last_port(&self) -> Option<ChannelPort> {
        self.ports.lock().unwrap().last().cloned()
    }
}

#[async_trait::async_trait]
impl IsolatedRenderer for FakeRenderer {
    async fn open(
        &self,
        id: ContextId,
        address: &Url,
        port: ChannelPort,
    ) -> Result<Box<dyn RenderContext>, RenderError> {
        if self.fail {
            return Err(RenderError::Unavailable("no renderer".to_string()));
        }
        self.opened
            .lock()
            .unwrap()
            .push((id, address.as_str().to_string()));
        for post in &self.posts {
            match post {
                Post::Report(text) => {
                    report_page(&port, id, address.as_str(), text).unwrap();
                }
                Post::ReportAs(sender, text) => {
                    report_page(&port, *sender, address.as_str(), text).unwrap();
                }
                Post::ReportUrl(url, text) => {
                    report_page(&port, id, url, text).unwrap();
                }
                Post::Raw(data) => {
                    port.post(id, port.embedder_origin(), data.clone());
                }
                Post::WrongOrigin(text) => {
                    let data = format!(
                        r#"{{"url":"{}","flags":"{}"}}"#,
                        address.as_str(),
                        scout_core::classify(text).to_flags()
                    );
                    port.post(id, "http://elsewhere.example", data);
                }
            }
        }
        self.ports.lock().unwrap().push(port);
        Ok(Box::new(FakeContext {
            id,
            closed: self.closed.clone(),
        }))
    }
}

struct FakeContext {
    id: ContextId,
    closed: Arc<Mutex<Vec<ContextId>>>,
}

impl RenderContext for FakeContext {
    fn id(&self) -> ContextId {
        self.id
    }

    fn close(&mut self) {
        self.closed.lock().unwrap().push(self.id);
    }
}

/// Sink recording every call; `true` marks the terminal one.
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub log: Arc<Mutex<Vec<(bool, Status)>>>,
}

impl RecordingSink {
    pub fn entries(&self) -> Vec<(bool, Status)> {
        self.log.lock().unwrap().clone()
    }

    pub fn terminal(&self) -> Vec<Status> {
        self.entries()
            .into_iter()
            .filter_map(|(terminal, status)| terminal.then_some(status))
            .collect()
    }
}

impl StatusSink for RecordingSink {
    fn progress(&self, status: Status) {
        self.log.lock().unwrap().push((false, status));
    }

    fn complete(self: Box<Self>, status: Status) {
        self.log.lock().unwrap().push((true, status));
    }
}
