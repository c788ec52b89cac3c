use std::time::Duration;

use engine_logging::{engine_info, engine_warn};
use tokio::task::JoinHandle;
use url::Url;

use crate::channel::{report_page, ChannelPort, ContextId};
use crate::extract::visible_text;
use crate::render::{IsolatedRenderer, RenderContext};
use crate::RenderError;

/// Isolated renderer backed by a headless rendering service.
///
/// Each context asks `POST {endpoint}/content {"url": ..}` for the page after
/// its scripts ran, reads the body text and reports through the channel like
/// a script injected into the page would.
///
/// A context whose service call fails posts nothing, so the attempt ends as
/// `TimedOut` once the page-load timeout passes, like a page that never loads.
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    client: reqwest::Client,
    content_endpoint: Url,
}

impl HttpRenderer {
    pub fn new(endpoint: &str, request_timeout: Duration) -> Result<Self, RenderError> {
        let invalid = |message: String| RenderError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            message,
        };
        let base = Url::parse(&format!("{}/", endpoint.trim_end_matches('/')))
            .map_err(|err| invalid(err.to_string()))?;
        let content_endpoint = base.join("content").map_err(|err| invalid(err.to_string()))?;
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|err| RenderError::Unavailable(err.to_string()))?;
        Ok(Self {
            client,
            content_endpoint,
        })
    }
}

#[async_trait::async_trait]
impl IsolatedRenderer for HttpRenderer {
    async fn open(
        &self,
        id: ContextId,
        address: &Url,
        port: ChannelPort,
    ) -> Result<Box<dyn RenderContext>, RenderError> {
        let client = self.client.clone();
        let endpoint = self.content_endpoint.clone();
        let loaded_url = address.as_str().to_string();

        let task = tokio::spawn(async move {
            let html = match fetch_rendered(&client, endpoint, &loaded_url).await {
                Ok(html) => html,
                Err(err) => {
                    engine_warn!("Rendering {} failed: {}", loaded_url, err);
                    return;
                }
            };
            let text = visible_text(&html);
            match report_page(&port, id, &loaded_url, &text) {
                Ok(true) => {}
                Ok(false) => {
                    engine_info!("Nobody is listening for the render of {} any more", loaded_url)
                }
                Err(err) => engine_warn!("Could not encode render result for {}: {}", loaded_url, err),
            }
        });

        Ok(Box::new(HttpRenderContext { id, task }))
    }
}

async fn fetch_rendered(
    client: &reqwest::Client,
    endpoint: Url,
    url: &str,
) -> Result<String, reqwest::Error> {
    let body = serde_json::json!({ "url": url });
    client
        .post(endpoint)
        .json(&body)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await
}

struct HttpRenderContext {
    id: ContextId,
    task: JoinHandle<()>,
}

impl RenderContext for HttpRenderContext {
    fn id(&self) -> ContextId {
        self.id
    }

    fn close(&mut self) {
        self.task.abort();
    }
}
