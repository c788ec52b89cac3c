use std::time::Duration;

use engine_logging::{engine_debug, engine_info, engine_warn};
use scout_core::Status;
use tokio::time::Instant;
use url::Url;

use crate::channel::{ChannelPort, ContextId, Listener, ResultChannel};
use crate::RenderError;

/// Capability to load a page in a hidden, isolated rendering context.
///
/// Code running inside the context reports through `port`, identifying
/// itself as `id` (see [`crate::report_page`]).
#[async_trait::async_trait]
pub trait IsolatedRenderer: Send + Sync {
    async fn open(
        &self,
        id: ContextId,
        address: &Url,
        port: ChannelPort,
    ) -> Result<Box<dyn RenderContext>, RenderError>;
}

/// A live rendering context. Closing it must stop any work it still does.
pub trait RenderContext: Send {
    fn id(&self) -> ContextId;
    fn close(&mut self);
}

/// Closes the wrapped context when dropped, whatever way the attempt ends.
struct ContextGuard {
    context: Box<dyn RenderContext>,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        engine_debug!("Closing render context {}", self.context.id().raw());
        self.context.close();
    }
}

/// One in-flight isolated render: the context, its listener and its deadline.
struct PendingRequest {
    address: Url,
    _context: ContextGuard,
    listener: Listener,
    expiry: Instant,
}

impl PendingRequest {
    async fn wait(mut self) -> Status {
        match tokio::time::timeout_at(self.expiry, self.listener.next_result()).await {
            Ok(set) => {
                engine_info!("Isolated render of {} reported {}", self.address, set);
                Status::from_indicators(set)
            }
            Err(_) => {
                engine_info!("Timeout waiting for render context result for {}", self.address);
                Status::TimedOut
            }
        }
    }
}

/// Isolated-render strategy: open a context for `address` and wait up to
/// `timeout` for its correlated result.
///
/// The context is closed and the listener dropped before this returns.
pub async fn isolated_render(
    renderer: &dyn IsolatedRenderer,
    channel: &ResultChannel,
    address: &Url,
    timeout: Duration,
) -> Status {
    let expiry = Instant::now() + timeout;
    let id = channel.allocate_context_id();
    let listener = channel.listen(address, id);

    let opened = tokio::time::timeout_at(expiry, renderer.open(id, address, channel.port())).await;
    let context = match opened {
        Ok(Ok(context)) => context,
        Ok(Err(err)) => {
            engine_warn!("Could not open render context for {}: {}", address, err);
            return Status::Blocked;
        }
        Err(_) => {
            engine_info!("Timeout opening render context for {}", address);
            return Status::TimedOut;
        }
    };

    PendingRequest {
        address: address.clone(),
        _context: ContextGuard { context },
        listener,
        expiry,
    }
    .wait()
    .await
}
