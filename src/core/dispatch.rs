//! Outbound HTTP capability.
//!
//! Every dispatch returns its own event channel, so overlapping triggers
//! each own an independent subscription instead of fighting over a single
//! listener slot. The core never cancels a request and enforces no
//! timeout of its own; both are the transport's business.

use lazy_static::lazy_static;
use reqwest::Client;
use tokio::sync::mpsc;

use super::request::ShockRequest;

/// Shown in place of a response body that could not be read.
pub const NO_RESPONSE_PLACEHOLDER: &str = "No response from the server";

const EVENT_CHANNEL_CAPACITY: usize = 16;

lazy_static! {
    static ref HTTP_CLIENT: Client = Client::new();
}

/// Events delivered on a per-request channel.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchEvent {
    /// Download progress percentage, 0-100. Non-terminal, zero or more.
    Progress(f32),
    /// Terminal. Response body text, or a network error's display text,
    /// or [`NO_RESPONSE_PLACEHOLDER`]. Status codes are not classified.
    Completed(String),
    /// Terminal. Emitted by transports that report external cancellation.
    Cancelled,
}

/// The opaque HTTP capability the trigger controller hands requests to.
pub trait ShockDispatcher: Send + Sync {
    /// Fire the request and return the channel its outcome arrives on.
    /// Must not block the caller.
    fn dispatch(&self, request: ShockRequest) -> mpsc::Receiver<DispatchEvent>;
}

/// Production dispatcher backed by a shared reqwest client.
pub struct HttpDispatcher {
    runtime: tokio::runtime::Handle,
}

impl HttpDispatcher {
    pub fn new(runtime: tokio::runtime::Handle) -> Self {
        Self { runtime }
    }
}

impl ShockDispatcher for HttpDispatcher {
    fn dispatch(&self, request: ShockRequest) -> mpsc::Receiver<DispatchEvent> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        self.runtime.spawn(async move {
            let terminal = execute(request, &tx).await;
            // A closed channel means the listener is gone; drop the event.
            let _ = tx.send(terminal).await;
        });
        rx
    }
}

/// Runs the request to completion, streaming the body so progress can be
/// reported when the server announces a content length. Returns the
/// terminal event.
async fn execute(request: ShockRequest, events: &mpsc::Sender<DispatchEvent>) -> DispatchEvent {
    let mut builder = HTTP_CLIENT.post(&request.url);
    for (name, value) in request.headers() {
        builder = builder.header(name, value);
    }

    let mut response = match builder.json(&request.body).send().await {
        Ok(response) => response,
        Err(e) => {
            log::error!("Shock request failed: {}", e);
            return DispatchEvent::Completed(e.to_string());
        }
    };

    let total = response.content_length().filter(|len| *len > 0);
    let mut received: u64 = 0;
    let mut buf = Vec::new();

    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                received += chunk.len() as u64;
                buf.extend_from_slice(&chunk);
                if let Some(total) = total {
                    let pct = received as f32 / total as f32 * 100.0;
                    if events.send(DispatchEvent::Progress(pct)).await.is_err() {
                        // Listener went away mid-download.
                        break;
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                log::warn!("Failed to read response body: {}", e);
                return DispatchEvent::Completed(NO_RESPONSE_PLACEHOLDER.to_string());
            }
        }
    }

    let text =
        String::from_utf8(buf).unwrap_or_else(|_| NO_RESPONSE_PLACEHOLDER.to_string());
    DispatchEvent::Completed(text)
}
