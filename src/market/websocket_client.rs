//! Generic WebSocket client for historical kline requests.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Duration;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use crate::error::SourceError;
use crate::fingerprint::candle::Candle;
use crate::market::kline_protocol::{KlinePage, KlineProtocol};
use crate::market::request::KlineRequest;
use crate::market::source::CandleSource;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

// Design: KlineClient<P: KlineProtocol> is generic over the protocol type.
// Connection handling, fallback and paging live here; each exchange only
// implements KlineProtocol.

/// Generic kline client that works with any exchange protocol.
pub struct KlineClient<P: KlineProtocol> {
    protocol: Arc<P>,
    endpoint_override: Option<String>,
    next_id: AtomicU64,
}

impl<P: KlineProtocol> KlineClient<P> {
    pub fn new(protocol: P) -> Self {
        Self {
            protocol: Arc::new(protocol),
            endpoint_override: None,
            next_id: AtomicU64::new(1),
        }
    }

    /// Replaces the protocol's endpoints with a single URL (no fallback).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint_override = Some(endpoint.into());
        self
    }

    pub fn name(&self) -> &'static str {
        self.protocol.name()
    }

    async fn connect(&self) -> Result<Socket, SourceError> {
        if let Some(endpoint) = &self.endpoint_override {
            info!("[{}] Connecting to {}...", self.name(), endpoint);
            let (socket, _response) = connect_async(endpoint.as_str()).await?;
            return Ok(socket);
        }

        let primary = self.protocol.endpoint();
        info!("[{}] Connecting to {}...", self.name(), primary);
        match connect_async(primary).await {
            Ok((socket, _response)) => Ok(socket),
            Err(e) => {
                let Some(fallback) = self.protocol.fallback_endpoint() else {
                    return Err(e.into());
                };
                warn!("[{}] Primary endpoint failed ({}), trying {}", self.name(), e, fallback);
                let (socket, _response) = connect_async(fallback).await?;
                Ok(socket)
            }
        }
    }

    /// Sends one page request and waits for the matching response.
    async fn request_page(
        &self,
        socket: &mut Socket,
        request: &KlineRequest,
        from: chrono::DateTime<chrono::Utc>,
    ) -> Result<KlinePage, SourceError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let msg = self.protocol.format_request(id, request, from);
        socket.send(Message::Text(msg.into())).await?;

        while let Some(frame) = socket.next().await {
            match frame? {
                Message::Text(text) => {
                    if let Some(page) = self.protocol.parse_response(&text)? {
                        if page.id == id {
                            return Ok(page);
                        }
                        debug!(
                            "[{}] Ignoring response {} while waiting for {}",
                            self.name(),
                            page.id,
                            id
                        );
                    }
                }
                Message::Close(frame) => {
                    warn!("[{}] Connection closed: {:?}", self.name(), frame);
                    break;
                }
                // Pong is answered by tungstenite; binary frames carry nothing we use
                _ => {}
            }
        }
        Err(SourceError::ConnectionClosed { request_id: id })
    }
}

impl<P: KlineProtocol> CandleSource for KlineClient<P> {
    fn name(&self) -> &str {
        self.protocol.name()
    }

    async fn fetch(&self, request: &KlineRequest) -> Result<Vec<Candle>, SourceError> {
        let mut socket = self.connect().await?;
        info!(
            "[{}] Connected, fetching {} {} candles",
            self.name(),
            request.symbol,
            request.interval
        );

        let limit = self.protocol.page_limit();
        let mut candles: Vec<Candle> = Vec::new();
        let mut cursor = request.start;

        while cursor <= request.end {
            let page = self.request_page(&mut socket, request, cursor).await?;
            let received = page.candles.len();
            let Some(last_open) = page.candles.last().map(Candle::get_timestamp) else {
                break;
            };

            // A candle at or before the last one kept would break series ordering.
            let last_kept = candles.last().map(Candle::get_timestamp);
            candles.extend(page.candles.into_iter().filter(|c| {
                request.contains(c.get_timestamp())
                    && last_kept.is_none_or(|last| c.get_timestamp() > last)
            }));
            debug!("[{}] Page of {} candles up to {}", self.name(), received, last_open);

            if received < limit || last_open >= request.end {
                break;
            }
            // A full page that ends before the cursor would be requested again forever.
            if last_open < cursor {
                return Err(SourceError::Protocol(format!(
                    "full page ending at {last_open} does not reach cursor {cursor}"
                )));
            }
            cursor = last_open + Duration::milliseconds(1);
        }

        if let Err(e) = socket.close(None).await {
            debug!("[{}] Close handshake failed: {}", self.name(), e);
        }
        info!("[{}] Fetched {} candles", self.name(), candles.len());
        Ok(candles)
    }
}
