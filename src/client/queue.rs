//! Message-queue backend: publish a JSON command under a correlation key and
//! poll for the response carrying the same key.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::{mpsc, Mutex};
use tokio::time::Instant;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::client::retry::{with_retry, RetryConfig};
use crate::client::transport::{Request, Transport};
use crate::error::TransportError;
use crate::shutdown::Shutdown;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueueMessage {
    pub key: String,
    pub value: String,
}

/// A bidirectional connection to the broker.
#[async_trait]
pub trait QueueConnection: Send + Sync {
    async fn publish(&self, message: QueueMessage) -> Result<(), TransportError>;

    /// Waits up to `wait` for the next inbound message. `Ok(None)` means nothing arrived.
    async fn next_message(&self, wait: Duration) -> Result<Option<QueueMessage>, TransportError>;
}

/// Builds the command envelope the broker-side worker understands.
pub fn command_envelope(ship_id: &str, request: &Request) -> Value {
    match request {
        Request::ShipDetails => json!({ "id": ship_id, "action": "GetShipDetails" }),
        Request::Marketplace { location } => json!({
            "id": ship_id,
            "action": "GetMarketplaceInfo",
            "location": location,
        }),
        Request::NewFlightPlan { destination } => json!({
            "id": ship_id,
            "action": "PostFlightPlanNew",
            "shipId": ship_id,
            "destination": destination,
        }),
        Request::FlightPlan { plan_id } => json!({
            "id": ship_id,
            "action": "GetFlightPlanDetails",
            "planId": plan_id,
        }),
        Request::Buy { good, quantity } => json!({
            "id": ship_id,
            "action": "PostBuyOrderNew",
            "shipId": ship_id,
            "good": good,
            "quantity": quantity,
        }),
        Request::Sell { good, quantity } => json!({
            "id": ship_id,
            "action": "PostSellOrderNew",
            "shipId": ship_id,
            "good": good,
            "quantity": quantity,
        }),
    }
}

pub struct QueueTransport {
    connection: Arc<dyn QueueConnection>,
    ship_id: String,
    poll_interval: Duration,
    response_timeout: Duration,
    retry: RetryConfig,
    shutdown: Shutdown,
}

impl QueueTransport {
    pub fn new(
        connection: Arc<dyn QueueConnection>,
        ship_id: &str,
        poll_interval: Duration,
        response_timeout: Duration,
        retry: RetryConfig,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            connection,
            ship_id: ship_id.to_string(),
            poll_interval,
            response_timeout,
            retry,
            shutdown,
        }
    }

    async fn exchange_once(&self, request: &Request) -> Result<String, TransportError> {
        let key = Uuid::new_v4().to_string();
        let value = command_envelope(&self.ship_id, request).to_string();
        trace!(key = %key, command = %value, "Publishing queue command");
        self.connection
            .publish(QueueMessage {
                key: key.clone(),
                value,
            })
            .await?;

        let deadline = Instant::now() + self.response_timeout;
        loop {
            let now = Instant::now();
            if now >= deadline {
                debug!(key = %key, request = %request, "No queue response before deadline");
                return Err(TransportError::Timeout);
            }
            let wait = self.poll_interval.min(deadline - now);

            match self.shutdown.guard(self.connection.next_message(wait)).await?? {
                Some(message) if message.key == key && !message.value.is_empty() => {
                    return Ok(message.value);
                }
                Some(message) => {
                    trace!(expected = %key, got = %message.key, "Skipping uncorrelated message");
                }
                None => {}
            }
        }
    }
}

#[async_trait]
impl Transport for QueueTransport {
    async fn exchange(&self, request: Request) -> Result<String, TransportError> {
        debug!(ship = %self.ship_id, request = %request, "Queue exchange");
        let label = request.to_string();
        with_retry(&self.retry, &self.shutdown, &label, || self.exchange_once(&request)).await
    }
}

/// In-process queue. The [`QueueResponder`] half plays the broker-side worker.
pub struct ChannelQueue {
    outbound: mpsc::UnboundedSender<QueueMessage>,
    inbound: Mutex<mpsc::UnboundedReceiver<QueueMessage>>,
}

pub struct QueueResponder {
    requests: Mutex<mpsc::UnboundedReceiver<QueueMessage>>,
    responses: mpsc::UnboundedSender<QueueMessage>,
}

impl ChannelQueue {
    pub fn pair() -> (ChannelQueue, QueueResponder) {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (response_tx, response_rx) = mpsc::unbounded_channel();
        (
            ChannelQueue {
                outbound: request_tx,
                inbound: Mutex::new(response_rx),
            },
            QueueResponder {
                requests: Mutex::new(request_rx),
                responses: response_tx,
            },
        )
    }
}

#[async_trait]
impl QueueConnection for ChannelQueue {
    async fn publish(&self, message: QueueMessage) -> Result<(), TransportError> {
        self.outbound
            .send(message)
            .map_err(|_| TransportError::Queue("responder dropped".to_string()))
    }

    async fn next_message(&self, wait: Duration) -> Result<Option<QueueMessage>, TransportError> {
        let mut inbound = self.inbound.lock().await;
        match tokio::time::timeout(wait, inbound.recv()).await {
            Ok(Some(message)) => Ok(Some(message)),
            Ok(None) => Err(TransportError::Queue("responder dropped".to_string())),
            Err(_) => Ok(None),
        }
    }
}

impl QueueResponder {
    /// Next command published by the transport, or `None` once it is gone.
    pub async fn next_request(&self) -> Option<QueueMessage> {
        self.requests.lock().await.recv().await
    }

    pub fn respond(&self, key: &str, value: &str) -> Result<(), TransportError> {
        self.responses
            .send(QueueMessage {
                key: key.to_string(),
                value: value.to_string(),
            })
            .map_err(|_| TransportError::Queue("transport dropped".to_string()))
    }
}

/// Newline-delimited JSON `{key, value}` frames over a TCP bridge to the broker.
pub struct TcpQueueConnection {
    writer: Mutex<OwnedWriteHalf>,
    reader: Mutex<Lines<BufReader<OwnedReadHalf>>>,
}

impl TcpQueueConnection {
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(Self::from_stream(stream))
    }

    pub fn from_stream(stream: TcpStream) -> Self {
        let (read_half, write_half) = stream.into_split();
        Self {
            writer: Mutex::new(write_half),
            reader: Mutex::new(BufReader::new(read_half).lines()),
        }
    }
}

#[async_trait]
impl QueueConnection for TcpQueueConnection {
    async fn publish(&self, message: QueueMessage) -> Result<(), TransportError> {
        let mut frame =
            serde_json::to_string(&message).map_err(|e| TransportError::Queue(e.to_string()))?;
        frame.push('\n');

        let mut writer = self.writer.lock().await;
        writer
            .write_all(frame.as_bytes())
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        writer
            .flush()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))
    }

    async fn next_message(&self, wait: Duration) -> Result<Option<QueueMessage>, TransportError> {
        let mut reader = self.reader.lock().await;
        match tokio::time::timeout(wait, reader.next_line()).await {
            Err(_) => Ok(None),
            Ok(Ok(Some(line))) if line.trim().is_empty() => Ok(None),
            Ok(Ok(Some(line))) => serde_json::from_str(&line)
                .map(Some)
                .map_err(|e| TransportError::Queue(format!("malformed frame: {}", e))),
            Ok(Ok(None)) => Err(TransportError::Queue("broker closed the connection".to_string())),
            Ok(Err(e)) => Err(TransportError::Network(e.to_string())),
        }
    }
}
