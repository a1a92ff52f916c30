// Client module - transport contract, retry policy and the two backends
pub mod transport;
pub mod retry;
pub mod http;
pub mod queue;

pub use transport::{Request, Transport};
pub use retry::{RetryConfig, with_retry, parse_retry_after};
pub use http::HttpTransport;
pub use queue::{ChannelQueue, QueueConnection, QueueMessage, QueueResponder, QueueTransport, TcpQueueConnection};
