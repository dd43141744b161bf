//! Message transports. Everything on the wire is a length-prefixed bincode
//! frame.

use serde::de::DeserializeOwned;
use serde::Serialize;

pub mod framing;
pub mod tcp;

/// A bidirectional, message-oriented channel sending `Out` and receiving `In`.
#[async_trait::async_trait]
pub trait Transport<Out, In>: Send
where
    Out: Serialize + Send + 'static,
    In: DeserializeOwned + Send + 'static,
{
    async fn send(&mut self, msg: Out) -> anyhow::Result<()>;
    async fn recv(&mut self) -> anyhow::Result<In>;
}
