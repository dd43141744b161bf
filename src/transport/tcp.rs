use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::time::{timeout, Duration};

use crate::transport::framing::{read_frame, write_frame, MAX_FRAME_SIZE};
use crate::transport::Transport;

/// Default timeout for one send or receive.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Framed TCP connection sending `Out` and receiving `In`.
pub struct TcpTransport<Out, In> {
    stream: TcpStream,
    timeout_duration: Duration,
    max_frame_size: u32,
    _messages: PhantomData<fn(Out) -> In>,
}

impl<Out, In> TcpTransport<Out, In> {
    pub fn new(stream: TcpStream) -> Self {
        Self::with_config(stream, DEFAULT_TIMEOUT, MAX_FRAME_SIZE)
    }

    pub fn with_config(stream: TcpStream, timeout_duration: Duration, max_frame_size: u32) -> Self {
        Self {
            stream,
            timeout_duration,
            max_frame_size,
            _messages: PhantomData,
        }
    }

    pub async fn connect<A: ToSocketAddrs>(addr: A) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self::new(stream))
    }

    /// Gives back the socket, e.g. to split it after a handshake.
    pub fn into_inner(self) -> TcpStream {
        self.stream
    }
}

#[async_trait::async_trait]
impl<Out, In> Transport<Out, In> for TcpTransport<Out, In>
where
    Out: Serialize + Send + Sync + 'static,
    In: DeserializeOwned + Send + 'static,
{
    async fn send(&mut self, msg: Out) -> anyhow::Result<()> {
        timeout(
            self.timeout_duration,
            write_frame(&mut self.stream, &msg, self.max_frame_size),
        )
        .await
        .map_err(|_| anyhow::anyhow!("Send timeout after {:?}", self.timeout_duration))?
    }

    async fn recv(&mut self) -> anyhow::Result<In> {
        timeout(
            self.timeout_duration,
            read_frame(&mut self.stream, self.max_frame_size),
        )
        .await
        .map_err(|_| anyhow::anyhow!("Receive timeout after {:?}", self.timeout_duration))?
    }
}
