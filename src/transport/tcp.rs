#![cfg(feature = "std")]

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::time::{timeout, Duration};

use crate::protocol::Message;
use crate::transport::Transport;

/// Default timeout for request/response connections (30 seconds).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum frame size (1 MB) to bound memory allocation on receive.
const MAX_FRAME_SIZE: u32 = 1_000_000;

/// Length-prefixed bincode frames over a TCP stream.
///
/// A transport built with [`TcpTransport::new`] has no operation timeout:
/// subscription streams legitimately sit idle between events. RPC
/// connections use [`TcpTransport::with_timeout`] so a dead peer cannot hang
/// a caller.
pub struct TcpTransport {
    stream: TcpStream,
    op_timeout: Option<Duration>,
    max_frame_size: u32,
}

impl TcpTransport {
    pub fn new(stream: TcpStream) -> Self {
        Self {
            stream,
            op_timeout: None,
            max_frame_size: MAX_FRAME_SIZE,
        }
    }

    pub fn with_timeout(stream: TcpStream, op_timeout: Duration) -> Self {
        Self {
            stream,
            op_timeout: Some(op_timeout),
            max_frame_size: MAX_FRAME_SIZE,
        }
    }

    /// Connect without an operation timeout (event streams).
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self::new(stream))
    }

    /// Connect with the default RPC timeout.
    pub async fn connect_rpc<A: ToSocketAddrs>(addr: A) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self::with_timeout(stream, DEFAULT_TIMEOUT))
    }
}

#[async_trait::async_trait]
impl Transport for TcpTransport {
    async fn send(&mut self, msg: Message) -> anyhow::Result<()> {
        let data = bincode::serialize(&msg)
            .map_err(|e| anyhow::anyhow!("serialization error: {}", e))?;
        if data.len() as u32 > self.max_frame_size {
            return Err(anyhow::anyhow!(
                "frame too large: {} bytes (max: {})",
                data.len(),
                self.max_frame_size
            ));
        }
        let op_timeout = self.op_timeout;
        let stream = &mut self.stream;
        let op = async move {
            let len = (data.len() as u32).to_be_bytes();
            stream.write_all(&len).await.map_err(map_io_err)?;
            stream.write_all(&data).await.map_err(map_io_err)?;
            anyhow::Ok(())
        };
        match op_timeout {
            Some(limit) => timeout(limit, op)
                .await
                .map_err(|_| anyhow::anyhow!("send timed out after {:?}", limit))?,
            None => op.await,
        }
    }

    async fn recv(&mut self) -> anyhow::Result<Message> {
        let max_frame_size = self.max_frame_size;
        let op_timeout = self.op_timeout;
        let stream = &mut self.stream;
        let op = async move {
            let mut len_buf = [0u8; 4];
            stream.read_exact(&mut len_buf).await.map_err(map_io_err)?;
            let len = u32::from_be_bytes(len_buf);
            if len > max_frame_size {
                return Err(anyhow::anyhow!(
                    "frame too large: {} bytes (max: {})",
                    len,
                    max_frame_size
                ));
            }
            if len == 0 {
                return Err(anyhow::anyhow!("invalid frame length: 0"));
            }
            let mut buf = vec![0u8; len as usize];
            stream.read_exact(&mut buf).await.map_err(map_io_err)?;
            let msg = bincode::deserialize(&buf)
                .map_err(|e| anyhow::anyhow!("deserialization error: {}", e))?;
            anyhow::Ok(msg)
        };
        match op_timeout {
            Some(limit) => timeout(limit, op)
                .await
                .map_err(|_| anyhow::anyhow!("receive timed out after {:?}", limit))?,
            None => op.await,
        }
    }
}

fn map_io_err(e: std::io::Error) -> anyhow::Error {
    match e.kind() {
        std::io::ErrorKind::UnexpectedEof | std::io::ErrorKind::BrokenPipe => {
            anyhow::anyhow!("connection closed by peer")
        }
        std::io::ErrorKind::ConnectionReset => anyhow::anyhow!("connection reset by peer"),
        _ => anyhow::anyhow!("io error: {}", e),
    }
}
