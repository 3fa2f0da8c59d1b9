//! 帧传输
//!
//! 每条消息占一帧：1 字节协议版本 + 4 字节大端长度 + bincode 负载。
//! `FramedStream` 可以包装任意一对读写端，TCP 连接和进程内管道共用同一套编解码，
//! 上层只依赖 `Connection` trait。

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::io::{
    AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, DuplexStream, ReadHalf, WriteHalf,
};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::{ProtocolError, Result};
use crate::{CONNECT_TIMEOUT, DEFAULT_PORT, MAX_FRAME_SIZE, PROTOCOL_VERSION};

/// 网络配置
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub host: String,
    pub port: u16,
}

impl NetworkConfig {
    /// 监听/连接地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// 双向消息通道
#[async_trait]
pub trait Connection: Send + Sync {
    /// 发送一条消息
    async fn send<M: Serialize + Send + Sync>(&mut self, msg: &M) -> Result<()>;

    /// 接收一条消息，对端关闭时返回 `ConnectionClosed`
    async fn recv<M: DeserializeOwned>(&mut self) -> Result<M>;

    /// 远端地址（进程内通道没有）
    fn peer_addr(&self) -> Option<String>;
}

/// 主动建立连接的一方
#[async_trait]
pub trait Connector: Send + Sync {
    type Conn: Connection;

    async fn connect(&self, addr: &str) -> Result<Self::Conn>;
}

/// 等待连接的一方
#[async_trait]
pub trait Listener: Send + Sync + Sized {
    type Conn: Connection;

    async fn bind(addr: &str) -> Result<Self>;

    async fn accept(&mut self) -> Result<Self::Conn>;

    fn local_addr(&self) -> Option<String>;
}

/// 帧头
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub version: u8,
    /// 负载字节数
    pub length: u32,
}

impl FrameHeader {
    /// 编码后的字节数
    pub const SIZE: usize = 5;

    /// 为给定长度的负载构造帧头
    pub fn for_payload(length: usize) -> Result<Self> {
        if length > MAX_FRAME_SIZE {
            return Err(ProtocolError::FrameTooLarge {
                size: length,
                max: MAX_FRAME_SIZE,
            });
        }
        Ok(Self {
            version: PROTOCOL_VERSION,
            length: length as u32,
        })
    }

    pub fn to_bytes(self) -> [u8; Self::SIZE] {
        let len = self.length.to_be_bytes();
        [self.version, len[0], len[1], len[2], len[3]]
    }

    /// 解析并校验帧头
    pub fn parse(bytes: [u8; Self::SIZE]) -> Result<Self> {
        let version = bytes[0];
        if version != PROTOCOL_VERSION {
            warn!("Rejected frame with protocol version {}", version);
            return Err(ProtocolError::VersionMismatch {
                expected: PROTOCOL_VERSION,
                actual: version,
            });
        }

        let length = u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]);
        if length as usize > MAX_FRAME_SIZE {
            warn!("Rejected oversized frame: {} bytes", length);
            return Err(ProtocolError::FrameTooLarge {
                size: length as usize,
                max: MAX_FRAME_SIZE,
            });
        }

        Ok(Self { version, length })
    }
}

/// 读到流末尾视为对端关闭
fn map_eof(e: std::io::Error) -> ProtocolError {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        ProtocolError::ConnectionClosed
    } else {
        ProtocolError::Io(e)
    }
}

/// 分帧的读写端
pub struct FramedStream<R, W> {
    reader: R,
    writer: W,
    /// 复用的负载缓冲区
    buffer: Vec<u8>,
    peer_addr: Option<String>,
}

impl<R, W> FramedStream<R, W>
where
    R: AsyncRead + Unpin + Send + Sync,
    W: AsyncWrite + Unpin + Send + Sync,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            buffer: Vec::new(),
            peer_addr: None,
        }
    }

    pub fn with_peer_addr(mut self, peer_addr: Option<String>) -> Self {
        self.peer_addr = peer_addr;
        self
    }

    /// 读取并解码一帧
    pub async fn read_frame<M: DeserializeOwned>(&mut self) -> Result<M> {
        let mut raw = [0u8; FrameHeader::SIZE];
        self.reader.read_exact(&mut raw).await.map_err(map_eof)?;
        let header = FrameHeader::parse(raw)?;

        let length = header.length as usize;
        if self.buffer.len() < length {
            self.buffer.resize(length, 0);
        }
        self.reader
            .read_exact(&mut self.buffer[..length])
            .await
            .map_err(map_eof)?;

        Ok(bincode::deserialize(&self.buffer[..length])?)
    }

    /// 编码并写入一帧
    pub async fn write_frame<M: Serialize>(&mut self, msg: &M) -> Result<()> {
        let payload = bincode::serialize(msg)?;
        let header = FrameHeader::for_payload(payload.len())?;

        self.writer.write_all(&header.to_bytes()).await?;
        self.writer.write_all(&payload).await?;
        self.writer.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl<R, W> Connection for FramedStream<R, W>
where
    R: AsyncRead + Unpin + Send + Sync,
    W: AsyncWrite + Unpin + Send + Sync,
{
    async fn send<M: Serialize + Send + Sync>(&mut self, msg: &M) -> Result<()> {
        self.write_frame(msg).await
    }

    async fn recv<M: DeserializeOwned>(&mut self) -> Result<M> {
        self.read_frame().await
    }

    fn peer_addr(&self) -> Option<String> {
        self.peer_addr.clone()
    }
}

/// TCP 连接
pub type TcpConnection = FramedStream<OwnedReadHalf, OwnedWriteHalf>;

impl FramedStream<OwnedReadHalf, OwnedWriteHalf> {
    pub fn from_tcp(stream: TcpStream) -> Result<Self> {
        stream.set_nodelay(true)?;
        let peer_addr = stream.peer_addr().ok().map(|a| a.to_string());
        let (read_half, write_half) = stream.into_split();

        Ok(Self::new(read_half, write_half).with_peer_addr(peer_addr))
    }
}

/// 进程内管道连接
pub type DuplexConnection = FramedStream<ReadHalf<DuplexStream>, WriteHalf<DuplexStream>>;

/// 创建一对互通的进程内连接
pub fn duplex_pair(max_buf_size: usize) -> (DuplexConnection, DuplexConnection) {
    let (a, b) = tokio::io::duplex(max_buf_size);
    let (a_read, a_write) = tokio::io::split(a);
    let (b_read, b_write) = tokio::io::split(b);
    (
        FramedStream::new(a_read, a_write),
        FramedStream::new(b_read, b_write),
    )
}

/// TCP 连接器
pub struct TcpConnector;

#[async_trait]
impl Connector for TcpConnector {
    type Conn = TcpConnection;

    async fn connect(&self, addr: &str) -> Result<Self::Conn> {
        let stream = timeout(CONNECT_TIMEOUT, TcpStream::connect(addr))
            .await
            .map_err(|_| ProtocolError::ConnectionTimeout)?
            .map_err(ProtocolError::Io)?;

        debug!("Connected to {}", addr);
        TcpConnection::from_tcp(stream)
    }
}

/// TCP 监听器
pub struct TcpListener {
    listener: tokio::net::TcpListener,
}

#[async_trait]
impl Listener for TcpListener {
    type Conn = TcpConnection;

    async fn bind(addr: &str) -> Result<Self> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        Ok(Self { listener })
    }

    async fn accept(&mut self) -> Result<Self::Conn> {
        let (stream, _) = self.listener.accept().await?;
        TcpConnection::from_tcp(stream)
    }

    fn local_addr(&self) -> Option<String> {
        self.listener.local_addr().ok().map(|a| a.to_string())
    }
}
