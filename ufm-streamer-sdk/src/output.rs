//! Output backends for emitting stream records.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::error::OutputError;
use crate::forward::ForwardMessage;

/// Default connect/write timeout for forward outputs.
pub const DEFAULT_FORWARD_TIMEOUT: Duration = Duration::from_secs(10);

/// Output destination for stream records.
///
/// Configure where the emitter should send each record.
#[derive(Debug)]
pub enum Output {
    /// Send records to a Fluentd `in_forward` listener.
    ///
    /// Each record is written as one JSON forward message over a fresh TCP
    /// connection.
    Forward { addr: String, timeout: Duration },

    /// Write the latest message to a JSON file.
    ///
    /// The file is overwritten with each record.
    File(PathBuf),

    /// Send messages through a channel.
    ///
    /// Use `Output::channel()` to create this variant and get the receiver.
    Channel(mpsc::Sender<ForwardMessage>),
}

impl Output {
    /// Create a forward output with the default timeout.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ufm_streamer_sdk::Output;
    ///
    /// let output = Output::forward("localhost:24224");
    /// ```
    pub fn forward(addr: impl Into<String>) -> Self {
        Self::forward_with_timeout(addr, DEFAULT_FORWARD_TIMEOUT)
    }

    /// Create a forward output with an explicit connect/write timeout.
    pub fn forward_with_timeout(addr: impl Into<String>, timeout: Duration) -> Self {
        Output::Forward {
            addr: addr.into(),
            timeout,
        }
    }

    /// Create a file output.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ufm_streamer_sdk::Output;
    ///
    /// let output = Output::file("last_record.json");
    /// ```
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Output::File(path.into())
    }

    /// Create a channel output and return both the output and receiver.
    ///
    /// This is useful for integrating with your own record handling.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ufm_streamer_sdk::Output;
    ///
    /// let (output, mut rx) = Output::channel(16);
    ///
    /// // Later, receive messages
    /// // while let Some(message) = rx.recv().await {
    /// //     println!("record #{}", message.record.sequence_stamp);
    /// // }
    /// ```
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<ForwardMessage>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Output::Channel(tx), rx)
    }

    /// Emit a message to this output.
    pub(crate) async fn emit(&self, message: &ForwardMessage) -> Result<(), OutputError> {
        match self {
            Output::Forward { addr, timeout: limit } => {
                let line = message.to_line()?;

                let mut stream = timeout(*limit, TcpStream::connect(addr.as_str()))
                    .await
                    .map_err(|_| OutputError::Timeout(addr.clone()))??;

                timeout(*limit, async {
                    stream.write_all(&line).await?;
                    stream.flush().await?;
                    stream.shutdown().await
                })
                .await
                .map_err(|_| OutputError::Timeout(addr.clone()))??;
            }
            Output::File(path) => {
                let json = serde_json::to_string_pretty(message)?;
                tokio::fs::write(path, json).await?;
            }
            Output::Channel(tx) => {
                tx.try_send(message.clone()).map_err(|e| match e {
                    mpsc::error::TrySendError::Full(_) => OutputError::ChannelFull,
                    mpsc::error::TrySendError::Closed(_) => OutputError::ChannelClosed,
                })?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Forward { addr, .. } => write!(f, "forward://{}", addr),
            Output::File(path) => write!(f, "file://{}", path.display()),
            Output::Channel(_) => f.write_str("channel"),
        }
    }
}
