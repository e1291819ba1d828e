use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::StreamConfig;
use crate::error::{GestureError, GestureResult};

/// Blocking source of raw stream bytes.
///
/// Returns `StreamClosed` when the remote end has no more data; both that and
/// `Transport` are retryable by reconnecting.
pub trait ByteSource {
    fn read_chunk(&mut self, max_bytes: usize) -> GestureResult<Vec<u8>>;
}

fn read_from<R: Read>(reader: &mut R, max_bytes: usize) -> GestureResult<Vec<u8>> {
    let mut buf = vec![0u8; max_bytes];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => return Err(GestureError::StreamClosed),
            Ok(n) => {
                buf.truncate(n);
                return Ok(buf);
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(GestureError::Transport(e.to_string())),
        }
    }
}

/// MJPEG stream served by the camera board over HTTP(S).
///
/// The client timeout bounds every body read, so a stalled camera surfaces as a
/// `Transport` error. Dropping the stream closes the connection.
pub struct HttpStream {
    response: reqwest::blocking::Response,
}

impl HttpStream {
    pub fn connect(config: &StreamConfig) -> GestureResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .danger_accept_invalid_hostnames(config.accept_invalid_certs)
            .connect_timeout(config.read_timeout())
            .timeout(config.read_timeout())
            .build()
            .map_err(|e| GestureError::Transport(format!("HTTP client: {}", e)))?;

        let response = client
            .get(&config.url)
            .send()
            .map_err(|e| GestureError::Transport(format!("{}: {}", config.url, e)))?;

        if !response.status().is_success() {
            return Err(GestureError::Transport(format!(
                "{} answered {}",
                config.url,
                response.status()
            )));
        }

        info!("Connected to stream {}", config.url);
        Ok(Self { response })
    }
}

impl ByteSource for HttpStream {
    fn read_chunk(&mut self, max_bytes: usize) -> GestureResult<Vec<u8>> {
        read_from(&mut self.response, max_bytes)
    }
}

/// Replays a recorded stream dump, for offline runs and tests.
pub struct ReplaySource<R: Read> {
    reader: R,
}

impl ReplaySource<File> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open replay file {}", path.display()))?;
        Ok(Self { reader: file })
    }
}

impl<R: Read> ReplaySource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: Read> ByteSource for ReplaySource<R> {
    fn read_chunk(&mut self, max_bytes: usize) -> GestureResult<Vec<u8>> {
        read_from(&mut self.reader, max_bytes)
    }
}
