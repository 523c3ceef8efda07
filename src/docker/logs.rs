use crate::docker::client::DockerClient;
use crate::error::Result;
use crate::stream::demux::{LogStream, decode_all};
use crate::stream::raw::RawLineDecoder;

/// Default number of trailing lines requested from the Engine.
pub const DEFAULT_TAIL: usize = 100;

/// Fetches container logs and splits them into lines, picking the decoder
/// from the container's TTY setting.
#[derive(Debug, Clone)]
pub struct LogFetcher {
    client: DockerClient,
}

impl LogFetcher {
    pub fn new(client: DockerClient) -> Self {
        Self { client }
    }

    /// TTY containers return every line; others return only lines of
    /// `stream`.
    pub async fn fetch_logs(
        &self,
        container_id: &str,
        tail: usize,
        stream: LogStream,
    ) -> Result<Vec<Vec<u8>>> {
        let tty = self.client.is_tty_enabled(container_id).await?;
        let data = self.client.container_logs(container_id, tail).await?;

        if tty {
            let mut decoder = RawLineDecoder::default();
            let mut lines = decoder.append(&data);
            lines.extend(decoder.flush());
            return Ok(lines);
        }

        Ok(decode_all(&data, true)
            .into_iter()
            .filter(|line| line.stream == stream)
            .map(|line| line.message)
            .collect())
    }
}
