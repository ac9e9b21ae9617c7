mod admin;
mod batch;
mod builder;
mod query;
mod record;

pub use builder::KvClientBuilder;
pub use query::{StreamEntry, StreamOutput};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;

use super::protocol::{
    decode_message, encode_command, Command, DriverError, ErrorInfo, Response, DRIVER_MAGIC,
    MAX_MESSAGE_SIZE,
};

const DEFAULT_POOL_SIZE: usize = 4;

struct PooledConnection {
    read: OwnedReadHalf,
    write: OwnedWriteHalf,
}

/// Client for one kvproxy socket. Requests are spread round-robin over a
/// small pool of connections; each connection serves one request at a time.
pub struct KvClient {
    pool: Vec<PooledConnection>,
    next_index: usize,
}

impl KvClient {
    pub async fn connect(path: &str) -> Result<Self, DriverError> {
        Self::connect_with_pool(path, DEFAULT_POOL_SIZE).await
    }

    pub async fn connect_with_pool(path: &str, pool_size: usize) -> Result<Self, DriverError> {
        let pool_size = pool_size.max(1);
        let mut pool_connections: Vec<PooledConnection> = Vec::with_capacity(pool_size);

        for _ in 0..pool_size {
            let stream = UnixStream::connect(path).await.map_err(|e| {
                DriverError::ConnectionError(format!("Failed to connect to {}: {}", path, e))
            })?;

            let (read, mut write) = stream.into_split();

            write.write_all(DRIVER_MAGIC).await.map_err(|e| {
                DriverError::ConnectionError(format!("Failed to send magic header: {}", e))
            })?;

            pool_connections.push(PooledConnection { read, write });
        }

        tracing::debug!("Connected to {} with {} connections", path, pool_size);

        Ok(Self {
            pool: pool_connections,
            next_index: 0,
        })
    }

    fn get_next_connection(&mut self) -> &mut PooledConnection {
        let idx = self.next_index;
        self.next_index = (self.next_index + 1) % self.pool.len();
        &mut self.pool[idx]
    }

    async fn write_command(
        conn: &mut PooledConnection,
        command: &Command,
    ) -> Result<(), DriverError> {
        let data = encode_command(command)?;
        conn.write
            .write_all(&data)
            .await
            .map_err(|e| DriverError::ConnectionError(format!("Write failed: {}", e)))?;
        conn.write
            .flush()
            .await
            .map_err(|e| DriverError::ConnectionError(format!("Flush failed: {}", e)))
    }

    async fn read_response(conn: &mut PooledConnection) -> Result<Response, DriverError> {
        let mut len_buf = [0u8; 4];
        conn.read
            .read_exact(&mut len_buf)
            .await
            .map_err(|e| DriverError::ConnectionError(format!("Read length failed: {}", e)))?;

        let msg_len = u32::from_be_bytes(len_buf) as usize;
        if msg_len > MAX_MESSAGE_SIZE {
            return Err(DriverError::MessageTooLarge);
        }

        let mut payload = vec![0u8; msg_len];
        conn.read
            .read_exact(&mut payload)
            .await
            .map_err(|e| DriverError::ConnectionError(format!("Read payload failed: {}", e)))?;

        decode_message(&payload)
    }

    /// Sends a unary command and waits for its single response frame.
    pub async fn send_command(&mut self, command: Command) -> Result<Response, DriverError> {
        let conn = self.get_next_connection();
        Self::write_command(conn, &command).await?;
        Self::read_response(conn).await
    }

    /// Sends a streaming command and collects frames up to `StreamEnd`.
    pub(crate) async fn send_streaming(
        &mut self,
        command: Command,
    ) -> Result<Vec<Response>, DriverError> {
        let conn = self.get_next_connection();
        Self::write_command(conn, &command).await?;

        let mut frames = Vec::new();
        loop {
            let response = Self::read_response(conn).await?;
            let done = matches!(
                response,
                Response::StreamEnd { .. } | Response::Error { .. }
            );
            frames.push(response);
            if done {
                return Ok(frames);
            }
        }
    }

    pub(crate) fn unexpected(response: Response) -> DriverError {
        match response {
            Response::Error { error } => error,
            other => DriverError::ProtocolError(format!("Unexpected response: {:?}", other)),
        }
    }

    pub(crate) fn extract_status(response: Response) -> Result<Option<ErrorInfo>, DriverError> {
        match response {
            Response::Status { error } => Ok(error),
            other => Err(Self::unexpected(other)),
        }
    }

    pub async fn version(&mut self) -> Result<String, DriverError> {
        match self.send_command(Command::Version).await? {
            Response::Version { version } => Ok(version),
            other => Err(Self::unexpected(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::encode_response;
    use tempfile::TempDir;
    use tokio::net::UnixListener;

    async fn read_frame(stream: &mut UnixStream) -> Command {
        let mut len_buf = [0u8; 4];
        stream.read_exact(&mut len_buf).await.unwrap();
        let mut payload = vec![0u8; u32::from_be_bytes(len_buf) as usize];
        stream.read_exact(&mut payload).await.unwrap();
        decode_message(&payload).unwrap()
    }

    #[tokio::test]
    async fn test_connect_sends_magic_and_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fake.sock");
        let listener = UnixListener::bind(&path).unwrap();

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut magic = [0u8; DRIVER_MAGIC.len()];
            stream.read_exact(&mut magic).await.unwrap();
            assert_eq!(&magic, DRIVER_MAGIC);

            assert!(matches!(read_frame(&mut stream).await, Command::Version));
            let reply = encode_response(&Response::Version {
                version: "fake-1".to_string(),
            })
            .unwrap();
            stream.write_all(&reply).await.unwrap();
        });

        let mut client = KvClient::connect_with_pool(path.to_str().unwrap(), 1)
            .await
            .unwrap();
        assert_eq!(client.version().await.unwrap(), "fake-1");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_oversized_response_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("big.sock");
        let listener = UnixListener::bind(&path).unwrap();

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut magic = [0u8; DRIVER_MAGIC.len()];
            stream.read_exact(&mut magic).await.unwrap();
            read_frame(&mut stream).await;
            let len = (MAX_MESSAGE_SIZE as u32) + 1;
            stream.write_all(&len.to_be_bytes()).await.unwrap();
        });

        let mut client = KvClientBuilder::new(path.to_str().unwrap())
            .pool_size(1)
            .build()
            .await
            .unwrap();
        let err = client.version().await.unwrap_err();
        assert_eq!(err, DriverError::MessageTooLarge);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_to_missing_socket() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.sock");
        let result = KvClient::connect(path.to_str().unwrap()).await;
        assert!(matches!(result, Err(DriverError::ConnectionError(_))));
    }
}
