//! Connection handler for the driver protocol
//!
//! Reads framed commands from one client connection, decodes them into the
//! store model, executes them against the cluster's `StoreClient` and
//! writes the encoded responses back.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::UnixStream;

use crate::error::ProxyResult;
use crate::store::StoreClient;

use kvproxy_client::protocol::{
    decode_message, encode_response, Command, DriverError, Response, DRIVER_MAGIC,
    MAX_MESSAGE_SIZE,
};

pub mod admin;
pub mod batch;
pub mod index;
pub mod record;
pub mod scan;
pub mod udf;

pub use scan::{forward_records, StreamSink};

/// Handler for a single driver connection
pub struct DriverHandler {
    pub(crate) store: Arc<dyn StoreClient>,
    /// Name of the configured cluster this connection is bound to
    pub(crate) cluster: String,
}

impl DriverHandler {
    pub fn new(store: Arc<dyn StoreClient>, cluster: impl Into<String>) -> Self {
        Self {
            store,
            cluster: cluster.into(),
        }
    }

    /// Serve one connection until the peer hangs up or a write fails.
    pub async fn handle_connection<S>(&mut self, mut stream: S, addr: String)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        tracing::info!("Driver connection from {} on cluster {}", addr, self.cluster);

        let mut magic = [0u8; DRIVER_MAGIC.len()];
        if let Err(e) = stream.read_exact(&mut magic).await {
            tracing::debug!("Driver connection {} closed before handshake: {}", addr, e);
            return;
        }
        if magic[..] != DRIVER_MAGIC[..] {
            tracing::warn!("Rejecting {}: bad magic header", addr);
            return;
        }

        loop {
            // Read message length (4 bytes, big-endian)
            let mut len_buf = [0u8; 4];
            match stream.read_exact(&mut len_buf).await {
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    tracing::debug!("Driver connection closed: {}", addr);
                    break;
                }
                Err(e) => {
                    tracing::warn!("Driver read error from {}: {}", addr, e);
                    break;
                }
            }

            let msg_len = u32::from_be_bytes(len_buf) as usize;

            if msg_len > MAX_MESSAGE_SIZE {
                let resp = Response::error(DriverError::MessageTooLarge);
                if let Err(e) = send_response(&mut stream, &resp).await {
                    tracing::warn!("Failed to send error response: {}", e);
                }
                break;
            }

            let mut payload = vec![0u8; msg_len];
            if let Err(e) = stream.read_exact(&mut payload).await {
                tracing::warn!("Driver read payload error from {}: {}", addr, e);
                break;
            }

            let command: Command = match decode_message(&payload) {
                Ok(cmd) => cmd,
                Err(e) => {
                    tracing::warn!("Undecodable command from {}: {}", addr, e);
                    let resp = Response::error(e);
                    if let Err(e) = send_response(&mut stream, &resp).await {
                        tracing::warn!("Failed to send error response: {}", e);
                    }
                    continue;
                }
            };

            tracing::debug!("{} from {}", command.name(), addr);

            if command.is_streaming() {
                let streamed = AssertUnwindSafe(self.execute_stream(command, &mut stream))
                    .catch_unwind()
                    .await;
                let outcome = match streamed {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        tracing::warn!("Streaming command from {} panicked", addr);
                        send_response(&mut stream, &panicked()).await
                    }
                };
                if let Err(e) = outcome {
                    tracing::warn!("Failed to stream results to {}: {}", addr, e);
                    break;
                }
                continue;
            }

            let response = match AssertUnwindSafe(self.execute_command(command))
                .catch_unwind()
                .await
            {
                Ok(response) => response,
                Err(_) => {
                    tracing::warn!("Command from {} panicked", addr);
                    panicked()
                }
            };

            if let Err(e) = send_response(&mut stream, &response).await {
                tracing::warn!("Failed to send response to {}: {}", addr, e);
                break;
            }
        }
    }

    /// Execute a unary command and return its response
    async fn execute_command(&mut self, command: Command) -> Response {
        let result: ProxyResult<Response> = match command {
            Command::Version => Ok(Response::version()),

            // ==================== Single Record ====================
            Command::Get {
                policy,
                key,
                bin_names,
            } => record::handle_get(self, policy, key, bin_names).await,

            Command::GetHeader { policy, key } => {
                record::handle_get_header(self, policy, key).await
            }

            Command::Exists { policy, key } => record::handle_exists(self, policy, key).await,

            Command::Put { policy, key, bins } => {
                record::handle_write(self, record::WriteKind::Put, policy, key, bins).await
            }

            Command::Add { policy, key, bins } => {
                record::handle_write(self, record::WriteKind::Add, policy, key, bins).await
            }

            Command::Append { policy, key, bins } => {
                record::handle_write(self, record::WriteKind::Append, policy, key, bins).await
            }

            Command::Prepend { policy, key, bins } => {
                record::handle_write(self, record::WriteKind::Prepend, policy, key, bins).await
            }

            Command::Delete { policy, key } => record::handle_delete(self, policy, key).await,

            Command::Touch { policy, key } => record::handle_touch(self, policy, key).await,

            Command::Operate {
                policy,
                key,
                operations,
            } => record::handle_operate(self, policy, key, operations).await,

            // ==================== Batch ====================
            Command::BatchOperate { policy, records } => {
                batch::handle_batch_operate(self, policy, records).await
            }

            // ==================== Indexes & Truncate ====================
            Command::CreateIndex {
                policy,
                namespace,
                set_name,
                index_name,
                bin_name,
                index_type,
                index_collection_type,
            } => {
                index::handle_create_index(
                    self,
                    policy,
                    index::IndexSpec {
                        namespace,
                        set_name,
                        index_name,
                        bin_name,
                        index_type,
                        collection_type: index_collection_type,
                    },
                )
                .await
            }

            Command::DropIndex {
                policy,
                namespace,
                set_name,
                index_name,
            } => index::handle_drop_index(self, policy, namespace, set_name, index_name).await,

            Command::Truncate {
                policy,
                namespace,
                set_name,
                before_nanos,
            } => index::handle_truncate(self, policy, namespace, set_name, before_nanos).await,

            // ==================== UDF ====================
            Command::RegisterUdf {
                policy,
                udf_body,
                package_name,
                language,
            } => udf::handle_register_udf(self, policy, udf_body, package_name, language).await,

            Command::DropUdf {
                policy,
                package_name,
            } => udf::handle_drop_udf(self, policy, package_name).await,

            Command::ListUdf { policy } => udf::handle_list_udf(self, policy).await,

            Command::UdfExecute {
                policy,
                key,
                package_name,
                function_name,
                args,
            } => {
                udf::handle_udf_execute(self, policy, key, package_name, function_name, args)
                    .await
            }

            // ==================== Users & Roles ====================
            Command::CreateUser {
                policy,
                user,
                password,
                roles,
            } => admin::handle_create_user(self, policy, user, password, roles).await,

            Command::DropUser { policy, user } => admin::handle_drop_user(self, policy, user).await,

            Command::ChangePassword {
                policy,
                user,
                password,
            } => admin::handle_change_password(self, policy, user, password).await,

            Command::GrantRoles {
                policy,
                user,
                roles,
            } => admin::handle_grant_roles(self, policy, user, roles).await,

            Command::RevokeRoles {
                policy,
                user,
                roles,
            } => admin::handle_revoke_roles(self, policy, user, roles).await,

            Command::QueryUsers { policy, user } => {
                admin::handle_query_users(self, policy, user).await
            }

            Command::QueryRoles { policy, role_name } => {
                admin::handle_query_roles(self, policy, role_name).await
            }

            Command::CreateRole {
                policy,
                role_name,
                privileges,
                allowlist,
                read_quota,
                write_quota,
            } => {
                admin::handle_create_role(
                    self,
                    policy,
                    role_name,
                    privileges,
                    allowlist,
                    (read_quota, write_quota),
                )
                .await
            }

            Command::DropRole { policy, role_name } => {
                admin::handle_drop_role(self, policy, role_name).await
            }

            Command::GrantPrivileges {
                policy,
                role_name,
                privileges,
            } => admin::handle_grant_privileges(self, policy, role_name, privileges).await,

            Command::RevokePrivileges {
                policy,
                role_name,
                privileges,
            } => admin::handle_revoke_privileges(self, policy, role_name, privileges).await,

            Command::SetAllowlist {
                policy,
                role_name,
                allowlist,
            } => admin::handle_set_allowlist(self, policy, role_name, allowlist).await,

            Command::SetQuotas {
                policy,
                role_name,
                read_quota,
                write_quota,
            } => {
                admin::handle_set_quotas(self, policy, role_name, read_quota, write_quota).await
            }

            // ==================== Streaming ====================
            Command::Scan { .. } | Command::Query { .. } => Err(
                crate::error::ProxyError::protocol("streaming command sent as unary"),
            ),
        };

        result.unwrap_or_else(|e| {
            tracing::warn!("Rejected command: {}", e);
            Response::error(e.into())
        })
    }

    /// Execute a streaming command, writing its frames directly to `stream`.
    ///
    /// An `Err` means the connection can no longer be written to.
    async fn execute_stream<S>(&mut self, command: Command, stream: &mut S) -> Result<(), DriverError>
    where
        S: AsyncWrite + Unpin + Send,
    {
        let mut sink = FrameSink { stream };
        match command {
            Command::Scan {
                policy,
                partition_filter,
                namespace,
                set_name,
                bin_names,
            } => {
                scan::handle_scan(
                    self,
                    &mut sink,
                    policy,
                    partition_filter,
                    namespace,
                    set_name,
                    bin_names,
                )
                .await
            }
            Command::Query {
                policy,
                statement,
                partition_filter,
            } => scan::handle_query(self, &mut sink, policy, statement, partition_filter).await,
            other => {
                let response = self.execute_command(other).await;
                sink.send(response).await
            }
        }
    }
}

fn panicked() -> Response {
    Response::error(DriverError::InternalError(
        "command failed unexpectedly".to_string(),
    ))
}

/// Send a response to the client
async fn send_response<S>(stream: &mut S, response: &Response) -> Result<(), DriverError>
where
    S: AsyncWrite + Unpin,
{
    let data = encode_response(response)?;
    stream
        .write_all(&data)
        .await
        .map_err(|e| DriverError::ConnectionError(e.to_string()))?;
    stream
        .flush()
        .await
        .map_err(|e| DriverError::ConnectionError(e.to_string()))?;
    Ok(())
}

/// `StreamSink` writing each response as one frame on the connection.
struct FrameSink<'a, S> {
    stream: &'a mut S,
}

#[async_trait::async_trait]
impl<S> StreamSink for FrameSink<'_, S>
where
    S: AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, response: Response) -> Result<(), DriverError> {
        send_response(self.stream, &response).await
    }
}

/// Spawn a task that serves every connection sent on the returned channel.
///
/// `queue_size` bounds the connections accepted but not yet picked up.
pub fn spawn_driver_handler(
    store: Arc<dyn StoreClient>,
    cluster: String,
    queue_size: usize,
) -> tokio::sync::mpsc::Sender<(UnixStream, String)> {
    let (tx, mut rx) = tokio::sync::mpsc::channel::<(UnixStream, String)>(queue_size.max(1));

    tokio::spawn(async move {
        while let Some((stream, addr)) = rx.recv().await {
            let store = store.clone();
            let cluster = cluster.clone();
            tokio::spawn(async move {
                let mut handler = DriverHandler::new(store, cluster);
                handler.handle_connection(stream, addr).await;
            });
        }
    });

    tx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use kvproxy_client::protocol::{encode_command, Bin, Key, ListOp, Operation, Value};
    use tokio::io::DuplexStream;

    async fn connect() -> DuplexStream {
        let (mut client, server) = tokio::io::duplex(64 * 1024);
        let store: Arc<dyn StoreClient> = Arc::new(MemoryStore::new());
        tokio::spawn(async move {
            let mut handler = DriverHandler::new(store, "test");
            handler.handle_connection(server, "duplex".to_string()).await;
        });
        client.write_all(DRIVER_MAGIC).await.unwrap();
        client
    }

    async fn read_frame(client: &mut DuplexStream) -> Response {
        let mut len_buf = [0u8; 4];
        client.read_exact(&mut len_buf).await.unwrap();
        let mut payload = vec![0u8; u32::from_be_bytes(len_buf) as usize];
        client.read_exact(&mut payload).await.unwrap();
        decode_message(&payload).unwrap()
    }

    async fn roundtrip(client: &mut DuplexStream, command: Command) -> Response {
        client
            .write_all(&encode_command(&command).unwrap())
            .await
            .unwrap();
        read_frame(client).await
    }

    // ==================== Framing ====================

    #[tokio::test]
    async fn test_version() {
        let mut client = connect().await;
        let response = roundtrip(&mut client, Command::Version).await;
        assert!(matches!(response, Response::Version { .. }));
    }

    #[tokio::test]
    async fn test_undecodable_payload_keeps_connection() {
        let mut client = connect().await;
        client.write_all(&3u32.to_be_bytes()).await.unwrap();
        client.write_all(&[0xc1, 0xc1, 0xc1]).await.unwrap();
        match read_frame(&mut client).await {
            Response::Error {
                error: DriverError::ProtocolError(_),
            } => {}
            other => panic!("unexpected {:?}", other),
        }

        let response = roundtrip(&mut client, Command::Version).await;
        assert!(matches!(response, Response::Version { .. }));
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected() {
        let mut client = connect().await;
        client
            .write_all(&((MAX_MESSAGE_SIZE as u32) + 1).to_be_bytes())
            .await
            .unwrap();
        assert_eq!(
            read_frame(&mut client).await,
            Response::error(DriverError::MessageTooLarge)
        );
    }

    #[tokio::test]
    async fn test_bad_magic_closes_connection() {
        let (mut client, server) = tokio::io::duplex(1024);
        let store: Arc<dyn StoreClient> = Arc::new(MemoryStore::new());
        let task = tokio::spawn(async move {
            let mut handler = DriverHandler::new(store, "test");
            handler.handle_connection(server, "duplex".to_string()).await;
        });
        client.write_all(b"not-a-driver\0").await.unwrap();
        task.await.unwrap();

        let mut buf = [0u8; 1];
        assert_eq!(client.read(&mut buf).await.unwrap(), 0);
    }

    // ==================== Dispatch ====================

    #[tokio::test]
    async fn test_invalid_operation_fails_only_that_command() {
        let mut client = connect().await;
        let key = Key::new("test", "s", "k");

        let bad = Command::Operate {
            policy: None,
            key: key.clone(),
            operations: vec![Operation::list(ListOp::Append, "l", vec![])],
        };
        match roundtrip(&mut client, bad).await {
            Response::Error {
                error: DriverError::ProtocolError(_),
            } => {}
            other => panic!("unexpected {:?}", other),
        }

        let put = Command::Put {
            policy: None,
            key: key.clone(),
            bins: vec![Bin::new("a", 1i64)],
        };
        assert_eq!(roundtrip(&mut client, put).await, Response::Status { error: None });

        let get = Command::Get {
            policy: None,
            key,
            bin_names: vec![],
        };
        match roundtrip(&mut client, get).await {
            Response::Single { record, error } => {
                assert!(error.is_none());
                assert_eq!(record.unwrap().bins.get("a"), Some(&Value::Int(1)));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_scan_streams_until_end() {
        let mut client = connect().await;
        for i in 0..3i64 {
            let put = Command::Put {
                policy: None,
                key: Key::new("test", "s", i),
                bins: vec![Bin::new("n", i)],
            };
            roundtrip(&mut client, put).await;
        }

        let scan = Command::Scan {
            policy: None,
            partition_filter: None,
            namespace: "test".to_string(),
            set_name: "s".to_string(),
            bin_names: vec![],
        };
        let mut items = 0;
        let mut frame = roundtrip(&mut client, scan).await;
        loop {
            match frame {
                Response::StreamItem { record, error, .. } => {
                    assert!(error.is_none());
                    assert!(record.is_some());
                    items += 1;
                }
                Response::StreamEnd { error } => {
                    assert!(error.is_none());
                    break;
                }
                other => panic!("unexpected {:?}", other),
            }
            frame = read_frame(&mut client).await;
        }
        assert_eq!(items, 3);
    }

    // ==================== Scripted sessions ====================

    #[tokio::test]
    async fn test_scripted_session_writes_exact_frames() {
        let request = encode_command(&Command::Version).unwrap();
        let reply = encode_response(&Response::version()).unwrap();
        let stream = tokio_test::io::Builder::new()
            .read(DRIVER_MAGIC)
            .read(&request)
            .write(&reply)
            .build();

        let mut handler = DriverHandler::new(Arc::new(MemoryStore::new()), "test");
        handler.handle_connection(stream, "mock".to_string()).await;
    }

    #[tokio::test]
    async fn test_scripted_bad_magic_writes_nothing() {
        let stream = tokio_test::io::Builder::new().read(b"not-kvproxy").build();

        let mut handler = DriverHandler::new(Arc::new(MemoryStore::new()), "test");
        handler.handle_connection(stream, "mock".to_string()).await;
    }
}
