//! kvproxy Rust Client
//!
//! Wire protocol and async client for the kvproxy daemon, which fronts a
//! clustered key-value store over a local Unix domain socket.
//!
//! # Example
//!
//! ```rust,no_run
//! use kvproxy_client::{Bin, Key, KvClientBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), kvproxy_client::DriverError> {
//!     let mut client = KvClientBuilder::new("/run/kvproxy/main.sock")
//!         .pool_size(2)
//!         .build()
//!         .await?;
//!
//!     let key = Key::new("test", "users", "alice");
//!     client.put(key.clone(), vec![Bin::new("age", 42i64)]).await?;
//!     let record = client.get(key, &[]).await?;
//!     println!("Record: {:?}", record);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod protocol;

pub use client::{KvClient, KvClientBuilder, StreamEntry, StreamOutput};
pub use protocol::{
    BatchOperate, Bin, Command, DriverError, ErrorInfo, Expression, Key, Operation, Record,
    Response, Value,
};
