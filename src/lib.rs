pub mod codec;
pub mod config;
pub mod driver;
pub mod error;
pub mod store;

pub use config::{ClusterConfig, Config};
pub use driver::{spawn_driver_handler, DriverHandler};
pub use error::{ProxyError, ProxyResult};
pub use store::{MemoryStore, StoreClient};
