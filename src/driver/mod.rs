//! Driver protocol endpoint
//!
//! Each configured cluster is served on its own Unix domain socket using a
//! simple framed message format:
//! - **Magic Header**: `kvproxy-v1\0` (11 bytes, sent once on connection)
//! - **Request Frame**: `[length: 4 bytes BE][msgpack Command]`
//! - **Response Frame**: `[length: 4 bytes BE][msgpack Response]`
//!
//! Unary commands get exactly one response frame. Scans and queries get
//! one `StreamItem` frame per record followed by a single `StreamEnd`.

pub use kvproxy_client::protocol::{
    decode_message, encode_command, encode_response, Command, DriverError, Response,
    DRIVER_MAGIC, MAX_MESSAGE_SIZE,
};

pub mod handlers;
pub mod listener;

pub use handlers::spawn_driver_handler;
pub use handlers::{forward_records, DriverHandler, StreamSink};
pub use listener::DriverListener;
