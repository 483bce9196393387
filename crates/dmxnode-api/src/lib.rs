// dmxnode-api: wire layer for the DMX node console (live channel + one-shot requests)

pub mod error;
pub mod message;
pub mod request;
pub mod transport;
pub mod websocket;

pub use error::Error;
pub use message::{
    ApStatusPayload, ConfigPayload, InboundMessage, OutboundMessage, PixelTestPayload,
    StatusPayload,
};
pub use request::{DeviceRequests, Endpoint, RequestClient};
pub use transport::{TlsMode, TransportConfig};
pub use websocket::{ConnectionManager, ConnectionState, ReconnectPolicy};
