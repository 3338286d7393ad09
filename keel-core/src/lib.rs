//! Keel-Core
//!
//! Keel-Core -- protocol types, payload codec and socket transport shared by
//! the Keel admin control plane

pub mod errors;
pub use errors::{CodecError, ConnectionError, EndpointParseError, MessageIdError};

mod endpoint;
pub use endpoint::Endpoint;

pub mod protocol;
pub use protocol::{
    BrokerRequestCode, NameServerRequestCode, RemotingRequest, RemotingResponse, ResponseStatus,
};

pub mod models;

mod codec;
pub use codec::{JsonCodec, PayloadCodec};

mod connection;
pub use connection::{Connection, ConnectionFactory};

pub mod frame;

mod socket;
pub use socket::{SocketConnection, SocketConnectionFactory, SocketSetting};

mod message_id;
pub use message_id::MessageId;
