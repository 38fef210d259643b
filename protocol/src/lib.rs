//! The wire protocol: length-prefixed framing (`frame`), async frame I/O
//! (`io`), the command byte (`command`), and the MessagePack request/response
//! bodies (`messages`) for the three operations the broker exposes.

mod codec;
pub mod command;
pub mod error;
pub mod frame;
pub mod io;
pub mod messages;

pub use codec::{decode_body, encode_body};
pub use command::Command;
pub use error::{Error, Result};
pub use frame::{decode_frame, encode_frame, MAX_FRAME_SIZE, PROTOCOL_VERSION};
pub use io::{read_frame, write_frame};
pub use messages::{
    AcquireNextRequest, AcquireNextResponse, ErrorResponse, ProduceRequest, ProduceResponse,
    SettleRequest, SettleResponse,
};
