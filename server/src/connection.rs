use std::sync::Arc;

use tokio::net::TcpStream;
use tracing::{debug, warn};

use engine::Registry;
use protocol::ErrorResponse;

use crate::dispatch;

/// Services one accepted TCP connection until the peer closes it or sends
/// something the framing layer can't recover from. Runs entirely on the
/// task it was spawned on; nothing here talks to other connections except
/// through the shared `registry`.
pub async fn handle_connection(mut stream: TcpStream, registry: Arc<Registry>) {
    let peer = stream.peer_addr().ok();
    debug!(?peer, "connection opened");

    loop {
        let (version, command, body) = match protocol::read_frame(&mut stream).await {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                debug!(?peer, "connection closed by peer");
                break;
            }
            Err(protocol::Error::FrameTooLarge(len)) => {
                warn!(?peer, len, "rejecting oversized frame, closing connection");
                break;
            }
            Err(err) => {
                warn!(?peer, error = %err, "frame read error, closing connection");
                break;
            }
        };

        if version != protocol::PROTOCOL_VERSION {
            let err = protocol::Error::UnknownVersion(version);
            warn!(?peer, error = %err, "rejecting frame with unsupported version");
            let body = protocol::encode_body(&ErrorResponse::new(err.to_string())).unwrap_or_default();
            if write_response(&mut stream, command, &body, peer).await.is_err() {
                break;
            }
            continue;
        }

        let response_body = dispatch::process_command(&registry, command, &body);
        if write_response(&mut stream, command, &response_body, peer).await.is_err() {
            break;
        }
    }
}

async fn write_response(
    stream: &mut TcpStream,
    command: u8,
    body: &[u8],
    peer: Option<std::net::SocketAddr>,
) -> Result<(), ()> {
    protocol::write_frame(stream, protocol::PROTOCOL_VERSION, command, body)
        .await
        .map_err(|err| {
            warn!(?peer, error = %err, "failed to write response, closing connection");
        })
}
