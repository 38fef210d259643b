use std::time::Duration;

use tracing::error;

use engine::Registry;
use protocol::{
    AcquireNextRequest, AcquireNextResponse, Command, ErrorResponse, ProduceRequest, ProduceResponse,
    SettleRequest, SettleResponse,
};

/// Runs one request body against `registry` and returns the encoded response
/// body. The response always carries the same command byte as the request;
/// the caller is responsible for echoing it back on the wire.
///
/// Never panics out of this function: an internal panic is caught and turned
/// into an `ErrorResponse` so one bad request can't take the connection (or
/// any other connection sharing the registry) down with it.
pub fn process_command(registry: &Registry, command_byte: u8, body: &[u8]) -> Vec<u8> {
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| dispatch(registry, command_byte, body))) {
        Ok(response) => response,
        Err(panic) => {
            let message = panic_message(&panic);
            error!(error = %message, "internal error handling request");
            encode_error(format!("internal error: {message}"))
        }
    }
}

fn dispatch(registry: &Registry, command_byte: u8, body: &[u8]) -> Vec<u8> {
    match Command::try_from(command_byte) {
        Ok(Command::Produce) => handle_produce(registry, body),
        Ok(Command::AcquireNext) => handle_acquire_next(registry, body),
        Ok(Command::Settle) => handle_settle(registry, body),
        Err(unknown) => encode_error(format!("Unknown command: {unknown}")),
    }
}

fn handle_produce(registry: &Registry, body: &[u8]) -> Vec<u8> {
    let request: ProduceRequest = match protocol::decode_body(body) {
        Ok(request) => request,
        Err(err) => return encode_error(format!("failed to decode PRODUCE request: {err}")),
    };

    let message_id = registry
        .storage()
        .append(&request.log_id, request.payload, request.metadata);
    encode_ok(&ProduceResponse { message_id })
}

fn handle_acquire_next(registry: &Registry, body: &[u8]) -> Vec<u8> {
    let request: AcquireNextRequest = match protocol::decode_body(body) {
        Ok(request) => request,
        Err(err) => return encode_error(format!("failed to decode ACQUIRE_NEXT request: {err}")),
    };

    let orchestrator = registry.orchestrator(&request.log_id);
    let duration = Duration::from_secs_f64(request.duration.max(0.0));
    let message = orchestrator.acquire_next(&request.group_id, &request.client_id, duration);
    encode_ok(&AcquireNextResponse { message })
}

fn handle_settle(registry: &Registry, body: &[u8]) -> Vec<u8> {
    let request: SettleRequest = match protocol::decode_body(body) {
        Ok(request) => request,
        Err(err) => return encode_error(format!("failed to decode SETTLE request: {err}")),
    };

    let orchestrator = registry.orchestrator(&request.log_id);
    match orchestrator.settle(&request.group_id, request.message_id, &request.client_id, request.success) {
        Ok(()) => encode_ok(&SettleResponse::settled()),
        Err(engine::Error::WrongOwner { .. }) => {
            encode_error("Client does not own the lease for this message")
        }
        Err(engine::Error::Internal(message)) => {
            error!(error = %message, "internal error settling message");
            encode_error(message)
        }
    }
}

fn encode_ok<T: serde::Serialize>(value: &T) -> Vec<u8> {
    protocol::encode_body(value).unwrap_or_else(|err| {
        error!(error = %err, "failed to encode response body");
        encode_error(format!("failed to encode response: {err}"))
    })
}

fn encode_error(message: impl Into<String>) -> Vec<u8> {
    protocol::encode_body(&ErrorResponse::new(message)).expect("ErrorResponse always encodes")
}

fn panic_message(panic: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_command_reports_the_raw_byte() {
        let registry = Registry::new();
        let response = process_command(&registry, 200, b"");
        let decoded: ErrorResponse = protocol::decode_body(&response).unwrap();
        assert_eq!(decoded.error, "Unknown command: 200");
    }

    #[test]
    fn malformed_body_is_reported_without_closing() {
        let registry = Registry::new();
        let response = process_command(&registry, Command::Produce.as_u8(), b"\xff\xff");
        let decoded: ErrorResponse = protocol::decode_body(&response).unwrap();
        assert!(decoded.error.contains("PRODUCE"));
    }

    #[test]
    fn produce_then_acquire_next_round_trips() {
        let registry = Registry::new();

        let produce = ProduceRequest {
            log_id: "orders".to_owned(),
            payload: serde_json::json!({"sku": "abc"}),
            metadata: None,
        };
        let produce_body = protocol::encode_body(&produce).unwrap();
        let produce_response = process_command(&registry, Command::Produce.as_u8(), &produce_body);
        let produce_response: ProduceResponse = protocol::decode_body(&produce_response).unwrap();
        assert_eq!(produce_response.message_id, 0);

        let acquire = AcquireNextRequest {
            log_id: "orders".to_owned(),
            group_id: "workers".to_owned(),
            client_id: "c1".to_owned(),
            duration: 30.0,
        };
        let acquire_body = protocol::encode_body(&acquire).unwrap();
        let acquire_response = process_command(&registry, Command::AcquireNext.as_u8(), &acquire_body);
        let acquire_response: AcquireNextResponse = protocol::decode_body(&acquire_response).unwrap();
        let message = acquire_response.message.expect("message should be available");
        assert_eq!(message.id, 0);

        let settle = SettleRequest {
            log_id: "orders".to_owned(),
            group_id: "workers".to_owned(),
            message_id: 0,
            client_id: "c1".to_owned(),
            success: true,
        };
        let settle_body = protocol::encode_body(&settle).unwrap();
        let settle_response = process_command(&registry, Command::Settle.as_u8(), &settle_body);
        let settle_response: SettleResponse = protocol::decode_body(&settle_response).unwrap();
        assert_eq!(settle_response.status, "settled");
    }

    #[test]
    fn settle_by_non_owner_reports_the_spec_wire_message() {
        let registry = Registry::new();
        registry.storage().append("l", serde_json::json!(0), None);
        registry.orchestrator("l").acquire_next("g", "owner", Duration::from_secs(30));

        let settle = SettleRequest {
            log_id: "l".to_owned(),
            group_id: "g".to_owned(),
            message_id: 0,
            client_id: "intruder".to_owned(),
            success: true,
        };
        let body = protocol::encode_body(&settle).unwrap();
        let response = process_command(&registry, Command::Settle.as_u8(), &body);
        let decoded: ErrorResponse = protocol::decode_body(&response).unwrap();
        assert_eq!(decoded.error, "Client does not own the lease for this message");
    }
}
