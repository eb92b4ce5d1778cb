//! Browser native messaging host.
//!
//! Each message is a 4-byte length in native byte order followed by that
//! many bytes of UTF-8 JSON. Requests are routed to the background service;
//! the page context lives in the browser, so `getConversation` is answered
//! with an error object.

use crate::error::HostError;
use crate::messaging::{Messenger, Request};
use serde_json::json;
use std::io::{self, Read, Write};

/// Largest message the host may send to the browser.
pub const MAX_OUTGOING: usize = 1024 * 1024;

/// Largest message the host accepts from the browser.
pub const MAX_INCOMING: usize = 64 * 1024 * 1024;

/// Reads one frame. `Ok(None)` on a clean end of stream.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Option<Vec<u8>>, HostError> {
    let mut header = [0u8; 4];
    let mut filled = 0;
    while filled < header.len() {
        match reader.read(&mut header[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => return Err(HostError::Truncated),
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err.into()),
        }
    }
    let len = u32::from_ne_bytes(header) as usize;
    if len > MAX_INCOMING {
        return Err(HostError::TooLarge(len, MAX_INCOMING));
    }
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).map_err(|err| {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            HostError::Truncated
        } else {
            HostError::Io(err)
        }
    })?;
    Ok(Some(body))
}

pub fn write_frame<W: Write>(writer: &mut W, body: &[u8]) -> Result<(), HostError> {
    if body.len() > MAX_OUTGOING {
        return Err(HostError::TooLarge(body.len(), MAX_OUTGOING));
    }
    let len = body.len() as u32;
    writer.write_all(&len.to_ne_bytes())?;
    writer.write_all(body)?;
    writer.flush()?;
    Ok(())
}

/// Answers one raw request. Failures become `{"error": ...}` replies so the
/// browser side always gets something back.
pub fn respond<M: Messenger>(messenger: &mut M, body: &[u8]) -> Vec<u8> {
    let reply = match serde_json::from_slice::<Request>(body) {
        Ok(request) => {
            let action = request.action();
            match messenger.send(request) {
                Ok(response) => serde_json::to_value(response)
                    .unwrap_or_else(|err| json!({ "error": err.to_string() })),
                Err(err) => {
                    log::warn!("{} failed: {}", action, err);
                    json!({ "error": err.to_string() })
                }
            }
        }
        Err(err) => {
            log::warn!("unreadable request: {}", err);
            json!({ "error": format!("malformed request: {}", err) })
        }
    };
    reply.to_string().into_bytes()
}

/// Serves frames until the browser closes the pipe.
pub fn serve<M, R, W>(messenger: &mut M, reader: &mut R, writer: &mut W) -> Result<usize, HostError>
where
    M: Messenger,
    R: Read,
    W: Write,
{
    let mut handled = 0;
    while let Some(body) = read_frame(reader)? {
        let reply = respond(messenger, &body);
        match write_frame(writer, &reply) {
            Err(HostError::TooLarge(size, limit)) => {
                log::warn!("reply of {} bytes dropped (limit {})", size, limit);
                let fallback = json!({ "error": "response too large" }).to_string();
                write_frame(writer, fallback.as_bytes())?;
            }
            other => other?,
        }
        handled += 1;
    }
    log::info!("native host finished after {} messages", handled);
    Ok(handled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::{Background, LocalRuntime};
    use crate::store::ConversationStore;
    use crate::summary::SummaryStyle;
    use std::io::Cursor;

    fn frame(json: &str) -> Vec<u8> {
        let mut out = Vec::new();
        write_frame(&mut out, json.as_bytes()).unwrap();
        out
    }

    fn runtime() -> LocalRuntime {
        LocalRuntime::new(
            Background::new(ConversationStore::in_memory(), SummaryStyle::default()),
            None,
        )
    }

    fn replies(output: Vec<u8>) -> Vec<serde_json::Value> {
        let mut cursor = Cursor::new(output);
        let mut values = Vec::new();
        while let Some(body) = read_frame(&mut cursor).unwrap() {
            values.push(serde_json::from_slice(&body).unwrap());
        }
        values
    }

    #[test]
    fn frames_carry_native_endian_length() {
        let bytes = frame("{}");
        assert_eq!(&bytes[..4], &2u32.to_ne_bytes());
        assert_eq!(&bytes[4..], b"{}");
    }

    #[test]
    fn empty_stream_is_clean_eof_but_partial_header_is_not() {
        assert!(read_frame(&mut Cursor::new(Vec::new())).unwrap().is_none());
        assert!(matches!(
            read_frame(&mut Cursor::new(vec![1u8, 0])),
            Err(HostError::Truncated)
        ));
    }

    #[test]
    fn short_body_is_truncated() {
        let mut bytes = 10u32.to_ne_bytes().to_vec();
        bytes.extend_from_slice(b"abc");
        assert!(matches!(
            read_frame(&mut Cursor::new(bytes)),
            Err(HostError::Truncated)
        ));
    }

    #[test]
    fn oversized_incoming_header_is_rejected_before_reading() {
        let mut bytes = u32::MAX.to_ne_bytes().to_vec();
        bytes.extend_from_slice(b"{}");
        assert!(matches!(
            read_frame(&mut Cursor::new(bytes)),
            Err(HostError::TooLarge(_, MAX_INCOMING))
        ));
    }

    #[test]
    fn oversized_outgoing_frame_is_rejected() {
        let big = vec![b'a'; MAX_OUTGOING + 1];
        assert!(matches!(
            write_frame(&mut Vec::new(), &big),
            Err(HostError::TooLarge(_, MAX_OUTGOING))
        ));
    }

    #[test]
    fn serves_a_session() {
        let mut input = frame(
            r#"{"action":"saveConversation","conversation":[{"role":"user","content":"hello"}]}"#,
        );
        input.extend(frame(r#"{"action":"getStoredConversations"}"#));
        input.extend(frame(r#"{"action":"getConversation"}"#));
        input.extend(frame("not json"));

        let mut runtime = runtime();
        let mut output = Vec::new();
        let handled = serve(&mut runtime, &mut Cursor::new(input), &mut output).unwrap();
        assert_eq!(handled, 4);

        let values = replies(output);
        assert!(values[0]["id"].is_string());
        assert_eq!(values[1][0]["preview"], "hello");
        assert!(values[2]["error"]
            .as_str()
            .unwrap()
            .contains("getConversation"));
        assert!(values[3]["error"]
            .as_str()
            .unwrap()
            .starts_with("malformed request"));
    }
}
