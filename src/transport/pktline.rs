//! pkt-line framing for the smart protocol.
//!
//! A pkt-line is a 4-digit lowercase hex length (including the 4 length
//! bytes themselves) followed by the payload; `0000` is the flush packet.
//! Only what the transport needs is implemented: the service
//! advertisement header and parsing the command section of a
//! receive-pack request body.

use super::error::GitTransportError;
use super::events::{PushEvent, PushEventKind};
use super::handle::GitService;

/// The all-zero object id marking ref creation/deletion.
pub const ZERO_OID: &str = "0000000000000000000000000000000000000000";

const FLUSH_PKT: &[u8] = b"0000";

/// Append one pkt-line.
pub fn write_pkt_line(buf: &mut Vec<u8>, payload: &[u8]) {
    // 4 hex digits bound payloads to 65531 bytes; command payloads are
    // far below that.
    let len = payload.len() + 4;
    buf.extend_from_slice(format!("{len:04x}").as_bytes());
    buf.extend_from_slice(payload);
}

/// The smart-HTTP advertisement prefix for a service:
/// `# service=git-upload-pack\n` as a pkt-line, then a flush packet.
pub fn advertisement_header(service: GitService) -> Vec<u8> {
    let mut buf = Vec::new();
    write_pkt_line(&mut buf, format!("# service={service}\n").as_bytes());
    buf.extend_from_slice(FLUSH_PKT);
    buf
}

/// Parse the command section of a receive-pack request body into push
/// events: pkt-lines of `old-oid new-oid ref-name`, terminated by a
/// flush packet (the packfile follows and is not parsed here).
pub fn parse_receive_pack_commands(body: &[u8]) -> Result<Vec<PushEvent>, GitTransportError> {
    let mut events = Vec::new();
    let mut rest = body;

    loop {
        let (line, remainder) = read_pkt_line(rest)?;
        rest = remainder;
        let Some(line) = line else { break };
        events.push(parse_command(line)?);
    }
    Ok(events)
}

/// Read one pkt-line. Returns `None` for the flush packet.
fn read_pkt_line(buf: &[u8]) -> Result<(Option<&[u8]>, &[u8]), GitTransportError> {
    if buf.len() < 4 {
        return Err(invalid("truncated pkt-line length"));
    }
    let len_str = std::str::from_utf8(&buf[..4]).map_err(|_| invalid("non-ascii pkt-line length"))?;
    let len = usize::from_str_radix(len_str, 16).map_err(|_| invalid("bad pkt-line length"))?;

    if len == 0 {
        return Ok((None, &buf[4..]));
    }
    if len < 4 || len > buf.len() {
        return Err(invalid("pkt-line length out of range"));
    }
    Ok((Some(&buf[4..len]), &buf[len..]))
}

/// Parse one command line: `old-oid SP new-oid SP ref-name`, optionally
/// followed by a NUL and the capability list on the first line.
fn parse_command(line: &[u8]) -> Result<PushEvent, GitTransportError> {
    let line = match line.iter().position(|&b| b == 0) {
        Some(nul) => &line[..nul],
        None => line,
    };
    let line = std::str::from_utf8(line).map_err(|_| invalid("non-utf8 command line"))?;
    let line = line.trim_end_matches('\n');

    let mut parts = line.splitn(3, ' ');
    let (old, new, ref_name) = match (parts.next(), parts.next(), parts.next()) {
        (Some(old), Some(new), Some(ref_name)) if !ref_name.is_empty() => (old, new, ref_name),
        _ => return Err(invalid(&format!("malformed command line: {line:?}"))),
    };
    if old.len() != 40 || new.len() != 40 {
        return Err(invalid(&format!("malformed object id in: {line:?}")));
    }

    Ok(PushEvent {
        ref_name: ref_name.to_string(),
        old: old.to_string(),
        new: new.to_string(),
        kind: event_kind(old, new, ref_name),
    })
}

fn event_kind(old: &str, new: &str, ref_name: &str) -> PushEventKind {
    if new == ZERO_OID {
        PushEventKind::Delete
    } else if ref_name.starts_with("refs/tags/") {
        PushEventKind::Tag
    } else if old == ZERO_OID {
        PushEventKind::Create
    } else {
        PushEventKind::Update
    }
}

fn invalid(message: &str) -> GitTransportError {
    GitTransportError::InvalidRequest {
        message: message.to_string(),
    }
}
