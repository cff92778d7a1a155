use std::io::BufRead;

use nlink_utils::Appendable;

use crate::{
    error::ProtocolError,
    message::{Kind, Message},
};

/// What, if anything, follows a control line.
enum BodySpec {
    None,
    Payload { nbytes: usize },
    HeaderAndPayload { hdr_len: usize, tot_len: usize },
}

/// Decodes one NATS frame at a time from a byte stream.
///
/// Pure byte-level logic: the only I/O bound is [`BufRead`], so tests drive
/// this against an in-memory `&[u8]` with no transport involved.
pub struct Parser;

impl Parser {
    /// Reads and decodes exactly one frame into `msg`, which the caller has
    /// already drawn from the free pool and should return there on error.
    ///
    /// Blocks until a full frame has arrived, the stream hits EOF
    /// (`ProtocolError::Closed`), or the grammar is violated
    /// (`ProtocolError::MalformedFrame`).
    pub fn read_message<R: BufRead>(
        reader: &mut R,
        msg: &mut Message,
    ) -> Result<(), ProtocolError> {
        let line = read_control_line(reader)?;
        let (verb, args) = split_verb(&line)?;
        let kind = Kind::from_verb(verb);
        msg.reset(kind);

        let spec = fill_control_fields(kind, args, msg)?;

        match spec {
            BodySpec::None => {}
            BodySpec::Payload { nbytes } => {
                read_exact_into(reader, msg.payload_mut(), nbytes)?;
                consume_crlf(reader)?;
            }
            BodySpec::HeaderAndPayload { hdr_len, tot_len } => {
                if tot_len < hdr_len {
                    return Err(ProtocolError::MalformedFrame(
                        "tot_len smaller than hdr_len".into(),
                    ));
                }
                let payload_len = tot_len - hdr_len;

                let mut hdr_buf = Appendable::new(nlink_utils::DEFAULT_ROUND);
                read_exact_into(reader, &mut hdr_buf, hdr_len)?;
                let hdr_bytes = hdr_buf.body().unwrap_or(&[]);
                if !hdr_bytes.starts_with(b"NATS/1.0\r\n") || !hdr_bytes.ends_with(b"\r\n\r\n") {
                    return Err(ProtocolError::MalformedFrame(
                        "header block missing NATS/1.0 framing".into(),
                    ));
                }
                msg.headers_mut().raw_buf_mut().copy(hdr_bytes)?;

                read_exact_into(reader, msg.payload_mut(), payload_len)?;
                consume_crlf(reader)?;
            }
        }

        Ok(())
    }
}

fn read_control_line<R: BufRead>(reader: &mut R) -> Result<Vec<u8>, ProtocolError> {
    let mut line = Vec::new();
    let n = reader.read_until(b'\n', &mut line)?;
    if n == 0 {
        return Err(ProtocolError::Closed);
    }
    if line.last() != Some(&b'\n') {
        return Err(ProtocolError::Closed);
    }
    line.pop();
    if line.last() == Some(&b'\r') {
        line.pop();
    } else {
        return Err(ProtocolError::MalformedFrame("control line missing CR".into()));
    }
    Ok(line)
}

fn split_verb(line: &[u8]) -> Result<(&[u8], &[u8]), ProtocolError> {
    match line.iter().position(|&b| b == b' ' || b == b'\t') {
        Some(idx) => Ok((&line[..idx], trim_leading_ws(&line[idx + 1..]))),
        None => Ok((line, &[])),
    }
}

fn trim_leading_ws(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| b != b' ' && b != b'\t').unwrap_or(bytes.len());
    &bytes[start..]
}

fn tokenize(args: &[u8]) -> Vec<&[u8]> {
    args.split(|&b| b == b' ' || b == b'\t').filter(|t| !t.is_empty()).collect()
}

fn parse_usize(tok: &[u8]) -> Result<usize, ProtocolError> {
    std::str::from_utf8(tok)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| ProtocolError::MalformedFrame(format!("not a number: {tok:?}")))
}

/// Fills `msg`'s subject/sid/reply_to (and, for INFO/CONNECT/ERR, the
/// single-blob argument stashed in `subject`) and returns what body bytes
/// to expect next.
fn fill_control_fields(
    kind: Kind,
    args: &[u8],
    msg: &mut Message,
) -> Result<BodySpec, ProtocolError> {
    match kind {
        Kind::Ping | Kind::Pong | Kind::Ok => Ok(BodySpec::None),

        Kind::Info | Kind::Connect | Kind::Err => {
            if !args.is_empty() {
                msg.subject_mut().copy(args)?;
            }
            Ok(BodySpec::None)
        }

        Kind::Sub | Kind::Unsub | Kind::Unknown => {
            // Client-originated only (SUB/UNSUB) or unrecognised; the
            // frame is consumed as a control line with no body.
            let _ = args;
            Ok(BodySpec::None)
        }

        Kind::Pub => {
            let toks = tokenize(args);
            match toks.as_slice() {
                [subject, nbytes] => {
                    msg.subject_mut().copy(subject)?;
                    Ok(BodySpec::Payload { nbytes: parse_usize(nbytes)? })
                }
                [subject, reply, nbytes] => {
                    msg.subject_mut().copy(subject)?;
                    msg.reply_to_mut().copy(reply)?;
                    Ok(BodySpec::Payload { nbytes: parse_usize(nbytes)? })
                }
                _ => Err(ProtocolError::MalformedFrame(format!(
                    "PUB expects 2 or 3 arguments, got {}",
                    toks.len()
                ))),
            }
        }

        Kind::Msg => {
            let toks = tokenize(args);
            match toks.as_slice() {
                [subject, sid, nbytes] => {
                    msg.subject_mut().copy(subject)?;
                    msg.sid_mut().copy(sid)?;
                    Ok(BodySpec::Payload { nbytes: parse_usize(nbytes)? })
                }
                [subject, sid, reply, nbytes] => {
                    msg.subject_mut().copy(subject)?;
                    msg.sid_mut().copy(sid)?;
                    msg.reply_to_mut().copy(reply)?;
                    Ok(BodySpec::Payload { nbytes: parse_usize(nbytes)? })
                }
                _ => Err(ProtocolError::MalformedFrame(format!(
                    "MSG expects 3 or 4 arguments, got {}",
                    toks.len()
                ))),
            }
        }

        Kind::Hpub => {
            let toks = tokenize(args);
            match toks.as_slice() {
                [subject, hdr_len, tot_len] => {
                    msg.subject_mut().copy(subject)?;
                    Ok(BodySpec::HeaderAndPayload {
                        hdr_len: parse_usize(hdr_len)?,
                        tot_len: parse_usize(tot_len)?,
                    })
                }
                [subject, reply, hdr_len, tot_len] => {
                    msg.subject_mut().copy(subject)?;
                    msg.reply_to_mut().copy(reply)?;
                    Ok(BodySpec::HeaderAndPayload {
                        hdr_len: parse_usize(hdr_len)?,
                        tot_len: parse_usize(tot_len)?,
                    })
                }
                _ => Err(ProtocolError::MalformedFrame(format!(
                    "HPUB expects 3 or 4 arguments, got {}",
                    toks.len()
                ))),
            }
        }

        Kind::Hmsg => {
            let toks = tokenize(args);
            match toks.as_slice() {
                [subject, sid, hdr_len, tot_len] => {
                    msg.subject_mut().copy(subject)?;
                    msg.sid_mut().copy(sid)?;
                    Ok(BodySpec::HeaderAndPayload {
                        hdr_len: parse_usize(hdr_len)?,
                        tot_len: parse_usize(tot_len)?,
                    })
                }
                [subject, sid, reply, hdr_len, tot_len] => {
                    msg.subject_mut().copy(subject)?;
                    msg.sid_mut().copy(sid)?;
                    msg.reply_to_mut().copy(reply)?;
                    Ok(BodySpec::HeaderAndPayload {
                        hdr_len: parse_usize(hdr_len)?,
                        tot_len: parse_usize(tot_len)?,
                    })
                }
                _ => Err(ProtocolError::MalformedFrame(format!(
                    "HMSG expects 4 or 5 arguments, got {}",
                    toks.len()
                ))),
            }
        }
    }
}

fn read_exact_into<R: BufRead>(
    reader: &mut R,
    dst: &mut Appendable,
    n: usize,
) -> Result<(), ProtocolError> {
    dst.append_filled(n, |slice| reader.read_exact(slice).map_err(map_eof))?;
    Ok(())
}

fn consume_crlf<R: BufRead>(reader: &mut R) -> Result<(), ProtocolError> {
    let mut crlf = [0u8; 2];
    reader.read_exact(&mut crlf).map_err(map_eof)?;
    if &crlf != b"\r\n" {
        return Err(ProtocolError::MalformedFrame("expected trailing CRLF after body".into()));
    }
    Ok(())
}

fn map_eof(err: std::io::Error) -> ProtocolError {
    if err.kind() == std::io::ErrorKind::UnexpectedEof {
        ProtocolError::Closed
    } else {
        ProtocolError::Io(err)
    }
}
