use nlink_utils::Appendable;

use crate::error::ProtocolError;

/// Encodes client-emitted frames into a reusable scratch [`Appendable`].
///
/// Every function here resets (or allocates) `buf` and appends the frame's
/// bytes to it; the caller hands `buf.body()` to a transport's write path.
/// No function here performs I/O itself, mirroring the parser's separation
/// of codec from transport.
pub struct Formatter;

impl Formatter {
    pub fn ping(buf: &mut Appendable) -> Result<(), ProtocolError> {
        reset_scratch(buf)?;
        buf.append(b"PING\r\n")?;
        Ok(())
    }

    pub fn pong(buf: &mut Appendable) -> Result<(), ProtocolError> {
        reset_scratch(buf)?;
        buf.append(b"PONG\r\n")?;
        Ok(())
    }

    pub fn sub(
        buf: &mut Appendable,
        subject: &[u8],
        queue_group: Option<&[u8]>,
        sid: &[u8],
    ) -> Result<(), ProtocolError> {
        reset_scratch(buf)?;
        buf.append(b"SUB ")?;
        buf.append(subject)?;
        buf.append(b" ")?;
        if let Some(queue) = queue_group {
            buf.append(queue)?;
            buf.append(b" ")?;
        }
        buf.append(sid)?;
        buf.append(b"\r\n")?;
        Ok(())
    }

    pub fn unsub(
        buf: &mut Appendable,
        sid: &[u8],
        max_msgs: Option<u64>,
    ) -> Result<(), ProtocolError> {
        reset_scratch(buf)?;
        buf.append(b"UNSUB ")?;
        buf.append(sid)?;
        if let Some(n) = max_msgs {
            buf.append(b" ")?;
            buf.append(n.to_string().as_bytes())?;
        }
        buf.append(b"\r\n")?;
        Ok(())
    }

    /// `json` must already be a single-line, CR/LF-free JSON object (the
    /// umbrella crate produces this from `ConnectOpts` via `serde_json`).
    pub fn connect(buf: &mut Appendable, json: &str) -> Result<(), ProtocolError> {
        reset_scratch(buf)?;
        buf.append(b"CONNECT ")?;
        buf.append(json.as_bytes())?;
        buf.append(b"\r\n")?;
        Ok(())
    }

    pub fn publish(
        buf: &mut Appendable,
        subject: &[u8],
        reply_to: Option<&[u8]>,
        payload: &[u8],
    ) -> Result<(), ProtocolError> {
        reset_scratch(buf)?;
        buf.append(b"PUB ")?;
        buf.append(subject)?;
        buf.append(b" ")?;
        if let Some(reply) = reply_to {
            buf.append(reply)?;
            buf.append(b" ")?;
        }
        buf.append(payload.len().to_string().as_bytes())?;
        buf.append(b"\r\n")?;
        buf.append(payload)?;
        buf.append(b"\r\n")?;
        Ok(())
    }

    /// `headers` is a complete NATS/1.0 wire-form block (see [`crate::Headers::body`]).
    pub fn publish_with_headers(
        buf: &mut Appendable,
        subject: &[u8],
        reply_to: Option<&[u8]>,
        headers: &[u8],
        payload: &[u8],
    ) -> Result<(), ProtocolError> {
        reset_scratch(buf)?;
        buf.append(b"HPUB ")?;
        buf.append(subject)?;
        buf.append(b" ")?;
        if let Some(reply) = reply_to {
            buf.append(reply)?;
            buf.append(b" ")?;
        }
        let hdr_len = headers.len();
        let tot_len = hdr_len + payload.len();
        buf.append(hdr_len.to_string().as_bytes())?;
        buf.append(b" ")?;
        buf.append(tot_len.to_string().as_bytes())?;
        buf.append(b"\r\n")?;
        buf.append(headers)?;
        buf.append(payload)?;
        buf.append(b"\r\n")?;
        Ok(())
    }
}

fn reset_scratch(buf: &mut Appendable) -> Result<(), ProtocolError> {
    if buf.capacity() == 0 {
        buf.init(64)?;
    } else {
        buf.reset()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch() -> Appendable {
        Appendable::new(64)
    }

    #[test]
    fn ping_pong_round_trip() {
        let mut buf = scratch();
        Formatter::ping(&mut buf).unwrap();
        assert_eq!(buf.body(), Some(&b"PING\r\n"[..]));
        Formatter::pong(&mut buf).unwrap();
        assert_eq!(buf.body(), Some(&b"PONG\r\n"[..]));
    }

    #[test]
    fn sub_without_queue_group() {
        let mut buf = scratch();
        Formatter::sub(&mut buf, b"FOO", None, b"90").unwrap();
        assert_eq!(buf.body(), Some(&b"SUB FOO 90\r\n"[..]));
    }

    #[test]
    fn sub_with_queue_group() {
        let mut buf = scratch();
        Formatter::sub(&mut buf, b"FOO", Some(b"workers"), b"90").unwrap();
        assert_eq!(buf.body(), Some(&b"SUB FOO workers 90\r\n"[..]));
    }

    #[test]
    fn unsub_with_and_without_max_msgs() {
        let mut buf = scratch();
        Formatter::unsub(&mut buf, b"90", None).unwrap();
        assert_eq!(buf.body(), Some(&b"UNSUB 90\r\n"[..]));

        Formatter::unsub(&mut buf, b"90", Some(5)).unwrap();
        assert_eq!(buf.body(), Some(&b"UNSUB 90 5\r\n"[..]));
    }

    #[test]
    fn pub_no_reply_matches_nbytes() {
        let mut buf = scratch();
        Formatter::publish(&mut buf, b"FOO", None, b"Hello NATS!").unwrap();
        assert_eq!(buf.body(), Some(&b"PUB FOO 11\r\nHello NATS!\r\n"[..]));
    }

    #[test]
    fn hpub_computes_hdr_len_and_tot_len() {
        let mut buf = scratch();
        let headers = b"NATS/1.0\r\nA:1\r\n\r\n";
        Formatter::publish_with_headers(&mut buf, b"FOO", None, headers, b"payload").unwrap();
        let expected = format!(
            "HPUB FOO {} {}\r\n{}payload\r\n",
            headers.len(),
            headers.len() + b"payload".len(),
            std::str::from_utf8(headers).unwrap()
        );
        assert_eq!(buf.body(), Some(expected.as_bytes()));
    }
}
