use nlink_utils::{Appendable, DEFAULT_ROUND};

use crate::headers::Headers;

/// The verb of a NATS frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Unknown,
    Info,
    Connect,
    Sub,
    Unsub,
    Ping,
    Pong,
    Ok,
    Err,
    Pub,
    Hpub,
    Msg,
    Hmsg,
}

impl Kind {
    /// Matches a control-line verb case-insensitively. Unrecognised verbs
    /// map to [`Kind::Unknown`] rather than failing the parse.
    pub fn from_verb(verb: &[u8]) -> Self {
        if verb.eq_ignore_ascii_case(b"INFO") {
            Kind::Info
        } else if verb.eq_ignore_ascii_case(b"CONNECT") {
            Kind::Connect
        } else if verb.eq_ignore_ascii_case(b"SUB") {
            Kind::Sub
        } else if verb.eq_ignore_ascii_case(b"UNSUB") {
            Kind::Unsub
        } else if verb.eq_ignore_ascii_case(b"PING") {
            Kind::Ping
        } else if verb.eq_ignore_ascii_case(b"PONG") {
            Kind::Pong
        } else if verb.eq_ignore_ascii_case(b"+OK") {
            Kind::Ok
        } else if verb.eq_ignore_ascii_case(b"-ERR") {
            Kind::Err
        } else if verb.eq_ignore_ascii_case(b"PUB") {
            Kind::Pub
        } else if verb.eq_ignore_ascii_case(b"HPUB") {
            Kind::Hpub
        } else if verb.eq_ignore_ascii_case(b"MSG") {
            Kind::Msg
        } else if verb.eq_ignore_ascii_case(b"HMSG") {
            Kind::Hmsg
        } else {
            Kind::Unknown
        }
    }

    pub fn has_header(self) -> bool {
        matches!(self, Kind::Hpub | Kind::Hmsg)
    }

    pub fn has_payload(self) -> bool {
        matches!(self, Kind::Pub | Kind::Hpub | Kind::Msg | Kind::Hmsg)
    }
}

/// A parsed (or about-to-be-formatted) NATS frame.
///
/// Every field is a reused [`Appendable`]: a `Message` drawn from a free
/// pool keeps its buffers' capacity across [`reset`](Message::reset), so a
/// steady-state receive loop allocates only when a payload genuinely grows
/// past what it has already seen.
#[derive(Debug)]
pub struct Message {
    kind: Kind,
    subject: Appendable,
    sid: Appendable,
    reply_to: Appendable,
    headers: Headers,
    payload: Appendable,
}

impl Message {
    pub fn new() -> Self {
        Self {
            kind: Kind::Unknown,
            subject: Appendable::new(DEFAULT_ROUND),
            sid: Appendable::new(DEFAULT_ROUND),
            reply_to: Appendable::new(DEFAULT_ROUND),
            headers: Headers::new(),
            payload: Appendable::new(DEFAULT_ROUND),
        }
    }

    /// Clears every field's length (capacity is kept) and sets `kind`.
    pub fn reset(&mut self, kind: Kind) {
        let _ = self.subject.reset();
        let _ = self.sid.reset();
        let _ = self.reply_to.reset();
        self.headers.reset();
        let _ = self.payload.reset();
        self.kind = kind;
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn subject(&self) -> Option<&[u8]> {
        self.subject.body()
    }

    pub fn sid(&self) -> Option<&[u8]> {
        self.sid.body()
    }

    pub fn reply_to(&self) -> Option<&[u8]> {
        self.reply_to.body()
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.body()
    }

    pub(crate) fn subject_mut(&mut self) -> &mut Appendable {
        &mut self.subject
    }

    pub(crate) fn sid_mut(&mut self) -> &mut Appendable {
        &mut self.sid
    }

    pub(crate) fn reply_to_mut(&mut self) -> &mut Appendable {
        &mut self.reply_to
    }

    pub(crate) fn payload_mut(&mut self) -> &mut Appendable {
        &mut self.payload
    }
}

impl Default for Message {
    fn default() -> Self {
        Self::new()
    }
}
