use nlink_protocol::{Formatter, Kind, Message, Parser};
use nlink_utils::Appendable;

/// format(parse(bytes)) == bytes for a representative frame of each shape,
/// not an exhaustive grid — the unit tests in `parser`/`formatter` already
/// cover the arity edge cases per-field.
#[test]
fn pub_frame_round_trips_through_parse_and_format() {
    let original = b"PUB FRONT.DOOR JOKE.22 11\r\nKnock Knock\r\n";

    let mut reader = &original[..];
    let mut msg = Message::new();
    Parser::read_message(&mut reader, &mut msg).unwrap();
    assert_eq!(msg.kind(), Kind::Pub);

    let mut out = Appendable::new(64);
    Formatter::publish(&mut out, msg.subject().unwrap(), msg.reply_to(), msg.payload().unwrap())
        .unwrap();
    assert_eq!(out.body(), Some(&original[..]));
}

#[test]
fn hmsg_frame_round_trips_headers_and_payload() {
    let original =
        b"HMSG SUBJECT 1 REPLY 48 55\r\nNATS/1.0\r\nHeader1: X\r\nHeader1: Y\r\nHeader2: Z\r\n\r\nPAYLOAD\r\n";

    let mut reader = &original[..];
    let mut msg = Message::new();
    Parser::read_message(&mut reader, &mut msg).unwrap();
    assert_eq!(msg.kind(), Kind::Hmsg);

    let mut out = Appendable::new(64);
    Formatter::publish_with_headers(
        &mut out,
        msg.subject().unwrap(),
        msg.reply_to(),
        msg.headers().body().unwrap(),
        msg.payload().unwrap(),
    )
    .unwrap();
    // The original frame's reply subject is threaded through MSG's field,
    // not HPUB/HMSG's - here we're re-emitting the same frame shape (HPUB)
    // the fields actually came from, since subject/reply_to/headers/payload
    // captured by the parser don't distinguish MSG from HMSG on replay.
    let expected =
        b"HPUB SUBJECT REPLY 48 55\r\nNATS/1.0\r\nHeader1: X\r\nHeader1: Y\r\nHeader2: Z\r\n\r\nPAYLOAD\r\n";
    assert_eq!(out.body(), Some(&expected[..]));
}

#[test]
fn appendable_capacity_stays_a_multiple_of_round_across_growth() {
    let mut buf = Appendable::new(16);
    for chunk in ["a", "bb", "ccccccccccccccccccccc", "d"] {
        buf.append(chunk.as_bytes()).unwrap();
        assert_eq!(buf.capacity() % buf.round(), 0);
        assert!(buf.length() <= buf.capacity());
    }
}

#[test]
fn message_reset_keeps_buffer_capacity_for_reuse() {
    let mut msg = Message::new();
    let mut reader = &b"PUB FOO 5\r\nhello\r\n"[..];
    Parser::read_message(&mut reader, &mut msg).unwrap();
    assert_eq!(msg.payload(), Some(&b"hello"[..]));

    msg.reset(Kind::Unknown);
    assert_eq!(msg.payload(), None);
    assert_eq!(msg.subject(), None);

    // A second, unrelated frame reuses the same Message without growing it
    // from scratch.
    let mut reader2 = &b"PUB BAR 2\r\nhi\r\n"[..];
    Parser::read_message(&mut reader2, &mut msg).unwrap();
    assert_eq!(msg.subject(), Some(&b"BAR"[..]));
    assert_eq!(msg.payload(), Some(&b"hi"[..]));
}
