use std::{
    io::{BufRead, BufReader, Write},
    net::{IpAddr, Ipv4Addr, TcpListener, TcpStream},
    sync::Once,
    thread,
    time::{Duration, Instant},
};

use nlink::{ConnectOpts, Subscriber, SubscriberError};

static TRACING: Once = Once::new();

/// Routes the crate's `tracing` events to stderr for `cargo test -- --nocapture`;
/// harmless, and cheap, to call redundantly across tests.
fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

/// Reads and discards one CRLF-terminated control line, returning it for
/// assertions that care about what the client sent.
fn read_line(reader: &mut BufReader<TcpStream>) -> String {
    let mut line = String::new();
    reader.read_line(&mut line).unwrap();
    line
}

fn listen() -> (TcpListener, ConnectOpts) {
    let listener = TcpListener::bind((IpAddr::V4(Ipv4Addr::LOCALHOST), 0)).unwrap();
    let addr = listener.local_addr().unwrap();
    let opts = ConnectOpts::new(addr.ip().to_string(), addr.port());
    (listener, opts)
}

#[test]
fn subscribe_and_fetch_round_trip() {
    init_tracing();
    let (listener, opts) = listen();

    let server = thread::spawn(move || {
        let (sock, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(sock.try_clone().unwrap());
        let mut writer = sock;

        let connect_line = read_line(&mut reader);
        assert!(connect_line.starts_with("CONNECT "));

        let sub_line = read_line(&mut reader);
        assert_eq!(sub_line, "SUB updates 1\r\n");

        writer.write_all(b"MSG updates 1 5\r\nhello\r\n").unwrap();
    });

    let subscriber = Subscriber::connect(opts).unwrap();
    subscriber.subscribe("updates", None, "1").unwrap();

    let msg = subscriber.fetch(Duration::from_secs(2)).unwrap();
    assert_eq!(msg.subject(), Some(&b"updates"[..]));
    assert_eq!(msg.payload(), Some(&b"hello"[..]));
    subscriber.reuse(msg);

    server.join().unwrap();
}

#[test]
fn server_ping_is_answered_and_not_delivered() {
    init_tracing();
    let (listener, opts) = listen();

    let server = thread::spawn(move || {
        let (sock, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(sock.try_clone().unwrap());
        let mut writer = sock;

        let _connect_line = read_line(&mut reader);

        writer.write_all(b"PING\r\n").unwrap();
        let pong_line = read_line(&mut reader);
        assert_eq!(pong_line, "PONG\r\n");

        writer.write_all(b"MSG updates 1 2\r\nhi\r\n").unwrap();
    });

    let subscriber = Subscriber::connect(opts).unwrap();

    let msg = subscriber.fetch(Duration::from_secs(2)).unwrap();
    assert_eq!(msg.subject(), Some(&b"updates"[..]));
    assert_eq!(msg.payload(), Some(&b"hi"[..]));

    server.join().unwrap();
}

#[test]
fn disconnect_while_reader_blocked_returns_promptly_and_fetch_then_fails() {
    init_tracing();
    let (listener, opts) = listen();

    let server = thread::spawn(move || {
        let (sock, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(sock);
        let _connect_line = read_line(&mut reader);
        // Then the server goes quiet - the reader thread is left blocked
        // on a transport read until `disconnect` closes the socket.
        let mut sink = String::new();
        let _ = reader.read_line(&mut sink);
    });

    let subscriber = Subscriber::connect(opts).unwrap();
    thread::sleep(Duration::from_millis(20));

    let started = Instant::now();
    subscriber.disconnect();
    assert!(started.elapsed() < Duration::from_secs(2), "disconnect should not block on the reader");

    assert!(matches!(subscriber.fetch(Duration::from_millis(50)), Err(SubscriberError::Disconnected)));

    server.join().unwrap();
}

#[test]
fn disconnect_is_idempotent() {
    init_tracing();
    let (listener, opts) = listen();

    let server = thread::spawn(move || {
        let (sock, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(sock);
        let _connect_line = read_line(&mut reader);
        let mut sink = String::new();
        let _ = reader.read_line(&mut sink);
    });

    let subscriber = Subscriber::connect(opts).unwrap();
    thread::sleep(Duration::from_millis(20));

    subscriber.disconnect();
    subscriber.disconnect();

    server.join().unwrap();
}
