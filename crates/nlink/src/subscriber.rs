use std::{
    sync::{Arc, Mutex},
    thread::{self, JoinHandle},
    time::Duration,
};

use nlink_mailbox::{BlockingMailbox, Mailbox, MailboxError};
use nlink_protocol::{Formatter, Kind, Message};
use nlink_transport::{Connection, TcpTransport, Transport};
use nlink_utils::{Appendable, DEFAULT_ROUND, thread_boot};
use tracing::{debug, info, warn};

use crate::{attention::Attention, error::SubscriberError, options::ConnectOpts};

type MailboxHandle = Arc<dyn Mailbox<Box<Message>>>;

/// Lifecycle of a [`Subscriber`]. Transitions only move forward:
/// `Fresh -> Running -> Stopping -> Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberState {
    Fresh,
    Running,
    Stopping,
    Stopped,
}

/// Connects to a NATS server, drives a background reader thread, and hands
/// decoded messages to the caller through a bounded, blocking `fetch`.
///
/// Exactly two threads ever touch a given `Subscriber`: the thread that
/// calls `connect` and later `subscribe`/`unsubscribe`/`fetch`/`reuse`/
/// `disconnect` (the consumer thread), and the reader thread spawned by
/// `connect`. The transport's write half is mutex-guarded so the consumer
/// thread's writes (SUB/UNSUB/PUB) never race the reader thread's PONG
/// replies.
pub struct Subscriber<T: Transport = TcpTransport> {
    connection: Arc<Connection<T>>,
    free_pool: MailboxHandle,
    delivery: MailboxHandle,
    attention: Arc<Attention>,
    reader: Mutex<Option<JoinHandle<()>>>,
    state: Mutex<SubscriberState>,
    write_scratch: Mutex<Appendable>,
}

impl Subscriber<TcpTransport> {
    /// Dials `opts.host:opts.port` (bounded by `opts.connect_timeout()`),
    /// sends CONNECT, and spawns the reader thread. No background thread
    /// exists if this returns an error.
    pub fn connect(opts: ConnectOpts) -> Result<Self, SubscriberError> {
        use std::net::ToSocketAddrs;

        let addr = (opts.host(), opts.port())
            .to_socket_addrs()
            .map_err(|err| SubscriberError::ConnectFailed(err.to_string()))?
            .next()
            .ok_or_else(|| SubscriberError::ConnectFailed("no address resolved".to_string()))?;

        let transport = TcpTransport::connect_timeout(addr, opts.connect_timeout())
            .map_err(|err| SubscriberError::ConnectFailed(err.to_string()))?;
        Self::connect_with_transport(opts, transport)
    }
}

impl<T: Transport> Subscriber<T> {
    /// Like [`Subscriber::connect`] but takes an already-established
    /// transport, so tests (and callers with their own dialing/TLS logic)
    /// can hand in a fake or pre-wrapped stream.
    pub fn connect_with_transport(opts: ConnectOpts, transport: T) -> Result<Self, SubscriberError> {
        let connection = Arc::new(Connection::new(transport)?);

        let json = serde_json::to_string(&opts)?;
        let mut scratch = Appendable::new(DEFAULT_ROUND);
        Formatter::connect(&mut scratch, &json)?;
        connection.write_frame(scratch.body().unwrap_or(&[]))?;

        let free_pool: MailboxHandle = Arc::new(BlockingMailbox::new(opts.free_pool_capacity));
        let delivery: MailboxHandle = Arc::new(BlockingMailbox::new(opts.delivery_capacity));
        let attention = Arc::new(Attention::new());

        let reader = spawn_reader(
            Arc::clone(&connection),
            Arc::clone(&free_pool),
            Arc::clone(&delivery),
            Arc::clone(&attention),
            opts.reader_core,
            opts.reader_priority,
        )
        .map_err(|err| SubscriberError::ConnectFailed(err.to_string()))?;

        info!(host = opts.host(), port = opts.port(), "subscriber connected");

        Ok(Self {
            connection,
            free_pool,
            delivery,
            attention,
            reader: Mutex::new(Some(reader)),
            state: Mutex::new(SubscriberState::Running),
            write_scratch: Mutex::new(Appendable::new(DEFAULT_ROUND)),
        })
    }

    pub fn state(&self) -> SubscriberState {
        *self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Emits `SUB subject [queue_group] sid`. Purely client-to-server:
    /// success here means the frame was written, not that the server
    /// accepted it. A rejected subscription surfaces as an inbound `-ERR`
    /// Message from `fetch`.
    pub fn subscribe(
        &self,
        subject: &str,
        queue_group: Option<&str>,
        sid: &str,
    ) -> Result<(), SubscriberError> {
        let mut scratch =
            self.write_scratch.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Formatter::sub(
            &mut scratch,
            subject.as_bytes(),
            queue_group.map(str::as_bytes),
            sid.as_bytes(),
        )?;
        self.connection.write_frame(scratch.body().unwrap_or(&[]))?;
        debug!(subject, sid, "sent SUB");
        Ok(())
    }

    /// Emits `UNSUB sid [max_msgs]`.
    pub fn unsubscribe(&self, sid: &str, max_msgs: Option<u64>) -> Result<(), SubscriberError> {
        let mut scratch =
            self.write_scratch.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Formatter::unsub(&mut scratch, sid.as_bytes(), max_msgs)?;
        self.connection.write_frame(scratch.body().unwrap_or(&[]))?;
        debug!(sid, ?max_msgs, "sent UNSUB");
        Ok(())
    }

    /// Publishes a payload with no headers.
    pub fn publish(
        &self,
        subject: &str,
        reply_to: Option<&str>,
        payload: &[u8],
    ) -> Result<(), SubscriberError> {
        let mut scratch =
            self.write_scratch.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Formatter::publish(&mut scratch, subject.as_bytes(), reply_to.map(str::as_bytes), payload)?;
        self.connection.write_frame(scratch.body().unwrap_or(&[]))?;
        Ok(())
    }

    /// A client-initiated keepalive. The server is expected to answer with
    /// `PONG`, which the reader thread consumes without delivering it.
    pub fn send_ping(&self) -> Result<(), SubscriberError> {
        let mut scratch =
            self.write_scratch.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Formatter::ping(&mut scratch)?;
        self.connection.write_frame(scratch.body().unwrap_or(&[]))?;
        Ok(())
    }

    /// Blocks up to `timeout` for the next decoded Message.
    pub fn fetch(&self, timeout: Duration) -> Result<Box<Message>, SubscriberError> {
        match self.delivery.receive(timeout) {
            Ok(msg) => Ok(msg),
            Err(MailboxError::Timeout) => Err(SubscriberError::Timeout),
            Err(MailboxError::Closed) => Err(SubscriberError::Disconnected),
        }
    }

    /// Returns `msg` to the free pool. The caller must not touch `msg`
    /// again afterwards, enforced here by taking it by value.
    pub fn reuse(&self, msg: Box<Message>) {
        // A closed free pool during shutdown just drops the Message; there
        // is nowhere left to recycle it to.
        let _ = self.free_pool.send(msg);
    }

    /// Idempotent. Signals the reader thread, closes the transport (which
    /// unblocks a reader parked in a transport read), joins it, and drains
    /// both mailboxes so no Message is left unaccounted for.
    pub fn disconnect(&self) {
        {
            let mut state =
                self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            if *state == SubscriberState::Stopping || *state == SubscriberState::Stopped {
                return;
            }
            *state = SubscriberState::Stopping;
        }

        self.attention.post();
        if let Err(err) = self.connection.close() {
            warn!(?err, "error closing transport during disconnect");
        }

        if let Some(handle) =
            self.reader.lock().unwrap_or_else(std::sync::PoisonError::into_inner).take()
        {
            let _ = handle.join();
        }

        self.delivery.close();
        self.free_pool.close();
        while self.delivery.receive(Duration::from_millis(0)).is_ok() {}
        while self.free_pool.receive(Duration::from_millis(0)).is_ok() {}

        *self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner) =
            SubscriberState::Stopped;
        info!("subscriber disconnected");
    }
}

impl<T: Transport> Drop for Subscriber<T> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[allow(clippy::too_many_arguments)]
fn spawn_reader<T: Transport>(
    connection: Arc<Connection<T>>,
    free_pool: MailboxHandle,
    delivery: MailboxHandle,
    attention: Arc<Attention>,
    reader_core: Option<usize>,
    reader_priority: nlink_utils::ThreadPriority,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new().name("nlink-reader".to_string()).spawn(move || {
        thread_boot(reader_core, reader_priority);
        reader_loop(&connection, &free_pool, &delivery, &attention);
    })
}

fn reader_loop<T: Transport>(
    connection: &Connection<T>,
    free_pool: &MailboxHandle,
    delivery: &MailboxHandle,
    attention: &Attention,
) {
    let mut pong_scratch = Appendable::new(DEFAULT_ROUND);

    loop {
        if attention.is_set() {
            debug!("reader thread observed attention signal, stopping");
            break;
        }

        let mut msg = acquire_message(free_pool);

        if let Err(err) = connection.read_message(&mut msg) {
            warn!(?err, "reader thread: fatal transport/protocol error");
            attention.post();
            let _ = free_pool.send(msg);
            break;
        }

        match msg.kind() {
            Kind::Ping => {
                if let Err(err) = reply_pong(connection, &mut pong_scratch) {
                    warn!(?err, "failed to reply PONG to server PING");
                }
                let _ = free_pool.send(msg);
            }
            Kind::Pong => {
                let _ = free_pool.send(msg);
            }
            _ => {
                if delivery.send(msg).is_err() {
                    debug!("delivery mailbox closed, reader thread exiting");
                    break;
                }
            }
        }
    }

    attention.post();
}

/// The free pool is unbounded but lazily populated: a near-zero-timeout
/// receive either finds a recycled Message or the pool is empty, in which
/// case a fresh one is allocated on the spot.
fn acquire_message(free_pool: &MailboxHandle) -> Box<Message> {
    match free_pool.receive(Duration::from_millis(0)) {
        Ok(msg) => msg,
        Err(_) => Box::new(Message::new()),
    }
}

fn reply_pong<T: Transport>(
    connection: &Connection<T>,
    scratch: &mut Appendable,
) -> Result<(), SubscriberError> {
    Formatter::pong(scratch)?;
    connection.write_frame(scratch.body().unwrap_or(&[]))?;
    Ok(())
}
