// ABOUTME: Tokio driver that owns the TCP socket and runs a transceiver session on it
// ABOUTME: Serves send and status requests from other tasks through a cloneable SessionHandle

use crate::config::SessionConfig;
use crate::error::{SmppError, SmppResult};
use crate::segmentation::MessageOptions;
use crate::session::{Health, KeepAliveStatus, Session, SessionDelegate, SessionState};
use bytes::BytesMut;
use std::io;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant};
use tracing::{debug, warn};

/// Requests queued for the driver task before it stops reading them.
const COMMAND_BUFFER: usize = 64;

/// SMPP transceiver connection
///
/// Owns the `TcpStream` and the [`Session`] running on it. All session work happens on the
/// task that calls [`Connection::run`]: reads, timer expiry and requests arriving from
/// [`SessionHandle`]s are handled one at a time, so the session's maps never need a lock.
///
/// ```rust,no_run
/// use smpp_transceiver::{Connection, MessageOptions, SessionConfig};
///
/// # async fn example() -> smpp_transceiver::SmppResult<()> {
/// let config = SessionConfig::new("esme", "secret");
/// let (connection, handle) = Connection::connect("localhost:2775", config, ()).await?;
/// tokio::spawn(connection.run());
///
/// handle
///     .send_message(1, "7726", "447700900123", "hello", MessageOptions::default())
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Connection<D: SessionDelegate> {
    // The `TcpStream`, decorated with a `BufWriter` so that every PDU the session queued
    // goes out in as few writes as possible.
    stream: BufWriter<TcpStream>,

    // Read buffer; handed to the session after every read.
    buffer: BytesMut,

    session: Session<D>,

    commands: mpsc::Receiver<Command>,
}

#[derive(Debug)]
enum Command {
    SendMessage {
        message_id: u64,
        source: String,
        destination: String,
        text: String,
        options: MessageOptions,
        reply: oneshot::Sender<SmppResult<u32>>,
    },
    SendMulti {
        message_id: u64,
        source: String,
        destinations: Vec<String>,
        text: String,
        options: MessageOptions,
        reply: oneshot::Sender<SmppResult<u32>>,
    },
    SendLongMessage {
        message_id: u64,
        source: String,
        destination: String,
        text: String,
        options: MessageOptions,
        reply: oneshot::Sender<SmppResult<Vec<u32>>>,
    },
    SendBind {
        reply: oneshot::Sender<SmppResult<u32>>,
    },
    SendUnbind {
        reply: oneshot::Sender<SmppResult<u32>>,
    },
    State {
        reply: oneshot::Sender<(SessionState, Health)>,
    },
    KeepAlive {
        reply: oneshot::Sender<KeepAliveStatus>,
    },
    Close,
}

fn now() -> std::time::Instant {
    Instant::now().into_std()
}

impl<D: SessionDelegate> Connection<D> {
    /// Dial `addr` and send the bind. The session is not bound until the driver has run.
    pub async fn connect<A: ToSocketAddrs>(
        addr: A,
        config: SessionConfig,
        delegate: D,
    ) -> SmppResult<(Self, SessionHandle)> {
        let socket = TcpStream::connect(addr).await?;
        Self::new(socket, config, delegate)
    }

    /// Run a session on an already established socket.
    pub fn new(
        socket: TcpStream,
        config: SessionConfig,
        delegate: D,
    ) -> SmppResult<(Self, SessionHandle)> {
        Self::with_session(socket, Session::new(config, delegate))
    }

    /// As [`Connection::new`] for a session built by the caller (custom span, keepalive hook).
    pub fn with_session(
        socket: TcpStream,
        mut session: Session<D>,
    ) -> SmppResult<(Self, SessionHandle)> {
        if let Err(err) = socket.set_nodelay(true) {
            warn!(%err, "could not disable Nagle");
        }
        session.on_connected(now())?;

        let (sender, commands) = mpsc::channel(COMMAND_BUFFER);
        let connection = Connection {
            stream: BufWriter::new(socket),
            buffer: BytesMut::with_capacity(4 * 1024),
            session,
            commands,
        };
        Ok((connection, SessionHandle { commands: sender }))
    }

    /// Drive the session until the connection closes, then hand the delegate back.
    pub async fn run(mut self) -> D {
        let mut reading = true;
        let mut commands_open = true;

        loop {
            if let Err(err) = self.flush().await {
                self.session.on_transport_error(err.into());
            }
            if self.session.is_close_requested() {
                break;
            }

            let deadline = self.session.poll_timeout();
            let sleep = time::sleep_until(
                deadline
                    .map(Instant::from_std)
                    .unwrap_or_else(Instant::now),
            );

            tokio::select! {
                read = self.stream.read_buf(&mut self.buffer), if reading => match read {
                    Ok(0) => {
                        debug!("connection closed by SMSC");
                        break;
                    }
                    Ok(_) => {
                        self.session.on_bytes_received(&self.buffer);
                        self.buffer.clear();
                    }
                    Err(err) => {
                        reading = false;
                        self.session.on_transport_error(err.into());
                    }
                },
                _ = sleep, if deadline.is_some() => {
                    self.session.on_timer_fired(now());
                }
                command = self.commands.recv(), if commands_open => match command {
                    Some(command) => self.execute(command),
                    None => commands_open = false,
                },
                else => break,
            }
        }

        self.session.on_closed();
        if let Err(err) = self.stream.shutdown().await {
            debug!(%err, "shutdown after close");
        }
        self.session.into_delegate()
    }

    /// Write everything the session queued.
    async fn flush(&mut self) -> io::Result<()> {
        let mut written = false;
        while let Some(pdu) = self.session.poll_transmit() {
            self.stream.write_all(&pdu).await?;
            written = true;
        }
        if written {
            self.stream.flush().await?;
        }
        Ok(())
    }

    fn execute(&mut self, command: Command) {
        let now = now();
        let session = &mut self.session;

        // A dropped reply means the caller stopped waiting; nothing to do.
        match command {
            Command::SendMessage {
                message_id,
                source,
                destination,
                text,
                options,
                reply,
            } => {
                let _ = reply.send(session.send_message(
                    message_id,
                    &source,
                    &destination,
                    &text,
                    &options,
                    now,
                ));
            }
            Command::SendMulti {
                message_id,
                source,
                destinations,
                text,
                options,
                reply,
            } => {
                let destinations: Vec<&str> = destinations.iter().map(String::as_str).collect();
                let _ = reply.send(session.send_multi(
                    message_id,
                    &source,
                    &destinations,
                    &text,
                    &options,
                    now,
                ));
            }
            Command::SendLongMessage {
                message_id,
                source,
                destination,
                text,
                options,
                reply,
            } => {
                let _ = reply.send(session.send_long_message(
                    message_id,
                    &source,
                    &destination,
                    &text,
                    &options,
                    now,
                ));
            }
            Command::SendBind { reply } => {
                let _ = reply.send(session.send_bind(now));
            }
            Command::SendUnbind { reply } => {
                let _ = reply.send(session.send_unbind(now));
            }
            Command::State { reply } => {
                let _ = reply.send((session.state(), session.health()));
            }
            Command::KeepAlive { reply } => {
                let _ = reply.send(session.keepalive_status());
            }
            Command::Close => session.close(),
        }
    }
}

/// Cloneable access to a running [`Connection`] from any task.
///
/// Precondition failures (not bound, connection unhealthy) come back as
/// `Err(SmppError::InvalidState)`; once the driver has stopped every call returns
/// `Err(SmppError::ConnectionClosed)`. Outcomes of accepted sends arrive through the
/// session delegate.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
}

impl SessionHandle {
    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> SmppResult<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| SmppError::ConnectionClosed)?;
        response.await.map_err(|_| SmppError::ConnectionClosed)
    }

    /// Submit a single-part message. Returns its sequence number.
    pub async fn send_message(
        &self,
        message_id: u64,
        source: impl Into<String>,
        destination: impl Into<String>,
        text: impl Into<String>,
        options: MessageOptions,
    ) -> SmppResult<u32> {
        self.request(|reply| Command::SendMessage {
            message_id,
            source: source.into(),
            destination: destination.into(),
            text: text.into(),
            options,
            reply,
        })
        .await?
    }

    pub async fn send_multi(
        &self,
        message_id: u64,
        source: impl Into<String>,
        destinations: Vec<String>,
        text: impl Into<String>,
        options: MessageOptions,
    ) -> SmppResult<u32> {
        self.request(|reply| Command::SendMulti {
            message_id,
            source: source.into(),
            destinations,
            text: text.into(),
            options,
            reply,
        })
        .await?
    }

    /// Segment and submit. Returns one sequence number per part.
    pub async fn send_long_message(
        &self,
        message_id: u64,
        source: impl Into<String>,
        destination: impl Into<String>,
        text: impl Into<String>,
        options: MessageOptions,
    ) -> SmppResult<Vec<u32>> {
        self.request(|reply| Command::SendLongMessage {
            message_id,
            source: source.into(),
            destination: destination.into(),
            text: text.into(),
            options,
            reply,
        })
        .await?
    }

    pub async fn send_bind(&self) -> SmppResult<u32> {
        self.request(|reply| Command::SendBind { reply }).await?
    }

    pub async fn send_unbind(&self) -> SmppResult<u32> {
        self.request(|reply| Command::SendUnbind { reply }).await?
    }

    pub async fn state(&self) -> SmppResult<(SessionState, Health)> {
        self.request(|reply| Command::State { reply }).await
    }

    pub async fn keepalive_status(&self) -> SmppResult<KeepAliveStatus> {
        self.request(|reply| Command::KeepAlive { reply }).await
    }

    /// Drop the connection without unbinding.
    pub async fn close(&self) -> SmppResult<()> {
        self.commands
            .send(Command::Close)
            .await
            .map_err(|_| SmppError::ConnectionClosed)
    }
}
