
use std::io::BufReader;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::{trace, warn};
use tokio::net::{lookup_host, UdpSocket};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::agent::*;
use crate::error::*;
use crate::message::*;

const DEFAULT_TIMEOUT_RATE: Duration = Duration::from_millis(100);

const NET_UDP: &str = "udp";
const NET_UDP4: &str = "udp4";
const NET_UDP6: &str = "udp6";

/// DEFAULT_NET is the network the client dials by default.
pub const DEFAULT_NET: &str = NET_UDP;
/// DEFAULT_STUN_SERVER is the server the client dials by default.
pub const DEFAULT_STUN_SERVER: &str = "gortc.io:3478";

const READ_BUF_SIZE: usize = 1024;

/// Conn is the datagram endpoint the client drives: a subset of an OS
/// datagram socket. Implementations must be safe for one concurrent
/// reader and any number of concurrent writers.
#[async_trait]
pub trait Conn: Send + Sync {
    async fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr)>;
    async fn send_to(&self, buf: &[u8], target: SocketAddr) -> Result<usize>;
    fn local_addr(&self) -> Result<SocketAddr>;
    async fn close(&self) -> Result<()>;
}

#[async_trait]
impl Conn for UdpSocket {
    async fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr)> {
        Ok(UdpSocket::recv_from(self, buf).await?)
    }

    async fn send_to(&self, buf: &[u8], target: SocketAddr) -> Result<usize> {
        Ok(UdpSocket::send_to(self, buf, target).await?)
    }

    fn local_addr(&self) -> Result<SocketAddr> {
        Ok(UdpSocket::local_addr(self)?)
    }

    async fn close(&self) -> Result<()> {
        // The socket is released when the last reference drops; pending
        // reads are preempted by the client close signal.
        Ok(())
    }
}

/// ClientBuilder assembles a Client from its collaborators.
pub struct ClientBuilder {
    conn: Option<Arc<dyn Conn>>,
    agent: Option<Arc<dyn ClientAgent>>,
    server: Option<SocketAddr>,
    rate: Duration,
    err: Option<Error>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        ClientBuilder::new()
    }
}

impl ClientBuilder {
    pub fn new() -> Self {
        ClientBuilder {
            conn: None,
            agent: None,
            server: None,
            rate: DEFAULT_TIMEOUT_RATE,
            err: None,
        }
    }

    /// with_conn binds the datagram endpoint; setting a second one is
    /// an error, surfaced by build.
    pub fn with_conn(mut self, conn: Arc<dyn Conn>) -> Self {
        if self.conn.is_some() {
            self.err.get_or_insert(Error::ErrConnectionAlreadySet);
        } else {
            self.conn = Some(conn);
        }
        self
    }

    /// with_server sets the default destination for start, request and
    /// indicate.
    pub fn with_server(mut self, addr: SocketAddr) -> Self {
        self.server = Some(addr);
        self
    }

    /// with_agent substitutes the transaction agent; mostly useful for
    /// tests.
    pub fn with_agent(mut self, agent: Arc<dyn ClientAgent>) -> Self {
        self.agent = Some(agent);
        self
    }

    /// with_timeout_rate overrides the default collector interval of
    /// 100ms.
    pub fn with_timeout_rate(mut self, d: Duration) -> Self {
        self.rate = d;
        self
    }

    pub fn build(self) -> Result<Client> {
        if let Some(err) = self.err {
            return Err(err);
        }
        let conn = self.conn.ok_or(Error::ErrNoConnection)?;
        let agent = self
            .agent
            .unwrap_or_else(|| Arc::new(Agent::default()));
        let (close_tx, close_rx) = watch::channel(false);
        Ok(Client {
            conn,
            agent,
            server: self.server,
            gc_rate: self.rate,
            closed: Mutex::new(false),
            close_tx,
            close_rx,
            tasks: Mutex::new(Vec::new()),
        })
    }
}

/// Client simulates a "connection" to a STUN server: it binds a
/// datagram endpoint to an Agent, writes requests and demultiplexes
/// incoming datagrams into per-transaction handlers.
///
/// The caller should either continuously call read_from or use
/// handle_transactions to keep transaction processing active, and must
/// close the client when done; dropping a non-closed client logs a
/// warning.
impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("server", &self.server)
            .field("gc_rate", &self.gc_rate)
            .finish()
    }
}

pub struct Client {
    conn: Arc<dyn Conn>,
    agent: Arc<dyn ClientAgent>,
    server: Option<SocketAddr>,
    gc_rate: Duration,
    closed: Mutex<bool>,
    close_tx: watch::Sender<bool>,
    close_rx: watch::Receiver<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

fn closed_or_panic(result: Result<()>) {
    match result {
        Ok(()) | Err(Error::ErrAgentClosed) => {}
        Err(err) => panic!("{err}"),
    }
}

/// read_and_process reads one or more datagrams from conn: STUN
/// messages are decoded and handed to the agent, anything else is
/// returned to the caller. An undecodable datagram that passed the
/// is_message check is returned as well, since the caller may know how
/// to handle it.
async fn read_and_process(
    conn: &Arc<dyn Conn>,
    agent: &Arc<dyn ClientAgent>,
    buf: &mut [u8],
) -> Result<(usize, SocketAddr)> {
    loop {
        let (n, addr) = conn.recv_from(buf).await?;
        if !is_message(&buf[..n]) {
            return Ok((n, addr));
        }
        let mut msg = Message::new();
        let mut reader = BufReader::new(&buf[..n]);
        if msg.read_from(&mut reader).is_err() {
            return Ok((n, addr));
        }
        agent.process(msg)?;
    }
}

impl Client {
    /// dial resolves the server address, binds a UDP socket and returns
    /// a ready client. Empty network and server select the defaults.
    pub async fn dial(
        network: &str,
        local_address: &str,
        server_address: &str,
    ) -> Result<Client> {
        let network = if network.is_empty() { DEFAULT_NET } else { network };
        if !matches!(network, NET_UDP | NET_UDP4 | NET_UDP6) {
            return Err(Error::ErrUnsupportedNetwork);
        }
        let server_address = if server_address.is_empty() {
            DEFAULT_STUN_SERVER
        } else {
            server_address
        };
        let mut addrs = lookup_host(server_address).await?;
        let raddr = match network {
            NET_UDP4 => addrs.find(SocketAddr::is_ipv4),
            NET_UDP6 => addrs.find(SocketAddr::is_ipv6),
            _ => addrs.next(),
        }
        .ok_or_else(|| {
            Error::Other(format!("no address found for {server_address}"))
        })?;

        let laddr = if !local_address.is_empty() {
            local_address
        } else if network == NET_UDP6 {
            "[::]:0"
        } else {
            "0.0.0.0:0"
        };
        let conn = UdpSocket::bind(laddr).await?;

        ClientBuilder::new()
            .with_conn(Arc::new(conn))
            .with_server(raddr)
            .build()
    }

    fn server_addr(&self) -> Result<SocketAddr> {
        self.server.ok_or(Error::ErrClientNotInitialized)
    }

    fn is_closed(&self) -> Result<bool> {
        Ok(*self.closed.lock()?)
    }

    /// local_addr returns the local address of the bound endpoint.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.conn.local_addr()
    }

    /// write_to writes raw bytes to the remote peer, bypassing the
    /// transaction machinery.
    pub async fn write_to(
        &self,
        buf: &[u8],
        addr: SocketAddr,
    ) -> Result<usize> {
        self.conn.send_to(buf, addr).await
    }

    /// read_from keeps transaction processing alive and hands non-STUN
    /// datagrams back to the caller. Alternatively see
    /// handle_transactions for automated processing.
    pub async fn read_from(
        &self,
        buf: &mut [u8],
    ) -> Result<(usize, SocketAddr)> {
        read_and_process(&self.conn, &self.agent, buf).await
    }

    /// handle_transactions spawns the read loop and the collector loop,
    /// automatically processing and garbage collecting transactions.
    /// Non-STUN datagrams are dropped; use read_from to handle them
    /// manually.
    pub fn handle_transactions(&self) {
        self.read_until_closed();
        self.collect_until_closed();
    }

    /// read_until_closed spawns the background read loop.
    pub fn read_until_closed(&self) {
        let conn = Arc::clone(&self.conn);
        let agent = Arc::clone(&self.agent);
        let mut close_rx = self.close_rx.clone();
        let handle = tokio::spawn(async move {
            let mut buf = vec![0u8; READ_BUF_SIZE];
            loop {
                tokio::select! {
                    _ = close_rx.changed() => return,
                    res = read_and_process(&conn, &agent, &mut buf) => {
                        match res {
                            Err(Error::ErrAgentClosed) => return,
                            Err(err) => trace!("read loop: {err}"),
                            Ok(_) => {} // non-STUN datagram, dropped
                        }
                    }
                }
            }
        });
        if let Ok(mut tasks) = self.tasks.lock() {
            tasks.push(handle);
        }
    }

    /// collect_until_closed spawns the background collector loop,
    /// ticking every timeout-rate interval. Alternatively, use collect
    /// for manual collection.
    pub fn collect_until_closed(&self) {
        let agent = Arc::clone(&self.agent);
        let mut close_rx = self.close_rx.clone();
        let gc_rate = self.gc_rate;
        let handle = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + gc_rate;
            let mut interval = tokio::time::interval_at(start, gc_rate);
            loop {
                tokio::select! {
                    _ = close_rx.changed() => return,
                    _ = interval.tick() => {
                        closed_or_panic(agent.collect(Instant::now()));
                    }
                }
            }
        });
        if let Ok(mut tasks) = self.tasks.lock() {
            tasks.push(handle);
        }
    }

    /// collect manually triggers transaction garbage collection.
    pub fn collect(&self, gc_time: Instant) -> Result<()> {
        self.agent.collect(gc_time)
    }

    /// start_to starts a transaction (if a handler is set) and writes
    /// the message to a specific peer; the handler is called
    /// asynchronously. If the write fails after the transaction was
    /// registered, the transaction is stopped and the write error is
    /// propagated; a stop failure on top wraps both into StopError.
    pub async fn start_to(
        &self,
        m: &Message,
        raddr: SocketAddr,
        deadline: Instant,
        handler: Handler,
    ) -> Result<()> {
        if self.is_closed()? {
            return Err(Error::ErrClientClosed);
        }
        let has_handler = handler.is_some();
        if has_handler {
            // Starting the transaction only if the caller wants the
            // outcome; indications skip registration.
            self.agent.start(m.transaction_id, deadline, handler)?;
        }
        if let Err(err) = self.conn.send_to(&m.raw, raddr).await {
            if has_handler {
                // Stopping the transaction instead of waiting for its
                // deadline.
                if let Err(stop_err) = self.agent.stop(m.transaction_id) {
                    return Err(Error::ErrStop(StopError {
                        err: Box::new(stop_err),
                        cause: Box::new(err),
                    }));
                }
            }
            return Err(err);
        }
        Ok(())
    }

    /// start starts a transaction against the configured server.
    pub async fn start(
        &self,
        m: &Message,
        deadline: Instant,
        handler: Handler,
    ) -> Result<()> {
        self.start_to(m, self.server_addr()?, deadline, handler).await
    }

    /// indicate sends an indication to the configured server:
    /// fire-and-forget, no transaction is registered.
    pub async fn indicate(&self, m: &Message) -> Result<()> {
        self.start_to(m, self.server_addr()?, Instant::now(), None)
            .await
    }

    /// do_to performs a transaction against a specific peer, blocking
    /// until the handler fires: the response message, or the terminal
    /// transaction error.
    pub async fn do_to(
        &self,
        m: &Message,
        raddr: SocketAddr,
        deadline: Instant,
    ) -> Result<Message> {
        let (handler_tx, mut handler_rx) = mpsc::unbounded_channel();
        self.start_to(m, raddr, deadline, Some(Arc::new(handler_tx)))
            .await?;
        match handler_rx.recv().await {
            Some(event) => event.result,
            None => Err(Error::ErrAgentClosed),
        }
    }

    /// request is a do_to wrapper using the configured server.
    pub async fn request(
        &self,
        m: &Message,
        deadline: Instant,
    ) -> Result<Message> {
        self.do_to(m, self.server_addr()?, deadline).await
    }

    /// close stops the background tasks and closes the agent and the
    /// endpoint, returning CloseError when either fails. A second close
    /// returns ErrClientClosed.
    pub async fn close(&self) -> Result<()> {
        {
            let mut closed = self.closed.lock()?;
            if *closed {
                return Err(Error::ErrClientClosed);
            }
            *closed = true;
        }
        let agent_err = self.agent.close();
        let conn_err = self.conn.close().await;
        let _ = self.close_tx.send(true);
        let tasks: Vec<JoinHandle<()>> = {
            let mut tasks = self.tasks.lock()?;
            tasks.drain(..).collect()
        };
        for task in tasks {
            let _ = task.await;
        }
        match (agent_err, conn_err) {
            (Ok(()), Ok(())) => Ok(()),
            (agent, connection) => Err(Error::ErrClose(CloseError {
                agent: agent.err().map(Box::new),
                connection: connection.err().map(Box::new),
            })),
        }
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        // Callers must close; this is only a diagnostic for leaks.
        if let Ok(closed) = self.closed.lock() {
            if !*closed {
                warn!("client: dropped non-closed client");
            }
        }
    }
}
