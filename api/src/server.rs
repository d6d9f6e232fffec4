use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use std::{future::Future, io, net::SocketAddr, sync::Arc};

use http::header::USER_AGENT;
use http::StatusCode;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::error::Elapsed;

use crate::config::Config;
use crate::error::RequestError;
use crate::http::{reader, writer, IntoResponse, Request, Response};

const BACKOFF: Duration = Duration::from_millis(50);

type Handler<A, F> = fn(Request, A) -> F;

pub struct Server<A, F> {
    state: A,
    handler: Handler<A, F>,
    semaphore: Arc<Semaphore>,
    permits: usize,
    timeout: Duration,
    max_body: usize,
}

impl<S, F> Server<S, F>
where
    S: Clone + Send + Sync + 'static,
    F: Future<Output = Response> + Send + 'static,
{
    pub fn new(state: S, handler: Handler<S, F>, config: &Config) -> Self {
        let permits = config.max_connections.max(1);

        Self {
            state,
            handler,
            semaphore: Arc::new(Semaphore::new(permits)),
            permits,
            timeout: config.request_timeout(),
            max_body: config.max_body_bytes,
        }
    }

    pub async fn bind<A: ToSocketAddrs>(self, addr: A) -> io::Result<()> {
        let server = Arc::new(self);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        tracing::info!(target: "listener", ?addr, "server is running");

        let (tx, mut rx) = tokio::sync::mpsc::channel(10_000);
        let pending = Arc::new(AtomicUsize::new(0));
        tokio::spawn({
            let pending = Arc::clone(&pending);
            async move {
                loop {
                    match listener.accept().await {
                        Ok(accepted) => {
                            pending.fetch_add(1, Ordering::Relaxed);
                            if tx.send(accepted).await.is_err() {
                                break;
                            }
                        }
                        // usually fd exhaustion, give the running tasks a chance to finish
                        Err(err) => {
                            tracing::warn!(target: "listener", %err, "failed to accept connection");
                            tokio::time::sleep(BACKOFF).await;
                        }
                    }
                }
            }
        });

        let mut window = Instant::now();
        let mut accepted = 0usize;

        while let Some((socket, addr)) = rx.recv().await {
            let permit = server.acquire_permit().await;
            let pending = pending.fetch_sub(1, Ordering::Relaxed) - 1;

            accepted += 1;
            if window.elapsed() > Duration::from_secs(1) {
                let running = server.permits - server.semaphore.available_permits();
                tracing::debug!(target: "listener", accepted, running, pending, "connection stats");
                window = Instant::now();
                accepted = 0;
            }

            tokio::spawn(Arc::clone(&server).handle_request(socket, addr, permit));
        }

        Ok(())
    }

    #[tracing::instrument(skip(self, socket, _permit))]
    async fn handle_request(
        self: Arc<Self>,
        socket: TcpStream,
        addr: SocketAddr,
        _permit: OwnedSemaphorePermit,
    ) {
        let _ = self.serve_connection(socket).await;
    }

    /// Reads one request, answers it and closes the stream, all within the
    /// configured request timeout.
    pub async fn serve_connection<IO>(&self, stream: IO) -> Result<(), Elapsed>
    where
        IO: AsyncRead + AsyncWrite + Unpin,
    {
        let served = tokio::time::timeout(self.timeout, self.answer(stream)).await;
        if served.is_err() {
            tracing::warn!(timeout = ?self.timeout, "connection timed out");
        }

        served
    }

    async fn answer<IO>(&self, stream: IO)
    where
        IO: AsyncRead + AsyncWrite + Unpin,
    {
        let (reader, mut writer) = tokio::io::split(stream);
        let mut reader = BufReader::new(reader);

        let resp = match reader::read_request(&mut reader, self.max_body).await {
            Ok(req) => self.dispatch(req).await,
            Err(RequestError::ConnectionClosed) => {
                tracing::debug!("connection ended before request");
                return;
            }
            Err(err) => {
                tracing::warn!(%err, "failed to read request");
                (StatusCode::BAD_REQUEST, err.to_string()).into_response()
            }
        };

        if let Err(err) = writer::send(&mut writer, &resp).await {
            tracing::warn!(%err, "failed to send response");
        }
        let _ = writer.shutdown().await;
    }

    async fn dispatch(&self, req: Request) -> Response {
        let method = req.method().clone();
        let path = req.uri().path().to_owned();
        let agent = req
            .headers()
            .get(USER_AGENT)
            .and_then(|agent| agent.to_str().ok())
            .unwrap_or("unknown")
            .to_owned();

        let started = Instant::now();
        let resp = (self.handler)(req, self.state.clone()).await;

        tracing::info!(
            target: "requests",
            %method,
            %path,
            %agent,
            status = resp.status().as_u16(),
            elapsed = ?started.elapsed(),
            "{method} {path}"
        );

        resp
    }

    async fn acquire_permit(&self) -> OwnedSemaphorePermit {
        let mut delay = BACKOFF;
        loop {
            if let Ok(permit) = Arc::clone(&self.semaphore).try_acquire_owned() {
                break permit;
            }

            tokio::time::sleep(delay).await;
            delay = (delay * 2).min(BACKOFF * 32);
        }
    }
}
