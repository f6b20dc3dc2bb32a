use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpSocket};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;

use crate::client::{self, Parked};
use crate::config::Config;
use crate::draw::{self, WinnerSet};
use crate::store::BetStore;

/// One-round lottery server.
///
/// A round has two strictly sequential phases: every configured agency
/// submits its batches (one worker per connection), then, once the last
/// submission worker has finished, the draw runs and every parked
/// connection is answered its winner query (again one worker each).
pub struct Server {
    listener: TcpListener,
    agencies: usize,
    store: Arc<BetStore>,
    shutdown: watch::Receiver<bool>,
}

impl Server {
    /// Binds the listening socket with the configured accept backlog.
    pub async fn bind(
        config: &Config,
        store: Arc<BetStore>,
        shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<Self> {
        let addr = SocketAddr::new(config.host, config.port);
        let socket = match addr {
            SocketAddr::V4(_) => TcpSocket::new_v4()?,
            SocketAddr::V6(_) => TcpSocket::new_v6()?,
        };
        socket.set_reuseaddr(true)?;
        socket.bind(addr)?;
        let listener = socket.listen(config.backlog)?;

        Ok(Self {
            listener,
            agencies: config.agencies,
            store,
            shutdown,
        })
    }

    pub fn local_addr(&self) -> tokio::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs one full round: ingest every agency, draw, deliver winners.
    pub async fn run(mut self) -> anyhow::Result<()> {
        let parked = self.ingest().await;

        if *self.shutdown.borrow() {
            tracing::info!("shutting down before the draw");
            return Ok(());
        }

        // exclusive read: a late append cannot interleave with this load
        let bets = self.store.load().await?;
        let winners = Arc::new(WinnerSet::compute(&bets, draw::winning_bet));
        tracing::info!(
            "draw complete: {} winning bets out of {}",
            winners.len(),
            bets.len()
        );

        if *self.shutdown.borrow() {
            tracing::info!("shutting down before winner delivery");
            return Ok(());
        }

        self.deliver(parked, winners).await;
        tracing::info!("all winner queries answered, round complete");

        Ok(())
    }

    // Accepts up to the configured agency count and runs one submission
    // worker per connection. Returns only when every spawned worker has
    // finished; no bet can be appended after this point.
    async fn ingest(&mut self) -> Vec<Parked> {
        let (tx, mut rx) = mpsc::channel(self.agencies.max(1));
        let mut workers = JoinSet::new();

        for _ in 0..self.agencies {
            let accepted = tokio::select! {
                accepted = self.listener.accept() => accepted,
                _ = self.shutdown.changed() => {
                    tracing::info!("shutdown requested, no longer accepting agencies");
                    break;
                }
            };

            match accepted {
                Ok((stream, addr)) => {
                    tracing::debug!("accepted connection from {}", addr);
                    workers.spawn(client::receive_batches(
                        stream,
                        self.store.clone(),
                        tx.clone(),
                    ));
                }
                Err(err) => {
                    // expected when the listening socket goes away mid-shutdown
                    tracing::warn!("accept failed, closing the submission phase: {}", err);
                    break;
                }
            }
        }
        drop(tx);

        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(err)) => tracing::warn!("agency session failed: {}", err),
                Err(err) => tracing::error!("agency session panicked: {}", err),
            }
        }

        // every producer is gone, whatever is buffered is the full parked set
        let mut parked = Vec::with_capacity(self.agencies);
        while let Ok(conn) = rx.try_recv() {
            parked.push(conn);
        }

        parked
    }

    // Answers the winner query of every parked connection, one worker each.
    async fn deliver(&mut self, parked: Vec<Parked>, winners: Arc<WinnerSet>) {
        let mut workers = JoinSet::new();
        for conn in parked {
            workers.spawn(client::deliver_winners(conn, winners.clone()));
        }

        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(err)) => tracing::warn!("winner delivery failed: {}", err),
                Err(err) => tracing::error!("delivery worker panicked: {}", err),
            }
        }
    }
}
