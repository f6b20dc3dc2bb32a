use std::sync::Arc;

use tokio::net::TcpStream;
use tokio::sync::mpsc;

use crate::draw::WinnerSet;
use crate::protocol::deserializer::{Deserialize, DeserializeError};
use crate::protocol::message::{FromAgency, ToAgency, WinnerQuery};
use crate::protocol::serializer::Serialize;
use crate::store::{BetStore, StoreError};

/// A connection that has finished the submission phase and is waiting for
/// the draw before it can be served its winner query.
#[derive(Debug)]
pub struct Parked {
    stream: TcpStream,
    /// Agency id carried by the connection's last decoded batch.
    agency: Option<u16>,
}

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("transport failed: {0}")]
    Io(#[from] tokio::io::Error),

    #[error("malformed submission: {0}")]
    Protocol(DeserializeError),

    #[error("{0}")]
    Store(#[from] StoreError),
}

/// Submission half of an agency session.
///
/// Decodes batches until the agency announces its last one, appending every
/// decoded bet to the store and acknowledging each stored batch. The
/// connection is then parked for the delivery phase. A malformed batch
/// closes the connection without an acknowledgement; only that session is
/// affected.
pub async fn receive_batches(
    mut stream: TcpStream,
    store: Arc<BetStore>,
    parked: mpsc::Sender<Parked>,
) -> Result<(), SessionError> {
    let mut agency = None;

    loop {
        let message = match FromAgency::deserialize(&mut stream).await {
            Ok(message) => message,
            Err(DeserializeError::Io(err)) => return Err(SessionError::Io(err)),
            Err(err) => return Err(SessionError::Protocol(err)),
        };

        match message {
            FromAgency::Batch(batch) => {
                store.append(&batch.bets).await?;
                agency = Some(batch.agency);

                ToAgency::BatchAck.serialize(&mut stream).await?;
                tracing::info!(
                    "stored batch of {} bets from agency {}",
                    batch.bets.len(),
                    batch.agency
                );

                if batch.last {
                    break;
                }
            }
            // bare terminator, nothing to store or acknowledge
            FromAgency::Finished => break,
        }
    }

    // capacity matches the agency count, the send never blocks
    let _ = parked.send(Parked { stream, agency }).await;

    Ok(())
}

/// Query half of an agency session, run once the draw has completed.
///
/// Answers exactly one winner query and closes the connection.
pub async fn deliver_winners(
    conn: Parked,
    winners: Arc<WinnerSet>,
) -> Result<(), SessionError> {
    let Parked { mut stream, agency } = conn;

    let query = WinnerQuery::deserialize(&mut stream).await?;
    if let Some(registered) = agency {
        if registered != query.agency {
            // the protocol trusts the queried id as-is, even when it does
            // not match the id the connection submitted under
            tracing::warn!(
                "connection registered as agency {} queried winners for agency {}",
                registered,
                query.agency
            );
        }
    }

    let documents = winners.documents(query.agency);
    let count = documents.len();
    ToAgency::Winners { documents }.serialize(&mut stream).await?;

    tracing::info!("delivered {} winners to agency {}", count, query.agency);

    Ok(())
}
