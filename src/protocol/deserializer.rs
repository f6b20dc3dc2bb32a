use async_trait::async_trait;
use tokio::io::AsyncReadExt;

use super::message::{Batch, FromAgency, WinnerQuery};
use super::{continuation, MAX_PAYLOAD};

#[async_trait]
pub trait Deserialize: Sized {
    type Error;

    // Deserialize a structure from a reader
    async fn deserialize<R: AsyncReadExt + Unpin + Send>(
        reader: &mut R,
    ) -> Result<Self, Self::Error>;
}

#[derive(thiserror::Error, Debug)]
pub enum DeserializeError {
    #[error("{0}")]
    Io(#[from] tokio::io::Error),

    #[error("{0}")]
    Utf(#[from] std::str::Utf8Error),

    #[error("payload of {0} bytes exceeds the frame limit")]
    Oversized(u16),

    #[error("unknown continuation flag: {0}")]
    Continuation(u16),

    #[error("{0} fields after the agency id is not a whole number of bets")]
    FieldCount(usize),

    #[error("not a number: {0:?}")]
    Number(String),

    #[error("not a calendar date: {0:?}")]
    Date(String),

    #[error("empty payload but more batches announced")]
    EmptyBatch,
}

#[async_trait]
impl Deserialize for FromAgency {
    type Error = DeserializeError;

    async fn deserialize<R: AsyncReadExt + Unpin + Send>(
        reader: &mut R,
    ) -> Result<Self, Self::Error> {
        let length = reader.read_u16().await?;
        if length as usize > MAX_PAYLOAD {
            return Err(DeserializeError::Oversized(length));
        }

        let mut raw = vec![0u8; length as usize];
        reader.read_exact(&mut raw).await?;

        let last = match reader.read_u16().await? {
            continuation::LAST_BATCH => true,
            continuation::MORE_BATCHES => false,
            other => return Err(DeserializeError::Continuation(other)),
        };

        if raw.is_empty() {
            if !last {
                return Err(DeserializeError::EmptyBatch);
            }
            return Ok(FromAgency::Finished);
        }

        let payload = std::str::from_utf8(&raw)?;
        Ok(FromAgency::Batch(Batch::parse(payload, last)?))
    }
}

#[async_trait]
impl Deserialize for WinnerQuery {
    type Error = tokio::io::Error;

    async fn deserialize<R: AsyncReadExt + Unpin + Send>(
        reader: &mut R,
    ) -> Result<Self, Self::Error> {
        let agency = reader.read_u16().await?;

        Ok(Self { agency })
    }
}
