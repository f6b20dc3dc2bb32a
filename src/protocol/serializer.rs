use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use super::message::ToAgency;
use super::BATCH_ACCEPTED;

#[async_trait]
pub trait Serialize: Sized {
    type Error;

    /// Serialize a structure into a writer
    async fn serialize<W: AsyncWriteExt + Unpin + Send>(
        &self,
        writer: &mut W,
    ) -> Result<(), Self::Error>;
}

#[async_trait]
impl Serialize for ToAgency {
    type Error = tokio::io::Error;

    async fn serialize<W: AsyncWriteExt + Unpin + Send>(
        &self,
        writer: &mut W,
    ) -> Result<(), Self::Error> {
        match self {
            ToAgency::BatchAck => writer.write_u16(BATCH_ACCEPTED).await?,
            ToAgency::Winners { documents } => {
                writer.write_all(encode_winners(documents).as_bytes()).await?
            }
        };
        writer.flush().await?;

        Ok(())
    }
}

// A bare ";" when the agency has no winners, otherwise the joined document
// list prefixed with its decimal character length. Unlike the submission
// phase there is no fixed-width length prefix here; the header is part of
// the text itself.
fn encode_winners(documents: &[String]) -> String {
    if documents.is_empty() {
        return ";".to_owned();
    }

    let joined = documents.join(";");
    format!("{};{}", joined.len(), joined)
}

#[cfg(test)]
mod tests {
    use crate::protocol::message::ToAgency;

    use super::Serialize;

    #[tokio::test]
    async fn serialize_batch_ack() {
        let mut raw = vec![];
        ToAgency::BatchAck.serialize(&mut raw).await.unwrap();

        assert_eq!(raw, b"\x00\x01");
    }

    #[tokio::test]
    async fn serialize_empty_winner_list() {
        let mut raw = vec![];
        ToAgency::Winners { documents: vec![] }
            .serialize(&mut raw)
            .await
            .unwrap();

        assert_eq!(raw, b";");
    }

    #[tokio::test]
    async fn serialize_single_winner() {
        let mut raw = vec![];
        ToAgency::Winners {
            documents: vec!["30111222".into()],
        }
        .serialize(&mut raw)
        .await
        .unwrap();

        assert_eq!(raw, b"8;30111222");
    }

    #[tokio::test]
    async fn serialize_multiple_winners() {
        let mut raw = vec![];
        ToAgency::Winners {
            documents: vec!["30111222".into(), "27999888".into()],
        }
        .serialize(&mut raw)
        .await
        .unwrap();

        assert_eq!(raw, b"17;30111222;27999888");
    }
}
