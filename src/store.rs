use std::path::PathBuf;

use chrono::NaiveDate;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::protocol::message::Bet;

const BIRTHDATE_FORMAT: &str = "%Y-%m-%d";

/// Append-only bet persistence shared by every agency session.
///
/// Appends and the draw-time read take the same lock, so a read never
/// observes a half-written batch and no two batches interleave on disk.
#[derive(Debug)]
pub struct BetStore {
    path: PathBuf,
    lock: Mutex<()>,
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("{0}")]
    Io(#[from] tokio::io::Error),

    #[error("corrupt record in bet store: {0:?}")]
    CorruptRecord(String),
}

impl BetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Appends a batch of bets. The batch only becomes visible to `load`
    /// once this call has returned.
    pub async fn append(&self, bets: &[Bet]) -> Result<(), StoreError> {
        if bets.is_empty() {
            return Ok(());
        }

        let _guard = self.lock.lock().await;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        let mut records = String::new();
        for bet in bets {
            records.push_str(&to_record(bet));
            records.push('\n');
        }

        file.write_all(records.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }

    /// Reads back every bet stored so far.
    pub async fn load(&self) -> Result<Vec<Bet>, StoreError> {
        let _guard = self.lock.lock().await;

        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            // nobody has placed a bet yet
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
            Err(err) => return Err(err.into()),
        };

        raw.lines().map(from_record).collect()
    }
}

fn to_record(bet: &Bet) -> String {
    format!(
        "{},{},{},{},{},{}",
        bet.agency,
        bet.first_name,
        bet.last_name,
        bet.document,
        bet.birthdate.format(BIRTHDATE_FORMAT),
        bet.number,
    )
}

fn from_record(line: &str) -> Result<Bet, StoreError> {
    let corrupt = || StoreError::CorruptRecord(line.to_owned());

    let fields: Vec<&str> = line.split(',').collect();
    let &[agency, first_name, last_name, document, birthdate, number] = fields.as_slice() else {
        return Err(corrupt());
    };

    Ok(Bet {
        agency: agency.parse().map_err(|_| corrupt())?,
        first_name: first_name.to_owned(),
        last_name: last_name.to_owned(),
        document: document.to_owned(),
        birthdate: NaiveDate::parse_from_str(birthdate, BIRTHDATE_FORMAT)
            .map_err(|_| corrupt())?,
        number: number.parse().map_err(|_| corrupt())?,
    })
}
