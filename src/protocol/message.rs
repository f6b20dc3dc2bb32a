use chrono::NaiveDate;

use super::deserializer::DeserializeError;

const FIELDS_PER_BET: usize = 5;
const BIRTHDATE_FORMAT: &str = "%Y-%m-%d";

/// A single wager, attributed to the agency that submitted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bet {
    pub agency: u16,
    pub document: String,
    pub first_name: String,
    pub last_name: String,
    pub birthdate: NaiveDate,
    pub number: u32,
}

/// One submission message: the sending agency plus zero or more bets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub agency: u16,
    pub bets: Vec<Bet>,
    /// Set when the continuation flag announced no further batches.
    pub last: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FromAgency {
    Batch(Batch),
    /// Bare end-of-batches marker: empty payload, continuation flag 0.
    Finished,
}

/// A winner query: the bare agency id sent after the draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WinnerQuery {
    pub agency: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToAgency {
    BatchAck,
    Winners { documents: Vec<String> },
}

impl Batch {
    /// Parses the delimited text payload of a submission frame.
    ///
    /// The payload is `agency;doc;first;last;birthdate;number;...` where
    /// every run of 5 fields after the agency id is one bet. A single
    /// trailing separator is tolerated since the agency client terminates
    /// each record with one.
    pub fn parse(payload: &str, last: bool) -> Result<Self, DeserializeError> {
        let payload = payload.strip_suffix(';').unwrap_or(payload);
        let mut fields = payload.split(';');

        // split always yields at least one field
        let agency = parse_number(fields.next().unwrap_or_default())?;

        let fields: Vec<&str> = fields.collect();
        if fields.len() % FIELDS_PER_BET != 0 {
            return Err(DeserializeError::FieldCount(fields.len()));
        }

        let bets = fields
            .chunks(FIELDS_PER_BET)
            .map(|record| Bet::from_record(agency, record))
            .collect::<Result<_, _>>()?;

        Ok(Self { agency, bets, last })
    }

    /// Renders the batch back into its canonical wire payload,
    /// trailing separator included.
    pub fn encode(&self) -> String {
        let mut payload = self.agency.to_string();
        for bet in &self.bets {
            payload.push(';');
            payload.push_str(&bet.to_record());
        }
        payload.push(';');

        payload
    }
}

impl Bet {
    fn from_record(agency: u16, record: &[&str]) -> Result<Self, DeserializeError> {
        Ok(Self {
            agency,
            document: record[0].to_owned(),
            first_name: record[1].to_owned(),
            last_name: record[2].to_owned(),
            birthdate: NaiveDate::parse_from_str(record[3], BIRTHDATE_FORMAT)
                .map_err(|_| DeserializeError::Date(record[3].to_owned()))?,
            number: parse_number(record[4])?,
        })
    }

    fn to_record(&self) -> String {
        format!(
            "{};{};{};{};{}",
            self.document,
            self.first_name,
            self.last_name,
            self.birthdate.format(BIRTHDATE_FORMAT),
            self.number,
        )
    }
}

fn parse_number<T: std::str::FromStr>(field: &str) -> Result<T, DeserializeError> {
    field
        .parse()
        .map_err(|_| DeserializeError::Number(field.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bet(agency: u16, document: &str, number: u32) -> Bet {
        Bet {
            agency,
            document: document.into(),
            first_name: "Ana".into(),
            last_name: "Gomez".into(),
            birthdate: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            number,
        }
    }

    #[test]
    fn parse_single_bet_payload() {
        let batch = Batch::parse("3;30111222;Ana;Gomez;1990-01-01;7654;", true).unwrap();

        assert_eq!(batch.agency, 3);
        assert_eq!(batch.bets, vec![bet(3, "30111222", 7654)]);
        assert!(batch.last);
    }

    #[test]
    fn parse_multi_bet_payload() {
        let payload = "1;11111111;Ana;Gomez;1990-01-01;7654;22222222;Ana;Gomez;1990-01-01;100;";
        let batch = Batch::parse(payload, false).unwrap();

        assert_eq!(batch.agency, 1);
        assert_eq!(
            batch.bets,
            vec![bet(1, "11111111", 7654), bet(1, "22222222", 100)]
        );
        assert!(!batch.last);
    }

    #[test]
    fn decode_then_encode_roundtrips() {
        let payloads = [
            "3;30111222;Ana;Gomez;1990-01-01;7654;",
            "1;11111111;Ana;Gomez;1990-01-01;7654;22222222;Ana;Gomez;1990-01-01;100;",
            "5;",
        ];

        for payload in payloads {
            let batch = Batch::parse(payload, true).unwrap();
            assert_eq!(batch.encode(), payload);
        }
    }

    #[test]
    fn reject_incomplete_record() {
        assert!(matches!(
            Batch::parse("3;bad", true),
            Err(DeserializeError::FieldCount(1))
        ));
    }

    #[test]
    fn reject_bad_numbers_and_dates() {
        assert!(matches!(
            Batch::parse("nope;30111222;Ana;Gomez;1990-01-01;7654;", true),
            Err(DeserializeError::Number(_))
        ));
        assert!(matches!(
            Batch::parse("3;30111222;Ana;Gomez;1990-01-01;seven;", true),
            Err(DeserializeError::Number(_))
        ));
        assert!(matches!(
            Batch::parse("3;30111222;Ana;Gomez;someday;7654;", true),
            Err(DeserializeError::Date(_))
        ));
    }
}
