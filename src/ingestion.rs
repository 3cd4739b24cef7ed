use std::io::Read;
use std::pin::Pin;

use futures::stream::{self, Stream};
use serde::Deserialize;

use crate::domain::traits::CommandStream;
use crate::domain::{Command, CommandKind, Error, Points, UserId};

pub struct CsvReader<R: Read> {
    reader: Option<csv::Reader<R>>,
}

impl<R: Read> CsvReader<R> {
    pub fn new(reader: R) -> Self {
        let rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        Self { reader: Some(rdr) }
    }
}

/// Internal shape used only for CSV deserialization.
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "type")]
    kind: String,
    user: UserId,
    #[serde(default)]
    amount: Option<Points>,
}

impl TryFrom<CsvRow> for Command {
    type Error = Error;

    fn try_from(row: CsvRow) -> Result<Self, Self::Error> {
        let kind = match (row.kind.trim().to_ascii_lowercase().as_str(), row.amount) {
            ("charge", Some(amount)) => CommandKind::Charge { amount },
            ("use", Some(amount)) => CommandKind::Use { amount },
            ("balance", None) => CommandKind::Balance,
            ("history", None) => CommandKind::History,
            (other @ ("charge" | "use"), None) => {
                return Err(Error::Ingestion(format!(
                    "Missing amount for {} of user {}",
                    other, row.user
                )));
            }
            (other @ ("balance" | "history"), Some(amount)) => {
                return Err(Error::Ingestion(format!(
                    "Unexpected amount {} for {} of user {}",
                    amount, other, row.user
                )));
            }
            (other, _) => {
                return Err(Error::Ingestion(format!("Invalid command type: {}", other)));
            }
        };

        Ok(Command {
            kind,
            user_id: row.user,
        })
    }
}

impl<R: Read + Send + 'static> CommandStream for CsvReader<R> {
    type CmdStream = Pin<Box<dyn Stream<Item = Result<Command, Error>> + Send>>;

    fn stream(&mut self) -> Self::CmdStream {
        let reader = match self.reader.take() {
            Some(r) => r,
            None => {
                // Already consumed; return an empty stream.
                return Box::pin(stream::iter(Vec::<Result<Command, Error>>::new()));
            }
        };

        let iter = reader
            .into_deserialize::<CsvRow>()
            .map(|row_res| match row_res {
                Ok(row) => Command::try_from(row),
                Err(e) => Err(Error::Ingestion(format!("CSV deserialization error: {}", e))),
            });

        Box::pin(stream::iter(iter))
    }
}
