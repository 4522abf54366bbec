use crate::domain::command::Command;
use crate::error::{LedgerError, Result};
use std::io::Read;

/// Streams `type,account,amount,address` rows out of a command script.
///
/// Cells are trimmed, and `open`/`convert` rows may leave out the columns they
/// do not use. A row that fails to parse yields an error without ending the
/// stream.
pub struct CommandReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CommandReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// One item per data row, header excluded.
    pub fn commands(self) -> impl Iterator<Item = Result<Command>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(LedgerError::from))
    }
}
