use std::fs::OpenOptions;
use std::path::PathBuf;

use tracing::debug;

use super::DrawStore;
use crate::draws::{Draw, DrawRules};
use crate::error::LottoError;

/// Flat-file backend: one CSV row per draw, columns = id, date, then one
/// column per drawn number. A missing file reads as an empty store.
pub struct CsvStore {
    path: PathBuf,
    rules: DrawRules,
}

impl CsvStore {
    pub fn new(path: PathBuf, rules: DrawRules) -> CsvStore {
        CsvStore { path, rules }
    }

    fn decode_row(&self, row: &csv::StringRecord) -> Result<Draw, LottoError> {
        let expected = 2 + self.rules.numbers_per_draw;
        if row.len() != expected {
            return Err(LottoError::Storage {
                reason: format!("row has {} fields, expected {}", row.len(), expected),
            });
        }

        let id = row[0].parse::<u32>().map_err(|_| LottoError::Storage {
            reason: format!("non-numeric draw id {:?}", &row[0]),
        })?;
        let date = row[1].to_string();

        let mut numbers = Vec::with_capacity(self.rules.numbers_per_draw);
        for field in row.iter().skip(2) {
            let n = field.parse::<u8>().map_err(|_| LottoError::Storage {
                reason: format!("non-numeric draw number {:?}", field),
            })?;
            numbers.push(n);
        }

        Draw::validated(id, date, numbers, &self.rules).map_err(|e| LottoError::Storage {
            reason: format!("malformed stored record: {}", e),
        })
    }
}

impl DrawStore for CsvStore {
    fn append(&mut self, draw: &Draw) -> Result<(), LottoError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        let mut row = vec![draw.id().to_string(), draw.date().to_string()];
        row.extend(draw.numbers().iter().map(|n| n.to_string()));
        writer.write_record(&row)?;
        writer.flush()?;

        debug!(id = draw.id(), path = %self.path.display(), "appended draw");

        Ok(())
    }

    fn load_all(&mut self) -> Result<Vec<Draw>, LottoError> {
        if !self.path.exists() {
            return Ok(vec![]);
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&self.path)?;

        let mut draws = vec![];
        for row in reader.records() {
            draws.push(self.decode_row(&row?)?);
        }

        Ok(draws)
    }
}
