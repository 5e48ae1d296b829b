use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};

use crate::draws::{Draw, DrawRules};
use crate::error::LottoError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// One record as the results API serves it. The numbers arrive as string
/// numerals ("01".."25").
#[derive(Debug, Deserialize)]
struct ApiDraw {
    concurso: u32,
    data: String,
    dezenas: Vec<String>,
}

/// Result of one fetch: the draws that passed validation, and how many
/// records were dropped on the way.
#[derive(Debug)]
pub struct FetchOutcome {
    pub draws: Vec<Draw>,
    pub skipped: usize,
}

/// Issue one GET against the results endpoint and decode the full history.
///
/// The payload must be a JSON array of draw records; anything else is a
/// `Parse` error. Records that decode but violate the draw rules are
/// dropped and counted, not fatal to the batch.
pub fn fetch_latest(endpoint: &str, rules: &DrawRules) -> Result<FetchOutcome, LottoError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()?;

    let body = client
        .get(endpoint)
        .send()?
        .error_for_status()?
        .text()?;

    let records: Vec<ApiDraw> = serde_json::from_str(&body).map_err(|e| LottoError::Parse {
        reason: e.to_string(),
    })?;

    let outcome = validate_records(records, rules);
    info!(
        draws = outcome.draws.len(),
        skipped = outcome.skipped,
        "fetched draw history"
    );

    Ok(outcome)
}

fn validate_records(records: Vec<ApiDraw>, rules: &DrawRules) -> FetchOutcome {
    let mut draws = Vec::with_capacity(records.len());
    let mut skipped = 0;

    for record in records {
        match decode_record(record, rules) {
            Ok(draw) => draws.push(draw),
            Err(e) => {
                warn!("skipping draw record: {}", e);
                skipped += 1;
            }
        }
    }

    FetchOutcome { draws, skipped }
}

fn decode_record(record: ApiDraw, rules: &DrawRules) -> Result<Draw, LottoError> {
    let mut numbers = Vec::with_capacity(record.dezenas.len());

    for dezena in &record.dezenas {
        let n = dezena.parse::<u8>().map_err(|_| LottoError::InvalidDraw {
            id: record.concurso,
            reason: format!("non-numeric dezena {:?}", dezena),
        })?;
        numbers.push(n);
    }

    Draw::validated(record.concurso, record.data, numbers, rules)
}
