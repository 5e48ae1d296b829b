use serde::{Deserialize, Serialize};

use crate::draws::{Draw, DrawRules};
use crate::error::LottoError;

pub mod csv_store;
pub mod redis_store;

/// Contract shared by both storage backends. `load_all` returns draws in
/// append order, oldest first; switching backends must not change caller
/// behavior.
pub trait DrawStore {
    fn append(&mut self, draw: &Draw) -> Result<(), LottoError>;
    fn load_all(&mut self) -> Result<Vec<Draw>, LottoError>;
}

/// The document form of a draw as the Redis backend stores it. Field names
/// match the upstream API so stored documents read the same as the source
/// records.
#[derive(Debug, Serialize, Deserialize)]
pub struct DrawDocument {
    concurso: u32,
    data: String,
    dezenas: Vec<u8>,
}

impl DrawDocument {
    pub fn from_draw(draw: &Draw) -> DrawDocument {
        DrawDocument {
            concurso: draw.id(),
            data: draw.date().to_string(),
            dezenas: draw.numbers().to_vec(),
        }
    }

    /// Decode back into a validated draw. A document that no longer
    /// satisfies the rules is a storage error, never silently dropped.
    pub fn into_draw(self, rules: &DrawRules) -> Result<Draw, LottoError> {
        Draw::validated(self.concurso, self.data, self.dezenas, rules).map_err(|e| {
            LottoError::Storage {
                reason: format!("malformed stored record: {}", e),
            }
        })
    }
}
