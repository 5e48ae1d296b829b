use redis::Commands;
use tracing::debug;

use super::{DrawDocument, DrawStore};
use crate::draws::{Draw, DrawRules};
use crate::error::LottoError;

/// Document backend: one JSON document per draw, held in a Redis list so
/// `load_all` preserves append order.
pub struct RedisStore {
    connection: redis::Connection,
    key: String,
    rules: DrawRules,
}

impl RedisStore {
    pub fn connect(url: &str, key: String, rules: DrawRules) -> Result<RedisStore, LottoError> {
        let client = redis::Client::open(url)?;
        let connection = client.get_connection()?;

        Ok(RedisStore {
            connection,
            key,
            rules,
        })
    }
}

impl DrawStore for RedisStore {
    fn append(&mut self, draw: &Draw) -> Result<(), LottoError> {
        let document =
            serde_json::to_string(&DrawDocument::from_draw(draw)).map_err(|e| {
                LottoError::Storage {
                    reason: e.to_string(),
                }
            })?;

        let _: () = self.connection.rpush(&self.key, document)?;
        debug!(id = draw.id(), key = %self.key, "appended draw");

        Ok(())
    }

    fn load_all(&mut self) -> Result<Vec<Draw>, LottoError> {
        let documents: Vec<String> = self.connection.lrange(&self.key, 0, -1)?;

        let mut draws = Vec::with_capacity(documents.len());
        for document in documents {
            let doc: DrawDocument =
                serde_json::from_str(&document).map_err(|e| LottoError::Storage {
                    reason: format!("undecodable stored document: {}", e),
                })?;
            draws.push(doc.into_draw(&self.rules)?);
        }

        Ok(draws)
    }
}
