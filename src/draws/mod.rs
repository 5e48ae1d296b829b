use serde::{Deserialize, Serialize};

use crate::error::LottoError;

/// Rules of the lottery being modelled: the inclusive number range and how
/// many numbers one draw contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawRules {
    pub min_number: u8,
    pub max_number: u8,
    pub numbers_per_draw: usize,
}

impl DrawRules {
    /// Lotofácil: 15 numbers out of 1..=25.
    pub fn lotofacil() -> DrawRules {
        DrawRules {
            min_number: 1,
            max_number: 25,
            numbers_per_draw: 15,
        }
    }

    /// Number of distinct values a draw can contain.
    pub fn pool_size(&self) -> usize {
        (self.max_number - self.min_number) as usize + 1
    }

    pub fn contains(&self, number: u8) -> bool {
        (self.min_number..=self.max_number).contains(&number)
    }

    fn check_numbers(&self, id: u32, numbers: &[u8]) -> Result<(), LottoError> {
        if numbers.len() != self.numbers_per_draw {
            return Err(LottoError::InvalidDraw {
                id,
                reason: format!(
                    "expected {} numbers, got {}",
                    self.numbers_per_draw,
                    numbers.len()
                ),
            });
        }

        for &n in numbers {
            if !self.contains(n) {
                return Err(LottoError::InvalidDraw {
                    id,
                    reason: format!("{} outside {}..={}", n, self.min_number, self.max_number),
                });
            }
        }

        // Sorted input, so duplicates are adjacent
        for pair in numbers.windows(2) {
            if pair[0] == pair[1] {
                return Err(LottoError::InvalidDraw {
                    id,
                    reason: format!("duplicate number {}", pair[0]),
                });
            }
        }

        Ok(())
    }
}

/// One historical lottery result. Validated on construction and immutable
/// afterwards: stores only append draws, never rewrite them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draw {
    id: u32,
    date: String,
    numbers: Vec<u8>,
}

impl Draw {
    /// Build a draw, enforcing the rules' count/range/uniqueness invariant.
    /// Numbers are kept sorted ascending.
    pub fn validated(
        id: u32,
        date: String,
        mut numbers: Vec<u8>,
        rules: &DrawRules,
    ) -> Result<Draw, LottoError> {
        numbers.sort_unstable();
        rules.check_numbers(id, &numbers)?;

        Ok(Draw { id, date, numbers })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn numbers(&self) -> &[u8] {
        &self.numbers
    }
}

/// A candidate combination for a future draw. Same shape invariant as a
/// `Draw`; `previously_drawn` marks combinations that already appeared in
/// the historical data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prediction {
    pub numbers: Vec<u8>,
    pub previously_drawn: bool,
}

impl Prediction {
    pub fn new(mut numbers: Vec<u8>, history: &[Draw]) -> Prediction {
        numbers.sort_unstable();
        let previously_drawn = history.iter().any(|d| d.numbers() == numbers.as_slice());

        Prediction {
            numbers,
            previously_drawn,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> DrawRules {
        DrawRules {
            min_number: 1,
            max_number: 10,
            numbers_per_draw: 3,
        }
    }

    #[test]
    fn test_valid_draw_is_sorted() {
        let draw = Draw::validated(1, "01/01/2025".to_string(), vec![7, 2, 5], &rules()).unwrap();
        assert_eq!(draw.numbers(), &[2, 5, 7]);
    }

    #[test]
    fn test_wrong_count_rejected() {
        let err = Draw::validated(2, "01/01/2025".to_string(), vec![1, 2], &rules()).unwrap_err();
        assert!(matches!(err, LottoError::InvalidDraw { id: 2, .. }));
    }

    #[test]
    fn test_out_of_range_rejected() {
        let err =
            Draw::validated(3, "01/01/2025".to_string(), vec![1, 2, 11], &rules()).unwrap_err();
        assert!(err.to_string().contains("11"));
    }

    #[test]
    fn test_duplicate_rejected() {
        let err =
            Draw::validated(4, "01/01/2025".to_string(), vec![5, 5, 6], &rules()).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_prediction_marks_previous_occurrence() {
        let history =
            vec![Draw::validated(1, "01/01/2025".to_string(), vec![1, 2, 3], &rules()).unwrap()];

        assert!(Prediction::new(vec![3, 1, 2], &history).previously_drawn);
        assert!(!Prediction::new(vec![1, 2, 4], &history).previously_drawn);
    }
}
