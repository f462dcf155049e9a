//! Read-only artifact data structures: the pairwise similarity matrices and
//! the normalized rating pivot. Both are built once from offline artifacts
//! and never mutated while serving.

use float_cmp::approx_eq;
use hashbrown::HashMap;
use rayon::prelude::*;

use crate::error::ArtifactError;

/// Entity identifiers are opaque strings. Numeric-looking identifiers are
/// compared as strings, never parsed.
pub type EntityKey = String;

/// Square, symmetric similarity matrix keyed by entity identifier on both
/// axes. Construction validates shape, key uniqueness, symmetry and diagonal
/// maximality so that queries never have to.
pub struct SimilarityMatrix {
    keys: Vec<EntityKey>,
    positions: HashMap<EntityKey, usize>,
    scores: Vec<f64>,
}

impl SimilarityMatrix {
    /// `scores` is row-major with `keys.len() * keys.len()` entries, rows and
    /// columns both in `keys` order.
    pub fn new(keys: Vec<EntityKey>, scores: Vec<f64>) -> Result<Self, ArtifactError> {
        let qty_keys = keys.len();
        if scores.len() != qty_keys * qty_keys {
            return Err(ArtifactError::NotSquare {
                qty_keys,
                qty_scores: scores.len(),
            });
        }

        let mut positions = HashMap::with_capacity(qty_keys);
        for (position, key) in keys.iter().enumerate() {
            if positions.insert(key.clone(), position).is_some() {
                return Err(ArtifactError::DuplicateKey { key: key.clone() });
            }
        }

        let matrix = SimilarityMatrix {
            keys,
            positions,
            scores,
        };
        matrix.validate()?;
        Ok(matrix)
    }

    fn validate(&self) -> Result<(), ArtifactError> {
        let qty_keys = self.keys.len();
        (0..qty_keys).into_par_iter().try_for_each(|row| {
            for col in (row + 1)..qty_keys {
                let upper = self.scores[row * qty_keys + col];
                let lower = self.scores[col * qty_keys + row];
                if !approx_eq!(f64, upper, lower, ulps = 4) {
                    return Err(ArtifactError::Asymmetric {
                        a: self.keys[row].clone(),
                        b: self.keys[col].clone(),
                    });
                }
            }
            let self_similarity = self.scores[row * qty_keys + row];
            let row_scores = &self.scores[row * qty_keys..(row + 1) * qty_keys];
            if row_scores.iter().any(|score| *score > self_similarity) {
                return Err(ArtifactError::DiagonalNotMaximal {
                    key: self.keys[row].clone(),
                });
            }
            Ok(())
        })
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Keys in artifact order. This order is the documented tie-break order
    /// for equal similarity scores.
    pub fn keys(&self) -> &[EntityKey] {
        &self.keys
    }

    pub fn contains(&self, key: &str) -> bool {
        self.positions.contains_key(key)
    }

    pub fn score(&self, a: &str, b: &str) -> Option<f64> {
        let row = *self.positions.get(a)?;
        let col = *self.positions.get(b)?;
        Some(self.scores[row * self.keys.len() + col])
    }

    /// Similarities of every entity against `key`, in `keys()` order.
    /// The matrix is symmetric, so the row slice serves as the column.
    pub fn column(&self, key: &str) -> Option<&[f64]> {
        let row = *self.positions.get(key)?;
        let qty_keys = self.keys.len();
        Some(&self.scores[row * qty_keys..(row + 1) * qty_keys])
    }
}

/// Normalized preference scores, item rows x user columns. `None` marks a
/// user that never interacted with an item.
pub struct RatingPivot {
    item_keys: Vec<EntityKey>,
    user_keys: Vec<EntityKey>,
    user_positions: HashMap<EntityKey, usize>,
    item_positions: HashMap<EntityKey, usize>,
    scores: Vec<Option<f64>>,
}

impl RatingPivot {
    /// `scores` is row-major with one row per item key, columns in
    /// `user_keys` order.
    pub fn new(
        item_keys: Vec<EntityKey>,
        user_keys: Vec<EntityKey>,
        scores: Vec<Option<f64>>,
    ) -> Result<Self, ArtifactError> {
        if scores.len() != item_keys.len() * user_keys.len() {
            return Err(ArtifactError::ShapeMismatch {
                qty_items: item_keys.len(),
                qty_users: user_keys.len(),
                qty_scores: scores.len(),
            });
        }

        let mut item_positions = HashMap::with_capacity(item_keys.len());
        for (position, key) in item_keys.iter().enumerate() {
            if item_positions.insert(key.clone(), position).is_some() {
                return Err(ArtifactError::DuplicateKey { key: key.clone() });
            }
        }
        let mut user_positions = HashMap::with_capacity(user_keys.len());
        for (position, key) in user_keys.iter().enumerate() {
            if user_positions.insert(key.clone(), position).is_some() {
                return Err(ArtifactError::DuplicateKey { key: key.clone() });
            }
        }

        Ok(RatingPivot {
            item_keys,
            user_keys,
            user_positions,
            item_positions,
            scores,
        })
    }

    pub fn qty_items(&self) -> usize {
        self.item_keys.len()
    }

    pub fn qty_users(&self) -> usize {
        self.user_keys.len()
    }

    pub fn item_keys(&self) -> &[EntityKey] {
        &self.item_keys
    }

    pub fn user_keys(&self) -> &[EntityKey] {
        &self.user_keys
    }

    pub fn contains_user(&self, user: &str) -> bool {
        self.user_positions.contains_key(user)
    }

    pub fn score(&self, item: &str, user: &str) -> Option<f64> {
        let row = *self.item_positions.get(item)?;
        let col = *self.user_positions.get(user)?;
        self.scores[row * self.user_keys.len() + col]
    }

    /// Number of cells holding an actual preference score.
    pub fn qty_rated(&self) -> usize {
        self.scores.par_iter().filter(|score| score.is_some()).count()
    }

    /// All items tied at `user`'s maximum preference score, in item row
    /// order. `None` when the user is not a pivot column, an empty vec when
    /// the user rated nothing.
    pub fn top_rated_items(&self, user: &str) -> Option<Vec<&str>> {
        let col = *self.user_positions.get(user)?;
        let width = self.user_keys.len();

        let mut max_score: Option<f64> = None;
        for row in 0..self.item_keys.len() {
            if let Some(score) = self.scores[row * width + col] {
                if max_score.map_or(true, |current| score > current) {
                    max_score = Some(score);
                }
            }
        }

        let max_score = match max_score {
            Some(score) => score,
            None => return Some(Vec::new()),
        };

        let best_items = self
            .item_keys
            .iter()
            .enumerate()
            .filter(|(row, _)| self.scores[row * width + col] == Some(max_score))
            .map(|(_, key)| key.as_str())
            .collect();
        Some(best_items)
    }
}


#[cfg(test)]
mod rating_pivot_test {
    use super::*;
    use crate::error::ArtifactError;

    fn keys(raw: &[&str]) -> Vec<EntityKey> {
        raw.iter().map(|key| key.to_string()).collect()
    }

    fn pivot() -> RatingPivot {
        // rows: x, y, z / columns: u1, u2, u3
        RatingPivot::new(
            keys(&["x", "y", "z"]),
            keys(&["u1", "u2", "u3"]),
            vec![
                Some(0.9),
                Some(0.7),
                None,
                Some(0.9),
                Some(0.1),
                None,
                Some(0.3),
                None,
                None,
            ],
        )
        .unwrap()
    }

    #[test]
    fn should_reject_shape_mismatch() {
        let result = RatingPivot::new(keys(&["x"]), keys(&["u1", "u2"]), vec![Some(1.0)]);
        assert!(matches!(result, Err(ArtifactError::ShapeMismatch { .. })));
    }

    #[test]
    fn should_return_all_items_tied_at_the_maximum() {
        // u1 rates x and y both at 0.9
        assert_eq!(Some(vec!["x", "y"]), pivot().top_rated_items("u1"));
    }

    #[test]
    fn should_return_the_single_best_item() {
        assert_eq!(Some(vec!["x"]), pivot().top_rated_items("u2"));
    }

    #[test]
    fn should_return_empty_for_a_user_without_ratings() {
        assert_eq!(Some(Vec::new()), pivot().top_rated_items("u3"));
    }

    #[test]
    fn should_return_none_for_an_unknown_user() {
        assert_eq!(None, pivot().top_rated_items("u4"));
        assert!(!pivot().contains_user("u4"));
    }

    #[test]
    fn should_count_rated_cells() {
        assert_eq!(5, pivot().qty_rated());
    }

    #[test]
    fn should_look_up_single_scores() {
        assert_eq!(Some(0.3), pivot().score("z", "u1"));
        assert_eq!(None, pivot().score("z", "u2"));
    }
}
