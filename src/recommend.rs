//! Neighborhood selection and vote aggregation over the precomputed
//! artifacts. Everything here is a pure read of an immutable snapshot, so
//! requests can be served concurrently without locking.

use std::cmp::Ordering;

use hashbrown::hash_map::Entry;
use hashbrown::HashMap;

use crate::error::RecommendError;
use crate::matrix::{EntityKey, RatingPivot, SimilarityMatrix};

/// Ranks every other key by similarity to `query_key`, most similar first,
/// truncated to `k`. The sort is stable: equal similarities keep the matrix
/// key order, which makes rankings reproducible across calls and processes.
fn ranked_against(matrix: &SimilarityMatrix, query_key: &str, k: usize) -> Option<Vec<EntityKey>> {
    let column = matrix.column(query_key)?;

    // The query key itself is excluded up front instead of relying on the
    // maximal self-similarity to sort it into the first position: another
    // entity tied with the self-similarity score must not evict it.
    let mut scored: Vec<(&EntityKey, f64)> = matrix
        .keys()
        .iter()
        .zip(column.iter().copied())
        .filter(|(key, _)| key.as_str() != query_key)
        .collect();

    scored.sort_by(|(_, left), (_, right)| right.partial_cmp(left).unwrap_or(Ordering::Equal));
    scored.truncate(k);
    Some(scored.into_iter().map(|(key, _)| key.clone()).collect())
}

/// Item-to-item queries against the item similarity matrix.
pub struct ItemSimilarityIndex<'a> {
    matrix: &'a SimilarityMatrix,
}

impl<'a> ItemSimilarityIndex<'a> {
    pub fn new(matrix: &'a SimilarityMatrix) -> Self {
        ItemSimilarityIndex { matrix }
    }

    /// Up to `k` items most similar to `item_key`, never including the item
    /// itself. Returns fewer than `k` when the matrix is smaller.
    pub fn similar_items(
        &self,
        item_key: &str,
        k: usize,
    ) -> Result<Vec<EntityKey>, RecommendError> {
        ranked_against(self.matrix, item_key, k)
            .ok_or_else(|| RecommendError::UnknownItem(item_key.to_string()))
    }
}

/// User-to-user queries against the user similarity matrix.
pub struct UserNeighborhood<'a> {
    matrix: &'a SimilarityMatrix,
}

impl<'a> UserNeighborhood<'a> {
    pub fn new(matrix: &'a SimilarityMatrix) -> Self {
        UserNeighborhood { matrix }
    }

    /// Up to `k` users most similar to `user_key`, excluding the user itself.
    pub fn top_neighbors(
        &self,
        user_key: &str,
        k: usize,
    ) -> Result<Vec<EntityKey>, RecommendError> {
        ranked_against(self.matrix, user_key, k)
            .ok_or_else(|| RecommendError::UnknownUser(user_key.to_string()))
    }
}

/// Outcome of a personalized recommendation query. A user without pivot data
/// is an expected condition and gets an informational result, not an error.
#[derive(Debug, PartialEq, Eq)]
pub enum UserRecommendation {
    Ranked(Vec<EntityKey>),
    NoData { user: EntityKey },
}

/// Personalized recommendations: ask the neighborhood for similar users,
/// collect each neighbor's best-rated items and rank items by vote count.
pub struct CollaborativeRecommender<'a> {
    neighborhood: UserNeighborhood<'a>,
    ratings: &'a RatingPivot,
}

impl<'a> CollaborativeRecommender<'a> {
    pub fn new(user_similarity: &'a SimilarityMatrix, ratings: &'a RatingPivot) -> Self {
        CollaborativeRecommender {
            neighborhood: UserNeighborhood::new(user_similarity),
            ratings,
        }
    }

    pub fn recommend_for_user(
        &self,
        user_key: &str,
        neighborhood_size: usize,
        top_n: usize,
    ) -> Result<UserRecommendation, RecommendError> {
        if !self.ratings.contains_user(user_key) {
            return Ok(UserRecommendation::NoData {
                user: user_key.to_string(),
            });
        }

        let neighbors = self.neighborhood.top_neighbors(user_key, neighborhood_size)?;

        // One vote per (neighbor, tied best item) pair. `candidates` records
        // the first-encountered order, neighbor rank first and row order
        // within a neighbor's tied set, so the stable sort below leaves tied
        // vote counts in exactly that order.
        let mut vote_counts: HashMap<&str, usize> = HashMap::with_capacity(neighbors.len());
        let mut candidates: Vec<&str> = Vec::with_capacity(neighbors.len());
        for neighbor in &neighbors {
            let best_items = match self.ratings.top_rated_items(neighbor) {
                Some(best_items) => best_items,
                // A neighbor known to the similarity matrix but absent from
                // the pivot casts no votes.
                None => continue,
            };
            for item in best_items {
                match vote_counts.entry(item) {
                    Entry::Occupied(mut entry) => *entry.get_mut() += 1,
                    Entry::Vacant(entry) => {
                        entry.insert(1);
                        candidates.push(item);
                    }
                }
            }
        }

        let mut ranked: Vec<(&str, usize)> = candidates
            .into_iter()
            .map(|item| (item, vote_counts[item]))
            .collect();
        ranked.sort_by(|(_, left), (_, right)| right.cmp(left));
        ranked.truncate(top_n);

        Ok(UserRecommendation::Ranked(
            ranked.into_iter().map(|(item, _)| item.to_string()).collect(),
        ))
    }
}


#[cfg(test)]
mod user_neighborhood_test {
    use super::*;

    fn user_matrix() -> SimilarityMatrix {
        let keys = ["u", "n1", "n2", "n3"]
            .iter()
            .map(|key| key.to_string())
            .collect();
        SimilarityMatrix::new(
            keys,
            vec![
                1.0, 0.9, 0.8, 0.1, //
                0.9, 1.0, 0.5, 0.2, //
                0.8, 0.5, 1.0, 0.3, //
                0.1, 0.2, 0.3, 1.0, //
            ],
        )
        .unwrap()
    }

    #[test]
    fn should_rank_the_most_similar_user_first() {
        let matrix = user_matrix();
        let neighborhood = UserNeighborhood::new(&matrix);
        let neighbors = neighborhood.top_neighbors("u", 3).unwrap();
        assert_eq!(vec!["n1", "n2", "n3"], neighbors);
    }

    #[test]
    fn should_return_neighbors_in_non_increasing_similarity_order() {
        let matrix = user_matrix();
        let neighborhood = UserNeighborhood::new(&matrix);
        let neighbors = neighborhood.top_neighbors("n3", 3).unwrap();
        let similarities: Vec<f64> = neighbors
            .iter()
            .map(|neighbor| matrix.score("n3", neighbor).unwrap())
            .collect();
        for pair in similarities.windows(2) {
            assert!(pair[0] >= pair[1]);
        }
    }

    #[test]
    fn should_fail_on_an_unknown_user() {
        let matrix = user_matrix();
        let neighborhood = UserNeighborhood::new(&matrix);
        let result = neighborhood.top_neighbors("NoSuchUser999", 3);
        assert_eq!(
            Err(RecommendError::UnknownUser("NoSuchUser999".to_string())),
            result
        );
    }
}

#[cfg(test)]
mod collaborative_recommender_test {
    use super::*;

    fn keys(raw: &[&str]) -> Vec<EntityKey> {
        raw.iter().map(|key| key.to_string()).collect()
    }

    /// n1 is u's closest neighbor, n2 the second. n1's maximum rating is
    /// shared by x and y, n2's maximum is uniquely x.
    fn fixtures() -> (SimilarityMatrix, RatingPivot) {
        let user_similarity = SimilarityMatrix::new(
            keys(&["u", "n1", "n2"]),
            vec![
                1.0, 0.9, 0.8, //
                0.9, 1.0, 0.5, //
                0.8, 0.5, 1.0, //
            ],
        )
        .unwrap();

        // columns: u, n1, n2
        let ratings = RatingPivot::new(
            keys(&["x", "y", "z"]),
            keys(&["u", "n1", "n2"]),
            vec![
                Some(0.1),
                Some(0.9),
                Some(0.7), // x
                None,
                Some(0.9),
                Some(0.1), // y
                Some(0.2),
                Some(0.3),
                Some(0.2), // z
            ],
        )
        .unwrap();

        (user_similarity, ratings)
    }

    #[test]
    fn should_aggregate_votes_across_neighbors() {
        let (user_similarity, ratings) = fixtures();
        let recommender = CollaborativeRecommender::new(&user_similarity, &ratings);

        // x collects a vote from both neighbors, y only from n1
        let result = recommender.recommend_for_user("u", 2, 5).unwrap();
        assert_eq!(
            UserRecommendation::Ranked(vec!["x".to_string(), "y".to_string()]),
            result
        );
    }

    #[test]
    fn should_give_one_vote_to_each_item_tied_at_a_neighbors_maximum() {
        let (user_similarity, ratings) = fixtures();
        let recommender = CollaborativeRecommender::new(&user_similarity, &ratings);

        // With only n1 in the neighborhood, x and y tie at one vote each and
        // keep their pivot row order.
        let result = recommender.recommend_for_user("u", 1, 5).unwrap();
        assert_eq!(
            UserRecommendation::Ranked(vec!["x".to_string(), "y".to_string()]),
            result
        );
    }

    #[test]
    fn should_rank_higher_vote_counts_strictly_first() {
        let user_similarity = SimilarityMatrix::new(
            keys(&["u", "n1", "n2", "n3"]),
            vec![
                1.0, 0.9, 0.8, 0.7, //
                0.9, 1.0, 0.0, 0.0, //
                0.8, 0.0, 1.0, 0.0, //
                0.7, 0.0, 0.0, 1.0, //
            ],
        )
        .unwrap();
        // n1 and n2 both love y, n3 loves x
        let ratings = RatingPivot::new(
            keys(&["x", "y"]),
            keys(&["u", "n1", "n2", "n3"]),
            vec![
                Some(0.5),
                Some(0.1),
                Some(0.2),
                Some(0.9), // x
                Some(0.1),
                Some(0.8),
                Some(0.9),
                Some(0.3), // y
            ],
        )
        .unwrap();

        let recommender = CollaborativeRecommender::new(&user_similarity, &ratings);
        let result = recommender.recommend_for_user("u", 3, 5).unwrap();
        assert_eq!(
            UserRecommendation::Ranked(vec!["y".to_string(), "x".to_string()]),
            result
        );
    }

    #[test]
    fn should_break_vote_ties_by_first_encounter_order() {
        let (user_similarity, ratings) = fixtures();
        let recommender = CollaborativeRecommender::new(&user_similarity, &ratings);

        // Repeated calls must reproduce the same tie order.
        let first = recommender.recommend_for_user("u", 1, 5).unwrap();
        for _ in 0..10 {
            assert_eq!(first, recommender.recommend_for_user("u", 1, 5).unwrap());
        }
    }

    #[test]
    fn should_truncate_to_top_n() {
        let (user_similarity, ratings) = fixtures();
        let recommender = CollaborativeRecommender::new(&user_similarity, &ratings);
        let result = recommender.recommend_for_user("u", 2, 1).unwrap();
        assert_eq!(UserRecommendation::Ranked(vec!["x".to_string()]), result);
    }

    #[test]
    fn should_report_no_data_for_a_user_missing_from_the_pivot() {
        let (user_similarity, ratings) = fixtures();
        let recommender = CollaborativeRecommender::new(&user_similarity, &ratings);
        let result = recommender.recommend_for_user("NoSuchUser999", 2, 5).unwrap();
        assert_eq!(
            UserRecommendation::NoData {
                user: "NoSuchUser999".to_string()
            },
            result
        );
    }

    #[test]
    fn should_skip_neighbors_without_a_pivot_column() {
        // n2 exists in the similarity matrix but has no pivot column.
        let user_similarity = SimilarityMatrix::new(
            keys(&["u", "n1", "n2"]),
            vec![
                1.0, 0.9, 0.8, //
                0.9, 1.0, 0.5, //
                0.8, 0.5, 1.0, //
            ],
        )
        .unwrap();
        let ratings = RatingPivot::new(
            keys(&["x", "y"]),
            keys(&["u", "n1"]),
            vec![Some(0.1), Some(0.9), Some(0.2), Some(0.3)],
        )
        .unwrap();

        let recommender = CollaborativeRecommender::new(&user_similarity, &ratings);
        let result = recommender.recommend_for_user("u", 2, 5).unwrap();
        assert_eq!(UserRecommendation::Ranked(vec!["x".to_string()]), result);
    }

    #[test]
    fn should_return_an_empty_ranking_when_no_neighbor_rated_anything() {
        let user_similarity = SimilarityMatrix::new(
            keys(&["u", "n1"]),
            vec![1.0, 0.9, 0.9, 1.0],
        )
        .unwrap();
        let ratings = RatingPivot::new(
            keys(&["x"]),
            keys(&["u", "n1"]),
            vec![Some(0.5), None],
        )
        .unwrap();

        let recommender = CollaborativeRecommender::new(&user_similarity, &ratings);
        let result = recommender.recommend_for_user("u", 1, 5).unwrap();
        assert_eq!(UserRecommendation::Ranked(Vec::new()), result);
    }
}
