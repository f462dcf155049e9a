//! Snapshot lifecycle for the precomputed artifacts: assemble, validate,
//! share across workers, swap on refresh.

use std::sync::{Arc, RwLock};

use chrono::{NaiveDateTime, Utc};
use rayon::prelude::*;

use crate::error::ArtifactError;
use crate::matrix::{RatingPivot, SimilarityMatrix};

/// Per-worker handles and model parameters, cloned into every actix worker.
pub struct SharedHandlesAndConfig {
    pub snapshot: Arc<SnapshotHandle>,
    pub neighborhood_size_k: usize,
    pub qty_similar_items: usize,
    pub num_items_to_recommend: usize,
    pub qty_workers: usize,
}

pub struct ArtifactStats {
    pub descriptive_name: String,
    pub qty_items: usize,
    pub qty_users: usize,
    pub qty_rated_cells: usize,
    pub rating_density: f64,
    pub loaded_at_date_time: NaiveDateTime,
}

/// One consistent, immutable view of the three artifacts. Queries only ever
/// see a fully assembled snapshot.
pub struct RecommendationSnapshot {
    pub item_similarity: SimilarityMatrix,
    pub user_similarity: SimilarityMatrix,
    pub ratings: RatingPivot,
    pub stats: ArtifactStats,
}

impl RecommendationSnapshot {
    /// Bundles the artifacts after checking cross-artifact key coverage.
    /// Divergent key sets would otherwise surface as failed neighbor lookups
    /// in the middle of a request; we reject them once, at load time.
    pub fn assemble(
        descriptive_name: &str,
        item_similarity: SimilarityMatrix,
        user_similarity: SimilarityMatrix,
        ratings: RatingPivot,
    ) -> Result<Self, ArtifactError> {
        if let Some(user) = ratings
            .user_keys()
            .par_iter()
            .find_first(|user| !user_similarity.contains(user.as_str()))
        {
            return Err(ArtifactError::UserNotCovered { user: user.clone() });
        }
        if let Some(item) = ratings
            .item_keys()
            .par_iter()
            .find_first(|item| !item_similarity.contains(item.as_str()))
        {
            return Err(ArtifactError::ItemNotCovered { item: item.clone() });
        }

        let qty_rated_cells = ratings.qty_rated();
        let qty_cells = ratings.qty_items() * ratings.qty_users();
        let rating_density = if qty_cells == 0 {
            0.0
        } else {
            qty_rated_cells as f64 / qty_cells as f64
        };

        let stats = ArtifactStats {
            descriptive_name: descriptive_name.to_string(),
            qty_items: item_similarity.len(),
            qty_users: user_similarity.len(),
            qty_rated_cells,
            rating_density,
            loaded_at_date_time: Utc::now().naive_utc(),
        };

        Ok(RecommendationSnapshot {
            item_similarity,
            user_similarity,
            ratings,
            stats,
        })
    }
}

/// Shared handle to the current snapshot. Readers `load` an `Arc` clone and
/// keep a consistent view for the whole request; `swap` installs a freshly
/// assembled snapshot during a refresh and hands back the previous one.
/// In-flight requests holding the old `Arc` finish against the old snapshot.
pub struct SnapshotHandle {
    current: RwLock<Arc<RecommendationSnapshot>>,
}

impl SnapshotHandle {
    pub fn new(snapshot: RecommendationSnapshot) -> Self {
        SnapshotHandle {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    pub fn load(&self) -> Arc<RecommendationSnapshot> {
        self.current.read().unwrap().clone()
    }

    pub fn swap(&self, next: RecommendationSnapshot) -> Arc<RecommendationSnapshot> {
        let mut guard = self.current.write().unwrap();
        std::mem::replace(&mut *guard, Arc::new(next))
    }
}
