use std::collections::BTreeMap;

use actix_web::{get, web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::artifacts::SharedHandlesAndConfig;
use crate::recommend::{CollaborativeRecommender, ItemSimilarityIndex, UserRecommendation};

#[derive(Debug, Deserialize)]
pub struct SimilarItemsQuery {
    game: String,
}

#[derive(Debug, Deserialize)]
pub struct RecommendUserQuery {
    user: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Ranked items keyed by 1-based position, `{"1": ..., "2": ...}`.
fn ranked_by_position(items: &[String]) -> BTreeMap<usize, &str> {
    items
        .iter()
        .enumerate()
        .map(|(position, item)| (position + 1, item.as_str()))
        .collect()
}

// Item-to-item endpoint: games similar to the given game, straight from the
// item similarity matrix. An unknown game is a caller mistake and is reported
// as a structured 404, never as an unhandled failure.
#[get("/v1/similar_items")]
pub async fn v1_similar_items(
    data: web::Data<SharedHandlesAndConfig>,
    query: web::Query<SimilarItemsQuery>,
) -> HttpResponse {
    let snapshot = data.snapshot.load();
    let index = ItemSimilarityIndex::new(&snapshot.item_similarity);

    match index.similar_items(&query.game, data.qty_similar_items) {
        Ok(items) => HttpResponse::Ok().json(ranked_by_position(&items)),
        Err(error) => HttpResponse::NotFound().json(ErrorResponse {
            error: error.to_string(),
        }),
    }
}

// Personalized endpoint: items preferred by the user's nearest neighbors.
// A user without pivot data gets the informational no-data answer with a 200,
// an unknown-user query is expected traffic here.
#[get("/v1/recommend_user")]
pub async fn v1_recommend_user(
    data: web::Data<SharedHandlesAndConfig>,
    query: web::Query<RecommendUserQuery>,
) -> HttpResponse {
    let snapshot = data.snapshot.load();
    let recommender =
        CollaborativeRecommender::new(&snapshot.user_similarity, &snapshot.ratings);

    match recommender.recommend_for_user(
        &query.user,
        data.neighborhood_size_k,
        data.num_items_to_recommend,
    ) {
        Ok(UserRecommendation::Ranked(items)) => {
            HttpResponse::Ok().json(ranked_by_position(&items))
        }
        Ok(UserRecommendation::NoData { user }) => {
            HttpResponse::Ok().json(format!("No data available on user {}", user))
        }
        // Key coverage is validated when the snapshot is assembled, so an
        // unknown neighbor here means a corrupt snapshot.
        Err(error) => HttpResponse::InternalServerError().json(ErrorResponse {
            error: error.to_string(),
        }),
    }
}
