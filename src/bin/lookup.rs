use anyhow::{bail, Context, Result};

use ludorec::artifacts::RecommendationSnapshot;
use ludorec::config::{
    DEFAULT_NEIGHBORHOOD_SIZE_K, DEFAULT_NUM_ITEMS_TO_RECOMMEND, DEFAULT_QTY_SIMILAR_ITEMS,
};
use ludorec::io::{read_rating_pivot, read_similarity_matrix};
use ludorec::recommend::{CollaborativeRecommender, ItemSimilarityIndex, UserRecommendation};

fn main() -> Result<()> {
    // This tool answers a single query against freshly built artifacts
    // without starting the server, for ad-hoc verification.
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() != 5 {
        bail!("usage: lookup <item_sim.csv> <user_sim.csv> <ratings.csv> item|user <key>");
    }

    let item_similarity = read_similarity_matrix(&args[0])?;
    let user_similarity = read_similarity_matrix(&args[1])?;
    let ratings = read_rating_pivot(&args[2])?;
    let snapshot =
        RecommendationSnapshot::assemble("cli artifacts", item_similarity, user_similarity, ratings)?;

    match args[3].as_str() {
        "item" => {
            let index = ItemSimilarityIndex::new(&snapshot.item_similarity);
            let items = index
                .similar_items(&args[4], DEFAULT_QTY_SIMILAR_ITEMS)
                .context("similar items query failed")?;
            for (position, item) in items.iter().enumerate() {
                println!("{}: {}", position + 1, item);
            }
        }
        "user" => {
            let recommender =
                CollaborativeRecommender::new(&snapshot.user_similarity, &snapshot.ratings);
            let result = recommender.recommend_for_user(
                &args[4],
                DEFAULT_NEIGHBORHOOD_SIZE_K,
                DEFAULT_NUM_ITEMS_TO_RECOMMEND,
            )?;
            match result {
                UserRecommendation::Ranked(items) => {
                    for (position, item) in items.iter().enumerate() {
                        println!("{}: {}", position + 1, item);
                    }
                }
                UserRecommendation::NoData { user } => {
                    println!("No data available on user {}", user);
                }
            }
        }
        other => bail!("unknown query kind `{}`, expected `item` or `user`", other),
    }

    Ok(())
}
