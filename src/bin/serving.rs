extern crate ludorec;

use actix_web::{
    http::ContentEncoding, middleware, web, App, HttpRequest, HttpResponse, HttpServer,
};
use actix_web_prom::PrometheusMetrics;

use actix_web::http::header;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use ludorec::artifacts::{RecommendationSnapshot, SharedHandlesAndConfig, SnapshotHandle};
use ludorec::config::AppConfig;
use ludorec::endpoints::index_resource::internal;
use ludorec::endpoints::recommend_resource::{v1_recommend_user, v1_similar_items};
use ludorec::io::{read_rating_pivot, read_similarity_matrix};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config_path = std::env::args().nth(1).unwrap_or_default();
    let config = AppConfig::new(config_path);

    let filter = if config.log.level.is_empty() {
        EnvFilter::new("info")
    } else {
        EnvFilter::new(&config.log.level)
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    let neighborhood_size_k = config.model.neighborhood_size_k;
    let qty_similar_items = config.model.qty_similar_items;
    let num_items_to_recommend = config.model.num_items_to_recommend;
    let qty_workers = config.server.num_workers;

    info!(
        "loading item similarity matrix from {}",
        &config.data.item_similarity_path
    );
    let item_similarity = read_similarity_matrix(&config.data.item_similarity_path)
        .unwrap_or_else(|error| panic!("Cannot load item similarity matrix: {:#}", error));

    info!(
        "loading user similarity matrix from {}",
        &config.data.user_similarity_path
    );
    let user_similarity = read_similarity_matrix(&config.data.user_similarity_path)
        .unwrap_or_else(|error| panic!("Cannot load user similarity matrix: {:#}", error));

    info!("loading rating pivot from {}", &config.data.ratings_path);
    let ratings = read_rating_pivot(&config.data.ratings_path)
        .unwrap_or_else(|error| panic!("Cannot load rating pivot: {:#}", error));

    let descriptive_name = format!(
        "{} | {} | {}",
        config.data.item_similarity_path,
        config.data.user_similarity_path,
        config.data.ratings_path
    );
    let snapshot =
        RecommendationSnapshot::assemble(&descriptive_name, item_similarity, user_similarity, ratings)
            .unwrap_or_else(|error| panic!("Artifact validation failed: {}", error));

    info!(
        "artifacts ready: {} items, {} users, {} rated cells",
        snapshot.stats.qty_items, snapshot.stats.qty_users, snapshot.stats.qty_rated_cells
    );
    let snapshot_handle = Arc::new(SnapshotHandle::new(snapshot));

    let prometheus = PrometheusMetrics::new("api", Some("/internal/prometheus"), None);

    info!("Done. start httpd at http://{}", &bind_address);
    HttpServer::new(move || {
        let handles_and_config = SharedHandlesAndConfig {
            snapshot: snapshot_handle.clone(),
            neighborhood_size_k,
            qty_similar_items,
            num_items_to_recommend,
            qty_workers,
        };

        App::new()
            .wrap(middleware::Compress::new(ContentEncoding::Identity))
            .wrap(prometheus.clone())
            .wrap(
                middleware::DefaultHeaders::new()
                    .header("Cache-Control", "no-cache, no-store, must-revalidate")
                    .header("Pragma", "no-cache")
                    .header("Expires", "0"),
            )
            .data(handles_and_config)
            .service(v1_similar_items)
            .service(v1_recommend_user)
            .service(internal)
            .service(web::resource("/").route(web::get().to(|_req: HttpRequest| {
                HttpResponse::Found()
                    .header(header::LOCATION, "/internal")
                    .finish()
            })))
    })
    .workers(config.server.num_workers)
    .bind(&bind_address)
    .unwrap_or_else(|_| panic!("Could not bind server to address {}", &bind_address))
    .run()
    .await
}
