extern crate sys_info;

use actix_web::{get, web, HttpResponse};
use chrono::Utc;
use num_format::{Locale, ToFormattedString};

use crate::artifacts::SharedHandlesAndConfig;
use web::Data;

#[get("/internal")]
pub async fn internal(config: Data<SharedHandlesAndConfig>) -> HttpResponse {
    let snapshot = config.snapshot.load();
    let stats = &snapshot.stats;

    let mut html =
        "<html>ludorec: catalogue recommendations from precomputed artifacts.<br />".to_string();

    html.push_str("<h3>Artifacts</h3>");
    html.push_str("Loaded: ");
    html.push_str(&*stats.descriptive_name);
    html.push_str("<br />Qty Items: ");
    html.push_str(&stats.qty_items.to_formatted_string(&Locale::en));
    html.push_str("<br />Qty Users: ");
    html.push_str(&stats.qty_users.to_formatted_string(&Locale::en));
    html.push_str("<br />Qty Rated Cells: ");
    html.push_str(&stats.qty_rated_cells.to_formatted_string(&Locale::en));
    html.push_str("<br />Rating density: ");
    html.push_str(&format!("{:.4}", stats.rating_density));
    html.push_str("<br />Loaded At: ");
    html.push_str(&stats.loaded_at_date_time.to_string());
    html.push_str("<br />Age (hours): ");

    let age_hours = (Utc::now().naive_utc() - stats.loaded_at_date_time).num_hours();
    html.push_str(&*age_hours.to_string());

    html.push_str("<h3>Model</h3>");
    html.push_str("hyperparameters");
    html.push_str("<br />k : ");
    html.push_str(&config.neighborhood_size_k.to_string());
    html.push_str(" (top `k` closest neighbor users for vote aggregation)");
    html.push_str("<br />Qty similar items: ");
    html.push_str(&config.qty_similar_items.to_string());
    html.push_str("<br />Qty items to recommend: ");
    html.push_str(&config.num_items_to_recommend.to_string());
    html.push_str(
        "<br /><a href=\"/v1/similar_items?game=Killing%20Floor\">v1 item-to-item endpoint</a>",
    );
    html.push_str(
        "<br /><a href=\"/v1/recommend_user?user=76561197970982479\">v1 personalized endpoint</a>",
    );

    html.push_str("<h3>Machine instance</h3>");
    html.push_str("<br />Qty CPU's detected: ");
    html.push_str(&*sys_info::cpu_num().unwrap_or(0).to_string());
    html.push_str("<br />Qty actix workers set: ");
    html.push_str(&config.qty_workers.to_string());
    html.push_str("<br />CPU speed: ");
    html.push_str(&*sys_info::cpu_speed().unwrap_or(0).to_string());
    html.push_str("MHz");
    html.push_str("<br />Active processes on instance: ");
    html.push_str(&*sys_info::proc_total().unwrap_or(0).to_string());

    html.push_str("<h3>Metrics</h3>");
    html.push_str("<a href=\"/internal/prometheus\">prometheus</a>");
    html.push_str("</html>");

    HttpResponse::Ok().body(html)
}
