pub mod config;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod markdown;
pub mod models;
pub mod selector;
pub mod state;

pub use state::AppState;

use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(handlers::page::index)
        .service(handlers::query::submit_query)
        .service(handlers::upload::upload_database)
        .service(handlers::health::health_check);
}
