// src/main.rs
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use log::info;

use structure_scanner::config::ScannerConfig;
use structure_scanner::handlers::{self, AppState};
use structure_scanner::orchestrator::ScanOrchestrator;
use structure_scanner::provider::BinanceFutures;
use structure_scanner::snapshot::SnapshotCache;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(
        env_logger::Env::new().default_filter_or("structure_scanner=info,info"),
    );

    let config = ScannerConfig::from_env();
    let host = config.host.clone();
    let port = config.port;

    let provider =
        Arc::new(BinanceFutures::new().expect("Failed to build the provider HTTP client"));
    let state = web::Data::new(AppState {
        snapshot: SnapshotCache::new(config.snapshot_ttl),
        orchestrator: ScanOrchestrator::new(provider, config),
    });

    info!("🚀 [HTTP] starting server on http://{}:{}", host, port);
    println!("Available endpoints:");
    println!("  GET http://{}:{}/api/tokens", host, port);
    println!("  GET http://{}:{}/health", host, port);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(Cors::permissive())
            .app_data(state.clone())
            .route("/api/tokens", web::get().to(handlers::get_tokens))
            .route("/health", web::get().to(handlers::health_check))
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
