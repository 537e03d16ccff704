use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Builder;
use log::info;

use twitter_api::{config::Config, handlers, state::AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = Config::from_env()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    Builder::new()
        .filter_level(config.log_level)
        .format_timestamp_secs()
        .init();

    info!("Starting Twitter API backend...");
    let state = AppState::open(&config)
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    info!(
        "Listening on {}:{} with {} workers",
        config.host, config.port, config.workers
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(web::Data::new(state.clone()))
            .configure(handlers::configure)
    })
    .workers(config.workers)
    .bind(config.bind_addr())?
    .run()
    .await
}
