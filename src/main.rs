// src/main.rs

use std::io;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{
    http::{self, header::HeaderName},
    middleware::Logger,
    web, App, HttpServer,
};
use env_logger::Env;
use log::{error, info};

use taskline::app_state::AppState;
use taskline::config::Config;
use taskline::container::Container;
use taskline::routes;
use taskline::task_route::HX_TRIGGER;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = Config::from_env();
    let container = match Container::new(config.database_path.clone()) {
        Ok(container) => Arc::new(container),
        Err(e) => {
            error!("Failed to initialise dependencies: {}", e);
            return Err(io::Error::other(e));
        }
    };
    let state = web::Data::new(AppState::new(container));

    info!("Server running at http://{}", config.bind_address);
    info!("Allowed CORS Origin: {}", config.frontend_origin);

    let frontend_origin = config.frontend_origin.clone();
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&frontend_origin)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                http::header::CONTENT_TYPE,
                http::header::ACCEPT,
                HeaderName::from_static("hx-request"),
                HeaderName::from_static("hx-target"),
                HeaderName::from_static("hx-current-url"),
                HeaderName::from_static("hx-trigger"),
            ])
            .expose_headers(vec![HX_TRIGGER])
            .max_age(3600);

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(state.clone())
            .configure(routes::configure)
    })
    .bind(&config.bind_address)?
    .run()
    .await
}
