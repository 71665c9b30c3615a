mod auth;
mod config;
mod routes;

use actix_cors::Cors;
use actix_web::{http::header, middleware::Logger, web, App, HttpServer};
use match_engine::clock::{Clock, SystemClock};
use match_engine::registry::MatchRegistry;

use crate::auth::{AuthIntrospector, RemoteIntrospector};
use crate::config::Config;

/// Hostnames allowed to receive `Access-Control-Allow-Origin` with credentials.
const ALLOWED_ORIGIN_HOSTS: &[&str] = &["localhost", "127.0.0.1"];

pub struct AppState {
    pub registry: MatchRegistry,
    pub introspector: Box<dyn AuthIntrospector>,
    pub clock: Box<dyn Clock>,
}

fn is_allowed_origin(origin: &actix_web::http::header::HeaderValue) -> bool {
    origin
        .to_str()
        .ok()
        .and_then(|raw| url::Url::parse(raw).ok())
        .and_then(|url| url.host_str().map(|h| h.to_string()))
        .map(|host| ALLOWED_ORIGIN_HOSTS.iter().any(|allowed| *allowed == host))
        .unwrap_or(false)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    pretty_env_logger::init();

    let config = Config::from_env().unwrap_or_else(|e| {
        log::warn!("failed to load configuration from the environment: {e}, using defaults");
        Config {
            secret_key: "dev-secret-key".to_string(),
            auth_service_url: "http://localhost:5001/introspect".to_string(),
        }
    });

    let app_state = web::Data::new(AppState {
        registry: MatchRegistry::load_all(),
        introspector: Box::new(RemoteIntrospector::new(config.auth_service_url.clone())),
        clock: Box::new(SystemClock),
    });

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin_fn(|origin, _req_head| is_allowed_origin(origin))
            .supports_credentials()
            .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
            .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE])
            .max_age(3600);

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(app_state.clone())
            .configure(routes::configure)
    })
    .bind(("0.0.0.0", 8080))?
    .run()
    .await
}
