pub mod calendar;
pub mod config;
pub mod db;
pub mod dto;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod service;

use std::io;

use actix_web::{web, App, HttpServer};
use log::info;

use config::Config;
use service::{
    auth::{jwt::TokenKeys, AuthMiddleware},
    log::{init_logger, AccessLog},
    user::{watch_sessions, Identity},
};

fn startup_error(err: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err.to_string())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    init_logger();
    let config = Config::from_env().map_err(startup_error)?;

    let store = db::init_store(&config.store).await.map_err(startup_error)?;
    service::admin::seed_bootstrap_admins(&config.bootstrap_admins, store.as_ref())
        .await
        .map_err(startup_error)?;

    let keys = TokenKeys::from_config(&config);
    let identity = Identity::new(keys.clone(), config.federated.clone());
    actix_rt::spawn(watch_sessions(store.clone(), identity.subscribe()));
    let identity = web::Data::new(identity);

    info!("listening on {}", config.bind_addr);
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::from(store.clone()))
            .app_data(identity.clone())
            .wrap(AuthMiddleware { keys: keys.clone() })
            .wrap(AccessLog)
            .configure(handlers::init_routes)
    })
    .bind(config.bind_addr.as_str())?
    .run()
    .await
}
