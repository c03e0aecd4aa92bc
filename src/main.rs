mod config;
mod db;
mod errors;
mod handlers;
mod models;
mod utils;

use std::io;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use log::info;

use crate::config::Config;
use crate::utils::upload::{UploadStore, UPLOAD_URL_PREFIX};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env()
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;

    // Initialize the record store and the attachment directory
    let store = db::connect(&config).await.map_err(io::Error::other)?;
    let uploads = UploadStore::open(&config.upload_dir).await?;

    info!(
        "Starting server at {}:{} ({:?} store, uploads in {})",
        config.host,
        config.port,
        config.backend,
        uploads.dir().display()
    );

    let upload_dir = uploads.dir().to_path_buf();
    let store = web::Data::from(store);
    let uploads = web::Data::new(uploads);

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .wrap(Logger::default())
            .app_data(store.clone())
            .app_data(uploads.clone())
            .service(Files::new(UPLOAD_URL_PREFIX, upload_dir.clone()))
            .configure(handlers::employee::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
