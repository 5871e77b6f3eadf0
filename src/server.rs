// src/server.rs

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use log::info;

use crate::api::{configure, AppState};

// Running the Actix web server
pub async fn run_server(
    app_state: web::Data<AppState>,
    bind_addr: &str,
    port: u16,
) -> std::io::Result<()> {
    info!("Serving predictor API on {}:{}", bind_addr, port);
    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive()) // Enable CORS
            .app_data(app_state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
