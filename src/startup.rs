use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use std::net::TcpListener;

use crate::auth::SessionService;
use crate::chirps::ChirpService;
use crate::logger::AccessLog;
use crate::routes::{
    create_chirp, create_user, delete_chirp, get_chirp, health_check, list_chirps, login,
    polka_webhook, refresh, revoke, update_user, WebhookKey,
};

pub fn run(
    listener: TcpListener,
    session: SessionService,
    chirps: ChirpService,
    webhook_key: WebhookKey,
) -> Result<Server, std::io::Error> {
    let session = web::Data::new(session);
    let chirps = web::Data::new(chirps);
    let webhook_key = web::Data::new(webhook_key);

    let server = HttpServer::new(move || {
        App::new()
            // Access log
            .wrap(AccessLog)

            // Shared state
            .app_data(session.clone())
            .app_data(chirps.clone())
            .app_data(webhook_key.clone())

            .route("/api/healthz", web::get().to(health_check))
            .route("/api/users", web::post().to(create_user))
            .route("/api/users", web::put().to(update_user))
            .route("/api/login", web::post().to(login))
            .route("/api/refresh", web::post().to(refresh))
            .route("/api/revoke", web::post().to(revoke))
            .route("/api/chirps", web::post().to(create_chirp))
            .route("/api/chirps", web::get().to(list_chirps))
            .route("/api/chirps/{chirp_id}", web::get().to(get_chirp))
            .route("/api/chirps/{chirp_id}", web::delete().to(delete_chirp))
            .route("/api/polka/webhooks", web::post().to(polka_webhook))
    })
    .listen(listener)?
    .run();

    Ok(server)
}
