pub mod auth;
pub mod health;
pub mod users;

use actix_web::web;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(health::welcome)
        .service(health::health)
        .service(auth::register)
        .service(auth::login)
        .service(users::me);
}
