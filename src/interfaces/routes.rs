use actix_web::web;

use crate::{constants::API_PREFIX, handlers::{home::home, system::health_check}};

mod admin;
mod galleries;
mod json_error;

pub use json_error::multipart_config;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(home);

    cfg.service(
        web::scope(API_PREFIX)
            .service(health_check)
            .configure(galleries::config_routes)
            .configure(admin::config_routes)
    );

    cfg.configure(json_error::config_routes);
}
