use actix_web::web;

use crate::handlers::galleries;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .service(
                web::resource("/galleries")
                    .route(web::post().to(galleries::create_gallery))
            )
            .service(
                web::resource("/galleries/{gallery_id}")
                    .route(web::delete().to(galleries::delete_gallery))
            )
    );
}
