use actix_web::web;

use crate::handlers::galleries;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/galleries")
            .service(
                web::resource("")
                    .route(web::get().to(galleries::list_galleries))
            )
            .service(
                web::resource("/featured")
                    .route(web::get().to(galleries::list_featured_galleries))
            )
            .service(
                web::resource("/stats")
                    .route(web::get().to(galleries::gallery_stats))
            )
            .service(
                web::resource("/categories")
                    .route(web::get().to(galleries::list_categories))
            )
            .service(
                web::resource("/{slug}")
                    .route(web::get().to(galleries::get_gallery_by_slug))
            )
    );
}
