use actix_web::{get, HttpResponse, Responder};

#[get("/")]
pub async fn home() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "Welcome to the Gallery Web API!",
        "status": "Ok",
        "version": env!("CARGO_PKG_VERSION"),
        "galleries": "/api/v1/galleries",
        "health": "/api/v1/health"
    }))
}
