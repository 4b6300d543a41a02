use actix_web::{http::header::AUTHORIZATION, web, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};

use crate::{errors::AppError, AppState};

/// Extractor guarding admin routes. Requires `Authorization: Bearer <token>`
/// matching the configured admin token; anything else is a 401.
/// Usage: add `_admin: AdminToken` as a parameter to your handler function.
#[derive(Debug)]
pub struct AdminToken;

impl FromRequest for AdminToken {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let Some(state) = req.app_data::<web::Data<AppState>>() else {
            tracing::error!("AppState missing while authorising admin request");
            return ready(Err(AppError::InternalError("Application state missing".into()).into()));
        };

        match bearer_token(req) {
            Some(token) if state.admin_token_matches(token) => ready(Ok(AdminToken)),
            Some(_) => {
                tracing::warn!(path = %req.path(), "Rejected admin request with invalid token");
                ready(Err(AppError::UnauthorizedAccess.into()))
            }
            None => ready(Err(AppError::UnauthorizedAccess.into())),
        }
    }
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
