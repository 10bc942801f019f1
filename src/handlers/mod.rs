pub mod admin;
pub mod auth;
pub mod calendar;
pub mod club;
pub mod event;
pub mod user;

use actix_web::{
    http::header,
    web::{self, Bytes},
    HttpMessage, HttpRequest, HttpResponse, ResponseError,
};
use futures::{Stream, StreamExt};
use log::{error, warn};
use serde::Serialize;

use crate::{errors::AppError, service::auth::UserAuthData};

/// Session attached by the auth middleware, if any.
pub fn current_user(req: &HttpRequest) -> Option<UserAuthData> {
    req.extensions().get::<UserAuthData>().cloned()
}

/// JSON body on success; the error's own status and body otherwise.
pub fn respond<T: Serialize>(route: &str, result: Result<T, AppError>) -> HttpResponse {
    match result {
        Ok(value) => HttpResponse::Ok().json(value),
        Err(err) => {
            if err.status_code().is_server_error() {
                error!("{} failed: {}", route, err);
            } else {
                warn!("{} rejected: {}", route, err);
            }
            err.error_response()
        }
    }
}

/// Server-sent events: one `data:` frame per snapshot.
pub fn event_stream<S, T>(snapshots: S) -> HttpResponse
where
    S: Stream<Item = Result<T, AppError>> + 'static,
    T: Serialize + 'static,
{
    let frames = snapshots.map(|snapshot| {
        let json = serde_json::to_string(&snapshot?).map_err(|err| {
            error!("snapshot encoding failed: {}", err);
            AppError::InternalError
        })?;
        Ok::<_, AppError>(Bytes::from(format!("data: {json}\n\n")))
    });
    HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, "text/event-stream"))
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .streaming(frames)
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/auth").configure(auth::config))
        .service(web::scope("/clubs").configure(club::config))
        .service(web::scope("/admins").configure(admin::config))
        .service(web::scope("/events").configure(event::config))
        .service(web::scope("/calendar").configure(calendar::config))
        .service(web::scope("/users").configure(user::config));
}
