use actix_web::{get, web, HttpRequest, HttpResponse};

use crate::{db::DocumentStore, service};

use super::{current_user, event_stream, respond};

#[get("/me/schedule")]
pub async fn schedule(req: HttpRequest, store: web::Data<dyn DocumentStore>) -> HttpResponse {
    let user = current_user(&req);
    respond("GET /users/me/schedule", service::interest::schedule(user.as_ref(), store.get_ref()).await)
}

#[get("/me/schedule/stream")]
pub async fn schedule_stream(req: HttpRequest, store: web::Data<dyn DocumentStore>) -> HttpResponse {
    let user = current_user(&req);
    match service::calendar::schedule_stream(user.as_ref(), store.into_inner()) {
        Ok(snapshots) => event_stream(snapshots),
        Err(err) => respond::<()>("GET /users/me/schedule/stream", Err(err)),
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(schedule).service(schedule_stream);
}
