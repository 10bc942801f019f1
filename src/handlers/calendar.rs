use actix_web::{get, web, HttpRequest, Responder};

use crate::{
   db::DocumentStore,
   dto::{CalendarQuery, ScopeQuery},
   service,
};

use super::{current_user, event_stream, respond};

#[get("")]
pub async fn month(query: web::Query<CalendarQuery>, store: web::Data<dyn DocumentStore>) -> impl Responder {
   respond("GET /calendar", service::calendar::month(&query, store.get_ref()).await)
}

#[get("/day/{date}")]
pub async fn day(
   req: HttpRequest,
   date: web::Path<String>,
   scope: web::Query<ScopeQuery>,
   store: web::Data<dyn DocumentStore>,
) -> impl Responder {
   let user = current_user(&req);
   let result = service::calendar::day_detail(&date, scope.club.as_deref(), user.as_ref(), store.get_ref()).await;
   respond("GET /calendar/day/{date}", result)
}

#[get("/stream")]
pub async fn stream(query: web::Query<CalendarQuery>, store: web::Data<dyn DocumentStore>) -> impl Responder {
   event_stream(service::calendar::month_stream(&query, store.into_inner()))
}

pub fn config(cfg: &mut web::ServiceConfig) {
   cfg.service(month).service(day).service(stream);
}
