use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse, Responder};
use chrono::Local;

use crate::{
   calendar::DATE_FORMAT,
   db::DocumentStore,
   dto::{InterestStateResponse, NewEventDto, ReminderLinkResponse, ScopeQuery, UpdateEventDto},
   service,
};

use super::{current_user, respond};

#[get("")]
pub async fn get_all(scope: web::Query<ScopeQuery>, store: web::Data<dyn DocumentStore>) -> impl Responder {
   respond("GET /events", service::event::get_all(scope.club.as_deref(), store.get_ref()).await)
}

#[post("")]
pub async fn create(
   req: HttpRequest,
   new_event_dto: web::Json<NewEventDto>,
   store: web::Data<dyn DocumentStore>,
) -> impl Responder {
   let user = current_user(&req);
   let result = service::event::create(user.as_ref(), new_event_dto.into_inner(), store.get_ref()).await;
   respond("POST /events", result)
}

#[get("/today")]
pub async fn today(store: web::Data<dyn DocumentStore>) -> impl Responder {
   let today = Local::now().date_naive().format(DATE_FORMAT).to_string();
   respond("GET /events/today", service::event::happening_on(&today, store.get_ref()).await)
}

#[get("/{id}")]
pub async fn get_by_id(id: web::Path<String>, store: web::Data<dyn DocumentStore>) -> impl Responder {
   respond("GET /events/{id}", service::event::get_by_id(&id, store.get_ref()).await)
}

#[put("/{id}")]
pub async fn update(
   req: HttpRequest,
   id: web::Path<String>,
   update_event_dto: web::Json<UpdateEventDto>,
   store: web::Data<dyn DocumentStore>,
) -> impl Responder {
   let user = current_user(&req);
   let result = service::event::update(&id, update_event_dto.into_inner(), user.as_ref(), store.get_ref()).await;
   respond("PUT /events/{id}", result)
}

#[delete("/{id}")]
pub async fn delete(req: HttpRequest, id: web::Path<String>, store: web::Data<dyn DocumentStore>) -> HttpResponse {
   let user = current_user(&req);
   match service::event::delete(&id, user.as_ref(), store.get_ref()).await {
      Ok(()) => HttpResponse::NoContent().finish(),
      Err(err) => respond::<()>("DELETE /events/{id}", Err(err)),
   }
}

#[post("/{id}/interest")]
pub async fn toggle_interest(
   req: HttpRequest,
   id: web::Path<String>,
   store: web::Data<dyn DocumentStore>,
) -> impl Responder {
   let user = current_user(&req);
   let result = service::interest::toggle_event(user.as_ref(), &id, store.get_ref())
      .await
      .map(|interested| InterestStateResponse { interested });
   respond("POST /events/{id}/interest", result)
}

#[get("/{id}/reminder")]
pub async fn reminder(id: web::Path<String>, store: web::Data<dyn DocumentStore>) -> impl Responder {
   let result = service::event::reminder(&id, store.get_ref())
      .await
      .map(|url| ReminderLinkResponse { url });
   respond("GET /events/{id}/reminder", result)
}

pub fn config(cfg: &mut web::ServiceConfig) {
   cfg.service(get_all)
      .service(create)
      .service(today)
      .service(get_by_id)
      .service(update)
      .service(delete)
      .service(toggle_interest)
      .service(reminder);
}
