use actix_web::{get, post, put, web, HttpRequest, Responder};

use crate::{
    db::DocumentStore,
    dto::{ClubFilterQuery, NewAdminDto, NewClubDto, NewResourceDto, UpdateClubDto},
    service,
};

use super::{current_user, respond};

#[get("")]
pub async fn list(
    req: HttpRequest,
    filter: web::Query<ClubFilterQuery>,
    store: web::Data<dyn DocumentStore>,
) -> impl Responder {
    let user = current_user(&req);
    respond("GET /clubs", service::club::list(&filter, user.as_ref(), store.get_ref()).await)
}

#[post("")]
pub async fn create(
    req: HttpRequest,
    dto: web::Json<NewClubDto>,
    store: web::Data<dyn DocumentStore>,
) -> impl Responder {
    let user = current_user(&req);
    respond("POST /clubs", service::club::create(user.as_ref(), dto.into_inner(), store.get_ref()).await)
}

#[get("/{id}")]
pub async fn get_by_id(
    req: HttpRequest,
    id: web::Path<String>,
    store: web::Data<dyn DocumentStore>,
) -> impl Responder {
    let user = current_user(&req);
    respond("GET /clubs/{id}", service::club::get_detail(&id, user.as_ref(), store.get_ref()).await)
}

#[put("/{id}")]
pub async fn update(
    req: HttpRequest,
    id: web::Path<String>,
    dto: web::Json<UpdateClubDto>,
    store: web::Data<dyn DocumentStore>,
) -> impl Responder {
    let user = current_user(&req);
    let result = service::club::update(&id, dto.into_inner(), user.as_ref(), store.get_ref()).await;
    respond("PUT /clubs/{id}", result)
}

#[post("/{id}/admins")]
pub async fn add_admin(
    req: HttpRequest,
    id: web::Path<String>,
    dto: web::Json<NewAdminDto>,
    store: web::Data<dyn DocumentStore>,
) -> impl Responder {
    let user = current_user(&req);
    let result = service::club::add_admin(&id, &dto.email, user.as_ref(), store.get_ref()).await;
    respond("POST /clubs/{id}/admins", result)
}

#[get("/{id}/resources")]
pub async fn list_resources(id: web::Path<String>, store: web::Data<dyn DocumentStore>) -> impl Responder {
    respond("GET /clubs/{id}/resources", service::resource::list(&id, store.get_ref()).await)
}

#[post("/{id}/resources")]
pub async fn add_resource(
    req: HttpRequest,
    id: web::Path<String>,
    dto: web::Json<NewResourceDto>,
    store: web::Data<dyn DocumentStore>,
) -> impl Responder {
    let user = current_user(&req);
    let result = service::resource::add(&id, dto.into_inner(), user.as_ref(), store.get_ref()).await;
    respond("POST /clubs/{id}/resources", result)
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(list)
        .service(create)
        .service(get_by_id)
        .service(update)
        .service(add_admin)
        .service(list_resources)
        .service(add_resource);
}
