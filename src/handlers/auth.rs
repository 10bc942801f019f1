use actix_web::{post, web, HttpRequest, HttpResponse, Responder};
use log::info;

use crate::{
    db::DocumentStore,
    dto::{FederatedLoginRequest, LoginUserRequest, NewUserDto, RefreshRequest},
    service::{self, user::Identity},
};

use super::{current_user, respond};

#[post("/sign-up")]
pub async fn sign_up(dto: web::Json<NewUserDto>, store: web::Data<dyn DocumentStore>) -> impl Responder {
    let result = match service::user::sign_up(dto.into_inner(), store.get_ref()).await {
        Ok(user) => service::user::session_info(&user, store.get_ref()).await,
        Err(err) => Err(err),
    };
    respond("/auth/sign-up", result)
}

#[post("/sign-in")]
pub async fn sign_in(
    dto: web::Json<LoginUserRequest>,
    identity: web::Data<Identity>,
    store: web::Data<dyn DocumentStore>,
) -> impl Responder {
    let result = service::user::sign_in(dto.into_inner(), identity.get_ref(), store.get_ref()).await;
    if let Ok(auth) = &result {
        info!("issued tokens to {}", auth.session.email);
    }
    respond("/auth/sign-in", result)
}

#[post("/federated")]
pub async fn sign_in_federated(
    dto: web::Json<FederatedLoginRequest>,
    identity: web::Data<Identity>,
    store: web::Data<dyn DocumentStore>,
) -> impl Responder {
    let result = service::user::sign_in_federated(&dto.id_token, identity.get_ref(), store.get_ref()).await;
    respond("/auth/federated", result)
}

#[post("/refresh")]
pub async fn refresh(
    dto: web::Json<RefreshRequest>,
    identity: web::Data<Identity>,
    store: web::Data<dyn DocumentStore>,
) -> impl Responder {
    let result = service::user::refresh(&dto.refresh_token, identity.get_ref(), store.get_ref()).await;
    respond("/auth/refresh", result)
}

#[post("/sign-out")]
pub async fn sign_out(
    req: HttpRequest,
    identity: web::Data<Identity>,
    store: web::Data<dyn DocumentStore>,
) -> HttpResponse {
    let user = current_user(&req);
    match service::user::sign_out(user.as_ref(), identity.get_ref(), store.get_ref()).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(err) => respond::<()>("/auth/sign-out", Err(err)),
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(sign_up)
        .service(sign_in)
        .service(sign_in_federated)
        .service(refresh)
        .service(sign_out);
}
