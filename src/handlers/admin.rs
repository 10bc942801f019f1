use actix_web::{post, web, HttpRequest, HttpResponse};

use crate::{db::DocumentStore, dto::NewAdminDto, service};

use super::{current_user, respond};

#[post("")]
pub async fn add_global_admin(
    req: HttpRequest,
    dto: web::Json<NewAdminDto>,
    store: web::Data<dyn DocumentStore>,
) -> HttpResponse {
    let user = current_user(&req);
    match service::admin::add_global_admin(&dto.email, user.as_ref(), store.get_ref()).await {
        Ok(()) => HttpResponse::Created().finish(),
        Err(err) => respond::<()>("POST /admins", Err(err)),
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(add_global_admin);
}
