use actix_web::{
    error,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use derive_more::{Display, Error};

#[derive(Debug, Display, Error, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(tag = "error")]
pub enum AppError {
    #[display(fmt = "internal error")]
    InternalError,

    #[display(fmt = "bad request: {}", reason)]
    BadClientData { reason: String },

    /// No session is attached to an operation that needs one.
    #[display(fmt = "sign in required")]
    Unauthenticated,

    /// A session is present but lacks the role the operation needs.
    #[display(fmt = "unauthorized")]
    Unauthorized,

    #[display(fmt = "{} not found", entity)]
    NotFound { entity: String },

    /// The storage or identity backend failed.
    #[display(fmt = "remote service failure")]
    RemoteFailure,
}

impl AppError {
    pub fn bad_request(reason: impl Into<String>) -> Self {
        AppError::BadClientData { reason: reason.into() }
    }

    pub fn not_found(entity: impl Into<String>) -> Self {
        AppError::NotFound { entity: entity.into() }
    }
}

#[derive(serde::Serialize)]
struct ErrorBody<'a> {
    #[serde(flatten)]
    kind: &'a AppError,
    message: String,
}

impl error::ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let body = ErrorBody {
            kind: self,
            message: self.to_string(),
        };
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(body)
    }

    fn status_code(&self) -> StatusCode {
        match *self {
            AppError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadClientData { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Unauthorized => StatusCode::FORBIDDEN,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::RemoteFailure => StatusCode::BAD_GATEWAY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::ResponseError;

    #[test]
    fn maps_error_kinds_to_status_codes() {
        assert_eq!(AppError::Unauthenticated.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Unauthorized.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::not_found("event").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::RemoteFailure.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn serializes_with_kind_tag() {
        let json = serde_json::to_value(AppError::not_found("club")).unwrap();
        assert_eq!(json["error"], "NotFound");
        assert_eq!(json["entity"], "club");
        assert_eq!(AppError::not_found("club").to_string(), "club not found");
    }
}
