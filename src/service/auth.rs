use std::future::{ready, Ready};
use actix_web::{dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform}, HttpMessage};
use futures_util::future::LocalBoxFuture;
use log::{debug, warn};
use uuid::Uuid;

use crate::dto::{Claims, TokenType};

use self::jwt::TokenKeys;

/// Identity attached to a request that carried a valid access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAuthData {
    pub user_id: Uuid,
    pub email: String,
}

impl From<Claims> for UserAuthData {
    fn from(claims: Claims) -> Self {
        UserAuthData {
            user_id: claims.user_id,
            email: claims.email,
        }
    }
}

/// Routes that issue or renew tokens, where a stale access token must not
/// block the request.
const OPEN_PREFIX: &str = "/auth/";

/// Resolves the bearer token into [`UserAuthData`]. Requests without a token
/// pass through anonymously; a bad or expired token is rejected.
pub struct AuthMiddleware {
    pub keys: TokenKeys
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
    where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            keys: self.keys.clone()
        }))
    }
}


pub struct AuthMiddlewareService<S> {
    service: S,
    keys: TokenKeys
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
    where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match jwt::parse_request(&req, "Bearer ") {
            Some(token) => match jwt::decode_claims(&self.keys, TokenType::Access, &token) {
                Ok(claims) => {
                    debug!("request authenticated as {}", claims.user_id);
                    req.extensions_mut().insert(UserAuthData::from(claims));
                },
                Err(_) if req.path().starts_with(OPEN_PREFIX) => {
                    debug!("ignoring stale token on {}", req.path());
                },
                Err(err) => {
                    warn!("rejected token on {} {}", req.method(), req.path());
                    return Box::pin(async move {
                        Err(actix_web::Error::from(err))
                    })
                }
            },
            None => {}
        }
        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            Ok(res)
        })
    }
}


pub mod jwt {
    use actix_web::dev::ServiceRequest;
    use chrono::Utc;
    use jsonwebtoken::{Header, Algorithm, EncodingKey, encode, decode, DecodingKey, Validation};
    use log::warn;
    use uuid::Uuid;

    use crate::{config::{Config, FederatedConfig}, dto::{Claims, FederatedClaims, TokenType}, errors::AppError};

    /// Signing secrets and lifetimes for both token kinds.
    #[derive(Debug, Clone)]
    pub struct TokenKeys {
        access_secret: String,
        refresh_secret: String,
        pub access_ttl: usize,
        pub refresh_ttl: usize,
    }

    impl TokenKeys {
        pub fn new(access_secret: &str, refresh_secret: &str, access_ttl: usize, refresh_ttl: usize) -> Self {
            TokenKeys {
                access_secret: access_secret.to_string(),
                refresh_secret: refresh_secret.to_string(),
                access_ttl,
                refresh_ttl,
            }
        }

        pub fn from_config(config: &Config) -> Self {
            Self::new(&config.access_secret, &config.refresh_secret, config.access_token_ttl, config.refresh_token_ttl)
        }

        fn secret(&self, token_type: TokenType) -> &[u8] {
            match token_type {
                TokenType::Access => self.access_secret.as_bytes(),
                TokenType::Refresh => self.refresh_secret.as_bytes(),
            }
        }

        fn ttl(&self, token_type: TokenType) -> usize {
            match token_type {
                TokenType::Access => self.access_ttl,
                TokenType::Refresh => self.refresh_ttl,
            }
        }
    }

    pub fn create(keys: &TokenKeys, token_type: TokenType, user_id: Uuid, email: &str) -> Result<String, AppError> {
        let exp = Utc::now().timestamp().max(0) as usize + keys.ttl(token_type);
        let claims = Claims::new(user_id, email, token_type, exp);
        let key = EncodingKey::from_secret(keys.secret(token_type));
        encode(&Header::new(Algorithm::HS256), &claims, &key).map_err(|err| {
            warn!("token encoding failed: {}", err);
            AppError::InternalError
        })
    }

    /// Expired, forged or wrong-kind tokens all come back as `Unauthenticated`.
    pub fn decode_claims(keys: &TokenKeys, token_type: TokenType, token: &str) -> Result<Claims, AppError> {
        let decoding_key = DecodingKey::from_secret(keys.secret(token_type));
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &decoding_key, &validation).map_err(|err| {
            warn!("rejected {:?} token: {}", token_type, err);
            AppError::Unauthenticated
        })?;
        if data.claims.kind != token_type {
            return Err(AppError::Unauthenticated);
        }
        Ok(data.claims)
    }

    /// Verifies an identity assertion minted by the federated sign-in broker.
    pub fn decode_federated(config: &FederatedConfig, token: &str) -> Result<FederatedClaims, AppError> {
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.issuer.as_str()]);
        decode::<FederatedClaims>(token, &decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|err| {
                warn!("rejected federated token: {}", err);
                AppError::Unauthenticated
            })
    }

    pub fn parse_request(req: &ServiceRequest, prefix: &str) -> Option<String> {
        req.headers()
            .get("Authorization")
            .and_then(|auth_header| auth_header.to_str().ok())
            .and_then(|auth_value| auth_value.strip_prefix(prefix))
            .map(|token| token.trim().to_string())
    }

}
