use chrono::Utc;
use log::{debug, error, info, warn};
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use crate::{
    config::FederatedConfig,
    db::{self, DocumentStore, Store},
    dto::{AccessTokenResponse, AuthUserResponse, LoginUserRequest, NewUserDto, SessionInfo, TokenType},
    errors::AppError,
    models::User,
};

use super::{
    access,
    auth::{jwt::{self, TokenKeys}, UserAuthData},
    crypto,
};

const SESSION_FEED_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    SignedIn,
    SignedOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionChange {
    pub user_id: Uuid,
    pub email: String,
    pub kind: SessionKind,
}

/// Token keys, optional federated broker and the session-change feed.
pub struct Identity {
    pub keys: TokenKeys,
    federated: Option<FederatedConfig>,
    sessions: broadcast::Sender<SessionChange>,
}

impl Identity {
    pub fn new(keys: TokenKeys, federated: Option<FederatedConfig>) -> Self {
        let (sessions, _) = broadcast::channel(SESSION_FEED_CAPACITY);
        Identity { keys, federated, sessions }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionChange> {
        self.sessions.subscribe()
    }

    fn publish(&self, user: &User, kind: SessionKind) {
        let change = SessionChange { user_id: user.id, email: user.email.clone(), kind };
        // no listener is fine
        let _ = self.sessions.send(change);
    }
}

pub async fn sign_up(dto: NewUserDto, store: &dyn DocumentStore) -> Result<User, AppError> {
    let NewUserDto { email, pwd, pwd_confirm } = dto;
    let email = email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(AppError::bad_request("e-mail address is malformed"));
    }
    if pwd.is_empty() || pwd != pwd_confirm {
        return Err(AppError::bad_request("passwords are empty or do not match"));
    }
    if db::user::exists(&email, store).await? {
        return Err(AppError::bad_request("e-mail is already registered"));
    }

    let user = User {
        id: Uuid::new_v4(),
        email,
        pwd_hash: Some(crypto::hash_password(&pwd)),
        refresh_token: None,
        last_sign_in_at: None,
    };
    db::user::create(&user, store).await?;
    info!("user {} signed up as {}", user.id, user.email);
    Ok(user)
}

/// Global admin flag plus the clubs the user administers.
pub async fn session_info(user: &User, store: &dyn DocumentStore) -> Result<SessionInfo, AppError> {
    let is_admin = db::admin::is_admin(&user.email, store).await?;
    let admin_club_ids = db::club::administered_by(&user.id.to_string(), store)
        .await?
        .into_iter()
        .map(|club| club.id)
        .collect();
    Ok(SessionInfo { user_id: user.id, email: user.email.clone(), is_admin, admin_club_ids })
}

async fn open_session(user: User, identity: &Identity, store: &dyn DocumentStore) -> Result<AuthUserResponse, AppError> {
    let access_token = jwt::create(&identity.keys, TokenType::Access, user.id, &user.email)?;
    let refresh_token = jwt::create(&identity.keys, TokenType::Refresh, user.id, &user.email)?;
    db::user::set_refresh_token(user.id, Some(&refresh_token), store).await?;
    let session = session_info(&user, store).await?;
    identity.publish(&user, SessionKind::SignedIn);
    Ok(AuthUserResponse { access_token, refresh_token, session })
}

pub async fn sign_in(
    dto: LoginUserRequest,
    identity: &Identity,
    store: &dyn DocumentStore,
) -> Result<AuthUserResponse, AppError> {
    let email = dto.email.trim().to_lowercase();
    let user = db::user::get_by_email(&email, store)
        .await?
        .ok_or(AppError::Unauthenticated)?;
    let verified = user
        .pwd_hash
        .as_deref()
        .map_or(false, |stored| crypto::verify_password(&dto.pwd, stored));
    if !verified {
        warn!("failed sign-in for {}", email);
        return Err(AppError::Unauthenticated);
    }
    open_session(user, identity, store).await
}

/// Accepts an assertion from the federated broker and makes sure the
/// person has a user record before opening the session.
pub async fn sign_in_federated(
    id_token: &str,
    identity: &Identity,
    store: &dyn DocumentStore,
) -> Result<AuthUserResponse, AppError> {
    let config = identity
        .federated
        .as_ref()
        .ok_or_else(|| AppError::bad_request("federated sign-in is not configured"))?;
    let claims = jwt::decode_federated(config, id_token)?;
    let email = claims.email.trim().to_lowercase();

    let user = match db::user::get_by_email(&email, store).await? {
        Some(user) => user,
        None => {
            let user = User {
                id: Uuid::new_v4(),
                email,
                pwd_hash: None,
                refresh_token: None,
                last_sign_in_at: None,
            };
            db::user::create(&user, store).await?;
            info!("user {} registered through {} ({})", user.id, claims.iss, claims.sub);
            user
        }
    };
    open_session(user, identity, store).await
}

pub async fn refresh(
    refresh_token: &str,
    identity: &Identity,
    store: &dyn DocumentStore,
) -> Result<AccessTokenResponse, AppError> {
    let claims = jwt::decode_claims(&identity.keys, TokenType::Refresh, refresh_token)?;
    let user = match db::user::get_by_id(claims.user_id, store).await {
        Ok(user) => user,
        Err(AppError::NotFound { .. }) => return Err(AppError::Unauthenticated),
        Err(err) => return Err(err),
    };
    if user.refresh_token.as_deref() != Some(refresh_token) {
        debug!("refresh token for {} was revoked", user.id);
        return Err(AppError::Unauthenticated);
    }
    let access_token = jwt::create(&identity.keys, TokenType::Access, user.id, &user.email)?;
    Ok(AccessTokenResponse { access_token })
}

pub async fn sign_out(
    user: Option<&UserAuthData>,
    identity: &Identity,
    store: &dyn DocumentStore,
) -> Result<(), AppError> {
    let caller = access::require_user(user)?;
    let user = db::user::get_by_id(caller.user_id, store).await?;
    db::user::set_refresh_token(user.id, None, store).await?;
    identity.publish(&user, SessionKind::SignedOut);
    Ok(())
}

/// Reacts to session changes until the feed closes: stamps the sign-in
/// time and logs whether the session carries admin rights.
pub async fn watch_sessions(store: Store, mut changes: broadcast::Receiver<SessionChange>) {
    loop {
        let change = match changes.recv().await {
            Ok(change) => change,
            Err(RecvError::Lagged(skipped)) => {
                warn!("session watcher skipped {} changes", skipped);
                continue;
            }
            Err(RecvError::Closed) => break,
        };
        match change.kind {
            SessionKind::SignedIn => {
                if let Err(err) = db::user::set_last_sign_in(change.user_id, Utc::now(), store.as_ref()).await {
                    error!("could not record sign-in of {}: {}", change.user_id, err);
                }
                match db::admin::is_admin(&change.email, store.as_ref()).await {
                    Ok(is_admin) => info!("{} signed in (admin: {})", change.email, is_admin),
                    Err(err) => error!("admin lookup for {} failed: {}", change.email, err),
                }
            }
            SessionKind::SignedOut => info!("{} signed out", change.email),
        }
    }
    debug!("session watcher stopped");
}
