use bitflags::bitflags;
use log::debug;
use serde::Serialize;

use crate::{
    db::{self, DocumentStore},
    errors::AppError,
    models::{Club, GLOBAL_SCOPE},
};

use super::auth::UserAuthData;

bitflags! {
    /// Actions a viewer may take on one club (or on the global calendar).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Capabilities: u8 {
        const EDIT_CLUB = 1;
        const MANAGE_EVENTS = 1 << 1;
        const ADD_RESOURCES = 1 << 2;
        const MANAGE_ADMINS = 1 << 3;
    }
}

/// Flattened form of [`Capabilities`] handed to renderers.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityView {
    pub edit_club: bool,
    pub manage_events: bool,
    pub add_resources: bool,
    pub manage_admins: bool,
}

impl From<Capabilities> for CapabilityView {
    fn from(caps: Capabilities) -> Self {
        CapabilityView {
            edit_club: caps.contains(Capabilities::EDIT_CLUB),
            manage_events: caps.contains(Capabilities::MANAGE_EVENTS),
            add_resources: caps.contains(Capabilities::ADD_RESOURCES),
            manage_admins: caps.contains(Capabilities::MANAGE_ADMINS),
        }
    }
}

pub fn has_role(user: &UserAuthData, club: &Club) -> bool {
    let user_id = user.user_id.to_string();
    club.admins.iter().any(|admin| *admin == user_id)
}

/// `club: None` stands for the global calendar, where only global admins
/// may manage events.
pub fn club_capabilities(user: Option<&UserAuthData>, club: Option<&Club>, is_global_admin: bool) -> Capabilities {
    let Some(user) = user else {
        return Capabilities::empty();
    };
    if is_global_admin {
        return Capabilities::all();
    }
    match club {
        Some(club) if has_role(user, club) => Capabilities::all(),
        _ => Capabilities::empty(),
    }
}

pub fn require(caps: Capabilities, needed: Capabilities) -> Result<(), AppError> {
    if caps.contains(needed) {
        Ok(())
    } else {
        debug!("denied: have {:?}, need {:?}", caps, needed);
        Err(AppError::Unauthorized)
    }
}

pub fn require_user(user: Option<&UserAuthData>) -> Result<&UserAuthData, AppError> {
    user.ok_or(AppError::Unauthenticated)
}

pub async fn is_global_admin(user: Option<&UserAuthData>, store: &dyn DocumentStore) -> Result<bool, AppError> {
    match user {
        Some(user) => db::admin::is_admin(&user.email, store).await,
        None => Ok(false),
    }
}

/// Loads whatever the check for `scope` (a club id or `"global"`) needs.
pub async fn load_capabilities(
    user: Option<&UserAuthData>,
    scope: &str,
    store: &dyn DocumentStore,
) -> Result<Capabilities, AppError> {
    if user.is_none() {
        return Ok(Capabilities::empty());
    }
    let global_admin = is_global_admin(user, store).await?;
    if scope == GLOBAL_SCOPE {
        return Ok(club_capabilities(user, None, global_admin));
    }
    let club = db::club::get_by_id(scope, store).await?;
    Ok(club_capabilities(user, Some(&club), global_admin))
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn user() -> UserAuthData {
        UserAuthData {
            user_id: Uuid::new_v4(),
            email: "member@example.com".to_string(),
        }
    }

    fn club_with_admins(admins: Vec<String>) -> Club {
        Club {
            id: "c1".to_string(),
            name: "Chess".to_string(),
            category: "games".to_string(),
            color: "#000".to_string(),
            description: String::new(),
            image: None,
            admins,
            created_at: None,
        }
    }

    #[test]
    fn anonymous_viewers_get_nothing() {
        let club = club_with_admins(vec![]);
        assert!(club_capabilities(None, Some(&club), true).is_empty());
    }

    #[test]
    fn club_admins_manage_their_own_club_only() {
        let me = user();
        let mine = club_with_admins(vec![me.user_id.to_string()]);
        let theirs = club_with_admins(vec![Uuid::new_v4().to_string()]);

        assert!(has_role(&me, &mine));
        assert_eq!(club_capabilities(Some(&me), Some(&mine), false), Capabilities::all());
        assert!(club_capabilities(Some(&me), Some(&theirs), false).is_empty());
        assert!(club_capabilities(Some(&me), None, false).is_empty());
    }

    #[test]
    fn global_admins_manage_everything() {
        let me = user();
        assert_eq!(club_capabilities(Some(&me), None, true), Capabilities::all());
        assert!(require(Capabilities::all(), Capabilities::MANAGE_EVENTS).is_ok());
        assert_eq!(
            require(Capabilities::EDIT_CLUB, Capabilities::MANAGE_ADMINS),
            Err(AppError::Unauthorized)
        );
    }
}
