use chrono::Utc;
use log::info;
use serde::Serialize;

use crate::{
    db::{self, DocumentStore},
    dto::{ClubFilterQuery, NewClubDto, UpdateClubDto},
    errors::AppError,
    models::Club,
};

use super::{
    access::{self, Capabilities, CapabilityView},
    auth::UserAuthData,
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClubSummary {
    #[serde(flatten)]
    pub club: Club,
    pub is_my_club: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClubDetail {
    #[serde(flatten)]
    pub club: Club,
    pub capabilities: CapabilityView,
}

fn check_image(image: Option<&str>) -> Result<(), AppError> {
    match image {
        Some(image) if !image.is_empty() && !image.starts_with("data:image") => {
            Err(AppError::bad_request("image must be a data:image URL"))
        }
        _ => Ok(()),
    }
}

fn normalize_image(image: Option<String>) -> Option<String> {
    image.filter(|image| !image.is_empty())
}

/// Signed-in users may found one club, global admins any number. The
/// founder becomes the club's only admin.
pub async fn create(user: Option<&UserAuthData>, dto: NewClubDto, store: &dyn DocumentStore) -> Result<Club, AppError> {
    let user = access::require_user(user)?;
    if dto.name.trim().is_empty() {
        return Err(AppError::bad_request("club name must not be empty"));
    }
    check_image(dto.image.as_deref())?;

    let user_id = user.user_id.to_string();
    if !access::is_global_admin(Some(user), store).await?
        && !db::club::administered_by(&user_id, store).await?.is_empty()
    {
        return Err(AppError::Unauthorized);
    }

    let mut club = Club {
        id: String::new(),
        name: dto.name,
        category: dto.category,
        color: dto.color,
        description: dto.description,
        image: normalize_image(dto.image),
        admins: vec![user_id],
        created_at: Some(Utc::now()),
    };
    club.id = db::club::create(&club, store).await?;
    info!("club {} '{}' created by {}", club.id, club.name, user.email);
    Ok(club)
}

pub async fn update(
    id: &str,
    dto: UpdateClubDto,
    user: Option<&UserAuthData>,
    store: &dyn DocumentStore,
) -> Result<Club, AppError> {
    access::require_user(user)?;
    check_image(dto.image.as_deref())?;
    let existing = db::club::get_by_id(id, store).await?;
    let global_admin = access::is_global_admin(user, store).await?;
    access::require(
        access::club_capabilities(user, Some(&existing), global_admin),
        Capabilities::EDIT_CLUB,
    )?;

    let club = Club {
        name: dto.name,
        category: dto.category,
        color: dto.color,
        description: dto.description,
        image: match dto.image {
            Some(image) => normalize_image(Some(image)),
            None => existing.image.clone(),
        },
        ..existing
    };
    db::club::set_fields(&club, store).await?;
    Ok(club)
}

pub async fn get_detail(id: &str, user: Option<&UserAuthData>, store: &dyn DocumentStore) -> Result<ClubDetail, AppError> {
    let club = db::club::get_by_id(id, store).await?;
    let global_admin = access::is_global_admin(user, store).await?;
    let capabilities = access::club_capabilities(user, Some(&club), global_admin).into();
    Ok(ClubDetail { club, capabilities })
}

/// Category must match exactly; the search term is a case-insensitive
/// substring of the name.
pub fn filter_clubs(clubs: Vec<Club>, filter: &ClubFilterQuery) -> Vec<Club> {
    let category = filter.category.as_deref().filter(|c| !c.is_empty() && *c != "all");
    let term = filter.search.as_deref().unwrap_or("").trim().to_lowercase();
    clubs
        .into_iter()
        .filter(|club| category.map_or(true, |category| club.category == category))
        .filter(|club| term.is_empty() || club.name.to_lowercase().contains(&term))
        .collect()
}

pub async fn list(
    filter: &ClubFilterQuery,
    user: Option<&UserAuthData>,
    store: &dyn DocumentStore,
) -> Result<Vec<ClubSummary>, AppError> {
    let clubs = filter_clubs(db::club::get_all(store).await?, filter);
    Ok(clubs
        .into_iter()
        .map(|club| ClubSummary {
            is_my_club: user.map_or(false, |user| access::has_role(user, &club)),
            club,
        })
        .collect())
}

/// Adds a signed-up user, found by e-mail, to the club's admins.
pub async fn add_admin(
    club_id: &str,
    email: &str,
    user: Option<&UserAuthData>,
    store: &dyn DocumentStore,
) -> Result<Club, AppError> {
    access::require_user(user)?;
    let mut club = db::club::get_by_id(club_id, store).await?;
    let global_admin = access::is_global_admin(user, store).await?;
    access::require(
        access::club_capabilities(user, Some(&club), global_admin),
        Capabilities::MANAGE_ADMINS,
    )?;

    let new_admin = db::user::get_by_email(&email.trim().to_lowercase(), store)
        .await?
        .ok_or_else(|| AppError::not_found("user"))?;
    let new_admin_id = new_admin.id.to_string();
    if !club.admins.contains(&new_admin_id) {
        club.admins.push(new_admin_id);
        db::club::set_admins(&club.id, &club.admins, store).await?;
        info!("{} is now an admin of club {}", new_admin.email, club.id);
    }
    Ok(club)
}
