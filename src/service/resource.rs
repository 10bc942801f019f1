use chrono::Utc;
use log::info;
use url::Url;

use crate::{
   db::{self, DocumentStore},
   dto::NewResourceDto,
   errors::AppError,
   models::Resource,
};

use super::{access::{self, Capabilities}, auth::UserAuthData};

/// Links and PDFs shared by club admins.
pub async fn add(
   club_id: &str,
   dto: NewResourceDto,
   user: Option<&UserAuthData>,
   store: &dyn DocumentStore,
) -> Result<Resource, AppError> {
   access::require_user(user)?;
   if dto.title.trim().is_empty() {
      return Err(AppError::bad_request("resource title must not be empty"));
   }
   let url = Url::parse(dto.url.trim())
      .map_err(|err| AppError::bad_request(format!("resource url is invalid: {err}")))?;
   let caps = access::load_capabilities(user, club_id, store).await?;
   access::require(caps, Capabilities::ADD_RESOURCES)?;

   let mut resource = Resource {
      id: String::new(),
      club_id: club_id.to_string(),
      title: dto.title,
      kind: dto.kind,
      url: url.to_string(),
      created_at: Utc::now(),
   };
   resource.id = db::resource::create(&resource, store).await?;
   info!("resource {} added to club {}", resource.id, club_id);
   Ok(resource)
}

pub async fn list(club_id: &str, store: &dyn DocumentStore) -> Result<Vec<Resource>, AppError> {
   db::club::get_by_id(club_id, store).await?;
   db::resource::get_by_club(club_id, store).await
}

#[cfg(test)]
mod tests {
   use uuid::Uuid;

   use super::*;
   use crate::{db::MemoryStore, models::{Club, ResourceKind}};

   fn dto(url: &str) -> NewResourceDto {
      NewResourceDto { title: "Rules".to_string(), kind: ResourceKind::Pdf, url: url.to_string() }
   }

   #[actix_rt::test]
   async fn only_club_admins_add_resources() {
      let store = MemoryStore::new();
      let admin = UserAuthData { user_id: Uuid::new_v4(), email: "a@example.com".to_string() };
      let club = Club {
         id: String::new(),
         name: "Chess".to_string(),
         category: String::new(),
         color: String::new(),
         description: String::new(),
         image: None,
         admins: vec![admin.user_id.to_string()],
         created_at: None,
      };
      let club_id = db::club::create(&club, &store).await.unwrap();

      let added = add(&club_id, dto("https://example.com/rules.pdf"), Some(&admin), &store).await.unwrap();
      assert_eq!(list(&club_id, &store).await.unwrap(), vec![added]);

      let stranger = UserAuthData { user_id: Uuid::new_v4(), email: "s@example.com".to_string() };
      assert_eq!(
         add(&club_id, dto("https://example.com/x"), Some(&stranger), &store).await.unwrap_err(),
         AppError::Unauthorized
      );
      assert!(matches!(
         add(&club_id, dto("not a url"), Some(&admin), &store).await,
         Err(AppError::BadClientData { .. })
      ));
      assert!(matches!(list("missing", &store).await, Err(AppError::NotFound { .. })));
   }
}
