use log::info;

use crate::{
   db::{self, DocumentStore},
   errors::AppError,
   models::AdminRecord,
};

use super::{access, auth::UserAuthData};

const ADMIN_ROLE: &str = "admin";

/// Only global admins may grow the allow-list.
pub async fn add_global_admin(
   email: &str,
   user: Option<&UserAuthData>,
   store: &dyn DocumentStore,
) -> Result<(), AppError> {
   let caller = access::require_user(user)?;
   if !access::is_global_admin(Some(caller), store).await? {
      return Err(AppError::Unauthorized);
   }
   let email = email.trim();
   if !email.contains('@') {
      return Err(AppError::bad_request(format!("'{email}' is not an e-mail address")));
   }
   let record = AdminRecord { role: ADMIN_ROLE.to_string(), added_by: caller.email.clone() };
   db::admin::create(email, &record, store).await?;
   info!("{} granted global admin to {}", caller.email, email);
   Ok(())
}

/// Writes an allow-list entry for every configured bootstrap address.
pub async fn seed_bootstrap_admins(emails: &[String], store: &dyn DocumentStore) -> Result<(), AppError> {
   let record = AdminRecord { role: ADMIN_ROLE.to_string(), added_by: "bootstrap".to_string() };
   for email in emails {
      db::admin::create(email, &record, store).await?;
   }
   if !emails.is_empty() {
      info!("seeded {} bootstrap admins", emails.len());
   }
   Ok(())
}

#[cfg(test)]
mod tests {
   use uuid::Uuid;

   use super::*;
   use crate::db::MemoryStore;

   #[actix_rt::test]
   async fn bootstrap_admins_can_promote_others() {
      let store = MemoryStore::new();
      seed_bootstrap_admins(&["Root@Example.com".to_string()], &store).await.unwrap();
      let root = UserAuthData { user_id: Uuid::new_v4(), email: "root@example.com".to_string() };
      let other = UserAuthData { user_id: Uuid::new_v4(), email: "other@example.com".to_string() };

      assert_eq!(
         add_global_admin("third@example.com", Some(&other), &store).await.unwrap_err(),
         AppError::Unauthorized
      );
      add_global_admin("Other@Example.com", Some(&root), &store).await.unwrap();
      assert!(db::admin::is_admin("other@example.com", &store).await.unwrap());
      assert!(matches!(
         add_global_admin("nobody", Some(&root), &store).await,
         Err(AppError::BadClientData { .. })
      ));
      assert_eq!(
         add_global_admin("x@example.com", None, &store).await.unwrap_err(),
         AppError::Unauthenticated
      );
   }
}
