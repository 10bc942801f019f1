use sha3::{Digest, Sha3_256};
use uuid::Uuid;

pub fn get_sha3_256_hash(data: &str) -> String {
   let mut hasher = Sha3_256::default();
   hasher.update(data);
   format!("{:X}", hasher.finalize())
}

/// Stored as `salt$hash`.
pub fn hash_password(pwd: &str) -> String {
   let salt = Uuid::new_v4().simple().to_string();
   let hash = get_sha3_256_hash(&format!("{salt}{pwd}"));
   format!("{salt}${hash}")
}

pub fn verify_password(pwd: &str, stored: &str) -> bool {
   match stored.split_once('$') {
      Some((salt, hash)) => get_sha3_256_hash(&format!("{salt}{pwd}")) == hash,
      None => false,
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn verifies_only_the_original_password() {
      let stored = hash_password("hunter22");
      assert!(verify_password("hunter22", &stored));
      assert!(!verify_password("hunter23", &stored));
      assert!(!verify_password("hunter22", "no-salt-separator"));
   }

   #[test]
   fn salts_each_hash() {
      assert_ne!(hash_password("same"), hash_password("same"));
   }
}
