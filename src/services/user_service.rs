use crate::database::{DocumentStore, StoreError, USERS};
use crate::models::{new_user, CreateUserOutcome};
use mongodb::bson::Document;

/// Registers a user once per email. Uniqueness is enforced by the store's
/// unique index, so concurrent registrations cannot both insert.
pub async fn create_user(store: &dyn DocumentStore, user: Document) -> Result<CreateUserOutcome, StoreError> {
    match store.insert_one(USERS, new_user(user)).await {
        Ok(id) => Ok(CreateUserOutcome::Created(id)),
        Err(StoreError::DuplicateKey(key)) => {
            log::debug!("User already registered ({})", key);
            Ok(CreateUserOutcome::AlreadyExists)
        }
        Err(e) => Err(e),
    }
}
