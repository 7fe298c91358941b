use mongodb::bson::{Bson, Document};

pub const USER_EMAIL: &str = "email";
pub const USER_EXISTS_MESSAGE: &str = "User already exists.";

/// Result of registering a user. An existing email is a success, not a
/// conflict error.
#[derive(Debug, Clone, PartialEq)]
pub enum CreateUserOutcome {
    Created(Bson),
    AlreadyExists,
}

/// The registration email, when present and non-empty. Compared
/// case-sensitively everywhere.
pub fn registration_email(user: &Document) -> Option<&str> {
    user.get_str(USER_EMAIL).ok().filter(|email| !email.is_empty())
}

/// Builds a user for insertion; the store assigns `_id`.
pub fn new_user(mut fields: Document) -> Document {
    fields.remove(super::document::ID);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[test]
    fn registration_requires_a_non_empty_string_email() {
        assert_eq!(registration_email(&doc! { "email": "a@x.com" }), Some("a@x.com"));
        assert_eq!(registration_email(&doc! { "email": "" }), None);
        assert_eq!(registration_email(&doc! { "email": 42 }), None);
        assert_eq!(registration_email(&doc! { "name": "Ana" }), None);
    }
}
