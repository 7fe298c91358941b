use super::document::ID;
use mongodb::bson::{DateTime, Document};

pub const PRODUCT_OWNER: &str = "email";
pub const CREATED_AT: &str = "created_at";
/// `latest_products` always returns at most this many products.
pub const LATEST_PRODUCTS_LIMIT: i64 = 6;

/// Builds a product for insertion: the store assigns `_id` and the server
/// stamps `created_at`, whatever the client sent.
pub fn new_product(mut fields: Document, now: DateTime) -> Document {
    fields.remove(ID);
    fields.insert(CREATED_AT, now);
    fields
}

/// Fields a partial update may set. Identity and creation time are fixed.
pub fn product_patch(mut fields: Document) -> Document {
    fields.remove(ID);
    fields.remove(CREATED_AT);
    fields
}
