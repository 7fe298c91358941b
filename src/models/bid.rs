use super::document::ID;
use mongodb::bson::Document;

/// Reference to `Product._id`, stored as the hex string the client sent.
pub const BID_PRODUCT: &str = "product";
pub const BUYER_EMAIL: &str = "buyer_email";
pub const BID_PRICE: &str = "bid_price";

/// Bids are inserted as sent. The product reference and the price are not
/// validated against existing products or earlier bids.
pub fn new_bid(mut fields: Document) -> Document {
    fields.remove(ID);
    fields
}
