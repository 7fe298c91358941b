use crate::database::{DocumentStore, QueryOptions, StoreError, BIDS};
use crate::models::{id_filter, new_bid, BID_PRICE, BID_PRODUCT, BUYER_EMAIL};
use mongodb::bson::{doc, Bson, Document};

/// All bids, or the ones placed by `buyer`, in store order.
pub async fn list_bids(store: &dyn DocumentStore, buyer: Option<&str>) -> Result<Vec<Document>, StoreError> {
    let filter = buyer.map(|email| doc! { BUYER_EMAIL: email }).unwrap_or_default();
    store.find(BIDS, filter, QueryOptions::default()).await
}

/// Bids on one product, highest `bid_price` first.
pub async fn bids_for_product(store: &dyn DocumentStore, product_id: &str) -> Result<Vec<Document>, StoreError> {
    store
        .find(
            BIDS,
            doc! { BID_PRODUCT: product_id },
            QueryOptions::sorted_by(doc! { BID_PRICE: -1 }),
        )
        .await
}

pub async fn create_bid(store: &dyn DocumentStore, fields: Document) -> Result<Bson, StoreError> {
    store.insert_one(BIDS, new_bid(fields)).await
}

pub async fn delete_bid(store: &dyn DocumentStore, id: &str) -> Result<u64, StoreError> {
    let Some(filter) = id_filter(id) else {
        return Ok(0);
    };
    store.delete_one(BIDS, filter).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::models::id_string;

    fn prices(bids: &[Document]) -> Vec<f64> {
        bids.iter()
            .map(|bid| match bid.get(BID_PRICE) {
                Some(Bson::Int32(n)) => f64::from(*n),
                Some(Bson::Int64(n)) => *n as f64,
                Some(Bson::Double(n)) => *n,
                other => panic!("unexpected bid_price {:?}", other),
            })
            .collect()
    }

    #[tokio::test]
    async fn product_bids_are_sorted_highest_first() {
        let store = MemoryStore::new();
        for price in [10, 50, 30] {
            create_bid(&store, doc! { "product": "p1", "buyer_email": "b@x.com", "bid_price": price })
                .await
                .unwrap();
        }
        create_bid(&store, doc! { "product": "p2", "bid_price": 99 }).await.unwrap();

        let bids = bids_for_product(&store, "p1").await.unwrap();
        assert_eq!(prices(&bids), vec![50.0, 30.0, 10.0]);
    }

    #[tokio::test]
    async fn sorting_mixes_integer_and_decimal_prices() {
        let store = MemoryStore::new();
        create_bid(&store, doc! { "product": "p1", "bid_price": 10_i64 }).await.unwrap();
        create_bid(&store, doc! { "product": "p1", "bid_price": 10.5 }).await.unwrap();
        create_bid(&store, doc! { "product": "p1", "bid_price": 9_i32 }).await.unwrap();

        let bids = bids_for_product(&store, "p1").await.unwrap();
        assert_eq!(prices(&bids), vec![10.5, 10.0, 9.0]);
    }

    #[tokio::test]
    async fn lists_filter_by_buyer() {
        let store = MemoryStore::new();
        create_bid(&store, doc! { "product": "p1", "buyer_email": "a@x.com", "bid_price": 1 }).await.unwrap();
        create_bid(&store, doc! { "product": "p1", "buyer_email": "b@x.com", "bid_price": 2 }).await.unwrap();

        assert_eq!(list_bids(&store, None).await.unwrap().len(), 2);

        let mine = list_bids(&store, Some("a@x.com")).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].get_str(BUYER_EMAIL).unwrap(), "a@x.com");
    }

    #[tokio::test]
    async fn bids_need_no_existing_product_or_higher_price() {
        let store = MemoryStore::new();
        create_bid(&store, doc! { "product": "does-not-exist", "bid_price": 100 }).await.unwrap();
        create_bid(&store, doc! { "product": "does-not-exist", "bid_price": 1 }).await.unwrap();

        assert_eq!(bids_for_product(&store, "does-not-exist").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryStore::new();
        let id = id_string(&create_bid(&store, doc! { "product": "p1", "bid_price": 5 }).await.unwrap());

        assert_eq!(delete_bid(&store, &id).await.unwrap(), 1);
        assert_eq!(delete_bid(&store, &id).await.unwrap(), 0);
    }
}
