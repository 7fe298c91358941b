use crate::database::{DocumentStore, QueryOptions, StoreError, UpdateSummary, PRODUCTS};
use crate::models::{id_filter, new_product, product_patch, CREATED_AT, LATEST_PRODUCTS_LIMIT, PRODUCT_OWNER};
use mongodb::bson::{doc, Bson, DateTime, Document};

/// All products, or the ones listed by `owner`, in store order.
pub async fn list_products(store: &dyn DocumentStore, owner: Option<&str>) -> Result<Vec<Document>, StoreError> {
    let filter = owner.map(|email| doc! { PRODUCT_OWNER: email }).unwrap_or_default();
    store.find(PRODUCTS, filter, QueryOptions::default()).await
}

/// The six most recently created products, newest first.
pub async fn latest_products(store: &dyn DocumentStore) -> Result<Vec<Document>, StoreError> {
    let options = QueryOptions::sorted_by(doc! { CREATED_AT: -1 }).with_limit(LATEST_PRODUCTS_LIMIT);
    store.find(PRODUCTS, doc! {}, options).await
}

pub async fn get_product(store: &dyn DocumentStore, id: &str) -> Result<Option<Document>, StoreError> {
    let Some(filter) = id_filter(id) else {
        return Ok(None);
    };
    store.find_one(PRODUCTS, filter).await
}

pub async fn create_product(store: &dyn DocumentStore, fields: Document) -> Result<Bson, StoreError> {
    store
        .insert_one(PRODUCTS, new_product(fields, DateTime::now()))
        .await
}

/// Merges `fields` into the product. Last write wins.
pub async fn update_product(
    store: &dyn DocumentStore,
    id: &str,
    fields: Document,
) -> Result<UpdateSummary, StoreError> {
    let Some(filter) = id_filter(id) else {
        return Ok(UpdateSummary::default());
    };
    store.update_one(PRODUCTS, filter, product_patch(fields)).await
}

/// Deletes by id. Bids placed on the product are left in place.
pub async fn delete_product(store: &dyn DocumentStore, id: &str) -> Result<u64, StoreError> {
    let Some(filter) = id_filter(id) else {
        return Ok(0);
    };
    store.delete_one(PRODUCTS, filter).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{MemoryStore, BIDS};
    use crate::models::id_string;

    #[tokio::test]
    async fn latest_products_returns_six_newest_first() {
        let store = MemoryStore::new();
        for day in [3_i64, 7, 1, 8, 5, 2, 6, 4] {
            store
                .insert_one(
                    PRODUCTS,
                    doc! { "title": format!("day {}", day), CREATED_AT: DateTime::from_millis(day * 86_400_000) },
                )
                .await
                .unwrap();
        }

        let latest = latest_products(&store).await.unwrap();
        let titles: Vec<&str> = latest.iter().map(|p| p.get_str("title").unwrap()).collect();

        assert_eq!(titles, vec!["day 8", "day 7", "day 6", "day 5", "day 4", "day 3"]);
    }

    #[tokio::test]
    async fn lists_filter_by_owner() {
        let store = MemoryStore::new();
        create_product(&store, doc! { "email": "a@x.com", "title": "Lamp" }).await.unwrap();
        create_product(&store, doc! { "email": "b@x.com", "title": "Desk" }).await.unwrap();
        create_product(&store, doc! { "email": "a@x.com", "title": "Chair" }).await.unwrap();

        assert_eq!(list_products(&store, None).await.unwrap().len(), 3);

        let mine = list_products(&store, Some("a@x.com")).await.unwrap();
        let titles: Vec<&str> = mine.iter().map(|p| p.get_str("title").unwrap()).collect();
        assert_eq!(titles, vec!["Lamp", "Chair"]);

        assert!(list_products(&store, Some("nobody@x.com")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn patch_round_trip_changes_only_patched_fields() {
        let store = MemoryStore::new();
        let id = create_product(&store, doc! { "email": "a@x.com", "title": "Lamp", "price": 25 })
            .await
            .unwrap();
        let id = id_string(&id);

        let before = get_product(&store, &id).await.unwrap().unwrap();

        let summary = update_product(
            &store,
            &id,
            doc! { "price": 30, "created_at": DateTime::from_millis(0) },
        )
        .await
        .unwrap();
        assert_eq!(summary, UpdateSummary { matched_count: 1, modified_count: 1 });

        let after = get_product(&store, &id).await.unwrap().unwrap();
        assert_eq!(after.get_i32("price").unwrap(), 30);
        for field in ["_id", "email", "title", "created_at"] {
            assert_eq!(after.get(field), before.get(field), "{} changed", field);
        }
        assert_eq!(after.len(), before.len());
    }

    #[tokio::test]
    async fn patch_stores_unknown_fields() {
        let store = MemoryStore::new();
        let id = id_string(&create_product(&store, doc! { "title": "Lamp" }).await.unwrap());

        update_product(&store, &id, doc! { "condition": "used" }).await.unwrap();

        let product = get_product(&store, &id).await.unwrap().unwrap();
        assert_eq!(product.get_str("condition").unwrap(), "used");
    }

    #[tokio::test]
    async fn missing_products_are_not_errors() {
        let store = MemoryStore::new();
        let absent = mongodb::bson::oid::ObjectId::new().to_hex();

        assert!(get_product(&store, &absent).await.unwrap().is_none());
        assert!(get_product(&store, "malformed").await.unwrap().is_none());
        assert_eq!(update_product(&store, &absent, doc! { "x": 1 }).await.unwrap(), UpdateSummary::default());
        assert_eq!(delete_product(&store, &absent).await.unwrap(), 0);
        assert_eq!(delete_product(&store, "malformed").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn deleting_a_product_keeps_its_bids() {
        let store = MemoryStore::new();
        let id = id_string(&create_product(&store, doc! { "title": "Lamp" }).await.unwrap());
        store
            .insert_one(BIDS, doc! { "product": id.clone(), "bid_price": 10 })
            .await
            .unwrap();

        assert_eq!(delete_product(&store, &id).await.unwrap(), 1);

        let bids = store
            .find(BIDS, doc! { "product": id }, QueryOptions::default())
            .await
            .unwrap();
        assert_eq!(bids.len(), 1);
    }
}
