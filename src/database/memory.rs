use super::{DocumentStore, QueryOptions, StoreError, UpdateSummary, USERS};
use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Bson, Document};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct State {
    collections: HashMap<String, Vec<Document>>,
    unique: HashMap<String, Vec<String>>,
}

/// In-process document store with the subset of MongoDB semantics the
/// marketplace relies on: equality filters, unique indexes, multi-key sort
/// and limit. Documents keep insertion order as their natural order.
pub struct MemoryStore {
    state: Mutex<State>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Empty store carrying the same unique index as the MongoDB adapter.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
        .with_unique_index(USERS, "email")
    }

    pub fn with_unique_index(self, collection: &str, field: &str) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state
                .unique
                .entry(collection.to_string())
                .or_default()
                .push(field.to_string());
        }
        self
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Query("memory store lock poisoned".to_string()))
    }
}

impl State {
    /// Returns the first unique field of `collection` on which `candidate`
    /// collides with a stored document other than `skip`.
    fn unique_violation(&self, collection: &str, candidate: &Document, skip: Option<usize>) -> Option<String> {
        let fields = self.unique.get(collection)?;
        let documents = self.collections.get(collection)?;

        fields
            .iter()
            .find(|field| {
                let value = candidate.get(field.as_str()).unwrap_or(&Bson::Null);
                documents
                    .iter()
                    .enumerate()
                    .filter(|(index, _)| Some(*index) != skip)
                    .any(|(_, existing)| {
                        values_equal(existing.get(field.as_str()).unwrap_or(&Bson::Null), value)
                    })
            })
            .cloned()
    }
}

fn numeric(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(n) => Some(f64::from(*n)),
        Bson::Int64(n) => Some(*n as f64),
        Bson::Double(n) => Some(*n),
        _ => None,
    }
}

fn values_equal(left: &Bson, right: &Bson) -> bool {
    match (numeric(left), numeric(right)) {
        (Some(l), Some(r)) => l == r,
        _ => left == right,
    }
}

fn matches(document: &Document, filter: &Document) -> bool {
    filter.iter().all(|(key, expected)| match document.get(key) {
        Some(actual) => values_equal(actual, expected),
        None => matches!(expected, Bson::Null),
    })
}

/// Position of a value in MongoDB's cross-type sort order.
fn type_rank(value: Option<&Bson>) -> u8 {
    match value {
        None | Some(Bson::Null) | Some(Bson::Undefined) => 0,
        Some(Bson::Int32(_)) | Some(Bson::Int64(_)) | Some(Bson::Double(_)) | Some(Bson::Decimal128(_)) => 1,
        Some(Bson::String(_)) | Some(Bson::Symbol(_)) => 2,
        Some(Bson::Document(_)) => 3,
        Some(Bson::Array(_)) => 4,
        Some(Bson::Binary(_)) => 5,
        Some(Bson::ObjectId(_)) => 6,
        Some(Bson::Boolean(_)) => 7,
        Some(Bson::DateTime(_)) => 8,
        Some(Bson::Timestamp(_)) => 9,
        Some(Bson::RegularExpression(_)) => 10,
        Some(_) => 11,
    }
}

fn compare_values(left: Option<&Bson>, right: Option<&Bson>) -> Ordering {
    let rank = type_rank(left).cmp(&type_rank(right));
    if rank != Ordering::Equal {
        return rank;
    }

    match (left, right) {
        (Some(Bson::String(l)), Some(Bson::String(r))) => l.cmp(r),
        (Some(Bson::ObjectId(l)), Some(Bson::ObjectId(r))) => l.cmp(r),
        (Some(Bson::Boolean(l)), Some(Bson::Boolean(r))) => l.cmp(r),
        (Some(Bson::DateTime(l)), Some(Bson::DateTime(r))) => l.cmp(r),
        (Some(l), Some(r)) => match (numeric(l), numeric(r)) {
            (Some(l), Some(r)) => l.partial_cmp(&r).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
        _ => Ordering::Equal,
    }
}

fn sort_documents(documents: &mut [Document], sort: &Document) {
    documents.sort_by(|a, b| {
        for (field, direction) in sort {
            let descending = numeric(direction).is_some_and(|d| d < 0.0);
            let ordering = compare_values(a.get(field), b.get(field));
            let ordering = if descending { ordering.reverse() } else { ordering };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find(
        &self,
        collection: &str,
        filter: Document,
        options: QueryOptions,
    ) -> Result<Vec<Document>, StoreError> {
        let state = self.lock()?;
        let mut found: Vec<Document> = state
            .collections
            .get(collection)
            .map(|documents| documents.iter().filter(|d| matches(d, &filter)).cloned().collect())
            .unwrap_or_default();
        drop(state);

        if let Some(sort) = &options.sort {
            sort_documents(&mut found, sort);
        }
        if let Some(limit) = options.limit.filter(|limit| *limit > 0) {
            found.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }
        Ok(found)
    }

    async fn find_one(&self, collection: &str, filter: Document) -> Result<Option<Document>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .collections
            .get(collection)
            .and_then(|documents| documents.iter().find(|d| matches(d, &filter)).cloned()))
    }

    async fn insert_one(&self, collection: &str, document: Document) -> Result<Bson, StoreError> {
        let mut state = self.lock()?;

        let id = document
            .get("_id")
            .cloned()
            .unwrap_or_else(|| Bson::ObjectId(ObjectId::new()));
        let mut stored = Document::new();
        stored.insert("_id", id.clone());
        for (key, value) in document {
            if key != "_id" {
                stored.insert(key, value);
            }
        }

        if let Some(field) = state.unique_violation(collection, &stored, None) {
            return Err(StoreError::DuplicateKey(format!("{}.{}", collection, field)));
        }

        state
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(stored);
        Ok(id)
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        changes: Document,
    ) -> Result<UpdateSummary, StoreError> {
        let mut state = self.lock()?;

        let Some(position) = state
            .collections
            .get(collection)
            .and_then(|documents| documents.iter().position(|d| matches(d, &filter)))
        else {
            return Ok(UpdateSummary::default());
        };

        let mut updated = state.collections[collection][position].clone();
        let mut modified = false;
        for (key, value) in changes {
            if updated.get(&key) != Some(&value) {
                modified = true;
                updated.insert(key, value);
            }
        }

        if let Some(field) = state.unique_violation(collection, &updated, Some(position)) {
            return Err(StoreError::DuplicateKey(format!("{}.{}", collection, field)));
        }

        if let Some(documents) = state.collections.get_mut(collection) {
            documents[position] = updated;
        }

        Ok(UpdateSummary {
            matched_count: 1,
            modified_count: u64::from(modified),
        })
    }

    async fn delete_one(&self, collection: &str, filter: Document) -> Result<u64, StoreError> {
        let mut state = self.lock()?;
        let Some(documents) = state.collections.get_mut(collection) else {
            return Ok(0);
        };

        match documents.iter().position(|d| matches(d, &filter)) {
            Some(position) => {
                documents.remove(position);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.lock().map(|_| ())
    }

    async fn shutdown(&self) {
        log::debug!("Memory store dropped on shutdown");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[tokio::test]
    async fn insert_generates_leading_object_id() {
        let store = MemoryStore::new();
        let id = store.insert_one("things", doc! { "name": "lamp" }).await.unwrap();

        let stored = store.find_one("things", doc! {}).await.unwrap().unwrap();
        assert!(matches!(id, Bson::ObjectId(_)));
        assert_eq!(stored.keys().next().map(String::as_str), Some("_id"));
        assert_eq!(stored.get("_id"), Some(&id));
    }

    #[tokio::test]
    async fn filters_compare_numbers_across_types() {
        let store = MemoryStore::new();
        store.insert_one("bids", doc! { "bid_price": 10_i32 }).await.unwrap();
        store.insert_one("bids", doc! { "bid_price": 20.0 }).await.unwrap();

        let found = store
            .find("bids", doc! { "bid_price": 10_i64 }, QueryOptions::default())
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn sorts_descending_and_limits() {
        let store = MemoryStore::new();
        for price in [10_i64, 50, 30] {
            store.insert_one("bids", doc! { "bid_price": price }).await.unwrap();
        }
        store.insert_one("bids", doc! { "bid_price": 40.5 }).await.unwrap();

        let found = store
            .find(
                "bids",
                doc! {},
                QueryOptions::sorted_by(doc! { "bid_price": -1 }).with_limit(3),
            )
            .await
            .unwrap();

        let prices: Vec<f64> = found
            .iter()
            .filter_map(|d| d.get("bid_price").and_then(numeric))
            .collect();
        assert_eq!(prices, vec![50.0, 40.5, 30.0]);
    }

    #[tokio::test]
    async fn missing_sort_field_orders_first_ascending() {
        let store = MemoryStore::new();
        store.insert_one("products", doc! { "title": "b", "rank": 2 }).await.unwrap();
        store.insert_one("products", doc! { "title": "a" }).await.unwrap();

        let found = store
            .find("products", doc! {}, QueryOptions::sorted_by(doc! { "rank": 1 }))
            .await
            .unwrap();
        assert_eq!(found[0].get_str("title").unwrap(), "a");
    }

    #[tokio::test]
    async fn unique_index_rejects_duplicates() {
        let store = MemoryStore::new();
        store.insert_one(USERS, doc! { "email": "a@x.com" }).await.unwrap();

        let duplicate = store.insert_one(USERS, doc! { "email": "a@x.com" }).await;
        assert!(matches!(duplicate, Err(StoreError::DuplicateKey(_))));

        let other_case = store.insert_one(USERS, doc! { "email": "A@x.com" }).await;
        assert!(other_case.is_ok());
    }

    #[tokio::test]
    async fn update_reports_matched_and_modified() {
        let store = MemoryStore::new();
        let id = store.insert_one("products", doc! { "title": "lamp" }).await.unwrap();

        let same = store
            .update_one("products", doc! { "_id": id.clone() }, doc! { "title": "lamp" })
            .await
            .unwrap();
        assert_eq!(same, UpdateSummary { matched_count: 1, modified_count: 0 });

        let changed = store
            .update_one("products", doc! { "_id": id.clone() }, doc! { "title": "desk", "color": "red" })
            .await
            .unwrap();
        assert_eq!(changed, UpdateSummary { matched_count: 1, modified_count: 1 });

        let missing = store
            .update_one("products", doc! { "_id": ObjectId::new() }, doc! { "title": "x" })
            .await
            .unwrap();
        assert_eq!(missing, UpdateSummary::default());
    }

    #[tokio::test]
    async fn delete_reports_count() {
        let store = MemoryStore::new();
        let id = store.insert_one("bids", doc! { "bid_price": 1 }).await.unwrap();

        assert_eq!(store.delete_one("bids", doc! { "_id": id.clone() }).await.unwrap(), 1);
        assert_eq!(store.delete_one("bids", doc! { "_id": id }).await.unwrap(), 0);
        assert_eq!(store.delete_one("nowhere", doc! {}).await.unwrap(), 0);
    }
}
