use super::{DocumentStore, QueryOptions, StoreError, UpdateSummary, BIDS, PRODUCTS, USERS};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Collection, Database, IndexModel};
use std::time::Duration;
use tokio::sync::OnceCell;

const DUPLICATE_KEY_CODE: i32 = 11000;

struct Connection {
    client: Client,
    db: Database,
}

/// MongoDB-backed store. The connection is opened on first use and shared
/// by every later operation; concurrent first callers wait on the same
/// attempt, and a failed attempt is retried by the next caller.
pub struct MongoStore {
    uri: String,
    db_name: String,
    connection: OnceCell<Connection>,
}

impl MongoStore {
    pub fn new(uri: impl Into<String>, db_name: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            db_name: db_name.into(),
            connection: OnceCell::new(),
        }
    }

    async fn database(&self) -> Result<&Database, StoreError> {
        let connection = self.connection.get_or_try_init(|| self.connect()).await?;
        Ok(&connection.db)
    }

    async fn collection(&self, name: &str) -> Result<Collection<Document>, StoreError> {
        Ok(self.database().await?.collection::<Document>(name))
    }

    async fn connect(&self) -> Result<Connection, StoreError> {
        log::info!("🔌 Connecting to MongoDB database: {}", self.db_name);

        let mut client_options = ClientOptions::parse(self.uri.as_str())
            .await
            .map_err(connection_error)?;

        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(5);
        client_options.max_idle_time = Some(Duration::from_secs(300));
        client_options.connect_timeout = Some(Duration::from_secs(5));
        client_options.server_selection_timeout = Some(Duration::from_secs(5));

        let client = Client::with_options(client_options).map_err(connection_error)?;

        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(connection_error)?;

        let db = client.database(&self.db_name);
        ensure_indexes(&db).await?;

        log::info!("✅ Connected to MongoDB");
        Ok(Connection { client, db })
    }
}

/// Creates the indexes the marketplace relies on. The unique index on
/// `users.email` is what makes user registration idempotent.
async fn ensure_indexes(db: &Database) -> Result<(), StoreError> {
    log::info!("🔧 Creating database indexes...");

    let unique_email = IndexModel::builder()
        .keys(doc! { "email": 1 })
        .options(IndexOptions::builder().unique(true).build())
        .build();

    if let Err(e) = db.collection::<Document>(USERS).create_index(unique_email).await {
        let err = unique_email_index_error(error_code(&e), &e.to_string());
        log::error!("❌ {}", err);
        return Err(err);
    }
    log::info!("   ✅ Index created: users(email) unique");

    let lookups = [
        (PRODUCTS, doc! { "email": 1 }, "products(email)"),
        (PRODUCTS, doc! { "created_at": -1 }, "products(created_at)"),
        (BIDS, doc! { "buyer_email": 1 }, "bids(buyer_email)"),
        (BIDS, doc! { "product": 1, "bid_price": -1 }, "bids(product, bid_price)"),
    ];

    for (collection, keys, label) in lookups {
        let index = IndexModel::builder().keys(keys).build();
        match db.collection::<Document>(collection).create_index(index).await {
            Ok(_) => log::info!("   ✅ Index created: {}", label),
            Err(e) => log::warn!("   ⚠️  Index {} could not be built: {}", label, e),
        }
    }

    log::info!("✅ Database indexes ready");
    Ok(())
}

/// Duplicate emails already stored make the unique index build fail on
/// every connection attempt, so the store stays unusable until they are removed.
fn unique_email_index_error(code: Option<i32>, cause: &str) -> StoreError {
    if code == Some(DUPLICATE_KEY_CODE) {
        StoreError::Connection(format!(
            "users(email) unique index cannot be built, the users collection holds duplicate emails: {}",
            cause
        ))
    } else {
        StoreError::Connection(format!("users(email) unique index: {}", cause))
    }
}

fn error_code(err: &MongoError) -> Option<i32> {
    match err.kind.as_ref() {
        ErrorKind::Command(command_error) => Some(command_error.code),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => Some(write_error.code),
        _ => None,
    }
}

fn connection_error(err: MongoError) -> StoreError {
    StoreError::Connection(err.to_string())
}

fn query_error(err: MongoError) -> StoreError {
    if let ErrorKind::Write(WriteFailure::WriteError(write_error)) = err.kind.as_ref() {
        if write_error.code == DUPLICATE_KEY_CODE {
            return StoreError::DuplicateKey(write_error.message.clone());
        }
    }
    StoreError::Query(err.to_string())
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn find(
        &self,
        collection: &str,
        filter: Document,
        options: QueryOptions,
    ) -> Result<Vec<Document>, StoreError> {
        let collection = self.collection(collection).await?;

        let mut find = collection.find(filter);
        if let Some(sort) = options.sort {
            find = find.sort(sort);
        }
        if let Some(limit) = options.limit {
            find = find.limit(limit);
        }

        let cursor = find.await.map_err(query_error)?;
        cursor.try_collect().await.map_err(query_error)
    }

    async fn find_one(&self, collection: &str, filter: Document) -> Result<Option<Document>, StoreError> {
        self.collection(collection)
            .await?
            .find_one(filter)
            .await
            .map_err(query_error)
    }

    async fn insert_one(&self, collection: &str, document: Document) -> Result<Bson, StoreError> {
        let result = self
            .collection(collection)
            .await?
            .insert_one(document)
            .await
            .map_err(query_error)?;
        Ok(result.inserted_id)
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        changes: Document,
    ) -> Result<UpdateSummary, StoreError> {
        let collection = self.collection(collection).await?;

        // An empty `$set` is rejected by older servers; report the match only.
        if changes.is_empty() {
            let matched = collection.find_one(filter).await.map_err(query_error)?;
            return Ok(UpdateSummary {
                matched_count: u64::from(matched.is_some()),
                modified_count: 0,
            });
        }

        let result = collection
            .update_one(filter, doc! { "$set": changes })
            .await
            .map_err(query_error)?;

        Ok(UpdateSummary {
            matched_count: result.matched_count,
            modified_count: result.modified_count,
        })
    }

    async fn delete_one(&self, collection: &str, filter: Document) -> Result<u64, StoreError> {
        let result = self
            .collection(collection)
            .await?
            .delete_one(filter)
            .await
            .map_err(query_error)?;
        Ok(result.deleted_count)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.database()
            .await?
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(connection_error)?;
        Ok(())
    }

    async fn shutdown(&self) {
        if let Some(connection) = self.connection.get() {
            log::info!("🔌 Closing MongoDB connection");
            connection.client.clone().shutdown().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn shutdown_without_connection_is_noop() {
        let store = MongoStore::new("mongodb://localhost:27017", "smart_deals_test");
        store.shutdown().await;
        assert!(store.connection.get().is_none());
    }

    #[test]
    fn duplicate_emails_are_named_when_the_unique_index_fails() {
        let cause = "E11000 duplicate key error collection: smart_deals.users index: email_1";

        let StoreError::Connection(message) = unique_email_index_error(Some(DUPLICATE_KEY_CODE), cause) else {
            panic!("expected a connection error");
        };
        assert!(message.contains("duplicate emails"));
        assert!(message.contains(cause));

        let StoreError::Connection(message) = unique_email_index_error(Some(13), "not authorized") else {
            panic!("expected a connection error");
        };
        assert!(!message.contains("duplicate emails"));
        assert!(message.contains("not authorized"));
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_duplicate_email_is_rejected_by_index() {
        dotenv::dotenv().ok();
        let uri = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
        let store = MongoStore::new(uri, "smart_deals_test");

        store
            .delete_one(USERS, doc! { "email": "dup@x.com" })
            .await
            .unwrap();
        store
            .insert_one(USERS, doc! { "email": "dup@x.com" })
            .await
            .unwrap();

        let second = store.insert_one(USERS, doc! { "email": "dup@x.com" }).await;
        assert!(matches!(second, Err(StoreError::DuplicateKey(_))));

        store.shutdown().await;
    }
}
