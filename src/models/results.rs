use super::document::id_string;
use crate::database::UpdateSummary;
use mongodb::bson::Bson;
use serde::{Deserialize, Serialize};

/// Acknowledgement for an insert, shaped like the document store's own.
#[derive(Debug, Serialize, Deserialize, PartialEq, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InsertResult {
    pub acknowledged: bool,
    pub inserted_id: String,
}

impl InsertResult {
    pub fn new(id: &Bson) -> Self {
        InsertResult {
            acknowledged: true,
            inserted_id: id_string(id),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_count: u64,
    pub upserted_id: Option<String>,
}

impl From<UpdateSummary> for UpdateResult {
    fn from(summary: UpdateSummary) -> Self {
        UpdateResult {
            acknowledged: true,
            matched_count: summary.matched_count,
            modified_count: summary.modified_count,
            upserted_count: 0,
            upserted_id: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

impl DeleteResult {
    pub fn new(deleted_count: u64) -> Self {
        DeleteResult {
            acknowledged: true,
            deleted_count,
        }
    }
}

/// Short human-readable outcome, used for errors and for the
/// user-already-exists success.
#[derive(Debug, Serialize, Deserialize, PartialEq, utoipa::ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        MessageResponse {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TokenResponse {
    pub token: String,
}
