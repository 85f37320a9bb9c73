//! Typed views of stored records and per-request read options

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::Record;

/// Options carried by every read or write, as they arrive on a query string
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Comma-separated whitelist for the returned columns
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<String>,
    /// `"true"` includes soft-deleted rows
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted: Option<String>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the returned columns
    pub fn with_columns(mut self, columns: impl Into<String>) -> Self {
        self.columns = Some(columns.into());
        self
    }

    /// Include soft-deleted rows
    pub fn with_deleted(mut self) -> Self {
        self.deleted = Some("true".to_string());
        self
    }
}

/// A user who bookmarks subreddits
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Redditor {
    pub id: String,
    pub email_address: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// IANA zone name, e.g. `Europe/Berlin`
    pub time_zone_identifier: Option<String>,
    pub email_enabled: Option<bool>,
    pub create_date: f64,
    pub update_date: f64,
    pub delete_date: Option<f64>,
}

/// A subreddit bookmarked by a redditor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Subreddit {
    pub id: String,
    pub redditor_id: String,
    /// Subreddit name as used in its URL, without the `r/` prefix
    pub subreddit: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub favorite: Option<bool>,
    pub create_date: f64,
    pub update_date: f64,
    pub delete_date: Option<f64>,
}

macro_rules! impl_record_model {
    ($model:ty) => {
        impl $model {
            /// Decode from a row returned by the store
            ///
            /// Fields missing from the row (e.g. filtered out by a column
            /// whitelist) take their default value.
            pub fn from_record(record: Record) -> Result<Self> {
                Ok(serde_json::from_value(serde_json::Value::Object(record))?)
            }

            /// Creation time
            pub fn created_at(&self) -> Option<DateTime<Utc>> {
                epoch_to_datetime(self.create_date)
            }

            /// Last modification time
            pub fn updated_at(&self) -> Option<DateTime<Utc>> {
                epoch_to_datetime(self.update_date)
            }

            /// Soft-delete time, if the row is deleted
            pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
                self.delete_date.and_then(epoch_to_datetime)
            }

            /// Whether the row has been soft-deleted
            pub fn is_deleted(&self) -> bool {
                self.delete_date.is_some()
            }
        }

        impl TryFrom<Record> for $model {
            type Error = crate::error::StoreError;

            fn try_from(record: Record) -> Result<Self> {
                Self::from_record(record)
            }
        }
    };
}

impl_record_model!(Redditor);
impl_record_model!(Subreddit);

/// Convert fractional epoch seconds to a UTC timestamp
pub fn epoch_to_datetime(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    let whole = seconds.floor();
    let nanos = ((seconds - whole) * 1_000_000_000.0).round() as u32;
    DateTime::from_timestamp(whole as i64, nanos.min(999_999_999))
}
