//! Adapters from upstream response envelopes to [`FetchResult`].
//!
//! Each tolerated upstream shape gets exactly one adapter; callers pick the
//! shape their upstream speaks instead of probing for whichever field exists.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::domain::entities::query::FetchResult;
use crate::usecase::ports::fetch::FetchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamShape {
    /// `{ "items": [...], "totalCount": n }`
    ItemsTotalCount,
    /// `{ "data": [...], "total": n }`
    DataTotal,
    /// `{ "items": [...], "pagination": { "total": n } }`
    ItemsPagination,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemsTotalCount<R> {
    items: Vec<R>,
    total_count: u64,
}

#[derive(Deserialize)]
struct DataTotal<R> {
    data: Vec<R>,
    total: u64,
}

#[derive(Deserialize)]
struct PaginationTotal {
    total: u64,
}

#[derive(Deserialize)]
struct ItemsPagination<R> {
    items: Vec<R>,
    pagination: PaginationTotal,
}

impl UpstreamShape {
    pub fn adapt<R: DeserializeOwned>(self, body: &str) -> Result<FetchResult<R>, FetchError> {
        match self {
            UpstreamShape::ItemsTotalCount => from_items_total_count(body),
            UpstreamShape::DataTotal => from_data_total(body),
            UpstreamShape::ItemsPagination => from_items_pagination(body),
        }
    }
}

fn malformed(err: serde_json::Error) -> FetchError {
    FetchError::failed(format!("malformed response: {err}"))
}

pub fn from_items_total_count<R: DeserializeOwned>(body: &str) -> Result<FetchResult<R>, FetchError> {
    let envelope: ItemsTotalCount<R> = serde_json::from_str(body).map_err(malformed)?;
    Ok(FetchResult::new(envelope.items, envelope.total_count))
}

pub fn from_data_total<R: DeserializeOwned>(body: &str) -> Result<FetchResult<R>, FetchError> {
    let envelope: DataTotal<R> = serde_json::from_str(body).map_err(malformed)?;
    Ok(FetchResult::new(envelope.data, envelope.total))
}

pub fn from_items_pagination<R: DeserializeOwned>(body: &str) -> Result<FetchResult<R>, FetchError> {
    let envelope: ItemsPagination<R> = serde_json::from_str(body).map_err(malformed)?;
    Ok(FetchResult::new(envelope.items, envelope.pagination.total))
}
