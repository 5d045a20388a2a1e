//! GraphQL transport for the externally-operated collection indexer.
//!
//! Responses are validated into explicit records here, at the boundary, so
//! the trending derivation never sees untyped query output.

use anyhow::{Context, Result, anyhow};
use reqwest::{Client, Response};
use rustc_hash::FxHashSet;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tokio::time::sleep;

use crate::trending::{CollectionSnapshot, Period, SortMetric};

pub const DEFAULT_API_URL: &str = "https://api.indexer.xyz/graphql";

const MAX_RETRIES: usize = 3;

const TRENDING_QUERY: &str = "\
query trendingCollections($period: trending_period!, $offset: Int, $limit: Int, $orderBy: [collections_trending_order_by!]) {
  sui {
    collections_trending(period: $period, offset: $offset, limit: $limit, order_by: $orderBy) {
      id
      slug
      title
      cover_url
      floor
      verified
      current_trades_count
      previous_trades_count
      current_usd_volume
      previous_usd_volume
      current_volume
      previous_volume
    }
  }
}";

/// Endpoint and credentials, resolved from flags or environment by the CLI.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub api_user: Option<String>,
}

/// Query parameters, supplied explicitly by the caller per request.
#[derive(Debug, Clone, Copy)]
pub struct TrendingRequest {
    pub period: Period,
    pub sort_by: SortMetric,
    pub offset: u32,
    pub limit: u32,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    data: Option<ResponseData>,
    errors: Option<Vec<GraphqlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ResponseData {
    sui: SuiNamespace,
}

#[derive(Debug, Deserialize)]
struct SuiNamespace {
    collections_trending: Vec<ApiCollection>,
}

#[derive(Debug, Deserialize)]
struct ApiCollection {
    id: String,
    slug: Option<String>,
    title: Option<String>,
    cover_url: Option<String>,
    #[serde(default, deserialize_with = "sparse_f64")]
    floor: Option<f64>,
    #[serde(default)]
    verified: bool,
    #[serde(default)]
    current_trades_count: f64,
    #[serde(default)]
    previous_trades_count: f64,
    #[serde(default)]
    current_usd_volume: f64,
    #[serde(default)]
    previous_usd_volume: f64,
    #[serde(default)]
    current_volume: f64,
    #[serde(default)]
    previous_volume: f64,
}

impl ApiCollection {
    fn into_snapshot(self) -> CollectionSnapshot {
        let title = self
            .title
            .filter(|value| !value.trim().is_empty())
            .or(self.slug)
            .unwrap_or_else(|| self.id.clone());
        CollectionSnapshot {
            id: self.id,
            title,
            cover_url: self.cover_url.unwrap_or_default(),
            verified: self.verified,
            floor: self.floor,
            current_trades_count: self.current_trades_count,
            previous_trades_count: self.previous_trades_count,
            current_usd_volume: self.current_usd_volume,
            previous_usd_volume: self.previous_usd_volume,
            current_volume: self.current_volume,
            previous_volume: self.previous_volume,
        }
    }
}

/// The indexer reports floor as a number, a numeric string, or null
/// depending on listing state. Anything non-numeric is treated as absent.
fn sparse_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_as_f64))
}

fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Fetches the trending snapshot list for the requested window, validated
/// and deduplicated by collection id (first occurrence wins).
pub async fn fetch_trending(
    client: &Client,
    config: &IndexerConfig,
    request: &TrendingRequest,
) -> Result<Vec<CollectionSnapshot>> {
    let body = build_request_body(request);
    let response = post_with_retry(client, config, &body)
        .await?
        .json::<GraphqlResponse>()
        .await
        .with_context(|| format!("failed to decode indexer response from {}", config.url))?;

    if let Some(errors) = response.errors
        && !errors.is_empty()
    {
        let detail = errors
            .into_iter()
            .map(|error| error.message)
            .collect::<Vec<_>>()
            .join(" | ");
        return Err(anyhow!("indexer returned GraphQL errors: {detail}"));
    }

    let collections = response
        .data
        .ok_or_else(|| anyhow!("indexer response carried neither data nor errors"))?
        .sui
        .collections_trending;

    Ok(dedup_by_id(collections))
}

fn build_request_body(request: &TrendingRequest) -> Value {
    let mut order_by = serde_json::Map::new();
    order_by.insert(
        request.sort_by.order_by_field().to_string(),
        Value::String("desc".to_string()),
    );
    json!({
        "query": TRENDING_QUERY,
        "variables": {
            "period": request.period.query_value(),
            "offset": request.offset,
            "limit": request.limit,
            "orderBy": [Value::Object(order_by)],
        },
    })
}

async fn post_with_retry(client: &Client, config: &IndexerConfig, body: &Value) -> Result<Response> {
    let mut last_err: Option<anyhow::Error> = None;
    for attempt in 1..=MAX_RETRIES {
        let mut request = client.post(&config.url).json(body);
        if let Some(key) = config.api_key.as_deref() {
            request = request.header("x-api-key", key);
        }
        if let Some(user) = config.api_user.as_deref() {
            request = request.header("x-api-user", user);
        }

        match request.send().await {
            Ok(response) => match response.error_for_status() {
                Ok(success) => return Ok(success),
                Err(err) => last_err = Some(err.into()),
            },
            Err(err) => last_err = Some(err.into()),
        }

        if attempt < MAX_RETRIES {
            sleep(calculate_backoff(attempt)).await;
        }
    }

    let detail = last_err
        .as_ref()
        .map_or_else(|| "unknown error".to_string(), describe_error);
    Err(anyhow!(
        "failed to query {} after {MAX_RETRIES} attempts: {detail}",
        config.url
    ))
}

fn calculate_backoff(attempt: usize) -> Duration {
    const MAX_BACKOFF_EXPONENT: u32 = 10;
    let exponent = u32::try_from(attempt)
        .unwrap_or(MAX_BACKOFF_EXPONENT)
        .min(MAX_BACKOFF_EXPONENT);
    Duration::from_secs(2_u64.saturating_pow(exponent))
}

fn describe_error(error: &anyhow::Error) -> String {
    let mut pieces: Vec<String> = Vec::new();
    for (idx, cause) in error.chain().enumerate() {
        let text = cause.to_string();
        if text.is_empty() {
            continue;
        }
        if idx == 0 {
            pieces.push(text);
        } else {
            pieces.push(format!("caused by {text}"));
        }
    }

    if pieces.is_empty() {
        format!("{error:?}")
    } else {
        pieces.join(" | ")
    }
}

fn dedup_by_id(collections: Vec<ApiCollection>) -> Vec<CollectionSnapshot> {
    let mut seen: FxHashSet<String> = FxHashSet::default();
    let mut snapshots = Vec::with_capacity(collections.len());
    for collection in collections {
        if !seen.insert(collection.id.clone()) {
            continue;
        }
        snapshots.push(collection.into_snapshot());
    }
    snapshots
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "data": {
            "sui": {
                "collections_trending": [
                    {
                        "id": "0xaa",
                        "slug": "fuddies",
                        "title": "Fuddies",
                        "cover_url": "https://img.example/fuddies.png",
                        "floor": "149.5",
                        "verified": true,
                        "current_trades_count": 321,
                        "previous_trades_count": 300,
                        "current_usd_volume": 1234567.0,
                        "previous_usd_volume": 1000000.0,
                        "current_volume": 52000,
                        "previous_volume": 65000
                    },
                    {
                        "id": "0xbb",
                        "slug": "unlisted",
                        "title": null,
                        "cover_url": null,
                        "floor": null,
                        "current_usd_volume": 42.0
                    },
                    {
                        "id": "0xaa",
                        "slug": "fuddies-dup",
                        "title": "Duplicate entry"
                    }
                ]
            }
        }
    }"#;

    fn parse_fixture(raw: &str) -> GraphqlResponse {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn schema_validates_and_defaults_sparse_fields() {
        let response = parse_fixture(FIXTURE);
        let collections = response.data.unwrap().sui.collections_trending;
        assert_eq!(collections.len(), 3);

        let fuddies = &collections[0];
        assert_eq!(fuddies.floor, Some(149.5));
        assert!(fuddies.verified);
        assert!((fuddies.current_usd_volume - 1_234_567.0).abs() < f64::EPSILON);

        let unlisted = &collections[1];
        assert_eq!(unlisted.floor, None);
        assert!(!unlisted.verified);
        assert!(unlisted.previous_usd_volume.abs() < f64::EPSILON);
    }

    #[test]
    fn dedup_keeps_first_occurrence_and_falls_back_to_slug() {
        let response = parse_fixture(FIXTURE);
        let snapshots = dedup_by_id(response.data.unwrap().sui.collections_trending);
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].title, "Fuddies");
        assert_eq!(snapshots[1].title, "unlisted");
        assert_eq!(snapshots[1].cover_url, "");
    }

    #[test]
    fn non_numeric_floor_is_absent_not_an_error() {
        let raw = r#"{"data":{"sui":{"collections_trending":[
            {"id":"0xcc","title":"Odd floor","floor":"n/a"}
        ]}}}"#;
        let snapshots = dedup_by_id(parse_fixture(raw).data.unwrap().sui.collections_trending);
        assert_eq!(snapshots[0].floor, None);
    }

    #[test]
    fn graphql_errors_are_decoded() {
        let raw = r#"{"errors":[{"message":"field 'collections_trending' not found"}]}"#;
        let response = parse_fixture(raw);
        assert!(response.data.is_none());
        let errors = response.errors.unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("not found"));
    }

    #[test]
    fn request_body_carries_explicit_variables() {
        let body = build_request_body(&TrendingRequest {
            period: Period::Days7,
            sort_by: SortMetric::UsdVolume,
            offset: 0,
            limit: 25,
        });
        assert_eq!(body["variables"]["period"], "days_7");
        assert_eq!(body["variables"]["limit"], 25);
        assert_eq!(body["variables"]["orderBy"][0]["usd_volume"], "desc");
        assert!(
            body["query"]
                .as_str()
                .unwrap()
                .contains("collections_trending")
        );
    }
}
