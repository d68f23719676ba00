//! Where activity telemetry comes from.
//!
//! [`StravaClient`] talks to the fitness site with the athlete's session
//! cookie. [`StaticStreamSource`] serves canned activities for tests and the
//! seeder.

use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use reqwest::{StatusCode, header};
use serde::Deserialize;
use serde_json::Value;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::{debug, warn};

use crate::{
    errors::AppError,
    models::{ActivityMetadata, ActivitySummary, StreamTriple},
};

pub const DEFAULT_BASE_URL: &str = "https://www.strava.com";
pub const PAGE_SIZE: usize = 30;
pub const FETCH_ATTEMPTS: u32 = 3;
/// Listed activities need more climbing than this to be worth processing.
pub const MIN_LISTED_ELEVATION_GAIN: f64 = 50.0;
const RIDE: &str = "Ride";
const UNTITLED: &str = "Untitled Activity";

#[async_trait]
pub trait StreamSource: Send + Sync {
    /// Streams for one activity; `None` when altitude or time is unavailable.
    async fn fetch_streams(&self, activity_id: &str) -> Result<Option<StreamTriple>, AppError>;

    /// The athlete's rides with meaningful climbing, newest first, at most
    /// `max` of them.
    async fn list_activities(&self, max: usize) -> Result<Vec<ActivitySummary>, AppError>;
}

pub struct StravaClient {
    client: reqwest::Client,
    base_url: String,
    session_cookie: Option<String>,
    retry_backoff: Duration,
}

impl StravaClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session_cookie: None,
            retry_backoff: Duration::from_millis(1000),
        }
    }

    /// Sends `cookie` verbatim as the `Cookie` header on every request.
    pub fn with_session_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.session_cookie = Some(cookie.into());
        self
    }

    /// Base delay between stream fetch attempts; attempt `n` waits `n` times
    /// this long.
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let request = self.client.get(url);
        match &self.session_cookie {
            Some(cookie) => request.header(header::COOKIE, cookie),
            None => request,
        }
    }

    async fn fetch_streams_once(&self, url: &str) -> Result<Option<Value>, AppError> {
        let response = self.get(url).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await?)),
            status => Err(AppError::UpstreamStatus(status.as_u16())),
        }
    }

    async fn fetch_page(&self, page: usize) -> Result<TrainingActivitiesPage, AppError> {
        let url = format!(
            "{}/athlete/training_activities?new_activity_only=false&page={page}&per_page={PAGE_SIZE}",
            self.base_url
        );
        let response = self
            .get(&url)
            .header("X-Requested-With", "XMLHttpRequest")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::UpstreamStatus(response.status().as_u16()));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl StreamSource for StravaClient {
    async fn fetch_streams(&self, activity_id: &str) -> Result<Option<StreamTriple>, AppError> {
        let url = format!(
            "{}/activities/{activity_id}/streams?stream_types[]=altitude&stream_types[]=time&stream_types[]=distance",
            self.base_url
        );

        let mut attempt = 1;
        let body = loop {
            match self.fetch_streams_once(&url).await {
                Ok(body) => break body,
                Err(e) if attempt < FETCH_ATTEMPTS => {
                    warn!("Stream fetch for {activity_id} failed (attempt {attempt}): {e}");
                    tokio::time::sleep(self.retry_backoff * attempt).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        };

        let Some(body) = body else {
            debug!("No streams for activity {activity_id}");
            return Ok(None);
        };
        let streams = parse_streams(&body)?;
        if let Some(triple) = &streams
            && !triple.is_aligned()
        {
            warn!("Discarding misaligned streams for activity {activity_id}");
            return Ok(None);
        }
        Ok(streams)
    }

    async fn list_activities(&self, max: usize) -> Result<Vec<ActivitySummary>, AppError> {
        let mut activities = Vec::new();
        let mut page = 1;

        while activities.len() < max {
            let listing = match self.fetch_page(page).await {
                Ok(listing) => listing,
                Err(e) if page == 1 => return Err(e),
                Err(e) => {
                    warn!("Stopping activity listing at page {page}: {e}");
                    break;
                }
            };
            let fetched = listing.models.len();
            activities.extend(listing.into_rides());

            if fetched < PAGE_SIZE {
                break;
            }
            page += 1;
        }

        activities.truncate(max);
        debug!("Listed {} activities over {page} page(s)", activities.len());
        Ok(activities)
    }
}

/// Accepts either an object keyed by stream type or an array of
/// `{type, data}` entries; each stream may be `{data: [...]}` or a bare array.
pub fn parse_streams(body: &Value) -> Result<Option<StreamTriple>, AppError> {
    let find = |kind: &str| match body {
        Value::Object(map) => map.get(kind),
        Value::Array(items) => items
            .iter()
            .find(|s| s.get("type").and_then(Value::as_str) == Some(kind)),
        _ => None,
    };
    let samples = |stream: &Value| -> Result<Vec<f64>, AppError> {
        let data = stream.get("data").unwrap_or(stream);
        Ok(Vec::<f64>::deserialize(data)?)
    };

    let (Some(altitude), Some(time)) = (find("altitude"), find("time")) else {
        return Ok(None);
    };
    let distance = find("distance").map(samples).transpose()?;

    Ok(Some(StreamTriple::new(
        samples(altitude)?,
        samples(time)?,
        distance,
    )))
}

#[derive(Debug, Deserialize)]
pub struct TrainingActivitiesPage {
    #[serde(default)]
    pub models: Vec<TrainingActivity>,
}

#[derive(Debug, Deserialize)]
pub struct TrainingActivity {
    pub id: Value,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub sport_type: Option<String>,
    pub elevation_gain: Option<f64>,
    pub start_date: Option<String>,
}

impl TrainingActivitiesPage {
    /// Rides that climb more than [`MIN_LISTED_ELEVATION_GAIN`].
    pub fn into_rides(self) -> impl Iterator<Item = ActivitySummary> {
        self.models
            .into_iter()
            .filter(|a| {
                a.sport_type.as_deref() == Some(RIDE)
                    && a.elevation_gain.is_some_and(|g| g > MIN_LISTED_ELEVATION_GAIN)
            })
            .map(TrainingActivity::into_summary)
    }
}

impl TrainingActivity {
    pub fn into_summary(self) -> ActivitySummary {
        let id = match self.id {
            Value::String(s) => s,
            other => other.to_string(),
        };
        let date = self
            .start_date
            .as_deref()
            .and_then(|d| OffsetDateTime::parse(d, &Rfc3339).ok())
            .unwrap_or_else(OffsetDateTime::now_utc);

        ActivitySummary {
            id,
            metadata: ActivityMetadata {
                name: self.name.unwrap_or_else(|| UNTITLED.to_string()),
                sport_type: self.sport_type.unwrap_or_else(|| RIDE.to_string()),
                date,
            },
            elevation_gain: self.elevation_gain,
        }
    }
}

/// In-memory source; activities are listed in insertion order.
#[derive(Debug, Clone, Default)]
pub struct StaticStreamSource {
    activities: Vec<ActivitySummary>,
    streams: HashMap<String, StreamTriple>,
    failing: Vec<String>,
}

impl StaticStreamSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_activity(
        mut self,
        summary: ActivitySummary,
        streams: Option<StreamTriple>,
    ) -> Self {
        if let Some(streams) = streams {
            self.streams.insert(summary.id.clone(), streams);
        }
        self.activities.push(summary);
        self
    }

    /// Fetching streams for `activity_id` will fail with an upstream error.
    pub fn with_failure(mut self, activity_id: impl Into<String>) -> Self {
        self.failing.push(activity_id.into());
        self
    }
}

#[async_trait]
impl StreamSource for StaticStreamSource {
    async fn fetch_streams(&self, activity_id: &str) -> Result<Option<StreamTriple>, AppError> {
        if self.failing.iter().any(|id| id == activity_id) {
            return Err(AppError::UpstreamStatus(StatusCode::SERVICE_UNAVAILABLE.as_u16()));
        }
        Ok(self.streams.get(activity_id).cloned())
    }

    async fn list_activities(&self, max: usize) -> Result<Vec<ActivitySummary>, AppError> {
        Ok(self.activities.iter().take(max).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::macros::datetime;

    use super::*;

    #[test]
    fn parses_keyed_streams_with_data_wrappers() {
        let body = json!({
            "altitude": {"data": [100, 101.5, 103]},
            "time": {"data": [0, 10, 20]},
            "distance": {"data": [0.0, 40.2, 80.9]},
            "latlng": {"data": [[45.0, 6.0], [45.1, 6.1], [45.2, 6.2]]}
        });
        let streams = parse_streams(&body).unwrap().unwrap();
        assert_eq!(streams.elevation, vec![100.0, 101.5, 103.0]);
        assert_eq!(streams.time, vec![0.0, 10.0, 20.0]);
        assert_eq!(streams.distance, Some(vec![0.0, 40.2, 80.9]));
    }

    #[test]
    fn parses_bare_arrays_and_typed_lists() {
        let keyed = json!({"altitude": [1, 2], "time": [0, 1]});
        let streams = parse_streams(&keyed).unwrap().unwrap();
        assert_eq!(streams.elevation, vec![1.0, 2.0]);
        assert!(!streams.has_distance());

        let listed = json!([
            {"type": "time", "data": [0, 5, 10]},
            {"type": "altitude", "data": [7, 8, 9]},
            {"type": "distance", "data": [0, 20, 45]}
        ]);
        let streams = parse_streams(&listed).unwrap().unwrap();
        assert_eq!(streams.time, vec![0.0, 5.0, 10.0]);
        assert_eq!(streams.elevation, vec![7.0, 8.0, 9.0]);
        assert_eq!(streams.distance, Some(vec![0.0, 20.0, 45.0]));
    }

    #[test]
    fn stationary_samples_keep_the_activity() {
        let body = json!({
            "altitude": [100, 110, 120, 130],
            "time": [0, 10, 20, 30],
            "distance": [0, 50, 50, 100]
        });
        let streams = parse_streams(&body).unwrap().unwrap();
        assert!(streams.is_aligned());
        assert_eq!(streams.distance, Some(vec![0.0, 50.0, 50.0, 100.0]));
    }

    #[test]
    fn missing_altitude_or_time_yields_none() {
        assert_eq!(parse_streams(&json!({"time": [0, 1]})).unwrap(), None);
        assert_eq!(
            parse_streams(&json!([{"type": "altitude", "data": [1]}])).unwrap(),
            None
        );
        assert_eq!(parse_streams(&json!("nope")).unwrap(), None);
    }

    #[test]
    fn malformed_samples_are_an_error() {
        let body = json!({"altitude": {"data": ["high", "low"]}, "time": [0, 1]});
        assert!(matches!(
            parse_streams(&body),
            Err(AppError::Serialization(_))
        ));
    }

    #[test]
    fn listing_keeps_only_climbing_rides() {
        let page: TrainingActivitiesPage = serde_json::from_value(json!({
            "models": [
                {"id": 1, "name": "Col de la Madeleine", "type": "Ride", "elevation_gain": 1500.0,
                 "start_date": "2024-07-14T07:30:00Z"},
                {"id": 2, "name": "Canal", "type": "Ride", "elevation_gain": 12.0},
                {"id": 3, "name": "Trail run", "type": "Run", "elevation_gain": 400.0},
                {"id": "4", "type": "Ride", "elevation_gain": 51.0},
                {"id": 5, "type": "Ride"}
            ]
        }))
        .unwrap();

        let rides: Vec<_> = page.into_rides().collect();
        assert_eq!(
            rides.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
            ["1", "4"]
        );
        assert_eq!(rides[0].metadata.name, "Col de la Madeleine");
        assert_eq!(rides[0].metadata.date, datetime!(2024-07-14 07:30 UTC));
        assert_eq!(rides[1].metadata.name, "Untitled Activity");
        assert_eq!(rides[1].metadata.sport_type, "Ride");
    }

    #[tokio::test]
    async fn static_source_serves_canned_activities() {
        let summary = |id: &str| ActivitySummary {
            id: id.into(),
            metadata: ActivityMetadata {
                name: format!("Ride {id}"),
                sport_type: "Ride".into(),
                date: datetime!(2024-01-01 0:00 UTC),
            },
            elevation_gain: Some(300.0),
        };
        let streams = StreamTriple::new(vec![1.0, 2.0], vec![0.0, 1.0], None);
        let source = StaticStreamSource::new()
            .with_activity(summary("a"), Some(streams.clone()))
            .with_activity(summary("b"), None)
            .with_activity(summary("c"), Some(streams.clone()))
            .with_failure("c");

        assert_eq!(source.fetch_streams("a").await.unwrap(), Some(streams));
        assert_eq!(source.fetch_streams("b").await.unwrap(), None);
        assert!(source.fetch_streams("c").await.is_err());
        assert_eq!(source.list_activities(2).await.unwrap().len(), 2);
    }
}
