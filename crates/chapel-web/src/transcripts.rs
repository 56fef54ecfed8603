//! `/api/transcripts`: listing with filter, search, sort and pagination,
//! plus creation of new records.

use std::cmp::Ordering;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::ApiError;
use crate::{now_millis, now_rfc3339, today, AppState};

const RESOURCE: &str = "transcripts";
const FILE: &str = "transcripts.json";
const DEFAULT_LIMIT: usize = 50;
const REQUIRED_FIELDS: &[&str] = &["title", "speaker"];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranscriptQuery {
    pub category: Option<String>,
    pub speaker: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Newest,
    Oldest,
    Popular,
    Title,
}

impl SortOrder {
    /// Unknown values sort newest first.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "oldest" => Self::Oldest,
            "popular" => Self::Popular,
            "title" => Self::Title,
            _ => Self::Newest,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub items_per_page: usize,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<TranscriptQuery>,
) -> Result<Json<Value>, ApiError> {
    let path = state.data_file(FILE);
    let contents = match tokio::fs::read_to_string(&path).await {
        Ok(contents) => contents,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::DataFileMissing {
                resource: RESOURCE,
                file: FILE,
            })
        }
        Err(error) => return Err(read_failed(error)),
    };
    let records = parse_records(&contents).map_err(read_failed)?;

    let server_timestamp = now_rfc3339();
    let mut transcripts = records
        .into_iter()
        .filter_map(|record| with_defaults(record, &server_timestamp))
        .collect::<Vec<_>>();

    transcripts = filter_transcripts(transcripts, &query);
    if let Some(sort) = query.sort.as_deref() {
        sort_transcripts(&mut transcripts, SortOrder::parse(sort));
    }

    let page = parse_positive(query.page.as_deref()).unwrap_or(1);
    let limit = parse_positive(query.limit.as_deref()).unwrap_or(DEFAULT_LIMIT);
    let (page_items, pagination) = paginate(transcripts, page, limit);

    Ok(Json(json!({
        "transcripts": page_items,
        "pagination": pagination,
        "filters": {
            "category": query.category,
            "speaker": query.speaker,
            "search": query.search,
            "sort": query.sort.as_deref().unwrap_or("newest"),
        },
        "timestamp": now_rfc3339(),
    })))
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<Map<String, Value>>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if REQUIRED_FIELDS
        .iter()
        .any(|field| !body.get(*field).is_some_and(is_present))
    {
        return Err(ApiError::MissingFields {
            required: REQUIRED_FIELDS,
        });
    }

    let _guard = state.write_lock.lock().await;
    let path = state.data_file(FILE);
    let contents = tokio::fs::read_to_string(&path).await.map_err(write_failed)?;
    let mut records = parse_records(&contents).map_err(write_failed)?;

    let mut transcript = Map::new();
    transcript.insert(String::from("id"), json!(now_millis()));
    transcript.extend(body);
    if !transcript.get("date").is_some_and(is_present) {
        transcript.insert(String::from("date"), json!(today()));
    }
    transcript.insert(String::from("downloads"), json!(0));
    transcript.insert(String::from("featured"), json!(false));
    let transcript = Value::Object(transcript);

    records.insert(0, transcript.clone());
    let encoded = serde_json::to_string_pretty(&records).map_err(write_failed)?;
    tokio::fs::write(&path, encoded).await.map_err(write_failed)?;
    tracing::info!(id = %transcript["id"], "transcript created");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Transcript created successfully",
            "transcript": transcript,
        })),
    ))
}

fn parse_records(contents: &str) -> Result<Vec<Value>, String> {
    match serde_json::from_str::<Value>(contents).map_err(|e| e.to_string())? {
        Value::Array(records) => Ok(records),
        _ => Err(String::from("transcripts data must be a JSON array")),
    }
}

/// Fills server-side defaults; non-object records are dropped.
pub fn with_defaults(record: Value, server_timestamp: &str) -> Option<Value> {
    let Value::Object(mut record) = record else {
        return None;
    };

    record.insert(String::from("serverTimestamp"), json!(server_timestamp));
    let defaults = [
        ("id", json!(generated_id())),
        ("title", json!("Untitled Transcript")),
        ("speaker", json!("Unknown Speaker")),
        ("date", json!(today())),
    ];
    for (field, default) in defaults {
        if !record.get(field).is_some_and(is_present) {
            record.insert(field.to_owned(), default);
        }
    }

    Some(Value::Object(record))
}

pub fn filter_transcripts(transcripts: Vec<Value>, query: &TranscriptQuery) -> Vec<Value> {
    let category = query
        .category
        .as_deref()
        .filter(|category| !category.is_empty() && *category != "All");
    let speaker = query
        .speaker
        .as_deref()
        .filter(|speaker| !speaker.is_empty())
        .map(str::to_lowercase);
    let search = query
        .search
        .as_deref()
        .filter(|search| !search.is_empty())
        .map(str::to_lowercase);

    transcripts
        .into_iter()
        .filter(|t| category.map_or(true, |category| text(t, "category") == category))
        .filter(|t| {
            speaker
                .as_deref()
                .map_or(true, |speaker| text(t, "speaker").to_lowercase().contains(speaker))
        })
        .filter(|t| {
            search.as_deref().map_or(true, |term| {
                ["title", "description", "speaker", "category"]
                    .iter()
                    .any(|field| text(t, field).to_lowercase().contains(term))
            })
        })
        .collect()
}

pub fn sort_transcripts(transcripts: &mut [Value], order: SortOrder) {
    transcripts.sort_by(|a, b| match order {
        // ISO dates order lexicographically
        SortOrder::Newest => text(b, "date").cmp(text(a, "date")),
        SortOrder::Oldest => text(a, "date").cmp(text(b, "date")),
        SortOrder::Popular => downloads(b)
            .partial_cmp(&downloads(a))
            .unwrap_or(Ordering::Equal),
        SortOrder::Title => {
            let (left, right) = (text(a, "title"), text(b, "title"));
            left.to_lowercase()
                .cmp(&right.to_lowercase())
                .then_with(|| left.cmp(right))
        }
    });
}

pub fn paginate(transcripts: Vec<Value>, page: usize, limit: usize) -> (Vec<Value>, Pagination) {
    let total_items = transcripts.len();
    let start = (page - 1).saturating_mul(limit);
    let end = start.saturating_add(limit);

    let items = transcripts
        .into_iter()
        .skip(start)
        .take(limit)
        .collect::<Vec<_>>();

    let pagination = Pagination {
        current_page: page,
        total_pages: total_items.div_ceil(limit),
        total_items,
        items_per_page: limit,
        has_next_page: end < total_items,
        has_prev_page: page > 1,
    };
    (items, pagination)
}

fn parse_positive(raw: Option<&str>) -> Option<usize> {
    raw?.trim().parse::<usize>().ok().filter(|value| *value > 0)
}

fn text<'a>(value: &'a Value, field: &str) -> &'a str {
    value.get(field).and_then(Value::as_str).unwrap_or_default()
}

fn downloads(value: &Value) -> f64 {
    value.get("downloads").and_then(Value::as_f64).unwrap_or(0.0)
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(text) => !text.is_empty(),
        _ => true,
    }
}

fn generated_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(9);
    id
}

fn read_failed(error: impl ToString) -> ApiError {
    ApiError::ReadFailed {
        resource: RESOURCE,
        message: error.to_string(),
    }
}

fn write_failed(error: impl ToString) -> ApiError {
    ApiError::WriteFailed {
        resource: "transcript",
        message: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Value> {
        vec![
            json!({"title": "Walking in Faith", "speaker": "Rev. Kayode", "category": "Faith",
                   "description": "On trust", "date": "2024-03-01", "downloads": 10}),
            json!({"title": "abiding Grace", "speaker": "Rev. Helen", "category": "Grace",
                   "description": "Unmerited favor", "date": "2024-05-12", "downloads": 42}),
            json!({"title": "Prayer Life", "speaker": "Pastor Tayo", "category": "Prayer",
                   "date": "2023-11-20"}),
        ]
    }

    fn titles(items: &[Value]) -> Vec<&str> {
        items.iter().map(|item| text(item, "title")).collect()
    }

    #[test]
    fn category_all_is_ignored() {
        let query = TranscriptQuery {
            category: Some(String::from("All")),
            ..TranscriptQuery::default()
        };
        assert_eq!(filter_transcripts(sample(), &query).len(), 3);
    }

    #[test]
    fn speaker_filter_is_case_insensitive_substring() {
        let query = TranscriptQuery {
            speaker: Some(String::from("rev.")),
            ..TranscriptQuery::default()
        };
        assert_eq!(
            titles(&filter_transcripts(sample(), &query)),
            vec!["Walking in Faith", "abiding Grace"]
        );
    }

    #[test]
    fn search_covers_description_and_tolerates_missing_fields() {
        let query = TranscriptQuery {
            search: Some(String::from("FAVOR")),
            ..TranscriptQuery::default()
        };
        assert_eq!(titles(&filter_transcripts(sample(), &query)), vec!["abiding Grace"]);
    }

    #[test]
    fn sort_orders() {
        let mut items = sample();

        sort_transcripts(&mut items, SortOrder::Newest);
        assert_eq!(titles(&items), vec!["abiding Grace", "Walking in Faith", "Prayer Life"]);

        sort_transcripts(&mut items, SortOrder::Oldest);
        assert_eq!(titles(&items), vec!["Prayer Life", "Walking in Faith", "abiding Grace"]);

        sort_transcripts(&mut items, SortOrder::Popular);
        assert_eq!(titles(&items), vec!["abiding Grace", "Walking in Faith", "Prayer Life"]);

        sort_transcripts(&mut items, SortOrder::Title);
        assert_eq!(titles(&items), vec!["abiding Grace", "Prayer Life", "Walking in Faith"]);
    }

    #[test]
    fn unknown_sort_defaults_to_newest() {
        assert_eq!(SortOrder::parse("random"), SortOrder::Newest);
    }

    #[test]
    fn pagination_reports_bounds() {
        let (items, pagination) = paginate(sample(), 2, 2);

        assert_eq!(titles(&items), vec!["Prayer Life"]);
        assert_eq!(
            pagination,
            Pagination {
                current_page: 2,
                total_pages: 2,
                total_items: 3,
                items_per_page: 2,
                has_next_page: false,
                has_prev_page: true,
            }
        );
    }

    #[test]
    fn invalid_page_values_fall_back() {
        assert_eq!(parse_positive(Some("abc")), None);
        assert_eq!(parse_positive(Some("0")), None);
        assert_eq!(parse_positive(Some(" 3 ")), Some(3));
    }

    #[test]
    fn defaults_fill_missing_fields_only() {
        let record = with_defaults(json!({"id": 5, "title": ""}), "2024-01-01T00:00:00Z")
            .expect("object record");

        assert_eq!(record["id"], json!(5));
        assert_eq!(record["title"], json!("Untitled Transcript"));
        assert_eq!(record["speaker"], json!("Unknown Speaker"));
        assert_eq!(record["serverTimestamp"], json!("2024-01-01T00:00:00Z"));
        assert!(with_defaults(json!("not an object"), "ts").is_none());
    }
}
