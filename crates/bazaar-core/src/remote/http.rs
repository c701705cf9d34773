//! REST client for a hosted record service.
//!
//! Endpoints (relative to the configured base URL):
//! - `GET /v1/account` -> `{ "status": "available", "user_id": "..." }`
//! - `GET /v1/records?type=T&field=value...` -> `{ "records": [...] }`
//! - `POST /v1/records` with a [`Record`] body -> stored [`Record`]
//! - `DELETE /v1/records/{id}`

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;

use super::{
    AccountStatus, Predicate, QueryResults, Record, RecordId, RemoteError, RemoteRecordStore,
    RemoteResult, UserId,
};
use crate::config::RemoteConfig;
use crate::util::{compact_text, is_http_url, normalize_text_option};

const REQUEST_TIMEOUT_SECS: u64 = 15;

#[derive(Clone)]
pub struct HttpRecordStore {
    base_url: String,
    auth_token: Option<String>,
    client: Client,
}

impl std::fmt::Debug for HttpRecordStore {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("HttpRecordStore")
            .field("base_url", &self.base_url)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl HttpRecordStore {
    pub fn new(base_url: impl Into<String>, auth_token: Option<String>) -> RemoteResult<Self> {
        let base_url = normalize_base_url(base_url.into())?;
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            base_url,
            auth_token: normalize_text_option(auth_token),
            client,
        })
    }

    pub fn from_config(config: &RemoteConfig) -> RemoteResult<Self> {
        let base_url = config.base_url.clone().ok_or_else(|| {
            RemoteError::Api("remote base URL is not configured".to_string())
        })?;
        Self::new(base_url, config.auth_token.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header("Accept", "application/json");
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> RemoteResult<reqwest::Response> {
        let response = self.authorized(request).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(map_status_error(status, &body))
    }
}

#[async_trait::async_trait]
impl RemoteRecordStore for HttpRecordStore {
    async fn account_status(&self) -> RemoteResult<AccountStatus> {
        if self.auth_token.is_none() {
            return Ok(AccountStatus::NoAccount);
        }

        let request = self.client.get(format!("{}/v1/account", self.base_url));
        match self.send(request).await {
            Ok(response) => Ok(response.json::<AccountResponse>().await?.status),
            Err(RemoteError::Unavailable) => Ok(AccountStatus::NoAccount),
            Err(error) => Err(error),
        }
    }

    async fn current_user_id(&self) -> RemoteResult<UserId> {
        if self.auth_token.is_none() {
            return Err(RemoteError::Unavailable);
        }

        let request = self.client.get(format!("{}/v1/account", self.base_url));
        let account = self.send(request).await?.json::<AccountResponse>().await?;
        account.into_user_id()
    }

    async fn query(&self, record_type: &str, predicate: &Predicate) -> RemoteResult<QueryResults> {
        let request = self
            .client
            .get(query_url(&self.base_url, record_type, predicate));
        let payload = self.send(request).await?.text().await?;
        parse_query_response(&payload)
    }

    async fn save(&self, record: Record) -> RemoteResult<Record> {
        let request = self
            .client
            .post(format!("{}/v1/records", self.base_url))
            .json(&record);
        let stored = self.send(request).await?.json::<Record>().await?;
        if stored.id.is_none() {
            return Err(RemoteError::InvalidPayload(
                "saved record has no id".to_string(),
            ));
        }
        Ok(stored)
    }

    async fn delete(&self, id: &RecordId) -> RemoteResult<()> {
        let request = self.client.delete(format!(
            "{}/v1/records/{}",
            self.base_url,
            urlencoding::encode(id.as_str())
        ));
        self.send(request).await.map(|_| ())
    }
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    status: AccountStatus,
    #[serde(default)]
    user_id: Option<String>,
}

impl AccountResponse {
    fn into_user_id(self) -> RemoteResult<UserId> {
        if self.status != AccountStatus::Available {
            return Err(RemoteError::Unavailable);
        }
        normalize_text_option(self.user_id)
            .map(UserId::new)
            .ok_or_else(|| {
                RemoteError::InvalidPayload("account response did not include user_id".to_string())
            })
    }
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    records: Vec<QueryEntry>,
}

#[derive(Debug, Deserialize)]
struct QueryEntry {
    id: RecordId,
    #[serde(default)]
    record: Option<Record>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn parse_query_response(payload: &str) -> RemoteResult<QueryResults> {
    let response: QueryResponse = serde_json::from_str(payload)
        .map_err(|error| RemoteError::InvalidPayload(format!("invalid query response: {error}")))?;

    Ok(response
        .records
        .into_iter()
        .map(|entry| {
            let result = match (entry.record, entry.error) {
                (Some(mut record), None) => {
                    record.id = Some(entry.id.clone());
                    Ok(record)
                }
                (_, Some(error)) => Err(RemoteError::Api(compact_text(&error))),
                (None, None) => Err(RemoteError::InvalidPayload(format!(
                    "query entry {} has neither record nor error",
                    entry.id
                ))),
            };
            (entry.id, result)
        })
        .collect())
}

fn query_url(base_url: &str, record_type: &str, predicate: &Predicate) -> String {
    let mut url = format!(
        "{base_url}/v1/records?type={}",
        urlencoding::encode(record_type)
    );
    for (field, value) in predicate.clauses() {
        url.push('&');
        url.push_str(&urlencoding::encode(field));
        url.push('=');
        url.push_str(&urlencoding::encode(value));
    }
    url
}

fn map_status_error(status: StatusCode, body: &str) -> RemoteError {
    let message = parse_api_error(status, body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteError::Unavailable,
        StatusCode::NOT_FOUND => RemoteError::NotFound(message),
        _ => RemoteError::Api(message),
    }
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return format!("{} ({})", compact_text(&message), status.as_u16());
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

fn normalize_base_url(raw: String) -> RemoteResult<String> {
    let base_url = normalize_text_option(Some(raw))
        .ok_or_else(|| RemoteError::Api("remote base URL must not be empty".to_string()))?;
    if is_http_url(&base_url) {
        Ok(base_url.trim_end_matches('/').to_string())
    } else {
        Err(RemoteError::Api(
            "remote base URL must include http:// or https://".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::FieldValue;

    #[test]
    fn normalize_base_url_rejects_invalid_values() {
        assert!(normalize_base_url(String::new()).is_err());
        assert!(normalize_base_url("records.example.com".to_string()).is_err());
        assert_eq!(
            normalize_base_url(" https://records.example.com/ ".to_string()).unwrap(),
            "https://records.example.com"
        );
    }

    #[test]
    fn query_url_encodes_predicate_clauses() {
        let predicate = Predicate::new()
            .field_eq("userID", "user 1")
            .field_eq("serviceID", "a&b");
        assert_eq!(
            query_url("https://r.example.com", "Bookmark", &predicate),
            "https://r.example.com/v1/records?type=Bookmark&userID=user%201&serviceID=a%26b"
        );
    }

    #[test]
    fn parse_query_response_keeps_per_record_errors() {
        let payload = r#"{
            "records": [
                {"id": "r1", "record": {"record_type": "Bookmark", "fields": {
                    "userID": {"type": "string", "value": "u1"}
                }}},
                {"id": "r2", "error": "permission denied"},
                {"id": "r3"}
            ]
        }"#;

        let results = parse_query_response(payload).unwrap();
        assert_eq!(results.len(), 3);

        let (id, first) = &results[0];
        let first = first.as_ref().unwrap();
        assert_eq!(id.as_str(), "r1");
        assert_eq!(first.id.as_ref().map(RecordId::as_str), Some("r1"));
        assert_eq!(
            first.get("userID"),
            Some(&FieldValue::String("u1".to_string()))
        );
        assert!(matches!(results[1].1, Err(RemoteError::Api(_))));
        assert!(matches!(results[2].1, Err(RemoteError::InvalidPayload(_))));
    }

    #[test]
    fn parse_query_response_rejects_malformed_json() {
        assert!(matches!(
            parse_query_response("not json"),
            Err(RemoteError::InvalidPayload(_))
        ));
    }

    #[test]
    fn status_errors_are_classified() {
        assert!(matches!(
            map_status_error(StatusCode::UNAUTHORIZED, ""),
            RemoteError::Unavailable
        ));
        assert!(matches!(
            map_status_error(StatusCode::NOT_FOUND, r#"{"message":"gone"}"#),
            RemoteError::NotFound(message) if message == "gone (404)"
        ));
        assert!(matches!(
            map_status_error(StatusCode::BAD_GATEWAY, ""),
            RemoteError::Api(message) if message == "HTTP 502"
        ));
    }

    #[test]
    fn account_response_requires_user_id_when_available() {
        let available: AccountResponse =
            serde_json::from_str(r#"{"status":"available","user_id":" u-42 "}"#).unwrap();
        assert_eq!(available.into_user_id().unwrap(), UserId::new("u-42"));

        let missing: AccountResponse = serde_json::from_str(r#"{"status":"available"}"#).unwrap();
        assert!(matches!(
            missing.into_user_id(),
            Err(RemoteError::InvalidPayload(_))
        ));

        let restricted: AccountResponse =
            serde_json::from_str(r#"{"status":"restricted"}"#).unwrap();
        assert!(matches!(
            restricted.into_user_id(),
            Err(RemoteError::Unavailable)
        ));
    }

    #[test]
    fn debug_redacts_token() {
        let store =
            HttpRecordStore::new("https://r.example.com", Some("secret".to_string())).unwrap();
        let debug = format!("{store:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[tokio::test]
    async fn missing_token_means_no_account() {
        let store = HttpRecordStore::new("https://r.example.com", None).unwrap();
        assert_eq!(
            store.account_status().await.unwrap(),
            AccountStatus::NoAccount
        );
        assert!(matches!(
            store.current_user_id().await,
            Err(RemoteError::Unavailable)
        ));
    }
}
