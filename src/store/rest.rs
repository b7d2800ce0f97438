use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use super::{StoreError, Table};
use crate::models::Record;

/// HTTP backend for a hosted PostgREST-style API
/// (`<endpoint>/rest/v1/<table>?user_id=eq.<id>`).
pub(crate) struct RestStore {
    client: reqwest::Client,
    base_url: String,
    access_key: String,
}

impl RestStore {
    pub(crate) fn new(
        base_url: impl Into<String>,
        access_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            access_key: access_key.into(),
        })
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, table_url(&self.base_url, table))
            .header("apikey", &self.access_key)
            .bearer_auth(&self.access_key)
    }
}

pub(crate) fn table_url(base_url: &str, table: &str) -> String {
    format!("{}/rest/v1/{table}", base_url.trim_end_matches('/'))
}

pub(crate) fn eq_filter(value: &str) -> String {
    format!("eq.{value}")
}

/// Query matching row `id` only if `owner` owns it.
fn owned_row(owner: &str, id: &str) -> [(&'static str, String); 2] {
    [("id", eq_filter(id)), ("user_id", eq_filter(owner))]
}

pub(crate) fn order_desc(column: &str) -> String {
    format!("{column}.desc")
}

/// Pull the human-readable message out of an error body. PostgREST answers
/// with `{"message": ...}`; other gateways use `error` or `msg`.
pub(crate) fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error_description", "error", "msg"] {
            if let Some(msg) = value.get(key).and_then(|v| v.as_str()) {
                return msg.to_string();
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "empty error response".to_string()
    } else {
        trimmed.to_string()
    }
}

#[derive(Serialize)]
struct Owned<'a, D: Serialize> {
    user_id: &'a str,
    #[serde(flatten)]
    draft: &'a D,
}

async fn send(req: RequestBuilder, table: &str) -> Result<Response, StoreError> {
    let response = req
        .send()
        .await
        .map_err(|e| StoreError::Transport(format!("{table} request failed: {e}")))?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string());
    Err(StoreError::Rejected {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

async fn decode_rows<R: Record>(response: Response) -> Result<Vec<R>, StoreError> {
    response
        .json::<Vec<R>>()
        .await
        .map_err(|e| StoreError::Decode(format!("{} rows: {e}", R::TABLE)))
}

/// Writes come back as a one-element array under `return=representation`.
async fn decode_single<R: Record>(response: Response, id: &str) -> Result<R, StoreError> {
    decode_rows::<R>(response)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| StoreError::NotFound {
            table: R::TABLE,
            id: id.to_string(),
        })
}

#[async_trait]
impl<R: Record> Table<R> for RestStore {
    async fn select_owned(&self, owner: &str) -> Result<Vec<R>, StoreError> {
        let req = self.request(Method::GET, R::TABLE).query(&[
            ("select", "*".to_string()),
            ("user_id", eq_filter(owner)),
            ("order", order_desc(R::ORDER_BY)),
        ]);
        let rows = decode_rows::<R>(send(req, R::TABLE).await?).await?;
        debug!(table = R::TABLE, count = rows.len(), "selected rows");
        Ok(rows)
    }

    async fn insert(&self, owner: &str, draft: &R::Draft) -> Result<R, StoreError> {
        let req = self
            .request(Method::POST, R::TABLE)
            .header("Prefer", "return=representation")
            .json(&[Owned {
                user_id: owner,
                draft,
            }]);
        let row = decode_single::<R>(send(req, R::TABLE).await?, "<new>").await?;
        debug!(table = R::TABLE, id = row.id(), "inserted row");
        Ok(row)
    }

    async fn update(&self, owner: &str, id: &str, patch: &R::Patch) -> Result<R, StoreError> {
        let req = self
            .request(Method::PATCH, R::TABLE)
            .query(&owned_row(owner, id))
            .header("Prefer", "return=representation")
            .json(patch);
        let row = decode_single::<R>(send(req, R::TABLE).await?, id).await?;
        debug!(table = R::TABLE, id, "updated row");
        Ok(row)
    }

    async fn delete(&self, owner: &str, id: &str) -> Result<(), StoreError> {
        let req = self
            .request(Method::DELETE, R::TABLE)
            .query(&owned_row(owner, id))
            .header("Prefer", "return=representation");
        let _: R = decode_single(send(req, R::TABLE).await?, id).await?;
        debug!(table = R::TABLE, id, "deleted row");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_table_url_trims_trailing_slash() {
        assert_eq!(
            table_url("https://abc.example.co/", "expenses"),
            "https://abc.example.co/rest/v1/expenses"
        );
        assert_eq!(
            table_url("https://abc.example.co", "budgets"),
            "https://abc.example.co/rest/v1/budgets"
        );
    }

    #[test]
    fn test_filters() {
        assert_eq!(eq_filter("u-1"), "eq.u-1");
        assert_eq!(order_desc("date"), "date.desc");
    }

    #[test]
    fn test_row_writes_filter_on_owner() {
        assert_eq!(
            owned_row("alice", "e-1"),
            [("id", "eq.e-1".to_string()), ("user_id", "eq.alice".to_string())]
        );
    }

    #[test]
    fn test_error_message_prefers_message_field() {
        let body = r#"{"code":"42501","message":"permission denied for table expenses"}"#;
        assert_eq!(error_message(body), "permission denied for table expenses");
    }

    #[test]
    fn test_error_message_other_shapes() {
        assert_eq!(error_message(r#"{"error":"invalid api key"}"#), "invalid api key");
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
        assert_eq!(error_message("  "), "empty error response");
    }

    #[test]
    fn test_insert_body_flattens_owner() {
        let draft = crate::models::NewBudget {
            category: crate::models::Category::Travel,
            monthly_limit: rust_decimal::Decimal::new(500, 0),
            month: "2024-03".parse().unwrap(),
        };
        let body = serde_json::to_value([Owned {
            user_id: "u1",
            draft: &draft,
        }])
        .unwrap();
        assert_eq!(body[0]["user_id"], "u1");
        assert_eq!(body[0]["category"], "Travel");
        assert_eq!(body[0]["month"], "2024-03");
        assert_eq!(body[0]["monthly_limit"], "500");
    }
}
