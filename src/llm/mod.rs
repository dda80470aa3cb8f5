
use std::time::Duration;

use anyhow::{Context, Result, bail};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, SqlitePool, TypeInfo, ValueRef};
use tracing::{debug, warn};
use url::Url;

use crate::BaktaDbError;
use crate::config::LlmConfig;

const DEFAULT_TIMEOUT_SECONDS: u64 = 60;
const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
const EXPONENTIAL_BACKOFF_BASE: u64 = 2;

/// Client for an OpenAI-compatible chat-completions endpoint. Blocking on
/// purpose: one question produces exactly two round trips.
#[derive(Debug, Clone)]
pub struct LlmClient {
    base_url: Url,
    model: String,
    top_k: u32,
    api_key: String,
    agent: ureq::Agent,
    retry_attempts: u32,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    fn system(content: String) -> Self {
        Self {
            role: "system".to_string(),
            content,
        }
    }

    fn user(content: String) -> Self {
        Self {
            role: "user".to_string(),
            content,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct QueryOutput {
    query: String,
}

impl LlmClient {
    /// Build a client from configuration; the API key is read from the
    /// configured environment variable and is required.
    #[inline]
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            BaktaDbError::Llm(format!(
                "API key environment variable {} is not set",
                config.api_key_env
            ))
        })?;
        Self::with_api_key(config, api_key)
    }

    #[inline]
    pub fn with_api_key(config: &LlmConfig, api_key: String) -> Result<Self> {
        let base_url = config
            .api_url()
            .context("Failed to parse LLM base URL from config")?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)))
            .build()
            .into();

        Ok(Self {
            base_url,
            model: config.model.clone(),
            top_k: config.top_k,
            api_key,
            agent,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
        })
    }

    #[inline]
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    /// Turn a natural-language question into a single SQL query against the
    /// given schema.
    #[inline]
    pub fn write_query(&self, question: &str, table_info: &str) -> Result<String> {
        let system_message = format!(
            "Given an input question, create a syntactically correct SQLite query to run to \
             help find the answer. Unless the user specifies in his question a specific number \
             of examples they wish to obtain, always limit your query to at most {top_k} \
             results. You can order the results by a relevant column to return the most \
             interesting examples in the database.\n\n\
             When the question can be related to COG IDs, query the related COG IDs against \
             the dbxrefs column in annotations table instead of querying the product column.\n\n\
             Never query for all the columns from a specific table, only ask for a the few \
             relevant columns given the question.\n\n\
             Pay attention to use only the column names that you can see in the schema \
             description. Be careful to not query for columns that do not exist. Also, pay \
             attention to which column is in which table.\n\n\
             Only use the following tables:\n{table_info}\n\n\
             Respond with a JSON object of the form {{\"query\": \"...\"}} and nothing else.",
            top_k = self.top_k,
        );

        let messages = [
            ChatMessage::system(system_message),
            ChatMessage::user(format!("Question: {question}")),
        ];

        let content = self.chat(&messages)?;
        parse_query_response(&content)
    }

    /// Answer the question from the executed query's result.
    #[inline]
    pub fn generate_answer(&self, question: &str, query: &str, result: &str) -> Result<String> {
        let prompt = format!(
            "Given the following user question, corresponding SQL query, and SQL result, \
             answer the user question.\n\n\
             Question: {question}\n\
             SQL Query: {query}\n\
             SQL Result: {result}"
        );

        self.chat(&[ChatMessage::user(prompt)])
    }

    fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages,
        };
        let request_json =
            serde_json::to_string(&request).context("Failed to serialize chat request")?;

        let url = format!(
            "{}/chat/completions",
            self.base_url.as_str().trim_end_matches('/')
        );
        let authorization = format!("Bearer {}", self.api_key);
        debug!("Sending chat request to {}", url);

        let response_text = self
            .make_request_with_retry(|| {
                self.agent
                    .post(url.as_str())
                    .header("Content-Type", "application/json")
                    .header("Authorization", authorization.as_str())
                    .send(&request_json)
                    .and_then(|mut resp| resp.body_mut().read_to_string())
            })
            .context("Chat completion request failed")?;

        let response: ChatResponse =
            serde_json::from_str(&response_text).context("Failed to parse chat response")?;

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| anyhow::anyhow!("Chat response contained no choices"))
    }

    /// Retry transient transport failures and throttling with exponential
    /// backoff; anything else fails immediately.
    fn make_request_with_retry<F>(&self, mut request: F) -> Result<String>
    where
        F: FnMut() -> Result<String, ureq::Error>,
    {
        let mut last_error = None;

        for attempt in 0..=self.retry_attempts {
            if attempt > 0 {
                let delay = Duration::from_secs(EXPONENTIAL_BACKOFF_BASE.pow(attempt - 1));
                warn!(
                    "Retrying chat request in {:?} (attempt {}/{})",
                    delay, attempt, self.retry_attempts
                );
                std::thread::sleep(delay);
            }

            match request() {
                Ok(response) => return Ok(response),
                Err(e) => {
                    let retryable = match &e {
                        ureq::Error::StatusCode(status) => *status == 429 || *status >= 500,
                        ureq::Error::ConnectionFailed
                        | ureq::Error::HostNotFound
                        | ureq::Error::Timeout(_)
                        | ureq::Error::Io(_) => true,
                        _ => false,
                    };
                    if !retryable {
                        return Err(e).context("Chat request failed");
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .map(anyhow::Error::from)
            .unwrap_or_else(|| anyhow::anyhow!("Chat request failed")))
        .context("Chat request failed after retries")
    }
}

/// The model is asked for `{"query": "..."}`; tolerate code fences and, as a
/// last resort, a bare SELECT statement.
#[inline]
pub fn parse_query_response(content: &str) -> Result<String> {
    let trimmed = strip_code_fence(content.trim());

    if let Ok(output) = serde_json::from_str::<QueryOutput>(trimmed) {
        return Ok(output.query);
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            if let Ok(output) = serde_json::from_str::<QueryOutput>(&trimmed[start..=end]) {
                return Ok(output.query);
            }
        }
    }

    let upper = trimmed.to_uppercase();
    if upper.starts_with("SELECT") || upper.starts_with("WITH") {
        return Ok(trimmed.to_string());
    }

    bail!("Could not extract a SQL query from the model response: {content}")
}

fn strip_code_fence(content: &str) -> &str {
    let Some(rest) = content.strip_prefix("```") else {
        return content;
    };
    // Drop the info string (```json, ```sql) up to the first newline.
    let rest = rest.split_once('\n').map_or(rest, |(_, body)| body);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// CREATE TABLE statements for every user table, the shape the prompt's
/// schema section expects.
#[inline]
pub async fn schema_overview(pool: &SqlitePool) -> Result<String> {
    let tables: Vec<(String, String)> = sqlx::query_as(
        "SELECT name, sql FROM sqlite_master \
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%' AND name NOT LIKE '_sqlx_%' \
         ORDER BY name",
    )
    .fetch_all(pool)
    .await
    .context("Failed to read database schema")?;

    if tables.is_empty() {
        bail!("The database contains no tables; import some annotation files first");
    }

    Ok(tables.into_iter().map(|(_, sql)| sql).join("\n\n"))
}

/// Execute the generated query (read-only statements only) and render the
/// rows as tab-separated text for the answer prompt.
#[inline]
pub async fn execute_query(pool: &SqlitePool, sql: &str) -> Result<String> {
    let upper = sql.trim_start().to_uppercase();
    if !upper.starts_with("SELECT") && !upper.starts_with("WITH") {
        bail!("Refusing to execute non-SELECT SQL: {sql}");
    }

    let rows = sqlx::query(sql)
        .fetch_all(pool)
        .await
        .with_context(|| format!("Generated SQL failed to execute: {sql}"))?;

    let Some(first) = rows.first() else {
        return Ok("(no rows)".to_string());
    };

    let header = first.columns().iter().map(Column::name).join("\t");
    let mut output = header;
    for row in &rows {
        output.push('\n');
        let rendered = (0..row.columns().len())
            .map(|index| render_value(row, index))
            .join("\t");
        output.push_str(&rendered);
    }

    Ok(output)
}

/// SQLite values are dynamically typed; decode by the declared value type.
fn render_value(row: &SqliteRow, index: usize) -> String {
    let Ok(value) = row.try_get_raw(index) else {
        return "?".to_string();
    };
    if value.is_null() {
        return "NULL".to_string();
    }

    match value.type_info().name() {
        "INTEGER" => row
            .try_get::<i64, _>(index)
            .map(|v| v.to_string())
            .unwrap_or_else(|_| "?".to_string()),
        "REAL" => row
            .try_get::<f64, _>(index)
            .map(|v| v.to_string())
            .unwrap_or_else(|_| "?".to_string()),
        "BLOB" => "<blob>".to_string(),
        _ => row
            .try_get::<String, _>(index)
            .unwrap_or_else(|_| "?".to_string()),
    }
}
