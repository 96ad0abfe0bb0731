//! Record extraction from source kinds.

use std::collections::BTreeMap;
use std::sync::Arc;

use pipewright_core::{EndpointKind, Record, SourceSpec};
use serde::Deserialize;
use serde_json::Value;

use crate::connector::Connector;

/// Errors raised while extracting records. Extraction never returns
/// partial data: any failure aborts the whole stage.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// Source kind has no built-in strategy and no registered connector
    #[error("unsupported source kind: {0}")]
    UnsupportedKind(EndpointKind),

    /// Source config did not match the kind's expected shape
    #[error("invalid source config: {0}")]
    Config(String),

    /// Reading the source failed
    #[error("failed to read source: {0}")]
    Io(#[from] std::io::Error),

    /// Source data could not be parsed into records
    #[error("failed to parse source data: {0}")]
    Parse(String),

    /// The API request itself failed
    #[error("api request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-2xx status
    #[error("api returned status {status}")]
    HttpStatus {
        /// HTTP status code of the response
        status: u16,
    },
}

#[derive(Debug, Deserialize)]
struct FileSourceConfig {
    path: String,
}

#[derive(Debug, Deserialize)]
struct CsvSourceConfig {
    path: String,
    #[serde(default = "default_delimiter")]
    delimiter: char,
}

fn default_delimiter() -> char {
    ','
}

#[derive(Debug, Deserialize)]
struct ApiSourceConfig {
    url: String,
    method: Option<String>,
    #[serde(default)]
    headers: BTreeMap<String, String>,
    body: Option<Value>,
}

/// Reads raw records from a named source kind.
pub struct Extractor {
    client: reqwest::Client,
    connector: Option<Arc<dyn Connector>>,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor {
    /// Create an extractor with the built-in file, CSV, and API
    /// strategies.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            connector: None,
        }
    }

    /// Register a connector handling `database` sources.
    pub fn with_connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Extract all records described by the source spec.
    pub async fn extract(&self, source: &SourceSpec) -> Result<Vec<Record>, ExtractError> {
        tracing::debug!(kind = %source.kind, "extracting records");
        match source.kind {
            EndpointKind::JsonFile => self.extract_json_file(&source.config).await,
            EndpointKind::CsvFile => self.extract_csv_file(&source.config).await,
            EndpointKind::Api => self.extract_api(&source.config).await,
            EndpointKind::Database => match &self.connector {
                Some(connector) => connector.fetch(&source.config).await,
                None => Err(ExtractError::UnsupportedKind(EndpointKind::Database)),
            },
        }
    }

    async fn extract_json_file(&self, config: &Value) -> Result<Vec<Record>, ExtractError> {
        let config: FileSourceConfig = parse_config(config)?;
        let data = tokio::fs::read_to_string(&config.path).await?;
        let value: Value =
            serde_json::from_str(&data).map_err(|e| ExtractError::Parse(e.to_string()))?;
        records_from_value(value)
    }

    async fn extract_csv_file(&self, config: &Value) -> Result<Vec<Record>, ExtractError> {
        let config: CsvSourceConfig = parse_config(config)?;
        let data = tokio::fs::read_to_string(&config.path).await?;
        parse_csv(&data, config.delimiter)
    }

    async fn extract_api(&self, config: &Value) -> Result<Vec<Record>, ExtractError> {
        let config: ApiSourceConfig = parse_config(config)?;
        let method = parse_method(config.method.as_deref().unwrap_or("GET"))?;

        let mut request = self.client.request(method, &config.url);
        for (name, value) in &config.headers {
            request = request.header(name, value);
        }
        if let Some(body) = &config.body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::HttpStatus {
                status: status.as_u16(),
            });
        }
        let value: Value = response
            .json()
            .await
            .map_err(|e| ExtractError::Parse(e.to_string()))?;
        records_from_value(value)
    }
}

fn parse_config<T: serde::de::DeserializeOwned>(config: &Value) -> Result<T, ExtractError> {
    serde_json::from_value(config.clone()).map_err(|e| ExtractError::Config(e.to_string()))
}

fn parse_method(method: &str) -> Result<reqwest::Method, ExtractError> {
    method
        .to_uppercase()
        .parse()
        .map_err(|_| ExtractError::Config(format!("invalid http method: {}", method)))
}

/// Interpret a parsed JSON body as a record sequence. An array of
/// objects becomes one record per element; a lone object becomes a
/// single record.
fn records_from_value(value: Value) -> Result<Vec<Record>, ExtractError> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::Object(record) => Ok(record),
                other => Err(ExtractError::Parse(format!(
                    "element {} is not an object: {}",
                    i, other
                ))),
            })
            .collect(),
        Value::Object(record) => Ok(vec![record]),
        other => Err(ExtractError::Parse(format!(
            "expected an array of records, got: {}",
            other
        ))),
    }
}

/// Parse CSV text: the first line is the header row, remaining lines
/// map positionally. Missing trailing fields become null.
fn parse_csv(data: &str, delimiter: char) -> Result<Vec<Record>, ExtractError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .flexible(true)
        .from_reader(data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ExtractError::Parse(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| ExtractError::Parse(e.to_string()))?;
        let mut record = Record::new();
        for (i, header) in headers.iter().enumerate() {
            let value = match row.get(i) {
                Some(field) => Value::String(field.to_string()),
                None => Value::Null,
            };
            record.insert(header.clone(), value);
        }
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source(kind: &str, config: Value) -> SourceSpec {
        serde_json::from_value(json!({"type": kind, "config": config})).unwrap()
    }

    #[tokio::test]
    async fn json_file_extracts_record_array() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"id": 1}}, {{"id": 2}}]"#).unwrap();

        let records = Extractor::new()
            .extract(&source("json_file", json!({"path": file.path()})))
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["id"], json!(1));
    }

    #[tokio::test]
    async fn json_file_missing_fails_without_partial_data() {
        let err = Extractor::new()
            .extract(&source("json_file", json!({"path": "/nonexistent/in.json"})))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::Io(_)));
    }

    #[tokio::test]
    async fn csv_maps_header_positionally_with_null_padding() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "id,name,city\n1,alice,berlin\n2,bob\n").unwrap();

        let records = Extractor::new()
            .extract(&source("csv_file", json!({"path": file.path()})))
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["city"], json!("berlin"));
        assert_eq!(records[1]["name"], json!("bob"));
        assert_eq!(records[1]["city"], Value::Null);
    }

    #[tokio::test]
    async fn api_source_issues_one_call_and_parses_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/records"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 7}])))
            .expect(1)
            .mount(&server)
            .await;

        let records = Extractor::new()
            .extract(&source(
                "api",
                json!({"url": format!("{}/records", server.uri())}),
            ))
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["id"], json!(7));
    }

    #[tokio::test]
    async fn api_non_2xx_carries_the_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = Extractor::new()
            .extract(&source("api", json!({"url": server.uri()})))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::HttpStatus { status: 503 }));
    }

    #[tokio::test]
    async fn database_without_connector_is_unsupported() {
        let err = Extractor::new()
            .extract(&source("database", json!({"dsn": "postgres://x"})))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExtractError::UnsupportedKind(EndpointKind::Database)
        ));
    }
}
