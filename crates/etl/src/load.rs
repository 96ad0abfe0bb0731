//! Record loading into target kinds.
//!
//! Loading never raises on a partial failure: per-record outcomes are
//! counted and returned in a [`LoadSummary`]. Errors surface only for
//! unusable target specs.

use std::collections::BTreeMap;
use std::sync::Arc;

use pipewright_core::{EndpointKind, LoadSummary, Record, TargetSpec};
use serde::Deserialize;
use serde_json::Value;

use crate::connector::Connector;

/// Errors raised for unusable targets. Per-record failures and whole-
/// file write failures are reported in the summary instead.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Target kind has no built-in strategy and no registered connector
    #[error("unsupported target kind: {0}")]
    UnsupportedKind(EndpointKind),

    /// Target config did not match the kind's expected shape
    #[error("invalid target config: {0}")]
    Config(String),
}

#[derive(Debug, Deserialize)]
struct FileTargetConfig {
    path: String,
}

#[derive(Debug, Deserialize)]
struct ApiTargetConfig {
    url: String,
    method: Option<String>,
    #[serde(default)]
    headers: BTreeMap<String, String>,
}

/// Writes a record sequence to a named target kind.
pub struct Loader {
    client: reqwest::Client,
    connector: Option<Arc<dyn Connector>>,
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

impl Loader {
    /// Create a loader with the built-in file, CSV, and API strategies.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            connector: None,
        }
    }

    /// Register a connector handling `database` targets.
    pub fn with_connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Load records into the target, returning per-record counts.
    pub async fn load(
        &self,
        records: &[Record],
        target: &TargetSpec,
    ) -> Result<LoadSummary, LoadError> {
        tracing::debug!(kind = %target.kind, count = records.len(), "loading records");
        match target.kind {
            EndpointKind::JsonFile => {
                let config: FileTargetConfig = parse_config(&target.config)?;
                let json = match serde_json::to_string_pretty(records) {
                    Ok(json) => json,
                    Err(e) => return Ok(total_failure(records.len(), &e.to_string())),
                };
                Ok(self.write_whole_file(&config.path, json.as_bytes(), records.len()).await)
            }
            EndpointKind::CsvFile => {
                let config: FileTargetConfig = parse_config(&target.config)?;
                let csv = match render_csv(records) {
                    Ok(csv) => csv,
                    Err(e) => return Ok(total_failure(records.len(), &e)),
                };
                Ok(self.write_whole_file(&config.path, csv.as_bytes(), records.len()).await)
            }
            EndpointKind::Api => {
                let config: ApiTargetConfig = parse_config(&target.config)?;
                Ok(self.load_api(records, &config).await?)
            }
            EndpointKind::Database => match &self.connector {
                Some(connector) => connector.store(records, &target.config).await,
                None => Err(LoadError::UnsupportedKind(EndpointKind::Database)),
            },
        }
    }

    /// Write the whole sequence in one operation; a failure reports the
    /// full record count as errors and leaves no partial file output.
    /// The data is staged to a sibling file and renamed into place so an
    /// interrupted write never truncates an existing target.
    async fn write_whole_file(&self, path: &str, bytes: &[u8], count: usize) -> LoadSummary {
        let staged = format!("{}.tmp", path);
        let written = async {
            tokio::fs::write(&staged, bytes).await?;
            tokio::fs::rename(&staged, path).await
        }
        .await;
        match written {
            Ok(()) => LoadSummary {
                success_count: count as u64,
                error_count: 0,
                errors: Vec::new(),
            },
            Err(e) => {
                let _ = tokio::fs::remove_file(&staged).await;
                total_failure(count, &e.to_string())
            }
        }
    }

    /// Send each record as an individual request.
    async fn load_api(
        &self,
        records: &[Record],
        config: &ApiTargetConfig,
    ) -> Result<LoadSummary, LoadError> {
        let method: reqwest::Method = config
            .method
            .as_deref()
            .unwrap_or("POST")
            .to_uppercase()
            .parse()
            .map_err(|_| LoadError::Config(format!("invalid http method: {:?}", config.method)))?;

        let mut summary = LoadSummary::default();
        for (index, record) in records.iter().enumerate() {
            let mut request = self.client.request(method.clone(), &config.url);
            for (name, value) in &config.headers {
                request = request.header(name, value);
            }
            match request.json(record).send().await {
                Ok(response) if response.status().is_success() => {
                    summary.success_count += 1;
                }
                Ok(response) => {
                    summary.error_count += 1;
                    summary.errors.push(format!(
                        "record {}: api returned status {}",
                        index,
                        response.status().as_u16()
                    ));
                }
                Err(e) => {
                    summary.error_count += 1;
                    summary.errors.push(format!("record {}: {}", index, e));
                }
            }
        }
        Ok(summary)
    }
}

fn parse_config<T: serde::de::DeserializeOwned>(config: &Value) -> Result<T, LoadError> {
    serde_json::from_value(config.clone()).map_err(|e| LoadError::Config(e.to_string()))
}

fn total_failure(count: usize, message: &str) -> LoadSummary {
    LoadSummary {
        success_count: 0,
        error_count: count as u64,
        errors: vec![message.to_string()],
    }
}

/// Render records as CSV: the header is the union of field names in
/// first-seen order; values are string-coerced.
fn render_csv(records: &[Record]) -> Result<String, String> {
    let mut headers: Vec<&str> = Vec::new();
    for record in records {
        for key in record.keys() {
            if !headers.contains(&key.as_str()) {
                headers.push(key);
            }
        }
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&headers).map_err(|e| e.to_string())?;
    for record in records {
        let row: Vec<String> = headers
            .iter()
            .map(|h| match record.get(*h) {
                None | Some(Value::Null) => String::new(),
                Some(v) => pipewright_core::coerce_string(v),
            })
            .collect();
        writer.write_record(&row).map_err(|e| e.to_string())?;
    }
    let bytes = writer.into_inner().map_err(|e| e.to_string())?;
    String::from_utf8(bytes).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn target(kind: &str, config: Value) -> TargetSpec {
        serde_json::from_value(json!({"type": kind, "config": config})).unwrap()
    }

    fn records(v: Value) -> Vec<Record> {
        v.as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_object().unwrap().clone())
            .collect()
    }

    #[tokio::test]
    async fn json_file_writes_whole_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let data = records(json!([{"id": 1}, {"id": 2}]));

        let summary = Loader::new()
            .load(&data, &target("json_file", json!({"path": path})))
            .await
            .unwrap();
        assert_eq!(summary.success_count, 2);
        assert_eq!(summary.error_count, 0);

        let written: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.as_array().unwrap().len(), 2);
        assert!(!dir.path().join("out.json.tmp").exists());
    }

    #[tokio::test]
    async fn failed_write_leaves_existing_target_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        std::fs::write(&path, r#"[{"id":99}]"#).unwrap();
        // A directory at the staging path makes the write fail before
        // the target is touched.
        std::fs::create_dir(dir.path().join("out.json.tmp")).unwrap();

        let data = records(json!([{"id": 1}]));
        let summary = Loader::new()
            .load(&data, &target("json_file", json!({"path": path})))
            .await
            .unwrap();
        assert_eq!(summary.success_count, 0);
        assert_eq!(summary.error_count, 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), r#"[{"id":99}]"#);
    }

    #[tokio::test]
    async fn write_failure_reports_full_count_without_raising() {
        let data = records(json!([{"id": 1}, {"id": 2}, {"id": 3}]));
        let summary = Loader::new()
            .load(
                &data,
                &target("json_file", json!({"path": "/nonexistent/dir/out.json"})),
            )
            .await
            .unwrap();
        assert_eq!(summary.success_count, 0);
        assert_eq!(summary.error_count, 3);
        assert_eq!(summary.errors.len(), 1);
    }

    #[tokio::test]
    async fn csv_target_unions_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let data = records(json!([{"a": 1, "b": "x"}, {"a": 2, "c": true}]));

        let summary = Loader::new()
            .load(&data, &target("csv_file", json!({"path": path})))
            .await
            .unwrap();
        assert_eq!(summary.success_count, 2);

        let written = std::fs::read_to_string(&path).unwrap();
        let mut lines = written.lines();
        assert_eq!(lines.next(), Some("a,b,c"));
        assert_eq!(lines.next(), Some("1,x,"));
        assert_eq!(lines.next(), Some("2,,true"));
    }

    #[tokio::test]
    async fn api_target_sends_one_request_per_record_and_counts_failures() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ingest"))
            .respond_with(ResponseTemplate::new(201))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/ingest"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let data = records(json!([{"id": 1}, {"id": 2}, {"id": 3}]));
        let summary = Loader::new()
            .load(
                &data,
                &target("api", json!({"url": format!("{}/ingest", server.uri())})),
            )
            .await
            .unwrap();
        assert_eq!(summary.success_count, 2);
        assert_eq!(summary.error_count, 1);
        assert!(summary.errors[0].contains("500"));
    }

    #[tokio::test]
    async fn database_without_connector_is_unsupported() {
        let err = Loader::new()
            .load(&[], &target("database", json!({})))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LoadError::UnsupportedKind(EndpointKind::Database)
        ));
    }
}
