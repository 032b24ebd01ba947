//! Sweep execution.
//!
//! Walks the parameter space test → model → count → format (outer to inner),
//! one combination at a time. Each combination builds a prompt, calls the
//! model through the retry policy, parses the response and records it.
//! A model failure the retry policy does not recover ends the run; whatever
//! was recorded before it stays on disk.

use crate::config::Config;
use crate::error::{BenchError, Result};
use crate::llm::{ModelClient, ModelRequest, RetryPolicy};
use crate::output::ResultRecorder;
use crate::parse::parse_response;
use crate::prompt::build_prompt;
use crate::types::{Combination, InvocationOutcome, ItemCount, ResponseFormat, TestCase};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// The enumerable axes of a sweep.
#[derive(Debug, Clone)]
pub struct SweepPlan {
    pub tests: Vec<TestCase>,
    pub models: Vec<String>,
    pub item_counts: Vec<ItemCount>,
    pub formats: Vec<ResponseFormat>,
}

impl SweepPlan {
    /// Load every test-case image and take the axes from `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let tests = config
            .tests
            .iter()
            .map(|t| TestCase::load(t, &config.base_dir))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            tests,
            models: config.sweep.models.clone(),
            item_counts: config.sweep.item_counts.clone(),
            formats: config.sweep.formats.clone(),
        })
    }

    /// Number of combinations in the plan.
    pub fn len(&self) -> usize {
        self.tests.len() * self.models.len() * self.item_counts.len() * self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every combination, in sweep order.
    pub fn combinations(&self) -> impl Iterator<Item = Combination<'_>> + '_ {
        self.tests.iter().flat_map(move |test| {
            self.models.iter().flat_map(move |model| {
                self.item_counts.iter().flat_map(move |&count| {
                    self.formats.iter().map(move |format| Combination {
                        test,
                        model,
                        count,
                        format,
                    })
                })
            })
        })
    }
}

/// Driver options.
#[derive(Debug, Clone, Copy, Default)]
pub struct SweepOptions {
    /// Treat an unparseable response as fatal instead of recording no count
    pub fail_on_parse_error: bool,
}

/// Reported after each recorded combination.
#[derive(Debug, Clone)]
pub struct SweepProgress<'a> {
    /// 1-based position in the sweep
    pub index: usize,
    pub total: usize,
    pub combination: Combination<'a>,
    pub parsed_item_count: Option<usize>,
    pub execution_time_ms: f64,
    pub content_path: PathBuf,
}

/// Totals for a finished run.
#[derive(Debug, Clone, Default)]
pub struct SweepSummary {
    /// Rows written to the results table
    pub recorded: usize,
    /// Responses with a structured format that failed to parse
    pub parse_failures: usize,
    pub elapsed: Duration,
}

/// Runs a [`SweepPlan`] against a model client.
pub struct SweepDriver<'a> {
    client: &'a dyn ModelClient,
    retry: RetryPolicy,
    options: SweepOptions,
}

impl<'a> SweepDriver<'a> {
    pub fn new(client: &'a dyn ModelClient, retry: RetryPolicy, options: SweepOptions) -> Self {
        Self {
            client,
            retry,
            options,
        }
    }

    /// Run every combination of `plan`, recording each one.
    ///
    /// The recorder is closed on every exit path.
    pub async fn run<F>(
        &self,
        plan: &SweepPlan,
        recorder: ResultRecorder,
        mut on_progress: F,
    ) -> Result<SweepSummary>
    where
        F: FnMut(&SweepProgress<'_>),
    {
        let mut recorder = recorder;
        let started = Instant::now();
        let result = self
            .run_combinations(plan, &mut recorder, &mut on_progress)
            .await;
        let closed = recorder.finish();

        let mut summary = result?;
        summary.recorded = closed?;
        summary.elapsed = started.elapsed();
        tracing::info!(
            "Sweep finished: {} combination(s) recorded, {} parse failure(s) in {:.1}s",
            summary.recorded,
            summary.parse_failures,
            summary.elapsed.as_secs_f64()
        );
        Ok(summary)
    }

    async fn run_combinations<F>(
        &self,
        plan: &SweepPlan,
        recorder: &mut ResultRecorder,
        on_progress: &mut F,
    ) -> Result<SweepSummary>
    where
        F: FnMut(&SweepProgress<'_>),
    {
        let total = plan.len();
        let mut summary = SweepSummary::default();

        for (i, combination) in plan.combinations().enumerate() {
            tracing::info!(
                "Testing {} with {} model in {} mode and {} items.",
                combination.test.name,
                combination.model,
                combination.format,
                combination.count
            );

            let (outcome, parse_failed) = match self.invoke(&combination).await {
                Ok(invoked) => invoked,
                Err(e) => {
                    tracing::error!(
                        "Aborting sweep at combination {}/{total} ({} / {} / {} / {}): {e}",
                        i + 1,
                        combination.test.name,
                        combination.model,
                        combination.count,
                        combination.format
                    );
                    return Err(e);
                }
            };
            if parse_failed {
                summary.parse_failures += 1;
            }

            let content_path = recorder.record(&combination, &outcome)?;
            tracing::info!("Ran in {:.0}ms.", outcome.execution_time_ms);

            on_progress(&SweepProgress {
                index: i + 1,
                total,
                combination,
                parsed_item_count: outcome.parsed_item_count,
                execution_time_ms: outcome.execution_time_ms,
                content_path,
            });
        }

        Ok(summary)
    }

    /// Prompt, call, parse. Time covers the successful call plus parsing.
    ///
    /// The flag is set when a structured response failed to parse.
    async fn invoke(&self, combination: &Combination<'_>) -> Result<(InvocationOutcome, bool)> {
        let prompt = build_prompt(
            &combination.test.prompt,
            combination.count,
            combination.format,
        );
        let request = ModelRequest {
            image: &combination.test.image,
            prompt: &prompt,
        };

        let response = self
            .retry
            .invoke(self.client, combination.model, &request)
            .await?;

        let parse_started = Instant::now();
        let mut parse_failed = false;
        let parsed_item_count = match parse_response(&response.text, combination.format) {
            Ok(parsed) => parsed.item_count(),
            Err(e) => {
                tracing::warn!(
                    "Could not parse {} response from {} for '{}': {e}",
                    combination.format,
                    combination.model,
                    combination.test.name
                );
                tracing::debug!("Unparseable content:\n{}", response.text);
                if self.options.fail_on_parse_error {
                    return Err(BenchError::Parse(e));
                }
                parse_failed = true;
                None
            }
        };
        let execution_time_ms =
            response.latency_ms + parse_started.elapsed().as_secs_f64() * 1000.0;

        let outcome = InvocationOutcome {
            content_length: response.text.chars().count(),
            raw_content: response.text,
            requested_item_count: combination.count,
            parsed_item_count,
            execution_time_ms,
        };
        Ok((outcome, parse_failed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::llm::{ImageInput, ModelResponse};
    use crate::types::ResultRecord;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::path::Path;
    use std::sync::Mutex;

    /// Answers every prompt with a list, in the requested format, of as many
    /// items as the prompt asks for (3 when unconstrained). Optionally fails
    /// on the Nth call.
    struct MockClient {
        calls: Mutex<Vec<(String, String)>>,
        fail_on_call: Option<(usize, u16)>,
        garbage_for_model: Option<String>,
    }

    impl MockClient {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_on_call: None,
                garbage_for_model: None,
            }
        }

        fn failing_on(call: usize, status: u16) -> Self {
            Self {
                fail_on_call: Some((call, status)),
                ..Self::new()
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    fn requested(prompt: &str) -> usize {
        prompt
            .split("Return exactly ")
            .nth(1)
            .and_then(|rest| rest.split(' ').next())
            .and_then(|n| n.parse().ok())
            .unwrap_or(3)
    }

    #[async_trait]
    impl ModelClient for MockClient {
        fn name(&self) -> &str {
            "mock"
        }

        async fn generate(
            &self,
            model: &str,
            request: &ModelRequest<'_>,
        ) -> std::result::Result<ModelResponse, ModelError> {
            let call = {
                let mut calls = self.calls.lock().unwrap();
                calls.push((model.to_string(), request.prompt.to_string()));
                calls.len()
            };
            if let Some((n, status)) = self.fail_on_call {
                if call >= n {
                    return Err(ModelError::from_status(model, status, "mock failure"));
                }
            }
            if self.garbage_for_model.as_deref() == Some(model) {
                return Ok(ModelResponse {
                    // Unterminated in both JSON and YAML
                    text: "[{\"name\": \"unterminated".to_string(),
                    latency_ms: 1.0,
                });
            }

            let n = requested(request.prompt);
            let text = if request.prompt.contains("in yaml format") {
                let items: Vec<String> = (0..n).map(|i| format!("- name: item{i}")).collect();
                format!("```yaml\n---\n{}\n```", items.join("\n"))
            } else {
                let items: Vec<String> = (0..n).map(|i| format!("{{\"name\":\"item{i}\"}}")).collect();
                format!("```json\n[{}]\n```", items.join(","))
            };
            Ok(ModelResponse {
                text,
                latency_ms: 2.5,
            })
        }
    }

    fn test_case(name: &str) -> TestCase {
        TestCase {
            name: name.to_string(),
            prompt: format!("Return all {name} in this image."),
            image_path: PathBuf::from(format!("images/{name}.jpg")),
            image: ImageInput::from_bytes(&[0xFF, 0xD8, 0xFF], "jpeg"),
        }
    }

    fn plan() -> SweepPlan {
        SweepPlan {
            tests: vec![test_case("animal"), test_case("menu")],
            models: vec!["model-a".to_string(), "model-b".to_string()],
            item_counts: vec![ItemCount::Exactly(1), ItemCount::Exactly(5), ItemCount::All],
            formats: vec![ResponseFormat::Json, ResponseFormat::Yaml],
        }
    }

    fn recorder(root: &Path) -> ResultRecorder {
        ResultRecorder::create(&root.join("output"), &root.join("output/output.csv"), None)
            .unwrap()
    }

    fn read_rows(root: &Path) -> Vec<ResultRecord> {
        let mut reader = csv::Reader::from_path(root.join("output/output.csv")).unwrap();
        reader.deserialize().map(|r| r.unwrap()).collect()
    }

    #[test]
    fn test_combination_order() {
        let plan = plan();
        let order: Vec<(String, String, i64, String)> = plan
            .combinations()
            .map(|c| {
                (
                    c.test.name.clone(),
                    c.model.to_string(),
                    c.count.as_i64(),
                    c.format.to_string(),
                )
            })
            .collect();

        assert_eq!(order.len(), plan.len());
        assert_eq!(order.len(), 24);
        assert_eq!(
            order[0],
            ("animal".into(), "model-a".into(), 1, "json".into())
        );
        assert_eq!(
            order[1],
            ("animal".into(), "model-a".into(), 1, "yaml".into())
        );
        assert_eq!(
            order[2],
            ("animal".into(), "model-a".into(), 5, "json".into())
        );
        assert_eq!(
            order[6],
            ("animal".into(), "model-b".into(), 1, "json".into())
        );
        assert_eq!(order[12].0, "menu");
        assert_eq!(
            order[23],
            ("menu".into(), "model-b".into(), -1, "yaml".into())
        );
    }

    #[tokio::test]
    async fn test_full_run_records_every_combination() {
        let dir = tempfile::tempdir().unwrap();
        let client = MockClient::new();
        let driver = SweepDriver::new(
            &client,
            RetryPolicy::new(Duration::ZERO),
            SweepOptions::default(),
        );
        let plan = plan();

        let mut progress = Vec::new();
        let summary = driver
            .run(&plan, recorder(dir.path()), |p| {
                progress.push((p.index, p.total, p.content_path.clone()))
            })
            .await
            .unwrap();

        // 2 tests x 2 models x 2 formats x 3 counts
        assert_eq!(summary.recorded, 24);
        assert_eq!(summary.parse_failures, 0);
        assert_eq!(client.call_count(), 24);

        let rows = read_rows(dir.path());
        assert_eq!(rows.len(), 24);
        assert!(rows.iter().all(|r| r.execution_time_ms >= 0.0));
        for (row, combination) in rows.iter().zip(plan.combinations()) {
            assert_eq!(row.name, combination.test.name);
            assert_eq!(row.model, combination.model);
            assert_eq!(row.count, combination.count.as_i64());
            assert_eq!(row.format, combination.format.as_str());
            let expected = match combination.count {
                ItemCount::Exactly(n) => n as usize,
                ItemCount::All => 3,
            };
            assert_eq!(row.parsed_item_count, Some(expected));
        }

        let paths: HashSet<PathBuf> = progress.iter().map(|(_, _, p)| p.clone()).collect();
        assert_eq!(paths.len(), 24);
        assert!(paths.iter().all(|p| p.is_file()));
        assert_eq!(progress.last().map(|(i, t, _)| (*i, *t)), Some((24, 24)));
        assert!(dir
            .path()
            .join("output/menu/model-b/yaml/output_-1.yaml")
            .is_file());
    }

    #[tokio::test]
    async fn test_twelve_combinations() {
        let dir = tempfile::tempdir().unwrap();
        let client = MockClient::new();
        let driver = SweepDriver::new(
            &client,
            RetryPolicy::new(Duration::ZERO),
            SweepOptions::default(),
        );
        let mut plan = plan();
        plan.models.truncate(1);

        let summary = driver.run(&plan, recorder(dir.path()), |_| {}).await.unwrap();
        assert_eq!(summary.recorded, 12);
        assert_eq!(read_rows(dir.path()).len(), 12);
    }

    #[tokio::test]
    async fn test_transport_error_aborts_and_keeps_earlier_results() {
        let dir = tempfile::tempdir().unwrap();
        let client = MockClient::failing_on(4, 500);
        let driver = SweepDriver::new(
            &client,
            RetryPolicy::new(Duration::ZERO),
            SweepOptions::default(),
        );

        let err = driver
            .run(&plan(), recorder(dir.path()), |_| {})
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            BenchError::Model(ModelError::Transport { .. })
        ));
        // No further combinations after the failing one
        assert_eq!(client.call_count(), 4);
        assert_eq!(read_rows(dir.path()).len(), 3);
        let animal_a = dir.path().join("output/animal/model-a");
        assert!(animal_a.join("json/output_5.json").is_file());
        assert!(!animal_a.join("yaml/output_5.yaml").exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistent_rate_limit_aborts_after_one_retry() {
        let dir = tempfile::tempdir().unwrap();
        let client = MockClient::failing_on(2, 429);
        let driver = SweepDriver::new(&client, RetryPolicy::default(), SweepOptions::default());

        let err = driver
            .run(&plan(), recorder(dir.path()), |_| {})
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            BenchError::Model(ModelError::QuotaExceeded { .. })
        ));
        assert_eq!(client.call_count(), 3);
        assert_eq!(read_rows(dir.path()).len(), 1);
    }

    #[tokio::test]
    async fn test_parse_failure_recorded_as_missing_count() {
        let dir = tempfile::tempdir().unwrap();
        let client = MockClient {
            garbage_for_model: Some("model-b".to_string()),
            ..MockClient::new()
        };
        let driver = SweepDriver::new(
            &client,
            RetryPolicy::new(Duration::ZERO),
            SweepOptions::default(),
        );

        let summary = driver.run(&plan(), recorder(dir.path()), |_| {}).await.unwrap();
        assert_eq!(summary.recorded, 24);
        assert_eq!(summary.parse_failures, 12);

        let rows = read_rows(dir.path());
        assert!(rows
            .iter()
            .filter(|r| r.model == "model-b")
            .all(|r| r.parsed_item_count.is_none()));
        assert!(rows
            .iter()
            .filter(|r| r.model == "model-a")
            .all(|r| r.parsed_item_count.is_some()));
    }

    #[tokio::test]
    async fn test_strict_parsing_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let client = MockClient {
            garbage_for_model: Some("model-a".to_string()),
            ..MockClient::new()
        };
        let driver = SweepDriver::new(
            &client,
            RetryPolicy::new(Duration::ZERO),
            SweepOptions {
                fail_on_parse_error: true,
            },
        );

        let err = driver
            .run(&plan(), recorder(dir.path()), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, BenchError::Parse(_)));
        assert_eq!(client.call_count(), 1);
        assert_eq!(read_rows(dir.path()).len(), 0);
        let table = std::fs::read_to_string(dir.path().join("output/output.csv")).unwrap();
        assert!(table.starts_with("format,model,count,"));
    }

    #[tokio::test]
    async fn test_literal_format_not_counted() {
        let dir = tempfile::tempdir().unwrap();
        let client = MockClient::new();
        let driver = SweepDriver::new(
            &client,
            RetryPolicy::new(Duration::ZERO),
            SweepOptions::default(),
        );
        let plan = SweepPlan {
            tests: vec![test_case("animal")],
            models: vec!["model-a".to_string()],
            item_counts: vec![ItemCount::All],
            formats: vec![ResponseFormat::Literal("text".to_string())],
        };

        let summary = driver.run(&plan, recorder(dir.path()), |_| {}).await.unwrap();
        assert_eq!(summary.parse_failures, 0);
        let rows = read_rows(dir.path());
        assert_eq!(rows[0].parsed_item_count, None);
        assert!(rows[0].content_length > 0);
        assert!(dir
            .path()
            .join("output/animal/model-a/text/output_-1.text")
            .is_file());
    }
}
