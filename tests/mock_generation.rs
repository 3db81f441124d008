//! Integration test using a mock generation service.
//!
//! Runs the review pipeline end-to-end against a real temporary git
//! repository and the filesystem report sink, without calling any model.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use patchwise::config::{Config, OutputConfig};
use patchwise::diff::GitSource;
use patchwise::models::{Batch, ChangedFile, ContextMode};
use patchwise::orchestrator::{self, FileReviewer, ReviewSettings, RunOptions};
use patchwise::prompt::{Policy, PromptTemplate};
use patchwise::providers::{GenerationService, ProviderError};
use patchwise::report::FsReportSink;

/// Records prompts and answers with a canned review, failing the first
/// `failures` calls.
struct MockGenerator {
    prompts: Mutex<Vec<(String, String)>>,
    failures: Mutex<usize>,
}

impl MockGenerator {
    fn new(failures: usize) -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
            failures: Mutex::new(failures),
        }
    }

    fn prompts(&self) -> Vec<(String, String)> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationService for MockGenerator {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, ProviderError> {
        self.prompts
            .lock()
            .unwrap()
            .push((model.to_string(), prompt.to_string()));
        let mut failures = self.failures.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err(ProviderError::ApiError("503 Service Unavailable".into()));
        }
        Ok(format!("### Findings\n- reviewed with {model}\n"))
    }
}

async fn git(dir: &Path, args: &[&str]) -> String {
    let output = tokio::process::Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .await
        .unwrap();
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Repo with a small file and a 200-line file, both changed in HEAD.
async fn fixture_repo(dir: &Path) -> String {
    git(dir, &["init"]).await;
    git(dir, &["config", "user.email", "test@test.com"]).await;
    git(dir, &["config", "user.name", "Test"]).await;
    git(dir, &["config", "commit.gpgsign", "false"]).await;

    let big: String = (1..=200).map(|n| format!("let v{n} = {n};\n")).collect();
    tokio::fs::create_dir_all(dir.join("src")).await.unwrap();
    tokio::fs::write(dir.join("src/small.rs"), "fn main() {}\n").await.unwrap();
    tokio::fs::write(dir.join("src/big.rs"), &big).await.unwrap();
    git(dir, &["add", "."]).await;
    git(dir, &["commit", "-m", "init"]).await;

    tokio::fs::write(dir.join("src/small.rs"), "fn main() {\n    run();\n}\n")
        .await
        .unwrap();
    let changed = big
        .replace("let v20 = 20;", "let v20 = 2000;")
        .replace("let v150 = 150;", "let v150 = 15000;");
    tokio::fs::write(dir.join("src/big.rs"), changed).await.unwrap();
    git(dir, &["add", "."]).await;
    git(dir, &["commit", "-m", "change"]).await;

    git(dir, &["rev-parse", "HEAD"]).await
}

fn config() -> Config {
    let mut config = Config::default();
    config.window.full_file_threshold_lines = 50;
    config.window.window_before = 2;
    config.window.window_after = 2;
    config.generation.model = "mock-pro".into();
    config.generation.fallback_model = "mock-flash".into();
    config.generation.retry_delay_ms = 0;
    config.prompt.repository = Some("acme/shop".into());
    config
}

fn reviewer(
    root: &Path,
    config: &Config,
    generator: Arc<MockGenerator>,
    policy: Option<Policy>,
) -> FileReviewer {
    let git = Arc::new(GitSource::new(root));
    FileReviewer::new(
        git.clone(),
        git,
        generator,
        Arc::new(FsReportSink::new(root, &config.output)),
        ReviewSettings::from_config(config, PromptTemplate::builtin(), policy),
    )
}

fn changed(sha: &str, path: &str) -> ChangedFile {
    ChangedFile {
        sha: sha.into(),
        path: path.into(),
        status: "modified".into(),
        is_binary: false,
        patch: None,
    }
}

#[tokio::test]
async fn batch_run_writes_reports_prompts_and_summary() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let sha = fixture_repo(root).await;
    let config = config();
    let generator = Arc::new(MockGenerator::new(0));
    let reviewer = reviewer(root, &config, generator.clone(), None);

    let batch = Batch {
        id: Some("42".into()),
        items: vec![
            changed(&sha, "src/small.rs"),
            changed(&sha, "src/big.rs"),
            changed(&sha, ".github/review-results/PROMPT-old.md"),
        ],
    };
    let options = RunOptions {
        skip_dir: Some(config.output.debug_dir.clone()),
        ..RunOptions::default()
    };
    let summary = orchestrator::run_batch(&reviewer, &batch, &options)
        .await
        .unwrap();

    assert_eq!(summary.total, 3);
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.results[0].mode, ContextMode::Full);
    assert_eq!(summary.results[1].mode, ContextMode::Windowed);
    assert_eq!(summary.results[1].file_lines, 201);

    let report = std::fs::read_to_string(root.join("reviews/src_big.rs.md")).unwrap();
    assert!(report.starts_with(&format!(
        "## src/big.rs @ {}\n\n**Mode:** windowed  |  **Lines:** 201\n\n",
        &sha[..8]
    )));
    assert!(report.contains("reviewed with mock-pro"));
    assert!(report.ends_with("\n\n---\n"));

    let prompt =
        std::fs::read_to_string(root.join(".github/review-results/PROMPT-src_big.rs.md")).unwrap();
    assert!(prompt.contains("--- BEGIN EXCERPT [lines 18-22] ---"));
    assert!(prompt.contains("--- BEGIN EXCERPT [lines 148-152] ---"));
    assert!(prompt.contains("let v150 = 15000;"));
    assert!(!prompt.contains("let v100 = 100;"));
    assert!(prompt.contains("Repository: `acme/shop`"));

    let json: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(root.join("reviews/summary.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(json["batch_id"], "42");
    assert_eq!(json["processed"], 2);
    assert_eq!(generator.prompts().len(), 2);
}

#[tokio::test]
async fn fallback_model_answers_after_primary_fails() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let sha = fixture_repo(root).await;
    let config = config();
    let generator = Arc::new(MockGenerator::new(1));
    let reviewer = reviewer(root, &config, generator.clone(), None);

    let summary = orchestrator::run_single(
        &reviewer,
        &changed(&sha, "src/small.rs"),
        &RunOptions::default(),
    )
    .await
    .unwrap();

    assert!(summary.results[0].success);
    assert_eq!(summary.results[0].model.as_deref(), Some("mock-flash"));
    let models: Vec<String> = generator.prompts().into_iter().map(|(m, _)| m).collect();
    assert_eq!(models, vec!["mock-pro", "mock-flash"]);
}

#[tokio::test]
async fn exhausted_retries_write_failure_report() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let sha = fixture_repo(root).await;
    let mut config = config();
    config.generation.max_rounds = 2;
    let generator = Arc::new(MockGenerator::new(usize::MAX));
    let reviewer = reviewer(root, &config, generator.clone(), None);

    let summary = orchestrator::run_sequential(
        &reviewer,
        &[changed(&sha, "src/small.rs")],
        &RunOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(summary.failed, 0);
    assert_eq!(summary.generation_failures, 1);
    assert_eq!(generator.prompts().len(), 4);
    let report = std::fs::read_to_string(root.join("reviews/src_small.rs.md")).unwrap();
    assert!(report.contains("Review failed - no response from AI service."));
}

#[tokio::test]
async fn policy_and_patch_reach_the_prompt() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let sha = fixture_repo(root).await;
    let mut config = config();
    config.output = OutputConfig {
        debug_prompts: false,
        ..OutputConfig::default()
    };
    let generator = Arc::new(MockGenerator::new(0));
    let policy = Policy {
        scope: "org".into(),
        text: "Flag every unwrap.".into(),
    };
    let reviewer = reviewer(root, &config, generator.clone(), Some(policy));

    let mut file = changed(&sha, "src/small.rs");
    file.patch = Some("@@ -1 +1,3 @@\n-fn main() {}\n+fn main() {\n+    run();\n+}".into());
    orchestrator::run_single(&reviewer, &file, &RunOptions::default())
        .await
        .unwrap();

    let (_, prompt) = &generator.prompts()[0];
    assert!(prompt.contains("--- BEGIN REVIEW POLICY (org) ---\nFlag every unwrap.\n"));
    assert!(prompt.contains("+    run();"));
    assert!(!root.join(".github/review-results").exists());
}

#[tokio::test]
async fn unknown_path_is_diff_only() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let sha = fixture_repo(root).await;
    let config = config();
    let generator = Arc::new(MockGenerator::new(0));
    let reviewer = reviewer(root, &config, generator.clone(), None);

    let summary = orchestrator::run_single(
        &reviewer,
        &changed(&sha, "src/missing.rs"),
        &RunOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(summary.results[0].mode, ContextMode::DiffOnly);
    assert_eq!(summary.results[0].file_lines, 0);
    let (_, prompt) = &generator.prompts()[0];
    assert!(prompt.contains("(No post-change content included.)"));
    assert!(!prompt.contains("BEGIN POST-CHANGE"));
}
