//! Review prompt rendering.
//!
//! A template carries `{{PLACEHOLDER}}` markers. Scalar placeholders are
//! replaced with file metadata; the three section placeholders
//! (`{{POLICY_SECTION}}`, `{{DIFF_CONTENT}}`, `{{FILE_CONTENT_SECTION}}`)
//! receive fenced blocks. A custom template that omits a section
//! placeholder gets that section appended at the end instead.

use std::path::Path;

use crate::config::PolicyConfig;
use crate::models::{ChangedFile, ContextMode};

/// Template shipped with the binary.
const BUILTIN_TEMPLATE: &str = include_str!("template.md");

const NO_DIFF: &str = "(No diff content available for this file.)";
const NO_CONTENT: &str = "(No post-change content included.)";

/// Repository review policy text with its scope label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    pub scope: String,
    pub text: String,
}

impl Policy {
    /// Load the policy file when the policy is enabled.
    ///
    /// Relative paths resolve against `repo_root`. A missing or unreadable
    /// file disables the policy with a warning.
    pub async fn load(config: &PolicyConfig, repo_root: &Path) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        let path = repo_root.join(config.path.as_deref()?);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Some(Self {
                scope: config.scope.clone(),
                text,
            }),
            Err(e) => {
                tracing::warn!(path = %path.display(), "review policy not loaded: {e}");
                None
            }
        }
    }
}

/// Everything a template can reference for one file.
#[derive(Debug, Clone, Copy)]
pub struct PromptContext<'a> {
    pub file: &'a ChangedFile,
    pub repository: Option<&'a str>,
    pub mode: ContextMode,
    pub file_lines: usize,
    pub diff: &'a str,
    pub content: Option<&'a str>,
    /// Rendered excerpt blocks (windowed mode only).
    pub excerpts: &'a str,
    pub policy: Option<&'a Policy>,
}

/// A loaded review prompt template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    source: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PromptTemplate {
    pub fn builtin() -> Self {
        Self::new(BUILTIN_TEMPLATE)
    }

    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Load a template file, falling back to the built-in template.
    pub async fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::builtin();
        };
        match tokio::fs::read_to_string(path).await {
            Ok(source) if !source.trim().is_empty() => Self::new(source),
            Ok(_) => {
                tracing::warn!(path = %path.display(), "prompt template is empty, using built-in");
                Self::builtin()
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "prompt template not loaded, using built-in: {e}");
                Self::builtin()
            }
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Render the prompt for one file.
    pub fn render(&self, ctx: &PromptContext<'_>) -> String {
        let file_lines = ctx.file_lines.to_string();
        let policy = ctx.policy.map(policy_section).unwrap_or_default();
        let diff = diff_section(ctx.diff);
        let content = content_section(ctx.mode, ctx.content, ctx.excerpts);

        let values = [
            ("{{FILE_PATH}}", ctx.file.path.as_str()),
            ("{{COMMIT_SHA}}", ctx.file.sha.as_str()),
            ("{{STATUS}}", ctx.file.status.as_str()),
            ("{{MODE}}", ctx.mode.as_ref()),
            ("{{FILE_LINES}}", file_lines.as_str()),
            ("{{REPOSITORY}}", ctx.repository.unwrap_or("unknown")),
            ("{{POLICY_SECTION}}", policy.as_str()),
            ("{{DIFF_CONTENT}}", diff.as_str()),
            ("{{FILE_CONTENT_SECTION}}", content.as_str()),
        ];

        let mut prompt = substitute(&self.source, &values);
        // The last three are sections; any the template lacks are appended.
        for (marker, section) in &values[6..] {
            if !self.source.contains(marker) {
                prompt.push_str(section);
            }
        }
        prompt
    }
}

/// Replace placeholders in one left-to-right pass over `source`.
///
/// Inserted values are never rescanned.
fn substitute(source: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;
    while let Some(pos) = rest.find("{{") {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match values.iter().find(|(marker, _)| tail.starts_with(marker)) {
            Some((marker, value)) => {
                out.push_str(value);
                rest = &tail[marker.len()..];
            }
            None => {
                out.push_str("{{");
                rest = &tail[2..];
            }
        }
    }
    out.push_str(rest);
    out
}

pub fn policy_section(policy: &Policy) -> String {
    format!(
        "\n--- BEGIN REVIEW POLICY ({}) ---\n{}\n--- END REVIEW POLICY ---\n",
        policy.scope, policy.text
    )
}

pub fn diff_section(diff: &str) -> String {
    let body = if diff.is_empty() { NO_DIFF } else { diff };
    format!("\n--- BEGIN DIFF (file-scoped) ---\n{body}\n--- END DIFF ---\n")
}

/// Post-change content for the chosen mode.
pub fn content_section(mode: ContextMode, content: Option<&str>, excerpts: &str) -> String {
    match (mode, content) {
        (ContextMode::Full, Some(content)) if !content.is_empty() => format!(
            "\n--- BEGIN POST-CHANGE CONTENT (FULL) ---\n{content}\n--- END POST-CHANGE CONTENT ---\n"
        ),
        (ContextMode::Windowed, _) if !excerpts.is_empty() => format!(
            "\n--- BEGIN POST-CHANGE EXCERPTS (WINDOWED) ---\n{excerpts}\n--- END POST-CHANGE EXCERPTS ---\n"
        ),
        _ => format!("\n{NO_CONTENT}\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn file() -> ChangedFile {
        ChangedFile {
            sha: "0123456789abcdef".into(),
            path: "src/Billing/Invoice.cs".into(),
            status: "modified".into(),
            is_binary: false,
            patch: None,
        }
    }

    fn ctx<'a>(file: &'a ChangedFile, diff: &'a str) -> PromptContext<'a> {
        PromptContext {
            file,
            repository: Some("acme/shop"),
            mode: ContextMode::DiffOnly,
            file_lines: 0,
            diff,
            content: None,
            excerpts: "",
            policy: None,
        }
    }

    #[test]
    fn builtin_template_has_every_placeholder() {
        let source = PromptTemplate::builtin().source().to_string();
        for marker in [
            "{{FILE_PATH}}",
            "{{COMMIT_SHA}}",
            "{{STATUS}}",
            "{{MODE}}",
            "{{FILE_LINES}}",
            "{{REPOSITORY}}",
            "{{POLICY_SECTION}}",
            "{{DIFF_CONTENT}}",
            "{{FILE_CONTENT_SECTION}}",
        ] {
            assert!(source.contains(marker), "missing {marker}");
        }
    }

    #[test]
    fn render_replaces_all_occurrences() {
        let f = file();
        let template = PromptTemplate::new("{{FILE_PATH}} / {{FILE_PATH}} @ {{COMMIT_SHA}} [{{MODE}}]");
        let prompt = template.render(&ctx(&f, "@@ -1 +1 @@"));
        assert!(prompt.starts_with(
            "src/Billing/Invoice.cs / src/Billing/Invoice.cs @ 0123456789abcdef [diff_only]"
        ));
    }

    #[test]
    fn builtin_render_leaves_no_placeholders() {
        let f = file();
        let prompt = PromptTemplate::builtin().render(&ctx(&f, "@@ -1 +1 @@\n+x"));
        assert!(!prompt.contains("{{"), "{prompt}");
        assert!(prompt.contains("Repository: `acme/shop`"));
        assert!(prompt.contains("--- BEGIN DIFF (file-scoped) ---\n@@ -1 +1 @@\n+x\n--- END DIFF ---"));
        assert!(prompt.contains("(No post-change content included.)"));
    }

    #[test]
    fn missing_section_placeholders_are_appended_in_order() {
        let f = file();
        let policy = Policy {
            scope: "org".into(),
            text: "No panics.".into(),
        };
        let mut c = ctx(&f, "");
        c.policy = Some(&policy);
        let prompt = PromptTemplate::new("Review {{FILE_PATH}}.").render(&c);
        assert_eq!(
            prompt,
            "Review src/Billing/Invoice.cs.\n\
             --- BEGIN REVIEW POLICY (org) ---\nNo panics.\n--- END REVIEW POLICY ---\n\
             \n--- BEGIN DIFF (file-scoped) ---\n(No diff content available for this file.)\n--- END DIFF ---\n\
             \n(No post-change content included.)\n"
        );
    }

    #[test]
    fn diff_text_is_not_treated_as_template() {
        let f = file();
        let prompt = PromptTemplate::new("{{DIFF_CONTENT}}").render(&ctx(&f, "+ \"{{FILE_PATH}}\""));
        assert!(prompt.contains("+ \"{{FILE_PATH}}\""));
    }

    #[test]
    fn section_text_is_not_rescanned() {
        let f = file();
        let policy = Policy {
            scope: "repo".into(),
            text: "see {{DIFF_CONTENT}}".into(),
        };
        let mut c = ctx(&f, "+{{FILE_CONTENT_SECTION}}");
        c.mode = ContextMode::Full;
        c.content = Some("SECRET_BODY");
        c.policy = Some(&policy);

        let prompt = PromptTemplate::builtin().render(&c);
        assert_eq!(prompt.matches("SECRET_BODY").count(), 1);
        assert!(prompt.contains(
            "--- BEGIN DIFF (file-scoped) ---\n+{{FILE_CONTENT_SECTION}}\n--- END DIFF ---"
        ));
        assert!(prompt.contains(
            "--- BEGIN REVIEW POLICY (repo) ---\nsee {{DIFF_CONTENT}}\n--- END REVIEW POLICY ---"
        ));
        assert_eq!(prompt.matches("--- BEGIN DIFF").count(), 1);
    }

    #[test]
    fn unknown_braces_are_kept() {
        let f = file();
        let prompt = PromptTemplate::new("{{NOPE}} {{ {{FILE_PATH}}}}").render(&ctx(&f, ""));
        assert!(prompt.starts_with("{{NOPE}} {{ src/Billing/Invoice.cs}}"));
    }

    #[test]
    fn full_mode_includes_content() {
        let section = content_section(ContextMode::Full, Some("a\nb"), "");
        assert_eq!(
            section,
            "\n--- BEGIN POST-CHANGE CONTENT (FULL) ---\na\nb\n--- END POST-CHANGE CONTENT ---\n"
        );
    }

    #[test]
    fn windowed_mode_includes_excerpts() {
        let section = content_section(ContextMode::Windowed, Some("ignored"), "EXCERPTS");
        assert!(section.contains("--- BEGIN POST-CHANGE EXCERPTS (WINDOWED) ---\nEXCERPTS\n"));
        assert!(!section.contains("ignored"));
    }

    #[test]
    fn windowed_without_excerpts_has_no_content() {
        let section = content_section(ContextMode::Windowed, Some("x"), "");
        assert_eq!(section, "\n(No post-change content included.)\n");
    }

    #[test]
    fn repository_defaults_to_unknown() {
        let f = file();
        let mut c = ctx(&f, "");
        c.repository = None;
        assert_eq!(PromptTemplate::new("{{REPOSITORY}}").render(&c).lines().next(), Some("unknown"));
    }

    #[tokio::test]
    async fn load_falls_back_to_builtin() {
        let template = PromptTemplate::load(Some(Path::new("/nonexistent/template.md"))).await;
        assert_eq!(template, PromptTemplate::builtin());
        assert_eq!(PromptTemplate::load(None).await, PromptTemplate::builtin());
    }

    #[tokio::test]
    async fn load_custom_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.md");
        std::fs::write(&path, "Custom {{FILE_PATH}}").unwrap();
        let template = PromptTemplate::load(Some(&path)).await;
        assert_eq!(template.source(), "Custom {{FILE_PATH}}");
    }

    #[tokio::test]
    async fn policy_loads_only_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("POLICY.md"), "Be strict.").unwrap();
        let mut config = PolicyConfig {
            enabled: false,
            path: Some("POLICY.md".into()),
            scope: "repo".into(),
        };
        assert!(Policy::load(&config, dir.path()).await.is_none());

        config.enabled = true;
        let policy = Policy::load(&config, dir.path()).await.unwrap();
        assert_eq!(policy.text, "Be strict.");
        assert_eq!(policy.scope, "repo");

        config.path = Some("MISSING.md".into());
        assert!(Policy::load(&config, dir.path()).await.is_none());
    }
}
