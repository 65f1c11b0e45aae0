//! Repository context policy.
//!
//! Everything the shell needs to ask the context builder (repomix) for a
//! repository snapshot, and to make sense of what comes back: the file
//! selection globs, the command-line arguments, repository location checks,
//! the size policy and the failure classification.

use regex::Regex;
use std::sync::OnceLock;

use crate::docker::ErrorCategory;

/// Source and manifest files sent to the model.
pub const INCLUDE_PATTERNS: &[&str] = &[
    "**/*.py",
    "**/*.js",
    "**/*.ts",
    "**/*.java",
    "**/*.go",
    "**/*.rb",
    "**/*.php",
    "**/*.cs",
    "**/*.rs",
    "**/*.c",
    "**/*.cpp",
    "**/*.h",
    "**/package.json",
    "**/requirements.txt",
    "**/Gemfile",
    "**/build.gradle",
    "**/pom.xml",
    "**/.env.example",
    "**/docker*",
    "**/Dockerfile*",
    "**/docker-compose*",
    "**/*.toml",
    "**/*.yaml",
    "**/*.yml",
    "**/Cargo.toml",
    "**/go.mod",
    "**/go.sum",
    "**/README.md",
];

/// Build output, dependencies, tests, binary assets and docs.
pub const IGNORE_PATTERNS: &[&str] = &[
    "**/node_modules/**",
    "**/.git/**",
    "**/venv/**",
    "**/__pycache__/**",
    "**/test/**",
    "**/tests/**",
    "**/*.test.*",
    "**/*.spec.*",
    "**/dist/**",
    "**/build/**",
    "**/target/**",
    "**/docs/**",
    "**/*.md",
    "**/*.jpg",
    "**/*.png",
    "**/*.gif",
    "**/*.svg",
    "**/*.ico",
    "**/*.pdf",
    "**/*.zip",
    "**/*.tar.gz",
];

/// Default upper bound on the context handed to the model, in characters.
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 400_000;

/// Appended to a context that was cut to fit the size bound.
pub const TRUNCATION_MARKER: &str = "\n<!-- context truncated -->\n";

/// Output style requested from repomix. File counting relies on its
/// `<file path="...">` entries.
const OUTPUT_STYLE: &str = "xml";

/// File selection policy handed to the context builder.
#[derive(Debug, Clone)]
pub struct ContextOptions {
    pub include: Vec<String>,
    pub ignore: Vec<String>,
    pub remove_comments: bool,
    pub remove_empty_lines: bool,
    /// Optional instruction file embedded in the output.
    pub instruction_file: Option<String>,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            include: INCLUDE_PATTERNS.iter().map(|p| p.to_string()).collect(),
            ignore: IGNORE_PATTERNS.iter().map(|p| p.to_string()).collect(),
            remove_comments: true,
            remove_empty_lines: true,
            instruction_file: None,
        }
    }
}

/// Build the repomix arguments for a remote repository.
pub fn repomix_args(repo_url: &str, output_path: &str, options: &ContextOptions) -> Vec<String> {
    let mut args = vec![
        "--remote".to_string(),
        repo_url.to_string(),
        "--style".to_string(),
        OUTPUT_STYLE.to_string(),
        "--output".to_string(),
        output_path.to_string(),
    ];

    if !options.include.is_empty() {
        args.push("--include".to_string());
        args.push(options.include.join(","));
    }

    if !options.ignore.is_empty() {
        args.push("--ignore".to_string());
        args.push(options.ignore.join(","));
    }

    if options.remove_comments {
        args.push("--remove-comments".to_string());
    }

    if options.remove_empty_lines {
        args.push("--remove-empty-lines".to_string());
    }

    if let Some(path) = &options.instruction_file {
        args.push("--instruction-file-path".to_string());
        args.push(path.clone());
    }

    args
}

/// Repository location rejected before any I/O happens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryUrlError {
    #[error("Repository URL is required")]
    Empty,

    #[error("Invalid repository URL '{0}': expected https://<host>/<owner>/<repo> or <owner>/<repo>")]
    Malformed(String),
}

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^https?://[A-Za-z0-9.-]+(:\d+)?/[A-Za-z0-9][A-Za-z0-9_.-]*/[A-Za-z0-9][A-Za-z0-9_.-]*(/\S*)?$",
        )
        .expect("valid regex")
    })
}

fn shorthand_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Segments start with an alphanumeric, so `.`, `..` and flag-like values never match.
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*/[A-Za-z0-9][A-Za-z0-9_.-]*$")
            .expect("valid regex")
    })
}

/// Check that a repository location looks fetchable.
///
/// Accepts full http(s) URLs with an owner and repository segment, and the
/// `owner/repo` shorthand repomix understands. Returns the trimmed location.
pub fn validate_repository_url(repo_url: &str) -> Result<&str, RepositoryUrlError> {
    let trimmed = repo_url.trim();

    if trimmed.is_empty() {
        return Err(RepositoryUrlError::Empty);
    }

    if url_regex().is_match(trimmed) || shorthand_regex().is_match(trimmed) {
        Ok(trimmed)
    } else {
        Err(RepositoryUrlError::Malformed(trimmed.to_string()))
    }
}

/// Flattened repository plus summary counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryContext {
    pub content: String,
    pub total_files: usize,
    pub total_tokens: usize,
    /// Whether the content was cut to fit the size bound.
    pub truncated: bool,
}

impl RepositoryContext {
    /// Build a context from raw builder output, applying the size bound.
    ///
    /// Counters describe what is kept, not what repomix produced.
    pub fn from_output(output: String, max_chars: usize) -> Self {
        let (content, truncated) = truncate_context(output, max_chars);
        let total_files = count_files(&content);
        let total_tokens = estimate_tokens(&content);

        Self {
            content,
            total_files,
            total_tokens,
            truncated,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// Number of `<file path="...">` entries in an XML-style output.
pub fn count_files(output: &str) -> usize {
    output.matches("<file path=").count()
}

/// Rough token estimate, four characters per token.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// Cut `text` to at most `max_chars` characters, marking the cut.
///
/// A `max_chars` of zero disables the bound.
pub fn truncate_context(text: String, max_chars: usize) -> (String, bool) {
    if max_chars == 0 {
        return (text, false);
    }

    match text.char_indices().nth(max_chars) {
        None => (text, false),
        Some((byte_index, _)) => {
            let mut cut = text[..byte_index].to_string();
            cut.push_str(TRUNCATION_MARKER);
            (cut, true)
        }
    }
}

/// Typed failure categories of the context builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextFailure {
    NotFound,
    RateLimited,
    InvalidConfig,
    Other,
}

impl ContextFailure {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ContextFailure::NotFound => ErrorCategory::NotFound,
            ContextFailure::RateLimited => ErrorCategory::RateLimited,
            ContextFailure::InvalidConfig => ErrorCategory::FatalInternal,
            ContextFailure::Other => ErrorCategory::GenericInternal,
        }
    }
}

/// Map a context builder failure message to its category.
///
/// The builder only reports failures as text, so this is the one place that
/// looks at message contents.
pub fn classify_context_failure(message: &str) -> ContextFailure {
    let lower = message.to_lowercase();

    if lower.contains("instruction_file_path") || lower.contains("instruction file") {
        ContextFailure::InvalidConfig
    } else if lower.contains("rate limit") {
        ContextFailure::RateLimited
    } else if lower.contains("not found") || lower.contains("404") {
        ContextFailure::NotFound
    } else {
        ContextFailure::Other
    }
}

/// Failure reported by the context builder.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ContextError {
    pub kind: ContextFailure,
    pub message: String,
}

impl ContextError {
    pub fn new(kind: ContextFailure, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Build an error from a free-text failure message.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind: classify_context_failure(&message),
            message,
        }
    }

    /// Client-facing detail for this failure.
    ///
    /// Never includes the builder's own output; that belongs in logs.
    pub fn detail(&self, repo_url: &str) -> String {
        match self.kind {
            ContextFailure::InvalidConfig => {
                "Failed to process repository: Custom instruction file could not be loaded."
                    .to_string()
            }
            ContextFailure::RateLimited => {
                "Repository processing rate limit exceeded. Please try again later.".to_string()
            }
            ContextFailure::NotFound => format!(
                "Repository not found: {}. Please check the URL and ensure it's a public repository.",
                repo_url
            ),
            ContextFailure::Other => "Failed to process repository.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ============================================================================
    // repomix_args tests
    // ============================================================================

    #[test]
    fn test_default_args() {
        let args = repomix_args(
            "https://github.com/a/b",
            "/tmp/out.xml",
            &ContextOptions::default(),
        );

        assert_eq!(
            &args[..6],
            &[
                "--remote",
                "https://github.com/a/b",
                "--style",
                "xml",
                "--output",
                "/tmp/out.xml"
            ]
        );
        assert!(args.contains(&"--remove-comments".to_string()));
        assert!(args.contains(&"--remove-empty-lines".to_string()));
        assert!(!args.contains(&"--instruction-file-path".to_string()));

        let include_index = args.iter().position(|a| a == "--include").unwrap();
        assert!(args[include_index + 1].contains("**/Cargo.toml"));
        let ignore_index = args.iter().position(|a| a == "--ignore").unwrap();
        assert!(args[ignore_index + 1].starts_with("**/node_modules/**,"));
    }

    #[test]
    fn test_args_without_patterns_and_with_instruction_file() {
        let options = ContextOptions {
            include: vec![],
            ignore: vec![],
            remove_comments: false,
            remove_empty_lines: false,
            instruction_file: Some("repomix_instructions.md".to_string()),
            ..ContextOptions::default()
        };

        let args = repomix_args("a/b", "out.xml", &options);
        assert_eq!(
            args,
            vec![
                "--remote",
                "a/b",
                "--style",
                "xml",
                "--output",
                "out.xml",
                "--instruction-file-path",
                "repomix_instructions.md"
            ]
        );
    }

    // ============================================================================
    // validate_repository_url tests
    // ============================================================================

    #[test]
    fn test_valid_repository_urls() {
        for url in [
            "https://github.com/owner/repo",
            "https://github.com/owner/repo.git",
            "http://gitlab.example.com:8080/group/project/tree/main",
            "owner/repo",
            "  https://github.com/owner/repo  ",
        ] {
            assert!(validate_repository_url(url).is_ok(), "{url}");
        }
    }

    #[test]
    fn test_repository_url_is_trimmed() {
        assert_eq!(
            validate_repository_url(" owner/repo\n").unwrap(),
            "owner/repo"
        );
    }

    #[test]
    fn test_invalid_repository_urls() {
        assert_eq!(validate_repository_url("   "), Err(RepositoryUrlError::Empty));

        for url in [
            "not a url",
            "https://github.com",
            "https://github.com/owner",
            "ftp://github.com/owner/repo",
            "owner/repo/extra",
            "--remote=evil",
            "../..",
            "./.",
            "-v/--help",
            "https://github.com/../repo",
            "https://github.com/-x/repo",
        ] {
            assert!(
                matches!(
                    validate_repository_url(url),
                    Err(RepositoryUrlError::Malformed(_))
                ),
                "{url}"
            );
        }
    }

    // ============================================================================
    // RepositoryContext tests
    // ============================================================================

    #[test]
    fn test_context_counters() {
        let output = "<files>\n<file path=\"a.py\">x</file>\n<file path=\"b.py\">y</file>\n</files>"
            .to_string();
        let context = RepositoryContext::from_output(output.clone(), DEFAULT_MAX_CONTEXT_CHARS);

        assert_eq!(context.total_files, 2);
        assert_eq!(context.total_tokens, output.chars().count().div_ceil(4));
        assert!(!context.truncated);
        assert_eq!(context.content, output);
    }

    #[test]
    fn test_truncated_context_counts_kept_files() {
        let output = "<file path=\"a.py\">x</file><file path=\"b.py\">y</file>".to_string();
        let context = RepositoryContext::from_output(output, 30);

        assert!(context.truncated);
        assert_eq!(context.total_files, 1);
    }

    #[test]
    fn test_blank_context_is_empty() {
        let context = RepositoryContext::from_output(" \n\t".to_string(), 100);
        assert!(context.is_empty());
    }

    #[test]
    fn test_truncate_context_within_bound() {
        let (text, truncated) = truncate_context("hello".to_string(), 5);
        assert_eq!(text, "hello");
        assert!(!truncated);
    }

    #[test]
    fn test_truncate_context_over_bound() {
        let (text, truncated) = truncate_context("héllo world".to_string(), 4);
        assert_eq!(text, format!("héll{}", TRUNCATION_MARKER));
        assert!(truncated);
    }

    #[test]
    fn test_truncate_context_disabled() {
        let (text, truncated) = truncate_context("a".repeat(10), 0);
        assert_eq!(text.len(), 10);
        assert!(!truncated);
    }

    // ============================================================================
    // classify_context_failure tests
    // ============================================================================

    #[test]
    fn test_classify_instruction_file_failures() {
        assert_eq!(
            classify_context_failure("invalid instruction_file_path: repomix_instructions.md"),
            ContextFailure::InvalidConfig
        );
        assert_eq!(
            classify_context_failure("Instruction file could not be read"),
            ContextFailure::InvalidConfig
        );
    }

    #[test]
    fn test_classify_rate_limit() {
        assert_eq!(
            classify_context_failure("GitHub API Rate Limit exceeded"),
            ContextFailure::RateLimited
        );
    }

    #[test]
    fn test_classify_not_found() {
        assert_eq!(
            classify_context_failure("Repository Not Found"),
            ContextFailure::NotFound
        );
        assert_eq!(
            classify_context_failure("git clone failed with HTTP 404"),
            ContextFailure::NotFound
        );
    }

    #[test]
    fn test_classify_other() {
        assert_eq!(
            classify_context_failure("disk full"),
            ContextFailure::Other
        );
    }

    #[test]
    fn test_classification_precedence() {
        // Instruction file problems win over everything else.
        assert_eq!(
            classify_context_failure("instruction file not found"),
            ContextFailure::InvalidConfig
        );
        assert_eq!(
            classify_context_failure("rate limit reached while resolving: not found"),
            ContextFailure::RateLimited
        );
    }

    #[test]
    fn test_failure_categories() {
        assert_eq!(ContextFailure::NotFound.category(), ErrorCategory::NotFound);
        assert_eq!(
            ContextFailure::RateLimited.category(),
            ErrorCategory::RateLimited
        );
        assert_eq!(
            ContextFailure::InvalidConfig.category(),
            ErrorCategory::FatalInternal
        );
        assert_eq!(
            ContextFailure::Other.category(),
            ErrorCategory::GenericInternal
        );
    }

    #[test]
    fn test_context_error_detail() {
        let err = ContextError::from_message("remote repository not found");
        assert_eq!(err.kind, ContextFailure::NotFound);
        assert!(err
            .detail("https://github.com/a/b")
            .starts_with("Repository not found: https://github.com/a/b."));

        let err = ContextError::from_message("boom");
        assert_eq!(err.detail("a/b"), "Failed to process repository.");
    }

    #[test]
    fn test_context_error_detail_hides_builder_output() {
        let err = ContextError::from_message(
            "Error: spawn git ENOENT\n    at ChildProcess._handle.onexit (node:internal/child_process:284:19)\n    at onErrorNT (node:internal/child_process:477:16)",
        );
        assert_eq!(err.kind, ContextFailure::Other);

        let detail = err.detail("a/b");
        assert!(!detail.contains("node:internal"));
        assert!(!detail.contains("ENOENT"));
        assert!(!detail.contains('\n'));
    }
}
