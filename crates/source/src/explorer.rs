//! Bounded, scored traversal of a remote repository tree.
//!
//! The explorer answers one question under a strict budget: which handful of
//! files best describe the repository's API surface? Traversal is depth-
//! bounded, vendor and build directories are pruned unconditionally, and
//! candidates are scored by path heuristics before any content is fetched.
//! Download order is deterministic regardless of completion order.

use crate::error::{Result, SourceError};
use crate::github::{CodeHost, TreeEntry};
use futures::StreamExt as _;
use toolforge_codegen::SourceFile;
use tracing::{debug, warn};

/// File suffixes eligible for selection, across the languages API servers
/// are commonly written in.
pub const SOURCE_EXTENSIONS: &[&str] = &[
    "js", "jsx", "ts", "tsx", "py", "rb", "go", "java", "rs", "php", "cs", "kt",
];

/// Filenames that are API specifications in their own right.
pub const SPEC_FILENAMES: &[&str] = &[
    "openapi.json",
    "openapi.yaml",
    "openapi.yml",
    "swagger.json",
    "swagger.yaml",
    "swagger.yml",
    "api.json",
    "api.yaml",
];

/// Path keywords that suggest API-relevant code, +10 each.
const API_KEYWORDS: &[&str] = &[
    "api", "route", "handler", "controller", "endpoint", "server", "rest", "service",
    "middleware", "urls", "views",
];

/// Directories explored before their siblings, so high-value files are found
/// before the budgets exhaust.
const PRIORITY_DIRS: &[&str] = &[
    "api", "server", "routes", "src", "app", "controllers", "handlers", "services", "lib",
];

/// Directories never descended into or selected from.
const PRUNED_DIRS: &[&str] = &[
    "node_modules",
    "vendor",
    "dist",
    "build",
    "target",
    "out",
    "coverage",
    "__pycache__",
    "venv",
    "deps",
    "third_party",
];

#[derive(Debug, Clone)]
pub struct ExplorerConfig {
    /// Directories deeper than this are never listed (root is depth 0).
    pub max_depth: usize,
    /// Files selected for download.
    pub max_files: usize,
    /// Per-file content cap; longer files are truncated, not rejected.
    pub per_file_bytes: usize,
    /// Cumulative content cap; downloads stop the moment it is reached.
    pub total_bytes: usize,
    /// Concurrent downloads.
    pub concurrency: usize,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_files: 15,
            per_file_bytes: 8 * 1024,
            total_bytes: 50 * 1024,
            concurrency: 4,
        }
    }
}

#[derive(Debug, Clone)]
struct Candidate {
    path: String,
    score: i32,
    download_url: Option<String>,
}

pub struct Explorer<'a> {
    host: &'a CodeHost,
    config: ExplorerConfig,
}

impl<'a> Explorer<'a> {
    #[must_use]
    pub fn new(host: &'a CodeHost, config: ExplorerConfig) -> Self {
        Self { host, config }
    }

    /// Selects and downloads the highest-scoring file subset of a repository.
    ///
    /// # Errors
    ///
    /// [`SourceError::RepoExploration`] when no candidate file exists or no
    /// download succeeds; listing the repository root propagates fetch
    /// errors as-is.
    pub async fn explore(&self, owner: &str, repo: &str) -> Result<Vec<SourceFile>> {
        let candidates = self.collect_candidates(owner, repo).await?;
        if candidates.is_empty() {
            return Err(self.exploration_failure("no candidate files matched"));
        }

        let mut selected = candidates;
        sort_candidates(&mut selected);
        selected.truncate(self.config.max_files);
        debug!(
            candidates = selected.len(),
            top = selected.first().map(|c| c.path.as_str()).unwrap_or(""),
            "downloading selected files"
        );

        let files = self.download_selected(selected).await?;
        Ok(files)
    }

    /// Depth-first traversal, priority directories first, pruned
    /// unconditionally, stopping once enough scoring candidates exist.
    async fn collect_candidates(&self, owner: &str, repo: &str) -> Result<Vec<Candidate>> {
        // Found-enough bound: twice the file cap of above-zero candidates.
        let enough = self.config.max_files * 2;
        let mut candidates: Vec<Candidate> = Vec::new();
        let mut positive = 0usize;
        let mut stack: Vec<(String, usize)> = vec![(String::new(), 0)];
        let mut first_listing = true;

        while let Some((dir, depth)) = stack.pop() {
            if positive >= enough {
                break;
            }

            let entries = match self.host.list_dir(owner, repo, &dir).await {
                Ok(entries) => entries,
                // A dead root is fatal; a dead subdirectory is not.
                Err(e) if first_listing => return Err(e),
                Err(e) => {
                    warn!(dir, error = %e, "directory listing failed, skipping");
                    continue;
                }
            };
            first_listing = false;

            let mut dirs: Vec<&TreeEntry> = Vec::new();
            for entry in &entries {
                if entry.name.starts_with('.') || is_pruned_dir(&entry.name) {
                    continue;
                }
                if entry.is_dir() {
                    if depth < self.config.max_depth {
                        dirs.push(entry);
                    }
                    continue;
                }
                if !is_candidate_file(&entry.name) {
                    continue;
                }
                let score = score_path(&entry.path, &entry.name);
                if score > 0 {
                    positive += 1;
                }
                candidates.push(Candidate {
                    path: entry.path.clone(),
                    score,
                    download_url: entry.download_url.clone(),
                });
            }

            // Stack order: push low-priority dirs first so priority ones pop
            // next.
            dirs.sort_by_key(|d| std::cmp::Reverse(dir_priority(&d.name)));
            for d in dirs {
                stack.push((d.path.clone(), depth + 1));
            }
        }

        Ok(candidates)
    }

    /// Downloads in score order with bounded concurrency, enforcing the
    /// cumulative byte cap in that same order.
    async fn download_selected(&self, selected: Vec<Candidate>) -> Result<Vec<SourceFile>> {
        let per_file = self.config.per_file_bytes;
        let downloads = futures::stream::iter(selected.into_iter().map(|candidate| async move {
            let Some(url) = candidate.download_url.clone() else {
                return (candidate, Err(self.exploration_failure("entry has no download URL")));
            };
            let result = self.host.download(&url, per_file).await;
            (candidate, result)
        }))
        .buffered(self.config.concurrency.max(1));
        futures::pin_mut!(downloads);

        let mut files: Vec<(Candidate, String)> = Vec::new();
        let mut attempted = 0usize;
        let mut failed = 0usize;
        let mut total = 0usize;

        // `buffered` yields in submission order, so the cap cuts the list at
        // a deterministic point even though downloads overlap.
        while let Some((candidate, result)) = downloads.next().await {
            attempted += 1;
            match result {
                Ok(mut content) => {
                    let room = self.config.total_bytes - total;
                    truncate_at_char_boundary(&mut content, room);
                    total += content.len();
                    files.push((candidate, content));
                    if total >= self.config.total_bytes {
                        debug!(total, "cumulative content cap reached, stopping downloads");
                        break;
                    }
                }
                Err(e) => {
                    failed += 1;
                    warn!(path = candidate.path, error = %e, "file download failed");
                }
            }
        }

        if files.is_empty() {
            return Err(self.exploration_failure("every file download failed"));
        }
        if failed * 2 > attempted {
            warn!(
                failed,
                attempted, "more than half of the file downloads failed; continuing with partial set"
            );
        }

        // Deterministic output order, independent of download completion.
        files.sort_by(|(a, _), (b, _)| {
            b.score.cmp(&a.score).then_with(|| a.path.cmp(&b.path))
        });
        Ok(files
            .into_iter()
            .map(|(candidate, content)| SourceFile {
                path: candidate.path,
                content,
            })
            .collect())
    }

    fn exploration_failure(&self, reason: &str) -> SourceError {
        SourceError::RepoExploration {
            reason: reason.to_string(),
            extensions: SOURCE_EXTENSIONS.join(", "),
        }
    }
}

fn is_pruned_dir(name: &str) -> bool {
    PRUNED_DIRS.contains(&name.to_ascii_lowercase().as_str())
}

fn is_candidate_file(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    if SPEC_FILENAMES.contains(&lower.as_str()) {
        return true;
    }
    lower
        .rsplit_once('.')
        .is_some_and(|(_, ext)| SOURCE_EXTENSIONS.contains(&ext))
}

/// Path-heuristic score; content is never inspected before selection.
fn score_path(path: &str, name: &str) -> i32 {
    let lower_path = path.to_ascii_lowercase();
    let lower_name = name.to_ascii_lowercase();
    let mut score = 0i32;

    for keyword in API_KEYWORDS {
        if lower_path.contains(keyword) {
            score += 10;
        }
    }
    if SPEC_FILENAMES.contains(&lower_name.as_str()) {
        score += 50;
    }
    if lower_path.contains("test") || lower_path.contains("spec.") || lower_path.contains(".spec")
    {
        score -= 5;
    }
    // Defence in depth below the unconditional prune.
    if PRUNED_DIRS
        .iter()
        .any(|d| lower_path.split('/').any(|seg| seg == *d))
    {
        score -= 100;
    }
    score
}

fn dir_priority(name: &str) -> i32 {
    let lower = name.to_ascii_lowercase();
    match PRIORITY_DIRS.iter().position(|d| *d == lower) {
        Some(idx) => PRIORITY_DIRS.len() as i32 - idx as i32,
        None => 0,
    }
}

/// `String::truncate` on the nearest char boundary at or below `max_bytes`.
fn truncate_at_char_boundary(s: &mut String, max_bytes: usize) {
    if s.len() <= max_bytes {
        return;
    }
    let mut cut = max_bytes;
    while cut > 0 && !s.is_char_boundary(cut) {
        cut -= 1;
    }
    s.truncate(cut);
}

fn sort_candidates(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.path.cmp(&b.path)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_filenames_dominate_keyword_scores() {
        let spec = score_path("docs/openapi.yaml", "openapi.yaml");
        let routes = score_path("src/api/routes/users.js", "users.js");
        assert!(spec >= 50);
        assert!(routes >= 20);
        assert!(spec > routes);
    }

    #[test]
    fn test_files_score_below_their_source() {
        let source = score_path("src/api/handler.js", "handler.js");
        let test = score_path("src/api/handler.test.js", "handler.test.js");
        assert!(test < source);
    }

    #[test]
    fn vendor_paths_score_deeply_negative() {
        assert!(score_path("node_modules/express/index.js", "index.js") <= -100);
    }

    #[test]
    fn candidate_filter_accepts_sources_and_specs_only() {
        assert!(is_candidate_file("server.py"));
        assert!(is_candidate_file("openapi.yaml"));
        assert!(is_candidate_file("OpenAPI.YAML"));
        assert!(!is_candidate_file("logo.png"));
        assert!(!is_candidate_file("README.md"));
        assert!(!is_candidate_file("Makefile"));
    }

    #[test]
    fn priority_dirs_sort_before_others() {
        assert!(dir_priority("api") > dir_priority("docs"));
        assert!(dir_priority("server") > dir_priority("misc"));
        assert_eq!(dir_priority("docs"), dir_priority("misc"));
    }

    #[test]
    fn char_boundary_truncation_never_splits_a_codepoint() {
        let mut s = "héllo".to_string();
        truncate_at_char_boundary(&mut s, 2);
        assert_eq!(s, "h");
        let mut s = "héllo".to_string();
        truncate_at_char_boundary(&mut s, 100);
        assert_eq!(s, "héllo");
    }

    #[test]
    fn candidate_sort_is_deterministic_on_ties() {
        let mut candidates = vec![
            Candidate {
                path: "b.js".to_string(),
                score: 10,
                download_url: None,
            },
            Candidate {
                path: "a.js".to_string(),
                score: 10,
                download_url: None,
            },
            Candidate {
                path: "c.js".to_string(),
                score: 50,
                download_url: None,
            },
        ];
        sort_candidates(&mut candidates);
        let paths: Vec<_> = candidates.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["c.js", "a.js", "b.js"]);
    }
}
