//! # Ignore Rule Matching (`common::ignore::matcher`)
//!
//! File: cli/src/common/ignore/matcher.rs
//!
//! ## Overview
//!
//! An [`IgnoreMatcher`] is an ordered list of compiled [`IgnoreRule`]s written in
//! gitignore syntax. It answers one question: is this path, relative to the
//! module root, excluded from the package?
//!
//! ## Evaluation
//!
//! - Rules are checked in the order they were added; the **last** rule that
//!   matches decides. A path no rule matches is included.
//! - A rule matches a path if it matches the path itself or any of the path's
//!   ancestor directories. `/vendor/` therefore matches `vendor/test`, and a
//!   later `!/build/keep.txt` can still re-include `build/keep.txt` under an
//!   earlier `/build/`.
//! - Directories are presented with a trailing separator (or `is_dir = true`)
//!   so that directory-only rules (`logs/`) can tell them apart from files.
//!
//! ## Rule syntax
//!
//! | Line            | Meaning                                              |
//! |-----------------|------------------------------------------------------|
//! | blank / `# ...` | skipped                                              |
//! | `!pattern`      | negation: re-include what matches                    |
//! | `/pattern`      | anchored to the module root                          |
//! | `a/b`           | any inner `/` also anchors                           |
//! | `pattern/`      | matches directories only                             |
//! | `name`          | no `/`: matches a segment at any depth               |
//! | `**`            | whole-segment wildcard across any depth              |
//!
use super::pattern::{segments_match, Segment};
use std::path::{Component, Path, MAIN_SEPARATOR};

/// A single compiled ignore line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreRule {
    /// The line as written, kept for diagnostics.
    pub line: String,
    pub negated: bool,
    pub dir_only: bool,
    pub anchored: bool,
    segments: Vec<Segment>,
}

impl IgnoreRule {
    /// Compiles one line. Returns `None` for blank lines, comments, and lines
    /// that reduce to nothing (`/`, `!`).
    pub fn parse(line: &str) -> Option<IgnoreRule> {
        let mut body = line.trim_end();
        // Keep a single trailing space if it was escaped.
        let escaped_space = body.ends_with('\\') && body.len() < line.len();
        let owned;
        if escaped_space {
            owned = format!("{} ", body);
            body = &owned;
        }

        if body.is_empty() || body.starts_with('#') {
            return None;
        }

        let negated = body.starts_with('!');
        if negated {
            body = &body[1..];
        }

        let dir_only = body.ends_with('/');
        let body = body.trim_end_matches('/');
        if body.is_empty() {
            return None;
        }

        let anchored = body.contains('/');
        let mut segments: Vec<Segment> = body
            .trim_start_matches('/')
            .split('/')
            .filter(|piece| !piece.is_empty())
            .map(Segment::compile)
            .collect();
        if segments.is_empty() {
            return None;
        }
        if !anchored {
            segments.insert(0, Segment::AnyDepth);
        }

        Some(IgnoreRule {
            line: line.to_string(),
            negated,
            dir_only,
            anchored,
            segments,
        })
    }

    /// Whether this rule matches `path` exactly (ancestors are the caller's job).
    fn matches_exact(&self, path: &[&str], is_dir: bool) -> bool {
        if self.dir_only && !is_dir {
            return false;
        }
        segments_match(&self.segments, path)
    }

    /// Whether this rule matches `path` or one of its ancestor directories.
    fn matches(&self, path: &[&str], is_dir: bool) -> bool {
        (1..=path.len()).any(|depth| {
            let candidate_is_dir = depth < path.len() || is_dir;
            self.matches_exact(&path[..depth], candidate_is_dir)
        })
    }
}

/// An ordered, last-match-wins set of ignore rules.
#[derive(Debug, Clone, Default)]
pub struct IgnoreMatcher {
    rules: Vec<IgnoreRule>,
}

impl IgnoreMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a matcher from pattern lines, in order.
    pub fn from_patterns<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut matcher = Self::new();
        matcher.extend(lines);
        matcher
    }

    /// Appends one line. Returns `false` if the line held no rule.
    pub fn add(&mut self, line: &str) -> bool {
        match IgnoreRule::parse(line) {
            Some(rule) => {
                self.rules.push(rule);
                true
            }
            None => false,
        }
    }

    /// Appends every line, in order.
    pub fn extend<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for line in lines {
            self.add(line.as_ref());
        }
    }

    pub fn rules(&self) -> &[IgnoreRule] {
        &self.rules
    }

    /// Decides a `/`-separated path relative to the module root.
    pub fn is_ignored(&self, relative: &str, is_dir: bool) -> bool {
        let segments: Vec<&str> = relative.split('/').filter(|s| !s.is_empty()).collect();
        self.is_ignored_segments(&segments, is_dir)
    }

    fn is_ignored_segments(&self, segments: &[&str], is_dir: bool) -> bool {
        if segments.is_empty() {
            return false;
        }
        let mut ignored = false;
        for rule in &self.rules {
            if rule.matches(segments, is_dir) {
                ignored = !rule.negated;
            }
        }
        ignored
    }

    /// # Match a Filesystem Path (`matches`)
    ///
    /// `path` may be absolute (under `root`) or already relative to `root`. A
    /// trailing separator marks the path as a directory.
    ///
    /// ```rust
    /// let matcher = IgnoreMatcher::from_patterns(["/pkg/"]);
    /// assert!(matcher.matches(Path::new("/src/mod/pkg/"), Path::new("/src/mod")));
    /// assert!(!matcher.matches(Path::new("/src/mod/pkg"), Path::new("/src/mod")));
    /// ```
    pub fn matches(&self, path: &Path, root: &Path) -> bool {
        let raw = path.as_os_str().to_string_lossy();
        let is_dir = raw.ends_with('/') || raw.ends_with(MAIN_SEPARATOR);
        let relative = path.strip_prefix(root).unwrap_or(path);
        let joined = relative
            .components()
            .filter_map(|component| match component {
                Component::Normal(part) => Some(part.to_string_lossy()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/");
        self.is_ignored(&joined, is_dir)
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_and_comment_lines_are_skipped() {
        let matcher = IgnoreMatcher::from_patterns(["", "   ", "# comment", "foo"]);
        assert_eq!(matcher.rules().len(), 1);
        assert!(IgnoreRule::parse("/").is_none());
        assert!(IgnoreRule::parse("!").is_none());
    }

    #[test]
    fn test_rule_flags() {
        let rule = IgnoreRule::parse("!/build/").unwrap();
        assert!(rule.negated);
        assert!(rule.dir_only);
        assert!(rule.anchored);

        let rule = IgnoreRule::parse("*.log").unwrap();
        assert!(!rule.negated && !rule.dir_only && !rule.anchored);

        let rule = IgnoreRule::parse("\\!important").unwrap();
        assert!(!rule.negated);
    }

    #[test]
    fn test_unanchored_pattern_matches_at_any_depth() {
        let matcher = IgnoreMatcher::from_patterns(["foo"]);
        assert!(matcher.is_ignored("foo", false));
        assert!(matcher.is_ignored("a/b/foo", false));
        assert!(matcher.is_ignored("a/foo/bar.txt", false));
        assert!(!matcher.is_ignored("bar", false));
    }

    #[test]
    fn test_anchored_pattern_matches_from_root_only() {
        let matcher = IgnoreMatcher::from_patterns(["/foo"]);
        assert!(matcher.is_ignored("foo", false));
        assert!(!matcher.is_ignored("a/foo", false));

        let matcher = IgnoreMatcher::from_patterns(["docs/*.md"]);
        assert!(matcher.is_ignored("docs/a.md", false));
        assert!(!matcher.is_ignored("x/docs/a.md", false));
    }

    #[test]
    fn test_directory_only_patterns() {
        let matcher = IgnoreMatcher::from_patterns(["logs/"]);
        assert!(matcher.is_ignored("logs", true));
        assert!(!matcher.is_ignored("logs", false));
        assert!(matcher.is_ignored("a/logs/today.txt", false));
    }

    #[test]
    fn test_children_of_ignored_directories_are_ignored() {
        let matcher = IgnoreMatcher::from_patterns(["/vendor/", "foo"]);
        assert!(matcher.is_ignored("vendor/test", false));
        assert!(matcher.is_ignored("foo", false));
        assert!(!matcher.is_ignored("bar", false));
    }

    #[test]
    fn test_negation_precedence() {
        let matcher = IgnoreMatcher::from_patterns(["/build/", "!/build/keep.txt"]);
        let root = Path::new("/");
        assert!(!matcher.matches(Path::new("/build/keep.txt"), root));
        assert!(matcher.matches(Path::new("/build/other.txt"), root));
        assert!(matcher.matches(Path::new("/build/"), root));
    }

    #[test]
    fn test_last_matching_rule_wins() {
        let matcher = IgnoreMatcher::from_patterns(["*.txt", "!keep.txt", "keep.txt"]);
        assert!(matcher.is_ignored("keep.txt", false));

        let matcher = IgnoreMatcher::from_patterns(["/**", "!/manifests/"]);
        assert!(!matcher.is_ignored("manifests/init.pp", false));
        assert!(matcher.is_ignored("spec/init_spec.rb", false));
    }

    #[test]
    fn test_matches_strips_root_and_detects_directories() {
        let matcher = IgnoreMatcher::from_patterns(["/pkg/"]);
        let root = Path::new("/tmp/my-module");
        assert!(matcher.matches(Path::new("/tmp/my-module/pkg/"), root));
        assert!(!matcher.matches(Path::new("/tmp/my-module/pkg"), root));
        assert!(matcher.matches(Path::new("pkg/"), root));
        assert!(matcher.matches(Path::new("/tmp/my-module/pkg/x.tar.gz"), root));
    }

    #[test]
    fn test_root_itself_is_never_ignored() {
        let matcher = IgnoreMatcher::from_patterns(["**"]);
        assert!(!matcher.is_ignored("", true));
        assert!(matcher.is_ignored("anything", false));
    }
}
