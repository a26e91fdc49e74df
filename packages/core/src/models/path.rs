//! Store Path Grammar
//!
//! Hierarchical document stores address everything with `/`-delimited paths
//! where collections and documents alternate, starting with a collection at
//! the root:
//!
//! ```text
//! users                     -> collection (1 segment)
//! users/alice               -> document   (2 segments)
//! users/alice/posts         -> collection (3 segments)
//! users/alice/posts/p1      -> document   (4 segments)
//! ```
//!
//! Classification is a pure function of the path string. No I/O happens here.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Path separator used by the store
pub const PATH_SEPARATOR: char = '/';

/// Maximum length of a single path segment, in bytes
pub const MAX_SEGMENT_BYTES: usize = 1500;

/// A path the store's grammar rejects
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid store path '{path}': {reason}")]
pub struct InvalidPathError {
    pub path: String,
    pub reason: String,
}

impl InvalidPathError {
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// A validated, segment-split store path
///
/// The empty path denotes the store root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StorePath {
    segments: Vec<String>,
}

impl StorePath {
    /// The store root (no segments)
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a `/`-delimited path, validating every segment
    ///
    /// Leading and trailing separators are ignored, so `"/users/alice/"`
    /// parses the same as `"users/alice"`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPathError` if the path contains an empty interior
    /// segment (`a//b`), a `.` or `..` segment, a reserved `__name__` segment,
    /// or a segment longer than [`MAX_SEGMENT_BYTES`].
    pub fn parse(raw: &str) -> Result<Self, InvalidPathError> {
        let trimmed = raw.trim();
        let inner = trimmed.strip_prefix(PATH_SEPARATOR).unwrap_or(trimmed);
        let inner = inner.strip_suffix(PATH_SEPARATOR).unwrap_or(inner);

        if inner.is_empty() {
            return Ok(Self::root());
        }

        let mut segments = Vec::new();
        for segment in inner.split(PATH_SEPARATOR) {
            validate_segment(raw, segment)?;
            segments.push(segment.to_string());
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Even, non-zero segment count
    pub fn is_document(&self) -> bool {
        !self.segments.is_empty() && self.segments.len() % 2 == 0
    }

    /// Odd segment count
    pub fn is_collection(&self) -> bool {
        self.segments.len() % 2 == 1
    }

    /// Last segment, or `None` for the root
    pub fn last_segment(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Path with the last segment removed (`None` for the root)
    pub fn parent(&self) -> Option<StorePath> {
        if self.segments.is_empty() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Append one already-validated child segment
    ///
    /// # Errors
    ///
    /// Returns `InvalidPathError` if `segment` violates the segment grammar or
    /// contains a separator.
    pub fn child(&self, segment: &str) -> Result<StorePath, InvalidPathError> {
        if segment.contains(PATH_SEPARATOR) {
            return Err(InvalidPathError::new(
                format!("{}/{}", self, segment),
                "segment must not contain '/'",
            ));
        }
        validate_segment(segment, segment)?;
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Ok(Self { segments })
    }

    /// True if `self` is a strict ancestor of `other`
    pub fn is_prefix_of(&self, other: &StorePath) -> bool {
        self.segments.len() < other.segments.len()
            && other.segments[..self.segments.len()] == self.segments[..]
    }
}

fn validate_segment(path: &str, segment: &str) -> Result<(), InvalidPathError> {
    if segment.is_empty() {
        return Err(InvalidPathError::new(path, "paths must not contain '//'"));
    }
    if segment == "." || segment == ".." {
        return Err(InvalidPathError::new(
            path,
            format!("segment '{}' is not allowed", segment),
        ));
    }
    if segment.len() > 4 && segment.starts_with("__") && segment.ends_with("__") {
        return Err(InvalidPathError::new(
            path,
            format!("segment '{}' is reserved", segment),
        ));
    }
    if segment.len() > MAX_SEGMENT_BYTES {
        return Err(InvalidPathError::new(
            path,
            format!("segment exceeds {} bytes", MAX_SEGMENT_BYTES),
        ));
    }
    Ok(())
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl TryFrom<String> for StorePath {
    type Error = InvalidPathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        StorePath::parse(&value)
    }
}

impl From<StorePath> for String {
    fn from(path: StorePath) -> Self {
        path.to_string()
    }
}

/// What a root path points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathClassification {
    StoreRoot,
    CollectionPath(StorePath),
    DocumentPath(StorePath),
}

/// Classify a root path by segment-count parity
///
/// `None`, the empty string, and a bare separator all denote the store root.
///
/// # Examples
///
/// ```rust
/// use treesnap_core::models::path::{classify, PathClassification};
///
/// assert_eq!(classify(None).unwrap(), PathClassification::StoreRoot);
/// assert!(matches!(classify(Some("users")).unwrap(), PathClassification::CollectionPath(_)));
/// assert!(matches!(classify(Some("users/alice")).unwrap(), PathClassification::DocumentPath(_)));
/// assert!(classify(Some("users//alice")).is_err());
/// ```
pub fn classify(root_path: Option<&str>) -> Result<PathClassification, InvalidPathError> {
    let path = match root_path {
        Some(raw) => StorePath::parse(raw)?,
        None => return Ok(PathClassification::StoreRoot),
    };

    Ok(if path.is_root() {
        PathClassification::StoreRoot
    } else if path.is_document() {
        PathClassification::DocumentPath(path)
    } else {
        PathClassification::CollectionPath(path)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_absent_paths_are_store_root() {
        assert_eq!(classify(None).unwrap(), PathClassification::StoreRoot);
        assert_eq!(classify(Some("")).unwrap(), PathClassification::StoreRoot);
        assert_eq!(classify(Some("/")).unwrap(), PathClassification::StoreRoot);
        assert_eq!(classify(Some("   ")).unwrap(), PathClassification::StoreRoot);
    }

    #[test]
    fn parity_decides_document_or_collection() {
        let cases = [
            ("c1", false),
            ("c1/d1", true),
            ("c1/d1/c2", false),
            ("c1/d1/c2/d2", true),
        ];

        for (raw, is_document) in cases {
            match classify(Some(raw)).unwrap() {
                PathClassification::DocumentPath(p) => {
                    assert!(is_document, "{} classified as document", raw);
                    assert_eq!(p.to_string(), raw);
                }
                PathClassification::CollectionPath(p) => {
                    assert!(!is_document, "{} classified as collection", raw);
                    assert_eq!(p.to_string(), raw);
                }
                PathClassification::StoreRoot => panic!("{} classified as root", raw),
            }
        }
    }

    #[test]
    fn surrounding_separators_are_ignored() {
        let path = StorePath::parse("/c1/d1/").unwrap();
        assert_eq!(path.to_string(), "c1/d1");
        assert!(path.is_document());
    }

    #[test]
    fn malformed_paths_are_rejected() {
        for raw in ["c1//d1", "c1/./d1", "c1/../d1", "c1/__meta__", "//c1"] {
            let err = classify(Some(raw)).unwrap_err();
            assert_eq!(err.path, raw);
        }

        let long = "x".repeat(MAX_SEGMENT_BYTES + 1);
        assert!(StorePath::parse(&long).is_err());
    }

    #[test]
    fn underscores_alone_are_not_reserved() {
        assert!(StorePath::parse("c1/__").is_ok());
        assert!(StorePath::parse("c1/____").is_ok());
        assert!(StorePath::parse("c1/__x").is_ok());
    }

    #[test]
    fn child_and_parent_navigation() {
        let coll = StorePath::parse("c1").unwrap();
        let doc = coll.child("d1").unwrap();
        assert_eq!(doc.to_string(), "c1/d1");
        assert_eq!(doc.parent().unwrap(), coll);
        assert_eq!(doc.last_segment(), Some("d1"));
        assert!(coll.is_prefix_of(&doc));
        assert!(!doc.is_prefix_of(&coll));
        assert!(coll.child("a/b").is_err());
        assert!(StorePath::root().parent().is_none());
    }

    #[test]
    fn serde_uses_string_form() {
        let path = StorePath::parse("c1/d1").unwrap();
        let json = serde_json::to_value(&path).unwrap();
        assert_eq!(json, serde_json::json!("c1/d1"));

        let back: StorePath = serde_json::from_value(json).unwrap();
        assert_eq!(back, path);

        let bad: Result<StorePath, _> = serde_json::from_value(serde_json::json!("a//b"));
        assert!(bad.is_err());
    }
}
