//! Path templates: `/medical-records/:id` style patterns matched by segment
//! count and literal-segment equality. Parameter segments match any non-empty
//! segment. Specificity is the parameter count; fewer parameters wins.

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Parse a template. Must start with `/`; empty segments (double slashes)
    /// and unnamed parameters (`:`) are configuration errors.
    pub fn parse(raw: &str) -> AppResult<Self> {
        if !raw.starts_with('/') {
            return Err(AppError::config(
                "bad_template".to_string(),
                format!("path template must start with '/': {raw}"),
            ));
        }
        let mut segments = Vec::new();
        if raw != "/" {
            for seg in raw[1..].split('/') {
                if seg.is_empty() {
                    return Err(AppError::config(
                        "bad_template".to_string(),
                        format!("empty segment in path template: {raw}"),
                    ));
                }
                if let Some(name) = seg.strip_prefix(':') {
                    if name.is_empty() {
                        return Err(AppError::config(
                            "bad_template".to_string(),
                            format!("unnamed parameter in path template: {raw}"),
                        ));
                    }
                    segments.push(Segment::Param(name.to_string()));
                } else {
                    segments.push(Segment::Literal(seg.to_string()));
                }
            }
        }
        Ok(Self { raw: raw.to_string(), segments })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of parameter segments. Lower means more specific.
    pub fn param_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Param(_)))
            .count()
    }

    pub fn matches(&self, path_segments: &[&str]) -> bool {
        if path_segments.len() != self.segments.len() {
            return false;
        }
        self.segments
            .iter()
            .zip(path_segments)
            .all(|(seg, got)| match seg {
                Segment::Literal(lit) => lit == got,
                Segment::Param(_) => !got.is_empty(),
            })
    }

    /// True when some concrete path could match both templates. Used by the
    /// startup ambiguity check.
    pub fn overlaps(&self, other: &PathTemplate) -> bool {
        if self.segments.len() != other.segments.len() {
            return false;
        }
        self.segments
            .iter()
            .zip(other.segments.iter())
            .all(|(a, b)| match (a, b) {
                (Segment::Literal(x), Segment::Literal(y)) => x == y,
                _ => true,
            })
    }
}

/// Split a concrete request path into segments: the query string is ignored,
/// a trailing slash is insignificant (except for the root path itself).
pub fn split_path(path: &str) -> Vec<&str> {
    let path = path.split('?').next().unwrap_or(path);
    let path = path.strip_prefix('/').unwrap_or(path);
    let path = path.strip_suffix('/').unwrap_or(path);
    if path.is_empty() {
        Vec::new()
    } else {
        path.split('/').collect()
    }
}
