//! Dotted, optionally indexed field paths.
//!
//! `RxToOrder.Final Rx[1].od.sph` parses into four segments; the second
//! carries index 1. The first segment decides the domain: `exam.<name>`
//! addresses another exam of the visit, `visit.` and `patient.` address the
//! records, anything else is local to the current exam.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("empty field path")]
    Empty,
    #[error("empty segment in field path `{path}`")]
    EmptySegment { path: String },
    #[error("malformed index in field path `{path}`")]
    MalformedIndex { path: String },
    #[error("field path `{path}` names no exam")]
    MissingExam { path: String },
}

/// Where a path is rooted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathDomain {
    /// `exam.<name>.…`
    Exam(String),
    /// `visit.…`
    Visit,
    /// `patient.…`
    Patient,
    /// Relative to the current exam's value tree.
    Local,
}

/// One path step: a key with an optional list index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Segment {
    pub name: String,
    pub index: Option<usize>,
}

impl Segment {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            index: None,
        }
    }

    pub fn indexed(name: impl Into<String>, index: usize) -> Self {
        Self {
            name: name.into(),
            index: Some(index),
        }
    }

    fn parse(raw: &str, path: &str) -> Result<Self, PathError> {
        let Some(open) = raw.find('[') else {
            if raw.contains(']') {
                return Err(PathError::MalformedIndex { path: path.into() });
            }
            if raw.is_empty() {
                return Err(PathError::EmptySegment { path: path.into() });
            }
            return Ok(Self::new(raw));
        };
        let name = &raw[..open];
        let index = raw[open + 1..]
            .strip_suffix(']')
            .and_then(|digits| digits.parse::<usize>().ok())
            .ok_or_else(|| PathError::MalformedIndex { path: path.into() })?;
        if name.is_empty() {
            return Err(PathError::EmptySegment { path: path.into() });
        }
        Ok(Self::indexed(name, index))
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "{}[{}]", self.name, index),
            None => f.write_str(&self.name),
        }
    }
}

/// A parsed field path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    pub domain: PathDomain,
    pub segments: Vec<Segment>,
}

impl FieldPath {
    pub fn parse(path: &str) -> Result<Self, PathError> {
        if path.trim().is_empty() {
            return Err(PathError::Empty);
        }
        let mut segments = path
            .split('.')
            .map(|raw| Segment::parse(raw, path))
            .collect::<Result<Vec<_>, _>>()?;

        let head = &segments[0];
        let domain = match (head.name.as_str(), head.index) {
            ("exam", None) => {
                if segments.len() < 2 {
                    return Err(PathError::MissingExam { path: path.into() });
                }
                let exam = segments.remove(1);
                if exam.index.is_some() {
                    return Err(PathError::MalformedIndex { path: path.into() });
                }
                segments.remove(0);
                PathDomain::Exam(exam.name)
            }
            ("visit", None) => {
                segments.remove(0);
                PathDomain::Visit
            }
            ("patient", None) => {
                segments.remove(0);
                PathDomain::Patient
            }
            _ => PathDomain::Local,
        };
        Ok(Self { domain, segments })
    }

    pub fn local(segments: Vec<Segment>) -> Self {
        Self {
            domain: PathDomain::Local,
            segments,
        }
    }

    pub fn is_local(&self) -> bool {
        self.domain == PathDomain::Local
    }

    /// Segment names with indices removed.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(|segment| segment.name.as_str())
    }

    /// Same path with every index removed.
    #[must_use]
    pub fn without_indices(&self) -> Self {
        Self {
            domain: self.domain.clone(),
            segments: self
                .segments
                .iter()
                .map(|segment| Segment::new(segment.name.clone()))
                .collect(),
        }
    }

    /// Path of the parent node, `None` for an empty path.
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.segments.split_last()?;
        Some(Self {
            domain: self.domain.clone(),
            segments: rest.to_vec(),
        })
    }

    /// Appends a relative path (itself parsed as local).
    #[must_use]
    pub fn join(&self, relative: &FieldPath) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(relative.segments.iter().cloned());
        Self {
            domain: self.domain.clone(),
            segments,
        }
    }

    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        let mut write = |f: &mut fmt::Formatter<'_>, part: &dyn fmt::Display| {
            if !first {
                f.write_str(".")?;
            }
            first = false;
            write!(f, "{part}")
        };
        match &self.domain {
            PathDomain::Exam(name) => {
                write(f, &"exam")?;
                write(f, name)?;
            }
            PathDomain::Visit => write(f, &"visit")?,
            PathDomain::Patient => write(f, &"patient")?,
            PathDomain::Local => {}
        }
        for segment in &self.segments {
            write(f, segment)?;
        }
        Ok(())
    }
}

/// Removes every `[n]` from a path string.
pub fn strip_indices(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut depth = 0usize;
    for ch in path.chars() {
        match ch {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(ch),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_indexed_segments() {
        let path = FieldPath::parse("RxToOrder.Final Rx[1].od.sph").unwrap();
        assert_eq!(path.domain, PathDomain::Local);
        assert_eq!(path.segments[1], Segment::indexed("Final Rx", 1));
        assert_eq!(path.to_string(), "RxToOrder.Final Rx[1].od.sph");
    }

    #[test]
    fn parses_domains() {
        let exam = FieldPath::parse("exam.Refraction.od.sph").unwrap();
        assert_eq!(exam.domain, PathDomain::Exam("Refraction".into()));
        assert_eq!(exam.names().collect::<Vec<_>>(), ["od", "sph"]);
        assert_eq!(exam.to_string(), "exam.Refraction.od.sph");
        assert_eq!(FieldPath::parse("visit.examDate").unwrap().domain, PathDomain::Visit);
        assert_eq!(FieldPath::parse("patient.dob").unwrap().domain, PathDomain::Patient);
    }

    #[test]
    fn rejects_malformed_paths() {
        assert_eq!(FieldPath::parse(""), Err(PathError::Empty));
        assert!(matches!(FieldPath::parse("a..b"), Err(PathError::EmptySegment { .. })));
        assert!(matches!(FieldPath::parse("a[x].b"), Err(PathError::MalformedIndex { .. })));
        assert!(matches!(FieldPath::parse("a[1"), Err(PathError::MalformedIndex { .. })));
        assert!(matches!(FieldPath::parse("exam"), Err(PathError::MissingExam { .. })));
    }

    #[test]
    fn strips_indices() {
        assert_eq!(strip_indices("a[0].b[12].c"), "a.b.c");
    }
}
