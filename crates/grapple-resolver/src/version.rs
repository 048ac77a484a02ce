//! Maven version parsing, comparison, and range matching.
//!
//! Maven versions use a custom total order that differs from semver:
//! - Tokens split on `.` and `-` and on letter/digit transitions
//! - Numeric tokens compare as numbers
//! - Known qualifiers order as
//!   `alpha < beta < milestone < rc < snapshot < "" (release) < sp`
//! - Unknown qualifiers sort after every known one, lexically among
//!   themselves, so `1.0-jre > 1.0`
//! - A missing (empty) version sorts below any present version

use std::cmp::Ordering;
use std::fmt;

/// Floating version markers that must be pinned against repository
/// metadata before resolution.
pub fn is_floating(version: &str) -> bool {
    version.is_empty() || version == "LATEST" || version == "RELEASE"
}

/// Whether a version string is a range expression rather than a bare
/// version.
pub fn is_range(version: &str) -> bool {
    version.starts_with('[') || version.starts_with('(')
}

/// Compare two version strings under the Maven total order.
pub fn compare(a: &str, b: &str) -> Ordering {
    MavenVersion::parse(a).cmp(&MavenVersion::parse(b))
}

/// A parsed Maven version with comparable segments.
#[derive(Debug, Clone)]
pub struct MavenVersion {
    pub original: String,
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
enum Segment {
    Numeric(u64),
    Qualifier(QualifierKind),
    Text(String),
}

/// Well-known Maven qualifiers with defined ordering.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd)]
enum QualifierKind {
    Alpha,
    Beta,
    Milestone,
    Rc,
    Snapshot,
    Release,
    Sp,
}

impl MavenVersion {
    pub fn parse(version: &str) -> Self {
        let trimmed = version.trim();
        Self {
            original: trimmed.to_string(),
            segments: parse_segments(trimmed),
        }
    }

    /// Strict comparison: `true` only if `self` sorts above `other`.
    pub fn is_higher_than(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Greater
    }

    pub fn is_snapshot(&self) -> bool {
        self.original.ends_with("-SNAPSHOT")
    }
}

impl PartialEq for MavenVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MavenVersion {}

impl Ord for MavenVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        // A missing version sorts below any present version.
        match (self.original.is_empty(), other.original.is_empty()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            (false, false) => {}
        }
        let max_len = self.segments.len().max(other.segments.len());
        for i in 0..max_len {
            let ord = compare_segments(self.segments.get(i), other.segments.get(i));
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for MavenVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for MavenVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

fn compare_segments(a: Option<&Segment>, b: Option<&Segment>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (Some(s), None) => compare_segment_to_empty(s),
        (None, Some(s)) => compare_segment_to_empty(s).reverse(),
        (Some(a), Some(b)) => compare_two_segments(a, b),
    }
}

/// How a segment compares against the padded-out end of a shorter version.
fn compare_segment_to_empty(seg: &Segment) -> Ordering {
    match seg {
        Segment::Numeric(0) => Ordering::Equal,
        Segment::Numeric(_) => Ordering::Greater,
        Segment::Qualifier(q) => q.cmp(&QualifierKind::Release),
        Segment::Text(s) if s.is_empty() => Ordering::Equal,
        // Unknown qualifiers sort after the release they decorate.
        Segment::Text(_) => Ordering::Greater,
    }
}

fn compare_two_segments(a: &Segment, b: &Segment) -> Ordering {
    match (a, b) {
        (Segment::Numeric(a), Segment::Numeric(b)) => a.cmp(b),
        (Segment::Qualifier(a), Segment::Qualifier(b)) => a.cmp(b),
        (Segment::Numeric(_), _) => Ordering::Greater,
        (_, Segment::Numeric(_)) => Ordering::Less,
        (Segment::Text(a), Segment::Text(b)) => a.cmp(b),
        // Unknown qualifiers sort after every known qualifier.
        (Segment::Qualifier(_), Segment::Text(_)) => Ordering::Less,
        (Segment::Text(_), Segment::Qualifier(_)) => Ordering::Greater,
    }
}

fn parse_segments(version: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut current = String::new();

    for ch in version.chars() {
        if ch == '.' || ch == '-' {
            flush(&mut current, &mut segments);
        } else {
            if let Some(last) = current.chars().last() {
                if last.is_ascii_digit() != ch.is_ascii_digit() {
                    flush(&mut current, &mut segments);
                }
            }
            current.push(ch);
        }
    }
    flush(&mut current, &mut segments);

    segments
}

fn flush(current: &mut String, segments: &mut Vec<Segment>) {
    if !current.is_empty() {
        segments.push(classify(current));
        current.clear();
    }
}

fn classify(token: &str) -> Segment {
    if let Ok(n) = token.parse::<u64>() {
        return Segment::Numeric(n);
    }
    match token.to_lowercase().as_str() {
        "alpha" | "a" => Segment::Qualifier(QualifierKind::Alpha),
        "beta" | "b" => Segment::Qualifier(QualifierKind::Beta),
        "milestone" | "m" => Segment::Qualifier(QualifierKind::Milestone),
        "rc" | "cr" => Segment::Qualifier(QualifierKind::Rc),
        "snapshot" => Segment::Qualifier(QualifierKind::Snapshot),
        "" | "ga" | "final" | "release" => Segment::Qualifier(QualifierKind::Release),
        "sp" => Segment::Qualifier(QualifierKind::Sp),
        lowered => Segment::Text(lowered.to_string()),
    }
}

/// A Maven version range expression.
///
/// Supports `[1.0,2.0)`, `[1.0,]`, `(,2.0)`, and the exact form `[1.0]`.
#[derive(Debug, Clone)]
pub struct VersionRange {
    pub lower: Option<Bound>,
    pub upper: Option<Bound>,
}

#[derive(Debug, Clone)]
pub struct Bound {
    pub version: MavenVersion,
    pub inclusive: bool,
}

impl VersionRange {
    /// Parse a Maven version range string; `None` for bare versions.
    pub fn parse(raw: &str) -> Option<Self> {
        let s = raw.trim();
        if !is_range(s) || s.len() < 2 {
            return None;
        }

        let open_inclusive = s.starts_with('[');
        let close_inclusive = s.ends_with(']');
        let inner = &s[1..s.len() - 1];

        if let Some((lower, upper)) = inner.split_once(',') {
            let bound = |raw: &str, inclusive: bool| {
                let raw = raw.trim();
                (!raw.is_empty()).then(|| Bound {
                    version: MavenVersion::parse(raw),
                    inclusive,
                })
            };
            Some(VersionRange {
                lower: bound(lower, open_inclusive),
                upper: bound(upper, close_inclusive),
            })
        } else {
            // Exact pin: [1.0] means exactly 1.0
            let v = MavenVersion::parse(inner.trim());
            Some(VersionRange {
                lower: Some(Bound {
                    version: v.clone(),
                    inclusive: true,
                }),
                upper: Some(Bound {
                    version: v,
                    inclusive: true,
                }),
            })
        }
    }

    /// Check whether a version satisfies this range.
    pub fn contains(&self, version: &MavenVersion) -> bool {
        if let Some(ref lower) = self.lower {
            match version.cmp(&lower.version) {
                Ordering::Less => return false,
                Ordering::Equal if !lower.inclusive => return false,
                _ => {}
            }
        }
        if let Some(ref upper) = self.upper {
            match version.cmp(&upper.version) {
                Ordering::Greater => return false,
                Ordering::Equal if !upper.inclusive => return false,
                _ => {}
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_order(lower: &str, higher: &str) {
        assert_eq!(compare(lower, higher), Ordering::Less, "{lower} < {higher}");
        assert_eq!(compare(higher, lower), Ordering::Greater);
    }

    #[test]
    fn basic_ordering() {
        assert_order("1.0", "2.0");
        assert_order("1.0.0", "1.0.1");
        assert_order("1.0.1", "1.1.0");
    }

    #[test]
    fn patch_qualifier_release_chain() {
        assert_order("1.0", "1.0.1");
        assert_order("1.0.1", "1.1-alpha");
        assert_order("1.1-alpha", "1.1");
        assert_order("1.1", "1.1-sp1");
    }

    #[test]
    fn qualifier_ordering() {
        assert_order("1.0-alpha", "1.0-beta");
        assert_order("1.0-beta", "1.0-milestone");
        assert_order("1.0-milestone", "1.0-rc");
        assert_order("1.0-rc", "1.0-SNAPSHOT");
        assert_order("1.0-SNAPSHOT", "1.0");
        assert_order("1.0", "1.0-sp");
    }

    #[test]
    fn qualifier_aliases_and_case() {
        assert_eq!(compare("1.0-ALPHA", "1.0-alpha"), Ordering::Equal);
        assert_eq!(compare("1.0-ga", "1.0"), Ordering::Equal);
        assert_eq!(compare("1.0.final", "1.0"), Ordering::Equal);
        assert_order("1.0a1", "1.0b1");
    }

    #[test]
    fn trailing_zeros_equal() {
        assert_eq!(compare("1.0", "1.0.0"), Ordering::Equal);
        assert_eq!(compare("1", "1.0.0.0"), Ordering::Equal);
    }

    #[test]
    fn unknown_qualifier_after_release() {
        assert_order("31.1", "31.1-jre");
        assert_order("31.1-android", "31.1-jre");
        assert_order("31.1-jre", "32.0-android");
    }

    #[test]
    fn missing_version_sorts_lowest() {
        assert_order("", "0.0.1");
        assert_order("", "1.0-alpha");
        assert_eq!(compare("", ""), Ordering::Equal);
    }

    #[test]
    fn is_higher_than_is_strict() {
        let a = MavenVersion::parse("1.0");
        let b = MavenVersion::parse("1.0.0");
        assert!(!a.is_higher_than(&b));
        assert!(!b.is_higher_than(&a));
        assert!(MavenVersion::parse("1.0.1").is_higher_than(&a));
    }

    #[test]
    fn snapshot_detection() {
        assert!(MavenVersion::parse("1.0-SNAPSHOT").is_snapshot());
        assert!(!MavenVersion::parse("1.0").is_snapshot());
    }

    #[test]
    fn floating_markers() {
        assert!(is_floating(""));
        assert!(is_floating("LATEST"));
        assert!(is_floating("RELEASE"));
        assert!(!is_floating("1.0"));
    }

    #[test]
    fn range_detection() {
        assert!(is_range("[1.0,2.0)"));
        assert!(is_range("(,2.0)"));
        assert!(!is_range("1.0"));
    }

    #[test]
    fn version_range_inclusive() {
        let range = VersionRange::parse("[1.0,2.0]").unwrap();
        assert!(range.contains(&MavenVersion::parse("1.0")));
        assert!(range.contains(&MavenVersion::parse("1.5")));
        assert!(range.contains(&MavenVersion::parse("2.0")));
        assert!(!range.contains(&MavenVersion::parse("0.9")));
        assert!(!range.contains(&MavenVersion::parse("2.1")));
    }

    #[test]
    fn version_range_exclusive_upper() {
        let range = VersionRange::parse("[1.0,2.0)").unwrap();
        assert!(range.contains(&MavenVersion::parse("1.9.9")));
        assert!(!range.contains(&MavenVersion::parse("2.0")));
    }

    #[test]
    fn version_range_open_bounds() {
        let range = VersionRange::parse("(,2.0)").unwrap();
        assert!(range.contains(&MavenVersion::parse("0.1")));
        assert!(!range.contains(&MavenVersion::parse("2.0")));

        let range = VersionRange::parse("[3.0,]").unwrap();
        assert!(range.contains(&MavenVersion::parse("99")));
        assert!(!range.contains(&MavenVersion::parse("2.9")));
    }

    #[test]
    fn version_range_exact() {
        let range = VersionRange::parse("[1.5]").unwrap();
        assert!(range.contains(&MavenVersion::parse("1.5")));
        assert!(!range.contains(&MavenVersion::parse("1.4")));
        assert!(!range.contains(&MavenVersion::parse("1.6")));
    }

    #[test]
    fn bare_version_not_a_range() {
        assert!(VersionRange::parse("1.0").is_none());
    }
}
