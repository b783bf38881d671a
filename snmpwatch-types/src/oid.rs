//! Object identifiers - dotted numeric addresses into a management information base.

use core::fmt;
use core::str::FromStr;

/// A dotted numeric path naming one management value or subtree.
///
/// Identifiers are immutable and compare by exact arc-sequence equality.
/// Ordering is lexicographic over the arcs, which is the traversal order
/// agents use for `walk` and bulk retrieval.
///
/// # Example
///
/// ```rust
/// use snmpwatch_types::ObjectIdentifier;
///
/// let if_table: ObjectIdentifier = "1.3.6.1.2.1.2.2".parse().unwrap();
/// let if_in_octets: ObjectIdentifier = ".1.3.6.1.2.1.2.2.1.10".parse().unwrap();
///
/// assert!(if_in_octets.starts_with(&if_table));
/// assert_eq!(if_in_octets.child(1).arcs().last(), Some(&1));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(into = "String", try_from = "String"))]
pub struct ObjectIdentifier(Vec<u32>);

impl ObjectIdentifier {
    /// Create an identifier from its arcs.
    pub fn new(arcs: impl Into<Vec<u32>>) -> Self {
        Self(arcs.into())
    }

    /// The numeric arcs of this identifier.
    pub fn arcs(&self) -> &[u32] {
        &self.0
    }

    /// Number of arcs.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for the empty identifier.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append one arc, producing the identifier of a table row or instance.
    pub fn child(&self, index: u32) -> Self {
        let mut arcs = Vec::with_capacity(self.0.len() + 1);
        arcs.extend_from_slice(&self.0);
        arcs.push(index);
        Self(arcs)
    }

    /// True if `prefix` names this identifier or one of its ancestors.
    pub fn starts_with(&self, prefix: &ObjectIdentifier) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// The identifier whose get-next successor is this one when the
    /// instance exists.
    ///
    /// A trailing `0` arc resolves to the parent; any other trailing arc is
    /// decremented.
    pub fn predecessor(&self) -> Self {
        match self.0.split_last() {
            Some((&0, parent)) => Self(parent.to_vec()),
            Some((&last, parent)) => {
                let mut arcs = parent.to_vec();
                arcs.push(last - 1);
                Self(arcs)
            }
            None => Self(Vec::new()),
        }
    }
}

impl fmt::Display for ObjectIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, arc) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", arc)?;
        }
        Ok(())
    }
}

impl From<Vec<u32>> for ObjectIdentifier {
    fn from(arcs: Vec<u32>) -> Self {
        Self(arcs)
    }
}

impl From<&[u32]> for ObjectIdentifier {
    fn from(arcs: &[u32]) -> Self {
        Self(arcs.to_vec())
    }
}

impl From<ObjectIdentifier> for String {
    fn from(oid: ObjectIdentifier) -> Self {
        oid.to_string()
    }
}

impl TryFrom<String> for ObjectIdentifier {
    type Error = ParseOidError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl FromStr for ObjectIdentifier {
    type Err = ParseOidError;

    /// Parse a dotted identifier such as `1.3.6.1.2.1.1.3.0`.
    ///
    /// A single leading dot is accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let body = s.strip_prefix('.').unwrap_or(s);
        if body.is_empty() {
            return Err(ParseOidError::Empty);
        }

        body.split('.')
            .map(|arc| {
                arc.parse::<u32>()
                    .map_err(|_| ParseOidError::InvalidArc(arc.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

/// Error returned when a dotted identifier cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOidError {
    /// The input contained no arcs.
    Empty,
    /// An arc was not a non-negative 32-bit integer.
    InvalidArc(String),
}

impl fmt::Display for ParseOidError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseOidError::Empty => f.write_str("empty object identifier"),
            ParseOidError::InvalidArc(arc) => write!(f, "invalid object identifier arc '{}'", arc),
        }
    }
}

impl std::error::Error for ParseOidError {}
