//! Canonical identity of a set of running units.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Separator between unit ids in a combination key (`CH01+CH03`).
pub const SEPARATOR: &str = "+";

/// A set of units, stored as a sorted and deduplicated list of ids.
///
/// Every constructor canonicalizes, so two combinations with the same members
/// compare and hash equal no matter how they were assembled.
///
/// ```
/// use chiller_staging::fleet::Combination;
///
/// let a = Combination::new(["CH02", "CH01"]);
/// let b = Combination::parse("CH01+CH02");
/// assert_eq!(a, b);
/// assert_eq!(a.key(), "CH01+CH02");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Combination(Vec<String>);

impl Combination {
    /// Builds a combination from any collection of ids.
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        ids.sort_unstable();
        ids.dedup();
        Self(ids)
    }

    /// The combination with no running units.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Parses a `+`-joined key. Blank segments are ignored.
    pub fn parse(key: &str) -> Self {
        Self::new(
            key.split(SEPARATOR)
                .map(str::trim)
                .filter(|id| !id.is_empty()),
        )
    }

    /// Number of member units.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no unit is running.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` if `id` is a member.
    pub fn contains(&self, id: &str) -> bool {
        self.0
            .binary_search_by(|member| member.as_str().cmp(id))
            .is_ok()
    }

    /// Member ids in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Returns a copy with `id` added.
    #[must_use]
    pub fn with(&self, id: &str) -> Self {
        match self.0.binary_search_by(|member| member.as_str().cmp(id)) {
            Ok(_) => self.clone(),
            Err(position) => {
                let mut ids = self.0.clone();
                ids.insert(position, id.to_string());
                Self(ids)
            }
        }
    }

    /// Returns a copy with `id` removed.
    #[must_use]
    pub fn without(&self, id: &str) -> Self {
        Self(self.0.iter().filter(|member| *member != id).cloned().collect())
    }

    /// Members of `self` that are not members of `other`.
    pub fn difference<'a>(&'a self, other: &'a Self) -> impl Iterator<Item = &'a str> {
        self.iter().filter(move |id| !other.contains(id))
    }

    /// Canonical `+`-joined key, as used by performance table columns.
    pub fn key(&self) -> String {
        self.0.join(SEPARATOR)
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "-")
        } else {
            write!(f, "{}", self.key())
        }
    }
}

impl<S: Into<String>> FromIterator<S> for Combination {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl Serialize for Combination {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.key())
    }
}

impl<'de> Deserialize<'de> for Combination {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        Ok(Self::parse(&key))
    }
}
