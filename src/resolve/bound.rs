use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

/// A named generic constraint together with the capability names it requires.
///
/// Specificity between bounds is the strict superset relation on their
/// capability sets: a bound requiring more capabilities is more specific.
/// Bounds whose capability sets are incomparable are unrelated, and defaults
/// they supply for the same operation cannot be ranked against each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bound {
    name: String,
    capabilities: BTreeSet<String>,
}

impl Bound {
    pub fn new<N, C, S>(name: N, capabilities: C) -> Self
    where
        N: Into<String>,
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            capabilities: capabilities.into_iter().map(Into::into).collect(),
        }
    }

    /// The generic ordered-value bound satisfied by every comparable type.
    #[must_use]
    pub fn comparable() -> Self {
        Self::new("Comparable", ["comparable"])
    }

    /// The floating point bound: comparable plus the native IEEE operators.
    #[must_use]
    pub fn float_comparable() -> Self {
        Self::new("FloatComparable", ["comparable", "float"])
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether generic code constrained by `scope` may rely on this bound.
    pub(crate) fn covered_by(&self, scope: &Self) -> bool {
        self.capabilities.is_subset(&scope.capabilities)
    }

    /// Partial order by required capabilities; `None` means unrelated.
    pub(crate) fn specificity(&self, other: &Self) -> Option<Ordering> {
        if self.capabilities == other.capabilities {
            Some(Ordering::Equal)
        } else if self.capabilities.is_superset(&other.capabilities) {
            Some(Ordering::Greater)
        } else if self.capabilities.is_subset(&other.capabilities) {
            Some(Ordering::Less)
        } else {
            None
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
