use crate::resolve::bound::Bound;
use itertools::Itertools;
use std::collections::BTreeSet;
use std::fmt;

/// The comparison operations a conformance can provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Operation {
    ThreeWay,
    LessThan,
    Equals,
    NotEquals,
    LessOrEqual,
    GreaterOrEqual,
    GreaterThan,
}

impl Operation {
    pub(crate) const ALL: [Self; 7] = [
        Self::ThreeWay,
        Self::LessThan,
        Self::Equals,
        Self::NotEquals,
        Self::LessOrEqual,
        Self::GreaterOrEqual,
        Self::GreaterThan,
    ];

    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::ThreeWay => "<=>",
            Self::LessThan => "<",
            Self::Equals => "==",
            Self::NotEquals => "!=",
            Self::LessOrEqual => "<=",
            Self::GreaterOrEqual => ">=",
            Self::GreaterThan => ">",
        }
    }

    /// Operations that are always derived and can never be supplied directly.
    #[must_use]
    pub fn is_always_derived(self) -> bool {
        matches!(
            self,
            Self::NotEquals | Self::LessOrEqual | Self::GreaterOrEqual | Self::GreaterThan
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// How one operation of a checked conformance is satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Derivation {
    Supplied,
    FromThreeWay,
    FromOperatorPair,
    AlwaysDerived,
}

/// A record of the comparison operations a type supplies under a bound.
///
/// Records are validated once, when they are declared to a
/// [`Registry`](crate::resolve::Registry), and are immutable afterwards.
#[derive(Debug, Clone)]
pub struct Conformance {
    type_name: String,
    bound: Bound,
    supplied: BTreeSet<Operation>,
    preferred: BTreeSet<Operation>,
}

impl Conformance {
    pub fn new<N, S>(type_name: N, bound: Bound, supplied: S) -> Self
    where
        N: Into<String>,
        S: IntoIterator<Item = Operation>,
    {
        Self {
            type_name: type_name.into(),
            bound,
            supplied: supplied.into_iter().collect(),
            preferred: BTreeSet::new(),
        }
    }

    /// Marks this conformance as the declared satisfier of `operation`. At a
    /// call site for that operation, same-operation defaults supplied by
    /// rival conformances of the same type are removed from consideration.
    #[must_use]
    pub fn preferring(mut self, operation: Operation) -> Self {
        self.preferred.insert(operation);
        self
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    #[must_use]
    pub fn bound(&self) -> &Bound {
        &self.bound
    }

    #[must_use]
    pub fn supplies(&self, operation: Operation) -> bool {
        self.supplied.contains(&operation)
    }

    pub(crate) fn is_preferred_for(&self, operation: Operation) -> bool {
        self.preferred.contains(&operation)
    }

    /// The full operation table: how each operation is satisfied once the
    /// completeness check has accepted this record.
    #[must_use]
    pub fn derivations(&self) -> Vec<(Operation, Derivation)> {
        Operation::ALL
            .iter()
            .map(|operation| {
                let derivation = if operation.is_always_derived() {
                    Derivation::AlwaysDerived
                } else if self.supplied.contains(operation) {
                    Derivation::Supplied
                } else if *operation == Operation::ThreeWay {
                    Derivation::FromOperatorPair
                } else {
                    Derivation::FromThreeWay
                };
                (*operation, derivation)
            })
            .collect()
    }
}

/// The completeness check: a record must supply the three-way comparison, or
/// both `<` and `==`. Run once per declaration, before any derived default is
/// materialized.
pub(crate) fn check(conformance: &Conformance) -> Result<(), ConformanceError> {
    if let Some(operation) = conformance
        .supplied
        .iter()
        .find(|operation| operation.is_always_derived())
    {
        return Err(ConformanceError::NotOverridable {
            type_name: conformance.type_name.clone(),
            operation: *operation,
        });
    }

    let has_three_way = conformance.supplied.contains(&Operation::ThreeWay);
    let has_operator_pair = conformance.supplied.contains(&Operation::LessThan)
        && conformance.supplied.contains(&Operation::Equals);

    if has_three_way || has_operator_pair {
        Ok(())
    } else {
        Err(ConformanceError::Incomplete {
            type_name: conformance.type_name.clone(),
            supplied: conformance.supplied.iter().map(|o| o.symbol()).join(", "),
        })
    }
}

#[derive(thiserror::Error, miette::Diagnostic, Debug)]
pub enum ConformanceError {
    #[error("type '{type_name}' supplies [{supplied}], not enough to derive the comparison operators")]
    #[diagnostic(help("supply <=>, or both < and =="))]
    Incomplete { type_name: String, supplied: String },

    #[error("'{operation}' on type '{type_name}' is always derived and cannot be supplied directly")]
    #[diagnostic(help("supply <=>, or both < and ==, and let the remaining operators be derived"))]
    NotOverridable {
        type_name: String,
        operation: Operation,
    },

    #[error("type '{type_name}' already declares its comparison operations under bound '{bound}'")]
    AlreadyDeclared { type_name: String, bound: String },
}
