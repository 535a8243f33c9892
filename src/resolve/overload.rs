use crate::resolve::bound::Bound;
use crate::resolve::conformance::{Conformance, Operation};
use itertools::Itertools;
use std::cmp::Ordering;
use std::fmt;

/// An independently declared implementation of one operation for concrete
/// parameter types. Parameters naming a type parameter of the overload match
/// any operand, as long as repeated type parameters bind consistently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overload {
    operation: Operation,
    params: Vec<String>,
    type_params: Vec<String>,
}

impl Overload {
    pub fn new<P, S>(operation: Operation, params: P) -> Self
    where
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            operation,
            params: params.into_iter().map(Into::into).collect(),
            type_params: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_type_params<P, S>(mut self, type_params: P) -> Self
    where
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.type_params = type_params.into_iter().map(Into::into).collect();
        self
    }

    fn is_exact(&self) -> bool {
        self.type_params.is_empty()
    }

    /// Arity and parameter-type shape, checked before any specificity
    /// comparison ever happens.
    fn matches(&self, call: &CallSite) -> bool {
        if self.operation != call.operation || self.params.len() != call.operands.len() {
            return false;
        }

        let mut assignments: Vec<(&str, &str)> = Vec::new();
        for (param, operand) in self.params.iter().zip(&call.operands) {
            if self.type_params.iter().any(|tp| tp == param) {
                match assignments.iter().find(|(tp, _)| *tp == param.as_str()) {
                    Some((_, bound_to)) if *bound_to != operand.as_str() => return false,
                    Some(_) => {}
                    None => assignments.push((param.as_str(), operand.as_str())),
                }
            } else if param != operand {
                return false;
            }
        }

        true
    }
}

/// The static description of one comparison call site: the operation, the
/// concrete operand types, and the bound the surrounding generic code was
/// written against (`None` for concrete, non-generic code).
#[derive(Debug, Clone)]
pub struct CallSite {
    operation: Operation,
    operands: Vec<String>,
    scope: Option<Bound>,
}

impl CallSite {
    pub fn concrete<P, S>(operation: Operation, operands: P) -> Self
    where
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            operation,
            operands: operands.into_iter().map(Into::into).collect(),
            scope: None,
        }
    }

    pub fn bounded<P, S>(operation: Operation, operands: P, scope: Bound) -> Self
    where
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            scope: Some(scope),
            ..Self::concrete(operation, operands)
        }
    }
}

/// The candidate an operation call resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    /// A declared overload for concrete parameter types.
    Declared { params: Vec<String> },
    /// The default supplied by a conformance's derivation graph.
    Default { bound: Bound },
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Declared { params } => write!(f, "overload ({})", params.iter().join(", ")),
            Self::Default { bound } => write!(f, "the default via '{bound}'"),
        }
    }
}

/// Which rule of the tiebreak table decided a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    OnlyCandidate,
    ExactOverload,
    GenericOverload,
    ExplicitPreference,
    BoundSpecificity,
}

#[derive(Debug, Clone)]
pub struct Resolution {
    candidate: Candidate,
    decision: Decision,
}

impl Resolution {
    #[must_use]
    pub fn candidate(&self) -> &Candidate {
        &self.candidate
    }

    #[must_use]
    pub fn decision(&self) -> Decision {
        self.decision
    }
}

#[derive(thiserror::Error, miette::Diagnostic, Debug)]
pub enum ResolutionError {
    #[error("ambiguous call to '{operation}' on ({operands}): {candidates} are equally specific")]
    #[diagnostic(help(
        "mark one conformance as the preferred satisfier of the operation, or declare a concrete overload"
    ))]
    Ambiguous {
        operation: Operation,
        operands: String,
        candidates: String,
    },

    #[error("no implementation of '{operation}' applies to ({operands})")]
    NoCandidate {
        operation: Operation,
        operands: String,
    },
}

impl ResolutionError {
    fn ambiguous(call: &CallSite, candidates: &[Candidate]) -> Self {
        Self::Ambiguous {
            operation: call.operation,
            operands: call.operands.iter().join(", "),
            candidates: candidates.iter().join(" and "),
        }
    }

    fn no_candidate(call: &CallSite) -> Self {
        Self::NoCandidate {
            operation: call.operation,
            operands: call.operands.iter().join(", "),
        }
    }
}

/// The ordered tiebreak table. Shape filtering runs first, then declared
/// overloads (exact before type-parameterized), then conformance defaults
/// under preference and bound-specificity rules.
pub(crate) fn resolve(
    call: &CallSite,
    overloads: &[Overload],
    conformances: &[Conformance],
) -> Result<Resolution, ResolutionError> {
    // Bound-erased generic code cannot name concrete overloads, it only gets
    // what its own bound guarantees.
    let declared: Vec<&Overload> = if call.scope.is_none() {
        overloads.iter().filter(|o| o.matches(call)).collect()
    } else {
        Vec::new()
    };

    let exact: Vec<&&Overload> = declared.iter().filter(|o| o.is_exact()).collect();
    match exact.as_slice() {
        [winner] => {
            return Ok(Resolution {
                candidate: Candidate::Declared {
                    params: winner.params.clone(),
                },
                decision: Decision::ExactOverload,
            });
        }
        [] => {}
        tied => {
            let candidates: Vec<Candidate> = tied
                .iter()
                .map(|o| Candidate::Declared {
                    params: o.params.clone(),
                })
                .collect();
            return Err(ResolutionError::ambiguous(call, &candidates));
        }
    }

    let generic: Vec<&&Overload> = declared.iter().filter(|o| !o.is_exact()).collect();
    match generic.as_slice() {
        [winner] => {
            return Ok(Resolution {
                candidate: Candidate::Declared {
                    params: winner.params.clone(),
                },
                decision: Decision::GenericOverload,
            });
        }
        [] => {}
        tied => {
            let candidates: Vec<Candidate> = tied
                .iter()
                .map(|o| Candidate::Declared {
                    params: o.params.clone(),
                })
                .collect();
            return Err(ResolutionError::ambiguous(call, &candidates));
        }
    }

    // Defaults only apply to a homogeneous binary call, anything else is an
    // arity or shape mismatch and never reaches the specificity comparison.
    let operand_type = match call.operands.as_slice() {
        [a, b] if a == b => Some(a.as_str()),
        _ => None,
    };

    let mut defaults: Vec<&Conformance> = operand_type
        .map(|type_name| {
            conformances
                .iter()
                .filter(|c| c.type_name() == type_name)
                .filter(|c| match &call.scope {
                    Some(scope) => c.bound().covered_by(scope),
                    None => true,
                })
                .collect()
        })
        .unwrap_or_default();

    if defaults.is_empty() {
        return Err(ResolutionError::no_candidate(call));
    }

    // An explicit preference annotation removes non-annotated rivals from
    // consideration before specificity is compared.
    let preferred = defaults
        .iter()
        .filter(|c| c.is_preferred_for(call.operation))
        .count();
    let preference_applied = preferred > 0 && preferred < defaults.len();
    if preferred > 0 {
        defaults.retain(|c| c.is_preferred_for(call.operation));
    }

    if let [winner] = defaults.as_slice() {
        let decision = if preference_applied {
            Decision::ExplicitPreference
        } else {
            Decision::OnlyCandidate
        };
        return Ok(Resolution {
            candidate: Candidate::Default {
                bound: winner.bound().clone(),
            },
            decision,
        });
    }

    let maximal: Vec<&&Conformance> = defaults
        .iter()
        .filter(|c| {
            !defaults
                .iter()
                .any(|d| d.bound().specificity(c.bound()) == Some(Ordering::Greater))
        })
        .collect();

    if let [winner] = maximal.as_slice() {
        return Ok(Resolution {
            candidate: Candidate::Default {
                bound: winner.bound().clone(),
            },
            decision: Decision::BoundSpecificity,
        });
    }

    let candidates: Vec<Candidate> = maximal
        .iter()
        .map(|c| Candidate::Default {
            bound: c.bound().clone(),
        })
        .collect();
    Err(ResolutionError::ambiguous(call, &candidates))
}

#[cfg(test)]
mod test {
    use super::*;

    fn conformances() -> Vec<Conformance> {
        vec![
            Conformance::new("f64", Bound::comparable(), [Operation::ThreeWay]),
            Conformance::new(
                "f64",
                Bound::float_comparable(),
                [Operation::LessThan, Operation::Equals],
            ),
        ]
    }

    #[test]
    fn exact_overload_beats_every_default() {
        let overloads = vec![Overload::new(Operation::Equals, ["f64", "f64"])];
        let call = CallSite::concrete(Operation::Equals, ["f64", "f64"]);

        let resolution = resolve(&call, &overloads, &conformances()).unwrap();
        assert_eq!(resolution.decision(), Decision::ExactOverload);
        assert!(matches!(resolution.candidate(), Candidate::Declared { .. }));
    }

    #[test]
    fn type_parameterized_overload_loses_to_an_exact_one() {
        let overloads = vec![
            Overload::new(Operation::Equals, ["T", "T"]).with_type_params(["T"]),
            Overload::new(Operation::Equals, ["f64", "f64"]),
        ];
        let call = CallSite::concrete(Operation::Equals, ["f64", "f64"]);

        let resolution = resolve(&call, &overloads, &conformances()).unwrap();
        assert_eq!(resolution.decision(), Decision::ExactOverload);
        assert_eq!(
            resolution.candidate(),
            &Candidate::Declared {
                params: vec!["f64".into(), "f64".into()]
            }
        );
    }

    #[test]
    fn repeated_type_parameters_must_bind_consistently() {
        let overload = Overload::new(Operation::Equals, ["T", "T"]).with_type_params(["T"]);

        assert!(overload.matches(&CallSite::concrete(Operation::Equals, ["i64", "i64"])));
        assert!(!overload.matches(&CallSite::concrete(Operation::Equals, ["i64", "String"])));
    }

    #[test]
    fn arity_mismatch_is_filtered_before_specificity() {
        let overloads = vec![Overload::new(Operation::Equals, ["f64", "f64", "f64"])];

        let call = CallSite::concrete(Operation::Equals, ["f64", "f64"]);
        let resolution = resolve(&call, &overloads, &conformances()).unwrap();
        // The ternary overload is not a candidate at all, the defaults win.
        assert!(matches!(resolution.candidate(), Candidate::Default { .. }));

        let unary = CallSite::concrete(Operation::Equals, ["f64"]);
        assert!(matches!(
            resolve(&unary, &overloads, &conformances()),
            Err(ResolutionError::NoCandidate { .. })
        ));
    }

    #[test]
    fn the_more_specific_bound_wins_for_concrete_code() {
        let call = CallSite::concrete(Operation::Equals, ["f64", "f64"]);
        let resolution = resolve(&call, &[], &conformances()).unwrap();

        assert_eq!(resolution.decision(), Decision::BoundSpecificity);
        assert_eq!(
            resolution.candidate(),
            &Candidate::Default {
                bound: Bound::float_comparable()
            }
        );
    }

    #[test]
    fn the_scope_bound_limits_which_defaults_are_visible() {
        let generic = CallSite::bounded(Operation::Equals, ["f64", "f64"], Bound::comparable());
        let resolution = resolve(&generic, &[], &conformances()).unwrap();
        assert_eq!(
            resolution.candidate(),
            &Candidate::Default {
                bound: Bound::comparable()
            }
        );

        let float = CallSite::bounded(
            Operation::Equals,
            ["f64", "f64"],
            Bound::float_comparable(),
        );
        let resolution = resolve(&float, &[], &conformances()).unwrap();
        assert_eq!(
            resolution.candidate(),
            &Candidate::Default {
                bound: Bound::float_comparable()
            }
        );
    }

    #[test]
    fn concrete_overloads_are_invisible_to_bound_erased_code() {
        let overloads = vec![Overload::new(Operation::Equals, ["f64", "f64"])];
        let call = CallSite::bounded(Operation::Equals, ["f64", "f64"], Bound::comparable());

        let resolution = resolve(&call, &overloads, &conformances()).unwrap();
        assert!(matches!(resolution.candidate(), Candidate::Default { .. }));
    }

    #[test]
    fn unrelated_bounds_are_ambiguous_until_annotated() {
        let rivals = vec![
            Conformance::new("Grade", Bound::new("Scored", ["score"]), [Operation::ThreeWay]),
            Conformance::new(
                "Grade",
                Bound::new("Lettered", ["letter"]),
                [Operation::LessThan, Operation::Equals],
            ),
        ];
        let call = CallSite::concrete(Operation::Equals, ["Grade", "Grade"]);

        assert!(matches!(
            resolve(&call, &[], &rivals),
            Err(ResolutionError::Ambiguous { .. })
        ));

        let annotated = vec![
            rivals[0].clone().preferring(Operation::Equals),
            rivals[1].clone(),
        ];
        let resolution = resolve(&call, &[], &annotated).unwrap();
        assert_eq!(resolution.decision(), Decision::ExplicitPreference);
        assert_eq!(
            resolution.candidate(),
            &Candidate::Default {
                bound: Bound::new("Scored", ["score"])
            }
        );
    }

    #[test]
    fn mixed_operand_types_never_match_a_default() {
        let call = CallSite::concrete(Operation::Equals, ["f64", "i64"]);
        assert!(matches!(
            resolve(&call, &[], &conformances()),
            Err(ResolutionError::NoCandidate { .. })
        ));
    }
}
