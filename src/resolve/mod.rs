//! Static resolution of comparison declarations.
//!
//! Everything in this module runs before any comparison executes: conformance
//! records are completeness-checked when they are declared, and call sites are
//! resolved against the declared candidates by an ordered tiebreak table.
//! Both passes are pure functions over immutable records, so resolution order
//! cannot change an outcome.

pub mod bound;
pub mod conformance;
pub mod overload;

pub use bound::Bound;
pub use conformance::{Conformance, ConformanceError, Derivation, Operation};
pub use overload::{CallSite, Candidate, Decision, Overload, Resolution, ResolutionError};

/// The set of validated conformance records and declared overloads.
#[derive(Debug, Default)]
pub struct Registry {
    conformances: Vec<Conformance>,
    overloads: Vec<Overload>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-populated with the primitive types, registered exactly
    /// as the trait impls in [`crate::compare`] and [`crate::float`] supply
    /// them: integers and the other ordered primitives bring the operator
    /// pair, floats bring the derived three-way comparison under the generic
    /// bound and the native operator pair under the floating point bound.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        let ordered = [
            "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64", "u128",
            "usize", "bool", "char", "str", "String",
        ];
        for type_name in ordered {
            registry
                .declare_conformance(Conformance::new(
                    type_name,
                    Bound::comparable(),
                    [Operation::LessThan, Operation::Equals],
                ))
                .expect("builtin conformances are complete");
        }

        for type_name in ["f32", "f64"] {
            registry
                .declare_conformance(Conformance::new(
                    type_name,
                    Bound::comparable(),
                    [Operation::ThreeWay],
                ))
                .expect("builtin conformances are complete");
            registry
                .declare_conformance(Conformance::new(
                    type_name,
                    Bound::float_comparable(),
                    [Operation::LessThan, Operation::Equals],
                ))
                .expect("builtin conformances are complete");
        }

        registry
    }

    /// Validates and stores a conformance record. Records are immutable once
    /// established: redeclaring the same type and bound is an error, as is an
    /// incomplete record.
    pub fn declare_conformance(
        &mut self,
        conformance: Conformance,
    ) -> Result<(), ConformanceError> {
        if self.conformances.iter().any(|existing| {
            existing.type_name() == conformance.type_name()
                && existing.bound() == conformance.bound()
        }) {
            return Err(ConformanceError::AlreadyDeclared {
                type_name: conformance.type_name().to_owned(),
                bound: conformance.bound().name().to_owned(),
            });
        }

        conformance::check(&conformance)?;
        self.conformances.push(conformance);
        Ok(())
    }

    pub fn declare_overload(&mut self, overload: Overload) {
        self.overloads.push(overload);
    }

    /// Runs the tiebreak table for one call site.
    pub fn resolve(&self, call: &CallSite) -> Result<Resolution, ResolutionError> {
        overload::resolve(call, &self.overloads, &self.conformances)
    }

    /// The materialized operation table of a declared conformance.
    #[must_use]
    pub fn derivations(
        &self,
        type_name: &str,
        bound: &Bound,
    ) -> Option<Vec<(Operation, Derivation)>> {
        self.conformances
            .iter()
            .find(|c| c.type_name() == type_name && c.bound() == bound)
            .map(Conformance::derivations)
    }
}
