//! Declarative rewrite tables.
//!
//! Two fixed mappings drive the rewrite:
//!
//! - the [`ScalarizationTable`] says which vector opcodes have a scalar equivalent
//!   and where each old argument lands in the scalar instruction;
//! - the [`VectorPositionTable`] says, per vector opcode, which argument positions
//!   must name a vector-typed value.
//!
//! The built-in contents are written as exhaustive matches over [`Opcode`] so that
//! adding an opcode forces a decision here. Both tables are validated once when
//! loaded; an inconsistent entry is a [`crate::Error::Config`] and never surfaces
//! while rewriting.
//!
//! # Built-in entries
//!
//! | Vector | Scalar | Remap (old → new) | Vector positions |
//! |--------|--------|-------------------|------------------|
//! | `vadd` | `add` | 0→0, 1→1 | 0, 1 |
//! | `v2s`  | `id` | 0→0 | 0 |
//! | `s2vb` | `id` | 0→0 | - |
//! | `s2v`  | `id` | 0→0 | - |
//! | `vmul` `vsub` `vdiv` | - | - | 0, 1 |
//! | `idv`  | - | - | 0 |
//! | `vcmp` `scatter` | - | - | 0, 1 |
//! | `vphi` | - | - | 1, 2 |
//! | `vstore` `gather` | - | - | 0 |
//!
//! `vmul`, `vsub`, `vdiv` and `idv` weigh the same as their scalar forms, so
//! rewriting one whose result is widened again costs an extra `s2vb`. Their scalar
//! forms are only used when the table is built with
//! [`ScalarizationTable::load_extended`].

use rustc_hash::FxHashMap;
use strum::IntoEnumIterator;

use crate::{ir::Opcode, Error, Result};

/// How one vector opcode is rewritten to scalar form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalarForm {
    /// The replacement opcode.
    pub scalar: Opcode,
    /// `(old position, new position)` pairs. Old positions not listed are dropped.
    pub remap: &'static [(usize, usize)],
}

impl ScalarForm {
    /// Creates a scalar form.
    #[must_use]
    pub const fn new(scalar: Opcode, remap: &'static [(usize, usize)]) -> Self {
        Self { scalar, remap }
    }

    /// Builds the scalar argument list from the vector instruction's arguments.
    ///
    /// The result has one slot per remap entry, which for a validated table is the
    /// scalar opcode's arity. Arguments whose position is not remapped are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if `args` lacks a remapped position.
    pub fn remap_args(&self, args: &[String]) -> Result<Vec<String>> {
        let mut remapped = vec![String::new(); self.remap.len()];
        for &(old, new) in self.remap {
            let arg = args.get(old).ok_or_else(|| {
                malformed_error!(
                    "scalar form '{}' needs argument {} but only {} are present",
                    self.scalar,
                    old,
                    args.len()
                )
            })?;
            remapped[new] = arg.clone();
        }
        Ok(remapped)
    }
}

/// The built-in scalar replacement for `op`, if it has one.
#[must_use]
pub const fn builtin_scalar_form(op: Opcode) -> Option<ScalarForm> {
    const BINARY: &[(usize, usize)] = &[(0, 0), (1, 1)];
    const UNARY: &[(usize, usize)] = &[(0, 0)];

    match op {
        Opcode::Vadd => Some(ScalarForm::new(Opcode::Add, BINARY)),
        Opcode::V2s | Opcode::S2vb | Opcode::S2v => Some(ScalarForm::new(Opcode::Id, UNARY)),
        Opcode::Vmul
        | Opcode::Vsub
        | Opcode::Vdiv
        | Opcode::Idv
        | Opcode::Vload
        | Opcode::Vstore
        | Opcode::Vcmp
        | Opcode::Vphi
        | Opcode::Gather
        | Opcode::Scatter
        | Opcode::Const
        | Opcode::Add
        | Opcode::Mul
        | Opcode::Sub
        | Opcode::Div
        | Opcode::Id
        | Opcode::Lt
        | Opcode::Le
        | Opcode::Gt
        | Opcode::Ge
        | Opcode::Eq
        | Opcode::Not
        | Opcode::And
        | Opcode::Or
        | Opcode::Print
        | Opcode::Br
        | Opcode::Jmp
        | Opcode::Ret
        | Opcode::Nop
        | Opcode::Lw
        | Opcode::Sw
        | Opcode::Phi
        | Opcode::Call => None,
    }
}

/// Scalar forms of the lane-wise ops left out of the built-in table.
#[must_use]
pub const fn extended_scalar_form(op: Opcode) -> Option<ScalarForm> {
    const BINARY: &[(usize, usize)] = &[(0, 0), (1, 1)];

    match op {
        Opcode::Vmul => Some(ScalarForm::new(Opcode::Mul, BINARY)),
        Opcode::Vsub => Some(ScalarForm::new(Opcode::Sub, BINARY)),
        Opcode::Vdiv => Some(ScalarForm::new(Opcode::Div, BINARY)),
        Opcode::Idv => Some(ScalarForm::new(Opcode::Id, &[(0, 0)])),
        _ => None,
    }
}

/// The built-in vector-required argument positions of `op`.
#[must_use]
pub const fn builtin_vector_positions(op: Opcode) -> &'static [usize] {
    match op {
        Opcode::Vadd
        | Opcode::Vmul
        | Opcode::Vsub
        | Opcode::Vdiv
        | Opcode::Vcmp
        | Opcode::Scatter => &[0, 1],
        Opcode::Vphi => &[1, 2],
        Opcode::Idv | Opcode::V2s | Opcode::Vstore | Opcode::Gather => &[0],
        Opcode::S2v
        | Opcode::S2vb
        | Opcode::Vload
        | Opcode::Const
        | Opcode::Add
        | Opcode::Mul
        | Opcode::Sub
        | Opcode::Div
        | Opcode::Id
        | Opcode::Lt
        | Opcode::Le
        | Opcode::Gt
        | Opcode::Ge
        | Opcode::Eq
        | Opcode::Not
        | Opcode::And
        | Opcode::Or
        | Opcode::Print
        | Opcode::Br
        | Opcode::Jmp
        | Opcode::Ret
        | Opcode::Nop
        | Opcode::Lw
        | Opcode::Sw
        | Opcode::Phi
        | Opcode::Call => &[],
    }
}

/// Vector opcode → scalar replacement.
#[derive(Debug, Clone, Default)]
pub struct ScalarizationTable {
    entries: FxHashMap<Opcode, ScalarForm>,
}

impl ScalarizationTable {
    /// Loads and validates the built-in table.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] if a built-in entry is inconsistent.
    pub fn load() -> Result<Self> {
        Self::from_entries(
            Opcode::iter().filter_map(|op| builtin_scalar_form(op).map(|form| (op, form))),
        )
    }

    /// Loads the built-in table plus [`extended_scalar_form`] entries.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] if an entry is inconsistent.
    pub fn load_extended() -> Result<Self> {
        Self::from_entries(Opcode::iter().filter_map(|op| {
            builtin_scalar_form(op)
                .or_else(|| extended_scalar_form(op))
                .map(|form| (op, form))
        }))
    }

    /// Builds a table from custom entries, with the same validation as
    /// [`ScalarizationTable::load`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] if an entry's remap does not cover exactly
    /// the argument positions of its scalar opcode, reads a position the vector
    /// opcode does not have, or maps to a vector or variadic opcode.
    pub fn from_entries(entries: impl IntoIterator<Item = (Opcode, ScalarForm)>) -> Result<Self> {
        let mut table = FxHashMap::default();
        for (op, form) in entries {
            Self::validate(op, &form)?;
            if table.insert(op, form).is_some() {
                return Err(Error::Config(format!("'{op}' has more than one entry")));
            }
        }
        Ok(Self { entries: table })
    }

    fn validate(op: Opcode, form: &ScalarForm) -> Result<()> {
        if form.scalar.is_vector() {
            return Err(Error::Config(format!(
                "'{op}' maps to vector opcode '{}'",
                form.scalar
            )));
        }

        let Some(arity) = form.scalar.arity() else {
            return Err(Error::Config(format!(
                "'{op}' maps to '{}' which has no fixed arity",
                form.scalar
            )));
        };

        if form.remap.len() != arity {
            return Err(Error::Config(format!(
                "'{op}' -> '{}' remaps {} arguments but '{}' takes {}",
                form.scalar,
                form.remap.len(),
                form.scalar,
                arity
            )));
        }

        let mut covered = vec![false; arity];
        let mut sources = Vec::with_capacity(arity);
        for &(old, new) in form.remap {
            if new >= arity || covered[new] {
                return Err(Error::Config(format!(
                    "'{op}' -> '{}' targets position {new} twice or out of range",
                    form.scalar
                )));
            }
            covered[new] = true;

            if op.arity().is_some_and(|vector_arity| old >= vector_arity) || sources.contains(&old)
            {
                return Err(Error::Config(format!(
                    "'{op}' -> '{}' reads position {old} twice or out of range",
                    form.scalar
                )));
            }
            sources.push(old);
        }

        Ok(())
    }

    /// Scalar form of `op`, or `None` if `op` is not eligible.
    #[must_use]
    pub fn get(&self, op: Opcode) -> Option<&ScalarForm> {
        self.entries.get(&op)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Vector opcode → argument positions that must stay vector-typed.
#[derive(Debug, Clone, Default)]
pub struct VectorPositionTable {
    entries: FxHashMap<Opcode, &'static [usize]>,
}

impl VectorPositionTable {
    /// Loads and validates the built-in table.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] if a built-in entry is inconsistent.
    pub fn load() -> Result<Self> {
        Self::from_entries(Opcode::iter().filter_map(|op| {
            let positions = builtin_vector_positions(op);
            (!positions.is_empty()).then_some((op, positions))
        }))
    }

    /// Builds a table from custom entries.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] if a position is out of range for its
    /// opcode's arity or the opcode is not a vector opcode.
    pub fn from_entries(
        entries: impl IntoIterator<Item = (Opcode, &'static [usize])>,
    ) -> Result<Self> {
        let mut table = FxHashMap::default();
        for (op, positions) in entries {
            if !op.is_vector() {
                return Err(Error::Config(format!(
                    "'{op}' is not a vector opcode but lists vector positions"
                )));
            }
            if let Some(&bad) = positions
                .iter()
                .find(|&&pos| op.arity().is_some_and(|arity| pos >= arity))
            {
                return Err(Error::Config(format!(
                    "'{op}' lists vector position {bad} beyond its arity"
                )));
            }
            table.insert(op, positions);
        }
        Ok(Self { entries: table })
    }

    /// Vector-required positions of `op`, or `None` if `op` has none.
    #[must_use]
    pub fn positions(&self, op: Opcode) -> Option<&'static [usize]> {
        self.entries.get(&op).copied()
    }

    /// Returns `true` if argument `position` of `op` must be vector-typed.
    #[must_use]
    pub fn requires_vector(&self, op: Opcode, position: usize) -> bool {
        self.positions(op)
            .is_some_and(|positions| positions.contains(&position))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Both rewrite tables, loaded together.
#[derive(Debug, Clone, Default)]
pub struct RewriteTables {
    /// Vector → scalar replacements.
    pub scalarization: ScalarizationTable,
    /// Vector-required argument positions.
    pub vector_positions: VectorPositionTable,
}

impl RewriteTables {
    /// Loads and validates the built-in tables.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] if either table is inconsistent.
    pub fn load() -> Result<Self> {
        Ok(Self {
            scalarization: ScalarizationTable::load()?,
            vector_positions: VectorPositionTable::load()?,
        })
    }

    /// Like [`RewriteTables::load`], with the extended scalar forms enabled.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] if either table is inconsistent.
    pub fn load_extended() -> Result<Self> {
        Ok(Self {
            scalarization: ScalarizationTable::load_extended()?,
            vector_positions: VectorPositionTable::load()?,
        })
    }
}
