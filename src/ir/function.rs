//! Functions and the per-function definition index.

use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    ir::{Code, Instruction},
    Result,
};

/// A function: an ordered sequence of labels and instructions.
///
/// The order of `instrs` *is* program order. All "later use" reasoning in the
/// passes is relative to this linear order, not to control-flow order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    /// The function name.
    pub name: String,

    /// The function body.
    #[serde(default)]
    pub instrs: Vec<Code>,

    /// Fields this crate does not interpret (parameters, return type, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Function {
    /// Creates a function from a name and a body.
    #[must_use]
    pub fn new(name: impl Into<String>, instrs: Vec<Code>) -> Self {
        Self {
            name: name.into(),
            instrs,
            extra: Map::new(),
        }
    }

    /// Returns the instruction at `index`, or `None` for a label or an
    /// out-of-range index.
    #[must_use]
    pub fn instruction(&self, index: usize) -> Option<&Instruction> {
        self.instrs.get(index).and_then(Code::as_instruction)
    }

    /// Mutable variant of [`Function::instruction`].
    pub fn instruction_mut(&mut self, index: usize) -> Option<&mut Instruction> {
        self.instrs.get_mut(index).and_then(Code::as_instruction_mut)
    }

    /// Iterates over all instructions, skipping labels.
    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.instrs.iter().filter_map(Code::as_instruction)
    }

    /// Number of instructions, excluding labels.
    #[must_use]
    pub fn instruction_count(&self) -> usize {
        self.instructions().count()
    }

    /// Finds the instruction defining `name` with a linear scan.
    ///
    /// Passes use a [`DefIndex`] instead; this is for callers that only need a
    /// single lookup.
    #[must_use]
    pub fn definition(&self, name: &str) -> Option<&Instruction> {
        self.instructions()
            .find(|instr| instr.dest.as_deref() == Some(name))
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "@{} {{", self.name)?;
        for code in &self.instrs {
            writeln!(f, "{code}")?;
        }
        writeln!(f, "}}")
    }
}

/// Maps every destination name in a function to the position of its defining
/// instruction.
///
/// Built once per function and kept in step with renames and insertions, so the
/// passes never have to search the body for a definition.
#[derive(Debug, Clone, Default)]
pub struct DefIndex {
    positions: FxHashMap<String, usize>,
}

impl DefIndex {
    /// Builds the index for `function`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::SsaViolation`] if two instructions define the same
    /// name.
    pub fn build(function: &Function) -> Result<Self> {
        let mut positions = FxHashMap::default();

        for (index, code) in function.instrs.iter().enumerate() {
            let Some(dest) = code.as_instruction().and_then(|i| i.dest.as_ref()) else {
                continue;
            };

            if let Some(previous) = positions.insert(dest.clone(), index) {
                return Err(ssa_error!(
                    "'{}' in function '{}' is defined at both {} and {}",
                    dest,
                    function.name,
                    previous,
                    index
                ));
            }
        }

        Ok(Self { positions })
    }

    /// Returns the position of the instruction defining `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    /// Returns `true` if some instruction defines `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    /// Number of indexed definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Returns `true` if nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Moves the definition of `from` to the name `to`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::SsaViolation`] if `to` is already defined.
    pub fn rename(&mut self, from: &str, to: &str) -> Result<()> {
        if self.positions.contains_key(to) {
            return Err(ssa_error!(
                "renaming '{}' to '{}' collides with an existing definition",
                from,
                to
            ));
        }

        if let Some(index) = self.positions.remove(from) {
            self.positions.insert(to.to_string(), index);
        }
        Ok(())
    }

    /// Records a definition of `name` inserted at `index`.
    ///
    /// Every recorded position at or after `index` moves down by one to account
    /// for the insertion.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::SsaViolation`] if `name` is already defined.
    pub fn insert(&mut self, name: &str, index: usize) -> Result<()> {
        if self.positions.contains_key(name) {
            return Err(ssa_error!(
                "inserted definition '{}' collides with an existing definition",
                name
            ));
        }

        for position in self.positions.values_mut() {
            if *position >= index {
                *position += 1;
            }
        }
        self.positions.insert(name.to_string(), index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ir::{Opcode, Type},
        Error,
    };

    fn sample() -> Function {
        Function::new(
            "main",
            vec![
                Instruction::constant("x", Type::Int, 1).into(),
                Code::Label {
                    label: "body".into(),
                },
                Instruction::value("v", Type::Vector, Opcode::S2vb, ["x"]).into(),
                Instruction::effect(Opcode::Ret, Vec::<String>::new()).into(),
            ],
        )
    }

    #[test]
    fn test_build_index() {
        let func = sample();
        let defs = DefIndex::build(&func).unwrap();
        assert_eq!(defs.len(), 2);
        assert_eq!(defs.get("x"), Some(0));
        assert_eq!(defs.get("v"), Some(2));
        assert_eq!(defs.get("missing"), None);
    }

    #[test]
    fn test_duplicate_definition_rejected() {
        let mut func = sample();
        func.instrs
            .push(Instruction::constant("x", Type::Int, 2).into());

        assert!(matches!(
            DefIndex::build(&func),
            Err(Error::SsaViolation { .. })
        ));
    }

    #[test]
    fn test_insert_shifts_positions() {
        let func = sample();
        let mut defs = DefIndex::build(&func).unwrap();

        defs.insert("w", 1).unwrap();
        assert_eq!(defs.get("x"), Some(0));
        assert_eq!(defs.get("w"), Some(1));
        assert_eq!(defs.get("v"), Some(3));

        assert!(defs.insert("x", 0).is_err());
    }

    #[test]
    fn test_rename() {
        let func = sample();
        let mut defs = DefIndex::build(&func).unwrap();

        defs.rename("v", "v_s").unwrap();
        assert!(!defs.contains("v"));
        assert_eq!(defs.get("v_s"), Some(2));
        assert!(defs.rename("v_s", "x").is_err());
    }

    #[test]
    fn test_lookup_helpers() {
        let func = sample();
        assert_eq!(func.instruction_count(), 3);
        assert!(func.instruction(1).is_none());
        assert_eq!(func.definition("v").map(|i| i.op), Some(Opcode::S2vb));
    }
}
