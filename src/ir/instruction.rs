//! Instructions and labels as they appear in a function body.
//!
//! An [`Instruction`] is a typed record whose argument positions carry fixed meaning
//! for its opcode. Instructions are owned by the [`crate::ir::Function`] that holds
//! them and are addressed by their index in its code sequence; passes mutate them in
//! place through that index.
//!
//! # Variable arguments
//!
//! Branches mix variables and labels in older documents (`br cond then else`,
//! `jmp target`). Everything that reasons about uses (renaming, divergence, the
//! vector-position table) looks only at the *variable* arguments returned by
//! [`Instruction::var_args`]; positions are counted within that slice.

use std::{fmt, ops::Range};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ir::{Opcode, Polarity, Predicate, Type};

/// One entry in a function body: either a label or an instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Code {
    /// A branch target.
    Label {
        /// The label name.
        label: String,
    },
    /// An operation.
    Instruction(Instruction),
}

impl Code {
    /// Returns the instruction, or `None` for a label.
    #[must_use]
    pub fn as_instruction(&self) -> Option<&Instruction> {
        match self {
            Self::Instruction(instr) => Some(instr),
            Self::Label { .. } => None,
        }
    }

    /// Returns the instruction mutably, or `None` for a label.
    pub fn as_instruction_mut(&mut self) -> Option<&mut Instruction> {
        match self {
            Self::Instruction(instr) => Some(instr),
            Self::Label { .. } => None,
        }
    }

    /// Returns the label name, or `None` for an instruction.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Label { label } => Some(label),
            Self::Instruction(_) => None,
        }
    }
}

impl From<Instruction> for Code {
    fn from(instr: Instruction) -> Self {
        Self::Instruction(instr)
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Label { label } => write!(f, ".{label}:"),
            Self::Instruction(instr) => write!(f, "  {instr}"),
        }
    }
}

/// A single IR instruction.
///
/// Unknown fields in the source document are kept in `extra` and written back
/// unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    /// The operation.
    pub op: Opcode,

    /// The SSA value defined by this instruction; absent for stores and branches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest: Option<String>,

    /// The result type; present whenever `dest` is.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<Type>,

    /// Operand names, positional per opcode.
    #[serde(default)]
    pub args: Vec<String>,

    /// Branch targets, for documents that keep them apart from `args`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,

    /// Per-lane guard of a predicated vector instruction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pred: Option<Predicate>,

    /// Polarity of `pred`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neg: Option<Polarity>,

    /// Immediate operand of `const`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    /// Fields this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Instruction {
    /// Creates an instruction with no destination, arguments or guard.
    #[must_use]
    pub fn new(op: Opcode) -> Self {
        Self {
            op,
            dest: None,
            ty: None,
            args: Vec::new(),
            labels: Vec::new(),
            pred: None,
            neg: None,
            value: None,
            extra: Map::new(),
        }
    }

    /// Creates a value-producing instruction `dest: ty = op args`.
    #[must_use]
    pub fn value<S: Into<String>>(
        dest: impl Into<String>,
        ty: Type,
        op: Opcode,
        args: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            dest: Some(dest.into()),
            ty: Some(ty),
            args: args.into_iter().map(Into::into).collect(),
            ..Self::new(op)
        }
    }

    /// Creates a side-effect-only instruction `op args`.
    #[must_use]
    pub fn effect<S: Into<String>>(op: Opcode, args: impl IntoIterator<Item = S>) -> Self {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            ..Self::new(op)
        }
    }

    /// Creates a constant `dest: ty = const value`.
    #[must_use]
    pub fn constant(dest: impl Into<String>, ty: Type, value: impl Into<Value>) -> Self {
        Self {
            dest: Some(dest.into()),
            ty: Some(ty),
            value: Some(value.into()),
            ..Self::new(Opcode::Const)
        }
    }

    /// Attaches a per-lane guard.
    #[must_use]
    pub fn predicated(mut self, pred: impl Into<String>, polarity: Polarity) -> Self {
        self.pred = Some(Predicate::Lane(pred.into()));
        self.neg = Some(polarity);
        self
    }

    /// Index range of the variable arguments within `args`.
    #[must_use]
    pub fn var_arg_range(&self) -> Range<usize> {
        match self.op {
            Opcode::Jmp => 0..0,
            Opcode::Br => 0..self.args.len().min(1),
            _ => 0..self.args.len(),
        }
    }

    /// Arguments that name variables, excluding branch labels.
    #[must_use]
    pub fn var_args(&self) -> &[String] {
        &self.args[self.var_arg_range()]
    }

    /// Mutable view of [`Instruction::var_args`].
    pub fn var_args_mut(&mut self) -> &mut [String] {
        let range = self.var_arg_range();
        &mut self.args[range]
    }

    /// Branch targets of a `br` or `jmp`.
    ///
    /// Reads the `labels` field when present and falls back to the label
    /// positions of `args` otherwise.
    #[must_use]
    pub fn targets(&self) -> Vec<&str> {
        if !self.labels.is_empty() {
            return self.labels.iter().map(String::as_str).collect();
        }

        let start = match self.op {
            Opcode::Jmp => 0,
            Opcode::Br => 1,
            _ => return Vec::new(),
        };
        self.args
            .iter()
            .skip(start)
            .map(String::as_str)
            .collect()
    }

    /// Returns `true` if the result type is [`Type::Vector`].
    #[must_use]
    pub fn is_vector_typed(&self) -> bool {
        self.ty.as_ref().is_some_and(Type::is_vector)
    }

    /// Returns the variable guarding this instruction, if it is predicated.
    #[must_use]
    pub fn predicate_var(&self) -> Option<&str> {
        self.pred.as_ref().and_then(Predicate::variable)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(dest) = &self.dest {
            write!(f, "{dest}")?;
            if let Some(ty) = &self.ty {
                write!(f, ": {ty}")?;
            }
            write!(f, " = ")?;
        }

        write!(f, "{}", self.op)?;

        if let Some(value) = &self.value {
            write!(f, " {value}")?;
        }
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        for label in &self.labels {
            write!(f, " .{label}")?;
        }

        if let Some(pred) = self.predicate_var() {
            let bang = if self.neg.as_ref().is_some_and(Polarity::is_negated) {
                "!"
            } else {
                ""
            };
            write!(f, " ? {bang}{pred}")?;
        }

        write!(f, ";")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value_instruction() {
        let json = r#"{"op": "vadd", "dest": "c", "type": "vector", "args": ["a", "b"]}"#;
        let code: Code = serde_json::from_str(json).unwrap();
        let instr = code.as_instruction().unwrap();

        assert_eq!(instr.op, Opcode::Vadd);
        assert_eq!(instr.dest.as_deref(), Some("c"));
        assert!(instr.is_vector_typed());
        assert_eq!(instr.var_args(), ["a", "b"]);
    }

    #[test]
    fn test_parse_label() {
        let code: Code = serde_json::from_str(r#"{"label": "loop"}"#).unwrap();
        assert_eq!(code.label(), Some("loop"));
        assert!(code.as_instruction().is_none());
    }

    #[test]
    fn test_extra_fields_preserved() {
        let json = r#"{"op": "call", "dest": "r", "type": "int", "args": ["x"], "funcs": ["f"]}"#;
        let instr: Instruction = serde_json::from_str(json).unwrap();
        assert_eq!(instr.extra.get("funcs"), Some(&serde_json::json!(["f"])));

        let back = serde_json::to_value(&instr).unwrap();
        assert_eq!(back["funcs"], serde_json::json!(["f"]));
    }

    #[test]
    fn test_branch_var_args_and_targets() {
        let br = Instruction::effect(Opcode::Br, ["cond", "then", "else"]);
        assert_eq!(br.var_args(), ["cond"]);
        assert_eq!(br.targets(), vec!["then", "else"]);

        let jmp = Instruction::effect(Opcode::Jmp, ["exit"]);
        assert!(jmp.var_args().is_empty());
        assert_eq!(jmp.targets(), vec!["exit"]);

        let mut split = Instruction::effect(Opcode::Br, ["cond"]);
        split.labels = vec!["t".into(), "f".into()];
        assert_eq!(split.var_args(), ["cond"]);
        assert_eq!(split.targets(), vec!["t", "f"]);
    }

    #[test]
    fn test_predicate_fields() {
        let json = r#"{"op": "vadd", "dest": "c", "type": "vector", "args": ["a", "b"], "pred": "p", "neg": "1"}"#;
        let instr: Instruction = serde_json::from_str(json).unwrap();
        assert_eq!(instr.predicate_var(), Some("p"));
        assert!(instr.neg.as_ref().is_some_and(Polarity::is_negated));
        assert_eq!(instr.to_string(), "c: vector = vadd a b ? !p;");
    }

    #[test]
    fn test_display() {
        let c = Instruction::constant("x", Type::Int, 5);
        assert_eq!(c.to_string(), "x: int = const 5;");

        let s = Instruction::effect(Opcode::Sw, ["v", "addr"]);
        assert_eq!(s.to_string(), "sw v addr;");
    }
}
