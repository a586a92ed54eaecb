//! The program document and its JSON codec.
//!
//! Reading accepts any JSON object with a `functions` array. Writing emits
//! pretty-printed JSON (two-space indentation) with every object's keys in
//! alphabetical order, so rewritten documents diff cleanly against their input.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{ir::Function, Result};

/// A whole program: an ordered list of functions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Program {
    /// The functions, in document order.
    pub functions: Vec<Function>,

    /// Fields this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Program {
    /// Creates a program from its functions.
    #[must_use]
    pub fn new(functions: Vec<Function>) -> Self {
        Self {
            functions,
            extra: Map::new(),
        }
    }

    /// Parses a program document from a reader.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FileError`] if reading fails and
    /// [`crate::Error::Json`] if the input is not a program document.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Self::from_json_str(&text)
    }

    /// Parses a program document from a string.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if the input is not a program document.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Renders the program as sorted-key, pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if serialization fails.
    pub fn to_json_string(&self) -> Result<String> {
        // Going through `Value` sorts keys: its map is ordered by key.
        let value = serde_json::to_value(self)?;
        Ok(serde_json::to_string_pretty(&value)?)
    }

    /// Writes the program as sorted-key, pretty-printed JSON, followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] or [`crate::Error::FileError`] on failure.
    pub fn to_writer<W: Write>(&self, mut writer: W) -> Result<()> {
        let text = self.to_json_string()?;
        writer.write_all(text.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }

    /// Finds a function by name.
    #[must_use]
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }
}
