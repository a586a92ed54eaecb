use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! ssa_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::SsaViolation {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::SsaViolation {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// # Error Categories
///
/// ## Fatal rewrite errors
/// - [`Error::Config`] - A rewrite table failed validation when it was loaded
/// - [`Error::SsaViolation`] - The input broke single assignment (duplicate or
///   colliding definitions, a use ahead of its definition)
///
/// ## Document errors
/// - [`Error::Malformed`] - The program document is structurally invalid
/// - [`Error::Json`] - The program document is not valid JSON for the IR schema
/// - [`Error::FileError`] - I/O failure while reading or writing a document
///
/// A missing table entry or an argument without a defining instruction is not an
/// error; the passes treat both as "leave this instruction alone".
///
/// # Examples
///
/// ```rust
/// use vreduce::{Error, ir::Program};
///
/// match Program::from_json_str("{\"functions\": 7}") {
///     Ok(_) => println!("parsed"),
///     Err(Error::Json(err)) => eprintln!("not a program document: {err}"),
///     Err(e) => eprintln!("other error: {e}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// A rewrite table entry is inconsistent with the opcode arities.
    ///
    /// Raised once, when the table is loaded, never per instruction.
    #[error("Invalid rewrite table - {0}")]
    Config(String),

    /// The function is not in single static assignment form.
    ///
    /// Covers a name defined twice, a rename that would collide with an existing
    /// definition, and a use that precedes its definition in program order.
    ///
    /// # Fields
    ///
    /// * `message` - Description of the violation
    /// * `file` - Source file where the violation was detected
    /// * `line` - Source line where the violation was detected
    #[error("SSA violation - {file}:{line}: {message}")]
    SsaViolation {
        /// Description of the violation
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// The program document is structurally invalid.
    ///
    /// Examples are a branch without targets or a jump to a label that does not
    /// exist in the function.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// The document could not be decoded or encoded as JSON.
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    /// File I/O error.
    #[error("{0}")]
    FileError(#[from] std::io::Error),
}
