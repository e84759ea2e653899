//! The error taxonomy shared by the container parser, the encoder, and the
//! compiler boundary. Decoding is deliberately absent from this list: it is
//! total, and unknown opcodes render as placeholders instead of failing.

use strum_macros::Display as StrumDisplay;
use thiserror::Error;

/// Which of the two shared fetch-unit selectors a source operand claims.
#[derive(StrumDisplay, Clone, Copy, Eq, PartialEq, Debug)]
#[strum(serialize_all = "lowercase")]
pub enum FetchUnit {
  Attribute,
  Constant,
}

#[derive(Error, Clone, Debug, Eq, PartialEq)]
pub enum CgcError {
  /// A header or symbol-record invariant does not hold for the input buffer.
  /// The buffer is foreign and untrusted, so this is never recovered locally.
  #[error("malformed container: {reason}")]
  MalformedContainer { reason: String },

  /// The symbol array could not be reserved. The count comes from the header,
  /// so this is fatal to the parse call only.
  #[error("out of memory while building the symbol table")]
  OutOfMemory,

  /// Two source slots claim the same fetch unit with different indices. The
  /// hardware has a single selector per unit per instruction, so emitting
  /// either index would silently corrupt the program.
  #[error("conflicting {unit} fetch: slot wants #{requested:02x} but #{previous:02x} is already claimed")]
  ConflictingFetch {
    unit: FetchUnit,
    previous: u8,
    requested: u8,
  },

  /// The vector and scalar micro-ops disagree on a modifier that is stored
  /// once per instruction.
  #[error("vector and scalar micro-ops disagree on the {modifier}")]
  ConflictingModifier { modifier: &'static str },

  /// A register index does not fit the bit field that stores it.
  #[error("{register} index {index} exceeds the encodable maximum of {limit}")]
  RegisterOutOfRange {
    register: &'static str,
    index: u32,
    limit: u32,
  },

  /// Instruction-stream access on a container that is not a vertex program.
  #[error("not a vertex program (container type tag {found:#06x})")]
  NotVertexProgram { found: u32 },

  /// The external compiler rejected the source. `log` carries its full
  /// diagnostic listing; `message` the one-line summary.
  #[error("shader compilation failed: {message}")]
  Compiler { message: String, log: String },
}

pub type CgcResult<T> = Result<T, CgcError>;

impl CgcError {
  /// Shorthand for the pervasive container-validation failure.
  pub fn malformed(reason: impl Into<String>) -> CgcError {
    CgcError::MalformedContainer {
      reason: reason.into(),
    }
  }
}
