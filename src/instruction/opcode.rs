/*!

  Opcode tables for the two micro-op units. The values are the raw field
  contents; the variant set is the subset observed in compiler output, so
  `try_from` on an unlisted value is an expected event for the disassembler,
  not a defect.

*/

use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum_macros::{Display as StrumDisplay, IntoStaticStr};

/**
  Opcodes of the 4-component vector unit, a 5 bit field.

  The operand-routing table in `slot_usage` is part of the hardware contract:
  most two-source ops read slots a and b, but `add` reads slots a and c.
*/
#[derive(
StrumDisplay, IntoStaticStr, TryFromPrimitive, IntoPrimitive,
Clone,        Copy,          Eq, PartialEq,    Debug,         Hash
)]
#[repr(u8)]
#[strum(serialize_all = "lowercase")]
pub enum VectorOp {
  Mov = 0x01,
  Mul = 0x02,
  Add = 0x03,
  Mad = 0x04,
  Dp3 = 0x05,
  // Opcode 0x06 unobserved
  Dp4 = 0x07,
  // Opcode 0x08 unobserved
  Min = 0x09,
  Max = 0x0a,
  Slt = 0x0b,
  Sge = 0x0c,
  Arl = 0x0d,
  Frc = 0x0e,
  Flr = 0x0f,
  Seq = 0x10,
  // Opcode 0x11 unobserved
  Sgt = 0x12,
  Sle = 0x13,
  Sne = 0x14,
}

/// Opcodes of the 1-component scalar unit, a 4 bit field.
#[derive(
StrumDisplay, IntoStaticStr, TryFromPrimitive, IntoPrimitive,
Clone,        Copy,          Eq, PartialEq,    Debug,         Hash
)]
#[repr(u8)]
#[strum(serialize_all = "lowercase")]
pub enum ScalarOp {
  Cos = 0x0,
  Mov = 0x1,
  Rcp = 0x2,
  Rsq = 0x4,
  Lg2 = 0xd,
  Ex2 = 0xe,
  Sin = 0xf,
}

impl VectorOp {
  pub fn code(&self) -> u8 {
    Into::<u8>::into(*self)
  }

  pub fn mnemonic(&self) -> &'static str {
    Into::<&'static str>::into(*self)
  }

  /// Which source slots (a, b, c) the vector unit routes to this op.
  /// `add` reads its second operand from slot c, not slot b.
  pub fn slot_usage(&self) -> [bool; 3] {
    match self {
      VectorOp::Mov | VectorOp::Arl | VectorOp::Frc | VectorOp::Flr => [true, false, false],

      VectorOp::Add => [true, false, true],

      VectorOp::Mad => [true, true, true],

      VectorOp::Mul
      | VectorOp::Dp3
      | VectorOp::Dp4
      | VectorOp::Min
      | VectorOp::Max
      | VectorOp::Slt
      | VectorOp::Sge
      | VectorOp::Seq
      | VectorOp::Sgt
      | VectorOp::Sle
      | VectorOp::Sne => [true, true, false],
    } // end match on opcode
  }

  pub fn source_count(&self) -> usize {
    self.slot_usage().iter().filter(|used| **used).count()
  }
}

impl ScalarOp {
  pub fn code(&self) -> u8 {
    Into::<u8>::into(*self)
  }

  pub fn mnemonic(&self) -> &'static str {
    Into::<&'static str>::into(*self)
  }
}
