/*!

  Decoding of instruction words back into mnemonic text.

  Decoding is a total function: any of the 2^128 possible words produces a
  `Disassembly`, with unrecognized opcode values rendered as
  `unknown(<hex>)`. Compiler output routinely runs ahead of what has been
  reverse-engineered, so an unknown opcode is an expected event the
  disassembler must survive, not reject.

  The text format follows the established listing conventions: one line per
  present micro-op, `<mnemonic> <dst>[_sat].<mask>` followed by the comma
  separated sources, each `[-][abs(]<r|v|c|?><index>.<swizzle>[)]`. Attribute
  and constant sources substitute the shared fetch indices. The scalar unit
  reads slot c and selects a single component, so its source renders with
  one swizzle letter.

*/

use std::convert::TryFrom;
use std::fmt::{Display, Formatter};

use super::fields;
use super::opcode::{ScalarOp, VectorOp};
use super::operand::{Swizzle, WriteMask};
use super::word::InstructionWord;

/// Register-type prefix letters indexed by the 2 bit wire code.
const REGISTER_PREFIX: [char; 4] = ['?', 'r', 'v', 'c'];

/// Which unit a decoded micro-op belongs to. Determines the source swizzle
/// rendering width.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum Unit {
  Vector,
  Scalar,
}

/// An opcode field as found in the word: a known mnemonic or the raw value.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum DecodedOpcode {
  Vector(VectorOp),
  Scalar(ScalarOp),
  Unknown(u8),
}

impl Display for DecodedOpcode {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      DecodedOpcode::Vector(op) => write!(f, "{}", op),
      DecodedOpcode::Scalar(op) => write!(f, "{}", op),
      DecodedOpcode::Unknown(code) => write!(f, "unknown({:x})", code),
    }
  }
}

/// A resolved destination. The shared-target sentinel has already been
/// combined with the varying/predicate write flags.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum DecodedDest {
  Temp(u32),
  Varying(u32),
  Predicate,
}

impl Display for DecodedDest {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      DecodedDest::Temp(index) => write!(f, "r{}", index),
      DecodedDest::Varying(index) => write!(f, "o{}", index),
      DecodedDest::Predicate => write!(f, "p0"),
    }
  }
}

/// One rendered source operand. `index` has the shared fetch substitution
/// already applied for attribute/constant type codes.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub struct DecodedSource {
  pub type_code: u8,
  pub index: u32,
  pub swizzle: Swizzle,
  pub negate: bool,
  pub absolute: bool,
}

/// The predicate gate of a word that has the enable bit set.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub struct PredicateGate {
  pub negate: bool,
  pub swizzle: Swizzle,
}

impl Display for PredicateGate {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self.negate {
      true => write!(f, "(!p0.{})", self.swizzle),
      false => write!(f, "(p0.{})", self.swizzle),
    }
  }
}

/// One decoded micro-op, ready for rendering.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct DecodedOp {
  pub unit: Unit,
  pub predicate: Option<PredicateGate>,
  pub opcode: DecodedOpcode,
  pub dst: DecodedDest,
  pub saturate: bool,
  pub mask: WriteMask,
  pub sources: Vec<DecodedSource>,
}

impl Display for DecodedOp {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    if let Some(gate) = &self.predicate {
      write!(f, "{} ", gate)?;
    }
    write!(f, "{} {}", self.opcode, self.dst)?;
    if self.saturate {
      write!(f, "_sat")?;
    }
    write!(f, ".{}", self.mask)?;
    for source in self.sources.iter() {
      write!(f, ", ")?;
      if source.negate {
        write!(f, "-")?;
      }
      if source.absolute {
        write!(f, "abs(")?;
      }
      write!(
        f,
        "{}{}.",
        REGISTER_PREFIX[(source.type_code & 3) as usize],
        source.index
      )?;
      match self.unit {
        Unit::Vector => write!(f, "{}", source.swizzle)?,
        Unit::Scalar => write!(f, "{}", source.swizzle.x())?,
      }
      if source.absolute {
        write!(f, ")")?;
      }
    } // end for each source
    Ok(())
  }
}

/// The full decoding of one instruction word.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Disassembly {
  pub vector: Option<DecodedOp>,
  pub scalar: Option<DecodedOp>,
  pub last: bool,
}

impl Disassembly {
  pub fn is_empty(&self) -> bool {
    self.vector.is_none() && self.scalar.is_none()
  }

  /// The rendered micro-op lines, vector first.
  pub fn lines(&self) -> Vec<String> {
    self
      .vector
      .iter()
      .chain(self.scalar.iter())
      .map(|op| op.to_string())
      .collect()
  }
}

impl Display for Disassembly {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let mut separate = false;
    for op in self.vector.iter().chain(self.scalar.iter()) {
      if separate {
        writeln!(f)?;
      }
      write!(f, "{}", op)?;
      separate = true;
    }
    Ok(())
  }
}

fn decode_predicate(word: &InstructionWord) -> Option<PredicateGate> {
  match word.bit(fields::PREDICATE_ENABLE) {
    true => Some(PredicateGate {
      negate: word.bit(fields::PREDICATE_NEGATE),
      swizzle: Swizzle::from_bits(word.field(fields::PREDICATE_SWIZZLE) as u8),
    }),
    false => None,
  }
}

fn decode_dst(word: &InstructionWord, index_field: fields::Field, varying: u32) -> DecodedDest {
  let index = word.field(index_field) as u32;
  let shared = index as u128 == fields::SHARED_WRITE_SENTINEL;
  if word.bit(fields::VARYING_WRITE) && shared {
    DecodedDest::Varying(varying)
  } else if word.bit(fields::PREDICATE_WRITE) && shared {
    DecodedDest::Predicate
  } else {
    DecodedDest::Temp(index)
  }
}

fn decode_source(word: &InstructionWord, slot: u32, constant: u32, attribute: u32) -> DecodedSource {
  let layout = fields::src_slot(slot);
  let type_code = word.field(layout.ty) as u8;
  let index = match type_code as u128 {
    fields::REG_TYPE_ATTRIBUTE => attribute,
    fields::REG_TYPE_CONSTANT => constant,
    _ => word.field(layout.index) as u32,
  };
  DecodedSource {
    type_code,
    index,
    swizzle: Swizzle::from_bits(word.field(layout.swizzle) as u8),
    negate: word.bit(layout.negate),
    absolute: word.bit(layout.absolute),
  }
}

fn decode_vector(word: &InstructionWord, constant: u32, attribute: u32, varying: u32) -> Option<DecodedOp> {
  let mask = WriteMask::from_bits(word.field(fields::VECTOR_WRITE_MASK) as u8);
  if mask.is_empty() {
    return None;
  }

  let code = word.field(fields::VECTOR_OPCODE) as u8;
  let (opcode, slots) = match VectorOp::try_from(code) {
    Ok(op) => (DecodedOpcode::Vector(op), op.slot_usage()),
    // Be verbose about words we do not understand: render all three slots.
    Err(_) => (DecodedOpcode::Unknown(code), [true, true, true]),
  };

  let sources = slots
    .iter()
    .enumerate()
    .filter(|(_, used)| **used)
    .map(|(slot, _)| decode_source(word, slot as u32, constant, attribute))
    .collect();

  Some(DecodedOp {
    unit: Unit::Vector,
    predicate: decode_predicate(word),
    opcode,
    dst: decode_dst(word, fields::VECTOR_DST_INDEX, varying),
    saturate: word.bit(fields::SATURATE),
    mask,
    sources,
  })
}

fn decode_scalar(word: &InstructionWord, constant: u32, attribute: u32, varying: u32) -> Option<DecodedOp> {
  let mask = WriteMask::from_bits(word.field(fields::SCALAR_WRITE_MASK) as u8);
  if mask.is_empty() {
    return None;
  }

  let code = word.field(fields::SCALAR_OPCODE) as u8;
  let opcode = match ScalarOp::try_from(code) {
    Ok(op) => DecodedOpcode::Scalar(op),
    Err(_) => DecodedOpcode::Unknown(code),
  };

  Some(DecodedOp {
    unit: Unit::Scalar,
    predicate: decode_predicate(word),
    opcode,
    dst: decode_dst(word, fields::SCALAR_DST_INDEX, varying),
    saturate: word.bit(fields::SATURATE),
    mask,
    // The scalar unit always reads exactly one operand, from slot c.
    sources: vec![decode_source(word, 2, constant, attribute)],
  })
}

/// Decodes one word. Total: never fails, whatever the bits.
pub fn decode(word: &InstructionWord) -> Disassembly {
  let constant = word.field(fields::CONSTANT_FETCH) as u32;
  let attribute = word.field(fields::ATTRIBUTE_FETCH) as u32;
  let varying = word.field(fields::VARYING_INDEX) as u32;

  Disassembly {
    vector: decode_vector(word, constant, attribute, varying),
    scalar: decode_scalar(word, constant, attribute, varying),
    last: word.bit(fields::LAST),
  }
}

/// Convenience wrapper rendering straight to text.
pub fn disassemble(word: &InstructionWord) -> String {
  decode(word).to_string()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::instruction::encode::encode;
  use crate::instruction::operand::{
    Component, DestRegister, Dst, Instruction, SourceRegister, Src,
  };

  fn vector_only(op: VectorOp, dst: Dst, sources: [Option<Src>; 3]) -> Instruction {
    Instruction {
      vector: Some((op, dst)),
      scalar: None,
      sources,
    }
  }

  #[test]
  fn mov_round_trip() {
    let instruction = vector_only(
      VectorOp::Mov,
      Dst::new(DestRegister::Temp(1), WriteMask::XYZW),
      [Some(Src::new(SourceRegister::Temp(2))), None, None],
    );
    let word = encode(&instruction, false).unwrap();
    assert_eq!(disassemble(&word), "mov r1.xyzw, r2.xyzw");
  }

  #[test]
  fn mad_renders_three_sources() {
    let instruction = vector_only(
      VectorOp::Mad,
      Dst::new(DestRegister::Temp(4), WriteMask::X | WriteMask::Y),
      [
        Some(Src::new(SourceRegister::Attribute(3))),
        Some(Src::new(SourceRegister::Constant(9))),
        Some(Src::new(SourceRegister::Temp(7))),
      ],
    );
    let word = encode(&instruction, false).unwrap();
    assert_eq!(disassemble(&word), "mad r4.xy, v3.xyzw, c9.xyzw, r7.xyzw");
  }

  #[test]
  fn add_reads_slots_a_and_c() {
    let instruction = vector_only(
      VectorOp::Add,
      Dst::new(DestRegister::Temp(0), WriteMask::XYZW),
      [
        Some(Src::new(SourceRegister::Temp(1))),
        None,
        Some(Src::new(SourceRegister::Temp(2))),
      ],
    );
    let word = encode(&instruction, false).unwrap();
    assert_eq!(disassemble(&word), "add r0.xyzw, r1.xyzw, r2.xyzw");
  }

  #[test]
  fn dp4_to_varying() {
    let instruction = vector_only(
      VectorOp::Dp4,
      Dst::new(DestRegister::Varying(2), WriteMask::X),
      [
        Some(Src::new(SourceRegister::Attribute(0))),
        Some(Src::new(SourceRegister::Constant(4))),
        None,
      ],
    );
    let word = encode(&instruction, true).unwrap();
    let decoded = decode(&word);
    assert!(decoded.last);
    assert_eq!(decoded.to_string(), "dp4 o2.x, v0.xyzw, c4.xyzw");
  }

  #[test]
  fn modifiers_render_in_order() {
    let mut source = Src::new(SourceRegister::Temp(1));
    source.negate = true;
    source.absolute = true;
    source.swizzle = Swizzle::splat(Component::W);
    let mut dst = Dst::new(DestRegister::Temp(3), WriteMask::XYZW);
    dst.saturate = true;
    let instruction = vector_only(VectorOp::Frc, dst, [Some(source), None, None]);
    let word = encode(&instruction, false).unwrap();
    assert_eq!(disassemble(&word), "frc r3_sat.xyzw, -abs(r1.wwww)");
  }

  #[test]
  fn scalar_reads_slot_c_single_component() {
    let mut source = Src::new(SourceRegister::Temp(5));
    source.swizzle = Swizzle::splat(Component::Z);
    let instruction = Instruction {
      vector: None,
      scalar: Some((ScalarOp::Rsq, Dst::new(DestRegister::Temp(2), WriteMask::X))),
      sources: [None, None, Some(source)],
    };
    let word = encode(&instruction, false).unwrap();
    assert_eq!(disassemble(&word), "rsq r2.x, r5.z");
  }

  #[test]
  fn dual_issue_renders_two_lines() {
    let instruction = Instruction {
      vector: Some((
        VectorOp::Mul,
        Dst::new(DestRegister::Temp(0), WriteMask::XYZW),
      )),
      scalar: Some((ScalarOp::Rcp, Dst::new(DestRegister::Temp(1), WriteMask::W))),
      sources: [
        Some(Src::new(SourceRegister::Temp(2))),
        Some(Src::new(SourceRegister::Temp(3))),
        Some(Src::new(SourceRegister::Temp(4))),
      ],
    };
    let word = encode(&instruction, false).unwrap();
    let decoded = decode(&word);
    assert_eq!(
      decoded.lines(),
      vec![
        "mul r0.xyzw, r2.xyzw, r3.xyzw".to_string(),
        "rcp r1.w, r4.x".to_string(),
      ]
    );
    assert_eq!(
      decoded.to_string(),
      "mul r0.xyzw, r2.xyzw, r3.xyzw\nrcp r1.w, r4.x"
    );
  }

  #[test]
  fn unknown_vector_opcode_is_verbose() {
    let mut word = InstructionWord::new();
    word.set_field(fields::VECTOR_OPCODE, 0x06);
    word.set_field(fields::VECTOR_WRITE_MASK, 0b1111);
    let decoded = decode(&word);
    let vector = decoded.vector.unwrap();
    assert_eq!(vector.opcode, DecodedOpcode::Unknown(0x06));
    // Unknown opcodes render every slot; the zeroed word reads as three
    // invalid sources through the shared fetch indices.
    assert_eq!(vector.sources.len(), 3);
    assert_eq!(vector.to_string(), "unknown(6) r0.xyzw, ?0.xxxx, ?0.xxxx, ?0.xxxx");
  }

  #[test]
  fn unknown_scalar_opcode() {
    let mut word = InstructionWord::new();
    word.set_field(fields::SCALAR_OPCODE, 0x3);
    word.set_field(fields::SCALAR_WRITE_MASK, 0b1000);
    let decoded = decode(&word);
    assert_eq!(decoded.scalar.unwrap().to_string(), "unknown(3) r0.x, ?0.x");
  }

  #[test]
  fn decode_is_total() {
    // A pathological all-ones word still decodes.
    let word = InstructionWord::from_words([u32::max_value(); 4]);
    let decoded = decode(&word);
    assert!(decoded.vector.is_some());
    assert!(decoded.scalar.is_some());
    assert!(decoded.last);
  }

  #[test]
  fn predicate_prefix() {
    let instruction = vector_only(
      VectorOp::Mov,
      Dst::new(DestRegister::Temp(0), WriteMask::XYZW),
      [Some(Src::new(SourceRegister::Temp(1))), None, None],
    );
    let mut word = encode(&instruction, false).unwrap();
    word.set_bit(fields::PREDICATE_ENABLE, true);
    // The hard-wired gate already carries the negate bit and the identity
    // swizzle, so enabling it renders the negated form.
    assert_eq!(disassemble(&word), "(!p0.xyzw) mov r0.xyzw, r1.xyzw");
  }

  #[test]
  fn empty_word_decodes_to_nothing() {
    let decoded = decode(&InstructionWord::new());
    assert!(decoded.is_empty());
    assert!(!decoded.last);
    assert_eq!(decoded.to_string(), "");
  }
}
