/*!

  Serialization of an `Instruction` into a 128 bit word.

  The hardware stores some state once per instruction even though two
  micro-ops and three source slots can request it: the constant-bank fetch
  index, the attribute fetch index, the saturate flag, and the shared varying
  write target. Encoding therefore runs in two phases. A reconciliation pass
  folds every requested value into an `Option` accumulator and fails on the
  second differing request; only then is the word written, so a failed encode
  never produces a partial word.

*/

use crate::error::{CgcError, CgcResult, FetchUnit};

use super::fields;
use super::operand::{Dst, DestRegister, Instruction, SourceRegister, Src};
use super::word::InstructionWord;

/// Folds one requested value into a shared-field accumulator. A second,
/// differing value is the caller's conflict, reported as `(previous, new)`.
fn reconcile<T: Copy + PartialEq>(shared: &mut Option<T>, value: T) -> Result<(), (T, T)> {
  match *shared {
    Some(previous) if previous != value => Err((previous, value)),
    _ => {
      *shared = Some(value);
      Ok(())
    }
  }
}

fn check_limit(register: &'static str, index: u8, limit: u32) -> CgcResult<()> {
  match (index as u32) > limit {
    true => Err(CgcError::RegisterOutOfRange {
      register,
      index: index as u32,
      limit,
    }),
    false => Ok(()),
  }
}

fn check_source(src: &Src) -> CgcResult<()> {
  match src.register {
    SourceRegister::Temp(index) => {
      check_limit("temp source register", index, fields::src_slot(0).index.limit())
    }
    SourceRegister::Attribute(index) => {
      check_limit("attribute register", index, fields::ATTRIBUTE_FETCH.limit())
    }
    SourceRegister::Constant(index) => {
      check_limit("constant register", index, fields::CONSTANT_FETCH.limit())
    }
  }
}

fn check_dst(dst: &Dst) -> CgcResult<()> {
  match dst.register {
    // 63 is the shared-write sentinel, so a temp destination stops one short.
    DestRegister::Temp(index) => check_limit(
      "temp destination register",
      index,
      fields::VECTOR_DST_INDEX.limit() - 1,
    ),
    DestRegister::Varying(index) => {
      check_limit("varying register", index, fields::VARYING_INDEX.limit())
    }
  }
}

/// Index value for the destination field: the register number for a temp,
/// the shared-write sentinel otherwise.
fn dst_index(dst: &Dst) -> u128 {
  match dst.register {
    DestRegister::Temp(index) => index as u128,
    DestRegister::Varying(_) => fields::SHARED_WRITE_SENTINEL,
  }
}

/**
  Encodes one instruction, setting the last-instruction flag from `last`.

  Fails with `ConflictingFetch` when two source slots claim the same fetch
  unit with different indices, with `ConflictingModifier` when the two
  micro-ops disagree on the saturate flag or the shared varying target, and
  with `RegisterOutOfRange` when an index does not fit its field. On failure
  nothing is written.
*/
pub fn encode(instruction: &Instruction, last: bool) -> CgcResult<InstructionWord> {
  // A micro-op with an all-clear write mask is absent.
  let vector = instruction.vector.filter(|(_, dst)| !dst.mask.is_empty());
  let scalar = instruction.scalar.filter(|(_, dst)| !dst.mask.is_empty());

  // Reconcile the shared fetch units. Every occupied slot participates,
  // whether or not a micro-op routes to it.
  let mut constant_fetch: Option<u8> = None;
  let mut attribute_fetch: Option<u8> = None;
  for src in instruction.sources.iter().flatten() {
    check_source(src)?;
    match src.register {
      SourceRegister::Constant(index) => {
        reconcile(&mut constant_fetch, index).map_err(|(previous, requested)| {
          CgcError::ConflictingFetch {
            unit: FetchUnit::Constant,
            previous,
            requested,
          }
        })?;
      }
      SourceRegister::Attribute(index) => {
        reconcile(&mut attribute_fetch, index).map_err(|(previous, requested)| {
          CgcError::ConflictingFetch {
            unit: FetchUnit::Attribute,
            previous,
            requested,
          }
        })?;
      }
      SourceRegister::Temp(_) => {}
    } // end match on source register
  }

  // Reconcile the once-per-instruction modifiers.
  let mut saturate: Option<bool> = None;
  let mut varying: Option<u8> = None;
  for dst in vector.iter().map(|(_, dst)| dst).chain(scalar.iter().map(|(_, dst)| dst)) {
    check_dst(dst)?;
    reconcile(&mut saturate, dst.saturate)
      .map_err(|_| CgcError::ConflictingModifier { modifier: "saturate flag" })?;
    if let DestRegister::Varying(index) = dst.register {
      reconcile(&mut varying, index)
        .map_err(|_| CgcError::ConflictingModifier { modifier: "varying target" })?;
    }
  }

  let mut word = InstructionWord::new();

  // Predicate gate, hard-wired to pass unconditionally. The bits in
  // ALWAYS_SET match what the stock compiler emits on every word; the
  // enable bit stays clear.
  for bit in fields::ALWAYS_SET.iter() {
    word.set_bit(*bit, true);
  }
  word.set_field(
    fields::PREDICATE_SWIZZLE,
    super::operand::Swizzle::IDENTITY.to_bits() as u128,
  );

  for (slot, source) in instruction.sources.iter().enumerate() {
    let layout = fields::src_slot(slot as u32);
    match source {
      Some(src) => {
        word.set_field(layout.ty, src.register.type_code());
        // Fetch-unit reads leave the per-slot index field at zero; the
        // real index lives in the shared field.
        if let SourceRegister::Temp(index) = src.register {
          word.set_field(layout.index, index as u128);
        }
        word.set_field(layout.swizzle, src.swizzle.to_bits() as u128);
        word.set_bit(layout.negate, src.negate);
        word.set_bit(layout.absolute, src.absolute);
      }
      None => {
        // Unused slots still carry a register-type code.
        word.set_field(layout.ty, fields::REG_TYPE_ATTRIBUTE);
      }
    } // end match on slot occupancy
  }

  if let Some(index) = constant_fetch {
    word.set_field(fields::CONSTANT_FETCH, index as u128);
  }
  if let Some(index) = attribute_fetch {
    word.set_field(fields::ATTRIBUTE_FETCH, index as u128);
  }
  if let Some(index) = varying {
    word.set_field(fields::VARYING_INDEX, index as u128);
    word.set_bit(fields::VARYING_WRITE, true);
  }
  word.set_bit(fields::SATURATE, saturate.unwrap_or(false));

  if let Some((op, dst)) = vector {
    word.set_field(fields::VECTOR_OPCODE, op.code() as u128);
    word.set_field(fields::VECTOR_WRITE_MASK, dst.mask.bits() as u128);
    word.set_field(fields::VECTOR_DST_INDEX, dst_index(&dst));
  }

  if let Some((op, dst)) = scalar {
    word.set_field(fields::SCALAR_OPCODE, op.code() as u128);
    word.set_field(fields::SCALAR_WRITE_MASK, dst.mask.bits() as u128);
    word.set_field(fields::SCALAR_DST_INDEX, dst_index(&dst));
  }

  word.set_bit(fields::LAST, last);

  debug!("encoded instruction word {}", word);
  Ok(word)
}
