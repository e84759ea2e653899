/*!

  The bit map of the vertex instruction word, as reverse-engineered from
  streams produced by the stock compiler. Both the encoder and the decoder
  read their positions from here, which is what keeps the two exact inverses
  of each other.

  Inclusive ranges, bit 0 = least-significant bit of the last memory word:

    0        last-instruction flag
    2..5     varying index shared by both micro-ops
    7..12    scalar destination register index (63 = shared write target)
    13..16   vector write mask, x highest
    17..20   scalar write mask, x highest
    21..37   source slot c
    38..54   source slot b
    55..71   source slot a
    72..75   attribute fetch index
    76..83   constant-bank fetch index
    86..90   vector opcode
    91..94   scalar opcode
    98..105  predicate swizzle, x select highest
    106..108 unknown, always set by the stock compiler (107 doubles as the
             predicate negate when the gate is enabled)
    109      predicate enable
    111..116 vector destination register index (63 = shared write target)
    117..119 per-slot absolute-value flags, slot a first
    122      saturate
    125      predicate-write flag
    126      varying-write flag

  Each source slot spans 17 bits starting at `55 - 17 * slot`:

    +0..+1   register type
    +2..+7   temp register index (0 when the slot reads through a fetch unit)
    +8..+15  swizzle, two bits per component, x select highest
    +16      negate

  The scalar unit has no slots of its own; it reads its single operand from
  slot c's fields and its absolute-value flag.

*/

use super::word::InstructionWord;

/// An inclusive bit range of the instruction word.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub struct Field {
  pub lo: u32,
  pub hi: u32,
}

impl Field {
  pub const fn new(lo: u32, hi: u32) -> Field {
    Field { lo, hi }
  }

  pub fn width(&self) -> u32 {
    self.hi - self.lo + 1
  }

  /// Largest value the field can hold.
  pub fn limit(&self) -> u32 {
    ((1u64 << self.width()) - 1) as u32
  }
}

impl InstructionWord {
  pub fn field(&self, field: Field) -> u128 {
    self.extract(field.lo, field.hi)
  }

  pub fn set_field(&mut self, field: Field, value: u128) {
    self.insert(field.lo, field.hi, value);
  }
}

pub const LAST: u32 = 0;
pub const VARYING_INDEX: Field = Field::new(2, 5);
pub const SCALAR_DST_INDEX: Field = Field::new(7, 12);
pub const VECTOR_WRITE_MASK: Field = Field::new(13, 16);
pub const SCALAR_WRITE_MASK: Field = Field::new(17, 20);
pub const ATTRIBUTE_FETCH: Field = Field::new(72, 75);
pub const CONSTANT_FETCH: Field = Field::new(76, 83);
pub const VECTOR_OPCODE: Field = Field::new(86, 90);
pub const SCALAR_OPCODE: Field = Field::new(91, 94);
pub const PREDICATE_SWIZZLE: Field = Field::new(98, 105);
pub const PREDICATE_NEGATE: u32 = 107;
pub const PREDICATE_ENABLE: u32 = 109;
pub const VECTOR_DST_INDEX: Field = Field::new(111, 116);
pub const SATURATE: u32 = 122;
pub const PREDICATE_WRITE: u32 = 125;
pub const VARYING_WRITE: u32 = 126;

/// Bits of unknown meaning that the stock compiler sets on every word.
pub const ALWAYS_SET: [u32; 3] = [106, 107, 108];

/// Destination index value that redirects the write to the shared
/// varying/predicate target instead of a temp register.
pub const SHARED_WRITE_SENTINEL: u128 = 0x3f;

// 2 bit register-type codes used by the per-slot type fields.
pub const REG_TYPE_INVALID: u128 = 0;
pub const REG_TYPE_TEMP: u128 = 1;
pub const REG_TYPE_ATTRIBUTE: u128 = 2;
pub const REG_TYPE_CONSTANT: u128 = 3;

/// The field group of one source-operand slot.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub struct SrcSlot {
  pub ty: Field,
  pub index: Field,
  pub swizzle: Field,
  pub negate: u32,
  pub absolute: u32,
}

/// Field positions for source slot `slot`, which must be 0, 1, or 2.
pub const fn src_slot(slot: u32) -> SrcSlot {
  let base = 55 - 17 * slot;
  SrcSlot {
    ty: Field::new(base, base + 1),
    index: Field::new(base + 2, base + 7),
    swizzle: Field::new(base + 8, base + 15),
    negate: base + 16,
    absolute: 117 + slot,
  }
}
