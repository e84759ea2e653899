/*!

  The 128 bit instruction word and its bit-range accessors. Every encoder and
  decoder operation in this crate goes through `extract`/`insert` on this type,
  so the numbering convention lives here and nowhere else.

  An instruction occupies four little-endian 32 bit words in memory. Logically
  the group is one 128 bit integer whose most-significant word is the FIRST
  memory word: bit 0 is the least-significant bit of the last memory word and
  bit 127 the most-significant bit of the first. Ranges are inclusive on both
  ends, so the whole word is `(0, 127)` and memory word `i` is
  `(32 * (3 - i), 32 * (3 - i) + 31)`.

*/

use std::fmt::{Display, Formatter};

// If you change this you must also change the stream walkers in `shader`.
pub type Word = u32;

/// Memory words per instruction.
pub const WORDS_PER_INSTRUCTION: usize = 4;
/// Bytes per instruction in a binary stream.
pub const BYTES_PER_INSTRUCTION: usize = WORDS_PER_INSTRUCTION * 4;

/// A single 128 bit instruction. Zero-valued by default, which encodes an
/// instruction with no micro-ops and no flags set.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, Default)]
pub struct InstructionWord {
  bits: u128,
}

/// Mask with the low `width` bits set. `width` may be the full 128.
fn low_mask(width: u32) -> u128 {
  match width >= 128 {
    true => u128::max_value(),
    false => (1u128 << width) - 1,
  }
}

impl InstructionWord {
  pub fn new() -> InstructionWord {
    InstructionWord { bits: 0 }
  }

  /// Assembles the logical 128 bit value from the four memory-order words of
  /// one instruction, exactly as they appear in a binary stream.
  pub fn from_words(words: [Word; WORDS_PER_INSTRUCTION]) -> InstructionWord {
    let mut bits: u128 = 0;
    for word in words.iter() {
      bits = (bits << 32) | (*word as u128);
    }
    InstructionWord { bits }
  }

  /// Splits the instruction back into memory-order words for emission.
  pub fn to_words(&self) -> [Word; WORDS_PER_INSTRUCTION] {
    let mut words = [0 as Word; WORDS_PER_INSTRUCTION];
    for (i, word) in words.iter_mut().enumerate() {
      *word = self.extract((32 * (3 - i)) as u32, (32 * (3 - i) + 31) as u32) as Word;
    }
    words
  }

  /**
    Returns the bits of the inclusive range `lo..=hi` right-aligned in the
    result. Out-of-range or inverted indices are a caller contract violation
    and fail fast.
  */
  pub fn extract(&self, lo: u32, hi: u32) -> u128 {
    assert!(
      lo <= hi && hi < 128,
      "bit range {}..={} is not a subrange of 0..=127",
      lo,
      hi
    );
    (self.bits >> lo) & low_mask(hi - lo + 1)
  }

  /**
    Writes the low `hi - lo + 1` bits of `value` into the inclusive range
    `lo..=hi`, leaving every other bit untouched. A `value` wider than the
    range is a caller contract violation and fails fast; truncation is never
    silent.
  */
  pub fn insert(&mut self, lo: u32, hi: u32, value: u128) {
    assert!(
      lo <= hi && hi < 128,
      "bit range {}..={} is not a subrange of 0..=127",
      lo,
      hi
    );
    let mask = low_mask(hi - lo + 1);
    assert!(
      value & !mask == 0,
      "value {:#x} does not fit in bit range {}..={}",
      value,
      lo,
      hi
    );
    self.bits = (self.bits & !(mask << lo)) | (value << lo);
  }

  /// Single-bit specialization of `extract`.
  pub fn bit(&self, index: u32) -> bool {
    self.extract(index, index) != 0
  }

  /// Single-bit specialization of `insert`.
  pub fn set_bit(&mut self, index: u32, value: bool) {
    self.insert(index, index, value as u128);
  }
}

impl Display for InstructionWord {
  /// The four memory-order words, space separated, as a disassembly listing
  /// shows them.
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let words = self.to_words();
    write!(
      f,
      "{:08x} {:08x} {:08x} {:08x}",
      words[0], words[1], words[2], words[3]
    )
  }
}
