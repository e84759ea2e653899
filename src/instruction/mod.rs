/*!

  The instruction word format of the vertex processor, and codecs between the
  three representations involved:

    `Instruction`      what a caller wants executed (opcodes, operands)
    `InstructionWord`  the packed 128 bit wire form, four words in memory
    `Disassembly`      the mnemonic listing recovered from the wire form

  A word dual-issues one vector micro-op and one scalar micro-op per cycle.
  The two micro-ops share the three source operand slots, the saturate flag,
  the varying index, the predicate gate and the per-word attribute/constant
  fetch indices, which is why `Instruction` carries the sources once rather
  than per micro-op and why encoding can fail: two micro-ops may ask the
  shared hardware for incompatible things.

  Encoding is partial and validated; decoding is total. The two are inverse
  on every word `encode` produces, which the disassembler tests lean on.

*/

pub mod disassemble;
pub mod encode;
pub mod fields;
pub mod opcode;
pub mod operand;
pub mod word;

pub use disassemble::{decode, disassemble, DecodedOp, Disassembly};
pub use encode::encode;
pub use opcode::{ScalarOp, VectorOp};
pub use operand::{
  Component, DestRegister, Dst, Instruction, SourceRegister, Src, Swizzle, WriteMask,
};
pub use word::{InstructionWord, Word, BYTES_PER_INSTRUCTION, WORDS_PER_INSTRUCTION};
