/*!

  Tools for the programmable vertex processor of the Tegra graphics core:
  a bit-accurate codec for its 128 bit dual-issue instruction words, a
  parser for the container format the proprietary compiler wraps shader
  binaries in, symbol-table resolution, and diagnostic renderings of all of
  it.

  The codec is the heart of the crate. `instruction::encode` packs a
  validated `Instruction` into an `InstructionWord`; `instruction::decode`
  is its total inverse, able to render any 128 bit pattern as mnemonic
  text. The container layer locates instruction streams inside compiler
  output and resolves named attributes, uniforms and constants, and the
  dump layer prints the whole lot in the fixed listing format the
  reverse-engineering notes are diffed against.

*/

#[macro_use] extern crate prettytable;
#[macro_use] extern crate lazy_static;
#[macro_use] extern crate log;
extern crate strum;

pub mod compiler;
pub mod container;
pub mod dump;
pub mod error;
pub mod instruction;
pub mod shader;
pub mod symbols;

pub use compiler::{compile_shader, CompilerOutput, ShaderCompiler};
pub use container::{Container, Header, ShaderKind, SymbolRecord};
pub use dump::{hex_dump, listing, HexDump, Listing};
pub use error::{CgcError, CgcResult, FetchUnit};
pub use instruction::{
  decode, disassemble, encode, Component, DestRegister, Disassembly, Dst, Instruction,
  InstructionWord, ScalarOp, SourceRegister, Src, Swizzle, VectorOp, WriteMask,
};
pub use shader::Shader;
pub use symbols::{GlslType, Symbol, SymbolKind, SymbolTable};
