/*!

  A compiled shader as a queryable value: the container binary, the
  auxiliary command stream blob that accompanies it, and the symbol table
  resolved out of the container.

  The two blobs are kept whole because the dump renderer shows them byte for
  byte. Structured access goes through `instruction_words` and
  `command_stream`, both of which refuse politely when asked of a fragment
  program; the fragment instruction set has not been reverse-engineered, so
  for fragments only the container-level views are meaningful.

*/

use crate::container::{self, Header, ShaderKind, SymbolRecord};
use crate::error::{CgcError, CgcResult};
use crate::instruction::{InstructionWord, Word, BYTES_PER_INSTRUCTION, WORDS_PER_INSTRUCTION};
use crate::symbols::{Symbol, SymbolKind, SymbolTable};

/// Byte offset, within the stream blob, of the word that locates the
/// command stream (counted in words from the blob start).
const STREAM_WORDS_OFFSET: usize = 0xe8;
/// Byte offset of the command stream length in bytes.
const STREAM_LENGTH_OFFSET: usize = 0xec;

#[derive(Clone, Debug)]
pub struct Shader {
  pub kind:    ShaderKind,
  pub header:  Header,
  pub records: Vec<SymbolRecord>,
  pub symbols: SymbolTable,
  binary:      Vec<u8>,
  stream:      Vec<u8>,
}

impl Shader {
  /// Parses the compiler's two output blobs into a shader value, taking
  /// ownership of both.
  pub fn parse(binary: Vec<u8>, stream: Vec<u8>) -> CgcResult<Shader> {
    let container = container::parse(&binary)?;
    Ok(Shader {
      kind: container.kind,
      header: container.header,
      records: container.records,
      symbols: container.symbols,
      binary,
      stream,
    })
  }

  /// The container binary, exactly as the compiler emitted it.
  pub fn binary(&self) -> &[u8] {
    &self.binary
  }

  /// The auxiliary stream blob, exactly as the compiler emitted it.
  pub fn stream(&self) -> &[u8] {
    &self.stream
  }

  pub fn get_symbol_by_kind(&self, kind: SymbolKind, nth: usize) -> Option<&Symbol> {
    self.symbols.get_by_kind(kind, nth)
  }

  /// Finds `name` among symbols of `kind`, also reporting the position the
  /// symbol holds within that kind.
  pub fn find_symbol_by_kind(&self, kind: SymbolKind, name: &str) -> Option<(usize, &Symbol)> {
    self.symbols.find_by_kind(kind, name)
  }

  pub fn attribute(&self, nth: usize) -> Option<&Symbol> {
    self.get_symbol_by_kind(SymbolKind::Attribute, nth)
  }

  pub fn uniform(&self, nth: usize) -> Option<&Symbol> {
    self.get_symbol_by_kind(SymbolKind::Uniform, nth)
  }

  pub fn constant(&self, nth: usize) -> Option<&Symbol> {
    self.get_symbol_by_kind(SymbolKind::Constant, nth)
  }

  pub fn find_attribute(&self, name: &str) -> Option<(usize, &Symbol)> {
    self.find_symbol_by_kind(SymbolKind::Attribute, name)
  }

  pub fn find_uniform(&self, name: &str) -> Option<(usize, &Symbol)> {
    self.find_symbol_by_kind(SymbolKind::Uniform, name)
  }

  pub fn find_constant(&self, name: &str) -> Option<(usize, &Symbol)> {
    self.find_symbol_by_kind(SymbolKind::Constant, name)
  }

  fn require_vertex(&self) -> CgcResult<()> {
    match self.kind {
      ShaderKind::Vertex => Ok(()),
      ShaderKind::Fragment => Err(CgcError::NotVertexProgram {
        found: self.header.tag,
      }),
    }
  }

  /// The instruction words of a vertex program, in program order.
  pub fn instruction_words(&self) -> CgcResult<Vec<InstructionWord>> {
    self.require_vertex()?;

    let offset = self.header.binary_offset as usize;
    let size = self.header.binary_size as usize;
    if size % BYTES_PER_INSTRUCTION != 0 {
      return Err(CgcError::malformed(format!(
        "program size {:#x} is not a whole number of instructions",
        size
      )));
    }

    let in_bounds = offset
      .checked_add(size)
      .map(|end| end <= self.binary.len())
      .unwrap_or(false);
    if !in_bounds {
      return Err(CgcError::malformed(format!(
        "program region {:#x}+{:#x} escapes the {} byte container",
        offset,
        size,
        self.binary.len()
      )));
    }

    let program = &self.binary[offset..offset + size];
    let mut decoded = Vec::with_capacity(size / BYTES_PER_INSTRUCTION);
    for group in program.chunks_exact(BYTES_PER_INSTRUCTION) {
      let mut words = [0 as Word; WORDS_PER_INSTRUCTION];
      for (i, bytes) in group.chunks_exact(4).enumerate() {
        words[i] = Word::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
      }
      decoded.push(InstructionWord::from_words(words));
    }
    Ok(decoded)
  }

  fn stream_word(&self, offset: usize) -> CgcResult<u32> {
    if offset + 4 > self.stream.len() {
      return Err(CgcError::malformed(format!(
        "stream blob ends before the descriptor word at {:#x}",
        offset
      )));
    }
    let bytes = &self.stream[offset..offset + 4];
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
  }

  /// The command stream window of a vertex program. The blob locates it
  /// with a word offset and a byte length near its tail.
  pub fn command_stream(&self) -> CgcResult<&[u8]> {
    self.require_vertex()?;

    let offset = self.stream_word(STREAM_WORDS_OFFSET)? as usize * 4;
    let length = self.stream_word(STREAM_LENGTH_OFFSET)? as usize;
    let in_bounds = offset
      .checked_add(length)
      .map(|end| end <= self.stream.len())
      .unwrap_or(false);
    if !in_bounds {
      return Err(CgcError::malformed(format!(
        "command stream window {:#x}+{:#x} escapes the {} byte blob",
        offset,
        length,
        self.stream.len()
      )));
    }
    Ok(&self.stream[offset..offset + length])
  }
}
