/*!

  Human-readable renderings of shaders: raw hex dumps, header and symbol
  tables, and the annotated instruction listing. Everything here is
  `Display` based so callers can route the text wherever they like, and so
  a whole `Shader` can be printed with nothing but `{}`.

  The hex dump and listing layouts are load-bearing: reverse-engineering
  notes and old captures are diffed against this exact text, so the column
  positions and context lines must not drift.

*/

use std::fmt::{Display, Formatter};

use prettytable::{format as TableFormat, Table};

use crate::container::{Header, SymbolRecord};
use crate::instruction::disassemble::decode;
use crate::instruction::fields;
use crate::instruction::InstructionWord;
use crate::shader::Shader;
use crate::symbols::{data_type_name, SymbolKind, SymbolTable};

lazy_static! {
  static ref TABLE_DISPLAY_FORMAT: TableFormat::TableFormat =
    TableFormat::FormatBuilder::new()
      .column_separator('│')
      .borders(' ')
      .separator(
        TableFormat::LinePosition::Title,
        TableFormat::LineSeparator::new('─', '┼', ' ', ' ')
      )
      .separator(
        TableFormat::LinePosition::Bottom,
        TableFormat::LineSeparator::new('─', '┴', ' ', ' ')
      )
      .padding(1, 1)
      .build();
}

/// Renders bytes four to a row: offset, the little-endian word value, the
/// bytes, then their printable characters. Ragged tails keep the columns
/// aligned by padding the missing cells.
pub struct HexDump<'a>(pub &'a [u8]);

pub fn hex_dump(bytes: &[u8]) -> HexDump<'_> {
  HexDump(bytes)
}

impl Display for HexDump<'_> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    for (row_index, row) in self.0.chunks(4).enumerate() {
      let mut value: u32 = 0;
      for (i, byte) in row.iter().enumerate() {
        value |= (*byte as u32) << (8 * i);
      }
      write!(f, "  {:08x}: {:08x} |", row_index * 4, value)?;
      for i in 0..4 {
        match row.get(i) {
          Some(byte) => write!(f, " {:02x}", byte)?,
          None => write!(f, "   ")?,
        }
      }
      write!(f, " | ")?;
      for i in 0..4 {
        match row.get(i) {
          Some(byte) if byte.is_ascii_graphic() || *byte == b' ' => {
            write!(f, "{}", *byte as char)?
          }
          Some(_) => write!(f, ".")?,
          None => write!(f, " ")?,
        }
      }
      writeln!(f, " |")?;
    } // end for each row
    Ok(())
  }
}

/**
  The instruction listing: per word the raw hex line, the shared fetch and
  varying context lines, the decoded micro-op lines, and `done` after a
  word with the last flag. When a symbol table is supplied, context lines
  whose index resolves to a named location gain a ` = name` suffix.
*/
pub struct Listing<'a> {
  words:   &'a [InstructionWord],
  symbols: Option<&'a SymbolTable>,
}

pub fn listing<'a>(
  words: &'a [InstructionWord],
  symbols: Option<&'a SymbolTable>,
) -> Listing<'a> {
  Listing { words, symbols }
}

impl Listing<'_> {
  fn annotate(
    &self,
    f: &mut Formatter<'_>,
    kinds: &[SymbolKind],
    location: u32,
  ) -> std::fmt::Result {
    if let Some(symbols) = self.symbols {
      for kind in kinds {
        if let Some(name) = symbols.name_for_location(*kind, location) {
          return write!(f, " = {}", name);
        }
      }
    }
    Ok(())
  }
}

impl Display for Listing<'_> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    for word in self.words {
      let memory = word.to_words();
      write!(f, "    ")?;
      for value in memory.iter() {
        write!(f, "{:08x}", value)?;
      }
      write!(f, " |")?;
      for value in memory.iter() {
        write!(f, " {:08x}", value)?;
      }
      writeln!(f)?;

      let constant = word.field(fields::CONSTANT_FETCH) as u32;
      let attribute = word.field(fields::ATTRIBUTE_FETCH) as u32;
      let varying = word.field(fields::VARYING_INDEX) as u32;

      write!(f, "      constant #{:02x}", constant)?;
      // The constant bank is shared by uniforms and inlined constants.
      self.annotate(f, &[SymbolKind::Uniform, SymbolKind::Constant], constant)?;
      writeln!(f)?;

      write!(f, "      attribute #{:02x}", attribute)?;
      self.annotate(f, &[SymbolKind::Attribute], attribute)?;
      writeln!(f)?;

      write!(f, "      varying #{:02x}", varying)?;
      // Output variables are recorded under the attribute tag.
      self.annotate(f, &[SymbolKind::Attribute], varying)?;
      writeln!(f)?;

      let decoded = decode(word);
      if let Some(vector) = &decoded.vector {
        writeln!(f, "      vec op")?;
        writeln!(f, "        {}", vector)?;
      }
      if let Some(scalar) = &decoded.scalar {
        writeln!(f, "      scalar op")?;
        writeln!(f, "        {}", scalar)?;
      }
      if decoded.last {
        writeln!(f, "    done")?;
      }
    } // end for each word
    Ok(())
  }
}

fn header_table(header: &Header) -> Table {
  let mut table = Table::new();
  table.set_format(*TABLE_DISPLAY_FORMAT);
  table.set_titles(row![ubr->"Field", ubl->"Value"]);
  table.add_row(row![r->"type", format!("{:#010x}", header.tag)]);
  table.add_row(row![r->"unknown00", format!("{:#010x}", header.unknown00)]);
  table.add_row(row![r->"size", header.size]);
  table.add_row(row![r->"num_symbols", header.num_symbols]);
  table.add_row(row![r->"bar_size", header.bar_size]);
  table.add_row(row![r->"bar_offset", format!("{:#010x}", header.bar_offset)]);
  table.add_row(row![r->"binary_size", header.binary_size]);
  table.add_row(row![r->"binary_offset", format!("{:#010x}", header.binary_offset)]);
  table.add_row(row![r->"unknown01", format!("{:#010x}", header.unknown01)]);
  table.add_row(row![r->"unknown02", format!("{:#010x}", header.unknown02)]);
  table.add_row(row![r->"unknown03", format!("{:#010x}", header.unknown03)]);
  table.add_row(row![r->"unknown04", format!("{:#010x}", header.unknown04)]);
  table
}

fn symbol_table(records: &[SymbolRecord], symbols: &SymbolTable) -> Table {
  let mut table = Table::new();
  table.set_format(*TABLE_DISPLAY_FORMAT);
  table.set_titles(row![ubr->"#", ubl->"Type", ubl->"Name", ubl->"Kind", ubr->"Location", ubl->"Values"]);

  for (i, (record, symbol)) in records.iter().zip(symbols.iter()).enumerate() {
    let values = match symbol.kind {
      SymbolKind::Constant => format!(
        "{:08x} {:08x} {:08x} {:08x}",
        symbol.vector[0], symbol.vector[1], symbol.vector[2], symbol.vector[3]
      ),
      _ => String::new(),
    };
    table.add_row(row![
      r->i,
      data_type_name((record.unknown00 & 0xff) as u8),
      symbol.name().unwrap_or(""),
      format!("{:#06x} ({})", record.unknown02, symbol.kind),
      r->symbol.location,
      values
    ]);
  } // end for each record
  table
}

fn kind_section(symbols: &SymbolTable, kind: SymbolKind) -> Table {
  let mut table = Table::new();
  table.set_format(*TABLE_DISPLAY_FORMAT);
  table.set_titles(row![ubr->"#", ubl->"Name", ubr->"Location"]);

  let mut nth = 0;
  while let Some(symbol) = symbols.get_by_kind(kind, nth) {
    table.add_row(row![r->nth, symbol.name().unwrap_or(""), r->symbol.location]);
    nth += 1;
  }
  table
}

impl Display for Shader {
  /// The full diagnostic report: raw dumps of both blobs, the parsed
  /// header and symbols, the instruction listing (vertex programs only),
  /// and the per-kind symbol sections.
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    writeln!(f, "shader binary: {} bytes", self.binary().len())?;
    write!(f, "{}", hex_dump(self.binary()))?;
    writeln!(f, "shader stream: {} bytes", self.stream().len())?;
    write!(f, "{}", hex_dump(self.stream()))?;

    writeln!(f, "{} shader:", self.kind)?;
    write!(f, "{}", header_table(&self.header))?;

    writeln!(f, "  symbols:")?;
    write!(f, "{}", symbol_table(&self.records, &self.symbols))?;

    match self.instruction_words() {
      Ok(words) => {
        writeln!(f, "  instructions:")?;
        write!(f, "{}", listing(&words, Some(&self.symbols)))?;
      }
      // Fragment programs carry no decodable instruction stream.
      Err(error) => writeln!(f, "  instructions: not shown ({})", error)?,
    }

    writeln!(f, "  attributes:")?;
    write!(f, "{}", kind_section(&self.symbols, SymbolKind::Attribute))?;
    writeln!(f, "  uniforms:")?;
    write!(f, "{}", kind_section(&self.symbols, SymbolKind::Uniform))?;
    writeln!(f, "  constants:")?;
    write!(f, "{}", kind_section(&self.symbols, SymbolKind::Constant))?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::instruction::encode::encode;
  use crate::instruction::operand::{DestRegister, Dst, Instruction, SourceRegister, Src};
  use crate::instruction::{VectorOp, WriteMask};
  use crate::symbols::tests::symbol;
  use crate::symbols::SymbolTable;

  #[test]
  fn hex_dump_row() {
    let text = hex_dump(&[0x6c, 0x9c, 0x1f, 0x40]).to_string();
    assert_eq!(text, "  00000000: 401f9c6c | 6c 9c 1f 40 | l..@ |\n");
  }

  #[test]
  fn hex_dump_ragged_tail() {
    let text = hex_dump(&[0x41, 0x42, 0x43, 0x44, 0x21]).to_string();
    let mut expected = String::new();
    expected.push_str("  00000000: 44434241 | 41 42 43 44 | ABCD |\n");
    expected.push_str("  00000004: 00000021 | 21          | !    |\n");
    assert_eq!(text, expected);
  }

  #[test]
  fn hex_dump_empty() {
    assert_eq!(hex_dump(&[]).to_string(), "");
  }

  fn dp4_to_varying() -> InstructionWord {
    let instruction = Instruction {
      vector: Some((
        VectorOp::Dp4,
        Dst::new(DestRegister::Varying(2), WriteMask::X),
      )),
      scalar: None,
      sources: [
        Some(Src::new(SourceRegister::Attribute(0))),
        Some(Src::new(SourceRegister::Constant(4))),
        None,
      ],
    };
    encode(&instruction, true).unwrap()
  }

  #[test]
  fn listing_shape() {
    let word = dp4_to_varying();
    let memory = word.to_words();
    let text = listing(&[word], None).to_string();

    let mut expected = String::new();
    expected.push_str(&format!(
      "    {:08x}{:08x}{:08x}{:08x} | {:08x} {:08x} {:08x} {:08x}\n",
      memory[0], memory[1], memory[2], memory[3],
      memory[0], memory[1], memory[2], memory[3],
    ));
    expected.push_str("      constant #04\n");
    expected.push_str("      attribute #00\n");
    expected.push_str("      varying #02\n");
    expected.push_str("      vec op\n");
    expected.push_str("        dp4 o2.x, v0.xyzw, c4.xyzw\n");
    expected.push_str("    done\n");
    assert_eq!(text, expected);
  }

  #[test]
  fn listing_annotates_resolved_locations() {
    let symbols = SymbolTable::from_symbols(vec![
      symbol("position", SymbolKind::Attribute, 0),
      symbol("mvp", SymbolKind::Uniform, 4),
    ]);
    let text = listing(&[dp4_to_varying()], Some(&symbols)).to_string();
    assert!(text.contains("      constant #04 = mvp\n"));
    assert!(text.contains("      attribute #00 = position\n"));
    // Location 2 resolves to nothing, so the line stays bare.
    assert!(text.contains("      varying #02\n"));
  }

  #[test]
  fn header_table_renders() {
    let header = Header {
      tag: 0x1b5d,
      unknown00: 0,
      size: 48,
      num_symbols: 0,
      bar_size: 0,
      bar_offset: 48,
      binary_size: 0,
      binary_offset: 0,
      unknown01: 0,
      unknown02: 0,
      unknown03: 0,
      unknown04: 0,
    };
    let text = header_table(&header).to_string();
    assert!(text.contains("Field"));
    assert!(text.contains("│"));
    assert!(text.contains("num_symbols"));
    assert!(text.contains("0x00001b5d"));
  }

  #[test]
  fn shader_report_structure() {
    use crate::container::tests::{build_container, pool_offset, record};
    use crate::shader::Shader;

    let records = [record(0x418, 0x1005, 0, pool_offset(1, 0), 0)];
    let binary = build_container(0x1b5d, &records, b"position\0");
    let shader = Shader::parse(binary, vec![0x21, 0x42]).unwrap();
    let report = shader.to_string();

    assert!(report.starts_with("shader binary: "));
    assert!(report.contains("shader stream: 2 bytes\n"));
    assert!(report.contains("vertex shader:"));
    assert!(report.contains("  symbols:"));
    assert!(report.contains("position"));
    assert!(report.contains("highp vec4"));
    assert!(report.contains("  instructions:"));
    assert!(report.contains("  attributes:"));
    assert!(report.contains("  uniforms:"));
    assert!(report.contains("  constants:"));
  }

  #[test]
  fn fragment_report_skips_the_listing() {
    use crate::container::tests::build_container;
    use crate::shader::Shader;

    let shader = Shader::parse(build_container(0x1b5e, &[], &[]), Vec::new()).unwrap();
    let report = shader.to_string();
    assert!(report.contains("fragment shader:"));
    assert!(report.contains("instructions: not shown"));
  }
}
