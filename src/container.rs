/*!

  The container format the compiler wraps shader binaries in: a 48 byte
  header, an array of 48 byte symbol records, then free-form data the
  records point into by byte offset (names, constant values, the program
  words themselves).

  Field names ending in a number are offsets whose meaning has not been
  pinned down yet; they are carried verbatim so dumps can show them and so
  re-emitted containers stay faithful. Every offset a record supplies is
  range-checked against the buffer before use. The container was produced
  by a closed compiler, so a malformed one is an input problem to report,
  never a panic.

*/

use nom::{
  combinator::map,
  multi::count,
  number::complete::le_u32,
  sequence::tuple,
  IResult,
};
use string_cache::DefaultAtom;
use strum_macros::{Display as StrumDisplay, IntoStaticStr};

use crate::error::{CgcError, CgcResult};
use crate::symbols::{data_type_glsl, Symbol, SymbolKind, SymbolTable};

pub const HEADER_BYTES: usize = 48;
pub const SYMBOL_RECORD_BYTES: usize = 48;

/// Container type tags.
const VERTEX_TAG: u32 = 0x1b5d;
const FRAGMENT_TAG: u32 = 0x1b5e;

/// Which processor a shader targets, as tagged in the container header.
#[derive(
StrumDisplay, IntoStaticStr,
Clone,        Copy,          Eq, PartialEq, Debug, Hash
)]
#[strum(serialize_all = "lowercase")]
pub enum ShaderKind {
  Vertex,
  Fragment,
}

impl ShaderKind {
  pub fn tag(&self) -> u32 {
    match self {
      ShaderKind::Vertex => VERTEX_TAG,
      ShaderKind::Fragment => FRAGMENT_TAG,
    }
  }

  pub fn from_tag(tag: u32) -> Option<ShaderKind> {
    match tag {
      VERTEX_TAG => Some(ShaderKind::Vertex),
      FRAGMENT_TAG => Some(ShaderKind::Fragment),
      _ => None,
    }
  }
}

/// The fixed header. All fields are little-endian words in the file.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub struct Header {
  pub tag:           u32,
  pub unknown00:     u32,
  pub size:          u32,
  pub num_symbols:   u32,
  pub bar_size:      u32,
  pub bar_offset:    u32,
  pub binary_size:   u32,
  pub binary_offset: u32,
  pub unknown01:     u32,
  pub unknown02:     u32,
  pub unknown03:     u32,
  pub unknown04:     u32,
}

/// One raw symbol record. `unknown00` carries the data-type code in its low
/// byte; `unknown02` is the storage-class tag; `unknown03` the location.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub struct SymbolRecord {
  pub unknown00:     u32,
  pub unknown01:     u32,
  pub unknown02:     u32,
  pub unknown03:     u32,
  pub name_offset:   u32,
  pub values_offset: u32,
  pub unknown06:     u32,
  pub alt_offset:    u32,
  pub unknown08:     u32,
  pub unknown09:     u32,
  pub unknown10:     u32,
  pub unknown11:     u32,
}

/// A fully parsed container: the raw header and records plus the resolved
/// symbol table. Owns no part of the source buffer.
#[derive(Clone, Debug)]
pub struct Container {
  pub kind:    ShaderKind,
  pub header:  Header,
  pub records: Vec<SymbolRecord>,
  pub symbols: SymbolTable,
}

fn parse_header(input: &[u8]) -> IResult<&[u8], Header> {
  map(
    tuple((
      le_u32, le_u32, le_u32, le_u32, le_u32, le_u32,
      le_u32, le_u32, le_u32, le_u32, le_u32, le_u32,
    )),
    |(
      tag, unknown00, size, num_symbols, bar_size, bar_offset,
      binary_size, binary_offset, unknown01, unknown02, unknown03, unknown04,
    )| Header {
      tag,
      unknown00,
      size,
      num_symbols,
      bar_size,
      bar_offset,
      binary_size,
      binary_offset,
      unknown01,
      unknown02,
      unknown03,
      unknown04,
    },
  )(input)
}

fn parse_record(input: &[u8]) -> IResult<&[u8], SymbolRecord> {
  map(
    tuple((
      le_u32, le_u32, le_u32, le_u32, le_u32, le_u32,
      le_u32, le_u32, le_u32, le_u32, le_u32, le_u32,
    )),
    |(
      unknown00, unknown01, unknown02, unknown03, name_offset, values_offset,
      unknown06, alt_offset, unknown08, unknown09, unknown10, unknown11,
    )| SymbolRecord {
      unknown00,
      unknown01,
      unknown02,
      unknown03,
      name_offset,
      values_offset,
      unknown06,
      alt_offset,
      unknown08,
      unknown09,
      unknown10,
      unknown11,
    },
  )(input)
}

/// Checks that `offset .. offset + size` lies inside the buffer. Zero-sized
/// regions still need an in-bounds offset.
fn check_range(binary: &[u8], offset: u32, size: u32, what: &str) -> CgcResult<()> {
  let in_bounds = (offset as usize)
    .checked_add(size as usize)
    .map(|end| end <= binary.len())
    .unwrap_or(false);
  match in_bounds {
    true => Ok(()),
    false => Err(CgcError::malformed(format!(
      "{} region {:#x}+{:#x} escapes the {} byte container",
      what,
      offset,
      size,
      binary.len()
    ))),
  }
}

/// Reads the NUL-terminated name at `offset`. An offset of zero means the
/// record is nameless. A missing terminator reads to the end of the buffer.
fn read_name(binary: &[u8], offset: u32) -> CgcResult<Option<DefaultAtom>> {
  if offset == 0 {
    return Ok(None);
  }
  let start = offset as usize;
  if start >= binary.len() {
    return Err(CgcError::malformed(format!(
      "symbol name offset {:#x} escapes the {} byte container",
      offset,
      binary.len()
    )));
  }
  let tail = &binary[start..];
  let end = tail.iter().position(|byte| *byte == 0).unwrap_or(tail.len());
  let name = String::from_utf8_lossy(&tail[..end]);
  Ok(Some(DefaultAtom::from(name.as_ref())))
}

/// Reads the four word constant value at `offset`, zero meaning absent.
fn read_values(binary: &[u8], offset: u32) -> CgcResult<Option<[u32; 4]>> {
  if offset == 0 {
    return Ok(None);
  }
  check_range(binary, offset, 16, "constant value")?;
  let window = &binary[offset as usize..offset as usize + 16];
  let parsed: IResult<&[u8], (u32, u32, u32, u32)> =
    tuple((le_u32, le_u32, le_u32, le_u32))(window);
  match parsed {
    Ok((_, (x, y, z, w))) => Ok(Some([x, y, z, w])),
    Err(_) => Err(CgcError::malformed("constant value truncated")),
  }
}

fn resolve_symbol(binary: &[u8], record: &SymbolRecord) -> CgcResult<Symbol> {
  let kind = SymbolKind::from_tag(record.unknown02);
  let name = read_name(binary, record.name_offset)?;

  let vector = match kind {
    SymbolKind::Constant => match read_values(binary, record.values_offset)? {
      Some(values) => values,
      None => {
        warn!(
          "no values for constant {}",
          name.as_deref().unwrap_or("<anonymous>")
        );
        [0; 4]
      }
    },
    _ => [0; 4],
  };

  Ok(Symbol {
    name,
    kind,
    glsl: data_type_glsl((record.unknown00 & 0xff) as u8),
    location: record.unknown03,
    vector,
  })
}

/// Parses and validates a container, resolving its symbol records.
pub fn parse(binary: &[u8]) -> CgcResult<Container> {
  if binary.len() < HEADER_BYTES {
    return Err(CgcError::malformed(format!(
      "{} bytes is too short for a container header",
      binary.len()
    )));
  }

  let (_, header) =
    parse_header(binary).map_err(|_| CgcError::malformed("container header truncated"))?;

  let kind = ShaderKind::from_tag(header.tag).ok_or_else(|| {
    CgcError::malformed(format!("unrecognized container tag {:#010x}", header.tag))
  })?;

  if header.size as usize > binary.len() {
    return Err(CgcError::malformed(format!(
      "header claims {:#x} bytes but the buffer holds {:#x}",
      header.size,
      binary.len()
    )));
  }

  let record_bytes = (header.num_symbols as usize)
    .checked_mul(SYMBOL_RECORD_BYTES)
    .filter(|bytes| {
      bytes
        .checked_add(HEADER_BYTES)
        .map(|end| end <= binary.len())
        .unwrap_or(false)
    })
    .ok_or_else(|| {
      CgcError::malformed(format!(
        "{} symbol records do not fit in a {} byte container",
        header.num_symbols,
        binary.len()
      ))
    })?;

  if record_bytes > header.bar_size as usize {
    return Err(CgcError::malformed(format!(
      "{} symbol records overflow the {:#x} byte symbol table",
      header.num_symbols, header.bar_size
    )));
  }

  check_range(binary, header.bar_offset, header.bar_size, "symbol table")?;
  check_range(binary, header.binary_offset, header.binary_size, "program")?;

  let mut records = Vec::new();
  records
    .try_reserve_exact(header.num_symbols as usize)
    .map_err(|_| CgcError::OutOfMemory)?;

  let record_window = &binary[HEADER_BYTES..HEADER_BYTES + record_bytes];
  let parsed = count(parse_record, header.num_symbols as usize)(record_window);
  match parsed {
    Ok((_, mut parsed_records)) => records.append(&mut parsed_records),
    Err(_) => return Err(CgcError::malformed("symbol records truncated")),
  }

  let mut symbols = SymbolTable::new();
  for record in records.iter() {
    symbols.push(resolve_symbol(binary, record)?);
  }

  Ok(Container {
    kind,
    header,
    records,
    symbols,
  })
}

#[cfg(test)]
pub mod tests {
  use super::*;
  use crate::symbols::GlslType;

  pub fn push_word(bytes: &mut Vec<u8>, word: u32) {
    bytes.extend_from_slice(&word.to_le_bytes());
  }

  /// A record with only the fields the resolver reads filled in.
  pub fn record(code: u32, tag: u32, location: u32, name_offset: u32, values_offset: u32) -> [u32; 12] {
    [code, 0, tag, location, name_offset, values_offset, 0, 0, 0, 0, 0, 0]
  }

  /// Lays out header, records, then a data pool already positioned by the
  /// offsets inside the records.
  pub fn build_container(tag: u32, records: &[[u32; 12]], pool: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::new();
    let table = records.len() * SYMBOL_RECORD_BYTES;
    let size = HEADER_BYTES + table + pool.len();
    let header = [
      tag, 0, size as u32, records.len() as u32,
      table as u32, HEADER_BYTES as u32, 0, 0,
      0, 0, 0, 0,
    ];
    for word in header.iter() {
      push_word(&mut bytes, *word);
    }
    for record in records {
      for word in record.iter() {
        push_word(&mut bytes, *word);
      }
    }
    bytes.extend_from_slice(pool);
    bytes
  }

  pub fn pool_offset(records: usize, within: usize) -> u32 {
    (HEADER_BYTES + records * SYMBOL_RECORD_BYTES + within) as u32
  }

  #[test]
  fn parses_symbols() {
    let mut pool = Vec::new();
    pool.extend_from_slice(b"position\0");
    pool.extend_from_slice(b"offset\0");
    for word in [0x3f800000u32, 0, 0, 0x40000000].iter() {
      push_word(&mut pool, *word);
    }

    let records = [
      record(0x418, 0x1005, 0, pool_offset(3, 0), 0),
      record(0x443, 0x1007, 5, pool_offset(3, 9), pool_offset(3, 16)),
      record(0x42a, 0x1006, 1, 0, 0),
    ];
    let binary = build_container(0x1b5d, &records, &pool);
    let container = parse(&binary).unwrap();

    assert_eq!(container.kind, ShaderKind::Vertex);
    assert_eq!(container.header.num_symbols, 3);
    assert_eq!(container.symbols.len(), 3);

    let position = container.symbols.get_by_kind(SymbolKind::Attribute, 0).unwrap();
    assert_eq!(position.name(), Some("position"));
    assert_eq!(position.glsl, GlslType::Vec4);
    assert_eq!(position.location, 0);

    let offset = container.symbols.get_by_kind(SymbolKind::Constant, 0).unwrap();
    assert_eq!(offset.name(), Some("offset"));
    assert_eq!(offset.vector, [0x3f800000, 0, 0, 0x40000000]);

    let sampler = container.symbols.get_by_kind(SymbolKind::Uniform, 0).unwrap();
    assert_eq!(sampler.name(), None);
    assert_eq!(sampler.glsl, GlslType::Sampler2D);
  }

  #[test]
  fn short_buffer_is_rejected() {
    let result = parse(&[0u8; 12]);
    assert_eq!(
      result.err(),
      Some(CgcError::malformed("12 bytes is too short for a container header"))
    );
  }

  #[test]
  fn unknown_tag_is_rejected() {
    let binary = build_container(0x1234, &[], &[]);
    assert!(matches!(parse(&binary), Err(CgcError::MalformedContainer { .. })));
  }

  #[test]
  fn fragment_tag_parses() {
    let binary = build_container(0x1b5e, &[], &[]);
    assert_eq!(parse(&binary).unwrap().kind, ShaderKind::Fragment);
  }

  #[test]
  fn record_count_is_bounded_by_the_buffer() {
    let mut binary = build_container(0x1b5d, &[], &[]);
    // Claim more records than the buffer holds.
    binary[12..16].copy_from_slice(&7u32.to_le_bytes());
    assert!(matches!(parse(&binary), Err(CgcError::MalformedContainer { .. })));
  }

  #[test]
  fn record_count_is_bounded_by_the_symbol_table() {
    let records = [record(0x418, 0x1005, 0, 0, 0); 2];
    let mut binary = build_container(0x1b5d, &records, &[0u8; 64]);
    // Shrink the declared table below the two records it must hold.
    binary[16..20].copy_from_slice(&(SYMBOL_RECORD_BYTES as u32).to_le_bytes());
    assert!(matches!(parse(&binary), Err(CgcError::MalformedContainer { .. })));
  }

  #[test]
  fn record_count_overflow_is_rejected() {
    let mut binary = build_container(0x1b5d, &[], &[]);
    binary[12..16].copy_from_slice(&u32::max_value().to_le_bytes());
    assert!(matches!(parse(&binary), Err(CgcError::MalformedContainer { .. })));
  }

  #[test]
  fn program_region_out_of_range() {
    let mut binary = build_container(0x1b5d, &[], &[]);
    binary[24..28].copy_from_slice(&0x100u32.to_le_bytes());
    binary[28..32].copy_from_slice(&0x30u32.to_le_bytes());
    assert!(matches!(parse(&binary), Err(CgcError::MalformedContainer { .. })));
  }

  #[test]
  fn zero_sized_program_with_wild_offset_is_rejected() {
    let mut binary = build_container(0x1b5d, &[], &[]);
    // binary_size stays 0; only the offset is garbage.
    binary[28..32].copy_from_slice(&0x1000u32.to_le_bytes());
    assert!(matches!(parse(&binary), Err(CgcError::MalformedContainer { .. })));
  }

  #[test]
  fn name_offset_out_of_range() {
    let records = [record(0x418, 0x1005, 0, 0xffff, 0)];
    let binary = build_container(0x1b5d, &records, &[]);
    assert!(matches!(parse(&binary), Err(CgcError::MalformedContainer { .. })));
  }

  #[test]
  fn values_offset_out_of_range() {
    let records = [record(0x443, 0x1007, 0, 0, 0xffff)];
    let binary = build_container(0x1b5d, &records, &[]);
    assert!(matches!(parse(&binary), Err(CgcError::MalformedContainer { .. })));
  }

  #[test]
  fn constant_without_values_parses_zeroed() {
    let records = [record(0x443, 0x1007, 2, 0, 0)];
    let binary = build_container(0x1b5d, &records, &[]);
    let container = parse(&binary).unwrap();
    let constant = container.symbols.get_by_kind(SymbolKind::Constant, 0).unwrap();
    assert_eq!(constant.vector, [0; 4]);
  }

  #[test]
  fn oversized_header_claim_is_rejected() {
    let mut binary = build_container(0x1b5d, &[], &[]);
    binary[8..12].copy_from_slice(&0x1000u32.to_le_bytes());
    assert!(matches!(parse(&binary), Err(CgcError::MalformedContainer { .. })));
  }

  #[test]
  fn unterminated_name_reads_to_the_end() {
    let records = [record(0x418, 0x1005, 0, pool_offset(1, 0), 0)];
    let binary = build_container(0x1b5d, &records, b"clip");
    let container = parse(&binary).unwrap();
    let symbol = container.symbols.get_by_kind(SymbolKind::Attribute, 0).unwrap();
    assert_eq!(symbol.name(), Some("clip"));
  }

  #[test]
  fn kind_tags_round_trip() {
    assert_eq!(ShaderKind::from_tag(0x1b5d), Some(ShaderKind::Vertex));
    assert_eq!(ShaderKind::Fragment.tag(), 0x1b5e);
    assert_eq!(ShaderKind::from_tag(0), None);
    assert_eq!(ShaderKind::Vertex.to_string(), "vertex");
  }
}
