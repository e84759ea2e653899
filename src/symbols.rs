/*!

  Symbols the compiler publishes alongside a shader binary: attributes,
  uniforms and inlined constants, each carrying a GLSL type, a hardware
  location and, for constants, an immediate four word value.

  Symbol records tag their GLSL type with a one byte code that indexes the
  `DATA_TYPES` catalogue below. The catalogue is the observed subset, not the
  compiler's full universe, so lookups fall back to "unknown" instead of
  failing. Note the catalogue is keyed on the code byte, not on row position;
  two codes may share a `GlslType` (samplerCube and sampler2DArray both
  reduce to `Sampler3D`) while keeping distinct display names.

*/

use std::convert::TryFrom;

use bimap::BiMap;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use string_cache::DefaultAtom;
use strum_macros::{Display as StrumDisplay, IntoStaticStr};

/// The storage class of a symbol. The values are the raw record tags.
#[derive(
StrumDisplay, IntoStaticStr, TryFromPrimitive, IntoPrimitive,
Clone,        Copy,          Eq, PartialEq,    Debug,         Hash
)]
#[repr(u32)]
#[strum(serialize_all = "lowercase")]
pub enum SymbolKind {
  Unknown   = 0,
  Attribute = 0x1005,
  Uniform   = 0x1006,
  Constant  = 0x1007,
}

impl SymbolKind {
  /// Classifies a raw record tag, mapping unlisted tags to `Unknown`.
  pub fn from_tag(tag: u32) -> SymbolKind {
    SymbolKind::try_from(tag).unwrap_or(SymbolKind::Unknown)
  }
}

/// GLSL types as far as symbol records distinguish them. Precision
/// qualifiers are not part of this enum; they only survive in the catalogue
/// display names.
#[derive(
StrumDisplay, IntoStaticStr,
Clone,        Copy,          Eq, PartialEq, Debug, Hash
)]
#[strum(serialize_all = "lowercase")]
pub enum GlslType {
  Unknown,
  Float,
  Vec2,
  Vec3,
  Vec4,
  Mat2,
  Mat3,
  Mat4,
  #[strum(serialize = "sampler2D")]
  Sampler2D,
  #[strum(serialize = "sampler3D")]
  Sampler3D,
  Int,
  IVec2,
  IVec3,
  IVec4,
  Bool,
  BVec2,
  BVec3,
  BVec4,
}

/// One catalogue row binding a record code byte to a GLSL type and the
/// precision-qualified name dumps print for it.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub struct DataType {
  pub glsl: GlslType,
  pub code: u8,
  pub name: &'static str,
}

impl DataType {
  const fn new(glsl: GlslType, code: u8, name: &'static str) -> DataType {
    DataType { glsl, code, name }
  }
}

pub static DATA_TYPES: [DataType; 33] = [
  DataType::new(GlslType::Float, 0x01, "mediump float"),
  DataType::new(GlslType::Vec2, 0x02, "mediump vec2"),
  DataType::new(GlslType::Vec3, 0x03, "mediump vec3"),
  DataType::new(GlslType::Vec4, 0x04, "mediump vec4"),
  DataType::new(GlslType::Mat2, 0x0a, "mediump mat2"),
  DataType::new(GlslType::Mat3, 0x0f, "mediump mat3"),
  DataType::new(GlslType::Mat4, 0x14, "mediump mat4"),
  DataType::new(GlslType::Float, 0x15, "highp float"),
  DataType::new(GlslType::Vec2, 0x16, "highp vec2"),
  DataType::new(GlslType::Vec3, 0x17, "highp vec3"),
  DataType::new(GlslType::Vec4, 0x18, "highp vec4"),
  DataType::new(GlslType::Mat2, 0x1e, "highp mat2"),
  DataType::new(GlslType::Mat3, 0x23, "highp mat3"),
  DataType::new(GlslType::Mat4, 0x28, "highp mat4"),
  DataType::new(GlslType::Sampler2D, 0x2a, "sampler2D"),
  DataType::new(GlslType::Sampler3D, 0x2b, "sampler3D"),
  DataType::new(GlslType::Sampler3D, 0x2d, "samplerCube"),
  DataType::new(GlslType::Float, 0x2e, "lowp float"),
  DataType::new(GlslType::Vec2, 0x2f, "lowp vec2"),
  DataType::new(GlslType::Vec3, 0x30, "lowp vec3"),
  DataType::new(GlslType::Vec4, 0x31, "lowp vec4"),
  DataType::new(GlslType::Mat2, 0x37, "lowp mat2"),
  DataType::new(GlslType::Mat3, 0x3c, "lowp mat3"),
  DataType::new(GlslType::Mat4, 0x41, "lowp mat4"),
  DataType::new(GlslType::Int, 0x45, "int"),
  DataType::new(GlslType::IVec2, 0x47, "ivec2"),
  DataType::new(GlslType::IVec3, 0x48, "ivec3"),
  DataType::new(GlslType::IVec4, 0x49, "ivec4"),
  DataType::new(GlslType::Bool, 0x5a, "bool"),
  DataType::new(GlslType::BVec2, 0x5c, "bvec2"),
  DataType::new(GlslType::BVec3, 0x5d, "bvec3"),
  DataType::new(GlslType::BVec4, 0x5e, "bvec4"),
  DataType::new(GlslType::Sampler3D, 0x73, "sampler2DArray"),
];

/// The display name for a record code byte, "unknown" when uncatalogued.
pub fn data_type_name(code: u8) -> &'static str {
  DATA_TYPES
    .iter()
    .find(|row| row.code == code)
    .map(|row| row.name)
    .unwrap_or("unknown")
}

/// The GLSL type for a record code byte, `Unknown` when uncatalogued.
pub fn data_type_glsl(code: u8) -> GlslType {
  DATA_TYPES
    .iter()
    .find(|row| row.code == code)
    .map(|row| row.glsl)
    .unwrap_or(GlslType::Unknown)
}

/**
  A symbol as parsed out of the container. Nameless records are legal, so
  `name` is optional; `vector` is all zero except for constants with values
  present in the binary.
*/
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Symbol {
  pub name:     Option<DefaultAtom>,
  pub kind:     SymbolKind,
  pub glsl:     GlslType,
  pub location: u32,
  pub vector:   [u32; 4],
}

impl Symbol {
  pub fn name(&self) -> Option<&str> {
    self.name.as_deref()
  }
}

/**
  The symbol list of one shader plus a bidirectional name/location index. The
  list preserves record order, which the nth-of-kind queries rely on. The
  index is a convenience for listing annotation and is deliberately lossy:
  on a duplicate name or a duplicate (kind, location) pair the first record
  wins and the collision is logged, while the list itself keeps every
  record.
*/
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
  symbols:   Vec<Symbol>,
  locations: BiMap<DefaultAtom, (SymbolKind, u32)>,
}

impl SymbolTable {
  pub fn new() -> SymbolTable {
    SymbolTable {
      symbols:   Vec::new(),
      locations: BiMap::new(),
    }
  }

  pub fn from_symbols(symbols: Vec<Symbol>) -> SymbolTable {
    let mut table = SymbolTable::new();
    for symbol in symbols {
      table.push(symbol);
    }
    table
  }

  pub fn push(&mut self, symbol: Symbol) {
    if let Some(name) = &symbol.name {
      let entry = (symbol.kind, symbol.location);
      if let Err((name, entry)) = self.locations.insert_no_overwrite(name.clone(), entry) {
        warn!(
          "symbol {} at {} location {} shadows an earlier record in the location index",
          name, entry.0, entry.1
        );
      }
    }
    self.symbols.push(symbol);
  }

  pub fn len(&self) -> usize {
    self.symbols.len()
  }

  pub fn is_empty(&self) -> bool {
    self.symbols.is_empty()
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Symbol> {
    self.symbols.iter()
  }

  /// The nth symbol of `kind`, counting in record order.
  pub fn get_by_kind(&self, kind: SymbolKind, nth: usize) -> Option<&Symbol> {
    self.symbols.iter().filter(|symbol| symbol.kind == kind).nth(nth)
  }

  /// Finds `name` among symbols of `kind`. Also gives the position the
  /// symbol holds within its kind, the same numbering `get_by_kind` uses.
  pub fn find_by_kind(&self, kind: SymbolKind, name: &str) -> Option<(usize, &Symbol)> {
    self
      .symbols
      .iter()
      .filter(|symbol| symbol.kind == kind)
      .enumerate()
      .find(|(_, symbol)| symbol.name() == Some(name))
  }

  pub fn location_of(&self, name: &str) -> Option<(SymbolKind, u32)> {
    self.locations.get_by_left(&DefaultAtom::from(name)).copied()
  }

  pub fn name_for_location(&self, kind: SymbolKind, location: u32) -> Option<&str> {
    self
      .locations
      .get_by_right(&(kind, location))
      .map(|atom| atom.as_ref())
  }
}
