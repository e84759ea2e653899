/*!

  Operand descriptors: the caller-facing model of registers, swizzles, write
  masks, and modifiers that the encoder serializes. Varying registers appear
  only on the destination side, never as sources; the types here make the
  illegal combination unrepresentable instead of checking for it at encode
  time.

*/

use std::fmt::{Display, Formatter};
use std::ops::BitOr;

use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum_macros::Display as StrumDisplay;

use super::fields;
use super::opcode::{ScalarOp, VectorOp};

/// One of a register's four components.
#[derive(
StrumDisplay, TryFromPrimitive, IntoPrimitive,
Clone,        Copy,             Eq, PartialEq, Debug, Hash
)]
#[repr(u8)]
#[strum(serialize_all = "lowercase")]
pub enum Component {
  X = 0,
  Y = 1,
  Z = 2,
  W = 3,
}

impl Component {
  /// Total conversion from a 2 bit field value.
  pub fn from_bits(bits: u8) -> Component {
    match bits & 0b11 {
      0 => Component::X,
      1 => Component::Y,
      2 => Component::Z,
      _ => Component::W,
    }
  }
}

/// A 4-component selector: element `i` names the source component feeding
/// destination component `i`.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub struct Swizzle(pub [Component; 4]);

impl Swizzle {
  pub const IDENTITY: Swizzle =
    Swizzle([Component::X, Component::Y, Component::Z, Component::W]);

  /// Broadcast one component to all four lanes.
  pub fn splat(component: Component) -> Swizzle {
    Swizzle([component; 4])
  }

  /// Packs to the wire byte, x select in the two highest bits.
  pub fn to_bits(&self) -> u8 {
    let Swizzle([x, y, z, w]) = *self;
    (u8::from(x) << 6) | (u8::from(y) << 4) | (u8::from(z) << 2) | u8::from(w)
  }

  pub fn from_bits(bits: u8) -> Swizzle {
    Swizzle([
      Component::from_bits(bits >> 6),
      Component::from_bits(bits >> 4),
      Component::from_bits(bits >> 2),
      Component::from_bits(bits),
    ])
  }

  /// The component feeding lane x, which is all the scalar unit reads.
  pub fn x(&self) -> Component {
    self.0[0]
  }
}

impl Default for Swizzle {
  fn default() -> Swizzle {
    Swizzle::IDENTITY
  }
}

impl Display for Swizzle {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    for component in self.0.iter() {
      write!(f, "{}", component)?;
    }
    Ok(())
  }
}

/// Per-component destination write enables, x in the highest of the four bits.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash, Default)]
pub struct WriteMask(u8);

impl WriteMask {
  pub const NONE: WriteMask = WriteMask(0b0000);
  pub const X: WriteMask = WriteMask(0b1000);
  pub const Y: WriteMask = WriteMask(0b0100);
  pub const Z: WriteMask = WriteMask(0b0010);
  pub const W: WriteMask = WriteMask(0b0001);
  pub const XYZW: WriteMask = WriteMask(0b1111);

  /// Only the low four bits are meaningful.
  pub fn from_bits(bits: u8) -> WriteMask {
    WriteMask(bits & 0b1111)
  }

  pub fn bits(&self) -> u8 {
    self.0
  }

  pub fn is_empty(&self) -> bool {
    self.0 == 0
  }
}

impl BitOr for WriteMask {
  type Output = WriteMask;
  fn bitor(self, rhs: WriteMask) -> WriteMask {
    WriteMask(self.0 | rhs.0)
  }
}

impl Display for WriteMask {
  /// The enabled component letters in x, y, z, w order.
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    for (bit, component) in (0..4).rev().zip(Swizzle::IDENTITY.0.iter()) {
      if self.0 & (1 << bit) != 0 {
        write!(f, "{}", component)?;
      }
    }
    Ok(())
  }
}

/// What a source slot reads. Attribute and constant sources go through the
/// shared fetch units, so their indices land in the shared fields rather
/// than the per-slot index field.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub enum SourceRegister {
  /// `r<index>`, read directly.
  Temp(u8),
  /// `v<index>`, read through the attribute fetch unit.
  Attribute(u8),
  /// `c<index>`, read through the constant-bank fetch unit.
  Constant(u8),
}

impl SourceRegister {
  /// The 2 bit wire code of the register type.
  pub fn type_code(&self) -> u128 {
    match self {
      SourceRegister::Temp(_) => fields::REG_TYPE_TEMP,
      SourceRegister::Attribute(_) => fields::REG_TYPE_ATTRIBUTE,
      SourceRegister::Constant(_) => fields::REG_TYPE_CONSTANT,
    }
  }

  pub fn index(&self) -> u8 {
    match self {
      SourceRegister::Temp(index)
      | SourceRegister::Attribute(index)
      | SourceRegister::Constant(index) => *index,
    }
  }
}

impl Display for SourceRegister {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      SourceRegister::Temp(index) => write!(f, "r{}", index),
      SourceRegister::Attribute(index) => write!(f, "v{}", index),
      SourceRegister::Constant(index) => write!(f, "c{}", index),
    }
  }
}

/// What a micro-op writes. Varying writes go through the shared write
/// target, signaled by the index sentinel and the varying-write flag.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub enum DestRegister {
  /// `r<index>`.
  Temp(u8),
  /// `o<index>`.
  Varying(u8),
}

impl Display for DestRegister {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      DestRegister::Temp(index) => write!(f, "r{}", index),
      DestRegister::Varying(index) => write!(f, "o{}", index),
    }
  }
}

/// A fully described source operand. Negation applies outside the absolute
/// value, matching the hardware's modifier order.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub struct Src {
  pub register: SourceRegister,
  pub swizzle: Swizzle,
  pub negate: bool,
  pub absolute: bool,
}

impl Src {
  /// An unmodified read with the identity swizzle.
  pub fn new(register: SourceRegister) -> Src {
    Src {
      register,
      swizzle: Swizzle::IDENTITY,
      negate: false,
      absolute: false,
    }
  }
}

/// A destination operand. An all-clear mask makes the owning micro-op
/// absent.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub struct Dst {
  pub register: DestRegister,
  pub mask: WriteMask,
  pub saturate: bool,
}

impl Dst {
  pub fn new(register: DestRegister, mask: WriteMask) -> Dst {
    Dst {
      register,
      mask,
      saturate: false,
    }
  }
}

/**
  The unencoded form of one instruction: up to one vector micro-op, up to one
  scalar micro-op, and the three shared source slots. The scalar unit reads
  its operand from slot c (`sources[2]`); a vector `add` reads slots a and c.
  Slots left `None` are emitted as unused.
*/
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct Instruction {
  pub vector: Option<(VectorOp, Dst)>,
  pub scalar: Option<(ScalarOp, Dst)>,
  pub sources: [Option<Src>; 3],
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn swizzle_bits() {
    assert_eq!(Swizzle::IDENTITY.to_bits(), 0b00_01_10_11);
    assert_eq!(Swizzle::from_bits(0b00_01_10_11), Swizzle::IDENTITY);
    let splat = Swizzle::splat(Component::W);
    assert_eq!(splat.to_bits(), 0b11_11_11_11);
    assert_eq!(Swizzle::from_bits(0xff), splat);
  }

  #[test]
  fn swizzle_text() {
    assert_eq!(format!("{}", Swizzle::IDENTITY), "xyzw");
    assert_eq!(format!("{}", Swizzle::splat(Component::Z)), "zzzz");
    assert_eq!(format!("{}", Swizzle::IDENTITY.x()), "x");
  }

  #[test]
  fn mask_text() {
    assert_eq!(format!("{}", WriteMask::XYZW), "xyzw");
    assert_eq!(format!("{}", WriteMask::X | WriteMask::W), "xw");
    assert_eq!(format!("{}", WriteMask::NONE), "");
    assert!(WriteMask::NONE.is_empty());
    assert!(!WriteMask::Z.is_empty());
  }

  #[test]
  fn mask_bits() {
    assert_eq!((WriteMask::X | WriteMask::Y | WriteMask::Z).bits(), 0b1110);
    assert_eq!(WriteMask::from_bits(0xf0), WriteMask::NONE);
  }

  #[test]
  fn register_text() {
    assert_eq!(format!("{}", SourceRegister::Temp(3)), "r3");
    assert_eq!(format!("{}", SourceRegister::Attribute(0)), "v0");
    assert_eq!(format!("{}", SourceRegister::Constant(21)), "c21");
    assert_eq!(format!("{}", DestRegister::Varying(2)), "o2");
  }

  #[test]
  fn register_type_codes() {
    assert_eq!(SourceRegister::Temp(5).type_code(), fields::REG_TYPE_TEMP);
    assert_eq!(
      SourceRegister::Constant(5).type_code(),
      fields::REG_TYPE_CONSTANT
    );
    assert_eq!(SourceRegister::Attribute(9).index(), 9);
  }
}
