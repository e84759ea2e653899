/*!

  Hand-assembles a small vertex program and prints it the way the dump
  tools render compiler output: the raw instruction words first, then the
  annotated listing. The program is the usual prelude of real shaders, a
  model-view-projection transform of the position attribute followed by a
  color passthrough dual-issued with a reciprocal square root.

*/

use string_cache::DefaultAtom;

use cgc::{
  encode, listing, DestRegister, Dst, GlslType, Instruction, ScalarOp, SourceRegister, Src,
  Symbol, SymbolKind, SymbolTable, VectorOp, WriteMask,
};

/// One row of the transform: o0.<lane> = dot(mvp[row], position).
fn transform_row(row: u8, lane: WriteMask) -> Instruction {
  Instruction {
    vector: Some((VectorOp::Dp4, Dst::new(DestRegister::Varying(0), lane))),
    scalar: None,
    sources: [
      Some(Src::new(SourceRegister::Attribute(0))),
      Some(Src::new(SourceRegister::Constant(row))),
      None,
    ],
  }
}

/// Copies the color attribute to o1 and, in the same cycle, computes an
/// inverse square root on the scalar unit.
fn color_and_rsq() -> Instruction {
  Instruction {
    vector: Some((
      VectorOp::Mov,
      Dst::new(DestRegister::Varying(1), WriteMask::XYZW),
    )),
    scalar: Some((ScalarOp::Rsq, Dst::new(DestRegister::Temp(1), WriteMask::X))),
    sources: [
      Some(Src::new(SourceRegister::Attribute(1))),
      None,
      Some(Src::new(SourceRegister::Constant(4))),
    ],
  }
}

fn symbol(name: &str, kind: SymbolKind, glsl: GlslType, location: u32) -> Symbol {
  Symbol {
    name: Some(DefaultAtom::from(name)),
    kind,
    glsl,
    location,
    vector: [0; 4],
  }
}

fn main() {
  env_logger::init();

  let lanes = [WriteMask::X, WriteMask::Y, WriteMask::Z, WriteMask::W];
  let mut program = Vec::new();
  for (row, lane) in lanes.iter().enumerate() {
    program.push(transform_row(row as u8, *lane));
  }
  program.push(color_and_rsq());

  let mut words = Vec::new();
  for (i, instruction) in program.iter().enumerate() {
    let last = i + 1 == program.len();
    match encode(instruction, last) {
      Ok(word) => words.push(word),
      Err(error) => {
        eprintln!("cannot encode instruction {}: {}", i, error);
        return;
      }
    } // end match on encode result
  }

  let symbols = SymbolTable::from_symbols(vec![
    symbol("position", SymbolKind::Attribute, GlslType::Vec4, 0),
    symbol("color", SymbolKind::Attribute, GlslType::Vec4, 1),
    symbol("mvp", SymbolKind::Uniform, GlslType::Mat4, 0),
    symbol("scale", SymbolKind::Uniform, GlslType::Float, 4),
  ]);

  println!("program words:");
  for word in words.iter() {
    println!("  {}", word);
  }

  println!("listing:");
  print!("{}", listing(&words, Some(&symbols)));
}
