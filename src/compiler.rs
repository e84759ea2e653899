/*!

  The boundary to whatever turns GLSL source into shader binaries. The real
  producer is a closed-source compiler living behind an FFI wall, so this
  crate only pins down the shape of the exchange: source text and a target
  processor go in, two blobs come out. Everything downstream of the blobs
  (container parsing, symbol resolution, disassembly) is ours.

*/

use crate::container::ShaderKind;
use crate::error::CgcResult;
use crate::shader::Shader;

/// The two blobs one compiler invocation hands back: the container binary
/// and the auxiliary command stream.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct CompilerOutput {
  pub binary: Vec<u8>,
  pub stream: Vec<u8>,
}

pub trait ShaderCompiler {
  /// Compiles `source` for the given processor. Failures should surface as
  /// `CgcError::Compiler` carrying the producer's message and build log.
  fn compile(&mut self, kind: ShaderKind, source: &str) -> CgcResult<CompilerOutput>;
}

/// Compiles `source` and parses the result straight into a `Shader`.
pub fn compile_shader<C: ShaderCompiler>(
  compiler: &mut C,
  kind: ShaderKind,
  source: &str,
) -> CgcResult<Shader> {
  info!("compiling {} shader ({} bytes)", kind, source.len());
  for line in source.lines() {
    debug!("| {}", line);
  }

  let output = compiler.compile(kind, source)?;
  let shader = Shader::parse(output.binary, output.stream)?;

  if shader.kind != kind {
    // The container tag wins; the producer knows what it built.
    warn!(
      "requested a {} shader but the container is tagged {}",
      kind, shader.kind
    );
  }

  Ok(shader)
}
