use crate::{PackError, ProgramGroup, ProgramId, ShaderSource};

/// Program shipped with the engine, used when a pack provides nothing usable.
#[derive(Debug, PartialEq, Eq)]
pub struct BuiltinProgram {
    pub id: ProgramId,
    pub vertex: &'static str,
    pub pixel: &'static str,
}

impl BuiltinProgram {
    pub fn to_shader_source(&self) -> ShaderSource {
        ShaderSource::new(
            self.id.source_name(),
            self.vertex.to_string(),
            self.pixel.to_string(),
        )
    }
}

pub static BUILTIN_BASIC: BuiltinProgram = BuiltinProgram {
    id: ProgramId::Basic,
    vertex: include_str!("builtin/basic.vs.hlsl"),
    pixel: include_str!("builtin/basic.ps.hlsl"),
};

pub static BUILTIN_TEXTURED: BuiltinProgram = BuiltinProgram {
    id: ProgramId::Textured,
    vertex: include_str!("builtin/textured.vs.hlsl"),
    pixel: include_str!("builtin/textured.ps.hlsl"),
};

/// Maps programs a pack does not provide onto the built-in `Basic` / `Textured` programs.
pub struct ShaderFallbackGenerator;

impl ShaderFallbackGenerator {
    /// Shadow passes and `Final` must come from the pack; `Basic` is the end of every chain.
    pub fn has_fallback(id: ProgramId) -> bool {
        !matches!(id.group(), ProgramGroup::Shadow | ProgramGroup::Final) && id != ProgramId::Basic
    }

    pub fn direct_fallback(id: ProgramId) -> Option<ProgramId> {
        id.fallback()
    }

    pub fn builtin(id: ProgramId) -> Option<&'static BuiltinProgram> {
        match id {
            ProgramId::Basic => Some(&BUILTIN_BASIC),
            ProgramId::Textured => Some(&BUILTIN_TEXTURED),
            _ => None,
        }
    }

    /// Walk the fallback chain of `id` to the first built-in program.
    ///
    /// `Ok(None)` when `id` is not eligible for a fallback by policy.
    pub fn try_get_fallback_shader(
        id: ProgramId,
    ) -> Result<Option<&'static BuiltinProgram>, PackError> {
        if !Self::has_fallback(id) {
            return Ok(None);
        }

        let mut current = id;
        for _ in 0..ProgramId::ALL.len() {
            match Self::direct_fallback(current) {
                Some(next) => {
                    if let Some(builtin) = Self::builtin(next) {
                        return Ok(Some(builtin));
                    }
                    current = next;
                }
                None => break,
            }
        }

        Err(PackError::BrokenFallbackChain {
            program: id,
            stopped_at: current,
        })
    }

    /// Like [`try_get_fallback_shader`](Self::try_get_fallback_shader), but a broken chain
    /// is logged and treated as "no fallback".
    pub fn get_fallback_shader(id: ProgramId) -> Option<&'static BuiltinProgram> {
        match Self::try_get_fallback_shader(id) {
            Ok(builtin) => builtin,
            Err(err) => {
                log::error!("{}", err);
                None
            }
        }
    }
}
