use crate::pack_path::AbsolutePackPath;
use crate::program_id::ProgramId;

pub type BoxedIncludeProviderError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum PackError {
    /// A string could not be turned into an `AbsolutePackPath`
    #[error("invalid pack path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    /// A file node was requested for a path without a parent directory (only the root lacks one)
    #[error("{path} has no parent directory")]
    NoParent { path: AbsolutePackPath },

    /// Expansion was requested for a file that the include graph never loaded
    #[error("{path} is not present in the include graph")]
    NotInGraph { path: AbsolutePackPath },

    /// Include cycle found while building the graph; the last entry repeats an earlier one
    #[error("circular include: {}", format_cycle(.cycle))]
    CircularInclude { cycle: Vec<AbsolutePackPath> },

    /// A program's fallback chain ended somewhere other than a built-in program
    #[error("fallback chain of {program:?} stops at {stopped_at:?}, which has no built-in program")]
    BrokenFallbackChain {
        program: ProgramId,
        stopped_at: ProgramId,
    },

    /// The pack root has no `shaders/` directory
    #[error("no shaders directory in {path:?}")]
    MissingShadersDirectory { path: std::path::PathBuf },

    #[error("io error while reading {path:?}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn format_cycle(cycle: &[AbsolutePackPath]) -> String {
    cycle
        .iter()
        .map(|p| p.as_str())
        .collect::<Vec<_>>()
        .join(" -> ")
}
