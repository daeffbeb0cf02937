//! **shader-pack** loads user-authored shader packs: directory trees of HLSL sources
//! whose programs are located by file name, share code through `#include`, and carry
//! rendering state in comment directives.
//!
//! This crate does not implement a full C-like preprocessor, only `#include` crawling
//! and expansion. Other directives are copied into the expanded code, so they can be
//! subsequently handled by the shader compiler.
//!
//! Loading happens in layers:
//!
//! * [`IncludeGraph`] reads every file reachable from the pack's program files exactly
//!   once (breadth-first), records unreadable files instead of failing on them, and
//!   rejects include cycles.
//! * [`IncludeProcessor`] flattens one file of the graph into a single source, emitting
//!   each included file once, optionally with `#line` directives so compiler errors point
//!   back at the original files.
//! * [`ShaderPack`] builds one [`ProgramSet`] per dimension, searching the dimension's
//!   override directory, the shared `program/` directory and finally `shaders/` itself.
//! * [`ShaderFallbackGenerator`] supplies a built-in program when neither the pack nor
//!   the [`ProgramId`] fallback chain provides one.
//!
//! # Example
//!
//! ```rust,no_run
//! use shader_pack::{ProgramId, ResolvedProgram, ShaderPack};
//!
//! let pack = ShaderPack::new("shaderpacks/MyPack")?;
//! let programs = pack.default_program_set();
//!
//! match programs.resolve(ProgramId::TerrainCutout) {
//!     Some(ResolvedProgram::Pack { id, source }) => {
//!         println!("{:?}: {} bytes of pixel shader", id, source.pixel_source().len())
//!     }
//!     Some(ResolvedProgram::Builtin(builtin)) => println!("using built-in {:?}", builtin.id),
//!     None => println!("not rendered"),
//! }
//! # Ok::<(), shader_pack::PackError>(())
//! ```

mod compiler_log;
mod directives;
mod error;
mod fallback;
mod file_node;
mod include_graph;
mod include_processor;
mod include_provider;
mod pack_path;
mod program_id;
mod program_set;
mod shader_pack;
mod shader_source;
mod source_chunk;


pub use compiler_log::remap_compiler_log;
pub use directives::{AlphaTest, BlendFactor, BlendMode, CompareFunc, CullMode, ProgramDirectives};
pub use error::{BoxedIncludeProviderError, PackError};
pub use fallback::{BuiltinProgram, ShaderFallbackGenerator, BUILTIN_BASIC, BUILTIN_TEXTURED};
pub use file_node::FileNode;
pub use include_graph::IncludeGraph;
pub use include_processor::{ExpandedSource, IncludeProcessor};
pub use include_provider::{FileSystemIncludeProvider, IncludeProvider};
pub use pack_path::AbsolutePackPath;
pub use program_id::{
    ProgramArrayId, ProgramGroup, ProgramId, ShaderStage, COMPUTE_VARIANTS, PROGRAM_ARRAY_SLOTS,
};
pub use program_set::{ProgramSet, ProgramSetStats, ResolvedProgram};
pub use shader_pack::{NamespacedId, ShaderPack, ShaderPackOptions, DEFAULT_DIMENSION};
pub use shader_source::ShaderSource;
pub use source_chunk::SourceChunk;
