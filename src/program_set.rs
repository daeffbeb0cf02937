use std::collections::BTreeMap;
use std::sync::Arc;

use crate::program_id::COMPUTE_VARIANTS;
use crate::{
    AbsolutePackPath, BuiltinProgram, IncludeGraph, IncludeProcessor, ProgramArrayId, ProgramId,
    ShaderFallbackGenerator, ShaderSource, ShaderStage, PROGRAM_ARRAY_SLOTS,
};

type ProgramSlots = Box<[Option<ShaderSource>; PROGRAM_ARRAY_SLOTS]>;

/// Counts of what a [`ProgramSet`] ended up containing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProgramSetStats {
    pub programs: usize,
    pub array_programs: usize,
    pub with_geometry: usize,
    pub with_tessellation: usize,
    pub with_compute: usize,
}

/// Where the source of a requested program comes from.
#[derive(Debug)]
pub enum ResolvedProgram<'a> {
    /// Provided by the pack, as `id` itself or one of its fallbacks
    Pack {
        id: ProgramId,
        source: &'a ShaderSource,
    },
    Builtin(&'static BuiltinProgram),
}

/// Programs a pack provides for one dimension. Absent entries need a fallback.
#[derive(Debug)]
pub struct ProgramSet {
    dimension: String,
    programs: BTreeMap<ProgramId, ShaderSource>,
    arrays: BTreeMap<ProgramArrayId, ProgramSlots>,
}

impl ProgramSet {
    /// Look up every program in `directories`, highest priority first.
    ///
    /// For each program (and array slot) the first directory holding a usable vertex/pixel
    /// pair wins. Programs no directory provides are left out.
    pub fn load(
        dimension: &str,
        graph: &IncludeGraph,
        directories: &[AbsolutePackPath],
        line_directives: bool,
    ) -> Arc<ProgramSet> {
        let search = ProgramSearch {
            graph,
            processor: IncludeProcessor::new(graph),
            directories,
            line_directives,
        };

        let set = Arc::new_cyclic(|parent| {
            let mut programs = BTreeMap::new();
            for &id in ProgramId::ALL {
                if let Some(source) = search.find(id.source_name()) {
                    programs.insert(id, source.with_parent(parent.clone()));
                }
            }

            let mut arrays: BTreeMap<ProgramArrayId, ProgramSlots> = BTreeMap::new();
            for &array_id in &ProgramArrayId::ALL {
                for slot in 0..array_id.num_slots() {
                    let name = match array_id.slot_name(slot) {
                        Some(name) => name,
                        None => continue,
                    };

                    if let Some(source) = search.find(&name) {
                        arrays
                            .entry(array_id)
                            .or_insert_with(|| Box::new(std::array::from_fn(|_| None)))[slot] =
                            Some(source.with_parent(parent.clone()));
                    }
                }
            }

            ProgramSet {
                dimension: dimension.to_string(),
                programs,
                arrays,
            }
        });

        let stats = set.stats();
        log::info!(
            "dimension {}: {} programs, {} array programs",
            dimension,
            stats.programs,
            stats.array_programs
        );

        set
    }

    pub fn dimension(&self) -> &str {
        &self.dimension
    }

    pub fn get(&self, id: ProgramId) -> Option<&ShaderSource> {
        self.programs.get(&id)
    }

    pub fn contains(&self, id: ProgramId) -> bool {
        self.programs.contains_key(&id)
    }

    /// First program along the fallback chain of `id` that this set provides.
    pub fn get_with_fallback(&self, id: ProgramId) -> Option<(ProgramId, &ShaderSource)> {
        id.fallback_chain()
            .find_map(|candidate| self.get(candidate).map(|source| (candidate, source)))
    }

    /// The pack's own program for `id` or its fallbacks, else a built-in one.
    pub fn resolve(&self, id: ProgramId) -> Option<ResolvedProgram<'_>> {
        match self.get_with_fallback(id) {
            Some((id, source)) => Some(ResolvedProgram::Pack { id, source }),
            None => ShaderFallbackGenerator::get_fallback_shader(id).map(ResolvedProgram::Builtin),
        }
    }

    pub fn get_array(&self, id: ProgramArrayId, slot: usize) -> Option<&ShaderSource> {
        self.arrays.get(&id)?.get(slot)?.as_ref()
    }

    /// Filled slots of an array program, in slot order.
    pub fn array_slots(
        &self,
        id: ProgramArrayId,
    ) -> impl Iterator<Item = (usize, &ShaderSource)> + '_ {
        self.arrays
            .get(&id)
            .into_iter()
            .flat_map(|slots| slots.iter().enumerate())
            .filter_map(|(slot, source)| source.as_ref().map(|source| (slot, source)))
    }

    /// Single programs passing [`ShaderSource::is_valid`], ordered by id.
    pub fn valid_programs(&self) -> impl Iterator<Item = (ProgramId, &ShaderSource)> + '_ {
        self.programs
            .iter()
            .filter(|(_, source)| source.is_valid())
            .map(|(id, source)| (*id, source))
    }

    pub fn stats(&self) -> ProgramSetStats {
        let array_sources = self
            .arrays
            .values()
            .flat_map(|slots| slots.iter().filter_map(Option::as_ref));
        let all: Vec<&ShaderSource> = self.programs.values().chain(array_sources).collect();

        ProgramSetStats {
            programs: self.programs.len(),
            array_programs: all.len() - self.programs.len(),
            with_geometry: all.iter().filter(|s| s.has_geometry()).count(),
            with_tessellation: all.iter().filter(|s| s.has_tessellation()).count(),
            with_compute: all.iter().filter(|s| s.has_compute()).count(),
        }
    }
}

/// Per-program lookup across a prioritized list of directories.
struct ProgramSearch<'g> {
    graph: &'g IncludeGraph,
    processor: IncludeProcessor<'g>,
    directories: &'g [AbsolutePackPath],
    line_directives: bool,
}

impl<'g> ProgramSearch<'g> {
    fn find(&self, name: &str) -> Option<ShaderSource> {
        self.directories
            .iter()
            .find_map(|dir| self.find_in_directory(dir, name))
    }

    /// A directory supplies `name` only if
    /// 1. both stage files were loaded and neither is zero lines long,
    /// 2. the assembled source passes `is_valid`,
    /// 3. and it passes `has_non_empty_source`.
    /// An empty file must not shadow a good one in a lower-priority directory.
    fn find_in_directory(&self, dir: &AbsolutePackPath, name: &str) -> Option<ShaderSource> {
        let vertex_path = dir.join(&ShaderStage::Vertex.file_name(name)).ok()?;
        let pixel_path = dir.join(&ShaderStage::Pixel.file_name(name)).ok()?;

        let vertex_node = self.graph.node(&vertex_path)?;
        let pixel_node = self.graph.node(&pixel_path)?;
        if vertex_node.is_empty() || pixel_node.is_empty() {
            log::debug!("{}: empty stage file in {}, skipping", name, dir);
            return None;
        }

        let vertex = self.expand(&vertex_path)?;
        let pixel = self.expand(&pixel_path)?;

        let compute_variants = COMPUTE_VARIANTS
            .filter_map(|letter| {
                let file_name = format!("{}_{}{}", name, letter, ShaderStage::Compute.extension());
                self.optional_stage(dir, &file_name)
                    .map(|source| (letter, source))
            })
            .collect();

        let source = ShaderSource::new(name, vertex, pixel)
            .with_geometry(self.optional_stage(dir, &ShaderStage::Geometry.file_name(name)))
            .with_tessellation(
                self.optional_stage(dir, &ShaderStage::Hull.file_name(name)),
                self.optional_stage(dir, &ShaderStage::Domain.file_name(name)),
            )
            .with_compute(
                self.optional_stage(dir, &ShaderStage::Compute.file_name(name)),
                compute_variants,
            );

        if !source.is_valid() {
            log::debug!("{}: invalid source in {}, skipping", name, dir);
            return None;
        }
        if !source.has_non_empty_source() {
            log::debug!("{}: whitespace-only source in {}, skipping", name, dir);
            return None;
        }

        log::debug!("{}: found in {}", name, dir);
        Some(source)
    }

    fn optional_stage(&self, dir: &AbsolutePackPath, file_name: &str) -> Option<String> {
        let path = dir.join(file_name).ok()?;
        if self.graph.node(&path)?.is_empty() {
            return None;
        }
        self.expand(&path)
    }

    fn expand(&self, path: &AbsolutePackPath) -> Option<String> {
        match self.processor.expand_chunks(path) {
            Ok(expanded) if self.line_directives => Some(expanded.to_text_with_line_directives()),
            Ok(expanded) => Some(expanded.to_text()),
            Err(err) => {
                log::warn!("{}", err);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{ProgramSet, ResolvedProgram};
    use crate::tests::HashMapIncludeProvider;
    use crate::{AbsolutePackPath, IncludeGraph, ProgramArrayId, ProgramId};

    fn path(s: &str) -> AbsolutePackPath {
        AbsolutePackPath::from_absolute_path(s).unwrap()
    }

    fn load(files: &[(&str, &str)], directories: &[&str]) -> Arc<ProgramSet> {
        let mut provider = HashMapIncludeProvider::new(files);
        let starts: Vec<_> = files.iter().map(|(p, _)| path(p)).collect();
        let graph = IncludeGraph::from_provider(&mut provider, &starts).unwrap();
        let directories: Vec<_> = directories.iter().map(|d| path(d)).collect();
        ProgramSet::load("world0", &graph, &directories, false)
    }

    #[test]
    fn first_directory_wins() {
        let set = load(
            &[
                ("/shaders/world1/gbuffers_water.vs.hlsl", "float dim_vs;"),
                ("/shaders/world1/gbuffers_water.ps.hlsl", "float dim_ps;"),
                ("/shaders/gbuffers_water.vs.hlsl", "float root_vs;"),
                ("/shaders/gbuffers_water.ps.hlsl", "float root_ps;"),
            ],
            &["/shaders/world1", "/shaders/program", "/shaders"],
        );

        let water = set.get(ProgramId::Water).unwrap();
        assert_eq!(water.vertex_source(), "float dim_vs;\n");
        assert!(Arc::ptr_eq(&water.parent().unwrap(), &set));
    }

    #[test]
    fn whitespace_only_file_falls_through() {
        let set = load(
            &[
                ("/shaders/program/gbuffers_water.vs.hlsl", "   \n\t"),
                ("/shaders/program/gbuffers_water.ps.hlsl", "float p;"),
                ("/shaders/gbuffers_water.vs.hlsl", "float root_vs;"),
                ("/shaders/gbuffers_water.ps.hlsl", "float root_ps;"),
            ],
            &["/shaders/program", "/shaders"],
        );

        assert_eq!(
            set.get(ProgramId::Water).unwrap().pixel_source(),
            "float root_ps;\n"
        );
    }

    #[test]
    fn missing_pixel_stage_leaves_program_absent() {
        let set = load(
            &[("/shaders/gbuffers_item.vs.hlsl", "float v;")],
            &["/shaders"],
        );

        assert!(!set.contains(ProgramId::Item));
        assert_eq!(set.stats().programs, 0);
    }

    #[test]
    fn in_pack_fallback_chain() {
        let set = load(
            &[
                ("/shaders/gbuffers_textured_lit.vs.hlsl", "float v;"),
                ("/shaders/gbuffers_textured_lit.ps.hlsl", "float p;"),
            ],
            &["/shaders"],
        );

        let (id, _) = set.get_with_fallback(ProgramId::TerrainCutout).unwrap();
        assert_eq!(id, ProgramId::TexturedLit);
        assert!(set.get_with_fallback(ProgramId::Shadow).is_none());

        match set.resolve(ProgramId::Item) {
            Some(ResolvedProgram::Pack { id, .. }) => assert_eq!(id, ProgramId::TexturedLit),
            val => panic!("{:?}", val),
        }
        match set.resolve(ProgramId::SkyBasic) {
            Some(ResolvedProgram::Builtin(builtin)) => assert_eq!(builtin.id, ProgramId::Basic),
            val => panic!("{:?}", val),
        }
        assert!(set.resolve(ProgramId::Final).is_none());
    }

    #[test]
    fn array_slots_and_optional_stages() {
        let set = load(
            &[
                ("/shaders/composite.vs.hlsl", "float v0;"),
                ("/shaders/composite.ps.hlsl", "float p0;"),
                ("/shaders/composite7.vs.hlsl", "float v7;"),
                ("/shaders/composite7.ps.hlsl", "float p7;"),
                ("/shaders/composite7.gs.hlsl", "float g7;"),
                ("/shaders/composite7.hs.hlsl", "float h7;"),
                ("/shaders/composite7.ds.hlsl", "float d7;"),
                ("/shaders/composite7_b.cs.hlsl", "float cb;"),
                ("/shaders/composite7_a.cs.hlsl", "float ca;"),
            ],
            &["/shaders"],
        );

        let slots: Vec<usize> = set
            .array_slots(ProgramArrayId::Composite)
            .map(|(slot, _)| slot)
            .collect();
        assert_eq!(slots, vec![0, 7]);

        let seven = set.get_array(ProgramArrayId::Composite, 7).unwrap();
        assert_eq!(seven.name(), "composite7");
        assert!(seven.has_geometry());
        assert!(seven.has_tessellation());
        assert_eq!(seven.compute_variants().keys().collect::<Vec<_>>(), vec![&'a', &'b']);
        assert!(set.get_array(ProgramArrayId::Composite, 1).is_none());
        assert!(set.get_array(ProgramArrayId::Deferred, 0).is_none());
        assert!(set.get_array(ProgramArrayId::Composite, 500).is_none());

        let stats = set.stats();
        assert_eq!(stats.array_programs, 2);
        assert_eq!(stats.with_geometry, 1);
        assert_eq!(stats.with_tessellation, 1);
        assert_eq!(stats.with_compute, 1);
    }
}
