//! Programs a shader pack can provide, their source file names and fallback chains.

use std::fmt;

/// Pipeline stage of a program, with the file suffix packs use for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShaderStage {
    Vertex,
    Pixel,
    Geometry,
    Hull,
    Domain,
    Compute,
}

impl ShaderStage {
    pub const ALL: [ShaderStage; 6] = [
        ShaderStage::Vertex,
        ShaderStage::Pixel,
        ShaderStage::Geometry,
        ShaderStage::Hull,
        ShaderStage::Domain,
        ShaderStage::Compute,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            ShaderStage::Vertex => ".vs.hlsl",
            ShaderStage::Pixel => ".ps.hlsl",
            ShaderStage::Geometry => ".gs.hlsl",
            ShaderStage::Hull => ".hs.hlsl",
            ShaderStage::Domain => ".ds.hlsl",
            ShaderStage::Compute => ".cs.hlsl",
        }
    }

    /// Stage of a file name such as `gbuffers_water.ps.hlsl`.
    pub fn of_file_name(file_name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|stage| file_name.ends_with(stage.extension()))
    }

    /// `<program><ext>` for this stage.
    pub fn file_name(self, program: &str) -> String {
        format!("{}{}", program, self.extension())
    }
}

/// Lettered compute variants, dispatched after the base compute shader.
pub const COMPUTE_VARIANTS: std::ops::RangeInclusive<char> = 'a'..='z';

/// Broad family of a program; decides fallback policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProgramGroup {
    Shadow,
    Gbuffers,
    DistantHorizons,
    Final,
}

macro_rules! program_ids {
    ($($id:ident => $name:literal, $group:ident, $fallback:expr;)*) => {
        /// A single (non-array) program.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum ProgramId {
            $($id,)*
        }

        impl ProgramId {
            pub const ALL: &'static [ProgramId] = &[$(ProgramId::$id,)*];

            /// File name stem, e.g. `gbuffers_terrain_cutout`.
            pub fn source_name(self) -> &'static str {
                match self {
                    $(ProgramId::$id => $name,)*
                }
            }

            pub fn group(self) -> ProgramGroup {
                match self {
                    $(ProgramId::$id => ProgramGroup::$group,)*
                }
            }

            /// Next program to try when a pack omits this one; `None` ends the chain.
            pub fn fallback(self) -> Option<ProgramId> {
                use self::ProgramId::*;
                match self {
                    $($id => $fallback,)*
                }
            }
        }
    };
}

program_ids! {
    Shadow => "shadow", Shadow, None;
    ShadowSolid => "shadow_solid", Shadow, Some(Shadow);
    ShadowCutout => "shadow_cutout", Shadow, Some(Shadow);
    ShadowWater => "shadow_water", Shadow, Some(Shadow);
    ShadowEntities => "shadow_entities", Shadow, Some(Shadow);
    ShadowLightning => "shadow_lightning", Shadow, Some(ShadowEntities);
    ShadowBlock => "shadow_block", Shadow, Some(Shadow);

    Basic => "gbuffers_basic", Gbuffers, None;
    Line => "gbuffers_line", Gbuffers, Some(Basic);
    Textured => "gbuffers_textured", Gbuffers, Some(Basic);
    TexturedLit => "gbuffers_textured_lit", Gbuffers, Some(Textured);
    SkyBasic => "gbuffers_skybasic", Gbuffers, Some(Basic);
    SkyTextured => "gbuffers_skytextured", Gbuffers, Some(Textured);
    Clouds => "gbuffers_clouds", Gbuffers, Some(Textured);
    Terrain => "gbuffers_terrain", Gbuffers, Some(TexturedLit);
    TerrainSolid => "gbuffers_terrain_solid", Gbuffers, Some(Terrain);
    TerrainCutoutMip => "gbuffers_terrain_cutout_mip", Gbuffers, Some(Terrain);
    TerrainCutout => "gbuffers_terrain_cutout", Gbuffers, Some(Terrain);
    DamagedBlock => "gbuffers_damagedblock", Gbuffers, Some(Terrain);
    Block => "gbuffers_block", Gbuffers, Some(Terrain);
    BlockTrans => "gbuffers_block_translucent", Gbuffers, Some(Block);
    BeaconBeam => "gbuffers_beaconbeam", Gbuffers, Some(Textured);
    Item => "gbuffers_item", Gbuffers, Some(TexturedLit);
    Entities => "gbuffers_entities", Gbuffers, Some(TexturedLit);
    EntitiesTrans => "gbuffers_entities_translucent", Gbuffers, Some(Entities);
    EntitiesGlowing => "gbuffers_entities_glowing", Gbuffers, Some(Entities);
    Lightning => "gbuffers_lightning", Gbuffers, Some(Entities);
    Particles => "gbuffers_particles", Gbuffers, Some(TexturedLit);
    ParticlesTrans => "gbuffers_particles_translucent", Gbuffers, Some(Particles);
    ArmorGlint => "gbuffers_armor_glint", Gbuffers, Some(Textured);
    SpiderEyes => "gbuffers_spidereyes", Gbuffers, Some(Textured);
    Hand => "gbuffers_hand", Gbuffers, Some(TexturedLit);
    HandWater => "gbuffers_hand_water", Gbuffers, Some(Hand);
    Weather => "gbuffers_weather", Gbuffers, Some(TexturedLit);
    Water => "gbuffers_water", Gbuffers, Some(Terrain);

    DhTerrain => "dh_terrain", DistantHorizons, None;
    DhWater => "dh_water", DistantHorizons, Some(DhTerrain);
    DhGeneric => "dh_generic", DistantHorizons, Some(DhTerrain);
    DhShadow => "dh_shadow", Shadow, None;

    Final => "final", Final, None;
}

impl ProgramId {
    pub fn from_source_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|id| id.source_name() == name)
    }

    /// This program followed by every fallback, in order.
    pub fn fallback_chain(self) -> impl Iterator<Item = ProgramId> {
        // The table is acyclic, but never walk further than it has entries.
        std::iter::successors(Some(self), |id| id.fallback()).take(Self::ALL.len())
    }
}

impl fmt::Display for ProgramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.source_name())
    }
}

/// Number of numbered slots in every program array.
pub const PROGRAM_ARRAY_SLOTS: usize = 100;

/// A group of numbered full-screen passes (`composite`, `composite1`, ... `composite99`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProgramArrayId {
    Setup,
    Begin,
    ShadowComposite,
    Prepare,
    Deferred,
    Composite,
}

impl ProgramArrayId {
    pub const ALL: [ProgramArrayId; 6] = [
        ProgramArrayId::Setup,
        ProgramArrayId::Begin,
        ProgramArrayId::ShadowComposite,
        ProgramArrayId::Prepare,
        ProgramArrayId::Deferred,
        ProgramArrayId::Composite,
    ];

    pub fn source_prefix(self) -> &'static str {
        match self {
            ProgramArrayId::Setup => "setup",
            ProgramArrayId::Begin => "begin",
            ProgramArrayId::ShadowComposite => "shadowcomp",
            ProgramArrayId::Prepare => "prepare",
            ProgramArrayId::Deferred => "deferred",
            ProgramArrayId::Composite => "composite",
        }
    }

    pub fn num_slots(self) -> usize {
        PROGRAM_ARRAY_SLOTS
    }

    /// `prefix` for slot 0, `prefix{N}` otherwise; `None` past the last slot.
    pub fn slot_name(self, slot: usize) -> Option<String> {
        match slot {
            0 => Some(self.source_prefix().to_string()),
            n if n < PROGRAM_ARRAY_SLOTS => Some(format!("{}{}", self.source_prefix(), n)),
            _ => None,
        }
    }

    /// Inverse of [`slot_name`](Self::slot_name).
    pub fn parse_slot_name(name: &str) -> Option<(ProgramArrayId, usize)> {
        Self::ALL.iter().copied().find_map(|id| {
            let digits = name.strip_prefix(id.source_prefix())?;
            if digits.is_empty() {
                return Some((id, 0));
            }
            if digits.starts_with('0') || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            let slot: usize = digits.parse().ok()?;
            if slot > 0 && slot < PROGRAM_ARRAY_SLOTS {
                Some((id, slot))
            } else {
                None
            }
        })
    }
}

impl fmt::Display for ProgramArrayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.source_prefix())
    }
}
