use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use crate::{ProgramDirectives, ProgramSet, ShaderStage};

/// Flattened sources of one program plus the directives parsed out of them.
///
/// Directives are parsed once, when the vertex/pixel pair is supplied; pixel-stage
/// directives override vertex-stage ones.
#[derive(Clone, Debug)]
pub struct ShaderSource {
    name: String,
    vertex: String,
    pixel: String,
    geometry: Option<String>,
    hull: Option<String>,
    domain: Option<String>,
    compute: Option<String>,
    compute_variants: BTreeMap<char, String>,
    directives: ProgramDirectives,
    // Observer only; the program set owns us, not the other way around.
    parent: Weak<ProgramSet>,
}

impl ShaderSource {
    pub fn new(name: impl Into<String>, vertex: String, pixel: String) -> Self {
        let directives = ProgramDirectives::parse(vec![vertex.as_str(), pixel.as_str()]);

        Self {
            name: name.into(),
            vertex,
            pixel,
            geometry: None,
            hull: None,
            domain: None,
            compute: None,
            compute_variants: BTreeMap::new(),
            directives,
            parent: Weak::new(),
        }
    }

    pub fn with_geometry(mut self, geometry: Option<String>) -> Self {
        self.geometry = geometry;
        self
    }

    /// Hull and domain stages are expected as a pair; a lone one is kept but logged.
    pub fn with_tessellation(mut self, hull: Option<String>, domain: Option<String>) -> Self {
        if hull.is_some() != domain.is_some() {
            log::warn!(
                "{}: tessellation needs both hull and domain stages, only {} given",
                self.name,
                if hull.is_some() { "hull" } else { "domain" }
            );
        }
        self.hull = hull;
        self.domain = domain;
        self
    }

    pub fn with_compute(mut self, compute: Option<String>, variants: BTreeMap<char, String>) -> Self {
        self.compute = compute;
        self.compute_variants = variants;
        self
    }

    pub(crate) fn with_parent(mut self, parent: Weak<ProgramSet>) -> Self {
        self.parent = parent;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vertex_source(&self) -> &str {
        &self.vertex
    }

    pub fn pixel_source(&self) -> &str {
        &self.pixel
    }

    pub fn geometry_source(&self) -> Option<&str> {
        self.geometry.as_deref()
    }

    pub fn hull_source(&self) -> Option<&str> {
        self.hull.as_deref()
    }

    pub fn domain_source(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    pub fn compute_source(&self) -> Option<&str> {
        self.compute.as_deref()
    }

    /// Lettered compute passes (`_a` .. `_z`), in dispatch order.
    pub fn compute_variants(&self) -> &BTreeMap<char, String> {
        &self.compute_variants
    }

    pub fn source(&self, stage: ShaderStage) -> Option<&str> {
        match stage {
            ShaderStage::Vertex => Some(self.vertex.as_str()),
            ShaderStage::Pixel => Some(self.pixel.as_str()),
            ShaderStage::Geometry => self.geometry_source(),
            ShaderStage::Hull => self.hull_source(),
            ShaderStage::Domain => self.domain_source(),
            ShaderStage::Compute => self.compute_source(),
        }
    }

    pub fn directives(&self) -> &ProgramDirectives {
        &self.directives
    }

    /// Program set this source was registered in, if it is still alive.
    pub fn parent(&self) -> Option<Arc<ProgramSet>> {
        self.parent.upgrade()
    }

    pub fn is_valid(&self) -> bool {
        !self.vertex.is_empty() && !self.pixel.is_empty()
    }

    /// Stricter than [`is_valid`](Self::is_valid): both stages contain something besides
    /// whitespace and `#line` markers.
    pub fn has_non_empty_source(&self) -> bool {
        has_content(&self.vertex) && has_content(&self.pixel)
    }

    pub fn has_geometry(&self) -> bool {
        self.geometry.is_some()
    }

    pub fn has_tessellation(&self) -> bool {
        self.hull.is_some() && self.domain.is_some()
    }

    pub fn has_compute(&self) -> bool {
        self.compute.is_some() || !self.compute_variants.is_empty()
    }
}

fn has_content(source: &str) -> bool {
    source.lines().map(str::trim).any(|line| !line.is_empty() && !line.starts_with("#line"))
}
