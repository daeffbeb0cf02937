use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::{AbsolutePackPath, IncludeGraph, PackError, ProgramId, ProgramSet, ShaderStage};

pub const DEFAULT_DIMENSION: &str = "world0";
const SHADERS_DIRECTORY: &str = "shaders";

/// Knobs for loading a pack.
#[derive(Clone, Debug, PartialEq)]
pub struct ShaderPackOptions {
    /// Dimension used by [`ShaderPack::default_program_set`]
    pub default_dimension: String,
    /// Directory below `shaders/` searched after the dimension override directory
    pub program_directory: String,
    /// Expand program sources with `#line` markers pointing at the original files
    pub line_directives: bool,
    /// Highest tolerated share of referenced files that failed to load
    pub max_failure_ratio: f32,
}

impl Default for ShaderPackOptions {
    fn default() -> Self {
        Self {
            default_dimension: DEFAULT_DIMENSION.to_string(),
            program_directory: "program".to_string(),
            line_directives: true,
            max_failure_ratio: 0.5,
        }
    }
}

impl ShaderPackOptions {
    pub fn with_default_dimension(mut self, dimension: impl Into<String>) -> Self {
        self.default_dimension = dimension.into();
        self
    }

    pub fn with_program_directory(mut self, directory: impl Into<String>) -> Self {
        self.program_directory = directory.into();
        self
    }

    pub fn with_line_directives(mut self, line_directives: bool) -> Self {
        self.line_directives = line_directives;
        self
    }

    pub fn with_max_failure_ratio(mut self, ratio: f32) -> Self {
        self.max_failure_ratio = ratio;
        self
    }
}

/// `namespace:path` identifier of a dimension, as used by the engine.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NamespacedId {
    pub namespace: String,
    pub path: String,
}

impl NamespacedId {
    pub fn new(namespace: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            path: path.into(),
        }
    }

    /// `"ns:path"`; without a colon the namespace defaults to `minecraft`.
    pub fn parse(id: &str) -> Self {
        match id.find(':') {
            Some(idx) => Self::new(&id[..idx], &id[idx + 1..]),
            None => Self::new("minecraft", id),
        }
    }

    /// Name of the pack directory holding overrides for this dimension.
    pub fn dimension_name(&self) -> String {
        match (self.namespace.as_str(), self.path.as_str()) {
            ("minecraft", "overworld") => "world0".to_string(),
            ("minecraft", "the_nether") => "world-1".to_string(),
            ("minecraft", "the_end") => "world1".to_string(),
            (_, path) => path.to_string(),
        }
    }
}

impl fmt::Display for NamespacedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

/// A loaded shader pack: its include graph plus one lazily built [`ProgramSet`] per dimension.
///
/// The graph is immutable once constructed. Program sets are built on first request and
/// cached for the life of the pack; the cache is behind a mutex, so concurrent first
/// requests for the same dimension build it once.
#[derive(Debug)]
pub struct ShaderPack {
    root: PathBuf,
    options: ShaderPackOptions,
    graph: IncludeGraph,
    program_sets: Mutex<HashMap<String, Arc<ProgramSet>>>,
}

impl ShaderPack {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, PackError> {
        Self::with_options(root, ShaderPackOptions::default())
    }

    /// Scan `root/shaders` for program files and build the include graph from them.
    ///
    /// Fails if there is no `shaders/` directory or the pack contains an include cycle.
    pub fn with_options(
        root: impl Into<PathBuf>,
        options: ShaderPackOptions,
    ) -> Result<Self, PackError> {
        let root = root.into();
        let starting_paths = collect_program_files(&root)?;

        log::info!(
            "loading shader pack {:?} ({} program files)",
            root,
            starting_paths.len()
        );

        let graph = IncludeGraph::new(&root, &starting_paths)?;

        if graph.failure_ratio() > options.max_failure_ratio {
            log::warn!(
                "{} of {} files in {:?} failed to load",
                graph.failures().len(),
                graph.nodes().len() + graph.failures().len(),
                root
            );
        }

        Ok(Self {
            root,
            options,
            graph,
            program_sets: Mutex::new(HashMap::new()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn options(&self) -> &ShaderPackOptions {
        &self.options
    }

    pub fn include_graph(&self) -> &IncludeGraph {
        &self.graph
    }

    pub fn failure_ratio(&self) -> f32 {
        self.graph.failure_ratio()
    }

    /// Something loaded, not too much failed, and the default dimension provides both
    /// `Basic` and `Textured`.
    pub fn is_valid(&self) -> bool {
        if self.graph.nodes().is_empty() || self.failure_ratio() > self.options.max_failure_ratio
        {
            return false;
        }

        let set = self.default_program_set();
        set.contains(ProgramId::Basic) && set.contains(ProgramId::Textured)
    }

    /// Cached program set for `dimension`, built on first use.
    pub fn get_program_set(&self, dimension: &str) -> Arc<ProgramSet> {
        let mut sets = self
            .program_sets
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(set) = sets.get(dimension) {
            return Arc::clone(set);
        }

        let set = self.load_dimension_program_set(dimension);
        sets.insert(dimension.to_string(), Arc::clone(&set));
        set
    }

    pub fn default_program_set(&self) -> Arc<ProgramSet> {
        self.get_program_set(&self.options.default_dimension)
    }

    pub fn program_set_for(&self, dimension: &NamespacedId) -> Arc<ProgramSet> {
        self.get_program_set(&dimension.dimension_name())
    }

    /// Dimensions whose program sets have been built so far.
    pub fn cached_dimensions(&self) -> Vec<String> {
        let sets = self
            .program_sets
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = sets.keys().cloned().collect();
        names.sort();
        names
    }

    /// Build a program set for `dimension` without consulting or filling the cache.
    ///
    /// Directories are searched in order: `shaders/<dimension>/`, the shared program
    /// directory, then `shaders/`. The first two only if they exist.
    pub fn load_dimension_program_set(&self, dimension: &str) -> Arc<ProgramSet> {
        let directories = self.search_directories(dimension);
        log::debug!("dimension {}: searching {:?}", dimension, directories);

        ProgramSet::load(
            dimension,
            &self.graph,
            &directories,
            self.options.line_directives,
        )
    }

    fn search_directories(&self, dimension: &str) -> Vec<AbsolutePackPath> {
        let shaders = shaders_path();
        let mut directories = Vec::with_capacity(3);

        for name in &[dimension, self.options.program_directory.as_str()] {
            if !is_plain_directory_name(name) {
                continue;
            }

            if let Ok(dir) = shaders.join(name) {
                if dir.resolved(&self.root).is_dir() && !directories.contains(&dir) {
                    directories.push(dir);
                }
            }
        }

        directories.push(shaders);
        directories
    }

    /// Names of `world*` override directories present in the pack.
    pub fn dimension_directories(&self) -> Vec<String> {
        let mut names: Vec<String> = match std::fs::read_dir(self.root.join(SHADERS_DIRECTORY)) {
            Ok(entries) => entries
                .filter_map(Result::ok)
                .filter(|entry| entry.path().is_dir())
                .filter_map(|entry| entry.file_name().into_string().ok())
                .filter(|name| name.starts_with("world"))
                .collect(),
            Err(err) => {
                log::warn!("cannot list {:?}: {}", self.root, err);
                Vec::new()
            }
        };
        names.sort();
        names
    }
}

fn shaders_path() -> AbsolutePackPath {
    AbsolutePackPath::root()
        .join(SHADERS_DIRECTORY)
        .unwrap_or_else(|_| AbsolutePackPath::root())
}

fn is_plain_directory_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains('/') && !name.contains('\\')
}

/// Every stage file directly in `shaders/` or in one of its immediate subdirectories.
fn collect_program_files(root: &Path) -> Result<Vec<AbsolutePackPath>, PackError> {
    let shaders_dir = root.join(SHADERS_DIRECTORY);
    if !shaders_dir.is_dir() {
        return Err(PackError::MissingShadersDirectory { path: shaders_dir });
    }

    let shaders = shaders_path();
    let mut paths = Vec::new();

    for (name, path) in read_dir_sorted(&shaders_dir)? {
        if path.is_dir() {
            let dir = match shaders.join(&name) {
                Ok(dir) => dir,
                Err(_) => continue,
            };

            match read_dir_sorted(&path) {
                Ok(children) => paths.extend(
                    children
                        .into_iter()
                        .filter(|(child, child_path)| is_stage_file(child, child_path))
                        .filter_map(|(child, _)| dir.join(&child).ok()),
                ),
                Err(err) => log::warn!("{}", err),
            }
        } else if is_stage_file(&name, &path) {
            if let Ok(file) = shaders.join(&name) {
                paths.push(file);
            }
        }
    }

    Ok(paths)
}

fn is_stage_file(name: &str, path: &Path) -> bool {
    ShaderStage::of_file_name(name).is_some() && path.is_file()
}

fn read_dir_sorted(dir: &Path) -> Result<Vec<(String, PathBuf)>, PackError> {
    let io_err = |source: std::io::Error| PackError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        if let Ok(name) = entry.file_name().into_string() {
            entries.push((name, entry.path()));
        }
    }

    entries.sort();
    Ok(entries)
}
