use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;

use crate::{AbsolutePackPath, FileNode, FileSystemIncludeProvider, IncludeProvider, PackError};

/// Every pack file reachable from a set of starting files, read once and checked for cycles.
///
/// Built once and never mutated; a path visited during construction lands in exactly
/// one of `nodes` or `failures`.
#[derive(Debug)]
pub struct IncludeGraph {
    nodes: HashMap<AbsolutePackPath, FileNode>,
    failures: HashMap<AbsolutePackPath, String>,
}

impl IncludeGraph {
    /// Build from files below `root` on disk.
    pub fn new(root: &Path, starting_paths: &[AbsolutePackPath]) -> Result<Self, PackError> {
        Self::from_provider(&mut FileSystemIncludeProvider::new(root), starting_paths)
    }

    /// Breadth-first crawl from `starting_paths`.
    ///
    /// Unreadable files are recorded in [`failures`](Self::failures) and do not stop the crawl.
    /// Fails only if the loaded files include each other in a cycle.
    pub fn from_provider(
        provider: &mut dyn IncludeProvider,
        starting_paths: &[AbsolutePackPath],
    ) -> Result<Self, PackError> {
        let mut nodes = HashMap::new();
        let mut failures = HashMap::new();
        let mut visited = HashSet::new();
        let mut queue: VecDeque<AbsolutePackPath> = starting_paths.iter().cloned().collect();

        while let Some(path) = queue.pop_front() {
            if !visited.insert(path.clone()) {
                continue;
            }

            let node = provider
                .read_lines(&path)
                .map_err(|err| err.to_string())
                .and_then(|lines| {
                    FileNode::from_lines(path.clone(), lines).map_err(|err| err.to_string())
                });

            match node {
                Ok(node) => {
                    log::debug!(
                        "loaded {} ({} lines, {} includes)",
                        path,
                        node.lines().len(),
                        node.includes().len()
                    );

                    queue.extend(
                        node.includes()
                            .values()
                            .filter(|target| !visited.contains(*target))
                            .cloned(),
                    );
                    nodes.insert(path, node);
                }
                Err(message) => {
                    log::warn!("failed to load {}: {}", path, message);
                    failures.insert(path, message);
                }
            }
        }

        detect_cycles(&nodes)?;

        Ok(Self { nodes, failures })
    }

    pub fn nodes(&self) -> &HashMap<AbsolutePackPath, FileNode> {
        &self.nodes
    }

    pub fn node(&self, path: &AbsolutePackPath) -> Option<&FileNode> {
        self.nodes.get(path)
    }

    pub fn contains(&self, path: &AbsolutePackPath) -> bool {
        self.nodes.contains_key(path)
    }

    /// Files that could not be read, with the reason.
    pub fn failures(&self) -> &HashMap<AbsolutePackPath, String> {
        &self.failures
    }

    /// Share of visited files that failed to load; 0 for an empty graph.
    pub fn failure_ratio(&self) -> f32 {
        let total = self.nodes.len() + self.failures.len();
        if total == 0 {
            0.0
        } else {
            self.failures.len() as f32 / total as f32
        }
    }
}

struct DfsFrame<'a> {
    path: &'a AbsolutePackPath,
    children: Vec<&'a AbsolutePackPath>,
    next_child: usize,
}

impl<'a> DfsFrame<'a> {
    fn new(node: &'a FileNode) -> Self {
        Self {
            path: node.path(),
            children: node.includes().values().collect(),
            next_child: 0,
        }
    }
}

/// Depth-first walk over every loaded node, keeping the current root-to-frontier path.
///
/// Edges to files that failed to load are not followed. Nodes proven acyclic during one
/// root's walk are merged into `checked` only once that whole walk has finished.
fn detect_cycles(nodes: &HashMap<AbsolutePackPath, FileNode>) -> Result<(), PackError> {
    let mut roots: Vec<&AbsolutePackPath> = nodes.keys().collect();
    roots.sort();

    let mut checked: HashSet<&AbsolutePackPath> = HashSet::new();

    for root in roots {
        if checked.contains(root) {
            continue;
        }

        let mut finished: HashSet<&AbsolutePackPath> = HashSet::new();
        let mut on_path: HashSet<&AbsolutePackPath> = HashSet::new();
        let mut stack: Vec<DfsFrame> = Vec::new();

        on_path.insert(root);
        stack.push(DfsFrame::new(&nodes[root]));

        while let Some(frame) = stack.last_mut() {
            if let Some(child) = frame.children.get(frame.next_child).copied() {
                frame.next_child += 1;

                let child_node = match nodes.get(child) {
                    Some(node) => node,
                    None => continue,
                };

                if on_path.contains(child) {
                    let mut cycle: Vec<AbsolutePackPath> =
                        stack.iter().map(|f| f.path.clone()).collect();
                    cycle.push(child.clone());
                    return Err(PackError::CircularInclude { cycle });
                }

                if checked.contains(child) || finished.contains(child) {
                    continue;
                }

                on_path.insert(child);
                stack.push(DfsFrame::new(child_node));
            } else {
                let path = frame.path;
                stack.pop();
                on_path.remove(path);
                finished.insert(path);
            }
        }

        checked.extend(finished);
    }

    Ok(())
}
