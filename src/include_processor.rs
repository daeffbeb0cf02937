use std::collections::HashSet;

use crate::{AbsolutePackPath, FileNode, IncludeGraph, PackError, SourceChunk};

/// Result of expanding one file: the chunks making up the flattened text, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedSource {
    root: AbsolutePackPath,
    chunks: Vec<SourceChunk>,
}

impl ExpandedSource {
    /// File the expansion started from.
    pub fn root(&self) -> &AbsolutePackPath {
        &self.root
    }

    pub fn chunks(&self) -> &[SourceChunk] {
        &self.chunks
    }

    pub fn line_count(&self) -> usize {
        self.chunks.iter().map(|c| c.line_count).sum()
    }

    /// Flattened text without any markers.
    pub fn to_text(&self) -> String {
        self.chunks.iter().map(|c| c.source.as_str()).collect()
    }

    /// Flattened text with a `#line` directive in front of every chunk that does not
    /// simply start the root file, so compiler errors point at the original files.
    pub fn to_text_with_line_directives(&self) -> String {
        let mut text = String::new();

        for chunk in &self.chunks {
            if chunk.file != self.root || chunk.line_offset != 0 {
                text.push_str(&chunk.line_directive());
                text.push('\n');
            }
            text.push_str(&chunk.source);
        }

        text
    }

    /// Map a 1-based line of [`to_text`](Self::to_text) to its file and 1-based line there.
    pub fn origin_of_line(&self, line: usize) -> Option<(&AbsolutePackPath, usize)> {
        if line == 0 {
            return None;
        }

        let mut first_line = 1;
        for chunk in &self.chunks {
            if line < first_line + chunk.line_count {
                return Some((&chunk.file, chunk.line_offset + (line - first_line) + 1));
            }
            first_line += chunk.line_count;
        }

        None
    }
}

/// Flattens files of an [`IncludeGraph`] into single compile-ready sources.
///
/// Every file is emitted at most once per expansion: a repeated include produces nothing.
/// An include of a file that failed to load is left in the output verbatim, so the
/// compiler reports it in context.
#[derive(Clone, Copy)]
pub struct IncludeProcessor<'g> {
    graph: &'g IncludeGraph,
}

impl<'g> IncludeProcessor<'g> {
    pub fn new(graph: &'g IncludeGraph) -> Self {
        Self { graph }
    }

    pub fn expand(&self, path: &AbsolutePackPath) -> Result<String, PackError> {
        Ok(self.expand_chunks(path)?.to_text())
    }

    pub fn expand_with_line_directives(&self, path: &AbsolutePackPath) -> Result<String, PackError> {
        Ok(self.expand_chunks(path)?.to_text_with_line_directives())
    }

    /// Expand several files independently; a library shared between them appears in each.
    pub fn expand_multiple(
        &self,
        paths: &[AbsolutePackPath],
        line_directives: bool,
    ) -> Result<Vec<(AbsolutePackPath, String)>, PackError> {
        paths
            .iter()
            .map(|path| {
                let expanded = self.expand_chunks(path)?;
                let text = if line_directives {
                    expanded.to_text_with_line_directives()
                } else {
                    expanded.to_text()
                };
                Ok((path.clone(), text))
            })
            .collect()
    }

    /// Depth-first expansion with an explicit stack of (file, next line) frames.
    pub fn expand_chunks(&self, path: &AbsolutePackPath) -> Result<ExpandedSource, PackError> {
        let root = self
            .graph
            .node(path)
            .ok_or_else(|| PackError::NotInGraph { path: path.clone() })?;

        let mut visited: HashSet<&AbsolutePackPath> = HashSet::new();
        visited.insert(root.path());

        let mut chunks: Vec<SourceChunk> = Vec::new();
        let mut stack: Vec<(&FileNode, usize)> = vec![(root, 0)];

        while let Some((node, next_line)) = stack.last_mut() {
            let node: &FileNode = *node;
            let idx = *next_line;

            if idx >= node.lines().len() {
                stack.pop();
                continue;
            }
            *next_line += 1;

            if let Some(target) = node.include_at(idx) {
                if visited.contains(target) {
                    continue;
                }

                if let Some(child) = self.graph.node(target) {
                    visited.insert(target);
                    stack.push((child, 0));
                    continue;
                }
            }

            let line = &node.lines()[idx];
            match chunks.last_mut() {
                Some(chunk) if chunk.continues_with(node.path(), idx) => chunk.push_line(line),
                _ => {
                    let mut chunk = SourceChunk::new(node.path().clone(), idx);
                    chunk.push_line(line);
                    chunks.push(chunk);
                }
            }
        }

        Ok(ExpandedSource {
            root: path.clone(),
            chunks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::IncludeProcessor;
    use crate::tests::HashMapIncludeProvider;
    use crate::{AbsolutePackPath, IncludeGraph};

    fn path(s: &str) -> AbsolutePackPath {
        AbsolutePackPath::from_absolute_path(s).unwrap()
    }

    fn graph(files: &[(&str, &str)], starts: &[&str]) -> IncludeGraph {
        let mut provider = HashMapIncludeProvider::new(files);
        let starts: Vec<_> = starts.iter().map(|s| path(s)).collect();
        IncludeGraph::from_provider(&mut provider, &starts).unwrap()
    }

    #[test]
    fn multi_level_include() {
        let graph = graph(
            &[
                (
                    "/s/foo.hlsl",
                    "double rainbow;\n#include \"bar.hlsl\"\nint spam;\n#include \"baz.hlsl\"\nvoid ham();",
                ),
                ("/s/bar.hlsl", "int bar;"),
                ("/s/baz.hlsl", "int baz;"),
            ],
            &["/s/foo.hlsl"],
        );
        let processor = IncludeProcessor::new(&graph);

        assert_eq!(
            processor.expand(&path("/s/foo.hlsl")).unwrap(),
            "double rainbow;\nint bar;\nint spam;\nint baz;\nvoid ham();\n"
        );

        let expanded = processor.expand_chunks(&path("/s/foo.hlsl")).unwrap();
        let layout: Vec<_> = expanded
            .chunks()
            .iter()
            .map(|c| (c.file.as_str(), c.line_offset, c.line_count))
            .collect();
        assert_eq!(
            layout,
            vec![
                ("/s/foo.hlsl", 0, 1),
                ("/s/bar.hlsl", 0, 1),
                ("/s/foo.hlsl", 2, 1),
                ("/s/baz.hlsl", 0, 1),
                ("/s/foo.hlsl", 4, 1),
            ]
        );
    }

    #[test]
    fn line_directives_bracket_nested_blocks() {
        let graph = graph(
            &[
                ("/s/main.hlsl", "float a;\n#include \"lib/common.hlsl\"\nfloat b;"),
                ("/s/lib/common.hlsl", "float common;"),
            ],
            &["/s/main.hlsl"],
        );

        assert_eq!(
            IncludeProcessor::new(&graph)
                .expand_with_line_directives(&path("/s/main.hlsl"))
                .unwrap(),
            "float a;\n\
             #line 1 \"/s/lib/common.hlsl\"\n\
             float common;\n\
             #line 3 \"/s/main.hlsl\"\n\
             float b;\n"
        );
    }

    #[test]
    fn leading_include_gets_a_directive() {
        let graph = graph(
            &[
                ("/s/main.hlsl", "#include \"a.hlsl\"\nfloat main;"),
                ("/s/a.hlsl", "float a;"),
            ],
            &["/s/main.hlsl"],
        );

        assert_eq!(
            IncludeProcessor::new(&graph)
                .expand_with_line_directives(&path("/s/main.hlsl"))
                .unwrap(),
            "#line 1 \"/s/a.hlsl\"\nfloat a;\n#line 2 \"/s/main.hlsl\"\nfloat main;\n"
        );
    }

    #[test]
    fn shared_file_is_emitted_once_at_first_reach() {
        let graph = graph(
            &[
                ("/s/x.hlsl", "#include \"a.hlsl\"\n#include \"b.hlsl\"\nfloat x;"),
                ("/s/a.hlsl", "float a0;\n#include \"b.hlsl\"\nfloat a1;"),
                ("/s/b.hlsl", "float b;"),
            ],
            &["/s/x.hlsl"],
        );
        let processor = IncludeProcessor::new(&graph);
        let text = processor.expand(&path("/s/x.hlsl")).unwrap();

        assert_eq!(text.matches("float b;").count(), 1);
        assert_eq!(text, "float a0;\nfloat b;\nfloat a1;\nfloat x;\n");

        // Dropping the repeated include shifts numbering, so a directive resyncs it
        let annotated = processor
            .expand_with_line_directives(&path("/s/x.hlsl"))
            .unwrap();
        assert!(annotated.ends_with("#line 3 \"/s/x.hlsl\"\nfloat x;\n"));
    }

    #[test]
    fn expansion_is_deterministic() {
        let graph = graph(
            &[
                ("/s/x.hlsl", "#include \"a.hlsl\"\n#include \"b.hlsl\""),
                ("/s/a.hlsl", "#include \"b.hlsl\"\nfloat a;"),
                ("/s/b.hlsl", "float b;"),
            ],
            &["/s/x.hlsl"],
        );
        let processor = IncludeProcessor::new(&graph);

        assert_eq!(
            processor.expand(&path("/s/x.hlsl")).unwrap(),
            processor.expand(&path("/s/x.hlsl")).unwrap()
        );
    }

    #[test]
    fn unloaded_include_is_kept_verbatim() {
        let graph = graph(
            &[("/s/x.hlsl", "#include \"missing.hlsl\"\nfloat x;")],
            &["/s/x.hlsl"],
        );

        assert_eq!(
            IncludeProcessor::new(&graph)
                .expand(&path("/s/x.hlsl"))
                .unwrap(),
            "#include \"missing.hlsl\"\nfloat x;\n"
        );
    }

    #[test]
    fn expand_multiple_uses_separate_visited_sets() {
        let graph = graph(
            &[
                ("/s/a.vs.hlsl", "#include \"lib.hlsl\"\nfloat vs;"),
                ("/s/a.ps.hlsl", "#include \"lib.hlsl\"\nfloat ps;"),
                ("/s/lib.hlsl", "float lib;"),
            ],
            &["/s/a.vs.hlsl", "/s/a.ps.hlsl"],
        );

        let expanded = IncludeProcessor::new(&graph)
            .expand_multiple(&[path("/s/a.vs.hlsl"), path("/s/a.ps.hlsl")], false)
            .unwrap();

        assert_eq!(expanded.len(), 2);
        assert!(expanded.iter().all(|(_, text)| text.contains("float lib;")));
    }

    #[test]
    fn origin_of_flattened_lines() {
        let graph = graph(
            &[
                ("/s/main.hlsl", "float a;\n#include \"b.hlsl\"\nfloat c;"),
                ("/s/b.hlsl", "float b0;\nfloat b1;"),
            ],
            &["/s/main.hlsl"],
        );
        let expanded = IncludeProcessor::new(&graph)
            .expand_chunks(&path("/s/main.hlsl"))
            .unwrap();

        assert_eq!(expanded.line_count(), 4);
        assert_eq!(expanded.origin_of_line(1), Some((&path("/s/main.hlsl"), 1)));
        assert_eq!(expanded.origin_of_line(3), Some((&path("/s/b.hlsl"), 2)));
        assert_eq!(expanded.origin_of_line(4), Some((&path("/s/main.hlsl"), 3)));
        assert_eq!(expanded.origin_of_line(5), None);
        assert_eq!(expanded.origin_of_line(0), None);
    }

    #[test]
    fn expanding_an_unknown_path_fails() {
        let graph = graph(&[("/s/x.hlsl", "float x;")], &["/s/x.hlsl"]);
        assert!(matches!(
            IncludeProcessor::new(&graph).expand(&path("/s/nope.hlsl")),
            Err(crate::PackError::NotInGraph { .. })
        ));
    }
}
