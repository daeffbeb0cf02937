//! Shader compilers only ever see the flattened text of a program, so their diagnostics
//! reference lines of that text rather than the pack files the author edited.
//!
//! When a program is expanded with `#line` directives the compiler does the mapping itself.
//! For plain expansions, [`remap_compiler_log`] rewrites the locations in a compiler log
//! using the chunk layout of the [`ExpandedSource`]. Both the DXC/clang style
//! (`file:line:col:`) and the FXC/MSVC style (`file(line,col)`) are recognized.
//!
//! ```rust,ignore
//! let expanded = IncludeProcessor::new(pack.include_graph()).expand_chunks(&path)?;
//! let log = run_dxc(&expanded.to_text());
//! log::warn!("{}", shader_pack::remap_compiler_log(&log, &expanded));
//! ```

use crate::ExpandedSource;

lazy_static::lazy_static! {
    // One location per line, at its start: `file:line:col:` or `file(line,col)` with an
    // optional `-endcol`. The file may carry a Windows drive prefix.
    static ref LOCATION_RE: regex::Regex = regex::Regex::new(
        r"(?m)^((?:[A-Za-z]:)?[^:(\n]*)(?::(\d+):(\d+):|\((\d+),(\d+)(?:-\d+)?\))"
    )
    .unwrap();
}

/// Rewrite every location in `log` that falls inside `expanded` to the pack file and line
/// it came from. Locations outside the expanded text are left untouched.
pub fn remap_compiler_log(log: &str, expanded: &ExpandedSource) -> String {
    LOCATION_RE
        .replace_all(log, |captures: &regex::Captures| {
            let (line, column, dxc_style) = match (captures.get(2), captures.get(3)) {
                (Some(line), Some(column)) => (line, column, true),
                _ => match (captures.get(4), captures.get(5)) {
                    (Some(line), Some(column)) => (line, column, false),
                    _ => return captures[0].to_string(),
                },
            };

            let origin = line
                .as_str()
                .parse::<usize>()
                .ok()
                .and_then(|line| expanded.origin_of_line(line));

            match origin {
                Some((file, line)) if dxc_style => {
                    format!("{}:{}:{}:", file, line, column.as_str())
                }
                Some((file, line)) => format!("{}({},{})", file, line, column.as_str()),
                None => captures[0].to_string(),
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::remap_compiler_log;
    use crate::tests::HashMapIncludeProvider;
    use crate::{AbsolutePackPath, ExpandedSource, IncludeGraph, IncludeProcessor};

    fn expanded() -> ExpandedSource {
        let main = AbsolutePackPath::from_absolute_path("/s/main.ps.hlsl").unwrap();
        let mut provider = HashMapIncludeProvider::new(&[
            ("/s/main.ps.hlsl", "float a;\n#include \"lib.hlsl\"\nfloat c;"),
            ("/s/lib.hlsl", "float b0;\nfloat b1;"),
        ]);
        let graph = IncludeGraph::from_provider(&mut provider, &[main.clone()]).unwrap();
        IncludeProcessor::new(&graph).expand_chunks(&main).unwrap()
    }

    #[test]
    fn remaps_both_styles() {
        let log = "program.hlsl:3:5: error: unknown type\n\
                   program.hlsl(4,1-7): warning X3206: truncation\n\
                   program.hlsl:99:1: note: out of range";

        assert_eq!(
            remap_compiler_log(log, &expanded()),
            "/s/lib.hlsl:2:5: error: unknown type\n\
             /s/main.ps.hlsl(3,1): warning X3206: truncation\n\
             program.hlsl:99:1: note: out of range"
        );
    }

    #[test]
    fn parenthesized_text_in_message_is_kept() {
        assert_eq!(
            remap_compiler_log(
                "program.hlsl:3:5: error: no matching function for call to 'f(1,2)'",
                &expanded()
            ),
            "/s/lib.hlsl:2:5: error: no matching function for call to 'f(1,2)'"
        );
        assert_eq!(
            remap_compiler_log("error: ambiguous call to f(1,2)", &expanded()),
            "error: ambiguous call to f(1,2)"
        );
    }

    #[test]
    fn windows_drive_paths() {
        let log = "C:\\pack\\program.hlsl:1:3: warning: unused\n\
                   D:\\out\\program.hlsl(2,9): error X3004: undeclared";

        assert_eq!(
            remap_compiler_log(log, &expanded()),
            "/s/main.ps.hlsl:1:3: warning: unused\n\
             /s/lib.hlsl(1,9): error X3004: undeclared"
        );
    }
}
