use crate::AbsolutePackPath;

/// Chunk of expanded source along with information pointing back at the origin
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct SourceChunk {
    /// Source text; every line is terminated by `\n`
    pub source: String,

    /// File the code came from
    pub file: AbsolutePackPath,

    /// 0-based line in `file` at which this snippet starts
    pub line_offset: usize,

    /// Number of lines in `source`
    pub line_count: usize,
}

impl SourceChunk {
    pub(crate) fn new(file: AbsolutePackPath, line_offset: usize) -> Self {
        Self {
            source: String::new(),
            file,
            line_offset,
            line_count: 0,
        }
    }

    /// Whether `line` of `file` directly continues this chunk.
    pub(crate) fn continues_with(&self, file: &AbsolutePackPath, line: usize) -> bool {
        &self.file == file && self.line_offset + self.line_count == line
    }

    pub(crate) fn push_line(&mut self, line: &str) {
        self.source.push_str(line);
        self.source.push('\n');
        self.line_count += 1;
    }

    /// `#line` directive pointing at the first line of this chunk.
    pub fn line_directive(&self) -> String {
        format!("#line {} \"{}\"", self.line_offset + 1, self.file)
    }
}
