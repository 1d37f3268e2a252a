//! Line-oriented C text writer.
//!
//! Tracks the physical line number of the next line to be written, so source
//! map entries recorded through [`CWriter::stmt_line`] always match the
//! emitted text exactly. Indentation is four spaces per level.

use gamec_ir::Origin;

use crate::source_map::SourceMap;

const INDENT: &str = "    ";

pub struct CWriter {
    out: String,
    indent: usize,
    /// 1-based line number of the next line written.
    next_line: u32,
    map: SourceMap,
    /// The generated symbol currently being emitted, for map entries.
    symbol: Option<String>,
}

impl CWriter {
    pub fn new() -> Self {
        Self {
            out: String::new(),
            indent: 0,
            next_line: 1,
            map: SourceMap::new(),
            symbol: None,
        }
    }

    /// The line number the next [`CWriter::line`] call will land on.
    pub fn current_line(&self) -> u32 {
        self.next_line
    }

    /// Set the symbol name recorded on subsequent source map entries.
    pub fn set_symbol(&mut self, symbol: impl Into<String>) {
        self.symbol = Some(symbol.into());
    }

    pub fn clear_symbol(&mut self) {
        self.symbol = None;
    }

    /// Write one indented line.
    pub fn line(&mut self, text: impl AsRef<str>) {
        for _ in 0..self.indent {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text.as_ref());
        self.out.push('\n');
        self.next_line += 1;
    }

    /// Write one line and record its origin in the source map.
    pub fn stmt_line(&mut self, text: impl AsRef<str>, origin: Option<&Origin>) {
        if let Some(origin) = origin {
            self.map
                .push(self.next_line, origin, self.symbol.as_deref());
        }
        self.line(text);
    }

    pub fn blank(&mut self) {
        self.out.push('\n');
        self.next_line += 1;
    }

    /// Write `header {` and indent. An empty header opens a bare block.
    pub fn open(&mut self, header: impl AsRef<str>) {
        self.line(Self::block_header(header.as_ref()));
        self.indent += 1;
    }

    /// Like [`CWriter::open`] but records the header line's origin.
    pub fn open_at(&mut self, header: impl AsRef<str>, origin: Option<&Origin>) {
        self.stmt_line(Self::block_header(header.as_ref()), origin);
        self.indent += 1;
    }

    fn block_header(header: &str) -> String {
        if header.is_empty() {
            "{".to_string()
        } else {
            format!("{header} {{")
        }
    }

    /// Close the current arm and open an `else` arm at the same depth.
    pub fn else_arm(&mut self) {
        self.indent = self.indent.saturating_sub(1);
        self.line("} else {");
        self.indent += 1;
    }

    /// Dedent and write the closing brace, with an optional suffix
    /// (e.g. `close_with(";")` for struct definitions).
    pub fn close(&mut self) {
        self.close_with("");
    }

    pub fn close_with(&mut self, suffix: &str) {
        self.indent = self.indent.saturating_sub(1);
        self.line(format!("}}{suffix}"));
    }

    /// Section banner comment, flush left.
    pub fn banner(&mut self, title: &str) {
        self.blank();
        self.line(format!("/* ==== {title} ==== */"));
    }

    pub fn finish(self) -> (String, SourceMap) {
        (self.out, self.map)
    }
}

impl Default for CWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_numbers_match_text() {
        let mut w = CWriter::new();
        w.line("#include <stdint.h>");
        w.blank();
        w.open("void f(void)");
        w.stmt_line("x = 1;", Some(&Origin::new("game.def", 9, 3)));
        w.close();

        let (text, map) = w.finish();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(map.entries.len(), 1);
        let entry = &map.entries[0];
        assert_eq!(entry.generated_line, 4);
        assert_eq!(lines[(entry.generated_line - 1) as usize].trim(), "x = 1;");
    }

    #[test]
    fn test_indentation_nests() {
        let mut w = CWriter::new();
        w.open("void f(void)");
        w.open("if (x)");
        w.line("y = 2;");
        w.close();
        w.close();
        let (text, _) = w.finish();
        assert_eq!(
            text,
            "void f(void) {\n    if (x) {\n        y = 2;\n    }\n}\n"
        );
    }
}
