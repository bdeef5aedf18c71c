//! Scans an input string (source file) character by character.

use std::path::Path;

#[derive(Debug)]
pub struct ParseError {
    pub msg: String,
    pub ofs: usize,
}
pub type ParseResult<T> = Result<T, ParseError>;

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at offset {}", self.msg, self.ofs)
    }
}

impl std::error::Error for ParseError {}

/// Reading past the end yields '\0'.  A NUL byte in the input reads the same,
/// so check at_end() before taking '\0' as end of input.
pub struct Scanner<'a> {
    buf: &'a str,
    pub ofs: usize,
    pub line: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(buf: &'a str) -> Self {
        Scanner {
            buf,
            ofs: 0,
            line: 1,
        }
    }

    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.buf[start..end]
    }
    pub fn peek(&self) -> char {
        self.buf.as_bytes().get(self.ofs).map_or('\0', |&b| b as char)
    }
    pub fn at_end(&self) -> bool {
        self.ofs >= self.buf.len()
    }
    pub fn peek_newline(&self) -> bool {
        match self.peek() {
            '\n' => true,
            '\r' => self.buf.as_bytes().get(self.ofs + 1) == Some(&b'\n'),
            _ => false,
        }
    }
    pub fn next(&mut self) {
        if self.ofs >= self.buf.len() {
            panic!("scanned past end")
        }
        if self.peek() == '\n' {
            self.line += 1;
        }
        self.ofs += 1;
    }
    pub fn skip(&mut self, ch: char) -> bool {
        if self.ofs < self.buf.len() && self.peek() == ch {
            self.next();
            return true;
        }
        false
    }

    pub fn skip_spaces(&mut self) {
        while self.skip(' ') || self.skip('\t') {}
    }

    pub fn expect(&mut self, ch: char) -> ParseResult<()> {
        if !self.skip(ch) {
            return self.parse_error(format!("expected {:?}, got {:?}", ch, self.peek()));
        }
        Ok(())
    }

    /// Consume a line ending ("\n" or "\r\n"), or succeed at end of input.
    pub fn expect_newline(&mut self) -> ParseResult<()> {
        if self.at_end() {
            return Ok(());
        }
        if self.peek() == '\0' {
            return self.parse_error("unexpected NUL byte");
        }
        self.skip('\r');
        if !self.skip('\n') {
            return self.parse_error(format!("expected newline, got {:?}", self.peek()));
        }
        Ok(())
    }

    pub fn parse_error<T, S: Into<String>>(&self, msg: S) -> ParseResult<T> {
        Err(ParseError {
            msg: msg.into(),
            ofs: self.ofs,
        })
    }
}

/// Render an error with its file, line, and a caret under the offending
/// column.
pub fn format_parse_error(buf: &str, filename: &Path, err: ParseError) -> String {
    let mut ofs = 0;
    for (line_number, line) in buf.split('\n').enumerate() {
        if ofs + line.len() >= err.ofs {
            let mut msg = "parse error: ".to_string();
            msg.push_str(&err.msg);
            msg.push('\n');

            let prefix = format!("{}:{}: ", filename.display(), line_number + 1);
            msg.push_str(&prefix);

            let line = line.trim_end_matches('\r');
            let mut context = line;
            let mut col = err.ofs - ofs;
            let mut pad = prefix.len();
            if col > 40 && line.is_char_boundary(col - 20) {
                // Trim beginning of line to fit it on screen.
                msg.push_str("...");
                context = &line[col - 20..];
                col = 20;
                pad += 3;
            }
            // The caret goes under a column of characters, not bytes.
            pad += context.get(..col).map_or(col, |s| s.chars().count());
            if context.len() > 40 && context.is_char_boundary(40) {
                msg.push_str(&context[..40]);
                msg.push_str("...");
            } else {
                msg.push_str(context);
            }
            msg.push('\n');

            msg.push_str(&" ".repeat(pad));
            msg.push_str("^\n");
            return msg;
        }
        ofs += line.len() + 1;
    }
    format!("parse error: {}\n{}: at end of file\n", err.msg, filename.display())
}
