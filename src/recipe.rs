//! Recipe files: a small ninja-like text format describing the graph.
//!
//! ```text
//! # comment
//! build intermediate.o: compile source.c
//!   command = cc -c source.c -o intermediate.o
//! build output.txt: link intermediate.o
//!   command = ld -o output.txt intermediate.o
//!   cwd = out
//! ```
//!
//! Each build line names its outputs, a tag for the command, and its inputs.
//! The parser hands out references into the input text, marked with the
//! lifetime `'text`; the loader turns them into graph nodes.

use crate::graph::{CommandKind, Graph, Subprocess};
use crate::scanner::{format_parse_error, ParseError, ParseResult, Scanner};
use crate::trace;
use anyhow::anyhow;
use std::path::{Path, PathBuf};

/// A path along with where it appeared, for error reporting.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Spanned<'text> {
    pub ofs: usize,
    pub text: &'text str,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Build<'text> {
    pub line: usize,
    pub outs: Vec<Spanned<'text>>,
    pub tag: &'text str,
    pub ins: Vec<Spanned<'text>>,
    pub command: Option<&'text str>,
    pub cwd: Option<&'text str>,
}

fn is_ident_char(c: char) -> bool {
    matches!(c, 'a'..='z' | 'A'..='Z' | '0'..='9' | '_' | '-' | '.')
}

fn is_path_char(c: char) -> bool {
    !matches!(c, '\0' | ' ' | '\t' | '\r' | '\n' | ':' | '#')
}

pub struct Parser<'text> {
    scanner: Scanner<'text>,
}

impl<'text> Parser<'text> {
    pub fn new(buf: &'text str) -> Parser<'text> {
        Parser {
            scanner: Scanner::new(buf),
        }
    }

    /// Read the next build statement, or None at end of input.
    pub fn read(&mut self) -> ParseResult<Option<Build<'text>>> {
        loop {
            match self.scanner.peek() {
                '\0' if self.scanner.at_end() => return Ok(None),
                '\0' => return self.scanner.parse_error("unexpected NUL byte"),
                '\r' | '\n' => self.scanner.expect_newline()?,
                '#' => self.skip_comment()?,
                ' ' | '\t' => return self.scanner.parse_error("unexpected whitespace"),
                _ => {
                    let start = self.scanner.ofs;
                    let ident = self.read_ident()?;
                    self.scanner.skip_spaces();
                    match ident {
                        "build" => return Ok(Some(self.read_build()?)),
                        ident => {
                            return Err(ParseError {
                                msg: format!("unexpected {:?}, expected \"build\"", ident),
                                ofs: start,
                            })
                        }
                    }
                }
            }
        }
    }

    fn skip_comment(&mut self) -> ParseResult<()> {
        while !matches!(self.scanner.peek(), '\0' | '\n') {
            self.scanner.next();
        }
        self.scanner.expect_newline()
    }

    fn read_ident(&mut self) -> ParseResult<&'text str> {
        let start = self.scanner.ofs;
        while is_ident_char(self.scanner.peek()) {
            self.scanner.next();
        }
        let end = self.scanner.ofs;
        if end == start {
            return self.scanner.parse_error("failed to scan ident");
        }
        Ok(self.scanner.slice(start, end))
    }

    fn read_path(&mut self) -> Option<Spanned<'text>> {
        let start = self.scanner.ofs;
        while is_path_char(self.scanner.peek()) {
            self.scanner.next();
        }
        let end = self.scanner.ofs;
        if end == start {
            return None;
        }
        Some(Spanned {
            ofs: start,
            text: self.scanner.slice(start, end),
        })
    }

    fn read_paths(&mut self) -> Vec<Spanned<'text>> {
        let mut paths = Vec::new();
        while let Some(path) = self.read_path() {
            paths.push(path);
            self.scanner.skip_spaces();
        }
        paths
    }

    /// The rest of the line, without surrounding whitespace.
    fn read_value(&mut self) -> ParseResult<&'text str> {
        let start = self.scanner.ofs;
        while !matches!(self.scanner.peek(), '\0' | '\n') {
            self.scanner.next();
        }
        let value = self.scanner.slice(start, self.scanner.ofs).trim();
        self.scanner.expect_newline()?;
        Ok(value)
    }

    fn read_build(&mut self) -> ParseResult<Build<'text>> {
        let line = self.scanner.line;
        let outs = self.read_paths();
        if outs.is_empty() {
            return self.scanner.parse_error("expected output path");
        }
        self.scanner.expect(':')?;
        self.scanner.skip_spaces();
        let tag = self.read_ident()?;
        self.scanner.skip_spaces();
        let ins = self.read_paths();
        if self.scanner.peek() == '#' {
            self.skip_comment()?;
        } else {
            self.scanner.expect_newline()?;
        }

        let mut build = Build {
            line,
            outs,
            tag,
            ins,
            command: None,
            cwd: None,
        };
        while matches!(self.scanner.peek(), ' ' | '\t') {
            self.scanner.skip_spaces();
            if self.scanner.peek_newline() {
                self.scanner.expect_newline()?;
                continue;
            }
            let start = self.scanner.ofs;
            let name = self.read_ident()?;
            self.scanner.skip_spaces();
            self.scanner.expect('=')?;
            self.scanner.skip_spaces();
            let value = self.read_value()?;
            let slot = match name {
                "command" => &mut build.command,
                "cwd" => &mut build.cwd,
                _ => {
                    return Err(ParseError {
                        msg: format!("unknown variable {:?}", name),
                        ofs: start,
                    })
                }
            };
            if slot.is_some() {
                return Err(ParseError {
                    msg: format!("{:?} set twice", name),
                    ofs: start,
                });
            }
            *slot = Some(value);
        }
        if build.cwd.is_some() && build.command.is_none() {
            return Err(ParseError {
                msg: "cwd given without a command".to_string(),
                ofs: build.outs[0].ofs,
            });
        }
        Ok(build)
    }
}

fn add_build(graph: &mut Graph, build: Build) -> ParseResult<()> {
    // Check producers up front; Graph::link_output treats a second producer
    // as a bug, but in a recipe it's just a user error.
    let mut outs = Vec::with_capacity(build.outs.len());
    for out in &build.outs {
        let id = graph.add_file(out.text);
        if graph.file(id).producer.is_some() || outs.contains(&id) {
            return Err(ParseError {
                msg: format!("{:?} has more than one producer", graph.file(id).name),
                ofs: out.ofs,
            });
        }
        outs.push(id);
    }

    let cmd = match build.command {
        Some(cmdline) => graph.add_subprocess(Subprocess {
            cmdline: cmdline.to_string(),
            cwd: build.cwd.map(PathBuf::from),
        }),
        None => graph.add_command(CommandKind::Subprocess),
    };
    graph.tag_command(cmd, build.tag);
    for input in &build.ins {
        let id = graph.add_file(input.text);
        graph.link_input(cmd, id);
    }
    for id in outs {
        graph.link_output(cmd, id);
    }
    Ok(())
}

/// Parse recipe text into a graph.
pub fn parse(text: &str) -> ParseResult<Graph> {
    let mut graph = Graph::new();
    let mut parser = Parser::new(text);
    while let Some(build) = parser.read()? {
        add_build(&mut graph, build)?;
    }
    Ok(graph)
}

/// Load a recipe file from disk.
pub fn read(path: &Path) -> anyhow::Result<Graph> {
    let text = trace::scope("fs::read", || std::fs::read_to_string(path))
        .map_err(|err| anyhow!("read {}: {}", path.display(), err))?;
    trace::scope("recipe::parse", || parse(&text))
        .map_err(|err| anyhow!(format_parse_error(&text, path, err)))
}
