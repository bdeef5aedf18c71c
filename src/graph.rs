//! The build graph, a graph between files and commands.
//!
//! Both kinds of node live in their own arena and refer to each other only by
//! id, so growing one arena never invalidates anything held by the other.
//! Edges are only created through link_input/link_output, which write both
//! ends of the edge at once.

use crate::canon::canon_path;
use crate::densemap::{self, DenseMap};
use rustc_hash::FxHashMap;
use std::any::Any;
use std::path::PathBuf;

fn to_u32(index: usize) -> u32 {
    match u32::try_from(index) {
        Ok(i) => i,
        Err(_) => panic!("graph node index {} out of range", index),
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct FileId(u32);
impl densemap::Index for FileId {
    fn index(&self) -> usize {
        self.0 as usize
    }
    fn from_index(index: usize) -> Self {
        FileId(to_u32(index))
    }
}
impl FileId {
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct CommandId(u32);
impl densemap::Index for CommandId {
    fn index(&self) -> usize {
        self.0 as usize
    }
    fn from_index(index: usize) -> Self {
        CommandId(to_u32(index))
    }
}
impl CommandId {
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

/// A reference to either kind of node.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Node {
    File(FileId),
    Command(CommandId),
}

impl From<FileId> for Node {
    fn from(id: FileId) -> Self {
        Node::File(id)
    }
}

impl From<CommandId> for Node {
    fn from(id: CommandId) -> Self {
        Node::Command(id)
    }
}

#[derive(Debug)]
pub struct File {
    pub id: FileId,
    /// Canonicalized path, the identity of the file within the graph.
    pub name: String,
    /// The command that writes this file; None for source inputs.
    pub producer: Option<CommandId>,
    pub consumers: Vec<CommandId>,
}

impl File {
    /// A file nothing in the graph produces.
    pub fn is_source(&self) -> bool {
        self.producer.is_none()
    }

    /// A file nothing in the graph consumes, i.e. a final artifact.
    pub fn is_output(&self) -> bool {
        self.consumers.is_empty()
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CommandKind {
    Subprocess,
    Function,
}

/// A command line to run through the shell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subprocess {
    pub cmdline: String,
    pub cwd: Option<PathBuf>,
}

/// Signature of an in-process build step.
pub type Action = fn(&Graph, CommandId, &mut dyn Any) -> anyhow::Result<()>;

/// An in-process build step and the data it runs against.
pub struct Function {
    pub func: Action,
    pub data: Box<dyn Any>,
}

impl std::fmt::Debug for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Function").finish_non_exhaustive()
    }
}

/// What an executor needs to run a command.  The graph stores it and hands
/// it back, but never looks inside.
#[derive(Debug)]
pub enum Payload {
    Subprocess(Subprocess),
    Function(Function),
}

#[derive(Debug)]
pub struct Command {
    pub id: CommandId,
    pub kind: CommandKind,
    /// Display label.
    pub tag: String,
    pub consumes: Vec<FileId>,
    pub produces: Vec<FileId>,
    pub payload: Option<Payload>,
}

impl Command {
    /// The tag, or a generated label for untagged commands.
    pub fn label(&self) -> String {
        if self.tag.is_empty() {
            format!("command {}", self.id.0)
        } else {
            self.tag.clone()
        }
    }
}

#[derive(Default)]
pub struct Graph {
    files: DenseMap<FileId, File>,
    commands: DenseMap<CommandId, Command>,
    file_to_id: FxHashMap<String, FileId>,
}

impl Graph {
    pub fn new() -> Graph {
        Graph::default()
    }

    /// Look up a file by path, adding it if it's not already present.
    pub fn add_file(&mut self, path: &str) -> FileId {
        let canon = canon_path(path);
        if let Some(&id) = self.file_to_id.get(&canon) {
            return id;
        }
        let id = self.files.next_id();
        self.files.push(File {
            id,
            name: canon.clone(),
            producer: None,
            consumers: Vec::new(),
        });
        self.file_to_id.insert(canon, id);
        id
    }

    /// Look up a file by path without adding it.
    pub fn lookup_file(&self, path: &str) -> Option<FileId> {
        self.file_to_id.get(&canon_path(path)).copied()
    }

    pub fn file(&self, id: FileId) -> &File {
        &self.files[id]
    }

    pub fn command(&self, id: CommandId) -> &Command {
        &self.commands[id]
    }

    pub fn files(&self) -> impl Iterator<Item = &File> {
        self.files.iter().map(|(_, f)| f)
    }

    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter().map(|(_, c)| c)
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    /// Add a command with no edges and no payload.
    pub fn add_command(&mut self, kind: CommandKind) -> CommandId {
        self.push_command(kind, None)
    }

    pub fn add_subprocess(&mut self, subprocess: Subprocess) -> CommandId {
        self.push_command(
            CommandKind::Subprocess,
            Some(Payload::Subprocess(subprocess)),
        )
    }

    pub fn add_function(&mut self, func: Action, data: Box<dyn Any>) -> CommandId {
        self.push_command(
            CommandKind::Function,
            Some(Payload::Function(Function { func, data })),
        )
    }

    fn push_command(&mut self, kind: CommandKind, payload: Option<Payload>) -> CommandId {
        let id = self.commands.next_id();
        self.commands.push(Command {
            id,
            kind,
            tag: String::new(),
            consumes: Vec::new(),
            produces: Vec::new(),
            payload,
        })
    }

    pub fn tag_command(&mut self, cmd: CommandId, tag: impl Into<String>) {
        self.commands[cmd].tag = tag.into();
    }

    /// Record that cmd writes file.  A file has at most one producer; giving
    /// it a second one is a bug in whatever built the graph.
    pub fn link_output(&mut self, cmd: CommandId, file: FileId) {
        let f = &mut self.files[file];
        match f.producer {
            Some(other) => panic!(
                "{:?} is already produced by {:?}, can't also be produced by {:?}",
                f.name, other, cmd
            ),
            None => f.producer = Some(cmd),
        }
        self.commands[cmd].produces.push(file);
    }

    /// Record that cmd reads file.
    pub fn link_input(&mut self, cmd: CommandId, file: FileId) {
        self.commands[cmd].consumes.push(file);
        self.files[file].consumers.push(cmd);
    }

    /// The files nothing consumes: the final artifacts of the build.
    pub fn find_outputs(&self) -> Vec<FileId> {
        self.files()
            .filter(|f| f.is_output())
            .map(|f| f.id)
            .collect()
    }

    /// Commands that directly consume something cmd produces.
    fn downstream(&self, cmd: CommandId) -> Vec<CommandId> {
        self.commands[cmd]
            .produces
            .iter()
            .flat_map(|&f| self.files[f].consumers.iter().copied())
            .collect()
    }

    /// Search for a dependency cycle, returning the commands along the first
    /// one found in dependency order.
    pub fn find_cycle(&self) -> Option<Vec<CommandId>> {
        #[derive(Copy, Clone, PartialEq)]
        enum Color {
            Unseen,
            InProgress,
            Done,
        }
        let mut color = vec![Color::Unseen; self.commands.len()];
        for start in self.commands.all_ids() {
            if color[start.0 as usize] != Color::Unseen {
                continue;
            }
            // Explicit stack of (command, its successors, next successor).
            let mut stack = vec![(start, self.downstream(start), 0)];
            color[start.0 as usize] = Color::InProgress;
            while let Some((cmd, succs, next)) = stack.last_mut() {
                let cmd = *cmd;
                if *next == succs.len() {
                    color[cmd.0 as usize] = Color::Done;
                    stack.pop();
                    continue;
                }
                let succ = succs[*next];
                *next += 1;
                match color[succ.0 as usize] {
                    Color::Done => {}
                    Color::InProgress => {
                        let pos = stack
                            .iter()
                            .position(|(c, _, _)| *c == succ)
                            .unwrap_or(0);
                        return Some(stack[pos..].iter().map(|(c, _, _)| *c).collect());
                    }
                    Color::Unseen => {
                        color[succ.0 as usize] = Color::InProgress;
                        let down = self.downstream(succ);
                        stack.push((succ, down, 0));
                    }
                }
            }
        }
        None
    }
}
