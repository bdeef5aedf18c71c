//! Decides which commands must run and which files are stale, from the
//! graph plus the modification times currently on disk.
//!
//! Three passes:
//! 1. stat every file once;
//! 2. judge each command on its own (an input newer than its oldest output,
//!    or an output missing);
//! 3. propagate dirtiness from sources to sinks.  Each command counts down
//!    the arrivals of its inputs and is only judged once all of them have
//!    been settled, so a command reachable along several paths can't be
//!    decided before the path that would dirty it has been walked.

use crate::fs::{FileSystem, MTime, RealFileSystem};
use crate::graph::{CommandId, FileId, Graph};
use crate::trace;
use crate::walk::{walk_frontier, Direction, Frontier, Mode, Visit, Visitor};
use rustc_hash::{FxHashMap, FxHashSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A source file (one with no producer) doesn't exist.  No command can
    /// fix this, so it never dirties anything by itself.
    MissingInput { file: FileId, path: String },
    /// stat() failed for a reason other than the file being absent.  The file
    /// is treated as missing.
    Stat {
        file: FileId,
        path: String,
        message: String,
    },
    /// These commands could never be judged because they depend on
    /// themselves.
    CycleDetected { commands: Vec<CommandId> },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::MissingInput { path, .. } => write!(f, "input {} missing", path),
            Error::Stat { path, message, .. } => write!(f, "stat {}: {}", path, message),
            Error::CycleDetected { commands } => {
                write!(f, "dependency cycle through {} commands", commands.len())
            }
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Like Display, but naming cycle members by their labels.
    pub fn describe(&self, graph: &Graph) -> String {
        match self {
            Error::CycleDetected { commands } => {
                let mut labels: Vec<String> =
                    commands.iter().map(|&c| graph.command(c).label()).collect();
                if let Some(first) = labels.first().cloned() {
                    labels.push(first);
                }
                format!("dependency cycle: {}", labels.join(" -> "))
            }
            _ => self.to_string(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FileMeta {
    pub mtime: MTime,
}

impl FileMeta {
    pub fn exists(&self) -> bool {
        self.mtime.exists()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandMeta {
    /// Newest input; Missing when there are no inputs.
    pub max_input_time: MTime,
    /// Oldest output; None when there are no outputs.
    pub min_output_time: Option<MTime>,
    pub missing_output: bool,
    pub locally_dirty: bool,
    /// Input arrivals still expected before the command can be judged.
    pub remaining_degree: usize,
}

#[derive(Debug, Default)]
pub struct Metadata {
    pub files: FxHashMap<FileId, FileMeta>,
    pub commands: FxHashMap<CommandId, CommandMeta>,
}

#[derive(Debug, Default)]
pub struct DirtyResult {
    pub dirty_files: FxHashSet<FileId>,
    pub dirty_commands: FxHashSet<CommandId>,
    pub metadata: Metadata,
    pub errors: Vec<Error>,
}

impl DirtyResult {
    pub fn is_file_dirty(&self, id: FileId) -> bool {
        self.dirty_files.contains(&id)
    }

    pub fn is_command_dirty(&self, id: CommandId) -> bool {
        self.dirty_commands.contains(&id)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Compute dirtiness against the real filesystem.
pub fn compute_dirty(graph: &Graph) -> DirtyResult {
    compute_dirty_with(graph, &RealFileSystem::new())
}

/// Compute dirtiness against the given filesystem.  Never fails: problems
/// are collected in DirtyResult::errors and the rest of the result is still
/// meaningful.
pub fn compute_dirty_with(graph: &Graph, fs: &dyn FileSystem) -> DirtyResult {
    let mut result = DirtyResult::default();
    trace::scope("dirty::stat", || stat_files(graph, fs, &mut result));
    trace::scope("dirty::judge", || judge_commands(graph, &mut result));
    trace::scope("dirty::propagate", || propagate(graph, &mut result));
    for err in &result.errors {
        trace::instant(&err.to_string());
    }
    result
}

fn stat_files(graph: &Graph, fs: &dyn FileSystem, result: &mut DirtyResult) {
    for file in graph.files() {
        let mtime = match fs.stat(&file.name) {
            Ok(mtime) => mtime,
            Err(err) => {
                result.errors.push(Error::Stat {
                    file: file.id,
                    path: file.name.clone(),
                    message: err.to_string(),
                });
                MTime::Missing
            }
        };
        if file.is_source() && mtime == MTime::Missing {
            let already_reported = matches!(
                result.errors.last(),
                Some(Error::Stat { file: id, .. }) if *id == file.id
            );
            if !already_reported {
                result.errors.push(Error::MissingInput {
                    file: file.id,
                    path: file.name.clone(),
                });
            }
        }
        result.metadata.files.insert(file.id, FileMeta { mtime });
    }
}

fn judge_commands(graph: &Graph, result: &mut DirtyResult) {
    let files = &result.metadata.files;
    let mtime = |id: &FileId| files[id].mtime;
    for cmd in graph.commands() {
        let max_input_time = cmd.consumes.iter().map(mtime).max().unwrap_or(MTime::Missing);
        let min_output_time = cmd.produces.iter().map(mtime).min();
        let missing_output = cmd.produces.iter().any(|id| mtime(id) == MTime::Missing);
        let stale = match min_output_time {
            Some(min) => max_input_time > min,
            None => false,
        };
        result.metadata.commands.insert(
            cmd.id,
            CommandMeta {
                max_input_time,
                min_output_time,
                missing_output,
                locally_dirty: stale || missing_output,
                remaining_degree: cmd.consumes.len().max(1),
            },
        );
    }
}

/// The visitor for the propagation pass.
struct Propagate<'a> {
    result: &'a mut DirtyResult,
}

impl Visitor for Propagate<'_> {
    fn visit_file(&mut self, graph: &Graph, id: FileId) -> Visit {
        if let Some(producer) = graph.file(id).producer {
            if self.result.dirty_commands.contains(&producer) {
                self.result.dirty_files.insert(id);
            }
        }
        Visit::Settled
    }

    fn visit_command(&mut self, graph: &Graph, id: CommandId) -> Visit {
        let meta = match self.result.metadata.commands.get_mut(&id) {
            Some(meta) => meta,
            None => panic!("no metadata for {:?}", id),
        };
        if meta.remaining_degree == 0 {
            panic!("{:?} reached after all its inputs were settled", id);
        }
        meta.remaining_degree -= 1;
        if meta.remaining_degree > 0 {
            return Visit::Pending;
        }
        let dirty_files = &self.result.dirty_files;
        let dirty = meta.locally_dirty
            || graph
                .command(id)
                .consumes
                .iter()
                .any(|f| dirty_files.contains(f));
        if dirty {
            self.result.dirty_commands.insert(id);
        }
        Visit::Settled
    }
}

fn propagate(graph: &Graph, result: &mut DirtyResult) {
    let frontier = Frontier::new(graph, Mode::Bfs, Direction::SourceToSink);
    walk_frontier(graph, frontier, &mut Propagate { result: &mut *result });

    let mut stuck: Vec<CommandId> = result
        .metadata
        .commands
        .iter()
        .filter(|(_, meta)| meta.remaining_degree > 0)
        .map(|(&id, _)| id)
        .collect();
    if stuck.is_empty() {
        return;
    }
    stuck.sort();
    // Commands caught in or behind a cycle can't see their inputs' verdict,
    // but their own outputs are still checked.
    for &id in &stuck {
        if result.metadata.commands[&id].locally_dirty {
            result.dirty_commands.insert(id);
            result.dirty_files.extend(graph.command(id).produces.iter().copied());
        }
    }
    let commands = graph.find_cycle().unwrap_or(stuck);
    result.errors.push(Error::CycleDetected { commands });
}
