//! Traversal of the build graph in either direction, depth- or breadth-first.
//!
//! A Frontier only knows how to hand out nodes and enumerate their children;
//! it never filters.  De-duplication lives in the driver (walk_frontier),
//! which threads a fresh VisitedSet through each walk so that separate walks
//! can't see each other's state.

use crate::graph::{CommandId, FileId, Graph, Node};
use rustc_hash::FxHashSet;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Mode {
    Dfs,
    Bfs,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Direction {
    /// From source inputs towards final outputs.
    SourceToSink,
    /// From final outputs back towards source inputs.
    SinkToSource,
}

/// The pending nodes of a walk.
/// DFS treats `nodes` as a stack; BFS never removes from it and instead
/// advances `cursor`, so each step is O(1).
pub struct Frontier {
    mode: Mode,
    direction: Direction,
    nodes: Vec<Node>,
    cursor: usize,
}

impl Frontier {
    /// A frontier seeded with the leaves of the graph for the given direction.
    pub fn new(graph: &Graph, mode: Mode, direction: Direction) -> Self {
        let mut frontier = Self::from_roots(mode, direction, std::iter::empty());
        for file in graph.files() {
            let leaf = match direction {
                Direction::SourceToSink => file.producer.is_none(),
                Direction::SinkToSource => file.consumers.is_empty(),
            };
            if leaf {
                frontier.push(Node::File(file.id));
            }
        }
        for cmd in graph.commands() {
            let leaf = match direction {
                Direction::SourceToSink => cmd.consumes.is_empty(),
                Direction::SinkToSource => cmd.produces.is_empty(),
            };
            if leaf {
                frontier.push(Node::Command(cmd.id));
            }
        }
        frontier
    }

    /// A frontier seeded with explicit starting nodes.
    pub fn from_roots(
        mode: Mode,
        direction: Direction,
        roots: impl IntoIterator<Item = Node>,
    ) -> Self {
        Frontier {
            mode,
            direction,
            nodes: roots.into_iter().collect(),
            cursor: 0,
        }
    }

    pub fn push(&mut self, node: Node) {
        self.nodes.push(node);
    }

    pub fn is_done(&self) -> bool {
        match self.mode {
            Mode::Dfs => self.nodes.is_empty(),
            Mode::Bfs => self.cursor >= self.nodes.len(),
        }
    }

    /// Push the children of node, as seen in this frontier's direction.
    pub fn expand(&mut self, graph: &Graph, node: Node) {
        match (self.direction, node) {
            (Direction::SinkToSource, Node::File(id)) => {
                if let Some(producer) = graph.file(id).producer {
                    self.nodes.push(Node::Command(producer));
                }
            }
            (Direction::SinkToSource, Node::Command(id)) => {
                let consumes = &graph.command(id).consumes;
                self.nodes.extend(consumes.iter().map(|&f| Node::File(f)));
            }
            (Direction::SourceToSink, Node::File(id)) => {
                let consumers = &graph.file(id).consumers;
                self.nodes.extend(consumers.iter().map(|&c| Node::Command(c)));
            }
            (Direction::SourceToSink, Node::Command(id)) => {
                let produces = &graph.command(id).produces;
                self.nodes.extend(produces.iter().map(|&f| Node::File(f)));
            }
        }
    }
}

impl Iterator for Frontier {
    type Item = Node;

    fn next(&mut self) -> Option<Node> {
        match self.mode {
            Mode::Dfs => self.nodes.pop(),
            Mode::Bfs => {
                let node = self.nodes.get(self.cursor).copied();
                if node.is_some() {
                    self.cursor += 1;
                }
                node
            }
        }
    }
}

/// What a visitor decided about a node it was handed.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Visit {
    /// Done with this node: mark it visited and walk on to its children.
    Settled,
    /// Not ready yet; the node will be reached again along another edge.
    Pending,
}

/// Per-node callbacks driven by a walk.  Any state a visitor needs lives in
/// the implementing type.
pub trait Visitor {
    fn visit_file(&mut self, graph: &Graph, id: FileId) -> Visit;
    fn visit_command(&mut self, graph: &Graph, id: CommandId) -> Visit;

    fn visit(&mut self, graph: &Graph, node: Node) -> Visit {
        match node {
            Node::File(id) => self.visit_file(graph, id),
            Node::Command(id) => self.visit_command(graph, id),
        }
    }
}

/// Adapts a pair of closures into a Visitor that settles every node.
pub struct Callbacks<F, C> {
    pub on_file: F,
    pub on_command: C,
}

impl<F, C> Visitor for Callbacks<F, C>
where
    F: FnMut(&Graph, FileId),
    C: FnMut(&Graph, CommandId),
{
    fn visit_file(&mut self, graph: &Graph, id: FileId) -> Visit {
        (self.on_file)(graph, id);
        Visit::Settled
    }

    fn visit_command(&mut self, graph: &Graph, id: CommandId) -> Visit {
        (self.on_command)(graph, id);
        Visit::Settled
    }
}

/// The nodes already settled in one walk.
#[derive(Default)]
pub struct VisitedSet {
    files: FxHashSet<FileId>,
    commands: FxHashSet<CommandId>,
}

impl VisitedSet {
    pub fn contains(&self, node: Node) -> bool {
        match node {
            Node::File(id) => self.files.contains(&id),
            Node::Command(id) => self.commands.contains(&id),
        }
    }

    /// Returns false if the node was already present.
    pub fn insert(&mut self, node: Node) -> bool {
        match node {
            Node::File(id) => self.files.insert(id),
            Node::Command(id) => self.commands.insert(id),
        }
    }

    pub fn len(&self) -> usize {
        self.files.len() + self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Drain a frontier, handing each node to the visitor at most once in its
/// settled state.  Returns the set of settled nodes.
pub fn walk_frontier(
    graph: &Graph,
    mut frontier: Frontier,
    visitor: &mut impl Visitor,
) -> VisitedSet {
    let mut visited = VisitedSet::default();
    while let Some(node) = frontier.next() {
        if visited.contains(node) {
            continue;
        }
        match visitor.visit(graph, node) {
            Visit::Settled => {
                visited.insert(node);
                frontier.expand(graph, node);
            }
            Visit::Pending => {}
        }
    }
    visited
}

/// Walk the whole graph from its leaves in the given direction.
pub fn walk(
    graph: &Graph,
    mode: Mode,
    direction: Direction,
    visitor: &mut impl Visitor,
) -> VisitedSet {
    walk_frontier(graph, Frontier::new(graph, mode, direction), visitor)
}

/// Walk only what is reachable from the given roots.
pub fn walk_from(
    graph: &Graph,
    roots: impl IntoIterator<Item = Node>,
    mode: Mode,
    direction: Direction,
    visitor: &mut impl Visitor,
) -> VisitedSet {
    walk_frontier(graph, Frontier::from_roots(mode, direction, roots), visitor)
}

pub fn dfs(graph: &Graph, direction: Direction, visitor: &mut impl Visitor) -> VisitedSet {
    walk(graph, Mode::Dfs, direction, visitor)
}

pub fn bfs(graph: &Graph, direction: Direction, visitor: &mut impl Visitor) -> VisitedSet {
    walk(graph, Mode::Bfs, direction, visitor)
}
