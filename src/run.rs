use anyhow::anyhow;
use argh::FromArgs;
use std::path::Path;

use crate::graph::{CommandId, FileId, Graph};
use crate::walk::{self, Callbacks, Direction, Mode};
use crate::{diagram, dirty, recipe, trace};

#[derive(FromArgs)]
/// Reports what an incremental build would need to redo.
struct Args {
    /// chdir before running
    #[argh(option, short = 'C')]
    chdir: Option<String>,

    /// specify input recipe file [default=kiln.build]
    #[argh(option, short = 'f', default = "String::from(\"kiln.build\")")]
    file: String,

    /// debugging tools, use -d list to list
    #[argh(option, short = 'd')]
    debug: Option<String>,

    #[argh(subcommand)]
    command: Option<Subcommand>,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Subcommand {
    Status(StatusArgs),
    Diagram(DiagramArgs),
    Walk(WalkArgs),
    Outputs(OutputsArgs),
}

#[derive(FromArgs)]
/// List commands that need to run (the default)
#[argh(subcommand, name = "status")]
struct StatusArgs {}

#[derive(FromArgs)]
/// Write a mermaid flowchart of the graph
#[argh(subcommand, name = "diagram")]
struct DiagramArgs {
    /// output path
    #[argh(positional)]
    out: String,
}

#[derive(FromArgs)]
/// Print every node in traversal order
#[argh(subcommand, name = "walk")]
struct WalkArgs {
    /// breadth-first instead of depth-first
    #[argh(switch)]
    bfs: bool,

    /// walk from outputs back to sources
    #[argh(switch)]
    reverse: bool,
}

#[derive(FromArgs)]
/// List final outputs, the files nothing consumes
#[argh(subcommand, name = "outputs")]
struct OutputsArgs {}

fn status(graph: &Graph) -> i32 {
    let result = dirty::compute_dirty(graph);

    let mut dirty: Vec<CommandId> = result.dirty_commands.iter().copied().collect();
    dirty.sort();
    for &id in &dirty {
        let cmd = graph.command(id);
        let outs: Vec<&str> = cmd
            .produces
            .iter()
            .map(|&f| graph.file(f).name.as_str())
            .collect();
        println!("dirty: {} -> {}", cmd.label(), outs.join(" "));
    }
    for err in &result.errors {
        eprintln!("kiln: error: {}", err.describe(graph));
    }

    if dirty.is_empty() {
        println!("kiln: no work to do");
    } else {
        println!(
            "kiln: {} of {} commands dirty",
            dirty.len(),
            graph.command_count()
        );
    }
    if result.has_errors() {
        1
    } else {
        0
    }
}

fn print_walk(graph: &Graph, args: &WalkArgs) {
    let mode = if args.bfs { Mode::Bfs } else { Mode::Dfs };
    let direction = if args.reverse {
        Direction::SinkToSource
    } else {
        Direction::SourceToSink
    };
    let mut visitor = Callbacks {
        on_file: |graph: &Graph, id: FileId| println!("file {}", graph.file(id).name),
        on_command: |graph: &Graph, id: CommandId| {
            println!("command {}", graph.command(id).label())
        },
    };
    if walk::walk(graph, mode, direction, &mut visitor).is_empty() {
        println!("kiln: nothing to walk");
    }
}

fn run_impl() -> anyhow::Result<i32> {
    let args: Args = argh::from_env();

    if let Some(debug) = &args.debug {
        match debug.as_str() {
            "list" => {
                println!("debug tools:");
                println!("  trace  generate json performance trace");
                return Ok(1);
            }
            "trace" => trace::open("trace.json")?,
            _ => anyhow::bail!("unknown -d {:?}, use -d list to list", debug),
        }
    }

    if let Some(dir) = &args.chdir {
        let dir = Path::new(dir);
        std::env::set_current_dir(dir).map_err(|err| anyhow!("chdir {:?}: {}", dir, err))?;
    }

    let graph = trace::scope("recipe::read", || recipe::read(Path::new(&args.file)))?;

    match args.command.unwrap_or(Subcommand::Status(StatusArgs {})) {
        Subcommand::Status(_) => Ok(status(&graph)),
        Subcommand::Diagram(diagram_args) => {
            let out = Path::new(&diagram_args.out);
            trace::scope("diagram", || diagram::write_diagram(&graph, out))
                .map_err(|err| anyhow!("write {}: {}", out.display(), err))?;
            println!("kiln: wrote {}", out.display());
            Ok(0)
        }
        Subcommand::Walk(walk_args) => {
            print_walk(&graph, &walk_args);
            Ok(0)
        }
        Subcommand::Outputs(_) => {
            for id in graph.find_outputs() {
                println!("{}", graph.file(id).name);
            }
            Ok(0)
        }
    }
}

pub fn run() -> anyhow::Result<i32> {
    let res = run_impl();
    if let Err(err) = trace::close() {
        eprintln!("kiln: failed to write trace: {}", err);
    }
    res
}
