//! Mermaid flowchart export of the graph, for debugging.

use crate::graph::Graph;
use std::io::Write;
use std::path::Path;

fn class_of(graph: &Graph, id: crate::graph::FileId) -> &'static str {
    let file = graph.file(id);
    if file.is_source() {
        "input"
    } else if file.is_output() {
        "output"
    } else {
        "intermediate"
    }
}

/// Quote a label for a mermaid node.
fn quote(label: &str) -> String {
    format!("\"{}\"", label.replace('"', "#quot;"))
}

pub fn render_diagram(graph: &Graph, w: &mut impl Write) -> std::io::Result<()> {
    writeln!(w, "flowchart LR")?;
    for file in graph.files() {
        writeln!(
            w,
            "    f{}[{}]:::{}",
            file.id.as_u32(),
            quote(&file.name),
            class_of(graph, file.id)
        )?;
    }
    for cmd in graph.commands() {
        let id = cmd.id.as_u32();
        writeln!(w, "    c{}{{{{{}}}}}:::command", id, quote(&cmd.label()))?;
        for input in &cmd.consumes {
            writeln!(w, "    f{} --> c{}", input.as_u32(), id)?;
        }
        for output in &cmd.produces {
            writeln!(w, "    c{} --> f{}", id, output.as_u32())?;
        }
    }
    writeln!(w, "    classDef input fill:#dfd,stroke:#383")?;
    writeln!(w, "    classDef output fill:#ddf,stroke:#338")?;
    writeln!(w, "    classDef intermediate fill:#eee,stroke:#666")?;
    writeln!(w, "    classDef command fill:#fed,stroke:#a62")?;
    Ok(())
}

/// Write the diagram to a file, replacing any existing one.
pub fn write_diagram(graph: &Graph, path: &Path) -> std::io::Result<()> {
    let mut w = std::io::BufWriter::new(std::fs::File::create(path)?);
    render_diagram(graph, &mut w)?;
    w.flush()
}
