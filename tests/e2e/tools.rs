//! Tests for the non-status subcommands and debug tools.

use crate::e2e::*;

#[test]
fn outputs() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write(
        "kiln.build",
        &[CHAIN_RECIPE, "build docs.html: doc README", ""].join("\n"),
    )?;
    let out = space.run_expect(&mut kiln_command(vec!["outputs"]))?;
    assert_eq!(std::str::from_utf8(&out.stdout)?, "output.txt\ndocs.html\n");
    Ok(())
}

#[test]
fn walk_both_directions() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write("kiln.build", CHAIN_RECIPE)?;

    let forward = "file source.c\ncommand compile\nfile intermediate.o\ncommand link\nfile output.txt\n";
    let out = space.run_expect(&mut kiln_command(vec!["walk"]))?;
    assert_eq!(std::str::from_utf8(&out.stdout)?, forward);

    let backward = "file output.txt\ncommand link\nfile intermediate.o\ncommand compile\nfile source.c\n";
    let out = space.run_expect(&mut kiln_command(vec!["walk", "--bfs", "--reverse"]))?;
    assert_eq!(std::str::from_utf8(&out.stdout)?, backward);
    Ok(())
}

#[test]
fn walk_empty_recipe() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write("kiln.build", "# nothing yet\n")?;
    let out = space.run_expect(&mut kiln_command(vec!["walk"]))?;
    assert_eq!(std::str::from_utf8(&out.stdout)?, "kiln: nothing to walk\n");
    Ok(())
}

#[test]
fn diagram() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write("kiln.build", CHAIN_RECIPE)?;
    let out = space.run_expect(&mut kiln_command(vec!["diagram", "graph.mmd"]))?;
    assert_output_contains(&out, "kiln: wrote graph.mmd");
    let text = String::from_utf8(space.read("graph.mmd")?)?;
    assert!(text.starts_with("flowchart LR\n"));
    assert!(text.contains("[\"source.c\"]:::input"));
    assert!(text.contains("{{\"link\"}}:::command"));
    Ok(())
}

#[test]
fn debug_tools() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write("kiln.build", CHAIN_RECIPE)?;

    let out = space.run(&mut kiln_command(vec!["-d", "list"]))?;
    assert_output_contains(&out, "trace  generate json performance trace");

    let out = space.run(&mut kiln_command(vec!["-d", "bogus"]))?;
    assert_output_contains(&out, "unknown -d \"bogus\"");

    space.write_at("source.c", 1_000)?;
    space.run_expect(&mut kiln_command(vec!["-d", "trace"]))?;
    let trace = String::from_utf8(space.read("trace.json")?)?;
    assert!(trace.contains("\"name\": \"dirty::propagate\""));
    Ok(())
}
