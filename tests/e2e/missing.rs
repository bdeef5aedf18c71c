//! Tests for behavior around missing files.

use crate::e2e::*;

#[test]
fn missing_input() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write("kiln.build", CHAIN_RECIPE)?;
    space.write_at("intermediate.o", 2_000)?;
    space.write_at("output.txt", 3_000)?;

    let out = space.run(&mut kiln_command(vec!["status"]))?;
    assert!(!out.status.success());
    assert_stderr_contains(&out, "input source.c missing");
    // Rebuilding can't conjure up a source file, so nothing is dirty.
    assert_output_contains(&out, "kiln: no work to do");
    Ok(())
}

#[test]
fn missing_output() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write("kiln.build", CHAIN_RECIPE)?;
    space.write_at("source.c", 1_000)?;
    space.write_at("intermediate.o", 2_000)?;

    let out = space.run_expect(&mut kiln_command(vec!["status"]))?;
    assert_output_contains(&out, "dirty: link -> output.txt");
    assert_output_not_contains(&out, "dirty: compile");
    Ok(())
}

#[test]
fn missing_intermediate() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write("kiln.build", CHAIN_RECIPE)?;
    space.write_at("source.c", 1_000)?;
    space.write_at("output.txt", 3_000)?;

    let out = space.run_expect(&mut kiln_command(vec!["status"]))?;
    assert_output_contains(&out, "dirty: compile -> intermediate.o");
    assert_output_contains(&out, "dirty: link -> output.txt");
    Ok(())
}

#[test]
fn duplicate_producer() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write("kiln.build", "build out: a\nbuild out: b\n")?;
    let out = space.run(&mut kiln_command(vec!["status"]))?;
    assert!(!out.status.success());
    assert_output_contains(&out, "\"out\" has more than one producer");
    assert_output_contains(&out, "kiln.build:2: build out: b");
    Ok(())
}

#[test]
fn cycle() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write("kiln.build", "build a: one b\nbuild b: two a\n")?;
    space.write_at("a", 1_000)?;
    space.write_at("b", 1_000)?;
    let out = space.run(&mut kiln_command(vec!["status"]))?;
    assert!(!out.status.success());
    assert_stderr_contains(&out, "dependency cycle: ");
    Ok(())
}
