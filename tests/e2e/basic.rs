use crate::e2e::*;

#[test]
fn empty_file() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write("kiln.build", "")?;
    let out = space.run_expect(&mut kiln_command(vec![]))?;
    assert_eq!(std::str::from_utf8(&out.stdout)?, "kiln: no work to do\n");
    Ok(())
}

#[test]
fn no_recipe() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    let out = space.run(&mut kiln_command(vec!["status"]))?;
    assert!(!out.status.success());
    assert_output_contains(&out, "kiln: error: read kiln.build");
    Ok(())
}

#[test]
fn chain_up_to_date_then_touched() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write("kiln.build", CHAIN_RECIPE)?;
    space.write_at("source.c", 1_000)?;
    space.write_at("intermediate.o", 2_000)?;
    space.write_at("output.txt", 3_000)?;

    let out = space.run_expect(&mut kiln_command(vec!["status"]))?;
    assert_output_contains(&out, "kiln: no work to do");
    assert_output_not_contains(&out, "dirty:");

    space.set_mtime("source.c", 4_000)?;
    let out = space.run_expect(&mut kiln_command(vec!["status"]))?;
    assert_output_contains(&out, "dirty: compile -> intermediate.o\n");
    assert_output_contains(&out, "dirty: link -> output.txt\n");
    assert_output_contains(&out, "kiln: 2 of 2 commands dirty");
    Ok(())
}

#[test]
fn diamond_touch_one_side() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    space.write(
        "kiln.build",
        "
build main.o: cc_main main.c
build utils.o: cc_utils utils.c
build program.exe: link main.o utils.o
",
    )?;
    space.write_at("main.c", 1_000)?;
    space.write_at("utils.c", 5_000)?;
    space.write_at("main.o", 2_000)?;
    space.write_at("utils.o", 2_000)?;
    space.write_at("program.exe", 3_000)?;

    let out = space.run_expect(&mut kiln_command(vec![]))?;
    assert_output_contains(&out, "dirty: cc_utils -> utils.o");
    assert_output_contains(&out, "dirty: link -> program.exe");
    assert_output_not_contains(&out, "cc_main");
    assert_output_contains(&out, "kiln: 2 of 3 commands dirty");
    Ok(())
}

#[test]
fn recipe_flag_and_chdir() -> anyhow::Result<()> {
    let space = TestSpace::new()?;
    std::fs::create_dir(space.dir_path().join("sub"))?;
    space.write("sub/other.build", "build out: touch\n")?;
    let out = space.run_expect(&mut kiln_command(vec!["-C", "sub", "-f", "other.build"]))?;
    assert_output_contains(&out, "dirty: touch -> out");
    assert_output_contains(&out, "kiln: 1 of 1 commands dirty");
    Ok(())
}
