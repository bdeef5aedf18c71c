//! Support code for e2e tests, which run kiln as a binary.

mod basic;
mod missing;
mod tools;

pub fn kiln_command(args: Vec<&str>) -> std::process::Command {
    let mut cmd = std::process::Command::new(env!("CARGO_BIN_EXE_kiln"));
    cmd.args(args);
    cmd
}

fn print_output(out: &std::process::Output) {
    // Gross: use print! instead of writing to stdout so Rust test
    // framework can capture it.
    print!("{}", std::str::from_utf8(&out.stdout).unwrap());
    print!("{}", std::str::from_utf8(&out.stderr).unwrap());
}

pub fn assert_output_contains(out: &std::process::Output, text: &str) {
    let out = std::str::from_utf8(&out.stdout).unwrap();
    if !out.contains(text) {
        panic!(
            "assertion failed; expected output to contain {:?} but got:\n{}",
            text, out
        );
    }
}

pub fn assert_output_not_contains(out: &std::process::Output, text: &str) {
    let out = std::str::from_utf8(&out.stdout).unwrap();
    if out.contains(text) {
        panic!(
            "assertion failed; expected output to not contain {:?} but got:\n{}",
            text, out
        );
    }
}

pub fn assert_stderr_contains(out: &std::process::Output, text: &str) {
    let err = std::str::from_utf8(&out.stderr).unwrap();
    if !err.contains(text) {
        panic!(
            "assertion failed; expected stderr to contain {:?} but got:\n{}",
            text, err
        );
    }
}

/// Manages a temporary directory for invoking kiln.
pub struct TestSpace {
    dir: tempfile::TempDir,
}
impl TestSpace {
    pub fn new() -> anyhow::Result<Self> {
        let dir = tempfile::tempdir()?;
        Ok(TestSpace { dir })
    }

    pub fn dir_path(&self) -> &std::path::Path {
        self.dir.path()
    }

    /// Write a file into the working space.
    pub fn write(&self, path: &str, content: &str) -> std::io::Result<()> {
        std::fs::write(self.dir.path().join(path), content)
    }

    /// Write a file and pin its mtime, in seconds since the epoch, so tests
    /// don't depend on filesystem timestamp granularity.
    pub fn write_at(&self, path: &str, secs: i64) -> std::io::Result<()> {
        self.write(path, "")?;
        self.set_mtime(path, secs)
    }

    pub fn set_mtime(&self, path: &str, secs: i64) -> std::io::Result<()> {
        filetime::set_file_mtime(
            self.dir.path().join(path),
            filetime::FileTime::from_unix_time(secs, 0),
        )
    }

    /// Read a file from the working space.
    pub fn read(&self, path: &str) -> std::io::Result<Vec<u8>> {
        std::fs::read(self.dir.path().join(path))
    }

    /// Invoke kiln, returning process output.
    pub fn run(&self, cmd: &mut std::process::Command) -> std::io::Result<std::process::Output> {
        cmd.current_dir(self.dir.path()).output()
    }

    /// Like run, but also print output if the run failed.
    pub fn run_expect(
        &self,
        cmd: &mut std::process::Command,
    ) -> anyhow::Result<std::process::Output> {
        let out = self.run(cmd)?;
        if !out.status.success() {
            print_output(&out);
            anyhow::bail!("kiln failed, status {}", out.status);
        }
        Ok(out)
    }

    /// Persist the temp dir locally and abort the test.  Debugging helper.
    #[allow(dead_code)]
    pub fn eject(self) -> ! {
        panic!("ejected at {:?}", self.dir.into_path());
    }
}

/// source.c -> [compile] -> intermediate.o -> [link] -> output.txt
pub const CHAIN_RECIPE: &str = "
build intermediate.o: compile source.c
  command = cc -c source.c -o intermediate.o
build output.txt: link intermediate.o
  command = cc -o output.txt intermediate.o
";
