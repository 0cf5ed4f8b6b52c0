//! Renders every schema in a fixtures directory and diffs it against the
//! checked-in `<name>.<ext>.golden` output.
use std::cell::RefCell;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::rc::Rc;

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use json_schemagen::{Destination, Generator, Settings, TargetKind};

#[derive(Parser, Debug)]
struct Cli {
    /// directory holding `*.json` schemas and their golden files
    #[arg(long, default_value = "fixtures")]
    fixtures: PathBuf,

    #[arg(long, value_enum, default_value_t = TargetKind::Go)]
    target: TargetKind,

    /// rewrite golden files with the current output
    #[arg(long)]
    bless: bool,
}

#[derive(Clone, Default)]
struct Captured(Rc<RefCell<Vec<u8>>>);

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

enum Outcome {
    Pass,
    Blessed,
    Fail(String),
}

fn render(schema: &Path, target: TargetKind) -> anyhow::Result<String> {
    let bytes = std::fs::read(schema).with_context(|| format!("failed to read {}", schema.display()))?;
    let captured = Captured::default();
    let settings = Settings {
        target,
        package: "fixtures".to_string(),
        root_type: Some("Root".to_string()),
        ..Settings::default()
    };
    let mut generator = Generator::new(settings, Destination::Stream(Box::new(captured.clone())));
    generator.generate(&bytes)?;
    generator.finish()?;
    let text = String::from_utf8(captured.0.borrow().clone())?;
    Ok(text)
}

fn check(schema: &Path, target: TargetKind, bless: bool) -> anyhow::Result<Outcome> {
    let actual = render(schema, target)?;
    let golden = schema.with_extension(format!("{}.golden", target.target().extension()));
    if bless {
        std::fs::write(&golden, &actual).with_context(|| format!("failed to write {}", golden.display()))?;
        return Ok(Outcome::Blessed);
    }
    let expected = std::fs::read_to_string(&golden)
        .with_context(|| format!("missing golden file {} (run with --bless)", golden.display()))?;
    if expected == actual {
        return Ok(Outcome::Pass);
    }
    let first_diff = expected
        .lines()
        .zip(actual.lines())
        .position(|(e, a)| e != a)
        .unwrap_or_else(|| expected.lines().count().min(actual.lines().count()));
    Ok(Outcome::Fail(format!(
        "first difference at line {}:\n  expected: {:?}\n  actual:   {:?}",
        first_diff + 1,
        expected.lines().nth(first_diff).unwrap_or_default(),
        actual.lines().nth(first_diff).unwrap_or_default(),
    )))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let pattern = cli.fixtures.join("*.json");
    let schemas = match glob::glob(&pattern.to_string_lossy()) {
        Ok(paths) => paths.filter_map(Result::ok).collect::<Vec<_>>(),
        Err(error) => {
            eprintln!("{} {error}", "error:".red().bold());
            return ExitCode::FAILURE;
        }
    };

    let mut failures = 0usize;
    for schema in &schemas {
        let name = schema.display();
        match check(schema, cli.target, cli.bless) {
            Ok(Outcome::Pass) => println!("{} {name}", "pass".green()),
            Ok(Outcome::Blessed) => println!("{} {name}", "blessed".cyan()),
            Ok(Outcome::Fail(diff)) => {
                failures += 1;
                println!("{} {name}\n{diff}", "FAIL".red().bold());
            }
            Err(error) => {
                failures += 1;
                println!("{} {name}: {error:#}", "ERROR".red().bold());
            }
        }
    }

    println!("{} fixtures, {failures} failed", schemas.len());
    if failures > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
