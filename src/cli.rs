//! CLI: JSON Schema documents in, Go or Rust type definitions out.
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{ArgAction, Args, Parser};
use colored::Colorize;
use json_schemagen::{Destination, Generator, Settings, TargetKind};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// generate statically typed definitions from JSON Schema documents
#[derive(Parser, Debug)]
#[command(name = "json-schemagen", version)]
pub struct CommandLineInterface {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    output_settings: OutputSettings,

    #[command(flatten)]
    naming_settings: NamingSettings,

    /// more log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more schema documents. May be literal paths, quoted glob
    /// patterns or '-' for stdin
    #[arg(num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(Args, Debug, Clone)]
struct OutputSettings {
    /// output language
    #[arg(long, value_enum, default_value_t = TargetKind::Go)]
    target: TargetKind,

    /// directory to write one file per type into
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    /// package name written into every generated header
    #[arg(long, default_value = "main")]
    pkg: String,

    /// replace files that already exist in --dir
    #[arg(long)]
    overwrite: bool,

    /// print all types to stdout instead of writing files
    #[arg(long)]
    stdout: bool,

    /// run generated code through gofmt/rustfmt
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    fmt: bool,

    /// prefix each type with the schema it was generated from
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    comments: bool,
}

#[derive(Args, Debug, Clone)]
struct NamingSettings {
    /// type name for a document root without title, id or description
    #[arg(long, default_value = "Root")]
    root_type: String,

    /// extra identifier abbreviations, e.g. `Uuid=UUID,Db=DB`
    #[arg(long, value_parser = parse_replacements)]
    replacements: Option<Replacements>,
}

#[derive(Debug, Clone, Default)]
struct Replacements(Vec<(String, String)>);

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    /// Expand the inputs and hand each document's bytes to `apply`, tagged
    /// with a label for error messages.
    fn load_process(
        &self,
        mut apply: impl FnMut(&str, anyhow::Result<Vec<u8>>),
    ) -> anyhow::Result<()> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;
        for source_path in source_paths {
            if source_path.as_os_str() == "-" {
                let mut bytes = Vec::new();
                let read = std::io::stdin()
                    .read_to_end(&mut bytes)
                    .map(|_| bytes)
                    .context("failed to read schema from stdin");
                apply("<stdin>", read);
                continue;
            }
            let label = source_path.to_string_lossy().to_string();
            let read = std::fs::read(&source_path)
                .with_context(|| format!("failed to read source file {label}"));
            apply(&label, read);
        }
        Ok(())
    }
}

impl OutputSettings {
    fn destination(&self) -> Destination {
        if self.stdout {
            Destination::Stream(Box::new(std::io::stdout()))
        } else {
            Destination::Directory {
                dir: self.dir.clone(),
                overwrite: self.overwrite,
            }
        }
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> ExitCode {
        init_tracing(self.verbose);
        debug!(cli = ?self, "parsed command line");

        let settings = Settings {
            target: self.output_settings.target,
            package: self.output_settings.pkg.clone(),
            format: self.output_settings.fmt,
            comments: self.output_settings.comments,
            replacements: self
                .naming_settings
                .replacements
                .clone()
                .unwrap_or_default()
                .0,
            root_type: Some(self.naming_settings.root_type.clone()),
        };
        let mut generator = Generator::new(settings, self.output_settings.destination());

        let mut failed = 0usize;
        let loaded = self.input_settings.load_process(|label, bytes| {
            let generated = bytes.and_then(|bytes| {
                generator
                    .generate(&bytes)
                    .with_context(|| format!("failed to generate types from {label}"))
            });
            if let Err(error) = generated {
                report(&error);
                failed += 1;
            }
        });
        if let Err(error) = loaded {
            report(&error);
            return ExitCode::FAILURE;
        }
        if let Err(error) = generator.finish().context("failed to flush generated output") {
            report(&error);
            return ExitCode::FAILURE;
        }

        info!(types = generator.emitted(), failed, "done");
        if failed > 0 {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("json_schemagen={level}")));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);
    if tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        eprintln!("Warning: tracing subscriber already initialized");
    }
}

fn report(error: &anyhow::Error) {
    eprintln!("{} {error:#}", "error:".red().bold());
}

/// `k=v[,k=v...]`; surrounding quotes on keys and values are dropped.
fn parse_replacements(raw: &str) -> Result<Replacements, String> {
    let unquote = |s: &str| s.trim().trim_matches(|c: char| c == '"' || c == '\'').to_string();
    raw.split(',')
        .filter(|pair| !pair.trim().is_empty())
        .map(|pair| {
            let (from, to) = pair
                .split_once('=')
                .ok_or_else(|| format!("expected `from=to`, got {pair:?}"))?;
            let (from, to) = (unquote(from), unquote(to));
            if from.is_empty() {
                return Err(format!("empty replacement key in {pair:?}"));
            }
            Ok((from, to))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Replacements)
}

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                matched_any = true;
                out.push(entry?);
            }
            if !matched_any {
                anyhow::bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
