//! Writing rendered types out: one concatenated stream, or one file per type.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, info};

use crate::error::EmitError;
use crate::naming;
use crate::registry::Emission;
use crate::target::{Formatter, Layout, Target};

pub enum Destination {
    /// All types on one writer, header first.
    Stream(Box<dyn Write>),
    /// `<dir>/<snake_case_name>.<ext>` per type. Existing files are left
    /// alone unless `overwrite` is set.
    Directory { dir: PathBuf, overwrite: bool },
}

pub struct Emitter {
    target: &'static dyn Target,
    destination: Destination,
    package: String,
    format: bool,
    wrote_header: bool,
    /// Stream output held back until [`Emitter::finish`] when formatting,
    /// since formatters reject fragments without a package clause.
    held: String,
}

impl Emitter {
    pub fn new(
        target: &'static dyn Target,
        destination: Destination,
        package: impl Into<String>,
        format: bool,
    ) -> Self {
        Self {
            target,
            destination,
            package: package.into(),
            format,
            wrote_header: false,
            held: String::new(),
        }
    }

    pub fn write(&mut self, emission: &Emission) -> Result<(), EmitError> {
        match &mut self.destination {
            Destination::Stream(out) => {
                let mut text = String::new();
                if !self.wrote_header {
                    text.push_str(&self.target.header(&self.package, Layout::Stream));
                }
                text.push_str(&emission.source);
                self.wrote_header = true;
                if self.format {
                    self.held.push_str(&text);
                    return Ok(());
                }
                write_stream(out, &text)?;
                debug!(name = %emission.name, target = self.target.name(), "type written to stream");
                Ok(())
            }
            Destination::Directory { dir, overwrite } => {
                let file = dir.join(format!(
                    "{}.{}",
                    naming::file_stem(&emission.name),
                    self.target.extension()
                ));
                if !*overwrite && file.exists() {
                    info!(file = %file.display(), "file already exists, skipping without --overwrite");
                    return Ok(());
                }
                let mut text = self.target.header(&self.package, Layout::FilePerType);
                text.push_str(&emission.source);
                info!(file = %file.display(), "writing");
                std::fs::write(&file, text)
                    .map_err(|err| EmitError::io(file.display().to_string(), err))?;
                if self.format {
                    format_file(self.target.formatter(), &file)?;
                }
                Ok(())
            }
        }
    }

    /// Flush held stream output through the formatter. A no-op for
    /// directories and unformatted streams.
    pub fn finish(&mut self) -> Result<(), EmitError> {
        let Destination::Stream(out) = &mut self.destination else {
            return Ok(());
        };
        if self.held.is_empty() {
            return Ok(());
        }
        let text = format_stream(self.target.formatter(), &std::mem::take(&mut self.held))?;
        write_stream(out, &text)
    }
}

fn write_stream(out: &mut Box<dyn Write>, text: &str) -> Result<(), EmitError> {
    out.write_all(text.as_bytes())
        .and_then(|_| out.flush())
        .map_err(|err| EmitError::io("output stream", err))
}

fn command_line(formatter: Formatter, args: &[&str]) -> String {
    std::iter::once(formatter.program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Pipe `code` through the formatter and return what it prints.
fn format_stream(formatter: Formatter, code: &str) -> Result<String, EmitError> {
    let command = command_line(formatter, formatter.stream_args);
    let failed = |message: String| EmitError::Formatter {
        command: command.clone(),
        message,
    };

    let mut child = Command::new(formatter.program)
        .args(formatter.stream_args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| failed(err.to_string()))?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(code.as_bytes())
            .map_err(|err| failed(err.to_string()))?;
    }
    let output = child.wait_with_output().map_err(|err| failed(err.to_string()))?;
    if !output.status.success() {
        return Err(failed(format!(
            "{}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    String::from_utf8(output.stdout).map_err(|err| failed(err.to_string()))
}

fn format_file(formatter: Formatter, file: &Path) -> Result<(), EmitError> {
    let command = command_line(formatter, formatter.file_args);
    let output = Command::new(formatter.program)
        .args(formatter.file_args)
        .arg(file)
        .stdin(Stdio::null())
        .output()
        .map_err(|err| EmitError::Formatter {
            command: command.clone(),
            message: err.to_string(),
        })?;
    if !output.status.success() {
        return Err(EmitError::Formatter {
            command,
            message: format!(
                "{}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }
    Ok(())
}
