use ansi_term::{Color, Style};
use anyhow::{Error, Result};

use std::fmt;

/// Every failure kind owns a distinct exit code so callers can recover the
/// kind from the code alone.
#[derive(Debug, Clone)]
pub enum ErrorContext {
  /// wrong number of `-w` walks for the requested operation
  WalksRequired { count: usize, exact: bool },
  /// a collected walk position no longer addresses a valid node
  PositionInvalidated,
  /// `-e` command line not terminated with `\;`
  MissingExecTerminator,
  /// bad command-line options
  ParseOption,
  /// malformed JSON input
  ParseJson,
  /// malformed walk-path
  ParseWalk,
  /// malformed regex inside a walk-path
  ParseRegex,
  /// input file could not be read
  ReadInput(String),
}

/// exit code of a compare that found differences (status, not an error)
pub const COMPARE_DIFFERS: i32 = 4;

impl ErrorContext {
  pub fn exit_code(&self) -> i32 {
    use ErrorContext::*;
    match self {
      WalksRequired { .. } => 1,
      PositionInvalidated => 2,
      MissingExecTerminator => 3,
      ParseOption => 5,
      ParseJson => 6,
      ParseWalk => 7,
      ParseRegex => 8,
      ReadInput(_) => 9,
    }
  }
}

impl fmt::Display for ErrorContext {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let msg = ErrorMessage::from_context(self);
    write!(f, "{}", msg.title)
  }
}

struct ErrorMessage {
  title: String,
  description: String,
}

impl ErrorMessage {
  fn new<S: ToString>(title: S, description: S) -> Self {
    Self {
      title: title.to_string(),
      description: description.to_string(),
    }
  }

  fn from_context(ctx: &ErrorContext) -> ErrorMessage {
    use ErrorContext::*;
    match ctx {
      WalksRequired { count, exact } => Self::new(
        format!(
          "{} {} `-w` option(s) must be given.",
          if *exact { "Exactly" } else { "At least" },
          count
        ),
        "This operation pairs walked elements and needs that many walk-paths.".to_string(),
      ),
      PositionInvalidated => Self::new(
        "Walk position became invalid.",
        "A prior operation removed or replaced the addressed node; the operation was aborted.",
      ),
      MissingExecTerminator => Self::new(
        "Don't see the `\\;` terminating the -e command.",
        "Terminate the shell command line of -e -i/-u with an escaped semicolon: \\;",
      ),
      ParseOption => Self::new(
        "Cannot parse command-line options.",
        "Run with --help to see the option summary, or -g for the walk-path guide.",
      ),
      ParseJson => Self::new(
        "Cannot parse JSON input.",
        "The input is not a valid JSON document; the parse locus is reported above.",
      ),
      ParseWalk => Self::new(
        "Cannot compile walk-path.",
        "Run with -g to see the walk-path syntax guide.",
      ),
      ParseRegex => Self::new(
        "Cannot compile the regex of a search lexeme.",
        "R/L/D search bodies must hold a valid regular expression.",
      ),
      ReadInput(file) => Self::new(
        format!("Cannot read input from `{file}`."),
        "Check that the file exists and is readable.".to_string(),
      ),
    }
  }
}

pub fn exit_with_error(error: Error) -> Result<()> {
  if let Some(e) = error.downcast_ref::<clap::Error>() {
    use clap::error::ErrorKind;
    if matches!(
      e.kind(),
      ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
    ) {
      e.exit()
    }
    eprintln!("{e}");
    std::process::exit(ErrorContext::ParseOption.exit_code())
  }
  if let Some(e) = error.downcast_ref::<ErrorContext>() {
    let error_fmt = ErrorFormat {
      context: e,
      inner: &error,
    };
    eprintln!("{error_fmt}");
    std::process::exit(e.exit_code())
  }
  // anyhow's default reporting for anything unclassified
  Err(error)
}

struct ErrorFormat<'a> {
  context: &'a ErrorContext,
  inner: &'a Error,
}

impl fmt::Display for ErrorFormat<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let ErrorMessage { title, description } = ErrorMessage::from_context(self.context);
    let bold = Style::new().bold();
    let error = Color::Red.paint("Error:");
    let message = bold.paint(title);
    writeln!(f, "{error} {message}")?;
    let help = Color::Blue.paint("Help:");
    writeln!(f, "{help} {description}")?;
    for err in self.inner.chain().skip(1) {
      let prefix = Color::Red.paint("caused by:");
      writeln!(f, "{prefix} {err}")?;
    }
    Ok(())
  }
}

impl std::error::Error for ErrorContext {}
