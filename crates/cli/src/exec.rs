use jtw_core::template::{interpolate, quote_cli};
use jtw_core::{parse_json, Json, Position};

use std::process::Command;

use thiserror::Error;
use tracing::debug;

/// Failure of a `-e` evaluation; the affected mutation is skipped.
#[derive(Debug, Error)]
pub enum ExecError {
  #[error("shell returned error ({0})")]
  ShellFailed(i32),
  #[error("could not spawn shell: {0}")]
  Spawn(#[from] std::io::Error),
  #[error("shell returned empty result, not updating")]
  EmptyOutput,
}

/// Interpolate the command line from the walked position, quote it and run
/// it through the shell. Output that fails to parse as JSON is demoted to a
/// JSON string with one trailing newline trimmed.
pub fn execute_cli(command: &str, pos: &Position) -> Result<Json, ExecError> {
  let Json::String(interpolated) = interpolate(command, pos, false) else {
    unreachable!("unparsed interpolation always yields a string")
  };
  let quoted = quote_cli(&interpolated);
  debug!(cli = %quoted, "executing shell command");

  let output = Command::new("/bin/sh").arg("-c").arg(&quoted).output()?;
  if !output.status.success() {
    return Err(ExecError::ShellFailed(output.status.code().unwrap_or(-1)));
  }
  let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
  if stdout.is_empty() {
    return Err(ExecError::EmptyOutput);
  }

  Ok(parse_json(&stdout).unwrap_or_else(|_| {
    let trimmed = stdout
      .strip_suffix('\n')
      .map(|s| s.strip_suffix('\r').unwrap_or(s))
      .unwrap_or(&stdout);
    Json::String(trimmed.to_string())
  }))
}

#[cfg(test)]
mod test {
  use super::*;

  fn pos_with(value: &str) -> Position {
    let mut pos = Position::root();
    let value: Json = serde_json::from_str(value).expect("should parse");
    pos.ns.insert(String::new(), value);
    pos
  }

  #[test]
  fn test_json_output() {
    let out = execute_cli("echo '[1, 2]'", &pos_with("null")).expect("should run");
    assert_eq!(out.to_string(), "[1,2]");
  }

  #[test]
  fn test_interpolated_value() {
    let out = execute_cli("echo {}", &pos_with("\"hi there\"")).expect("should run");
    assert_eq!(out, Json::String("hi there".to_string()));
  }

  #[test]
  fn test_non_json_output_demoted() {
    let out = execute_cli("echo not json", &pos_with("null")).expect("should run");
    assert_eq!(out, Json::String("not json".to_string()));
  }

  #[test]
  fn test_failed_command() {
    let err = execute_cli("false", &pos_with("null")).expect_err("should fail");
    assert!(matches!(err, ExecError::ShellFailed(_)));
  }

  #[test]
  fn test_empty_output() {
    let err = execute_cli("true", &pos_with("null")).expect_err("should fail");
    assert!(matches!(err, ExecError::EmptyOutput));
  }
}
