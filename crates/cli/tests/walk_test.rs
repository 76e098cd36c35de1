mod common;

use anyhow::Result;
use assert_cmd::Command;
use common::{create_test_files, FAMILY};
use predicates::prelude::*;
use predicates::str::contains;

fn jtw() -> Command {
  Command::cargo_bin("jtw").expect("binary should build")
}

#[test]
fn test_plain_print() -> Result<()> {
  let dir = create_test_files([("a.json", r#"{"a":[1,2]}"#)])?;
  jtw()
    .arg(dir.path().join("a.json"))
    .assert()
    .success()
    .stdout("{\n   \"a\": [\n      1,\n      2\n   ]\n}\n");
  Ok(())
}

#[test]
fn test_stdin_input() -> Result<()> {
  jtw()
    .args(["-r"])
    .write_stdin("{\"a\": 1}")
    .assert()
    .success()
    .stdout("{\"a\":1}\n");
  Ok(())
}

#[test]
fn test_offset_walk() -> Result<()> {
  let dir = create_test_files([("example.json", FAMILY)])?;
  jtw()
    .arg("-w")
    .arg("[Relation][0][children]")
    .arg(dir.path().join("example.json"))
    .assert()
    .success()
    .stdout("[\n   \"Sophia\",\n   \"Olivia\"\n]\n");
  Ok(())
}

#[test]
fn test_interleaved_walks() -> Result<()> {
  let dir = create_test_files([("example.json", FAMILY)])?;
  jtw()
    .args(["-w", "[Relation][+0][parent]", "-w", "[Relation][+0][children][+0]"])
    .arg(dir.path().join("example.json"))
    .assert()
    .success()
    .stdout("\"John Smith\"\n\"Sophia\"\n\"Olivia\"\n\"Anna Johnson\"\n\"John\"\n");
  Ok(())
}

#[test]
fn test_sequential_walks() -> Result<()> {
  let dir = create_test_files([("example.json", FAMILY)])?;
  jtw()
    .args([
      "-n",
      "-w",
      "[Relation][+0][parent]",
      "-w",
      "[Relation][+0][children][+0]",
    ])
    .arg(dir.path().join("example.json"))
    .assert()
    .success()
    .stdout("\"John Smith\"\n\"Anna Johnson\"\n\"Sophia\"\n\"Olivia\"\n\"John\"\n");
  Ok(())
}

#[test]
fn test_xy_shorthand() -> Result<()> {
  let dir = create_test_files([("example.json", FAMILY)])?;
  jtw()
    .args(["-x", "[Relation][+0]", "-y", "[parent]", "-y", "[children][+0]"])
    .arg(dir.path().join("example.json"))
    .assert()
    .success()
    .stdout("\"John Smith\"\n\"Sophia\"\n\"Olivia\"\n\"Anna Johnson\"\n\"John\"\n");
  Ok(())
}

#[test]
fn test_search_walk() -> Result<()> {
  let dir = create_test_files([("example.json", FAMILY)])?;
  jtw()
    .args(["-w", "[parent]:<^John>R[-1][children][+0]", "-r"])
    .arg(dir.path().join("example.json"))
    .assert()
    .success()
    .stdout("\"Sophia\"\n\"Olivia\"\n");
  Ok(())
}

#[test]
fn test_jsonize_array() -> Result<()> {
  let dir = create_test_files([("example.json", FAMILY)])?;
  jtw()
    .args(["-w", "[Relation][+0][parent]", "-j", "-r"])
    .arg(dir.path().join("example.json"))
    .assert()
    .success()
    .stdout("[\"John Smith\",\"Anna Johnson\"]\n");
  Ok(())
}

#[test]
fn test_jsonize_labeled_groups() -> Result<()> {
  let dir = create_test_files([("example.json", FAMILY)])?;
  jtw()
    .args(["-w", "[Relation][+0][parent]", "-j", "-l", "-r"])
    .arg(dir.path().join("example.json"))
    .assert()
    .success()
    .stdout("[{\"parent\":[\"John Smith\",\"Anna Johnson\"]}]\n");
  Ok(())
}

#[test]
fn test_jsonize_object() -> Result<()> {
  let dir = create_test_files([("example.json", FAMILY)])?;
  jtw()
    .args(["-w", "[Relation][+0][city]", "-jj", "-r"])
    .arg(dir.path().join("example.json"))
    .assert()
    .success()
    .stdout("{\"city\":[\"New York\",\"Chicago\"]}\n");
  Ok(())
}

#[test]
fn test_labels_console() -> Result<()> {
  let dir = create_test_files([("example.json", FAMILY)])?;
  jtw()
    .args(["-w", "[Relation][0][age]", "-l"])
    .arg(dir.path().join("example.json"))
    .assert()
    .success()
    .stdout("\"age\": 31\n");
  Ok(())
}

#[test]
fn test_template_interpolation() -> Result<()> {
  let dir = create_test_files([("example.json", FAMILY)])?;
  jtw()
    .args(["-w", "[Relation][+0][age]", "-T", r#"{"years": {}}"#, "-j", "-r"])
    .arg(dir.path().join("example.json"))
    .assert()
    .success()
    .stdout("[{\"years\":31},{\"years\":28}]\n");
  Ok(())
}

#[test]
fn test_template_path_token() -> Result<()> {
  let dir = create_test_files([("example.json", FAMILY)])?;
  jtw()
    .args(["-w", "[Relation][0][age]", "-T", r#""{$path}""#, "-r"])
    .arg(dir.path().join("example.json"))
    .assert()
    .success()
    .stdout("\"Relation_0_age\"\n");
  Ok(())
}

#[test]
fn test_raw_and_stringify() -> Result<()> {
  let dir = create_test_files([("a.json", "{\"a\": [1, 2]}")])?;
  jtw()
    .args(["-r"])
    .arg(dir.path().join("a.json"))
    .assert()
    .success()
    .stdout("{\"a\":[1,2]}\n");
  jtw()
    .args(["-rr"])
    .arg(dir.path().join("a.json"))
    .assert()
    .success()
    .stdout("\"{\\\"a\\\":[1,2]}\"\n");
  Ok(())
}

#[test]
fn test_unquote_isolated_string() -> Result<()> {
  let dir = create_test_files([("s.json", "\"a b\"")])?;
  jtw()
    .args(["-qq"])
    .arg(dir.path().join("s.json"))
    .assert()
    .success()
    .stdout("a b\n");
  Ok(())
}

#[test]
fn test_indent_option() -> Result<()> {
  let dir = create_test_files([("a.json", "{\"a\":1}")])?;
  jtw()
    .args(["-t", "2"])
    .arg(dir.path().join("a.json"))
    .assert()
    .success()
    .stdout("{\n  \"a\": 1\n}\n");
  Ok(())
}

#[test]
fn test_size_suffix_and_size_only() -> Result<()> {
  let dir = create_test_files([("a.json", "{\"a\":1}")])?;
  jtw()
    .args(["-z", "-r"])
    .arg(dir.path().join("a.json"))
    .assert()
    .success()
    .stdout("{\"a\":1}\nsize: 2\n");
  jtw()
    .args(["-zz"])
    .arg(dir.path().join("a.json"))
    .assert()
    .success()
    .stdout("2\n");
  Ok(())
}

#[test]
fn test_atomic_root_disables_walks() -> Result<()> {
  let dir = create_test_files([("n.json", "5")])?;
  jtw()
    .args(["-w", "[0]"])
    .arg(dir.path().join("n.json"))
    .assert()
    .success()
    .stdout("5\n");
  Ok(())
}

#[test]
fn test_all_inputs_and_wrap_all() -> Result<()> {
  let dir = create_test_files([("s.json", "1 2 3")])?;
  jtw()
    .args(["-a", "-r"])
    .arg(dir.path().join("s.json"))
    .assert()
    .success()
    .stdout("1\n2\n3\n");
  jtw()
    .args(["-J", "-r"])
    .arg(dir.path().join("s.json"))
    .assert()
    .success()
    .stdout("[\n   1,\n   2,\n   3\n]\n");
  // without -a only the first document is processed
  jtw()
    .args(["-r"])
    .arg(dir.path().join("s.json"))
    .assert()
    .success()
    .stdout("1\n");
  Ok(())
}

#[test]
fn test_guide() -> Result<()> {
  jtw()
    .arg("-g")
    .assert()
    .success()
    .stdout(contains("Walk-path syntax"))
    .stdout(contains("Usage notes"))
    .stdout(contains("Examples"));
  Ok(())
}

#[test]
fn test_exit_codes() -> Result<()> {
  let dir = create_test_files([("bad.json", "{\"a\": tru"), ("ok.json", "{\"a\":1}")])?;
  // malformed JSON
  jtw()
    .arg(dir.path().join("bad.json"))
    .assert()
    .failure()
    .code(6)
    .stderr(contains("parse locus"));
  // malformed walk-path
  jtw()
    .args(["-w", "[unclosed"])
    .arg(dir.path().join("ok.json"))
    .assert()
    .failure()
    .code(7);
  // malformed search regex
  jtw()
    .args(["-w", "<(>R"])
    .arg(dir.path().join("ok.json"))
    .assert()
    .failure()
    .code(8);
  // swap needs exactly two walks
  jtw()
    .args(["-s", "-w", "[a]"])
    .arg(dir.path().join("ok.json"))
    .assert()
    .failure()
    .code(1);
  // unknown option
  jtw()
    .args(["-Z"])
    .arg(dir.path().join("ok.json"))
    .assert()
    .failure()
    .code(5);
  // unreadable input file
  jtw()
    .arg(dir.path().join("missing.json"))
    .assert()
    .failure()
    .code(9);
  Ok(())
}

#[test]
fn test_empty_input_fails() -> Result<()> {
  jtw().write_stdin("").assert().failure().code(6);
  Ok(())
}

#[test]
fn test_unmatched_walk_prints_nothing() -> Result<()> {
  let dir = create_test_files([("example.json", FAMILY)])?;
  jtw()
    .args(["-w", "<no such string>"])
    .arg(dir.path().join("example.json"))
    .assert()
    .success()
    .stdout(predicate::str::is_empty());
  Ok(())
}
