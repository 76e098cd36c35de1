mod common;

use anyhow::Result;
use assert_cmd::Command;
use common::{create_test_files, FAMILY};
use predicates::prelude::*;
use predicates::str::contains;

fn jtw() -> Command {
  Command::cargo_bin("jtw").expect("binary should build")
}

const FIRST_CHILDREN: &str = "[parent]:<^John>R[-1][children]";

#[test]
fn test_insert_literal() -> Result<()> {
  let dir = create_test_files([("example.json", FAMILY)])?;
  jtw()
    .args(["-w", FIRST_CHILDREN, "-i", "\"James\"", "-r"])
    .arg(dir.path().join("example.json"))
    .assert()
    .success()
    .stdout(contains(r#""children":["Sophia","Olivia","James"]"#))
    .stdout(contains(r#""children":["John"]"#));
  Ok(())
}

#[test]
fn test_insert_from_file() -> Result<()> {
  let dir = create_test_files([("example.json", FAMILY), ("add.json", "\"Mia\"")])?;
  let operand = dir.path().join("add.json");
  jtw()
    .args(["-w", FIRST_CHILDREN, "-i"])
    .arg(&operand)
    .arg("-r")
    .arg(dir.path().join("example.json"))
    .assert()
    .success()
    .stdout(contains(r#""children":["Sophia","Olivia","Mia"]"#));
  Ok(())
}

#[test]
fn test_insert_merge_coalesces() -> Result<()> {
  let dir = create_test_files([("o.json", r#"{"a":1,"b":2}"#)])?;
  jtw()
    .args(["-m", "-i", r#"{"a":3,"c":4}"#, "-r"])
    .arg(dir.path().join("o.json"))
    .assert()
    .success()
    .stdout("{\"a\":[1,3],\"b\":2,\"c\":4}\n");
  Ok(())
}

#[test]
fn test_update_literal() -> Result<()> {
  let dir = create_test_files([("example.json", FAMILY)])?;
  jtw()
    .args(["-w", "<John Smith>", "-u", "\"Jane Smith\"", "-r"])
    .arg(dir.path().join("example.json"))
    .assert()
    .success()
    .stdout(contains(r#""parent":"Jane Smith""#));
  Ok(())
}

#[test]
fn test_update_merge_overwrites() -> Result<()> {
  let dir = create_test_files([("o.json", r#"{"a":1,"b":2}"#)])?;
  jtw()
    .args(["-m", "-u", r#"{"a":3,"c":4}"#, "-r"])
    .arg(dir.path().join("o.json"))
    .assert()
    .success()
    .stdout("{\"a\":3,\"b\":2,\"c\":4}\n");
  Ok(())
}

#[test]
fn test_update_by_walked_source() -> Result<()> {
  let dir = create_test_files([("example.json", FAMILY)])?;
  // copy the first parent over the second one
  jtw()
    .args(["-w", "[Relation][1][parent]", "-u", "[Relation][0][parent]", "-r"])
    .arg(dir.path().join("example.json"))
    .assert()
    .success()
    .stdout(contains(r#""parent":"John Smith","age":28"#));
  Ok(())
}

#[test]
fn test_label_rename() -> Result<()> {
  let dir = create_test_files([("o.json", r#"{"x":1,"old":2,"z":3}"#)])?;
  jtw()
    .args(["-w", "<old>l", "-u", "\"new\"", "-r"])
    .arg(dir.path().join("o.json"))
    .assert()
    .success()
    .stdout("{\"x\":1,\"new\":2,\"z\":3}\n");
  Ok(())
}

#[test]
fn test_label_rename_requires_string() -> Result<()> {
  let dir = create_test_files([("o.json", r#"{"old":2}"#)])?;
  jtw()
    .args(["-w", "<old>l", "-u", "3", "-r"])
    .arg(dir.path().join("o.json"))
    .assert()
    .success()
    .stdout("{\"old\":2}\n")
    .stderr(contains("labels could be updated"));
  Ok(())
}

#[test]
fn test_insert_into_label_refused() -> Result<()> {
  let dir = create_test_files([("o.json", r#"{"old":2}"#)])?;
  jtw()
    .args(["-w", "<old>l", "-i", "\"x\"", "-r"])
    .arg(dir.path().join("o.json"))
    .assert()
    .success()
    .stdout("{\"old\":2}\n")
    .stderr(contains("use update"));
  Ok(())
}

#[test]
fn test_purge() -> Result<()> {
  let dir = create_test_files([("example.json", FAMILY)])?;
  jtw()
    .args(["-p", "-w", "[Relation][+0][age]", "-r"])
    .arg(dir.path().join("example.json"))
    .assert()
    .success()
    .stdout(predicate::str::contains("age").not());
  Ok(())
}

#[test]
fn test_double_purge_keeps_walked() -> Result<()> {
  let dir = create_test_files([("example.json", FAMILY)])?;
  jtw()
    .args(["-pp", "-w", "[Relation][+0][children]", "-r"])
    .arg(dir.path().join("example.json"))
    .assert()
    .success()
    .stdout(
      "{\"Relation\":[{\"children\":[\"Sophia\",\"Olivia\"]},{\"children\":[\"John\"]}]}\n",
    );
  Ok(())
}

#[test]
fn test_double_purge_of_nothing_empties() -> Result<()> {
  let dir = create_test_files([("example.json", FAMILY)])?;
  jtw()
    .args(["-pp", "-w", "<nowhere>", "-r"])
    .arg(dir.path().join("example.json"))
    .assert()
    .success()
    .stdout("{}\n");
  Ok(())
}

#[test]
fn test_swap() -> Result<()> {
  let dir = create_test_files([("example.json", FAMILY)])?;
  jtw()
    .args([
      "-s",
      "-w",
      "[Relation][0][children]",
      "-w",
      "[Relation][1][children]",
      "-r",
    ])
    .arg(dir.path().join("example.json"))
    .assert()
    .success()
    .stdout(contains(r#""parent":"John Smith","age":31,"city":"New York","children":["John"]"#))
    .stdout(contains(r#""children":["Sophia","Olivia"]"#));
  Ok(())
}

#[test]
fn test_move_with_purge() -> Result<()> {
  let dir = create_test_files([("example.json", FAMILY)])?;
  // inserting a walked source with -p purges the source afterwards
  jtw()
    .args([
      "-w",
      "[Relation][1][children]",
      "-i",
      "[Relation][0][children][0]",
      "-p",
      "-r",
    ])
    .arg(dir.path().join("example.json"))
    .assert()
    .success()
    .stdout(contains(r#""children":["John","Sophia"]"#))
    .stdout(contains(r#""children":["Olivia"]"#));
  Ok(())
}

#[test]
fn test_compare_differs() -> Result<()> {
  let dir = create_test_files([("a.json", r#"{"a":1,"b":3}"#)])?;
  jtw()
    .args(["-c", r#"{"a":1,"b":2}"#, "-r"])
    .arg(dir.path().join("a.json"))
    .assert()
    .failure()
    .code(4)
    .stdout("{\"json_1\":{\"b\":3}}\n{\"json_2\":{\"b\":2}}\n");
  Ok(())
}

#[test]
fn test_compare_equal() -> Result<()> {
  let dir = create_test_files([("a.json", r#"{"a":1,"b":3}"#)])?;
  jtw()
    .args(["-c", r#"{"b":3,"a":1}"#, "-r"])
    .arg(dir.path().join("a.json"))
    .assert()
    .success()
    .stdout("{\"json_1\":{}}\n{\"json_2\":{}}\n");
  Ok(())
}

#[test]
fn test_compare_walked_operand() -> Result<()> {
  let dir = create_test_files([("example.json", FAMILY)])?;
  jtw()
    .args(["-c", "[Relation][0]", "-w", "[Relation][1]", "-r"])
    .arg(dir.path().join("example.json"))
    .assert()
    .failure()
    .code(4)
    .stdout(contains("json_1"))
    .stdout(contains("json_2"));
  Ok(())
}

#[test]
fn test_force_rewrites_file() -> Result<()> {
  let dir = create_test_files([("o.json", r#"{"a":1}"#)])?;
  let file = dir.path().join("o.json");
  jtw()
    .args(["-f", "-w", "[a]", "-u", "2", "-r"])
    .arg(&file)
    .assert()
    .success()
    .stdout(predicate::str::is_empty());
  let rewritten = std::fs::read_to_string(&file)?;
  assert_eq!(rewritten, "{\"a\":2}\n");
  Ok(())
}

#[test]
fn test_exec_update() -> Result<()> {
  let dir = create_test_files([("example.json", FAMILY)])?;
  jtw()
    .args(["-w", "[Relation][+0][parent]", "-e", "-u", "echo", "{}", "|", "tr", "a-z", "A-Z", ";", "-r"])
    .arg(dir.path().join("example.json"))
    .assert()
    .success()
    .stdout(contains(r#""parent":"JOHN SMITH""#))
    .stdout(contains(r#""parent":"ANNA JOHNSON""#));
  Ok(())
}

#[test]
fn test_exec_missing_terminator() -> Result<()> {
  let dir = create_test_files([("example.json", FAMILY)])?;
  jtw()
    .args(["-w", "[Relation][0][parent]", "-e", "-u", "echo", "{}"])
    .arg(dir.path().join("example.json"))
    .assert()
    .failure()
    .code(3);
  Ok(())
}

#[test]
fn test_exec_failed_command_skips() -> Result<()> {
  let dir = create_test_files([("o.json", r#"{"a":1}"#)])?;
  jtw()
    .args(["-w", "[a]", "-e", "-u", "false", ";", "-r"])
    .arg(dir.path().join("o.json"))
    .assert()
    .success()
    .stdout("{\"a\":1}\n")
    .stderr(contains("shell returned error"));
  Ok(())
}

#[test]
fn test_insert_into_each_record() -> Result<()> {
  let dir = create_test_files([("example.json", FAMILY)])?;
  jtw()
    .args(["-w", "[Relation][+0]", "-i", r#"{"seen": true}"#, "-r"])
    .arg(dir.path().join("example.json"))
    .assert()
    .success()
    .stdout(contains(r#""children":["Sophia","Olivia"],"seen":true"#))
    .stdout(contains(r#""children":["John"],"seen":true"#));
  Ok(())
}

#[test]
fn test_update_atomic_root() -> Result<()> {
  let dir = create_test_files([("n.json", "5")])?;
  jtw()
    .args(["-u", "[1,2]", "-r"])
    .arg(dir.path().join("n.json"))
    .assert()
    .success()
    .stdout("[1,2]\n");
  Ok(())
}
