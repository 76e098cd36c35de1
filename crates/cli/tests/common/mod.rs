use anyhow::Result;
use std::fs::File;
use std::io::Write;
use tempfile::TempDir;

pub const FAMILY: &str = r#"{
  "Relation": [
    {
      "parent": "John Smith",
      "age": 31,
      "city": "New York",
      "children": ["Sophia", "Olivia"]
    },
    {
      "parent": "Anna Johnson",
      "age": 28,
      "city": "Chicago",
      "children": ["John"]
    }
  ]
}"#;

pub fn create_test_files<'a>(
  names_and_contents: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Result<TempDir> {
  let dir = TempDir::new()?;
  for (name, contents) in names_and_contents {
    let path = dir.path().join(name);
    let mut file = File::create(path)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()?;
  }
  Ok(dir)
}
