use anyhow::Result;

fn main() -> Result<()> {
  jtw::execute_main()
}
