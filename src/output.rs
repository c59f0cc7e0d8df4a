//! JSON snapshot export.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::github::Repository;

/// Write all repositories as one indented JSON array in API shape,
/// creating parent directories as needed.
pub fn write_json(path: &Path, repos: &[Repository]) -> Result<()> {
  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent)?;
  }

  let mut writer = BufWriter::new(File::create(path)?);
  serde_json::to_writer_pretty(&mut writer, repos).map_err(std::io::Error::from)?;
  writer.write_all(b"\n")?;
  writer.flush()?;

  Ok(())
}
