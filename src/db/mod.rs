pub mod repositories;
pub mod schema;

use rusqlite::Connection;
use std::path::Path;

use crate::error::Result;

pub use repositories::save_repositories;

/// Database connection wrapper for exported repositories
pub struct Database {
  conn: Connection,
}

impl Database {
  /// Open or create the database at `path`
  pub fn open(path: &Path) -> Result<Self> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
      std::fs::create_dir_all(parent)?;
    }

    Self::from_connection(Connection::open(path)?)
  }

  /// Open a throwaway in-memory database
  #[cfg(test)]
  pub fn open_in_memory() -> Result<Self> {
    Self::from_connection(Connection::open_in_memory()?)
  }

  fn from_connection(conn: Connection) -> Result<Self> {
    let db = Self { conn };
    db.run_migrations()?;
    Ok(db)
  }

  /// Run database migrations
  fn run_migrations(&self) -> Result<()> {
    self.conn.execute_batch(schema::SCHEMA)?;
    Ok(())
  }

  /// Get a reference to the connection
  #[cfg(test)]
  pub fn conn(&self) -> &Connection {
    &self.conn
  }

  pub(crate) fn conn_mut(&mut self) -> &mut Connection {
    &mut self.conn
  }
}
