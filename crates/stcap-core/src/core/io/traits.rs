use crate::core::models::system::MolecularSystem;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor};
use std::path::Path;

/// A structure file format that can be loaded into a [`MolecularSystem`].
///
/// Only `read_from` is format-specific; the path and in-memory variants are
/// provided on top of it.
pub trait MolecularFile {
    /// Header information kept alongside the structure.
    type Metadata;

    type Error: Error + From<io::Error>;

    /// Parses a structure from `reader`.
    ///
    /// # Errors
    ///
    /// Returns `Self::Error` on malformed records or a failed read.
    fn read_from(
        reader: &mut impl BufRead,
    ) -> Result<(MolecularSystem, Self::Metadata), Self::Error>;

    /// Opens and parses the file at `path`.
    fn read_from_path<P: AsRef<Path>>(
        path: P,
    ) -> Result<(MolecularSystem, Self::Metadata), Self::Error> {
        let file = File::open(path)?;
        Self::read_from(&mut BufReader::new(file))
    }

    /// Parses a structure held in memory.
    fn read_from_str(content: &str) -> Result<(MolecularSystem, Self::Metadata), Self::Error> {
        Self::read_from(&mut Cursor::new(content))
    }
}
