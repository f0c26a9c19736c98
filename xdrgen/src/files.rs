//! The set of schema files loaded by a [`Driver`], addressed by [`FileId`].
//!
//! [`Driver`]: crate::driver::Driver

use std::num::NonZeroU32;
use std::ops::Range;

use codespan_reporting::files::{Error, SimpleFile};

/// Identifies a loaded schema file. Ids are handed out from 1.
// `NonZeroU32` keeps `Option<ByteRange>` the same size as `ByteRange`
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct FileId(NonZeroU32);

impl TryFrom<u32> for FileId {
    type Error = <NonZeroU32 as TryFrom<u32>>::Error;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        NonZeroU32::try_from(value).map(FileId)
    }
}

type SchemaFile = SimpleFile<String, String>;

/// Loaded schema files, with their names as given on the command line.
#[derive(Default)]
pub struct Files {
    schemas: Vec<SchemaFile>,
}

impl Files {
    pub fn new() -> Files {
        Files::default()
    }

    /// Load a schema, returning `None` once `u32::MAX` schemas are loaded.
    pub fn add(&mut self, name: String, source: String) -> Option<FileId> {
        let file_id = u32::try_from(self.schemas.len() + 1)
            .ok()
            .and_then(|id| FileId::try_from(id).ok())?;
        self.schemas.push(SimpleFile::new(name, source));
        Some(file_id)
    }

    pub fn get(&self, file_id: FileId) -> Result<&SchemaFile, Error> {
        let index = file_id.0.get() as usize - 1;
        self.schemas.get(index).ok_or(Error::FileMissing)
    }
}

impl<'a> codespan_reporting::files::Files<'a> for Files {
    type FileId = FileId;
    type Name = &'a str;
    type Source = &'a str;

    fn name(&'a self, file_id: FileId) -> Result<&'a str, Error> {
        Ok(self.get(file_id)?.name().as_str())
    }

    fn source(&'a self, file_id: FileId) -> Result<&'a str, Error> {
        Ok(self.get(file_id)?.source().as_str())
    }

    fn line_index(&'a self, file_id: FileId, byte_index: usize) -> Result<usize, Error> {
        self.get(file_id)?.line_index((), byte_index)
    }

    fn line_range(&'a self, file_id: FileId, line_index: usize) -> Result<Range<usize>, Error> {
        self.get(file_id)?.line_range((), line_index)
    }
}
