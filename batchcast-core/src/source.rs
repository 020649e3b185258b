use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use csv::StringRecord;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to open csv {path}: {source}")]
    Io { source: io::Error, path: PathBuf },
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing essential columns: {0}")]
    MissingColumns(String),
}

pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// One CSV line worth of video metadata. Column order in the file is
/// irrelevant; optional columns default to empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoRow {
    pub index: u64,
    pub name: String,
    pub tags: String,
    pub description: String,
    pub long_description: String,
    pub video_url: String,
    pub poster: String,
    pub thumbnail: String,
}

#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    name: usize,
    video_url: usize,
    tags: Option<usize>,
    description: Option<usize>,
    long_description: Option<usize>,
    poster: Option<usize>,
    thumbnail: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> SourceResult<Self> {
        let position = |column: &str| headers.iter().position(|header| header == column);
        let mut missing = Vec::new();
        let name = position("name");
        let video_url = position("video_url");
        if name.is_none() {
            missing.push("name");
        }
        if video_url.is_none() {
            missing.push("video_url");
        }
        match (name, video_url) {
            (Some(name), Some(video_url)) => Ok(Self {
                name,
                video_url,
                tags: position("tags"),
                description: position("description"),
                long_description: position("long_description"),
                poster: position("poster"),
                thumbnail: position("thumbnail"),
            }),
            _ => Err(SourceError::MissingColumns(missing.join(", "))),
        }
    }

    fn row(&self, index: u64, record: &StringRecord) -> VideoRow {
        let field = |position: Option<usize>| {
            position
                .and_then(|idx| record.get(idx))
                .unwrap_or_default()
                .to_string()
        };
        VideoRow {
            index,
            name: field(Some(self.name)),
            tags: field(self.tags),
            description: field(self.description),
            long_description: field(self.long_description),
            video_url: field(Some(self.video_url)),
            poster: field(self.poster),
            thumbnail: field(self.thumbnail),
        }
    }
}

/// Header-driven CSV reader yielding `VideoRow`s in file order with their
/// 0-based indices. Missing required columns are a fatal startup error,
/// caught before the first row.
pub struct CsvRowSource {
    records: csv::StringRecordsIntoIter<File>,
    columns: ColumnMap,
    next_index: u64,
}

impl std::fmt::Debug for CsvRowSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsvRowSource")
            .field("columns", &self.columns)
            .field("next_index", &self.next_index)
            .finish_non_exhaustive()
    }
}

impl CsvRowSource {
    pub fn open<P: AsRef<Path>>(path: P) -> SourceResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| SourceError::Io {
            source,
            path: path.to_path_buf(),
        })?;
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);
        let columns = ColumnMap::from_headers(reader.headers()?)?;
        Ok(Self {
            records: reader.into_records(),
            columns,
            next_index: 0,
        })
    }
}

impl Iterator for CsvRowSource {
    type Item = SourceResult<VideoRow>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.records.next()? {
            Ok(record) => record,
            Err(error) => return Some(Err(error.into())),
        };
        let index = self.next_index;
        self.next_index += 1;
        Some(Ok(self.columns.row(index, &record)))
    }
}
