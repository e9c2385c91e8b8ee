//! JSON-file sink: one pretty-printed array per file, replaced atomically.

use std::{
    fs,
    io::ErrorKind,
    marker::PhantomData,
    path::{Path, PathBuf},
};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::ser::PrettyFormatter;
use tracing::debug;

use super::{PersistError, PersistResult, RecordSink};

/// Stores a record list as a JSON array at `path`.
///
/// Saves go to `<path>.tmp` first and are renamed over the target, so a
/// crash mid-write leaves the previous file intact.
#[derive(Debug)]
pub struct JsonFileSink<T> {
    path: PathBuf,
    _records: PhantomData<fn() -> T>,
}

impl<T> JsonFileSink<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _records: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl<T> RecordSink<T> for JsonFileSink<T>
where
    T: Serialize + DeserializeOwned,
{
    fn load_all(&mut self) -> PersistResult<Vec<T>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no file yet, starting empty");
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(PersistError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        Ok(serde_json::from_str(&text)?)
    }

    fn save_all(&mut self, records: &[T]) -> PersistResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| PersistError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let mut buf = Vec::new();
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        records.serialize(&mut ser)?;

        let tmp = self.tmp_path();
        fs::write(&tmp, &buf).map_err(|source| PersistError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| PersistError::Io {
            path: self.path.clone(),
            source,
        })?;

        debug!(path = %self.path.display(), count = records.len(), "saved json");
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::ReviewRecord;

    fn row(perf: i64) -> ReviewRecord {
        ReviewRecord {
            card_id: "c1".into(),
            timestamp: "2024-01-01T00:00:00Z".into(),
            performance: perf,
        }
    }

    #[test]
    fn missing_file_loads_empty() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut sink = JsonFileSink::<ReviewRecord>::new(tmp.path().join("none.json"));
        assert!(sink.load_all().unwrap().is_empty());
    }

    #[test]
    fn save_overwrites_and_leaves_no_temp_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("reviews.json");
        let mut sink = JsonFileSink::<ReviewRecord>::new(&path);

        sink.save_all(&[row(1), row(2)]).unwrap();
        sink.save_all(&[row(5)]).unwrap();

        assert_eq!(sink.load_all().unwrap(), vec![row(5)]);
        assert!(!sink.tmp_path().exists());
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n        \"performance\": 5"));
    }

    #[test]
    fn corrupt_file_is_an_error_not_an_empty_deck() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("reviews.json");
        fs::write(&path, "[{\"card_id\": ").unwrap();
        let mut sink = JsonFileSink::<ReviewRecord>::new(&path);
        assert!(matches!(sink.load_all(), Err(PersistError::Json(_))));
    }
}
