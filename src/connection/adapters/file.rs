//! JSON-file preference store confined to a directory capability.

use crate::connection::ports::{PreferenceError, PreferenceResult, PreferenceStore};
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::sync::{Arc, Mutex};

/// Preference store that keeps all flags in one JSON object on disk.
///
/// The file holds `{ "<key>": <bool> }`. A missing file reads as "no flags
/// set". Every write replaces the whole object through a temporary file and a
/// rename so readers never observe a partial document. File access runs on
/// the blocking thread pool.
#[derive(Debug, Clone)]
pub struct JsonFilePreferenceStore {
    inner: Arc<FileStoreInner>,
}

#[derive(Debug)]
struct FileStoreInner {
    dir: Dir,
    file_name: Utf8PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFilePreferenceStore {
    /// Opens `directory` and stores flags in `file_name` inside it.
    ///
    /// # Errors
    ///
    /// Returns [`PreferenceError::Io`] when the directory cannot be opened.
    pub fn open(
        directory: &Utf8Path,
        file_name: impl Into<Utf8PathBuf>,
    ) -> PreferenceResult<Self> {
        let dir =
            Dir::open_ambient_dir(directory, ambient_authority()).map_err(PreferenceError::io)?;
        Ok(Self::from_dir(dir, file_name))
    }

    /// Stores flags in `file_name` inside an already opened directory.
    #[must_use]
    pub fn from_dir(dir: Dir, file_name: impl Into<Utf8PathBuf>) -> Self {
        Self {
            inner: Arc::new(FileStoreInner {
                dir,
                file_name: file_name.into(),
                write_lock: Mutex::new(()),
            }),
        }
    }

    async fn run_blocking<F, T>(&self, operation: F) -> PreferenceResult<T>
    where
        F: FnOnce(&FileStoreInner) -> PreferenceResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || operation(&inner))
            .await
            .map_err(|err| PreferenceError::io(std::io::Error::other(err)))?
    }
}

impl FileStoreInner {
    fn read_flags(&self) -> PreferenceResult<BTreeMap<String, bool>> {
        match self.dir.read_to_string(&self.file_name) {
            Ok(contents) => {
                serde_json::from_str(&contents).map_err(PreferenceError::serialization)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(PreferenceError::io(err)),
        }
    }

    fn write_flags(&self, flags: &BTreeMap<String, bool>) -> PreferenceResult<()> {
        let encoded =
            serde_json::to_string_pretty(flags).map_err(PreferenceError::serialization)?;
        let staging = self.file_name.with_extension("tmp");
        self.dir
            .write(&staging, encoded)
            .map_err(PreferenceError::io)?;
        self.dir
            .rename(&staging, &self.dir, &self.file_name)
            .map_err(PreferenceError::io)
    }

    fn update_flag(&self, key: &str, value: bool) -> PreferenceResult<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|err| PreferenceError::Lock(err.to_string()))?;
        let mut flags = self.read_flags()?;
        flags.insert(key.to_owned(), value);
        self.write_flags(&flags)
    }
}

#[async_trait]
impl PreferenceStore for JsonFilePreferenceStore {
    async fn load_flag(&self, key: &str) -> PreferenceResult<Option<bool>> {
        let key = key.to_owned();
        self.run_blocking(move |inner| Ok(inner.read_flags()?.get(&key).copied()))
            .await
    }

    async fn store_flag(&self, key: &str, value: bool) -> PreferenceResult<()> {
        let key = key.to_owned();
        self.run_blocking(move |inner| inner.update_flag(&key, value))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    struct FileContext {
        _temp: TempDir,
        path: Utf8PathBuf,
    }

    #[fixture]
    fn context() -> FileContext {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let path = Utf8PathBuf::from_path_buf(temp.path().to_path_buf())
            .expect("temp path should be UTF-8");
        FileContext { _temp: temp, path }
    }

    #[rstest]
    #[tokio::test]
    async fn missing_file_reads_as_unset(context: FileContext) {
        let store =
            JsonFilePreferenceStore::open(&context.path, "prefs.json").expect("dir should open");

        let flag = store
            .load_flag("use_tool_server")
            .await
            .expect("read should succeed");

        assert_eq!(flag, None);
    }

    #[rstest]
    #[tokio::test]
    async fn stored_flag_survives_reopen(context: FileContext) {
        let store =
            JsonFilePreferenceStore::open(&context.path, "prefs.json").expect("dir should open");
        store
            .store_flag("use_tool_server", false)
            .await
            .expect("write should succeed");
        store
            .store_flag("compact_view", true)
            .await
            .expect("write should succeed");

        let reopened =
            JsonFilePreferenceStore::open(&context.path, "prefs.json").expect("dir should open");

        assert_eq!(
            reopened
                .load_flag("use_tool_server")
                .await
                .expect("read should succeed"),
            Some(false)
        );
        assert_eq!(
            reopened
                .load_flag("compact_view")
                .await
                .expect("read should succeed"),
            Some(true)
        );
    }

    #[rstest]
    #[tokio::test]
    async fn corrupt_file_reports_serialization_error(context: FileContext) {
        std::fs::write(context.path.join("prefs.json"), "{not json")
            .expect("fixture file should be written");
        let store =
            JsonFilePreferenceStore::open(&context.path, "prefs.json").expect("dir should open");

        let result = store.load_flag("use_tool_server").await;

        assert!(matches!(result, Err(PreferenceError::Serialization(_))));
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_writes_keep_every_flag(context: FileContext) {
        let store =
            JsonFilePreferenceStore::open(&context.path, "prefs.json").expect("dir should open");
        let writers: Vec<_> = ["alpha", "beta", "gamma", "delta"]
            .into_iter()
            .map(|key| {
                let store = store.clone();
                tokio::spawn(async move { store.store_flag(key, true).await })
            })
            .collect();
        for writer in writers {
            writer
                .await
                .expect("writer should not panic")
                .expect("write should succeed");
        }

        for key in ["alpha", "beta", "gamma", "delta"] {
            assert_eq!(
                store.load_flag(key).await.expect("read should succeed"),
                Some(true)
            );
        }
    }
}
