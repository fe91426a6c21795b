use std::{future::Future, io::ErrorKind, path::PathBuf};

use anyhow::{Context, Result};
use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt},
};
use tracing::{debug, instrument};

use super::entities::Database;

pub const DATABASE_FILE: &str = "commute.json";

/// Interface for abstracting storage of commute data.
pub trait CommuteStore {
    /// Reads a consistent copy of the whole database.
    fn load(&self) -> impl Future<Output = Result<Database>>;

    /// Applies `change` to the stored database while holding exclusive access. Nothing is
    /// written when `change` fails.
    fn update<T, F>(&self, change: F) -> impl Future<Output = Result<T>>
    where
        F: FnOnce(&mut Database) -> Result<T>;
}

/// The main realization of [CommuteStore]. The whole database is one json document guarded by
/// an advisory file lock.
#[derive(Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&dir)?;

        Ok(Self {
            path: dir.join(DATABASE_FILE),
        })
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn parse(&self, content: &str) -> Result<Database> {
        if content.trim().is_empty() {
            return Ok(Database::default());
        }
        serde_json::from_str(content)
            .with_context(|| format!("Data file {:?} is corrupted", self.path))
    }
}

impl CommuteStore for JsonFileStore {
    #[instrument(skip(self))]
    async fn load(&self) -> Result<Database> {
        let mut file = match File::open(&self.path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No data file at {:?}", self.path);
                return Ok(Database::default());
            }
            Err(e) => Err(e)?,
        };
        file.lock_shared()?;
        let mut content = String::new();
        let read = file.read_to_string(&mut content).await;
        file.unlock_async().await?;
        read?;

        self.parse(&content)
    }

    #[instrument(skip(self, change))]
    async fn update<T, F>(&self, change: F) -> Result<T>
    where
        F: FnOnce(&mut Database) -> Result<T>,
    {
        let mut file = File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .await?;

        // Semi-safe acquire-release for a file
        file.lock_exclusive()?;
        let result = Self::update_with_file(self, &mut file, change).await;
        file.unlock_async().await?;
        result
    }
}

impl JsonFileStore {
    async fn update_with_file<T, F>(&self, file: &mut File, change: F) -> Result<T>
    where
        F: FnOnce(&mut Database) -> Result<T>,
    {
        let mut content = String::new();
        file.read_to_string(&mut content).await?;
        let mut database = self.parse(&content)?;

        let value = change(&mut database)?;

        let buffer = serde_json::to_vec_pretty(&database)?;
        // Truncated after writing, an interrupted write never leaves an empty file behind.
        file.rewind().await?;
        file.write_all(&buffer).await?;
        file.set_len(buffer.len() as u64).await?;
        file.flush().await?;
        file.sync_data().await?;
        debug!("Saved {} bytes into {:?}", buffer.len(), self.path);
        Ok(value)
    }
}
