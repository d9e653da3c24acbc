use std::collections::HashSet;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::{debug, warn};
use valya_types::{Algorithm, BlockId};

use crate::error::{StoreError, StoreResult};
use crate::traits::BlockStore;

const TEMP_PREFIX: &str = ".tmp-";

/// Block store keeping one file per block under a root directory.
///
/// Files are named by the identifier's text form (`sha2-256-<hex>`). Each
/// write lands in its own uniquely named temporary file and is published
/// without overwriting, so a reader never observes a partially written block
/// and racing writers of the same content see `AlreadyExists`.
#[derive(Debug, Clone)]
pub struct DirectoryBlockStore {
    root: PathBuf,
    algorithm: Algorithm,
}

impl DirectoryBlockStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub async fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        Ok(Self {
            root,
            algorithm: Algorithm::Sha2_256,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: &BlockId) -> PathBuf {
        self.root.join(id.to_string())
    }
}

#[async_trait]
impl BlockStore for DirectoryBlockStore {
    async fn list(&self) -> StoreResult<HashSet<BlockId>> {
        let mut ids = HashSet::new();
        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                warn!(name = ?entry.file_name(), "skipping non UTF-8 entry");
                continue;
            };
            if name.starts_with(TEMP_PREFIX) {
                continue;
            }
            match name.parse::<BlockId>() {
                Ok(id) => {
                    ids.insert(id);
                }
                Err(e) => warn!(name, error = %e, "skipping unrecognized entry"),
            }
        }
        Ok(ids)
    }

    async fn check(&self, id: &BlockId) -> StoreResult<bool> {
        Ok(fs::try_exists(self.path_for(id)).await?)
    }

    async fn fetch(&self, id: &BlockId) -> StoreResult<Bytes> {
        let content = match fs::read(self.path_for(id)).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id.clone()))
            }
            Err(e) => return Err(e.into()),
        };
        let computed = BlockId::of(id.algorithm(), &content);
        if &computed != id {
            return Err(StoreError::Corrupt {
                id: id.clone(),
                reason: format!("content hashes to {computed}"),
            });
        }
        Ok(Bytes::from(content))
    }

    async fn put(&self, content: &[u8]) -> StoreResult<BlockId> {
        let id = BlockId::of(self.algorithm, content);
        let path = self.path_for(&id);
        if fs::try_exists(&path).await? {
            return Err(StoreError::AlreadyExists(id));
        }

        let root = self.root.clone();
        let data = content.to_vec();
        let published = tokio::task::spawn_blocking(move || write_new(&root, &path, &data))
            .await
            .map_err(|e| StoreError::Unable(format!("block write task failed: {e}")))??;
        if !published {
            return Err(StoreError::AlreadyExists(id));
        }
        debug!(id = %id, len = content.len(), "block written");
        Ok(id)
    }
}

/// Write `data` to a fresh temp file in `root` and link it at `path`.
/// Returns `false` if `path` already exists; the temp file is removed either way.
fn write_new(root: &Path, path: &Path, data: &[u8]) -> std::io::Result<bool> {
    let mut temp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .tempfile_in(root)?;
    temp.write_all(data)?;
    temp.as_file().sync_data()?;
    match temp.persist_noclobber(path) {
        Ok(_) => Ok(true),
        Err(e) if e.error.kind() == ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(e.error),
    }
}
