use std::collections::HashSet;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, warn};
use zenea_store::{BlockContent, BlockStorage, CheckError, FetchError, ListError, PutError};
use zenea_types::{Block, BlockId};

use crate::shard::{self, BLOCKS_DIR};

/// Block storage in a sharded directory tree on the local filesystem.
///
/// Each block is one file holding the raw content, at
/// `<base>/blocks/<hex[0:2]>/<hex[2:4]>/<hex[4:]>`. Shard directories are
/// created on demand. Files are created exclusively, so of several writers
/// racing on the same content exactly one creates the file and the others
/// observe [`PutError::Exists`].
#[derive(Debug, Clone)]
pub struct BlockFs {
    base: PathBuf,
    blocks_dir: PathBuf,
}

impl BlockFs {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        let blocks_dir = base.join(BLOCKS_DIR);
        Self { base, blocks_dir }
    }

    /// Create the `blocks` directory if it does not exist yet.
    ///
    /// Optional: puts create missing directories themselves, but listing an
    /// uninitialized store fails.
    pub async fn init(&self) -> io::Result<()> {
        fs::create_dir_all(&self.blocks_dir).await
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn blocks_dir(&self) -> &Path {
        &self.blocks_dir
    }

    /// Path of the file that holds (or would hold) block `id`.
    pub fn block_path(&self, id: &BlockId) -> PathBuf {
        shard::block_path(&self.blocks_dir, id)
    }

    async fn write_new(&self, path: &Path, block: &Block) -> Result<(), PutError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|err| {
                warn!(path = %parent.display(), error = %err, "cannot create shard directory");
                PutError::Unable
            })?;
        }

        let mut file = match OpenOptions::new().write(true).create_new(true).open(path).await {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                debug!(id = %block.id(), "lost creation race");
                return Err(PutError::Exists(block.clone()));
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "cannot create block file");
                return Err(PutError::Unable);
            }
        };

        if let Err(err) = write_all(&mut file, block.content()).await {
            warn!(
                path = %path.display(),
                error = %err,
                "block write failed, removing partial file"
            );
            drop(file);
            if let Err(err) = fs::remove_file(path).await {
                warn!(path = %path.display(), error = %err, "cannot remove partial block file");
            }
            return Err(PutError::Unable);
        }
        Ok(())
    }
}

async fn write_all(file: &mut File, content: &[u8]) -> io::Result<()> {
    file.write_all(content).await?;
    file.flush().await?;
    file.sync_all().await
}

/// Names of the entries of `dir` whose type is a directory (or a regular
/// file, if `dirs` is false).
async fn scan(dir: &Path, dirs: bool) -> io::Result<Vec<(String, PathBuf)>> {
    let mut entries = fs::read_dir(dir).await?;
    let mut found = Vec::new();
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(err) => {
                debug!(dir = %dir.display(), error = %err, "stopping scan early");
                break;
            }
        };
        let Ok(file_type) = entry.file_type().await else {
            continue;
        };
        let wanted = if dirs { file_type.is_dir() } else { file_type.is_file() };
        if !wanted {
            continue;
        }
        if let Ok(name) = entry.file_name().into_string() {
            found.push((name, entry.path()));
        }
    }
    Ok(found)
}

#[async_trait]
impl BlockStorage for BlockFs {
    async fn list_blocks(&self) -> Result<HashSet<BlockId>, ListError> {
        let level1 = scan(&self.blocks_dir, true).await.map_err(|err| {
            warn!(dir = %self.blocks_dir.display(), error = %err, "cannot open blocks directory");
            ListError::Unable
        })?;

        let mut blocks = HashSet::new();
        for (name1, path1) in level1 {
            let Some(first) = shard::parse_shard(&name1) else {
                continue;
            };
            let Ok(level2) = scan(&path1, true).await else {
                continue;
            };
            for (name2, path2) in level2 {
                let Some(second) = shard::parse_shard(&name2) else {
                    continue;
                };
                let Ok(level3) = scan(&path2, false).await else {
                    continue;
                };
                for (name3, _) in level3 {
                    let id = shard::parse_leaf(&name3)
                        .and_then(|rest| shard::assemble(first, second, &rest));
                    if let Some(id) = id {
                        blocks.insert(id);
                    }
                }
            }
        }
        Ok(blocks)
    }

    async fn check_block(&self, id: &BlockId) -> Result<bool, CheckError> {
        let path = self.block_path(id);
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(true),
            Ok(_) => {
                warn!(path = %path.display(), "block path is not a regular file");
                Err(CheckError::Unable)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "cannot stat block");
                Err(CheckError::Unable)
            }
        }
    }

    async fn fetch_block(&self, id: &BlockId) -> Result<Block, FetchError> {
        let path = self.block_path(id);
        let file = File::open(&path).await.map_err(|err| {
            debug!(%id, error = %err, "block file not opened");
            FetchError::NotFound
        })?;

        // One byte past the ceiling is enough to detect an oversize file.
        let mut content = Vec::new();
        file.take(Block::MAX_BYTES as u64 + 1)
            .read_to_end(&mut content)
            .await
            .map_err(|err| {
                warn!(path = %path.display(), error = %err, "cannot read block");
                FetchError::Unable
            })?;

        let block = Block::with_id(*id, content).map_err(|_| {
            warn!(path = %path.display(), "block file exceeds size ceiling");
            FetchError::InvalidContent
        })?;
        if !block.matches(id) {
            warn!(path = %path.display(), "block file does not match its identifier");
            return Err(FetchError::InvalidContent);
        }
        Ok(block)
    }

    async fn put_block(&self, content: BlockContent) -> Result<Block, PutError> {
        let data = content.read_block_sized().await?;
        let block = Block::new(data).map_err(|_| PutError::Overflow)?;
        let path = self.block_path(block.id());

        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => return Err(PutError::Exists(block)),
            Ok(_) => {
                warn!(path = %path.display(), "directory in the way of block file");
                return Err(PutError::Unable);
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                warn!(path = %path.display(), error = %err, "cannot stat block destination");
                return Err(PutError::Unable);
            }
        }

        self.write_new(&path, &block).await?;
        debug!(id = %block.id(), len = block.len(), "stored block");
        Ok(block)
    }
}

impl fmt::Display for BlockFs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fs:{}", self.base.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn store() -> (TempDir, BlockFs) {
        let dir = TempDir::new().unwrap();
        let fs = BlockFs::new(dir.path());
        fs.init().await.unwrap();
        (dir, fs)
    }

    // -----------------------------------------------------------------------
    // Round trip
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn hello_end_to_end() {
        let (_dir, fs) = store().await;
        let block = fs.put_block("hello".into()).await.unwrap();
        assert_eq!(
            block.id().to_string(),
            "sha2-256-2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert!(fs.check_block(block.id()).await.unwrap());
        assert_eq!(fs.list_blocks().await.unwrap(), HashSet::from([*block.id()]));
        assert_eq!(fs.fetch_block(block.id()).await.unwrap().content().as_ref(), b"hello");
    }

    #[tokio::test]
    async fn file_lands_at_shard_path() {
        let (dir, fs) = store().await;
        let block = fs.put_block("layout".into()).await.unwrap();
        let hex = block.id().to_hex();
        let expected = dir.path().join("blocks").join(&hex[0..2]).join(&hex[2..4]).join(&hex[4..]);
        assert_eq!(fs.block_path(block.id()), expected);
        assert_eq!(std::fs::read(expected).unwrap(), b"layout");
    }

    #[tokio::test]
    async fn round_trip_sizes() {
        let (_dir, fs) = store().await;
        for len in [0usize, 1, 4096, Block::MAX_BYTES] {
            let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
            let block = fs.put_block(data.clone().into()).await.unwrap();
            assert_eq!(fs.fetch_block(block.id()).await.unwrap().content().as_ref(), &data[..]);
        }
    }

    #[tokio::test]
    async fn missing_block() {
        let (_dir, fs) = store().await;
        let id = BlockId::from_content(b"never stored");
        assert!(!fs.check_block(&id).await.unwrap());
        assert_eq!(fs.fetch_block(&id).await, Err(FetchError::NotFound));
    }

    // -----------------------------------------------------------------------
    // Put semantics
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn second_put_reports_exists() {
        let (_dir, fs) = store().await;
        let block = fs.put_block("twice".into()).await.unwrap();
        assert_eq!(fs.put_block("twice".into()).await, Err(PutError::Exists(block)));
    }

    #[tokio::test]
    async fn oversize_put_is_overflow() {
        let (_dir, fs) = store().await;
        let result = fs.put_block(vec![1u8; Block::MAX_BYTES + 1].into()).await;
        assert_eq!(result, Err(PutError::Overflow));
        assert!(fs.list_blocks().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_identical_puts_create_once() {
        let (_dir, fs) = store().await;
        let fs = Arc::new(fs);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let fs = Arc::clone(&fs);
                tokio::spawn(async move { fs.put_block("contended".into()).await })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(PutError::Exists(block)) => assert!(block.is_valid()),
                Err(other) => panic!("unexpected put error: {other}"),
            }
        }
        assert_eq!(created, 1);

        let id = BlockId::from_content(b"contended");
        assert_eq!(fs.fetch_block(&id).await.unwrap().content().as_ref(), b"contended");
    }

    #[tokio::test]
    async fn put_without_init_creates_directories() {
        let dir = TempDir::new().unwrap();
        let fs = BlockFs::new(dir.path().join("fresh"));
        let block = fs.put_block("lazy".into()).await.unwrap();
        assert!(fs.check_block(block.id()).await.unwrap());
    }

    // -----------------------------------------------------------------------
    // Damage
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn corrupted_file_is_invalid_content() {
        let (_dir, fs) = store().await;
        let block = fs.put_block("pristine".into()).await.unwrap();
        std::fs::write(fs.block_path(block.id()), b"Pristine").unwrap();
        assert_eq!(fs.fetch_block(block.id()).await, Err(FetchError::InvalidContent));
    }

    #[tokio::test]
    async fn oversize_file_is_invalid_content() {
        let (_dir, fs) = store().await;
        let block = fs.put_block("small".into()).await.unwrap();
        std::fs::write(fs.block_path(block.id()), vec![0u8; Block::MAX_BYTES + 10]).unwrap();
        assert_eq!(fs.fetch_block(block.id()).await, Err(FetchError::InvalidContent));
    }

    #[tokio::test]
    async fn directory_in_the_way() {
        let (_dir, fs) = store().await;
        let id = BlockId::from_content(b"blocked");
        std::fs::create_dir_all(fs.block_path(&id)).unwrap();
        assert_eq!(fs.check_block(&id).await, Err(CheckError::Unable));
        assert_eq!(fs.put_block("blocked".into()).await, Err(PutError::Unable));
        assert!(fs.fetch_block(&id).await.is_err());
    }

    #[tokio::test]
    async fn file_in_place_of_shard_directory() {
        let (dir, fs) = store().await;
        let id = BlockId::from_content(b"sharded");
        let hex = id.to_hex();
        std::fs::write(dir.path().join("blocks").join(&hex[..2]), b"squatter").unwrap();

        assert_eq!(fs.put_block("sharded".into()).await, Err(PutError::Unable));
        assert_eq!(fs.check_block(&id).await, Err(CheckError::Unable));
        assert_eq!(fs.fetch_block(&id).await, Err(FetchError::NotFound));
        assert!(fs.list_blocks().await.unwrap().is_empty());
    }

    // -----------------------------------------------------------------------
    // Listing
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn list_skips_foreign_entries() {
        let (dir, fs) = store().await;
        let a = fs.put_block("a".into()).await.unwrap();
        let b = fs.put_block("b".into()).await.unwrap();

        let blocks = dir.path().join("blocks");
        std::fs::write(blocks.join("README"), b"not a shard").unwrap();
        std::fs::create_dir_all(blocks.join("zz").join("00")).unwrap();
        std::fs::create_dir_all(blocks.join("AB").join("CD")).unwrap();
        std::fs::write(blocks.join("AB").join("CD").join("0".repeat(60)), b"").unwrap();
        std::fs::create_dir_all(blocks.join("00").join("00")).unwrap();
        std::fs::write(blocks.join("00").join("00").join("short"), b"").unwrap();
        std::fs::create_dir_all(blocks.join("00").join("11").join("0".repeat(60))).unwrap();

        assert_eq!(fs.list_blocks().await.unwrap(), HashSet::from([*a.id(), *b.id()]));
    }

    #[tokio::test]
    async fn list_missing_root_is_unable() {
        let dir = TempDir::new().unwrap();
        let fs = BlockFs::new(dir.path().join("absent"));
        assert_eq!(fs.list_blocks().await, Err(ListError::Unable));
    }

    #[test]
    fn description() {
        let fs = BlockFs::new("/var/lib/zenea");
        assert_eq!(fs.to_string(), "fs:/var/lib/zenea");
    }
}
