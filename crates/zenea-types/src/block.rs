use bytes::Bytes;

use crate::error::BlockError;
use crate::id::BlockId;

/// An immutable unit of content together with its content-derived identifier.
///
/// Blocks are created transiently per storage operation and never mutated.
/// Content is held as [`Bytes`], so cloning a block is cheap.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Block {
    id: BlockId,
    content: Bytes,
}

impl Block {
    /// Maximum content size of a block in bytes.
    pub const MAX_BYTES: usize = 1 << 16;

    /// Create a block by hashing `content` with the default algorithm.
    pub fn new(content: impl Into<Bytes>) -> Result<Self, BlockError> {
        let content = Self::check_size(content.into())?;
        Ok(Self {
            id: BlockId::from_content(&content),
            content,
        })
    }

    /// Create a block with a pre-computed or claimed identifier.
    ///
    /// The identifier is not verified; call [`Block::matches`] before
    /// trusting a block assembled from untrusted bytes.
    pub fn with_id(id: BlockId, content: impl Into<Bytes>) -> Result<Self, BlockError> {
        let content = Self::check_size(content.into())?;
        Ok(Self { id, content })
    }

    fn check_size(content: Bytes) -> Result<Bytes, BlockError> {
        if content.len() > Self::MAX_BYTES {
            return Err(BlockError::TooLarge {
                size: content.len(),
                max: Self::MAX_BYTES,
            });
        }
        Ok(content)
    }

    pub fn id(&self) -> &BlockId {
        &self.id
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn into_content(self) -> Bytes {
        self.content
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Re-hash the content under `id`'s algorithm and compare with `id`.
    pub fn matches(&self, id: &BlockId) -> bool {
        BlockId::hash_with(id.algorithm(), &self.content) == *id
    }

    /// Whether the block's own identifier matches its content.
    pub fn is_valid(&self) -> bool {
        self.matches(&self.id)
    }
}

impl std::fmt::Debug for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Block")
            .field("id", &self.id)
            .field("len", &self.content.len())
            .finish()
    }
}
