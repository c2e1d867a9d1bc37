//! Mapping between block identifiers and the sharded on-disk layout.
//!
//! ```text
//! <base>/blocks/<hex[0:2]>/<hex[2:4]>/<hex[4:]>
//! ```

use std::path::{Path, PathBuf};

use zenea_types::{Algorithm, BlockId};

/// Name of the directory under the base path that holds all shards.
pub const BLOCKS_DIR: &str = "blocks";

/// Number of digest bytes consumed by the two directory levels.
const SHARD_BYTES: usize = 2;

/// Path of the file holding the block `id`, rooted at `blocks_dir`.
pub fn block_path(blocks_dir: &Path, id: &BlockId) -> PathBuf {
    let hex = id.to_hex();
    blocks_dir.join(&hex[0..2]).join(&hex[2..4]).join(&hex[4..])
}

/// Parse a first- or second-level shard directory name.
pub fn parse_shard(name: &str) -> Option<u8> {
    match decode_lower_hex(name, 1)?.as_slice() {
        [byte] => Some(*byte),
        _ => None,
    }
}

/// Parse a leaf file name into the remaining digest bytes.
pub fn parse_leaf(name: &str) -> Option<Vec<u8>> {
    decode_lower_hex(name, Algorithm::Sha2_256.digest_len() - SHARD_BYTES)
}

/// Reassemble an identifier from its three path fragments.
pub fn assemble(first: u8, second: u8, rest: &[u8]) -> Option<BlockId> {
    let mut digest = Vec::with_capacity(SHARD_BYTES + rest.len());
    digest.push(first);
    digest.push(second);
    digest.extend_from_slice(rest);
    BlockId::new(Algorithm::Sha2_256, &digest).ok()
}

/// Decode `name` as exactly `len` bytes of lowercase hex.
///
/// Uppercase names are rejected: the store never writes them, so they are
/// foreign files.
fn decode_lower_hex(name: &str, len: usize) -> Option<Vec<u8>> {
    if name.len() != len * 2 || !name.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
        return None;
    }
    hex::decode(name).ok()
}
