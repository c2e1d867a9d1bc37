//! Union/fallback policy shared by [`StorageList`](crate::StorageList) and
//! [`StoragePair`](crate::StoragePair).

use std::fmt;

use tracing::{debug, warn};
use zenea_types::{Block, BlockId};

use crate::error::{CheckError, FetchError, PutError};

/// Folds `check_block` answers from sources tried in order.
pub(crate) struct CheckFallback {
    answered: bool,
    last_error: Option<CheckError>,
}

impl CheckFallback {
    pub(crate) fn new() -> Self {
        Self {
            answered: false,
            last_error: None,
        }
    }

    /// Record one source's answer. Returns `true` once the block is found.
    pub(crate) fn offer(&mut self, result: Result<bool, CheckError>) -> bool {
        match result {
            Ok(true) => true,
            Ok(false) => {
                self.answered = true;
                false
            }
            Err(err) => {
                self.last_error = Some(err);
                false
            }
        }
    }

    /// Outcome when no source reported the block.
    pub(crate) fn finish(self) -> Result<bool, CheckError> {
        match self.last_error {
            Some(err) if !self.answered => Err(err),
            _ => Ok(false),
        }
    }
}

/// Folds `fetch_block` results from sources tried in order.
///
/// Invalid content is never accepted and, once seen, is the error reported
/// if no later source succeeds.
pub(crate) struct FetchFallback<'a> {
    id: &'a BlockId,
    last_error: FetchError,
    saw_invalid: bool,
}

impl<'a> FetchFallback<'a> {
    pub(crate) fn new(id: &'a BlockId) -> Self {
        Self {
            id,
            last_error: FetchError::NotFound,
            saw_invalid: false,
        }
    }

    /// Record one source's result. Returns the block if it is acceptable.
    pub(crate) fn offer(
        &mut self,
        source: &(dyn fmt::Display + Sync),
        result: Result<Block, FetchError>,
    ) -> Option<Block> {
        let err = match result {
            Ok(block) if block.matches(self.id) => return Some(block),
            Ok(_) => FetchError::InvalidContent,
            Err(err) => err,
        };
        if err == FetchError::InvalidContent {
            warn!(id = %self.id, source = %source, "source returned invalid content, trying next");
            self.saw_invalid = true;
        } else {
            debug!(id = %self.id, source = %source, error = %err, "fetch fell through");
        }
        self.last_error = err;
        None
    }

    pub(crate) fn finish(self) -> FetchError {
        if self.saw_invalid {
            FetchError::InvalidContent
        } else {
            self.last_error
        }
    }
}

/// Log a put that a source refused. `Exists` is not a refusal.
///
/// Returns `true` if the put failed.
pub(crate) fn warn_put_failure(
    source: &(dyn fmt::Display + Sync),
    result: &Result<Block, PutError>,
) -> bool {
    match result {
        Err(err) if err.existing().is_none() => {
            warn!(source = %source, error = %err, "put not replicated to source");
            true
        }
        _ => false,
    }
}

/// Fold the results of a put fanned out to every source, in source order.
///
/// The most recent literal success wins; failing that, the most recent
/// `Exists`. If no source accepted the content the put is `Unable`, except
/// that an oversize payload stays `Overflow`.
pub(crate) fn fold_puts<I>(results: I) -> Result<Block, PutError>
where
    I: IntoIterator<Item = Result<Block, PutError>>,
{
    let mut stored = None;
    let mut existing = None;
    let mut overflow = false;

    for result in results {
        match result {
            Ok(block) => stored = Some(block),
            Err(PutError::Exists(block)) => existing = Some(block),
            Err(PutError::Overflow) => overflow = true,
            Err(err) => debug!(error = %err, "put rejected by source"),
        }
    }

    match (stored, existing) {
        (Some(block), _) => Ok(block),
        (None, Some(block)) => Err(PutError::Exists(block)),
        (None, None) if overflow => Err(PutError::Overflow),
        (None, None) => Err(PutError::Unable),
    }
}
