//! Utility functions that don't fit anywhere else.

use crate::{Error, Result};

/// Tracks whether a streaming component may still be used.
///
/// Every component checks its `Lifecycle` on entry to `push` and
/// `done`.  Once finalized, or once an operation failed, the
/// component is dead: any further call returns an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Lifecycle {
    Live,
    Finalized,
    Poisoned(String),
}

impl Default for Lifecycle {
    fn default() -> Self {
        Lifecycle::Live
    }
}

impl Lifecycle {
    /// Fails unless the component is still live.
    pub(crate) fn check(&self) -> Result<()> {
        match self {
            Lifecycle::Live => Ok(()),
            Lifecycle::Finalized => Err(Error::Finalized.into()),
            Lifecycle::Poisoned(e) => Err(Error::Poisoned(e.clone()).into()),
        }
    }

    /// Records the outcome of a `push`-like operation.
    pub(crate) fn guard<T>(&mut self, r: Result<T>) -> Result<T> {
        if let Err(ref e) = r {
            *self = Lifecycle::Poisoned(e.to_string());
        }
        r
    }

    /// Records the outcome of a `done`-like operation.
    pub(crate) fn finish<T>(&mut self, r: Result<T>) -> Result<T> {
        match r {
            Ok(v) => {
                *self = Lifecycle::Finalized;
                Ok(v)
            }
            Err(e) => {
                *self = Lifecycle::Poisoned(e.to_string());
                Err(e)
            }
        }
    }
}

pub(crate) fn read_be_u16(b: &[u8]) -> u16 {
    assert_eq!(b.len(), 2);
    ((b[0] as u16) << 8) | (b[1] as u16)
}

pub(crate) fn read_be_u32(b: &[u8]) -> u32 {
    assert_eq!(b.len(), 4);
    ((b[0] as u32) << 24)
        | ((b[1] as u32) << 16)
        | ((b[2] as u32) <<  8)
        | ((b[3] as u32) <<  0)
}

/// Moves up to `want - buf.len()` octets from the front of `input`
/// into `buf`.
///
/// Returns whether `buf` now holds `want` octets.
pub(crate) fn fill(buf: &mut Vec<u8>, want: usize, input: &mut &[u8]) -> bool {
    let missing = want.saturating_sub(buf.len());
    let n = missing.min(input.len());
    buf.extend_from_slice(&input[..n]);
    *input = &input[n..];
    buf.len() >= want
}
