//! Error kinds shared by the codec, the store adapter and the pipelines.
//!
//! The kinds and their negative numeric codes correspond to the
//! `GVC_ERROR_*` table of git_vid_codec.h (memory -1 through thread -7),
//! with integrity failures carried as their own variant under the format
//! code. Every failure in the crate is one of the kinds below; nothing
//! unwinds across component boundaries. Each kind carries a stable numeric
//! code which the CLI binaries print to stderr before exiting non-zero.

use std::fmt;
use std::io;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, GvcError>;

/// All error kinds produced by the codec, store adapter, encoder and player.
#[derive(Debug)]
pub enum GvcError {
    /// An allocation guard tripped (e.g. an object larger than the configured
    /// ceiling). Fatal wherever it occurs.
    Memory(String),
    /// Underlying file or process I/O failed.
    Io(io::Error),
    /// The object store rejected or could not satisfy an operation.
    Store(String),
    /// The entropy codec rejected its input during encoding.
    Compression(String),
    /// A frame record or delta stream violates the wire format.
    Malformed(String),
    /// The display sink failed; fatal to playback.
    Display(String),
    /// A pipeline worker could not be spawned or joined.
    Thread(String),
    /// Payload bytes do not match the recorded checksum, or a decoded
    /// payload has the wrong length. A subset of `Malformed` for callers
    /// that only branch on the numeric code.
    Integrity(String),
}

impl GvcError {
    /// Stable negative numeric code, printed by the CLI on failure.
    /// `Integrity` shares the `Malformed` code; it is the same class of
    /// defect as far as exit reporting is concerned.
    pub fn code(&self) -> i32 {
        match self {
            GvcError::Memory(_) => -1,
            GvcError::Io(_) => -2,
            GvcError::Store(_) => -3,
            GvcError::Compression(_) => -4,
            GvcError::Malformed(_) => -5,
            GvcError::Display(_) => -6,
            GvcError::Thread(_) => -7,
            GvcError::Integrity(_) => -5,
        }
    }

    /// Short kind name used in notifications.
    pub fn kind_name(&self) -> &'static str {
        match self {
            GvcError::Memory(_) => "memory",
            GvcError::Io(_) => "io",
            GvcError::Store(_) => "store",
            GvcError::Compression(_) => "compression",
            GvcError::Malformed(_) => "malformed",
            GvcError::Display(_) => "display",
            GvcError::Thread(_) => "thread",
            GvcError::Integrity(_) => "integrity",
        }
    }

    /// `true` for the kinds a playback pipeline skips per frame rather than
    /// aborting on: a bad record, a failed checksum, or a store read that
    /// could not produce the blob.
    pub fn is_frame_local(&self) -> bool {
        matches!(
            self,
            GvcError::Malformed(_) | GvcError::Integrity(_) | GvcError::Store(_)
        )
    }
}

impl fmt::Display for GvcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GvcError::Memory(msg) => write!(f, "memory error: {msg}"),
            GvcError::Io(e) => write!(f, "io error: {e}"),
            GvcError::Store(msg) => write!(f, "store error: {msg}"),
            GvcError::Compression(msg) => write!(f, "compression error: {msg}"),
            GvcError::Malformed(msg) => write!(f, "malformed record: {msg}"),
            GvcError::Display(msg) => write!(f, "display error: {msg}"),
            GvcError::Thread(msg) => write!(f, "thread error: {msg}"),
            GvcError::Integrity(msg) => write!(f, "integrity failure: {msg}"),
        }
    }
}

impl std::error::Error for GvcError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GvcError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for GvcError {
    fn from(e: io::Error) -> Self {
        GvcError::Io(e)
    }
}

impl From<git2::Error> for GvcError {
    fn from(e: git2::Error) -> Self {
        GvcError::Store(e.message().to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_reference_table() {
        assert_eq!(GvcError::Memory(String::new()).code(), -1);
        assert_eq!(GvcError::Io(io::Error::other("x")).code(), -2);
        assert_eq!(GvcError::Store(String::new()).code(), -3);
        assert_eq!(GvcError::Compression(String::new()).code(), -4);
        assert_eq!(GvcError::Malformed(String::new()).code(), -5);
        assert_eq!(GvcError::Display(String::new()).code(), -6);
        assert_eq!(GvcError::Thread(String::new()).code(), -7);
        // Integrity is reported under the malformed code.
        assert_eq!(GvcError::Integrity(String::new()).code(), -5);
    }

    #[test]
    fn frame_local_kinds() {
        assert!(GvcError::Malformed(String::new()).is_frame_local());
        assert!(GvcError::Integrity(String::new()).is_frame_local());
        assert!(GvcError::Store(String::new()).is_frame_local());
        assert!(!GvcError::Display(String::new()).is_frame_local());
        assert!(!GvcError::Memory(String::new()).is_frame_local());
    }
}
