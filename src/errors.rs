use std::io;

use uuid::Uuid;

use super::fourcc::FourCC;

/// Broad classification of an [`Error`].
///
/// Every error value belongs to exactly one kind; use [`Error::kind`] when
/// the caller only needs to distinguish classes of failure.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The underlying source or sink failed, or ended early.
    Io,
    /// The file violates the container format.
    Format,
    /// A value does not fit a reserved region or a fixed-width field.
    Capacity,
    /// The operation is not legal in the current session state.
    State,
}

/// Errors returned by methods in this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An `io::Error` occurred
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// The file does not begin with a recognized RIFF, BW64 or RF64 header
    #[error("file is not a RIFF, BW64 or RF64 file")]
    HeaderNotRecognized,

    /// The outer form type is not `WAVE`
    #[error("file is not a WAVE file")]
    NotAWaveFile,

    /// A file with a 64-bit header does not contain the required `ds64`
    /// chunk as its first chunk
    #[error("mandatory ds64 chunk for BW64 or RF64 file not found")]
    MissingRequiredDS64,

    /// A chunk required to complete the operation is not present
    #[error("no chunk with id '{signature}' found")]
    ChunkMissing { signature: FourCC },

    /// A chunk body is smaller than its mandatory fields
    #[error("'{signature}' chunk is too small ({size} bytes)")]
    ChunkTooSmall { signature: FourCC, size: u64 },

    /// A chunk header declares a size extending past the end of the file
    #[error("'{signature}' chunk ends after end of file ({end} > {file_end})")]
    ChunkOutOfBounds {
        signature: FourCC,
        end: u64,
        file_end: u64,
    },

    /// The fmt chunk size disagrees with its cbSize field
    #[error("fmt chunk size {size} is not as specified in cbSize {cb_size}")]
    FmtSizeMismatch { size: u64, cb_size: u16 },

    /// A PCM or IEEE-float fmt chunk carries extra data
    #[error("fmt chunk with format tag {format_tag:#06x} should not have {cb_size} bytes of extra data")]
    UnexpectedExtraData { format_tag: u16, cb_size: u16 },

    /// An extensible fmt chunk has the wrong amount of extra data
    #[error("extensible fmt chunk must have 22 bytes of extra data, but has {cb_size}")]
    ExtensibleExtraDataSize { cb_size: u16 },

    /// The format tag is not PCM, IEEE float or extensible
    #[error("format unsupported: {0:#06x}")]
    UnsupportedFormatTag(u16),

    /// The extensible subformat GUID is neither PCM nor IEEE float
    #[error("subformat unsupported: {0}")]
    UnsupportedSubFormat(Uuid),

    /// The bit depth is not 16, 24 or 32
    #[error("bits per sample must be 16, 24 or 32, but is {0}")]
    UnsupportedBitDepth(u16),

    /// A fmt chunk declares zero channels
    #[error("channel count must not be zero")]
    InvalidChannelCount,

    /// A fmt chunk declares a zero sample rate
    #[error("sample rate must not be zero")]
    InvalidSampleRate,

    /// The blockAlignment stored in the stream disagrees with the value
    /// derived from channel count and bit depth
    #[error("sanity check failed: blockAlignment is {actual} but should be {expected}")]
    BlockAlignmentMismatch { actual: u16, expected: u16 },

    /// The bytesPerSecond stored in the stream disagrees with the value
    /// derived from sample rate and blockAlignment
    #[error("sanity check failed: bytesPerSecond is {actual} but should be {expected}")]
    BytesPerSecondMismatch { actual: u32, expected: u32 },

    /// channelCount × bitsPerSample / 8 does not fit a u16
    #[error("channelCount and bitsPerSample would overflow blockAlignment")]
    BlockAlignmentOverflow {
        channel_count: u16,
        bits_per_sample: u16,
    },

    /// sampleRate × blockAlignment does not fit a u32
    #[error("sampleRate, channelCount and bitsPerSample would overflow bytesPerSecond")]
    BytesPerSecondOverflow {
        sample_rate: u32,
        channel_count: u16,
        bits_per_sample: u16,
    },

    /// A ds64 chunk is too short to hold its declared size table
    #[error("ds64 chunk ({size} bytes) too short to hold {table_length} table entries")]
    Ds64TableTruncated { size: u64, table_length: u32 },

    /// A cue chunk size disagrees with its cue point count
    #[error("cue chunk size {size} does not match {count} cue points")]
    CueCountMismatch { size: u64, count: u32 },

    /// A chna chunk numTracks prefix disagrees with its records
    #[error("chna numTracks is {declared} but records give {actual}")]
    NumTracksMismatch { declared: u16, actual: u16 },

    /// A chna chunk numUids prefix disagrees with its records
    #[error("chna numUids is {declared} but records give {actual}")]
    NumUidsMismatch { declared: u16, actual: u16 },

    /// A chunk does not fit the region reserved for it
    #[error("'{signature}' chunk is too large ({size} bytes) to overwrite reserved region ({reserved} bytes)")]
    ChunkTooLarge {
        signature: FourCC,
        size: u64,
        reserved: u64,
    },

    /// A chna chunk holds more track UIDs than the reserved region admits
    #[error("number of track UIDs is {0}, maximum is 1024")]
    TooManyTrackUids(usize),

    /// A cue point with this id already exists
    #[error("cue point id {0} already exists")]
    DuplicateCuePointId(u32),

    /// No cue region was reserved when the writer was created
    #[error("no cue chunk reserved; create the writer with max_markers > 0")]
    NoCueChunkReserved,

    /// A chna record with track index 0 was written
    #[error("chna track index must not be 0")]
    ZeroTrackIndex,

    /// A sample buffer length disagrees with the frame count and format
    #[error("buffer holds {buffer_size} elements but the operation requires {expected}")]
    InvalidBufferSize { buffer_size: usize, expected: usize },

    /// The writer has already been finalized
    #[error("writer has already been finalized")]
    WriterFinalized,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        use Error::*;
        match self {
            IoError(_) => ErrorKind::Io,

            BlockAlignmentOverflow { .. }
            | BytesPerSecondOverflow { .. }
            | ChunkTooLarge { .. }
            | TooManyTrackUids(_) => ErrorKind::Capacity,

            DuplicateCuePointId(_)
            | NoCueChunkReserved
            | ZeroTrackIndex
            | InvalidBufferSize { .. }
            | WriterFinalized => ErrorKind::State,

            _ => ErrorKind::Format,
        }
    }
}
