//! # bw64file
//!
//! Rust reader/writer for Broadcast Wave 64 (BW64/RF64) files with ADM
//! metadata support
//!
//! Files are opened for random-access decoding of interleaved float
//! samples, or created in streaming mode where the payload size is unknown
//! until the file is closed. Files that outgrow 32-bit sizes are promoted
//! to BW64/RF64 with a `ds64` chunk at close; the ADM `axml` and `chna`
//! chunks are carried alongside the audio, and cue points with `labl` text
//! are exposed through a marker interface.
//!
//!
//! ## Resources
//!
//! ### Implementation of 64-bit Wave Files
//! - [ITU-R 2088][itu2088] (October 2019), "Long-form file format for the international exchange of audio programme materials with metadata"
//!   - Presently in force, adopted by the EBU in [EBU Tech 3306v2][ebu3306v2] (June 2018).
//! - [EBU Tech 3306v1][ebu3306v1] (July 2009), "MBWF / RF64: An extended File Format for Audio"
//!   - No longer in force, however long-established.
//!
//! ### Implementation of Wave format `fmt ` chunk
//! - [MSDN WAVEFORMATEX](https://docs.microsoft.com/en-us/windows/win32/api/mmeapi/ns-mmeapi-waveformatex)
//! - [MSDN WAVEFORMATEXTENSIBLE](https://docs.microsoft.com/en-us/windows/win32/api/mmreg/ns-mmreg-waveformatextensible)
//!
//! ### Other resources
//! - [RFC 2361][rfc2361] (June 1998) "WAVE and AVI Codec Registries"
//! - [Peter Kabal, McGill University](http://www-mmsp.ece.mcgill.ca/Documents/AudioFormats/WAVE/WAVE.html)
//!   - [Multimedia Programming Interface and Data Specifications 1.0](http://www-mmsp.ece.mcgill.ca/Documents/AudioFormats/WAVE/Docs/riffmci.pdf)
//! - IBM Corporation and Microsoft Corporation, (August 1991)
//!
//!
//! [ebu3306v1]: https://tech.ebu.ch/docs/tech/tech3306v1_1.pdf
//! [ebu3306v2]:  https://tech.ebu.ch/docs/tech/tech3306.pdf
//! [itu2088]:  https://www.itu.int/dms_pubrec/itu-r/rec/bs/R-REC-BS.2088-1-201910-I!!PDF-E.pdf
//! [rfc2361]:  https://tools.ietf.org/html/rfc2361

mod common_format;
mod errors;
mod fourcc;

mod chunks;
mod parser;
mod sample;

mod reader;
mod writer;

use std::fs::File;
use std::path::Path;

pub use chunks::{
    AudioId, AxmlChunk, ChnaChunk, Chunk, ChunkHeader, CueChunk, CuePoint, DataChunk,
    DataSize64Chunk, ExtraData, FormatInfoChunk, LabelChunk, ListChunk, UnknownChunk,
};
pub use common_format::{
    subformat_data1, KSDATAFORMAT_SUBTYPE_IEEE_FLOAT, KSDATAFORMAT_SUBTYPE_PCM, BASIC_EXTENSIBLE,
    BASIC_FLOAT, BASIC_PCM,
};
pub use errors::{Error, ErrorKind};
pub use fourcc::{
    FourCC, ADTL_SIG, AXML_SIG, BW64_SIG, CHNA_SIG, CUE__SIG, DATA_SIG, DS64_SIG, FMT__SIG,
    JUNK_SIG, LABL_SIG, LIST_SIG, RF64_SIG, RIFF_SIG, WAVE_SIG,
};
pub use parser::parse_chunk;
pub use reader::Bw64Reader;
pub use sample::{
    decode_float_samples, decode_pcm_samples, encode_float_samples, encode_pcm_samples,
};
pub use writer::{Bw64Writer, WriterConfig, MAX_NUMBER_OF_UIDS};

/// Open a file for reading.
///
/// The whole header structure is parsed up front; see [`Bw64Reader`].
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Bw64Reader<File>, Error> {
    Bw64Reader::open(path)
}

/// Create a file for writing, with optional `chna` and `axml` chunks.
///
/// When given, the metadata chunks are placed *before* the data chunk,
/// which is the recommended practice when all components are known before
/// the samples are written. See [`Bw64Writer`].
pub fn write_file<P: AsRef<Path>>(
    path: P,
    channels: u16,
    sample_rate: u32,
    bit_depth: u16,
    chna: Option<ChnaChunk>,
    axml: Option<AxmlChunk>,
) -> Result<Bw64Writer<File>, Error> {
    let mut pre_data_chunks = vec![];
    if let Some(chna) = chna {
        pre_data_chunks.push(Chunk::Chna(chna));
    }
    if let Some(axml) = axml {
        pre_data_chunks.push(Chunk::Axml(axml));
    }

    let config = WriterConfig {
        channels,
        sample_rate,
        bit_depth,
        ..WriterConfig::default()
    };
    Bw64Writer::create(path, config, pre_data_chunks)
}

/// Create a file for writing with full control over the format and the
/// marker reservation.
///
/// If `pre_data_chunks` carries no `chna` chunk, a default one-UID-per-
/// channel allocation is generated, so the file is a self-contained ADM
/// BW64 file out of the box.
pub fn write_file_with_config<P: AsRef<Path>>(
    path: P,
    config: WriterConfig,
    mut pre_data_chunks: Vec<Chunk>,
) -> Result<Bw64Writer<File>, Error> {
    if !pre_data_chunks.iter().any(|c| c.id() == CHNA_SIG) {
        pre_data_chunks.push(Chunk::Chna(ChnaChunk::default_layout(config.channels)));
    }
    Bw64Writer::create(path, config, pre_data_chunks)
}
