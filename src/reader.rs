use std::fs::File;
use std::io::SeekFrom::{Current, End, Start};
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use log::debug;

use super::chunks::{
    AxmlChunk, ChnaChunk, Chunk, ChunkHeader, CueChunk, CuePoint, DataChunk, DataSize64Chunk,
    FormatInfoChunk, ListChunk,
};
use super::errors::Error;
use super::fourcc::{
    FourCC, ReadFourCC, ADTL_SIG, BW64_SIG, CHNA_SIG, CUE__SIG, DATA_SIG, DS64_SIG, FMT__SIG,
    RF64_SIG, RIFF_SIG, WAVE_SIG,
};
use super::parser::{parse_chunk, parse_data_size64_chunk};
use super::sample::{decode_float_samples, decode_pcm_samples};

/// Resolve a chunk's effective size, applying the ds64 overlay when one is
/// present and carries an entry for this chunk id.
fn resolve_size(ds64: Option<&DataSize64Chunk>, id: FourCC, raw_size: u64) -> u64 {
    if let Some(ds64) = ds64 {
        if id == DATA_SIG {
            return ds64.data_size();
        }
        if let Some(size) = ds64.chunk_size(id) {
            return size;
        }
    }
    raw_size
}

/**
 * BW64, RF64 and plain RIFF/WAVE file reader.
 *
 * Opening a file parses the entire header structure in one pass: the outer
 * form header, the mandatory `ds64` chunk of a 64-bit file, every chunk
 * header to the end of the file, and every chunk body. Afterwards the
 * reader exposes random-access, frame-addressed sample reads against the
 * data chunk, and typed access to the metadata chunks.
 *
 * ```
 * use std::io::Cursor;
 * use bw64file::{Bw64Writer, Bw64Reader, WriterConfig};
 *
 * let mut file = Cursor::new(vec![0u8; 0]);
 * let mut writer = Bw64Writer::new(&mut file, WriterConfig::default(), vec![]).unwrap();
 * writer.write(&[0.0f32; 48], 48).unwrap();
 * writer.close().unwrap();
 * drop(writer);
 *
 * let mut reader = Bw64Reader::new(file).unwrap();
 * assert_eq!(reader.channels(), 1);
 * assert_eq!(reader.number_of_frames(), 48);
 * ```
 */
#[derive(Debug)]
pub struct Bw64Reader<R: Read + Seek> {
    inner: R,
    file_format: FourCC,
    file_size: u32,
    format: FormatInfoChunk,
    data_size: u64,
    data_start: u64,
    chunks: Vec<Chunk>,
    chunk_headers: Vec<ChunkHeader>,
    raw_buffer: Vec<u8>,
}

impl Bw64Reader<File> {
    /// Open a file for reading.
    ///
    /// A convenience that opens `path` and calls `Self::new()`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let inner = File::open(path)?;
        Self::new(inner)
    }
}

impl<R: Read + Seek> Bw64Reader<R> {
    /**
     * Wrap a seekable stream in a new `Bw64Reader`.
     *
     * The stream is parsed immediately; an `Err` is returned for any
     * structural inconsistency that makes the stream unreadable, including
     * a missing `fmt ` or `data` chunk.
     */
    pub fn new(inner: R) -> Result<Self, Error> {
        let mut stream = inner;
        stream.seek(Start(0))?;

        let file_format = stream.read_fourcc()?;
        let file_size = stream.read_u32::<LittleEndian>()?;
        let form_type = stream.read_fourcc()?;

        if file_format != RIFF_SIG && file_format != BW64_SIG && file_format != RF64_SIG {
            return Err(Error::HeaderNotRecognized);
        }
        if form_type != WAVE_SIG {
            return Err(Error::NotAWaveFile);
        }

        let mut chunk_headers: Vec<ChunkHeader> = vec![];
        let mut chunks: Vec<Chunk> = vec![];
        let mut ds64: Option<DataSize64Chunk> = None;

        if file_format == BW64_SIG || file_format == RF64_SIG {
            // the ds64 chunk must come first; its sizes are needed to
            // interpret the rest of the headers
            let position = stream.stream_position()?;
            let id = stream.read_fourcc()?;
            let size = stream.read_u32::<LittleEndian>()? as u64;
            if id != DS64_SIG {
                return Err(Error::MissingRequiredDS64);
            }
            let parsed = parse_data_size64_chunk(&mut stream, size)?;
            chunk_headers.push(ChunkHeader::new(id, size, position));
            ds64 = Some(parsed.clone());
            chunks.push(Chunk::DataSize64(parsed));
        }

        let scan_from = stream.stream_position()?;
        let file_end = stream.seek(End(0))?;
        stream.seek(Start(scan_from))?;

        while stream.stream_position()? + 8 <= file_end {
            let position = stream.stream_position()?;
            let id = stream.read_fourcc()?;
            let raw_size = stream.read_u32::<LittleEndian>()? as u64;
            let size = resolve_size(ds64.as_ref(), id, raw_size);

            let chunk_end = position + 8 + size;
            if chunk_end > file_end {
                return Err(Error::ChunkOutOfBounds {
                    signature: id,
                    end: chunk_end,
                    file_end,
                });
            }
            chunk_headers.push(ChunkHeader::new(id, size, position));

            // a pad byte follows an odd-sized body, except at the end of
            // the file, where a lone pad byte may be absent
            let mut displacement = size;
            if size % 2 == 1 && chunk_end < file_end {
                displacement += 1;
            }
            stream.seek(Current(displacement as i64))?;
        }

        for header in &chunk_headers {
            if header.id == DS64_SIG {
                continue;
            }
            chunks.push(parse_chunk(&mut stream, header)?);
        }

        let format = chunks
            .iter()
            .find_map(|c| c.as_format_info())
            .ok_or(Error::ChunkMissing {
                signature: FMT__SIG,
            })?
            .clone();

        let data_header = chunk_headers
            .iter()
            .find(|h| h.id == DATA_SIG)
            .copied()
            .ok_or(Error::ChunkMissing {
                signature: DATA_SIG,
            })?;

        // join labl sub-chunks onto their cue points by id
        let labels: Vec<(u32, String)> = chunks
            .iter()
            .filter_map(|c| c.as_list())
            .filter(|l| l.list_type() == ADTL_SIG)
            .flat_map(|l| l.sub_chunks().iter().filter_map(|s| s.as_label()))
            .map(|l| (l.cue_point_id(), l.label().to_string()))
            .collect();

        for chunk in chunks.iter_mut() {
            if let Chunk::Cue(cue) = chunk {
                for cue_point in cue.cue_points_mut() {
                    if let Some((_, text)) = labels.iter().find(|(id, _)| *id == cue_point.id) {
                        cue_point.label = text.clone();
                    }
                }
            }
        }

        debug!(
            "opened {} file: {} chunks, {} ch, {} Hz, {} bit",
            String::from(file_format),
            chunk_headers.len(),
            format.channel_count(),
            format.sample_rate(),
            format.bits_per_sample()
        );

        let mut reader = Bw64Reader {
            inner: stream,
            file_format,
            file_size,
            format,
            data_size: data_header.size,
            data_start: data_header.position + 8,
            chunks,
            chunk_headers,
            raw_buffer: vec![],
        };
        reader.seek(SeekFrom::Start(0))?;
        Ok(reader)
    }

    /// The outer container id: `RIFF`, `BW64` or `RF64`.
    pub fn file_format(&self) -> FourCC {
        self.file_format
    }

    /// The raw 32-bit outer size field. `0xFFFFFFFF` for 64-bit files,
    /// whose true size is in the ds64 chunk.
    pub fn file_size(&self) -> u32 {
        self.file_size
    }

    pub fn format_tag(&self) -> u16 {
        self.format.format_tag()
    }

    pub fn channels(&self) -> u16 {
        self.format.channel_count()
    }

    pub fn sample_rate(&self) -> u32 {
        self.format.sample_rate()
    }

    pub fn bit_depth(&self) -> u16 {
        self.format.bits_per_sample()
    }

    /// Byte size of one frame across all channels.
    pub fn block_alignment(&self) -> u16 {
        self.format.block_alignment()
    }

    /// The count of audio frames in the data chunk. Bytes beyond the last
    /// whole frame are ignored.
    pub fn number_of_frames(&self) -> u64 {
        self.data_size / self.format.block_alignment() as u64
    }

    /// Headers of all chunks present in the file, in file order.
    pub fn chunks(&self) -> &[ChunkHeader] {
        &self.chunk_headers
    }

    pub fn has_chunk(&self, id: FourCC) -> bool {
        self.chunk_headers.iter().any(|h| h.id == id)
    }

    fn chunk_with_id(&self, id: FourCC) -> Option<&Chunk> {
        self.chunks.iter().find(|c| c.id() == id)
    }

    pub fn ds64_chunk(&self) -> Option<&DataSize64Chunk> {
        self.chunk_with_id(DS64_SIG)?.as_data_size64()
    }

    pub fn format_chunk(&self) -> &FormatInfoChunk {
        &self.format
    }

    pub fn data_chunk(&self) -> Option<&DataChunk> {
        self.chunk_with_id(DATA_SIG)?.as_data()
    }

    pub fn chna_chunk(&self) -> Option<&ChnaChunk> {
        self.chunk_with_id(CHNA_SIG)?.as_chna()
    }

    pub fn axml_chunk(&self) -> Option<&AxmlChunk> {
        self.chunk_with_id(super::fourcc::AXML_SIG)?.as_axml()
    }

    pub fn cue_chunk(&self) -> Option<&CueChunk> {
        self.chunk_with_id(CUE__SIG)?.as_cue()
    }

    /// All `LIST` chunks in the file.
    pub fn list_chunks(&self) -> Vec<&ListChunk> {
        self.chunks.iter().filter_map(|c| c.as_list()).collect()
    }

    /// The size of the data chunk in bytes.
    pub fn data_size(&self) -> u64 {
        self.data_size
    }

    /// All cue points with their labels attached, ordered as stored
    /// (ascending by position for files this library writes).
    pub fn get_markers(&self) -> Vec<CuePoint> {
        match self.cue_chunk() {
            Some(cue) => cue.cue_points().to_vec(),
            None => vec![],
        }
    }

    /// Find a cue point by its id.
    pub fn find_marker_by_id(&self, id: u32) -> Option<&CuePoint> {
        self.cue_chunk()?.cue_points().iter().find(|cp| cp.id == id)
    }

    /**
     * Seek to a frame position in the data chunk.
     *
     * The target is clamped to `[0, number_of_frames()]`; the clamped frame
     * index is returned.
     */
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64, Error> {
        let frame_count = self.number_of_frames() as i64;

        let target = match pos {
            SeekFrom::Start(offset) => offset.min(i64::MAX as u64) as i64,
            SeekFrom::Current(offset) => self.tell()? as i64 + offset,
            SeekFrom::End(offset) => frame_count + offset,
        };
        let frame = target.clamp(0, frame_count) as u64;

        let byte_position = self.data_start + frame * self.format.block_alignment() as u64;
        self.inner.seek(Start(byte_position))?;
        Ok(frame)
    }

    /// The current frame position in the data chunk.
    pub fn tell(&mut self) -> Result<u64, Error> {
        let position = self.inner.stream_position()?;
        Ok(position.saturating_sub(self.data_start) / self.format.block_alignment() as u64)
    }

    /// True once every frame has been read.
    pub fn eof(&mut self) -> Result<bool, Error> {
        Ok(self.tell()? == self.number_of_frames())
    }

    /**
     * Read frames into a float buffer, transcoding from the file's sample
     * format.
     *
     * `frames` is clamped to the frames remaining; the count actually read
     * is returned. `buffer` must hold at least `frames × channels()`
     * samples.
     */
    pub fn read(&mut self, buffer: &mut [f32], frames: u64) -> Result<u64, Error> {
        let remaining = self.number_of_frames().saturating_sub(self.tell()?);
        let frames = frames.min(remaining);
        let sample_count = frames as usize * self.format.channel_count() as usize;
        if buffer.len() < sample_count {
            return Err(Error::InvalidBufferSize {
                buffer_size: buffer.len(),
                expected: sample_count,
            });
        }
        if frames == 0 {
            return Ok(0);
        }

        let byte_count = frames as usize * self.format.block_alignment() as usize;
        self.raw_buffer.resize(byte_count, 0);
        self.inner.read_exact(&mut self.raw_buffer)?;

        let bits = self.format.bits_per_sample();
        if self.format.is_float() {
            decode_float_samples(&self.raw_buffer, &mut buffer[..sample_count], bits)?;
        } else {
            decode_pcm_samples(&self.raw_buffer, &mut buffer[..sample_count], bits)?;
        }
        Ok(frames)
    }

    /**
     * Read frames as raw bytes in the file's native sample layout,
     * bypassing the transcoder.
     *
     * `buffer` must be exactly `frames × block_alignment()` bytes; the
     * frame count actually read (clamped to the frames remaining) is
     * returned.
     */
    pub fn read_raw(&mut self, buffer: &mut [u8], frames: u64) -> Result<u64, Error> {
        let expected = frames as usize * self.format.block_alignment() as usize;
        if buffer.len() != expected {
            return Err(Error::InvalidBufferSize {
                buffer_size: buffer.len(),
                expected,
            });
        }

        let remaining = self.number_of_frames().saturating_sub(self.tell()?);
        let frames = frames.min(remaining);
        let byte_count = frames as usize * self.format.block_alignment() as usize;
        if byte_count > 0 {
            self.inner.read_exact(&mut buffer[..byte_count])?;
        }
        Ok(frames)
    }

    /// Release the underlying stream.
    pub fn close(self) -> Result<(), Error> {
        Ok(())
    }

    /// Unwrap the inner stream.
    pub fn into_inner(self) -> R {
        self.inner
    }
}
