use std::fs::File;
use std::io::SeekFrom::{End, Start};
use std::io::{Seek, Write};
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};
use log::debug;

use super::chunks::{
    AxmlChunk, ChnaChunk, Chunk, ChunkHeader, CueChunk, CuePoint, DataChunk, DataSize64Chunk,
    ExtraData, FormatInfoChunk, LabelChunk, ListChunk,
};
use super::common_format::{
    KSDATAFORMAT_SUBTYPE_IEEE_FLOAT, KSDATAFORMAT_SUBTYPE_PCM, BASIC_EXTENSIBLE, BASIC_FLOAT,
    BASIC_PCM,
};
use super::errors::Error;
use super::fourcc::{
    FourCC, WriteFourCC, ADTL_SIG, BW64_SIG, CHNA_SIG, CUE__SIG, DATA_SIG, JUNK_SIG, RF64_SIG,
    RIFF_SIG, WAVE_SIG,
};
use super::sample::{encode_float_samples, encode_pcm_samples};

/// Capacity of the `chna` region reserved ahead of the data chunk.
pub const MAX_NUMBER_OF_UIDS: u32 = 1024;

fn clamped_size(size: u64) -> u32 {
    size.min(u32::MAX as u64) as u32
}

/// Ensure the channel mask names at least one speaker per channel, filling
/// unset low bits upward when the caller's mask falls short.
fn correct_channel_mask(mask: u32, channels: u16) -> u32 {
    let mut mask = mask;
    for bit in 0..32 {
        if mask.count_ones() >= channels as u32 {
            break;
        }
        mask |= 1 << bit;
    }
    mask
}

/// Options for a new [`Bw64Writer`].
#[derive(Debug, Clone)]
pub struct WriterConfig {
    pub channels: u16,
    pub sample_rate: u32,
    pub bit_depth: u16,
    /// Emit a `WAVE_FORMAT_EXTENSIBLE` format chunk with a channel mask and
    /// subformat GUID.
    pub use_extensible: bool,
    /// Store IEEE-float samples instead of integer PCM.
    pub use_float: bool,
    /// Speaker assignment mask for the extensible format chunk.
    pub channel_mask: u32,
    /// Reserve a cue region for up to this many markers.
    pub max_markers: u32,
    /// Label an oversize file `RF64` rather than `BW64`.
    pub use_rf64_id: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        WriterConfig {
            channels: 1,
            sample_rate: 48000,
            bit_depth: 24,
            use_extensible: false,
            use_float: false,
            channel_mask: 0,
            max_markers: 0,
            use_rf64_id: false,
        }
    }
}

/**
 * BW64/RF64 file writer.
 *
 * Construction writes the file skeleton: the outer header, a `JUNK`
 * reservation large enough for a `ds64` chunk, the format chunk, any
 * caller-supplied pre-data chunks, an optional cue reservation, a `chna`
 * reservation, and the data chunk header. Interleaved float samples are
 * then streamed with [`write`](Bw64Writer::write), and
 * [`close`](Bw64Writer::close) rewrites the placeholders in place, appends
 * the queued post-data chunks and settles the outer header, promoting the
 * file to BW64 or RF64 when it outgrew 32-bit sizes.
 *
 * Dropping the writer finalizes defensively, but errors are suppressed on
 * that path; call `close()` to observe them.
 */
pub struct Bw64Writer<W: Write + Seek> {
    sink: W,
    format: FormatInfoChunk,
    chunks: Vec<Chunk>,
    chunk_headers: Vec<ChunkHeader>,
    cue: Option<CueChunk>,
    data_size: u64,
    post_data_chunks: Vec<Chunk>,
    raw_buffer: Vec<u8>,
    use_rf64_id: bool,
    finalized: bool,
}

impl Bw64Writer<File> {
    /// Create a new file at `path`, truncating any existing file.
    pub fn create<P: AsRef<Path>>(
        path: P,
        config: WriterConfig,
        pre_data_chunks: Vec<Chunk>,
    ) -> Result<Self, Error> {
        let sink = File::create(path)?;
        Self::new(sink, config, pre_data_chunks)
    }
}

impl<W: Write + Seek> Bw64Writer<W> {
    /**
     * Wrap a seekable sink in a new `Bw64Writer` and write the file
     * skeleton to it.
     *
     * `pre_data_chunks` are written between the format chunk and the data
     * chunk, in order. If none of them is a `chna` chunk, a `chna` region
     * sized for [`MAX_NUMBER_OF_UIDS`] records is reserved for
     * [`set_chna_chunk`](Bw64Writer::set_chna_chunk).
     */
    pub fn new(mut sink: W, config: WriterConfig, pre_data_chunks: Vec<Chunk>) -> Result<Self, Error> {
        // outer header; id and size are settled at close
        sink.write_fourcc(RIFF_SIG)?;
        sink.write_u32::<LittleEndian>(u32::MAX)?;
        sink.write_fourcc(WAVE_SIG)?;

        let format = if config.use_extensible {
            let channel_mask = correct_channel_mask(config.channel_mask, config.channels);
            let sub_format = if config.use_float {
                KSDATAFORMAT_SUBTYPE_IEEE_FLOAT
            } else {
                KSDATAFORMAT_SUBTYPE_PCM
            };
            FormatInfoChunk::new(
                config.channels,
                config.sample_rate,
                config.bit_depth,
                Some(ExtraData::new(config.bit_depth, channel_mask, sub_format)),
                BASIC_EXTENSIBLE,
            )?
        } else {
            FormatInfoChunk::new(
                config.channels,
                config.sample_rate,
                config.bit_depth,
                None,
                if config.use_float {
                    BASIC_FLOAT
                } else {
                    BASIC_PCM
                },
            )?
        };

        let mut writer = Bw64Writer {
            sink,
            format: format.clone(),
            chunks: vec![],
            chunk_headers: vec![],
            cue: None,
            data_size: 0,
            post_data_chunks: vec![],
            raw_buffer: vec![],
            use_rf64_id: config.use_rf64_id,
            finalized: false,
        };

        // 28 byte ds64 header + one 12 byte table slot for axml
        writer.write_chunk_placeholder(JUNK_SIG, 40)?;

        writer.commit_chunk(Chunk::FormatInfo(format))?;

        for chunk in pre_data_chunks {
            writer.commit_chunk(chunk)?;
        }

        if config.max_markers > 0 {
            // reserve on-disk space for the cue chunk; its logical content
            // lives in `cue` and is rewritten over the reservation at close
            let placeholder =
                CueChunk::new(vec![CuePoint::default(); config.max_markers as usize]);
            writer.emit_chunk(&Chunk::Cue(placeholder))?;
            writer.cue = Some(CueChunk::default());
        }

        if !writer.has_chunk(CHNA_SIG) {
            writer.write_chunk_placeholder(CHNA_SIG, MAX_NUMBER_OF_UIDS * 40 + 4)?;
        }

        writer.commit_chunk(Chunk::Data(DataChunk::new()))?;

        Ok(writer)
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

    pub fn format_chunk(&self) -> &FormatInfoChunk {
        &self.format
    }

    /// Count of frames written so far.
    pub fn frames_written(&self) -> u64 {
        self.data_size / self.format.block_alignment() as u64
    }

    pub fn has_chunk(&self, id: FourCC) -> bool {
        self.chunk_headers.iter().any(|h| h.id == id)
    }

    pub fn chna_chunk(&self) -> Option<&ChnaChunk> {
        self.chunks.iter().find_map(|c| c.as_chna())
    }

    pub fn axml_chunk(&self) -> Option<&AxmlChunk> {
        self.chunks
            .iter()
            .chain(self.post_data_chunks.iter())
            .find_map(|c| c.as_axml())
    }

    pub fn cue_chunk(&self) -> Option<&CueChunk> {
        self.cue.as_ref()
    }

    /// Queue a chunk to be written after the data chunk at close.
    pub fn post_data_chunk(&mut self, chunk: Chunk) -> Result<(), Error> {
        self.check_open()?;
        self.post_data_chunks.push(chunk);
        Ok(())
    }

    /// Queue an `axml` chunk to be written after the data chunk at close.
    pub fn set_axml_chunk(&mut self, chunk: AxmlChunk) -> Result<(), Error> {
        self.post_data_chunk(Chunk::Axml(chunk))
    }

    /**
     * Overwrite the reserved `chna` region with the given chunk.
     *
     * Fails with a capacity error when the chunk holds more than
     * [`MAX_NUMBER_OF_UIDS`] records.
     */
    pub fn set_chna_chunk(&mut self, chunk: ChnaChunk) -> Result<(), Error> {
        self.check_open()?;
        if chunk.audio_ids().len() > MAX_NUMBER_OF_UIDS as usize {
            return Err(Error::TooManyTrackUids(chunk.audio_ids().len()));
        }

        let last_position = self.sink.stream_position()?;
        self.overwrite_chunk(CHNA_SIG, &Chunk::Chna(chunk.clone()))?;
        self.sink.seek(Start(last_position))?;

        if let Some(existing) = self.chunks.iter_mut().find(|c| c.id() == CHNA_SIG) {
            *existing = Chunk::Chna(chunk);
        } else {
            self.chunks.push(Chunk::Chna(chunk));
        }
        Ok(())
    }

    /**
     * Add a marker at a frame position, with an optional label.
     *
     * Requires a cue region reserved with `max_markers > 0` at
     * construction; duplicate marker ids are rejected. Markers are kept
     * ordered by position.
     */
    pub fn add_marker(&mut self, id: u32, position: u64, label: &str) -> Result<(), Error> {
        self.check_open()?;
        match self.cue.as_mut() {
            Some(cue) => cue.add_cue_point(id, position, label),
            None => Err(Error::NoCueChunkReserved),
        }
    }

    /// Add a prepared cue point; see [`add_marker`](Bw64Writer::add_marker).
    pub fn add_marker_point(&mut self, cue_point: CuePoint) -> Result<(), Error> {
        self.check_open()?;
        match self.cue.as_mut() {
            Some(cue) => cue.add_point(cue_point),
            None => Err(Error::NoCueChunkReserved),
        }
    }

    /// Add several markers at once.
    pub fn add_markers<I>(&mut self, markers: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = CuePoint>,
    {
        for cue_point in markers {
            self.add_marker_point(cue_point)?;
        }
        Ok(())
    }

    /**
     * Transcode interleaved float samples to the file's sample format and
     * append them to the data chunk.
     *
     * `buffer` must hold at least `frames × channels()` samples. Returns
     * the number of frames written.
     */
    pub fn write(&mut self, buffer: &[f32], frames: u64) -> Result<u64, Error> {
        self.check_open()?;

        let sample_count = frames as usize * self.format.channel_count() as usize;
        if buffer.len() < sample_count {
            return Err(Error::InvalidBufferSize {
                buffer_size: buffer.len(),
                expected: sample_count,
            });
        }

        let byte_count = frames as usize * self.format.block_alignment() as usize;
        self.raw_buffer.resize(byte_count, 0);

        let bits = self.format.bits_per_sample();
        if self.format.is_float() {
            encode_float_samples(&buffer[..sample_count], &mut self.raw_buffer, bits)?;
        } else {
            encode_pcm_samples(&buffer[..sample_count], &mut self.raw_buffer, bits)?;
        }

        self.sink.write_all(&self.raw_buffer)?;
        self.grow_data(byte_count as u64);
        Ok(frames)
    }

    /**
     * Append raw bytes in the file's native sample layout, bypassing the
     * transcoder.
     *
     * `buffer` must be exactly `frames × block_alignment()` bytes.
     */
    pub fn write_raw(&mut self, buffer: &[u8], frames: u64) -> Result<u64, Error> {
        self.check_open()?;

        let expected = frames as usize * self.format.block_alignment() as usize;
        if buffer.len() != expected {
            return Err(Error::InvalidBufferSize {
                buffer_size: buffer.len(),
                expected,
            });
        }

        self.sink.write_all(buffer)?;
        self.grow_data(expected as u64);
        Ok(frames)
    }

    /**
     * Finalize and close the file.
     *
     * Pads the data chunk, settles its header, rewrites the cue
     * reservation and derives the `LIST(adtl)` label chunk, appends the
     * queued post-data chunks, and settles the outer header: as `RIFF`
     * with a true 32-bit size, or as `BW64`/`RF64` with a `ds64` chunk
     * over the `JUNK` reservation when any size outgrew 32 bits.
     *
     * Idempotent; later calls return `Ok(())` without touching the file.
     */
    pub fn close(&mut self) -> Result<(), Error> {
        if self.finalized {
            return Ok(());
        }
        self.finalize()
    }

    fn check_open(&self) -> Result<(), Error> {
        if self.finalized {
            return Err(Error::WriterFinalized);
        }
        Ok(())
    }

    fn header(&self, id: FourCC) -> Result<ChunkHeader, Error> {
        self.chunk_headers
            .iter()
            .find(|h| h.id == id)
            .copied()
            .ok_or(Error::ChunkMissing { signature: id })
    }

    fn grow_data(&mut self, amount: u64) {
        self.data_size += amount;
        if let Some(header) = self.chunk_headers.iter_mut().find(|h| h.id == DATA_SIG) {
            header.size = self.data_size;
        }
    }

    /// Write a chunk header and body at the current position, padding an
    /// odd body to an even boundary. Oversize chunks get a clamped 32-bit
    /// size field; their true size is carried into the ds64 chunk at close.
    fn put_chunk(&mut self, chunk: &Chunk) -> Result<(), Error> {
        self.sink.write_fourcc(chunk.id())?;
        self.sink.write_u32::<LittleEndian>(clamped_size(chunk.size()))?;
        chunk.write(&mut self.sink)?;
        if chunk.size() % 2 == 1 {
            self.sink.write_u8(0)?;
        }
        Ok(())
    }

    /// Write a chunk at the current position and track its header.
    fn emit_chunk(&mut self, chunk: &Chunk) -> Result<(), Error> {
        let position = self.sink.stream_position()?;
        self.chunk_headers
            .push(ChunkHeader::new(chunk.id(), chunk.size(), position));
        self.put_chunk(chunk)
    }

    /// Write a chunk, track its header, and keep its value for accessors.
    fn commit_chunk(&mut self, chunk: Chunk) -> Result<(), Error> {
        self.emit_chunk(&chunk)?;
        self.chunks.push(chunk);
        Ok(())
    }

    /// Write an all-zero chunk of the given body size and track its header.
    fn write_chunk_placeholder(&mut self, id: FourCC, size: u32) -> Result<(), Error> {
        let position = self.sink.stream_position()?;
        self.chunk_headers
            .push(ChunkHeader::new(id, size as u64, position));
        self.sink.write_fourcc(id)?;
        self.sink.write_u32::<LittleEndian>(size)?;
        self.sink.write_all(&vec![0u8; size as usize])?;
        Ok(())
    }

    /**
     * Rewrite the tracked chunk region `id` with `chunk`, which may be
     * smaller than the reservation but not larger. When the rewrite leaves
     * spare bytes behind, they become a `JUNK` filler chunk so the chunk
     * chain stays walkable; subsequent chunks are never shifted.
     *
     * Only meaningful for chunk ids that are unique within the file.
     */
    fn overwrite_chunk(&mut self, id: FourCC, chunk: &Chunk) -> Result<(), Error> {
        let header = self.header(id)?;
        if chunk.size() > header.size {
            return Err(Error::ChunkTooLarge {
                signature: chunk.id(),
                size: chunk.size(),
                reserved: header.size,
            });
        }

        self.sink.seek(Start(header.position))?;
        self.put_chunk(chunk)?;

        let reserved = header.size + header.size % 2;
        let written = chunk.size() + chunk.size() % 2;
        let leftover = reserved - written;
        if leftover >= 8 {
            self.sink.write_fourcc(JUNK_SIG)?;
            self.sink.write_u32::<LittleEndian>((leftover - 8) as u32)?;
        } else if leftover > 0 {
            self.sink.write_all(&vec![0u8; leftover as usize])?;
        }
        Ok(())
    }

    fn riff_chunk_size(&mut self) -> Result<u64, Error> {
        let end = self.sink.seek(End(0))?;
        Ok(end - 8)
    }

    fn finalize(&mut self) -> Result<(), Error> {
        self.finalized = true;

        self.finalize_data_chunk()?;
        self.finalize_cue_chunk()?;

        self.sink.seek(End(0))?;
        let post_data_chunks = std::mem::take(&mut self.post_data_chunks);
        for chunk in post_data_chunks {
            self.commit_chunk(chunk)?;
        }

        self.finalize_riff_chunk()?;
        self.sink.flush()?;

        debug!(
            "finalized file: {} frames, {} chunks",
            self.frames_written(),
            self.chunk_headers.len()
        );
        Ok(())
    }

    fn finalize_data_chunk(&mut self) -> Result<(), Error> {
        self.sink.seek(End(0))?;
        if self.data_size % 2 == 1 {
            self.sink.write_u8(0)?;
        }

        let header = self.header(DATA_SIG)?;
        self.sink.seek(Start(header.position))?;
        self.sink.write_fourcc(DATA_SIG)?;
        self.sink
            .write_u32::<LittleEndian>(clamped_size(self.data_size))?;
        Ok(())
    }

    fn finalize_cue_chunk(&mut self) -> Result<(), Error> {
        let Some(cue) = self.cue.take() else {
            return Ok(());
        };

        if cue.cue_points().is_empty() {
            // the reservation was never used; retire it to filler
            let header = self.header(CUE__SIG)?;
            self.sink.seek(Start(header.position))?;
            self.sink.write_fourcc(JUNK_SIG)?;
            self.sink.write_u32::<LittleEndian>(header.size as u32)?;
            self.cue = Some(cue);
            return Ok(());
        }

        let labels = cue.labels();
        if !labels.is_empty() {
            let label_chunks = labels
                .iter()
                .map(|(id, text)| Chunk::Label(LabelChunk::new(*id, text)))
                .collect();
            self.post_data_chunks
                .push(Chunk::List(ListChunk::new(ADTL_SIG, label_chunks)));
        }

        self.overwrite_chunk(CUE__SIG, &Chunk::Cue(cue.clone()))?;
        self.cue = Some(cue);
        Ok(())
    }

    fn finalize_riff_chunk(&mut self) -> Result<(), Error> {
        let riff_size = self.riff_chunk_size()?;
        let oversize = riff_size > u32::MAX as u64
            || self.chunk_headers.iter().any(|h| h.size > u32::MAX as u64);

        self.sink.seek(Start(0))?;
        if oversize {
            let outer = if self.use_rf64_id { RF64_SIG } else { BW64_SIG };
            self.sink.write_fourcc(outer)?;
            self.sink.write_u32::<LittleEndian>(u32::MAX)?;

            let mut ds64 = DataSize64Chunk::new(riff_size, self.data_size);
            for header in &self.chunk_headers {
                if header.size > u32::MAX as u64 && header.id != DATA_SIG {
                    ds64.set_chunk_size(header.id, header.size);
                }
            }
            self.overwrite_chunk(JUNK_SIG, &Chunk::DataSize64(ds64))?;
        } else {
            self.sink.write_fourcc(RIFF_SIG)?;
            self.sink.write_u32::<LittleEndian>(riff_size as u32)?;
        }
        Ok(())
    }
}

impl<W: Write + Seek> Drop for Bw64Writer<W> {
    fn drop(&mut self) {
        if !self.finalized {
            let _ = self.finalize();
        }
    }
}

#[test]
fn test_skeleton() {
    use super::fourcc::{FMT__SIG, ReadFourCC};
    use byteorder::ReadBytesExt;
    use std::io::Cursor;

    let mut cursor = Cursor::new(vec![0u8; 0]);
    let mut writer = Bw64Writer::new(&mut cursor, WriterConfig::default(), vec![]).unwrap();
    writer.close().unwrap();
    drop(writer);

    let file_len = cursor.get_ref().len() as u64;
    cursor.seek(Start(0)).unwrap();

    assert_eq!(cursor.read_fourcc().unwrap(), RIFF_SIG);
    let form_size = cursor.read_u32::<LittleEndian>().unwrap();
    assert_eq!(form_size as u64, file_len - 8);
    assert_eq!(cursor.read_fourcc().unwrap(), WAVE_SIG);

    assert_eq!(cursor.read_fourcc().unwrap(), JUNK_SIG);
    let junk_size = cursor.read_u32::<LittleEndian>().unwrap();
    assert_eq!(junk_size, 40);
    cursor.seek(std::io::SeekFrom::Current(junk_size as i64)).unwrap();

    assert_eq!(cursor.read_fourcc().unwrap(), FMT__SIG);
    let fmt_size = cursor.read_u32::<LittleEndian>().unwrap();
    assert_eq!(fmt_size, 16);
    cursor.seek(std::io::SeekFrom::Current(fmt_size as i64)).unwrap();

    assert_eq!(cursor.read_fourcc().unwrap(), CHNA_SIG);
    let chna_size = cursor.read_u32::<LittleEndian>().unwrap();
    assert_eq!(chna_size, 1024 * 40 + 4);
    cursor.seek(std::io::SeekFrom::Current(chna_size as i64)).unwrap();

    assert_eq!(cursor.read_fourcc().unwrap(), DATA_SIG);
    assert_eq!(cursor.read_u32::<LittleEndian>().unwrap(), 0);
}

#[test]
fn test_odd_data_padded() {
    use std::io::Cursor;

    let mut cursor = Cursor::new(vec![0u8; 0]);
    let config = WriterConfig {
        channels: 1,
        bit_depth: 24,
        ..WriterConfig::default()
    };
    let mut writer = Bw64Writer::new(&mut cursor, config, vec![]).unwrap();
    writer.write(&[0.25f32], 1).unwrap();
    writer.close().unwrap();
    assert_eq!(writer.frames_written(), 1);
    drop(writer);

    // one 3-byte frame leaves the data chunk odd; a pad byte keeps the
    // total file length even
    assert_eq!(cursor.get_ref().len() % 2, 0);
}

#[test]
fn test_write_after_close_rejected() {
    use std::io::Cursor;

    let mut cursor = Cursor::new(vec![0u8; 0]);
    let mut writer = Bw64Writer::new(&mut cursor, WriterConfig::default(), vec![]).unwrap();
    writer.close().unwrap();
    let err = writer.write(&[0.0f32; 4], 4).unwrap_err();
    assert!(matches!(err, Error::WriterFinalized));
}

#[test]
fn test_marker_requires_reservation() {
    use std::io::Cursor;

    let mut cursor = Cursor::new(vec![0u8; 0]);
    let mut writer = Bw64Writer::new(&mut cursor, WriterConfig::default(), vec![]).unwrap();
    let err = writer.add_marker(1, 100, "nope").unwrap_err();
    assert!(matches!(err, Error::NoCueChunkReserved));
}

#[test]
fn test_channel_mask_correction() {
    assert_eq!(correct_channel_mask(0x3, 2), 0x3);
    assert_eq!(correct_channel_mask(0x0, 2), 0x3);
    assert_eq!(correct_channel_mask(0x4, 2), 0x5);
    assert_eq!(correct_channel_mask(0x4, 1), 0x4);
}
