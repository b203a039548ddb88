use std::collections::{BTreeMap, HashSet};
use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};
use encoding::all::ASCII;
use encoding::{EncoderTrap, Encoding};
use uuid::Uuid;

use super::common_format::{
    subformat_data1, WriteGuid, BASIC_EXTENSIBLE, BASIC_FLOAT, BASIC_PCM,
};
use super::errors::Error;
use super::fourcc::{FourCC, WriteFourCC};
use super::fourcc::{AXML_SIG, CHNA_SIG, CUE__SIG, DATA_SIG, DS64_SIG, FMT__SIG, LABL_SIG, LIST_SIG};

/// Location and declared size of a chunk within the file.
///
/// `position` is the absolute file offset of the first byte of the 8-byte
/// chunk header. `size` is the body size in bytes, excluding the header and
/// excluding the pad byte that follows an odd-sized body.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ChunkHeader {
    pub id: FourCC,
    pub size: u64,
    pub position: u64,
}

impl ChunkHeader {
    pub fn new(id: FourCC, size: u64, position: u64) -> Self {
        ChunkHeader { id, size, position }
    }
}

/// Write a fixed-width ASCII field, truncating or zero-filling `string` to
/// exactly `length` bytes.
fn write_ascii_field<W: Write>(
    w: &mut W,
    string: &str,
    length: usize,
) -> Result<(), Error> {
    let mut buf = ASCII
        .encode(string, EncoderTrap::Ignore)
        .unwrap_or_default();
    buf.truncate(length);
    buf.resize(length, 0);
    w.write_all(&buf)?;
    Ok(())
}

/// Extra data carried by a `WAVE_FORMAT_EXTENSIBLE` format chunk.
///
/// See [MSDN WAVEFORMATEXTENSIBLE](https://docs.microsoft.com/en-us/windows/win32/api/mmreg/ns-mmreg-waveformatextensible)
#[derive(Debug, Clone, PartialEq)]
pub struct ExtraData {
    valid_bits_per_sample: u16,
    channel_mask: u32,
    sub_format: Uuid,
}

impl ExtraData {
    pub fn new(valid_bits_per_sample: u16, channel_mask: u32, sub_format: Uuid) -> Self {
        ExtraData {
            valid_bits_per_sample,
            channel_mask,
            sub_format,
        }
    }

    pub fn valid_bits_per_sample(&self) -> u16 {
        self.valid_bits_per_sample
    }

    pub fn channel_mask(&self) -> u32 {
        self.channel_mask
    }

    pub fn sub_format(&self) -> &Uuid {
        &self.sub_format
    }
}

/// The `fmt ` chunk.
///
/// Describes the binary layout of the data chunk: sample rate, bit depth,
/// channel count and the codec selector. `blockAlignment` and
/// `bytesPerSecond` are not stored but derived, and checked against the
/// stream on parse.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatInfoChunk {
    format_tag: u16,
    channel_count: u16,
    sample_rate: u32,
    bits_per_sample: u16,
    extra_data: Option<ExtraData>,
}

impl FormatInfoChunk {
    pub fn new(
        channel_count: u16,
        sample_rate: u32,
        bits_per_sample: u16,
        extra_data: Option<ExtraData>,
        format_tag: u16,
    ) -> Result<Self, Error> {
        if channel_count == 0 {
            return Err(Error::InvalidChannelCount);
        }
        if sample_rate == 0 {
            return Err(Error::InvalidSampleRate);
        }
        if !matches!(bits_per_sample, 16 | 24 | 32) {
            return Err(Error::UnsupportedBitDepth(bits_per_sample));
        }

        let block_alignment = channel_count as u32 * bits_per_sample as u32 / 8;
        if block_alignment > u16::MAX as u32 {
            return Err(Error::BlockAlignmentOverflow {
                channel_count,
                bits_per_sample,
            });
        }
        if sample_rate as u64 * block_alignment as u64 > u32::MAX as u64 {
            return Err(Error::BytesPerSecondOverflow {
                sample_rate,
                channel_count,
                bits_per_sample,
            });
        }

        match format_tag {
            BASIC_PCM | BASIC_FLOAT => {
                if extra_data.is_some() {
                    return Err(Error::UnexpectedExtraData {
                        format_tag,
                        cb_size: 22,
                    });
                }
            }
            BASIC_EXTENSIBLE => {
                if extra_data.is_none() {
                    return Err(Error::ExtensibleExtraDataSize { cb_size: 0 });
                }
            }
            other => return Err(Error::UnsupportedFormatTag(other)),
        }

        Ok(FormatInfoChunk {
            format_tag,
            channel_count,
            sample_rate,
            bits_per_sample,
            extra_data,
        })
    }

    /// A plain integer PCM format.
    pub fn pcm(channel_count: u16, sample_rate: u32, bits_per_sample: u16) -> Result<Self, Error> {
        Self::new(channel_count, sample_rate, bits_per_sample, None, BASIC_PCM)
    }

    pub fn format_tag(&self) -> u16 {
        self.format_tag
    }

    pub fn channel_count(&self) -> u16 {
        self.channel_count
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn bits_per_sample(&self) -> u16 {
        self.bits_per_sample
    }

    pub fn extra_data(&self) -> Option<&ExtraData> {
        self.extra_data.as_ref()
    }

    /// Byte size of one frame across all channels.
    pub fn block_alignment(&self) -> u16 {
        (self.channel_count as u32 * self.bits_per_sample as u32 / 8) as u16
    }

    /// `sampleRate × blockAlignment`
    pub fn bytes_per_second(&self) -> u32 {
        self.sample_rate * self.block_alignment() as u32
    }

    pub fn is_extensible(&self) -> bool {
        self.format_tag == BASIC_EXTENSIBLE
    }

    /// True for IEEE-float sample data, whether selected by the basic
    /// format tag or by the extensible subformat GUID.
    pub fn is_float(&self) -> bool {
        match self.format_tag {
            BASIC_FLOAT => true,
            BASIC_EXTENSIBLE => self
                .extra_data
                .as_ref()
                .map(|x| subformat_data1(x.sub_format()) == BASIC_FLOAT as u32)
                .unwrap_or(false),
            _ => false,
        }
    }

    pub fn id(&self) -> FourCC {
        FMT__SIG
    }

    pub fn size(&self) -> u64 {
        match self.extra_data {
            Some(_) => 16 + 2 + 22,
            None => 16,
        }
    }

    pub fn write<W: Write>(&self, w: &mut W) -> Result<(), Error> {
        w.write_u16::<LittleEndian>(self.format_tag)?;
        w.write_u16::<LittleEndian>(self.channel_count)?;
        w.write_u32::<LittleEndian>(self.sample_rate)?;
        w.write_u32::<LittleEndian>(self.bytes_per_second())?;
        w.write_u16::<LittleEndian>(self.block_alignment())?;
        w.write_u16::<LittleEndian>(self.bits_per_sample)?;
        if let Some(extra) = &self.extra_data {
            w.write_u16::<LittleEndian>(22)?;
            w.write_u16::<LittleEndian>(extra.valid_bits_per_sample)?;
            w.write_u32::<LittleEndian>(extra.channel_mask)?;
            w.write_guid(&extra.sub_format)?;
        }
        Ok(())
    }
}

/// The `ds64` chunk.
///
/// Carries 64-bit sizes for the container, the data chunk, and any other
/// chunk whose size overflows the 32-bit header field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataSize64Chunk {
    bw64_size: u64,
    data_size: u64,
    dummy_size: u64,
    table: Vec<(FourCC, u64)>,
}

impl DataSize64Chunk {
    pub fn new(bw64_size: u64, data_size: u64) -> Self {
        DataSize64Chunk {
            bw64_size,
            data_size,
            dummy_size: 0,
            table: vec![],
        }
    }

    pub(crate) fn with_table(
        bw64_size: u64,
        data_size: u64,
        dummy_size: u64,
        table: Vec<(FourCC, u64)>,
    ) -> Self {
        DataSize64Chunk {
            bw64_size,
            data_size,
            dummy_size,
            table,
        }
    }

    pub fn bw64_size(&self) -> u64 {
        self.bw64_size
    }

    pub fn data_size(&self) -> u64 {
        self.data_size
    }

    pub fn dummy_size(&self) -> u64 {
        self.dummy_size
    }

    pub fn table_length(&self) -> u32 {
        self.table.len() as u32
    }

    pub fn set_chunk_size(&mut self, id: FourCC, size: u64) {
        if let Some(entry) = self.table.iter_mut().find(|(e, _)| *e == id) {
            entry.1 = size;
        } else {
            self.table.push((id, size));
        }
    }

    pub fn has_chunk_size(&self, id: FourCC) -> bool {
        self.table.iter().any(|(e, _)| *e == id)
    }

    pub fn chunk_size(&self, id: FourCC) -> Option<u64> {
        self.table.iter().find(|(e, _)| *e == id).map(|(_, s)| *s)
    }

    pub fn id(&self) -> FourCC {
        DS64_SIG
    }

    pub fn size(&self) -> u64 {
        28 + 12 * self.table.len() as u64
    }

    pub fn write<W: Write>(&self, w: &mut W) -> Result<(), Error> {
        w.write_u64::<LittleEndian>(self.bw64_size)?;
        w.write_u64::<LittleEndian>(self.data_size)?;
        w.write_u64::<LittleEndian>(self.dummy_size)?;
        w.write_u32::<LittleEndian>(self.table.len() as u32)?;
        for (id, size) in &self.table {
            w.write_fourcc(*id)?;
            w.write_u64::<LittleEndian>(*size)?;
        }
        Ok(())
    }
}

/// The `data` chunk.
///
/// Only the size of the sample region is tracked; the body itself is
/// streamed by the reader and writer and never materialized here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataChunk {
    size: u64,
}

impl DataChunk {
    pub fn new() -> Self {
        DataChunk { size: 0 }
    }

    pub(crate) fn with_size(size: u64) -> Self {
        DataChunk { size }
    }

    pub fn id(&self) -> FourCC {
        DATA_SIG
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn write<W: Write>(&self, _w: &mut W) -> Result<(), Error> {
        // sample bytes are streamed separately
        Ok(())
    }
}

/// ADM audio ID record of a `chna` chunk.
///
/// Relates one track in the data chunk to an audioTrackUID, an
/// audioTrackFormat (or audioChannelFormat) reference and an audioPackFormat
/// reference in the file's ADM metadata. See BS.2088-1 §8.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioId {
    track_index: u16,
    uid: String,
    track_ref: String,
    pack_ref: String,
}

impl AudioId {
    pub fn new(track_index: u16, uid: &str, track_ref: &str, pack_ref: &str) -> Self {
        AudioId {
            track_index,
            uid: uid.to_string(),
            track_ref: track_ref.to_string(),
            pack_ref: pack_ref.to_string(),
        }
    }

    pub fn track_index(&self) -> u16 {
        self.track_index
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn track_ref(&self) -> &str {
        &self.track_ref
    }

    pub fn pack_ref(&self) -> &str {
        &self.pack_ref
    }
}

/// The `chna` chunk, binding track indices to ADM object identifiers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChnaChunk {
    audio_ids: Vec<AudioId>,
}

impl ChnaChunk {
    pub fn new(audio_ids: Vec<AudioId>) -> Self {
        ChnaChunk { audio_ids }
    }

    /// A default one-UID-per-channel layout, for files whose caller supplies
    /// no channel allocation of their own.
    pub fn default_layout(channels: u16) -> Self {
        let audio_ids = (1..=channels)
            .map(|ch| {
                AudioId::new(
                    ch,
                    &format!("ATU_{:08}", ch),
                    &format!("AT_000100{:02}_01", ch),
                    "AP_00010001",
                )
            })
            .collect();
        ChnaChunk { audio_ids }
    }

    pub fn add_audio_id(&mut self, audio_id: AudioId) {
        self.audio_ids.push(audio_id);
    }

    pub fn audio_ids(&self) -> &[AudioId] {
        &self.audio_ids
    }

    /// Count of records in the chunk.
    pub fn num_uids(&self) -> u16 {
        self.audio_ids.len() as u16
    }

    /// Count of distinct track indices across all records.
    pub fn num_tracks(&self) -> u16 {
        self.audio_ids
            .iter()
            .map(|a| a.track_index)
            .collect::<HashSet<u16>>()
            .len() as u16
    }

    pub fn id(&self) -> FourCC {
        CHNA_SIG
    }

    pub fn size(&self) -> u64 {
        4 + 40 * self.audio_ids.len() as u64
    }

    pub fn write<W: Write>(&self, w: &mut W) -> Result<(), Error> {
        w.write_u16::<LittleEndian>(self.num_tracks())?;
        w.write_u16::<LittleEndian>(self.num_uids())?;
        for audio_id in &self.audio_ids {
            if audio_id.track_index == 0 {
                return Err(Error::ZeroTrackIndex);
            }
            w.write_u16::<LittleEndian>(audio_id.track_index)?;
            write_ascii_field(w, &audio_id.uid, 12)?;
            write_ascii_field(w, &audio_id.track_ref, 14)?;
            write_ascii_field(w, &audio_id.pack_ref, 11)?;
            w.write_u8(0)?;
        }
        Ok(())
    }
}

/// The `axml` chunk. The ADM XML document is carried as an opaque byte
/// string and never interpreted here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AxmlChunk {
    data: Vec<u8>,
}

impl AxmlChunk {
    pub fn new(data: Vec<u8>) -> Self {
        AxmlChunk { data }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn id(&self) -> FourCC {
        AXML_SIG
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn write<W: Write>(&self, w: &mut W) -> Result<(), Error> {
        w.write_all(&self.data)?;
        Ok(())
    }
}

/// A cue point recorded in the `cue ` chunk.
///
/// The wire form is 24 bytes; `label` is an in-memory convenience joined
/// from the `labl` sub-chunks of a `LIST(adtl)` chunk and is never
/// serialized inside the cue chunk itself.
#[derive(Debug, Clone, PartialEq)]
pub struct CuePoint {
    pub id: u32,
    pub position: u32,
    pub data_chunk_id: FourCC,
    pub chunk_start: u32,
    pub block_start: u32,
    pub sample_offset: u32,
    pub label: String,
}

impl CuePoint {
    pub fn new(id: u32, position: u64, label: &str) -> Self {
        CuePoint {
            id,
            position: position as u32,
            data_chunk_id: DATA_SIG,
            chunk_start: 0,
            block_start: 0,
            sample_offset: position as u32,
            label: label.to_string(),
        }
    }
}

impl Default for CuePoint {
    fn default() -> Self {
        CuePoint {
            id: 0,
            position: 0,
            data_chunk_id: FourCC::from([0u8; 4]),
            chunk_start: 0,
            block_start: 0,
            sample_offset: 0,
            label: String::new(),
        }
    }
}

/// The `cue ` chunk: a vector of cue points, kept sorted by position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CueChunk {
    cue_points: Vec<CuePoint>,
}

impl CueChunk {
    pub fn new(cue_points: Vec<CuePoint>) -> Self {
        CueChunk { cue_points }
    }

    pub fn cue_points(&self) -> &[CuePoint] {
        &self.cue_points
    }

    pub(crate) fn cue_points_mut(&mut self) -> &mut [CuePoint] {
        &mut self.cue_points
    }

    /// Add a cue point with an optional label, keeping the points ordered
    /// by position. A point with a duplicate id is rejected.
    pub fn add_cue_point(&mut self, id: u32, position: u64, label: &str) -> Result<(), Error> {
        self.add_point(CuePoint::new(id, position, label))
    }

    /// Add an existing cue point, keeping the points ordered by position.
    pub fn add_point(&mut self, cue: CuePoint) -> Result<(), Error> {
        if self.cue_points.iter().any(|cp| cp.id == cue.id) {
            return Err(Error::DuplicateCuePointId(cue.id));
        }
        self.cue_points.push(cue);
        self.cue_points.sort_by_key(|cp| cp.position);
        Ok(())
    }

    /// Set the label of an existing cue point. Returns `false` if no point
    /// has the given id.
    pub fn set_label(&mut self, id: u32, label: &str) -> bool {
        match self.cue_points.iter_mut().find(|cp| cp.id == id) {
            Some(cp) => {
                cp.label = label.to_string();
                true
            }
            None => false,
        }
    }

    pub fn remove_cue_point(&mut self, id: u32) {
        self.cue_points.retain(|cp| cp.id != id);
    }

    pub fn clear_cue_points(&mut self) {
        self.cue_points.clear();
    }

    /// The non-empty labels, keyed by cue point id.
    pub fn labels(&self) -> BTreeMap<u32, String> {
        self.cue_points
            .iter()
            .filter(|cp| !cp.label.is_empty())
            .map(|cp| (cp.id, cp.label.clone()))
            .collect()
    }

    pub fn id(&self) -> FourCC {
        CUE__SIG
    }

    pub fn size(&self) -> u64 {
        4 + 24 * self.cue_points.len() as u64
    }

    pub fn write<W: Write>(&self, w: &mut W) -> Result<(), Error> {
        w.write_u32::<LittleEndian>(self.cue_points.len() as u32)?;
        for cue in &self.cue_points {
            w.write_u32::<LittleEndian>(cue.id)?;
            w.write_u32::<LittleEndian>(cue.position)?;
            w.write_fourcc(cue.data_chunk_id)?;
            w.write_u32::<LittleEndian>(cue.chunk_start)?;
            w.write_u32::<LittleEndian>(cue.block_start)?;
            w.write_u32::<LittleEndian>(cue.sample_offset)?;
        }
        Ok(())
    }
}

/// A `labl` sub-chunk of a `LIST(adtl)` chunk: a cue point id and its
/// NUL-terminated text.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelChunk {
    cue_point_id: u32,
    label: String,
}

impl LabelChunk {
    pub fn new(cue_point_id: u32, label: &str) -> Self {
        LabelChunk {
            cue_point_id,
            label: label.to_string(),
        }
    }

    pub fn cue_point_id(&self) -> u32 {
        self.cue_point_id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn id(&self) -> FourCC {
        LABL_SIG
    }

    pub fn size(&self) -> u64 {
        4 + self.label.len() as u64 + 1
    }

    pub fn write<W: Write>(&self, w: &mut W) -> Result<(), Error> {
        w.write_u32::<LittleEndian>(self.cue_point_id)?;
        w.write_all(self.label.as_bytes())?;
        w.write_u8(0)?;
        Ok(())
    }
}

/// A `LIST` chunk: a list type (ordinarily `adtl` here) and heterogeneous
/// sub-chunks, each serialized as a standard {id, size, body, pad} record.
#[derive(Debug, Clone, PartialEq)]
pub struct ListChunk {
    list_type: FourCC,
    sub_chunks: Vec<Chunk>,
}

impl ListChunk {
    pub fn new(list_type: FourCC, sub_chunks: Vec<Chunk>) -> Self {
        ListChunk {
            list_type,
            sub_chunks,
        }
    }

    pub fn list_type(&self) -> FourCC {
        self.list_type
    }

    pub fn sub_chunks(&self) -> &[Chunk] {
        &self.sub_chunks
    }

    pub fn add_sub_chunk(&mut self, chunk: Chunk) {
        self.sub_chunks.push(chunk);
    }

    pub fn id(&self) -> FourCC {
        LIST_SIG
    }

    pub fn size(&self) -> u64 {
        let mut size = 4u64;
        for chunk in &self.sub_chunks {
            size += 8 + chunk.size();
            if chunk.size() % 2 == 1 {
                size += 1;
            }
        }
        size
    }

    pub fn write<W: Write>(&self, w: &mut W) -> Result<(), Error> {
        w.write_fourcc(self.list_type)?;
        for chunk in &self.sub_chunks {
            w.write_fourcc(chunk.id())?;
            w.write_u32::<LittleEndian>(chunk.size() as u32)?;
            chunk.write(w)?;
            if chunk.size() % 2 == 1 {
                w.write_u8(0)?;
            }
        }
        Ok(())
    }
}

/// A chunk with an unrecognized id.
///
/// The reader preserves these with their raw body bytes so callers can
/// inspect them, but the writer offers no way to re-emit them; rewriting a
/// file therefore drops its unrecognized chunks.
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownChunk {
    chunk_id: FourCC,
    data: Vec<u8>,
}

impl UnknownChunk {
    pub fn new(chunk_id: FourCC, data: Vec<u8>) -> Self {
        UnknownChunk { chunk_id, data }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn id(&self) -> FourCC {
        self.chunk_id
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn write<W: Write>(&self, w: &mut W) -> Result<(), Error> {
        w.write_all(&self.data)?;
        Ok(())
    }
}

/// Any chunk the parser understands, as a tagged sum.
///
/// Every variant satisfies the same serialization contract: `id()`,
/// `size()` (body bytes, excluding header and pad) and `write()`, which
/// must emit exactly `size()` bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum Chunk {
    DataSize64(DataSize64Chunk),
    FormatInfo(FormatInfoChunk),
    Data(DataChunk),
    Chna(ChnaChunk),
    Axml(AxmlChunk),
    Cue(CueChunk),
    Label(LabelChunk),
    List(ListChunk),
    Unknown(UnknownChunk),
}

impl Chunk {
    pub fn id(&self) -> FourCC {
        match self {
            Chunk::DataSize64(c) => c.id(),
            Chunk::FormatInfo(c) => c.id(),
            Chunk::Data(c) => c.id(),
            Chunk::Chna(c) => c.id(),
            Chunk::Axml(c) => c.id(),
            Chunk::Cue(c) => c.id(),
            Chunk::Label(c) => c.id(),
            Chunk::List(c) => c.id(),
            Chunk::Unknown(c) => c.id(),
        }
    }

    pub fn size(&self) -> u64 {
        match self {
            Chunk::DataSize64(c) => c.size(),
            Chunk::FormatInfo(c) => c.size(),
            Chunk::Data(c) => c.size(),
            Chunk::Chna(c) => c.size(),
            Chunk::Axml(c) => c.size(),
            Chunk::Cue(c) => c.size(),
            Chunk::Label(c) => c.size(),
            Chunk::List(c) => c.size(),
            Chunk::Unknown(c) => c.size(),
        }
    }

    pub fn write<W: Write>(&self, w: &mut W) -> Result<(), Error> {
        match self {
            Chunk::DataSize64(c) => c.write(w),
            Chunk::FormatInfo(c) => c.write(w),
            Chunk::Data(c) => c.write(w),
            Chunk::Chna(c) => c.write(w),
            Chunk::Axml(c) => c.write(w),
            Chunk::Cue(c) => c.write(w),
            Chunk::Label(c) => c.write(w),
            Chunk::List(c) => c.write(w),
            Chunk::Unknown(c) => c.write(w),
        }
    }

    pub fn as_format_info(&self) -> Option<&FormatInfoChunk> {
        match self {
            Chunk::FormatInfo(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_data_size64(&self) -> Option<&DataSize64Chunk> {
        match self {
            Chunk::DataSize64(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_data(&self) -> Option<&DataChunk> {
        match self {
            Chunk::Data(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_chna(&self) -> Option<&ChnaChunk> {
        match self {
            Chunk::Chna(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_axml(&self) -> Option<&AxmlChunk> {
        match self {
            Chunk::Axml(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_cue(&self) -> Option<&CueChunk> {
        match self {
            Chunk::Cue(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_label(&self) -> Option<&LabelChunk> {
        match self {
            Chunk::Label(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ListChunk> {
        match self {
            Chunk::List(c) => Some(c),
            _ => None,
        }
    }
}
