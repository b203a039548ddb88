use std::io::SeekFrom::{Current, Start};
use std::io::{Read, Seek};

use byteorder::{LittleEndian, ReadBytesExt};
use encoding::all::ASCII;
use encoding::{DecoderTrap, Encoding};
use log::trace;

use super::chunks::{
    AudioId, AxmlChunk, ChnaChunk, Chunk, ChunkHeader, CueChunk, CuePoint, DataChunk,
    DataSize64Chunk, ExtraData, FormatInfoChunk, LabelChunk, ListChunk, UnknownChunk,
};
use super::common_format::{subformat_data1, ReadGuid, BASIC_EXTENSIBLE, BASIC_FLOAT, BASIC_PCM};
use super::errors::Error;
use super::fourcc::{
    ReadFourCC, AXML_SIG, CHNA_SIG, CUE__SIG, DATA_SIG, DS64_SIG, FMT__SIG, LABL_SIG, LIST_SIG,
};

/// Read a fixed-width ASCII field of `length` bytes, trimming at the first
/// NUL.
fn read_ascii_field<R: Read>(r: &mut R, length: usize) -> Result<String, Error> {
    let mut buffer = vec![0u8; length];
    r.read_exact(&mut buffer)?;
    let trimmed: Vec<u8> = buffer.iter().take_while(|c| **c != 0).cloned().collect();
    Ok(ASCII
        .decode(&trimmed, DecoderTrap::Ignore)
        .unwrap_or_default())
}

/// Parse the chunk body described by `header` into its typed form.
///
/// Seeks to the start of the body first; the stream position afterwards is
/// unspecified. Chunks with unrecognized ids are preserved as
/// [`UnknownChunk`]s with their raw body bytes.
pub fn parse_chunk<R: Read + Seek>(stream: &mut R, header: &ChunkHeader) -> Result<Chunk, Error> {
    stream.seek(Start(header.position + 8))?;

    match header.id {
        DS64_SIG => Ok(Chunk::DataSize64(parse_data_size64_chunk(
            stream,
            header.size,
        )?)),
        FMT__SIG => Ok(Chunk::FormatInfo(parse_format_info_chunk(
            stream,
            header.size,
        )?)),
        DATA_SIG => Ok(Chunk::Data(DataChunk::with_size(header.size))),
        CHNA_SIG => Ok(Chunk::Chna(parse_chna_chunk(stream, header.size)?)),
        CUE__SIG => Ok(Chunk::Cue(parse_cue_chunk(stream, header.size)?)),
        LIST_SIG => Ok(Chunk::List(parse_list_chunk(stream, header.size)?)),
        AXML_SIG => Ok(Chunk::Axml(parse_axml_chunk(stream, header.size)?)),
        id => {
            trace!("preserving unknown chunk '{}' ({} bytes)", id, header.size);
            let mut data = vec![0u8; header.size as usize];
            stream.read_exact(&mut data)?;
            Ok(Chunk::Unknown(UnknownChunk::new(id, data)))
        }
    }
}

pub(crate) fn parse_format_info_chunk<R: Read>(
    stream: &mut R,
    size: u64,
) -> Result<FormatInfoChunk, Error> {
    if size < 16 {
        return Err(Error::ChunkTooSmall {
            signature: FMT__SIG,
            size,
        });
    }

    let format_tag = stream.read_u16::<LittleEndian>()?;
    let channel_count = stream.read_u16::<LittleEndian>()?;
    let sample_rate = stream.read_u32::<LittleEndian>()?;
    let bytes_per_second = stream.read_u32::<LittleEndian>()?;
    let block_alignment = stream.read_u16::<LittleEndian>()?;
    let bits_per_sample = stream.read_u16::<LittleEndian>()?;

    let cb_size = if size >= 18 {
        let cb_size = stream.read_u16::<LittleEndian>()?;
        if size != 18 + cb_size as u64 {
            return Err(Error::FmtSizeMismatch { size, cb_size });
        }
        cb_size
    } else {
        if size != 16 {
            return Err(Error::FmtSizeMismatch { size, cb_size: 0 });
        }
        0
    };

    let extra_data = match format_tag {
        BASIC_PCM | BASIC_FLOAT => {
            if cb_size != 0 {
                return Err(Error::UnexpectedExtraData {
                    format_tag,
                    cb_size,
                });
            }
            None
        }
        BASIC_EXTENSIBLE => {
            if cb_size != 22 {
                return Err(Error::ExtensibleExtraDataSize { cb_size });
            }
            let valid_bits_per_sample = stream.read_u16::<LittleEndian>()?;
            let channel_mask = stream.read_u32::<LittleEndian>()?;
            let sub_format = stream.read_guid()?;

            let data1 = subformat_data1(&sub_format);
            if data1 != BASIC_PCM as u32 && data1 != BASIC_FLOAT as u32 {
                return Err(Error::UnsupportedSubFormat(sub_format));
            }
            Some(ExtraData::new(
                valid_bits_per_sample,
                channel_mask,
                sub_format,
            ))
        }
        other => return Err(Error::UnsupportedFormatTag(other)),
    };

    let chunk = FormatInfoChunk::new(
        channel_count,
        sample_rate,
        bits_per_sample,
        extra_data,
        format_tag,
    )?;

    if chunk.block_alignment() != block_alignment {
        return Err(Error::BlockAlignmentMismatch {
            actual: block_alignment,
            expected: chunk.block_alignment(),
        });
    }
    if chunk.bytes_per_second() != bytes_per_second {
        return Err(Error::BytesPerSecondMismatch {
            actual: bytes_per_second,
            expected: chunk.bytes_per_second(),
        });
    }

    Ok(chunk)
}

pub(crate) fn parse_data_size64_chunk<R: Read + Seek>(
    stream: &mut R,
    size: u64,
) -> Result<DataSize64Chunk, Error> {
    // fixed-size header, table entries, then optionally some junk
    const HEADER_LENGTH: u64 = 28;
    const TABLE_ENTRY_LENGTH: u64 = 12;

    if size < HEADER_LENGTH {
        return Err(Error::ChunkTooSmall {
            signature: DS64_SIG,
            size,
        });
    }

    let bw64_size = stream.read_u64::<LittleEndian>()?;
    let data_size = stream.read_u64::<LittleEndian>()?;
    let dummy_size = stream.read_u64::<LittleEndian>()?;
    let table_length = stream.read_u32::<LittleEndian>()?;

    let min_size = HEADER_LENGTH + table_length as u64 * TABLE_ENTRY_LENGTH;
    if size < min_size {
        return Err(Error::Ds64TableTruncated { size, table_length });
    }

    let mut table = Vec::with_capacity(table_length as usize);
    for _ in 0..table_length {
        let id = stream.read_fourcc()?;
        let chunk_size = stream.read_u64::<LittleEndian>()?;
        table.push((id, chunk_size));
    }

    /* some writers emit a ds64 chunk longer than its table requires, padded
    with zeroes; skip whatever is left, as libsndfile does:
    https://github.com/libsndfile/libsndfile/blob/08d802a3d18fa19c74f38ed910d9e33f80248187/src/rf64.c#L230 */
    if size > min_size {
        stream.seek(Current((size - min_size) as i64))?;
    }

    Ok(DataSize64Chunk::with_table(
        bw64_size, data_size, dummy_size, table,
    ))
}

pub(crate) fn parse_axml_chunk<R: Read>(stream: &mut R, size: u64) -> Result<AxmlChunk, Error> {
    let mut data = vec![0u8; size as usize];
    stream.read_exact(&mut data)?;
    Ok(AxmlChunk::new(data))
}

fn parse_audio_id<R: Read + Seek>(stream: &mut R) -> Result<AudioId, Error> {
    let track_index = stream.read_u16::<LittleEndian>()?;
    let uid = read_ascii_field(stream, 12)?;
    let track_ref = read_ascii_field(stream, 14)?;
    let pack_ref = read_ascii_field(stream, 11)?;
    stream.seek(Current(1))?; // skip padding

    Ok(AudioId::new(track_index, &uid, &track_ref, &pack_ref))
}

pub(crate) fn parse_chna_chunk<R: Read + Seek>(
    stream: &mut R,
    size: u64,
) -> Result<ChnaChunk, Error> {
    if size < 4 {
        return Err(Error::ChunkTooSmall {
            signature: CHNA_SIG,
            size,
        });
    }

    let num_tracks = stream.read_u16::<LittleEndian>()?;
    let num_uids = stream.read_u16::<LittleEndian>()?;

    if size < 4 + num_uids as u64 * 40 {
        return Err(Error::ChunkTooSmall {
            signature: CHNA_SIG,
            size,
        });
    }

    let mut chunk = ChnaChunk::default();
    for _ in 0..num_uids {
        chunk.add_audio_id(parse_audio_id(stream)?);
    }

    if chunk.num_uids() != num_uids {
        return Err(Error::NumUidsMismatch {
            declared: num_uids,
            actual: chunk.num_uids(),
        });
    }
    if chunk.num_tracks() != num_tracks {
        return Err(Error::NumTracksMismatch {
            declared: num_tracks,
            actual: chunk.num_tracks(),
        });
    }

    Ok(chunk)
}

pub(crate) fn parse_cue_chunk<R: Read>(stream: &mut R, size: u64) -> Result<CueChunk, Error> {
    if size < 4 {
        return Err(Error::ChunkTooSmall {
            signature: CUE__SIG,
            size,
        });
    }

    let count = stream.read_u32::<LittleEndian>()?;
    if size != 4 + count as u64 * 24 {
        return Err(Error::CueCountMismatch { size, count });
    }

    let mut cue_points = Vec::with_capacity(count as usize);
    for _ in 0..count {
        cue_points.push(CuePoint {
            id: stream.read_u32::<LittleEndian>()?,
            position: stream.read_u32::<LittleEndian>()?,
            data_chunk_id: stream.read_fourcc()?,
            chunk_start: stream.read_u32::<LittleEndian>()?,
            block_start: stream.read_u32::<LittleEndian>()?,
            sample_offset: stream.read_u32::<LittleEndian>()?,
            label: String::new(),
        });
    }

    Ok(CueChunk::new(cue_points))
}

pub(crate) fn parse_label_chunk<R: Read>(stream: &mut R, size: u64) -> Result<LabelChunk, Error> {
    // at least the cue point id and a NUL terminator
    if size < 5 {
        return Err(Error::ChunkTooSmall {
            signature: LABL_SIG,
            size,
        });
    }

    let cue_point_id = stream.read_u32::<LittleEndian>()?;
    let mut text = vec![0u8; (size - 4) as usize];
    stream.read_exact(&mut text)?;

    // trim the terminator and any padding after it
    let trimmed: Vec<u8> = text.iter().take_while(|c| **c != 0).cloned().collect();
    let label = ASCII
        .decode(&trimmed, DecoderTrap::Ignore)
        .unwrap_or_default();

    Ok(LabelChunk::new(cue_point_id, &label))
}

pub(crate) fn parse_list_chunk<R: Read + Seek>(
    stream: &mut R,
    size: u64,
) -> Result<ListChunk, Error> {
    if size < 4 {
        return Err(Error::ChunkTooSmall {
            signature: LIST_SIG,
            size,
        });
    }

    let list_type = stream.read_fourcc()?;
    let mut sub_chunks = vec![];
    let mut bytes_read = 4u64;

    while bytes_read + 8 <= size {
        let sub_id = stream.read_fourcc()?;
        let sub_size = stream.read_u32::<LittleEndian>()? as u64;
        bytes_read += 8;

        let sub_chunk = if sub_id == LABL_SIG {
            Chunk::Label(parse_label_chunk(stream, sub_size)?)
        } else {
            stream.seek(Current(sub_size as i64))?;
            Chunk::Unknown(UnknownChunk::new(sub_id, vec![]))
        };
        bytes_read += sub_size;

        sub_chunks.push(sub_chunk);

        if sub_size % 2 == 1 {
            stream.seek(Current(1))?;
            bytes_read += 1;
        }
    }

    Ok(ListChunk::new(list_type, sub_chunks))
}
