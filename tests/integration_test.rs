use std::f32::consts::PI;
use std::io::{Cursor, SeekFrom};

use bw64file::{
    read_file, write_file, write_file_with_config, AudioId, AxmlChunk, Bw64Reader, Bw64Writer,
    ChnaChunk, CuePoint, Error, ErrorKind, WriterConfig, BASIC_EXTENSIBLE, BW64_SIG, CHNA_SIG,
    DS64_SIG, KSDATAFORMAT_SUBTYPE_IEEE_FLOAT,
};

fn sine_440(sample_rate: u32, frames: u64) -> Vec<f32> {
    (0..frames)
        .map(|i| 0.5 * (2.0 * PI * 440.0 * i as f32 / sample_rate as f32).sin())
        .collect()
}

#[test]
fn pcm16_round_trip() -> Result<(), Error> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pcm16_round_trip.wav");

    let sample_rate = 44100;
    let frames = 88200u64;
    let audio = sine_440(sample_rate, frames);

    let mut writer = write_file(&path, 1, sample_rate, 16, None, None)?;
    assert_eq!(writer.write(&audio, frames)?, frames);
    writer.close()?;
    drop(writer);

    let mut reader = read_file(&path)?;
    assert_eq!(reader.channels(), 1);
    assert_eq!(reader.sample_rate(), 44100);
    assert_eq!(reader.bit_depth(), 16);
    assert_eq!(reader.number_of_frames(), frames);

    let mut read_back = vec![0f32; frames as usize];
    assert_eq!(reader.read(&mut read_back, frames)?, frames);
    assert!(reader.eof()?);

    for (orig, decoded) in audio.iter().zip(&read_back) {
        assert!((orig - decoded).abs() <= 1.0 / 32767.0);
    }
    Ok(())
}

fn out_of_range_test_signal(channels: u16, frames: u64) -> Vec<f32> {
    let test_values = [-3.5f32, -2.0, -1.0, -0.5, 0.0, 0.5, 1.0, 2.0, 3.5];
    (0..frames as usize * channels as usize)
        .map(|i| test_values[(i / channels as usize) % test_values.len()])
        .collect()
}

#[test]
fn float_extensible_with_channel_mask() -> Result<(), Error> {
    let channels = 2u16;
    let frames = 1000u64;
    let audio = out_of_range_test_signal(channels, frames);

    let mut file = Cursor::new(vec![0u8; 0]);
    {
        let config = WriterConfig {
            channels,
            sample_rate: 48000,
            bit_depth: 32,
            use_extensible: true,
            use_float: true,
            channel_mask: 0x3,
            ..WriterConfig::default()
        };
        let mut writer = Bw64Writer::new(&mut file, config, vec![])?;
        assert_eq!(writer.format_tag(), BASIC_EXTENSIBLE);
        assert_eq!(writer.write(&audio, frames)?, frames);
        writer.close()?;
    }

    let mut reader = Bw64Reader::new(file)?;
    assert_eq!(reader.format_tag(), BASIC_EXTENSIBLE);
    assert_eq!(reader.number_of_frames(), frames);

    let format = reader.format_chunk();
    assert!(format.is_extensible());
    assert!(format.is_float());
    let extra = format.extra_data().unwrap();
    assert_eq!(extra.channel_mask(), 0x3);
    assert_eq!(*extra.sub_format(), KSDATAFORMAT_SUBTYPE_IEEE_FLOAT);

    // float samples survive bit-exactly, out-of-range values included
    let mut read_back = vec![0f32; audio.len()];
    assert_eq!(reader.read(&mut read_back, frames)?, frames);
    for (orig, decoded) in audio.iter().zip(&read_back) {
        assert_eq!(orig.to_bits(), decoded.to_bits());
    }
    Ok(())
}

#[test]
fn pcm_clips_out_of_range_values() -> Result<(), Error> {
    let channels = 2u16;
    let frames = 1000u64;
    let audio = out_of_range_test_signal(channels, frames);

    let mut file = Cursor::new(vec![0u8; 0]);
    {
        let config = WriterConfig {
            channels,
            sample_rate: 48000,
            bit_depth: 32,
            ..WriterConfig::default()
        };
        let mut writer = Bw64Writer::new(&mut file, config, vec![])?;
        writer.write(&audio, frames)?;
        writer.close()?;
    }

    let mut reader = Bw64Reader::new(file)?;
    assert!(!reader.format_chunk().is_float());

    let mut read_back = vec![0f32; audio.len()];
    reader.read(&mut read_back, frames)?;

    let tolerance = 1.0 / (2147483647.0f64) as f32;
    for (orig, decoded) in audio.iter().zip(&read_back) {
        let expected = orig.clamp(-1.0, 1.0);
        assert!(
            (expected - decoded).abs() <= tolerance,
            "{} read back as {}",
            orig,
            decoded
        );
    }
    Ok(())
}

#[test]
fn markers_with_labels() -> Result<(), Error> {
    let sample_rate = 44100u32;
    let frames = 88200u64;
    let audio = sine_440(sample_rate, frames);
    let seconds = |s: f64| (sample_rate as f64 * s) as u64;

    let mut file = Cursor::new(vec![0u8; 0]);
    {
        let config = WriterConfig {
            channels: 1,
            sample_rate,
            bit_depth: 16,
            max_markers: 5,
            ..WriterConfig::default()
        };
        let mut writer = Bw64Writer::new(&mut file, config, vec![])?;

        writer.add_marker(3, seconds(1.5), "M3")?;
        writer.add_marker(1, seconds(0.5), "M1")?;
        writer.add_marker(2, seconds(1.0), "M2")?;
        writer.add_marker(5, seconds(2.5), "M5")?;
        writer.add_marker(4, seconds(2.0), "M4")?;

        let err = writer.add_marker(1, seconds(2.0), "duplicate").unwrap_err();
        assert!(matches!(err, Error::DuplicateCuePointId(1)));
        assert_eq!(err.kind(), ErrorKind::State);

        writer.write(&audio, frames)?;
        writer.close()?;
    }

    let reader = Bw64Reader::new(file)?;
    let markers = reader.get_markers();
    assert_eq!(markers.len(), 5);

    // sorted by position, with the labels joined back on
    for (n, marker) in markers.iter().enumerate() {
        let expected_id = n as u32 + 1;
        assert_eq!(marker.id, expected_id);
        assert_eq!(marker.position as u64, seconds(0.5 * expected_id as f64));
        assert_eq!(marker.label, format!("M{}", expected_id));
    }

    let marker = reader.find_marker_by_id(2).unwrap();
    assert_eq!(marker.position as u64, seconds(1.0));
    assert_eq!(marker.label, "M2");

    assert!(reader.find_marker_by_id(999).is_none());
    Ok(())
}

#[test]
fn markers_from_cue_points() -> Result<(), Error> {
    let mut file = Cursor::new(vec![0u8; 0]);
    {
        let config = WriterConfig {
            channels: 1,
            sample_rate: 44100,
            bit_depth: 16,
            max_markers: 5,
            ..WriterConfig::default()
        };
        let mut writer = Bw64Writer::new(&mut file, config, vec![])?;

        writer.add_marker_point(CuePoint::new(1, 22050, "Marker 1"))?;
        writer.add_markers(vec![
            CuePoint::new(2, 44100, "Marker 2"),
            CuePoint::new(3, 66150, "Marker 3"),
        ])?;
        writer.add_marker(4, 88200, "Marker 4")?;

        writer.write(&[0.0f32; 100], 100)?;
        writer.close()?;
    }

    let reader = Bw64Reader::new(file)?;
    let markers = reader.get_markers();
    assert_eq!(markers.len(), 4);
    assert_eq!(markers[0].label, "Marker 1");
    assert_eq!(markers[1].data_chunk_id, bw64file::DATA_SIG);
    assert_eq!(markers[2].sample_offset, 66150);
    assert_eq!(markers[3].id, 4);
    Ok(())
}

#[test]
fn marker_capacity_overflow_fails_at_close() -> Result<(), Error> {
    let mut file = Cursor::new(vec![0u8; 0]);
    let config = WriterConfig {
        channels: 1,
        sample_rate: 44100,
        bit_depth: 16,
        max_markers: 2,
        ..WriterConfig::default()
    };
    let mut writer = Bw64Writer::new(&mut file, config, vec![])?;

    // in-memory additions beyond the reservation succeed...
    writer.add_marker(1, 100, "M1")?;
    writer.add_marker(2, 200, "M2")?;
    writer.add_marker(3, 300, "M3")?;

    writer.write(&[0.0f32; 400], 400)?;

    // ...but the serialized cue chunk no longer fits its reservation
    let err = writer.close().unwrap_err();
    assert!(matches!(err, Error::ChunkTooLarge { .. }));
    assert_eq!(err.kind(), ErrorKind::Capacity);
    Ok(())
}

#[test]
fn fewer_markers_than_reserved() -> Result<(), Error> {
    let mut file = Cursor::new(vec![0u8; 0]);
    {
        let config = WriterConfig {
            channels: 1,
            sample_rate: 48000,
            bit_depth: 24,
            max_markers: 5,
            ..WriterConfig::default()
        };
        let mut writer = Bw64Writer::new(&mut file, config, vec![])?;
        writer.add_marker(1, 1000, "first")?;
        writer.add_marker(2, 2000, "")?;
        writer.write(&[0.0f32; 4000], 4000)?;
        writer.close()?;
    }

    let reader = Bw64Reader::new(file)?;
    let markers = reader.get_markers();
    assert_eq!(markers.len(), 2);
    assert_eq!(markers[0].label, "first");
    assert_eq!(markers[1].label, "");
    Ok(())
}

#[test]
fn unused_marker_reservation_disappears() -> Result<(), Error> {
    let mut file = Cursor::new(vec![0u8; 0]);
    {
        let config = WriterConfig {
            max_markers: 4,
            ..WriterConfig::default()
        };
        let mut writer = Bw64Writer::new(&mut file, config, vec![])?;
        writer.write(&[0.0f32; 16], 16)?;
        writer.close()?;
    }

    let reader = Bw64Reader::new(file)?;
    assert!(reader.cue_chunk().is_none());
    assert!(reader.get_markers().is_empty());
    Ok(())
}

#[test]
fn chna_and_axml_round_trip() -> Result<(), Error> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chna_axml.wav");

    let mut chna = ChnaChunk::default();
    chna.add_audio_id(AudioId::new(1, "ATU_00000001", "AT_00010001_01", "AP_00010001"));
    chna.add_audio_id(AudioId::new(2, "ATU_00000002", "AT_00010002_01", "AP_00010001"));
    let axml = AxmlChunk::new(b"<audioFormatExtended/>".to_vec());

    let mut writer = write_file(&path, 2, 48000, 24, Some(chna.clone()), Some(axml.clone()))?;
    writer.write(&[0.0f32; 96], 48)?;
    writer.close()?;
    drop(writer);

    let reader = read_file(&path)?;
    assert_eq!(reader.chna_chunk(), Some(&chna));
    assert_eq!(reader.axml_chunk(), Some(&axml));
    assert_eq!(reader.number_of_frames(), 48);
    Ok(())
}

#[test]
fn axml_as_post_data_chunk() -> Result<(), Error> {
    let mut file = Cursor::new(vec![0u8; 0]);
    let axml = AxmlChunk::new(b"<coreMetadata/>".to_vec());

    {
        let mut writer = Bw64Writer::new(&mut file, WriterConfig::default(), vec![])?;
        // 9 frames of 24-bit mono leave the data chunk odd, so a pad byte
        // precedes the post-data chunks
        writer.write(&[0.0f32; 9], 9)?;
        writer.set_axml_chunk(axml.clone())?;
        writer.close()?;
    }

    let reader = Bw64Reader::new(file)?;
    assert_eq!(reader.axml_chunk(), Some(&axml));
    assert_eq!(reader.number_of_frames(), 9);
    Ok(())
}

#[test]
fn set_chna_chunk_overwrites_reservation() -> Result<(), Error> {
    let mut file = Cursor::new(vec![0u8; 0]);
    let mut chna = ChnaChunk::default();
    chna.add_audio_id(AudioId::new(1, "ATU_00000001", "AT_00010001_01", "AP_00010001"));

    {
        let mut writer = Bw64Writer::new(&mut file, WriterConfig::default(), vec![])?;
        writer.write(&[0.0f32; 32], 32)?;
        writer.set_chna_chunk(chna.clone())?;
        writer.write(&[0.0f32; 32], 32)?;
        writer.close()?;
    }

    let reader = Bw64Reader::new(file)?;
    assert_eq!(reader.chna_chunk(), Some(&chna));
    assert_eq!(reader.number_of_frames(), 64);
    Ok(())
}

#[test]
fn set_chna_chunk_rejects_oversized_table() -> Result<(), Error> {
    let mut file = Cursor::new(vec![0u8; 0]);
    let mut writer = Bw64Writer::new(&mut file, WriterConfig::default(), vec![])?;

    let mut chna = ChnaChunk::default();
    for n in 1..=1025u32 {
        chna.add_audio_id(AudioId::new(
            (n % u16::MAX as u32 + 1) as u16,
            &format!("ATU_{:08}", n),
            "AT_00010001_01",
            "AP_00010001",
        ));
    }
    let err = writer.set_chna_chunk(chna).unwrap_err();
    assert!(matches!(err, Error::TooManyTrackUids(1025)));
    assert_eq!(err.kind(), ErrorKind::Capacity);
    Ok(())
}

#[test]
fn default_chna_layout_written() -> Result<(), Error> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("default_chna.wav");

    let config = WriterConfig {
        channels: 2,
        ..WriterConfig::default()
    };
    let mut writer = write_file_with_config(&path, config, vec![])?;
    writer.write(&[0.0f32; 32], 16)?;
    writer.close()?;
    drop(writer);

    let reader = read_file(&path)?;
    let chna = reader.chna_chunk().unwrap();
    assert_eq!(chna.num_uids(), 2);
    assert_eq!(chna.num_tracks(), 2);
    assert_eq!(chna.audio_ids()[0].uid(), "ATU_00000001");
    assert_eq!(chna.audio_ids()[1].track_ref(), "AT_00010002_01");
    Ok(())
}

#[test]
fn seek_tell_and_eof() -> Result<(), Error> {
    let frames = 100u64;
    let audio: Vec<f32> = (0..frames).map(|i| i as f32 / frames as f32).collect();

    let mut file = Cursor::new(vec![0u8; 0]);
    {
        let config = WriterConfig {
            channels: 1,
            sample_rate: 48000,
            bit_depth: 32,
            use_float: true,
            ..WriterConfig::default()
        };
        let mut writer = Bw64Writer::new(&mut file, config, vec![])?;
        writer.write(&audio, frames)?;
        writer.close()?;
    }

    let mut reader = Bw64Reader::new(file)?;
    assert_eq!(reader.tell()?, 0);
    assert!(!reader.eof()?);

    assert_eq!(reader.seek(SeekFrom::Start(50))?, 50);
    let mut buffer = vec![0f32; frames as usize];
    let read = reader.read(&mut buffer, frames)?;
    assert_eq!(read, 50); // clamped to the frames remaining
    assert_eq!(buffer[0], audio[50]);
    assert!(reader.eof()?);

    assert_eq!(reader.seek(SeekFrom::End(-10))?, 90);
    assert_eq!(reader.tell()?, 90);
    assert_eq!(reader.seek(SeekFrom::Current(-40))?, 50);
    assert_eq!(reader.seek(SeekFrom::Current(-1000))?, 0); // clamped low
    assert_eq!(reader.seek(SeekFrom::Start(5000))?, frames); // clamped high
    Ok(())
}

#[test]
fn raw_round_trip() -> Result<(), Error> {
    let mut file = Cursor::new(vec![0u8; 0]);
    let raw: Vec<u8> = (0..64u8).collect(); // 32 frames of 16-bit mono

    {
        let config = WriterConfig {
            channels: 1,
            sample_rate: 48000,
            bit_depth: 16,
            ..WriterConfig::default()
        };
        let mut writer = Bw64Writer::new(&mut file, config, vec![])?;
        assert_eq!(writer.write_raw(&raw, 32)?, 32);

        // a short buffer is rejected before anything is written
        let err = writer.write_raw(&raw[..63], 32).unwrap_err();
        assert!(matches!(err, Error::InvalidBufferSize { .. }));
        writer.close()?;
    }

    let mut reader = Bw64Reader::new(file)?;
    assert_eq!(reader.number_of_frames(), 32);

    let mut read_back = vec![0u8; 64];
    assert_eq!(reader.read_raw(&mut read_back, 32)?, 32);
    assert_eq!(read_back, raw);
    Ok(())
}

/// Synthesize a minimal BW64 file whose data chunk's raw 32-bit size field
/// is the 0xFFFFFFFF marker, so its true size must come from the ds64
/// chunk.
fn synthesized_bw64(data: &[u8]) -> Vec<u8> {
    use byteorder::{LittleEndian, WriteBytesExt};
    use std::io::Write;

    let mut bytes: Vec<u8> = vec![];
    bytes.write_all(b"BW64").unwrap();
    bytes.write_u32::<LittleEndian>(u32::MAX).unwrap();
    bytes.write_all(b"WAVE").unwrap();

    // ds64: body sizes for the container and the data chunk
    let riff_size = (4 + (8 + 28) + (8 + 16) + (8 + data.len())) as u64;
    bytes.write_all(b"ds64").unwrap();
    bytes.write_u32::<LittleEndian>(28).unwrap();
    bytes.write_u64::<LittleEndian>(riff_size).unwrap();
    bytes.write_u64::<LittleEndian>(data.len() as u64).unwrap();
    bytes.write_u64::<LittleEndian>(0).unwrap();
    bytes.write_u32::<LittleEndian>(0).unwrap();

    // fmt: mono 16-bit PCM at 48 kHz
    bytes.write_all(b"fmt ").unwrap();
    bytes.write_u32::<LittleEndian>(16).unwrap();
    bytes.write_u16::<LittleEndian>(1).unwrap();
    bytes.write_u16::<LittleEndian>(1).unwrap();
    bytes.write_u32::<LittleEndian>(48000).unwrap();
    bytes.write_u32::<LittleEndian>(96000).unwrap();
    bytes.write_u16::<LittleEndian>(2).unwrap();
    bytes.write_u16::<LittleEndian>(16).unwrap();

    bytes.write_all(b"data").unwrap();
    bytes.write_u32::<LittleEndian>(u32::MAX).unwrap();
    bytes.write_all(data).unwrap();

    bytes
}

#[test]
fn ds64_overrides_data_size() -> Result<(), Error> {
    let data = [1u8, 0, 2, 0, 3, 0, 4, 0]; // 4 frames of 16-bit mono
    let mut reader = Bw64Reader::new(Cursor::new(synthesized_bw64(&data)))?;

    assert_eq!(reader.file_format(), BW64_SIG);
    assert!(reader.has_chunk(DS64_SIG));
    let ds64 = reader.ds64_chunk().unwrap();
    assert_eq!(ds64.data_size(), 8);
    assert_eq!(reader.number_of_frames(), 4);

    let mut read_back = [0f32; 4];
    assert_eq!(reader.read(&mut read_back, 4)?, 4);
    assert!((read_back[2] - 3.0 / 32767.0).abs() < 1e-9);
    Ok(())
}

#[test]
fn missing_ds64_in_bw64_rejected() {
    let mut bytes = synthesized_bw64(&[0u8; 8]);
    bytes[12..16].copy_from_slice(b"dsXX");
    let err = Bw64Reader::new(Cursor::new(bytes)).unwrap_err();
    assert!(matches!(err, Error::MissingRequiredDS64));
}

#[test]
fn truncated_chunk_rejected() {
    let data = [0u8; 8];
    let mut bytes = synthesized_bw64(&data);
    bytes.truncate(bytes.len() - 4); // data chunk now ends past EOF
    let err = Bw64Reader::new(Cursor::new(bytes)).unwrap_err();
    assert!(matches!(err, Error::ChunkOutOfBounds { .. }));
}

#[test]
fn garbage_header_rejected() {
    let err = Bw64Reader::new(Cursor::new(b"MP3 junk data".to_vec())).unwrap_err();
    assert!(matches!(err, Error::HeaderNotRecognized));

    let err = Bw64Reader::new(Cursor::new(b"RIFF\x00\x00\x00\x00AVI ".to_vec())).unwrap_err();
    assert!(matches!(err, Error::NotAWaveFile));
}

#[test]
fn unknown_chunks_preserved() -> Result<(), Error> {
    let data = [0u8; 8];
    let mut bytes = synthesized_bw64(&data);

    // append a vendor chunk after the data chunk
    use byteorder::{LittleEndian, WriteBytesExt};
    use std::io::Write;
    bytes.write_all(b"xtra").unwrap();
    bytes.write_u32::<LittleEndian>(4).unwrap();
    bytes.write_all(b"\xDE\xAD\xBE\xEF").unwrap();

    // grow the ds64 bw64Size to match
    let riff_size = (bytes.len() - 8) as u64;
    bytes[20..28].copy_from_slice(&riff_size.to_le_bytes());

    let reader = Bw64Reader::new(Cursor::new(bytes))?;
    let xtra = bw64file::FourCC::make(b"xtra");
    assert!(reader.has_chunk(xtra));
    Ok(())
}

// Promoting a file past 4 GiB takes minutes of wall time, so this runs
// only on request: `cargo test -- --ignored`
#[test]
#[ignore]
fn oversize_file_promoted_to_bw64() -> Result<(), Error> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("promoted.wav");

    let config = WriterConfig {
        channels: 1,
        sample_rate: 48000,
        bit_depth: 16,
        ..WriterConfig::default()
    };
    let mut writer = write_file_with_config(&path, config, vec![])?;

    let block = vec![0u8; 8 << 20]; // 8 MiB of frames per write
    let block_frames = block.len() as u64 / 2;
    let mut written = 0u64;
    while written * 2 <= u32::MAX as u64 {
        writer.write_raw(&block, block_frames)?;
        written += block_frames;
    }
    writer.close()?;
    drop(writer);

    let reader = read_file(&path)?;
    assert_eq!(reader.file_format(), BW64_SIG);
    assert_eq!(reader.file_size(), u32::MAX);
    let ds64 = reader.ds64_chunk().unwrap();
    assert_eq!(ds64.data_size(), written * 2);
    assert_eq!(reader.number_of_frames(), written);
    assert!(reader.has_chunk(CHNA_SIG));
    Ok(())
}
