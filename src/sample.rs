//! Transcoding between caller float buffers and the on-disk sample layouts.
//!
//! PCM encoding clips to [−1.0, 1.0] and scales by the largest positive
//! sample value of the target width; rounding is half-away-from-zero.
//! IEEE-float samples are stored as little-endian binary32 without
//! clipping, so out-of-range values survive a round trip bit-exactly.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use super::errors::Error;

const I16_MAX_F: f64 = 32767.0;
const I24_MAX_F: f64 = 8388607.0;
const I32_MAX_F: f64 = 2147483647.0;

fn pcm_bytes(bits_per_sample: u16) -> Result<usize, Error> {
    match bits_per_sample {
        16 | 24 | 32 => Ok(bits_per_sample as usize / 8),
        other => Err(Error::UnsupportedBitDepth(other)),
    }
}

fn check_lengths(samples: usize, bytes: usize, bytes_per_sample: usize) -> Result<(), Error> {
    let expected = samples * bytes_per_sample;
    if bytes != expected {
        return Err(Error::InvalidBufferSize {
            buffer_size: bytes,
            expected,
        });
    }
    Ok(())
}

fn clip(sample: f32) -> f64 {
    (sample as f64).clamp(-1.0, 1.0)
}

/// Encode float samples into signed little-endian PCM of 16, 24 or 32 bits.
///
/// `output` must be exactly `input.len() × bitsPerSample/8` bytes.
pub fn encode_pcm_samples(
    input: &[f32],
    output: &mut [u8],
    bits_per_sample: u16,
) -> Result<(), Error> {
    check_lengths(input.len(), output.len(), pcm_bytes(bits_per_sample)?)?;

    let mut w: &mut [u8] = output;
    match bits_per_sample {
        16 => {
            for &sample in input {
                w.write_i16::<LittleEndian>((clip(sample) * I16_MAX_F).round() as i16)?;
            }
        }
        24 => {
            for &sample in input {
                w.write_i24::<LittleEndian>((clip(sample) * I24_MAX_F).round() as i32)?;
            }
        }
        _ => {
            for &sample in input {
                w.write_i32::<LittleEndian>((clip(sample) * I32_MAX_F).round() as i32)?;
            }
        }
    }
    Ok(())
}

/// Decode signed little-endian PCM of 16, 24 or 32 bits into float samples.
///
/// `input` must be exactly `output.len() × bitsPerSample/8` bytes. 24-bit
/// samples are sign-extended from bit 23.
pub fn decode_pcm_samples(
    input: &[u8],
    output: &mut [f32],
    bits_per_sample: u16,
) -> Result<(), Error> {
    check_lengths(output.len(), input.len(), pcm_bytes(bits_per_sample)?)?;

    let mut r: &[u8] = input;
    match bits_per_sample {
        16 => {
            for sample in output.iter_mut() {
                *sample = (r.read_i16::<LittleEndian>()? as f64 / I16_MAX_F) as f32;
            }
        }
        24 => {
            for sample in output.iter_mut() {
                *sample = (r.read_i24::<LittleEndian>()? as f64 / I24_MAX_F) as f32;
            }
        }
        _ => {
            for sample in output.iter_mut() {
                *sample = (r.read_i32::<LittleEndian>()? as f64 / I32_MAX_F) as f32;
            }
        }
    }
    Ok(())
}

/// Encode float samples as little-endian IEEE 754 binary32, bit-exactly and
/// without clipping. Only a 32-bit sample width is supported.
pub fn encode_float_samples(
    input: &[f32],
    output: &mut [u8],
    bits_per_sample: u16,
) -> Result<(), Error> {
    if bits_per_sample != 32 {
        return Err(Error::UnsupportedBitDepth(bits_per_sample));
    }
    check_lengths(input.len(), output.len(), 4)?;

    let mut w: &mut [u8] = output;
    for &sample in input {
        w.write_f32::<LittleEndian>(sample)?;
    }
    Ok(())
}

/// Decode little-endian IEEE 754 binary32 samples.
pub fn decode_float_samples(
    input: &[u8],
    output: &mut [f32],
    bits_per_sample: u16,
) -> Result<(), Error> {
    if bits_per_sample != 32 {
        return Err(Error::UnsupportedBitDepth(bits_per_sample));
    }
    check_lengths(output.len(), input.len(), 4)?;

    let mut r: &[u8] = input;
    for sample in output.iter_mut() {
        *sample = r.read_f32::<LittleEndian>()?;
    }
    Ok(())
}
