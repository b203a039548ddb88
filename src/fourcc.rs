use std::fmt::{Debug, Display};
use std::io;

/// A Four-character Code
///
/// For identifying chunks, structured contiguous slices or segments
/// within a BW64 file. Serialized as four ASCII bytes, which is the same
/// octet order a little-endian write of the corresponding 32-bit word
/// would produce.
#[derive(Eq, PartialEq, Hash, Copy, Clone)]
pub struct FourCC([u8; 4]);

impl FourCC {
    pub const fn make(s: &[u8; 4]) -> Self {
        Self(*s)
    }
}

impl From<[u8; 4]> for FourCC {
    fn from(bytes: [u8; 4]) -> Self {
        FourCC(bytes)
    }
}

impl From<FourCC> for [u8; 4] {
    fn from(fourcc: FourCC) -> Self {
        fourcc.0
    }
}

impl From<&FourCC> for String {
    fn from(f: &FourCC) -> Self {
        f.0.iter().map(|b| *b as char).collect::<String>()
    }
}

impl From<FourCC> for String {
    fn from(f: FourCC) -> Self {
        String::from(&f)
    }
}

impl Debug for FourCC {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::result::Result<(), std::fmt::Error> {
        let s: String = self.into();
        write!(f, "FourCC({})", s)
    }
}

impl Display for FourCC {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s: String = self.into();
        write!(f, "{}", s)
    }
}

pub trait ReadFourCC: io::Read {
    fn read_fourcc(&mut self) -> Result<FourCC, io::Error>;
}

pub trait WriteFourCC: io::Write {
    fn write_fourcc(&mut self, fourcc: FourCC) -> Result<(), io::Error>;
}

impl<T> ReadFourCC for T
where
    T: io::Read,
{
    fn read_fourcc(&mut self) -> Result<FourCC, io::Error> {
        let mut buf: [u8; 4] = [0; 4];
        self.read_exact(&mut buf)?;
        Ok(FourCC::from(buf))
    }
}

impl<T> WriteFourCC for T
where
    T: io::Write,
{
    fn write_fourcc(&mut self, fourcc: FourCC) -> Result<(), io::Error> {
        let buf: [u8; 4] = fourcc.into();
        self.write_all(&buf)?;
        Ok(())
    }
}

pub const RIFF_SIG: FourCC = FourCC::make(b"RIFF");
pub const WAVE_SIG: FourCC = FourCC::make(b"WAVE");
pub const RF64_SIG: FourCC = FourCC::make(b"RF64");
pub const BW64_SIG: FourCC = FourCC::make(b"BW64");
pub const DS64_SIG: FourCC = FourCC::make(b"ds64");

pub const FMT__SIG: FourCC = FourCC::make(b"fmt ");
pub const DATA_SIG: FourCC = FourCC::make(b"data");

pub const CHNA_SIG: FourCC = FourCC::make(b"chna");
pub const AXML_SIG: FourCC = FourCC::make(b"axml");

pub const JUNK_SIG: FourCC = FourCC::make(b"JUNK");
pub const LIST_SIG: FourCC = FourCC::make(b"LIST");

pub const CUE__SIG: FourCC = FourCC::make(b"cue ");
pub const ADTL_SIG: FourCC = FourCC::make(b"adtl");
pub const LABL_SIG: FourCC = FourCC::make(b"labl");
