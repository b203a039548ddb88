use std::io;

use uuid::Uuid;

pub const BASIC_PCM: u16 = 0x0001;
pub const BASIC_FLOAT: u16 = 0x0003;
pub const BASIC_EXTENSIBLE: u16 = 0xFFFE;

/* RFC 2361 §4:

 WAVE Format IDs are converted to GUIDs by inserting the hexadecimal
   value of the WAVE Format ID into the XXXXXXXX part of the following
   template: {XXXXXXXX-0000-0010-8000-00AA00389B71}. For example, a WAVE
   Format ID of 123 has the GUID value of {00000123-0000-0010-8000-
   00AA00389B71}.

*/

// The constants hold the GUIDs in their on-disk octet order: Data1 as a
// little-endian u32, Data2 and Data3 as little-endian u16, Data4 raw.

pub const KSDATAFORMAT_SUBTYPE_PCM: Uuid = Uuid::from_bytes([
    0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x10, 0x00, 0x80, 0x00, 0x00, 0xaa, 0x00, 0x38, 0x9b, 0x71,
]);

pub const KSDATAFORMAT_SUBTYPE_IEEE_FLOAT: Uuid = Uuid::from_bytes([
    0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x10, 0x00, 0x80, 0x00, 0x00, 0xaa, 0x00, 0x38, 0x9b, 0x71,
]);

/// Build a subformat GUID from a basic WAVE format tag per the RFC 2361
/// template.
pub fn subformat_for_tag(tag: u16) -> Uuid {
    let mut bytes = *KSDATAFORMAT_SUBTYPE_PCM.as_bytes();
    bytes[0..4].copy_from_slice(&(tag as u32).to_le_bytes());
    Uuid::from_bytes(bytes)
}

/// The `Data1` field of a subformat GUID, which carries the basic WAVE
/// format tag for GUIDs built from the RFC 2361 template.
pub fn subformat_data1(guid: &Uuid) -> u32 {
    let bytes = guid.as_bytes();
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

pub trait ReadGuid: io::Read {
    fn read_guid(&mut self) -> Result<Uuid, io::Error>;
}

pub trait WriteGuid: io::Write {
    fn write_guid(&mut self, guid: &Uuid) -> Result<(), io::Error>;
}

impl<T> ReadGuid for T
where
    T: io::Read,
{
    fn read_guid(&mut self) -> Result<Uuid, io::Error> {
        let mut buf = [0u8; 16];
        self.read_exact(&mut buf)?;
        Ok(Uuid::from_bytes(buf))
    }
}

impl<T> WriteGuid for T
where
    T: io::Write,
{
    fn write_guid(&mut self, guid: &Uuid) -> Result<(), io::Error> {
        self.write_all(guid.as_bytes())?;
        Ok(())
    }
}
