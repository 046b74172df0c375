// ABOUTME: SMPP data_coding scheme with the character set families the segmenter distinguishes
// ABOUTME: Maps raw wire values to named schemes while preserving reserved values untouched

use std::fmt;

/// Data coding scheme of a short message.
///
/// Every wire value survives a `from_byte`/`to_byte` round trip; values without a
/// named variant are carried as `Custom`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DataCoding {
    /// SMSC Default Alphabet (typically GSM 7-bit)
    #[default]
    SmscDefault,
    /// IA5 (CCITT T.50)/ASCII encoding
    Ascii,
    /// 8-bit binary data (no encoding)
    Binary,
    /// Latin-1 (ISO-8859-1) character set
    Latin1,
    /// JIS (X 0208-1990) Japanese character set
    Jis,
    /// Cyrillic (ISO-8859-5) character set
    Cyrillic,
    /// Latin/Hebrew (ISO-8859-8) character set
    LatinHebrew,
    /// UCS-2 (ISO/IEC-10646) Unicode encoding
    Ucs2,
    /// Custom/reserved data coding value
    Custom(u8),
}

impl DataCoding {
    /// Creates a DataCoding from a raw u8 value
    pub fn from_byte(value: u8) -> Self {
        match value {
            0x00 => DataCoding::SmscDefault,
            0x01 => DataCoding::Ascii,
            0x02 => DataCoding::Binary,
            0x03 => DataCoding::Latin1,
            0x05 => DataCoding::Jis,
            0x06 => DataCoding::Cyrillic,
            0x07 => DataCoding::LatinHebrew,
            0x08 => DataCoding::Ucs2,
            _ => DataCoding::Custom(value),
        }
    }

    /// Returns the raw u8 value for wire protocol
    pub fn to_byte(&self) -> u8 {
        match self {
            DataCoding::SmscDefault => 0x00,
            DataCoding::Ascii => 0x01,
            DataCoding::Binary => 0x02,
            DataCoding::Latin1 => 0x03,
            DataCoding::Jis => 0x05,
            DataCoding::Cyrillic => 0x06,
            DataCoding::LatinHebrew => 0x07,
            DataCoding::Ucs2 => 0x08,
            DataCoding::Custom(value) => *value,
        }
    }

    /// True only for data_coding 8; the message body is UTF-16BE code units.
    pub fn is_ucs2(&self) -> bool {
        matches!(self, DataCoding::Ucs2)
    }
}

impl fmt::Display for DataCoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataCoding::SmscDefault => "GSM 7-bit Default",
            DataCoding::Ascii => "ASCII/IA5",
            DataCoding::Binary => "Binary",
            DataCoding::Latin1 => "ISO-8859-1",
            DataCoding::Jis => "JIS X 0208-1990",
            DataCoding::Cyrillic => "ISO-8859-5",
            DataCoding::LatinHebrew => "ISO-8859-8",
            DataCoding::Ucs2 => "UCS-2",
            DataCoding::Custom(_) => "Custom/Reserved",
        };
        f.write_str(name)
    }
}

impl fmt::Debug for DataCoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DataCoding({:#04x})", self.to_byte())
    }
}

impl From<u8> for DataCoding {
    fn from(value: u8) -> Self {
        Self::from_byte(value)
    }
}

impl From<DataCoding> for u8 {
    fn from(data_coding: DataCoding) -> Self {
        data_coding.to_byte()
    }
}
