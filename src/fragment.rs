//! Fragment files
//!
//! A fragment file stores one encoded fragment together with what is needed
//! to rebuild the codec and decode it:
//!
//! ```text
//! "NTEC" | header fields (little endian) | payload | properties text
//! ```
//!
//! The CRC-32 covers every header field except itself, then the payload,
//! then the properties text.

use crate::config::{CodecConfig, CodecKind};
use crate::error::FecError;
use crate::fec::{Properties, RsMatrixType};
use binrw::{BinRead, BinWrite};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;
use thiserror::Error;

pub const VERSION: u8 = 1;

/// Errors reading or writing fragment files
#[derive(Debug, Error)]
pub enum FragmentError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Header could not be parsed (bad magic, truncated file)
    #[error("Malformed fragment header: {0}")]
    Format(#[from] binrw::Error),

    #[error("Unsupported fragment version {0}")]
    UnsupportedVersion(u8),

    #[error("Unknown codec id {0}")]
    UnknownCodec(u8),

    #[error("Unknown matrix type id {0}")]
    UnknownMatrix(u8),

    /// Declared payload and properties run past the end of the stream
    #[error("Fragment declares {declared} content bytes but only {available} remain")]
    Truncated { declared: u64, available: u64 },

    #[error("Checksum mismatch: header says {expected:#010x}, content hashes to {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("Properties are not valid UTF-8")]
    PropertiesEncoding,

    #[error(transparent)]
    Codec(#[from] FecError),
}

#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little, magic = b"NTEC")]
pub struct FragmentHeader {
    pub version: u8,
    pub codec: u8,
    pub word_size: u8,
    pub matrix: u8,
    pub n_data: u32,
    pub n_parities: u32,
    /// Fragment id within the code word
    pub index: u32,
    /// Length of the protected file before padding
    pub original_len: u64,
    pub payload_len: u64,
    pub crc32: u32,
    pub props_len: u32,
}

impl FragmentHeader {
    /// Codec parameters recorded in the header
    pub fn codec_config(&self) -> Result<CodecConfig, FragmentError> {
        let kind =
            CodecKind::from_id(self.codec).ok_or(FragmentError::UnknownCodec(self.codec))?;
        let matrix = match self.matrix {
            0 => RsMatrixType::Vandermonde,
            1 => RsMatrixType::Cauchy,
            other => return Err(FragmentError::UnknownMatrix(other)),
        };
        Ok(CodecConfig {
            kind,
            word_size: self.word_size as usize,
            n_data: self.n_data as usize,
            n_parities: self.n_parities as usize,
            matrix,
        })
    }
}

fn matrix_id(matrix: RsMatrixType) -> u8 {
    match matrix {
        RsMatrixType::Vandermonde => 0,
        RsMatrixType::Cauchy => 1,
    }
}

fn checksum(header: &FragmentHeader, payload: &[u8], props: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&[header.version, header.codec, header.word_size, header.matrix]);
    hasher.update(&header.n_data.to_le_bytes());
    hasher.update(&header.n_parities.to_le_bytes());
    hasher.update(&header.index.to_le_bytes());
    hasher.update(&header.original_len.to_le_bytes());
    hasher.update(&header.payload_len.to_le_bytes());
    hasher.update(&header.props_len.to_le_bytes());
    hasher.update(payload);
    hasher.update(props);
    hasher.finalize()
}

/// One fragment with its header and side channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub header: FragmentHeader,
    pub payload: Vec<u8>,
    pub props: Properties,
}

impl Fragment {
    pub fn new(
        config: &CodecConfig,
        index: usize,
        original_len: u64,
        payload: Vec<u8>,
        props: Properties,
    ) -> Self {
        let props_text = props.to_string();
        let mut header = FragmentHeader {
            version: VERSION,
            codec: config.kind.id(),
            word_size: config.word_size as u8,
            matrix: matrix_id(config.matrix),
            n_data: config.n_data as u32,
            n_parities: config.n_parities as u32,
            index: index as u32,
            original_len,
            payload_len: payload.len() as u64,
            crc32: 0,
            props_len: props_text.len() as u32,
        };
        header.crc32 = checksum(&header, &payload, props_text.as_bytes());
        Self {
            header,
            payload,
            props,
        }
    }

    pub fn index(&self) -> usize {
        self.header.index as usize
    }

    pub fn write_to<W: Write + Seek>(&self, writer: &mut W) -> Result<(), FragmentError> {
        self.header.write(writer)?;
        writer.write_all(&self.payload)?;
        writer.write_all(self.props.to_string().as_bytes())?;
        Ok(())
    }

    pub fn read_from<R: Read + Seek>(reader: &mut R) -> Result<Self, FragmentError> {
        let header = FragmentHeader::read(reader)?;
        if header.version != VERSION {
            return Err(FragmentError::UnsupportedVersion(header.version));
        }

        // lengths are untrusted until the checksum passes
        let position = reader.stream_position()?;
        let end = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(position))?;
        let available = end.saturating_sub(position);
        let declared = header.payload_len.saturating_add(header.props_len as u64);
        if declared > available {
            return Err(FragmentError::Truncated {
                declared,
                available,
            });
        }

        let mut payload = vec![0u8; header.payload_len as usize];
        reader.read_exact(&mut payload)?;
        let mut props_bytes = vec![0u8; header.props_len as usize];
        reader.read_exact(&mut props_bytes)?;

        let actual = checksum(&header, &payload, &props_bytes);
        if actual != header.crc32 {
            return Err(FragmentError::ChecksumMismatch {
                expected: header.crc32,
                actual,
            });
        }

        let props_text =
            std::str::from_utf8(&props_bytes).map_err(|_| FragmentError::PropertiesEncoding)?;
        let props = props_text.parse()?;
        Ok(Self {
            header,
            payload,
            props,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), FragmentError> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, FragmentError> {
        let mut reader = BufReader::new(File::open(path)?);
        Self::read_from(&mut reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fec::ValueLocation;
    use std::io::Cursor;

    /// Magic plus the fixed-size header fields
    const HEADER_LEN: usize = 44;

    fn sample() -> Fragment {
        let mut props = Properties::new();
        props.add(ValueLocation::new(6, 2), "3");
        let config = CodecConfig::new(CodecKind::RsNf4, 4, 3, 2);
        Fragment::new(&config, 2, 17, vec![1, 2, 3, 4, 5, 6, 7, 8], props)
    }

    fn bytes_of(fragment: &Fragment) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        fragment.write_to(&mut cursor).unwrap();
        cursor.into_inner()
    }

    #[test]
    fn round_trip_through_bytes() {
        let fragment = sample();
        let bytes = bytes_of(&fragment);
        assert_eq!(&bytes[..4], b"NTEC");
        let back = Fragment::read_from(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(back, fragment);
        assert_eq!(back.index(), 2);

        let config = back.header.codec_config().unwrap();
        assert_eq!(config.kind, CodecKind::RsNf4);
        assert_eq!(config.word_size, 4);
        assert_eq!(config.n_data, 3);
    }

    #[test]
    fn corrupted_payload_fails_the_checksum() {
        let mut bytes = bytes_of(&sample());
        bytes[HEADER_LEN + 3] ^= 0x40;
        let err = Fragment::read_from(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, FragmentError::ChecksumMismatch { .. }));
    }

    #[test]
    fn bad_magic_and_version_are_rejected() {
        let mut bytes = bytes_of(&sample());
        bytes[0] = b'X';
        assert!(matches!(
            Fragment::read_from(&mut Cursor::new(bytes)),
            Err(FragmentError::Format(_))
        ));

        let mut bytes = bytes_of(&sample());
        bytes[4] = 9;
        assert!(matches!(
            Fragment::read_from(&mut Cursor::new(bytes)),
            Err(FragmentError::UnsupportedVersion(9))
        ));
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let mut bytes = bytes_of(&sample());
        bytes.truncate(bytes.len() - 5);
        let available = (bytes.len() - HEADER_LEN) as u64;
        assert!(matches!(
            Fragment::read_from(&mut Cursor::new(bytes)),
            Err(FragmentError::Truncated { declared, available: a })
                if declared == available + 5 && a == available
        ));
    }

    #[test]
    fn oversized_lengths_are_rejected_before_allocating() {
        let mut bytes = bytes_of(&sample());
        bytes[28..36].fill(0xFF);
        assert!(matches!(
            Fragment::read_from(&mut Cursor::new(bytes)),
            Err(FragmentError::Truncated { declared: u64::MAX, .. })
        ));

        let mut bytes = bytes_of(&sample());
        bytes[40..44].fill(0xFF);
        assert!(matches!(
            Fragment::read_from(&mut Cursor::new(bytes)),
            Err(FragmentError::Truncated { .. })
        ));
    }

    #[test]
    fn corrupted_header_fields_fail_the_checksum() {
        // index, original_len, n_data, word_size
        for (at, flip) in [(16usize, 0x01u8), (20, 0x80), (8, 0x02), (6, 0x04)] {
            let mut bytes = bytes_of(&sample());
            bytes[at] ^= flip;
            let err = Fragment::read_from(&mut Cursor::new(bytes)).unwrap_err();
            assert!(
                matches!(err, FragmentError::ChecksumMismatch { .. }),
                "byte {}: {:?}",
                at,
                err
            );
        }
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fragment.bin");
        let fragment = sample();
        fragment.save(&path).unwrap();
        assert_eq!(Fragment::load(&path).unwrap(), fragment);
    }

    #[test]
    fn unknown_ids_in_header() {
        let mut header = sample().header;
        header.codec = 7;
        assert!(matches!(header.codec_config(), Err(FragmentError::UnknownCodec(7))));
        header.codec = 0;
        header.matrix = 5;
        assert!(matches!(header.codec_config(), Err(FragmentError::UnknownMatrix(5))));
    }
}
