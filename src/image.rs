//! Compiled binary image container.

use std::path::Path;

use crate::config::MAX_IMAGE_SIZE;
use crate::crc::crc16;
use crate::error::{LinkError, LinkResult};

/// An immutable compiled program image ready for transfer.
///
/// The CRC is computed once over the full byte sequence at construction,
/// never incrementally during a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryImage {
    bytes: Vec<u8>,
    crc16: u16,
}

impl BinaryImage {
    /// Build an image from raw compiler output.
    ///
    /// Fails with `ImageTooLarge` if the image cannot be described by the
    /// protocol's 16-bit length fields.
    pub fn from_bytes(bytes: Vec<u8>) -> LinkResult<Self> {
        if bytes.len() > MAX_IMAGE_SIZE {
            return Err(LinkError::ImageTooLarge {
                size: bytes.len(),
                max_size: MAX_IMAGE_SIZE,
            });
        }
        let crc16 = crc16(&bytes);
        Ok(Self { bytes, crc16 })
    }

    /// Load a compiled image from a file on disk.
    pub fn from_file<P: AsRef<Path>>(path: P) -> LinkResult<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(bytes)
    }

    /// Image length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True for a zero-byte image (still transferable: header + reload only).
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The raw image bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Precomputed CRC16 over the full image.
    pub fn crc16(&self) -> u16 {
        self.crc16
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_bytes_precomputes_crc() {
        let image = BinaryImage::from_bytes(vec![0x01, 0x02, 0x03, 0x04]).unwrap();
        assert_eq!(image.len(), 4);
        assert_eq!(image.crc16(), 0x0121);
    }

    #[test]
    fn test_empty_image_is_valid() {
        let image = BinaryImage::from_bytes(vec![]).unwrap();
        assert!(image.is_empty());
        assert_eq!(image.crc16(), 0xFFFF);
    }

    #[test]
    fn test_rejects_oversized_image() {
        let result = BinaryImage::from_bytes(vec![0u8; MAX_IMAGE_SIZE + 1]);
        assert!(matches!(
            result,
            Err(LinkError::ImageTooLarge { size, max_size })
                if size == MAX_IMAGE_SIZE + 1 && max_size == MAX_IMAGE_SIZE
        ));
    }

    #[test]
    fn test_max_size_image_is_accepted() {
        let image = BinaryImage::from_bytes(vec![0u8; MAX_IMAGE_SIZE]).unwrap();
        assert_eq!(image.len(), MAX_IMAGE_SIZE);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"OpenBlink").unwrap();

        let image = BinaryImage::from_file(file.path()).unwrap();
        assert_eq!(image.as_bytes(), b"OpenBlink");
        assert_eq!(image.crc16(), 0xF118);
    }

    #[test]
    fn test_from_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let result = BinaryImage::from_file(dir.path().join("missing.bin"));
        assert!(matches!(result, Err(LinkError::Io(_))));
    }
}
