use crate::error::{RasterError, Result};
use flate2::read::GzDecoder;
use log::debug;
use std::{borrow::Cow, io::Read};
use tar::Archive;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const TIFF_MAGICS: [[u8; 4]; 4] = [*b"II*\0", *b"MM\0*", *b"II+\0", *b"MM\0+"];
const USTAR_OFFSET: usize = 257;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Gzip,
    Tar,
    Tiff,
    Unknown,
}

pub fn detect(bytes: &[u8]) -> PayloadKind {
    if bytes.starts_with(&GZIP_MAGIC) {
        PayloadKind::Gzip
    } else if TIFF_MAGICS.iter().any(|magic| bytes.starts_with(magic)) {
        PayloadKind::Tiff
    } else if bytes
        .get(USTAR_OFFSET..USTAR_OFFSET + 5)
        .is_some_and(|magic| magic == b"ustar")
    {
        PayloadKind::Tar
    } else {
        PayloadKind::Unknown
    }
}

/// Returns the TIFF inside a Process API response.
///
/// Accepts a bare TIFF, a tar archive holding one, or either of those
/// gzip-compressed. Bare TIFFs are borrowed, not copied.
pub fn extract_tiff(bytes: &[u8]) -> Result<Cow<'_, [u8]>> {
    match detect(bytes) {
        PayloadKind::Tiff => Ok(Cow::Borrowed(bytes)),
        PayloadKind::Tar => first_tiff_entry(bytes).map(Cow::Owned),
        PayloadKind::Gzip => {
            let inflated = gunzip(bytes)?;
            debug!("Inflated {} byte payload to {} bytes", bytes.len(), inflated.len());
            match detect(&inflated) {
                PayloadKind::Tiff => Ok(Cow::Owned(inflated)),
                PayloadKind::Tar => first_tiff_entry(&inflated).map(Cow::Owned),
                PayloadKind::Gzip | PayloadKind::Unknown => {
                    Err(RasterError::UnrecognizedPayload(inflated.len()))
                }
            }
        }
        PayloadKind::Unknown => Err(RasterError::UnrecognizedPayload(bytes.len())),
    }
}

fn gunzip(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    GzDecoder::new(bytes)
        .read_to_end(&mut output)
        .map_err(|e| RasterError::Decompression(format!("gzip: {}", e)))?;
    Ok(output)
}

fn is_tiff_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.ends_with(".tif") || lower.ends_with(".tiff")
}

fn first_tiff_entry(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut archive = Archive::new(bytes);
    for entry in archive.entries()? {
        let mut entry = entry?;
        let path = entry.path()?.into_owned();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !is_tiff_name(name) {
            continue;
        }
        let mut buf = Vec::new();
        entry.read_to_end(&mut buf)?;
        debug!("Using tar entry {} ({} bytes)", path.display(), buf.len());
        return Ok(buf);
    }
    Err(RasterError::NoTiffEntry)
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_detect() {
        let tiff = gray8_tiff(2, 2, &[0, 1, 1, 0]);
        assert_eq!(detect(&tiff), PayloadKind::Tiff);
        assert_eq!(detect(&gzip(&tiff)), PayloadKind::Gzip);
        assert_eq!(detect(&tar_of(&[("default.tif", tiff.as_slice())])), PayloadKind::Tar);
        assert_eq!(detect(b"<html>502 Bad Gateway</html>"), PayloadKind::Unknown);
        assert_eq!(detect(&[]), PayloadKind::Unknown);
    }

    #[test]
    fn test_bare_tiff_is_borrowed() {
        let tiff = gray8_tiff(2, 2, &[0, 1, 1, 0]);
        assert!(matches!(extract_tiff(&tiff).unwrap(), Cow::Borrowed(_)));
    }

    #[test]
    fn test_tar_skips_non_tiff_entries() {
        let tiff = gray8_tiff(2, 2, &[0, 1, 1, 0]);
        let archive = tar_of(&[("userdata.json", b"{}".as_slice()), ("default.TIFF", tiff.as_slice())]);
        assert_eq!(extract_tiff(&archive).unwrap().as_ref(), tiff.as_slice());
        assert_eq!(extract_tiff(&gzip(&archive)).unwrap().as_ref(), tiff.as_slice());
    }

    #[test]
    fn test_missing_entry_and_garbage() {
        let archive = tar_of(&[("userdata.json", b"{}".as_slice())]);
        assert!(matches!(extract_tiff(&archive), Err(RasterError::NoTiffEntry)));
        assert!(matches!(
            extract_tiff(&gzip(b"plain text")),
            Err(RasterError::UnrecognizedPayload(10))
        ));
        assert!(matches!(
            extract_tiff(&[0x1f, 0x8b, 0x00]),
            Err(RasterError::Decompression(_))
        ));
    }
}
