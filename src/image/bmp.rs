//! Byte-exact reader/writer for uncompressed 24-bit bitmap files.
//!
//! Layout handled here:
//!
//! - 14-byte file header: `"BM"`, file size, two reserved words, pixel offset.
//! - 40-byte info header: size, signed width, signed height (negative means
//!   rows are stored top-down), planes, bit depth, compression, image size,
//!   horizontal/vertical resolution, palette size, important colors.
//! - Any bytes between the info header and the pixel offset (larger header
//!   variants, masks, palettes) are kept verbatim as `gap`.
//! - Pixel payload: `row_stride * |height|` bytes of B,G,R rows padded to 4
//!   bytes, followed by whatever trailing bytes the file carries (`trailer`).
//!
//! Headers are never recomputed on write, so `read` followed by `write`
//! reproduces the input file exactly unless the payload was replaced.
use super::bgr::{row_stride, BgrView};
use crate::error::{Error, Result};
use log::debug;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

pub const FILE_HEADER_LEN: usize = 14;
pub const INFO_HEADER_LEN: usize = 40;
pub const SIGNATURE: [u8; 2] = *b"BM";

/// Leading fixed-size file header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BmpFileHeader {
    pub signature: [u8; 2],
    pub file_size: u32,
    pub reserved1: u16,
    pub reserved2: u16,
    pub pixel_offset: u32,
}

/// Fixed-size info header following the file header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BmpInfoHeader {
    pub header_size: u32,
    pub width: i32,
    /// Positive: bottom-up rows. Negative: top-down rows.
    pub height: i32,
    pub planes: u16,
    pub bit_count: u16,
    pub compression: u32,
    pub image_size: u32,
    pub x_pixels_per_meter: i32,
    pub y_pixels_per_meter: i32,
    pub colors_used: u32,
    pub colors_important: u32,
}

struct LeCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> LeCursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buf[self.pos..self.pos + N]);
        self.pos += N;
        out
    }

    fn u16(&mut self) -> u16 {
        u16::from_le_bytes(self.take())
    }

    fn u32(&mut self) -> u32 {
        u32::from_le_bytes(self.take())
    }

    fn i32(&mut self) -> i32 {
        i32::from_le_bytes(self.take())
    }
}

impl BmpFileHeader {
    pub fn decode(bytes: &[u8; FILE_HEADER_LEN]) -> Self {
        let mut c = LeCursor::new(bytes);
        Self {
            signature: c.take(),
            file_size: c.u32(),
            reserved1: c.u16(),
            reserved2: c.u16(),
            pixel_offset: c.u32(),
        }
    }

    pub fn encode(&self) -> [u8; FILE_HEADER_LEN] {
        let mut out = [0u8; FILE_HEADER_LEN];
        out[0..2].copy_from_slice(&self.signature);
        out[2..6].copy_from_slice(&self.file_size.to_le_bytes());
        out[6..8].copy_from_slice(&self.reserved1.to_le_bytes());
        out[8..10].copy_from_slice(&self.reserved2.to_le_bytes());
        out[10..14].copy_from_slice(&self.pixel_offset.to_le_bytes());
        out
    }
}

impl BmpInfoHeader {
    pub fn decode(bytes: &[u8; INFO_HEADER_LEN]) -> Self {
        let mut c = LeCursor::new(bytes);
        Self {
            header_size: c.u32(),
            width: c.i32(),
            height: c.i32(),
            planes: c.u16(),
            bit_count: c.u16(),
            compression: c.u32(),
            image_size: c.u32(),
            x_pixels_per_meter: c.i32(),
            y_pixels_per_meter: c.i32(),
            colors_used: c.u32(),
            colors_important: c.u32(),
        }
    }

    pub fn encode(&self) -> [u8; INFO_HEADER_LEN] {
        let mut out = Vec::with_capacity(INFO_HEADER_LEN);
        out.extend_from_slice(&self.header_size.to_le_bytes());
        out.extend_from_slice(&self.width.to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
        out.extend_from_slice(&self.planes.to_le_bytes());
        out.extend_from_slice(&self.bit_count.to_le_bytes());
        out.extend_from_slice(&self.compression.to_le_bytes());
        out.extend_from_slice(&self.image_size.to_le_bytes());
        out.extend_from_slice(&self.x_pixels_per_meter.to_le_bytes());
        out.extend_from_slice(&self.y_pixels_per_meter.to_le_bytes());
        out.extend_from_slice(&self.colors_used.to_le_bytes());
        out.extend_from_slice(&self.colors_important.to_le_bytes());
        let mut fixed = [0u8; INFO_HEADER_LEN];
        fixed.copy_from_slice(&out);
        fixed
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.width.unsigned_abs() as usize
    }

    /// Number of rows, regardless of storage order.
    pub fn height(&self) -> usize {
        self.height.unsigned_abs() as usize
    }

    pub fn is_top_down(&self) -> bool {
        self.height < 0
    }

    pub fn row_stride(&self) -> usize {
        row_stride(self.width())
    }

    /// Size of the pixel payload in bytes.
    pub fn pixel_bytes(&self) -> usize {
        self.row_stride() * self.height()
    }

    fn check(&self) -> std::result::Result<(), String> {
        if (self.header_size as usize) < INFO_HEADER_LEN {
            return Err(format!("info header size {} < 40", self.header_size));
        }
        if self.width <= 0 {
            return Err(format!("width {} must be positive", self.width));
        }
        if self.height == 0 {
            return Err("height is zero".to_string());
        }
        if self.bit_count != 24 {
            return Err(format!("{} bits per pixel, only 24 is supported", self.bit_count));
        }
        if self.compression != 0 {
            return Err(format!("compression method {} is not supported", self.compression));
        }
        let stride = (self.width() as u64 * 3 + 3) & !3;
        let payload = stride * self.height() as u64;
        if usize::try_from(payload).is_err() {
            return Err(format!("{payload}-byte pixel payload is not addressable"));
        }
        Ok(())
    }
}

/// A decoded bitmap: headers, preserved framing bytes and the pixel payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BmpImage {
    pub file_header: BmpFileHeader,
    pub info_header: BmpInfoHeader,
    /// Bytes between the 54-byte headers and the pixel offset.
    pub gap: Vec<u8>,
    pub pixels: Vec<u8>,
    /// Bytes following the pixel payload.
    pub trailer: Vec<u8>,
}

impl BmpImage {
    /// Build a canonical 54-byte-header image around `pixels`.
    pub fn from_pixels(width: usize, height: i32, pixels: Vec<u8>) -> Result<Self> {
        let offset = (FILE_HEADER_LEN + INFO_HEADER_LEN) as u32;
        let too_large = || {
            Error::format(
                "<memory>",
                format!("{width}x{height} does not fit the 32-bit header fields"),
            )
        };
        let expected = row_stride(width)
            .checked_mul(height.unsigned_abs() as usize)
            .ok_or_else(too_large)?;
        let image_size = u32::try_from(expected).map_err(|_| too_large())?;
        let file_size = image_size.checked_add(offset).ok_or_else(too_large)?;
        let width_field = i32::try_from(width).map_err(|_| too_large())?;
        if pixels.len() != expected || width == 0 || height == 0 {
            return Err(Error::format(
                "<memory>",
                format!("{width}x{height} needs {expected} payload bytes, got {}", pixels.len()),
            ));
        }
        let file_header = BmpFileHeader {
            signature: SIGNATURE,
            file_size,
            reserved1: 0,
            reserved2: 0,
            pixel_offset: offset,
        };
        let info_header = BmpInfoHeader {
            header_size: INFO_HEADER_LEN as u32,
            width: width_field,
            height,
            planes: 1,
            bit_count: 24,
            compression: 0,
            image_size,
            x_pixels_per_meter: 2835,
            y_pixels_per_meter: 2835,
            colors_used: 0,
            colors_important: 0,
        };
        Ok(Self {
            file_header,
            info_header,
            gap: Vec::new(),
            pixels,
            trailer: Vec::new(),
        })
    }

    pub fn width(&self) -> usize {
        self.info_header.width()
    }

    pub fn height(&self) -> usize {
        self.info_header.height()
    }

    pub fn row_stride(&self) -> usize {
        self.info_header.row_stride()
    }

    pub fn view(&self) -> BgrView<'_> {
        BgrView::new(self.width(), &self.pixels)
    }

    /// Same headers and framing around a different payload of equal length.
    pub fn with_pixels(&self, pixels: Vec<u8>) -> Result<Self> {
        if pixels.len() != self.pixels.len() {
            return Err(Error::format(
                "<memory>",
                format!(
                    "replacement payload is {} bytes, image holds {}",
                    pixels.len(),
                    self.pixels.len()
                ),
            ));
        }
        Ok(Self {
            file_header: self.file_header,
            info_header: self.info_header,
            gap: self.gap.clone(),
            pixels,
            trailer: self.trailer.clone(),
        })
    }

    /// Decode a bitmap from `path`.
    pub fn read(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        Self::read_from(path, io::BufReader::new(file))
    }

    fn read_from<R: Read>(path: &Path, mut reader: R) -> Result<Self> {
        let mut fh = [0u8; FILE_HEADER_LEN];
        read_header(path, &mut reader, &mut fh, "file header")?;
        let file_header = BmpFileHeader::decode(&fh);
        if file_header.signature != SIGNATURE {
            return Err(Error::format(
                path,
                format!("bad signature {:02x?}", file_header.signature),
            ));
        }

        let mut ih = [0u8; INFO_HEADER_LEN];
        read_header(path, &mut reader, &mut ih, "info header")?;
        let info_header = BmpInfoHeader::decode(&ih);
        info_header.check().map_err(|reason| Error::format(path, reason))?;

        let offset = file_header.pixel_offset as usize;
        let headers = FILE_HEADER_LEN + INFO_HEADER_LEN;
        if offset < headers {
            return Err(Error::format(
                path,
                format!("pixel offset {offset} overlaps the headers"),
            ));
        }
        let gap = read_declared(path, &mut reader, offset - headers, "header gap")?;
        let pixels = read_declared(path, &mut reader, info_header.pixel_bytes(), "pixel payload")?;

        let mut trailer = Vec::new();
        reader
            .read_to_end(&mut trailer)
            .map_err(|e| Error::io(path, e))?;

        debug!(
            "read {}: {}x{} ({}), stride={} gap={} trailer={}",
            path.display(),
            info_header.width(),
            info_header.height(),
            if info_header.is_top_down() { "top-down" } else { "bottom-up" },
            info_header.row_stride(),
            gap.len(),
            trailer.len()
        );

        Ok(Self {
            file_header,
            info_header,
            gap,
            pixels,
            trailer,
        })
    }

    /// Serialize the image to `out` exactly as it will land on disk.
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        write_parts(
            out,
            &self.file_header,
            &self.info_header,
            &self.gap,
            &self.pixels,
            &self.trailer,
        )
    }

    /// Atomically write the image to `path`.
    pub fn write(&self, path: &Path) -> Result<()> {
        self.check_payload(path)?;
        persist_atomically(path, |out| self.write_to(out))
    }

    fn check_payload(&self, path: &Path) -> Result<()> {
        check_payload(path, &self.info_header, self.pixels.len())
    }
}

/// Write headers verbatim, zero-fill up to the pixel offset, then the payload.
///
/// The destination is replaced atomically; on failure it is left untouched.
pub fn write(
    path: &Path,
    file_header: &BmpFileHeader,
    info_header: &BmpInfoHeader,
    pixels: &[u8],
) -> Result<()> {
    check_payload(path, info_header, pixels.len())?;
    persist_atomically(path, |out| {
        write_parts(out, file_header, info_header, &[], pixels, &[])
    })
}

fn check_payload(path: &Path, info_header: &BmpInfoHeader, len: usize) -> Result<()> {
    if len != info_header.pixel_bytes() {
        return Err(Error::format(
            path,
            format!(
                "pixel payload is {len} bytes, header declares {}",
                info_header.pixel_bytes()
            ),
        ));
    }
    Ok(())
}

fn write_parts<W: Write>(
    out: &mut W,
    file_header: &BmpFileHeader,
    info_header: &BmpInfoHeader,
    gap: &[u8],
    pixels: &[u8],
    trailer: &[u8],
) -> io::Result<()> {
    out.write_all(&file_header.encode())?;
    out.write_all(&info_header.encode())?;
    out.write_all(gap)?;
    let written = FILE_HEADER_LEN + INFO_HEADER_LEN + gap.len();
    let offset = file_header.pixel_offset as usize;
    if offset > written {
        out.write_all(&vec![0u8; offset - written])?;
    }
    out.write_all(pixels)?;
    out.write_all(trailer)?;
    Ok(())
}

fn read_header<R: Read>(path: &Path, reader: &mut R, buf: &mut [u8], what: &str) -> Result<()> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => Error::format(path, format!("truncated {what}")),
        _ => Error::io(path, e),
    })
}

/// Read exactly `len` bytes. The buffer grows with the data actually read,
/// so a header that overstates the payload costs nothing before the short
/// read is detected.
fn read_declared<R: Read>(path: &Path, reader: &mut R, len: usize, what: &str) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader
        .take(len as u64)
        .read_to_end(&mut buf)
        .map_err(|e| Error::io(path, e))?;
    if buf.len() < len {
        let short = io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("{what} ends after {} of {len} declared bytes", buf.len()),
        );
        return Err(Error::io(path, short));
    }
    Ok(buf)
}

fn persist_atomically<F>(path: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<&File>) -> io::Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;

    let tmp = NamedTempFile::new_in(dir).map_err(|e| Error::io(dir, e))?;
    {
        let mut out = BufWriter::new(tmp.as_file());
        fill(&mut out)
            .and_then(|_| out.flush())
            .map_err(|e| Error::io(path, e))?;
    }
    tmp.persist(path).map_err(|e| Error::io(path, e.error))?;
    debug!("wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(width: usize, height: i32) -> BmpImage {
        let len = row_stride(width) * height.unsigned_abs() as usize;
        let pixels = (0..len).map(|i| (i * 7 % 251) as u8).collect();
        BmpImage::from_pixels(width, height, pixels).unwrap()
    }

    fn to_bytes(img: &BmpImage) -> Vec<u8> {
        let mut out = Vec::new();
        img.write_to(&mut out).unwrap();
        out
    }

    #[test]
    fn headers_encode_what_they_decode() {
        let img = sample(5, -3);
        let bytes = to_bytes(&img);
        let mut fh = [0u8; FILE_HEADER_LEN];
        fh.copy_from_slice(&bytes[..14]);
        let mut ih = [0u8; INFO_HEADER_LEN];
        ih.copy_from_slice(&bytes[14..54]);
        assert_eq!(BmpFileHeader::decode(&fh), img.file_header);
        assert_eq!(BmpInfoHeader::decode(&ih), img.info_header);
        assert_eq!(img.file_header.encode(), fh);
        assert_eq!(img.info_header.encode(), ih);
        assert_eq!(&bytes[..2], b"BM");
        assert_eq!(bytes.len(), 54 + 16 * 3);
    }

    #[test]
    fn from_pixels_rejects_sizes_the_headers_cannot_hold() {
        // 0x5555_5558 bytes per row, three rows: past u32::MAX in total.
        let width = 0x1C71_C71D;
        let err = BmpImage::from_pixels(width, 3, Vec::new()).unwrap_err();
        assert!(err.to_string().contains("32-bit header fields"), "{err}");

        let img = sample(3, -2);
        assert_eq!(img.info_header.image_size, 24);
        assert_eq!(img.file_header.file_size, 54 + 24);
    }

    #[test]
    fn signed_height_selects_row_order() {
        let up = sample(2, 4);
        let down = sample(2, -4);
        assert!(!up.info_header.is_top_down());
        assert!(down.info_header.is_top_down());
        assert_eq!(up.height(), 4);
        assert_eq!(down.height(), 4);
    }

    #[test]
    fn rejects_bad_signature() {
        let mut bytes = to_bytes(&sample(2, 2));
        bytes[0] = b'X';
        let err = BmpImage::read_from(Path::new("x.bmp"), &bytes[..]).unwrap_err();
        assert!(matches!(err, Error::Format { .. }), "{err}");
    }

    #[test]
    fn truncated_header_is_a_format_error() {
        let bytes = to_bytes(&sample(2, 2));
        let err = BmpImage::read_from(Path::new("x.bmp"), &bytes[..30]).unwrap_err();
        assert!(matches!(err, Error::Format { .. }), "{err}");
    }

    #[test]
    fn short_payload_is_an_io_error() {
        let bytes = to_bytes(&sample(4, 4));
        let err = BmpImage::read_from(Path::new("x.bmp"), &bytes[..bytes.len() - 5]).unwrap_err();
        assert!(matches!(err, Error::Io { .. }), "{err}");
    }

    #[test]
    fn oversized_declaration_on_a_short_file_is_an_io_error() {
        let mut img = sample(2, 2);
        img.info_header.width = i32::MAX;
        img.info_header.height = i32::MAX;
        let mut bytes = img.file_header.encode().to_vec();
        bytes.extend_from_slice(&img.info_header.encode());
        bytes.extend_from_slice(&[0x55; 6]);
        assert_eq!(bytes.len(), 60);

        let err = BmpImage::read_from(Path::new("x.bmp"), &bytes[..]).unwrap_err();
        match err {
            Error::Io { source, .. } => {
                assert_eq!(source.kind(), io::ErrorKind::UnexpectedEof);
                assert!(source.to_string().contains("6 of"), "{source}");
            }
            other => panic!("expected an io error, got {other}"),
        }
    }

    #[test]
    fn gap_past_end_of_file_is_an_io_error() {
        let mut img = sample(2, 2);
        img.file_header.pixel_offset = u32::MAX;
        let mut bytes = img.file_header.encode().to_vec();
        bytes.extend_from_slice(&img.info_header.encode());
        bytes.extend_from_slice(&img.pixels);
        let err = BmpImage::read_from(Path::new("x.bmp"), &bytes[..]).unwrap_err();
        assert!(matches!(err, Error::Io { .. }), "{err}");
        assert!(err.to_string().contains("header gap"), "{err}");
    }

    #[test]
    fn rejects_non_24_bit_and_compressed() {
        let mut img = sample(2, 2);
        img.info_header.bit_count = 32;
        let err = BmpImage::read_from(Path::new("x.bmp"), &to_bytes(&img)[..]).unwrap_err();
        assert!(err.to_string().contains("bits per pixel"), "{err}");

        let mut img = sample(2, 2);
        img.info_header.compression = 1;
        let err = BmpImage::read_from(Path::new("x.bmp"), &to_bytes(&img)[..]).unwrap_err();
        assert!(err.to_string().contains("compression"), "{err}");
    }

    #[test]
    fn gap_and_trailer_survive_a_round_trip() {
        let mut img = sample(3, 2);
        img.info_header.header_size = 56;
        img.gap = vec![0xAB; 16 + 8];
        img.file_header.pixel_offset = 54 + 24;
        img.trailer = vec![1, 2, 3];
        let bytes = to_bytes(&img);
        let back = BmpImage::read_from(Path::new("x.bmp"), &bytes[..]).unwrap();
        assert_eq!(back, img);
        assert_eq!(to_bytes(&back), bytes);
    }

    #[test]
    fn free_write_zero_fills_up_to_pixel_offset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bmp");
        let mut img = sample(1, 1);
        img.file_header.pixel_offset = 60;
        write(&path, &img.file_header, &img.info_header, &img.pixels).unwrap();
        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes[54..60], &[0u8; 6]);
        assert_eq!(&bytes[60..], &img.pixels[..]);
    }

    #[test]
    fn failed_write_leaves_destination_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keep.bmp");
        fs::write(&path, b"original").unwrap();
        let mut img = sample(2, 2);
        img.pixels.pop();
        assert!(img.write(&path).is_err());
        assert_eq!(fs::read(&path).unwrap(), b"original");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn write_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/out.bmp");
        let img = sample(4, 3);
        img.write(&path).unwrap();
        assert_eq!(BmpImage::read(&path).unwrap(), img);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = BmpImage::read(Path::new("/definitely/not/here.bmp")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
