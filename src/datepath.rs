//! Derive a date directory name from a file's embedded capture metadata.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use exif::{In, Tag, Value};

use crate::error::MetadataError;

/// Read the capture timestamp of a photo/video file. Prefers the
/// DateTimeOriginal tag and falls back to DateTime.
pub fn capture_time(path: &Path) -> Result<NaiveDateTime, MetadataError> {
    let f = File::open(path)?;
    let mut r = BufReader::new(f);
    let x = exif::Reader::new().read_from_container(&mut r)?;

    let field = x
        .get_field(Tag::DateTimeOriginal, In::PRIMARY)
        .or_else(|| x.get_field(Tag::DateTime, In::PRIMARY))
        .ok_or(MetadataError::NoCaptureTime)?;

    let ascii = match &field.value {
        Value::Ascii(v) if !v.is_empty() => &v[0],
        _ => return Err(MetadataError::NoCaptureTime),
    };
    let dt = exif::DateTime::from_ascii(ascii)
        .map_err(|e| MetadataError::BadTimestamp(e.to_string()))?;

    NaiveDate::from_ymd_opt(i32::from(dt.year), u32::from(dt.month), u32::from(dt.day))
        .and_then(|d| {
            d.and_hms_opt(
                u32::from(dt.hour),
                u32::from(dt.minute),
                u32::from(dt.second),
            )
        })
        .ok_or_else(|| {
            MetadataError::BadTimestamp(format!(
                "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                dt.year, dt.month, dt.day, dt.hour, dt.minute, dt.second
            ))
        })
}

/// Format the capture time of `path` with a strftime pattern, yielding the
/// relative directory name the file sorts into. The caller joins it with the
/// destination root and file name.
pub fn date_path(path: &Path, format: &str) -> Result<String, MetadataError> {
    let tm = capture_time(path)?;
    Ok(tm.format(format).to_string())
}

/// Build a minimal JPEG whose only content is an EXIF segment carrying one
/// DateTimeOriginal tag, so metadata tests need no binary assets on disk.
#[cfg(test)]
pub(crate) fn exif_jpeg(datetime: &str) -> Vec<u8> {
    assert_eq!(datetime.len(), 19, "expected YYYY:MM:DD HH:MM:SS");

    // TIFF body, little endian, offsets relative to the "II" header.
    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"II\x2a\x00");
    tiff.extend_from_slice(&8u32.to_le_bytes()); // IFD0 offset

    // IFD0: one entry pointing at the Exif sub-IFD.
    tiff.extend_from_slice(&1u16.to_le_bytes());
    tiff.extend_from_slice(&0x8769u16.to_le_bytes()); // ExifIFDPointer
    tiff.extend_from_slice(&4u16.to_le_bytes()); // LONG
    tiff.extend_from_slice(&1u32.to_le_bytes());
    tiff.extend_from_slice(&26u32.to_le_bytes()); // sub-IFD offset
    tiff.extend_from_slice(&0u32.to_le_bytes()); // next IFD

    // Exif sub-IFD at 26: one DateTimeOriginal entry.
    tiff.extend_from_slice(&1u16.to_le_bytes());
    tiff.extend_from_slice(&0x9003u16.to_le_bytes()); // DateTimeOriginal
    tiff.extend_from_slice(&2u16.to_le_bytes()); // ASCII
    tiff.extend_from_slice(&20u32.to_le_bytes());
    tiff.extend_from_slice(&44u32.to_le_bytes()); // value offset
    tiff.extend_from_slice(&0u32.to_le_bytes()); // next IFD

    // Value at 44: the timestamp plus its NUL terminator.
    tiff.extend_from_slice(datetime.as_bytes());
    tiff.push(0);

    let mut jpeg = Vec::new();
    jpeg.extend_from_slice(&[0xff, 0xd8]); // SOI
    jpeg.extend_from_slice(&[0xff, 0xe1]); // APP1
    let app1_len = (2 + 6 + tiff.len()) as u16;
    jpeg.extend_from_slice(&app1_len.to_be_bytes());
    jpeg.extend_from_slice(b"Exif\x00\x00");
    jpeg.extend_from_slice(&tiff);
    jpeg.extend_from_slice(&[0xff, 0xd9]); // EOI
    jpeg
}
