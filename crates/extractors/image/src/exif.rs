//! Bounded EXIF (TIFF IFD) decoder.
//!
//! The payload of a JPEG APP1 segment is a little TIFF file: a byte-order
//! mark, then chained image file directories whose 12-byte entries hold a
//! tag, a field type, a count, and either an inline value or an offset back
//! into the payload.  Offsets and counts are attacker-controlled; every one
//! is validated against the payload length before being dereferenced, and
//! the directory chain is cut after a fixed number of hops so crafted
//! offset cycles cannot loop the walk.
//!
//! IFD1 describes the embedded thumbnail; its JPEG bytes are smuggled into
//! the keyword list through [`sift_core::codec::binary_encode`].

use sift_core::codec::binary_encode;
use sift_core::convert::convert_to_utf8;
use sift_core::{KeywordList, KeywordType};
use tracing::debug;

/// IFD0 + linked IFD1 + one Exif sub-IFD is all a sane file has.
const MAX_IFDS: usize = 4;
const MAX_ENTRIES: usize = 256;
/// An embedded thumbnail larger than this is not a thumbnail.
const MAX_THUMBNAIL: usize = 128 * 1024;

const TYPE_ASCII: u16 = 2;
const TYPE_SHORT: u16 = 3;
const TYPE_LONG: u16 = 4;

const TAG_DESCRIPTION: u16 = 0x010E;
const TAG_MAKE: u16 = 0x010F;
const TAG_MODEL: u16 = 0x0110;
const TAG_ORIENTATION: u16 = 0x0112;
const TAG_SOFTWARE: u16 = 0x0131;
const TAG_DATETIME: u16 = 0x0132;
const TAG_ARTIST: u16 = 0x013B;
const TAG_COPYRIGHT: u16 = 0x8298;
const TAG_EXIF_IFD: u16 = 0x8769;
const TAG_THUMB_OFFSET: u16 = 0x0201;
const TAG_THUMB_LENGTH: u16 = 0x0202;
const TAG_ISO: u16 = 0x8827;
const TAG_DATETIME_ORIGINAL: u16 = 0x9003;

struct Reader<'a> {
    tiff: &'a [u8],
    big_endian: bool,
}

impl<'a> Reader<'a> {
    fn u16_at(&self, offset: usize) -> Option<u16> {
        let bytes = self.tiff.get(offset..offset + 2)?;
        Some(if self.big_endian {
            u16::from_be_bytes([bytes[0], bytes[1]])
        } else {
            u16::from_le_bytes([bytes[0], bytes[1]])
        })
    }

    fn u32_at(&self, offset: usize) -> Option<u32> {
        let bytes = self.tiff.get(offset..offset + 4)?;
        Some(if self.big_endian {
            u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
        } else {
            u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
        })
    }
}

struct Entry {
    tag: u16,
    field_type: u16,
    count: u32,
    /// Offset of the 4-byte value/offset cell itself.
    cell: usize,
}

fn entry_at(reader: &Reader<'_>, offset: usize) -> Option<Entry> {
    Some(Entry {
        tag: reader.u16_at(offset)?,
        field_type: reader.u16_at(offset + 2)?,
        count: reader.u32_at(offset + 4)?,
        cell: offset + 8,
    })
}

/// Where an entry's data lives: inline in the cell when it fits, behind an
/// offset otherwise.  `None` when the claimed extent leaves the payload.
fn value_bytes<'a>(reader: &Reader<'a>, entry: &Entry) -> Option<&'a [u8]> {
    let elem = match entry.field_type {
        1 | TYPE_ASCII | 7 => 1usize,
        TYPE_SHORT => 2,
        TYPE_LONG => 4,
        5 | 10 => 8, // rationals
        _ => return None,
    };
    let total = elem.checked_mul(entry.count as usize)?;
    if total > 1 << 20 {
        return None;
    }
    let start = if total <= 4 {
        entry.cell
    } else {
        reader.u32_at(entry.cell)? as usize
    };
    let end = start.checked_add(total)?;
    reader.tiff.get(start..end)
}

fn ascii_value(reader: &Reader<'_>, entry: &Entry) -> Option<String> {
    if entry.field_type != TYPE_ASCII {
        return None;
    }
    let bytes = value_bytes(reader, entry)?;
    let text = convert_to_utf8(bytes, "ISO-8859-1");
    let text = text.trim_matches('\0').trim().to_string();
    (!text.is_empty()).then_some(text)
}

fn short_value(reader: &Reader<'_>, entry: &Entry) -> Option<u32> {
    match entry.field_type {
        TYPE_SHORT => reader.u16_at(entry.cell).map(u32::from),
        TYPE_LONG => reader.u32_at(entry.cell),
        _ => None,
    }
}

fn orientation_name(value: u32) -> Option<&'static str> {
    Some(match value {
        1 => "top, left",
        2 => "top, right",
        3 => "bottom, right",
        4 => "bottom, left",
        5 => "left, top",
        6 => "right, top",
        7 => "right, bottom",
        8 => "left, bottom",
        _ => return None,
    })
}

pub fn analyze(tiff: &[u8], mut previous: KeywordList) -> KeywordList {
    let big_endian = match tiff.get(..4) {
        Some(b"II\x2a\x00") => false,
        Some(b"MM\x00\x2a") => true,
        _ => return previous,
    };
    let reader = Reader { tiff, big_endian };
    let Some(first_ifd) = reader.u32_at(4) else {
        return previous;
    };

    let mut queue: Vec<usize> = vec![first_ifd as usize];
    let mut visited = 0usize;
    let mut thumb_offset: Option<u32> = None;
    let mut thumb_length: Option<u32> = None;

    while let Some(ifd_offset) = queue.pop() {
        visited += 1;
        if visited > MAX_IFDS {
            break;
        }
        let Some(raw_count) = reader.u16_at(ifd_offset) else { break };
        let count = (raw_count as usize).min(MAX_ENTRIES);

        for i in 0..count {
            let Some(entry_offset) = ifd_offset
                .checked_add(2)
                .and_then(|base| base.checked_add(i * 12))
            else {
                break;
            };
            let Some(entry) = entry_at(&reader, entry_offset) else { break };

            let text_tag = match entry.tag {
                TAG_DESCRIPTION => Some(KeywordType::Description),
                TAG_MAKE => Some(KeywordType::CameraMake),
                TAG_MODEL => Some(KeywordType::CameraModel),
                TAG_SOFTWARE => Some(KeywordType::Software),
                TAG_DATETIME | TAG_DATETIME_ORIGINAL => Some(KeywordType::Date),
                TAG_ARTIST => Some(KeywordType::Creator),
                TAG_COPYRIGHT => Some(KeywordType::Copyright),
                _ => None,
            };
            if let Some(keyword_type) = text_tag {
                if let Some(value) = ascii_value(&reader, &entry) {
                    previous.prepend(keyword_type, value);
                }
                continue;
            }

            match entry.tag {
                TAG_ORIENTATION => {
                    if let Some(name) = short_value(&reader, &entry).and_then(orientation_name)
                    {
                        previous.prepend(KeywordType::Orientation, name);
                    }
                }
                TAG_ISO => {
                    if let Some(value) = short_value(&reader, &entry) {
                        previous.prepend(KeywordType::IsoSpeed, value.to_string());
                    }
                }
                TAG_EXIF_IFD => {
                    if let Some(sub) = short_value(&reader, &entry) {
                        queue.push(sub as usize);
                    }
                }
                TAG_THUMB_OFFSET => thumb_offset = short_value(&reader, &entry),
                TAG_THUMB_LENGTH => thumb_length = short_value(&reader, &entry),
                _ => {}
            }
        }

        // The next-IFD link sits after the entry table.
        if let Some(link_offset) = ifd_offset
            .checked_add(2)
            .and_then(|base| base.checked_add(count * 12))
        {
            if let Some(next) = reader.u32_at(link_offset) {
                if next != 0 {
                    queue.push(next as usize);
                }
            }
        }
    }

    if let (Some(offset), Some(length)) = (thumb_offset, thumb_length) {
        let start = offset as usize;
        let len = length as usize;
        if len > 0 && len <= MAX_THUMBNAIL {
            if let Some(end) = start.checked_add(len) {
                if let Some(bytes) = tiff.get(start..end) {
                    match binary_encode(bytes) {
                        Ok(encoded) => previous.prepend(KeywordType::ThumbnailData, encoded),
                        Err(e) => debug!("thumbnail encoding failed: {e}"),
                    }
                }
            }
        }
    }
    previous
}
