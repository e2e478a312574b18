//! MPEG audio frame-header walk: stream parameters from the frame chain.

use sift_core::{KeywordList, KeywordType};

/// How far into the buffer the initial sync search goes.
const MAX_SYNC_SCAN: usize = 16 * 1024;
/// Stop after this many frames; the averages are stable long before.
const MAX_FRAMES: usize = 1024;

#[derive(Clone, Copy, PartialEq)]
enum Version {
    V1,
    V2,
    V25,
}

#[derive(Clone, Copy, PartialEq)]
enum Layer {
    I,
    II,
    III,
}

struct FrameHeader {
    version: Version,
    bitrate: u32,     // bits per second
    sample_rate: u32, // Hz
    padding: u32,
    mono: bool,
}

/// Bitrate tables in kbps, indexed by the 4-bit header field.
/// Index 0 is "free format" and 15 is invalid; both reject the frame.
const BITRATES_V1: [[u32; 16]; 3] = [
    // Layer I
    [0, 32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448, 0],
    // Layer II
    [0, 32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384, 0],
    // Layer III
    [0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 0],
];
const BITRATES_V2: [[u32; 16]; 3] = [
    [0, 32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256, 0],
    [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160, 0],
    [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160, 0],
];

const SAMPLE_RATES: [[u32; 3]; 3] = [
    [44100, 48000, 32000], // V1
    [22050, 24000, 16000], // V2
    [11025, 12000, 8000],  // V2.5
];

fn parse_header(bytes: [u8; 4]) -> Option<(FrameHeader, Layer)> {
    let h = u32::from_be_bytes(bytes);
    if (h >> 21) & 0x7FF != 0x7FF {
        return None;
    }
    let version = match (h >> 19) & 3 {
        0 => Version::V25,
        2 => Version::V2,
        3 => Version::V1,
        _ => return None,
    };
    let layer = match (h >> 17) & 3 {
        1 => Layer::III,
        2 => Layer::II,
        3 => Layer::I,
        _ => return None,
    };
    let bitrate_index = ((h >> 12) & 0xF) as usize;
    let layer_index = match layer {
        Layer::I => 0,
        Layer::II => 1,
        Layer::III => 2,
    };
    let kbps = match version {
        Version::V1 => BITRATES_V1[layer_index][bitrate_index],
        _ => BITRATES_V2[layer_index][bitrate_index],
    };
    if kbps == 0 {
        return None;
    }
    let rate_index = ((h >> 10) & 3) as usize;
    if rate_index == 3 {
        return None;
    }
    let version_index = match version {
        Version::V1 => 0,
        Version::V2 => 1,
        Version::V25 => 2,
    };
    Some((
        FrameHeader {
            version,
            bitrate: kbps * 1000,
            sample_rate: SAMPLE_RATES[version_index][rate_index],
            padding: (h >> 9) & 1,
            mono: (h >> 6) & 3 == 3,
        },
        layer,
    ))
}

fn frame_len(header: &FrameHeader, layer: Layer) -> usize {
    let FrameHeader {
        bitrate,
        sample_rate,
        padding,
        ..
    } = *header;
    match layer {
        Layer::I => ((12 * bitrate / sample_rate + padding) * 4) as usize,
        _ => (144 * bitrate / sample_rate + padding) as usize,
    }
}

/// Walk the frame chain and prepend mimetype, MPEG version, and a stream
/// format summary.  Malformed input leaves `previous` unchanged.
pub fn analyze(data: &[u8], mut previous: KeywordList) -> KeywordList {
    // Find the first frame sync within the scan window.
    let window = data.len().min(MAX_SYNC_SCAN);
    let mut pos = 0;
    let mut first = None;
    while pos + 4 <= window {
        let bytes = [data[pos], data[pos + 1], data[pos + 2], data[pos + 3]];
        if let Some(parsed) = parse_header(bytes) {
            first = Some(parsed);
            break;
        }
        pos += 1;
    }
    let Some((header, layer)) = first else {
        return previous;
    };

    let version = header.version;
    let sample_rate = header.sample_rate;
    let mono = header.mono;

    let mut frames = 0usize;
    let mut bitrate_sum = 0u64;
    let mut vbr = false;
    let first_bitrate = header.bitrate;

    let mut current = Some((header, layer));
    while let Some((header, layer)) = current {
        frames += 1;
        bitrate_sum += u64::from(header.bitrate);
        if header.bitrate != first_bitrate {
            vbr = true;
        }
        if frames >= MAX_FRAMES {
            break;
        }
        let len = frame_len(&header, layer);
        if len < 4 {
            break;
        }
        let Some(next) = pos.checked_add(len) else { break };
        if next + 4 > data.len() {
            break;
        }
        pos = next;
        let bytes = [data[pos], data[pos + 1], data[pos + 2], data[pos + 3]];
        current = parse_header(bytes);
    }

    previous.prepend(KeywordType::Mimetype, "audio/mpeg");
    previous.prepend(
        KeywordType::ResourceType,
        match version {
            Version::V1 => "MPEG V1",
            Version::V2 => "MPEG V2",
            Version::V25 => "MPEG V2.5",
        },
    );

    let avg_kbps = bitrate_sum / frames as u64 / 1000;
    let seconds = if avg_kbps > 0 {
        data.len() as u64 / (avg_kbps * 125)
    } else {
        0
    };
    let format = format!(
        "{} kbps, {} hz, {}m{:02} {}{}",
        avg_kbps,
        sample_rate,
        seconds / 60,
        seconds % 60,
        if mono { "mono" } else { "stereo" },
        if vbr { " (variable bps)" } else { "" },
    );
    previous.prepend(KeywordType::Format, format);
    previous
}
