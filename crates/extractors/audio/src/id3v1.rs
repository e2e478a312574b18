//! The 128-byte ID3v1 tag at the end of a file.

use sift_core::convert::{convert_to_utf8, trim_field};
use sift_core::{KeywordList, KeywordType};

/// The classic genre table; an ID3v1 genre byte (and a `(nn)` reference in
/// an ID3v2 TCON frame) indexes into it.
pub static GENRES: [&str; 148] = [
    "Blues", "Classic Rock", "Country", "Dance", "Disco", "Funk", "Grunge",
    "Hip-Hop", "Jazz", "Metal", "New Age", "Oldies", "Other", "Pop", "R&B",
    "Rap", "Reggae", "Rock", "Techno", "Industrial", "Alternative", "Ska",
    "Death Metal", "Pranks", "Soundtrack", "Euro-Techno", "Ambient",
    "Trip-Hop", "Vocal", "Jazz+Funk", "Fusion", "Trance", "Classical",
    "Instrumental", "Acid", "House", "Game", "Sound Clip", "Gospel", "Noise",
    "Alt. Rock", "Bass", "Soul", "Punk", "Space", "Meditative",
    "Instrumental Pop", "Instrumental Rock", "Ethnic", "Gothic", "Darkwave",
    "Techno-Industrial", "Electronic", "Pop-Folk", "Eurodance", "Dream",
    "Southern Rock", "Comedy", "Cult", "Gangsta Rap", "Top 40",
    "Christian Rap", "Pop/Funk", "Jungle", "Native American", "Cabaret",
    "New Wave", "Psychedelic", "Rave", "Showtunes", "Trailer", "Lo-Fi",
    "Tribal", "Acid Punk", "Acid Jazz", "Polka", "Retro", "Musical",
    "Rock & Roll", "Hard Rock", "Folk", "Folk/Rock", "National Folk",
    "Swing", "Fast-Fusion", "Bebob", "Latin", "Revival", "Celtic",
    "Bluegrass", "Avantgarde", "Gothic Rock", "Progressive Rock",
    "Psychedelic Rock", "Symphonic Rock", "Slow Rock", "Big Band", "Chorus",
    "Easy Listening", "Acoustic", "Humour", "Speech", "Chanson", "Opera",
    "Chamber Music", "Sonata", "Symphony", "Booty Bass", "Primus",
    "Porn Groove", "Satire", "Slow Jam", "Club", "Tango", "Samba",
    "Folklore", "Ballad", "Power Ballad", "Rhythmic Soul", "Freestyle",
    "Duet", "Punk Rock", "Drum Solo", "A Cappella", "Euro-House",
    "Dance Hall", "Goa", "Drum & Bass", "Club-House", "Hardcore", "Terror",
    "Indie", "BritPop", "Negerpunk", "Polsk Punk", "Beat",
    "Christian Gangsta Rap", "Heavy Metal", "Black Metal", "Crossover",
    "Contemporary Christian", "Christian Rock", "Merengue", "Salsa",
    "Thrash Metal", "Anime", "JPop", "Synthpop",
];

pub struct Tag {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub year: String,
    pub comment: String,
    pub genre: Option<&'static str>,
}

/// Parse the trailing ID3v1 tag, `None` when absent.  Fields are Latin-1,
/// NUL-padded.
pub fn parse(data: &[u8]) -> Option<Tag> {
    if data.len() < 128 {
        return None;
    }
    let tag = &data[data.len() - 128..];
    if &tag[..3] != b"TAG" {
        return None;
    }

    let text = |range: std::ops::Range<usize>| -> String {
        trim_field(&convert_to_utf8(&tag[range], "ISO-8859-1")).to_string()
    };
    Some(Tag {
        title: text(3..33),
        artist: text(33..63),
        album: text(63..93),
        year: text(93..97),
        comment: text(97..127),
        genre: GENRES.get(tag[127] as usize).copied(),
    })
}

impl Tag {
    /// Prepend the non-empty fields onto `previous`.
    pub fn prepend_records(&self, mut previous: KeywordList) -> KeywordList {
        for (value, keyword_type) in [
            (&self.title, KeywordType::Title),
            (&self.artist, KeywordType::Artist),
            (&self.album, KeywordType::Album),
            (&self.year, KeywordType::Date),
            (&self.comment, KeywordType::Comment),
        ] {
            if !value.is_empty() {
                previous.prepend(keyword_type, value.clone());
            }
        }
        if let Some(genre) = self.genre {
            previous.prepend(KeywordType::Genre, genre);
        }
        previous
    }
}
