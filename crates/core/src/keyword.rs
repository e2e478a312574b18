//! Keyword records and the list transformations that operate on them.
//!
//! A [`KeywordList`] is the value threaded through the analyzer chain.  New
//! findings are prepended, so the logical head of the list always holds the
//! most recent analyzer's output.  The `extract_last*` queries scan
//! head-to-tail and keep the *last* match, which means the earliest-inserted
//! record for a type wins unless a later analyzer deliberately re-prepends.
//! Several analyzers rely on that scan direction (the mimetype blacklist
//! check, for one), so it must not change.

use serde::Serialize;

/// Semantic class of a metadata record.
///
/// The discriminants are dense, stable, and start at zero; [`HIGHEST_TYPE_NUMBER`]
/// bounds the valid range.  Raw values outside `[0, HIGHEST_TYPE_NUMBER)` have
/// no name and are treated as invalid for display purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u32)]
pub enum KeywordType {
    Unknown = 0,
    Filename = 1,
    Mimetype = 2,
    Title = 3,
    Author = 4,
    Artist = 5,
    Description = 6,
    Comment = 7,
    Date = 8,
    Publisher = 9,
    Language = 10,
    Album = 11,
    Genre = 12,
    Location = 13,
    VersionNumber = 14,
    Organization = 15,
    Copyright = 16,
    Subject = 17,
    Keywords = 18,
    Contributor = 19,
    ResourceType = 20,
    Format = 21,
    ResourceIdentifier = 22,
    Source = 23,
    Relation = 24,
    Coverage = 25,
    Software = 26,
    Disclaimer = 27,
    Warning = 28,
    Translated = 29,
    CreationDate = 30,
    ModificationDate = 31,
    Creator = 32,
    Producer = 33,
    PageCount = 34,
    PageOrientation = 35,
    PaperSize = 36,
    UsedFonts = 37,
    PageOrder = 38,
    CreatedFor = 39,
    Magnification = 40,
    Release = 41,
    Group = 42,
    Size = 43,
    Summary = 44,
    Packager = 45,
    Vendor = 46,
    License = 47,
    Distribution = 48,
    BuildHost = 49,
    Os = 50,
    Dependency = 51,
    HashMd4 = 52,
    HashMd5 = 53,
    HashSha0 = 54,
    HashSha1 = 55,
    HashRmd160 = 56,
    Resolution = 57,
    Category = 58,
    BookTitle = 59,
    Priority = 60,
    Conflicts = 61,
    Replaces = 62,
    Provides = 63,
    Conductor = 64,
    Interpreter = 65,
    Owner = 66,
    Lyrics = 67,
    MediaType = 68,
    Contact = 69,
    ThumbnailData = 70,
    PublicationDate = 71,
    CameraMake = 72,
    CameraModel = 73,
    Exposure = 74,
    Aperture = 75,
    ExposureBias = 76,
    Flash = 77,
    FlashBias = 78,
    FocalLength = 79,
    FocalLength35mm = 80,
    IsoSpeed = 81,
    ExposureMode = 82,
    MeteringMode = 83,
    MacroMode = 84,
    ImageQuality = 85,
    WhiteBalance = 86,
    Orientation = 87,
    Template = 88,
}

/// Number of keyword types; valid types are `[0, HIGHEST_TYPE_NUMBER)`.
pub const HIGHEST_TYPE_NUMBER: usize = 89;

/// Display names, indexed by discriminant.
static TYPE_NAMES: [&str; HIGHEST_TYPE_NUMBER] = [
    "unknown",
    "filename",
    "mimetype",
    "title",
    "author",
    "artist",
    "description",
    "comment",
    "date",
    "publisher",
    "language",
    "album",
    "genre",
    "location",
    "version",
    "organization",
    "copyright",
    "subject",
    "keywords",
    "contributor",
    "resource-type",
    "format",
    "resource-identifier",
    "source",
    "relation",
    "coverage",
    "software",
    "disclaimer",
    "warning",
    "translated",
    "creation date",
    "modification date",
    "creator",
    "producer",
    "page count",
    "page orientation",
    "paper size",
    "used fonts",
    "page order",
    "created for",
    "magnification",
    "release",
    "group",
    "size",
    "summary",
    "packager",
    "vendor",
    "license",
    "distribution",
    "build-host",
    "os",
    "dependency",
    "MD4",
    "MD5",
    "SHA-0",
    "SHA-1",
    "RipeMD160",
    "resolution",
    "category",
    "book title",
    "priority",
    "conflicts",
    "replaces",
    "provides",
    "conductor",
    "interpreter",
    "owner",
    "lyrics",
    "media type",
    "contact",
    "binary thumbnail data",
    "publication date",
    "camera make",
    "camera model",
    "exposure",
    "aperture",
    "exposure bias",
    "flash",
    "flash bias",
    "focal length",
    "focal length (35mm equivalent)",
    "iso speed",
    "exposure mode",
    "metering mode",
    "macro mode",
    "image quality",
    "white balance",
    "orientation",
    "template",
];

/// Every variant, indexed by discriminant.  Kept next to [`TYPE_NAMES`] so
/// the two tables cannot drift apart unnoticed.
static ALL_TYPES: [KeywordType; HIGHEST_TYPE_NUMBER] = [
    KeywordType::Unknown,
    KeywordType::Filename,
    KeywordType::Mimetype,
    KeywordType::Title,
    KeywordType::Author,
    KeywordType::Artist,
    KeywordType::Description,
    KeywordType::Comment,
    KeywordType::Date,
    KeywordType::Publisher,
    KeywordType::Language,
    KeywordType::Album,
    KeywordType::Genre,
    KeywordType::Location,
    KeywordType::VersionNumber,
    KeywordType::Organization,
    KeywordType::Copyright,
    KeywordType::Subject,
    KeywordType::Keywords,
    KeywordType::Contributor,
    KeywordType::ResourceType,
    KeywordType::Format,
    KeywordType::ResourceIdentifier,
    KeywordType::Source,
    KeywordType::Relation,
    KeywordType::Coverage,
    KeywordType::Software,
    KeywordType::Disclaimer,
    KeywordType::Warning,
    KeywordType::Translated,
    KeywordType::CreationDate,
    KeywordType::ModificationDate,
    KeywordType::Creator,
    KeywordType::Producer,
    KeywordType::PageCount,
    KeywordType::PageOrientation,
    KeywordType::PaperSize,
    KeywordType::UsedFonts,
    KeywordType::PageOrder,
    KeywordType::CreatedFor,
    KeywordType::Magnification,
    KeywordType::Release,
    KeywordType::Group,
    KeywordType::Size,
    KeywordType::Summary,
    KeywordType::Packager,
    KeywordType::Vendor,
    KeywordType::License,
    KeywordType::Distribution,
    KeywordType::BuildHost,
    KeywordType::Os,
    KeywordType::Dependency,
    KeywordType::HashMd4,
    KeywordType::HashMd5,
    KeywordType::HashSha0,
    KeywordType::HashSha1,
    KeywordType::HashRmd160,
    KeywordType::Resolution,
    KeywordType::Category,
    KeywordType::BookTitle,
    KeywordType::Priority,
    KeywordType::Conflicts,
    KeywordType::Replaces,
    KeywordType::Provides,
    KeywordType::Conductor,
    KeywordType::Interpreter,
    KeywordType::Owner,
    KeywordType::Lyrics,
    KeywordType::MediaType,
    KeywordType::Contact,
    KeywordType::ThumbnailData,
    KeywordType::PublicationDate,
    KeywordType::CameraMake,
    KeywordType::CameraModel,
    KeywordType::Exposure,
    KeywordType::Aperture,
    KeywordType::ExposureBias,
    KeywordType::Flash,
    KeywordType::FlashBias,
    KeywordType::FocalLength,
    KeywordType::FocalLength35mm,
    KeywordType::IsoSpeed,
    KeywordType::ExposureMode,
    KeywordType::MeteringMode,
    KeywordType::MacroMode,
    KeywordType::ImageQuality,
    KeywordType::WhiteBalance,
    KeywordType::Orientation,
    KeywordType::Template,
];

impl KeywordType {
    /// Display name of the type.
    pub fn name(self) -> &'static str {
        TYPE_NAMES[self as usize]
    }

    /// Look a type up by its raw index; `None` for out-of-range values.
    pub fn from_index(index: usize) -> Option<KeywordType> {
        ALL_TYPES.get(index).copied()
    }

    /// Look a type up by its display name (exact match).
    pub fn from_name(name: &str) -> Option<KeywordType> {
        TYPE_NAMES
            .iter()
            .position(|&n| n == name)
            .map(|i| ALL_TYPES[i])
    }

    /// True for types whose value is a codec-encoded binary payload rather
    /// than display text.
    pub fn is_binary(self) -> bool {
        self == KeywordType::ThumbnailData
    }

    /// All valid types in discriminant order.
    pub fn all() -> &'static [KeywordType] {
        &ALL_TYPES
    }
}

/// One extracted metadata item.
///
/// For [`KeywordType::is_binary`] types the `value` holds the printable
/// encoding produced by [`crate::codec::binary_encode`], never raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordRecord {
    #[serde(rename = "type")]
    pub keyword_type: KeywordType,
    pub value: String,
}

/// Equivalence policy for [`KeywordList::remove_duplicates`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Records are duplicates only when both value and type match.
    Strict,
    /// Records are duplicates whenever their values match, regardless of type.
    Typeless,
    /// Like `Strict`, but an `Unknown`-typed record is additionally dropped
    /// when a same-valued record of any type precedes it in scan order.
    RemoveUnknown,
}

/// Ordered sequence of keyword records, logical head = most recently
/// prepended.
///
/// Storage is a `Vec` kept in insertion order (prepend pushes to the back),
/// so the logical head-to-tail walk is the reverse of storage order.  The
/// list is exclusively owned: transformations consume `self` and return the
/// reduced list.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct KeywordList {
    records: Vec<KeywordRecord>,
}

impl KeywordList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend one record at the logical head.  Empty values are accepted
    /// here; stripping them is [`Self::remove_empty`]'s job.
    pub fn prepend(&mut self, keyword_type: KeywordType, value: impl Into<String>) {
        self.records.push(KeywordRecord {
            keyword_type,
            value: value.into(),
        });
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate head-to-tail (newest prepend first).
    pub fn iter(&self) -> impl Iterator<Item = &KeywordRecord> {
        self.records.iter().rev()
    }

    /// The last record of `keyword_type` in head-to-tail order, i.e. the
    /// earliest-inserted one.
    pub fn extract_last(&self, keyword_type: KeywordType) -> Option<&str> {
        self.records
            .iter()
            .find(|r| r.keyword_type == keyword_type)
            .map(|r| r.value.as_str())
    }

    /// Like [`Self::extract_last`], matching on the type's display name.
    pub fn extract_last_by_name(&self, name: &str) -> Option<&str> {
        self.records
            .iter()
            .find(|r| r.keyword_type.name() == name)
            .map(|r| r.value.as_str())
    }

    /// Remove duplicate records under `policy`.
    ///
    /// For each record in head-to-tail order, every later (tail-ward) record
    /// with an equal value that satisfies the policy's type rule is dropped.
    /// The surviving occurrence of each equivalence class is therefore the
    /// one closest to the head, and survivor order is stable.  Quadratic by
    /// design: record counts are small.
    pub fn remove_duplicates(mut self, policy: DuplicatePolicy) -> Self {
        let n = self.records.len();
        let mut keep = vec![true; n];
        // Head-to-tail means walking storage from the back.
        for i in (0..n).rev() {
            if !keep[i] {
                continue;
            }
            for j in (0..i).rev() {
                if !keep[j] || self.records[j].value != self.records[i].value {
                    continue;
                }
                let matched = match policy {
                    DuplicatePolicy::Strict => {
                        self.records[j].keyword_type == self.records[i].keyword_type
                    }
                    DuplicatePolicy::Typeless => true,
                    DuplicatePolicy::RemoveUnknown => {
                        self.records[j].keyword_type == self.records[i].keyword_type
                            || self.records[j].keyword_type == KeywordType::Unknown
                    }
                };
                if matched {
                    keep[j] = false;
                }
            }
        }
        let mut index = 0;
        self.records.retain(|_| {
            let kept = keep[index];
            index += 1;
            kept
        });
        self
    }

    /// Drop every record whose value is zero-length or all-whitespace.
    pub fn remove_empty(mut self) -> Self {
        self.records.retain(|r| !r.value.trim().is_empty());
        self
    }

    /// Drop every record of exactly `keyword_type`.
    pub fn remove_of_type(mut self, keyword_type: KeywordType) -> Self {
        self.records.retain(|r| r.keyword_type != keyword_type);
        self
    }
}

impl<'a> IntoIterator for &'a KeywordList {
    type Item = &'a KeywordRecord;
    type IntoIter = std::iter::Rev<std::slice::Iter<'a, KeywordRecord>>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter().rev()
    }
}
