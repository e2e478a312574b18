//! ELF32 analyzer: file class, target machine, and dynamic-linking
//! dependencies.
//!
//! Every structure is decoded field by field with the endianness the ident
//! bytes announce; nothing is cast from raw memory.  Section and program
//! header tables are validated (`offset + entsize * count <= len`,
//! overflow-safely) before any entry is touched, mirroring the container-
//! walker shape used across the analyzers.

use sift_core::{Analyzer, KeywordList, KeywordType};

pub struct ElfAnalyzer;

pub fn analyzer() -> Box<dyn Analyzer> {
    Box::new(ElfAnalyzer)
}

const MAGIC: &[u8] = b"\x7fELF";
const EI_CLASS: usize = 4;
const EI_DATA: usize = 5;
const EI_NIDENT: usize = 16;
/// ELF32 header size past e_ident.
const HEADER_SIZE: usize = 36;
const SECTION_SIZE: usize = 40;
const PHDR_SIZE: usize = 32;
const DYN_SIZE: usize = 8;

const ELFCLASS32: u8 = 1;
const ELFDATA2LSB: u8 = 1;
const ELFDATA2MSB: u8 = 2;

const SHT_STRTAB: u32 = 3;
const PT_DYNAMIC: u32 = 2;
const DT_NEEDED: u32 = 1;
const DT_STRTAB: u32 = 5;
const DT_SONAME: u32 = 14;
const DT_RPATH: u32 = 15;

struct Reader<'a> {
    data: &'a [u8],
    big_endian: bool,
}

impl<'a> Reader<'a> {
    fn u16_at(&self, offset: usize) -> Option<u16> {
        let b = self.data.get(offset..offset + 2)?;
        Some(if self.big_endian {
            u16::from_be_bytes([b[0], b[1]])
        } else {
            u16::from_le_bytes([b[0], b[1]])
        })
    }

    fn u32_at(&self, offset: usize) -> Option<u32> {
        let b = self.data.get(offset..offset + 4)?;
        Some(if self.big_endian {
            u32::from_be_bytes([b[0], b[1], b[2], b[3]])
        } else {
            u32::from_le_bytes([b[0], b[1], b[2], b[3]])
        })
    }
}

struct Header {
    e_type: u16,
    e_machine: u16,
    e_phoff: u32,
    e_shoff: u32,
    e_phentsize: u16,
    e_phnum: u16,
    e_shentsize: u16,
    e_shnum: u16,
}

struct SectionHeader {
    sh_type: u32,
    sh_addr: u32,
    sh_offset: u32,
    sh_size: u32,
}

fn parse_header(reader: &Reader<'_>) -> Option<Header> {
    if reader.data.len() < EI_NIDENT + HEADER_SIZE {
        return None;
    }
    let h = Header {
        e_type: reader.u16_at(EI_NIDENT)?,
        e_machine: reader.u16_at(EI_NIDENT + 2)?,
        e_phoff: reader.u32_at(EI_NIDENT + 12)?,
        e_shoff: reader.u32_at(EI_NIDENT + 16)?,
        e_phentsize: reader.u16_at(EI_NIDENT + 26)?,
        e_phnum: reader.u16_at(EI_NIDENT + 28)?,
        e_shentsize: reader.u16_at(EI_NIDENT + 30)?,
        e_shnum: reader.u16_at(EI_NIDENT + 32)?,
    };

    // Both header tables must fit inside the buffer, without overflow.
    let sh_extent = (h.e_shentsize as u64)
        .checked_mul(h.e_shnum as u64)
        .and_then(|n| n.checked_add(h.e_shoff as u64))?;
    let ph_extent = (h.e_phentsize as u64)
        .checked_mul(h.e_phnum as u64)
        .and_then(|n| n.checked_add(h.e_phoff as u64))?;
    if sh_extent > reader.data.len() as u64 || ph_extent > reader.data.len() as u64 {
        return None;
    }
    if h.e_shnum > 0 && (h.e_shentsize as usize) < SECTION_SIZE {
        return None;
    }
    if h.e_phnum > 0 && (h.e_phentsize as usize) < PHDR_SIZE {
        return None;
    }
    Some(h)
}

fn section_header(reader: &Reader<'_>, header: &Header, index: u16) -> Option<SectionHeader> {
    if index >= header.e_shnum {
        return None;
    }
    let base = header.e_shoff as usize + header.e_shentsize as usize * index as usize;
    Some(SectionHeader {
        sh_type: reader.u32_at(base + 4)?,
        sh_addr: reader.u32_at(base + 12)?,
        sh_offset: reader.u32_at(base + 16)?,
        sh_size: reader.u32_at(base + 20)?,
    })
}

/// A NUL-terminated string out of a validated string-table section.
fn string_table_entry<'a>(
    reader: &Reader<'a>,
    section: &SectionHeader,
    offset: u32,
) -> Option<&'a str> {
    if section.sh_type != SHT_STRTAB {
        return None;
    }
    let table_end = (section.sh_offset as u64).checked_add(section.sh_size as u64)?;
    if table_end > reader.data.len() as u64 || section.sh_size == 0 {
        return None;
    }
    if offset >= section.sh_size {
        return None;
    }
    let table = &reader.data[section.sh_offset as usize..table_end as usize];
    if *table.last()? != 0 {
        return None; // table not NUL-terminated: do not trust it
    }
    let entry = &table[offset as usize..];
    let nul = entry.iter().position(|&b| b == 0)?;
    std::str::from_utf8(&entry[..nul]).ok()
}

fn machine_name(e_machine: u16) -> Option<&'static str> {
    Some(match e_machine {
        1 => "M32",
        2 => "Sparc",
        3 => "i386",
        4 => "68K",
        5 => "88K",
        7 => "860",
        8 => "MIPS",
        20 => "PowerPC",
        40 => "ARM",
        62 => "x86-64",
        183 => "AArch64",
        243 => "RISC-V",
        _ => return None,
    })
}

fn type_name(e_type: u16) -> Option<&'static str> {
    Some(match e_type {
        1 => "Relocatable file",
        2 => "Executable file",
        3 => "Shared object file",
        4 => "Core file",
        _ => return None,
    })
}

impl Analyzer for ElfAnalyzer {
    fn analyze(
        &self,
        _filename: Option<&str>,
        data: &[u8],
        mut previous: KeywordList,
        _options: Option<&str>,
    ) -> KeywordList {
        if !data.starts_with(MAGIC) {
            return previous;
        }
        if data.len() <= EI_DATA || data[EI_CLASS] != ELFCLASS32 {
            // 64-bit and exotic classes are out of scope for this decoder.
            return previous;
        }
        let big_endian = match data[EI_DATA] {
            ELFDATA2LSB => false,
            ELFDATA2MSB => true,
            _ => return previous,
        };
        let reader = Reader { data, big_endian };
        let Some(header) = parse_header(&reader) else {
            return previous;
        };

        previous.prepend(KeywordType::Mimetype, "application/x-executable");
        if let Some(name) = type_name(header.e_type) {
            previous.prepend(KeywordType::ResourceType, name);
        }
        if let Some(name) = machine_name(header.e_machine) {
            previous.prepend(KeywordType::CreatedFor, name);
        }

        // Walk PT_DYNAMIC segments for the dependency list.
        for index in 0..header.e_phnum {
            let base = header.e_phoff as usize + header.e_phentsize as usize * index as usize;
            let Some(p_type) = reader.u32_at(base) else {
                return previous;
            };
            if p_type != PT_DYNAMIC {
                continue;
            }
            let (Some(p_offset), Some(p_filesz)) =
                (reader.u32_at(base + 4), reader.u32_at(base + 16))
            else {
                return previous;
            };
            let extent = (p_offset as u64).checked_add(p_filesz as u64);
            if extent.map_or(true, |e| e > data.len() as u64) {
                return previous;
            }

            let tag_count = p_filesz as usize / DYN_SIZE;

            // First pass: find the string table the dynamic entries refer to,
            // by matching its virtual address against the section headers.
            let mut string_section = None;
            for tag_index in 0..tag_count {
                let at = p_offset as usize + tag_index * DYN_SIZE;
                let (Some(d_tag), Some(d_val)) =
                    (reader.u32_at(at), reader.u32_at(at + 4))
                else {
                    return previous;
                };
                if d_tag == DT_STRTAB {
                    for section_index in 0..header.e_shnum {
                        let Some(section) = section_header(&reader, &header, section_index)
                        else {
                            return previous;
                        };
                        if section.sh_addr == d_val && section.sh_type == SHT_STRTAB {
                            string_section = Some(section);
                            break;
                        }
                    }
                    break;
                }
            }
            let Some(string_section) = string_section else {
                return previous;
            };

            // Second pass: resolve the interesting tags against it.
            for tag_index in 0..tag_count {
                let at = p_offset as usize + tag_index * DYN_SIZE;
                let (Some(d_tag), Some(d_val)) =
                    (reader.u32_at(at), reader.u32_at(at + 4))
                else {
                    return previous;
                };
                let keyword_type = match d_tag {
                    DT_NEEDED => KeywordType::Dependency,
                    DT_RPATH => KeywordType::Source,
                    DT_SONAME => KeywordType::ResourceIdentifier,
                    _ => continue,
                };
                if let Some(value) = string_table_entry(&reader, &string_section, d_val) {
                    if !value.is_empty() {
                        previous.prepend(keyword_type, value);
                    }
                }
            }
        }
        previous
    }
}
