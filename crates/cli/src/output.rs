use std::path::Path;

use sift_core::{KeywordList, KeywordType};

/// `name - value` lines, binary payloads elided.
pub fn print_plain(path: &Path, list: &KeywordList, only: &[String], verbose: bool) {
    if verbose || list.count() > 0 {
        println!("Keywords for file {}:", path.display());
    }
    for record in list.iter() {
        let name = record.keyword_type.name();
        if !only.is_empty() && !only.iter().any(|o| o == name) {
            continue;
        }
        if record.keyword_type.is_binary() {
            println!("{name} - (binary)");
        } else {
            println!("{name} - {}", record.value);
        }
    }
    if verbose || list.count() > 0 {
        println!();
    }
}

pub fn print_json(path: &Path, list: &KeywordList) -> anyhow::Result<()> {
    let records: Vec<_> = list.iter().collect();
    let entry = serde_json::json!({
        "file": path.display().to_string(),
        "keywords": records,
    });
    println!("{}", serde_json::to_string_pretty(&entry)?);
    Ok(())
}

/// One `@misc` entry per file, fields taken from the best-known keyword of
/// each relevant type.
pub fn print_bibtex(path: &Path, list: &KeywordList) {
    let key = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .replace(|c: char| !c.is_alphanumeric(), "_");

    println!("@misc{{ {key},");
    let fields: &[(&str, KeywordType)] = &[
        ("author", KeywordType::Author),
        ("title", KeywordType::Title),
        ("note", KeywordType::Description),
        ("year", KeywordType::Date),
        ("publisher", KeywordType::Publisher),
        ("organization", KeywordType::Organization),
        ("howpublished", KeywordType::Format),
    ];
    for (field, keyword_type) in fields {
        if let Some(value) = list.extract_last(*keyword_type) {
            println!("  {field} = {{{}}},", value.replace(['{', '}'], ""));
        }
    }
    println!("}}");
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bibtex_key_is_sanitized() {
        // Just exercise the printers on a populated list; output goes to
        // stdout, the assertion is that nothing panics on odd values.
        let mut list = KeywordList::new();
        list.prepend(KeywordType::Author, "Some {Author}");
        list.prepend(KeywordType::Title, "A Title");
        list.prepend(KeywordType::ThumbnailData, "\u{1}binary\u{0}");
        print_bibtex(Path::new("/tmp/weird name-1.2.bin"), &list);
        print_plain(Path::new("x"), &list, &[], true);
        print_plain(Path::new("x"), &list, &["title".to_string()], false);
        print_json(Path::new("x"), &list).unwrap();
    }
}
