use super::entry::Entry;

/// Index and navigation pages whose own entries are noise.
const IGNORED_PAGES: &[&str] = &[
    "index.shtml",
    "pages.shtml",
    "modules.shtml",
    "files.shtml",
    "annotated.shtml",
    "hierarchy.shtml",
    "functions.shtml",
    "globals.shtml",
    "examples.shtml",
];

/// Boilerplate link texts.
const IGNORED_NAMES: &[&str] = &["SDK Reference", "◆ ", "◆\u{a0}", "More..."];

/// Classes of elements that never name a symbol (source listing lines).
const IGNORED_CLASSES: &[&str] = &["line"];

/// Links into the generated alphabetical indexes.
const IGNORED_HREF_PREFIXES: &[&str] = &["globals_", "functions_"];

/// Generated "all members" listings; loaded but never processed.
const IGNORED_PAGE_SUFFIXES: &[&str] = &["_t-members.shtml"];

pub fn keep(entry: &Entry) -> bool {
    entry.name.chars().count() > 1
        && !IGNORED_PAGES.contains(&entry.filename.as_str())
        && !IGNORED_NAMES.contains(&entry.name.as_str())
        && !entry
            .class_name
            .as_deref()
            .is_some_and(|c| IGNORED_CLASSES.contains(&c))
        && !IGNORED_HREF_PREFIXES
            .iter()
            .any(|prefix| entry.href.starts_with(prefix))
}

pub fn skip_page(filename: &str) -> bool {
    IGNORED_PAGE_SUFFIXES
        .iter()
        .any(|suffix| filename.ends_with(suffix))
}
