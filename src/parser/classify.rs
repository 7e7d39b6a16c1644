use scraper::ElementRef;

use super::entry::Category;
use super::page::{
    enclosing_row, first_element_child, has_class, parent_element, text_content, Page,
};

/// Name or path suffixes that identify a category on their own.
/// Checked in order; the first matching suffix wins.
const KNOWN_SUFFIXES: &[(&str, Category)] = &[
    // structs and classes are not told apart
    ("_t", Category::Type),
    ("index.shtml", Category::Framework),
    (".cpp", Category::Sample),
    ("source.shtml", Category::Sample),
    ("cpp-example.shtml", Category::Sample),
];

/// Group annotations of member tables and the category of their rows.
/// `Unknown` marks groups whose rows are not worth indexing.
const GROUP_CATEGORIES: &[(&str, Category)] = &[
    ("pub-methods", Category::Method),
    ("pub-static-methods", Category::Method),
    ("pro-methods", Category::Method),
    ("pro-static-methods", Category::Method),
    ("pub-attribs", Category::Property),
    ("pub-static-attribs", Category::Property),
    ("pro-attribs", Category::Property),
    ("pro-static-attribs", Category::Property),
    ("define-members", Category::EnumValue),
    ("nested-classes", Category::Type),
    ("typedef-members", Category::Type),
    ("var-members", Category::Constant),
    ("enum-members", Category::Enumeration),
    ("func-members", Category::Function),
    ("friends", Category::Unknown),
    ("inherited", Category::Unknown),
    // usually associated types
    ("pub-types", Category::Unknown),
    ("files", Category::Unknown),
];

/// Category of a link from its text, its target path and the anchor itself.
pub fn classify(text: &str, url_path: &str, anchor: ElementRef<'_>) -> Category {
    if let Some(category) = suffix_category(text, url_path) {
        return category;
    }
    if is_macro(anchor) {
        return Category::EnumValue;
    }
    Category::Unknown
}

fn suffix_category(text: &str, url_path: &str) -> Option<Category> {
    [text, url_path].into_iter().find_map(|target| {
        KNOWN_SUFFIXES
            .iter()
            .find(|(suffix, _)| target.ends_with(suffix))
            .map(|&(_, category)| category)
    })
}

/// Upper-case link sitting right after a `#define` cell.
fn is_macro(anchor: ElementRef<'_>) -> bool {
    let text = text_content(*anchor);
    if text.to_uppercase() != text {
        return false;
    }

    // defines end in a non-breaking space, so only look for the keyword
    parent_element(anchor)
        .and_then(|parent| parent.prev_sibling())
        .map(|prev| text_content(prev).contains("#define"))
        .unwrap_or(false)
}

pub fn group_for_annotation(annotation: &str) -> Option<Category> {
    GROUP_CATEGORIES
        .iter()
        .find(|(name, _)| *name == annotation)
        .map(|&(_, category)| category)
}

/// Group annotation of the member table section containing `el`.
///
/// Expected shape:
///
/// ```text
/// <tbody>
///   <tr class="heading"> … <h2 class="groupheader"><a name="GROUP"></a>…</h2> … </tr>
///   …
///   <tr class="memitem:FRAGMENT">
///     <td><a id="FRAGMENT"></a> return type</td>
///     <td><b>name</b> ( args )</td>
///   </tr>
/// ```
pub fn group_annotation(el: ElementRef<'_>) -> Option<String> {
    let row = enclosing_row(el)?;
    let section = parent_element(row)?;
    let heading = first_element_child(section).filter(|h| has_class(*h, "heading"))?;

    let group = heading
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|e| has_class(*e, "groupheader"))?;
    let marker = first_element_child(group)?;
    marker
        .value()
        .attr("name")
        .or_else(|| marker.value().id())
        .map(str::to_string)
}

/// Category from the group header above `el`. `None` when the element is
/// not inside a recognised member table.
pub fn group_category(el: ElementRef<'_>) -> Option<Category> {
    group_annotation(el).and_then(|annotation| group_for_annotation(&annotation))
}

/// Category of a whole page, judged by its title.
pub fn page_category(page: &Page) -> Option<Category> {
    let title = page.title()?;
    if title.contains("Struct Reference") || title.contains("Class Reference") {
        return Some(Category::Type);
    }
    if title.to_lowercase().contains("bits for ")
        || title.ends_with(" flags")
        || title.ends_with(" bits")
    {
        return Some(Category::Enumeration);
    }
    None
}
