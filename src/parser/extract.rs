use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};
use url::Url;

use super::classify;
use super::entry::Entry;
use super::filter;
use super::page::{displayed_text, first_element_child, next_element_sibling, parent_element, Page};

static MEMITEM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"memitem:(\S+)").unwrap());
static ROW_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static ANCHOR_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// All entries on a page: member table rows first, then links.
pub fn extract(page: &Page) -> Vec<Entry> {
    let mut entries = table_rows(page);
    entries.extend(links(page));
    entries
}

/// Entries for methods, ivars and other members listed in member tables.
pub fn table_rows(page: &Page) -> Vec<Entry> {
    page.html()
        .select(&ROW_SEL)
        .filter_map(|row| row_entry(page, row))
        .filter(filter::keep)
        .collect()
}

/// Entries for links to other pages of the docset.
pub fn links(page: &Page) -> Vec<Entry> {
    page.html()
        .select(&ANCHOR_SEL)
        .filter_map(|anchor| link_entry(page, anchor))
        .filter(filter::keep)
        .collect()
}

fn row_entry(page: &Page, row: ElementRef<'_>) -> Option<Entry> {
    let class = row.value().attr("class")?;
    let fragment = MEMITEM_RE.captures(class)?.get(1)?.as_str().to_string();

    // Unknown groups (friends, inherited, ...) are not indexed at all
    let category = classify::group_category(row).filter(|c| !c.is_unknown())?;

    // Rows like "struct {" on some pages have no name tag
    let cell = row.children().filter_map(ElementRef::wrap).nth(1)?;
    let name = first_element_child(cell).and_then(displayed_text)?;

    Some(Entry {
        name,
        category,
        href: format!("{}#{}", page.filename(), fragment),
        fragment: Some(fragment),
        filename: page.filename().to_string(),
        class_name: Some(class.to_string()),
    })
}

fn link_entry(page: &Page, anchor: ElementRef<'_>) -> Option<Entry> {
    let target = page.url().join(anchor.value().attr("href")?).ok()?;
    if target.scheme() != "file" || directory(&target) != directory(page.url()) {
        return None;
    }

    // Icon and text often wrap the same link; only the first child counts
    if anchor.prev_sibling().is_some() {
        return None;
    }

    let name = displayed_text(anchor)
        .or_else(|| member_name(anchor))
        .filter(|n| !n.is_empty())?;

    let segment = target.path_segments()?.last().filter(|s| !s.is_empty())?;
    let filename = urlencoding::decode(segment).ok()?.into_owned();
    // an encoded separator must not lead out of the documents folder
    if filename.contains(['/', '\\']) || filename == ".." || filename == "." {
        return None;
    }
    let fragment = target.fragment().filter(|f| !f.is_empty()).map(str::to_string);
    let href = match &fragment {
        Some(f) => format!("{}#{}", segment, f),
        None => segment.to_string(),
    };

    let category = classify::classify(&name, target.path(), anchor);
    Some(Entry {
        name,
        category,
        href,
        fragment,
        filename,
        class_name: anchor.value().attr("class").map(str::to_string),
    })
}

/// Name held in a `<b>` of the cell after an empty link:
/// `<td><a/></td><td><b>NAME</b> …</td>`
fn member_name(anchor: ElementRef<'_>) -> Option<String> {
    let cell = parent_element(anchor)?;
    let name_tag = next_element_sibling(cell).and_then(first_element_child)?;
    if name_tag.value().name() != "b" {
        return None;
    }
    displayed_text(name_tag)
}

fn directory(url: &Url) -> (Option<&str>, &str) {
    let path = url.path();
    let dir = path.rsplit_once('/').map_or("", |(dir, _)| dir);
    (url.host_str(), dir)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::parser::entry::Category;

    fn page(name: &str, html: &str) -> Page {
        Page::parse(&Path::new("/docs").join(name), html).unwrap()
    }

    fn fixture(name: &str) -> Page {
        let html = std::fs::read_to_string(format!("tests/fixtures/{}", name)).unwrap();
        page(name, &html)
    }

    fn find<'a>(entries: &'a [Entry], name: &str) -> Option<&'a Entry> {
        entries.iter().find(|e| e.name == name)
    }

    #[test]
    fn member_row_becomes_method() {
        let p = page(
            "page.shtml",
            r#"<table class="memberdecls">
<tr class="heading"><td colspan="2"><h2 class="groupheader"><a name="pub-methods"></a>Public Member Functions</h2></td></tr>
<tr class="memitem:frag1"><td class="memItemLeft" align="right">void&#160;</td><td class="memItemRight"><b>doStuff</b> ()</td></tr>
</table>"#,
        );
        let rows = table_rows(&p);
        assert_eq!(rows.len(), 1);
        let e = &rows[0];
        assert_eq!(e.name, "doStuff");
        assert_eq!(e.category, Category::Method);
        assert_eq!(e.href, "page.shtml#frag1");
        assert_eq!(e.fragment.as_deref(), Some("frag1"));
        assert_eq!(e.filename, "page.shtml");
    }

    #[test]
    fn rows_in_ignored_groups_are_dropped() {
        let p = page(
            "page.shtml",
            r#"<table class="memberdecls">
<tr class="heading"><td colspan="2"><h2 class="groupheader"><a name="friends"></a>Friends</h2></td></tr>
<tr class="memitem:f1"><td class="memItemLeft">class&#160;</td><td class="memItemRight"><b>buddy</b></td></tr>
</table>"#,
        );
        assert!(table_rows(&p).is_empty());
    }

    #[test]
    fn rows_without_name_tag_are_skipped() {
        let p = page(
            "page.shtml",
            r#"<table class="memberdecls">
<tr class="heading"><td colspan="2"><h2 class="groupheader"><a name="pub-attribs"></a>Public Attributes</h2></td></tr>
<tr class="memitem:s1"><td class="memItemLeft" colspan="2">struct {</td></tr>
</table>"#,
        );
        assert!(table_rows(&p).is_empty());
    }

    #[test]
    fn inherited_row_classes_keep_fragment_only() {
        let p = page(
            "page.shtml",
            r#"<table class="memberdecls">
<tr class="heading"><td colspan="2"><h2 class="groupheader"><a name="pub-methods"></a>Methods</h2></td></tr>
<tr class="memitem:a9 inherit pub_methods_classbase"><td>int&#160;</td><td><a class="el" href="classbase.shtml#a9">size</a></td></tr>
</table>"#,
        );
        let rows = table_rows(&p);
        assert_eq!(rows[0].href, "page.shtml#a9");
    }

    #[test]
    fn links_resolve_to_last_path_segment() {
        let p = page(
            "page.shtml",
            r##"<p><a class="el" href="structfunc__t.shtml">func_t</a></p>
<p><a class="el" href="funcs_8hpp.shtml#a42">get_func</a></p>
<p><a href="https://example.com/x.shtml">external</a></p>
<p><a href="sub/dir.shtml">nested</a></p>"##,
        );
        let entries = links(&p);
        assert_eq!(entries.len(), 2);

        let func_t = find(&entries, "func_t").unwrap();
        assert_eq!(func_t.href, "structfunc__t.shtml");
        assert_eq!(func_t.fragment, None);
        assert_eq!(func_t.category, Category::Type);

        let get_func = find(&entries, "get_func").unwrap();
        assert_eq!(get_func.href, "funcs_8hpp.shtml#a42");
        assert_eq!(get_func.filename, "funcs_8hpp.shtml");
        assert_eq!(get_func.fragment.as_deref(), Some("a42"));
        assert_eq!(get_func.category, Category::Unknown);
    }

    #[test]
    fn encoded_separators_are_rejected() {
        let p = page(
            "page.shtml",
            r#"<p><a class="el" href="..%2Fsecret.shtml">Secret</a></p>
<p><a class="el" href="sub%2Fx.shtml">nested_x</a></p>
<p><a class="el" href="dir%5Cy.shtml">windows_y</a></p>
<p><a class="el" href="%2E%2E">dots</a></p>
<p><a class="el" href="funcs%5F8hpp.shtml">encoded_ok</a></p>"#,
        );
        let entries = links(&p);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "encoded_ok");
        assert_eq!(entries[0].filename, "funcs_8hpp.shtml");
    }

    #[test]
    fn only_first_child_links_count() {
        let p = page(
            "page.shtml",
            r#"<div><a href="structfoo.shtml">foo_icon</a><a href="structfoo.shtml">foo</a></div>
<div>see <a href="structbar.shtml">bar</a></div>"#,
        );
        let names: Vec<String> = links(&p).into_iter().map(|e| e.name).collect();
        assert_eq!(names, ["foo_icon"]);
    }

    #[test]
    fn empty_link_takes_name_from_next_cell() {
        let p = page(
            "page.shtml",
            r#"<table><tr><td><a href="funcs_8hpp.shtml#a7" title=""></a></td><td><b>decode_insn</b>()</td></tr></table>"#,
        );
        let entries = links(&p);
        // title="" is a name, just an empty one
        assert!(entries.is_empty());

        let p = page(
            "page.shtml",
            r#"<table><tr><td><a href="funcs_8hpp.shtml#a7"></a></td><td><b>decode_insn</b>()</td></tr></table>"#,
        );
        let entries = links(&p);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "decode_insn");
    }

    #[test]
    fn fixture_class_page() {
        let p = fixture("structfunc__t.shtml");
        let entries = extract(&p);

        for e in &entries {
            assert!(e.name.chars().count() > 1, "short name kept: {:?}", e);
            let (file, frag) = match e.href.split_once('#') {
                Some((f, frag)) => (f, Some(frag)),
                None => (e.href.as_str(), None),
            };
            assert_eq!(file, e.filename);
            assert_eq!(frag, e.fragment.as_deref());
        }

        let start = entries
            .iter()
            .find(|e| e.name == "start_ea" && e.category == Category::Property)
            .expect("member row for start_ea");
        assert_eq!(start.href, "structfunc__t.shtml#a1f3");

        let method = find(&entries, "is_far").unwrap();
        assert_eq!(method.category, Category::Method);

        // navigation and permalink links are filtered out
        assert!(find(&entries, "Main Page").is_none());
        assert!(find(&entries, "More...").is_none());
        assert!(entries.iter().all(|e| !e.href.starts_with("functions_")));

        let badaddr = entries
            .iter()
            .find(|e| e.name == "BADADDR" && e.class_name.as_deref() == Some("el"))
            .unwrap();
        assert_eq!(badaddr.category, Category::EnumValue);
    }
}
