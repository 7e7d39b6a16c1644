use std::path::Path;
use std::sync::LazyLock;

use ego_tree::NodeRef;
use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

use crate::loader::LoadError;

static TITLE_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".title").unwrap());

/// Parsed tree of one documentation page. Lives only until the next load.
pub struct Page {
    filename: String,
    url: Url,
    html: Html,
}

impl Page {
    /// Parse `source` as the page stored at `path` (must be absolute).
    pub fn parse(path: &Path, source: &str) -> Result<Page, LoadError> {
        let url = Url::from_file_path(path).map_err(|_| LoadError::InvalidPath(path.to_path_buf()))?;
        let filename = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Page {
            filename,
            url,
            html: Html::parse_document(source),
        })
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// `file://` URL the page's relative links resolve against.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn html(&self) -> &Html {
        &self.html
    }

    pub fn element_by_id(&self, id: &str) -> Option<ElementRef<'_>> {
        self.html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().id() == Some(id))
    }

    /// Displayed text of the first `.title` element.
    pub fn title(&self) -> Option<String> {
        self.html.select(&TITLE_SEL).next().and_then(displayed_text)
    }
}

/// Concatenated text of a node and all its descendants.
pub fn text_content(node: NodeRef<'_, Node>) -> String {
    node.descendants()
        .filter_map(|n| n.value().as_text())
        .map(|t| &**t)
        .collect()
}

/// Text content when non-empty, otherwise the `title` attribute.
pub fn displayed_text(el: ElementRef<'_>) -> Option<String> {
    let text = text_content(*el);
    if !text.is_empty() {
        return Some(text);
    }
    el.value().attr("title").map(str::to_string)
}

pub fn parent_element(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    el.parent().and_then(ElementRef::wrap)
}

pub fn first_element_child(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    el.children().find_map(ElementRef::wrap)
}

pub fn next_element_sibling(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    el.next_siblings().find_map(ElementRef::wrap)
}

pub fn has_class(el: ElementRef<'_>, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

/// Nearest `tr` at or above `el`.
pub fn enclosing_row(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    if el.value().name() == "tr" {
        return Some(el);
    }
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| a.value().name() == "tr")
}
