use super::classify;
use super::entry::{Category, Entry};
use super::page::Page;

/// Category found for a previously unknown entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fixup {
    pub category: Category,
    /// Members are listed as `Namespace::name`; keep only the name.
    pub strip_namespace: bool,
}

impl Fixup {
    pub fn apply(&self, entry: &Entry) -> Entry {
        let mut fixed = entry.with_category(self.category);
        if self.strip_namespace {
            fixed.strip_namespace();
        }
        fixed
    }
}

/// Look at the entry's surroundings on its (re)loaded page.
///
/// Entries with a fragment point at a member: the group header of the table
/// holding that anchor decides. Entries without one link to a whole page,
/// which is judged by its title.
pub fn resolve(entry: &Entry, page: &Page) -> Option<Fixup> {
    match &entry.fragment {
        Some(fragment) => {
            let node = page.element_by_id(fragment)?;
            let category = classify::group_category(node).filter(|c| !c.is_unknown())?;
            Some(Fixup {
                category,
                strip_namespace: true,
            })
        }
        None => classify::page_category(page).map(|category| Fixup {
            category,
            strip_namespace: false,
        }),
    }
}
