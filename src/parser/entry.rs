use std::fmt;

/// Dash entry type of an indexed symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Placeholder until the fixup pass resolves it. Stored as `NIL`.
    Unknown,
    Framework,
    EnumValue,
    Type,
    Sample,
    Enumeration,
    Function,
    Method,
    Property,
    Constant,
}

impl Category {
    /// Value written to the `type` column of `searchIndex`.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Unknown => "NIL",
            Category::Framework => "Framework",
            Category::EnumValue => "Value",
            Category::Type => "Type",
            Category::Sample => "Sample",
            Category::Enumeration => "Enum",
            Category::Function => "Function",
            Category::Method => "Method",
            Category::Property => "Property",
            Category::Constant => "Constant",
        }
    }

    pub fn is_unknown(self) -> bool {
        self == Category::Unknown
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One symbol discovered on a documentation page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub category: Category,
    /// Page-relative link target: `filename` or `filename#fragment`.
    pub href: String,
    pub fragment: Option<String>,
    /// Base name of the page the entry lives on.
    pub filename: String,
    /// Class attribute of the element the entry came from.
    pub class_name: Option<String>,
}

impl Entry {
    pub fn with_category(&self, category: Category) -> Entry {
        Entry {
            category,
            ..self.clone()
        }
    }

    /// Drop everything up to and including the first `::` of the name.
    /// Returns false when the name has no namespace separator.
    pub fn strip_namespace(&mut self) -> bool {
        match self.name.split_once("::") {
            Some((_, member)) => {
                self.name = member.to_string();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, href: &str) -> Entry {
        Entry {
            name: name.to_string(),
            category: Category::Unknown,
            href: href.to_string(),
            fragment: None,
            filename: href.split('#').next().unwrap().to_string(),
            class_name: None,
        }
    }

    #[test]
    fn stored_names() {
        assert_eq!(Category::Unknown.as_str(), "NIL");
        assert_eq!(Category::EnumValue.as_str(), "Value");
        assert_eq!(Category::Enumeration.as_str(), "Enum");
        assert_eq!(Category::Property.to_string(), "Property");
    }

    #[test]
    fn strips_first_namespace_only() {
        let mut e = entry("NS::member", "a.shtml");
        assert!(e.strip_namespace());
        assert_eq!(e.name, "member");

        let mut nested = entry("outer::inner::f", "a.shtml");
        nested.strip_namespace();
        assert_eq!(nested.name, "inner::f");

        let mut plain = entry("member", "a.shtml");
        assert!(!plain.strip_namespace());
        assert_eq!(plain.name, "member");
    }

    #[test]
    fn with_category_keeps_location() {
        let e = entry("foo", "a.shtml#f");
        let fixed = e.with_category(Category::Method);
        assert_eq!(fixed.category, Category::Method);
        assert_eq!(fixed.href, e.href);
        assert_eq!(fixed.name, e.name);
    }
}
