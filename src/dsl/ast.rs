//! The element tree built by the DSL parser.

/// One element of the source tree: a tag reference (resolved against the
/// registry at compile time, not parse time), its inline literal data, its
/// named properties and its ordered children. Built fresh per compilation
/// and immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    /// Inline literal data list, e.g. `Tag{"a","b"}`.
    pub data: Vec<String>,
    /// Named properties in source order; the reserved name `text` holds the
    /// element's text content rather than an HTML attribute.
    pub props: Vec<(String, String)>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Element {
            name: name.into(),
            data: Vec::new(),
            props: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Value of the reserved `text` property; the last occurrence wins.
    pub fn text(&self) -> &str {
        self.props
            .iter()
            .rev()
            .find(|(k, _)| k == "text")
            .map(|(_, v)| v.as_str())
            .unwrap_or("")
    }

    /// Candidate attributes: properties minus `text`, deduplicated with the
    /// last value winning while keeping first-occurrence order.
    pub fn attr_candidates(&self) -> Vec<(&str, &str)> {
        let mut out: Vec<(&str, &str)> = Vec::new();
        for (key, value) in &self.props {
            if key == "text" {
                continue;
            }
            if let Some(slot) = out.iter_mut().find(|(k, _)| *k == key) {
                slot.1 = value;
            } else {
                out.push((key, value));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_last_wins() {
        let mut el = Element::new("p");
        assert_eq!(el.text(), "");
        el.props.push(("text".into(), "first".into()));
        el.props.push(("text".into(), "second".into()));
        assert_eq!(el.text(), "second");
    }

    #[test]
    fn test_attr_candidates_exclude_text_and_dedupe() {
        let mut el = Element::new("p");
        el.props.push(("class".into(), "a".into()));
        el.props.push(("text".into(), "hi".into()));
        el.props.push(("id".into(), "x".into()));
        el.props.push(("class".into(), "b".into()));
        assert_eq!(el.attr_candidates(), vec![("class", "b"), ("id", "x")]);
    }
}
