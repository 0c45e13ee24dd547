//! Selectors and per-page selector maps.
//!
//! A [`Selector`] describes how to find elements; it composes CSS with
//! index, scope, text and visibility refinements. A [`SelectorMap`] binds
//! symbolic names to selectors for one page and never changes after it
//! is built.

use crate::result::{CheckError, CheckResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Element query
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Selector {
    /// Plain CSS selector
    Css(String),
    /// Deepest elements whose text contains the string
    Text(String),
    /// Matches of `base` whose text contains `text`
    HasText {
        /// Base query
        base: Box<Selector>,
        /// Required substring
        text: String,
    },
    /// The `index`-th match of `base` (zero-based)
    Nth {
        /// Base query
        base: Box<Selector>,
        /// Zero-based index
        index: usize,
    },
    /// Matches of `child` inside any match of `parent`
    Within {
        /// Scope
        parent: Box<Selector>,
        /// Query run inside the scope
        child: Box<Selector>,
    },
    /// Visible matches of `base`
    Visible(Box<Selector>),
}

impl Selector {
    /// CSS selector
    #[must_use]
    pub fn css(s: impl Into<String>) -> Self {
        Self::Css(s.into())
    }

    /// Text selector
    #[must_use]
    pub fn text(t: impl Into<String>) -> Self {
        Self::Text(t.into())
    }

    /// Keep only the `index`-th match
    #[must_use]
    pub fn nth(self, index: usize) -> Self {
        Self::Nth {
            base: Box::new(self),
            index,
        }
    }

    /// Keep only the first match
    #[must_use]
    pub fn first(self) -> Self {
        self.nth(0)
    }

    /// Search for `child` inside this selector's matches
    #[must_use]
    pub fn find(self, child: impl Into<Self>) -> Self {
        Self::Within {
            parent: Box::new(self),
            child: Box::new(child.into()),
        }
    }

    /// Deepest element inside this selector's matches containing `text`
    #[must_use]
    pub fn contains(self, text: impl Into<String>) -> Self {
        self.find(Self::Text(text.into()))
    }

    /// Keep matches whose text contains `text`
    #[must_use]
    pub fn has_text(self, text: impl Into<String>) -> Self {
        Self::HasText {
            base: Box::new(self),
            text: text.into(),
        }
    }

    /// Keep visible matches
    #[must_use]
    pub fn visible(self) -> Self {
        Self::Visible(Box::new(self))
    }

    /// JavaScript expression evaluating to an array of matching elements
    #[must_use]
    pub fn to_query(&self) -> String {
        self.js_from("document", 0)
    }

    /// JavaScript expression evaluating to the number of matches
    #[must_use]
    pub fn to_count_query(&self) -> String {
        format!("({}).length", self.to_query())
    }

    fn js_from(&self, root: &str, depth: usize) -> String {
        match self {
            Self::Css(s) => format!("Array.from({root}.querySelectorAll({s:?}))"),
            Self::Text(t) => format!(
                "Array.from({root}.querySelectorAll('*')).filter(el => el.textContent.includes({t:?}) && !Array.from(el.children).some(c => c.textContent.includes({t:?})))"
            ),
            Self::HasText { base, text } => format!(
                "{}.filter(el => el.textContent.includes({text:?}))",
                base.js_from(root, depth)
            ),
            Self::Nth { base, index } => {
                format!("{}.slice({index}, {})", base.js_from(root, depth), index + 1)
            }
            Self::Within { parent, child } => {
                let var = format!("r{depth}");
                format!(
                    "{}.flatMap({var} => {})",
                    parent.js_from(root, depth),
                    child.js_from(&var, depth + 1)
                )
            }
            Self::Visible(base) => format!(
                "{}.filter(el => !!(el.offsetWidth || el.offsetHeight || el.getClientRects().length))",
                base.js_from(root, depth)
            ),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) => f.write_str(s),
            Self::Text(t) => write!(f, "text={t:?}"),
            Self::HasText { base, text } => write!(f, "{base} >> has-text={text:?}"),
            Self::Nth { base, index } => write!(f, "{base} >> nth={index}"),
            Self::Within { parent, child } => write!(f, "{parent} >> {child}"),
            Self::Visible(base) => write!(f, "{base} >> visible=true"),
        }
    }
}

impl From<&str> for Selector {
    fn from(s: &str) -> Self {
        Self::Css(s.to_string())
    }
}

impl From<String> for Selector {
    fn from(s: String) -> Self {
        Self::Css(s)
    }
}

impl From<&Selector> for Selector {
    fn from(s: &Selector) -> Self {
        s.clone()
    }
}

/// Immutable mapping of symbolic names to selectors for one page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectorMap {
    entries: BTreeMap<String, Selector>,
}

impl SelectorMap {
    /// Build from `(name, css)` pairs
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Config`] if a name appears twice
    pub fn from_pairs<I, K, V>(pairs: I) -> CheckResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Selector>,
    {
        let mut entries = BTreeMap::new();
        for (key, value) in pairs {
            let key = key.into();
            if entries.contains_key(&key) {
                return Err(CheckError::Config {
                    message: format!("duplicate selector key '{key}'"),
                });
            }
            entries.insert(key, value.into());
        }
        Ok(Self { entries })
    }

    /// Selector registered under `key`
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Selector> {
        self.entries.get(key)
    }

    /// Registered selector, or `key` itself taken as CSS
    ///
    /// An unknown key therefore fails later as element-not-found, at the
    /// step that tries to act on it.
    #[must_use]
    pub fn resolve(&self, key: &str) -> Selector {
        self.get(key)
            .cloned()
            .unwrap_or_else(|| Selector::Css(key.to_string()))
    }

    /// Whether `key` is registered
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Registered names, sorted
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
