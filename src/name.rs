//! Domain names as the zone store and update engine reason about them: a
//! sequence of labels compared case-insensitively (RFC 1035 §2.3.3, later
//! strengthened to mandatory case-insensitive comparison for class IN by
//! common practice and RFC 4343), with a left-chop operation used by zone
//! lookup to walk from a query name up to its containing zone's apex.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::Display;

#[derive(Clone, Debug, Eq)]
pub struct Name {
    labels: Vec<String>,
}

impl Serialize for Name {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        Ok(Name::from_text(&text))
    }
}

impl Name {
    pub fn root() -> Self {
        Name { labels: vec![] }
    }

    /// Parses a presentation-format name like `www.example.com` (trailing dot optional).
    pub fn from_text(text: &str) -> Self {
        let trimmed = text.trim_end_matches('.');
        if trimmed.is_empty() {
            return Name::root();
        }
        Name {
            labels: trimmed.split('.').map(|l| l.to_string()).collect(),
        }
    }

    pub fn from_labels(labels: Vec<String>) -> Self {
        Name { labels }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    pub fn is_root(&self) -> bool {
        self.labels.is_empty()
    }

    /// Case-folded comparison key, used for equality/hashing/ordering.
    fn fold_key(&self) -> Vec<String> {
        self.labels.iter().map(|l| l.to_ascii_lowercase()).collect()
    }

    /// Drops the leftmost label, returning the parent name. `None` at the root.
    pub fn left_chop(&self) -> Option<Name> {
        if self.labels.is_empty() {
            return None;
        }
        Some(Name {
            labels: self.labels[1..].to_vec(),
        })
    }

    /// Every suffix of this name, from the name itself up to (and including) the root,
    /// in longest-to-shortest order. Used by zone lookup to find the most specific
    /// authoritative zone for a query name.
    pub fn suffixes(&self) -> Vec<Name> {
        let mut out = Vec::with_capacity(self.labels.len() + 1);
        let mut current = self.clone();
        loop {
            let is_root = current.is_root();
            out.push(current.clone());
            if is_root {
                break;
            }
            current = current.left_chop().expect("non-root name has a parent");
        }
        out
    }

    /// True if `self` is equal to or a descendant of `other`.
    pub fn is_subdomain_of(&self, other: &Name) -> bool {
        if other.labels.len() > self.labels.len() {
            return false;
        }
        let offset = self.labels.len() - other.labels.len();
        self.labels[offset..]
            .iter()
            .map(|l| l.to_ascii_lowercase())
            .eq(other.labels.iter().map(|l| l.to_ascii_lowercase()))
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.fold_key() == other.fold_key()
    }
}

impl std::hash::Hash for Name {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.fold_key().hash(state);
    }
}

impl Ord for Name {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.fold_key().cmp(&other.fold_key())
    }
}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.labels.is_empty() {
            return f.write_str(".");
        }
        f.write_str(&self.labels.join("."))
    }
}
