use std::collections::BTreeMap;
use std::collections::BTreeSet;

/// Domain prefix used when none is configured.
pub const DEFAULT_ANNOTATION_DOMAIN: &str = "otherguy.io";

/// Locates the `<domain>/sidecars` annotation on a Pod.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidecarAnnotation {
    key: String,
}

impl Default for SidecarAnnotation {
    fn default() -> Self {
        Self::new(DEFAULT_ANNOTATION_DOMAIN)
    }
}

impl SidecarAnnotation {
    pub fn new(domain: &str) -> Self {
        Self {
            key: format!("{}/sidecars", domain.trim_end_matches('/')),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Raw annotation value, `None` when the Pod is not trackable.
    pub fn raw_value<'a>(&self, annotations: &'a BTreeMap<String, String>) -> Option<&'a str> {
        annotations.get(&self.key).map(String::as_str)
    }

    /// Parse the declared sidecar names from the Pod's annotations.
    ///
    /// Returns `None` if the annotation is absent. A present annotation always
    /// yields a set, which may be empty when the value names no containers.
    pub fn sidecars(&self, annotations: &BTreeMap<String, String>) -> Option<BTreeSet<String>> {
        self.raw_value(annotations).map(parse_sidecar_list)
    }
}

/// Split a comma separated container list.
///
/// Whitespace around names is ignored and empty entries are dropped, so
/// `""`, `","` and `" , "` all parse to the empty set.
pub fn parse_sidecar_list(value: &str) -> BTreeSet<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
