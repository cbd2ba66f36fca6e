//! Feature tags consulted when a dotted key (`rendering/driver.vulkan`) is set.

use fxhash::FxHashSet;
use std::fmt;

/// Answers whether a feature tag is active in the running environment.
pub trait FeatureSet: Send + Sync + fmt::Debug {
    fn has_feature(&self, tag: &str) -> bool;
}

/// A fixed set of tags.
///
/// # Example
///
/// ```rust
/// use lattice_settings::{FeatureSet, StaticFeatures};
///
/// let features = StaticFeatures::from_iter(["vulkan", "pc"]);
/// assert!(features.has_feature("vulkan"));
/// assert!(!features.has_feature("mobile"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticFeatures {
    tags: FxHashSet<String>,
}

impl StaticFeatures {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tags describing the host: operating system, OS family and CPU architecture.
    #[must_use]
    pub fn host() -> Self {
        let mut features = Self::from_iter([
            std::env::consts::OS,
            std::env::consts::FAMILY,
            std::env::consts::ARCH,
        ]);
        if cfg!(target_pointer_width = "64") {
            features.insert("64");
        } else {
            features.insert("32");
        }
        features
    }

    pub fn insert(&mut self, tag: impl Into<String>) -> bool {
        self.tags.insert(tag.into())
    }

    #[must_use]
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.tags.iter().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}

impl<S: Into<String>> FromIterator<S> for StaticFeatures {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self { tags: iter.into_iter().map(Into::into).collect() }
    }
}

impl<S: Into<String>> Extend<S> for StaticFeatures {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.tags.extend(iter.into_iter().map(Into::into));
    }
}

impl FeatureSet for StaticFeatures {
    fn has_feature(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// Adapts a predicate closure, for tags that change at runtime.
pub struct FeatureFn<F>(pub F);

impl<F> fmt::Debug for FeatureFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FeatureFn")
    }
}

impl<F: Fn(&str) -> bool + Send + Sync> FeatureSet for FeatureFn<F> {
    fn has_feature(&self, tag: &str) -> bool {
        (self.0)(tag)
    }
}
