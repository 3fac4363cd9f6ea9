//! Provider include/exclude filtering.

use crate::config::Settings;

/// Whether messages from `provider` should be ignored.
///
/// A non-empty `included` list is the only thing consulted: anything not
/// on it is ignored. Otherwise a provider is ignored only if it is in
/// `excluded`.
pub fn should_ignore<I, E>(provider: &str, included: &[I], excluded: &[E]) -> bool
where
    I: AsRef<str>,
    E: AsRef<str>,
{
    if !included.is_empty() {
        return !included.iter().any(|name| name.as_ref() == provider);
    }
    excluded.iter().any(|name| name.as_ref() == provider)
}

/// Owned include/exclude lists, usually built from [`Settings`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderFilter {
    pub included: Vec<String>,
    pub excluded: Vec<String>,
}

impl ProviderFilter {
    pub fn new(included: Vec<String>, excluded: Vec<String>) -> Self {
        Self { included, excluded }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.included_providers.clone(),
            settings.excluded_providers.clone(),
        )
    }

    /// True when the filter lets everything through.
    pub fn is_open(&self) -> bool {
        self.included.is_empty() && self.excluded.is_empty()
    }

    pub fn should_ignore(&self, provider: &str) -> bool {
        should_ignore(provider, &self.included, &self.excluded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONE: [&str; 0] = [];

    #[test]
    fn nothing_configured_ignores_nothing() {
        assert!(!should_ignore("testing", &NONE, &NONE));
        assert!(ProviderFilter::default().is_open());
    }

    #[test]
    fn included_wins_over_excluded() {
        assert!(!should_ignore("a", &["a"], &["a"]));
        assert!(should_ignore("b", &["a"], &["a"]));
        assert!(should_ignore("b", &["a"], &NONE));
    }

    #[test]
    fn excluded_only_applies_without_included() {
        assert!(should_ignore("a", &NONE, &["a", "b"]));
        assert!(!should_ignore("c", &NONE, &["a", "b"]));
    }

    #[test]
    fn included_membership_decides_regardless_of_excluded() {
        let included = ["sony", "warner"];
        for excluded in [vec![], vec!["sony"], vec!["universal"]] {
            assert!(!should_ignore("sony", &included, &excluded));
            assert!(should_ignore("universal", &included, &excluded));
        }
    }

    #[test]
    fn owned_filter_matches_free_function() {
        let filter = ProviderFilter::new(vec![], vec!["orchard".to_string()]);
        assert!(filter.should_ignore("orchard"));
        assert!(!filter.should_ignore("believe"));
        assert!(!filter.is_open());
    }
}
