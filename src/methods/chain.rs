use super::traits::RetrievalMethod;
use super::{default_mirrors, ProfilePageMethod, PublicApiMethod};
use crate::config::Config;

/// Ordered list of retrieval methods, tried first to last.
pub struct MethodChain {
    methods: Vec<Box<dyn RetrievalMethod>>,
}

impl MethodChain {
    /// Create a new empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self {
            methods: Vec::new(),
        }
    }

    /// The unauthenticated chain: public API, profile page, then mirrors.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let mut chain = Self::new();
        chain.push(Box::new(PublicApiMethod::new(&config.instagram_base_url)));
        chain.push(Box::new(ProfilePageMethod::new(&config.instagram_base_url)));
        if config.mirrors_enabled {
            for mirror in default_mirrors() {
                chain.push(Box::new(mirror));
            }
        }
        chain
    }

    /// Append a method at the lowest priority.
    pub fn push(&mut self, method: Box<dyn RetrievalMethod>) {
        self.methods.push(method);
    }

    /// Builder-style `push`.
    #[must_use]
    pub fn with(mut self, method: Box<dyn RetrievalMethod>) -> Self {
        self.push(method);
        self
    }

    #[must_use]
    pub fn methods(&self) -> &[Box<dyn RetrievalMethod>] {
        &self.methods
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl Default for MethodChain {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_order() {
        let config = Config {
            mirrors_enabled: true,
            ..Config::for_testing()
        };
        let chain = MethodChain::from_config(&config);
        let ids: Vec<_> = chain.methods().iter().map(|m| m.method_id()).collect();
        assert_eq!(
            ids,
            vec!["public_api", "profile_page", "mirror_picuki", "mirror_imginn", "mirror_unavatar"]
        );
    }

    #[test]
    fn test_mirrors_can_be_disabled() {
        let chain = MethodChain::from_config(&Config::for_testing());
        assert_eq!(chain.len(), 2);
    }
}
