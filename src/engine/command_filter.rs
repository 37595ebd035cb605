// Disabled-command filter

use std::collections::HashSet;

/// Destructive command that is rejected regardless of configuration
pub const ALWAYS_DISABLED: &str = "flushdb";

/// Set of command names rejected before execution.
///
/// Built once from configuration; there is no way to remove a name afterwards.
/// Names are stored and looked up lower-cased.
#[derive(Debug, Clone)]
pub struct DisabledCommands {
    names: HashSet<String>,
}

impl DisabledCommands {
    pub fn new<I, S>(configured: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names: HashSet<String> = configured
            .into_iter()
            .map(|name| name.as_ref().trim().to_lowercase())
            .filter(|name| !name.is_empty())
            .collect();
        names.insert(ALWAYS_DISABLED.to_string());
        Self { names }
    }

    pub fn is_disabled(&self, name: &str) -> bool {
        if name.bytes().any(|b| b.is_ascii_uppercase()) {
            self.names.contains(&name.to_lowercase())
        } else {
            self.names.contains(name)
        }
    }

    /// First disabled name in `names`, if any
    pub fn first_disabled<'a, I>(&self, names: I) -> Option<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        names.into_iter().find(|name| self.is_disabled(name))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for DisabledCommands {
    fn default() -> Self {
        Self::new(std::iter::empty::<&str>())
    }
}
