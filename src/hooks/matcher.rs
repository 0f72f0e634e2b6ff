//! Tool-name matchers for hook rules.

/// A pattern tested against an invoked tool's name.
///
/// Either the wildcard (`*` or empty, matches everything), a single
/// tool-name token, or a pipe-separated token set. Tokens match the tool
/// name exactly and case-sensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    Wildcard,
    Tools(Vec<String>),
}

impl Matcher {
    /// Parse a matcher pattern. `None` behaves like the wildcard.
    pub fn parse(pattern: Option<&str>) -> Self {
        let trimmed = pattern.unwrap_or_default().trim();
        if trimmed.is_empty() || trimmed == "*" {
            return Matcher::Wildcard;
        }
        Matcher::Tools(
            trimmed
                .split('|')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect(),
        )
    }

    pub fn matches(&self, tool_name: &str) -> bool {
        match self {
            Matcher::Wildcard => true,
            Matcher::Tools(tokens) => tokens.iter().any(|t| t == tool_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_matches_everything() {
        assert!(Matcher::parse(Some("*")).matches("Edit"));
        assert!(Matcher::parse(Some("")).matches("Anything"));
        assert!(Matcher::parse(None).matches("Bash"));
    }

    #[test]
    fn test_single_token_exact_match() {
        let m = Matcher::parse(Some("Edit"));
        assert!(m.matches("Edit"));
        assert!(!m.matches("Editor"));
        assert!(!m.matches("edit"));
    }

    #[test]
    fn test_pipe_separated_set() {
        let m = Matcher::parse(Some("Edit|Write"));
        assert!(m.matches("Edit"));
        assert!(m.matches("Write"));
        assert!(!m.matches("Read"));
        assert!(!m.matches("Edit|Write"));
    }

    #[test]
    fn test_tokens_are_trimmed() {
        let m = Matcher::parse(Some(" Edit | Write "));
        assert!(m.matches("Edit"));
        assert!(m.matches("Write"));
    }
}
