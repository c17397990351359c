//! Entity name patterns
//!
//! Patterns are globs over the full entity name: `*` matches any run of
//! characters, `?` matches exactly one, everything else is literal.

use regex::Regex;

use crate::error::{Result, SourceError};

/// Compiled entity pattern
#[derive(Debug, Clone)]
pub struct EntityPattern {
    regex: Regex,
}

impl EntityPattern {
    /// Compile a glob pattern
    pub fn compile(pattern: &str) -> Result<Self> {
        let mut expr = String::with_capacity(pattern.len() + 8);
        expr.push('^');
        for c in pattern.chars() {
            match c {
                '*' => expr.push_str(".*"),
                '?' => expr.push('.'),
                c => expr.push_str(&regex::escape(c.encode_utf8(&mut [0u8; 4]))),
            }
        }
        expr.push('$');

        let regex = Regex::new(&expr).map_err(|e| SourceError::invalid_pattern(pattern, e))?;
        Ok(Self { regex })
    }

    /// Whether `entity` matches the pattern
    #[inline]
    pub fn matches(&self, entity: &str) -> bool {
        self.regex.is_match(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal() {
        let p = EntityPattern::compile("app:name=web").unwrap();
        assert!(p.matches("app:name=web"));
        assert!(!p.matches("app:name=web2"));
        assert!(!p.matches("xapp:name=web"));
    }

    #[test]
    fn test_star() {
        let p = EntityPattern::compile("app:*").unwrap();
        assert!(p.matches("app:name=web"));
        assert!(p.matches("app:"));
        assert!(!p.matches("db:name=main"));
    }

    #[test]
    fn test_question_mark() {
        let p = EntityPattern::compile("node?").unwrap();
        assert!(p.matches("node1"));
        assert!(!p.matches("node"));
        assert!(!p.matches("node12"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let p = EntityPattern::compile("a.b+(c)").unwrap();
        assert!(p.matches("a.b+(c)"));
        assert!(!p.matches("aXbb(c)"));
    }
}
