use crate::error::ValidationError;
use std::{fmt, slice};
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub find: String,
    pub replace: String,
}
/// A repeated `find` keeps the slot of its first occurrence and the
/// replacement of its last one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ruleset {
    rules: Vec<Rule>,
}
impl Ruleset {
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        let tokens: Vec<&str> = text.trim().split(',').collect();
        if tokens.len() % 2 != 0 {
            return Err(ValidationError::InvalidRules {
                tokens: tokens.len(),
            });
        }
        let mut ruleset = Self::default();
        for pair in tokens.chunks_exact(2) {
            if let [find, replace] = pair {
                ruleset.insert(find, replace);
            }
        }
        Ok(ruleset)
    }
    fn insert(&mut self, find: &str, replace: &str) {
        if let Some(existing) = self.rules.iter_mut().find(|rule| rule.find == find) {
            replace.clone_into(&mut existing.replace);
            return;
        }
        self.rules.push(Rule {
            find: find.to_owned(),
            replace: replace.to_owned(),
        });
    }
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }
    pub const fn len(&self) -> usize {
        self.rules.len()
    }
    pub const fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
impl<'rules> IntoIterator for &'rules Ruleset {
    type Item = &'rules Rule;
    type IntoIter = slice::Iter<'rules, Rule>;
    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
impl fmt::Display for Ruleset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, rule) in self.rules.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "'{}': '{}'", rule.find, rule.replace)?;
        }
        f.write_str("}")
    }
}
