//! Redirect and refresh key templates

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    Value,
}

/// A key template with `{0}` placeholders
///
/// Every `{0}` is replaced by the redirect value; `{{` and `}}` produce
/// literal braces. A template may name several keys joined by `;`, which
/// are treated as separate targets when entries are removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyFormat {
    template: String,
    parts: Vec<Part>,
}

impl KeyFormat {
    pub fn parse(template: &str) -> Result<Self, String> {
        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '{' => {
                    let mut placeholder = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(c) => placeholder.push(c),
                            None => return Err(format!("unclosed placeholder in '{template}'")),
                        }
                    }
                    if placeholder.trim() != "0" {
                        return Err(format!(
                            "unsupported placeholder '{{{placeholder}}}' in '{template}', only {{0}} is allowed"
                        ));
                    }
                    if !literal.is_empty() {
                        parts.push(Part::Literal(std::mem::take(&mut literal)));
                    }
                    parts.push(Part::Value);
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err(format!("unmatched '}}' in '{template}'")),
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            parts.push(Part::Literal(literal));
        }

        Ok(Self {
            template: template.to_string(),
            parts,
        })
    }

    /// Substitute `value` for every placeholder
    pub fn apply(&self, value: &str) -> String {
        let mut out = String::with_capacity(self.template.len() + value.len());
        for part in &self.parts {
            match part {
                Part::Literal(text) => out.push_str(text),
                Part::Value => out.push_str(value),
            }
        }
        out
    }

    /// The template as written in the descriptor
    pub fn as_str(&self) -> &str {
        &self.template
    }
}

impl FromStr for KeyFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for KeyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}
