use dh_core::markers::SIMPLE_PROMPT;
use regex::Regex;

/// Matches a reply's most recent lines against a prompt pattern.
///
/// The pattern must match a whole line. Only the last few lines of a reply
/// are examined, which keeps earlier output that merely resembles a prompt
/// from ending the wait.
#[derive(Debug, Clone)]
pub struct PromptMatcher {
    pattern: String,
    regex: Regex,
}

impl PromptMatcher {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{pattern})$"))?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_match(&self, line: &str) -> bool {
        self.regex.is_match(line)
    }

    /// Index of the first line among the last `tail` lines that matches the
    /// pattern or, when `allow_simple_prompt` is set, contains `"> "`.
    pub fn find_in_tail(
        &self,
        lines: &[String],
        tail: usize,
        allow_simple_prompt: bool,
    ) -> Option<usize> {
        let start = lines.len().saturating_sub(tail);
        lines[start..]
            .iter()
            .position(|line| {
                self.is_match(line) || (allow_simple_prompt && line.contains(SIMPLE_PROMPT))
            })
            .map(|offset| start + offset)
    }

    pub fn matches_tail(&self, lines: &[String], tail: usize, allow_simple_prompt: bool) -> bool {
        self.find_in_tail(lines, tail, allow_simple_prompt).is_some()
    }
}
