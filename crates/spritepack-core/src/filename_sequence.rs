use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A templated filename family `stem{first-last}ext`, e.g. `atlas{00-99}.png`.
///
/// The range bounds the number of sheets a texture may occupy. An open range
/// `{0-}` allows any number of sheets; a plain filename without braces is a
/// one-element sequence. Zero padding is inferred from the `first` literal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct FilenameSequence {
    stem: String,
    suffix: String,
    first: usize,
    count: usize,
    pad: usize,
}

impl FilenameSequence {
    pub fn parse(pattern: &str) -> Option<FilenameSequence> {
        let (open, close) = match (pattern.find('{'), pattern.rfind('}')) {
            (Some(o), Some(c)) if o < c => (o, c),
            (None, None) => {
                return Some(FilenameSequence {
                    stem: pattern.to_string(),
                    suffix: String::new(),
                    first: 0,
                    count: 1,
                    pad: 0,
                });
            }
            _ => return None,
        };
        let range = &pattern[open + 1..close];
        let dash = range.find('-')?;
        let (first_str, last_str) = (&range[..dash], &range[dash + 1..]);
        let first: usize = first_str.parse().ok()?;
        let count = if last_str.is_empty() {
            usize::MAX
        } else {
            let last: usize = last_str.parse().ok()?;
            last.checked_sub(first)?.checked_add(1)?
        };
        Some(FilenameSequence {
            stem: pattern[..open].to_string(),
            suffix: pattern[close + 1..].to_string(),
            first,
            count,
            pad: first_str.len(),
        })
    }

    /// Maximum number of sheets this sequence can name.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_sequence(&self) -> bool {
        self.count != 1 || self.pad > 0
    }

    /// The `n`-th concrete filename, `n < count()`.
    pub fn get_nth_filename(&self, n: usize) -> String {
        if !self.is_sequence() {
            return self.stem.clone();
        }
        format!(
            "{}{:0pad$}{}",
            self.stem,
            self.first + n,
            self.suffix,
            pad = self.pad
        )
    }

    /// Filename of the first sheet; used in diagnostics.
    pub fn first_filename(&self) -> String {
        self.get_nth_filename(0)
    }
}

impl fmt::Display for FilenameSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_sequence() {
            return write!(f, "{}", self.stem);
        }
        if self.count == usize::MAX {
            write!(f, "{}{{{:0pad$}-}}{}", self.stem, self.first, self.suffix, pad = self.pad)
        } else {
            write!(
                f,
                "{}{{{:0pad$}-{}}}{}",
                self.stem,
                self.first,
                self.first + self.count - 1,
                self.suffix,
                pad = self.pad
            )
        }
    }
}

impl FromStr for FilenameSequence {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilenameSequence::parse(s).ok_or_else(|| format!("invalid filename sequence '{s}'"))
    }
}

impl TryFrom<String> for FilenameSequence {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<FilenameSequence> for String {
    fn from(seq: FilenameSequence) -> String {
        seq.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_filename_is_single() {
        let seq = FilenameSequence::parse("atlas.png").unwrap();
        assert_eq!(seq.count(), 1);
        assert_eq!(seq.get_nth_filename(0), "atlas.png");
        assert!(!seq.is_sequence());
    }

    #[test]
    fn bounded_range_with_padding() {
        let seq = FilenameSequence::parse("atlas-{00-99}.png").unwrap();
        assert_eq!(seq.count(), 100);
        assert_eq!(seq.get_nth_filename(0), "atlas-00.png");
        assert_eq!(seq.get_nth_filename(12), "atlas-12.png");
        assert_eq!(seq.to_string(), "atlas-{00-99}.png");
    }

    #[test]
    fn open_range_is_unbounded() {
        let seq = FilenameSequence::parse("sheet{0-}.png").unwrap();
        assert_eq!(seq.count(), usize::MAX);
        assert_eq!(seq.get_nth_filename(3), "sheet3.png");
    }

    #[test]
    fn nonzero_first() {
        let seq = FilenameSequence::parse("tex{1-4}.png").unwrap();
        assert_eq!(seq.count(), 4);
        assert_eq!(seq.get_nth_filename(0), "tex1.png");
        assert_eq!(seq.get_nth_filename(3), "tex4.png");
    }

    #[test]
    fn malformed_patterns_rejected() {
        assert!(FilenameSequence::parse("a{b}.png").is_none());
        assert!(FilenameSequence::parse("a{3}.png").is_none());
        assert!(FilenameSequence::parse("a}b{.png").is_none());
    }
}
