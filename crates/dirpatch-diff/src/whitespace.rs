//! Line comparison policy.

use std::borrow::Cow;

/// How two lines are compared when deciding whether they are equal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WhitespaceMode {
    /// Lines must match byte for byte, including the line terminator.
    #[default]
    Exact,
    /// Every whitespace character is ignored (like `diff -w`).
    IgnoreAll,
}

impl WhitespaceMode {
    /// Map the boolean `whitespace_insensitive` flag used by callers.
    pub fn from_insensitive(insensitive: bool) -> Self {
        if insensitive {
            Self::IgnoreAll
        } else {
            Self::Exact
        }
    }

    /// Returns `true` if whitespace differences are ignored.
    pub fn is_insensitive(self) -> bool {
        matches!(self, Self::IgnoreAll)
    }

    /// The string two lines are compared by under this policy.
    pub fn comparison_key(self, line: &str) -> Cow<'_, str> {
        match self {
            Self::Exact => Cow::Borrowed(line),
            Self::IgnoreAll => {
                if line.chars().any(char::is_whitespace) {
                    Cow::Owned(line.chars().filter(|c| !c.is_whitespace()).collect())
                } else {
                    Cow::Borrowed(line)
                }
            }
        }
    }

    /// Returns `true` if the two lines are equal under this policy.
    pub fn lines_equal(self, a: &str, b: &str) -> bool {
        match self {
            Self::Exact => a == b,
            Self::IgnoreAll => self.comparison_key(a) == self.comparison_key(b),
        }
    }
}
