use std::fmt;

use smallvec::SmallVec;

/// Sorted, non-overlapping set of inclusive code point ranges
#[derive(Debug, Clone, Default, Hash, PartialEq, Eq)]
pub struct CodePointSet {
    ranges: SmallVec<[(char, char); 2]>,
}

impl CodePointSet {
    pub fn new() -> CodePointSet {
        CodePointSet {
            ranges: SmallVec::new(),
        }
    }

    pub fn any() -> CodePointSet {
        CodePointSet::range('\0', char::MAX)
    }

    pub fn single(ch: char) -> CodePointSet {
        CodePointSet::range(ch, ch)
    }

    pub fn range(start: char, end: char) -> CodePointSet {
        let mut set = CodePointSet::new();
        set.add_range(start, end);
        set
    }

    pub fn add(&mut self, ch: char) {
        self.add_range(ch, ch);
    }

    pub fn add_range(&mut self, start: char, end: char) {
        let (start, end) = if start <= end {
            (start, end)
        } else {
            (end, start)
        };

        let (mut lo, mut hi) = (start as u32, end as u32);
        let mut merged: SmallVec<[(char, char); 2]> = SmallVec::new();
        let mut inserted = false;

        for &(a, b) in &self.ranges {
            let (a, b) = (a as u32, b as u32);
            if b.saturating_add(1) < lo {
                merged.push(to_range(a, b));
            } else if hi.saturating_add(1) < a {
                if !inserted {
                    merged.push(to_range(lo, hi));
                    inserted = true;
                }
                merged.push(to_range(a, b));
            } else {
                lo = lo.min(a);
                hi = hi.max(b);
            }
        }

        if !inserted {
            merged.push(to_range(lo, hi));
        }

        self.ranges = merged;
    }

    pub fn contains(&self, ch: char) -> bool {
        self.ranges.iter().any(|(a, b)| *a <= ch && ch <= *b)
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn ranges(&self) -> &[(char, char)] {
        &self.ranges
    }

    fn is_single(&self) -> Option<char> {
        match self.ranges.as_slice() {
            [(a, b)] if a == b => Some(*a),
            _ => None,
        }
    }
}

// Ranges only ever merge existing chars, so the bounds stay valid scalars
fn to_range(a: u32, b: u32) -> (char, char) {
    (
        char::from_u32(a).unwrap_or(char::REPLACEMENT_CHARACTER),
        char::from_u32(b).unwrap_or(char::REPLACEMENT_CHARACTER),
    )
}

fn write_char(f: &mut fmt::Formatter<'_>, ch: char) -> fmt::Result {
    match ch {
        '\\' | '[' | ']' | '(' | ')' | '{' | '}' | '|' | '.' | '*' | '+' | '?' | '^' | '$'
        | '-' => write!(f, "\\{ch}"),
        '\n' => write!(f, "\\n"),
        '\t' => write!(f, "\\t"),
        '\r' => write!(f, "\\r"),
        c if c.is_control() => write!(f, "{}", c.escape_unicode()),
        c => write!(f, "{c}"),
    }
}

impl fmt::Display for CodePointSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ch) = self.is_single() {
            return write_char(f, ch);
        }

        if *self == CodePointSet::any() {
            return write!(f, ".");
        }

        write!(f, "[")?;
        for (a, b) in &self.ranges {
            write_char(f, *a)?;
            if a != b {
                write!(f, "-")?;
                write_char(f, *b)?;
            }
        }
        write!(f, "]")
    }
}

impl From<char> for CodePointSet {
    fn from(ch: char) -> Self {
        CodePointSet::single(ch)
    }
}
