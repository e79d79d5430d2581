/// What a single journal line looks like, judged by its first character only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineKind {
    Blank,
    EntryHeader,
    IndentedPosting,
    YearDirective,
    Unrecognized,
}

impl LineKind {
    /// Expects tabs to be already replaced, see [`normalize`].
    pub fn classify(line: &str) -> LineKind {
        match line.chars().next() {
            None => LineKind::Blank,
            Some(c) if c.is_ascii_digit() => LineKind::EntryHeader,
            Some(c) if c.is_whitespace() => LineKind::IndentedPosting,
            Some('Y') => LineKind::YearDirective,
            Some(_) => LineKind::Unrecognized,
        }
    }
}

pub fn normalize(raw: &str) -> String {
    raw.replace('\t', " ")
}

#[cfg(test)]
mod tests {
    use crate::line::{normalize, LineKind};

    #[test]
    fn classify_lines() {
        assert_eq!(LineKind::classify(""), LineKind::Blank);
        assert_eq!(LineKind::classify("2024/01/02 Rent"), LineKind::EntryHeader);
        assert_eq!(LineKind::classify("  Assets:Cash  $5"), LineKind::IndentedPosting);
        assert_eq!(LineKind::classify("Y 2020"), LineKind::YearDirective);
        assert_eq!(LineKind::classify("; a comment"), LineKind::Unrecognized);
        assert_eq!(LineKind::classify("year 2020"), LineKind::Unrecognized);
    }

    #[test]
    fn tabs_become_spaces() {
        let line = normalize("\tExpenses:Food\t\t$4");
        assert_eq!(line, " Expenses:Food  $4");
        assert_eq!(LineKind::classify(&line), LineKind::IndentedPosting);
    }
}
