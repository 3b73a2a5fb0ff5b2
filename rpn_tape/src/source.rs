// Copyright 2026 the RPN Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Line tokenizer for RPN source.
//!
//! Each non-blank line is `COMMAND [PARAM1 [PARAM2 [PARAM3]]]`, tokens separated by spaces, tabs
//! or commas. Line numbers are 1-based physical line numbers.

/// Maximum number of parameters kept per line; extra tokens are counted but dropped.
pub const MAX_PARAMS: usize = 3;

/// One tokenized source line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SourceLine<'a> {
    /// 1-based line number.
    pub number: u32,
    /// Raw line text (without the terminator).
    pub text: &'a str,
    /// First token.
    pub command: &'a str,
    params: [&'a str; MAX_PARAMS],
    param_count: usize,
}

impl<'a> SourceLine<'a> {
    /// Tokenize `text`; returns `None` for blank lines.
    #[must_use]
    pub fn parse(number: u32, text: &'a str) -> Option<Self> {
        let mut tokens = text
            .split([' ', '\t', ','])
            .filter(|t| !t.is_empty());
        let command = tokens.next()?;
        let mut params = [""; MAX_PARAMS];
        let mut param_count = 0;
        for token in tokens {
            if let Some(slot) = params.get_mut(param_count) {
                *slot = token;
            }
            param_count += 1;
        }
        Some(Self {
            number,
            text,
            command,
            params,
            param_count,
        })
    }

    /// Number of parameter tokens on the line (including any beyond [`MAX_PARAMS`]).
    #[must_use]
    pub fn param_count(&self) -> usize {
        self.param_count
    }

    /// Parameter `i` (0-based).
    #[must_use]
    pub fn param(&self, i: usize) -> Option<&'a str> {
        (i < self.param_count).then(|| self.params.get(i).copied()).flatten()
    }
}

/// Iterate the non-blank lines of `source`.
pub fn lines(source: &str) -> impl Iterator<Item = SourceLine<'_>> {
    source
        .split('\n')
        .enumerate()
        .filter_map(|(i, text)| {
            let text = text.strip_suffix('\r').unwrap_or(text);
            let number = u32::try_from(i + 1).unwrap_or(u32::MAX);
            SourceLine::parse(number, text)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn tokens_split_on_space_tab_comma() {
        let line = SourceLine::parse(3, "CONST\tint8, -1").expect("line");
        assert_eq!(line.command, "CONST");
        assert_eq!(line.param_count(), 2);
        assert_eq!(line.param(0), Some("int8"));
        assert_eq!(line.param(1), Some("-1"));
        assert_eq!(line.param(2), None);
    }

    #[test]
    fn blank_lines_are_skipped_but_counted() {
        let all: Vec<_> = lines("READ A\r\n\n  \nWRITE B").collect();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].number, 1);
        assert_eq!(all[0].text, "READ A");
        assert_eq!(all[1].number, 4);
        assert_eq!(all[1].command, "WRITE");
    }

    #[test]
    fn excess_params_are_counted() {
        let line = SourceLine::parse(1, "X a b c d").expect("line");
        assert_eq!(line.param_count(), 4);
        assert_eq!(line.param(2), Some("c"));
        assert_eq!(line.param(3), None);
    }
}
