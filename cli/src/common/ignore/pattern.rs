//! # Glob Compilation (`common::ignore::pattern`)
//!
//! File: cli/src/common/ignore/pattern.rs
//!
//! ## Overview
//!
//! Compiles the glob part of an ignore rule into a list of path [`Segment`]s
//! and matches them against a `/`-split relative path.
//!
//! Supported syntax, per segment:
//!
//! - `*` any run of characters (never crosses `/`)
//! - `?` exactly one character
//! - `[abc]`, `[a-z]`, `[!a-z]` / `[^a-z]` character classes
//! - `\x` the literal character `x`
//!
//! A segment consisting solely of `**` is [`Segment::AnyDepth`] and matches zero
//! or more whole path segments. `**` embedded in a longer segment (`a**b`)
//! behaves like `*`.
//!

/// One element of a compiled segment glob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Literal(char),
    AnyRun,
    AnyOne,
    Class { negated: bool, items: Vec<ClassItem> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassItem {
    Single(char),
    Range(char, char),
}

impl Token {
    /// Whether this single-character token accepts `c`. `AnyRun` is handled by
    /// the matcher and never reaches here.
    fn accepts(&self, c: char) -> bool {
        match self {
            Token::Literal(expected) => *expected == c,
            Token::AnyOne => true,
            Token::AnyRun => true,
            Token::Class { negated, items } => {
                let hit = items.iter().any(|item| match item {
                    ClassItem::Single(single) => *single == c,
                    ClassItem::Range(low, high) => (*low..=*high).contains(&c),
                });
                hit != *negated
            }
        }
    }
}

/// A compiled path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// `**`: zero or more whole segments.
    AnyDepth,
    /// A glob matched against exactly one segment.
    Glob(Vec<Token>),
}

impl Segment {
    /// Compiles one `/`-free piece of a pattern.
    pub fn compile(text: &str) -> Segment {
        if text == "**" {
            return Segment::AnyDepth;
        }

        let chars: Vec<char> = text.chars().collect();
        let mut tokens = Vec::with_capacity(chars.len());
        let mut i = 0;
        while i < chars.len() {
            match chars[i] {
                '\\' if i + 1 < chars.len() => {
                    tokens.push(Token::Literal(chars[i + 1]));
                    i += 2;
                }
                '*' => {
                    if tokens.last() != Some(&Token::AnyRun) {
                        tokens.push(Token::AnyRun);
                    }
                    i += 1;
                }
                '?' => {
                    tokens.push(Token::AnyOne);
                    i += 1;
                }
                '[' => match parse_class(&chars[i + 1..]) {
                    Some((token, consumed)) => {
                        tokens.push(token);
                        i += 1 + consumed;
                    }
                    // Unterminated class: a literal bracket.
                    None => {
                        tokens.push(Token::Literal('['));
                        i += 1;
                    }
                },
                c => {
                    tokens.push(Token::Literal(c));
                    i += 1;
                }
            }
        }
        Segment::Glob(tokens)
    }
}

/// Parses the body of a `[...]` class. `rest` starts just after the `[`.
/// Returns the token and the number of chars consumed including the `]`.
fn parse_class(rest: &[char]) -> Option<(Token, usize)> {
    let mut i = 0;
    let negated = matches!(rest.first(), Some('!') | Some('^'));
    if negated {
        i += 1;
    }

    let mut items = Vec::new();
    let mut first = true;
    while i < rest.len() {
        let c = rest[i];
        // A `]` right after the opening bracket is a member, not the end.
        if c == ']' && !first {
            return Some((Token::Class { negated, items }, i + 1));
        }
        first = false;

        let (low, step) = if c == '\\' && i + 1 < rest.len() {
            (rest[i + 1], 2)
        } else {
            (c, 1)
        };
        i += step;

        if i + 1 < rest.len() && rest[i] == '-' && rest[i + 1] != ']' {
            let high = rest[i + 1];
            items.push(ClassItem::Range(low, high));
            i += 2;
        } else {
            items.push(ClassItem::Single(low));
        }
    }
    None
}

/// Wildcard match with a single resume point: on a mismatch, the most recent
/// `AnyRun` absorbs one more character and matching resumes after it.
/// Worst case is `O(tokens * text)`.
fn tokens_match(tokens: &[Token], text: &[char]) -> bool {
    let (mut t, mut c) = (0, 0);
    let mut resume: Option<(usize, usize)> = None;

    while c < text.len() {
        match tokens.get(t) {
            Some(Token::AnyRun) => {
                resume = Some((t, c));
                t += 1;
            }
            Some(token) if token.accepts(text[c]) => {
                t += 1;
                c += 1;
            }
            _ => match resume {
                Some((star, absorbed)) => {
                    resume = Some((star, absorbed + 1));
                    t = star + 1;
                    c = absorbed + 1;
                }
                None => return false,
            },
        }
    }
    tokens[t..].iter().all(|token| *token == Token::AnyRun)
}

fn glob_matches(tokens: &[Token], segment: &str) -> bool {
    let chars: Vec<char> = segment.chars().collect();
    tokens_match(tokens, &chars)
}

/// Matches a compiled pattern against the whole of `path` (already split on
/// `/`). `**` segments are resumed the same way `*` is within a segment.
pub fn segments_match(pattern: &[Segment], path: &[&str]) -> bool {
    let (mut p, mut s) = (0, 0);
    let mut resume: Option<(usize, usize)> = None;

    while s < path.len() {
        match pattern.get(p) {
            Some(Segment::AnyDepth) => {
                resume = Some((p, s));
                p += 1;
            }
            Some(Segment::Glob(tokens)) if glob_matches(tokens, path[s]) => {
                p += 1;
                s += 1;
            }
            _ => match resume {
                Some((any, absorbed)) => {
                    resume = Some((any, absorbed + 1));
                    p = any + 1;
                    s = absorbed + 1;
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|segment| *segment == Segment::AnyDepth)
}
