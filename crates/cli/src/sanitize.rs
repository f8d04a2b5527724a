// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reduce a raw command line to something safe to run in the sandbox shell.
//!
//! Only globbing is wanted from the sandbox, so anything that could run code,
//! touch files or pull in history is removed. The result always has balanced
//! quotes and extended-glob parentheses.

/// Strip history expansion and substitutions, stop at the first command
/// separator or redirection, and close whatever is left open.
pub fn sanitize_command(cmd: &str) -> String {
    let chars: Vec<char> = cmd.chars().collect();
    let mut out = String::with_capacity(cmd.len());
    let mut quote: Option<char> = None;
    let mut extglob = 0usize;
    // Where the current word starts in `out`, and the extglob depth there.
    let mut word = (0usize, 0usize);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match quote {
            Some('\'') => {
                out.push(c);
                if c == '\'' {
                    quote = None;
                }
                i += 1;
                continue;
            }
            Some(_) => {
                match c {
                    '"' => {
                        out.push(c);
                        quote = None;
                    }
                    '\\' => {
                        if let Some(&next) = chars.get(i + 1) {
                            out.push(c);
                            out.push(next);
                            i += 1;
                        }
                    }
                    '$' => {
                        i = skip_substitution(&chars, i);
                        continue;
                    }
                    '`' => break,
                    _ => out.push(c),
                }
                i += 1;
                continue;
            }
            None => {}
        }

        match c {
            '\\' => match chars.get(i + 1) {
                Some(&next) => {
                    out.push(c);
                    out.push(next);
                    i += 1;
                }
                None => break,
            },
            '\'' | '"' => {
                quote = Some(c);
                out.push(c);
            }
            '!' => match chars.get(i + 1) {
                Some(next) if !(next.is_whitespace() || *next == '(') => {
                    i = skip_history(&chars, i);
                    continue;
                }
                _ => out.push(c),
            },
            '$' => {
                i = skip_substitution(&chars, i);
                continue;
            }
            ';' | '&' | '`' => break,
            '|' if extglob == 0 => break,
            '<' | '>' => {
                out.truncate(word.0);
                extglob = word.1;
                break;
            }
            '(' => {
                let prev = i.checked_sub(1).map(|p| chars[p]);
                if !matches!(prev, Some('?' | '*' | '+' | '@' | '!')) {
                    break;
                }
                extglob += 1;
                out.push(c);
            }
            ')' => {
                if extglob == 0 {
                    break;
                }
                extglob -= 1;
                out.push(c);
            }
            c if c.is_whitespace() => {
                out.push(c);
                word = (out.len(), extglob);
            }
            _ => out.push(c),
        }
        i += 1;
    }

    if let Some(q) = quote {
        out.push(q);
    }
    out.extend(std::iter::repeat(')').take(extglob));
    out
}

/// Index just past a history expansion starting with `!` at `start`.
fn skip_history(chars: &[char], start: usize) -> usize {
    let mut i = start + 1;
    match chars.get(i) {
        Some('!' | '$' | '^' | '*' | '#') => i += 1,
        Some('?') => {
            i += 1;
            while let Some(&c) = chars.get(i) {
                i += 1;
                if c == '?' {
                    break;
                }
            }
        }
        Some('-') => {
            i += 1;
            while chars.get(i).is_some_and(char::is_ascii_digit) {
                i += 1;
            }
        }
        _ => {
            while chars.get(i).is_some_and(|c| !ends_word(*c) && *c != ':') {
                i += 1;
            }
        }
    }
    // Word designators and modifiers (`!!:2`, `!$:h`).
    while chars.get(i) == Some(&':') {
        i += 1;
        while chars.get(i).is_some_and(|c| c.is_ascii_alphanumeric() || "^$*-%&".contains(*c)) {
            i += 1;
        }
    }
    i
}

/// Index just past a `$` substitution starting at `start`.
fn skip_substitution(chars: &[char], start: usize) -> usize {
    let i = start + 1;
    match chars.get(i) {
        Some('{') => skip_balanced(chars, i, '{', '}'),
        Some('(') => skip_balanced(chars, i, '(', ')'),
        Some(c) if c.is_ascii_alphabetic() || *c == '_' => {
            let mut j = i;
            while chars.get(j).is_some_and(|c| c.is_ascii_alphanumeric() || *c == '_') {
                j += 1;
            }
            j
        }
        Some(c) if c.is_ascii_digit() || "@*#?$!-".contains(*c) => i + 1,
        _ => i,
    }
}

/// Index just past the bracket closing the one at `open_at`, or the end.
fn skip_balanced(chars: &[char], open_at: usize, open: char, close: char) -> usize {
    let mut depth = 0usize;
    for (j, c) in chars.iter().enumerate().skip(open_at) {
        if *c == open {
            depth += 1;
        } else if *c == close {
            depth -= 1;
            if depth == 0 {
                return j + 1;
            }
        }
    }
    chars.len()
}

fn ends_word(c: char) -> bool {
    c.is_whitespace() || ";&|<>()'\"`".contains(c)
}

/// Escape `s` for use inside single quotes.
pub fn sanitize_mask(s: &str) -> String {
    s.replace('\'', r"'\''")
}

/// `s` as one single-quoted shell word.
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", sanitize_mask(s))
}

#[cfg(test)]
#[path = "sanitize_tests.rs"]
mod tests;
