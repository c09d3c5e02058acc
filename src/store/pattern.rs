//! Glob matching for KEYS, SCAN, HSCAN and SSCAN
//!
//! Supported syntax:
//! - `*` : any sequence (including empty)
//! - `?` : exactly one byte
//! - `[abc]`, `[a-z]`, `[^abc]` / `[!abc]` : byte classes
//! - `\x` : literal `x`

/// Check if `text` matches `pattern`
///
/// Iterative matcher that backtracks to the most recent `*` only, so the
/// worst case is O(pattern * text).
pub fn glob_match(pattern: &[u8], text: &[u8]) -> bool {
    let mut pi = 0;
    let mut ti = 0;

    // (pattern index after the star, text index the star currently covers up to)
    let mut star: Option<(usize, usize)> = None;

    while ti < text.len() {
        if pi < pattern.len() {
            match pattern[pi] {
                b'*' => {
                    star = Some((pi + 1, ti));
                    pi += 1;
                    continue;
                }
                b'?' => {
                    pi += 1;
                    ti += 1;
                    continue;
                }
                b'[' => match match_class(pattern, pi, text[ti]) {
                    Some((true, next)) => {
                        pi = next;
                        ti += 1;
                        continue;
                    }
                    Some((false, _)) => {}
                    // unterminated class: the bracket is a literal
                    None if text[ti] == b'[' => {
                        pi += 1;
                        ti += 1;
                        continue;
                    }
                    None => {}
                },
                b'\\' if pi + 1 < pattern.len() => {
                    if pattern[pi + 1] == text[ti] {
                        pi += 2;
                        ti += 1;
                        continue;
                    }
                }
                literal => {
                    if literal == text[ti] {
                        pi += 1;
                        ti += 1;
                        continue;
                    }
                }
            }
        }

        match star {
            Some((after_star, covered)) => {
                pi = after_star;
                ti = covered + 1;
                star = Some((after_star, covered + 1));
            }
            None => return false,
        }
    }

    // trailing stars match the empty rest
    while pi < pattern.len() && pattern[pi] == b'*' {
        pi += 1;
    }
    pi == pattern.len()
}

/// Match one byte against the class opening at `start`
///
/// Returns whether it matched and the index just past `]`, or `None` if the
/// class is never closed.
fn match_class(pattern: &[u8], start: usize, byte: u8) -> Option<(bool, usize)> {
    let mut i = start + 1;
    let negated = i < pattern.len() && (pattern[i] == b'^' || pattern[i] == b'!');
    if negated {
        i += 1;
    }

    let mut matched = false;
    while i < pattern.len() && pattern[i] != b']' {
        if pattern[i] == b'\\' && i + 1 < pattern.len() {
            matched |= pattern[i + 1] == byte;
            i += 2;
        } else if i + 2 < pattern.len() && pattern[i + 1] == b'-' && pattern[i + 2] != b']' {
            let lo = pattern[i].min(pattern[i + 2]);
            let hi = pattern[i].max(pattern[i + 2]);
            matched |= lo <= byte && byte <= hi;
            i += 3;
        } else {
            matched |= pattern[i] == byte;
            i += 1;
        }
    }

    if i >= pattern.len() {
        return None;
    }
    Some((matched != negated, i + 1))
}
