//! Textual cyclomatic complexity.
//!
//! Complexity is calculated over raw text, independent of how the file
//! was parsed:
//! - Start at 1
//! - Add 1 for each: if, else, for, while, switch, case, try, catch, &&, ||
//! - Add 1 for each ternary `?` (not `?.` and not `??`)

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref BRANCH_KEYWORD_RE: Regex =
        Regex::new(r"\b(?:if|else|for|while|switch|case|try|catch)\b").unwrap();
}

/// Calculate the cyclomatic complexity of a source text.
pub fn cyclomatic_complexity(content: &str) -> u32 {
    let keywords = BRANCH_KEYWORD_RE.find_iter(content).count();
    let logical = content.matches("&&").count() + content.matches("||").count();

    1 + (keywords + logical + count_ternaries(content)) as u32
}

/// Count `?` characters that are ternary operators.
fn count_ternaries(content: &str) -> usize {
    let bytes = content.as_bytes();
    let mut count = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'?' {
            i += 1;
            continue;
        }

        match bytes.get(i + 1) {
            // `??` and `??=`
            Some(b'?') => i += 2,
            // `?.` unless it is `cond ?.5 : 1`
            Some(b'.') if !bytes.get(i + 2).is_some_and(|b| b.is_ascii_digit()) => i += 2,
            _ => {
                count += 1;
                i += 1;
            }
        }
    }

    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_complexity() {
        assert_eq!(cyclomatic_complexity("const x = 1;"), 1);
        assert_eq!(cyclomatic_complexity(""), 1);
    }

    #[test]
    fn test_if_statement() {
        assert_eq!(cyclomatic_complexity("if (x) { doSomething(); }"), 2);
    }

    #[test]
    fn test_optional_chaining_and_nullish() {
        assert_eq!(cyclomatic_complexity("const v = obj?.foo?.bar;"), 1);
        assert_eq!(cyclomatic_complexity("const v = a ?? b;"), 1);
        assert_eq!(cyclomatic_complexity("a ??= b;"), 1);
    }

    #[test]
    fn test_ternary() {
        assert_eq!(cyclomatic_complexity("const v = cond ? a : b;"), 2);
        assert_eq!(cyclomatic_complexity("const v = cond ?.5 : 1;"), 2);
    }

    #[test]
    fn test_logical_operators_and_keywords() {
        let source = r#"
function f(a, b) {
    if (a && b) {
        return 1;
    } else if (a || b) {
        return 2;
    }
    for (const x of xs) {}
    while (true) {}
    switch (a) { case 1: break; case 2: break; }
    try { g(); } catch (e) {}
}
"#;
        // if, &&, else, if, ||, for, while, switch, case, case, try, catch = 12
        assert_eq!(cyclomatic_complexity(source), 13);
    }

    #[test]
    fn test_keywords_need_word_boundaries() {
        // "iffy", "format", "forEach" and "elsewhere" do not count
        assert_eq!(cyclomatic_complexity("iffy(format); xs.forEach(elsewhere);"), 1);
    }
}
