// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

/// Helpers for RFC `token` (tchar) validation used by field rules and
/// top-line checks.
pub fn is_tchar(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '!' | '#'
                | '$'
                | '%'
                | '&'
                | '\''
                | '*'
                | '+'
                | '-'
                | '.'
                | '^'
                | '_'
                | '`'
                | '|'
                | '~'
        )
}

/// Return the first invalid character in `s` according to the `token` grammar,
/// or `None` if the entire string is valid.
pub fn find_invalid_token_char(s: &str) -> Option<char> {
    s.chars().find(|&c| !is_tchar(c))
}

/// True when `s` is a non-empty `token`.
pub fn is_token(s: &str) -> bool {
    !s.is_empty() && find_invalid_token_char(s).is_none()
}

/// True when `s` is `1*DIGIT`.
pub fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case('a', true)]
    #[case('Z', true)]
    #[case('3', true)]
    #[case('!', true)]
    #[case(' ', false)]
    #[case('\n', false)]
    #[case('@', false)]
    fn test_is_tchar(#[case] c: char, #[case] expected: bool) {
        assert_eq!(is_tchar(c), expected);
    }

    #[rstest]
    #[case("host", None)]
    #[case("bad header", Some(' '))]
    #[case("G@T", Some('@'))]
    fn test_find_invalid_token_char(#[case] s: &str, #[case] expected: Option<char>) {
        assert_eq!(find_invalid_token_char(s), expected);
    }

    #[rstest]
    #[case("cache-control", true)]
    #[case("", false)]
    #[case("x y", false)]
    fn test_is_token(#[case] s: &str, #[case] expected: bool) {
        assert_eq!(is_token(s), expected);
    }

    #[rstest]
    #[case("0", true)]
    #[case("3600", true)]
    #[case("", false)]
    #[case("-1", false)]
    #[case("1.5", false)]
    fn test_is_digits(#[case] s: &str, #[case] expected: bool) {
        assert_eq!(is_digits(s), expected);
    }
}
