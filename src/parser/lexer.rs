// Shared lexing helpers for scalar token parsers

use nom::{character::complete::multispace0, sequence::delimited, IResult};

/// Wrap a parser so it tolerates surrounding whitespace
pub fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nom::bytes::complete::tag;

    fn word(input: &str) -> IResult<&str, &str> {
        tag("abc")(input)
    }

    #[test]
    fn test_ws_strips_both_sides() {
        let (rest, out) = ws(word)("  abc \t").unwrap();
        assert_eq!(out, "abc");
        assert_eq!(rest, "");
    }

    #[test]
    fn test_ws_without_whitespace() {
        let (rest, out) = ws(word)("abcdef").unwrap();
        assert_eq!(out, "abc");
        assert_eq!(rest, "def");
    }
}
