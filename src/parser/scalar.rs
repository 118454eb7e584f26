// Scalar token parsers used by ingestion, type sampling and numeric coercion

use super::lexer::ws;
use nom::{
    branch::alt,
    bytes::complete::tag_no_case,
    character::complete::{digit1, one_of},
    combinator::{all_consuming, opt, recognize, value},
    number::complete::recognize_float,
    sequence::pair,
    IResult,
};

/// Whole-number token: optional sign followed by digits
fn integer_token(input: &str) -> IResult<&str, &str> {
    recognize(pair(opt(one_of("+-")), digit1))(input)
}

/// Decimal token with optional fraction and exponent
fn float_token(input: &str) -> IResult<&str, &str> {
    recognize_float(input)
}

fn bool_token(input: &str) -> IResult<&str, bool> {
    alt((
        value(true, tag_no_case("true")),
        value(false, tag_no_case("false")),
    ))(input)
}

/// Parse a whole-number token such as `42`, ` -7 ` or `+3`.
pub fn parse_integer(input: &str) -> Option<i64> {
    let (_, token) = all_consuming(ws(integer_token))(input).ok()?;
    token.parse::<i64>().ok()
}

/// Parse any finite decimal number. Overflowing tokens (`1e999`) are rejected.
pub fn parse_number(input: &str) -> Option<f64> {
    let (_, token) = all_consuming(ws(float_token))(input).ok()?;
    let number = token.parse::<f64>().ok()?;
    number.is_finite().then_some(number)
}

/// Parse `true` / `false` in any letter case.
pub fn parse_bool(input: &str) -> Option<bool> {
    all_consuming(ws(bool_token))(input).ok().map(|(_, b)| b)
}
