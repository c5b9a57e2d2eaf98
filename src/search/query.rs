use nom::{
    IResult, Parser,
    bytes::complete::take_while,
    character::complete::char,
    combinator::all_consuming,
};

use super::regex_match::REGEX_FLAGS;

/// How a raw query string is to be matched
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryKind<'a> {
    /// Scored subsequence match against the whole query text
    Fuzzy(&'a str),
    /// `/pattern/flags` literal
    Regex { pattern: &'a str, flags: &'a str },
}

/// Classify a query: a delimited regex literal selects regex mode, anything
/// else is fuzzy.
pub fn classify_query(query: &str) -> QueryKind<'_> {
    match parse_regex_literal(query) {
        Ok((_, (pattern, flags))) => QueryKind::Regex { pattern, flags },
        Err(_) => QueryKind::Fuzzy(query),
    }
}

/// Parse `/pattern/flags`. The pattern runs up to the last slash, so slashes
/// inside the pattern need no escaping. Only supported flag letters may follow
/// it; `/api/users` is a path, not a regex.
fn parse_regex_literal(input: &str) -> IResult<&str, (&str, &str)> {
    let (body, _) = char('/').parse(input)?;

    let Some(split) = body.rfind('/') else {
        return Err(nom::Err::Error(nom::error::Error::new(
            body,
            nom::error::ErrorKind::Char,
        )));
    };

    let (pattern, rest) = body.split_at(split);
    if pattern.is_empty() {
        return Err(nom::Err::Error(nom::error::Error::new(
            body,
            nom::error::ErrorKind::NonEmpty,
        )));
    }

    let (rest, _) = char('/').parse(rest)?;
    let flag = |c: char| REGEX_FLAGS.contains(c);
    let (rest, flags) = all_consuming(take_while(flag)).parse(rest)?;

    Ok((rest, (pattern, flags)))
}
