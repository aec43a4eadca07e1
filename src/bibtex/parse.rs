//! Strict BibTeX parser built on nom.
//!
//! Handles the subset of BibTeX that appears in real bibliographies:
//! `@type{key, name = value, ...}` entries, braced values with nested braces,
//! quoted values, bare numbers, `@string` macros with `#` concatenation, and
//! `@comment`/`@preamble` blocks. Text between constructs is an implicit
//! comment and is skipped, as is everything after `%` on a line outside a
//! value.
//!
//! Unlike a bibliography manager's parser, this one does not recover: the
//! first malformed construct aborts the whole parse with a line-numbered
//! [`ParseError`]. A library we cannot fully trust is worse than no library
//! when its contents end up typeset onto someone's paper.

use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, multispace0},
    combinator::map,
    IResult,
};
use std::collections::HashMap;
use thiserror::Error;

use super::{Entry, Field, Library};

/// Parse failure with the 1-based line of the offending construct.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct ParseError {
    pub line: u32,
    pub message: String,
}

/// Parse BibTeX source text into a [`Library`].
pub fn parse_library(input: &str) -> Result<Library, ParseError> {
    let mut entries = Vec::new();
    let mut macros: HashMap<String, String> = HashMap::new();
    let mut rest = input;

    while let Some(pos) = rest.find('@') {
        rest = &rest[pos..];
        let construct = rest;
        match at_construct(rest, &macros) {
            Ok((tail, parsed)) => {
                match parsed {
                    Construct::Entry(entry) => entries.push(entry),
                    Construct::Macro(name, value) => {
                        // Macro names are case-insensitive; later definitions win.
                        macros.insert(name.to_ascii_lowercase(), value);
                    }
                    Construct::Skipped => {}
                }
                rest = tail;
            }
            Err(_) => return Err(error_at(input, construct, describe(construct))),
        }
    }

    Ok(Library::from_entries(entries))
}

/// One `@...` construct in the source.
enum Construct {
    Entry(Entry),
    Macro(String, String),
    Skipped,
}

fn at_construct<'a>(
    input: &'a str,
    macros: &HashMap<String, String>,
) -> IResult<&'a str, Construct> {
    let (rest, _) = char('@')(input)?;
    let (rest, _) = multispace0(rest)?;
    let (rest, kind) = take_while1(|c: char| c.is_ascii_alphanumeric())(rest)?;

    if kind.eq_ignore_ascii_case("string") {
        let (rest, (name, value)) = macro_definition(rest, macros)?;
        Ok((rest, Construct::Macro(name, value)))
    } else if kind.eq_ignore_ascii_case("preamble") {
        let (rest, ()) = preamble_body(rest, macros)?;
        Ok((rest, Construct::Skipped))
    } else if kind.eq_ignore_ascii_case("comment") {
        let (rest, ()) = comment_body(rest)?;
        Ok((rest, Construct::Skipped))
    } else {
        let (rest, entry) = entry_body(rest, kind, macros)?;
        Ok((rest, Construct::Entry(entry)))
    }
}

/// `@string{ name = value }`
fn macro_definition<'a>(
    input: &'a str,
    macros: &HashMap<String, String>,
) -> IResult<&'a str, (String, String)> {
    let (rest, _) = multispace0(input)?;
    let (rest, _) = char('{')(rest)?;
    let (rest, _) = multispace0(rest)?;
    let (rest, name) = identifier(rest)?;
    let (rest, _) = multispace0(rest)?;
    let (rest, _) = char('=')(rest)?;
    let (rest, value) = field_value(rest, macros)?;
    let (rest, _) = multispace0(rest)?;
    let (rest, _) = char('}')(rest)?;
    Ok((rest, (name.to_string(), value)))
}

/// `@preamble{ ... }` — parsed for well-formedness, content discarded.
fn preamble_body<'a>(
    input: &'a str,
    macros: &HashMap<String, String>,
) -> IResult<&'a str, ()> {
    let (rest, _) = multispace0(input)?;
    let (rest, _) = char('{')(rest)?;
    let (rest, _) = field_value(rest, macros)?;
    let (rest, _) = multispace0(rest)?;
    let (rest, _) = char('}')(rest)?;
    Ok((rest, ()))
}

/// `@comment{...}` (balanced) or `@comment ...` to end of line.
fn comment_body(input: &str) -> IResult<&str, ()> {
    let (rest, _) = multispace0(input)?;
    if rest.starts_with('{') {
        let (rest, _) = braced_block(rest)?;
        Ok((rest, ()))
    } else {
        let end = rest.find('\n').unwrap_or(rest.len());
        Ok((&rest[end..], ()))
    }
}

/// `{ key, name = value, ... }` following an entry-type word.
fn entry_body<'a>(
    input: &'a str,
    kind: &str,
    macros: &HashMap<String, String>,
) -> IResult<&'a str, Entry> {
    let (rest, _) = multispace0(input)?;
    let (rest, _) = char('{')(rest)?;
    let (rest, _) = multispace0(rest)?;
    let (rest, key) =
        take_while1(|c: char| c.is_ascii_alphanumeric() || "_-:./+".contains(c))(rest)?;
    let (rest, _) = multispace0(rest)?;
    let (mut rest, _) = char(',')(rest)?;

    let mut fields = Vec::new();
    loop {
        let (r, _) = multispace0(rest)?;
        if let Some(tail) = r.strip_prefix('}') {
            rest = tail;
            break;
        }
        let (r, name) = identifier(r)?;
        let (r, _) = multispace0(r)?;
        let (r, _) = char('=')(r)?;
        let (r, value) = field_value(r, macros)?;
        fields.push(Field {
            name: name.to_string(),
            value,
        });
        let (r, _) = multispace0(r)?;
        // Trailing comma before '}' is optional; a missing separator between
        // two fields surfaces as a parse error on the next iteration.
        rest = r.strip_prefix(',').unwrap_or(r);
    }

    Ok((
        rest,
        Entry {
            key: key.to_string(),
            kind: kind.to_string(),
            fields,
        },
    ))
}

/// Field or macro name.
fn identifier(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-')(input)
}

/// A value: one or more pieces joined with `#`.
///
/// Each piece is a braced block, a quoted string, a bare number, or a macro
/// reference. Unknown macros resolve to their own name — BibTeX styles
/// predefine macros this file never sees (`jan` ... `dec`), so an undefined
/// reference is not an error here.
fn field_value<'a>(
    input: &'a str,
    macros: &HashMap<String, String>,
) -> IResult<&'a str, String> {
    let mut value = String::new();
    let mut rest = input;

    loop {
        let (r, _) = multispace0(rest)?;
        let (r, piece) = alt((
            braced_value,
            quoted_value,
            map(take_while1(|c: char| c.is_ascii_digit()), |s: &str| {
                s.to_string()
            }),
            map(identifier, |name: &str| {
                macros
                    .get(&name.to_ascii_lowercase())
                    .cloned()
                    .unwrap_or_else(|| name.to_string())
            }),
        ))(r)?;
        value.push_str(&piece);

        let (r, _) = multispace0(r)?;
        match r.strip_prefix('#') {
            Some(tail) => rest = tail,
            None => return Ok((r, value)),
        }
    }
}

/// `{...}` with the outer braces stripped; inner braces kept verbatim.
fn braced_value(input: &str) -> IResult<&str, String> {
    let (rest, block) = braced_block(input)?;
    Ok((rest, block[1..block.len() - 1].to_string()))
}

/// A balanced `{...}` block, backslash-escapes skipped.
fn braced_block(input: &str) -> IResult<&str, &str> {
    if !input.starts_with('{') {
        return Err(fail(input));
    }

    let bytes = input.as_bytes();
    let mut depth = 0usize;
    let mut pos = 0;
    while pos < bytes.len() {
        match bytes[pos] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((&input[pos + 1..], &input[..pos + 1]));
                }
            }
            b'\\' => pos += 1,
            _ => {}
        }
        pos += 1;
    }

    Err(fail(input))
}

/// `"..."` with braces protecting inner quotes, content kept verbatim.
fn quoted_value(input: &str) -> IResult<&str, String> {
    if !input.starts_with('"') {
        return Err(fail(input));
    }

    let bytes = input.as_bytes();
    let mut depth = 0i32;
    let mut pos = 1;
    while pos < bytes.len() {
        match bytes[pos] {
            b'"' if depth == 0 => return Ok((&input[pos + 1..], input[1..pos].to_string())),
            b'{' => depth += 1,
            b'}' => depth -= 1,
            b'\\' => pos += 1,
            _ => {}
        }
        pos += 1;
    }

    Err(fail(input))
}

fn fail(input: &str) -> nom::Err<nom::error::Error<&str>> {
    nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Char))
}

/// Build a [`ParseError`] pointing at where `rest` starts inside `full`.
fn error_at(full: &str, rest: &str, message: String) -> ParseError {
    let consumed = full.len() - rest.len();
    let line = full[..consumed].matches('\n').count() as u32 + 1;
    ParseError { line, message }
}

fn describe(construct: &str) -> String {
    let kind: String = construct
        .chars()
        .skip(1)
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect();
    if kind.is_empty() {
        "stray '@' with no entry type".to_string()
    } else {
        format!("malformed '@{kind}' construct")
    }
}
