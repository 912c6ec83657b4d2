use winnow::ascii::{dec_int, dec_uint, till_line_ending};
use winnow::combinator::{alt, cut_err, delimited, opt, preceded, repeat, separated, terminated};
use winnow::error::{ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{any, take_while};

use crate::{MatchMode, Param};

use super::parser::RawPopup;

// -- Whitespace & comments --------------------------------------------------

fn ws(input: &mut &str) -> ModalResult<()> {
    let _: () = repeat(
        0..,
        alt((
            take_while(1.., |c: char| c.is_ascii_whitespace()).void(),
            ('#', till_line_ending).void(),
        )),
    )
    .parse_next(input)?;
    Ok(())
}

// -- Identifiers ------------------------------------------------------------

fn ident<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (
        take_while(1.., |c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| {
            c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')
        }),
    )
        .take()
        .parse_next(input)
}

// -- Parameters -------------------------------------------------------------

fn string_literal(input: &mut &str) -> ModalResult<String> {
    '"'.parse_next(input)?;
    let mut s = String::new();
    loop {
        let ch = any.parse_next(input)?;
        match ch {
            '"' => return Ok(s),
            '\\' => match any.parse_next(input)? {
                '"' => s.push('"'),
                '\\' => s.push('\\'),
                'n' => s.push('\n'),
                't' => s.push('\t'),
                // Regex escapes such as `\.` and `\d` are kept verbatim.
                other => {
                    s.push('\\');
                    s.push(other);
                }
            },
            c => s.push(c),
        }
    }
}

fn string_list(input: &mut &str) -> ModalResult<Vec<String>> {
    delimited(
        '[',
        terminated(
            separated(0.., preceded(ws, string_literal), (ws, ',')),
            (ws, opt(','), ws),
        ),
        cut_err(']'),
    )
    .context(StrContext::Expected(StrContextValue::Description(
        "list of strings",
    )))
    .parse_next(input)
}

fn param(input: &mut &str) -> ModalResult<Param> {
    alt((
        string_literal.map(Param::Str),
        string_list.map(Param::List),
        dec_int::<_, i64, _>.map(Param::Int),
    ))
    .parse_next(input)
}

// -- Popups -----------------------------------------------------------------

fn condition(input: &mut &str) -> ModalResult<(String, Param)> {
    ws.parse_next(input)?;
    let id = ident.parse_next(input)?;
    let value = opt(preceded(take_while(0.., [' ', '\t']), param)).parse_next(input)?;
    Ok((id.to_owned(), value.unwrap_or_default()))
}

fn match_mode(input: &mut &str) -> ModalResult<MatchMode> {
    alt(("any".value(MatchMode::Any), "all".value(MatchMode::All))).parse_next(input)
}

fn popup_def(input: &mut &str) -> ModalResult<RawPopup> {
    ws.parse_next(input)?;
    let remaining = input.len();
    "popup".parse_next(input)?;
    ws.parse_next(input)?;

    let id = cut_err(dec_uint::<_, u64, _>)
        .context(StrContext::Expected(StrContextValue::Description(
            "popup id",
        )))
        .parse_next(input)?;

    ws.parse_next(input)?;
    let mode = opt(match_mode).parse_next(input)?.unwrap_or_default();
    ws.parse_next(input)?;
    cut_err('{')
        .context(StrContext::Expected(StrContextValue::CharLiteral('{')))
        .parse_next(input)?;

    let conditions: Vec<(String, Param)> = repeat(0.., condition).parse_next(input)?;

    ws.parse_next(input)?;
    cut_err('}')
        .context(StrContext::Expected(StrContextValue::Description(
            "condition or '}'",
        )))
        .parse_next(input)?;

    Ok(RawPopup {
        id,
        mode,
        conditions,
        remaining,
    })
}

// -- Top-level parser -------------------------------------------------------

pub fn parse_catalog(input: &mut &str) -> ModalResult<Vec<RawPopup>> {
    let popups = repeat(0.., popup_def).parse_next(input)?;
    ws.parse_next(input)?;
    Ok(popups)
}
