use nom::{
    bytes::complete::take_while,
    character::complete::{char, digit1, one_of, satisfy},
    combinator::{opt, recognize},
    sequence::pair,
};

use super::errors::{FormulaErrorKind, FormulaParseError, ParseResult};

/// Symbol = uppercase , { lowercase | "+" } ;
///
/// The trailing run is greedy, so ion-like symbols parse whole: `H+2` is
/// two `H+`, never a doubly-counted `H`.
pub(crate) fn element_symbol(i: &str) -> ParseResult<'_, &str> {
    recognize(pair(uppercase, take_while(|c: char| c.is_ascii_lowercase() || c == '+')))(i)
}

/// Integer = [ "+" | "-" ] , digit , { digit } ;
pub(crate) fn integer(i: &str) -> ParseResult<'_, i64> {
    let (rest, literal) = recognize(pair(opt(one_of("+-")), digit1))(i)?;
    match literal.parse() {
        Ok(count) => Ok((rest, count)),
        Err(_) => Err(nom::Err::Failure(FormulaParseError::new(
            FormulaErrorKind::MalformedNumber(literal.to_owned()),
        ))),
    }
}

// NOTE: These are not meant to be links, it's just EBNF
#[allow(clippy::doc_link_with_quotes)]
/// Isotope = "[" , digit , { digit } , "]" ;
pub(crate) fn isotope_brackets(i: &str) -> ParseResult<'_, u32> {
    let (after_open, _) = char('[')(i)?;

    // Once the bracket is open, anything but digits-then-']' is fatal
    let digits: ParseResult<'_, &str> = digit1(after_open);
    let Ok((after_digits, digits)) = digits else {
        return Err(malformed_isotope());
    };
    let close: ParseResult<'_, char> = char(']')(after_digits);
    let Ok((rest, _)) = close else {
        return Err(malformed_isotope());
    };

    match digits.parse() {
        Ok(mass_number) => Ok((rest, mass_number)),
        Err(_) => Err(nom::Err::Failure(FormulaParseError::new(
            FormulaErrorKind::MalformedNumber(digits.to_owned()),
        ))),
    }
}

/// uppercase = "A" | "B" | "C" | ... | "Z" ;
fn uppercase(i: &str) -> ParseResult<'_, char> {
    satisfy(|c| c.is_ascii_uppercase())(i)
}

fn malformed_isotope() -> nom::Err<FormulaParseError> {
    nom::Err::Failure(FormulaParseError::new(FormulaErrorKind::MalformedIsotope))
}

// Module Tests ========================================================================================================
