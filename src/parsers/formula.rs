// External Crate Imports
use nom::{
    branch::alt,
    character::complete::char,
    combinator::{cut, opt},
    multi::fold_many1,
};

// Local Crate Imports
use super::{
    errors::{FormulaErrorKind, FormulaParseError, ParseResult},
    primitives::{element_symbol, integer, isotope_brackets},
};
use crate::{
    errors::{ChemicalCompositionError, Result},
    mass_table::{MassTable, isotope_label},
};

/// The `(key, signed count)` increments a formula contributes to a
/// composition. Keys can repeat; callers accumulate.
pub(crate) type Increments = Vec<(String, i64)>;

// Public API ==========================================================================================================

/// Parse a complete formula string against `table`, or explain why it
/// isn't one.
pub(crate) fn parse_formula(input: &str, table: &MassTable) -> Result<Increments> {
    // An empty formula is the empty composition
    if input.is_empty() {
        return Ok(Vec::new());
    }

    match formula(table, input) {
        Ok(("", increments)) => Ok(increments),
        Ok((rest, _)) => Err(classify_trailing(input, rest)),
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => Err(e.into_error(input)),
        Err(nom::Err::Incomplete(_)) => Err(ChemicalCompositionError::invalid_formula(input)),
    }
}

// Private Sub-Parsers =================================================================================================

/// Formula = { Term }- ;
fn formula<'a>(table: &MassTable, i: &'a str) -> ParseResult<'a, Increments> {
    fold_many1(
        |i| term(table, i),
        Vec::new,
        |mut increments, items| {
            increments.extend(items);
            increments
        },
    )(i)
}

/// Term = Group | Atom ;
fn term<'a>(table: &MassTable, i: &'a str) -> ParseResult<'a, Increments> {
    alt((|i| group(table, i), |i| atom(table, i)))(i)
}

/// Group = "(" , Formula , ")" , [ Integer ] ;
fn group<'a>(table: &MassTable, i: &'a str) -> ParseResult<'a, Increments> {
    let (rest, _) = char('(')(i)?;
    let (rest, mut increments) = cut(|i| formula(table, i))(rest)?;
    let (rest, _) = cut(char(')'))(rest)?;
    let (rest, multiplier) = opt(integer)(rest)?;

    let multiplier = multiplier.unwrap_or(1);
    for (_, count) in &mut increments {
        *count *= multiplier;
    }

    Ok((rest, increments))
}

/// Atom = Element , [ Isotope ] , [ Integer ] ;
fn atom<'a>(table: &MassTable, i: &'a str) -> ParseResult<'a, Increments> {
    let (rest, symbol) = element(table, i)?;
    let (rest, mass_number) = opt(isotope_brackets)(rest)?;
    let (rest, count) = opt(integer)(rest)?;

    let key = isotope_label(symbol, mass_number.unwrap_or(0));
    Ok((rest, vec![(key, count.unwrap_or(1))]))
}

/// Element = Symbol ∈ mass table ;
fn element<'a>(table: &MassTable, i: &'a str) -> ParseResult<'a, &'a str> {
    let (rest, symbol) = element_symbol(i)?;
    if table.contains_element(symbol) {
        Ok((rest, symbol))
    } else {
        Err(nom::Err::Failure(FormulaParseError::new(
            FormulaErrorKind::UnknownElement(symbol.to_owned()),
        )))
    }
}

/// A grammatically valid prefix followed by trailing garbage: a stray `]`
/// is an isotope-bracket mismatch, anything else invalidates the formula.
fn classify_trailing(input: &str, rest: &str) -> ChemicalCompositionError {
    if rest.starts_with(']') {
        ChemicalCompositionError::malformed_isotope(input)
    } else {
        ChemicalCompositionError::invalid_formula(input)
    }
}

// Module Tests ========================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Result<Increments> {
        parse_formula(input, MassTable::nist())
    }

    macro_rules! assert_parses {
        ($input:literal, [$(($key:literal, $count:literal)),* $(,)?]) => {
            assert_eq!(
                parse($input).unwrap(),
                vec![$(($key.to_owned(), $count)),*]
            );
        };
    }

    #[test]
    fn flat_formulae() {
        assert_parses!("H2O", [("H", 2), ("O", 1)]);
        assert_parses!("C6H12O6", [("C", 6), ("H", 12), ("O", 6)]);
        assert_parses!("OH2", [("O", 1), ("H", 2)]);
        assert_parses!("HH", [("H", 1), ("H", 1)]);
        assert_parses!("", []);
    }

    #[test]
    fn signed_counts() {
        assert_parses!("H-2O-1", [("H", -2), ("O", -1)]);
        assert_parses!("C[13]+2", [("C[13]", 2)]);
        assert_parses!("H0", [("H", 0)]);
    }

    #[test]
    fn ion_symbols() {
        // The greedy symbol run claims the '+', exactly like the original
        // formula grammar
        assert_parses!("H+", [("H+", 1)]);
        assert_parses!("H+2", [("H+", 2)]);
        assert_parses!("H+2O", [("H+", 2), ("O", 1)]);
        assert_parses!("H+-1", [("H+", -1)]);
    }

    #[test]
    fn isotope_tags() {
        assert_parses!("C[13]", [("C[13]", 1)]);
        assert_parses!("C[13]H4", [("C[13]", 1), ("H", 4)]);
        assert_parses!("O[18]2", [("O[18]", 2)]);
        assert_parses!("C[12]2H6", [("C[12]", 2), ("H", 6)]);
    }

    #[test]
    fn groups() {
        assert_parses!("(CH2)6", [("C", 6), ("H", 12)]);
        assert_parses!("(H2O)", [("H", 2), ("O", 1)]);
        assert_parses!("(H2O)-1", [("H", -2), ("O", -1)]);
        assert_parses!("(N)(C[12]H3)2(H)", [("N", 1), ("C[12]", 2), ("H", 6), ("H", 1)]);
        assert_parses!("((CH3)2N)2", [("C", 4), ("H", 12), ("N", 2)]);
        assert_parses!("K4(ON(SO3)2)2", [
            ("K", 4),
            ("O", 2),
            ("N", 2),
            ("S", 4),
            ("O", 12),
        ]);
    }

    #[test]
    fn longest_symbol_wins() {
        // Os, not O followed by an impossible lowercase s
        assert_parses!("Os2", [("Os", 2)]);
        assert_parses!("OsO4", [("Os", 1), ("O", 4)]);
    }

    #[test]
    fn invalid_formulae() {
        for formula in ["C6H12O6(", "(H2O", "()", "2H", "H2O)", "O2.2", "h2o", "C6 H12"] {
            assert!(
                matches!(
                    parse(formula),
                    Err(ChemicalCompositionError::InvalidFormula { .. })
                ),
                "{formula:?} should be invalid"
            );
        }
    }

    #[test]
    fn unknown_elements() {
        assert_eq!(
            parse("Zz2"),
            Err(ChemicalCompositionError::unknown_element("Zz"))
        );
        assert_eq!(
            parse("H2Xx"),
            Err(ChemicalCompositionError::unknown_element("Xx"))
        );
        // An unknown element inside a group is still reported as such
        assert_eq!(
            parse("(CH2Zz)2"),
            Err(ChemicalCompositionError::unknown_element("Zz"))
        );
    }

    #[test]
    fn malformed_isotopes() {
        for formula in ["O]18", "C[13", "C[]H", "O[18.5]", "C[x]"] {
            assert!(
                matches!(
                    parse(formula),
                    Err(ChemicalCompositionError::MalformedIsotope { .. })
                ),
                "{formula:?} should be a malformed isotope"
            );
        }
    }

    #[test]
    fn malformed_numbers() {
        assert!(matches!(
            parse("C99999999999999999999"),
            Err(ChemicalCompositionError::MalformedNumber { .. })
        ));
        assert!(matches!(
            parse("C[99999999999]"),
            Err(ChemicalCompositionError::MalformedNumber { .. })
        ));
    }
}
