use clap::ValueEnum;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid --set format: '{0}'. Expected KEY=VALUE.")]
    InvalidAssignment(String),

    #[error("Invalid value for {key}: '{value}'. Expected {expected}.")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },
}

/// Splits a `KEY=VALUE` assignment at the first `=`.
pub fn parse_assignment(kv_pair: &str) -> Result<(&str, &str), ParseError> {
    match kv_pair.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value.trim())),
        _ => Err(ParseError::InvalidAssignment(kv_pair.to_string())),
    }
}

pub fn parse_value<T: FromStr>(
    key: &str,
    value: &str,
    expected: &'static str,
) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        expected,
    })
}

/// Parses a kebab-case enum value, as accepted on the command line.
pub fn parse_enum<T: ValueEnum>(
    key: &str,
    value: &str,
    expected: &'static str,
) -> Result<T, ParseError> {
    T::from_str(value, true).map_err(|_| ParseError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        expected,
    })
}

/// Parses a comma-separated list of enum values.
pub fn parse_enum_list<T: ValueEnum>(
    key: &str,
    value: &str,
    expected: &'static str,
) -> Result<Vec<T>, ParseError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| parse_enum(key, item, expected))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::file::FileField;

    #[test]
    fn assignment_splits_at_first_equals() {
        assert_eq!(parse_assignment("a.b=c=d"), Ok(("a.b", "c=d")));
        assert_eq!(parse_assignment(" k = v "), Ok(("k", "v")));
        assert!(matches!(
            parse_assignment("novalue"),
            Err(ParseError::InvalidAssignment(_))
        ));
        assert!(matches!(
            parse_assignment("=v"),
            Err(ParseError::InvalidAssignment(_))
        ));
    }

    #[test]
    fn values_report_the_offending_key() {
        assert_eq!(parse_value::<usize>("k", "12", "an integer"), Ok(12));
        let err = parse_value::<usize>("aggregation.top-k", "many", "an integer").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid value for aggregation.top-k: 'many'. Expected an integer."
        );
    }

    #[test]
    fn enum_lists_accept_kebab_case() {
        let fields: Vec<FileField> =
            parse_enum_list("encoding.fields", "residue-type, chemistry-type", "field names")
                .unwrap();
        assert_eq!(fields, vec![FileField::ResidueType, FileField::ChemistryType]);
        assert!(parse_enum_list::<FileField>("encoding.fields", "charge", "field names").is_err());
    }
}
