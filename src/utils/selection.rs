// mdump/src/utils/selection.rs
use std::collections::BTreeSet;

use crate::errors::SelectionError;

/// Outcome of parsing the operator's selection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Empty input: the operator chose not to select anything.
    Declined,
    /// 1-based indices, ascending and unique.
    Indices(Vec<usize>),
}

/// Parses a selection such as `1,3-5,7` against a list of `max` entries.
///
/// `all` (any case) selects every entry. Empty or blank input is [`Selection::Declined`],
/// which callers treat as "abort without error".
pub fn parse_selection(selection: &str, max: usize) -> Result<Selection, SelectionError> {
    let selection = selection.trim();
    if selection.is_empty() {
        return Ok(Selection::Declined);
    }
    if selection.eq_ignore_ascii_case("all") {
        return Ok(Selection::Indices((1..=max).collect()));
    }

    let max = max as i64;
    let mut indices = BTreeSet::new();

    for part in selection.split(',') {
        let part = part.trim();
        if let Some((start, end)) = part.split_once('-') {
            let start = parse_number(start)?;
            let end = parse_number(end)?;
            if start < 1 || end > max || start > end {
                return Err(SelectionError::InvalidRange(part.to_string()));
            }
            indices.extend((start..=end).map(|i| i as usize));
        } else {
            let num = parse_number(part)?;
            if num < 1 || num > max {
                return Err(SelectionError::OutOfRange(num));
            }
            indices.insert(num as usize);
        }
    }

    Ok(Selection::Indices(indices.into_iter().collect()))
}

fn parse_number(token: &str) -> Result<i64, SelectionError> {
    let token = token.trim();
    token
        .parse::<i64>()
        .map_err(|_| SelectionError::NotANumber(token.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indices(selection: &str, max: usize) -> Vec<usize> {
        match parse_selection(selection, max) {
            Ok(Selection::Indices(v)) => v,
            other => panic!("expected indices for {selection:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_mixed_numbers_and_ranges() {
        assert_eq!(indices("1,3-5,7", 7), vec![1, 3, 4, 5, 7]);
    }

    #[test]
    fn test_overlapping_tokens_are_deduplicated_and_sorted() {
        assert_eq!(indices("5, 2-4 ,3,1-2", 5), vec![1, 2, 3, 4, 5]);
        assert_eq!(indices("4,4,4", 4), vec![4]);
    }

    #[test]
    fn test_all_is_case_insensitive() {
        assert_eq!(indices("all", 3), vec![1, 2, 3]);
        assert_eq!(indices(" ALL ", 2), vec![1, 2]);
    }

    #[test]
    fn test_empty_input_is_declined_not_error() {
        for max in [0, 1, 10] {
            assert_eq!(parse_selection("", max), Ok(Selection::Declined));
            assert_eq!(parse_selection("   ", max), Ok(Selection::Declined));
        }
    }

    #[test]
    fn test_range_below_one_is_invalid_range() {
        assert_eq!(
            parse_selection("0-2", 5),
            Err(SelectionError::InvalidRange("0-2".to_string()))
        );
    }

    #[test]
    fn test_range_above_max_or_reversed_is_invalid_range() {
        assert!(matches!(parse_selection("3-6", 5), Err(SelectionError::InvalidRange(_))));
        assert!(matches!(parse_selection("4-2", 5), Err(SelectionError::InvalidRange(_))));
    }

    #[test]
    fn test_single_number_out_of_range() {
        assert_eq!(parse_selection("9", 5), Err(SelectionError::OutOfRange(9)));
        assert_eq!(parse_selection("1,0", 5), Err(SelectionError::OutOfRange(0)));
    }

    #[test]
    fn test_garbage_is_not_a_number() {
        assert_eq!(
            parse_selection("abc", 5),
            Err(SelectionError::NotANumber("abc".to_string()))
        );
        assert!(matches!(parse_selection("1,,2", 5), Err(SelectionError::NotANumber(_))));
        assert!(matches!(parse_selection("1-x", 5), Err(SelectionError::NotANumber(_))));
        assert!(matches!(parse_selection("-1", 5), Err(SelectionError::NotANumber(_))));
    }
}
