//! A1-style cell and range references

use std::borrow::Cow;

/// Column letters for a zero-based column index (`0` is `A`, `26` is `AA`).
#[must_use]
pub fn column_letters(column: u16) -> String {
    let mut col = i32::from(column);
    let mut letters = Vec::new();

    loop {
        let remainder = u8::try_from(col % 26).unwrap_or_default();
        letters.push(char::from(b'A' + remainder));
        col = (col / 26) - 1;
        if col < 0 {
            break;
        }
    }

    letters.iter().rev().collect()
}

/// Relative reference to a cell, with a one-based row number (`B9`).
#[must_use]
pub fn cell(column: u16, row: u32) -> String {
    format!("{}{row}", column_letters(column))
}

/// Whether a name reads as an A1 (`ab1`) or R1C1 (`R1C1`, `RC`) cell reference
fn is_cell_reference(name: &str) -> bool {
    let letters = name.chars().take_while(char::is_ascii_alphabetic).count();
    let rest = &name[letters..];
    if (1..=3).contains(&letters) && !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()) {
        return true;
    }

    let digits = |s: &str| s.chars().take_while(char::is_ascii_digit).count();
    let mut rest = name;
    if let Some(after) = rest.strip_prefix(['R', 'r']) {
        rest = &after[digits(after)..];
        if rest.is_empty() {
            return true;
        }
    }
    match rest.strip_prefix(['C', 'c']) {
        Some(after) => digits(after) == after.len(),
        None => false,
    }
}

/// Sheet name as it must appear inside a formula.
///
/// Names made only of ASCII letters, digits and underscores that do not
/// start with a digit and cannot be read as a cell reference are left bare;
/// anything else is single-quoted with embedded quotes doubled.
#[must_use]
pub fn quote_sheet_name(name: &str) -> Cow<'_, str> {
    let bare = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !is_cell_reference(name);
    if bare {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("'{}'", name.replace('\'', "''")))
    }
}

/// Formula for an absolute single-column range on another sheet, with
/// one-based row numbers (`='# Enums'!$A$2:$A$4`).
#[must_use]
pub fn absolute_column_range(sheet: &str, column: u16, first_row: u32, last_row: u32) -> String {
    let letters = column_letters(column);
    format!(
        "={}!${letters}${first_row}:${letters}${last_row}",
        quote_sheet_name(sheet)
    )
}

/// Formula for an absolute single-cell reference on another sheet, with a
/// one-based row number (`='# Variables'!$B$2`).
#[must_use]
pub fn absolute_cell(sheet: &str, column: u16, row: u32) -> String {
    format!(
        "={}!${}${row}",
        quote_sheet_name(sheet),
        column_letters(column)
    )
}
