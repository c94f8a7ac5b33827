use crate::error::ValidationError;
use std::{fmt, ops::Range};
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub start_row: u32,
    pub end_row_exclusive: u32,
    pub start_col: u32,
    pub end_col_exclusive: u32,
}
impl CellRange {
    /// `<Col><Row>:<Col><Row>` with a single column letter; the end side is
    /// clamped to the sheet extent.
    pub fn parse(input: &str, max_row: u32, max_col: u32) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        let mut parts = trimmed.split(':');
        let (Some(start), Some(end), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(invalid(input, "expected exactly one ':' (e.g. E2:F26)"));
        };
        let (start_col, start_row) = parse_corner(input, start)?;
        let (end_col, end_row) = parse_corner(input, end)?;
        Ok(Self {
            start_row: start_row - 1,
            end_row_exclusive: end_row.min(max_row),
            start_col,
            end_col_exclusive: (end_col + 1).min(max_col),
        })
    }
    pub fn rows(&self) -> Range<u32> {
        self.start_row..self.end_row_exclusive
    }
    pub fn cols(&self) -> Range<u32> {
        self.start_col..self.end_col_exclusive
    }
    pub const fn is_empty(&self) -> bool {
        self.start_row >= self.end_row_exclusive || self.start_col >= self.end_col_exclusive
    }
    pub fn cell_count(&self) -> u64 {
        if self.is_empty() {
            return 0;
        }
        let rows = u64::from(self.end_row_exclusive - self.start_row);
        let cols = u64::from(self.end_col_exclusive - self.start_col);
        rows * cols
    }
}
impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rows {}..{} x cols {}..{}",
            self.start_row, self.end_row_exclusive, self.start_col, self.end_col_exclusive
        )
    }
}
fn parse_corner(input: &str, corner: &str) -> Result<(u32, u32), ValidationError> {
    let corner = corner.trim();
    let mut chars = corner.chars();
    let Some(letter) = chars.next() else {
        return Err(invalid(input, "empty cell reference"));
    };
    if !letter.is_ascii_alphabetic() {
        return Err(invalid(
            input,
            &format!("'{corner}' must start with a single column letter A-Z"),
        ));
    }
    let row_text = chars.as_str();
    if row_text.is_empty() || !row_text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(
            input,
            &format!("'{corner}' needs a single column letter followed by a row number"),
        ));
    }
    let row = row_text
        .parse::<u32>()
        .map_err(|e| invalid(input, &format!("row number '{row_text}' ({e})")))?;
    if row == 0 {
        return Err(invalid(input, "row numbers start at 1"));
    }
    let col = u32::from(letter.to_ascii_uppercase()) - u32::from('A');
    Ok((col, row))
}
fn invalid(input: &str, reason: &str) -> ValidationError {
    ValidationError::InvalidRange {
        input: input.to_owned(),
        reason: reason.to_owned(),
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    #[test]
    fn parses_to_zero_based_half_open_bounds() {
        let range = CellRange::parse("C3:D5", 5, 4).unwrap();
        assert_eq!(
            range,
            CellRange {
                start_row: 2,
                end_row_exclusive: 5,
                start_col: 2,
                end_col_exclusive: 4,
            },
            "C3:D5 on a 5x4 sheet"
        );
        assert_eq!(range.cell_count(), 6, "three rows by two columns");
    }
    #[test]
    fn lowercase_letters_are_accepted() {
        let range = CellRange::parse("e2:f26", 100, 100).unwrap();
        assert_eq!((range.start_col, range.end_col_exclusive), (4, 6), "columns E..F");
        assert_eq!((range.start_row, range.end_row_exclusive), (1, 26), "rows 2..26");
    }
    #[test]
    fn end_side_is_clamped_to_sheet() {
        let range = CellRange::parse("A1:A10", 3, 1).unwrap();
        assert_eq!(range.end_row_exclusive, 3, "rows clamped");
        let wide = CellRange::parse("A1:Z1", 1, 2).unwrap();
        assert_eq!(wide.end_col_exclusive, 2, "columns clamped");
    }
    #[test]
    fn start_beyond_sheet_yields_empty_range() {
        let range = CellRange::parse("F10:G12", 3, 2).unwrap();
        assert!(range.is_empty(), "{range}");
        assert_eq!(range.rows().count(), 0, "no rows to visit");
        assert_eq!(range.cell_count(), 0, "no cells to visit");
    }
    #[test]
    fn rejects_malformed_input() {
        for bad in ["A1", "A1:B2:C3", "AA1:B2", "A1:Bx", "1A:B2", "A:B2", "A0:B2", ":"] {
            assert!(
                matches!(
                    CellRange::parse(bad, 10, 10),
                    Err(ValidationError::InvalidRange { .. })
                ),
                "{bad} should be rejected"
            );
        }
    }
}
