//! Delimited-text reader and writer for spreadsheet exports.
//!
//! The reader is a single pass over the input with two states, inside and
//! outside quotes. It knows nothing about the meaning of the cells.

/// An ordered row of cells.
pub type Row = Vec<String>;

const DELIMITER: char = ',';
const QUOTE: char = '"';

/// Cell text plus the span that came from inside quotes.
#[derive(Default)]
struct CellBuf {
    text: String,
    quoted_from: Option<usize>,
    quoted_to: usize,
}

impl CellBuf {
    fn open_quote(&mut self) {
        if self.quoted_from.is_none() {
            // Whitespace before the opening quote is padding, not content.
            if self.text.trim().is_empty() {
                self.text.clear();
            }
            self.quoted_from = Some(self.text.len());
        }
    }

    fn close_quote(&mut self) {
        self.quoted_to = self.text.len();
    }

    fn is_touched(&self) -> bool {
        !self.text.is_empty() || self.quoted_from.is_some()
    }

    /// Trim unquoted padding, keep quoted text verbatim.
    fn finish(&mut self) -> String {
        let cell = std::mem::take(self);
        match cell.quoted_from {
            None => cell.text.trim().to_string(),
            Some(from) => {
                let to = cell.quoted_to.max(from);
                let mut out = String::with_capacity(cell.text.len());
                out.push_str(cell.text[..from].trim_start());
                out.push_str(&cell.text[from..to]);
                out.push_str(cell.text[to..].trim_end());
                out
            }
        }
    }
}

/// Parse delimited text into rows of cells.
///
/// Handles quoted fields containing delimiters, line breaks and doubled
/// quotes; `\n`, `\r\n` and a lone `\r` all end a row; a final row without
/// a line break is kept. Empty input yields no rows.
pub fn parse(input: &str) -> Vec<Row> {
    let mut rows = Vec::new();
    let mut row: Row = Vec::new();
    let mut cell = CellBuf::default();
    let mut in_quotes = false;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == QUOTE {
                if chars.peek() == Some(&QUOTE) {
                    cell.text.push(QUOTE);
                    chars.next();
                } else {
                    in_quotes = false;
                    cell.close_quote();
                }
            } else {
                cell.text.push(c);
            }
            continue;
        }

        match c {
            QUOTE => {
                in_quotes = true;
                cell.open_quote();
            }
            DELIMITER => row.push(cell.finish()),
            '\n' | '\r' => {
                if c == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                row.push(cell.finish());
                rows.push(std::mem::take(&mut row));
            }
            _ => cell.text.push(c),
        }
    }

    if in_quotes {
        // Unterminated quote: everything up to the end belongs to the cell.
        cell.close_quote();
    }
    if cell.is_touched() || !row.is_empty() {
        row.push(cell.finish());
        rows.push(row);
    }

    rows
}

/// Serialize rows back to delimited text, quoting only where needed.
///
/// `parse(&write(&rows))` reproduces `rows` for anything `parse` produced.
pub fn write(rows: &[Row]) -> String {
    let mut out = String::new();
    for row in rows {
        let single_empty = row.len() == 1 && row[0].is_empty();
        for (i, cell) in row.iter().enumerate() {
            if i > 0 {
                out.push(DELIMITER);
            }
            if single_empty || needs_quotes(cell) {
                out.push(QUOTE);
                out.push_str(&cell.replace('"', "\"\""));
                out.push(QUOTE);
            } else {
                out.push_str(cell);
            }
        }
        out.push('\n');
    }
    out
}

fn needs_quotes(cell: &str) -> bool {
    cell.contains([DELIMITER, QUOTE, '\n', '\r']) || cell.trim() != cell
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_input() {
        assert!(parse("").is_empty());
    }

    #[test]
    fn simple_rows() {
        let rows = parse("a,b,c\n1,2,3\n");
        assert_eq!(rows, vec![row(&["a", "b", "c"]), row(&["1", "2", "3"])]);
    }

    #[test]
    fn last_row_without_newline() {
        let rows = parse("a,b\n1,2");
        assert_eq!(rows, vec![row(&["a", "b"]), row(&["1", "2"])]);
    }

    #[test]
    fn crlf_line_endings() {
        let rows = parse("a,b\r\n1,2\r\n");
        assert_eq!(rows, vec![row(&["a", "b"]), row(&["1", "2"])]);
    }

    #[test]
    fn lone_carriage_return_ends_row() {
        let rows = parse("a\rb");
        assert_eq!(rows, vec![row(&["a"]), row(&["b"])]);
    }

    #[test]
    fn quoted_delimiter_newline_and_escape() {
        let rows = parse("\"Hello, world\",\"line one\nline two\",\"say \"\"hi\"\"\"\n");
        assert_eq!(
            rows,
            vec![row(&["Hello, world", "line one\nline two", "say \"hi\""])]
        );
    }

    #[test]
    fn unquoted_whitespace_is_trimmed() {
        let rows = parse("  a  , b ,c\n");
        assert_eq!(rows, vec![row(&["a", "b", "c"])]);
    }

    #[test]
    fn quoted_whitespace_is_preserved() {
        let rows = parse("  \"  padded  \"  ,x\n");
        assert_eq!(rows, vec![row(&["  padded  ", "x"])]);
    }

    #[test]
    fn empty_cells_are_kept() {
        let rows = parse("a,,c,\n");
        assert_eq!(rows, vec![row(&["a", "", "c", ""])]);
    }

    #[test]
    fn blank_line_is_a_single_empty_cell() {
        let rows = parse("a\n\nb\n");
        assert_eq!(rows, vec![row(&["a"]), row(&[""]), row(&["b"])]);
    }

    #[test]
    fn unterminated_quote_runs_to_end() {
        let rows = parse("\"open, never closed\nstill here");
        assert_eq!(rows, vec![row(&["open, never closed\nstill here"])]);
    }

    #[test]
    fn write_quotes_only_when_needed() {
        let text = write(&[row(&["plain", "a,b", "say \"hi\"", " pad", ""])]);
        assert_eq!(text, "plain,\"a,b\",\"say \"\"hi\"\"\",\" pad\",\n");
    }

    #[test]
    fn reparse_is_idempotent() {
        let inputs = [
            "node_id,text\nA,\"Hi, there\"\nB,\"multi\nline\"\n",
            "  x ,\" y \",\"\"\"q\"\"\"\r\n\r\nlast",
            "a,,\n,\n\"\"",
            "only",
        ];
        for input in inputs {
            let first = parse(input);
            let second = parse(&write(&first));
            assert_eq!(first, second, "round trip changed rows for {input:?}");
        }
    }
}
