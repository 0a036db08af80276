//! CSV scanning: fields, records, and whole tables out of an owned
//! in-memory buffer.
//!
//! A byte-offset cursor walks an owned buffer directly, rather than a
//! parser-combinator pair over borrowed slices: scanner position is a
//! `usize` into `RawCsv`'s buffer, and fields borrow from that buffer
//! unless `""`-unescaping forces an owned `String`.

use std::borrow::Cow;
use std::fs;
use std::path::Path;

use crate::error::CsvSyntaxError;
use crate::Error;

/// A single decoded CSV field. Borrowed when the source bytes needed no
/// unescaping; owned when a quoted field contained `""`.
pub type Cell<'a> = Cow<'a, str>;

/// A cursor-driven scanner over one buffer. `RawCsv` owns the buffer and
/// hands back cells borrowed from `&self`, so there is no self-referential
/// struct to manage: every `Cell` returned by [`RawCsv::rows`] is tied to
/// the lifetime of the `&RawCsv` that produced it, not stored alongside it.
struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Cursor { buf, pos: 0 }
    }

    fn eof(&self) -> bool {
        self.pos >= self.buf.len()
    }

    fn peek(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.buf.get(self.pos + offset).copied()
    }

    /// Parses one field starting at the cursor.
    fn parse_field(&mut self) -> Result<Cell<'a>, Error> {
        if self.peek() == Some(b'"') {
            self.parse_quoted_field()
        } else {
            Ok(self.parse_unquoted_field())
        }
    }

    fn parse_unquoted_field(&mut self) -> Cell<'a> {
        let start = self.pos;
        while let Some(byte) = self.peek() {
            match byte {
                b',' | b'\n' => break,
                b'\r' if self.peek_at(1) == Some(b'\n') => break,
                _ => self.pos += 1,
            }
        }
        Cow::Borrowed(bytes_to_str(&self.buf[start..self.pos]))
    }

    fn parse_quoted_field(&mut self) -> Result<Cell<'a>, Error> {
        let quote_start = self.pos;
        self.pos += 1; // consume opening quote
        let mut segment_start = self.pos;
        let mut owned: Option<String> = None;

        loop {
            match self.peek() {
                None => {
                    return Err(Error::CsvSyntax(CsvSyntaxError::UnterminatedQuotedField(
                        quote_start,
                    )))
                }
                Some(b'"') => {
                    if self.peek_at(1) == Some(b'"') {
                        // Escaped quote: flush the borrowed segment so far into
                        // the owned buffer, append a literal `"`, and resume
                        // borrowing from just past it.
                        let buf = owned.get_or_insert_with(String::new);
                        buf.push_str(bytes_to_str(&self.buf[segment_start..self.pos]));
                        buf.push('"');
                        self.pos += 2;
                        segment_start = self.pos;
                    } else {
                        let end = self.pos;
                        self.pos += 1; // consume closing quote
                        return Ok(match owned {
                            Some(mut buf) => {
                                buf.push_str(bytes_to_str(&self.buf[segment_start..end]));
                                Cow::Owned(buf)
                            }
                            None => Cow::Borrowed(bytes_to_str(&self.buf[segment_start..end])),
                        });
                    }
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    /// Consumes one record terminator if present: `\r\n`, bare `\n`, or EOF.
    /// Returns whether a separator was actually consumed (false at EOF).
    fn consume_record_terminator(&mut self) -> bool {
        match self.peek() {
            Some(b'\r') if self.peek_at(1) == Some(b'\n') => {
                self.pos += 2;
                true
            }
            Some(b'\n') => {
                self.pos += 1;
                true
            }
            None => false,
            _ => false,
        }
    }

    /// Parses fields until a record terminator.
    fn parse_record(&mut self) -> Result<Vec<Cell<'a>>, Error> {
        let mut fields = Vec::new();
        loop {
            fields.push(self.parse_field()?);
            match self.peek() {
                Some(b',') => {
                    self.pos += 1;
                    continue;
                }
                _ => {
                    self.consume_record_terminator();
                    break;
                }
            }
        }
        Ok(fields)
    }

    /// Skips over runs of blank-line terminators (`\n` or `\r\n`) between
    /// records.
    fn skip_blank_lines(&mut self) {
        loop {
            match self.peek() {
                Some(b'\n') => self.pos += 1,
                Some(b'\r') if self.peek_at(1) == Some(b'\n') => self.pos += 2,
                _ => break,
            }
        }
    }

    /// Parses records to end of input.
    fn parse_table(&mut self) -> Result<Vec<Vec<Cell<'a>>>, Error> {
        let mut rows = Vec::new();
        self.skip_blank_lines();
        while !self.eof() {
            rows.push(self.parse_record()?);
            self.skip_blank_lines();
        }
        Ok(rows)
    }
}

/// Interprets a byte slice as UTF-8, tolerating invalid sequences by
/// falling back to empty. Every delimiter byte the scanner looks for
/// (`,`, `"`, `\r`, `\n`) is ASCII, so slicing on their offsets never
/// lands inside a multi-byte UTF-8 sequence; `from_utf8_unchecked` would
/// be safe here, but we use the checked form since the buffer's true
/// provenance isn't guaranteed.
fn bytes_to_str(bytes: &[u8]) -> &str {
    std::str::from_utf8(bytes).unwrap_or("")
}

/// An owned CSV buffer, parsed lazily on each call to [`RawCsv::rows`].
/// Construction (`parse_csv_buffer`/`parse_csv_file`) eagerly validates
/// the buffer once (to surface [`crate::Error::CsvSyntax`] immediately),
/// at the cost of re-scanning when `rows()` is called.
pub struct RawCsv {
    buf: String,
}

impl RawCsv {
    /// The raw bytes backing this CSV buffer.
    pub fn as_bytes(&self) -> &[u8] {
        self.buf.as_bytes()
    }

    /// Re-scans the buffer into a table of cells, each borrowed from (or
    /// owned independently of) `self`.
    pub fn rows(&self) -> Result<Vec<Vec<Cell<'_>>>, Error> {
        Cursor::new(self.buf.as_bytes()).parse_table()
    }
}

/// Parses an in-memory buffer into a [`RawCsv`], validating it eagerly.
pub fn parse_csv_buffer(bytes: &[u8]) -> Result<RawCsv, Error> {
    // Validate once up front so construction fails fast on malformed input.
    Cursor::new(bytes).parse_table()?;
    let buf = String::from_utf8_lossy(bytes).into_owned();
    Ok(RawCsv { buf })
}

/// Reads `path` and parses it as CSV.
pub fn parse_csv_file(path: impl AsRef<Path>) -> Result<RawCsv, Error> {
    let bytes = fs::read(path)?;
    parse_csv_buffer(&bytes)
}

/// Parses a single field out of a standalone buffer (used by the fixture
/// generator's round-trip tests and by `tests/`).
pub fn parse_field(s: &str) -> Result<Cell<'_>, Error> {
    let mut cursor = Cursor::new(s.as_bytes());
    cursor.parse_field()
}

/// Parses a single record out of a standalone buffer.
pub fn parse_record(s: &str) -> Result<Vec<Cell<'_>>, Error> {
    let mut cursor = Cursor::new(s.as_bytes());
    cursor.parse_record()
}

/// Parses a whole buffer into rows of cells without constructing a
/// [`RawCsv`].
pub fn parse_csv_table(s: &str) -> Result<Vec<Vec<Cell<'_>>>, Error> {
    let mut cursor = Cursor::new(s.as_bytes());
    cursor.parse_table()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_escaped_quotes_scenario() {
        let cell = parse_field(r#""fo""o,"",bar""#).unwrap();
        assert_eq!(cell, "fo\"o,\",bar");
    }

    #[test]
    fn unterminated_quote_is_an_error() {
        let err = parse_field(r#""unterminated"#).unwrap_err();
        assert!(matches!(err, Error::CsvSyntax(CsvSyntaxError::UnterminatedQuotedField(0))));
    }

    #[test]
    fn blank_line_handling_in_table() {
        let rows = parse_csv_table("foo\nbar\nbaz").unwrap();
        assert_eq!(rows, vec![vec!["foo"], vec!["bar"], vec!["baz"]]);

        let rows = parse_csv_table("foo,bar,b az\n\n\n").unwrap();
        assert_eq!(rows, vec![vec!["foo", "bar", "b az"]]);
    }

    #[test]
    fn blank_line_in_record_returns_single_empty_field() {
        let fields = parse_record("\nfoo").unwrap();
        assert_eq!(fields, vec![""]);
    }

    #[test]
    fn unquoted_field_stops_at_bare_cr() {
        // A lone `\r` not followed by `\n` is ordinary content.
        let cell = parse_field("a\rb,c").unwrap();
        assert_eq!(cell, "a\rb");
    }

    #[test]
    fn empty_fields_round_trip() {
        let rows = parse_csv_table("a,,c\n").unwrap();
        assert_eq!(rows, vec![vec!["a", "", "c"]]);
    }

    #[test]
    fn crlf_record_terminator() {
        let rows = parse_csv_table("a,b\r\nc,d\r\n").unwrap();
        assert_eq!(rows, vec![vec!["a", "b"], vec!["c", "d"]]);
    }

    #[test]
    fn raw_csv_can_be_re_scanned_via_rows() {
        let raw = parse_csv_buffer(b"a,b\n1,2\n").unwrap();
        let rows = raw.rows().unwrap();
        assert_eq!(rows, vec![vec!["a", "b"], vec!["1", "2"]]);
        // Calling rows() again re-derives independent cells from &self.
        let rows_again = raw.rows().unwrap();
        assert_eq!(rows, rows_again);
    }
}
