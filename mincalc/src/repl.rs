//! Line-oriented driver: reads statements, executes them in a [`Session`],
//! and writes results and errors.
use crate::error::CalcError;
use crate::session::Session;
use std::io::{self, BufRead, Write};

/// Reads statements from `input` until end of input.
///
/// Expression and assignment values are printed one per line; definitions
/// and blank lines print nothing. Errors are printed and the next line is
/// read. With `prompt` set, `>` is written before each line.
pub fn run<R: BufRead, W: Write>(session: &mut Session, mut input: R, out: &mut W, prompt: bool) -> io::Result<()> {
    let mut line = Vec::new();
    loop {
        if prompt {
            write!(out, ">")?;
            out.flush()?;
        }
        line.clear();
        if input.read_until(b'\n', &mut line)? == 0 {
            if prompt {
                writeln!(out)?;
            }
            return Ok(());
        }
        let stmt = trim_line_end(&line);
        match session.exec_bytes(stmt) {
            Ok(outcome) => {
                if let Some(value) = outcome.value() {
                    writeln!(out, "{}", value)?;
                }
            }
            Err(e) => report(out, stmt, &e)?,
        }
    }
}

fn trim_line_end(mut line: &[u8]) -> &[u8] {
    while let [rest @ .., b'\n' | b'\r'] = line {
        line = rest;
    }
    line
}

/// Writes an error. Lexer and parser errors show the statement with a caret
/// under the offset where processing stopped.
pub fn report<W: Write>(out: &mut W, stmt: &[u8], e: &CalcError) -> io::Result<()> {
    if let Some(offset) = e.offset() {
        out.write_all(stmt)?;
        writeln!(out)?;
        writeln!(out, "{:>width$}", "^", width = offset + 1)?;
    }
    writeln!(out, "{}", e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn transcript_bytes(input: &[u8]) -> Vec<u8> {
        let mut session = Session::new();
        let mut out = Vec::new();
        run(&mut session, Cursor::new(input), &mut out, false).unwrap();
        out
    }

    fn transcript(input: &str) -> String {
        String::from_utf8(transcript_bytes(input.as_bytes())).unwrap()
    }

    #[test]
    fn prints_values_only() {
        let out = transcript("x := 6\nf(a) := a*x\n\nf(7)\n");
        assert_eq!(out, "6\n42\n");
    }

    #[test]
    fn caret_marks_error_offset() {
        let out = transcript("1 + $\n2\n");
        assert_eq!(out, "1 + $\n    ^\nlexer error: invalid character\n2\n");
    }

    #[test]
    fn caret_follows_rejected_token() {
        let out = transcript("1 + * 2\n(1 + 2\n");
        assert_eq!(
            out,
            "1 + * 2\n     ^\nparser error: unexpected `*`\n\
             (1 + 2\n      ^\nparser error: unexpected end of input\n"
        );
    }

    #[test]
    fn invalid_bytes_abort_only_their_line() {
        let out = transcript_bytes(b"\xff\n1+1\n");
        assert_eq!(out, b"\xff\n^\nlexer error: invalid character\n2\n");
    }

    #[test]
    fn errors_without_offset_print_message_only() {
        let out = transcript("q\n1/0\n");
        assert_eq!(
            out,
            "undefined variable `q`\narithmetic error: division by zero\n"
        );
    }

    #[test]
    fn crlf_line_endings() {
        assert_eq!(transcript("2*3\r\n"), "6\n");
    }

    #[test]
    fn prompt_is_written() {
        let mut session = Session::new();
        let mut out = Vec::new();
        run(&mut session, Cursor::new("1\n"), &mut out, true).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), ">1\n>\n");
    }
}
