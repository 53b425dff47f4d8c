//! Tokenizer for the PDF object grammar: numbers, strings, names, arrays,
//! dictionaries, and bare commands. Sits directly on a [`BaseStream`] and
//! feeds [`super::parser::Parser`]'s two-token lookahead.

use super::base_stream::BaseStream;
use super::error::{PDFError, PDFResult};

/// A single lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// End of file marker
    EOF,
    /// Boolean value
    Boolean(bool),
    /// Null value
    Null,
    /// Numeric value (integers and reals)
    Number(f64),
    /// String value (from literal strings like `(hello)`)
    String(Vec<u8>),
    /// Hex string value (from hex strings like `<48656c6c6f>`)
    HexString(Vec<u8>),
    /// Name value (from `/Name`)
    Name(String),
    /// Command/operator (like `obj`, `stream`, `R`)
    Command(String),
    /// Array start `[`
    ArrayStart,
    /// Array end `]`
    ArrayEnd,
    /// Dictionary start `<<`
    DictStart,
    /// Dictionary end `>>`
    DictEnd,
}

/// Tokenizes a byte stream into [`Token`]s.
///
/// Maintains a single character of lookahead (`current_char`); `peek_char`
/// reads one byte ahead via save/restore of the stream position rather than
/// a dedicated peek primitive on [`BaseStream`].
pub struct Lexer {
    stream: Box<dyn BaseStream>,
    current_char: i32,
    str_buf: Vec<u8>,
}

impl Lexer {
    /// Creates a lexer positioned at the stream's current offset.
    pub fn new(mut stream: Box<dyn BaseStream>) -> PDFResult<Self> {
        let current_char = Self::read_char(&mut stream)?;
        Ok(Lexer {
            stream,
            current_char,
            str_buf: Vec::new(),
        })
    }

    fn read_char(stream: &mut Box<dyn BaseStream>) -> PDFResult<i32> {
        match stream.get_byte() {
            Ok(byte) => Ok(byte as i32),
            Err(PDFError::UnexpectedEndOfStream) => Ok(-1),
            Err(e) => Err(e),
        }
    }

    fn next_char(&mut self) -> PDFResult<i32> {
        self.current_char = Self::read_char(&mut self.stream)?;
        Ok(self.current_char)
    }

    /// Looks at the next byte without consuming it, by reading and then
    /// rewinding the underlying stream's position.
    fn peek_char(&mut self) -> PDFResult<i32> {
        let saved = self.stream.pos();
        let peeked = Self::read_char(&mut self.stream)?;
        self.stream.set_pos(saved)?;
        Ok(peeked)
    }

    /// Absolute stream position of the byte `current_char` was read from;
    /// used by the parser to locate the start of stream data after the
    /// `stream` keyword.
    pub(crate) fn get_position(&self) -> usize {
        self.stream.pos()
    }

    /// Reads one raw byte, bypassing tokenization. Used by the parser to
    /// copy stream data verbatim once the dictionary/`stream` keyword has
    /// been consumed.
    pub(crate) fn get_stream_byte(&mut self) -> PDFResult<u8> {
        match self.stream.get_byte() {
            Ok(b) => Ok(b),
            Err(PDFError::UnexpectedEndOfStream) => Err(PDFError::UnexpectedEndOfStream),
            Err(e) => Err(e),
        }
    }

    /// PDF whitespace: NUL, TAB, LF, FF, CR, SPACE.
    fn is_whitespace(ch: i32) -> bool {
        matches!(ch, 0x00 | 0x09 | 0x0A | 0x0C | 0x0D | 0x20)
    }

    /// PDF delimiters: `( ) < > [ ] { } / %`.
    fn is_delimiter(ch: i32) -> bool {
        matches!(
            ch,
            0x28 | 0x29 | 0x3C | 0x3E | 0x5B | 0x5D | 0x7B | 0x7D | 0x2F | 0x25
        )
    }

    fn is_special(ch: i32) -> bool {
        Self::is_whitespace(ch) || Self::is_delimiter(ch)
    }

    fn skip_whitespace_and_comments(&mut self) -> PDFResult<()> {
        let mut comment = false;
        loop {
            let ch = self.current_char;
            if ch < 0 {
                break;
            }
            if comment {
                if ch == 0x0A || ch == 0x0D {
                    comment = false;
                }
            } else if ch == 0x25 {
                comment = true;
            } else if !Self::is_whitespace(ch) {
                break;
            }
            self.next_char()?;
        }
        Ok(())
    }

    /// Reads the next token, skipping leading whitespace and comments.
    pub fn get_object(&mut self) -> PDFResult<Token> {
        self.skip_whitespace_and_comments()?;

        let ch = self.current_char;
        if ch < 0 {
            return Ok(Token::EOF);
        }

        match ch {
            0x30..=0x39 | 0x2B | 0x2D | 0x2E => self.get_number(),
            0x28 => self.get_string(),
            0x2F => self.get_name(),
            0x5B => {
                self.next_char()?;
                Ok(Token::ArrayStart)
            }
            0x5D => {
                self.next_char()?;
                Ok(Token::ArrayEnd)
            }
            0x3C => {
                let next_ch = self.next_char()?;
                if next_ch == 0x3C {
                    self.next_char()?;
                    Ok(Token::DictStart)
                } else {
                    self.get_hex_string()
                }
            }
            0x3E => {
                let next_ch = self.next_char()?;
                if next_ch == 0x3E {
                    self.next_char()?;
                    Ok(Token::DictEnd)
                } else {
                    Err(PDFError::Generic(format!(
                        "unexpected character: >{}",
                        next_ch
                    )))
                }
            }
            0x29 => {
                self.next_char()?;
                Err(PDFError::Generic(format!("illegal character: {}", ch)))
            }
            _ => self.get_command(),
        }
    }

    fn get_number(&mut self) -> PDFResult<Token> {
        let mut ch = self.current_char;
        let mut e_notation = false;
        let mut divide_by = 0.0;
        let mut sign = 1.0;

        if ch == 0x2D {
            sign = -1.0;
            ch = self.next_char()?;
            if ch == 0x2D {
                ch = self.next_char()?;
            }
        } else if ch == 0x2B {
            ch = self.next_char()?;
        }

        if ch == 0x0A || ch == 0x0D {
            loop {
                ch = self.next_char()?;
                if ch != 0x0A && ch != 0x0D {
                    break;
                }
            }
        }

        if ch == 0x2E {
            divide_by = 10.0;
            ch = self.next_char()?;
        }

        if ch < 0x30 || ch > 0x39 {
            if Self::is_whitespace(ch) || ch == 0x28 || ch == 0x3C || ch == -1 {
                return Ok(Token::Number(0.0));
            }
            return Err(PDFError::Generic(format!(
                "invalid number: charCode {}",
                ch
            )));
        }

        let mut base_value = (ch - 0x30) as f64;
        let mut power_value = 0;
        let mut power_value_sign = 1;

        loop {
            ch = self.next_char()?;
            if ch < 0 {
                break;
            }

            if ch >= 0x30 && ch <= 0x39 {
                let current_digit = (ch - 0x30) as f64;
                if e_notation {
                    power_value = power_value * 10 + (ch - 0x30);
                } else {
                    if divide_by != 0.0 {
                        divide_by *= 10.0;
                    }
                    base_value = base_value * 10.0 + current_digit;
                }
            } else if ch == 0x2E {
                if divide_by == 0.0 {
                    divide_by = 1.0;
                } else {
                    break;
                }
            } else if ch == 0x2D {
                // Ignore misplaced minus signs mid-number, matching liberal readers.
            } else if ch == 0x45 || ch == 0x65 {
                let peek_ch = self.peek_char()?;
                if peek_ch == 0x2B || peek_ch == 0x2D {
                    power_value_sign = if peek_ch == 0x2D { -1 } else { 1 };
                    self.next_char()?;
                } else if peek_ch < 0x30 || peek_ch > 0x39 {
                    break;
                }
                e_notation = true;
            } else {
                break;
            }
        }

        let mut result = base_value;
        if divide_by != 0.0 {
            result /= divide_by;
        }
        if e_notation {
            result *= 10_f64.powi(power_value_sign * power_value);
        }

        Ok(Token::Number(sign * result))
    }

    fn get_string(&mut self) -> PDFResult<Token> {
        let mut num_paren = 1;
        self.str_buf.clear();

        let mut ch = self.next_char()?;

        loop {
            let mut char_buffered = false;

            match ch {
                -1 => break,
                0x28 => {
                    num_paren += 1;
                    self.str_buf.push(b'(');
                }
                0x29 => {
                    num_paren -= 1;
                    if num_paren == 0 {
                        self.next_char()?;
                        break;
                    }
                    self.str_buf.push(b')');
                }
                0x5C => {
                    ch = self.next_char()?;
                    match ch {
                        -1 => break,
                        0x6E => self.str_buf.push(b'\n'),
                        0x72 => self.str_buf.push(b'\r'),
                        0x74 => self.str_buf.push(b'\t'),
                        0x62 => self.str_buf.push(0x08),
                        0x66 => self.str_buf.push(0x0C),
                        0x5C | 0x28 | 0x29 => self.str_buf.push(ch as u8),
                        0x30..=0x37 => {
                            let mut x = (ch & 0x0F) as u8;
                            ch = self.next_char()?;
                            char_buffered = true;

                            if ch >= 0x30 && ch <= 0x37 {
                                x = (x << 3) + (ch & 0x0F) as u8;
                                ch = self.next_char()?;

                                if ch >= 0x30 && ch <= 0x37 {
                                    char_buffered = false;
                                    x = (x << 3) + (ch & 0x0F) as u8;
                                }
                            }
                            self.str_buf.push(x);
                        }
                        0x0D => {
                            if self.peek_char()? == 0x0A {
                                self.next_char()?;
                            }
                        }
                        0x0A => {}
                        _ => self.str_buf.push(ch as u8),
                    }
                }
                _ => self.str_buf.push(ch as u8),
            }

            if !char_buffered {
                ch = self.next_char()?;
            }
        }

        Ok(Token::String(self.str_buf.clone()))
    }

    fn to_hex_digit(ch: i32) -> i32 {
        if ch >= 0x30 && ch <= 0x39 {
            ch & 0x0F
        } else if (ch >= 0x41 && ch <= 0x46) || (ch >= 0x61 && ch <= 0x66) {
            (ch & 0x0F) + 9
        } else {
            -1
        }
    }

    fn get_hex_string(&mut self) -> PDFResult<Token> {
        self.str_buf.clear();
        let mut ch = self.current_char;
        let mut first_digit = -1;

        loop {
            if ch < 0 {
                break;
            } else if ch == 0x3E {
                self.next_char()?;
                break;
            } else if Self::is_whitespace(ch) {
                ch = self.next_char()?;
                continue;
            } else {
                let digit = Self::to_hex_digit(ch);
                if digit == -1 {
                    // Skip invalid hex digits rather than fail the whole string.
                } else if first_digit == -1 {
                    first_digit = digit;
                } else {
                    self.str_buf.push(((first_digit << 4) | digit) as u8);
                    first_digit = -1;
                }
                ch = self.next_char()?;
            }
        }

        if first_digit != -1 {
            self.str_buf.push((first_digit << 4) as u8);
        }

        Ok(Token::HexString(self.str_buf.clone()))
    }

    fn get_name(&mut self) -> PDFResult<Token> {
        self.str_buf.clear();
        let mut ch = self.next_char()?;

        while ch >= 0 && !Self::is_special(ch) {
            if ch == 0x23 {
                ch = self.next_char()?;

                if Self::is_special(ch) {
                    self.str_buf.push(b'#');
                    break;
                }

                let x = Self::to_hex_digit(ch);
                if x != -1 {
                    let previous_ch = ch;
                    ch = self.next_char()?;
                    let x2 = Self::to_hex_digit(ch);

                    if x2 == -1 {
                        self.str_buf.push(b'#');
                        self.str_buf.push(previous_ch as u8);

                        if Self::is_special(ch) {
                            break;
                        }
                        self.str_buf.push(ch as u8);
                        ch = self.next_char()?;
                        continue;
                    }

                    self.str_buf.push(((x << 4) | x2) as u8);
                } else {
                    self.str_buf.push(b'#');
                    self.str_buf.push(ch as u8);
                }
            } else {
                self.str_buf.push(ch as u8);
            }

            ch = self.next_char()?;
        }

        Ok(Token::Name(String::from_utf8_lossy(&self.str_buf).to_string()))
    }

    fn get_command(&mut self) -> PDFResult<Token> {
        let mut str_buf = String::new();
        let mut ch = self.current_char;

        while ch >= 0 && !Self::is_special(ch) {
            if str_buf.len() >= 128 {
                return Err(PDFError::Generic(format!(
                    "command token too long: {}",
                    str_buf.len()
                )));
            }
            str_buf.push(ch as u8 as char);
            ch = self.next_char()?;
        }

        match str_buf.as_str() {
            "true" => Ok(Token::Boolean(true)),
            "false" => Ok(Token::Boolean(false)),
            "null" => Ok(Token::Null),
            _ => Ok(Token::Command(str_buf)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::stream::Stream;

    fn lexer_for(data: &[u8]) -> Lexer {
        Lexer::new(Box::new(Stream::from_bytes(data.to_vec()))).unwrap()
    }

    #[test]
    fn tokenizes_integer() {
        let mut lexer = lexer_for(b"123");
        assert_eq!(lexer.get_object().unwrap(), Token::Number(123.0));
    }

    #[test]
    fn tokenizes_negative_real() {
        let mut lexer = lexer_for(b"-12.5");
        assert_eq!(lexer.get_object().unwrap(), Token::Number(-12.5));
    }

    #[test]
    fn tokenizes_name_with_hex_escape() {
        let mut lexer = lexer_for(b"/Ab#20c");
        assert_eq!(lexer.get_object().unwrap(), Token::Name("Ab c".to_string()));
    }

    #[test]
    fn tokenizes_literal_string_with_escapes() {
        let mut lexer = lexer_for(b"(hi\\n(nested)\\))");
        assert_eq!(
            lexer.get_object().unwrap(),
            Token::String(b"hi\n(nested)".to_vec())
        );
    }

    #[test]
    fn tokenizes_hex_string_with_odd_digit_count() {
        let mut lexer = lexer_for(b"<48656C6C6F1>");
        assert_eq!(
            lexer.get_object().unwrap(),
            Token::HexString(b"Hello\x10".to_vec())
        );
    }

    #[test]
    fn tokenizes_dict_delimiters() {
        let mut lexer = lexer_for(b"<< >>");
        assert_eq!(lexer.get_object().unwrap(), Token::DictStart);
        assert_eq!(lexer.get_object().unwrap(), Token::DictEnd);
    }

    #[test]
    fn tokenizes_boolean_and_null_keywords() {
        let mut lexer = lexer_for(b"true false null");
        assert_eq!(lexer.get_object().unwrap(), Token::Boolean(true));
        assert_eq!(lexer.get_object().unwrap(), Token::Boolean(false));
        assert_eq!(lexer.get_object().unwrap(), Token::Null);
    }

    #[test]
    fn skips_comments() {
        let mut lexer = lexer_for(b"% a comment\n42");
        assert_eq!(lexer.get_object().unwrap(), Token::Number(42.0));
    }

    #[test]
    fn eof_at_end_of_stream() {
        let mut lexer = lexer_for(b"   ");
        assert_eq!(lexer.get_object().unwrap(), Token::EOF);
    }

    #[test]
    fn position_tracks_stream_offset() {
        let mut lexer = lexer_for(b"12 stream");
        let _ = lexer.get_object().unwrap();
        let before = lexer.get_position();
        let _ = lexer.get_stream_byte().unwrap();
        assert_eq!(lexer.get_position(), before + 1);
    }
}
