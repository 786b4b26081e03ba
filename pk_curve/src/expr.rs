//! Parses and evaluates expressions that denote an amount of time.
//!
//! The grammar is sums of products of unit-suffixed numbers, e.g.
//! `1.5h + 30m` or `2 * 12h`. Units are `m` (minutes), `h` (hours, the
//! default), `d` (days) and `w` (weeks); every expression evaluates to
//! hours.

use crate::PkError;

pub fn parse_expr(input: &str) -> Result<f64, PkError> {
    let mut parser = Parser {
        bytes: input.as_bytes(),
        pos: 0,
    };
    let value = parser.expr(input)?;
    parser.skip_ws();
    if parser.pos != parser.bytes.len() {
        return Err(PkError::InvalidExpression(input.to_string()));
    }
    Ok(value)
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn expr(&mut self, src: &str) -> Result<f64, PkError> {
        let mut total = self.term(src)?;
        while self.eat(b'+') {
            total += self.term(src)?;
        }
        Ok(total)
    }

    fn term(&mut self, src: &str) -> Result<f64, PkError> {
        let mut product = self.atom(src)?;
        while self.eat(b'*') {
            product *= self.atom(src)?;
        }
        Ok(product)
    }

    fn atom(&mut self, src: &str) -> Result<f64, PkError> {
        self.skip_ws();
        let start = self.pos;
        if matches!(self.peek(), Some(b'+') | Some(b'-')) {
            self.pos += 1;
        }
        let mut seen_digit = false;
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
            seen_digit = true;
        }
        if self.peek() == Some(b'.') {
            self.pos += 1;
            while matches!(self.peek(), Some(b'0'..=b'9')) {
                self.pos += 1;
                seen_digit = true;
            }
        }
        if seen_digit && matches!(self.peek(), Some(b'e') | Some(b'E')) {
            let mark = self.pos;
            self.pos += 1;
            if matches!(self.peek(), Some(b'+') | Some(b'-')) {
                self.pos += 1;
            }
            let mut exp_digit = false;
            while matches!(self.peek(), Some(b'0'..=b'9')) {
                self.pos += 1;
                exp_digit = true;
            }
            if !exp_digit {
                self.pos = mark;
            }
        }
        if !seen_digit {
            return Err(PkError::InvalidExpression(src.to_string()));
        }
        let text = std::str::from_utf8(&self.bytes[start..self.pos])
            .map_err(|_| PkError::InvalidExpression(src.to_string()))?;
        let value: f64 = text
            .parse()
            .map_err(|_| PkError::InvalidExpression(src.to_string()))?;
        Ok(value * self.unit_factor())
    }

    /// An optional single-letter unit, converted to hours.
    fn unit_factor(&mut self) -> f64 {
        self.skip_ws();
        let factor = match self.peek() {
            Some(b'm') => 1.0 / 60.0,
            Some(b'h') => 1.0,
            Some(b'd') => 24.0,
            Some(b'w') => 24.0 * 7.0,
            _ => return 1.0,
        };
        // A unit letter must stand alone, not start a longer word.
        match self.bytes.get(self.pos + 1) {
            Some(c) if c.is_ascii_alphanumeric() || *c == b'.' => 1.0,
            _ => {
                self.pos += 1;
                factor
            }
        }
    }

    fn eat(&mut self, byte: u8) -> bool {
        self.skip_ws();
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ') | Some(b'\t')) {
            self.pos += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_numbers_are_hours() {
        assert_eq!(parse_expr("1.5").unwrap(), 1.5);
        assert_eq!(parse_expr("12").unwrap(), 12.0);
        assert_eq!(parse_expr("1.5e1").unwrap(), 15.0);
    }

    #[test]
    fn units_convert_to_hours() {
        assert_eq!(parse_expr("90m").unwrap(), 1.5);
        assert_eq!(parse_expr("2d").unwrap(), 48.0);
        assert_eq!(parse_expr("1w").unwrap(), 168.0);
        assert_eq!(parse_expr("1 h").unwrap(), 1.0);
    }

    #[test]
    fn sums_and_products() {
        assert_eq!(parse_expr("1h + 30m").unwrap(), 1.5);
        assert_eq!(parse_expr("2 * 12h").unwrap(), 24.0);
        assert_eq!(parse_expr("1d + 2 * 6h").unwrap(), 36.0);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_expr("").is_err());
        assert!(parse_expr("1x").is_err());
        assert!(parse_expr("h").is_err());
        assert!(parse_expr("1 2").is_err());
        assert!(parse_expr("1 +").is_err());
    }

    #[test]
    fn negative_values_parse() {
        assert_eq!(parse_expr("-2h").unwrap(), -2.0);
    }
}
