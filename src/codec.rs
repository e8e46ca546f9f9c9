//! Text wire format for point sets.
//!
//! A point set travels as `x,y` tokens separated by single spaces, with a
//! trailing space after the last token:
//!
//! ```text
//! 0,0 4,0 4,4 0,4
//! ```
//!
//! Two decoders exist. The strict decoder rejects any malformed token and is
//! used by the client and, by default, by the server. The lenient decoder
//! behaves like a formatted-input scanner: it reads `int <delim> int` groups
//! and silently stops at the first group that does not match.

use crate::geometry::Point;
use serde::Deserialize;
use std::fmt::Write;
use std::str;

/// How the server decodes a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ParsePolicy {
    /// Reject malformed requests with an `ERROR` response.
    #[default]
    Strict,
    /// Keep the points parsed before the first malformed token.
    Lenient,
}

/// Point decoding errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Request bytes are not valid UTF-8
    NotUtf8,
    /// Token has no comma separating the coordinates
    MissingComma(String),
    /// One of the coordinates is not a base-10 i32
    InvalidCoordinate(String),
    /// Fewer points than the caller requires
    InsufficientPoints { found: usize, required: usize },
    /// Request does not fit in the server's read buffer
    RequestTooLarge { limit: usize },
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::NotUtf8 => write!(f, "Request is not valid UTF-8"),
            ParseError::MissingComma(token) => {
                write!(f, "Invalid point format '{}', use 'x,y'", token)
            }
            ParseError::InvalidCoordinate(token) => write!(f, "Invalid coordinates '{}'", token),
            ParseError::InsufficientPoints { found, required } => {
                write!(f, "At least {} points required, got {}", required, found)
            }
            ParseError::RequestTooLarge { limit } => {
                write!(f, "Request exceeds {} bytes", limit)
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Prefix of the line the server sends back for a rejected request.
pub const ERROR_PREFIX: &str = "ERROR ";

/// Encode points as `x,y x,y ... ` (trailing space included).
pub fn encode(points: &[Point]) -> String {
    let mut out = String::with_capacity(points.len() * 8);
    for p in points {
        // Writing to a String cannot fail
        let _ = write!(out, "{} ", p);
    }
    out
}

/// Encode a rejected request as `ERROR <message>\r\n`.
pub fn encode_error(err: &ParseError) -> String {
    format!("{}{}\r\n", ERROR_PREFIX, err)
}

/// Strictly decode a whitespace-separated list of `x,y` tokens.
pub fn decode(text: &str) -> Result<Vec<Point>, ParseError> {
    text.split_whitespace().map(decode_token).collect()
}

/// Strictly decode and require at least `min_points` points.
pub fn decode_request(text: &str, min_points: usize) -> Result<Vec<Point>, ParseError> {
    let points = decode(text)?;
    if points.len() < min_points {
        return Err(ParseError::InsufficientPoints {
            found: points.len(),
            required: min_points,
        });
    }
    Ok(points)
}

/// Strictly decode raw request bytes.
pub fn decode_bytes(bytes: &[u8]) -> Result<Vec<Point>, ParseError> {
    let text = str::from_utf8(bytes).map_err(|_| ParseError::NotUtf8)?;
    decode(text)
}

/// Decode raw request bytes according to `policy`.
pub fn decode_with_policy(bytes: &[u8], policy: ParsePolicy) -> Result<Vec<Point>, ParseError> {
    match policy {
        ParsePolicy::Strict => decode_bytes(bytes),
        ParsePolicy::Lenient => Ok(decode_lenient(bytes)),
    }
}

fn decode_token(token: &str) -> Result<Point, ParseError> {
    let (x, y) = token
        .split_once(',')
        .ok_or_else(|| ParseError::MissingComma(token.to_string()))?;

    let x = x
        .parse::<i32>()
        .map_err(|_| ParseError::InvalidCoordinate(token.to_string()))?;
    let y = y
        .parse::<i32>()
        .map_err(|_| ParseError::InvalidCoordinate(token.to_string()))?;

    Ok(Point::new(x, y))
}

/// Leniently decode `int <delim> int` groups, stopping at the first failure.
///
/// Whitespace is skipped before every field, the delimiter may be any single
/// non-whitespace byte, and whatever follows the last complete group is
/// ignored.
pub fn decode_lenient(bytes: &[u8]) -> Vec<Point> {
    let mut scanner = Scanner::new(bytes);
    let mut points = Vec::new();

    while let Some(point) = scanner.next_point() {
        points.push(point);
    }

    points
}

/// Cursor over request bytes that reads integers and single delimiters.
struct Scanner<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a [u8]) -> Self {
        Scanner { input, pos: 0 }
    }

    fn next_point(&mut self) -> Option<Point> {
        let x = self.read_int()?;
        self.read_delimiter()?;
        let y = self.read_int()?;
        Some(Point::new(x, y))
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.input.len() && self.input[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn read_delimiter(&mut self) -> Option<u8> {
        self.skip_whitespace();
        let byte = *self.input.get(self.pos)?;
        self.pos += 1;
        Some(byte)
    }

    fn read_int(&mut self) -> Option<i32> {
        self.skip_whitespace();
        let start = self.pos;
        let mut end = start;

        if matches!(self.input.get(end), Some(b'+') | Some(b'-')) {
            end += 1;
        }
        let digits_start = end;
        while end < self.input.len() && self.input[end].is_ascii_digit() {
            end += 1;
        }
        if end == digits_start {
            return None;
        }

        let value = str::from_utf8(&self.input[start..end]).ok()?.parse().ok()?;
        self.pos = end;
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: &[(i32, i32)]) -> Vec<Point> {
        coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn test_encode_trailing_space() {
        assert_eq!(encode(&pts(&[(0, 0), (4, -1)])), "0,0 4,-1 ");
        assert_eq!(encode(&[]), "");
    }

    #[test]
    fn test_decode_round_trip() {
        let points = pts(&[(0, 0), (-12, 7), (i32::MAX, i32::MIN), (0, 0)]);
        assert_eq!(decode(&encode(&points)).unwrap(), points);
    }

    #[test]
    fn test_decode_tolerates_whitespace() {
        let points = decode("  1,2   3,4\n5,6\r\n").unwrap();
        assert_eq!(points, pts(&[(1, 2), (3, 4), (5, 6)]));
    }

    #[test]
    fn test_decode_missing_comma() {
        assert_eq!(
            decode("1,2 34 5,6"),
            Err(ParseError::MissingComma("34".to_string()))
        );
    }

    #[test]
    fn test_decode_invalid_coordinate() {
        assert_eq!(
            decode("1,2 3,x"),
            Err(ParseError::InvalidCoordinate("3,x".to_string()))
        );
        assert_eq!(
            decode("1,2,3"),
            Err(ParseError::InvalidCoordinate("1,2,3".to_string()))
        );
        assert_eq!(
            decode("99999999999,0"),
            Err(ParseError::InvalidCoordinate("99999999999,0".to_string()))
        );
    }

    #[test]
    fn test_decode_request_requires_points() {
        assert_eq!(
            decode_request("1,2 3,4", 3),
            Err(ParseError::InsufficientPoints {
                found: 2,
                required: 3
            })
        );
        assert_eq!(decode_request("1,2 3,4 5,6", 3).unwrap().len(), 3);
    }

    #[test]
    fn test_decode_bytes_rejects_invalid_utf8() {
        assert_eq!(decode_bytes(b"1,2 \xff,3"), Err(ParseError::NotUtf8));
    }

    #[test]
    fn test_lenient_stops_at_first_bad_token() {
        assert_eq!(decode_lenient(b"1,2 3,4 oops 5,6"), pts(&[(1, 2), (3, 4)]));
        assert_eq!(decode_lenient(b"1,2 3"), pts(&[(1, 2)]));
        assert!(decode_lenient(b"").is_empty());
    }

    #[test]
    fn test_lenient_accepts_any_delimiter() {
        assert_eq!(decode_lenient(b"1;2 -3 , +4"), pts(&[(1, 2), (-3, 4)]));
    }

    #[test]
    fn test_decode_with_policy() {
        let request = b"0,0 4,0 bad 4,4";
        assert!(decode_with_policy(request, ParsePolicy::Strict).is_err());
        assert_eq!(
            decode_with_policy(request, ParsePolicy::Lenient).unwrap(),
            pts(&[(0, 0), (4, 0)])
        );
    }

    #[test]
    fn test_encode_error() {
        let err = ParseError::MissingComma("7".to_string());
        assert_eq!(encode_error(&err), "ERROR Invalid point format '7', use 'x,y'\r\n");
    }

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::InsufficientPoints {
            found: 1,
            required: 3,
        };
        assert_eq!(err.to_string(), "At least 3 points required, got 1");
    }
}
