//! Type-aware value formatting for placeholders
//!
//! Dates take strftime patterns and numbers take a format-spec mini-language
//! `[[fill]align][sign][0][width][,|_][.precision][d|f|F|%]`. Specifiers are
//! normalised from full-width to half-width characters first, since template
//! authors often type them with a Japanese input method.

use std::fmt::Write as _;

use chrono::format::{Item, StrftimeItems};
use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{GenerationError, Result};
use crate::models::Value;

/// Date pattern used when a placeholder carries no format
pub const DEFAULT_DATE_FORMAT: &str = "%Y年%-m月%-d日";
/// Number format used when a placeholder carries no format
pub const DEFAULT_NUMBER_FORMAT: &str = ",";

/// Convert full-width ASCII variants and the ideographic space to half-width
pub fn to_half_width(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
            '\u{3000}' => ' ',
            _ => c,
        })
        .collect()
}

/// Format `value` for insertion into a document
pub fn format_value(key: &str, value: &Value, format: Option<&str>) -> Result<String> {
    match value {
        Value::Text(text) => Ok(text.clone()),
        Value::Date(date) => format_temporal(key, Temporal::Date(*date), format),
        Value::DateTime(date_time) => format_temporal(key, Temporal::DateTime(*date_time), format),
        Value::Integer(_) | Value::Float(_) => format_number(key, value, format),
    }
}

enum Temporal {
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

fn invalid(key: &str, format: &str, message: impl Into<String>) -> GenerationError {
    GenerationError::InvalidFormat {
        key: key.to_string(),
        format: format.to_string(),
        message: message.into(),
    }
}

fn format_temporal(key: &str, value: Temporal, format: Option<&str>) -> Result<String> {
    let pattern = format
        .map(to_half_width)
        .unwrap_or_else(|| DEFAULT_DATE_FORMAT.to_string());
    let items: Vec<Item<'_>> = StrftimeItems::new(&pattern).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(invalid(key, &pattern, "unknown strftime directive"));
    }

    let mut out = String::new();
    let written = match value {
        Temporal::Date(date) => write!(out, "{}", date.format_with_items(items.iter())),
        Temporal::DateTime(date_time) => {
            write!(out, "{}", date_time.format_with_items(items.iter()))
        }
    };
    written.map_err(|_| invalid(key, &pattern, "pattern needs fields the value does not have"))?;
    Ok(out.to_uppercase())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
    Center,
    AfterSign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sign {
    Negative,
    Always,
    Space,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Decimal,
    Fixed,
    Percent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct NumberSpec {
    fill: char,
    align: Option<Align>,
    sign: Sign,
    width: usize,
    grouping: Option<char>,
    precision: Option<usize>,
    kind: Option<Kind>,
}

fn align_of(c: char) -> Option<Align> {
    match c {
        '<' => Some(Align::Left),
        '>' => Some(Align::Right),
        '^' => Some(Align::Center),
        '=' => Some(Align::AfterSign),
        _ => None,
    }
}

fn read_digits(chars: &[char], start: usize) -> (usize, usize) {
    let mut end = start;
    let mut value = 0usize;
    while let Some(d) = chars.get(end).and_then(|c| c.to_digit(10)) {
        value = value.saturating_mul(10).saturating_add(d as usize);
        end += 1;
    }
    (value, end)
}

impl NumberSpec {
    fn parse(spec: &str) -> std::result::Result<Self, String> {
        let chars: Vec<char> = spec.chars().collect();
        let mut i = 0;
        let mut fill = ' ';
        let mut align = None;

        if let Some(a) = chars.get(1).copied().and_then(align_of) {
            fill = chars[0];
            align = Some(a);
            i = 2;
        } else if let Some(a) = chars.first().copied().and_then(align_of) {
            align = Some(a);
            i = 1;
        }

        let mut sign = Sign::Negative;
        match chars.get(i) {
            Some('+') => {
                sign = Sign::Always;
                i += 1;
            }
            Some('-') => i += 1,
            Some(' ') => {
                sign = Sign::Space;
                i += 1;
            }
            _ => {}
        }

        if chars.get(i) == Some(&'0') {
            if align.is_none() {
                fill = '0';
                align = Some(Align::AfterSign);
            }
            i += 1;
        }

        let (width, next) = read_digits(&chars, i);
        i = next;

        let mut grouping = None;
        if let Some(c @ (',' | '_')) = chars.get(i).copied() {
            grouping = Some(c);
            i += 1;
        }

        let mut precision = None;
        if chars.get(i) == Some(&'.') {
            let (p, next) = read_digits(&chars, i + 1);
            if next == i + 1 {
                return Err("missing precision after '.'".to_string());
            }
            precision = Some(p);
            i = next;
        }

        let kind = match chars.get(i) {
            None => None,
            Some('d') => Some(Kind::Decimal),
            Some('f' | 'F') => Some(Kind::Fixed),
            Some('%') => Some(Kind::Percent),
            Some(c) => return Err(format!("unsupported format type {:?}", c)),
        };
        if kind.is_some() {
            i += 1;
        }
        if i != chars.len() {
            return Err("trailing characters in format specifier".to_string());
        }

        Ok(Self {
            fill,
            align,
            sign,
            width,
            grouping,
            precision,
            kind,
        })
    }

    fn render(&self, value: &Value) -> std::result::Result<String, String> {
        let number = value
            .as_f64()
            .ok_or_else(|| "value is not a number".to_string())?;

        let (negative, body) = match (value, self.kind) {
            (Value::Integer(n), None | Some(Kind::Decimal)) => {
                if self.precision.is_some() {
                    return Err("precision is not allowed for integers".to_string());
                }
                (*n < 0, n.unsigned_abs().to_string())
            }
            (_, Some(Kind::Decimal)) => {
                return Err("'d' requires an integer value".to_string());
            }
            (_, None) => match self.precision {
                Some(p) => (number < 0.0, general(number.abs(), p)),
                None => (number < 0.0, signed_exponent(&format!("{:?}", number.abs()))),
            },
            (_, Some(Kind::Fixed)) => (
                number < 0.0,
                format!("{:.*}", self.precision.unwrap_or(6), number.abs()),
            ),
            (_, Some(Kind::Percent)) => (
                number < 0.0,
                format!("{:.*}%", self.precision.unwrap_or(6), number.abs() * 100.0),
            ),
        };

        let body = match self.grouping {
            Some(separator) => {
                let split = body
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(body.len());
                format!("{}{}", group_digits(&body[..split], separator), &body[split..])
            }
            None => body,
        };

        let sign = match (negative, self.sign) {
            (true, _) => "-",
            (false, Sign::Always) => "+",
            (false, Sign::Space) => " ",
            (false, Sign::Negative) => "",
        };

        let len = sign.chars().count() + body.chars().count();
        if self.width <= len {
            return Ok(format!("{}{}", sign, body));
        }
        let pad = self.width - len;
        let fill = |n: usize| std::iter::repeat(self.fill).take(n).collect::<String>();
        Ok(match self.align.unwrap_or(Align::Right) {
            Align::Left => format!("{}{}{}", sign, body, fill(pad)),
            Align::Right => format!("{}{}{}", fill(pad), sign, body),
            Align::Center => {
                let left = pad / 2;
                format!("{}{}{}{}", fill(left), sign, body, fill(pad - left))
            }
            Align::AfterSign => format!("{}{}{}", sign, fill(pad), body),
        })
    }
}

/// Rewrite a Rust exponent (`1e16`, `1e-5`) with an explicit sign and at
/// least two digits (`1e+16`, `1e-05`)
fn signed_exponent(formatted: &str) -> String {
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => formatted.to_string(),
    }
}

fn trim_fraction(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}

/// General format with `precision` significant digits. Scientific notation
/// is used once the exponent reaches `precision - 1` or drops below -4, and
/// fixed-point output keeps at least one fractional digit.
fn general(number: f64, precision: usize) -> String {
    let precision = precision.max(1);
    let scientific = format!("{:.*e}", precision - 1, number);
    let (mantissa, exponent) = scientific
        .split_once('e')
        .and_then(|(m, e)| e.parse::<i32>().ok().map(|e| (m, e)))
        .unwrap_or((scientific.as_str(), 0));

    let digits = precision as i32;
    if (-4..digits - 1).contains(&exponent) {
        let fixed = format!("{:.*}", (digits - 1 - exponent) as usize, number);
        let trimmed = trim_fraction(&fixed);
        if trimmed.contains('.') {
            trimmed.to_string()
        } else {
            format!("{}.0", trimmed)
        }
    } else {
        signed_exponent(&format!("{}e{}", trim_fraction(mantissa), exponent))
    }
}

fn group_digits(digits: &str, separator: char) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(c);
    }
    out
}

fn format_number(key: &str, value: &Value, format: Option<&str>) -> Result<String> {
    let raw = format
        .map(to_half_width)
        .unwrap_or_else(|| DEFAULT_NUMBER_FORMAT.to_string());
    let spec = NumberSpec::parse(&raw).map_err(|m| invalid(key, &raw, m))?;
    spec.render(value).map_err(|m| invalid(key, &raw, m))
}
