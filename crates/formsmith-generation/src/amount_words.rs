//! English cardinal rendering of amounts

use crate::models::Value;

const ONES: [&str; 20] = [
    "", "One", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine", "Ten", "Eleven",
    "Twelve", "Thirteen", "Fourteen", "Fifteen", "Sixteen", "Seventeen", "Eighteen", "Nineteen",
];
const TENS: [&str; 10] = [
    "", "", "Twenty", "Thirty", "Forty", "Fifty", "Sixty", "Seventy", "Eighty", "Ninety",
];
const SCALES: [&str; 7] = [
    "",
    "Thousand",
    "Million",
    "Billion",
    "Trillion",
    "Quadrillion",
    "Quintillion",
];

fn push_below_thousand(n: u64, words: &mut Vec<&'static str>) {
    let hundreds = (n / 100) as usize;
    let rest = (n % 100) as usize;
    if hundreds > 0 {
        words.push(ONES[hundreds]);
        words.push("Hundred");
    }
    if rest >= 20 {
        words.push(TENS[rest / 10]);
        if rest % 10 > 0 {
            words.push(ONES[rest % 10]);
        }
    } else if rest > 0 {
        words.push(ONES[rest]);
    }
}

/// Render a whole number as English words, for example
/// `123456` → "One Hundred Twenty Three Thousand Four Hundred Fifty Six".
pub fn number_to_words(n: u64) -> String {
    if n == 0 {
        return "Zero".to_string();
    }

    let mut groups = Vec::new();
    let mut rest = n;
    while rest > 0 {
        groups.push(rest % 1000);
        rest /= 1000;
    }

    let mut words = Vec::new();
    for (scale, group) in groups.iter().enumerate().rev() {
        if *group == 0 {
            continue;
        }
        push_below_thousand(*group, &mut words);
        if !SCALES[scale].is_empty() {
            words.push(SCALES[scale]);
        }
    }
    words.join(" ")
}

/// Words for the integer part of an amount.
///
/// Text amounts may carry thousands separators. Returns `None` for values
/// that are not amounts.
pub fn amount_in_words(value: &Value) -> Option<String> {
    let whole = match value {
        Value::Integer(n) => n.unsigned_abs(),
        Value::Float(f) if f.is_finite() => f.abs().trunc() as u64,
        Value::Text(text) => {
            let cleaned: String = text.chars().filter(|c| *c != ',').collect();
            let integer_part = cleaned.trim().split('.').next()?;
            integer_part.parse::<u64>().ok()?
        }
        _ => return None,
    };
    Some(number_to_words(whole))
}
