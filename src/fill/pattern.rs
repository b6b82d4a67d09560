//! FILENAME: src/fill/pattern.rs
//! PURPOSE: Fill-pattern detection over a seed selection of cells.
//! CONTEXT: Inspects a short run of seed values and decides which of a
//! fixed set of series patterns (linear, geometric, a configured custom
//! list, text-with-embedded-number, or "no pattern, just copy") best
//! explains them. A seed cell carrying a formula is handled one level up,
//! in `fill::fill_series`, before any of these value-shape patterns come
//! into play.

use crate::cell::CellValue;

/// The casing style observed on a source cell's text, so a generated
/// custom-list value can be re-cased to match its corresponding source
/// cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Casing {
    AllUpper,
    AllLower,
    Title,
    Verbatim,
}

impl Casing {
    fn detect(text: &str) -> Casing {
        let letters: Vec<char> = text.chars().filter(|c| c.is_alphabetic()).collect();
        if letters.is_empty() {
            return Casing::Verbatim;
        }
        if letters.iter().all(|c| c.is_uppercase()) {
            return Casing::AllUpper;
        }
        if letters.iter().all(|c| c.is_lowercase()) {
            return Casing::AllLower;
        }
        if is_title_case(text) {
            return Casing::Title;
        }
        Casing::Verbatim
    }

    /// Re-cases `text` (a custom-list entry, stored in its canonical form)
    /// to match this style.
    pub fn apply(self, text: &str) -> String {
        match self {
            Casing::AllUpper => text.to_uppercase(),
            Casing::AllLower => text.to_lowercase(),
            Casing::Title => title_case(text),
            Casing::Verbatim => text.to_string(),
        }
    }
}

fn is_title_case(text: &str) -> bool {
    text.split_whitespace().all(|word| {
        let mut chars = word.chars();
        match chars.next() {
            Some(first) if first.is_alphabetic() => {
                first.is_uppercase() && chars.filter(|c| c.is_alphabetic()).all(|c| c.is_lowercase())
            }
            _ => true,
        }
    })
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// The detected shape of a fill series, carrying the parameters needed to
/// continue it.
#[derive(Debug, Clone, PartialEq)]
pub enum DetectedPattern {
    /// `len` is the seed length; generation continues at `start + step *
    /// (len + i)` for 0-based target index `i`.
    Linear { start: f64, step: f64, len: usize },
    /// `len` is the seed length; generation continues at `start *
    /// ratio^(len + i)`.
    Geometric { start: f64, ratio: f64, len: usize },
    CustomList {
        list_index: usize,
        start_offset: usize,
        /// Casing observed on each seed cell, in seed order; generation
        /// cycles through these the same way it cycles through the list.
        /// Its length doubles as the seed length for the list-index offset.
        source_casing: Vec<Casing>,
    },
    /// A textual prefix, an embedded number that increments each step, and
    /// a trailing suffix, e.g. "Item 1", "Item 2", ... or "Page 1 draft",
    /// "Page 2 draft", ... `len` is the seed length, used the same way as
    /// `Linear`'s.
    TextWithNumber {
        prefix: String,
        start: i64,
        step: i64,
        width: usize,
        suffix: String,
        len: usize,
    },
    /// No numeric/textual/list pattern detected; repeat the seed values.
    Copy,
}

/// Detects the pattern implied by a sequence of seed values.
///
/// `custom_lists` is the engine's configured set of named cyclical lists
/// (e.g. weekday or month names) checked before falling back to numeric or
/// copy detection.
pub fn detect_pattern(seed: &[CellValue], custom_lists: &[Vec<String>]) -> DetectedPattern {
    if seed.is_empty() {
        return DetectedPattern::Copy;
    }

    if let Some(numbers) = all_numbers(seed) {
        if numbers.len() == 1 {
            return DetectedPattern::Linear {
                start: numbers[0],
                step: 1.0,
                len: 1,
            };
        }
        if let Some(step) = constant_difference(&numbers) {
            return DetectedPattern::Linear {
                start: numbers[0],
                step,
                len: numbers.len(),
            };
        }
        if let Some(ratio) = constant_ratio(&numbers) {
            return DetectedPattern::Geometric {
                start: numbers[0],
                ratio,
                len: numbers.len(),
            };
        }
        return DetectedPattern::Copy;
    }

    let texts: Vec<String> = seed.iter().map(|v| v.as_text()).collect();

    if let Some((list_index, start_offset)) = match_custom_list(&texts, custom_lists) {
        let source_casing = texts.iter().map(|t| Casing::detect(t)).collect();
        return DetectedPattern::CustomList {
            list_index,
            start_offset,
            source_casing,
        };
    }

    if let Some(pattern) = detect_text_with_number(&texts) {
        return pattern;
    }

    DetectedPattern::Copy
}

fn all_numbers(seed: &[CellValue]) -> Option<Vec<f64>> {
    seed.iter().map(|v| v.as_number()).collect()
}

fn constant_difference(numbers: &[f64]) -> Option<f64> {
    let step = numbers[1] - numbers[0];
    for window in numbers.windows(2) {
        if (window[1] - window[0] - step).abs() > 1e-9 {
            return None;
        }
    }
    Some(step)
}

fn constant_ratio(numbers: &[f64]) -> Option<f64> {
    if numbers.iter().any(|&n| n == 0.0) {
        return None;
    }
    let ratio = numbers[1] / numbers[0];
    for window in numbers.windows(2) {
        if (window[1] / window[0] - ratio).abs() > 1e-9 {
            return None;
        }
    }
    Some(ratio)
}

fn match_custom_list(texts: &[String], custom_lists: &[Vec<String>]) -> Option<(usize, usize)> {
    for (list_index, list) in custom_lists.iter().enumerate() {
        if list.is_empty() {
            continue;
        }
        let normalized_list: Vec<String> = list.iter().map(|s| s.to_lowercase()).collect();
        if let Some(start_offset) = normalized_list.iter().position(|item| item == &texts[0].to_lowercase()) {
            let matches = texts.iter().enumerate().all(|(i, text)| {
                let expected_idx = (start_offset + i) % normalized_list.len();
                text.to_lowercase() == normalized_list[expected_idx]
            });
            if matches {
                return Some((list_index, start_offset));
            }
        }
    }
    None
}

fn detect_text_with_number(texts: &[String]) -> Option<DetectedPattern> {
    let parsed: Vec<(String, i64, usize, String)> = texts.iter().map(|t| split_number_parts(t)).collect::<Option<Vec<_>>>()?;

    let prefix = &parsed[0].0;
    let suffix = &parsed[0].3;
    if !parsed.iter().all(|(p, _, _, s)| p == prefix && s == suffix) {
        return None;
    }

    let numbers: Vec<i64> = parsed.iter().map(|(_, n, _, _)| *n).collect();
    let width = parsed[0].2;

    let step = if numbers.len() == 1 { 1 } else { numbers[1] - numbers[0] };
    for window in numbers.windows(2) {
        if window[1] - window[0] != step {
            return None;
        }
    }

    Some(DetectedPattern::TextWithNumber {
        prefix: prefix.clone(),
        start: numbers[0],
        step,
        width,
        suffix: suffix.clone(),
        len: numbers.len(),
    })
}

/// Splits `"Q1 of 4"` into `("Q", 1, 1, " of 4")` — prefix, the first
/// embedded number, the zero-padded width it occupied, and everything
/// after it, mirroring `^(.*?)(\d+)(.*?)$`'s first-run-of-digits match.
fn split_number_parts(text: &str) -> Option<(String, i64, usize, String)> {
    let chars: Vec<char> = text.chars().collect();
    let start = chars.iter().position(|c| c.is_ascii_digit())?;
    let mut end = start;
    while end < chars.len() && chars[end].is_ascii_digit() {
        end += 1;
    }
    let prefix: String = chars[..start].iter().collect();
    let digits: String = chars[start..end].iter().collect();
    let suffix: String = chars[end..].iter().collect();
    let number: i64 = digits.parse().ok()?;
    Some((prefix, number, digits.len(), suffix))
}
