//! FILENAME: src/number_format.rs
//! PURPOSE: Number formatting utilities for displaying cell values.
//! CONTEXT: This module handles the conversion of raw numeric values to
//! formatted display strings based on the cell's NumberFormat setting.

use chrono::NaiveDate;

use crate::cell::{Cell, CellValue};
use crate::style::{CurrencyPosition, NumberFormat};

/// Formats a cell's value for display, applying its format's number format
/// when the value is numeric and a format is set; everything else falls
/// back to the value's own plain-text rendering. This is the single call
/// the render frame makes to produce `RenderCell.formatted_text`.
pub fn format_number_for_cell(cell: &Cell) -> String {
    match (&cell.value, cell.format.as_ref()) {
        (CellValue::Number(n), Some(format)) => format_number(*n, &format.number_format),
        _ => cell.value.as_text(),
    }
}

/// Format a number according to the specified format.
pub fn format_number(value: f64, format: &NumberFormat) -> String {
    match format {
        NumberFormat::General => format_general(value),
        NumberFormat::Number {
            decimal_places,
            use_thousands_separator,
        } => format_decimal(value, *decimal_places, *use_thousands_separator),
        NumberFormat::Currency {
            decimal_places,
            symbol,
            symbol_position,
        } => format_currency(value, *decimal_places, symbol, *symbol_position),
        NumberFormat::Percentage { decimal_places } => format_percentage(value, *decimal_places),
        NumberFormat::Scientific { decimal_places } => format_scientific(value, *decimal_places),
        NumberFormat::Date { format: date_fmt } => format_date_number(value, date_fmt),
        NumberFormat::Time { format: time_fmt } => format_time_number(value, time_fmt),
        NumberFormat::Custom { format: custom_fmt } => format_custom(value, custom_fmt),
    }
}

/// Format a number in general format (auto-detect best representation).
fn format_general(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }

    let abs_value = value.abs();

    // Use scientific notation for very large or very small numbers
    if abs_value >= 1e10 || (abs_value < 1e-4 && abs_value > 0.0) {
        return format!("{:.5e}", value)
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string();
    }

    // For integers, don't show decimal point
    if value.fract() == 0.0 && abs_value < 1e15 {
        return format!("{:.0}", value);
    }

    // For decimals, show up to 10 significant digits but trim trailing zeros
    let formatted = format!("{:.10}", value);
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// Format a number with specified decimal places and optional thousands separator.
fn format_decimal(value: f64, decimal_places: u8, use_thousands_separator: bool) -> String {
    let rounded = format!("{:.prec$}", value, prec = decimal_places as usize);

    if use_thousands_separator {
        add_thousands_separator(&rounded)
    } else {
        rounded
    }
}

/// Add thousands separators to a numeric string.
fn add_thousands_separator(s: &str) -> String {
    let parts: Vec<&str> = s.split('.').collect();
    let integer_part = parts[0];
    let decimal_part = parts.get(1);

    let negative = integer_part.starts_with('-');
    let digits: String = integer_part.chars().filter(|c| c.is_ascii_digit()).collect();

    let mut result = String::new();
    let len = digits.len();

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }

    if negative {
        result = format!("-{}", result);
    }

    if let Some(decimal) = decimal_part {
        result.push('.');
        result.push_str(decimal);
    }

    result
}

/// Format a number as currency.
fn format_currency(
    value: f64,
    decimal_places: u8,
    symbol: &str,
    position: CurrencyPosition,
) -> String {
    let formatted = add_thousands_separator(&format!("{:.prec$}", value.abs(), prec = decimal_places as usize));

    let with_symbol = match position {
        CurrencyPosition::Before => format!("{}{}", symbol, formatted),
        CurrencyPosition::After => format!("{}{}", formatted, symbol),
    };

    if value < 0.0 {
        format!("({})", with_symbol)
    } else {
        with_symbol
    }
}

/// Format a number as percentage.
fn format_percentage(value: f64, decimal_places: u8) -> String {
    let percentage = value * 100.0;
    format!("{:.prec$}%", percentage, prec = decimal_places as usize)
}

/// Format a number in scientific notation.
fn format_scientific(value: f64, decimal_places: u8) -> String {
    format!("{:.prec$e}", value, prec = decimal_places as usize)
        .replace("e", "E")
}

/// Format a number as a date (Excel serial date number).
/// Excel dates: 1 = January 1, 1900 (with the historical leap-year bug, where
/// Excel treats 1900 as a leap year even though it wasn't).
fn format_date_number(value: f64, format: &str) -> String {
    match excel_serial_to_naive_date(value) {
        Some(date) => {
            let year = date.format("%Y").to_string();
            let month = date.format("%m").to_string();
            let day = date.format("%d").to_string();
            format
                .replace("YYYY", &year)
                .replace("YY", &year[year.len() - 2..])
                .replace("MM", &month)
                .replace("DD", &day)
                .replace("M", &date.format("%-m").to_string())
                .replace("D", &date.format("%-d").to_string())
        }
        None => value.to_string(),
    }
}

/// Converts an Excel serial day count (1 = 1900-01-01) to a calendar date,
/// compensating for Excel's historical Feb-29-1900 leap-year bug.
///
/// This is the display-formatting conversion only; the conditional-
/// formatting date-bucket boundary (`conditional::dates::excel_serial_to_date`)
/// duplicates this arithmetic deliberately rather than sharing it, since the
/// two call sites coerce the same raw number under different units.
pub fn excel_serial_to_naive_date(value: f64) -> Option<NaiveDate> {
    let days = value.floor() as i64;
    if days < 1 {
        return None;
    }
    let adjusted_days = if days >= 60 { days - 1 } else { days };
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 31)?;
    epoch.checked_add_signed(chrono::Duration::days(adjusted_days))
}

/// Format a number as time (fraction of a day).
fn format_time_number(value: f64, format: &str) -> String {
    let fraction = value.fract();
    let total_seconds = (fraction * 86400.0).round() as u32;
    
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    let is_pm = hours >= 12;
    let hours_12 = if hours == 0 { 12 } else if hours > 12 { hours - 12 } else { hours };

    format
        .replace("HH", &format!("{:02}", hours))
        .replace("H", &hours.to_string())
        .replace("hh", &format!("{:02}", hours_12))
        .replace("h", &hours_12.to_string())
        .replace("MM", &format!("{:02}", minutes))
        .replace("mm", &format!("{:02}", minutes))
        .replace("SS", &format!("{:02}", seconds))
        .replace("ss", &format!("{:02}", seconds))
        .replace("AM/PM", if is_pm { "PM" } else { "AM" })
        .replace("am/pm", if is_pm { "pm" } else { "am" })
}

/// Format a number using a custom format string.
/// Supports basic patterns like "0.00", "#,##0", etc.
fn format_custom(value: f64, format: &str) -> String {
    // Basic custom format support
    // Count decimal places from format
    let decimal_places = if let Some(dot_pos) = format.find('.') {
        format[dot_pos + 1..]
            .chars()
            .take_while(|c| *c == '0' || *c == '#')
            .count() as u8
    } else {
        0
    };

    let use_thousands = format.contains(',');

    format_decimal(value, decimal_places, use_thousands)
}

/// Predefined number formats for common use cases.
pub mod presets {
    use super::*;

    pub fn general() -> NumberFormat {
        NumberFormat::General
    }

    pub fn number(decimal_places: u8) -> NumberFormat {
        NumberFormat::Number {
            decimal_places,
            use_thousands_separator: false,
        }
    }

    pub fn number_with_separators(decimal_places: u8) -> NumberFormat {
        NumberFormat::Number {
            decimal_places,
            use_thousands_separator: true,
        }
    }

    pub fn currency_usd(decimal_places: u8) -> NumberFormat {
        NumberFormat::Currency {
            decimal_places,
            symbol: "$".to_string(),
            symbol_position: CurrencyPosition::Before,
        }
    }

    pub fn currency_eur(decimal_places: u8) -> NumberFormat {
        NumberFormat::Currency {
            decimal_places,
            symbol: "EUR ".to_string(),
            symbol_position: CurrencyPosition::Before,
        }
    }

    pub fn currency_sek(decimal_places: u8) -> NumberFormat {
        NumberFormat::Currency {
            decimal_places,
            symbol: " kr".to_string(),
            symbol_position: CurrencyPosition::After,
        }
    }

    pub fn percentage(decimal_places: u8) -> NumberFormat {
        NumberFormat::Percentage { decimal_places }
    }

    pub fn scientific(decimal_places: u8) -> NumberFormat {
        NumberFormat::Scientific { decimal_places }
    }

    pub fn date_iso() -> NumberFormat {
        NumberFormat::Date {
            format: "YYYY-MM-DD".to_string(),
        }
    }

    pub fn date_us() -> NumberFormat {
        NumberFormat::Date {
            format: "MM/DD/YYYY".to_string(),
        }
    }

    pub fn date_eu() -> NumberFormat {
        NumberFormat::Date {
            format: "DD/MM/YYYY".to_string(),
        }
    }

    pub fn time_24h() -> NumberFormat {
        NumberFormat::Time {
            format: "HH:MM:SS".to_string(),
        }
    }

    pub fn time_12h() -> NumberFormat {
        NumberFormat::Time {
            format: "hh:MM:SS AM/PM".to_string(),
        }
    }
}
