use serde::{Deserialize, Serialize};

/// The four renderings of a 10-digit North American number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhoneFormat {
    /// `(555) 123-4567`
    Parenthesized,
    /// `555-123-4567`
    Hyphenated,
    /// `+15551234567`
    E164,
    /// `5551234567`
    DigitsOnly,
}

impl PhoneFormat {
    pub const ALL: [PhoneFormat; 4] = [
        PhoneFormat::Parenthesized,
        PhoneFormat::Hyphenated,
        PhoneFormat::E164,
        PhoneFormat::DigitsOnly,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PhoneFormat::Parenthesized => "parenthesized",
            PhoneFormat::Hyphenated => "hyphenated",
            PhoneFormat::E164 => "e164",
            PhoneFormat::DigitsOnly => "digits_only",
        }
    }

    /// Render ten national digits. Returns `None` unless `digits` is exactly
    /// ten ASCII digits.
    pub fn render(self, digits: &str) -> Option<String> {
        if digits.len() != 10 || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
            return None;
        }
        let (area, rest) = digits.split_at(3);
        let (exchange, line) = rest.split_at(3);
        let rendered = match self {
            PhoneFormat::Parenthesized => format!("({area}) {exchange}-{line}"),
            PhoneFormat::Hyphenated => format!("{area}-{exchange}-{line}"),
            PhoneFormat::E164 => format!("+1{digits}"),
            PhoneFormat::DigitsOnly => digits.to_string(),
        };
        Some(rendered)
    }

    /// Classify a rendered phone number.
    pub fn detect(value: &str) -> Option<PhoneFormat> {
        PhoneFormat::ALL.into_iter().find(|format| {
            let digits = national_digits(value);
            digits.len() == 10 && format.render(&digits).as_deref() == Some(value)
        })
    }
}

/// Strip formatting and the `+1` country prefix.
pub fn national_digits(value: &str) -> String {
    let digits: String = value.chars().filter(|ch| ch.is_ascii_digit()).collect();
    if value.starts_with("+1") && digits.len() == 11 {
        digits[1..].to_string()
    } else {
        digits
    }
}
