/// International avoirdupois pound, exact by definition
pub const KILOGRAMS_PER_POUND: f64 = 0.45359237;

const POUND_LABELS: [&str; 4] = ["lb", "lbs", "pound", "pounds"];

/// Convert pounds to kilograms without rounding
pub fn pounds_to_kilograms(pounds: f64) -> f64 {
    pounds * KILOGRAMS_PER_POUND
}

/// Round to two decimal places from the exact binary value
///
/// `84.755` is stored as `84.75499999...` and rounds down. Scaling by 100
/// first would round it up. Non-finite values pass through unchanged.
pub fn round_to_hundredths(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{:.2}", value).parse().unwrap_or(value)
}

/// Unit a weight reading is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightUnit {
    Kilograms,
    Pounds,
}

impl WeightUnit {
    /// Anything that is not a pound label, including no label at all, is kilograms
    pub fn from_label(label: Option<&str>) -> Self {
        match label {
            Some(label) if is_pound_label(label) => WeightUnit::Pounds,
            _ => WeightUnit::Kilograms,
        }
    }

    pub fn to_kilograms(self, value: f64) -> f64 {
        match self {
            WeightUnit::Kilograms => value,
            WeightUnit::Pounds => pounds_to_kilograms(value),
        }
    }
}

fn is_pound_label(label: &str) -> bool {
    let label = label.trim();
    POUND_LABELS
        .iter()
        .any(|pound| pound.eq_ignore_ascii_case(label))
}
