use crate::domain::date_resolver::{DateLike, DateResolver};
use crate::domain::unit_converter::{round_to_hundredths, WeightUnit};
use common::domain::{DomainError, DomainResult, MeasurementRecord};
use serde::Deserialize;
use tracing::debug;

const FAT_PERCENT_RANGE: std::ops::RangeInclusive<f64> = 0.0..=100.0;

/// Loosely typed field as it arrives from the scale
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum FieldValue {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

/// The recognised subset of an openScale measurement payload
///
/// Unknown keys are ignored; `null` and missing keys are both `None`.
#[derive(Debug, Deserialize)]
struct ScalePayload {
    date: Option<FieldValue>,
    timestamp: Option<FieldValue>,
    ts: Option<FieldValue>,
    weight: Option<FieldValue>,
    weight_kg: Option<FieldValue>,
    unit: Option<FieldValue>,
    fat: Option<FieldValue>,
}

/// Turns raw scale payloads into canonical measurement records
#[derive(Debug, Clone)]
pub struct PayloadNormalizer {
    date_resolver: DateResolver,
}

impl PayloadNormalizer {
    pub fn new(date_resolver: DateResolver) -> Self {
        Self { date_resolver }
    }

    /// Parse and normalize one payload
    ///
    /// # Errors
    /// * `ParseError` - not a JSON object, no weight, bad date, fat outside 0-100,
    ///   or a weight that overflows once converted
    /// * `ConversionError` - a numeric field that cannot be read as a number
    pub fn normalize(&self, raw: &str) -> DomainResult<MeasurementRecord> {
        let malformed = |reason: String| DomainError::ParseError(format!("malformed payload: {}", reason));

        let value: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| malformed(e.to_string()))?;
        if !value.is_object() {
            return Err(malformed("expected a JSON object".to_string()));
        }
        let payload: ScalePayload =
            serde_json::from_value(value).map_err(|e| malformed(e.to_string()))?;

        let date_like = date_like(&payload)?;
        let date = self.date_resolver.resolve(&date_like)?;
        let weight_kg = round_to_hundredths(weight_in_kilograms(&payload)?);
        let weight_kg = ensure_finite("weight", weight_kg)?;
        let fat_fraction = fat_fraction(&payload)?
            .map(|fraction| ensure_finite("fat", fraction))
            .transpose()?;

        debug!(
            date_source = ?date_like,
            %date,
            weight_kg,
            fat_fraction = ?fat_fraction,
            "normalized payload"
        );

        Ok(MeasurementRecord {
            date,
            weight_kg,
            fat_fraction,
        })
    }
}

/// First present of `date`, `timestamp`, `ts`
///
/// `timestamp` and `ts` are numeric fields, so numeric strings there are
/// epoch seconds; any other string is still tried as ISO-8601.
fn date_like(payload: &ScalePayload) -> DomainResult<DateLike> {
    let candidates = [
        ("date", &payload.date),
        ("timestamp", &payload.timestamp),
        ("ts", &payload.ts),
    ];

    let Some((field, value)) = candidates
        .into_iter()
        .find_map(|(field, value)| value.as_ref().filter(|v| !is_blank(v)).map(|v| (field, v)))
    else {
        return Ok(DateLike::Absent);
    };

    match value {
        FieldValue::Number(seconds) => Ok(DateLike::EpochSeconds(*seconds)),
        FieldValue::Text(text) if field != "date" => match parse_number(text) {
            Some(seconds) => Ok(DateLike::EpochSeconds(seconds)),
            None => Ok(DateLike::Iso(text.clone())),
        },
        FieldValue::Text(text) => Ok(DateLike::Iso(text.clone())),
        FieldValue::Other(other) => Err(DomainError::ParseError(format!(
            "unsupported {} value: {}",
            field, other
        ))),
    }
}

/// `weight_kg` wins over `weight`; `unit` applies to whichever was picked
fn weight_in_kilograms(payload: &ScalePayload) -> DomainResult<f64> {
    let (field, value) = match (&payload.weight_kg, &payload.weight) {
        (Some(value), _) => ("weight_kg", value),
        (None, Some(value)) => ("weight", value),
        (None, None) => return Err(DomainError::ParseError("missing weight".to_string())),
    };

    let unit = match &payload.unit {
        Some(FieldValue::Text(label)) => WeightUnit::from_label(Some(label)),
        _ => WeightUnit::Kilograms,
    };

    Ok(unit.to_kilograms(coerce_number(field, value)?))
}

fn fat_fraction(payload: &ScalePayload) -> DomainResult<Option<f64>> {
    let Some(value) = &payload.fat else {
        return Ok(None);
    };

    let percent = coerce_number("fat", value)?;
    if !FAT_PERCENT_RANGE.contains(&percent) {
        return Err(DomainError::ParseError(format!(
            "fat reading {} is outside 0-100 percent",
            percent
        )));
    }

    Ok(Some(round_to_hundredths(percent / 100.0)))
}

fn coerce_number(field: &str, value: &FieldValue) -> DomainResult<f64> {
    match value {
        FieldValue::Number(number) => Ok(*number),
        FieldValue::Text(text) => parse_number(text).ok_or_else(|| DomainError::ConversionError {
            field: field.to_string(),
            reason: format!("'{}' is not a number", text),
        }),
        FieldValue::Other(other) => Err(DomainError::ConversionError {
            field: field.to_string(),
            reason: format!("expected a number, got {}", other),
        }),
    }
}

fn ensure_finite(field: &str, value: f64) -> DomainResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DomainError::ParseError(format!(
            "{} is out of range after conversion",
            field
        )))
    }
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

fn is_blank(value: &FieldValue) -> bool {
    matches!(value, FieldValue::Text(text) if text.trim().is_empty())
}
