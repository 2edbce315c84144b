use common::domain::{AttributeNames, AttributeUpdate, MeasurementRecord};

/// Map a record to its attribute updates: weight first, then fat when present
pub fn to_updates(record: &MeasurementRecord, names: &AttributeNames) -> Vec<AttributeUpdate> {
    let weight = AttributeUpdate {
        name: names.weight.clone(),
        date: record.date,
        value: record.weight_kg,
    };

    let fat = record.fat_fraction.map(|fraction| AttributeUpdate {
        name: names.fat.clone(),
        date: record.date,
        value: fraction,
    });

    std::iter::once(weight).chain(fat).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(fat_fraction: Option<f64>) -> MeasurementRecord {
        MeasurementRecord {
            date: NaiveDate::from_ymd_opt(2025, 11, 4).unwrap(),
            weight_kg: 84.59,
            fat_fraction,
        }
    }

    #[test]
    fn test_weight_only() {
        let updates = to_updates(&record(None), &AttributeNames::default());
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].name, "weight");
        assert_eq!(updates[0].value, 84.59);
    }

    #[test]
    fn test_weight_then_fat_share_date() {
        let updates = to_updates(&record(Some(0.24)), &AttributeNames::default());
        assert_eq!(
            updates,
            vec![
                AttributeUpdate {
                    name: "weight".to_string(),
                    date: NaiveDate::from_ymd_opt(2025, 11, 4).unwrap(),
                    value: 84.59,
                },
                AttributeUpdate {
                    name: "body_fat".to_string(),
                    date: NaiveDate::from_ymd_opt(2025, 11, 4).unwrap(),
                    value: 0.24,
                },
            ]
        );
    }

    #[test]
    fn test_configured_names() {
        let names = AttributeNames {
            weight: "scale_weight".to_string(),
            fat: "scale_fat".to_string(),
        };
        let updates = to_updates(&record(Some(0.3)), &names);
        assert_eq!(updates[0].name, "scale_weight");
        assert_eq!(updates[1].name, "scale_fat");
    }
}
