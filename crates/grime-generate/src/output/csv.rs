use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::errors::GenerationError;

/// Comma separated values with a header row taken from the record's fields.
pub fn encode_records<T: Serialize>(records: &[T]) -> Result<Vec<u8>, GenerationError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(Vec::new());
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    writer
        .into_inner()
        .map_err(|err| GenerationError::Io(err.into_error()))
}

pub fn decode_records<T: DeserializeOwned>(data: &[u8]) -> Result<Vec<T>, GenerationError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(data);
    let mut records = Vec::new();
    for record in reader.deserialize() {
        records.push(record?);
    }
    Ok(records)
}

/// Header row of an encoded file.
pub fn header(data: &[u8]) -> Result<Vec<String>, GenerationError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(data);
    Ok(reader.headers()?.iter().map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use grime_core::{CrmUser, DatasetKind, PlanTier};

    use super::*;

    fn user(phone: &str, state: &str) -> CrmUser {
        CrmUser {
            user_id: "0b6f5a4e-0000-4000-8000-000000000001".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.test".to_string(),
            phone: phone.to_string(),
            state: state.to_string(),
            city: "Springfield".to_string(),
            signup_date: NaiveDate::from_ymd_opt(2021, 5, 17).expect("date"),
            plan_tier: PlanTier::Enterprise,
        }
    }

    #[test]
    fn header_matches_field_order() {
        let data = encode_records(&[user("(555) 123-4567", "NY")]).expect("encode");
        assert_eq!(header(&data).expect("header"), DatasetKind::Users.fields());
    }

    #[test]
    fn phone_formats_and_full_state_names_survive() {
        let users = vec![
            user("(555) 123-4567", "New York"),
            user("+15551234567", "NY"),
            user("5551234567", "North Carolina"),
        ];
        let data = encode_records(&users).expect("encode");
        let text = std::str::from_utf8(&data).expect("utf8");
        assert!(text.contains(",2021-05-17,enterprise"));
        let decoded: Vec<CrmUser> = decode_records(&data).expect("decode");
        assert_eq!(decoded, users);
    }
}
