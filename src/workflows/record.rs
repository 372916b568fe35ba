use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::auth::ProviderNumber;

/// Provider data as returned by the (mock) CAQH and NPI registry lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderRecord {
    pub npi: ProviderNumber,
    pub first_name: String,
    pub last_name: String,
    pub specialty: String,
    pub license_number: String,
    pub license_state: String,
    pub dea_number: String,
    pub medical_school: String,
    pub residency: String,
    pub board_certification: String,
    pub status: String,
    pub last_updated: NaiveDate,
}

impl ProviderRecord {
    /// Fixed demo record for the given provider number.
    pub fn demo(npi: &ProviderNumber) -> Self {
        Self {
            npi: npi.clone(),
            first_name: "Dr. Sarah".to_string(),
            last_name: "Johnson".to_string(),
            specialty: "Internal Medicine".to_string(),
            license_number: "MD12345".to_string(),
            license_state: "CA".to_string(),
            dea_number: "BJ1234567".to_string(),
            medical_school: "University of California, San Francisco".to_string(),
            residency: "UCSF Medical Center".to_string(),
            board_certification: "American Board of Internal Medicine".to_string(),
            status: "Active".to_string(),
            last_updated: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap_or_default(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn license(&self) -> String {
        format!("{} ({})", self.license_number, self.license_state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn npi() -> ProviderNumber {
        ProviderNumber::parse("1234567890").unwrap()
    }

    #[test]
    fn test_demo_record_is_seeded_with_provider_number() {
        let record = ProviderRecord::demo(&npi());

        assert_eq!(record.npi.as_str(), "1234567890");
        assert_eq!(record.full_name(), "Dr. Sarah Johnson");
        assert_eq!(record.license(), "MD12345 (CA)");
        assert_eq!(record.last_updated.to_string(), "2024-01-15");
    }

    #[test]
    fn test_record_serializes_in_camel_case() {
        let json = serde_json::to_value(ProviderRecord::demo(&npi())).unwrap();

        assert_eq!(json["npi"], "1234567890");
        assert_eq!(json["boardCertification"], "American Board of Internal Medicine");
        assert_eq!(json["lastUpdated"], "2024-01-15");
    }
}
