//! Registered factories.

use serde::{Deserialize, Serialize};

use crate::lenient;
use crate::record::{EntityKind, FieldMap, Record, Stored};
use crate::validate::{self, ValidationError};
use crate::view::{DetailSection, DetailView, Tabular};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Factory {
    #[serde(default, deserialize_with = "lenient::string")]
    pub no: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub factoryname: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub factoryname_en: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub sector: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub village: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub commune: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub district: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub province: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub address: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub total_workers: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub female_workers: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub admin_name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub admin_phone: String,
    /// Server fields with no typed counterpart, kept for export.
    #[serde(flatten)]
    pub extra: FieldMap,
}

impl Record for Factory {
    const KIND: EntityKind = EntityKind::Factory;

    fn validate(&self) -> Result<(), ValidationError> {
        validate::require(&[
            ("no", self.no.as_str()),
            ("factoryname", self.factoryname.as_str()),
            ("factoryname_en", self.factoryname_en.as_str()),
            ("sector", self.sector.as_str()),
        ])
    }
}

impl Tabular for Factory {
    const COLUMNS: &'static [&'static str] = &[
        "no",
        "factoryname",
        "factoryname_en",
        "sector",
        "village",
        "commune",
        "district",
        "province",
        "total_workers",
        "female_workers",
    ];

    fn cells(&self) -> Vec<String> {
        vec![
            self.no.clone(),
            self.factoryname.clone(),
            self.factoryname_en.clone(),
            self.sector.clone(),
            self.village.clone(),
            self.commune.clone(),
            self.district.clone(),
            self.province.clone(),
            self.total_workers.clone(),
            self.female_workers.clone(),
        ]
    }

    fn detail(stored: &Stored<Self>) -> DetailView {
        let f = &stored.record;
        DetailView {
            title: format!("{} {}", f.no, f.factoryname),
            sections: vec![
                DetailSection::new(
                    "Identity",
                    vec![
                        ("no", f.no.clone()),
                        ("factoryname", f.factoryname.clone()),
                        ("factoryname_en", f.factoryname_en.clone()),
                        ("sector", f.sector.clone()),
                    ],
                ),
                DetailSection::new(
                    "Location",
                    vec![
                        ("village", f.village.clone()),
                        ("commune", f.commune.clone()),
                        ("district", f.district.clone()),
                        ("province", f.province.clone()),
                        ("address", f.address.clone()),
                    ],
                ),
                DetailSection::new(
                    "Workforce",
                    vec![
                        ("total_workers", f.total_workers.clone()),
                        ("female_workers", f.female_workers.clone()),
                        ("admin_name", f.admin_name.clone()),
                        ("admin_phone", f.admin_phone.clone()),
                    ],
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_counts_become_text() {
        let f: Factory = serde_json::from_value(json!({
            "no": "F-01",
            "factoryname": "រោងចក្រ ក",
            "total_workers": 350,
            "female_workers": 210,
            "admin_phone": null
        }))
        .unwrap();
        assert_eq!(f.total_workers, "350");
        assert_eq!(f.female_workers, "210");
        assert_eq!(f.admin_phone, "");
    }

    #[test]
    fn required_fields() {
        let err = Factory::default().validate().unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingFields(vec!["no", "factoryname", "factoryname_en", "sector"])
        );
    }

    #[test]
    fn cells_match_columns() {
        assert_eq!(Factory::default().cells().len(), Factory::COLUMNS.len());
    }
}
