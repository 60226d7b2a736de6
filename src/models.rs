use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub type Id = i64;

/// The four registered categories of Qur'an education institutions.
///
/// The serialized form is a short identity code; the official name used in
/// exports and selectors comes from [`InstitutionType::label`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub enum InstitutionType {
    #[serde(rename = "TPQ")]
    Tpq,
    #[serde(rename = "MDT")]
    Mdt,
    #[serde(rename = "RTQ")]
    Rtq,
    #[serde(rename = "PAUDQU")]
    Paudqu,
}

impl InstitutionType {
    /// Canonical enumeration order. Histograms and selectors follow it.
    pub const ALL: [InstitutionType; 4] = [
        InstitutionType::Tpq,
        InstitutionType::Mdt,
        InstitutionType::Rtq,
        InstitutionType::Paudqu,
    ];

    pub fn code(self) -> &'static str {
        match self {
            InstitutionType::Tpq => "TPQ",
            InstitutionType::Mdt => "MDT",
            InstitutionType::Rtq => "RTQ",
            InstitutionType::Paudqu => "PAUDQU",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            InstitutionType::Tpq => "TPQ/TPA",
            InstitutionType::Mdt => "Madrasah Diniyah Takmiliyah (MDT)",
            InstitutionType::Rtq => "Rumah Tahfidz Al Qur'an (RTQ)",
            InstitutionType::Paudqu => "PAUDQU",
        }
    }
}

impl Default for InstitutionType {
    fn default() -> Self {
        InstitutionType::ALL[0]
    }
}

impl fmt::Display for InstitutionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown institution type: {0}")]
pub struct ParseInstitutionTypeError(pub String);

impl FromStr for InstitutionType {
    type Err = ParseInstitutionTypeError;

    /// Accepts either the identity code (any case) or the exact official label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        InstitutionType::ALL
            .into_iter()
            .find(|t| t.code().eq_ignore_ascii_case(s) || t.label() == s)
            .ok_or_else(|| ParseInstitutionTypeError(s.to_string()))
    }
}

/// One monthly submission from one institution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InstitutionReport {
    pub id: Id,
    pub institution_type: InstitutionType,
    pub institution_name: String,
    pub address: String,
    pub operator_name: String,
    pub supervisor_name: String,
    #[serde(default)]
    pub phone: String,
    pub permit_number: String,
    #[serde(default, deserialize_with = "lenient_count::deserialize")]
    pub male_students: u32,
    #[serde(default, deserialize_with = "lenient_count::deserialize")]
    pub female_students: u32,
    /// `YYYY-MM`
    pub report_month: String,
}

/// A report payload without an assigned id, pending validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportDraft {
    pub institution_type: InstitutionType,
    pub institution_name: String,
    pub address: String,
    pub operator_name: String,
    pub supervisor_name: String,
    pub phone: String,
    pub permit_number: String,
    #[serde(deserialize_with = "lenient_count::deserialize")]
    pub male_students: u32,
    #[serde(deserialize_with = "lenient_count::deserialize")]
    pub female_students: u32,
    pub report_month: String,
}

impl ReportDraft {
    pub fn into_report(self, id: Id) -> InstitutionReport {
        InstitutionReport {
            id,
            institution_type: self.institution_type,
            institution_name: self.institution_name,
            address: self.address,
            operator_name: self.operator_name,
            supervisor_name: self.supervisor_name,
            phone: self.phone,
            permit_number: self.permit_number,
            male_students: self.male_students,
            female_students: self.female_students,
            report_month: self.report_month,
        }
    }
}

impl From<InstitutionReport> for ReportDraft {
    fn from(r: InstitutionReport) -> Self {
        ReportDraft {
            institution_type: r.institution_type,
            institution_name: r.institution_name,
            address: r.address,
            operator_name: r.operator_name,
            supervisor_name: r.supervisor_name,
            phone: r.phone,
            permit_number: r.permit_number,
            male_students: r.male_students,
            female_students: r.female_students,
            report_month: r.report_month,
        }
    }
}

impl InstitutionReport {
    pub fn total_students(&self) -> u64 {
        u64::from(self.male_students) + u64::from(self.female_students)
    }
}

/// Metadata for one uploaded file. Unrelated to reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppFile {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub size: u64,
    /// Session-scoped download path for the stored bytes.
    pub url: String,
    /// Hex SHA-256 of the uploaded bytes.
    pub checksum: String,
}

impl AppFile {
    pub fn content_url(id: &str) -> String {
        format!("/api/v1/files/{}/content", urlencoding::encode(id))
    }
}

/// Upload metadata handed to the registry; the registry assigns id and url.
#[derive(Debug, Clone)]
pub struct NewFile {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    /// Milliseconds since the epoch.
    pub last_modified: i64,
    pub checksum: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TypeCount {
    pub institution_type: InstitutionType,
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_institutions: usize,
    pub total_male_students: u64,
    pub total_female_students: u64,
    pub total_students: u64,
    pub institution_type_histogram: Vec<TypeCount>,
}

/// Student counts arrive from form inputs; anything that is not a
/// non-negative integer becomes 0 instead of failing the whole payload.
mod lenient_count {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use crate::validate::parse_count;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u32, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::Number(n)) => match (n.as_u64(), n.as_f64()) {
                (Some(v), _) => u32::try_from(v).unwrap_or(u32::MAX),
                (None, Some(f)) if f.is_finite() && f > 0.0 => f.trunc().min(u32::MAX as f64) as u32,
                _ => 0,
            },
            Some(Value::String(s)) => parse_count(&s),
            _ => 0,
        })
    }
}
