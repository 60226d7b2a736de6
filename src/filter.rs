//! Search and filter over the report list. Everything here is a pure function
//! of its inputs and preserves store order.

use std::collections::BTreeSet;

use serde::Deserialize;
use utoipa::IntoParams;

use crate::models::{InstitutionReport, InstitutionType};

/// The selector value that disables a filter.
pub const WILDCARD: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TypeFilter {
    #[default]
    All,
    Only(InstitutionType),
    /// A selector value naming no known type. Matches nothing.
    Unknown(String),
}

impl TypeFilter {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => TypeFilter::All,
            Some(s) if s.eq_ignore_ascii_case(WILDCARD) => TypeFilter::All,
            Some(s) => s.parse().map(TypeFilter::Only).unwrap_or_else(|_| TypeFilter::Unknown(s.to_string())),
        }
    }

    fn matches(&self, t: InstitutionType) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Only(wanted) => *wanted == t,
            TypeFilter::Unknown(_) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MonthFilter {
    #[default]
    All,
    Only(String),
}

impl MonthFilter {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => MonthFilter::All,
            Some(s) if s.eq_ignore_ascii_case(WILDCARD) => MonthFilter::All,
            Some(s) => MonthFilter::Only(s.to_string()),
        }
    }

    fn matches(&self, month: &str) -> bool {
        match self {
            MonthFilter::All => true,
            MonthFilter::Only(wanted) => wanted == month,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReportQuery {
    pub search: String,
    pub institution_type: TypeFilter,
    pub month: MonthFilter,
}

/// Raw query-string form of [`ReportQuery`].
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportQueryParams {
    /// Case-insensitive substring of the institution name.
    pub search: Option<String>,
    /// Institution type code or label, or `all`.
    #[serde(rename = "type")]
    pub institution_type: Option<String>,
    /// `YYYY-MM`, or `all`.
    pub month: Option<String>,
}

impl From<ReportQueryParams> for ReportQuery {
    fn from(p: ReportQueryParams) -> Self {
        ReportQuery {
            search: p.search.unwrap_or_default(),
            institution_type: TypeFilter::parse(p.institution_type.as_deref()),
            month: MonthFilter::parse(p.month.as_deref()),
        }
    }
}

impl ReportQuery {
    pub fn matches(&self, report: &InstitutionReport) -> bool {
        name_matches(&report.institution_name, &self.search)
            && self.institution_type.matches(report.institution_type)
            && self.month.matches(&report.report_month)
    }

    pub fn apply(&self, reports: &[InstitutionReport]) -> Vec<InstitutionReport> {
        reports.iter().filter(|r| self.matches(r)).cloned().collect()
    }
}

fn name_matches(name: &str, needle: &str) -> bool {
    needle.is_empty() || name.to_lowercase().contains(&needle.to_lowercase())
}

/// Distinct report months, newest first.
pub fn month_options(reports: &[InstitutionReport]) -> Vec<String> {
    let months: BTreeSet<&str> = reports.iter().map(|r| r.report_month.as_str()).collect();
    months.into_iter().rev().map(str::to_string).collect()
}
