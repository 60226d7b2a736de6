//! Report form validation and the add/edit form state machine.

use std::collections::BTreeMap;

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Id, InstitutionReport, InstitutionType, ReportDraft};

static DIGITS_ONLY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+$").expect("static regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum FormField {
    InstitutionType,
    InstitutionName,
    Address,
    OperatorName,
    SupervisorName,
    Phone,
    PermitNumber,
    MaleStudents,
    FemaleStudents,
    ReportMonth,
}

/// Field → human readable message. Empty means the draft is acceptable.
pub type FieldErrors = BTreeMap<FormField, String>;

/// Runs every rule against the draft; all failing fields are reported together.
pub fn validate_draft(draft: &ReportDraft) -> FieldErrors {
    let mut errors = FieldErrors::new();
    let required = [
        (FormField::InstitutionName, &draft.institution_name, "Nama lembaga tidak boleh kosong."),
        (FormField::Address, &draft.address, "Alamat lembaga tidak boleh kosong."),
        (FormField::OperatorName, &draft.operator_name, "Nama operator tidak boleh kosong."),
        (FormField::SupervisorName, &draft.supervisor_name, "Nama pembina tidak boleh kosong."),
        (FormField::PermitNumber, &draft.permit_number, "Nomor izin operasional tidak boleh kosong."),
    ];
    for (field, value, message) in required {
        if value.trim().is_empty() {
            errors.insert(field, message.to_string());
        }
    }
    if !draft.phone.is_empty() && !DIGITS_ONLY.is_match(&draft.phone) {
        errors.insert(FormField::Phone, "No. handphone harus berupa angka.".to_string());
    }
    errors
}

/// Parses a user-entered student count. Leading digits are taken, anything
/// else (empty, negative, non-numeric) yields 0.
pub fn parse_count(input: &str) -> u32 {
    let s = input.trim();
    let s = s.strip_prefix('+').unwrap_or(s);
    let digits: &str = match s.find(|c: char| !c.is_ascii_digit()) {
        Some(end) => &s[..end],
        None => s,
    };
    if digits.is_empty() {
        return 0;
    }
    digits.parse::<u64>().map(|v| v.min(u64::from(u32::MAX)) as u32).unwrap_or(u32::MAX)
}

/// `YYYY-MM` for the current UTC calendar month.
pub fn current_month() -> String {
    Utc::now().format("%Y-%m").to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "id")]
pub enum FormMode {
    Create,
    Edit(Id),
}

/// What an accepted form hands to the report store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Create(ReportDraft),
    Update(InstitutionReport),
}

/// Add/edit form. Clean while `errors` is empty, has-errors otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportForm {
    mode: FormMode,
    draft: ReportDraft,
    errors: FieldErrors,
}

impl ReportForm {
    pub fn open_new() -> Self {
        Self::open_new_at(current_month())
    }

    /// Fresh form with the fixed defaults and the given report month.
    pub fn open_new_at(report_month: impl Into<String>) -> Self {
        Self {
            mode: FormMode::Create,
            draft: ReportDraft {
                institution_type: InstitutionType::default(),
                report_month: report_month.into(),
                ..ReportDraft::default()
            },
            errors: FieldErrors::new(),
        }
    }

    pub fn open_edit(report: &InstitutionReport) -> Self {
        Self {
            mode: FormMode::Edit(report.id),
            draft: ReportDraft::from(report.clone()),
            errors: FieldErrors::new(),
        }
    }

    /// Replaces the whole draft at once, as when a filled-in form arrives in
    /// one request. Pending errors are dropped like any other change.
    pub fn with_draft(mut self, draft: ReportDraft) -> Self {
        self.draft = draft;
        self.errors.clear();
        self
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn draft(&self) -> &ReportDraft {
        &self.draft
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Applies raw input to one field and drops that field's pending error.
    /// The value is not re-validated until the next submit.
    pub fn set_field(&mut self, field: FormField, value: &str) -> Result<(), crate::models::ParseInstitutionTypeError> {
        let d = &mut self.draft;
        match field {
            FormField::InstitutionType => d.institution_type = value.parse()?,
            FormField::InstitutionName => d.institution_name = value.to_string(),
            FormField::Address => d.address = value.to_string(),
            FormField::OperatorName => d.operator_name = value.to_string(),
            FormField::SupervisorName => d.supervisor_name = value.to_string(),
            FormField::Phone => d.phone = value.to_string(),
            FormField::PermitNumber => d.permit_number = value.to_string(),
            FormField::MaleStudents => d.male_students = parse_count(value),
            FormField::FemaleStudents => d.female_students = parse_count(value),
            FormField::ReportMonth => d.report_month = value.to_string(),
        }
        self.errors.remove(&field);
        Ok(())
    }

    /// Validates the current draft. On success the form stays clean and the
    /// submission is returned; otherwise the form moves to has-errors.
    pub fn submit(&mut self) -> Result<Submission, &FieldErrors> {
        self.errors = validate_draft(&self.draft);
        if !self.errors.is_empty() {
            return Err(&self.errors);
        }
        Ok(match self.mode {
            FormMode::Create => Submission::Create(self.draft.clone()),
            FormMode::Edit(id) => Submission::Update(self.draft.clone().into_report(id)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_draft() -> ReportDraft {
        ReportDraft {
            institution_type: InstitutionType::Tpq,
            institution_name: "TPQ Nurul Iman".into(),
            address: "Jl. A".into(),
            operator_name: "Budi".into(),
            supervisor_name: "Siti".into(),
            phone: String::new(),
            permit_number: "001".into(),
            male_students: 10,
            female_students: 8,
            report_month: "2024-05".into(),
        }
    }

    #[test]
    fn valid_draft_has_no_errors() {
        assert!(validate_draft(&valid_draft()).is_empty());
        let mut d = valid_draft();
        d.phone = "081234567890".into();
        assert!(validate_draft(&d).is_empty());
    }

    #[test]
    fn missing_name_reports_only_that_field() {
        let mut d = valid_draft();
        d.institution_name = "   ".into();
        let errors = validate_draft(&d);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[&FormField::InstitutionName], "Nama lembaga tidak boleh kosong.");
    }

    #[test]
    fn phone_with_separator_rejected() {
        let mut d = valid_draft();
        d.phone = "081-234".into();
        let errors = validate_draft(&d);
        assert_eq!(errors.keys().copied().collect::<Vec<_>>(), vec![FormField::Phone]);

        d.phone = "+6281234".into();
        assert!(validate_draft(&d).contains_key(&FormField::Phone));
    }

    #[test]
    fn all_failures_reported_together() {
        let errors = validate_draft(&ReportDraft::default());
        assert_eq!(
            errors.keys().copied().collect::<Vec<_>>(),
            vec![
                FormField::InstitutionName,
                FormField::Address,
                FormField::OperatorName,
                FormField::SupervisorName,
                FormField::PermitNumber,
            ]
        );
    }

    #[test]
    fn report_month_is_taken_as_entered() {
        let mut d = valid_draft();
        for month in ["2024-13", "2024-5", "", "Mei 2024"] {
            d.report_month = month.into();
            assert!(validate_draft(&d).is_empty(), "{month}");
        }
    }

    #[test]
    fn parse_count_defaults_to_zero() {
        assert_eq!(parse_count("42"), 42);
        assert_eq!(parse_count(" 7 "), 7);
        assert_eq!(parse_count("12abc"), 12);
        assert_eq!(parse_count(""), 0);
        assert_eq!(parse_count("abc"), 0);
        assert_eq!(parse_count("-5"), 0);
        assert_eq!(parse_count("99999999999999999999"), u32::MAX);
    }

    #[test]
    fn new_form_uses_fixed_defaults() {
        let form = ReportForm::open_new_at("2024-06");
        assert_eq!(form.mode(), FormMode::Create);
        assert_eq!(form.draft().institution_type, InstitutionType::Tpq);
        assert_eq!(form.draft().male_students, 0);
        assert_eq!(form.draft().report_month, "2024-06");
        assert!(form.is_clean());
        assert_eq!(ReportForm::open_new().draft().report_month.len(), 7);
    }

    #[test]
    fn failed_submit_then_edit_clears_field_error() {
        let mut form = ReportForm::open_new_at("2024-06");
        let errors = form.submit().unwrap_err().clone();
        assert!(errors.contains_key(&FormField::Address));
        assert!(!form.is_clean());

        form.set_field(FormField::Address, "Jl. Poros Malino").unwrap();
        assert!(!form.errors().contains_key(&FormField::Address));
        assert!(form.errors().contains_key(&FormField::InstitutionName));
    }

    #[test]
    fn edit_form_submits_update_with_same_id() {
        let report = valid_draft().into_report(77);
        let mut form = ReportForm::open_edit(&report);
        assert_eq!(form.draft(), &ReportDraft::from(report.clone()));
        form.set_field(FormField::MaleStudents, "x").unwrap();
        match form.submit() {
            Ok(Submission::Update(updated)) => {
                assert_eq!(updated.id, 77);
                assert_eq!(updated.male_students, 0);
            }
            other => panic!("unexpected submission: {other:?}"),
        }
    }

    #[test]
    fn filled_new_form_submits_create() {
        let mut form = ReportForm::open_new_at("2024-06").with_draft(valid_draft());
        assert_eq!(form.submit(), Ok(Submission::Create(valid_draft())));

        let mut blank = ReportForm::open_edit(&valid_draft().into_report(5)).with_draft(ReportDraft::default());
        assert_eq!(blank.submit().unwrap_err().len(), 5);
        assert_eq!(blank.mode(), FormMode::Edit(5));
    }

    #[test]
    fn set_field_rejects_unknown_type() {
        let mut form = ReportForm::open_new_at("2024-06");
        assert!(form.set_field(FormField::InstitutionType, "Pesantren").is_err());
        form.set_field(FormField::InstitutionType, "PAUDQU").unwrap();
        assert_eq!(form.draft().institution_type, InstitutionType::Paudqu);
    }
}
