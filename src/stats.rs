use crate::models::{DashboardStats, InstitutionReport, InstitutionType, TypeCount};

/// Dashboard statistics over the whole store, independent of any active filter.
pub fn dashboard_stats(reports: &[InstitutionReport]) -> DashboardStats {
    let total_male_students: u64 = reports.iter().map(|r| u64::from(r.male_students)).sum();
    let total_female_students: u64 = reports.iter().map(|r| u64::from(r.female_students)).sum();

    let institution_type_histogram = InstitutionType::ALL
        .into_iter()
        .map(|t| TypeCount {
            institution_type: t,
            label: t.label().to_string(),
            count: reports.iter().filter(|r| r.institution_type == t).count(),
        })
        .collect();

    DashboardStats {
        total_institutions: reports.len(),
        total_male_students,
        total_female_students,
        total_students: total_male_students + total_female_students,
        institution_type_histogram,
    }
}
