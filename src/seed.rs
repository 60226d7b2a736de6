//! Demonstration data loaded into the report store at startup.

use crate::models::{InstitutionReport, InstitutionType};

#[allow(clippy::too_many_arguments)]
fn report(
    id: i64,
    institution_type: InstitutionType,
    institution_name: &str,
    address: &str,
    operator_name: &str,
    supervisor_name: &str,
    phone: &str,
    permit_number: &str,
    male_students: u32,
    female_students: u32,
    report_month: &str,
) -> InstitutionReport {
    InstitutionReport {
        id,
        institution_type,
        institution_name: institution_name.into(),
        address: address.into(),
        operator_name: operator_name.into(),
        supervisor_name: supervisor_name.into(),
        phone: phone.into(),
        permit_number: permit_number.into(),
        male_students,
        female_students,
        report_month: report_month.into(),
    }
}

/// Newest first, matching store order.
pub fn demo_reports() -> Vec<InstitutionReport> {
    vec![
        report(
            1717200000005,
            InstitutionType::Tpq,
            "TPQ Nurul Iman",
            "Jl. Poros Malino No. 12, Pallangga",
            "Ahmad Fauzi",
            "H. Muh. Saleh",
            "081234567890",
            "Kd.21.06/5/PP.00/0112/2019",
            25,
            30,
            "2024-06",
        ),
        report(
            1717200000004,
            InstitutionType::Mdt,
            "MDT Al Ikhlas Sungguminasa",
            "Jl. Masjid Raya No. 3, Somba Opu",
            "Nurhayati",
            "Drs. Abd. Rahman",
            "085299887766",
            "Kd.21.06/5/PP.00/0213/2020",
            40,
            38,
            "2024-06",
        ),
        report(
            1714521600003,
            InstitutionType::Rtq,
            "Rumah Tahfidz Darul Qur'an",
            "Perumahan Griya Samata Blok C/7, Somba Opu",
            "Ustadz Ilham",
            "KH. Muh. Yusuf",
            "",
            "Kd.21.06/5/PP.00/0318/2021",
            18,
            22,
            "2024-05",
        ),
        report(
            1714521600002,
            InstitutionType::Paudqu,
            "PAUDQU Al Amin Bontomarannu",
            "Jl. Poros Bontomarannu Km. 4",
            "Sitti Aminah",
            "Hj. Rahmawati",
            "082345678901",
            "Kd.21.06/5/PP.00/0420/2022",
            12,
            15,
            "2024-05",
        ),
        report(
            1711929600001,
            InstitutionType::Tpq,
            "TPA Babul Jannah Parangloe",
            "Desa Lanna, Parangloe",
            "Muh. Arsyad",
            "H. Baharuddin",
            "081355501234",
            "Kd.21.06/5/PP.00/0521/2018",
            20,
            17,
            "2024-04",
        ),
    ]
}
