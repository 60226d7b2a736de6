use padaelo::models::{InstitutionType, NewFile, ReportDraft};
use padaelo::repo::inmem::InMemRepo;
use padaelo::repo::{FileRepo, RepoError, ReportRepo};
use padaelo::seed::demo_reports;

fn draft(name: &str) -> ReportDraft {
    ReportDraft {
        institution_type: InstitutionType::Tpq,
        institution_name: name.into(),
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

fn new_file(name: &str, last_modified: i64) -> NewFile {
    NewFile {
        name: name.into(),
        mime_type: "application/pdf".into(),
        size: 8,
        last_modified,
        checksum: "00".into(),
    }
}

#[tokio::test]
async fn add_prepends_with_fresh_unique_ids() {
    let r = InMemRepo::with_reports(demo_reports());
    let before = r.list_reports().await.unwrap().len();

    let first = r.add_report(draft("TPQ Nurul Iman")).await.unwrap();
    let second = r.add_report(draft("TPQ Nurul Iman")).await.unwrap();

    let all = r.list_reports().await.unwrap();
    assert_eq!(all.len(), before + 2);
    assert_eq!(all[0].id, second.id);
    assert_eq!(all[1].id, first.id);
    assert!(second.id > first.id);
    assert_eq!(ReportDraft::from(all[1].clone()), draft("TPQ Nurul Iman"));

    let mut ids: Vec<_> = all.iter().map(|r| r.id).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), all.len());
}

#[tokio::test]
async fn ids_stay_above_seeded_ids() {
    let mut seeded = demo_reports();
    seeded[0].id = i64::MAX / 2;
    let r = InMemRepo::with_reports(seeded);
    let added = r.add_report(draft("RTQ Baru")).await.unwrap();
    assert_eq!(added.id, i64::MAX / 2 + 1);
}

#[tokio::test]
async fn update_replaces_in_place() {
    let r = InMemRepo::with_reports(demo_reports());
    let before = r.list_reports().await.unwrap();
    let mut target = before[2].clone();
    target.institution_name = "Rumah Tahfidz Darul Qur'an Samata".into();
    target.male_students = 99;

    r.update_report(target.clone()).await.unwrap();

    let after = r.list_reports().await.unwrap();
    assert_eq!(after.len(), before.len());
    assert_eq!(after[2], target);
    assert_eq!(after[1], before[1]);
    assert_eq!(after[3], before[3]);
}

#[tokio::test]
async fn update_unknown_id_is_not_found_and_changes_nothing() {
    let r = InMemRepo::with_reports(demo_reports());
    let before = r.list_reports().await.unwrap();
    let err = r.update_report(draft("X").into_report(42)).await.unwrap_err();
    assert!(matches!(err, RepoError::NotFound));
    assert_eq!(r.list_reports().await.unwrap(), before);
}

#[tokio::test]
async fn remove_shrinks_only_when_present() {
    let r = InMemRepo::with_reports(demo_reports());
    let before = r.list_reports().await.unwrap();

    assert!(!r.remove_report(42).await.unwrap());
    assert_eq!(r.list_reports().await.unwrap().len(), before.len());

    assert!(r.remove_report(before[0].id).await.unwrap());
    let after = r.list_reports().await.unwrap();
    assert_eq!(after.len(), before.len() - 1);
    assert!(after.iter().all(|x| x.id != before[0].id));
    assert!(matches!(r.get_report(before[0].id).await, Err(RepoError::NotFound)));
}

#[tokio::test]
async fn clones_share_state() {
    let r = InMemRepo::new();
    let other = r.clone();
    r.add_report(draft("MDT Al Ikhlas")).await.unwrap();
    assert_eq!(other.list_reports().await.unwrap().len(), 1);
}

#[tokio::test]
async fn files_append_in_batch_order() {
    let r = InMemRepo::new();
    r.add_files(vec![new_file("izin.pdf", 1)]).await.unwrap();
    let added = r.add_files(vec![new_file("foto.png", 2), new_file("akta.pdf", 3)]).await.unwrap();
    assert_eq!(added.len(), 2);

    let names: Vec<_> = r.list_files().await.unwrap().into_iter().map(|f| f.name).collect();
    assert_eq!(names, vec!["izin.pdf", "foto.png", "akta.pdf"]);
    assert_eq!(added[0].id, "foto.png-2");
    assert_eq!(added[0].url, "/api/v1/files/foto.png-2/content");
}

#[tokio::test]
async fn colliding_file_ids_are_disambiguated() {
    let r = InMemRepo::new();
    let added = r
        .add_files(vec![new_file("izin.pdf", 5), new_file("izin.pdf", 5), new_file("izin.pdf", 5)])
        .await
        .unwrap();
    let ids: Vec<_> = added.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, vec!["izin.pdf-5", "izin.pdf-5-2", "izin.pdf-5-3"]);
}

#[tokio::test]
async fn remove_file_is_noop_when_absent() {
    let r = InMemRepo::new();
    r.add_files(vec![new_file("a.png", 1), new_file("b.png", 2)]).await.unwrap();

    assert!(r.remove_file("missing").await.unwrap().is_none());
    let removed = r.remove_file("a.png-1").await.unwrap().unwrap();
    assert_eq!(removed.name, "a.png");

    let left = r.list_files().await.unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].id, "b.png-2");
}
