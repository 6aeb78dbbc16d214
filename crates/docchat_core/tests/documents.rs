use docchat_core::db;
use docchat_core::documents::{
    document_id_for_filename, get_document, list_documents, upsert_document, DocumentRecord,
};
use pretty_assertions::assert_eq;

fn record(filename: &str, chunk_count: u32, uploaded_at: &str) -> DocumentRecord {
    DocumentRecord {
        document_id: document_id_for_filename(filename),
        filename: filename.to_string(),
        byte_len: 1024,
        chunk_count,
        uploaded_at: uploaded_at.to_string(),
    }
}

#[test]
fn upsert_then_get_roundtrips() {
    let mut conn = db::open_in_memory().expect("open");
    db::migrate(&mut conn).expect("migrate");

    let rec = record("report.pdf", 7, "2026-02-10T00:00:00Z");
    upsert_document(&conn, &rec).expect("upsert");

    let got = get_document(&conn, &rec.document_id).expect("get").expect("some");
    assert_eq!(got, rec);
}

#[test]
fn reupload_same_filename_updates_in_place() {
    let mut conn = db::open_in_memory().expect("open");
    db::migrate(&mut conn).expect("migrate");

    upsert_document(&conn, &record("report.pdf", 7, "2026-02-10T00:00:00Z")).expect("first");
    upsert_document(&conn, &record("report.pdf", 9, "2026-02-11T00:00:00Z")).expect("second");

    let docs = list_documents(&conn).expect("list");
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].chunk_count, 9);
    assert_eq!(docs[0].uploaded_at, "2026-02-11T00:00:00Z");
}

#[test]
fn list_orders_by_filename() {
    let mut conn = db::open_in_memory().expect("open");
    db::migrate(&mut conn).expect("migrate");

    upsert_document(&conn, &record("zebra.pdf", 1, "2026-02-10T00:00:00Z")).expect("z");
    upsert_document(&conn, &record("alpha.pdf", 1, "2026-02-10T00:00:00Z")).expect("a");

    let docs = list_documents(&conn).expect("list");
    let names: Vec<&str> = docs.iter().map(|d| d.filename.as_str()).collect();
    assert_eq!(names, vec!["alpha.pdf", "zebra.pdf"]);
}

#[test]
fn missing_document_is_none() {
    let mut conn = db::open_in_memory().expect("open");
    db::migrate(&mut conn).expect("migrate");
    assert_eq!(get_document(&conn, "nope").expect("get"), None);
}
