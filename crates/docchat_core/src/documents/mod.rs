use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentRecord {
    pub document_id: String,
    pub filename: String,
    pub byte_len: u64,
    pub chunk_count: u32,
    pub uploaded_at: String, // RFC3339
}

/// Stable identifier for a document. Re-uploading the same filename maps to
/// the same id, so its chunks replace the previous upload's chunks.
pub fn document_id_for_filename(filename: &str) -> String {
    let digest = Sha256::digest(format!("doc|v1|{filename}").as_bytes());
    hex::encode(digest)
}

pub fn upsert_document(conn: &Connection, rec: &DocumentRecord) -> Result<(), AppError> {
    conn.execute(
        r#"
      INSERT INTO documents (document_id, filename, byte_len, chunk_count, uploaded_at)
      VALUES (?1, ?2, ?3, ?4, ?5)
      ON CONFLICT(document_id) DO UPDATE SET
        filename = excluded.filename,
        byte_len = excluded.byte_len,
        chunk_count = excluded.chunk_count,
        uploaded_at = excluded.uploaded_at
      "#,
        rusqlite::params![
            rec.document_id,
            rec.filename,
            rec.byte_len as i64,
            rec.chunk_count as i64,
            rec.uploaded_at,
        ],
    )
    .map_err(|e| {
        AppError::new("DB_WRITE_FAILED", "Failed to upsert document record")
            .with_details(format!("document_id={}; err={}", rec.document_id, e))
    })?;
    Ok(())
}

pub fn get_document(conn: &Connection, document_id: &str) -> Result<Option<DocumentRecord>, AppError> {
    let mut stmt = conn
        .prepare(
            "SELECT document_id, filename, byte_len, chunk_count, uploaded_at
             FROM documents WHERE document_id = ?1",
        )
        .map_err(|e| {
            AppError::new("DB_QUERY_FAILED", "Failed to prepare document query")
                .with_details(e.to_string())
        })?;

    stmt.query_row([document_id], |row| {
        Ok(DocumentRecord {
            document_id: row.get(0)?,
            filename: row.get(1)?,
            byte_len: row.get::<_, i64>(2)? as u64,
            chunk_count: row.get::<_, i64>(3)? as u32,
            uploaded_at: row.get(4)?,
        })
    })
    .optional()
    .map_err(|e| {
        AppError::new("DB_QUERY_FAILED", "Failed to query document")
            .with_details(format!("document_id={document_id}; err={e}"))
    })
}

pub fn list_documents(conn: &Connection) -> Result<Vec<DocumentRecord>, AppError> {
    let mut stmt = conn
        .prepare(
            "SELECT document_id, filename, byte_len, chunk_count, uploaded_at
             FROM documents ORDER BY filename ASC, document_id ASC",
        )
        .map_err(|e| {
            AppError::new("DB_QUERY_FAILED", "Failed to prepare documents query")
                .with_details(e.to_string())
        })?;

    let rows = stmt
        .query_map([], |row| {
            Ok(DocumentRecord {
                document_id: row.get(0)?,
                filename: row.get(1)?,
                byte_len: row.get::<_, i64>(2)? as u64,
                chunk_count: row.get::<_, i64>(3)? as u32,
                uploaded_at: row.get(4)?,
            })
        })
        .map_err(|e| {
            AppError::new("DB_QUERY_FAILED", "Failed to query documents")
                .with_details(e.to_string())
        })?;

    let mut out = Vec::new();
    for r in rows {
        let rec = r.map_err(|e| {
            AppError::new("DB_QUERY_FAILED", "Failed to read document row")
                .with_details(e.to_string())
        })?;
        out.push(rec);
    }
    Ok(out)
}
