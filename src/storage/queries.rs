//! Database queries for collections and memories

use chrono::Utc;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::backend::{CollectionInfo, QueryRequest};
use super::filter::SqlBuilder;
use crate::embedding::cosine_distance;
use crate::error::{MemvaultError, Result};
use crate::types::{MemoryRecord, Metadata, RetrievalHit};

/// Little-endian f32 BLOB
pub fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

pub fn decode_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

fn parse_metadata(raw: &str) -> Result<Metadata> {
    Ok(serde_json::from_str(raw)?)
}

/// Row layout: doc_id, text, metadata, embedding
fn record_from_row(row: &Row) -> rusqlite::Result<(String, String, String, Vec<u8>)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn into_record(raw: (String, String, String, Vec<u8>)) -> Result<MemoryRecord> {
    let (doc_id, text, metadata, embedding) = raw;
    Ok(MemoryRecord {
        doc_id,
        text,
        metadata: parse_metadata(&metadata)?,
        embedding: decode_embedding(&embedding),
    })
}

/// Case-insensitive substring match over text and metadata values
pub fn record_contains(text: &str, metadata: &Metadata, needle_lower: &str) -> bool {
    text.to_lowercase().contains(needle_lower)
        || metadata
            .values()
            .any(|v| v.to_string().to_lowercase().contains(needle_lower))
}

pub fn create_collection(conn: &Connection, name: &str) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO collections (name, created_at) VALUES (?, ?)",
        params![name, Utc::now().to_rfc3339()],
    )?;
    Ok(inserted > 0)
}

pub fn get_collection(conn: &Connection, name: &str) -> Result<Option<CollectionInfo>> {
    Ok(conn
        .query_row(
            "SELECT name, created_at FROM collections WHERE name = ?",
            params![name],
            |row| {
                Ok(CollectionInfo {
                    name: row.get(0)?,
                    created_at: row.get(1)?,
                })
            },
        )
        .optional()?)
}

fn require_collection(conn: &Connection, name: &str) -> Result<()> {
    match get_collection(conn, name)? {
        Some(_) => Ok(()),
        None => Err(MemvaultError::CollectionNotFound(name.to_string())),
    }
}

pub fn list_collections(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM collections ORDER BY created_at, name")?;
    let names = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(names)
}

pub fn delete_collection(conn: &Connection, name: &str) -> Result<()> {
    // Explicit delete keeps working on databases opened without foreign keys
    conn.execute("DELETE FROM memories WHERE collection = ?", params![name])?;
    let deleted = conn.execute("DELETE FROM collections WHERE name = ?", params![name])?;
    if deleted == 0 {
        return Err(MemvaultError::CollectionNotFound(name.to_string()));
    }
    Ok(())
}

/// Insert or overwrite by `(collection, doc_id)`. The original `created_at`
/// and iteration position survive an overwrite.
pub fn upsert_memory(conn: &Connection, collection: &str, record: &MemoryRecord) -> Result<()> {
    require_collection(conn, collection)?;

    let now = Utc::now().to_rfc3339();
    let metadata = serde_json::to_string(&record.metadata)?;
    conn.execute(
        "INSERT INTO memories (collection, doc_id, text, metadata, embedding, dimensions, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
         ON CONFLICT (collection, doc_id) DO UPDATE SET
            text = excluded.text,
            metadata = excluded.metadata,
            embedding = excluded.embedding,
            dimensions = excluded.dimensions,
            updated_at = excluded.updated_at",
        params![
            collection,
            record.doc_id,
            record.text,
            metadata,
            encode_embedding(&record.embedding),
            record.embedding.len() as i64,
            now,
        ],
    )?;
    Ok(())
}

pub fn get_memory(conn: &Connection, collection: &str, doc_id: &str) -> Result<Option<MemoryRecord>> {
    require_collection(conn, collection)?;

    let raw = conn
        .query_row(
            "SELECT doc_id, text, metadata, embedding FROM memories
             WHERE collection = ? AND doc_id = ?",
            params![collection, doc_id],
            record_from_row,
        )
        .optional()?;
    raw.map(into_record).transpose()
}

pub fn peek_memories(conn: &Connection, collection: &str, limit: usize) -> Result<Vec<MemoryRecord>> {
    require_collection(conn, collection)?;

    let mut stmt = conn.prepare(
        "SELECT doc_id, text, metadata, embedding FROM memories
         WHERE collection = ? ORDER BY seq LIMIT ?",
    )?;
    let rows = stmt
        .query_map(params![collection, limit as i64], record_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    rows.into_iter().map(into_record).collect()
}

pub fn delete_memory(conn: &Connection, collection: &str, doc_id: &str) -> Result<bool> {
    require_collection(conn, collection)?;

    let deleted = conn.execute(
        "DELETE FROM memories WHERE collection = ? AND doc_id = ?",
        params![collection, doc_id],
    )?;
    Ok(deleted > 0)
}

pub fn list_doc_ids(conn: &Connection, collection: &str) -> Result<Vec<String>> {
    require_collection(conn, collection)?;

    let mut stmt = conn.prepare("SELECT doc_id FROM memories WHERE collection = ? ORDER BY seq")?;
    let ids = stmt
        .query_map(params![collection], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(ids)
}

/// Brute-force nearest-neighbour search.
///
/// The where-filter runs in SQL; distances are cosine distance in `[0, 2]`.
/// Rows whose stored dimensions differ from the query vector are skipped,
/// as they were written by a different embedding model.
pub fn query_memories(
    conn: &Connection,
    collection: &str,
    request: &QueryRequest<'_>,
) -> Result<Vec<RetrievalHit>> {
    require_collection(conn, collection)?;

    if request.n_results == 0 {
        return Ok(Vec::new());
    }

    let mut builder = SqlBuilder::new();
    let mut sql = String::from(
        "SELECT m.doc_id, m.text, m.metadata, m.embedding FROM memories m
         WHERE m.collection = ? AND m.dimensions = ?",
    );
    if let Some(filter) = request.filter {
        sql.push_str(" AND ");
        sql.push_str(&builder.build_filter(filter));
    }
    sql.push_str(" ORDER BY m.seq");

    let mut bound: Vec<Box<dyn rusqlite::ToSql>> = vec![
        Box::new(collection.to_string()),
        Box::new(request.embedding.len() as i64),
    ];
    bound.extend(builder.take_params());

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(bound.iter()), record_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let needle = request.contains.map(str::to_lowercase);

    let mut hits = Vec::new();
    for raw in rows {
        let record = into_record(raw)?;
        if let Some(needle) = &needle {
            if !record_contains(&record.text, &record.metadata, needle) {
                continue;
            }
        }
        let distance = cosine_distance(request.embedding, &record.embedding);
        hits.push(RetrievalHit {
            doc_id: record.doc_id,
            text: record.text,
            metadata: record.metadata,
            distance,
        });
    }

    hits.sort_by(|a, b| {
        a.distance
            .total_cmp(&b.distance)
            .then_with(|| a.doc_id.cmp(&b.doc_id))
    });
    hits.truncate(request.n_results);

    Ok(hits)
}
