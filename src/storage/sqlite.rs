//! SQLite storage implementation

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, params, OptionalExtension};
use crate::{Result, Error};
use crate::edge::{RelationshipEdge, RelationshipKind};
use crate::entity::{Abbreviation, Contact, EntityKind, EntityRecord, EntityRef, Project, Snippet, now_timestamp};
use super::schema;

/// Shared, thread-safe handle to the knowledge base
pub type StoreHandle = Arc<SqliteStore>;

const CONTACT_COLUMNS: &str =
    "id, name, email, role, context, last_contact, next_event, tags, created_at, updated_at, last_referenced_at";
const SNIPPET_COLUMNS: &str = "id, text, tags, source, created_at";
const PROJECT_COLUMNS: &str = "id, name, status, description, lead, tags";
const ABBREVIATION_COLUMNS: &str = "id, abbr, full, definition, category, examples, related, links";
const RELATIONSHIP_COLUMNS: &str = "from_type, from_id, to_type, to_id, kind, strength";

/// SQLite-backed storage for the knowledge base
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| Error::StoreUnavailable(format!("{}: {}", path.display(), e)))?;
        register_functions(&conn)?;
        let store = Self { conn: Mutex::new(conn) };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?;
        register_functions(&conn)?;
        let store = Self { conn: Mutex::new(conn) };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Wrap the store in a shareable handle
    pub fn into_handle(self) -> StoreHandle {
        Arc::new(self)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<()> {
        let conn = self.lock()?;
        for stmt in schema::all_schema_statements() {
            conn.execute(stmt, [])
                .map_err(|e| Error::StoreUnavailable(format!("schema: {}", e)))?;
        }
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::StoreUnavailable("connection lock poisoned".to_string()))
    }

    /// Run read-only work against the connection
    pub fn read<T>(&self, f: impl FnOnce(&StoreTx<'_>) -> Result<T>) -> Result<T> {
        let guard = self.lock()?;
        f(&StoreTx { conn: &guard })
    }

    /// Run work inside a transaction; an `Err` from `f` rolls everything back
    pub fn transaction<T>(&self, f: impl FnOnce(&StoreTx<'_>) -> Result<T>) -> Result<T> {
        let mut guard = self.lock()?;
        let tx = guard.transaction()?;
        let value = f(&StoreTx { conn: &tx })?;
        tx.commit()?;
        Ok(value)
    }

    // ========== Convenience wrappers ==========

    pub fn insert_contact(&self, contact: &Contact) -> Result<i64> {
        self.transaction(|tx| tx.insert_contact(contact))
    }

    pub fn update_contact(&self, contact: &Contact) -> Result<()> {
        self.transaction(|tx| tx.update_contact(contact))
    }

    pub fn insert_snippet(&self, snippet: &Snippet) -> Result<i64> {
        self.transaction(|tx| tx.insert_snippet(snippet))
    }

    pub fn insert_project(&self, project: &Project) -> Result<i64> {
        self.transaction(|tx| tx.insert_project(project))
    }

    pub fn upsert_abbreviation(&self, abbreviation: &Abbreviation) -> Result<i64> {
        self.transaction(|tx| tx.upsert_abbreviation(abbreviation))
    }

    pub fn insert_edge(&self, edge: &RelationshipEdge) -> Result<bool> {
        self.transaction(|tx| tx.insert_edge(edge))
    }

    pub fn get_contact(&self, id: i64) -> Result<Option<Contact>> {
        self.read(|db| db.get_contact(id))
    }

    pub fn get_snippet(&self, id: i64) -> Result<Option<Snippet>> {
        self.read(|db| db.get_snippet(id))
    }

    pub fn get_entity(&self, entity: EntityRef) -> Result<Option<EntityRecord>> {
        self.read(|db| db.get_entity(entity))
    }

    pub fn all_contacts(&self) -> Result<Vec<Contact>> {
        self.read(|db| db.all_contacts())
    }

    pub fn find_contacts_like(&self, query: &str) -> Result<Vec<Contact>> {
        self.read(|db| db.find_contacts_like(query))
    }

    pub fn find_snippets_like(&self, query: &str) -> Result<Vec<Snippet>> {
        self.read(|db| db.find_snippets_like(query))
    }

    pub fn find_projects_like(&self, query: &str) -> Result<Vec<Project>> {
        self.read(|db| db.find_projects_like(query))
    }

    pub fn find_abbreviations(&self, abbr: &str) -> Result<Vec<Abbreviation>> {
        self.read(|db| db.find_abbreviations(abbr))
    }

    pub fn relationships_for(&self, entity: EntityRef) -> Result<Vec<RelationshipEdge>> {
        self.read(|db| db.relationships_for(entity))
    }

    pub fn upsert_embedding(&self, entity: EntityRef, vector: &[f32], text: &str) -> Result<()> {
        self.transaction(|tx| tx.upsert_embedding(entity, vector, text))
    }

    pub fn all_embeddings(&self) -> Result<Vec<StoredEmbedding>> {
        self.read(|db| db.all_embeddings())
    }

    pub fn get_embedding(&self, entity: EntityRef) -> Result<Option<StoredEmbedding>> {
        self.read(|db| db.get_embedding(entity))
    }

    pub fn clear_embeddings(&self) -> Result<()> {
        self.transaction(|tx| tx.clear_embeddings())
    }

    pub fn embeddable_rows(&self) -> Result<Vec<(EntityRef, String)>> {
        self.read(|db| db.embeddable_rows())
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        self.read(|db| {
            Ok(DbStats {
                contacts: db.count("contacts")?,
                snippets: db.count("snippets")?,
                projects: db.count("projects")?,
                abbreviations: db.count("abbreviations")?,
                relationships: db.count("relationships")?,
                embeddings: db.count("embeddings")?,
            })
        })
    }
}

/// Operations on a locked connection, inside or outside a transaction.
pub struct StoreTx<'a> {
    conn: &'a Connection,
}

impl StoreTx<'_> {
    // ========== Contact Operations ==========

    /// Insert a contact, returning its id
    pub fn insert_contact(&self, contact: &Contact) -> Result<i64> {
        let name = contact.name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("contact name is empty".to_string()));
        }

        self.conn.execute(
            r#"
            INSERT INTO contacts (name, email, role, context, last_contact, next_event, tags, created_at, updated_at, last_referenced_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                name,
                contact.email,
                contact.role,
                contact.context,
                contact.last_contact,
                contact.next_event,
                serde_json::to_string(&contact.tags)?,
                contact.created_at,
                contact.updated_at,
                contact.last_referenced_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Overwrite an existing contact's fields
    pub fn update_contact(&self, contact: &Contact) -> Result<()> {
        let changed = self.conn.execute(
            r#"
            UPDATE contacts
            SET name = ?2, email = ?3, role = ?4, context = ?5, last_contact = ?6,
                next_event = ?7, tags = ?8, updated_at = ?9
            WHERE id = ?1
            "#,
            params![
                contact.id,
                contact.name,
                contact.email,
                contact.role,
                contact.context,
                contact.last_contact,
                contact.next_event,
                serde_json::to_string(&contact.tags)?,
                now_timestamp(),
            ],
        )?;
        if changed == 0 {
            return Err(Error::EntityNotFound(contact.entity_ref()));
        }
        Ok(())
    }

    /// Record that a snippet was just linked to this contact
    pub fn mark_contact_referenced(&self, id: i64, at: i64) -> Result<()> {
        self.conn.execute(
            "UPDATE contacts SET last_referenced_at = ?2 WHERE id = ?1",
            params![id, at],
        )?;
        Ok(())
    }

    pub fn get_contact(&self, id: i64) -> Result<Option<Contact>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM contacts WHERE id = ?1", CONTACT_COLUMNS),
                [id],
                row_to_contact,
            )
            .optional()
            .map_err(Into::into)
    }

    /// All contacts, ordered by id
    pub fn all_contacts(&self) -> Result<Vec<Contact>> {
        let mut stmt = self.conn.prepare(&format!("SELECT {} FROM contacts ORDER BY id", CONTACT_COLUMNS))?;
        let contacts = stmt
            .query_map([], row_to_contact)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(contacts)
    }

    /// Case-insensitive substring match on name or email
    pub fn find_contacts_like(&self, query: &str) -> Result<Vec<Contact>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM contacts WHERE instr(casefold(name), ?1) > 0 OR instr(casefold(email), ?1) > 0 ORDER BY id",
            CONTACT_COLUMNS
        ))?;
        let contacts = stmt
            .query_map([query.to_lowercase()], row_to_contact)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(contacts)
    }

    // ========== Snippet Operations ==========

    /// Insert a snippet, returning its id. `links` are not written here.
    pub fn insert_snippet(&self, snippet: &Snippet) -> Result<i64> {
        if snippet.text.trim().is_empty() {
            return Err(Error::InvalidInput("snippet text is empty".to_string()));
        }

        self.conn.execute(
            "INSERT INTO snippets (text, tags, source, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                snippet.text,
                serde_json::to_string(&snippet.tags)?,
                snippet.source,
                snippet.created_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_snippet(&self, id: i64) -> Result<Option<Snippet>> {
        let snippet = self
            .conn
            .query_row(
                &format!("SELECT {} FROM snippets WHERE id = ?1", SNIPPET_COLUMNS),
                [id],
                row_to_snippet,
            )
            .optional()?;

        match snippet {
            Some(snippet) => Ok(Some(self.attach_links(snippet)?)),
            None => Ok(None),
        }
    }

    pub fn all_snippets(&self) -> Result<Vec<Snippet>> {
        let mut stmt = self.conn.prepare(&format!("SELECT {} FROM snippets ORDER BY id", SNIPPET_COLUMNS))?;
        let snippets = stmt
            .query_map([], row_to_snippet)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        snippets.into_iter().map(|s| self.attach_links(s)).collect()
    }

    /// Case-insensitive substring match on the snippet body
    pub fn find_snippets_like(&self, query: &str) -> Result<Vec<Snippet>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM snippets WHERE instr(casefold(text), ?1) > 0 ORDER BY id",
            SNIPPET_COLUMNS
        ))?;
        let snippets = stmt
            .query_map([query.to_lowercase()], row_to_snippet)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        snippets.into_iter().map(|s| self.attach_links(s)).collect()
    }

    fn attach_links(&self, mut snippet: Snippet) -> Result<Snippet> {
        snippet.links = self
            .edges_from(snippet.entity_ref())?
            .into_iter()
            .map(|edge| edge.to)
            .filter(|to| matches!(to.kind, EntityKind::Contact | EntityKind::Project))
            .collect();
        Ok(snippet)
    }

    // ========== Project Operations ==========

    pub fn insert_project(&self, project: &Project) -> Result<i64> {
        if project.name.trim().is_empty() {
            return Err(Error::InvalidInput("project name is empty".to_string()));
        }

        self.conn.execute(
            "INSERT INTO projects (name, status, description, lead, tags) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                project.name.trim(),
                project.status,
                project.description,
                project.lead,
                serde_json::to_string(&project.tags)?,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_project(&self, id: i64) -> Result<Option<Project>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM projects WHERE id = ?1", PROJECT_COLUMNS),
                [id],
                row_to_project,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn all_projects(&self) -> Result<Vec<Project>> {
        let mut stmt = self.conn.prepare(&format!("SELECT {} FROM projects ORDER BY id", PROJECT_COLUMNS))?;
        let projects = stmt
            .query_map([], row_to_project)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(projects)
    }

    /// Case-insensitive substring match on name or description
    pub fn find_projects_like(&self, query: &str) -> Result<Vec<Project>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM projects WHERE instr(casefold(name), ?1) > 0 OR instr(casefold(description), ?1) > 0 ORDER BY id",
            PROJECT_COLUMNS
        ))?;
        let projects = stmt
            .query_map([query.to_lowercase()], row_to_project)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(projects)
    }

    // ========== Abbreviation Operations ==========

    /// Insert an abbreviation, replacing the fields of an existing (abbr, category) row
    pub fn upsert_abbreviation(&self, abbreviation: &Abbreviation) -> Result<i64> {
        let abbr = abbreviation.abbr.trim();
        if abbr.is_empty() || abbreviation.full.trim().is_empty() {
            return Err(Error::InvalidInput("abbreviation and full form are required".to_string()));
        }

        self.conn.execute(
            r#"
            INSERT INTO abbreviations (abbr, full, definition, category, examples, related, links)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(abbr, category) DO UPDATE SET
                full = excluded.full,
                definition = excluded.definition,
                examples = excluded.examples,
                related = excluded.related,
                links = excluded.links
            "#,
            params![
                abbr,
                abbreviation.full.trim(),
                abbreviation.definition,
                abbreviation.category,
                serde_json::to_string(&abbreviation.examples)?,
                serde_json::to_string(&abbreviation.related)?,
                serde_json::to_string(&abbreviation.links)?,
            ],
        )?;

        let id: i64 = self.conn.query_row(
            "SELECT id FROM abbreviations WHERE abbr = ?1 AND category = ?2",
            params![abbr, abbreviation.category],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    pub fn get_abbreviation(&self, id: i64) -> Result<Option<Abbreviation>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM abbreviations WHERE id = ?1", ABBREVIATION_COLUMNS),
                [id],
                row_to_abbreviation,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Whole-value match on `abbr`, ignoring case
    pub fn find_abbreviations(&self, abbr: &str) -> Result<Vec<Abbreviation>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM abbreviations WHERE abbr = ?1 ORDER BY id",
            ABBREVIATION_COLUMNS
        ))?;
        let rows = stmt
            .query_map([abbr.trim()], row_to_abbreviation)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    // ========== Entity Lookup ==========

    /// Fetch the full row behind an entity reference
    pub fn get_entity(&self, entity: EntityRef) -> Result<Option<EntityRecord>> {
        Ok(match entity.kind {
            EntityKind::Contact => self.get_contact(entity.id)?.map(EntityRecord::Contact),
            EntityKind::Snippet => self.get_snippet(entity.id)?.map(EntityRecord::Snippet),
            EntityKind::Project => self.get_project(entity.id)?.map(EntityRecord::Project),
            EntityKind::Abbreviation => self.get_abbreviation(entity.id)?.map(EntityRecord::Abbreviation),
        })
    }

    pub fn entity_exists(&self, entity: EntityRef) -> Result<bool> {
        let sql = format!("SELECT 1 FROM {} WHERE id = ?1", table_for(entity.kind));
        let found: Option<i64> = self.conn.query_row(&sql, [entity.id], |row| row.get(0)).optional()?;
        Ok(found.is_some())
    }

    // ========== Relationship Operations ==========

    /// Insert an edge. Returns `false` when the same (from, to, kind) already exists.
    pub fn insert_edge(&self, edge: &RelationshipEdge) -> Result<bool> {
        if edge.is_self_loop() {
            return Err(Error::InvalidInput(format!("self-referencing edge on {}", edge.from)));
        }

        let changed = self.conn.execute(
            r#"
            INSERT OR IGNORE INTO relationships (from_type, from_id, to_type, to_id, kind, strength, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                edge.from.kind.as_str(),
                edge.from.id,
                edge.to.kind.as_str(),
                edge.to.id,
                edge.kind.as_str(),
                edge.strength,
                now_timestamp(),
            ],
        )?;
        Ok(changed > 0)
    }

    /// Edges touching an entity at either end, in insertion order
    pub fn relationships_for(&self, entity: EntityRef) -> Result<Vec<RelationshipEdge>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {} FROM relationships
            WHERE (from_type = ?1 AND from_id = ?2) OR (to_type = ?1 AND to_id = ?2)
            ORDER BY id
            "#,
            RELATIONSHIP_COLUMNS
        ))?;
        let edges = stmt
            .query_map(params![entity.kind.as_str(), entity.id], row_to_edge)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(edges)
    }

    /// Edges leaving an entity
    pub fn edges_from(&self, entity: EntityRef) -> Result<Vec<RelationshipEdge>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM relationships WHERE from_type = ?1 AND from_id = ?2 ORDER BY id",
            RELATIONSHIP_COLUMNS
        ))?;
        let edges = stmt
            .query_map(params![entity.kind.as_str(), entity.id], row_to_edge)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(edges)
    }

    // ========== Embedding Operations ==========

    /// Insert or replace the vector for an entity along with its source text
    pub fn upsert_embedding(&self, entity: EntityRef, vector: &[f32], text: &str) -> Result<()> {
        let blob: Vec<u8> = vector.iter().flat_map(|f| f.to_le_bytes()).collect();

        self.conn.execute(
            "INSERT OR REPLACE INTO embeddings (entity_type, entity_id, vector, text) VALUES (?1, ?2, ?3, ?4)",
            params![entity.kind.as_str(), entity.id, blob, text],
        )?;
        Ok(())
    }

    pub fn get_embedding(&self, entity: EntityRef) -> Result<Option<StoredEmbedding>> {
        self.conn
            .query_row(
                "SELECT entity_type, entity_id, vector, text FROM embeddings WHERE entity_type = ?1 AND entity_id = ?2",
                params![entity.kind.as_str(), entity.id],
                row_to_embedding,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Every stored vector, ordered by entity type then id
    pub fn all_embeddings(&self) -> Result<Vec<StoredEmbedding>> {
        let mut stmt = self.conn.prepare(
            "SELECT entity_type, entity_id, vector, text FROM embeddings ORDER BY entity_type, entity_id",
        )?;
        let rows = stmt
            .query_map([], row_to_embedding)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn clear_embeddings(&self) -> Result<()> {
        self.conn.execute("DELETE FROM embeddings", [])?;
        Ok(())
    }

    /// Representative text of every contact, snippet and project
    pub fn embeddable_rows(&self) -> Result<Vec<(EntityRef, String)>> {
        let mut rows = Vec::new();
        for contact in self.all_contacts()? {
            rows.push((contact.entity_ref(), contact.embedding_text()));
        }
        for snippet in self.all_snippets()? {
            rows.push((snippet.entity_ref(), snippet.embedding_text()));
        }
        for project in self.all_projects()? {
            rows.push((project.entity_ref(), project.embedding_text()));
        }
        Ok(rows)
    }

    fn count(&self, table: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

/// An embedding row with the text it was computed from
#[derive(Debug, Clone)]
pub struct StoredEmbedding {
    pub entity: EntityRef,
    pub vector: Vec<f32>,
    pub text: String,
}

/// Database statistics
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct DbStats {
    pub contacts: usize,
    pub snippets: usize,
    pub projects: usize,
    pub abbreviations: usize,
    pub relationships: usize,
    pub embeddings: usize,
}

impl std::fmt::Display for DbStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Knowledge Base Statistics:")?;
        writeln!(f, "  Contacts: {}", self.contacts)?;
        writeln!(f, "  Snippets: {}", self.snippets)?;
        writeln!(f, "  Projects: {}", self.projects)?;
        writeln!(f, "  Abbreviations: {}", self.abbreviations)?;
        writeln!(f, "  Relationships: {}", self.relationships)?;
        writeln!(f, "  Embeddings: {}", self.embeddings)
    }
}

fn table_for(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Contact => "contacts",
        EntityKind::Snippet => "snippets",
        EntityKind::Project => "projects",
        EntityKind::Abbreviation => "abbreviations",
    }
}

/// `casefold(text)`: Unicode lowercase, so substring lookups match
/// `élise` against `Élise` where SQLite's `LIKE` folds ASCII only
fn register_functions(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        "casefold",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| Ok(ctx.get::<Option<String>>(0)?.map(|s| s.to_lowercase())),
    )
    .map_err(|e| Error::StoreUnavailable(format!("casefold: {}", e)))
}

fn decode_list(raw: Option<String>) -> Vec<String> {
    raw.and_then(|s| serde_json::from_str(&s).ok()).unwrap_or_default()
}

fn decode_vector(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

fn parse_kind(value: String, column: usize) -> rusqlite::Result<EntityKind> {
    value.parse().map_err(|e: Error| {
        rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn row_to_contact(row: &rusqlite::Row) -> rusqlite::Result<Contact> {
    Ok(Contact {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        role: row.get(3)?,
        context: row.get(4)?,
        last_contact: row.get(5)?,
        next_event: row.get(6)?,
        tags: decode_list(row.get(7)?),
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
        last_referenced_at: row.get(10)?,
    })
}

fn row_to_snippet(row: &rusqlite::Row) -> rusqlite::Result<Snippet> {
    Ok(Snippet {
        id: row.get(0)?,
        text: row.get(1)?,
        tags: decode_list(row.get(2)?),
        source: row.get(3)?,
        created_at: row.get(4)?,
        links: Vec::new(),
    })
}

fn row_to_project(row: &rusqlite::Row) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        status: row.get(2)?,
        description: row.get(3)?,
        lead: row.get(4)?,
        tags: decode_list(row.get(5)?),
    })
}

fn row_to_abbreviation(row: &rusqlite::Row) -> rusqlite::Result<Abbreviation> {
    Ok(Abbreviation {
        id: row.get(0)?,
        abbr: row.get(1)?,
        full: row.get(2)?,
        definition: row.get(3)?,
        category: row.get(4)?,
        examples: decode_list(row.get(5)?),
        related: decode_list(row.get(6)?),
        links: decode_list(row.get(7)?),
    })
}

fn row_to_edge(row: &rusqlite::Row) -> rusqlite::Result<RelationshipEdge> {
    let from = EntityRef::new(parse_kind(row.get(0)?, 0)?, row.get(1)?);
    let to = EntityRef::new(parse_kind(row.get(2)?, 2)?, row.get(3)?);
    let kind_str: String = row.get(4)?;
    let kind: RelationshipKind = kind_str.parse().map_err(|e: Error| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let strength: f32 = row.get(5)?;

    Ok(RelationshipEdge::with_strength(from, to, kind, strength))
}

fn row_to_embedding(row: &rusqlite::Row) -> rusqlite::Result<StoredEmbedding> {
    let entity = EntityRef::new(parse_kind(row.get(0)?, 0)?, row.get(1)?);
    let blob: Vec<u8> = row.get(2)?;
    Ok(StoredEmbedding {
        entity,
        vector: decode_vector(&blob),
        text: row.get(3)?,
    })
}
