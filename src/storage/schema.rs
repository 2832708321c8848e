//! Database schema definitions

/// SQL to create the contacts table
pub const CREATE_CONTACTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS contacts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    email TEXT,
    role TEXT,
    context TEXT,
    last_contact TEXT,
    next_event TEXT,
    tags TEXT NOT NULL DEFAULT '[]',
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    last_referenced_at INTEGER
)
"#;

/// SQL to create the snippets table
pub const CREATE_SNIPPETS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS snippets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    text TEXT NOT NULL,
    tags TEXT NOT NULL DEFAULT '[]',
    source TEXT,
    created_at INTEGER NOT NULL
)
"#;

/// SQL to create the projects table
pub const CREATE_PROJECTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    status TEXT,
    description TEXT,
    lead TEXT,
    tags TEXT NOT NULL DEFAULT '[]'
)
"#;

/// SQL to create the abbreviations table
/// `abbr` is unique per category, ignoring case
pub const CREATE_ABBREVIATIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS abbreviations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    abbr TEXT NOT NULL COLLATE NOCASE,
    full TEXT NOT NULL,
    definition TEXT,
    category TEXT NOT NULL DEFAULT 'General' COLLATE NOCASE,
    examples TEXT NOT NULL DEFAULT '[]',
    related TEXT NOT NULL DEFAULT '[]',
    links TEXT NOT NULL DEFAULT '[]',
    UNIQUE(abbr, category)
)
"#;

/// SQL to create the relationships table
pub const CREATE_RELATIONSHIPS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS relationships (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    from_type TEXT NOT NULL,
    from_id INTEGER NOT NULL,
    to_type TEXT NOT NULL,
    to_id INTEGER NOT NULL,
    kind TEXT NOT NULL,
    strength REAL NOT NULL DEFAULT 1.0,
    created_at INTEGER NOT NULL,
    UNIQUE(from_type, from_id, to_type, to_id, kind)
)
"#;

/// SQL to create the embeddings table
/// `text` is the snapshot the vector was computed from
pub const CREATE_EMBEDDINGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS embeddings (
    entity_type TEXT NOT NULL,
    entity_id INTEGER NOT NULL,
    vector BLOB NOT NULL,
    text TEXT NOT NULL,
    PRIMARY KEY(entity_type, entity_id)
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_contacts_name ON contacts(name)",
    "CREATE INDEX IF NOT EXISTS idx_contacts_email ON contacts(email)",
    "CREATE INDEX IF NOT EXISTS idx_projects_name ON projects(name)",
    "CREATE INDEX IF NOT EXISTS idx_relationships_from ON relationships(from_type, from_id)",
    "CREATE INDEX IF NOT EXISTS idx_relationships_to ON relationships(to_type, to_id)",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_CONTACTS_TABLE,
        CREATE_SNIPPETS_TABLE,
        CREATE_PROJECTS_TABLE,
        CREATE_ABBREVIATIONS_TABLE,
        CREATE_RELATIONSHIPS_TABLE,
        CREATE_EMBEDDINGS_TABLE,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
