pub const USERS_TABLE: &str = "Users";

pub const CREATE_USERS_TABLE: &str = "CREATE TABLE IF NOT EXISTS Users (
    TaxID       INTEGER NOT NULL CONSTRAINT PK_Users PRIMARY KEY AUTOINCREMENT,
    Comment     TEXT,
    Email       TEXT,
    FirstName   TEXT,
    LastName    TEXT,
    PassNumber  TEXT,
    PhoneNumber TEXT
);";

pub const TABLE_EXISTS: &str = "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1";

pub const SELECT_USERS: &str =
    "SELECT TaxID, FirstName, LastName, Email, PhoneNumber, PassNumber, Comment FROM Users";

pub const SELECT_UNIVERSE: &str = "SELECT TaxID, PassNumber, Email FROM Users";

pub const INSERT_USER: &str = "INSERT INTO Users (TaxID, FirstName, LastName, Email, PhoneNumber, PassNumber, Comment) \
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";

/// Column list for the single-statement insert; values are appended as literals.
pub const INSERT_USERS_PREFIX: &str =
    "INSERT INTO Users (TaxID, FirstName, LastName, Email, PhoneNumber, PassNumber, Comment) VALUES ";

pub const VACUUM: &str = "VACUUM;";

pub fn count_where(column: &str) -> String {
    format!("SELECT COUNT({column}) FROM {USERS_TABLE} WHERE {column} = ?1")
}

pub fn drop_index(name: &str) -> String {
    format!("DROP INDEX IF EXISTS {name};")
}

pub fn create_index(name: &str, table: &str, column: &str) -> String {
    format!("CREATE INDEX IF NOT EXISTS {name} ON {table}({column});")
}
