mod mysql;
mod postgres;
mod sqlite;

pub use mysql::{MysqlKeywords, MYSQL_KEYWORDS};
pub use postgres::{PostgresKeywords, POSTGRES_KEYWORDS};
pub use sqlite::{SqliteKeywords, SQLITE_KEYWORDS};
