//! SQL dialect differences between the supported backends.
//!
//! Everything dialect-specific lives here: URL schemes, identifier quoting,
//! bind placeholders, column types and upsert syntax.

use sqlkv_types::error::StorageError;
use sqlkv_types::storage::{MAX_KEY_BYTES, MAX_VALUE_BYTES, Namespace};

/// Database family selected by the connection URL scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    Postgres,
    MySql,
}

impl Dialect {
    /// Whether the database is an embedded file/in-memory engine.
    pub fn is_embedded(self) -> bool {
        matches!(self, Self::Sqlite)
    }

    /// Quote an identifier, escaping embedded quote characters.
    pub fn quote_ident(self, ident: &str) -> String {
        match self {
            Self::MySql => format!("`{}`", ident.replace('`', "``")),
            Self::Sqlite | Self::Postgres => format!("\"{}\"", ident.replace('"', "\"\"")),
        }
    }

    /// Longest identifier the backend keeps intact, in bytes.
    ///
    /// PostgreSQL silently truncates longer names (NAMEDATALEN - 1), so two
    /// long namespaces could end up sharing a table. SQLite has no limit.
    pub fn max_ident_bytes(self) -> Option<usize> {
        match self {
            Self::Sqlite => None,
            Self::Postgres => Some(63),
            Self::MySql => Some(64),
        }
    }

    /// Reject namespaces whose table name the backend would not keep intact.
    pub fn check_namespace(self, namespace: &Namespace) -> Result<(), StorageError> {
        match self.max_ident_bytes() {
            Some(max) if namespace.as_str().len() > max => {
                Err(StorageError::InvalidNamespace(format!(
                    "'{namespace}' is {} bytes, {self:?} table names are limited to {max}",
                    namespace.as_str().len()
                )))
            }
            _ => Ok(()),
        }
    }

    /// Bind placeholder for the 1-based parameter `n`.
    pub fn placeholder(self, n: usize) -> String {
        match self {
            Self::Postgres => format!("${n}"),
            Self::Sqlite | Self::MySql => "?".to_string(),
        }
    }

    /// Column type of the `value` column.
    fn value_type(self) -> String {
        match self {
            // VARCHAR(32768) overflows MySQL's 65535-byte row limit under utf8mb4.
            Self::MySql => "TEXT".to_string(),
            Self::Sqlite | Self::Postgres => format!("VARCHAR({MAX_VALUE_BYTES})"),
        }
    }

    /// `CREATE TABLE IF NOT EXISTS` for a namespace table.
    pub fn create_table_sql(self, table: &str) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {table} ({key} VARCHAR({MAX_KEY_BYTES}) NOT NULL PRIMARY KEY, {value} {value_type})",
            key = self.quote_ident("key"),
            value = self.quote_ident("value"),
            value_type = self.value_type(),
        )
    }

    /// Insert-or-overwrite keyed by the primary key. Binds key then value.
    pub fn upsert_sql(self, table: &str) -> String {
        let key = self.quote_ident("key");
        let value = self.quote_ident("value");
        let (p1, p2) = (self.placeholder(1), self.placeholder(2));
        match self {
            Self::MySql => format!(
                "INSERT INTO {table} ({key}, {value}) VALUES ({p1}, {p2}) \
                 ON DUPLICATE KEY UPDATE {value} = VALUES({value})"
            ),
            Self::Sqlite | Self::Postgres => format!(
                "INSERT INTO {table} ({key}, {value}) VALUES ({p1}, {p2}) \
                 ON CONFLICT ({key}) DO UPDATE SET {value} = excluded.{value}"
            ),
        }
    }
}

/// Split a connection URL into its dialect and the URL handed to sqlx.
///
/// Driver suffixes in the scheme (`mysql+pymysql://`, `postgresql+psycopg2://`)
/// are dropped.
///
/// SQLite URLs are read the SQLAlchemy way and rewritten for sqlx:
///
/// - `sqlite://` (no path) is an in-memory database.
/// - `sqlite:///relative/bot.db` is relative to the working directory.
/// - `sqlite:////abs/bot.db` is absolute.
/// - `sqlite::memory:` and the two-slash sqlx form `sqlite://bot.db` pass
///   through unchanged.
///
/// File URLs without an explicit `mode` get `mode=rwc` so the database file is
/// created on first use.
pub fn parse_url(url: &str) -> Result<(Dialect, String), StorageError> {
    let Some((scheme, rest)) = url.split_once(':') else {
        return Err(StorageError::Configuration(format!(
            "connection URL '{url}' has no scheme"
        )));
    };
    let base_scheme = scheme
        .split_once('+')
        .map_or(scheme, |(base, _driver)| base)
        .to_ascii_lowercase();

    let dialect = match base_scheme.as_str() {
        "sqlite" => Dialect::Sqlite,
        "postgres" | "postgresql" => Dialect::Postgres,
        "mysql" | "mariadb" => Dialect::MySql,
        other => {
            return Err(StorageError::Configuration(format!(
                "unsupported database scheme '{other}' (expected sqlite, postgres or mysql)"
            )));
        }
    };

    let normalized = match dialect {
        Dialect::Sqlite => sqlite_url(rest),
        Dialect::Postgres | Dialect::MySql => format!("{base_scheme}:{rest}"),
    };
    Ok((dialect, normalized))
}

/// Map the part of a SQLite URL after `sqlite:` onto sqlx's URL form.
fn sqlite_url(rest: &str) -> String {
    if rest.is_empty() || rest == "//" {
        return "sqlite::memory:".to_string();
    }

    // sqlx reads everything after `sqlite://` as the path, SQLAlchemy reads
    // everything after `sqlite:///`.
    let rest = match rest.strip_prefix("///") {
        Some(path) => format!("//{path}"),
        None => rest.to_string(),
    };

    let mut url = format!("sqlite:{rest}");
    if !rest.contains(":memory:") && !rest.contains("mode=") {
        url.push(if rest.contains('?') { '&' } else { '?' });
        url.push_str("mode=rwc");
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_url_schemes() {
        assert_eq!(parse_url("sqlite::memory:").unwrap().0, Dialect::Sqlite);
        assert_eq!(
            parse_url("postgresql://postgres:@localhost/travis_ci_test").unwrap().0,
            Dialect::Postgres
        );
        assert_eq!(
            parse_url("postgres://localhost/db").unwrap().0,
            Dialect::Postgres
        );
        assert_eq!(parse_url("mariadb://localhost/db").unwrap().0, Dialect::MySql);
    }

    #[test]
    fn test_parse_url_strips_driver_suffix() {
        let (dialect, url) = parse_url("mysql+pymysql://travis:@localhost/travis_ci_test").unwrap();
        assert_eq!(dialect, Dialect::MySql);
        assert_eq!(url, "mysql://travis:@localhost/travis_ci_test");
    }

    #[test]
    fn test_parse_url_sqlite_file_gets_create_mode() {
        let (_, url) = parse_url("sqlite:////tmp/bot.db").unwrap();
        assert_eq!(url, "sqlite:///tmp/bot.db?mode=rwc");

        let (_, url) = parse_url("sqlite:////tmp/bot.db?cache=shared").unwrap();
        assert_eq!(url, "sqlite:///tmp/bot.db?cache=shared&mode=rwc");

        let (_, url) = parse_url("sqlite:////tmp/bot.db?mode=ro").unwrap();
        assert_eq!(url, "sqlite:///tmp/bot.db?mode=ro");
    }

    #[test]
    fn test_parse_url_sqlite_three_slashes_is_relative() {
        let (_, url) = parse_url("sqlite:///tmp/bot.db").unwrap();
        assert_eq!(url, "sqlite://tmp/bot.db?mode=rwc");

        let (_, url) = parse_url("sqlite:///./data/bot.db").unwrap();
        assert_eq!(url, "sqlite://./data/bot.db?mode=rwc");
    }

    #[test]
    fn test_parse_url_sqlite_without_path_is_memory() {
        assert_eq!(parse_url("sqlite://").unwrap().1, "sqlite::memory:");
        assert_eq!(parse_url("sqlite:").unwrap().1, "sqlite::memory:");
        assert_eq!(parse_url("sqlite+pysqlite://").unwrap().1, "sqlite::memory:");
    }

    #[test]
    fn test_parse_url_memory_untouched() {
        let (_, url) = parse_url("sqlite::memory:").unwrap();
        assert_eq!(url, "sqlite::memory:");

        let (_, url) = parse_url("sqlite://bot.db").unwrap();
        assert_eq!(url, "sqlite://bot.db?mode=rwc");
    }

    #[test]
    fn test_parse_url_rejects_unknown_scheme() {
        assert!(matches!(
            parse_url("oracle://scott@localhost/db"),
            Err(StorageError::Configuration(_))
        ));
        assert!(matches!(
            parse_url("no-scheme-here"),
            Err(StorageError::Configuration(_))
        ));
    }

    #[test]
    fn test_quote_ident_escapes() {
        assert_eq!(Dialect::Sqlite.quote_ident("my \"ns\""), "\"my \"\"ns\"\"\"");
        assert_eq!(Dialect::MySql.quote_ident("a`b"), "`a``b`");
    }

    #[test]
    fn test_identifier_limits() {
        assert_eq!(Dialect::Sqlite.max_ident_bytes(), None);
        assert_eq!(Dialect::Postgres.max_ident_bytes(), Some(63));
        assert_eq!(Dialect::MySql.max_ident_bytes(), Some(64));
    }

    #[test]
    fn test_check_namespace_per_dialect() {
        let ns = |len: usize| Namespace::new("n".repeat(len)).unwrap();

        assert!(Dialect::Postgres.check_namespace(&ns(63)).is_ok());
        assert!(matches!(
            Dialect::Postgres.check_namespace(&ns(64)),
            Err(StorageError::InvalidNamespace(_))
        ));

        assert!(Dialect::MySql.check_namespace(&ns(64)).is_ok());
        assert!(Dialect::MySql.check_namespace(&ns(65)).is_err());

        assert!(Dialect::Sqlite.check_namespace(&ns(500)).is_ok());
    }

    #[test]
    fn test_check_namespace_counts_bytes() {
        // 32 two-byte characters: 64 bytes.
        let ns = Namespace::new("é".repeat(32)).unwrap();
        assert!(Dialect::Postgres.check_namespace(&ns).is_err());
        assert!(Dialect::MySql.check_namespace(&ns).is_ok());
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(Dialect::Postgres.placeholder(2), "$2");
        assert_eq!(Dialect::Sqlite.placeholder(2), "?");
        assert_eq!(Dialect::MySql.placeholder(1), "?");
    }

    #[test]
    fn test_create_table_sql() {
        let sql = Dialect::Sqlite.create_table_sql("\"prefs\"");
        assert_eq!(
            sql,
            "CREATE TABLE IF NOT EXISTS \"prefs\" (\"key\" VARCHAR(767) NOT NULL PRIMARY KEY, \"value\" VARCHAR(32768))"
        );
        assert!(Dialect::MySql.create_table_sql("`prefs`").ends_with("`value` TEXT)"));
    }

    #[test]
    fn test_upsert_sql() {
        let pg = Dialect::Postgres.upsert_sql("\"prefs\"");
        assert!(pg.contains("VALUES ($1, $2)"));
        assert!(pg.contains("ON CONFLICT (\"key\") DO UPDATE"));

        let my = Dialect::MySql.upsert_sql("`prefs`");
        assert!(my.contains("ON DUPLICATE KEY UPDATE `value` = VALUES(`value`)"));
    }
}
