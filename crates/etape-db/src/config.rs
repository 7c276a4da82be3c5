use std::env;
use std::time::Duration;

/// Connection settings for the étape database.
///
/// The URL comes from `ETAPE_DATABASE_URL`; pool sizing can be tuned with
/// `ETAPE_DB_MAX_CONNECTIONS`. The itinerary workload is a handful of
/// short queries per command, so the defaults are small.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Full PostgreSQL connection URL.
    pub database_url: String,
    /// Upper bound on pooled connections.
    pub max_connections: u32,
    /// How long to wait for a free connection before failing the query.
    pub acquire_timeout: Duration,
}

impl DbConfig {
    pub const DEFAULT_URL: &str = "postgresql://localhost:5432/etape";
    pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
    pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

    /// Build a config from the environment, falling back to the defaults
    /// for anything unset or unparseable.
    pub fn from_env() -> Self {
        let database_url =
            env::var("ETAPE_DATABASE_URL").unwrap_or_else(|_| Self::DEFAULT_URL.to_owned());
        let max_connections = env::var("ETAPE_DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(Self::DEFAULT_MAX_CONNECTIONS);
        Self {
            database_url,
            max_connections,
            acquire_timeout: Self::DEFAULT_ACQUIRE_TIMEOUT,
        }
    }

    /// Build a config from an explicit URL with default pool settings
    /// (tests and CLI flags).
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: Self::DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: Self::DEFAULT_ACQUIRE_TIMEOUT,
        }
    }

    /// The database name: the last path segment of the URL, with any query
    /// string (`?sslmode=...`) stripped first.
    ///
    /// Returns `None` for URLs without a path segment, e.g.
    /// `postgresql://localhost:5432`.
    pub fn database_name(&self) -> Option<&str> {
        let base = self
            .database_url
            .split(['?', '#'])
            .next()
            .unwrap_or(&self.database_url);
        let name = base.rsplit('/').next()?;
        // A segment with ':' or '@' means we are still in the authority
        // part, so the URL has no database path at all.
        (!name.is_empty() && !name.contains([':', '@'])).then_some(name)
    }

    /// URL of the `postgres` maintenance database on the same server,
    /// keeping any query parameters. Used to issue `CREATE DATABASE`.
    pub fn maintenance_url(&self) -> String {
        let (base, params) = match self.database_url.split_once('?') {
            Some((base, params)) => (base, Some(params)),
            None => (self.database_url.as_str(), None),
        };
        let server = match base.rfind('/') {
            Some(pos) if self.database_name().is_some() => &base[..pos],
            _ => base,
        };
        match params {
            Some(params) => format!("{server}/postgres?{params}"),
            None => format!("{server}/postgres"),
        }
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_url_gets_default_pool_settings() {
        let cfg = DbConfig::new("postgresql://remotehost:5433/other");
        assert_eq!(cfg.database_url, "postgresql://remotehost:5433/other");
        assert_eq!(cfg.max_connections, DbConfig::DEFAULT_MAX_CONNECTIONS);
        assert_eq!(cfg.acquire_timeout, DbConfig::DEFAULT_ACQUIRE_TIMEOUT);
    }

    #[test]
    fn database_name_strips_query_parameters() {
        let cfg = DbConfig::new("postgresql://localhost:5432/etape?sslmode=require");
        assert_eq!(cfg.database_name(), Some("etape"));
    }

    #[test]
    fn database_name_absent_without_path() {
        let cfg = DbConfig::new("postgresql://localhost:5432");
        assert_eq!(cfg.database_name(), None);
    }

    #[test]
    fn maintenance_url_swaps_database_and_keeps_parameters() {
        let cfg = DbConfig::new("postgresql://localhost:5432/etape?sslmode=require");
        assert_eq!(
            cfg.maintenance_url(),
            "postgresql://localhost:5432/postgres?sslmode=require"
        );
    }

    #[test]
    fn maintenance_url_appends_when_no_database_in_url() {
        let cfg = DbConfig::new("postgresql://localhost:5432");
        assert_eq!(cfg.maintenance_url(), "postgresql://localhost:5432/postgres");
    }
}
