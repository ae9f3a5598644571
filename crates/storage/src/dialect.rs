//! Engine-specific SQL fragments.
//!
//! The shared query builder speaks in these fragments; the rest of the
//! crate never branches on a concrete engine outside the backend modules.

use chrono::{DateTime, Utc};

/// The SQL dialect of one backend engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    #[cfg(feature = "sqlite")]
    Sqlite,
    #[cfg(feature = "postgres")]
    Postgres,
    #[cfg(feature = "mysql")]
    Mysql,
}

/// One positional bind parameter, engine-agnostic until bound.
#[derive(Debug, Clone)]
pub enum SqlParam {
    Text(String),
    Int(i64),
    Bool(bool),
    Timestamp(DateTime<Utc>),
}

impl Dialect {
    /// Positional placeholder for the n-th parameter (1-based).
    pub fn placeholder(self, n: usize) -> String {
        match self {
            #[cfg(feature = "postgres")]
            Self::Postgres => format!("${n}"),
            #[allow(unreachable_patterns)]
            _ => {
                let _ = n;
                "?".to_owned()
            },
        }
    }

    /// Boolean-true test on a column.
    pub fn is_true(self, column: &str) -> String {
        match self {
            #[cfg(feature = "postgres")]
            Self::Postgres => format!("{column}=true"),
            #[allow(unreachable_patterns)]
            _ => format!("{column}=1"),
        }
    }

    /// Boolean-false test on a column.
    pub fn is_false(self, column: &str) -> String {
        match self {
            #[cfg(feature = "postgres")]
            Self::Postgres => format!("{column}=false"),
            #[allow(unreachable_patterns)]
            _ => format!("{column}=0"),
        }
    }

    /// SUM over a boolean column.
    pub fn sum_bool(self, column: &str) -> String {
        match self {
            #[cfg(feature = "postgres")]
            Self::Postgres => format!("SUM({column}::int)"),
            #[allow(unreachable_patterns)]
            _ => format!("SUM({column})"),
        }
    }

    /// Membership test on a comma-delimited column against a bound value.
    ///
    /// The bound parameter must be the raw value for postgres and the
    /// `%,value,%` LIKE pattern for the concatenating engines.
    pub fn csv_contains(self, column: &str, placeholder: &str) -> String {
        match self {
            #[cfg(feature = "postgres")]
            Self::Postgres => format!("{placeholder}=ANY(string_to_array({column}, ','))"),
            #[cfg(feature = "mysql")]
            Self::Mysql => format!("CONCAT(',', {column}, ',') LIKE {placeholder}"),
            #[allow(unreachable_patterns)]
            _ => format!("(',' || {column} || ',') LIKE {placeholder} ESCAPE '\\'"),
        }
    }

    /// The bound-parameter value for [`Dialect::csv_contains`].
    pub fn csv_contains_param(self, value: &str) -> SqlParam {
        match self {
            #[cfg(feature = "postgres")]
            Self::Postgres => SqlParam::Text(value.to_owned()),
            #[allow(unreachable_patterns)]
            _ => SqlParam::Text(format!("%,{},%", escape_like_pattern(value))),
        }
    }

    /// Predicate selecting rows whose CSV column carries an entry starting
    /// with `marker`. The marker is a fixed reserved character, inlined.
    pub fn csv_has_marker(self, column: &str, marker: char) -> String {
        match self {
            #[cfg(feature = "mysql")]
            Self::Mysql => format!("CONCAT(',', {column}, ',') LIKE '%,{marker}%'"),
            #[allow(unreachable_patterns)]
            _ => format!("(',' || {column} || ',') LIKE '%,{marker}%'"),
        }
    }

    /// Suffix declaring the backslash LIKE-escape character.
    ///
    /// MySQL treats backslash as the escape character by default and
    /// rejects the bare `'\'` literal, so it gets no suffix.
    pub fn like_escape_suffix(self) -> &'static str {
        match self {
            #[cfg(feature = "mysql")]
            Self::Mysql => "",
            #[allow(unreachable_patterns)]
            _ => " ESCAPE '\\'",
        }
    }

    /// ORDER BY fragment placing NULLs consistently across engines.
    ///
    /// Postgres sorts NULLs first on DESC by default, the others last;
    /// the COALESCE-free form keeps index usability on postgres.
    pub fn order_nulls_last(self, column: &str, descending: bool) -> String {
        let dir = if descending { "DESC" } else { "ASC" };
        match self {
            #[cfg(feature = "postgres")]
            Self::Postgres => format!("{column} {dir} NULLS LAST"),
            #[allow(unreachable_patterns)]
            _ => format!("{column} IS NULL, {column} {dir}"),
        }
    }
}

/// Escape LIKE wildcards in user-supplied search terms.
pub(crate) fn escape_like_pattern(s: &str) -> String {
    s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}
