//! Shared translation of [`ItemFilter`] into SQL, parameterized only by
//! dialect fragments so every backend issues the same logical query.

use feedstore_core::{
    HIDDEN_TAG_MARKER, ItemFilter, PRIVATE_TAG_MARKER, SortOrder, StatusFilter, StoreConfig,
    is_hidden_tag, split_search_terms,
};

use crate::dialect::{Dialect, SqlParam, escape_like_pattern};

/// WHERE body, ORDER BY body and bind parameters for one item list query.
#[derive(Debug)]
pub(crate) struct ItemQuery {
    pub where_sql: String,
    pub order_sql: String,
    pub params: Vec<SqlParam>,
}

struct ParamSink {
    dialect: Dialect,
    params: Vec<SqlParam>,
}

impl ParamSink {
    fn new(dialect: Dialect) -> Self {
        Self { dialect, params: Vec::new() }
    }

    /// Register a bind parameter, returning its placeholder.
    fn bind(&mut self, param: SqlParam) -> String {
        self.params.push(param);
        self.dialect.placeholder(self.params.len())
    }
}

/// Build the filter portion of an item query.
///
/// The returned WHERE body always starts with a valid predicate so callers
/// can append `AND`-joined clauses without tracking emptiness.
pub(crate) fn build_item_query(
    filter: &ItemFilter,
    config: &StoreConfig,
    dialect: Dialect,
) -> ItemQuery {
    let mut sink = ParamSink::new(dialect);
    let mut clauses = vec!["1=1".to_owned()];
    let mut descending = true;

    match filter.status {
        Some(StatusFilter::Unread) => {
            clauses.push(dialect.is_true("items.unread"));
            if config.unread_order == SortOrder::Asc {
                descending = false;
            }
        },
        Some(StatusFilter::Starred) => clauses.push(dialect.is_true("items.starred")),
        None => {},
    }

    if let Some(search) = filter.search.as_deref() {
        for term in split_search_terms(search) {
            let pattern = format!("%{}%", escape_like_pattern(&term));
            let esc = dialect.like_escape_suffix();
            let p1 = sink.bind(SqlParam::Text(pattern.clone()));
            let p2 = sink.bind(SqlParam::Text(pattern.clone()));
            let p3 = sink.bind(SqlParam::Text(pattern));
            clauses.push(format!(
                "(LOWER(items.title) LIKE {p1}{esc} \
                 OR LOWER(items.content) LIKE {p2}{esc} \
                 OR items.source IN (SELECT id FROM sources WHERE LOWER(title) LIKE {p3}{esc}))"
            ));
        }
    }

    // Tag and source filters are mutually exclusive; tag wins.
    if let Some(tag) = filter.tag.as_deref() {
        let param = dialect.csv_contains_param(tag);
        let p = sink.bind(param);
        clauses.push(format!(
            "items.source IN (SELECT id FROM sources WHERE {})",
            dialect.csv_contains("tags", &p)
        ));
    } else if let Some(source) = filter.source {
        let p = sink.bind(SqlParam::Int(source));
        clauses.push(format!("items.source={p}"));
    }

    if let Some(since) = filter.updated_since {
        let p = sink.bind(SqlParam::Timestamp(since));
        clauses.push(format!("items.updatetime>{p}"));
    }

    if !filter.privileged {
        clauses.push(marker_exclusion(dialect, PRIVATE_TAG_MARKER));
    }

    // Hidden-tagged items only surface when the request filters by that
    // exact hidden tag.
    let filtering_hidden = filter.tag.as_deref().is_some_and(is_hidden_tag);
    if !filtering_hidden {
        clauses.push(marker_exclusion(dialect, HIDDEN_TAG_MARKER));
    }

    let dir = if descending { "DESC" } else { "ASC" };
    ItemQuery {
        where_sql: clauses.join(" AND "),
        order_sql: format!("items.datetime {dir}, items.id {dir}"),
        params: sink.params,
    }
}

/// Predicate excluding items whose source carries a tag starting with
/// `marker`.
fn marker_exclusion(dialect: Dialect, marker: char) -> String {
    format!(
        "items.source NOT IN (SELECT id FROM sources WHERE {})",
        dialect.csv_has_marker("tags", marker)
    )
}

#[cfg(test)]
#[cfg(feature = "sqlite")]
mod tests {
    use super::*;

    fn filter() -> ItemFilter {
        ItemFilter { offset: 0, limit: 10, ..ItemFilter::default() }
    }

    #[test]
    fn unprivileged_query_excludes_both_markers() {
        let q = build_item_query(&filter(), &StoreConfig::default(), Dialect::Sqlite);
        assert!(q.params.is_empty());
        assert_eq!(q.where_sql.matches("NOT IN").count(), 2);
    }

    #[test]
    fn privileged_query_keeps_private_sources() {
        let mut f = filter();
        f.privileged = true;
        let q = build_item_query(&f, &StoreConfig::default(), Dialect::Sqlite);
        assert_eq!(q.where_sql.matches("NOT IN").count(), 1);
    }

    #[test]
    fn hidden_tag_filter_disables_hidden_exclusion() {
        let mut f = filter();
        f.privileged = true;
        f.tag = Some("#muted".to_owned());
        let q = build_item_query(&f, &StoreConfig::default(), Dialect::Sqlite);
        assert_eq!(q.where_sql.matches("NOT IN").count(), 0);
        assert!(q.where_sql.contains("items.source IN"));
    }

    #[test]
    fn tag_takes_precedence_over_source() {
        let mut f = filter();
        f.tag = Some("news".to_owned());
        f.source = Some(7);
        let q = build_item_query(&f, &StoreConfig::default(), Dialect::Sqlite);
        assert!(!q.where_sql.contains("items.source=?"));
        assert!(q.where_sql.contains("items.source IN"));
    }

    #[test]
    fn unread_order_preference_flips_direction() {
        let config = StoreConfig { unread_order: SortOrder::Asc, ..StoreConfig::default() };
        let mut f = filter();
        f.status = Some(StatusFilter::Unread);
        let q = build_item_query(&f, &config, Dialect::Sqlite);
        assert!(q.order_sql.contains("ASC"));

        let q = build_item_query(&filter(), &config, Dialect::Sqlite);
        assert!(q.order_sql.contains("DESC"));
    }

    #[test]
    fn search_terms_are_and_combined() {
        let mut f = filter();
        f.search = Some("Rust async".to_owned());
        f.privileged = true;
        let q = build_item_query(&f, &StoreConfig::default(), Dialect::Sqlite);
        // two terms x three columns
        assert_eq!(q.params.len(), 6);
        assert_eq!(q.where_sql.matches("LOWER(items.title)").count(), 2);
    }
}
