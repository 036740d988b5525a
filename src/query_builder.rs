use crate::translate::InternalQuery;

/// Quote an identifier unless it is a plain `[A-Za-z_][A-Za-z0-9_]*` word.
pub fn quote_ident(ident: &str) -> String {
    let plain = ident
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && ident.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        ident.to_string()
    } else {
        format!("\"{}\"", ident.replace('\\', "\\\\").replace('"', "\\\""))
    }
}

fn quote_value(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Build the WHERE clause: tag equality filters in key order, then the
/// exclusive nanosecond time bounds.
pub fn build_where_clause(query: &InternalQuery) -> String {
    let mut conditions: Vec<String> = query
        .tag_filter
        .iter()
        .map(|(k, v)| format!("{}={}", quote_ident(k), quote_value(v)))
        .collect();
    conditions.push(format!("time > {}", query.start));
    conditions.push(format!("time < {}", query.end));
    conditions.join(" AND ")
}

/// Render the SELECT statement sent to the backend.
pub fn build_select(query: &InternalQuery) -> String {
    let fields = query
        .fields
        .iter()
        .map(|f| quote_ident(f))
        .collect::<Vec<_>>()
        .join(",");
    format!(
        "SELECT {fields} FROM {} WHERE {}",
        quote_ident(&query.measurement),
        build_where_clause(query)
    )
}
