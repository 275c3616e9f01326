/// DDL generation: `CREATE TABLE`, plus the shadow full-text table and its
/// synchronization triggers for tables with analyzed columns
use crate::types::{Column, TableMetadata};

fn column_sql(name: &str, column: &Column) -> String {
    let mut sql = format!("{} {}", name, column.column_type.sql_type());
    if column.autoincrement && column.primary_key {
        sql.push_str(" PRIMARY KEY AUTOINCREMENT");
    }
    sql.push_str(if column.nullable { " NULL" } else { " NOT NULL" });
    sql
}

/// `CREATE TABLE` for the primary table
///
/// A single autoincrement key is declared inline. Any other key becomes a
/// trailing `PRIMARY KEY (...)` constraint; composite keys also get
/// `WITHOUT ROWID` so no implicit surrogate key exists.
pub fn create_table_sql(table: &TableMetadata) -> String {
    let mut defs: Vec<String> = table
        .columns
        .iter()
        .map(|(name, column)| column_sql(name, column))
        .collect();

    if !table.primary_key.is_empty() && table.autoincrement_key().is_none() {
        defs.push(format!("PRIMARY KEY ({})", table.primary_key.join(",")));
    }

    let mut sql = format!("CREATE TABLE {} (\n{}\n)", table.name, defs.join(",\n"));
    if table.has_composite_key() {
        sql.push_str(" WITHOUT ROWID");
    }
    sql
}

/// Virtual table plus after-insert/delete/update triggers; empty when no
/// column is analyzed
pub fn fts_statements(table: &TableMetadata) -> Vec<String> {
    let fts_table = match table.fts_table_name() {
        Some(name) => name,
        None => return Vec::new(),
    };

    let carried = table.fts_columns();
    let defs: Vec<String> = carried
        .iter()
        .map(|c| {
            let analyzed = table.column(c).map_or(false, |col| col.analyzed);
            if analyzed {
                c.to_string()
            } else {
                format!("{} UNINDEXED", c)
            }
        })
        .collect();

    let column_list = carried.join(", ");
    let values = |prefix: &str| {
        carried
            .iter()
            .map(|c| format!("{}.{}", prefix, c))
            .collect::<Vec<_>>()
            .join(", ")
    };
    let insert_new = format!(
        "INSERT INTO {} ({}) VALUES ({});",
        fts_table,
        column_list,
        values("new")
    );
    let delete_old = format!(
        "DELETE FROM {} WHERE {};",
        fts_table,
        table
            .primary_key
            .iter()
            .map(|k| format!("{} = old.{}", k, k))
            .collect::<Vec<_>>()
            .join(" AND ")
    );

    vec![
        format!(
            "CREATE VIRTUAL TABLE {} USING fts5({})",
            fts_table,
            defs.join(", ")
        ),
        format!(
            "CREATE TRIGGER {}_ai AFTER INSERT ON {} BEGIN {} END",
            fts_table, table.name, insert_new
        ),
        format!(
            "CREATE TRIGGER {}_ad AFTER DELETE ON {} BEGIN {} END",
            fts_table, table.name, delete_old
        ),
        // delete-then-reinsert so a changed row never matches twice
        format!(
            "CREATE TRIGGER {}_au AFTER UPDATE ON {} BEGIN {} {} END",
            fts_table, table.name, delete_old, insert_new
        ),
    ]
}

/// Every statement needed to create `table`, in execution order
pub fn create_statements(table: &TableMetadata) -> Vec<String> {
    let mut statements = vec![create_table_sql(table)];
    statements.extend(fts_statements(table));
    statements
}
