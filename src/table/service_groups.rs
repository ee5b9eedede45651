//! The built-in `servicegroups` table
//!
//! An in-memory table of service groups with the aggregate service-state
//! counters attached to each group. The primary key is the group name.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::query::{QueryError, QueryResult};
use crate::table::{BasicCore, Column, ColumnType, Core, Row, Table, Value};

/// One service group with its aggregate state counters
#[derive(Debug, Clone, Default)]
pub struct ServiceGroup {
    pub name: String,
    pub alias: String,
    pub notes: String,
    /// Members as `host|service` pairs
    pub members: Vec<String>,
    pub num_ok: i64,
    pub num_warn: i64,
    pub num_crit: i64,
    pub num_unknown: i64,
    pub num_pending: i64,
}

impl ServiceGroup {
    pub fn new(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: alias.into(),
            ..Self::default()
        }
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn members(mut self, members: &[&str]) -> Self {
        self.members = members.iter().map(|m| m.to_string()).collect();
        self
    }

    pub fn service_states(
        mut self,
        ok: i64,
        warn: i64,
        crit: i64,
        unknown: i64,
        pending: i64,
    ) -> Self {
        self.num_ok = ok;
        self.num_warn = warn;
        self.num_crit = crit;
        self.num_unknown = unknown;
        self.num_pending = pending;
        self
    }

    fn num_services(&self) -> i64 {
        self.num_ok + self.num_warn + self.num_crit + self.num_unknown + self.num_pending
    }

    /// Worst soft state over the group, ordered OK <= WARN <= UNKNOWN <= CRIT.
    fn worst_service_state(&self) -> i64 {
        if self.num_crit > 0 {
            2
        } else if self.num_unknown > 0 {
            3
        } else if self.num_warn > 0 {
            1
        } else {
            0
        }
    }

    fn to_row(&self) -> Row {
        let mut fields = BTreeMap::new();
        fields.insert("name".to_string(), Value::Text(self.name.clone()));
        fields.insert("alias".to_string(), Value::Text(self.alias.clone()));
        fields.insert("notes".to_string(), Value::Text(self.notes.clone()));
        fields.insert("members".to_string(), Value::List(self.members.clone()));
        fields.insert(
            "worst_service_state".to_string(),
            Value::Int(self.worst_service_state()),
        );
        fields.insert("num_services".to_string(), Value::Int(self.num_services()));
        fields.insert("num_services_ok".to_string(), Value::Int(self.num_ok));
        fields.insert("num_services_warn".to_string(), Value::Int(self.num_warn));
        fields.insert("num_services_crit".to_string(), Value::Int(self.num_crit));
        fields.insert(
            "num_services_unknown".to_string(),
            Value::Int(self.num_unknown),
        );
        fields.insert(
            "num_services_pending".to_string(),
            Value::Int(self.num_pending),
        );
        Row::new(self.name.clone(), fields)
    }
}

/// In-memory `servicegroups` table
pub struct ServiceGroupsTable {
    columns: Vec<Arc<Column>>,
    rows: Vec<Row>,
    core: BasicCore,
}

impl ServiceGroupsTable {
    pub fn new(groups: Vec<ServiceGroup>) -> Self {
        let columns = vec![
            Arc::new(Column::new(
                "name",
                "The name of the service group",
                ColumnType::Text,
            )),
            Arc::new(Column::new(
                "alias",
                "An alias of the service group",
                ColumnType::Text,
            )),
            Arc::new(Column::new(
                "notes",
                "Optional additional notes about the service group",
                ColumnType::Text,
            )),
            Arc::new(Column::new(
                "members",
                "A list of all members of the service group as host/service pairs",
                ColumnType::TextList,
            )),
            Arc::new(Column::new(
                "worst_service_state",
                "The worst state of all of the groups' services (OK <= WARN <= UNKNOWN <= CRIT)",
                ColumnType::Int,
            )),
            Arc::new(Column::new(
                "num_services",
                "The total number of services in the group",
                ColumnType::Int,
            )),
            Arc::new(Column::new(
                "num_services_ok",
                "The number of services in the group that are OK",
                ColumnType::Int,
            )),
            Arc::new(Column::new(
                "num_services_warn",
                "The number of services in the group that are WARN",
                ColumnType::Int,
            )),
            Arc::new(Column::new(
                "num_services_crit",
                "The number of services in the group that are CRIT",
                ColumnType::Int,
            )),
            Arc::new(Column::new(
                "num_services_unknown",
                "The number of services in the group that are UNKNOWN",
                ColumnType::Int,
            )),
            Arc::new(Column::new(
                "num_services_pending",
                "The number of services in the group that are PENDING",
                ColumnType::Int,
            )),
        ];
        let rows = groups.iter().map(ServiceGroup::to_row).collect();
        Self {
            columns,
            rows,
            core: BasicCore,
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }
}

impl Table for ServiceGroupsTable {
    fn name(&self) -> &str {
        "servicegroups"
    }

    fn column(&self, name: &str) -> QueryResult<Arc<Column>> {
        self.columns
            .iter()
            .find(|c| c.name() == name)
            .cloned()
            .ok_or_else(|| QueryError::UnknownColumn {
                table: self.name().to_string(),
                column: name.to_string(),
            })
    }

    fn any_column(&self, visit: &mut dyn FnMut(&Arc<Column>) -> bool) {
        for column in &self.columns {
            if visit(column) {
                return;
            }
        }
    }

    fn get(&self, primary_key: &str) -> Option<Row> {
        self.rows.iter().find(|r| r.key() == primary_key).cloned()
    }

    fn core(&self) -> &dyn Core {
        &self.core
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ServiceGroupsTable {
        ServiceGroupsTable::new(vec![
            ServiceGroup::new("web", "Web Servers")
                .members(&["alpha|http", "beta|http"])
                .service_states(10, 1, 1, 0, 0),
            ServiceGroup::new("db", "Databases").service_states(4, 0, 0, 1, 0),
        ])
    }

    #[test]
    fn test_column_lookup() {
        let table = sample();
        assert_eq!(table.column("alias").unwrap().name(), "alias");
        assert_eq!(
            table.column("bogus").unwrap_err(),
            QueryError::UnknownColumn {
                table: "servicegroups".into(),
                column: "bogus".into(),
            }
        );
    }

    #[test]
    fn test_any_column_order_and_short_circuit() {
        let table = sample();
        let mut names = Vec::new();
        table.any_column(&mut |c| {
            names.push(c.name().to_string());
            false
        });
        assert_eq!(names.first().map(String::as_str), Some("name"));
        assert_eq!(names.len(), 11);

        let mut visited = 0;
        table.any_column(&mut |_| {
            visited += 1;
            visited == 3
        });
        assert_eq!(visited, 3);
    }

    #[test]
    fn test_primary_key_lookup() {
        let table = sample();
        assert_eq!(table.rows().len(), 2);
        let row = table.get("web").unwrap();
        assert_eq!(row.get("num_services"), Some(&Value::Int(12)));
        assert_eq!(row.get("worst_service_state"), Some(&Value::Int(2)));
        assert!(table.get("nosuchgroup").is_none());
    }

    #[test]
    fn test_row_derived_counters() {
        let table = sample();
        let row = table.get("db").unwrap();
        assert_eq!(row.get("num_services"), Some(&Value::Int(5)));
        // UNKNOWN outranks WARN and OK
        assert_eq!(row.get("worst_service_state"), Some(&Value::Int(3)));
    }
}
