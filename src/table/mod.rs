//! Table abstraction
//!
//! The parser sees a table through a narrow surface: look up a column by
//! name, enumerate all columns, fetch a row by primary key, and reach the
//! core that resolves auth users. Concrete tables implement [`Table`]; the
//! [`TableRegistry`] maps request table names onto them.

mod column;
mod row;
pub mod service_groups;

use std::collections::BTreeMap;
use std::sync::Arc;

pub use column::{Column, ColumnType, RelOp};
pub use row::{Row, Value};

use crate::auth::AuthUser;
use crate::query::QueryResult;

/// Process services shared by every table (user resolution today)
pub trait Core: Send + Sync {
    /// Resolve a user by name. Total: unknown names yield a user with no
    /// special rights rather than an error.
    fn find_user(&self, name: &str) -> AuthUser;
}

/// A queryable table of monitoring objects
pub trait Table: Send + Sync {
    /// The table name as it appears in requests.
    fn name(&self) -> &str;

    /// Look up a column by name.
    fn column(&self, name: &str) -> QueryResult<Arc<Column>>;

    /// Visit every column in table order until the visitor returns `true`.
    fn any_column(&self, visit: &mut dyn FnMut(&Arc<Column>) -> bool);

    /// Fetch the row selected by a primary key, if any.
    fn get(&self, primary_key: &str) -> Option<Row>;

    /// The core this table belongs to.
    fn core(&self) -> &dyn Core;
}

/// Core implementation backed by nothing but the request itself
///
/// Authorization policy is out of scope here; resolution just tags the plan
/// with the requested identity.
#[derive(Debug, Default)]
pub struct BasicCore;

impl Core for BasicCore {
    fn find_user(&self, name: &str) -> AuthUser {
        AuthUser::named(name)
    }
}

/// Name-to-table map for request dispatch
#[derive(Default)]
pub struct TableRegistry {
    tables: BTreeMap<String, Arc<dyn Table>>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, table: Arc<dyn Table>) {
        self.tables.insert(table.name().to_string(), table);
    }

    pub fn table(&self, name: &str) -> Option<Arc<dyn Table>> {
        self.tables.get(name).cloned()
    }

    /// Registered table names in sorted order.
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::service_groups::{ServiceGroup, ServiceGroupsTable};

    #[test]
    fn test_registry_dispatch() {
        let mut registry = TableRegistry::new();
        registry.register(Arc::new(ServiceGroupsTable::new(vec![
            ServiceGroup::new("web", "Web Servers"),
        ])));

        assert!(registry.table("servicegroups").is_some());
        assert!(registry.table("hosts").is_none());
        assert_eq!(registry.table_names(), vec!["servicegroups"]);
    }

    #[test]
    fn test_basic_core_is_total() {
        let core = BasicCore;
        let user = core.find_user("ops");
        assert_eq!(user.name(), Some("ops"));
    }
}
