use super::tables::ALL_TABLES;
use super::types::TableSchema;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Orders tables so foreign-key parents come before their children
pub struct DependencyResolver {
    tables: Vec<&'static TableSchema>,
    /// Map of table name -> tables it depends on
    deps: HashMap<&'static str, BTreeSet<&'static str>>,
}

impl DependencyResolver {
    pub fn new(tables: &[&'static TableSchema]) -> Self {
        let deps = tables
            .iter()
            .map(|t| (t.name, t.dependencies().into_iter().collect()))
            .collect();

        Self {
            tables: tables.to_vec(),
            deps,
        }
    }

    /// Tables in insert order (parents before children)
    pub fn insert_order(&self) -> Result<Vec<&'static TableSchema>, String> {
        let mut result = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut temp_visited: HashSet<&str> = HashSet::new();

        for table in &self.tables {
            self.visit(table.name, &mut visited, &mut temp_visited, &mut result)?;
        }

        Ok(result)
    }

    /// Tables in delete order (children before parents)
    pub fn delete_order(&self) -> Result<Vec<&'static TableSchema>, String> {
        let mut order = self.insert_order()?;
        order.reverse();
        Ok(order)
    }

    fn visit<'a>(
        &self,
        name: &'a str,
        visited: &mut HashSet<&'a str>,
        temp_visited: &mut HashSet<&'a str>,
        result: &mut Vec<&'static TableSchema>,
    ) -> Result<(), String> {
        if temp_visited.contains(name) {
            return Err(format!("Circular dependency detected at: {}", name));
        }
        if visited.contains(name) {
            return Ok(());
        }

        let table = self
            .tables
            .iter()
            .find(|t| t.name == name)
            .copied()
            .ok_or_else(|| format!("Unknown table: {}", name))?;

        temp_visited.insert(name);

        if let Some(deps) = self.deps.get(name) {
            for dep in deps {
                if *dep != name {
                    self.visit(*dep, visited, temp_visited, result)?;
                }
            }
        }

        temp_visited.remove(name);
        visited.insert(name);
        result.push(table);

        Ok(())
    }
}

impl Default for DependencyResolver {
    fn default() -> Self {
        Self::new(ALL_TABLES)
    }
}

/// Insert order for the store's tables
pub fn load_order() -> Result<Vec<&'static TableSchema>, String> {
    DependencyResolver::default().insert_order()
}
