use super::tables::{get_table, ALL_TABLES};
use super::types::TableSchema;
use std::collections::{HashMap, HashSet};

/// Resolves creation and drop order from foreign keys
pub struct DependencyResolver {
    /// Map of table name -> tables it depends on
    deps: HashMap<&'static str, HashSet<&'static str>>,
    /// Map of table name -> tables that depend on it
    reverse_deps: HashMap<&'static str, HashSet<&'static str>>,
}

impl DependencyResolver {
    pub fn new() -> Self {
        let mut deps: HashMap<&'static str, HashSet<&'static str>> = HashMap::new();
        let mut reverse_deps: HashMap<&'static str, HashSet<&'static str>> = HashMap::new();

        for table in ALL_TABLES {
            let table_deps = table.dependencies();
            deps.insert(table.name, table_deps.clone());

            for dep in table_deps {
                reverse_deps.entry(dep).or_default().insert(table.name);
            }
        }

        Self { deps, reverse_deps }
    }

    /// All tables, parents before children
    pub fn creation_order(&self) -> Result<Vec<&'static TableSchema>, String> {
        let names: Vec<&str> = ALL_TABLES.iter().map(|t| t.name).collect();
        self.topological_sort(&names)
    }

    /// Exact reverse of [`creation_order`](Self::creation_order)
    pub fn drop_order(&self) -> Result<Vec<&'static TableSchema>, String> {
        let mut order = self.creation_order()?;
        order.reverse();
        Ok(order)
    }

    /// Tables that hold a foreign key into `table`
    pub fn dependents_of(&self, table: &str) -> Vec<&'static str> {
        let mut dependents: Vec<&'static str> = self
            .reverse_deps
            .get(table)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        dependents.sort_unstable();
        dependents
    }

    /// Tables that `table` holds a foreign key into
    pub fn dependencies_of(&self, table: &str) -> Vec<&'static str> {
        let mut parents: Vec<&'static str> = self
            .deps
            .get(table)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        parents.sort_unstable();
        parents
    }

    /// Topological sort of tables by dependencies.
    ///
    /// Visits in registry order so the result is stable between runs.
    fn topological_sort(&self, included: &[&str]) -> Result<Vec<&'static TableSchema>, String> {
        let included_set: HashSet<&str> = included.iter().copied().collect();
        let mut result = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut temp_visited: HashSet<&str> = HashSet::new();

        for table_name in included {
            if !visited.contains(table_name) {
                self.visit(
                    table_name,
                    &included_set,
                    &mut visited,
                    &mut temp_visited,
                    &mut result,
                )?;
            }
        }

        Ok(result)
    }

    fn visit<'a>(
        &self,
        name: &'a str,
        included: &HashSet<&'a str>,
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

        temp_visited.insert(name);

        let table = get_table(name).ok_or_else(|| format!("Unknown table: {}", name))?;
        // Registry order of the parents keeps the sort deterministic
        for fk in table.foreign_keys {
            let dep = fk.references_table;
            if dep != name && included.contains(dep) {
                self.visit(dep, included, visited, temp_visited, result)?;
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
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(names: &[&str], name: &str) -> usize {
        names.iter().position(|&n| n == name).unwrap()
    }

    #[test]
    fn test_parents_created_before_children() {
        let resolver = DependencyResolver::new();
        let tables = resolver.creation_order().unwrap();
        let names: Vec<_> = tables.iter().map(|t| t.name).collect();
        assert_eq!(names.len(), 8);

        for table in &tables {
            for parent in table.dependencies() {
                assert!(
                    position(&names, parent) < position(&names, table.name),
                    "{} must come before {}",
                    parent,
                    table.name
                );
            }
        }
        assert_eq!(*names.last().unwrap(), "results");
    }

    #[test]
    fn test_drop_order_is_exact_reverse() {
        let resolver = DependencyResolver::new();
        let create: Vec<_> = resolver
            .creation_order()
            .unwrap()
            .iter()
            .map(|t| t.name)
            .collect();
        let mut drop: Vec<_> = resolver
            .drop_order()
            .unwrap()
            .iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(drop[0], "results");
        drop.reverse();
        assert_eq!(create, drop);
    }

    #[test]
    fn test_dependents() {
        let resolver = DependencyResolver::new();
        assert_eq!(resolver.dependents_of("sports"), vec!["events"]);
        assert_eq!(resolver.dependents_of("cities"), vec!["games"]);
        assert_eq!(resolver.dependents_of("countries"), vec!["results"]);
        assert!(resolver.dependents_of("results").is_empty());
        assert_eq!(
            resolver.dependencies_of("results"),
            vec!["athletes", "countries", "events", "games", "teams"]
        );
    }

    #[test]
    fn test_unknown_table_error() {
        let resolver = DependencyResolver::new();
        assert!(resolver.topological_sort(&["nonexistent"]).is_err());
    }
}
