//! Entity-types command - prints the catalog of workflow targets

use crate::domain::entity::{EntityRegistry, KNOWN_ENTITY_TYPES};

/// Print every known entity type with its aliases
pub fn run() -> anyhow::Result<()> {
    super::bootstrap();

    for line in catalog_lines(&EntityRegistry::with_default_aliases()) {
        println!("{}", line);
    }
    Ok(())
}

fn catalog_lines(registry: &EntityRegistry) -> Vec<String> {
    let aliases = registry.aliases_by_code();
    KNOWN_ENTITY_TYPES
        .iter()
        .map(|code| match aliases.get(*code) {
            Some(names) => format!("{} (aliases: {})", code, names.join(", ")),
            None => code.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_lists_aliases_next_to_codes() {
        let lines = catalog_lines(&EntityRegistry::with_default_aliases());

        assert_eq!(lines.len(), KNOWN_ENTITY_TYPES.len());
        assert!(lines.contains(&"leave_request".to_string()));
        assert!(lines.contains(&"employee_loan (aliases: loan)".to_string()));
        assert!(lines.contains(&"full_final_settlement (aliases: fnf)".to_string()));
    }
}
