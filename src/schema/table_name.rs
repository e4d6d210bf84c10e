/// Table naming — qualification of local names against a top-level scope.
///
/// A table loaded from `dungeon.txt` under the section `;monster` is stored
/// as `dungeon.monster`; its `;main` section is stored as plain `dungeon`.
/// References inside a table are resolved relative to that top-level part.

/// Separator between the top-level scope and the local table name.
pub const QUALIFIER: char = '.';

/// Local section name that stands for the file's own top-level table.
pub const MAIN_SECTION: &str = "main";

/// Whether `name` already carries a scope.
pub fn is_qualified(name: &str) -> bool {
    name.contains(QUALIFIER)
}

/// Qualify `name` against `scope`. Names that already contain a qualifier,
/// or calls without a scope, come back unchanged.
pub fn qualify(scope: Option<&str>, name: &str) -> String {
    match scope {
        Some(scope) if !scope.is_empty() && !is_qualified(name) => {
            format!("{scope}{QUALIFIER}{name}")
        }
        _ => name.to_string(),
    }
}

/// The top-level scope of a stored table name: everything before the first
/// qualifier, or the whole name if unqualified.
pub fn top_level(name: &str) -> &str {
    match name.split_once(QUALIFIER) {
        Some((top, _)) => top,
        None => name,
    }
}

/// Tables offered in top-level pickers: only unqualified names.
pub fn is_visible(name: &str) -> bool {
    !is_qualified(name)
}

/// Store key for a section `local` found in the file with base name `file_base`.
pub fn section_key(file_base: &str, local: &str) -> String {
    if local.eq_ignore_ascii_case(MAIN_SECTION) {
        file_base.to_string()
    } else {
        format!("{file_base}{QUALIFIER}{local}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualify_unqualified_name() {
        assert_eq!(qualify(Some("card"), "rank"), "card.rank");
    }

    #[test]
    fn qualify_keeps_qualified_name() {
        assert_eq!(qualify(Some("card"), "dungeon.room"), "dungeon.room");
    }

    #[test]
    fn qualify_without_scope() {
        assert_eq!(qualify(None, "rank"), "rank");
        assert_eq!(qualify(Some(""), "rank"), "rank");
    }

    #[test]
    fn top_level_parts() {
        assert_eq!(top_level("card.rank"), "card");
        assert_eq!(top_level("card"), "card");
        assert_eq!(top_level("a.b.c"), "a");
    }

    #[test]
    fn visibility() {
        assert!(is_visible("card"));
        assert!(!is_visible("card.suit"));
    }

    #[test]
    fn main_section_maps_to_file_base() {
        assert_eq!(section_key("card", "main"), "card");
        assert_eq!(section_key("card", "MAIN"), "card");
        assert_eq!(section_key("card", "suit"), "card.suit");
    }
}
