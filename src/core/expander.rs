/// Table expansion — resolves references and substitutes bracketed text.
///
/// A reference name is tried, in order, as:
///
/// 1. a table qualified against the current scope (`rank` → `card.rank`),
/// 2. a table under its raw name,
/// 3. a dice spec (`2d6+1`), rendered as its total,
/// 4. a range spec (`1-100`), rendered as its value,
/// 5. literal text, returned unchanged.
///
/// Text picked from a table has every `[name]` replaced by the resolution of
/// `name`, scoped to the picked table's own top-level name.
use rand::Rng;
use thiserror::Error;

use crate::core::choice;
use crate::core::config::{EngineConfig, DEFAULT_MAX_DEPTH};
use crate::core::dice::DiceSpec;
use crate::core::dice_registry::DiceRegistry;
use crate::core::range::RangeSpec;
use crate::core::tables::{Table, TableStore};
use crate::schema::die::DefaultFaces;
use crate::schema::table_name::{qualify, top_level};

const OPEN: char = '[';
const CLOSE: char = ']';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpandError {
    #[error("recursion limit of {limit} exceeded while expanding '{table}'")]
    RecursionLimitExceeded { limit: usize, table: String },
}

/// Expands table references against a borrowed store and dice registry.
#[derive(Debug, Clone)]
pub struct TableExpander<'a> {
    tables: &'a TableStore,
    dice: &'a DiceRegistry,
    default_faces: DefaultFaces,
    max_depth: usize,
}

impl<'a> TableExpander<'a> {
    pub fn new(tables: &'a TableStore, dice: &'a DiceRegistry) -> Self {
        Self {
            tables,
            dice,
            default_faces: DefaultFaces::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_config(
        tables: &'a TableStore,
        dice: &'a DiceRegistry,
        config: &EngineConfig,
    ) -> Self {
        Self {
            tables,
            dice,
            default_faces: config.default_faces(),
            max_depth: config.max_depth,
        }
    }

    pub fn default_faces(mut self, default_faces: DefaultFaces) -> Self {
        self.default_faces = default_faces;
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Look `name` up as a table: first qualified against `scope`, then raw.
    pub fn find_table(&self, name: &str, scope: Option<&str>) -> Option<&'a Table> {
        let qualified = qualify(scope, name);
        self.tables
            .get(&qualified)
            .or_else(|| self.tables.get(name))
    }

    /// Expand a user-requested table name.
    pub fn expand<R: Rng + ?Sized>(
        &self,
        table_name: &str,
        scope: Option<&str>,
        rng: &mut R,
    ) -> Result<String, ExpandError> {
        self.resolve_at(table_name, scope, 0, rng)
    }

    /// Resolve one reference through the table → dice → range → literal chain.
    pub fn resolve_reference<R: Rng + ?Sized>(
        &self,
        name: &str,
        scope: Option<&str>,
        rng: &mut R,
    ) -> Result<String, ExpandError> {
        self.resolve_at(name, scope, 0, rng)
    }

    /// Substitute every `[reference]` in free text, e.g. `"[card.rank] [card.suit]"`.
    pub fn expand_text<R: Rng + ?Sized>(
        &self,
        text: &str,
        scope: Option<&str>,
        rng: &mut R,
    ) -> Result<String, ExpandError> {
        self.substitute(text, scope, 0, rng)
    }

    fn resolve_at<R: Rng + ?Sized>(
        &self,
        name: &str,
        scope: Option<&str>,
        depth: usize,
        rng: &mut R,
    ) -> Result<String, ExpandError> {
        if let Some(table) = self.find_table(name, scope) {
            if depth >= self.max_depth {
                return Err(ExpandError::RecursionLimitExceeded {
                    limit: self.max_depth,
                    table: table.name.clone(),
                });
            }
            tracing::trace!(reference = name, table = %table.name, depth, "resolved as table");
            let Some(picked) = choice::choose(&table.alternatives, rng) else {
                return Ok(String::new());
            };
            return self.substitute(picked.text(), Some(top_level(&table.name)), depth + 1, rng);
        }

        if let Ok(spec) = DiceSpec::parse(name, &self.default_faces) {
            let total = spec.roll(self.dice, rng).total();
            tracing::trace!(reference = name, total, "resolved as dice");
            return Ok(total.to_string());
        }

        if let Ok(spec) = RangeSpec::parse(name) {
            let value = spec.roll(rng).value;
            tracing::trace!(reference = name, value, "resolved as range");
            return Ok(value.to_string());
        }

        tracing::trace!(reference = name, "passed through as literal");
        Ok(name.to_string())
    }

    /// Replace each `[name]` left to right. The first `]` after a `[` closes
    /// the reference; a `[` with no closing `]` stays as text.
    fn substitute<R: Rng + ?Sized>(
        &self,
        text: &str,
        scope: Option<&str>,
        depth: usize,
        rng: &mut R,
    ) -> Result<String, ExpandError> {
        let mut fragments = text.split(OPEN);
        let mut out = String::with_capacity(text.len());
        if let Some(head) = fragments.next() {
            out.push_str(head);
        }

        for fragment in fragments {
            match fragment.split_once(CLOSE) {
                Some((reference, rest)) => {
                    out.push_str(&self.resolve_at(reference, scope, depth, rng)?);
                    out.push_str(rest);
                }
                None => {
                    out.push(OPEN);
                    out.push_str(fragment);
                }
            }
        }
        Ok(out)
    }
}

/// Reference names in `text`, in order, using the same bracket rules as
/// expansion.
pub fn references(text: &str) -> impl Iterator<Item = &str> {
    text.split(OPEN)
        .skip(1)
        .filter_map(|fragment| fragment.split_once(CLOSE).map(|(name, _)| name))
}

/// Whether some `[` in `text` is never closed.
pub fn has_unclosed_reference(text: &str) -> bool {
    text.split(OPEN).skip(1).any(|fragment| !fragment.contains(CLOSE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::die::{Face, FaceSpec};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn test_store() -> TableStore {
        let mut store = TableStore::new();
        store
            .load_str(
                "card",
                ";main\n[rank] of [suit]\n;rank\nAce\nKing\n;suit\nSpades\nHearts\n",
            )
            .unwrap();
        store
            .load_str("npc", ";main\n[name] the [card.rank]\n;name\nMara\n;rank\nbaker\n")
            .unwrap();
        store
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn expands_nested_references() {
        let store = test_store();
        let dice = DiceRegistry::with_builtin();
        let expander = TableExpander::new(&store, &dice);
        let mut rng = rng();
        for _ in 0..20 {
            let text = expander.expand("card", None, &mut rng).unwrap();
            let (rank, suit) = text.split_once(" of ").unwrap();
            assert!(["Ace", "King"].contains(&rank), "{}", text);
            assert!(["Spades", "Hearts"].contains(&suit), "{}", text);
        }
    }

    #[test]
    fn references_resolve_in_own_scope() {
        let store = test_store();
        let dice = DiceRegistry::new();
        let expander = TableExpander::new(&store, &dice);
        let mut rng = rng();
        // `npc` refers to `card.rank` explicitly; its local `rank` must not leak.
        let text = expander.expand("npc", None, &mut rng).unwrap();
        assert!(text == "Mara the Ace" || text == "Mara the King", "{}", text);
    }

    #[test]
    fn scoped_lookup_prefers_qualified_name() {
        let store = test_store();
        let dice = DiceRegistry::new();
        let expander = TableExpander::new(&store, &dice);
        assert_eq!(expander.find_table("rank", Some("npc")).unwrap().name, "npc.rank");
        assert_eq!(expander.find_table("rank", Some("card")).unwrap().name, "card.rank");
        assert_eq!(expander.find_table("card", Some("npc")).unwrap().name, "card");
        assert!(expander.find_table("rank", None).is_none());
    }

    #[test]
    fn dice_fallback_renders_total() {
        let store = TableStore::new();
        let dice = DiceRegistry::new();
        let expander = TableExpander::new(&store, &dice);
        let mut rng = rng();
        for _ in 0..50 {
            let n: i64 = expander.resolve_reference("2d6+3", None, &mut rng).unwrap().parse().unwrap();
            assert!((5..=15).contains(&n));
        }
    }

    #[test]
    fn default_faces_apply_to_dice_fallback() {
        let store = TableStore::new();
        let dice = DiceRegistry::new();
        let expander =
            TableExpander::new(&store, &dice).default_faces(DefaultFaces(FaceSpec::Numeric(1)));
        let mut rng = rng();
        assert_eq!(expander.resolve_reference("3d", None, &mut rng).unwrap(), "3");
    }

    #[test]
    fn range_fallback_renders_value() {
        let store = TableStore::new();
        let dice = DiceRegistry::new();
        let expander = TableExpander::new(&store, &dice);
        let mut rng = rng();
        for _ in 0..50 {
            let n: i64 = expander.resolve_reference("-3>>5", None, &mut rng).unwrap().parse().unwrap();
            assert!((-3..=5).contains(&n));
        }
    }

    #[test]
    fn unknown_reference_is_literal() {
        let store = TableStore::new();
        let dice = DiceRegistry::new();
        let expander = TableExpander::new(&store, &dice);
        let mut rng = rng();
        assert_eq!(expander.resolve_reference("xyzzy", None, &mut rng).unwrap(), "xyzzy");
        assert_eq!(
            expander.expand_text("a [xyzzy] b", None, &mut rng).unwrap(),
            "a xyzzy b"
        );
    }

    #[test]
    fn unknown_custom_die_sums_to_modifier() {
        let store = TableStore::new();
        let dice = DiceRegistry::with_builtin();
        let expander = TableExpander::new(&store, &dice);
        let mut rng = rng();
        assert_eq!(expander.resolve_reference("2dQ", None, &mut rng).unwrap(), "0");
        assert_eq!(expander.resolve_reference("2dQ+4", None, &mut rng).unwrap(), "4");
    }

    #[test]
    fn oversized_modifier_is_literal() {
        let store = TableStore::new();
        let dice = DiceRegistry::new();
        let expander = TableExpander::new(&store, &dice);
        let mut rng = rng();
        let reference = "1d6+9223372036854775807";
        assert_eq!(
            expander.resolve_reference(reference, None, &mut rng).unwrap(),
            reference
        );
        assert_eq!(
            expander.expand_text("[1d6-99999999999999999999]!", None, &mut rng).unwrap(),
            "1d6-99999999999999999999!"
        );
    }

    #[test]
    fn huge_custom_faces_saturate() {
        let store = TableStore::new();
        let mut dice = DiceRegistry::new();
        dice.register("big", vec![Face::new(i64::MAX, "max")]);
        let expander = TableExpander::new(&store, &dice);
        let mut rng = rng();
        assert_eq!(
            expander.resolve_reference("2dbig", None, &mut rng).unwrap(),
            i64::MAX.to_string()
        );
    }

    #[test]
    fn zero_default_faces_falls_through() {
        let store = TableStore::new();
        let dice = DiceRegistry::new();
        let expander = TableExpander::new(&store, &dice)
            .default_faces(DefaultFaces(FaceSpec::Numeric(0)));
        let mut rng = rng();
        assert_eq!(expander.resolve_reference("2d", None, &mut rng).unwrap(), "2d");
        let total: i64 = expander
            .resolve_reference("2d4", None, &mut rng)
            .unwrap()
            .parse()
            .unwrap();
        assert!((2..=8).contains(&total));
    }

    #[test]
    fn tables_shadow_dice_names() {
        let mut store = TableStore::new();
        store.insert_alternatives("d6", ["a table, not a die"]);
        let dice = DiceRegistry::new();
        let expander = TableExpander::new(&store, &dice);
        let mut rng = rng();
        assert_eq!(
            expander.resolve_reference("d6", None, &mut rng).unwrap(),
            "a table, not a die"
        );
    }

    #[test]
    fn unclosed_bracket_stays_literal() {
        let store = test_store();
        let dice = DiceRegistry::new();
        let expander = TableExpander::new(&store, &dice);
        let mut rng = rng();
        assert_eq!(
            expander.expand_text("odd [ text", None, &mut rng).unwrap(),
            "odd [ text"
        );
        assert_eq!(
            expander.expand_text("stray ] close", None, &mut rng).unwrap(),
            "stray ] close"
        );
    }

    #[test]
    fn first_close_ends_reference() {
        let mut store = TableStore::new();
        store.insert_alternatives("a", ["A"]);
        let dice = DiceRegistry::new();
        let expander = TableExpander::new(&store, &dice);
        let mut rng = rng();
        assert_eq!(expander.expand_text("[a]]x", None, &mut rng).unwrap(), "A]x");
        assert_eq!(expander.expand_text("[[a]", None, &mut rng).unwrap(), "[A");
        assert_eq!(expander.expand_text("[a][a]", None, &mut rng).unwrap(), "AA");
    }

    #[test]
    fn plain_text_is_idempotent() {
        let store = test_store();
        let dice = DiceRegistry::new();
        let expander = TableExpander::new(&store, &dice);
        let mut rng = rng();
        let once = expander.expand("card", None, &mut rng).unwrap();
        let twice = expander.expand_text(&once, None, &mut rng).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn cyclic_tables_hit_recursion_limit() {
        let mut store = TableStore::new();
        store.load_str("loop", ";main\nagain [main2]\n;main2\n[loop]\n").unwrap();
        let dice = DiceRegistry::new();
        let expander = TableExpander::new(&store, &dice).max_depth(16);
        let mut rng = rng();
        let err = expander.expand("loop", None, &mut rng).unwrap_err();
        assert!(matches!(err, ExpandError::RecursionLimitExceeded { limit: 16, .. }));
    }

    #[test]
    fn depth_limit_counts_nesting_not_siblings() {
        let mut store = TableStore::new();
        store.insert_alternatives("leaf", ["x"]);
        store.insert_alternatives("wide", ["[leaf][leaf][leaf][leaf][leaf]"]);
        let dice = DiceRegistry::new();
        let expander = TableExpander::new(&store, &dice).max_depth(2);
        let mut rng = rng();
        assert_eq!(expander.expand("wide", None, &mut rng).unwrap(), "xxxxx");
    }

    #[test]
    fn empty_table_expands_to_nothing() {
        let mut store = TableStore::new();
        store.insert(Table::new("void", Vec::new()));
        let dice = DiceRegistry::new();
        let expander = TableExpander::new(&store, &dice);
        let mut rng = rng();
        assert_eq!(expander.expand_text("<[void]>", None, &mut rng).unwrap(), "<>");
    }

    #[test]
    fn same_seed_same_output() {
        let store = test_store();
        let dice = DiceRegistry::new();
        let expander = TableExpander::new(&store, &dice);
        let mut rng1 = StdRng::seed_from_u64(7);
        let mut rng2 = StdRng::seed_from_u64(7);
        for _ in 0..10 {
            assert_eq!(
                expander.expand("card", None, &mut rng1).unwrap(),
                expander.expand("card", None, &mut rng2).unwrap()
            );
        }
    }

    #[test]
    fn references_in_order() {
        let refs: Vec<&str> = references("[a] and [b.c] then [2d6]]").collect();
        assert_eq!(refs, vec!["a", "b.c", "2d6"]);
        assert_eq!(references("no refs ] here").count(), 0);
    }

    #[test]
    fn unclosed_reference_detection() {
        assert!(has_unclosed_reference("[a] [b"));
        assert!(!has_unclosed_reference("[a] b]"));
    }
}
