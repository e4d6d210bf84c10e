/// Weighted random choice and the comma-separated choice-list syntax.
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::schema::alternative::Alternative;

/// Draw an index in proportion to `weights`.
///
/// `[0, total)` is split into contiguous buckets in sequence order, one per
/// weight, and a uniform draw picks the bucket. Zero weights are never picked.
/// If every weight is zero the last index is returned. `None` only for an
/// empty slice.
pub fn choose_index<R: Rng + ?Sized>(weights: &[u32], rng: &mut R) -> Option<usize> {
    if weights.is_empty() {
        return None;
    }
    match WeightedIndex::<u64>::new(weights.iter().map(|&w| u64::from(w))) {
        Ok(dist) => Some(dist.sample(rng)),
        Err(_) => Some(weights.len() - 1),
    }
}

/// Pick one alternative by weight.
pub fn choose<'a, R: Rng + ?Sized>(
    alternatives: &'a [Alternative],
    rng: &mut R,
) -> Option<&'a Alternative> {
    let weights: Vec<u32> = alternatives.iter().map(Alternative::weight).collect();
    choose_index(&weights, rng).map(|i| &alternatives[i])
}

/// Split `a, b, c` into trimmed choices of weight 1. Blank items are dropped.
pub fn parse_choice_list(input: &str) -> Vec<Alternative> {
    input
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(Alternative::from)
        .collect()
}

/// Pick uniformly from a comma-separated list.
pub fn choose_from_list<R: Rng + ?Sized>(input: &str, rng: &mut R) -> Option<String> {
    let choices = parse_choice_list(input);
    choose(&choices, rng).map(|alt| alt.text().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn empty_has_no_choice() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(choose_index(&[], &mut rng), None);
        assert!(choose(&[], &mut rng).is_none());
    }

    #[test]
    fn single_alternative_always_chosen() {
        let mut rng = StdRng::seed_from_u64(1);
        let alts = vec![Alternative::from("only")];
        for _ in 0..20 {
            assert_eq!(choose(&alts, &mut rng).unwrap().text(), "only");
        }
    }

    #[test]
    fn zero_weight_never_chosen() {
        let mut rng = StdRng::seed_from_u64(7);
        let alts = vec![
            Alternative::Weighted("never".to_string(), 0),
            Alternative::from("a"),
            Alternative::Weighted("also never".to_string(), 0),
            Alternative::from("b"),
        ];
        for _ in 0..500 {
            let text = choose(&alts, &mut rng).unwrap().text();
            assert!(text == "a" || text == "b", "picked {}", text);
        }
    }

    #[test]
    fn all_zero_falls_through_to_last() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(choose_index(&[0, 0, 0], &mut rng), Some(2));
    }

    #[test]
    fn weights_shape_distribution() {
        let mut rng = StdRng::seed_from_u64(42);
        let alts = vec![
            Alternative::Weighted("common".to_string(), 3),
            Alternative::from("rare"),
        ];
        let draws = 8000;
        let common = (0..draws)
            .filter(|_| choose(&alts, &mut rng).unwrap().text() == "common")
            .count();
        let share = common as f64 / draws as f64;
        assert!((0.70..0.80).contains(&share), "common share was {}", share);
    }

    #[test]
    fn deterministic_with_seed() {
        let alts: Vec<Alternative> = ["a", "b", "c", "d"].into_iter().map(Alternative::from).collect();
        let mut rng1 = StdRng::seed_from_u64(99);
        let mut rng2 = StdRng::seed_from_u64(99);
        for _ in 0..50 {
            assert_eq!(choose(&alts, &mut rng1), choose(&alts, &mut rng2));
        }
    }

    #[test]
    fn choice_list_is_trimmed() {
        let choices = parse_choice_list(" tea ,coffee,  water  ");
        let texts: Vec<&str> = choices.iter().map(Alternative::text).collect();
        assert_eq!(texts, vec!["tea", "coffee", "water"]);
        assert!(choices.iter().all(|c| c.weight() == 1));
    }

    #[test]
    fn choice_list_drops_blank_items() {
        assert_eq!(parse_choice_list("a,, ,b").len(), 2);
        assert!(parse_choice_list("  ").is_empty());
    }

    #[test]
    fn choose_from_list_picks_member() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..50 {
            let pick = choose_from_list("left, right, straight on", &mut rng).unwrap();
            assert!(["left", "right", "straight on"].contains(&pick.as_str()));
        }
        assert_eq!(choose_from_list("", &mut rng), None);
    }
}
