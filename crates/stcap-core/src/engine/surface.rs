use crate::engine::motif::{Exposure, MotifHit};
use std::collections::BTreeSet;

/// Marks hits whose loop touches an interface residue as surface-exposed.
///
/// A hit starting at `x` is checked over `[x, x + span]`, where the span depends on
/// the subtype. Hits without a match are left unflagged.
///
/// # Return
///
/// The number of hits flagged.
pub fn annotate_surface(hits: &mut [MotifHit], interface_indices: &BTreeSet<isize>) -> usize {
    let mut flagged = 0;
    for hit in hits.iter_mut() {
        let span = hit.subtype.surface_span();
        let touches = interface_indices
            .range(hit.start_index..=hit.start_index + span)
            .next()
            .is_some();
        if touches {
            hit.surface = Some(Exposure::Surface);
            flagged += 1;
        }
    }
    flagged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::motif::MotifSubtype;

    fn hit(start_index: isize, subtype: MotifSubtype) -> MotifHit {
        MotifHit {
            structure_id: "1ABC".to_string(),
            chain_id: 'A',
            start_index,
            subtype,
            surface: None,
        }
    }

    #[test]
    fn short_span_subtypes_stop_at_plus_three() {
        let mut hits = vec![hit(10, MotifSubtype::C1), hit(10, MotifSubtype::C2)];
        let flagged = annotate_surface(&mut hits, &BTreeSet::from([14]));
        assert_eq!(flagged, 1);
        assert_eq!(hits[0].surface, None);
        assert_eq!(hits[1].surface, Some(Exposure::Surface));
    }

    #[test]
    fn c1_hit_at_twenty_sees_twenty_two_but_not_twenty_five() {
        let mut hits = vec![hit(20, MotifSubtype::C1)];
        assert_eq!(annotate_surface(&mut hits, &BTreeSet::from([22])), 1);
        assert_eq!(hits[0].surface, Some(Exposure::Surface));

        let mut hits = vec![hit(20, MotifSubtype::C1)];
        assert_eq!(annotate_surface(&mut hits, &BTreeSet::from([25])), 0);
        assert_eq!(hits[0].surface, None);
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let mut hits = vec![hit(10, MotifSubtype::C3a), hit(20, MotifSubtype::C4)];
        annotate_surface(&mut hits, &BTreeSet::from([13, 20]));
        assert!(hits.iter().all(|h| h.surface == Some(Exposure::Surface)));
    }

    #[test]
    fn residues_outside_the_window_do_not_count() {
        let mut hits = vec![hit(10, MotifSubtype::C5)];
        let flagged = annotate_surface(&mut hits, &BTreeSet::from([9, 15]));
        assert_eq!(flagged, 0);
        assert_eq!(hits[0].surface, None);
    }

    #[test]
    fn empty_interface_flags_nothing() {
        let mut hits = vec![hit(1, MotifSubtype::C3)];
        assert_eq!(annotate_surface(&mut hits, &BTreeSet::new()), 0);
    }
}
