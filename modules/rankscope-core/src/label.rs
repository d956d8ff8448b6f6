//! Position → bucket mapping and the visibility weight table.

use crate::types::{Label, Position};

/// Bucket for a rank position. Total and order-preserving.
///
/// Zero and negative positions are not rejected; they fall into `top-3`.
pub fn label(position: Position) -> Label {
    match position {
        Position::NotFound => Label::NotAvailable,
        Position::Ranked(p) if p <= 3 => Label::Top3,
        Position::Ranked(p) if p <= 10 => Label::Top10,
        Position::Ranked(p) if p <= 30 => Label::Top30,
        Position::Ranked(p) if p <= 100 => Label::Top100,
        Position::Ranked(_) => Label::Top1000,
    }
}

/// Click-through weight of a position. Unlike [`label`], the weight table
/// starts at 1, so zero and negative positions weigh nothing.
pub fn weight(position: Position) -> f64 {
    match position {
        Position::Ranked(1..=3) => 0.60,
        Position::Ranked(4..=10) => 0.30,
        Position::Ranked(11..=100) => 0.10,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_boundaries() {
        let cases = [
            (1, Label::Top3),
            (3, Label::Top3),
            (4, Label::Top10),
            (10, Label::Top10),
            (11, Label::Top30),
            (30, Label::Top30),
            (31, Label::Top100),
            (100, Label::Top100),
            (101, Label::Top1000),
            (5000, Label::Top1000),
        ];
        for (p, expected) in cases {
            assert_eq!(label(Position::Ranked(p)), expected, "position {p}");
        }
    }

    #[test]
    fn not_found_is_not_available() {
        assert_eq!(label(Position::NotFound), Label::NotAvailable);
        assert_eq!(weight(Position::NotFound), 0.0);
    }

    #[test]
    fn label_is_monotonic_in_position() {
        let mut previous = label(Position::Ranked(-5));
        for p in -5..=1200 {
            let current = label(Position::Ranked(p));
            assert!(current >= previous, "label regressed at {p}");
            assert_ne!(current, Label::NotAvailable);
            previous = current;
        }
    }

    // Known input-validation gap: non-positive positions are passed through.
    #[test]
    fn non_positive_positions_pass_through_to_top3() {
        assert_eq!(label(Position::Ranked(0)), Label::Top3);
        assert_eq!(label(Position::Ranked(-7)), Label::Top3);
        assert_eq!(weight(Position::Ranked(0)), 0.0);
        assert_eq!(weight(Position::Ranked(-7)), 0.0);
    }

    #[test]
    fn weight_table() {
        assert_eq!(weight(Position::Ranked(1)), 0.60);
        assert_eq!(weight(Position::Ranked(3)), 0.60);
        assert_eq!(weight(Position::Ranked(4)), 0.30);
        assert_eq!(weight(Position::Ranked(10)), 0.30);
        assert_eq!(weight(Position::Ranked(11)), 0.10);
        assert_eq!(weight(Position::Ranked(100)), 0.10);
        assert_eq!(weight(Position::Ranked(101)), 0.0);
    }
}
