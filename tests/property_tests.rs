//! Bounds hold for any sequence of commands.

use proptest::prelude::*;
use servoman::position::{Direction, Positioner, Span, StepIndex};

fn arb_direction() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::Left), Just(Direction::Right)]
}

proptest! {
    #[test]
    fn span_never_leaves_bounds(
        min in -10.0f64..10.0,
        width in 0.001f64..10.0,
        steps in 1u32..500,
        moves in proptest::collection::vec(arb_direction(), 0..300),
    ) {
        let max = min + width;
        let mut span = Span::new(min, max, steps);
        prop_assert!(span.position() >= min && span.position() <= max);

        for direction in moves {
            span.advance(direction);
            prop_assert!(
                span.position() >= min && span.position() <= max,
                "{} outside [{}, {}]", span.position(), min, max
            );
        }
    }

    #[test]
    fn step_index_never_leaves_bounds(
        steps in 1u32..1000,
        min in 0u32..100,
        extra in 1u32..=100,
        moves in proptest::collection::vec(arb_direction(), 0..300),
    ) {
        let max = (min + extra).min(100);
        prop_assume!(min < max);

        let mut index = StepIndex::new(50.0, steps, min, max);
        let (lo, hi) = index.bounds();
        for direction in moves {
            index.advance(direction);
            prop_assert!(index.position() >= lo && index.position() <= hi);
        }
    }

    #[test]
    fn repeated_moves_at_a_bound_are_no_ops(extra in 1usize..50) {
        let mut span = Span::new(0.0, 1.0, 20);
        for _ in 0..(20 + extra) {
            span.advance(Direction::Left);
        }
        prop_assert_eq!(span.position(), 1.0);

        let mut index = StepIndex::new(50.0, 100, 2, 13);
        for _ in 0..extra {
            index.advance(Direction::Right);
        }
        prop_assert_eq!(index.index(), 2);
    }
}
