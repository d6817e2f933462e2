#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use scrolltrial_core::{Axis, ScrollSession};

#[derive(Debug, Arbitrary)]
enum Move {
    By { vertical: bool, delta: i32 },
    To { vertical: bool, offset: i32 },
    Reset,
}

#[derive(Debug, Arbitrary)]
struct Input {
    content: (u16, u16),
    viewport: (u16, u16),
    moves: Vec<Move>,
}

fn axis(vertical: bool) -> Axis {
    if vertical { Axis::Vertical } else { Axis::Horizontal }
}

fuzz_target!(|input: Input| {
    let content = (i64::from(input.content.0), i64::from(input.content.1));
    let viewport = (i64::from(input.viewport.0), i64::from(input.viewport.1));
    let mut session = ScrollSession::grid(content, viewport);

    for m in input.moves.iter().take(256) {
        match *m {
            Move::By { vertical, delta } => {
                let before = session.offset(axis(vertical));
                let moved = session.move_by(axis(vertical), i64::from(delta));
                assert_eq!(moved, session.offset(axis(vertical)) != before);
            }
            Move::To { vertical, offset } => {
                session.scroll_to(axis(vertical), i64::from(offset));
            }
            Move::Reset => session.reset(),
        }

        // Offsets stay clamped to [0, max] on both axes.
        for a in [Axis::Vertical, Axis::Horizontal] {
            let offset = session.offset(a);
            assert!(offset >= 0 && offset <= session.max_offset(a));
        }
    }
});
