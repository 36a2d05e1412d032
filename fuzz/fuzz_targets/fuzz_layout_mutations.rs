#![no_main]

use arbitrary::Arbitrary;
use cardgrid_layout::{
    ArrangeOptions, Arrangement, CollisionMode, GridItem, GridOptions, ItemPatch, LayoutStore,
};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Op {
    Add { id: u8, x: u8, y: u8, w: u8, h: u8, auto: bool, fixed: u8 },
    Remove { id: u8 },
    Move { id: u8, x: u8, y: u8 },
    Resize { id: u8, w: u8, h: u8 },
    Lock { id: u8, locked: bool },
    Static { id: u8, is_static: bool },
    Batch { moves: Vec<(u8, u8, u8)> },
    Compact,
    Columns { column: u8 },
    Arrange { kind: u8, spacing: u8, tracks: u8 },
}

#[derive(Debug, Arbitrary)]
struct Input {
    column: u8,
    max_row: u8,
    mode: u8,
    float: bool,
    ops: Vec<Op>,
}

fn id(n: u8) -> String {
    format!("c{}", n % 16)
}

fuzz_target!(|input: Input| {
    let collision = match input.mode % 3 {
        0 => CollisionMode::Push,
        1 => CollisionMode::Swap,
        _ => CollisionMode::None,
    };
    let options = GridOptions::default()
        .with_column(u16::from(input.column % 24) + 1)
        .with_max_row(u16::from(input.max_row % 3) * 12)
        .with_collision(collision)
        .with_float(input.float);
    let Ok(mut store) = LayoutStore::new(options) else {
        return;
    };

    for op in input.ops.into_iter().take(64) {
        match op {
            Op::Add { id: n, x, y, w, h, auto, fixed } => {
                let item = GridItem::new(id(n), u16::from(w % 6) + 1, u16::from(h % 4) + 1);
                let item = if auto { item } else { item.at(u16::from(x % 24), u16::from(y % 16)) };
                let item = item.with_static(fixed % 8 == 0).with_locked(fixed % 8 == 1);
                let _ = store.add_item(item, false);
            }
            Op::Remove { id: n } => {
                store.remove_item(&id(n));
            }
            Op::Move { id: n, x, y } => {
                store.move_item(&id(n), u16::from(x % 24), u16::from(y % 16));
            }
            Op::Resize { id: n, w, h } => {
                store.resize_item(&id(n), u16::from(w % 8) + 1, u16::from(h % 6) + 1);
            }
            Op::Lock { id: n, locked } => {
                store.update_item(&id(n), &ItemPatch::default().locked(locked));
            }
            Op::Static { id: n, is_static } => {
                store.update_item(&id(n), &ItemPatch::default().static_item(is_static));
            }
            Op::Batch { moves } => {
                store.batch(|s| {
                    for (n, x, y) in moves.into_iter().take(8) {
                        s.move_item(&id(n), u16::from(x % 24), u16::from(y % 16));
                    }
                });
            }
            Op::Compact => {
                store.compact();
            }
            Op::Columns { column } => {
                let options = store.options().clone().with_column(u16::from(column % 24) + 1);
                let _ = store.set_options(options);
            }
            Op::Arrange { kind, spacing, tracks } => {
                let arrangement = match kind % 5 {
                    0 => Arrangement::Compact,
                    1 => Arrangement::Flow,
                    2 => Arrangement::Grid,
                    3 => Arrangement::Masonry,
                    _ => Arrangement::Columns,
                };
                let tuning = ArrangeOptions::default()
                    .with_spacing(u16::from(spacing % 4))
                    .with_tracks(u16::from(tracks % 8) + 1);
                let _ = store.arrange(arrangement, &tuning);
            }
        }
        // Post-condition after every operation.
        if let Err(violation) = store.check_invariants() {
            panic!("invariant broken: {violation}");
        }
    }
});
