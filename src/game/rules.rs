//! Pure legality and rendering-annotation rules for the 6x6 board.
//!
//! Nothing here touches network or stores; the server remains the source of
//! truth and these checks only exist to reject gestures without a round-trip.

use super::{Color, CoordsTile, Game, Movement, PlayableCard, Tile, BOARD_SIZE};

/// Offset tables for the fixed-shape movement cards. Mov7 is not offset-based
/// and is handled separately.
const MOV1_OFFSETS: [(i32, i32); 4] = [(2, 2), (-2, -2), (2, -2), (-2, 2)];
const MOV2_OFFSETS: [(i32, i32); 4] = [(2, 0), (-2, 0), (0, -2), (0, 2)];
const MOV3_OFFSETS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, -1), (0, 1)];
const MOV4_OFFSETS: [(i32, i32); 4] = [(1, 1), (-1, -1), (1, -1), (-1, 1)];
const MOV5_OFFSETS: [(i32, i32); 4] = [(-2, 1), (1, 2), (2, -1), (-1, -2)];
const MOV6_OFFSETS: [(i32, i32); 4] = [(-1, 2), (-2, -1), (1, -2), (2, 1)];

fn matches_offsets(candidate: CoordsTile, origin: CoordsTile, offsets: &[(i32, i32)]) -> bool {
    offsets.iter().any(|&(dx, dy)| {
        candidate.pos_x == origin.pos_x + dx && candidate.pos_y == origin.pos_y + dy
    })
}

/// Mov7 moves a token to an extreme edge cell of its own row or column. The
/// origin itself is never a legal destination.
fn matches_edge_wrap(candidate: CoordsTile, origin: CoordsTile) -> bool {
    if candidate == origin {
        return false;
    }
    let edge = BOARD_SIZE - 1;
    (candidate.pos_x == origin.pos_x && (candidate.pos_y == edge || candidate.pos_y == 0))
        || (candidate.pos_y == origin.pos_y && (candidate.pos_x == 0 || candidate.pos_x == edge))
}

/// Whether `candidate` is a legal destination when moving from `origin` with
/// the given movement shape.
pub fn legal_movement(candidate: CoordsTile, origin: CoordsTile, movement: Movement) -> bool {
    match movement {
        Movement::Mov1 => matches_offsets(candidate, origin, &MOV1_OFFSETS),
        Movement::Mov2 => matches_offsets(candidate, origin, &MOV2_OFFSETS),
        Movement::Mov3 => matches_offsets(candidate, origin, &MOV3_OFFSETS),
        Movement::Mov4 => matches_offsets(candidate, origin, &MOV4_OFFSETS),
        Movement::Mov5 => matches_offsets(candidate, origin, &MOV5_OFFSETS),
        Movement::Mov6 => matches_offsets(candidate, origin, &MOV6_OFFSETS),
        Movement::Mov7 => matches_edge_wrap(candidate, origin),
    }
}

/// Destination legality for whatever card is selected. Figure cards never
/// legalize a movement.
pub fn legal_destination(
    candidate: CoordsTile,
    origin: CoordsTile,
    card: &PlayableCard,
) -> bool {
    match card {
        PlayableCard::Movement(mov) => legal_movement(candidate, origin, mov.kind),
        PlayableCard::Figure(_) => false,
    }
}

/// Per-cell figure-boundary marks, used to draw the outline of the formed
/// figures on the board.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct BoundaryMarks {
    pub top: bool,
    pub right: bool,
    pub bottom: bool,
    pub left: bool,
    pub background: bool,
}

impl BoundaryMarks {
    pub const NONE: BoundaryMarks = BoundaryMarks {
        top: false,
        right: false,
        bottom: false,
        left: false,
        background: false,
    };
}

/// Computes the boundary marks for one cell against every formed figure.
///
/// For each figure containing the cell, all five marks are raised and then
/// the directional ones lowered where a neighbor in the same figure exists:
/// top pairs with (x-1, y), bottom with (x+1, y), right with (x, y+1), left
/// with (x, y-1). Marks accumulate across overlapping figures. A cell whose
/// color equals the prohibited color is forced all-false at the end: a banned
/// color may never present as part of a valid figure, even visually.
pub fn mark_boundaries(
    cell: CoordsTile,
    figures: &[Vec<CoordsTile>],
    cell_color: Color,
    prohibited_color: Option<Color>,
) -> BoundaryMarks {
    let mut marks = BoundaryMarks::default();

    for figure in figures {
        if !figure.contains(&cell) {
            continue;
        }
        let mut single = BoundaryMarks {
            top: true,
            right: true,
            bottom: true,
            left: true,
            background: true,
        };

        if figure.contains(&CoordsTile::new(cell.pos_x, cell.pos_y + 1)) {
            single.right = false;
        }
        if figure.contains(&CoordsTile::new(cell.pos_x, cell.pos_y - 1)) {
            single.left = false;
        }
        if figure.contains(&CoordsTile::new(cell.pos_x + 1, cell.pos_y)) {
            single.bottom = false;
        }
        if figure.contains(&CoordsTile::new(cell.pos_x - 1, cell.pos_y)) {
            single.top = false;
        }

        marks.top |= single.top;
        marks.right |= single.right;
        marks.bottom |= single.bottom;
        marks.left |= single.left;
        marks.background |= single.background;
    }

    if prohibited_color == Some(cell_color) {
        return BoundaryMarks::NONE;
    }
    marks
}

/// A board tile plus the client-only rendering annotations. Derived state,
/// never transmitted.
#[derive(Clone, Copy, Debug)]
pub struct ExtendedTile {
    pub tile: Tile,
    /// Legal destination under the currently selected movement card.
    pub is_highlighted: bool,
    pub marks: BoundaryMarks,
}

/// Projects the game board into its annotated form for the current selection.
pub fn extended_board(
    game: &Game,
    selected_tile: Option<CoordsTile>,
    selected_card: Option<&PlayableCard>,
) -> Vec<ExtendedTile> {
    game.board
        .iter()
        .map(|tile| {
            let coords = CoordsTile::new(tile.pos_x, tile.pos_y);
            let is_highlighted = match (selected_tile, selected_card) {
                (Some(origin), Some(card)) => legal_destination(coords, origin, card),
                _ => false,
            };
            ExtendedTile {
                tile: *tile,
                is_highlighted,
                marks: mark_boundaries(
                    coords,
                    &game.figures_to_use,
                    tile.color,
                    game.prohibited_color,
                ),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{FigureCard, Figure, MovementCard};

    fn mov(kind: Movement) -> PlayableCard {
        PlayableCard::Movement(MovementCard {
            kind,
            card_id: 1,
            is_used: false,
        })
    }

    fn expected_offsets(movement: Movement) -> Vec<(i32, i32)> {
        match movement {
            Movement::Mov1 => vec![(2, 2), (-2, -2), (2, -2), (-2, 2)],
            Movement::Mov2 => vec![(2, 0), (-2, 0), (0, -2), (0, 2)],
            Movement::Mov3 => vec![(1, 0), (-1, 0), (0, -1), (0, 1)],
            Movement::Mov4 => vec![(1, 1), (-1, -1), (1, -1), (-1, 1)],
            Movement::Mov5 => vec![(-2, 1), (1, 2), (2, -1), (-1, -2)],
            Movement::Mov6 => vec![(-1, 2), (-2, -1), (1, -2), (2, 1)],
            Movement::Mov7 => unreachable!("mov7 is not offset-based"),
        }
    }

    #[test]
    fn offset_movements_match_tables_exhaustively() {
        let shapes = [
            Movement::Mov1,
            Movement::Mov2,
            Movement::Mov3,
            Movement::Mov4,
            Movement::Mov5,
            Movement::Mov6,
        ];
        for shape in shapes {
            let offsets = expected_offsets(shape);
            for ox in 0..BOARD_SIZE {
                for oy in 0..BOARD_SIZE {
                    for cx in 0..BOARD_SIZE {
                        for cy in 0..BOARD_SIZE {
                            let origin = CoordsTile::new(ox, oy);
                            let candidate = CoordsTile::new(cx, cy);
                            let expected =
                                offsets.iter().any(|&(dx, dy)| cx == ox + dx && cy == oy + dy);
                            assert_eq!(
                                legal_movement(candidate, origin, shape),
                                expected,
                                "{:?} {:?} -> {:?}",
                                shape,
                                origin,
                                candidate
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn mov7_reaches_row_and_column_edges_only() {
        let origin = CoordsTile::new(2, 3);
        // Own row and column extremes.
        assert!(legal_movement(CoordsTile::new(0, 3), origin, Movement::Mov7));
        assert!(legal_movement(CoordsTile::new(5, 3), origin, Movement::Mov7));
        assert!(legal_movement(CoordsTile::new(2, 0), origin, Movement::Mov7));
        assert!(legal_movement(CoordsTile::new(2, 5), origin, Movement::Mov7));
        // Edge cells outside the origin's row/column are illegal.
        assert!(!legal_movement(CoordsTile::new(0, 0), origin, Movement::Mov7));
        assert!(!legal_movement(CoordsTile::new(5, 5), origin, Movement::Mov7));
        // Interior cells are illegal.
        assert!(!legal_movement(CoordsTile::new(3, 3), origin, Movement::Mov7));
    }

    #[test]
    fn mov7_own_cell_is_illegal_even_on_the_edge() {
        let origin = CoordsTile::new(0, 0);
        assert!(!legal_movement(origin, origin, Movement::Mov7));
        assert!(legal_movement(CoordsTile::new(0, 5), origin, Movement::Mov7));
        assert!(legal_movement(CoordsTile::new(5, 0), origin, Movement::Mov7));
    }

    #[test]
    fn figure_card_never_legalizes_a_destination() {
        let card = PlayableCard::Figure(FigureCard {
            kind: Figure::Fig05,
            card_id: 2,
            is_blocked: false,
        });
        for cx in 0..BOARD_SIZE {
            for cy in 0..BOARD_SIZE {
                assert!(!legal_destination(
                    CoordsTile::new(cx, cy),
                    CoordsTile::new(2, 2),
                    &card
                ));
            }
        }
    }

    #[test]
    fn offsets_leaving_the_board_simply_never_match() {
        // Origin at a corner: most mov1 offsets land off-board and there is
        // no wrapping.
        let origin = CoordsTile::new(0, 0);
        let legal: Vec<_> = (0..BOARD_SIZE)
            .flat_map(|x| (0..BOARD_SIZE).map(move |y| CoordsTile::new(x, y)))
            .filter(|c| legal_movement(*c, origin, Movement::Mov1))
            .collect();
        assert_eq!(legal, vec![CoordsTile::new(2, 2)]);
    }

    fn l_figure() -> Vec<CoordsTile> {
        vec![
            CoordsTile::new(1, 1),
            CoordsTile::new(2, 1),
            CoordsTile::new(2, 2),
        ]
    }

    #[test]
    fn boundary_marks_clear_toward_figure_neighbors() {
        let figures = vec![l_figure()];
        // (1,1) has a neighbor at (2,1): x+1 clears bottom.
        let marks = mark_boundaries(CoordsTile::new(1, 1), &figures, Color::R, None);
        assert_eq!(
            marks,
            BoundaryMarks {
                top: true,
                right: true,
                bottom: false,
                left: true,
                background: true
            }
        );
        // (2,1) has neighbors at (1,1) (x-1, clears top) and (2,2) (y+1,
        // clears right).
        let marks = mark_boundaries(CoordsTile::new(2, 1), &figures, Color::G, None);
        assert_eq!(
            marks,
            BoundaryMarks {
                top: false,
                right: false,
                bottom: true,
                left: true,
                background: true
            }
        );
    }

    #[test]
    fn cell_outside_every_figure_gets_no_marks() {
        let figures = vec![l_figure()];
        let marks = mark_boundaries(CoordsTile::new(4, 4), &figures, Color::B, None);
        assert_eq!(marks, BoundaryMarks::NONE);
    }

    #[test]
    fn prohibited_color_forces_all_marks_off() {
        let figures = vec![l_figure()];
        let marks = mark_boundaries(CoordsTile::new(1, 1), &figures, Color::Y, Some(Color::Y));
        assert_eq!(marks, BoundaryMarks::NONE);
    }

    #[test]
    fn marks_accumulate_across_overlapping_figures_order_independent() {
        let a = l_figure();
        let b = vec![CoordsTile::new(1, 1), CoordsTile::new(1, 2)];
        let forward = mark_boundaries(
            CoordsTile::new(1, 1),
            &[a.clone(), b.clone()],
            Color::R,
            None,
        );
        let reversed = mark_boundaries(CoordsTile::new(1, 1), &[b, a], Color::R, None);
        assert_eq!(forward, reversed);
        // Figure `a` clears bottom, figure `b` keeps it raised: a direction
        // stays marked if any containing figure marks it.
        assert!(forward.bottom);
        assert!(forward.right);
        assert!(forward.background);
    }

    #[test]
    fn extended_board_highlights_only_with_movement_selection() {
        let game = test_game();
        let card = mov(Movement::Mov2);
        let board = extended_board(&game, Some(CoordsTile::new(1, 1)), Some(&card));
        let highlighted: Vec<_> = board
            .iter()
            .filter(|t| t.is_highlighted)
            .map(|t| (t.tile.pos_x, t.tile.pos_y))
            .collect();
        assert_eq!(highlighted, vec![(3, 1), (1, 3)]);

        // Without a selected tile nothing lights up.
        let board = extended_board(&game, None, Some(&card));
        assert!(board.iter().all(|t| !t.is_highlighted));
    }

    fn test_game() -> Game {
        let mut board = Vec::new();
        for y in 0..BOARD_SIZE {
            for x in 0..BOARD_SIZE {
                board.push(Tile {
                    pos_x: x,
                    pos_y: y,
                    color: Color::R,
                    is_partial: false,
                });
            }
        }
        Game {
            game_id: 1,
            board,
            figures_to_use: vec![],
            prohibited_color: None,
            pos_enabled_to_play: 1,
            players: vec![],
            timer: 60,
        }
    }
}
