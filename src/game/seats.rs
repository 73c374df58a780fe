//! Table placement for opponents.
//!
//! Seats 1..=4 are the turn order; the local player always renders "south",
//! so each opponent gets one of the three remaining table spots. The N=3
//! mapping is a fixed lookup observed from the live game (note that seats 1
//! and 4 map identically); it is deliberately not derived from a rotation
//! formula.

use super::PlayerInGame;

/// Opponents assigned to the fixed table spots. `None` spots stay empty.
#[derive(Clone, Debug, Default)]
pub struct TableSeats<'a> {
    pub top: Option<&'a PlayerInGame>,
    pub left: Option<&'a PlayerInGame>,
    pub right: Option<&'a PlayerInGame>,
}

/// Places the opponents around the table relative to the local player's seat.
///
/// `opponents` is every player except the local one, in any order; they are
/// sorted by seat ascending before placement. `my_seat` is the local player's
/// seat number.
pub fn assign_seats<'a, I>(opponents: I, my_seat: i32) -> TableSeats<'a>
where
    I: IntoIterator<Item = &'a PlayerInGame>,
{
    let mut sorted: Vec<&PlayerInGame> = opponents.into_iter().collect();
    sorted.sort_by_key(|p| p.position);

    let mut seats = TableSeats::default();
    match sorted.len() {
        0 => {}
        1 => {
            seats.top = Some(sorted[0]);
        }
        2 => {
            // Two opponents split left/right; the lower-seated of the two
            // goes right, mirrored when the local player holds seat 2.
            seats.right = Some(sorted[0]);
            seats.left = Some(sorted[1]);
            if my_seat == 2 {
                std::mem::swap(&mut seats.right, &mut seats.left);
            }
        }
        _ => {
            let (right, top, left) = match my_seat {
                1 => (0, 1, 2),
                2 => (1, 2, 0),
                3 => (2, 0, 1),
                4 => (0, 1, 2),
                _ => return seats,
            };
            seats.right = Some(sorted[right]);
            seats.top = Some(sorted[top]);
            seats.left = Some(sorted[left]);
        }
    }
    seats
}
