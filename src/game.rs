use serde::{Deserialize, Serialize};

pub mod rules;
pub mod seats;

/// Board side length. The board is always 6x6, row-major, index = posY*6+posX.
pub const BOARD_SIZE: i32 = 6;

pub type PlayerId = i64;
pub type RoomId = i64;
pub type GameId = i64;
pub type CardId = i64;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Color {
    R,
    G,
    B,
    Y,
}

/// The seven movement card shapes. Wire names are "mov01".."mov07".
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Movement {
    #[serde(rename = "mov01")]
    Mov1,
    #[serde(rename = "mov02")]
    Mov2,
    #[serde(rename = "mov03")]
    Mov3,
    #[serde(rename = "mov04")]
    Mov4,
    #[serde(rename = "mov05")]
    Mov5,
    #[serde(rename = "mov06")]
    Mov6,
    #[serde(rename = "mov07")]
    Mov7,
}

/// The 25 figure card shapes: 18 regular plus 7 "easy" ones.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Figure {
    Fig01,
    Fig02,
    Fig03,
    Fig04,
    Fig05,
    Fig06,
    Fig07,
    Fig08,
    Fig09,
    Fig10,
    Fig11,
    Fig12,
    Fig13,
    Fig14,
    Fig15,
    Fig16,
    Fig17,
    Fig18,
    Fige01,
    Fige02,
    Fige03,
    Fige04,
    Fige05,
    Fige06,
    Fige07,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct CoordsTile {
    #[serde(rename = "posX")]
    pub pos_x: i32,
    #[serde(rename = "posY")]
    pub pos_y: i32,
}

impl CoordsTile {
    pub fn new(pos_x: i32, pos_y: i32) -> CoordsTile {
        CoordsTile { pos_x, pos_y }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Tile {
    #[serde(rename = "posX")]
    pub pos_x: i32,
    #[serde(rename = "posY")]
    pub pos_y: i32,
    pub color: Color,
    /// True if this tile was moved during the current turn and the move is
    /// still pending confirmation (cancellable).
    #[serde(rename = "isPartial")]
    pub is_partial: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct MovementCard {
    #[serde(rename = "type")]
    pub kind: Movement,
    #[serde(rename = "cardID")]
    pub card_id: CardId,
    /// Consumed this turn, pending cancellation.
    #[serde(rename = "isUsed")]
    pub is_used: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct FigureCard {
    #[serde(rename = "type")]
    pub kind: Figure,
    #[serde(rename = "cardID")]
    pub card_id: CardId,
    #[serde(rename = "isBlocked")]
    pub is_blocked: bool,
}

/// Either kind of card a player can click. The original client told the two
/// apart by probing for an `isUsed`/`isBlocked` field; here it's an explicit
/// tagged union matched exhaustively.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PlayableCard {
    Movement(MovementCard),
    Figure(FigureCard),
}

impl PlayableCard {
    pub fn card_id(&self) -> CardId {
        match self {
            PlayableCard::Movement(card) => card.card_id,
            PlayableCard::Figure(card) => card.card_id,
        }
    }

    /// Cards are equal when they are the same kind of card with the same id.
    /// A movement card and a figure card never compare equal, even if the
    /// server were to hand out overlapping id spaces.
    pub fn same_card(&self, other: &PlayableCard) -> bool {
        match (self, other) {
            (PlayableCard::Movement(a), PlayableCard::Movement(b)) => a.card_id == b.card_id,
            (PlayableCard::Figure(a), PlayableCard::Figure(b)) => a.card_id == b.card_id,
            _ => false,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerInGame {
    /// Seat in the turn order, 1..=4. Distinct from table placement.
    pub position: i32,
    pub username: String,
    #[serde(rename = "playerID")]
    pub player_id: PlayerId,
    /// False once the player disconnected or abandoned the game.
    #[serde(rename = "isActive")]
    pub is_active: bool,
    /// Size of the face-down figure pile.
    #[serde(rename = "sizeDeckFigure")]
    pub size_deck_figure: i32,
    #[serde(rename = "cardsFigure")]
    pub cards_figure: Vec<FigureCard>,
    /// Fixed-length hand; `None` marks an empty slot.
    #[serde(rename = "cardsMovement")]
    pub cards_movement: Vec<Option<MovementCard>>,
}

impl PlayerInGame {
    pub fn holds_figure_card(&self, card: &PlayableCard) -> bool {
        self.cards_figure
            .iter()
            .any(|held| PlayableCard::Figure(*held).same_card(card))
    }

    pub fn has_used_movement(&self) -> bool {
        self.cards_movement
            .iter()
            .any(|slot| slot.map(|card| card.is_used).unwrap_or(false))
    }

    pub fn has_blocked_figure(&self) -> bool {
        self.cards_figure.iter().any(|card| card.is_blocked)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Game {
    #[serde(rename = "gameID")]
    pub game_id: GameId,
    /// 36 tiles, row-major.
    pub board: Vec<Tile>,
    /// Server-computed candidate figures currently formed on the board. Each
    /// entry is a connected set of cell coordinates. Never computed locally.
    #[serde(rename = "figuresToUse")]
    pub figures_to_use: Vec<Vec<CoordsTile>>,
    /// Color that may not be used to complete a figure this round.
    #[serde(rename = "prohibitedColor")]
    pub prohibited_color: Option<Color>,
    /// Seat whose turn it is.
    #[serde(rename = "posEnabledToPlay")]
    pub pos_enabled_to_play: i32,
    pub players: Vec<PlayerInGame>,
    /// Seconds remaining in the current turn.
    pub timer: i32,
}

impl Game {
    pub fn player(&self, player_id: PlayerId) -> Option<&PlayerInGame> {
        self.players.iter().find(|p| p.player_id == player_id)
    }

    /// The formed figure containing the given cell, if any.
    pub fn figure_at(&self, coords: CoordsTile) -> Option<&[CoordsTile]> {
        self.figures_to_use
            .iter()
            .find(|figure| figure.contains(&coords))
            .map(|figure| figure.as_slice())
    }

    /// Which player holds the given figure card.
    pub fn owner_of(&self, card: &PlayableCard) -> Option<&PlayerInGame> {
        self.players.iter().find(|p| p.holds_figure_card(card))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_wire_names() {
        let card = MovementCard {
            kind: Movement::Mov7,
            card_id: 3,
            is_used: false,
        };
        let j = serde_json::to_value(card).unwrap();
        assert_eq!(
            j,
            serde_json::json!({"type": "mov07", "cardID": 3, "isUsed": false})
        );
    }

    #[test]
    fn figure_wire_names() {
        let card = FigureCard {
            kind: Figure::Fige03,
            card_id: 9,
            is_blocked: true,
        };
        let j = serde_json::to_value(card).unwrap();
        assert_eq!(
            j,
            serde_json::json!({"type": "fige03", "cardID": 9, "isBlocked": true})
        );
        let back: FigureCard = serde_json::from_value(j).unwrap();
        assert_eq!(back, card);
    }

    #[test]
    fn same_card_requires_matching_kind() {
        let mov = PlayableCard::Movement(MovementCard {
            kind: Movement::Mov1,
            card_id: 7,
            is_used: false,
        });
        let fig = PlayableCard::Figure(FigureCard {
            kind: Figure::Fig01,
            card_id: 7,
            is_blocked: false,
        });
        assert!(!mov.same_card(&fig));
        assert!(mov.same_card(&mov));
    }

    #[test]
    fn game_snapshot_parses() {
        let j = serde_json::json!({
            "gameID": 1,
            "board": [
                {"posX": 0, "posY": 0, "color": "R", "isPartial": false}
            ],
            "figuresToUse": [[{"posX": 0, "posY": 0}]],
            "prohibitedColor": null,
            "posEnabledToPlay": 2,
            "players": [{
                "position": 2,
                "username": "ana",
                "playerID": 5,
                "isActive": true,
                "sizeDeckFigure": 10,
                "cardsFigure": [
                    {"type": "fig12", "cardID": 1, "isBlocked": false}
                ],
                "cardsMovement": [
                    {"type": "mov02", "cardID": 2, "isUsed": false},
                    null
                ]
            }],
            "timer": 120
        });
        let game: Game = serde_json::from_value(j).unwrap();
        assert_eq!(game.pos_enabled_to_play, 2);
        assert!(game.prohibited_color.is_none());
        let player = game.player(5).unwrap();
        assert_eq!(player.cards_movement.len(), 2);
        assert!(player.cards_movement[1].is_none());
        assert!(game.figure_at(CoordsTile::new(0, 0)).is_some());
        assert!(game.figure_at(CoordsTile::new(3, 3)).is_none());
    }
}
