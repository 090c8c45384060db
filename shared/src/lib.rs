use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const BOARD_SIZE: i32 = 500;
pub const ENTITY_SIZE: i32 = 10;
pub const MOVEMENT_STEP: i32 = 5;
pub const TICK_MILLIS: u64 = 20;
pub const MAX_PLAYERS: usize = 8;
pub const WIN_SCORE: u32 = 30;
pub const INITIAL_LENGTH: usize = 5;
pub const GROWTH_PER_FOOD: usize = 10;

/// Id returned by `CreatePlayer` when no slot is available.
pub const SPECTATOR_ID: u32 = 0;

/// Largest payload a single UDP datagram can carry over IPv4.
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

/// Player id -> occupied cells, head first.
pub type PlayerLocations = HashMap<u32, Vec<Rect>>;

/// Axis-aligned square on the board, in grid units with y growing downward.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Square of `size` with its top-left corner at `(x, y)`.
    pub fn square(x: i32, y: i32, size: i32) -> Self {
        Self::new(x, y, size, size)
    }

    pub fn get_bounds(&self) -> (i32, i32, i32, i32) {
        (self.x, self.y, self.x + self.width, self.y + self.height)
    }

    pub fn center(&self) -> (i32, i32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    /// Half-open containment: the right and bottom edges are outside.
    pub fn contains_point(&self, px: i32, py: i32) -> bool {
        let (x1, y1, x2, y2) = self.get_bounds();
        px >= x1 && px < x2 && py >= y1 && py < y2
    }

    /// Strict overlap. Rects that only share an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        let (x1, y1, x2, y2) = self.get_bounds();
        let (x3, y3, x4, y4) = other.get_bounds();

        !(x2 <= x3 || x4 <= x1 || y2 <= y3 || y4 <= y1)
    }

    pub fn translated(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    None,
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn opposite(self) -> Direction {
        match self {
            Direction::None => Direction::None,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Offset of one movement step in this direction.
    pub fn delta(self, step: i32) -> (i32, i32) {
        match self {
            Direction::None => (0, 0),
            Direction::Up => (0, -step),
            Direction::Down => (0, step),
            Direction::Left => (-step, 0),
            Direction::Right => (step, 0),
        }
    }
}

/// Scoreboard, message log and food position pushed to viewers.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct GameInformation {
    /// Ranked lines of the form `"1. name: score"`.
    pub scoreboard: Vec<String>,
    /// Newest first.
    pub messages: Vec<String>,
    pub food: Rect,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum Packet {
    // Viewer -> server
    CreatePlayer { name: String },
    DeletePlayer { id: u32 },
    UpdateDirection { id: u32, direction: Direction },
    Subscribe,
    Unsubscribe { subscription_id: u32 },
    IncrementSpectators,
    DecrementSpectators,
    /// Keeps the sender's players and subscriptions alive
    Heartbeat,

    // Server -> viewer
    PlayerCreated { id: u32 },
    Subscribed { subscription_id: u32 },
    InfoUpdate(GameInformation),
    PlayersUpdate { locations: PlayerLocations },
}

impl Packet {
    pub fn encode(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    pub fn decode(data: &[u8]) -> Result<Packet, bincode::Error> {
        bincode::deserialize(data)
    }

    /// Encoded size of a `PlayersUpdate` with `players` entries of `cells`
    /// cells each, saturating instead of overflowing.
    ///
    /// Mirrors bincode's default layout: a `u32` variant tag, `u64` length
    /// prefixes for the map and each list, a `u32` key per player and four
    /// `i32` fields per cell.
    pub fn players_update_len(players: usize, cells: usize) -> usize {
        let per_player = cells.saturating_mul(16).saturating_add(4 + 8);
        players.saturating_mul(per_player).saturating_add(4 + 8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_bounds() {
        let rect = Rect::square(50, 75, ENTITY_SIZE);
        let (x1, y1, x2, y2) = rect.get_bounds();
        assert_eq!(x1, 50);
        assert_eq!(y1, 75);
        assert_eq!(x2, 50 + ENTITY_SIZE);
        assert_eq!(y2, 75 + ENTITY_SIZE);
    }

    #[test]
    fn test_rect_center() {
        let rect = Rect::square(100, 200, ENTITY_SIZE);
        assert_eq!(rect.center(), (105, 205));
    }

    #[test]
    fn test_intersects_no_overlap() {
        let a = Rect::square(0, 0, ENTITY_SIZE);
        let b = Rect::square(100, 100, ENTITY_SIZE);
        assert!(!a.intersects(&b));
    }

    #[test]
    fn test_intersects_overlap() {
        let a = Rect::square(0, 0, ENTITY_SIZE);
        let b = Rect::square(5, 5, ENTITY_SIZE);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn test_intersects_exact_touch() {
        let a = Rect::square(0, 0, ENTITY_SIZE);
        let b = Rect::square(ENTITY_SIZE, 0, ENTITY_SIZE);
        assert!(!a.intersects(&b));
    }

    #[test]
    fn test_contains_point_is_half_open() {
        let rect = Rect::square(10, 10, ENTITY_SIZE);
        assert!(rect.contains_point(10, 10));
        assert!(rect.contains_point(19, 19));
        assert!(!rect.contains_point(20, 15));
        assert!(!rect.contains_point(15, 20));
        assert!(!rect.contains_point(9, 15));
    }

    #[test]
    fn test_translated_keeps_size() {
        let rect = Rect::square(10, 10, ENTITY_SIZE).translated(-5, 5);
        assert_eq!(rect, Rect::new(5, 15, ENTITY_SIZE, ENTITY_SIZE));
    }

    #[test]
    fn test_direction_opposites() {
        assert_eq!(Direction::Up.opposite(), Direction::Down);
        assert_eq!(Direction::Down.opposite(), Direction::Up);
        assert_eq!(Direction::Left.opposite(), Direction::Right);
        assert_eq!(Direction::Right.opposite(), Direction::Left);
        assert_eq!(Direction::None.opposite(), Direction::None);
    }

    #[test]
    fn test_direction_delta() {
        assert_eq!(Direction::Up.delta(MOVEMENT_STEP), (0, -5));
        assert_eq!(Direction::Down.delta(MOVEMENT_STEP), (0, 5));
        assert_eq!(Direction::Left.delta(MOVEMENT_STEP), (-5, 0));
        assert_eq!(Direction::Right.delta(MOVEMENT_STEP), (5, 0));
        assert_eq!(Direction::None.delta(MOVEMENT_STEP), (0, 0));
    }

    #[test]
    fn test_packet_serialization_update_direction() {
        let packet = Packet::UpdateDirection {
            id: 7,
            direction: Direction::Left,
        };
        let decoded = Packet::decode(&packet.encode().unwrap()).unwrap();

        match decoded {
            Packet::UpdateDirection { id, direction } => {
                assert_eq!(id, 7);
                assert_eq!(direction, Direction::Left);
            }
            _ => panic!("Wrong packet type after deserialization"),
        }
    }

    #[test]
    fn test_packet_serialization_players_update() {
        let mut locations = PlayerLocations::new();
        locations.insert(
            1,
            vec![Rect::square(20, 20, ENTITY_SIZE), Rect::square(15, 20, ENTITY_SIZE)],
        );
        locations.insert(2, vec![Rect::square(300, 400, ENTITY_SIZE)]);

        let packet = Packet::PlayersUpdate { locations };
        let decoded = Packet::decode(&packet.encode().unwrap()).unwrap();

        match decoded {
            Packet::PlayersUpdate { locations } => {
                assert_eq!(locations.len(), 2);
                assert_eq!(locations[&1][0], Rect::square(20, 20, ENTITY_SIZE));
                assert_eq!(locations[&1].len(), 2);
                assert_eq!(locations[&2].len(), 1);
            }
            _ => panic!("Wrong packet type after deserialization"),
        }
    }

    #[test]
    fn test_players_update_len_matches_encoding() {
        for (players, cells) in [(0, 0), (1, 1), (3, 7), (8, 295)] {
            let locations: PlayerLocations = (1..=players as u32)
                .map(|id| (id, vec![Rect::square(10, 10, ENTITY_SIZE); cells]))
                .collect();
            let encoded = Packet::PlayersUpdate { locations }.encode().unwrap();

            assert_eq!(encoded.len(), Packet::players_update_len(players, cells));
        }
    }

    #[test]
    fn test_players_update_len_saturates() {
        assert_eq!(Packet::players_update_len(usize::MAX, 10), usize::MAX);
        assert_eq!(Packet::players_update_len(2, usize::MAX), usize::MAX);
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(Packet::decode(&[]).is_err());
        assert!(Packet::decode(&[0xFF, 0xFF, 0xFF, 0xFF]).is_err());
    }
}
