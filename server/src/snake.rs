//! Player entity
//!
//! A snake is an ordered list of occupied cells with the head at index 0.
//! The entity only holds state; movement, growth and collision handling are
//! applied by the session so all rules live in one place.

use snake_shared::{Direction, Rect};

/// A player's snake and its per-session statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snake {
    /// Unique player identifier assigned by the session
    pub id: u32,
    /// Display name, unique among active players
    pub name: String,
    pub score: u32,
    /// Occupied cells, head first
    pub location: Vec<Rect>,
    /// Target number of cells; the tail is trimmed down to this
    pub length: usize,
    pub direction: Direction,
    /// Last direction requested by the player
    pub previous_direction: Direction,
}

impl Snake {
    /// Creates a stationary snake occupying a single cell
    ///
    /// Starts with no score and the given target length. The body grows
    /// toward `length` as the snake moves.
    pub fn new(id: u32, name: impl Into<String>, head: Rect, length: usize) -> Self {
        Self {
            id,
            name: name.into(),
            score: 0,
            location: vec![head],
            length,
            direction: Direction::None,
            previous_direction: Direction::None,
        }
    }

    pub fn head(&self) -> Rect {
        self.location[0]
    }

    /// Fresh snake at `head` with the same id and name
    pub fn respawn(&self, head: Rect, length: usize) -> Self {
        Self::new(self.id, self.name.clone(), head, length)
    }

    /// Cells behind the head
    pub fn body(&self) -> &[Rect] {
        &self.location[1..]
    }

    /// Whether `direction` may replace the current heading
    ///
    /// A request is ignored when it repeats the last request or would turn
    /// the snake straight back into its own neck.
    pub fn accepts_direction(&self, direction: Direction) -> bool {
        direction != Direction::None
            && direction != self.previous_direction
            && direction != self.previous_direction.opposite()
    }
}
