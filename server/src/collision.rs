//! Collision predicates evaluated by the tick loop
//!
//! All checks are pure: they read a snake and the board state and report a
//! hit without changing anything. The session decides what a hit means.

use crate::config::GameConfig;
use crate::snake::Snake;
use snake_shared::Rect;
use std::collections::BTreeMap;

/// True if the head has left `[0, board_size - entity_size]` on either axis.
pub fn wall_collision(head: &Rect, config: &GameConfig) -> bool {
    let max = config.max_coordinate();
    head.x < 0 || head.x > max || head.y < 0 || head.y > max
}

/// True if the head covers the center of one of the snake's own cells
///
/// The cells directly behind the head always overlap it, so the first
/// `config.self_check_skip()` cells, head included, are excluded. A snake
/// that has not grown past that window, such as one that just respawned,
/// never collides with itself.
pub fn self_collision(snake: &Snake, config: &GameConfig) -> bool {
    let skip = config.self_check_skip();
    if snake.location.len() <= skip {
        return false;
    }

    let head = snake.head();
    snake.body()[skip - 1..].iter().any(|segment| {
        let (cx, cy) = segment.center();
        head.contains_point(cx, cy)
    })
}

/// True if the head overlaps any cell of any other player.
pub fn enemy_collision(snake: &Snake, players: &BTreeMap<u32, Snake>) -> bool {
    let head = snake.head();
    players
        .values()
        .filter(|enemy| enemy.id != snake.id)
        .flat_map(|enemy| enemy.location.iter())
        .any(|segment| head.intersects(segment))
}

pub fn food_collision(snake: &Snake, food: &Rect) -> bool {
    snake.head().intersects(food)
}
