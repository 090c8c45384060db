//! Authoritative game session
//!
//! The session owns every piece of mutable game state: the players, the
//! food, the scoreboard, the message log and the spectator counter. It is
//! driven from a single task (see `game_server`), so none of its methods
//! need internal locking and a tick always runs to completion before the
//! next request is applied.
//!
//! ## Lifecycle
//!
//! A session starts `Idle`. The first player to join starts the clock
//! (`Running`) and places the food; the last player to leave stops it again.
//! When a player reaches the win score the session moves to `Over` and
//! stays there: further requests are accepted but have no gameplay effect.

use crate::collision::{enemy_collision, food_collision, self_collision, wall_collision};
use crate::config::{GameConfig, MessageLevel};
use crate::error::SessionError;
use crate::snake::Snake;
use crate::subscribers::{SubscriberRegistry, Update, UpdateReceiver};
use log::{debug, info, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use snake_shared::{Direction, GameInformation, PlayerLocations, Rect, SPECTATOR_ID};
use std::collections::{BTreeMap, HashMap};

/// Attempts at finding an unoccupied cell before settling for any cell
const PLACEMENT_ATTEMPTS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// No players, clock stopped
    Idle,
    /// At least one player, clock ticking
    Running,
    /// Someone reached the win score; permanent
    Over,
}

pub struct GameSession {
    config: GameConfig,
    /// Active players by id, iterated in ascending id order each tick
    players: BTreeMap<u32, Snake>,
    food: Rect,
    /// Player name -> score, mirrors `Snake::score`
    scoreboard: HashMap<String, u32>,
    /// Visible messages, newest first
    messages: Vec<String>,
    spectators: u32,
    phase: GamePhase,
    next_player_id: u32,
    tick: u64,
    rng: StdRng,
    subscribers: SubscriberRegistry,
}

impl GameSession {
    /// Creates an idle session that pushes updates through `subscribers`.
    pub fn new(config: GameConfig, subscribers: SubscriberRegistry) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let food = Rect::square(0, 0, config.entity_size);

        let mut session = Self {
            config,
            players: BTreeMap::new(),
            food,
            scoreboard: HashMap::new(),
            messages: Vec::new(),
            spectators: 0,
            phase: GamePhase::Idle,
            next_player_id: 1,
            tick: 0,
            rng,
            subscribers,
        };

        let tick_ms = session.config.tick_period.as_millis();
        let entity_size = session.config.entity_size;
        let step = session.config.movement_step;
        session.post_message(MessageLevel::Debug, format!("Gamespeed: {} milliseconds", tick_ms));
        session.post_message(MessageLevel::Debug, format!("Snake Size: {}", entity_size));
        session.post_message(MessageLevel::Debug, format!("Food Size: {}", entity_size));
        session.post_message(MessageLevel::Debug, format!("Movement Speed: {}", step));
        session.post_message(MessageLevel::Important, "Game has been loaded");
        session.post_message(MessageLevel::Important, "Waiting for players...");

        session
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn player(&self, id: u32) -> Option<&Snake> {
        self.players.get(&id)
    }

    pub fn food(&self) -> Rect {
        self.food
    }

    pub fn spectators(&self) -> u32 {
        self.spectators
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Adds a player and returns its id
    ///
    /// Returns `SPECTATOR_ID` when the session is full or already over; the
    /// caller should watch as a spectator instead. A name that is already
    /// taken gets random digits appended until it is unique.
    pub fn create_player(&mut self, name: &str) -> u32 {
        if self.phase == GamePhase::Over {
            self.post_message(
                MessageLevel::Info,
                format!("{} tried to join a finished game, Spectating instead", name),
            );
            return SPECTATOR_ID;
        }

        if self.players.len() >= self.config.max_players {
            self.post_message(MessageLevel::Important, "Max Players reached, Spectating instead");
            return SPECTATOR_ID;
        }

        let name = self.unique_name(name);
        let id = self.next_player_id;
        self.next_player_id += 1;

        let head = self.random_free_cell(&[]);
        let snake = Snake::new(id, name.clone(), head, self.config.initial_length);
        self.scoreboard.insert(name.clone(), 0);
        self.players.insert(id, snake);

        if self.players.len() == 1 {
            self.phase = GamePhase::Running;
            self.post_message(MessageLevel::Debug, "Game clock started...");
            self.place_food(&[]);
        }

        self.post_message(
            MessageLevel::Important,
            format!("Player: {} has entered the game.", name),
        );
        self.post_message(
            MessageLevel::Debug,
            format!("Player {} created at ({},{})", name, head.x, head.y),
        );
        let count = self.players.len();
        self.post_message(MessageLevel::Debug, format!("Num Players: {}", count));

        id
    }

    /// Removes a player and its scoreboard entry
    ///
    /// Stops the clock when the last player leaves a running game.
    pub fn delete_player(&mut self, id: u32) -> Result<(), SessionError> {
        let snake = self.players.remove(&id).ok_or(SessionError::NotFound(id))?;
        self.scoreboard.remove(&snake.name);

        self.post_message(MessageLevel::Important, format!("{} has left the game.", snake.name));
        let remaining = self.players.len();
        self.post_message(MessageLevel::Info, format!("Players remaining: {}", remaining));

        if self.players.is_empty() && self.phase == GamePhase::Running {
            self.phase = GamePhase::Idle;
            self.post_message(MessageLevel::Info, "Waiting for players...");
            self.post_message(MessageLevel::Debug, "Game clock stopped.");
        }

        Ok(())
    }

    /// Requests a new heading for a player
    ///
    /// Returns `Ok(false)` when the request is ignored: it repeats the last
    /// accepted direction, reverses it, or the game is over.
    pub fn update_direction(&mut self, id: u32, direction: Direction) -> Result<bool, SessionError> {
        let over = self.phase == GamePhase::Over;
        let player = self.players.get_mut(&id).ok_or(SessionError::NotFound(id))?;

        if over || !player.accepts_direction(direction) {
            return Ok(false);
        }

        player.direction = direction;
        player.previous_direction = direction;
        let name = player.name.clone();
        self.post_message(
            MessageLevel::Verbose,
            format!("Player: {} Direction: {:?}", name, direction),
        );

        Ok(true)
    }

    pub fn increment_spectators(&mut self) {
        self.spectators += 1;
        self.post_message(MessageLevel::Info, "New Spectator has joined.");
        let spectators = self.spectators;
        self.post_message(MessageLevel::Debug, format!("Spectators remaining: {}", spectators));
    }

    pub fn decrement_spectators(&mut self) {
        if self.spectators == 0 {
            return;
        }
        self.spectators -= 1;
        self.post_message(MessageLevel::Info, "A Spectator has left.");
        let spectators = self.spectators;
        self.post_message(MessageLevel::Debug, format!("Spectators remaining: {}", spectators));
    }

    /// Registers a viewer and sends it the current state right away.
    pub fn subscribe(&mut self) -> (u32, UpdateReceiver) {
        let info = Update::Info(self.game_information());
        let players = Update::Players(self.player_locations());

        let (subscription_id, rx) = self.subscribers.subscribe();
        self.subscribers.send_to(subscription_id, info);
        self.subscribers.send_to(subscription_id, players);
        (subscription_id, rx)
    }

    pub fn unsubscribe(&mut self, subscription_id: u32) -> bool {
        self.subscribers.unsubscribe(subscription_id)
    }

    /// Advances the simulation by one step
    ///
    /// Every player moves one step in its heading, then wall, food, self and
    /// enemy collisions are applied in that order. The first collision that
    /// resets a snake ends that snake's step. Players are processed in
    /// ascending id order, so later players see the already-moved positions
    /// of earlier ones. The resulting positions are pushed to subscribers.
    pub fn tick(&mut self) {
        if self.phase != GamePhase::Running {
            return;
        }
        self.tick += 1;

        let ids: Vec<u32> = self.players.keys().copied().collect();
        for id in ids {
            if self.phase == GamePhase::Over {
                break;
            }
            if let Some(snake) = self.players.remove(&id) {
                let snake = self.advance(snake);
                self.players.insert(id, snake);
            }
        }

        if !self.subscribers.is_empty() {
            let locations = self.player_locations();
            self.subscribers.broadcast(&Update::Players(locations));
        }
    }

    /// Moves one snake and resolves its collisions. The snake is not in
    /// `self.players` while this runs.
    fn advance(&mut self, mut snake: Snake) -> Snake {
        if snake.direction != Direction::None {
            let (dx, dy) = snake.direction.delta(self.config.movement_step);
            let head = snake.head().translated(dx, dy);

            if wall_collision(&head, &self.config) {
                self.post_message(
                    MessageLevel::Important,
                    format!("{} hit a wall, and has been reset.", snake.name),
                );
                return self.reset(&snake);
            }

            snake.location.insert(0, head);
            snake.location.truncate(snake.length);
        }

        if food_collision(&snake, &self.food) {
            self.place_food(&snake.location);
            snake.length += self.config.growth_per_food;
            snake.score += 1;
            self.scoreboard.insert(snake.name.clone(), snake.score);
            self.post_message(MessageLevel::Important, format!("{} has scored a point!", snake.name));
            self.post_message(
                MessageLevel::Debug,
                format!("{} new length: {}", snake.name, snake.length),
            );

            if snake.score >= self.config.win_score {
                self.game_over(&snake.name);
                return snake;
            }
        }

        if self_collision(&snake, &self.config) || enemy_collision(&snake, &self.players) {
            self.post_message(MessageLevel::Important, format!("{} has had an accident!", snake.name));
            let fresh = self.reset(&snake);
            self.post_message(MessageLevel::Info, format!("{} has been reset.", snake.name));
            return fresh;
        }

        let head = snake.head();
        self.post_message(
            MessageLevel::Verbose,
            format!("{} position: ({},{})", snake.name, head.x, head.y),
        );
        snake
    }

    /// Fresh snake for the same player with its score cleared.
    fn reset(&mut self, snake: &Snake) -> Snake {
        let head = self.random_free_cell(&[]);
        self.scoreboard.insert(snake.name.clone(), 0);
        snake.respawn(head, self.config.initial_length)
    }

    fn game_over(&mut self, winner: &str) {
        self.phase = GamePhase::Over;
        self.post_message(
            MessageLevel::Important,
            format!("Game over! {} has won the game!", winner),
        );
    }

    fn unique_name(&mut self, requested: &str) -> String {
        if !self.name_taken(requested) {
            return requested.to_string();
        }

        self.post_message(MessageLevel::Debug, format!("{} - already exists", requested));
        let mut name = requested.to_string();
        while self.name_taken(&name) {
            let digit: u8 = self.rng.gen_range(0..10);
            name.push_str(&digit.to_string());
        }
        self.post_message(
            MessageLevel::Info,
            format!("Renaming '{}' to: {}", requested, name),
        );
        name
    }

    fn name_taken(&self, name: &str) -> bool {
        self.players.values().any(|snake| snake.name == name)
    }

    /// Moves the food to a new random cell away from every snake
    ///
    /// `eater` holds the cells of a snake that is being advanced and so is
    /// not in `self.players` right now.
    fn place_food(&mut self, eater: &[Rect]) {
        let previous = self.food;
        let mut food = self.random_free_cell(eater);
        while food == previous {
            food = self.random_free_cell(eater);
        }
        self.food = food;
        self.post_message(
            MessageLevel::Debug,
            format!("Food created at ({},{})", food.x, food.y),
        );
    }

    /// Random cell in `[entity_size, board_size - entity_size)` on both axes.
    fn random_cell(&mut self) -> Rect {
        let low = self.config.entity_size;
        let high = self.config.board_size - self.config.entity_size;
        let x = self.rng.gen_range(low..high);
        let y = self.rng.gen_range(low..high);
        Rect::square(x, y, self.config.entity_size)
    }

    /// Random cell that overlaps no snake and none of `extra`, falling back
    /// to any cell when the board is crowded.
    fn random_free_cell(&mut self, extra: &[Rect]) -> Rect {
        let mut cell = self.random_cell();
        for _ in 0..PLACEMENT_ATTEMPTS {
            let occupied = self
                .players
                .values()
                .flat_map(|snake| snake.location.iter())
                .chain(extra.iter())
                .any(|segment| segment.intersects(&cell));
            if !occupied {
                break;
            }
            cell = self.random_cell();
        }
        cell
    }

    /// Ranked scoreboard lines, highest score first.
    pub fn scoreboard_lines(&self) -> Vec<String> {
        let mut entries: Vec<(&String, &u32)> = self.scoreboard.iter().collect();
        entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        entries
            .into_iter()
            .enumerate()
            .map(|(rank, (name, score))| format!("{}. {}: {}", rank + 1, name, score))
            .collect()
    }

    pub fn game_information(&self) -> GameInformation {
        GameInformation {
            scoreboard: self.scoreboard_lines(),
            messages: self.messages.clone(),
            food: self.food,
        }
    }

    pub fn player_locations(&self) -> PlayerLocations {
        self.players
            .iter()
            .map(|(id, snake)| (*id, snake.location.clone()))
            .collect()
    }

    /// Logs a message and, if it is visible to viewers, records it and
    /// pushes fresh game information to every subscriber.
    pub fn post_message(&mut self, level: MessageLevel, message: impl Into<String>) {
        let message = message.into();

        match level {
            MessageLevel::Important | MessageLevel::Info => info!("{}", message),
            MessageLevel::Debug => debug!("{}", message),
            MessageLevel::Verbose => trace!("{}", message),
        }

        if level <= self.config.message_level {
            self.messages.insert(0, message);
            if !self.subscribers.is_empty() {
                let update = Update::Info(self.game_information());
                self.subscribers.broadcast(&update);
            }
        }
    }
}
