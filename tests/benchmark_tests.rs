//! Performance benchmarks for critical game systems

use snake_server::collision::{enemy_collision, food_collision, self_collision, wall_collision};
use snake_server::config::GameConfig;
use snake_server::connections::ConnectionManager;
use snake_server::session::GameSession;
use snake_server::snake::Snake;
use snake_server::subscribers::{SubscriberRegistry, Update};
use snake_shared::{Direction, Packet, PlayerLocations, Rect, ENTITY_SIZE};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Snake of `cells` segments laid out left of `(x, y)`, head first.
fn long_snake(id: u32, x: i32, y: i32, cells: usize) -> Snake {
    let mut snake = Snake::new(id, format!("s{}", id), Rect::square(x, y, ENTITY_SIZE), cells);
    snake.location = (0..cells as i32)
        .map(|i| Rect::square(x - i * 5, y, ENTITY_SIZE))
        .collect();
    snake
}

/// Benchmarks the wall and food predicates
#[test]
fn benchmark_simple_collisions() {
    let config = GameConfig::default();
    let snake = long_snake(1, 250, 250, 5);
    let food = Rect::square(100, 100, ENTITY_SIZE);

    let iterations = 100_000;
    let start = Instant::now();

    for i in 0..iterations {
        let head = Rect::square(i % 520 - 10, 250, ENTITY_SIZE);
        let _ = wall_collision(&head, &config);
        let _ = food_collision(&snake, &food);
    }

    let duration = start.elapsed();
    println!(
        "Wall + food collision: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    // Should complete in under 200ms for 100k iterations
    assert!(duration.as_millis() < 200);
}

/// Benchmarks self and enemy checks for a full board of long snakes
#[test]
fn benchmark_body_collisions() {
    let config = GameConfig::default();
    let players: BTreeMap<u32, Snake> = (1..=8)
        .map(|id| (id, long_snake(id, 480, id as i32 * 50, 300)))
        .collect();

    let iterations = 1_000;
    let start = Instant::now();

    for _ in 0..iterations {
        for snake in players.values() {
            assert!(!self_collision(snake, &config));
            assert!(!enemy_collision(snake, &players));
        }
    }

    let duration = start.elapsed();
    println!(
        "Body collision: {} rounds of 8 × 300 cells in {:?} ({:.2} μs/round)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // A round must fit comfortably inside a 20ms tick
    assert!(duration / iterations < Duration::from_millis(2));
}

/// Benchmarks full session ticks with every slot taken
#[test]
fn benchmark_session_tick() {
    let config = GameConfig {
        seed: Some(99),
        ..GameConfig::default()
    };
    let mut session = GameSession::new(config, SubscriberRegistry::new(64));
    let (_subscription, mut updates) = session.subscribe();

    let ids: Vec<u32> = (0..8).map(|i| session.create_player(&format!("p{}", i))).collect();
    let turns = [Direction::Up, Direction::Left, Direction::Down, Direction::Right];

    let iterations = 2_000;
    let start = Instant::now();

    for tick in 0..iterations {
        if tick % 20 == 0 {
            for (n, id) in ids.iter().enumerate() {
                let turn = turns[(tick / 20 + n) % turns.len()];
                let _ = session.update_direction(*id, turn);
            }
        }
        session.tick();
        while updates.try_recv().is_ok() {}
    }

    let duration = start.elapsed();
    println!(
        "Session tick: 8 players × {} ticks in {:?} ({:.2} μs/tick)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // Average tick should stay well under the 20ms period
    assert!(duration / (iterations as u32) < Duration::from_millis(5));
}

/// Benchmarks fan-out to many subscribers
#[test]
fn benchmark_broadcast() {
    let mut registry = SubscriberRegistry::new(4);
    let receivers: Vec<_> = (0..100).map(|_| registry.subscribe()).collect();

    let mut locations = PlayerLocations::new();
    for id in 1..=8 {
        locations.insert(id, long_snake(id, 400, id as i32 * 50, 50).location);
    }
    let update = Update::Players(locations);

    let iterations = 1_000;
    let start = Instant::now();

    for _ in 0..iterations {
        registry.broadcast(&update);
    }

    let duration = start.elapsed();
    println!(
        "Broadcast: {} updates to {} subscribers in {:?}",
        iterations,
        receivers.len(),
        duration
    );

    // Full queues drop updates instead of blocking, so this stays fast
    assert!(duration.as_millis() < 2000);
    assert_eq!(registry.len(), 100);
}

/// Benchmarks network packet serialization performance
#[test]
fn benchmark_packet_serialization() {
    let mut locations = PlayerLocations::new();
    for id in 1..=8 {
        locations.insert(id, long_snake(id, 400, id as i32 * 50, 100).location);
    }
    let packet = Packet::PlayersUpdate { locations };

    let iterations = 10_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let encoded = packet.encode().unwrap();
        let _decoded = Packet::decode(&encoded).unwrap();
    }

    let duration = start.elapsed();
    println!(
        "Packet serialization: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // Should complete in under 5 seconds
    assert!(duration.as_millis() < 5000);
}

/// Stress tests connection bookkeeping under many viewers
#[test]
fn stress_test_connection_tracking() {
    let mut connections = ConnectionManager::new(Duration::from_secs(5));
    let start = Instant::now();

    for i in 0..1_000u32 {
        let addr: SocketAddr = format!("127.0.0.1:{}", 10_000 + i).parse().unwrap();
        connections.touch(addr);
        connections.add_player(addr, i + 1);
        connections.add_subscription(addr, i + 1);
    }
    let expired = connections.check_timeouts();

    let duration = start.elapsed();
    println!(
        "Connection tracking: {} viewers in {:?}",
        connections.len(),
        duration
    );

    assert!(expired.is_empty());
    assert_eq!(connections.len(), 1_000);
    assert!(duration.as_millis() < 500);
}
