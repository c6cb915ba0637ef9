//! Performance benchmarks for critical game systems

use server::arena::{Arena, Timer};
use server::config::ArenaConfig;
use server::room_manager::partition_arena;
use shared::{segments_intersect, ClientEvent, Position, Rect, ARENA_HEIGHT, ARENA_WIDTH};
use std::time::Instant;

/// Benchmarks the swept hitbox test used by fast hooks
#[test]
fn benchmark_segment_hitbox() {
    let hitbox = Rect::centered(Position::new(100.0, 300.0), 32.0, 32.0);
    let iterations = 100_000;
    let start = Instant::now();

    let mut hits = 0;
    for i in 0..iterations {
        let offset = (i % 200) as f32;
        let from = Position::new(offset, 250.0);
        let to = Position::new(offset, 350.0);
        if hitbox.intersects_segment(from, to) {
            hits += 1;
        }
    }

    let duration = start.elapsed();
    println!(
        "Segment hitbox: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert!(hits > 0);
    assert!(duration.as_millis() < 500);
}

/// Benchmarks raw segment intersection
#[test]
fn benchmark_segments_intersect() {
    let iterations = 100_000;
    let start = Instant::now();

    for i in 0..iterations {
        let t = i as f32 * 0.01;
        let _ = segments_intersect(
            Position::new(0.0, t),
            Position::new(100.0, 100.0 - t),
            Position::new(t, 0.0),
            Position::new(100.0 - t, 100.0),
        );
    }

    let duration = start.elapsed();
    println!(
        "Segment intersection: {} iterations in {:?}",
        iterations, duration
    );
    assert!(duration.as_millis() < 500);
}

/// Benchmarks position claims, the hottest path in a live match
#[test]
fn benchmark_player_moves() {
    let mut arena = Arena::new(ArenaConfig {
        rng_seed: Some(9),
        ..ArenaConfig::default()
    });
    arena.handle_event(
        1,
        ClientEvent::CreateRoom {
            room_code: "BENCH".to_string(),
            name: None,
        },
    );
    arena.handle_event(
        2,
        ClientEvent::JoinRoom {
            room_code: "BENCH".to_string(),
            name: None,
        },
    );
    arena.take_dispatches();

    let iterations = 50_000;
    let start = Instant::now();

    for i in 0..iterations {
        let x = (i % 1200) as f32 - 100.0;
        let y = (i % 700) as f32 - 50.0;
        arena.handle_event(1, ClientEvent::PlayerMove { id: 1, x, y });
        if i % 1000 == 0 {
            arena.take_dispatches();
        }
    }
    arena.take_dispatches();

    let duration = start.elapsed();
    println!(
        "Player moves: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );
    assert!(duration.as_millis() < 2000);
}

/// Benchmarks complete hook flights with every tick run back to back
#[test]
fn benchmark_hook_flights() {
    let mut arena = Arena::new(ArenaConfig {
        rng_seed: Some(9),
        win_score: u32::MAX,
        ..ArenaConfig::default()
    });
    arena.handle_event(
        1,
        ClientEvent::CreateRoom {
            room_code: "BENCH".to_string(),
            name: None,
        },
    );
    arena.handle_event(
        2,
        ClientEvent::JoinRoom {
            room_code: "BENCH".to_string(),
            name: None,
        },
    );
    arena.handle_event(2, ClientEvent::PlayerMove { id: 2, x: 900.0, y: 500.0 });
    arena.take_dispatches();

    let flights = 2_000;
    let mut ticks = 0usize;
    let start = Instant::now();

    for _ in 0..flights {
        arena.handle_event(
            1,
            ClientEvent::HookFired {
                player_id: 1,
                target_x: 100.0,
                target_y: 500.0,
            },
        );
        let mut pending = arena.take_timers();
        while let Some(scheduled) = pending.pop() {
            if let Timer::HookTick(_) = scheduled.timer {
                ticks += 1;
                arena.handle_timer(scheduled.timer);
                pending.extend(arena.take_timers());
            }
        }
        arena.take_dispatches();
    }

    let duration = start.elapsed();
    println!(
        "Hook flights: {} flights, {} ticks in {:?}",
        flights, ticks, duration
    );
    assert!(ticks >= flights);
    assert!(duration.as_millis() < 2000);
}

/// Benchmarks arena partitioning at match start
#[test]
fn benchmark_partition() {
    let iterations = 100_000;
    let start = Instant::now();

    for i in 0..iterations {
        let regions = partition_arena(ARENA_WIDTH, ARENA_HEIGHT, 2 + i % 3);
        assert!(!regions.is_empty());
    }

    let duration = start.elapsed();
    println!("Partition: {} iterations in {:?}", iterations, duration);
    assert!(duration.as_millis() < 1000);
}
