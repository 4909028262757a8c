use std::time::Duration;

use hexwalk_core::{
    AxialCoord, Command, Event, FieldBounds, MovementState, MovementTiming, RunResult, RunSetup,
    Tile, TileId,
};
use hexwalk_world::{self as world, query, World};

const STEP: Duration = Duration::from_millis(200);
const HOLD: Duration = Duration::from_millis(500);
const TICK: Duration = Duration::from_millis(50);

fn world_with(tiles: &[Tile], field: FieldBounds, decoys: u32) -> World {
    let mut world = World::new();
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::ConfigureTiming {
            timing: MovementTiming::new(STEP, HOLD),
        },
        &mut events,
    );
    for tile in tiles {
        world::apply(&mut world, Command::RegisterTile { tile: *tile }, &mut events);
    }
    world::apply(
        &mut world,
        Command::StartRun {
            setup: RunSetup {
                start: Some(AxialCoord::new(0, 0)),
                field,
                decoys,
            },
        },
        &mut events,
    );
    world
}

fn request_move(world: &mut World, q: i32, r: i32) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::RequestMove {
            target: AxialCoord::new(q, r),
        },
        &mut events,
    );
    events
}

fn tick_until_idle(world: &mut World) -> Vec<Event> {
    let mut events = Vec::new();
    for _ in 0..1_000 {
        match query::movement_state(world) {
            Some(MovementState::Idle | MovementState::Finished) | None => break,
            Some(_) => world::apply(world, Command::Tick { dt: TICK }, &mut events),
        }
    }
    events
}

fn arrivals(events: &[Event]) -> Vec<(AxialCoord, bool)> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::AgentArrived { to, forced, .. } => Some((*to, *forced)),
            _ => None,
        })
        .collect()
}

#[test]
fn adjacent_move_completes_one_step() {
    let mut world = world_with(&[], FieldBounds::default(), 0);

    let accepted = request_move(&mut world, 1, 0);
    assert!(accepted
        .iter()
        .any(|event| matches!(event, Event::MoveAccepted { forced: false, .. })));
    assert_eq!(query::movement_state(&world), Some(MovementState::Moving));

    let events = tick_until_idle(&mut world);
    let agent = query::agent(&world).expect("agent spawned");
    assert_eq!(agent.position, AxialCoord::new(1, 0));
    assert_eq!(agent.step_count, 1);
    assert_eq!(arrivals(&events), vec![(AxialCoord::new(1, 0), false)]);
}

#[test]
fn distant_move_is_rejected_without_side_effects() {
    let mut world = world_with(&[], FieldBounds::default(), 0);

    let events = request_move(&mut world, 2, 0);

    assert!(events.is_empty());
    let agent = query::agent(&world).expect("agent spawned");
    assert_eq!(agent.position, AxialCoord::new(0, 0));
    assert_eq!(agent.step_count, 0);
    assert_eq!(agent.state, MovementState::Idle);
}

#[test]
fn adjacent_move_outside_the_field_is_rejected() {
    let mut world = world_with(&[], FieldBounds::new(AxialCoord::new(0, 0), 0), 0);

    for direction in hexwalk_core::HexDirection::ALL {
        let (dq, dr) = direction.delta();
        assert!(request_move(&mut world, dq, dr).is_empty());
    }
    assert_eq!(
        query::agent(&world).map(|agent| agent.step_count),
        Some(0)
    );
}

#[test]
fn trap_triggers_exactly_one_forced_return() {
    let trap = Tile::new(TileId::new(1), AxialCoord::new(0, 1)).with_trap();
    let mut world = world_with(&[trap], FieldBounds::default(), 0);

    let mut events = request_move(&mut world, 0, 1);
    events.extend(tick_until_idle(&mut world));

    assert_eq!(
        arrivals(&events),
        vec![(AxialCoord::new(0, 1), false), (AxialCoord::new(0, 0), true)]
    );
    let forced_moves = events
        .iter()
        .filter(|event| matches!(event, Event::MoveAccepted { forced: true, .. }))
        .count();
    assert_eq!(forced_moves, 1);
    assert!(events.contains(&Event::TrapHoldBegan {
        trap: AxialCoord::new(0, 1),
        return_to: AxialCoord::new(0, 0),
    }));
    assert!(events.contains(&Event::TrapHoldEnded {
        trap: AxialCoord::new(0, 1),
    }));

    let agent = query::agent(&world).expect("agent spawned");
    assert_eq!(agent.position, AxialCoord::new(0, 0));
    assert_eq!(agent.step_count, 2);
    assert_eq!(agent.state, MovementState::Idle);
}

#[test]
fn forced_return_onto_a_trap_does_not_trigger_it_again() {
    let tiles = [
        Tile::new(TileId::new(1), AxialCoord::new(0, 0)).with_trap(),
        Tile::new(TileId::new(2), AxialCoord::new(1, 0)).with_trap(),
    ];
    let mut world = world_with(&tiles, FieldBounds::default(), 0);

    let mut events = request_move(&mut world, 1, 0);
    events.extend(tick_until_idle(&mut world));

    let holds = events
        .iter()
        .filter(|event| matches!(event, Event::TrapHoldBegan { .. }))
        .count();
    assert_eq!(holds, 1);
    assert_eq!(query::movement_state(&world), Some(MovementState::Idle));
    assert_eq!(
        query::agent(&world).map(|agent| agent.position),
        Some(AxialCoord::new(0, 0))
    );
}

#[test]
fn trap_hold_lasts_for_the_configured_duration() {
    let trap = Tile::new(TileId::new(1), AxialCoord::new(1, 0)).with_trap();
    let mut world = world_with(&[trap], FieldBounds::default(), 0);
    let _ = request_move(&mut world, 1, 0);

    let mut events = Vec::new();
    world::apply(&mut world, Command::Tick { dt: STEP }, &mut events);
    assert_eq!(query::movement_state(&world), Some(MovementState::TrapHold));

    world::apply(
        &mut world,
        Command::Tick {
            dt: HOLD - Duration::from_millis(1),
        },
        &mut events,
    );
    assert_eq!(query::movement_state(&world), Some(MovementState::TrapHold));

    world::apply(
        &mut world,
        Command::Tick {
            dt: Duration::from_millis(1),
        },
        &mut events,
    );
    assert_eq!(
        query::movement_state(&world),
        Some(MovementState::ForcedReturn)
    );
}

#[test]
fn decoys_run_out() {
    let mut world = world_with(&[], FieldBounds::default(), 1);

    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::PlaceDecoy {
            target: AxialCoord::new(1, 0),
        },
        &mut events,
    );
    assert_eq!(
        events,
        vec![Event::DecoyPlaced {
            from: AxialCoord::new(0, 0),
            target: AxialCoord::new(1, 0),
            remaining: 0,
        }]
    );

    events.clear();
    world::apply(
        &mut world,
        Command::PlaceDecoy {
            target: AxialCoord::new(0, 1),
        },
        &mut events,
    );
    assert!(events.is_empty());

    let agent = query::agent(&world).expect("agent spawned");
    assert_eq!(agent.decoys_remaining, 0);
    assert_eq!(agent.position, AxialCoord::new(0, 0));
    assert_eq!(agent.state, MovementState::Idle);
}

#[test]
fn reaching_the_finish_ends_the_run() {
    let finish = Tile::new(TileId::new(1), AxialCoord::new(-1, 1)).with_finish();
    let mut world = world_with(&[finish], FieldBounds::default(), 1);

    let _ = request_move(&mut world, -1, 1);
    let events = tick_until_idle(&mut world);

    assert!(events.contains(&Event::RunEnded {
        result: RunResult::Finished,
        step_count: 1,
    }));
    assert_eq!(query::movement_state(&world), Some(MovementState::Finished));

    assert!(request_move(&mut world, -1, 0).is_empty());
    let mut decoy = Vec::new();
    world::apply(
        &mut world,
        Command::PlaceDecoy {
            target: AxialCoord::new(-1, 0),
        },
        &mut decoy,
    );
    assert!(decoy.is_empty());
}

#[test]
fn outcome_does_not_depend_on_tick_size() {
    let trap = Tile::new(TileId::new(1), AxialCoord::new(1, -1)).with_trap();

    let mut coarse = world_with(&[trap], FieldBounds::default(), 0);
    let _ = request_move(&mut coarse, 1, -1);
    let mut coarse_events = Vec::new();
    world::apply(
        &mut coarse,
        Command::Tick {
            dt: STEP + HOLD + STEP,
        },
        &mut coarse_events,
    );

    let mut fine = world_with(&[trap], FieldBounds::default(), 0);
    let _ = request_move(&mut fine, 1, -1);
    let fine_events = tick_until_idle(&mut fine);

    assert_eq!(arrivals(&coarse_events), arrivals(&fine_events));
    assert_eq!(query::agent(&coarse), query::agent(&fine));
}
