//! Headless reef demo: data-driven and code-driven fish side by side

use reefling::ai::{ActionConfig, CreatureMode, DecisionConfig, StateConfig, TransitionConfig};
use reefling::prelude::*;

const GRAPH_PATH: &str = "assets/reef_ai.ron";

/// Frame at which the scripted pause starts and ends
const PAUSE_FRAMES: (u64, u64) = (300, 360);
/// Frame at which the player levels up
const LEVEL_UP_FRAME: u64 = 480;

/// Demo game with a small tank of fish
struct ReefTank {
    library: StateLibrary,
    initial: Option<StateId>,
    machines: Vec<StateMachine<CreatureMode, World>>,
    player_level: u32,
}

impl ReefTank {
    fn new() -> Self {
        Self {
            library: StateLibrary::new(),
            initial: None,
            machines: Vec::new(),
            player_level: 1,
        }
    }

    /// Graph used when the asset file is unavailable
    fn builtin_graph() -> StateGraphConfig {
        let mut idle = StateConfig::new("Idle");
        idle.transitions.push(TransitionConfig {
            decision: DecisionConfig::WaitForRandom { min: 1.0, max: 3.0 },
            on_true: Some("Wander".to_string()),
            on_false: None,
        });

        let mut wander = StateConfig::new("Wander");
        wander.actions.push(ActionConfig::Wander {
            radius_x: 3.0,
            radius_y: 1.0,
            curve_intensity: None,
            easing: None,
            curve: None,
        });
        wander.transitions.push(TransitionConfig {
            decision: DecisionConfig::WanderingCounter { threshold: 3 },
            on_true: Some("Idle".to_string()),
            on_false: None,
        });

        StateGraphConfig {
            initial: "Idle".to_string(),
            states: vec![idle, wander],
        }
    }

    fn load_graph() -> StateGraphConfig {
        match StateGraphConfig::load_ron(GRAPH_PATH) {
            Ok(graph) => graph,
            Err(e) => {
                log::warn!("Could not load {GRAPH_PATH} ({e}), using built-in graph");
                Self::builtin_graph()
            }
        }
    }

    fn spawn_scripted_fish(&mut self, ctx: &mut EngineContext, name: &str, position: Vec2) {
        let entity = ctx.world.spawn((
            Name::new(name),
            Transform2D::from_position(position),
            Creature::default(),
        ));
        let controller = StateController::new(entity, self.initial);
        if let Err(e) = ctx.world.inner.insert_one(entity, controller) {
            log::error!("Failed to attach controller to {name}: {e}");
        }
    }

    fn spawn_idle_fish(&mut self, ctx: &mut EngineContext, name: &str, position: Vec2, seed: u64) {
        let creature = Creature {
            time_between_movement: 2.0,
            ..Creature::default()
        };
        let entity = ctx.world.spawn((
            Name::new(name),
            Transform2D::from_position(position),
            creature,
            Mover::default(),
        ));

        let mut machine = StateMachine::new(entity);
        if let Err(e) = machine.add_state(IdleState::new(seed), true, &mut ctx.world) {
            log::error!("Failed to set up {name}: {e}");
            return;
        }
        if let Err(e) = machine.start_machine(0.5, &mut ctx.world) {
            log::error!("Failed to start {name}: {e}");
            return;
        }
        self.machines.push(machine);
    }

    fn handle_events(&mut self, ctx: &mut EngineContext) {
        let events: Vec<GameEvent> = ctx.events.drain().collect();
        for event in &events {
            match event {
                GameEvent::GamePaused { paused } => {
                    log::info!("Game {}", if *paused { "paused" } else { "resumed" });
                    for (_, controller) in ctx.world.query_mut::<&mut StateController>() {
                        controller.handle_event(event);
                    }
                    for machine in &mut self.machines {
                        if machine.is_running() == *paused {
                            machine.pause_machine();
                        }
                    }
                }
                GameEvent::LevelUp { level } => {
                    log::info!("Player reached level {level}");
                    self.player_level = *level;
                    for (_, (creature, _)) in ctx.world.query_mut::<(&mut Creature, &Mover)>() {
                        creature.apply_level_up(*level);
                    }
                }
                GameEvent::StateChanged { entity, state } => {
                    let name = ctx
                        .world
                        .get::<Name>(*entity)
                        .map(|n| n.0.clone())
                        .unwrap_or_else(|_| format!("{entity:?}"));
                    log::info!("{name} is now {state}");
                }
                _ => {}
            }
        }
    }

    fn schedule(&self, ctx: &mut EngineContext) {
        let frame = ctx.time.frame();
        if frame == PAUSE_FRAMES.0 {
            ctx.events.push(GameEvent::GamePaused { paused: true });
        } else if frame == PAUSE_FRAMES.1 {
            ctx.events.push(GameEvent::GamePaused { paused: false });
        } else if frame == LEVEL_UP_FRAME {
            ctx.events.push(GameEvent::LevelUp {
                level: self.player_level + 1,
            });
        }
    }

    fn current_states(ctx: &EngineContext) -> Vec<(hecs::Entity, Option<StateId>)> {
        ctx.world
            .query::<&StateController>()
            .iter()
            .map(|(entity, controller)| (entity, controller.current_state()))
            .collect()
    }
}

impl Game for ReefTank {
    fn init(&mut self, ctx: &mut EngineContext) {
        log::info!("Initializing reef tank");

        match Self::load_graph().build() {
            Ok((library, initial)) => {
                self.library = library;
                self.initial = Some(initial);
            }
            Err(e) => {
                log::error!("Invalid state graph: {e}");
                ctx.quit();
                return;
            }
        }

        self.spawn_scripted_fish(ctx, "Clownfish", Vec2::new(-4.0, 0.0));
        self.spawn_scripted_fish(ctx, "Tang", Vec2::new(0.0, 1.5));
        self.spawn_scripted_fish(ctx, "Goby", Vec2::new(4.0, -1.0));
        self.spawn_idle_fish(ctx, "Guppy", Vec2::new(-2.0, -2.0), 17);
        self.spawn_idle_fish(ctx, "Minnow", Vec2::new(2.0, 2.0), 23);

        log::info!(
            "Reef tank initialized: {} states, {} fish",
            self.library.len(),
            ctx.world.len()
        );
    }

    fn update(&mut self, ctx: &mut EngineContext) {
        self.handle_events(ctx);
        self.schedule(ctx);

        let before = Self::current_states(ctx);
        update_controllers(&mut ctx.world, &self.library, &ctx.time, &mut ctx.rng);
        for (entity, previous) in before {
            let Ok(controller) = ctx.world.get::<StateController>(entity) else {
                continue;
            };
            let current = controller.current_state();
            if current != previous
                && let Some(name) = current.and_then(|id| self.library.name_of(id))
            {
                ctx.events.push(GameEvent::StateChanged {
                    entity,
                    state: name.to_string(),
                });
            }
        }

        let dt = ctx.time.delta_seconds();
        for machine in &mut self.machines {
            machine.advance(dt, &mut ctx.world);
        }
        movement_system(&mut ctx.world, dt);
    }

    fn shutdown(&mut self, ctx: &mut EngineContext) {
        for (_, (name, transform)) in ctx.world.query_mut::<(&Name, &Transform2D)>() {
            log::info!("{} finished at {:?}", name.0, transform.position);
        }
        for machine in &mut self.machines {
            machine.stop_machine();
        }
    }
}

fn main() {
    let config = EngineConfig::default()
        .with_title("Reef Tank")
        .with_target_fps(60)
        .with_max_frames(900)
        .with_realtime(true)
        .with_seed(2024);

    let game = ReefTank::new();
    let engine = Engine::new(config, game);

    if let Err(e) = engine.run() {
        eprintln!("Engine error: {}", e);
    }
}
