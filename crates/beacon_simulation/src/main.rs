//! Headless демо BEACON
//!
//! Сервер и клиент в одном процессе: editor gizmo тянет spotlights,
//! sync pass отправляет dirty groups, клиентские ghosts догоняют.

use bevy::prelude::*;
use rand::Rng;
use beacon_simulation::{
    create_replicated_app, AttachBehavior, Behavior, DeterministicRng, Ghost, NetConnection,
    NetRole, ScaleBehavior, SpotLightBehavior, SpotLightInstance,
};

const GHOST_COUNT: u32 = 3;
const TICKS: usize = 200;

fn main() {
    let seed = 42;
    println!("Starting BEACON headless replication (seed: {})", seed);

    let mut server = create_replicated_app(seed, NetRole::Server);
    let mut client = create_replicated_app(seed, NetRole::Client);

    let mut server_entities = Vec::new();
    for index in 0..GHOST_COUNT {
        for (app, is_server) in [(&mut server, true), (&mut client, false)] {
            let entity = app.world_mut().spawn(Ghost::new(index)).id();
            app.world_mut().send_event(AttachBehavior {
                entity,
                template: SpotLightBehavior::NAME.to_string(),
            });
            if is_server {
                server_entities.push(entity);
            }
        }
    }

    let mut bytes_sent = 0usize;

    for tick in 0..TICKS {
        // Gizmo drag: случайный scale на случайный spotlight каждые 4 тика
        if tick % 4 == 0 {
            let (target, scale) = {
                let mut rng = server.world_mut().resource_mut::<DeterministicRng>();
                let target = server_entities[rng.rng.gen_range(0..server_entities.len())];
                let scale = Vec3::new(
                    rng.rng.gen_range(0.0..6.0),
                    rng.rng.gen_range(0.0..30.0),
                    rng.rng.gen_range(0.0..6.0),
                );
                (target, scale)
            };
            server.world_mut().send_event(ScaleBehavior { entity: target, scale });
        }

        // Headless: FixedUpdate тикаем вручную, без real-time accumulator
        server.world_mut().run_schedule(FixedUpdate);

        let packets = server.world_mut().resource_mut::<NetConnection>().drain_outbound();
        for packet in packets {
            bytes_sent += packet.len();
            client.world_mut().resource_mut::<NetConnection>().receive(packet);
        }

        client.world_mut().run_schedule(FixedUpdate);

        if tick % 50 == 0 {
            println!("Tick {}: {} bytes sent", tick, bytes_sent);
        }
    }

    let mut query = client.world_mut().query::<(&Ghost, &Behavior)>();
    let mut ghosts: Vec<_> = query.iter(client.world()).collect();
    ghosts.sort_by_key(|(ghost, _)| ghost.index);

    for (ghost, behavior) in ghosts {
        if let Some(light) = behavior.downcast_ref::<SpotLightInstance>() {
            println!(
                "Ghost {}: range {:.2}, inner {:.2}°, outer {:.2}°",
                ghost.index, light.range, light.inner_cone_angle, light.outer_cone_angle
            );
        }
    }

    println!("Replication complete! {} bytes total", bytes_sent);
}
