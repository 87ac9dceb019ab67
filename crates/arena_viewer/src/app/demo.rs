use arena_engine::{AgentDescriptor, AgentId, ArenaHost, Simulation, Vec2};
use rand::rngs::SmallRng;
use rand::Rng;
use tracing::{debug, info};

use super::config::DemoConfig;

/// Scripted stand-in for a live activity feed: agents drift in and out of
/// activity, pick up executions, and the busiest agent wears the crown.
/// Clicking an agent selects it; the next click places it.
pub(crate) struct DemoHost {
    config: DemoConfig,
    roster: Vec<AgentDescriptor>,
    rng: SmallRng,
    next_activity_ms: Option<f64>,
    selected: Option<AgentId>,
}

impl DemoHost {
    pub(crate) fn new(config: DemoConfig, roster: Vec<AgentDescriptor>, rng: SmallRng) -> Self {
        Self {
            config,
            roster,
            rng,
            next_activity_ms: None,
            selected: None,
        }
    }

    fn shuffle_activity(&mut self, sim: &mut Simulation) {
        let ids: Vec<AgentId> = sim.agents().iter().map(|agent| agent.id.clone()).collect();
        if ids.is_empty() {
            return;
        }
        let id = &ids[self.rng.random_range(0..ids.len())];
        let Some(agent) = sim.agent(id) else {
            return;
        };
        let activate = !agent.is_active();
        let executions = agent.badges.execution_count;

        sim.set_active(id, activate);
        let executing = activate && self.rng.random_bool(self.config.execute_chance.clamp(0.0, 1.0));
        sim.set_executing(id, executing);
        if executing {
            sim.set_execution_count(id, executions.saturating_add(1));
        }
        debug!(agent_id = %id, active = activate, executing, "demo_activity");

        self.crown_busiest(sim, &ids);
    }

    fn crown_busiest(&self, sim: &mut Simulation, ids: &[AgentId]) {
        let leader = sim
            .agents()
            .iter()
            .filter(|agent| agent.badges.execution_count > 0)
            .max_by_key(|agent| agent.badges.execution_count)
            .map(|agent| agent.id.clone());
        for id in ids {
            sim.set_promoted(id, leader.as_ref() == Some(id));
        }
    }
}

impl ArenaHost for DemoHost {
    fn load(&mut self, sim: &mut Simulation) {
        let mut added = 0;
        for descriptor in &self.roster {
            let id = AgentId::new(descriptor.id.clone());
            if !sim.add_agent(descriptor.clone()) {
                continue;
            }
            added += 1;
            let chance = self.config.initial_active_chance.clamp(0.0, 1.0);
            if self.rng.random_bool(chance) {
                sim.set_active(&id, true);
            }
        }
        info!(agents = added, "demo_loaded");
    }

    fn before_frame(&mut self, now_ms: f64, sim: &mut Simulation) {
        let due = *self.next_activity_ms.get_or_insert(now_ms + self.config.activity_interval_ms);
        if now_ms < due {
            return;
        }
        self.next_activity_ms = Some(now_ms + self.config.activity_interval_ms);
        self.shuffle_activity(sim);
    }

    fn on_agent_clicked(&mut self, point: Vec2, hit: Option<AgentId>, sim: &mut Simulation) {
        match (self.selected.take(), hit) {
            (Some(selected), Some(id)) if selected == id => {
                info!(agent_id = %id, "agent_deselected");
            }
            (_, Some(id)) => {
                info!(agent_id = %id, "agent_selected");
                self.selected = Some(id);
            }
            (Some(selected), None) => {
                if sim.place_agent(&selected, point) {
                    info!(agent_id = %selected, x = point.x, y = point.y, "agent_placed");
                }
            }
            (None, None) => {}
        }
    }

    fn unload(&mut self, sim: &mut Simulation) {
        let removed = sim.clear_agents();
        info!(removed, "demo_unloaded");
    }
}

#[cfg(test)]
mod tests {
    use arena_engine::SimConfig;
    use rand::SeedableRng;

    use super::*;
    use crate::app::config::default_roster;

    fn simulation() -> Simulation {
        Simulation::new(SimConfig::default(), Box::new(SmallRng::seed_from_u64(3)))
            .expect("default config is valid")
    }

    fn host(config: DemoConfig) -> DemoHost {
        DemoHost::new(config, default_roster(), SmallRng::seed_from_u64(9))
    }

    #[test]
    fn load_adds_the_whole_roster() {
        let mut sim = simulation();
        let mut demo = host(DemoConfig {
            initial_active_chance: 1.0,
            ..DemoConfig::default()
        });
        demo.load(&mut sim);

        assert_eq!(sim.agents().len(), 6);
        assert!(sim.agents().iter().all(|agent| agent.is_active()));
    }

    #[test]
    fn activity_waits_for_the_interval() {
        let mut sim = simulation();
        let mut demo = host(DemoConfig {
            initial_active_chance: 0.0,
            execute_chance: 1.0,
            ..DemoConfig::default()
        });
        demo.load(&mut sim);

        demo.before_frame(0.0, &mut sim);
        demo.before_frame(1_000.0, &mut sim);
        assert!(sim.agents().iter().all(|agent| !agent.is_active()));

        demo.before_frame(1_500.0, &mut sim);
        let active: Vec<_> = sim.agents().iter().filter(|agent| agent.is_active()).collect();
        assert_eq!(active.len(), 1);
        assert!(active[0].badges.executing);
        assert_eq!(active[0].badges.execution_count, 1);
        assert!(active[0].badges.promoted);
    }

    #[test]
    fn click_selects_then_places() {
        let mut sim = simulation();
        let mut demo = host(DemoConfig {
            initial_active_chance: 0.0,
            ..DemoConfig::default()
        });
        demo.load(&mut sim);
        let atlas = AgentId::from("atlas");

        demo.on_agent_clicked(Vec2::ZERO, Some(atlas.clone()), &mut sim);
        demo.on_agent_clicked(Vec2::new(300.0, 250.0), None, &mut sim);
        assert_eq!(sim.agent(&atlas).expect("atlas").position, Vec2::new(300.0, 250.0));

        demo.on_agent_clicked(Vec2::new(50.0, 50.0), None, &mut sim);
        assert_eq!(sim.agent(&atlas).expect("atlas").position, Vec2::new(300.0, 250.0));
    }

    #[test]
    fn clicking_the_selection_again_deselects() {
        let mut sim = simulation();
        let mut demo = host(DemoConfig::default());
        demo.load(&mut sim);
        let echo = AgentId::from("echo");

        demo.on_agent_clicked(Vec2::ZERO, Some(echo.clone()), &mut sim);
        demo.on_agent_clicked(Vec2::ZERO, Some(echo), &mut sim);
        assert!(demo.selected.is_none());
    }

    #[test]
    fn unload_clears_the_arena() {
        let mut sim = simulation();
        let mut demo = host(DemoConfig::default());
        demo.load(&mut sim);
        demo.unload(&mut sim);
        assert!(sim.agents().is_empty());
    }
}
