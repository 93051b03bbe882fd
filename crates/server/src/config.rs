//! Server configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub zone: ZoneConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub reconcile: ReconcileConfig,
    #[serde(default)]
    pub pathfinder: PathfinderConfig,
    #[serde(default)]
    pub npcs: Vec<NpcConfig>,
}

impl Config {
    /// Load configuration from `config.toml` or use defaults.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(Path::new("config.toml"))
    }

    /// Load configuration from `path`, writing the defaults there if missing.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&contents)?)
        } else {
            info!("No {} found, creating default config", path.display());
            let default_config = Self::default();
            std::fs::write(path, toml::to_string_pretty(&default_config)?)?;
            Ok(default_config)
        }
    }

    /// Length of one tick.
    #[inline]
    pub fn tick_duration(&self) -> Duration {
        Duration::from_millis(self.server.tick_interval_ms)
    }
}

/// Scheduler and general settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server name used in logs.
    #[serde(default = "default_name")]
    pub name: String,
    /// Tick interval in milliseconds.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    /// Number of randomly placed wandering NPCs.
    #[serde(default)]
    pub bots: usize,
    /// Capacity of the inbound command queue.
    #[serde(default = "default_command_queue")]
    pub command_queue: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            tick_interval_ms: default_tick_interval(),
            bots: 0,
            command_queue: default_command_queue(),
        }
    }
}

fn default_name() -> String {
    "World Sim".to_string()
}
fn default_tick_interval() -> u64 {
    20
}
fn default_command_queue() -> usize {
    1024
}

/// Layout of the default zone.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ZoneConfig {
    /// Edge length of a cell in world units.
    #[serde(default = "default_cell_size")]
    pub cell_size: f64,
    /// Lower cell corner.
    #[serde(default = "default_zone_min")]
    pub min: [i32; 3],
    /// Upper cell corner (inclusive).
    #[serde(default = "default_zone_max")]
    pub max: [i32; 3],
    /// Ignore `min`/`max` and materialize cells on demand anywhere.
    #[serde(default)]
    pub unbounded: bool,
    /// Cells that can be neither walked through nor seen through.
    #[serde(default)]
    pub walls: Vec<[i32; 3]>,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            cell_size: default_cell_size(),
            min: default_zone_min(),
            max: default_zone_max(),
            unbounded: false,
            walls: Vec::new(),
        }
    }
}

fn default_cell_size() -> f64 {
    10.0
}
fn default_zone_min() -> [i32; 3] {
    [-32, -32, 0]
}
fn default_zone_max() -> [i32; 3] {
    [31, 31, 0]
}

/// Player actor settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayerConfig {
    #[serde(default = "default_player_speed")]
    pub speed: f64,
    /// Sight radius in cells.
    #[serde(default = "default_vision_radius")]
    pub vision_radius: u32,
    #[serde(default = "default_true")]
    pub ray_cast: bool,
    /// Spawn position for newly logged-in players.
    #[serde(default)]
    pub spawn: [f64; 3],
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            speed: default_player_speed(),
            vision_radius: default_vision_radius(),
            ray_cast: true,
            spawn: [0.0; 3],
        }
    }
}

fn default_player_speed() -> f64 {
    10.0
}
fn default_vision_radius() -> u32 {
    3
}
fn default_true() -> bool {
    true
}

/// Client movement claim tolerances.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReconcileConfig {
    /// Allowed drift from the server prediction, as a fraction of one
    /// tick of movement.
    #[serde(default = "default_prediction_tolerance")]
    pub prediction_tolerance: f64,
    /// Largest allowed extrapolation, in ticks of movement.
    #[serde(default = "default_max_correction")]
    pub max_correction: f64,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            prediction_tolerance: default_prediction_tolerance(),
            max_correction: default_max_correction(),
        }
    }
}

fn default_prediction_tolerance() -> f64 {
    0.1
}
fn default_max_correction() -> f64 {
    1.0
}

/// Grid search settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathfinderConfig {
    /// Maximum number of cells expanded per search.
    #[serde(default = "default_max_nodes")]
    pub max_nodes: usize,
}

impl Default for PathfinderConfig {
    fn default() -> Self {
        Self {
            max_nodes: default_max_nodes(),
        }
    }
}

fn default_max_nodes() -> usize {
    4096
}

/// Which behaviour an NPC runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BehaviorKind {
    Aggressive,
    Wanders,
}

/// One scripted NPC.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NpcConfig {
    pub name: String,
    pub behavior: BehaviorKind,
    pub position: [f64; 3],
    #[serde(default = "default_npc_speed")]
    pub speed: f64,
    #[serde(default = "default_vision_radius")]
    pub vision_radius: u32,
    /// Round-robin targets for wandering NPCs (cell coordinates).
    #[serde(default)]
    pub waypoints: Vec<[i32; 3]>,
    /// Idle time between wandering legs.
    #[serde(default = "default_dwell")]
    pub dwell_ms: u64,
}

fn default_npc_speed() -> f64 {
    6.0
}
fn default_dwell() -> u64 {
    2000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.tick_interval_ms, 20);
        assert_eq!(config.tick_duration(), Duration::from_millis(20));
        assert_eq!(config.reconcile.prediction_tolerance, 0.1);
        assert_eq!(config.reconcile.max_correction, 1.0);
        assert!(config.npcs.is_empty());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let text = r#"
            [server]
            tick_interval_ms = 40

            [zone]
            cell_size = 5.0
            walls = [[1, 0, 0], [2, 0, 0]]

            [[npcs]]
            name = "guard"
            behavior = "aggressive"
            position = [15.0, 15.0, 0.0]
        "#;
        let config: Config = toml::from_str(text).unwrap();
        assert_eq!(config.server.tick_interval_ms, 40);
        assert_eq!(config.server.command_queue, 1024);
        assert_eq!(config.zone.cell_size, 5.0);
        assert_eq!(config.zone.walls.len(), 2);
        assert_eq!(config.zone.min, [-32, -32, 0]);
        assert_eq!(config.zone.max, [31, 31, 0]);
        assert!(!config.zone.unbounded);
        assert_eq!(config.player.speed, 10.0);
        assert_eq!(config.npcs[0].behavior, BehaviorKind::Aggressive);
        assert_eq!(config.npcs[0].dwell_ms, 2000);
    }

    #[test]
    fn test_default_config_serializes() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.zone.min, [-32, -32, 0]);
    }

    #[test]
    fn test_unbounded_zone_flag() {
        let config: Config = toml::from_str("[zone]\nunbounded = true\n").unwrap();
        assert!(config.zone.unbounded);
        assert_eq!(config.zone.cell_size, 10.0);
    }
}
