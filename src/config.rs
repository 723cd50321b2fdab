// Configuration loading and parsing (auction.toml).

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AuctionConfig {
    pub auction: AuctionSection,
    pub ladder: LadderConfig,
    pub agent: AgentConfig,
    pub pacing: PacingConfig,
    /// Per-team aggressiveness multipliers (team id -> multiplier).
    /// Teams not listed use 1.0.
    pub personalities: HashMap<String, f64>,
    pub db_path: String,
    pub data_paths: DataPaths,
}

// ---------------------------------------------------------------------------
// auction.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire auction.toml file.
#[derive(Debug, Clone, Deserialize)]
struct AuctionFile {
    auction: AuctionSection,
    ladder: LadderConfig,
    agent: AgentConfig,
    pacing: PacingConfig,
    #[serde(default)]
    personalities: HashMap<String, f64>,
    database: DatabaseSection,
    data_paths: DataPaths,
}

#[derive(Debug, Clone, Deserialize)]
struct DatabaseSection {
    path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuctionSection {
    /// The human-controlled team id.
    pub my_team: String,
    /// Maximum players per squad.
    pub squad_cap: usize,
    /// Maximum overseas players per squad.
    pub overseas_cap: usize,
    /// Consecutive no-bid rounds before the final call fires.
    pub final_call_after: u32,
    /// Half-width of the per-session uniform scaling of AI price ceilings.
    pub ceiling_spread: f64,
}

/// One bracket of the bid ladder: while the current bid is below `below`,
/// raise by `increment`.
#[derive(Debug, Clone, Deserialize)]
pub struct LadderTier {
    pub below: u64,
    pub increment: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LadderConfig {
    pub tiers: Vec<LadderTier>,
    /// Increment used above the highest tier.
    pub top_increment: u64,
}

impl Default for LadderConfig {
    fn default() -> Self {
        LadderConfig {
            tiers: vec![
                LadderTier {
                    below: 20_000_000,
                    increment: 1_000_000,
                },
                LadderTier {
                    below: 50_000_000,
                    increment: 2_000_000,
                },
            ],
            top_increment: 5_000_000,
        }
    }
}

/// Constants of the AI willingness formula. The defaults reproduce the
/// tuning the simulation shipped with; all of them are fair game to adjust.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Willingness above this bids.
    pub threshold: f64,
    /// Boost applied when the player's role is on the team's needed list.
    pub role_multiplier: f64,
    /// Bid-to-budget ratio above which willingness is dampened.
    pub budget_pressure_cutoff: f64,
    pub budget_pressure_dampener: f64,
    /// A bid above `overreach_factor` times the team's average budget per
    /// remaining slot is dampened.
    pub overreach_factor: f64,
    pub overreach_dampener: f64,
    /// Dampener applied once the bid passes the player's expected ceiling.
    pub ceiling_dampener: f64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            threshold: 0.7,
            role_multiplier: 1.5,
            budget_pressure_cutoff: 0.25,
            budget_pressure_dampener: 0.5,
            overreach_factor: 2.0,
            overreach_dampener: 0.3,
            ceiling_dampener: 0.3,
        }
    }
}

/// UX pacing knobs. Bounded and cancellable is the contract; the exact
/// values are presentation tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct PacingConfig {
    /// AI "thinking" delay bounds before a bid lands.
    pub thinking_min_ms: u64,
    pub thinking_max_ms: u64,
    /// How long the human gets to answer a final call before it lapses
    /// into a pass.
    pub final_call_window_ms: u64,
    /// Countdown before each lot opens; a seat command skips it.
    pub lot_intro_ms: u64,
    /// Zero out the simulated delays (the "simulate auction" mode).
    #[serde(default)]
    pub fast_forward: bool,
}

impl Default for PacingConfig {
    fn default() -> Self {
        PacingConfig {
            thinking_min_ms: 1_000,
            thinking_max_ms: 3_000,
            final_call_window_ms: 5_000,
            lot_intro_ms: 3_000,
            fast_forward: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    pub players: String,
    pub teams: String,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/auction.toml` relative to
/// the given `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy
/// defaults. Prefer `load_config()` which handles default initialization
/// automatically.
pub fn load_config_from(base_dir: &Path) -> Result<AuctionConfig, ConfigError> {
    let path = base_dir.join("config").join("auction.toml");
    let text = read_file(&path)?;
    let file: AuctionFile = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    let config = AuctionConfig {
        auction: file.auction,
        ladder: file.ladder,
        agent: file.agent,
        pacing: file.pacing,
        personalities: file.personalities,
        db_path: file.database.path,
        data_paths: file.data_paths,
    };

    validate(&config)?;

    Ok(config)
}

/// Ensure the config file exists by copying it from `defaults/` when
/// missing. Returns the list of files that were copied.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let mut copied = Vec::new();

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();

        // Skip non-files and entries without a file name
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        let target = config_dir.join(file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                // File already exists in config/, skip it
            }
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Convenience wrapper: loads config relative to the current working
/// directory. Ensures the default config file is copied before loading.
pub fn load_config() -> Result<AuctionConfig, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &AuctionConfig) -> Result<(), ConfigError> {
    let auction = &config.auction;
    if auction.my_team.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "auction.my_team".into(),
            message: "must not be empty".into(),
        });
    }
    if auction.squad_cap == 0 {
        return Err(ConfigError::ValidationError {
            field: "auction.squad_cap".into(),
            message: "must be greater than 0".into(),
        });
    }
    if auction.overseas_cap > auction.squad_cap {
        return Err(ConfigError::ValidationError {
            field: "auction.overseas_cap".into(),
            message: format!(
                "must not exceed squad_cap ({}), got {}",
                auction.squad_cap, auction.overseas_cap
            ),
        });
    }
    if auction.final_call_after == 0 {
        return Err(ConfigError::ValidationError {
            field: "auction.final_call_after".into(),
            message: "must be greater than 0".into(),
        });
    }
    if !(0.0..1.0).contains(&auction.ceiling_spread) {
        return Err(ConfigError::ValidationError {
            field: "auction.ceiling_spread".into(),
            message: format!("must be in [0.0, 1.0), got {}", auction.ceiling_spread),
        });
    }

    // Ladder: at least one bracket, positive increments, ascending bounds.
    let ladder = &config.ladder;
    if ladder.tiers.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "ladder.tiers".into(),
            message: "must contain at least one tier".into(),
        });
    }
    if ladder.top_increment == 0 {
        return Err(ConfigError::ValidationError {
            field: "ladder.top_increment".into(),
            message: "must be greater than 0".into(),
        });
    }
    let mut prev_below = 0;
    for (i, tier) in ladder.tiers.iter().enumerate() {
        if tier.increment == 0 {
            return Err(ConfigError::ValidationError {
                field: format!("ladder.tiers[{i}].increment"),
                message: "must be greater than 0".into(),
            });
        }
        if tier.below <= prev_below {
            return Err(ConfigError::ValidationError {
                field: format!("ladder.tiers[{i}].below"),
                message: "tiers must be strictly ascending".into(),
            });
        }
        prev_below = tier.below;
    }

    // Agent: threshold in (0, 1), multipliers positive, dampeners in (0, 1].
    let agent = &config.agent;
    if agent.threshold <= 0.0 || agent.threshold >= 1.0 {
        return Err(ConfigError::ValidationError {
            field: "agent.threshold".into(),
            message: format!("must be in (0.0, 1.0), got {}", agent.threshold),
        });
    }
    let multiplier_fields: &[(&str, f64)] = &[
        ("agent.role_multiplier", agent.role_multiplier),
        ("agent.overreach_factor", agent.overreach_factor),
    ];
    for (name, val) in multiplier_fields {
        if *val <= 0.0 {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: format!("must be > 0, got {val}"),
            });
        }
    }
    let dampener_fields: &[(&str, f64)] = &[
        (
            "agent.budget_pressure_dampener",
            agent.budget_pressure_dampener,
        ),
        ("agent.overreach_dampener", agent.overreach_dampener),
        ("agent.ceiling_dampener", agent.ceiling_dampener),
    ];
    for (name, val) in dampener_fields {
        if *val <= 0.0 || *val > 1.0 {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: format!("must be in (0.0, 1.0], got {val}"),
            });
        }
    }
    if !(0.0..=1.0).contains(&agent.budget_pressure_cutoff) {
        return Err(ConfigError::ValidationError {
            field: "agent.budget_pressure_cutoff".into(),
            message: format!(
                "must be in [0.0, 1.0], got {}",
                agent.budget_pressure_cutoff
            ),
        });
    }

    // Pacing: bounds must be ordered.
    if config.pacing.thinking_min_ms > config.pacing.thinking_max_ms {
        return Err(ConfigError::ValidationError {
            field: "pacing.thinking_min_ms".into(),
            message: format!(
                "must not exceed thinking_max_ms ({}), got {}",
                config.pacing.thinking_max_ms, config.pacing.thinking_min_ms
            ),
        });
    }

    // Personalities must be positive multipliers.
    for (team_id, mult) in &config.personalities {
        if *mult <= 0.0 {
            return Err(ConfigError::ValidationError {
                field: format!("personalities.{team_id}"),
                message: format!("must be > 0, got {mult}"),
            });
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
