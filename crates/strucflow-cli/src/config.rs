use crate::error::{CliError, Result};
use crate::utils::parser;
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use strucflow::core::turntable::TurntableParams;
use strucflow::tools::registry::{Tool, ToolPaths};
use strucflow::workflows::animate::{DEFAULT_DELAY, DEFAULT_SPIN_ANGLE};
use tracing::debug;

pub const CONFIG_FILE_NAME: &str = "strucflow.toml";
pub const DEFAULT_ENGINE_PROGRAM: &str = "voronota-js";
pub const DEFAULT_ENGINE_ARGS: [&str; 1] = ["--json-lines"];

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialEngineConfig {
    program: Option<String>,
    args: Option<Vec<String>>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialToolsConfig {
    curl: Option<String>,
    zcat: Option<String>,
    image_encoder: Option<String>,
    tmalign: Option<String>,
    scwrl: Option<String>,
    timeout_seconds: Option<u64>,
}

impl PartialToolsConfig {
    fn slot(&mut self, tool: Tool) -> &mut Option<String> {
        match tool {
            Tool::Curl => &mut self.curl,
            Tool::Zcat => &mut self.zcat,
            Tool::ImageEncoder => &mut self.image_encoder,
            Tool::TmAlign => &mut self.tmalign,
            Tool::Scwrl => &mut self.scwrl,
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialWorkspaceConfig {
    root: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialAnimationConfig {
    delay: Option<u32>,
    pause_frames: Option<usize>,
    hide_gui: Option<bool>,
    spin_angle: Option<f64>,
    turntable_steps: Option<usize>,
    turntable_angle: Option<f64>,
}

/// The configuration file as written, every field optional.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialAppConfig {
    engine: Option<PartialEngineConfig>,
    tools: Option<PartialToolsConfig>,
    workspace: Option<PartialWorkspaceConfig>,
    animation: Option<PartialAnimationConfig>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub program: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationSettings {
    pub delay: u32,
    pub pause_frames: usize,
    pub hide_gui: bool,
    pub spin_angle: f64,
    pub turntable_steps: usize,
    pub turntable_angle: f64,
}

/// Fully resolved settings shared by every subcommand.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub engine: EngineSettings,
    pub tools: ToolPaths,
    pub tool_timeout: Option<Duration>,
    pub workspace_root: Option<PathBuf>,
    pub animation: AnimationSettings,
}

impl PartialAppConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let (key, value) =
                parser::parse_assignment(kv_pair).map_err(|e| CliError::Config(e.to_string()))?;
            self.apply_set_value(key, value)
                .map_err(|e| CliError::Config(e.to_string()))?;
        }
        Ok(())
    }

    fn apply_set_value(&mut self, key: &str, value: &str) -> std::result::Result<(), parser::ParseError> {
        if let Some(tool_key) = key.strip_prefix("tools.") {
            if let Some(tool) = Tool::ALL.into_iter().find(|t| t.config_key() == tool_key) {
                *self.tools.get_or_insert_with(Default::default).slot(tool) = Some(value.to_string());
                return Ok(());
            }
        }

        match key {
            "engine.program" => {
                self.engine.get_or_insert_with(Default::default).program = Some(value.to_string());
            }
            "tools.timeout-seconds" => {
                self.tools.get_or_insert_with(Default::default).timeout_seconds =
                    Some(parser::parse_value(key, value, "integer")?);
            }
            "workspace.root" => {
                self.workspace.get_or_insert_with(Default::default).root = Some(PathBuf::from(value));
            }
            "animation.delay" => {
                self.animation.get_or_insert_with(Default::default).delay =
                    Some(parser::parse_value(key, value, "integer")?);
            }
            "animation.pause-frames" => {
                self.animation.get_or_insert_with(Default::default).pause_frames =
                    Some(parser::parse_value(key, value, "integer")?);
            }
            "animation.hide-gui" => {
                self.animation.get_or_insert_with(Default::default).hide_gui =
                    Some(parser::parse_value(key, value, "boolean")?);
            }
            "animation.spin-angle" => {
                self.animation.get_or_insert_with(Default::default).spin_angle =
                    Some(parser::parse_value(key, value, "float")?);
            }
            "animation.turntable-steps" => {
                self.animation.get_or_insert_with(Default::default).turntable_steps =
                    Some(parser::parse_value(key, value, "integer")?);
            }
            "animation.turntable-angle" => {
                self.animation.get_or_insert_with(Default::default).turntable_angle =
                    Some(parser::parse_value(key, value, "float")?);
            }
            _ => {
                return Err(parser::ParseError::UnsupportedKey(key.to_string()));
            }
        }
        Ok(())
    }

    /// Fills every unset field with its built-in default.
    pub fn resolve(self) -> AppConfig {
        let engine = self.engine.unwrap_or_default();
        let mut tools_file = self.tools.unwrap_or_default();
        let animation = self.animation.unwrap_or_default();
        let turntable = TurntableParams::default();

        let mut tools = ToolPaths::default();
        for tool in Tool::ALL {
            if let Some(executable) = tools_file.slot(tool).take() {
                tools.set(tool, executable);
            }
        }

        AppConfig {
            engine: EngineSettings {
                program: engine
                    .program
                    .unwrap_or_else(|| DEFAULT_ENGINE_PROGRAM.to_string()),
                args: engine
                    .args
                    .unwrap_or_else(|| DEFAULT_ENGINE_ARGS.map(String::from).to_vec()),
            },
            tools,
            tool_timeout: tools_file.timeout_seconds.map(Duration::from_secs),
            workspace_root: self.workspace.and_then(|w| w.root),
            animation: AnimationSettings {
                delay: animation.delay.unwrap_or(DEFAULT_DELAY),
                pause_frames: animation.pause_frames.unwrap_or(turntable.pause_frames),
                hide_gui: animation.hide_gui.unwrap_or(false),
                spin_angle: animation.spin_angle.unwrap_or(DEFAULT_SPIN_ANGLE),
                turntable_steps: animation.turntable_steps.unwrap_or(turntable.steps),
                turntable_angle: animation.turntable_angle.unwrap_or(turntable.angle_degrees),
            },
        }
    }
}

/// `<config_dir>/strucflow.toml` for the current user, if the platform has one.
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("org", "strucflow", "strucflow")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// Reads the explicit or default configuration file and applies `-S` overrides.
///
/// An explicit path must exist; the default path is only used when it does.
pub fn load_config(explicit: Option<&Path>, set_values: &[String]) -> Result<AppConfig> {
    let mut partial = match explicit {
        Some(path) => PartialAppConfig::from_file(path)?,
        None => match default_config_path() {
            Some(path) if path.exists() => PartialAppConfig::from_file(&path)?,
            _ => {
                debug!("No configuration file found, using built-in defaults.");
                PartialAppConfig::default()
            }
        },
    };
    partial.apply_set_values(set_values)?;
    Ok(partial.resolve())
}
