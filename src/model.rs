use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::path::{Path, PathBuf};

pub const DEFAULT_PRESET: &str = "balanced";

/// Detection parameters sent with every upload.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionConfig {
    pub preset: String,
    pub min_confidence: f64,
    pub min_visibility: f64,
    pub speed_threshold: f64,
    pub extension_threshold: f64,
    pub elbow_angle_threshold: f64,
    pub cooldown_sec: f64,
    pub combo_gap_sec: f64,
    pub timeline_bucket_sec: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            preset: DEFAULT_PRESET.to_string(),
            min_confidence: 0.35,
            min_visibility: 0.5,
            speed_threshold: 0.022,
            extension_threshold: 0.006,
            elbow_angle_threshold: 120.0,
            cooldown_sec: 0.15,
            combo_gap_sec: 0.8,
            timeline_bucket_sec: 10.0,
        }
    }
}

impl DetectionConfig {
    /// Read a single field.
    pub fn get(&self, field: ConfigField) -> ConfigValue {
        match field {
            ConfigField::Preset => ConfigValue::Text(self.preset.clone()),
            ConfigField::MinConfidence => ConfigValue::Number(self.min_confidence),
            ConfigField::MinVisibility => ConfigValue::Number(self.min_visibility),
            ConfigField::SpeedThreshold => ConfigValue::Number(self.speed_threshold),
            ConfigField::ExtensionThreshold => ConfigValue::Number(self.extension_threshold),
            ConfigField::ElbowAngleThreshold => ConfigValue::Number(self.elbow_angle_threshold),
            ConfigField::CooldownSec => ConfigValue::Number(self.cooldown_sec),
            ConfigField::ComboGapSec => ConfigValue::Number(self.combo_gap_sec),
            ConfigField::TimelineBucketSec => ConfigValue::Number(self.timeline_bucket_sec),
        }
    }

    /// Form fields in wire order, every value rendered as text.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        ConfigField::ALL
            .iter()
            .map(|f| (f.name(), self.get(*f).to_form_value()))
            .collect()
    }
}

/// Names of the editable detection parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigField {
    Preset,
    MinConfidence,
    MinVisibility,
    SpeedThreshold,
    ExtensionThreshold,
    ElbowAngleThreshold,
    CooldownSec,
    ComboGapSec,
    TimelineBucketSec,
}

impl ConfigField {
    pub const ALL: [ConfigField; 9] = [
        ConfigField::Preset,
        ConfigField::MinConfidence,
        ConfigField::MinVisibility,
        ConfigField::SpeedThreshold,
        ConfigField::ExtensionThreshold,
        ConfigField::ElbowAngleThreshold,
        ConfigField::CooldownSec,
        ConfigField::ComboGapSec,
        ConfigField::TimelineBucketSec,
    ];

    /// Form field name expected by the service.
    pub fn name(self) -> &'static str {
        match self {
            ConfigField::Preset => "preset",
            ConfigField::MinConfidence => "min_confidence",
            ConfigField::MinVisibility => "min_visibility",
            ConfigField::SpeedThreshold => "speed_threshold",
            ConfigField::ExtensionThreshold => "extension_threshold",
            ConfigField::ElbowAngleThreshold => "elbow_angle_threshold",
            ConfigField::CooldownSec => "cooldown_sec",
            ConfigField::ComboGapSec => "combo_gap_sec",
            ConfigField::TimelineBucketSec => "timeline_bucket_sec",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ConfigField::Preset => "Preset",
            ConfigField::MinConfidence => "Min confidence",
            ConfigField::MinVisibility => "Min visibility",
            ConfigField::SpeedThreshold => "Speed threshold",
            ConfigField::ExtensionThreshold => "Extension threshold",
            ConfigField::ElbowAngleThreshold => "Elbow angle threshold",
            ConfigField::CooldownSec => "Cooldown (sec)",
            ConfigField::ComboGapSec => "Combo gap (sec)",
            ConfigField::TimelineBucketSec => "Timeline bucket (sec)",
        }
    }

    /// Advisory range shown next to the field. Nothing enforces it.
    pub fn domain(self) -> &'static str {
        match self {
            ConfigField::Preset => "preset name",
            ConfigField::MinConfidence | ConfigField::MinVisibility => "0..1",
            ConfigField::ElbowAngleThreshold => "60..180",
            ConfigField::TimelineBucketSec => ">= 1",
            _ => ">= 0",
        }
    }

    pub fn is_numeric(self) -> bool {
        !matches!(self, ConfigField::Preset)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        ConfigField::ALL.iter().copied().find(|f| f.name() == name)
    }

    /// Turn user-typed text into a value of the right kind for this field.
    pub fn parse_value(self, raw: &str) -> Result<ConfigValue, crate::error::ConfigError> {
        if !self.is_numeric() {
            return Ok(ConfigValue::Text(raw.trim().to_string()));
        }
        raw.trim()
            .parse::<f64>()
            .map(ConfigValue::Number)
            .map_err(|_| crate::error::ConfigError::InvalidNumber {
                field: self.name(),
                input: raw.to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Number(f64),
    Text(String),
}

impl ConfigValue {
    /// Decimal text sent in the multipart form (`120` rather than `120.0`).
    pub fn to_form_value(&self) -> String {
        match self {
            ConfigValue::Number(n) => n.to_string(),
            ConfigValue::Text(s) => s.clone(),
        }
    }
}

impl std::fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_form_value())
    }
}

pub const HEALTH_CHECKING: &str = "Checking API status...";
pub const HEALTH_ONLINE: &str = "API online";
pub const HEALTH_NOT_OK: &str = "API returned non-ok status";
pub const HEALTH_UNREACHABLE: &str = "API unreachable";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthStatus {
    pub ok: bool,
    pub text: String,
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self {
            ok: false,
            text: HEALTH_CHECKING.to_string(),
        }
    }
}

impl HealthStatus {
    /// Build from the `status` field of a decoded `/health` body.
    pub fn from_status(status: Option<&str>) -> Self {
        let ok = status == Some("ok");
        Self {
            ok,
            text: if ok { HEALTH_ONLINE } else { HEALTH_NOT_OK }.to_string(),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            ok: false,
            text: HEALTH_UNREACHABLE.to_string(),
        }
    }
}

/// Ordered preset names offered by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetCatalog(Vec<String>);

impl Default for PresetCatalog {
    fn default() -> Self {
        Self(vec![DEFAULT_PRESET.to_string()])
    }
}

impl PresetCatalog {
    /// Empty key sets fall back to the default catalog.
    pub fn from_names(names: Vec<String>) -> Self {
        if names.is_empty() {
            Self::default()
        } else {
            Self(names)
        }
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }

    /// Preset after (or before) `current`, wrapping around.
    pub fn cycle(&self, current: &str, forward: bool) -> &str {
        let len = self.0.len();
        let next = match self.0.iter().position(|n| n == current) {
            Some(i) if forward => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
            None => 0,
        };
        &self.0[next]
    }
}

/// `GET /health` body. Any JSON value is accepted; only an object's `status` is read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HealthResponse {
    pub status: Option<Value>,
}

impl HealthResponse {
    pub fn from_value(body: &Value) -> Self {
        Self {
            status: body.get("status").cloned(),
        }
    }

    pub fn status_text(&self) -> Option<&str> {
        self.status.as_ref().and_then(Value::as_str)
    }
}

/// `GET /settings-presets` body. Only the key set is used.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PresetsResponse {
    #[serde(default, deserialize_with = "lenient")]
    pub preset_overrides: Option<serde_json::Map<String, Value>>,
}

impl PresetsResponse {
    pub fn preset_names(&self) -> Vec<String> {
        self.preset_overrides
            .as_ref()
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default()
    }
}

/// Analysis document returned by `/upload`.
///
/// The typed view is best-effort: any subtree with an unexpected shape reads as absent.
/// `raw` keeps the document exactly as received.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub video_stats: Option<VideoStats>,
    pub raw: Value,
}

impl AnalysisResult {
    pub fn from_value(raw: Value) -> Self {
        let video_stats = raw
            .get("video_stats")
            .filter(|v| v.is_object())
            .and_then(|v| VideoStats::deserialize(v).ok());
        Self { video_stats, raw }
    }

    pub fn events(&self) -> &[PunchEvent] {
        self.video_stats
            .as_ref()
            .map(|s| s.punch_events.as_slice())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VideoStats {
    #[serde(default)]
    pub counted_punches: Option<Value>,
    #[serde(default)]
    pub detected_punches_raw: Option<Value>,
    #[serde(default)]
    pub pose_coverage: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub analytics: Option<Analytics>,
    #[serde(default, deserialize_with = "lenient_events")]
    pub punch_events: Vec<PunchEvent>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Analytics {
    #[serde(default)]
    pub punches_per_minute: Option<Value>,
    #[serde(default)]
    pub combo_count: Option<Value>,
    #[serde(default)]
    pub max_combo: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PunchEvent {
    #[serde(default)]
    pub frame: Option<Value>,
    #[serde(default)]
    pub time_sec: Option<Value>,
    #[serde(default)]
    pub hand: Option<Value>,
    #[serde(default, rename = "type")]
    pub kind: Option<Value>,
    #[serde(default)]
    pub confidence: Option<Value>,
    #[serde(default)]
    pub counted: Option<Value>,
}

/// Deserialize an object-shaped `T`, reading anything else as `None`.
fn lenient<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let v = Value::deserialize(de)?;
    if !v.is_object() {
        return Ok(None);
    }
    Ok(serde_json::from_value(v).ok())
}

/// Keep event order; entries that are not objects become empty events.
fn lenient_events<'de, D>(de: D) -> Result<Vec<PunchEvent>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(de)?;
    let Value::Array(items) = v else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .map(|item| match item {
            Value::Object(_) => serde_json::from_value(item).unwrap_or_default(),
            _ => PunchEvent::default(),
        })
        .collect())
}

/// A video chosen by the user. Only the path is held; bytes are read at submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
}

impl SelectedFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Base name as shown to the user and sent as the upload filename.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
