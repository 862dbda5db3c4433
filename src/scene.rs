use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use glam::Vec3;
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

use crate::scheduler::{RenderPolicy, SchedulerConfig};

/// Everything needed to build the demo scene. Defaults reproduce the stock demo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SceneConfig {
    #[serde(default)]
    pub background: Background,
    #[serde(default)]
    pub lighting: LightingConfig,
    #[serde(default)]
    pub ground: GroundConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub minimap: MinimapConfig,
    #[serde(default)]
    pub timing: LoopConfig,
    #[serde(default)]
    pub debug: DebugConfig,
}

impl SceneConfig {
    /// Parses a `<scene>` document. Sections and fields that are absent keep their defaults.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("invalid scene XML")?;
        let root = document.root_element();
        if !root.has_tag_name("scene") {
            return Err(anyhow!(
                "expected <scene> root element, found <{}>",
                root.tag_name().name()
            ));
        }

        let mut config = Self::default();
        config.background.clear_color =
            parse_color(optional_text(&root, "background"), config.background.clear_color)
                .context("<background>")?;
        config.lighting.ambient =
            parse_color(optional_text(&root, "ambient"), config.lighting.ambient)
                .context("<ambient>")?;

        if let Some(node) = section(&root, "ground") {
            let ground = &mut config.ground;
            ground.size = parse_f32(optional_text(&node, "size"), ground.size).context("<ground>")?;
            if let Some(texture) = optional_text(&node, "texture") {
                ground.texture = texture;
            }
            ground.anisotropy = parse_u32(optional_text(&node, "anisotropy"), ground.anisotropy)
                .context("<ground>")?;
        }

        if let Some(node) = section(&root, "player") {
            let player = &mut config.player;
            player.radius = parse_f32(optional_text(&node, "radius"), player.radius).context("<player>")?;
            player.height = parse_f32(optional_text(&node, "height"), player.height).context("<player>")?;
            player.segments =
                parse_u32(optional_text(&node, "segments"), player.segments).context("<player>")?;
            player.color = parse_color(optional_text(&node, "color"), player.color).context("<player>")?;
            player.position =
                parse_vec3(optional_text(&node, "position"), player.position).context("<player>")?;
            player.speed = parse_f32(optional_text(&node, "speed"), player.speed).context("<player>")?;
        }

        if let Some(node) = section(&root, "camera") {
            let camera = &mut config.camera;
            camera.fov = parse_f32(optional_text(&node, "fov"), camera.fov).context("<camera>")?;
            camera.near = parse_f32(optional_text(&node, "near"), camera.near).context("<camera>")?;
            camera.far = parse_f32(optional_text(&node, "far"), camera.far).context("<camera>")?;
            camera.position =
                parse_vec3(optional_text(&node, "position"), camera.position).context("<camera>")?;
            camera.damping =
                parse_f32(optional_text(&node, "damping"), camera.damping).context("<camera>")?;
        }

        if let Some(node) = section(&root, "minimap") {
            let minimap = &mut config.minimap;
            minimap.extent = parse_f32(optional_text(&node, "extent"), minimap.extent).context("<minimap>")?;
            minimap.height = parse_f32(optional_text(&node, "height"), minimap.height).context("<minimap>")?;
            minimap.follow_zoom =
                parse_f32(optional_text(&node, "follow-zoom"), minimap.follow_zoom).context("<minimap>")?;
            minimap.marker_radius = parse_f32(optional_text(&node, "marker-radius"), minimap.marker_radius)
                .context("<minimap>")?;
            minimap.marker_color =
                parse_color(optional_text(&node, "marker-color"), minimap.marker_color).context("<minimap>")?;
            minimap.collapsed_size =
                parse_u32(optional_text(&node, "size"), minimap.collapsed_size).context("<minimap>")?;
            minimap.expanded_size = parse_u32(optional_text(&node, "expanded-size"), minimap.expanded_size)
                .context("<minimap>")?;
        }

        if let Some(node) = section(&root, "loop") {
            let timing = &mut config.timing;
            timing.hz = parse_u32(optional_text(&node, "hz"), timing.hz).context("<loop>")?;
            timing.max_delta_ms =
                parse_u32(optional_text(&node, "max-delta-ms"), timing.max_delta_ms).context("<loop>")?;
            if let Some(name) = optional_text(&node, "render") {
                timing.render = RenderPolicy::from_name(&name)
                    .ok_or_else(|| anyhow!("<loop>: unknown render policy '{name}'"))?;
            }
        }

        if let Some(node) = section(&root, "debug") {
            let debug = &mut config.debug;
            debug.background =
                parse_color(optional_text(&node, "background"), debug.background).context("<debug>")?;
            debug.value = parse_f32(optional_text(&node, "value"), debug.value).context("<debug>")?;
        }

        Ok(config)
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            max_frame_delta: Duration::from_millis(u64::from(self.timing.max_delta_ms.max(1))),
            render_policy: self.timing.render,
            ..SchedulerConfig::with_rate(self.timing.hz)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Background {
    pub clear_color: Vec3,
}

impl Default for Background {
    fn default() -> Self {
        Self {
            clear_color: hex_color(0x18142c),
        }
    }
}

/// Unlit scene, so only a soft white ambient term.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightingConfig {
    pub ambient: Vec3,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            ambient: hex_color(0x404040),
        }
    }
}

/// Flat textured plane the player walks on, centred at the origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundConfig {
    pub size: f32,
    pub texture: String,
    pub anisotropy: u32,
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            size: 200.0,
            texture: "map.jpg".to_string(),
            anisotropy: 16,
        }
    }
}

impl GroundConfig {
    pub fn half_extent(&self) -> f32 {
        self.size * 0.5
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    pub radius: f32,
    pub height: f32,
    pub segments: u32,
    pub color: Vec3,
    pub position: Vec3,
    /// Units per simulated second.
    pub speed: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            radius: 0.5,
            height: 2.0,
            segments: 16,
            color: hex_color(0x0077ff),
            position: Vec3::ZERO,
            // 0.1 units per 1/60 s step.
            speed: 6.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub damping: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 75.0,
            near: 0.1,
            far: 1000.0,
            position: Vec3::new(0.0, 1.0, 2.0),
            damping: 0.05,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinimapConfig {
    /// Half-width of the orthographic view when showing the whole ground.
    pub extent: f32,
    pub height: f32,
    pub follow_zoom: f32,
    pub marker_radius: f32,
    pub marker_color: Vec3,
    pub collapsed_size: u32,
    pub expanded_size: u32,
}

impl Default for MinimapConfig {
    fn default() -> Self {
        Self {
            extent: 100.0,
            height: 100.0,
            follow_zoom: 2.0,
            marker_radius: 4.0,
            marker_color: hex_color(0x00ff00),
            collapsed_size: 200,
            expanded_size: 400,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoopConfig {
    pub hz: u32,
    pub max_delta_ms: u32,
    #[serde(default)]
    pub render: RenderPolicy,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            hz: 60,
            max_delta_ms: 100,
            render: RenderPolicy::PerFrame,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DebugConfig {
    pub background: Vec3,
    pub value: f32,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            background: Vec3::ONE,
            value: 0.0,
        }
    }
}

pub(crate) fn hex_color(rgb: u32) -> Vec3 {
    Vec3::new(
        ((rgb >> 16) & 0xff) as f32 / 255.0,
        ((rgb >> 8) & 0xff) as f32 / 255.0,
        (rgb & 0xff) as f32 / 255.0,
    )
}

/// Parses `#rrggbb` (the leading `#` is optional).
pub fn parse_hex_color(value: &str) -> Result<Vec3> {
    let digits = value.trim().trim_start_matches('#');
    if digits.len() != 6 {
        return Err(anyhow!("expected #rrggbb, got '{value}'"));
    }
    let rgb = u32::from_str_radix(digits, 16)
        .map_err(|err| anyhow!("invalid hex color '{value}': {err}"))?;
    Ok(hex_color(rgb))
}

/// Formats a color as `#rrggbb`.
pub fn format_hex_color(color: Vec3) -> String {
    let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!(
        "#{:02x}{:02x}{:02x}",
        channel(color.x),
        channel(color.y),
        channel(color.z)
    )
}

fn section<'a, 'input>(node: &Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|child| child.has_tag_name(tag))
}

fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    section(node, tag)
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn parse_vec3(value: Option<String>, default: Vec3) -> Result<Vec3> {
    let Some(value) = value else {
        return Ok(default);
    };
    let components = value
        .split_whitespace()
        .map(|component| {
            component
                .parse::<f32>()
                .map_err(|err| anyhow!("invalid vector component '{component}': {err}"))
        })
        .collect::<Result<Vec<_>>>()?;
    match components.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(anyhow!("vector needs 3 components, got {}", components.len())),
    }
}

fn parse_color(value: Option<String>, default: Vec3) -> Result<Vec3> {
    let Some(value) = value else {
        return Ok(default);
    };
    if value.starts_with('#') {
        return parse_hex_color(&value);
    }
    let rgb = parse_vec3(Some(value), Vec3::ZERO).context("color is missing components")?;
    Ok(rgb / 255.0)
}

fn parse_f32(value: Option<String>, default: f32) -> Result<f32> {
    match value {
        Some(value) => value
            .parse::<f32>()
            .map_err(|err| anyhow!("failed to parse float '{value}': {err}")),
        None => Ok(default),
    }
}

fn parse_u32(value: Option<String>, default: u32) -> Result<u32> {
    match value {
        Some(value) => value
            .parse::<u32>()
            .map_err(|err| anyhow!("failed to parse integer '{value}': {err}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
    <scene>
        <background>#000000</background>
        <ambient>64 64 128</ambient>
        <player>
            <color>255 128 0</color>
            <speed>3</speed>
            <position>1 0 -2</position>
        </player>
        <minimap>
            <follow-zoom>4</follow-zoom>
        </minimap>
        <loop>
            <hz>30</hz>
            <max-delta-ms>250</max-delta-ms>
            <render>per-step</render>
        </loop>
    </scene>
    "#;

    #[test]
    fn defaults_match_stock_demo() {
        let config = SceneConfig::default();
        assert_eq!(config.ground.size, 200.0);
        assert_eq!(config.camera.fov, 75.0);
        assert_eq!(config.camera.position, Vec3::new(0.0, 1.0, 2.0));
        assert_eq!(format_hex_color(config.background.clear_color), "#18142c");
        assert_eq!(format_hex_color(config.lighting.ambient), "#404040");
        assert_eq!(format_hex_color(config.player.color), "#0077ff");
        assert_eq!(config.minimap.collapsed_size, 200);
        assert_eq!(config.minimap.expanded_size, 400);
    }

    #[test]
    fn parse_overrides_only_given_fields() {
        let config = SceneConfig::from_xml(SAMPLE).unwrap();
        assert_eq!(config.background.clear_color, Vec3::ZERO);
        assert_eq!(format_hex_color(config.lighting.ambient), "#404080");
        assert_eq!(config.player.color, Vec3::new(1.0, 128.0 / 255.0, 0.0));
        assert_eq!(config.player.speed, 3.0);
        assert_eq!(config.player.position, Vec3::new(1.0, 0.0, -2.0));
        assert_eq!(config.player.radius, 0.5);
        assert_eq!(config.minimap.follow_zoom, 4.0);
        assert_eq!(config.minimap.extent, 100.0);
        assert_eq!(config.ground, GroundConfig::default());

        let scheduler = config.scheduler_config();
        assert_eq!(scheduler.max_frame_delta, Duration::from_millis(250));
        assert_eq!(scheduler.render_policy, RenderPolicy::PerStep);
        assert!((scheduler.fixed_step.as_secs_f64() - 1.0 / 30.0).abs() < 1e-9);
    }

    #[test]
    fn malformed_values_are_errors() {
        let bad_vector = "<scene><player><position>1 2</position></player></scene>";
        assert!(SceneConfig::from_xml(bad_vector).is_err());
        let bad_color = "<scene><background>#12345</background></scene>";
        assert!(SceneConfig::from_xml(bad_color).is_err());
        let bad_policy = "<scene><loop><render>sometimes</render></loop></scene>";
        assert!(SceneConfig::from_xml(bad_policy).is_err());
        assert!(SceneConfig::from_xml("<world/>").is_err());
    }

    #[test]
    fn hex_colors_round_trip_through_text() {
        let color = parse_hex_color("#ff8000").unwrap();
        assert_eq!(format_hex_color(color), "#ff8000");
        assert!(parse_hex_color("ff80").is_err());
    }
}
