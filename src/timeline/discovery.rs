//! Secondary overlay discovery from a WMTS capability document.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{GeoError, Result};
use crate::services::CapabilitySource;

/// Used when the matched layer advertises no tile `ResourceURL`.
const FALLBACK_TEMPLATE: &str =
    "https://wmts.geo.admin.ch/1.0.0/{layer}/default/current/3857/{z}/{x}/{y}.png";
const DEFAULT_TIME: &str = "current";
const DEFAULT_STYLE: &str = "default";
const DEFAULT_MATRIX_SET: &str = "3857";

// == Capability Layer ==
/// The parts of a `<Layer>` the overlay needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilityLayer {
    pub identifier: String,
    pub template: Option<String>,
    pub matrix_set: Option<String>,
}

// == Secondary Overlay ==
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecondaryOverlay {
    pub layer: String,
    pub tile_template: String,
    /// False when the hardcoded template was used.
    pub advertised: bool,
}

// == Parse ==
/// Lists the layers under `<Contents>`.
pub fn parse_capabilities(document: &str) -> Result<Vec<CapabilityLayer>> {
    let mut reader = Reader::from_str(document);
    reader.config_mut().trim_text(true);

    let mut path: Vec<String> = Vec::new();
    let mut layers = Vec::new();
    let mut current: Option<CapabilityLayer> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            GeoError::ParseFailure(format!(
                "capabilities at byte {}: {}",
                reader.buffer_position(),
                e
            ))
        })?;

        match event {
            Event::Eof => break,
            Event::Start(element) => {
                let name = local_name(&element);
                if name == "Layer" && parent_is(&path, "Contents") {
                    current = Some(CapabilityLayer::default());
                }
                if name == "ResourceURL" && parent_is(&path, "Layer") {
                    read_resource_url(&element, current.as_mut())?;
                }
                path.push(name);
            }
            Event::Empty(element) => {
                if local_name(&element) == "ResourceURL" && parent_is(&path, "Layer") {
                    read_resource_url(&element, current.as_mut())?;
                }
            }
            Event::Text(text) => {
                let Some(layer) = current.as_mut() else { continue };
                let text = text
                    .unescape()
                    .map_err(|e| GeoError::ParseFailure(e.to_string()))?
                    .into_owned();

                let depth = path.len();
                let (Some(leaf), Some(parent)) = (
                    path.last().map(String::as_str),
                    depth.checked_sub(2).and_then(|i| path.get(i)).map(String::as_str),
                ) else {
                    continue;
                };

                match (parent, leaf) {
                    ("Layer", "Identifier") => layer.identifier = text,
                    ("TileMatrixSetLink", "TileMatrixSet") if layer.matrix_set.is_none() => {
                        layer.matrix_set = Some(text)
                    }
                    _ => {}
                }
            }
            Event::End(_) => {
                let closed = path.pop();
                if closed.as_deref() == Some("Layer") && parent_is(&path, "Contents") {
                    layers.extend(current.take());
                }
            }
            _ => {}
        }
    }

    Ok(layers)
}

fn local_name(element: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(element.local_name().as_ref()).into_owned()
}

fn parent_is(path: &[String], name: &str) -> bool {
    path.last().is_some_and(|last| last == name)
}

/// Keeps the first tile template of the layer.
fn read_resource_url(element: &BytesStart<'_>, layer: Option<&mut CapabilityLayer>) -> Result<()> {
    let Some(layer) = layer else { return Ok(()) };
    if layer.template.is_some() {
        return Ok(());
    }

    let mut template = None;
    let mut is_tile = true;
    for attr in element.attributes() {
        let attr = attr.map_err(|e| GeoError::ParseFailure(e.to_string()))?;
        let value = attr
            .unescape_value()
            .map_err(|e| GeoError::ParseFailure(e.to_string()))?;
        match attr.key.local_name().as_ref() {
            b"template" => template = Some(value.into_owned()),
            b"resourceType" => is_tile = value == "tile",
            _ => {}
        }
    }

    if is_tile {
        layer.template = template;
    }
    Ok(())
}

// == Normalize ==
/// Rewrites WMTS placeholders to `{z}/{x}/{y}` and fills the dimensions.
pub fn normalize_template(template: &str, matrix_set: Option<&str>) -> String {
    template
        .replace("{TileMatrix}", "{z}")
        .replace("{TileCol}", "{x}")
        .replace("{TileRow}", "{y}")
        .replace("{Time}", DEFAULT_TIME)
        .replace("{Style}", DEFAULT_STYLE)
        .replace("{TileMatrixSet}", matrix_set.unwrap_or(DEFAULT_MATRIX_SET))
}

pub fn fallback_template(layer: &str) -> String {
    FALLBACK_TEMPLATE.replace("{layer}", layer)
}

/// Finds `layer_id` in the document and builds its tile template.
pub fn overlay_from_document(document: &str, layer_id: &str) -> Result<SecondaryOverlay> {
    let layer = parse_capabilities(document)?
        .into_iter()
        .find(|layer| layer.identifier.eq_ignore_ascii_case(layer_id))
        .ok_or_else(|| GeoError::NotFound(format!("layer {layer_id} not advertised")))?;

    Ok(match layer.template.as_deref() {
        Some(template) => SecondaryOverlay {
            layer: layer.identifier.clone(),
            tile_template: normalize_template(template, layer.matrix_set.as_deref()),
            advertised: true,
        },
        None => SecondaryOverlay {
            tile_template: fallback_template(&layer.identifier),
            layer: layer.identifier,
            advertised: false,
        },
    })
}

// == Discover ==
/// Fetches and matches the secondary overlay. Any failure omits the overlay.
pub async fn discover_overlay(
    source: &dyn CapabilitySource,
    layer_id: &str,
) -> Option<SecondaryOverlay> {
    let document = match source.fetch().await {
        Ok(document) => document,
        Err(e) => {
            warn!("Capability document unavailable, secondary overlay disabled: {}", e);
            return None;
        }
    };

    match overlay_from_document(&document, layer_id) {
        Ok(overlay) => {
            info!("Secondary overlay {} -> {}", overlay.layer, overlay.tile_template);
            Some(overlay)
        }
        Err(e) => {
            warn!("Secondary overlay disabled: {}", e);
            None
        }
    }
}
