//! Labels detected on a multi-fabric source photo.
//!
//! Sellers mark fabric swatches with letters: `T` (top), `D` (dupatta),
//! `B` (bottom) and `C` (color variant of the same design).

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;

/// Role of a labeled piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceKind {
    Top,
    Dupatta,
    Bottom,
    ColorVariant,
    Unknown,
}

/// One labeled swatch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FabricPiece {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub position: String,
}

impl FabricPiece {
    pub fn kind(&self) -> PieceKind {
        match self.label.trim().to_ascii_uppercase().as_str() {
            "T" => PieceKind::Top,
            "D" => PieceKind::Dupatta,
            "B" => PieceKind::Bottom,
            "C" => PieceKind::ColorVariant,
            _ => PieceKind::Unknown,
        }
    }
}

/// Detector output stored on the job (JSONB).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DetectedLabels {
    #[serde(default)]
    pub pieces: Vec<FabricPiece>,
    #[serde(default)]
    pub sample_count: usize,
    #[serde(default)]
    pub has_bottom: bool,
    #[serde(default)]
    pub color_variants: Vec<String>,
    #[serde(default)]
    pub summary: String,
}

impl DetectedLabels {
    /// Read detector JSON leniently: numbers may arrive as strings or floats,
    /// booleans as strings, and any field may be missing.
    pub fn from_value(value: &JsonValue) -> Self {
        let pieces = value
            .get("pieces")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| {
                        let text = |key: &str| {
                            item.get(key)
                                .and_then(|v| v.as_str())
                                .unwrap_or_default()
                                .trim()
                                .to_string()
                        };
                        let piece = FabricPiece {
                            label: text("label"),
                            description: text("description"),
                            position: text("position"),
                        };
                        (!piece.label.is_empty()).then_some(piece)
                    })
                    .collect()
            })
            .unwrap_or_default();

        let sample_count = match value.get("sample_count") {
            Some(JsonValue::Number(n)) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f.round() as u64))
                .unwrap_or(0) as usize,
            Some(JsonValue::String(s)) => s.trim().parse().unwrap_or(0),
            _ => 0,
        };

        let has_bottom = match value.get("has_bottom") {
            Some(JsonValue::Bool(b)) => *b,
            Some(JsonValue::String(s)) => matches!(s.trim().to_lowercase().as_str(), "true" | "yes"),
            _ => false,
        };

        let color_variants = value
            .get("color_variants")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str())
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let summary = value
            .get("summary")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        Self {
            pieces,
            sample_count,
            has_bottom,
            color_variants,
            summary,
        }
    }

    /// Make the counts self-consistent.
    ///
    /// - `color_variants` is filled from `C` pieces when the detector left it empty.
    /// - `has_bottom` is set when a `B` piece was found.
    /// - `sample_count >= max(1, 1 + color_variants.len())`.
    pub fn normalized(mut self) -> Self {
        if self.color_variants.is_empty() {
            self.color_variants = self
                .pieces_of(PieceKind::ColorVariant)
                .map(|p| p.description.clone())
                .filter(|d| !d.is_empty())
                .collect();
        }

        if self.pieces_of(PieceKind::Bottom).next().is_some() {
            self.has_bottom = true;
        }

        let implied = 1 + self.color_variants.len();
        self.sample_count = self.sample_count.max(implied);
        self
    }

    pub fn pieces_of(&self, kind: PieceKind) -> impl Iterator<Item = &FabricPiece> {
        self.pieces.iter().filter(move |p| p.kind() == kind)
    }

    pub fn first_piece(&self, kind: PieceKind) -> Option<&FabricPiece> {
        self.pieces_of(kind).next()
    }

    /// `"T: navy floral"` style lines used as caption context.
    pub fn context_lines(&self) -> Vec<String> {
        self.pieces
            .iter()
            .map(|p| format!("{}: {}", p.label, p.description))
            .collect()
    }
}
