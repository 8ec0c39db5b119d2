use fixture_core::{MarkCode, MarkPoint, ModelPoint};
use std::collections::HashMap;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// Two nominal coordinates closer than this in every axis are the same mark.
pub const IDENTITY_PRECISION: f64 = 1e-5;

/// The role a fixture plays in a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum ModelKind {
    /// A fixture whose pose is measured.
    Adapter,
    /// The fixed fixture that all adapter poses are expressed against.
    Reference,
}

/// The catalog definition of a fixture: its nominal mark layout and tool centre points.
///
/// Models are loaded once and never change. They are shared between the objects measured from them.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Model {
    name: String,
    kind: ModelKind,
    points: Vec<MarkPoint<ModelPoint>>,
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    tool_center_points: Vec<ModelPoint>,
}

impl Model {
    pub fn new(name: impl Into<String>, kind: ModelKind, points: Vec<MarkPoint<ModelPoint>>) -> Self {
        Self {
            name: name.into(),
            kind,
            points,
            tool_center_points: vec![],
        }
    }

    pub fn adapter(name: impl Into<String>, points: Vec<MarkPoint<ModelPoint>>) -> Self {
        Self::new(name, ModelKind::Adapter, points)
    }

    pub fn reference(name: impl Into<String>, points: Vec<MarkPoint<ModelPoint>>) -> Self {
        Self::new(name, ModelKind::Reference, points)
    }

    #[must_use]
    pub fn with_tool_center_points(self, tool_center_points: Vec<ModelPoint>) -> Self {
        Self {
            tool_center_points,
            ..self
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn points(&self) -> &[MarkPoint<ModelPoint>] {
        &self.points
    }

    pub fn tool_center_points(&self) -> &[ModelPoint] {
        &self.tool_center_points
    }

    /// The nominal coordinates without their codes, in layout order.
    pub fn coordinates(&self) -> Vec<ModelPoint> {
        self.points.iter().map(|mark| *mark.point()).collect()
    }

    /// Whether both models describe the same physical fixture.
    ///
    /// The names must be equal and every coded mark present in both layouts must sit at the same nominal
    /// coordinate within [`IDENTITY_PRECISION`].
    pub fn same_fixture(&self, other: &Model) -> bool {
        if self.name != other.name {
            return false;
        }
        let coded: HashMap<MarkCode, ModelPoint> = self
            .points
            .iter()
            .filter(|mark| mark.has_code())
            .map(|mark| (mark.code(), *mark.point()))
            .collect();
        other
            .points
            .iter()
            .filter_map(|mark| coded.get(&mark.code()).map(|point| (point, mark.point())))
            .all(|(a, b)| a.approx_eq(b, IDENTITY_PRECISION))
    }
}
