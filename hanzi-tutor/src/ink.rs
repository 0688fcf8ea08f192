//! Handwriting ink
//!
//! An ink is an ordered list of strokes, each an ordered list of points. The
//! durable form is JSON `[[{"x":..,"y":..}, ...], ...]`: timestamps are
//! accepted on input and dropped when persisting.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// One sampled pen position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InkPoint {
    pub x: f32,
    pub y: f32,
    /// Capture time in epoch millis, if the source provided one
    #[serde(default, skip_serializing)]
    pub t: Option<i64>,
}

impl InkPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, t: None }
    }
}

/// One pen-down to pen-up trace
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Stroke {
    pub points: Vec<InkPoint>,
}

impl Stroke {
    pub fn new(points: Vec<InkPoint>) -> Self {
        Self { points }
    }

    /// Build a stroke from bare coordinates
    pub fn from_coords(coords: &[(f32, f32)]) -> Self {
        Self {
            points: coords.iter().map(|&(x, y)| InkPoint::new(x, y)).collect(),
        }
    }
}

/// A complete handwriting submission
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ink {
    pub strokes: Vec<Stroke>,
}

impl Ink {
    pub fn new(strokes: Vec<Stroke>) -> Self {
        Self { strokes }
    }

    pub fn stroke_count(&self) -> usize {
        self.strokes.len()
    }

    /// True when there is nothing to evaluate
    pub fn is_empty(&self) -> bool {
        self.strokes.iter().all(|s| s.points.is_empty())
    }

    /// Durable JSON form (timestamps discarded)
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse the durable JSON form
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
