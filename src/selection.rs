use serde::Deserialize;

// ---------------------------------------------------------------------------
// Scatter-plot selection tools
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionTool {
    /// Axis-aligned rectangle between drag start and end.
    #[default]
    Box,
    /// Free-form polygon traced by the drag.
    Lasso,
}

impl SelectionTool {
    pub fn label(self) -> &'static str {
        match self {
            SelectionTool::Box => "Box select",
            SelectionTool::Lasso => "Lasso select",
        }
    }
}

/// A finished selection region in plot coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionShape {
    Rect { min: [f64; 2], max: [f64; 2] },
    Polygon(Vec<[f64; 2]>),
}

impl SelectionShape {
    /// Build the shape for `tool` from the pointer path of a drag.
    ///
    /// `None` when the path is too short to enclose anything.
    pub fn from_drag(tool: SelectionTool, path: &[[f64; 2]]) -> Option<SelectionShape> {
        match tool {
            SelectionTool::Box => {
                let (start, end) = (path.first()?, path.last()?);
                let min = [start[0].min(end[0]), start[1].min(end[1])];
                let max = [start[0].max(end[0]), start[1].max(end[1])];
                (min != max).then_some(SelectionShape::Rect { min, max })
            }
            SelectionTool::Lasso => {
                (path.len() >= 3).then(|| SelectionShape::Polygon(path.to_vec()))
            }
        }
    }

    pub fn contains(&self, p: [f64; 2]) -> bool {
        match self {
            SelectionShape::Rect { min, max } => {
                p[0] >= min[0] && p[0] <= max[0] && p[1] >= min[1] && p[1] <= max[1]
            }
            SelectionShape::Polygon(vertices) => point_in_polygon(p, vertices),
        }
    }

    /// Closed outline for drawing.
    pub fn outline(&self) -> Vec<[f64; 2]> {
        match self {
            SelectionShape::Rect { min, max } => vec![
                [min[0], min[1]],
                [max[0], min[1]],
                [max[0], max[1]],
                [min[0], max[1]],
            ],
            SelectionShape::Polygon(vertices) => vertices.clone(),
        }
    }
}

/// Even-odd ray casting; the polygon is implicitly closed.
fn point_in_polygon(p: [f64; 2], vertices: &[[f64; 2]]) -> bool {
    let mut inside = false;
    let mut j = vertices.len().wrapping_sub(1);
    for (i, vi) in vertices.iter().enumerate() {
        let vj = vertices[j];
        if (vi[1] > p[1]) != (vj[1] > p[1])
            && p[0] < (vj[0] - vi[0]) * (p[1] - vi[1]) / (vj[1] - vi[1]) + vi[0]
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}
