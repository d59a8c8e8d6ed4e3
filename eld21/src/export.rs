//!
//! # Exposure Export
//!
//! Summarizes a fractured [Chip] for the pattern-generator stream writer:
//! per field, per cell, shot-ranked groups of device [Primitive]s,
//! checked against the generator's hardware limits.
//!

// Crates.io
use serde::{Deserialize, Serialize};

// Local imports
use crate::bbox::BoundBoxTrait;
use crate::chip::Chip;
use crate::config::limits;
use crate::data::{ArrayParams, Cell, CellId};
use crate::error::{ErrorContext, LayoutError, LayoutResult};
use crate::field::{Field, FieldId};
use crate::geom::Point;
use crate::primitive::{classify_polygon, Primitive};
use crate::utils::SerdeFile;
use crate::Int;

/// # Exposure Description
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Exposure {
    pub chip_size: Point,
    pub field_size: Point,
    /// Fields, in write order
    pub fields: Vec<FieldExposure>,
}
impl SerdeFile for Exposure {}

/// # Single-Field Exposure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FieldExposure {
    pub id: FieldId,
    /// Lower-left corner of the field
    pub displacement: Point,
    pub cells: Vec<CellExposure>,
}

/// # Single-Cell Exposure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CellExposure {
    pub id: CellId,
    pub groups: Vec<ShotGroup>,
    /// Array repetition, for cells with more than one element
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array: Option<ArrayParams>,
    /// Field-relative origin of array cells, to which their primitives are relative
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,
}

/// # Primitives Sharing a Shot Rank
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ShotGroup {
    pub shot_rank: u8,
    pub primitives: Vec<Primitive>,
}

impl Exposure {
    /// Export fractured `chip`, failing if any of its content exceeds device limits
    pub fn from_chip(chip: &Chip) -> LayoutResult<Self> {
        let mut fields = Vec::with_capacity(chip.fields.len());
        for field in chip.fields.iter() {
            fields.push(export_field(field).map_err(|e| e.context(ErrorContext::Field(field.id)))?);
        }
        Ok(Self {
            chip_size: chip.chip_size,
            field_size: chip.field_size,
            fields,
        })
    }
    /// Total primitive count
    pub fn num_primitives(&self) -> usize {
        self.fields
            .iter()
            .flat_map(|f| f.cells.iter())
            .flat_map(|c| c.groups.iter())
            .map(|g| g.primitives.len())
            .sum()
    }
}

fn export_field(field: &Field) -> LayoutResult<FieldExposure> {
    let mut cells = Vec::with_capacity(field.cells.len());
    for cell in field.cells.iter() {
        if cell.is_empty() {
            continue;
        }
        cells.push(export_cell(cell).map_err(|e| cell.contextualize(e))?);
    }
    Ok(FieldExposure {
        id: field.id,
        displacement: field.displacement,
        cells,
    })
}

fn export_cell(cell: &Cell) -> LayoutResult<CellExposure> {
    let (array, position) = if cell.array.is_array() {
        check_array(&cell.array)?;
        let pos = cell.boundary.p0.shift(&cell.displacement);
        if pos.x < 0 || pos.y < 0 || pos.x > limits::MAX_POSITION || pos.y > limits::MAX_POSITION {
            return Err(LayoutError::device(
                format!("Array position {:?} out of range", pos),
                Some(cell.placed_extent()),
            ));
        }
        (Some(cell.array), Some(pos))
    } else {
        (None, None)
    };
    let origin = position.unwrap_or_default();
    let mut groups = Vec::with_capacity(cell.patterns.len());
    for pattern in cell.patterns.iter() {
        let mut primitives = Vec::with_capacity(pattern.polygons.len());
        for poly in pattern.polygons.iter() {
            let mut prim = classify_polygon(poly).map_err(|r| {
                LayoutError::device(
                    format!("Shape is not a device primitive: {}", r),
                    Some(poly.bbox()),
                )
            })?;
            prim.shift(&cell.displacement.unshift(&origin));
            check_vertices(&prim)?;
            primitives.push(prim);
        }
        groups.push(ShotGroup {
            shot_rank: pattern.shot_rank,
            primitives,
        });
    }
    Ok(CellExposure {
        id: cell.id,
        groups,
        array,
        position,
    })
}

/// Check repeat counts and array extents are within device range
fn check_array(array: &ArrayParams) -> LayoutResult<()> {
    if array.nx > limits::MAX_REPEAT || array.ny > limits::MAX_REPEAT {
        return Err(LayoutError::device(
            format!(
                "Array repeat ({}, {}) exceeds {}",
                array.nx,
                array.ny,
                limits::MAX_REPEAT
            ),
            None,
        ));
    }
    let (sx, sy) = array.span();
    if sx > limits::MAX_ARRAY_EXTENT || sy > limits::MAX_ARRAY_EXTENT {
        return Err(LayoutError::device(
            format!(
                "Array extent ({}, {}) exceeds {}",
                sx,
                sy,
                limits::MAX_ARRAY_EXTENT
            ),
            None,
        ));
    }
    Ok(())
}

/// Check all vertices of `prim` are within device range
fn check_vertices(prim: &Primitive) -> LayoutResult<()> {
    let ok = |v: Int| (0..=limits::MAX_VERTEX).contains(&v);
    if prim.points.iter().all(|p| ok(p.x) && ok(p.y)) {
        return Ok(());
    }
    Err(LayoutError::device(
        format!("Primitive vertices {:?} out of range", prim.points),
        Some(prim.bbox()),
    ))
}
