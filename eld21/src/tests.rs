//!
//! # Conversion Pipeline Tests
//!

use super::*;
use crate::array::resize;
use crate::bbox::BoundBoxTrait;
use crate::convert::{chip, convert};
use crate::error::ErrorContext;
use crate::export::Exposure;
use crate::field::{assign, sort_serpentine, FieldGrid};
use crate::fracture::fracture;
use crate::hier::{flatten, AccessCode};
use crate::library::{ArrayRef, Boundary, Library, StructRef, Structure};
use crate::primitive::classify_polygon;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn rect(datatype: i16, x0: Int, y0: Int, x1: Int, y1: Int) -> Boundary {
    Boundary {
        layer: 1,
        datatype,
        xy: vec![
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
            Point::new(x0, y0),
        ],
    }
}

#[test]
fn rectangle_primitive() -> LayoutResult<()> {
    let poly = Polygon::from_closed(&[
        Point::new(0, 0),
        Point::new(0, 10),
        Point::new(10, 10),
        Point::new(10, 0),
        Point::new(0, 0),
    ])?;
    let prims = fracture(&poly, &FractureLimits::default())?;
    assert_eq!(prims.len(), 1);
    assert_eq!(prims[0].kind, PrimitiveKind::Rectangle);
    assert_eq!(prims[0].origin(), Point::new(0, 0));
    assert_eq!(prims[0].size(), (10, 10));
    Ok(())
}

#[test]
fn l_shape_primitives() -> LayoutResult<()> {
    let poly = Polygon::from_pairs(&[(0, 0), (0, 10), (5, 10), (5, 5), (10, 5), (10, 0)])?;
    let prims = fracture(&poly, &FractureLimits::default())?;
    assert_eq!(prims.len(), 2);
    assert!(prims.iter().all(|p| p.kind == PrimitiveKind::Rectangle));
    let area: f64 = prims.iter().map(|p| p.area()).sum();
    assert_eq!(area, 75.0);
    Ok(())
}

#[test]
fn fractured_pieces_are_primitives() -> LayoutResult<()> {
    let arrow = Polygon::from_pairs(&[
        (0, 0),
        (300, 0),
        (400, 100),
        (300, 200),
        (0, 200),
        (100, 100),
    ])?;
    let prims = fracture(&arrow, &FractureLimits::default())?;
    assert!(!prims.is_empty());
    let mut area = 0.0;
    for prim in prims.iter() {
        let again = classify_polygon(&prim.to_polygon());
        assert_eq!(again.map(|p| p.kind), Ok(prim.kind));
        area += prim.area();
    }
    assert!((area - arrow.area()).abs() <= 0.5 * prims.len() as f64);
    Ok(())
}

#[test]
fn resize_conserves_elements() -> LayoutResult<()> {
    let mut cell = Cell::new(0);
    cell.add_polygon(0, Polygon::from_pairs(&[(0, 0), (5, 0), (5, 5), (0, 5)])?);
    cell.set_array(Point::new(10, 0), 5000, 1)?;
    let cells = resize(&cell, 2000)?;
    assert_eq!(cells.len(), 3);
    let ns: Vec<u32> = cells.iter().map(|c| c.array.nx).collect();
    assert_eq!(ns, vec![2000, 2000, 1000]);
    let xs: Vec<Int> = cells.iter().map(|c| c.displacement.x).collect();
    assert_eq!(xs, vec![0, 20_000, 40_000]);
    let total: u64 = cells.iter().map(|c| c.array.count()).sum();
    assert_eq!(total, 5000);
    Ok(())
}

#[test]
fn serpentine_field_order() -> LayoutResult<()> {
    let mut canvas = Canvas::new();
    for (x, y) in [(500, 500), (1500, 500), (500, 1500), (1500, 1500)] {
        let id = canvas.create_cell();
        canvas.set_cell_displacement(id, Point::new(x, y))?;
        let mut pattern = Pattern::new(0);
        pattern.add_polygon(Polygon::from_pairs(&[(-50, -50), (50, -50), (50, 50), (-50, 50)])?);
        canvas.add_pattern(id, pattern)?;
    }
    let grid = FieldGrid::new(Point::new(1999, 1999), Point::new(1000, 1000))?;
    let fields = sort_serpentine(assign(&canvas, &grid)?, &grid);
    let order: Vec<(usize, usize)> = fields.iter().map(|f| (f.row, f.col)).collect();
    assert_eq!(order, vec![(1, 0), (1, 1), (0, 1), (0, 0)]);
    Ok(())
}

/// Root A -> SRef B, ARef C(3); B -> SRef C
fn abc_library() -> Library {
    let mut lib = Library::new("abc", 1e-9);
    let mut a = Structure::new("A");
    a.srefs.push(StructRef {
        name: "B".into(),
        xy: Point::new(0, 0),
        strans: None,
    });
    a.arefs.push(ArrayRef {
        name: "C".into(),
        xy: [Point::new(0, 1000), Point::new(300, 1000), Point::new(0, 1100)],
        cols: 3,
        rows: 1,
        strans: None,
    });
    let mut b = Structure::new("B");
    b.srefs.push(StructRef {
        name: "C".into(),
        xy: Point::new(500, 0),
        strans: None,
    });
    let mut c = Structure::new("C");
    c.boundaries.push(rect(0, 0, 0, 50, 50));
    lib.structs = vec![a, b, c];
    lib
}

#[test]
fn flatten_placement_order() -> LayoutResult<()> {
    let lib = abc_library();
    let branches = flatten(&lib, "A")?;
    assert_eq!(branches.len(), 2);
    assert_eq!(branches[0].structures, vec![0, 1, 2]);
    assert_eq!(branches[0].repeat(), 1);
    assert_eq!(branches[0].element_count(&lib)?, 1);
    assert_eq!(branches[1].structures, vec![0, 2]);
    assert_eq!(branches[1].repeat(), 1);
    assert_eq!(branches[1].element_count(&lib)?, 3);
    assert_eq!(
        branches[1].access[0],
        vec![AccessCode::Root(0), AccessCode::Array(0)]
    );
    // Deterministic
    assert_eq!(flatten(&lib, "A")?, branches);
    Ok(())
}

#[test]
fn boundaries_enclose_children() -> LayoutResult<()> {
    let lib = abc_library();
    let mut canvas = convert(&lib, "A")?;
    let bbox = canvas.update_boundary();
    for cell in canvas.cells() {
        assert!(bbox.encloses(&cell.placed_extent()));
        for pattern in cell.patterns.iter() {
            assert!(cell.boundary.encloses(&pattern.boundary));
            for poly in pattern.polygons.iter() {
                assert!(pattern.boundary.encloses(&poly.bbox()));
            }
        }
    }
    assert_eq!(bbox, BoundBox::from_points(Point::new(0, 0), Point::new(550, 1050)));
    Ok(())
}

#[test]
fn octagon_across_fields() -> LayoutResult<()> {
    init_logger();
    let mut canvas = Canvas::new();
    let id = canvas.create_cell();
    let octagon = Polygon::from_pairs(&[
        (100, 0),
        (200, 0),
        (300, 100),
        (300, 200),
        (200, 300),
        (100, 300),
        (0, 200),
        (0, 100),
    ])?;
    canvas.cell_mut(id).ok_or("missing cell")?.add_polygon(0, octagon);
    let mut chip = Chip::new(canvas, 1.0);
    let config = ConverterConfig {
        field_size: Some(100),
        ..Default::default()
    };
    chip.fracture(&config)?;
    assert_eq!(chip.chip_size, Point::new(300, 300));
    assert_eq!(chip.fields.len(), 9);
    assert_eq!(chip.canvas.area(), 70_000.0);

    let exposure = Exposure::from_chip(&chip)?;
    let mut area = 0.0;
    for field in exposure.fields.iter() {
        for cell in field.cells.iter() {
            for group in cell.groups.iter() {
                for prim in group.primitives.iter() {
                    let b = prim.bbox();
                    assert!(b.p0.x >= 0 && b.p0.y >= 0 && b.p1.x <= 100 && b.p1.y <= 100);
                    area += prim.area();
                }
            }
        }
    }
    assert_eq!(area, 70_000.0);
    Ok(())
}

#[test]
fn square_across_fields() -> LayoutResult<()> {
    init_logger();
    let mut canvas = Canvas::new();
    let id = canvas.create_cell();
    let square = Polygon::from_pairs(&[(0, 0), (300, 0), (300, 300), (0, 300)])?;
    canvas.cell_mut(id).ok_or("missing cell")?.add_polygon(0, square);
    let mut chip = Chip::new(canvas, 1.0);
    let config = ConverterConfig {
        field_size: Some(100),
        ..Default::default()
    };
    chip.fracture(&config)?;
    assert_eq!(chip.fields.len(), 9);
    for field in chip.fields.iter() {
        let b = field.bbox();
        assert_eq!(b, BoundBox::from_points(Point::new(0, 0), Point::new(100, 100)));
    }
    let exposure = Exposure::from_chip(&chip)?;
    assert_eq!(exposure.num_primitives(), 9);
    Ok(())
}

#[test]
fn failures_name_their_structure() -> LayoutResult<()> {
    let mut lib = Library::new("bends", 1e-9);
    let mut top = Structure::new("top");
    top.srefs.push(StructRef {
        name: "bend".into(),
        xy: Point::new(0, 0),
        strans: None,
    });
    let mut bend = Structure::new("bend");
    bend.boundaries.push(Boundary {
        layer: 1,
        datatype: 0,
        xy: vec![
            Point::new(0, 0),
            Point::new(20, 0),
            Point::new(20, 10),
            Point::new(10, 10),
            Point::new(10, 20),
            Point::new(0, 20),
            Point::new(0, 0),
        ],
    });
    lib.structs = vec![top, bend];

    let mut config = ConverterConfig::default();
    config.fracture.max_steps = 1;
    let mut chip = chip(&lib, "top", &config)?;
    assert_eq!(chip.canvas.cells().next().and_then(|c| c.source.clone()), Some("bend".into()));
    match chip.fracture(&config) {
        Err(LayoutError::IterationLimit { bbox, stack, .. }) => {
            assert!(bbox.is_some());
            assert!(stack.contains(&ErrorContext::Structure("bend".into())));
            assert!(stack.contains(&ErrorContext::Cell(0)));
        }
        other => panic!("Expected an iteration limit, got {:?}", other),
    }
    Ok(())
}

#[test]
fn library_to_exposure() -> LayoutResult<()> {
    init_logger();
    let mut lib = Library::new("chip", 1e-9);
    let mut top = Structure::new("top");
    top.boundaries.push(rect(0, 0, 0, 10_000, 10_000));
    top.arefs.push(ArrayRef {
        name: "dot".into(),
        xy: [
            Point::new(0, 20_000),
            Point::new(300_000, 20_000),
            Point::new(0, 21_000),
        ],
        cols: 300,
        rows: 1,
        strans: None,
    });
    let mut dot = Structure::new("dot");
    dot.boundaries.push(rect(1, 0, 0, 100, 100));
    lib.structs = vec![top, dot];

    let config = ConverterConfig::default();
    let mut chip = chip(&lib, "top", &config)?;
    assert!((chip.scale - 2.0).abs() < 1e-12);
    chip.fracture(&config)?;

    let areas = chip.canvas.area_by_rank();
    assert_eq!(areas[0], 20_000.0 * 20_000.0);
    assert_eq!(areas[1], 300.0 * 200.0 * 200.0);

    // The array straddles two field boundaries
    let arrays: Vec<&Cell> = chip.canvas.cells().filter(|c| c.array.is_array()).collect();
    let ns: Vec<u32> = arrays.iter().map(|c| c.array.nx).collect();
    assert_eq!(ns, vec![100, 100, 100]);

    let exposure = Exposure::from_chip(&chip)?;
    assert_eq!(exposure.fields.len(), 3);
    let elements: u64 = exposure
        .fields
        .iter()
        .flat_map(|f| f.cells.iter())
        .filter(|c| c.groups.iter().any(|g| g.shot_rank == 1))
        .map(|c| c.array.map_or(1, |a| a.count()))
        .sum();
    assert_eq!(elements, 300);
    assert_eq!(exposure.num_primitives(), 4);
    Ok(())
}

#[test]
fn invalid_inputs() -> LayoutResult<()> {
    let mut canvas = Canvas::new();
    let id = canvas.create_cell();
    assert!(canvas.add_cell(Cell::new(id)).is_err());
    assert!(canvas.set_cell_array(id, Point::new(10, 10), 0, 1).is_err());
    assert!(canvas.set_cell_displacement(id + 1, Point::new(0, 0)).is_err());
    assert!(canvas.scale(0.0).is_err());
    assert!(Polygon::from_pairs(&[(0, 0), (1, 1)]).is_err());

    let mut chip = Chip::new(Canvas::new(), -1.0);
    assert!(chip.fracture(&ConverterConfig::default()).is_err());
    Ok(())
}
