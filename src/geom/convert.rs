use geo::{Geometry, LineString, MultiPolygon, Polygon};

/// Coerce a boolean-op result into a flat polygon list. `GeometryCollection`
/// results (degenerate intersections, lines left over from a failed cut)
/// contribute nothing; anything that isn't a polygon is dropped silently,
/// not an error.
pub fn assert_multipolygon(geom: Geometry<f64>) -> Vec<Polygon<f64>> {
    let mut out = Vec::new();
    collect_polygons(geom, &mut out);
    out
}

fn collect_polygons(geom: Geometry<f64>, out: &mut Vec<Polygon<f64>>) {
    match geom {
        Geometry::Polygon(p) => out.push(p),
        Geometry::MultiPolygon(mp) => out.extend(mp.0),
        Geometry::GeometryCollection(gc) => {
            for g in gc {
                collect_polygons(g, out);
            }
        }
        _ => {}
    }
}

/// Coerce into a flat linestring list, used on stair/ramp cut boundaries.
pub fn assert_multilinestring(geom: Geometry<f64>) -> Vec<LineString<f64>> {
    let mut out = Vec::new();
    collect_lines(geom, &mut out);
    out
}

fn collect_lines(geom: Geometry<f64>, out: &mut Vec<LineString<f64>>) {
    match geom {
        Geometry::LineString(ls) => out.push(ls),
        Geometry::MultiLineString(mls) => out.extend(mls.0),
        Geometry::Line(line) => out.push(LineString(vec![line.start, line.end])),
        Geometry::GeometryCollection(gc) => {
            for g in gc {
                collect_lines(g, out);
            }
        }
        _ => {}
    }
}

pub fn multipolygon_of(polygons: Vec<Polygon<f64>>) -> MultiPolygon<f64> {
    MultiPolygon(polygons)
}
