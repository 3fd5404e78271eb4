//! Phase B — cutting and classification, Phase C — obstacle coalescing.

use geo::{Area, BooleanOps, Geometry, LineString, MultiPolygon, Polygon, Relate};

use crate::geom::{buffered_geometry, cut_polygons_with_lines};
use crate::model::SpaceId;

use super::types::CollectedLevel;

#[derive(Debug, Clone)]
pub enum PieceKind {
    Accessible,
    Obstacle,
}

#[derive(Debug, Clone)]
pub struct Piece {
    pub geometry: Polygon<f64>,
    pub kind: PieceKind,
    /// The space this piece mostly came from, by overlap area; `None` if it
    /// doesn't overlap any known space (e.g. a door-only piece).
    pub space: Option<SpaceId>,
}

/// The space with the largest area of overlap with `piece`, or `None` if
/// none overlaps it at all.
fn assign_space(piece: &Polygon<f64>, space_areas: &[(SpaceId, MultiPolygon<f64>)]) -> Option<SpaceId> {
    let piece_mp = MultiPolygon(vec![piece.clone()]);
    space_areas
        .iter()
        .map(|(id, area)| {
            let overlap: f64 = piece_mp.intersection(area).0.iter().map(|p| p.unsigned_area()).sum();
            (*id, overlap)
        })
        .filter(|(_, overlap)| *overlap > 0.0)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id)
}

/// Run Phase B (cut + classify) then Phase C (coalesce) over one level's
/// collected geometry, returning the level's final accessible pieces
/// (each tagged with the space it mostly came from) plus any obstacle
/// pieces that never merged into exactly one neighbor.
pub fn classify_level(
    collected: &CollectedLevel,
    precision: f64,
) -> (Vec<(Polygon<f64>, Option<SpaceId>)>, Vec<Polygon<f64>>) {
    let mut cut_lines: Vec<LineString<f64>> = Vec::new();
    for ramp in &collected.ramps {
        for poly in &ramp.0 {
            cut_lines.push(poly.exterior().clone());
            cut_lines.extend(poly.interiors().iter().cloned());
        }
    }
    cut_lines.extend(collected.stairs.iter().cloned());

    let stair_ramp_union = {
        let ramps_union = collected
            .ramps
            .iter()
            .cloned()
            .reduce(|a, b| a.union(&b))
            .unwrap_or_else(|| MultiPolygon(Vec::new()));
        let stairs_buffered = collected
            .stairs
            .iter()
            .map(|line| buffered_geometry(line, precision.max(1e-6)))
            .reduce(|a, b| a.union(&b))
            .unwrap_or_else(|| MultiPolygon(Vec::new()));
        ramps_union.union(&stairs_buffered)
    };

    for obstacle in &collected.raised_obstacles {
        if obstacle.geometry.relate(&stair_ramp_union).is_intersects() {
            for poly in &obstacle.geometry.0 {
                cut_lines.push(poly.exterior().clone());
            }
        }
    }

    let obstacle_buffer = buffered_geometry_of_multipolygon(&collected.onfloor_obstacles, precision);

    let pieces = cut_polygons_with_lines(&collected.accessible, &cut_lines, precision);
    let mut classified: Vec<Piece> = pieces
        .into_iter()
        .map(|poly| {
            let kind = if is_covered(&poly, &obstacle_buffer) {
                PieceKind::Obstacle
            } else {
                PieceKind::Accessible
            };
            let space = assign_space(&poly, &collected.space_areas);
            Piece { geometry: poly, kind, space }
    })
        .collect();

    coalesce(&mut classified);

    let mut accessible = Vec::new();
    let mut obstacles = Vec::new();
    for piece in classified {
        match piece.kind {
            PieceKind::Accessible => accessible.push((piece.geometry, piece.space)),
            PieceKind::Obstacle => obstacles.push(piece.geometry),
        }
    }
    (accessible, obstacles)
}

fn buffered_geometry_of_multipolygon(mp: &MultiPolygon<f64>, precision: f64) -> MultiPolygon<f64> {
    mp.0
        .iter()
        .map(|poly| buffered_geometry(poly.exterior(), precision.max(1e-6)).union(&MultiPolygon(vec![poly.clone()])))
        .reduce(|a, b| a.union(&b))
        .unwrap_or_else(|| MultiPolygon(Vec::new()))
}

fn is_covered(piece: &Polygon<f64>, cover: &MultiPolygon<f64>) -> bool {
    if cover.0.is_empty() {
        return false;
    }
    let remainder = MultiPolygon(vec![piece.clone()]).difference(cover);
    let leftover: f64 = remainder.0.iter().map(|p| p.unsigned_area()).sum();
    leftover < piece.unsigned_area() * 1e-6
}

/// Repeatedly fold any obstacle piece touching exactly one accessible
/// piece into that piece, until no more merges apply (Phase C).
fn coalesce(pieces: &mut Vec<Piece>) {
    loop {
        let mut merge: Option<(usize, usize)> = None; // (obstacle_idx, accessible_idx)

        'search: for (oi, op) in pieces.iter().enumerate() {
            if !matches!(op.kind, PieceKind::Obstacle) {
                continue;
            }
            let mut touching: Vec<usize> = Vec::new();
            for (ai, ap) in pieces.iter().enumerate() {
                if oi == ai || !matches!(ap.kind, PieceKind::Accessible) {
                    continue;
                }
                let im = op.geometry.relate(&ap.geometry);
                if im.is_touches() {
                    touching.push(ai);
                    if touching.len() > 1 {
                        continue 'search;
                    }
                }
            }
            if touching.len() == 1 {
                merge = Some((oi, touching[0]));
                break;
            }
        }

        let Some((oi, ai)) = merge else {
            break;
        };

        let merged_mp = MultiPolygon(vec![pieces[ai].geometry.clone()]).union(&MultiPolygon(vec![pieces[oi].geometry.clone()]));
        let merged_poly = merged_mp.0.into_iter().next().unwrap_or_else(|| pieces[ai].geometry.clone());
        pieces[ai].geometry = merged_poly;
        pieces.remove(oi);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::altitude::types::CollectedLevel;
    use crate::model::LevelId;
    use geo::polygon;

    fn square(min: f64, max: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![
                    (x: min, y: min), (x: max, y: min), (x: max, y: max), (x: min, y: max),
        ]])
    }

    #[test]
    fn no_stairs_or_ramps_leaves_one_accessible_piece() {
        let collected = CollectedLevel {
            level: LevelId(1),
            base_altitude: 0.0,
            accessible: square(0.0, 100.0),
            onfloor_obstacles: MultiPolygon(Vec::new()),
            raised_obstacles: vec![],
            ramps: vec![],
            stairs: vec![],
            markers: vec![],
            space_areas: vec![],
        };
        let (accessible, obstacles) = classify_level(&collected, 0.01);
        assert_eq!(accessible.len(), 1);
        assert!(obstacles.is_empty());
    }

    #[test]
    fn stair_cut_produces_two_accessible_pieces() {
        use geo::Coord;
        let collected = CollectedLevel {
            level: LevelId(1),
            base_altitude: 0.0,
            accessible: square(0.0, 100.0),
            onfloor_obstacles: MultiPolygon(Vec::new()),
            raised_obstacles: vec![],
            ramps: vec![],
            stairs: vec![LineString(vec![
                        Coord { x: 50.0, y: -1.0 },
                        Coord { x: 50.0, y: 101.0 },
            ])],
            markers: vec![],
            space_areas: vec![],
        };
        let (accessible, _) = classify_level(&collected, 0.05);
        assert_eq!(accessible.len(), 2);
    }
}
