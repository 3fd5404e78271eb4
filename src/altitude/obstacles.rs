//! Phase G — obstacle reassignment : raised obstacles left over
//! after Phase C coalescing are assigned to the neighboring flat area with
//! the *highest* altitude they touch, or the nearest area by distance if
//! they touch none.

use geo::{Centroid, Point, Polygon, Relate};

use super::interpolate::AreaNode;

/// For each leftover obstacle polygon, the index of the flat node it was
/// assigned to.
pub fn reassign_obstacles(obstacles: &[Polygon<f64>], flat_nodes: &[AreaNode]) -> Vec<Option<usize>> {
    obstacles
        .iter()
        .map(|obstacle| {
            let touching: Vec<(usize, f64)> = flat_nodes
                .iter()
                .enumerate()
                .filter_map(|(i, node)| {
                    let im = node.geometry.relate(obstacle);
                    if im.is_intersects() {
                        node.anchor.map(|altitude| (i, altitude))
                    } else {
                        None
                    }
            })
                .collect();

            if let Some(&(i, _)) = touching.iter().max_by(|a, b| a.1.total_cmp(&b.1)) {
                return Some(i);
            }

            nearest_by_distance(obstacle, flat_nodes)
    })
        .collect()
}

fn nearest_by_distance(obstacle: &Polygon<f64>, flat_nodes: &[AreaNode]) -> Option<usize> {
    let centroid = obstacle.centroid().unwrap_or(Point::new(0.0, 0.0));
    flat_nodes
        .iter()
        .enumerate()
        .filter_map(|(i, node)| {
            let node_centroid = node.geometry.centroid()?;
            let dx = centroid.x() - node_centroid.x();
            let dy = centroid.y() - node_centroid.y();
            Some((i, (dx * dx + dy * dy).sqrt()))
    })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}
