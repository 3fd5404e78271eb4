use geo::{BoundingRect, Rect};

/// Snap precision never drops below this so floating-point jitter around a
/// cut cannot reopen as a spurious sliver.
const MIN_PRECISION: f64 = 1e-7;

/// Snap precision never grows past this so a genuine 1 cm feature survives
/// snapping even on a map with a very large extent.
const MAX_PRECISION: f64 = 0.005;

/// Extent of a geometry collection times `2⁻²⁰`, clamped to
/// `[MIN_PRECISION, MAX_PRECISION]`.
pub fn calculate_precision<'a, I, G>(geoms: I) -> f64
where
I: IntoIterator<Item = &'a G>,
G: BoundingRect<f64, Output = Option<Rect<f64>>> + 'a,
{
    let bounds = geoms
        .into_iter()
        .filter_map(|g| g.bounding_rect())
        .reduce(|a: Rect<f64>, b: Rect<f64>| {
            Rect::new(
                geo::coord! { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
                geo::coord! { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
            )
    });

    let extent = match bounds {
        Some(rect) => {
            let dx = rect.max().x - rect.min().x;
            let dy = rect.max().y - rect.min().y;
            (dx * dx + dy * dy).sqrt()
        }
        None => 0.0,
    };

    (extent * 2f64.powi(-20)).clamp(MIN_PRECISION, MAX_PRECISION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, MultiPolygon};

    #[test]
    fn small_extent_clamps_to_minimum() {
        let poly: MultiPolygon<f64> = MultiPolygon(vec![polygon![
                    (x: 0.0, y: 0.0), (x: 0.001, y: 0.0), (x: 0.001, y: 0.001), (x: 0.0, y: 0.001),
        ]]);
        assert_eq!(calculate_precision([&poly]), MIN_PRECISION);
    }

    #[test]
    fn huge_extent_clamps_to_maximum() {
        let poly: MultiPolygon<f64> = MultiPolygon(vec![polygon![
                    (x: 0.0, y: 0.0), (x: 1_000_000.0, y: 0.0), (x: 1_000_000.0, y: 1_000_000.0), (x: 0.0, y: 1_000_000.0),
        ]]);
        assert_eq!(calculate_precision([&poly]), MAX_PRECISION);
    }

    #[test]
    fn empty_input_yields_minimum_precision() {
        let geoms: Vec<MultiPolygon<f64>> = Vec::new();
        assert_eq!(calculate_precision(geoms.iter()), MIN_PRECISION);
    }

    #[test]
    fn mid_range_extent_scales_with_size() {
        // 100m building: extent ~141m, *2^-20 ~= 1.3e-4, within clamp range.
        let poly: MultiPolygon<f64> = MultiPolygon(vec![polygon![
                    (x: 0.0, y: 0.0), (x: 100.0, y: 0.0), (x: 100.0, y: 100.0), (x: 0.0, y: 100.0),
        ]]);
        let precision = calculate_precision([&poly]);
        assert!(precision > MIN_PRECISION && precision < MAX_PRECISION);
    }
}
