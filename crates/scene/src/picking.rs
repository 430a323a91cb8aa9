use foundation::math::Vec2;
use foundation::math::precision::stable_total_cmp_f64;

/// A round hit target in screen space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickItem<K> {
    pub key: K,
    pub center_px: Vec2,
    pub radius_px: f64,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickHit<K> {
    pub key: K,
    pub distance_px: f64,
}

/// Deterministic screen-space picking.
///
/// Ordering contract:
/// - The hit whose center is closest to the pointer wins.
/// - On equal distance, the item that appears first in `items` wins.
///
/// Items with a non-finite center are ignored.
pub fn pick_screen<K: Copy>(items: &[PickItem<K>], pointer_px: Vec2) -> Option<PickHit<K>> {
    if !pointer_px.is_finite() {
        return None;
    }

    let mut best: Option<PickHit<K>> = None;
    for item in items {
        if !item.center_px.is_finite() {
            continue;
        }
        let d = item.center_px.distance(pointer_px);
        if d > item.radius_px {
            continue;
        }
        best = match best {
            Some(b) if stable_total_cmp_f64(d, b.distance_px).is_ge() => Some(b),
            _ => Some(PickHit {
                key: item.key,
                distance_px: d,
            }),
        };
    }
    best
}

#[cfg(test)]
mod tests {
    use super::{PickItem, pick_screen};
    use foundation::math::Vec2;

    fn item(key: u32, x: f64, y: f64, r: f64) -> PickItem<u32> {
        PickItem {
            key,
            center_px: Vec2::new(x, y),
            radius_px: r,
        }
    }

    #[test]
    fn picks_nearest_hit() {
        let items = [item(0, 100.0, 100.0, 20.0), item(1, 110.0, 100.0, 20.0)];
        let hit = pick_screen(&items, Vec2::new(108.0, 100.0)).expect("hit");
        assert_eq!(hit.key, 1);
        assert!((hit.distance_px - 2.0).abs() < 1e-9);
    }

    #[test]
    fn tie_breaks_by_item_order() {
        let items = [item(7, 90.0, 0.0, 20.0), item(3, 110.0, 0.0, 20.0)];
        let hit = pick_screen(&items, Vec2::new(100.0, 0.0)).expect("hit");
        assert_eq!(hit.key, 7);
    }

    #[test]
    fn misses_outside_radius() {
        let items = [item(0, 0.0, 0.0, 5.0), item(1, f64::NAN, 0.0, 5.0)];
        assert!(pick_screen(&items, Vec2::new(6.0, 0.0)).is_none());
        assert!(pick_screen(&items, Vec2::new(f64::NAN, 0.0)).is_none());
    }
}
