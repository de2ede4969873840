//! Pivot point of the scene.
//!
//! Holds the point the scene group rotates about. Every change reports the
//! delta from the previous value, so the owner can shift the group's
//! children by the opposite amount and keep geometry centred.

use glam::Vec3;

/// Receives the delta between the new and the previous pivot
pub type PivotCallback = Box<dyn FnMut(Vec3)>;

pub struct PivotPoint {
    value: Vec3,
    on_change: PivotCallback,
}

impl PivotPoint {
    /// Pivot starting at `initial`; the callback is not invoked for it
    pub fn new<F>(initial: Vec3, on_change: F) -> Self
    where
        F: FnMut(Vec3) + 'static,
    {
        Self {
            value: initial,
            on_change: Box::new(on_change),
        }
    }

    pub fn set(&mut self, x: f32, y: f32, z: f32) {
        self.set_vec(Vec3::new(x, y, z));
    }

    /// Replace the pivot and report `point - previous` to the callback
    pub fn set_vec(&mut self, point: Vec3) {
        let delta = point - self.value;
        self.value = point;
        (self.on_change)(delta);
    }

    pub fn get(&self) -> Vec3 {
        self.value
    }
}

impl std::fmt::Debug for PivotPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PivotPoint")
            .field("value", &self.value)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recording(initial: Vec3) -> (PivotPoint, Rc<RefCell<Vec<Vec3>>>) {
        let deltas = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&deltas);
        let pivot = PivotPoint::new(initial, move |delta| sink.borrow_mut().push(delta));
        (pivot, deltas)
    }

    #[test]
    fn test_reports_delta() {
        let (mut pivot, deltas) = recording(Vec3::ZERO);
        pivot.set(50.0, 25.0, 10.0);
        pivot.set(0.0, 0.0, 0.0);

        assert_eq!(pivot.get(), Vec3::ZERO);
        assert_eq!(
            *deltas.borrow(),
            vec![Vec3::new(50.0, 25.0, 10.0), Vec3::new(-50.0, -25.0, -10.0)]
        );
    }

    #[test]
    fn test_same_value_reports_zero() {
        let (mut pivot, deltas) = recording(Vec3::ONE);
        pivot.set_vec(Vec3::ONE);
        assert_eq!(*deltas.borrow(), vec![Vec3::ZERO]);
    }

    proptest! {
        #[test]
        fn deltas_sum_to_net_change(
            points in proptest::collection::vec(
                (-1000i32..1000, -1000i32..1000, -1000i32..1000),
                1..20,
            )
        ) {
            let (mut pivot, deltas) = recording(Vec3::ZERO);
            for (x, y, z) in &points {
                pivot.set(*x as f32, *y as f32, *z as f32);
            }

            let total: Vec3 = deltas.borrow().iter().copied().sum();
            let last = pivot.get();
            prop_assert!((total - last).abs().max_element() < 1e-3);
        }
    }
}
