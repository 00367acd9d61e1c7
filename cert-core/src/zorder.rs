//! Stacking order assignment.
//!
//! `z_index` values are relative keys: they need not be contiguous or unique.
//! Paint order is the stable ascending sort of `z_index`, so elements that
//! share a key paint in their sequence order.
//!
//! Every reorder function returns `false` and leaves the elements untouched
//! when `id` does not resolve.

use crate::element::{Element, ElementId};

/// Key for a newly inserted element: above everything, `1` when empty.
#[must_use]
pub fn next_z_index(elements: &[Element]) -> i32 {
    max_z(elements).map_or(1, |max| max.saturating_add(1))
}

/// Move the element above all others.
///
/// "Forward" intentionally collapses to "to front".
pub fn send_forward(elements: &mut [Element], id: &ElementId) -> bool {
    send_to_front(elements, id)
}

/// Move the element one step down, unless it already holds the minimum key.
///
/// This never renumbers siblings, so once an element reaches the minimum it
/// stays there even if another element shares that key.
pub fn send_backward(elements: &mut [Element], id: &ElementId) -> bool {
    let Some(min) = min_z(elements) else {
        return false;
    };
    match elements.iter_mut().find(|e| &e.id == id) {
        Some(element) if element.z_index > min => {
            element.z_index -= 1;
            true
        }
        _ => false,
    }
}

/// Move the element strictly below all others.
pub fn send_to_back(elements: &mut [Element], id: &ElementId) -> bool {
    let Some(min) = min_z(elements) else {
        return false;
    };
    set_z(elements, id, min.saturating_sub(1))
}

/// Move the element strictly above all others.
pub fn send_to_front(elements: &mut [Element], id: &ElementId) -> bool {
    let Some(max) = max_z(elements) else {
        return false;
    };
    set_z(elements, id, max.saturating_add(1))
}

/// Elements in paint order (bottom first).
#[must_use]
pub fn paint_order(elements: &[Element]) -> Vec<&Element> {
    let mut ordered: Vec<&Element> = elements.iter().collect();
    // sort_by_key is stable: ties keep sequence order.
    ordered.sort_by_key(|e| e.z_index);
    ordered
}

fn set_z(elements: &mut [Element], id: &ElementId, z: i32) -> bool {
    match elements.iter_mut().find(|e| &e.id == id) {
        Some(element) => {
            element.z_index = z;
            true
        }
        None => false,
    }
}

fn max_z(elements: &[Element]) -> Option<i32> {
    elements.iter().map(|e| e.z_index).max()
}

fn min_z(elements: &[Element]) -> Option<i32> {
    elements.iter().map(|e| e.z_index).min()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn el(id: &str, z: i32) -> Element {
        Element::text(ElementId::new(id), Point::ZERO, z)
    }

    fn ids(elements: &[Element]) -> Vec<&str> {
        paint_order(elements).iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_next_z_index() {
        assert_eq!(next_z_index(&[]), 1);
        assert_eq!(next_z_index(&[el("a", 4), el("b", -2)]), 5);
    }

    #[test]
    fn test_send_forward_goes_to_top() {
        let mut elements = vec![el("a", 1), el("b", 5), el("c", 9)];
        assert!(send_forward(&mut elements, &"a".into()));
        assert_eq!(elements[0].z_index, 10);
        assert_eq!(ids(&elements), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_send_backward_steps_by_one() {
        let mut elements = vec![el("a", 1), el("b", 5)];
        assert!(send_backward(&mut elements, &"b".into()));
        assert_eq!(elements[1].z_index, 4);
    }

    #[test]
    fn test_send_backward_stops_at_minimum() {
        let mut elements = vec![el("a", 1), el("b", 1), el("c", 3)];
        assert!(!send_backward(&mut elements, &"a".into()));
        assert!(!send_backward(&mut elements, &"b".into()));
        assert_eq!(elements[0].z_index, 1);
        assert_eq!(elements[1].z_index, 1);
        // Equal keys keep sequence order.
        assert_eq!(ids(&elements), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_send_to_back_and_front() {
        let mut elements = vec![el("a", 1), el("b", 2), el("c", 3)];
        assert!(send_to_back(&mut elements, &"c".into()));
        assert_eq!(elements[2].z_index, 0);
        assert!(send_to_front(&mut elements, &"c".into()));
        assert_eq!(elements[2].z_index, 3);
        assert!(elements.iter().filter(|e| e.id.as_str() != "c").all(|e| e.z_index < 3));
    }

    #[test]
    fn test_missing_id_is_noop() {
        let mut elements = vec![el("a", 1)];
        let before = elements.clone();
        let missing = ElementId::new("ghost");
        assert!(!send_forward(&mut elements, &missing));
        assert!(!send_backward(&mut elements, &missing));
        assert!(!send_to_back(&mut elements, &missing));
        assert!(!send_to_front(&mut elements, &missing));
        assert_eq!(elements, before);
    }

    #[test]
    fn test_empty_is_noop() {
        let mut elements: Vec<Element> = Vec::new();
        assert!(!send_to_back(&mut elements, &"a".into()));
        assert!(paint_order(&elements).is_empty());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_paint_order_is_stable_sort(zs in prop::collection::vec(-3i32..3i32, 0..24)) {
                let elements: Vec<Element> = zs
                    .iter()
                    .enumerate()
                    .map(|(i, z)| el(&format!("e{i}"), *z))
                    .collect();

                let ordered = paint_order(&elements);
                prop_assert_eq!(ordered.len(), elements.len());

                for pair in ordered.windows(2) {
                    let (a, b) = (pair[0], pair[1]);
                    prop_assert!(a.z_index <= b.z_index);
                    if a.z_index == b.z_index {
                        let ia = elements.iter().position(|e| e.id == a.id);
                        let ib = elements.iter().position(|e| e.id == b.id);
                        prop_assert!(ia < ib, "ties must keep insertion order");
                    }
                }
            }

            #[test]
            fn prop_back_then_front_is_strict_max(
                zs in prop::collection::vec(-50i32..50i32, 1..16),
                pick in any::<prop::sample::Index>()
            ) {
                let mut elements: Vec<Element> = zs
                    .iter()
                    .enumerate()
                    .map(|(i, z)| el(&format!("e{i}"), *z))
                    .collect();
                let target = elements[pick.index(elements.len())].id.clone();

                send_to_back(&mut elements, &target);
                send_to_front(&mut elements, &target);

                let top = elements.iter().find(|e| e.id == target).map(|e| e.z_index);
                for other in elements.iter().filter(|e| e.id != target) {
                    prop_assert!(Some(other.z_index) < top);
                }
            }
        }
    }
}
