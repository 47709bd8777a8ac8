use std::f64::consts::PI;

use geosource::{approximate_tour, BoundingBox, Coordinate};
use geosource_int_test::test_util::random_points;

fn closed_length(points: &[Coordinate], order: &[usize]) -> f64 {
    (0..order.len())
        .map(|i| points[order[i]].distance(&points[order[(i + 1) % order.len()]]))
        .sum()
}

fn assert_permutation(order: &[usize], n: usize) {
    let mut sorted = order.to_vec();
    sorted.sort_unstable();
    assert_eq!(sorted, (0..n).collect::<Vec<_>>());
}

fn regular_polygon(sides: usize) -> Vec<Coordinate> {
    (0..sides)
        .map(|k| {
            let angle = 2.0 * PI * k as f64 / sides as f64;
            Coordinate::new(10.0 * angle.cos(), 10.0 * angle.sin())
        })
        .collect()
}

#[test]
fn test_tour_visits_every_point_once() {
    for (n, seed) in [(3, 1), (9, 2), (64, 3), (250, 4)] {
        let points: Vec<Coordinate> = random_points(n, &BoundingBox::world(), seed)
            .into_iter()
            .map(|(x, y)| Coordinate::new(x, y))
            .collect();
        let order = approximate_tour(&points, None);
        assert_eq!(order.len(), n);
        assert_permutation(&order, n);
    }
}

#[test]
fn test_tiny_inputs_keep_their_order() {
    assert!(approximate_tour(&[], None).is_empty());
    let one = [Coordinate::new(3.0, 4.0)];
    assert_eq!(approximate_tour(&one, Some(Coordinate::new(0.0, 0.0))), vec![0]);
    let two = [Coordinate::new(1.0, 1.0), Coordinate::new(-1.0, -1.0)];
    assert_eq!(approximate_tour(&two, None), vec![0, 1]);
}

#[test]
fn test_regular_polygons_are_walked_around() {
    for sides in [5, 6, 12] {
        let points = regular_polygon(sides);
        let naive: Vec<usize> = (0..sides).collect();
        let perimeter = closed_length(&points, &naive);

        let order = approximate_tour(&points, None);
        assert_permutation(&order, sides);
        assert!(
            (closed_length(&points, &order) - perimeter).abs() < 1e-6,
            "{} sides",
            sides
        );
    }
}

#[test]
fn test_scrambled_polygon_beats_input_order() {
    let base = regular_polygon(12);
    // every fifth vertex, a star when walked in input order
    let scrambled: Vec<Coordinate> = (0..12).map(|k| base[(k * 5) % 12]).collect();
    let naive: Vec<usize> = (0..12).collect();

    let order = approximate_tour(&scrambled, None);
    assert_permutation(&order, 12);
    let toured = closed_length(&scrambled, &order);
    assert!(toured < closed_length(&scrambled, &naive));
    assert!((toured - closed_length(&base, &naive)).abs() < 1e-6);
}

#[test]
fn test_tour_is_shorter_than_random_order() {
    let points: Vec<Coordinate> = random_points(120, &BoundingBox::new(-50.0, -50.0, 50.0, 50.0), 77)
        .into_iter()
        .map(|(x, y)| Coordinate::new(x, y))
        .collect();
    let naive: Vec<usize> = (0..points.len()).collect();
    let order = approximate_tour(&points, None);
    assert!(closed_length(&points, &order) < closed_length(&points, &naive));
}
