//! Unweighted grid search.

use crate::math::Point;
use crate::spatial::Zone;
use std::collections::{HashMap, VecDeque};

/// Breadth-first search over walkable cells of one horizontal layer.
///
/// Steps go to any of the eight neighbors on the same layer; a diagonal
/// step also needs both cells it cuts past to be walkable. Only cells
/// that already exist are searched.
#[derive(Debug, Clone, Copy)]
pub struct Pathfinder {
    max_nodes: usize,
}

const STEPS: [(i32, i32); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

impl Pathfinder {
    pub fn new(max_nodes: usize) -> Self {
        Self { max_nodes }
    }

    /// Cells from `start` (exclusive) to `goal` (inclusive).
    ///
    /// Empty when the goal is the start, unreachable, or beyond the search
    /// budget.
    pub fn find_path(&self, zone: &Zone, start: Point, goal: Point) -> Vec<Point> {
        if start == goal || start.z != goal.z || !zone.is_walkable(goal) {
            return Vec::new();
        }

        let mut came_from: HashMap<Point, Point> = HashMap::new();
        let mut frontier = VecDeque::from([start]);
        came_from.insert(start, start);
        let mut expanded = 0usize;

        while let Some(current) = frontier.pop_front() {
            if current == goal {
                return rebuild(&came_from, start, goal);
            }
            expanded += 1;
            if expanded > self.max_nodes {
                break;
            }
            for &(dx, dy) in &STEPS {
                let next = current.offset(dx, dy, 0);
                if came_from.contains_key(&next) || !zone.is_walkable(next) {
                    continue;
                }
                if dx != 0 && dy != 0
                    && !(zone.is_walkable(current.offset(dx, 0, 0)) && zone.is_walkable(current.offset(0, dy, 0)))
                {
                    continue;
                }
                came_from.insert(next, current);
                frontier.push_back(next);
            }
        }
        Vec::new()
    }
}

fn rebuild(came_from: &HashMap<Point, Point>, start: Point, goal: Point) -> Vec<Point> {
    let mut path = vec![goal];
    let mut at = goal;
    while let Some(&prev) = came_from.get(&at) {
        if prev == start {
            break;
        }
        path.push(prev);
        at = prev;
    }
    path.reverse();
    path
}
