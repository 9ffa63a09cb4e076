//! Per-menu navigation graphs: link maps and directional edge sets.
//!
//! Menu items are clustered into rows by Y proximity, rows are linked
//! vertically by a connection-method classification, awkward offset/split
//! connections become horizontal outside/inside links, long-range column
//! links bridge distant rows, and finally every edge node wraps around to
//! the far node of its own row so menu-level wrap works in every direction.
//! The result guarantees every item is reachable from every other.

use padmux_core::{Dir4, MenuId, NORMALIZED_MAX};
use padmux_map::InputMap;
use tracing::debug;

use crate::search::{HotspotMap, MAX_PERP_FOR_STRAIGHT, TrackedPoint};

/// Horizontal separation must exceed vertical separation times this before
/// two rows connect sideways instead of vertically.
const MIN_SLOPE_FOR_HORIZ_LINK: f64 = 0.9;

/// Vertical column links tolerate X drift up to Y distance times this.
const MAX_SLOPE_FOR_VERT_LINK: f64 = 1.2;

/// Weight of X drift when scoring column links.
const COLUMN_X_PENALTY_MULT: i32 = 2;

/// Hard cap on X drift for column links.
const MAX_LINK_MAP_COLUMN_XDIST: i32 = 0x0500;

/// Navigation links for one menu item: the neighboring item index per
/// direction plus whether this item sits on that edge of the menu.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HotspotLinkNode {
    pub next: [u16; 4],
    pub edge: [bool; 4],
}

/// Cached directional edge lists for one menu.
#[derive(Debug, Default)]
pub(crate) struct MenuEdgeMap {
    pub item_count: usize,
    /// Per direction: `(perpendicular position, item index)` sorted by the
    /// perpendicular position.
    pub edges: [Vec<(u16, u16)>; 4],
}

const UP: usize = 0;
const DOWN: usize = 1;
const LEFT: usize = 0;
const RIGHT: usize = 1;

fn v_opposite(v: usize) -> usize {
    1 - v
}

fn v_delta(v: usize) -> isize {
    if v == UP { -1 } else { 1 }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Connect {
    None,
    Basic,
    Full,
    OffLeftEdge,
    OffRightEdge,
    SplitOut,
    SplitIn,
}

#[derive(Debug, Clone, Copy)]
struct Dot {
    point: u16,
    x: i32,
    y: i32,
    /// Vertical link per V direction, as a point ID (0 = none).
    vert: [u16; 2],
}

#[derive(Debug, Clone, Default)]
struct Row {
    dots: Vec<Dot>,
    total_y: i32,
    avg_y: i32,
    method: [Option<Connect>; 2],
    outside: [u16; 2],
    inside: [u16; 2],
    inside_idx: [usize; 2],
}

impl Row {
    fn add_dot(&mut self, point: u16, x: i32, y: i32) {
        self.dots.push(Dot {
            point,
            x,
            y,
            vert: [0, 0],
        });
        self.total_y += y;
        self.avg_y = self.total_y / self.dots.len() as i32;
    }

    fn len(&self) -> usize {
        self.dots.len()
    }

    fn min_x(&self) -> i32 {
        self.dots.first().map_or(0, |d| d.x)
    }

    fn max_x(&self) -> i32 {
        self.dots.last().map_or(0, |d| d.x)
    }

    /// Y of the leftmost / rightmost dot.
    fn min_xy(&self) -> i32 {
        self.dots.first().map_or(0, |d| d.y)
    }

    fn max_xy(&self) -> i32 {
        self.dots.last().map_or(0, |d| d.y)
    }

    fn min_xp(&self) -> i32 {
        self.min_x() - MAX_PERP_FOR_STRAIGHT
    }

    fn max_xp(&self) -> i32 {
        self.max_x() + MAX_PERP_FOR_STRAIGHT
    }

    fn closest_idx_to(&self, x: i32) -> usize {
        let mut idx = 0;
        while idx < self.dots.len() {
            if self.dots[idx].x == x {
                break;
            }
            if self.dots[idx].x > x {
                if idx > 0 && (self.dots[idx].x - x > x - self.dots[idx - 1].x) {
                    idx -= 1;
                }
                break;
            }
            idx += 1;
        }
        idx.min(self.dots.len() - 1)
    }

    /// Index of the nearest dot at or left of `x` (clamped to 0).
    fn next_left_idx(&self, x: i32) -> usize {
        let mut idx = self.dots.len() as isize - 1;
        while idx >= 0 && self.dots[idx as usize].x > x {
            idx -= 1;
        }
        idx.max(0) as usize
    }

    /// Index of the nearest dot at or right of `x` (clamped to the end).
    fn next_right_idx(&self, x: i32) -> usize {
        let mut idx = 0;
        while idx < self.dots.len() && self.dots[idx].x < x {
            idx += 1;
        }
        idx.min(self.dots.len() - 1)
    }

    fn edge_idx(&self, h: usize) -> usize {
        if h == LEFT { 0 } else { self.dots.len() - 1 }
    }

    /// Classifies how this row connects to `rhs`.
    fn find_connect_method(&self, rhs: &Row) -> Connect {
        if self.dots.is_empty() || rhs.dots.is_empty() {
            return Connect::None;
        }
        let slope = |dx: i32, dy: i32| f64::from(dx) > f64::from(dy.abs()) * MIN_SLOPE_FOR_HORIZ_LINK;

        if slope(self.min_x() - rhs.max_x(), self.min_xy() - rhs.max_xy()) {
            return Connect::OffLeftEdge;
        }
        if slope(rhs.min_x() - self.max_x(), self.min_xy() - rhs.max_xy()) {
            return Connect::OffRightEdge;
        }

        if self.min_x() >= rhs.min_x() && self.max_x() <= rhs.max_x() {
            // This row fits inside the other's span.
            let next_r = rhs.next_right_idx(self.max_x());
            let next_l = rhs.next_left_idx(self.min_x());
            if next_r == next_l + 1 {
                if slope(rhs.dots[next_r].x - self.max_x(), rhs.dots[next_r].y - self.max_xy())
                    && slope(self.min_x() - rhs.dots[next_l].x, rhs.dots[next_r].y - self.max_xy())
                {
                    return Connect::SplitOut;
                }
                return Connect::Basic;
            }
        }

        if self.min_x() < rhs.min_x() && self.max_x() > rhs.max_x() {
            // The other row fits inside this one's span.
            let next_r = self.next_right_idx(rhs.max_x());
            let next_l = self.next_left_idx(rhs.min_x());
            if next_r == next_l + 1 {
                if slope(self.dots[next_r].x - rhs.max_x(), self.dots[next_r].y - rhs.max_xy())
                    && slope(rhs.min_x() - self.dots[next_l].x, self.dots[next_l].y - rhs.min_xy())
                {
                    return Connect::SplitIn;
                }
                return Connect::Basic;
            }
        }

        let overlap = self.max_x().min(rhs.max_x()) - self.min_x().max(rhs.min_x());
        if f64::from(overlap) > f64::from(self.max_x() - self.min_x()) * 0.7 {
            return Connect::Full;
        }

        Connect::Basic
    }
}

/// Links every row to its neighbors so all dots are reachable, converting
/// awkward vertical connections into horizontal edge links and recursively
/// re-linking around rows that split both ways.
#[allow(clippy::too_many_lines)]
fn safe_link_rows(rows: &mut Vec<Row>, range_begin: usize, range_end: usize) {
    let row_count = rows.len();

    for row_idx in range_begin..range_end.min(row_count) {
        for v in [UP, DOWN] {
            let next_idx = row_idx as isize + v_delta(v);
            if next_idx < 0 || next_idx as usize >= row_count {
                continue;
            }
            let next_idx = next_idx as usize;
            let method = rows[row_idx].find_connect_method(&rows[next_idx]);
            rows[row_idx].method[v] = Some(method);

            match method {
                Connect::None => {}
                Connect::Basic => {
                    // Link dots within the intersecting X range.
                    let (min_xp, max_xp) = (rows[next_idx].min_xp(), rows[next_idx].max_xp());
                    let row_len = rows[row_idx].len();
                    let mut first = 0;
                    let mut last = row_len - 1;
                    while first < row_len - 1 && rows[row_idx].dots[first].x < min_xp {
                        first += 1;
                    }
                    while last > 0 && rows[row_idx].dots[last].x > max_xp {
                        last -= 1;
                    }
                    if first > last {
                        // Nothing inside the intersection: pick the closer
                        // of the two nearest dots.
                        let dot_l = rows[row_idx].closest_idx_to(rows[next_idx].min_x());
                        let dot_r = rows[row_idx].closest_idx_to(rows[next_idx].max_x());
                        let dist_r = (rows[next_idx].max_x() - rows[row_idx].dots[dot_r].x).abs();
                        let dist_l = (rows[next_idx].min_x() - rows[row_idx].dots[dot_l].x).abs();
                        if dist_r < dist_l {
                            first = dot_r;
                            last = dot_r;
                        } else {
                            first = dot_l;
                            last = dot_l;
                        }
                    }
                    for i in first..=last {
                        if rows[row_idx].dots[i].vert[v] != 0 {
                            continue;
                        }
                        let x = rows[row_idx].dots[i].x;
                        let link = rows[next_idx].dots[rows[next_idx].closest_idx_to(x)];
                        // Keep center dots unlinked when a neighbor dot is
                        // closer to the target than they are.
                        let row = &rows[row_idx];
                        if i == 0
                            || i == row.len() - 1
                            || (link.x > row.dots[i - 1].x && link.x < row.dots[i + 1].x)
                        {
                            rows[row_idx].dots[i].vert[v] = link.point;
                        }
                    }
                }
                Connect::Full => {
                    for i in 0..rows[row_idx].len() {
                        if rows[row_idx].dots[i].vert[v] != 0 {
                            continue;
                        }
                        let x = rows[row_idx].dots[i].x;
                        let link = rows[next_idx].dots[rows[next_idx].closest_idx_to(x)].point;
                        rows[row_idx].dots[i].vert[v] = link;
                    }
                }
                Connect::OffLeftEdge => {
                    if rows[row_idx].dots[0].vert[v] == 0 && rows[row_idx].outside[LEFT] == 0 {
                        let link = rows[next_idx].dots[rows[next_idx].len() - 1].point;
                        rows[row_idx].dots[0].vert[v] = link;
                    }
                }
                Connect::OffRightEdge => {
                    let last = rows[row_idx].len() - 1;
                    if rows[row_idx].dots[last].vert[v] == 0 && rows[row_idx].outside[RIGHT] == 0 {
                        let link = rows[next_idx].dots[0].point;
                        rows[row_idx].dots[last].vert[v] = link;
                    }
                }
                Connect::SplitOut => {
                    // Link this row's end dots to the dots just past them.
                    let min_x = rows[row_idx].min_x();
                    let max_x = rows[row_idx].max_x();
                    if rows[row_idx].dots[0].vert[v] == 0 && rows[row_idx].outside[LEFT] == 0 {
                        let link = rows[next_idx].dots[rows[next_idx].next_left_idx(min_x)].point;
                        rows[row_idx].dots[0].vert[v] = link;
                    }
                    let last = rows[row_idx].len() - 1;
                    if rows[row_idx].dots[last].vert[v] == 0 && rows[row_idx].outside[RIGHT] == 0 {
                        let link = rows[next_idx].dots[rows[next_idx].next_right_idx(max_x)].point;
                        rows[row_idx].dots[last].vert[v] = link;
                    }
                }
                Connect::SplitIn => {
                    // Link the dots flanking the smaller row to its ends.
                    let other_min = rows[next_idx].min_x();
                    let left_flank = rows[row_idx].next_left_idx(other_min);
                    if rows[row_idx].dots[left_flank].vert[v] == 0
                        && rows[row_idx].inside[RIGHT] == 0
                    {
                        let link = rows[next_idx].dots[0].point;
                        rows[row_idx].dots[left_flank].vert[v] = link;
                    }
                    let right_flank = rows[row_idx].next_right_idx(other_min);
                    if rows[row_idx].dots[right_flank].vert[v] == 0
                        && rows[row_idx].inside[LEFT] == 0
                    {
                        let link = rows[next_idx].dots[rows[next_idx].len() - 1].point;
                        rows[row_idx].dots[right_flank].vert[v] = link;
                    }
                }
            }
        }
    }

    // Convert offset/split vertical links into horizontal links. Doing so
    // in both vertical directions would disconnect the row, so those rows
    // are re-linked afterwards as if absent.
    let mut skip_rows: Vec<usize> = Vec::new();
    for row_idx in range_begin..range_end.min(row_count) {
        for v in [UP, DOWN] {
            let Some(method) = rows[row_idx].method[v] else {
                continue;
            };
            if !matches!(
                method,
                Connect::OffLeftEdge | Connect::OffRightEdge | Connect::SplitOut | Connect::SplitIn
            ) {
                continue;
            }
            let next_idx = (row_idx as isize + v_delta(v)) as usize;
            let bidirectional = rows[row_idx].method[v] == rows[row_idx].method[v_opposite(v)];
            if bidirectional && v == UP {
                // Only process the closer of the two directions here; the
                // loop reaches the other naturally.
                let prev_idx = (row_idx as isize - v_delta(v)) as usize;
                let next_dist = (rows[row_idx].avg_y - rows[next_idx].avg_y).abs();
                let prev_dist = (rows[row_idx].avg_y - rows[prev_idx].avg_y).abs();
                if prev_dist < next_dist {
                    continue;
                }
            }

            match method {
                Connect::OffLeftEdge | Connect::OffRightEdge => {
                    let h = if method == Connect::OffLeftEdge { LEFT } else { RIGHT };
                    if rows[row_idx].outside[h] != 0 {
                        continue;
                    }
                    let opp_edge = rows[next_idx].edge_idx(1 - h);
                    rows[row_idx].outside[h] = rows[next_idx].dots[opp_edge].point;
                    let edge = rows[row_idx].edge_idx(h);
                    rows[row_idx].dots[edge].vert[v] = 0;
                    if bidirectional {
                        rows[row_idx].dots[edge].vert[v_opposite(v)] = 0;
                    }
                }
                Connect::SplitOut => {
                    if rows[row_idx].outside[LEFT] != 0 || rows[row_idx].outside[RIGHT] != 0 {
                        continue;
                    }
                    let min_x = rows[row_idx].min_x();
                    rows[row_idx].outside[LEFT] =
                        rows[next_idx].dots[rows[next_idx].next_left_idx(min_x)].point;
                    rows[row_idx].outside[RIGHT] =
                        rows[next_idx].dots[rows[next_idx].next_right_idx(min_x)].point;
                    let last = rows[row_idx].len() - 1;
                    rows[row_idx].dots[0].vert[v] = 0;
                    rows[row_idx].dots[last].vert[v] = 0;
                    if bidirectional {
                        rows[row_idx].dots[0].vert[v_opposite(v)] = 0;
                        rows[row_idx].dots[last].vert[v_opposite(v)] = 0;
                    }
                }
                Connect::SplitIn => {
                    if rows[row_idx].inside[LEFT] != 0 || rows[row_idx].inside[RIGHT] != 0 {
                        continue;
                    }
                    let other_min = rows[next_idx].min_x();
                    let other_max = rows[next_idx].max_x();

                    // Left inside link: to the smaller row's rightmost dot.
                    let l_idx = rows[row_idx].next_right_idx(other_max);
                    rows[row_idx].inside_idx[LEFT] = l_idx;
                    rows[row_idx].inside[LEFT] = rows[next_idx].dots[rows[next_idx].len() - 1].point;
                    rows[row_idx].dots[l_idx].vert[v] = 0;

                    // Right inside link: to the smaller row's leftmost dot.
                    let r_idx = rows[row_idx].next_left_idx(other_min);
                    rows[row_idx].inside_idx[RIGHT] = r_idx;
                    rows[row_idx].inside[RIGHT] = rows[next_idx].dots[0].point;
                    rows[row_idx].dots[r_idx].vert[v] = 0;

                    if bidirectional {
                        rows[row_idx].dots[l_idx].vert[v_opposite(v)] = 0;
                        rows[row_idx].dots[r_idx].vert[v_opposite(v)] = 0;
                    }
                }
                _ => {}
            }

            if bidirectional {
                skip_rows.push(row_idx);
                break;
            }
        }
    }

    for &skip in &skip_rows {
        // Re-link the neighbors as if this row did not exist so they stay
        // connected to each other, then reinsert.
        let row = rows.remove(skip);
        let begin = skip.saturating_sub(1);
        let end = (skip + 1).min(rows.len());
        safe_link_rows(rows, begin, end);
        rows.insert(skip, row);
    }
}

/// Builds (or fetches) the link map for a menu and returns one node.
pub(crate) fn menu_link_node(
    index: &mut HotspotMap,
    map: &InputMap,
    menu: MenuId,
    item: usize,
) -> HotspotLinkNode {
    let node_count = map.menu_item_count(menu).max(1);
    {
        let (cache, _) = index.link_maps_mut();
        if let Some(nodes) = cache.get(&menu.0) {
            if !nodes.is_empty() {
                return nodes[item.min(nodes.len() - 1)];
            }
        }
    }
    debug!("generating hotspot links for menu {}", menu.0);

    let mut nodes = vec![HotspotLinkNode::default(); node_count];
    if node_count > 1 {
        build_link_map(index, map, menu, &mut nodes);
    }
    let result = nodes[item.min(nodes.len() - 1)];
    let (cache, _) = index.link_maps_mut();
    cache.insert(menu.0, nodes);
    result
}

fn build_link_map(
    index: &mut HotspotMap,
    map: &InputMap,
    menu: MenuId,
    nodes: &mut [HotspotLinkNode],
) {
    let node_count = nodes.len();
    let (_, points) = index.link_maps_mut();

    // Cluster the items into rows of nearly equal Y.
    let mut point_to_item: Vec<(u16, u16)> = Vec::with_capacity(node_count);
    let mut rows: Vec<Row> = Vec::with_capacity(node_count);
    for item_idx in 0..node_count {
        let point_id = map.menu_item_hotspot(menu, item_idx).0;
        let point = points
            .get(usize::from(point_id))
            .copied()
            .unwrap_or(TrackedPoint::default());
        point_to_item.push((point_id, item_idx as u16));
        let (x, y) = (i32::from(point.x), i32::from(point.y));
        let mut placed = false;
        for row in &mut rows {
            if (row.avg_y - y).abs() <= MAX_PERP_FOR_STRAIGHT {
                row.add_dot(point_id, x, y);
                placed = true;
                break;
            }
        }
        if !placed {
            let mut row = Row::default();
            row.add_dot(point_id, x, y);
            rows.push(row);
        }
    }
    point_to_item.sort_unstable();

    for row in &mut rows {
        row.dots.sort_by_key(|d| d.x);
    }
    rows.sort_by_key(|r| r.avg_y);
    let row_count = rows.len();

    // Guaranteed vertical connectivity.
    safe_link_rows(&mut rows, 0, row_count);

    // Extra long-range column links, allowing row skips.
    for row_idx in 0..row_count {
        for v in [UP, DOWN] {
            for dot_idx in 0..rows[row_idx].len() {
                if rows[row_idx].dots[dot_idx].vert[v] != 0 {
                    continue;
                }
                let from = rows[row_idx].dots[dot_idx];
                let mut best_penalty = i32::MAX;
                let mut next_row = row_idx as isize + v_delta(v);
                while next_row >= 0 && (next_row as usize) < row_count {
                    let candidate_row = &rows[next_row as usize];
                    let to = candidate_row.dots[candidate_row.closest_idx_to(from.x)];
                    let dist_x = (from.x - to.x).abs();
                    let dist_y = (from.y - to.y).abs();
                    next_row += v_delta(v);
                    if dist_x > MAX_LINK_MAP_COLUMN_XDIST {
                        continue;
                    }
                    if f64::from(dist_x) > f64::from(dist_y) * MAX_SLOPE_FOR_VERT_LINK {
                        continue;
                    }
                    let penalty = dist_y + dist_x * COLUMN_X_PENALTY_MULT;
                    if penalty < best_penalty {
                        rows[row_idx].dots[dot_idx].vert[v] = to.point;
                        best_penalty = penalty;
                    }
                }
            }
        }
    }

    // Emit the final per-item nodes.
    let item_of = |point: u16| -> Option<u16> {
        point_to_item
            .binary_search_by_key(&point, |&(p, _)| p)
            .ok()
            .map(|i| point_to_item[i].1)
    };
    for row in &rows {
        for (dot_idx, dot) in row.dots.iter().enumerate() {
            let mut point_in_dir = [0u16; 4];
            point_in_dir[Dir4::Up.index()] = dot.vert[UP];
            point_in_dir[Dir4::Down.index()] = dot.vert[DOWN];
            point_in_dir[Dir4::Left.index()] = if dot_idx == 0 {
                row.outside[LEFT]
            } else if row.inside[LEFT] != 0 && row.inside_idx[LEFT] == dot_idx {
                row.inside[LEFT]
            } else {
                row.dots[dot_idx - 1].point
            };
            point_in_dir[Dir4::Right.index()] = if dot_idx == row.len() - 1 {
                row.outside[RIGHT]
            } else if row.inside[RIGHT] != 0 && row.inside_idx[RIGHT] == dot_idx {
                row.inside[RIGHT]
            } else {
                row.dots[dot_idx + 1].point
            };

            let Some(node_idx) = item_of(dot.point) else {
                continue;
            };
            let node = &mut nodes[usize::from(node_idx)];
            for dir in 0..4 {
                match point_in_dir[dir] {
                    0 => {
                        node.edge[dir] = true;
                        node.next[dir] = node_idx;
                    }
                    point => {
                        node.edge[dir] = false;
                        node.next[dir] = item_of(point).unwrap_or(node_idx);
                    }
                }
            }
        }
    }

    // Wrap closure: each edge node points across to the far edge node
    // reached by walking the opposite direction.
    for node_idx in 0..node_count {
        for dir in 0..4 {
            if !nodes[node_idx].edge[dir] {
                continue;
            }
            let opp = Dir4::from_index(dir).expect("dir in range").opposite().index();
            let mut wrap = nodes[node_idx].next[opp];
            let mut guard = 0;
            while !nodes[usize::from(wrap)].edge[opp] && guard <= node_count {
                wrap = nodes[usize::from(wrap)].next[opp];
                guard += 1;
            }
            nodes[node_idx].next[dir] = wrap;
        }
    }
}

/// Builds (or fetches) the edge set for `(menu, dir)` and picks the edge
/// item nearest `default_item` in the perpendicular axis.
pub(crate) fn edge_menu_item(
    index: &mut HotspotMap,
    map: &InputMap,
    menu: MenuId,
    dir: Dir4,
    default_item: usize,
) -> usize {
    let node_count = map.menu_item_count(menu);
    if node_count <= 1 {
        return 0;
    }

    let (cache, points) = index.edge_maps_mut();
    let entry = cache.entry(menu.0).or_default();
    let edge = &mut entry.edges[dir.index()];
    if edge.is_empty() {
        entry.item_count = node_count;
        let mut total_pos: i64 = 0;
        let mut avg_pos: i64 = -1;
        for item_idx in 0..node_count {
            let point_id = map.menu_item_hotspot(menu, item_idx).0;
            let point = points
                .get(usize::from(point_id))
                .copied()
                .unwrap_or_default();
            let (pos_in_dir, pos_perp) = directional_pos(point, dir);
            if i64::from(pos_in_dir) + i64::from(MAX_PERP_FOR_STRAIGHT) < avg_pos {
                continue;
            }
            if total_pos == 0 || i64::from(pos_in_dir) - i64::from(MAX_PERP_FOR_STRAIGHT) > avg_pos
            {
                edge.clear();
                total_pos = 0;
            }
            edge.push((pos_perp, item_idx as u16));
            total_pos += i64::from(pos_in_dir);
            avg_pos = total_pos / edge.len() as i64;
        }
        edge.sort_unstable();
    }

    if edge.len() == 1 {
        return usize::from(edge[0].1);
    }

    let default_point_id = map.menu_item_hotspot(menu, default_item).0;
    let default_point = points
        .get(usize::from(default_point_id))
        .copied()
        .unwrap_or_default();
    let search_key = if dir.is_horizontal() {
        default_point.y
    } else {
        default_point.x
    };

    let next = edge.partition_point(|&(perp, _)| perp < search_key);
    if next == 0 {
        return usize::from(edge[0].1);
    }
    if next >= edge.len() {
        return usize::from(edge[edge.len() - 1].1);
    }
    let prev_dist = i32::from(search_key) - i32::from(edge[next - 1].0);
    let next_dist = i32::from(edge[next].0) - i32::from(search_key);
    if prev_dist <= next_dist {
        usize::from(edge[next - 1].1)
    } else {
        usize::from(edge[next].1)
    }
}

/// Position along a direction (larger = further that way) and the
/// perpendicular coordinate.
fn directional_pos(point: TrackedPoint, dir: Dir4) -> (u16, u16) {
    match dir {
        Dir4::Left => ((NORMALIZED_MAX as u16) - point.x, point.y),
        Dir4::Right => (point.x, point.y),
        Dir4::Up => ((NORMALIZED_MAX as u16) - point.y, point.x),
        Dir4::Down => (point.y, point.x),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use padmux_core::{BitSet, Size};
    use padmux_profile::Profile;

    const TARGET: Size = Size { w: 1000, h: 1000 };

    /// A 2x3 grid of hotspots bound to a Hotspots-style menu.
    fn grid_setup() -> (InputMap, HotspotMap) {
        let text = "\
[Hotspots]
Cell1 = 0%+100, 0%+100
Cell2 = 0%+400, 0%+100
Cell3 = 0%+700, 0%+100
Cell4 = 0%+100, 0%+500
Cell5 = 0%+400, 0%+500
Cell6 = 0%+700, 0%+500

[Menu.Board]
Style = Hotspots
Cell1 = One: F1
Cell2 = Two: F2
Cell3 = Three: F3
Cell4 = Four: F4
Cell5 = Five: F5
Cell6 = Six: F6
";
        let mut profile = Profile::new();
        profile.load_from_str(text).expect("profile parses");
        let mut map = InputMap::new();
        map.load_profile(&profile);
        let mut index = HotspotMap::new(&map, TARGET, 1.0);
        let mut all = BitSet::new();
        for i in 0..map.hotspots.array_count() {
            all.set(i);
        }
        index.set_enabled_arrays(&all);
        index.load_profile_changes(&mut map, 200.0);
        index.update(&map, TARGET, 1.0);
        (map, index)
    }

    fn menu_of(map: &InputMap, name: &str) -> MenuId {
        padmux_command::ParseContext::menu_id(map, name).expect("menu exists")
    }

    #[test]
    fn test_grid_links_cardinal_neighbors() {
        let (map, mut index) = grid_setup();
        let menu = menu_of(&map, "Board");
        // Item 0 (top-left): right -> 1, down -> 3, up/left are edges.
        let node = index.menu_link_node(&map, menu, 0);
        assert_eq!(node.next[Dir4::Right.index()], 1);
        assert_eq!(node.next[Dir4::Down.index()], 3);
        assert!(node.edge[Dir4::Up.index()]);
        assert!(node.edge[Dir4::Left.index()]);
        // Item 4 (bottom-middle): up -> 1, left -> 3, right -> 5.
        let node = index.menu_link_node(&map, menu, 4);
        assert_eq!(node.next[Dir4::Up.index()], 1);
        assert_eq!(node.next[Dir4::Left.index()], 3);
        assert_eq!(node.next[Dir4::Right.index()], 5);
    }

    #[test]
    fn test_link_map_is_connected() {
        let (map, mut index) = grid_setup();
        let menu = menu_of(&map, "Board");
        let count = map.menu_item_count(menu);
        // Flood fill over the undirected link graph.
        let mut nodes = Vec::new();
        for i in 0..count {
            nodes.push(index.menu_link_node(&map, menu, i));
        }
        let mut seen = vec![false; count];
        let mut frontier = vec![0usize];
        seen[0] = true;
        while let Some(at) = frontier.pop() {
            for dir in 0..4 {
                if nodes[at].edge[dir] {
                    continue;
                }
                let next = usize::from(nodes[at].next[dir]);
                if !seen[next] {
                    seen[next] = true;
                    frontier.push(next);
                }
            }
        }
        assert!(seen.iter().all(|&s| s), "all items reachable: {seen:?}");
    }

    #[test]
    fn test_wrap_closure_points_to_far_edge() {
        let (map, mut index) = grid_setup();
        let menu = menu_of(&map, "Board");
        // Top-left pushed left wraps to the right end of its row.
        let node = index.menu_link_node(&map, menu, 0);
        assert!(node.edge[Dir4::Left.index()]);
        assert_eq!(node.next[Dir4::Left.index()], 2);
        // And pushed up wraps to the bottom of its column.
        assert!(node.edge[Dir4::Up.index()]);
        assert_eq!(node.next[Dir4::Up.index()], 3);
    }

    #[test]
    fn test_edge_menu_item_picks_nearest_in_perp() {
        let (map, mut index) = grid_setup();
        let menu = menu_of(&map, "Board");
        // Entering from the left edge, starting from bottom-right (5):
        // the left edge holds items 0 and 3; 3 shares its row.
        let item = index.edge_menu_item(&map, menu, Dir4::Left, 5);
        assert_eq!(item, 3);
        let item = index.edge_menu_item(&map, menu, Dir4::Left, 2);
        assert_eq!(item, 0);
    }

    #[test]
    fn test_single_item_menu_has_all_edges() {
        let text = "\
[Hotspots]
Solo1 = 0%+500, 0%+500

[Menu.One]
Style = Hotspots
Solo1 = Only: F1
";
        let mut profile = Profile::new();
        profile.load_from_str(text).unwrap();
        let mut map = InputMap::new();
        map.load_profile(&profile);
        let mut index = HotspotMap::new(&map, TARGET, 1.0);
        index.load_profile_changes(&mut map, 200.0);
        index.update(&map, TARGET, 1.0);
        let menu = menu_of(&map, "One");
        let node = index.menu_link_node(&map, menu, 0);
        assert_eq!(node, HotspotLinkNode::default());
    }

    #[test]
    fn test_offset_rows_link_horizontally() {
        // Two single-dot rows, far apart in X, nearly level in Y: the
        // horizontal-link classification connects them sideways.
        let text = "\
[Hotspots]
PairA1 = 0%+100, 0%+200
PairB1 = 0%+800, 0%+260

[Menu.Pair]
Style = Hotspots
PairA1 = A: F1
PairB1 = B: F2
";
        let mut profile = Profile::new();
        profile.load_from_str(text).unwrap();
        let mut map = InputMap::new();
        map.load_profile(&profile);
        let mut index = HotspotMap::new(&map, TARGET, 1.0);
        index.load_profile_changes(&mut map, 200.0);
        index.update(&map, TARGET, 1.0);
        let menu = menu_of(&map, "Pair");
        let a = index.menu_link_node(&map, menu, 0);
        let b = index.menu_link_node(&map, menu, 1);
        // A reaches B to its right; B reaches A to its left.
        assert_eq!(a.next[Dir4::Right.index()], 1);
        assert!(!a.edge[Dir4::Right.index()]);
        assert_eq!(b.next[Dir4::Left.index()], 0);
        assert!(!b.edge[Dir4::Left.index()]);
    }

    #[test]
    fn test_cursor_query_and_links_share_normalization() {
        let (map, mut index) = grid_setup();
        let menu = menu_of(&map, "Board");
        // A directional query in between link lookups must not corrupt the
        // cached link map.
        let before = index.menu_link_node(&map, menu, 0);
        let _ = index.next_hotspot_in_dir(&map, padmux_core::Dir8::Right);
        let after = index.menu_link_node(&map, menu, 0);
        assert_eq!(before, after);
    }
}
