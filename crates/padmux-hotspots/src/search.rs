//! The task scheduler, grid index, and directional search.

use padmux_core::{
    BitSet, Dir4, Dir8, GRID_SHIFT, GRID_SIZE, HOTSPOT_LAST_CURSOR_POS, HotspotId, MenuId,
    NORMALIZED_MAX, Size, normalize,
};
use padmux_map::InputMap;
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::links::{self, HotspotLinkNode, MenuEdgeMap};

/// Jumps shorter than this land "on" the start point and are skipped so the
/// cursor jumps from a hotspot rather than back onto it.
pub const MIN_JUMP_DIST: i32 = 0x0100;

/// Maximum perpendicular distance that still counts as a straight line.
pub const MAX_PERP_FOR_STRAIGHT: i32 = 0x0088;

/// How far past the base jump destination to accept a wide-bucket target,
/// as a multiplier of the base jump distance.
const DEVIATION_RADIUS_MULT: f64 = 0.75;

/// Weight of perpendicular drift when scoring wide-bucket candidates.
const PERP_PENALTY_MULT: f64 = 1.25;

/// One tracked hotspot position in normalized space.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct TrackedPoint {
    pub x: u16,
    pub y: u16,
    pub enabled: bool,
}

/// Task identifiers, in strict precedence order (lower index preempts).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Task {
    TargetSize,
    Normalize,
    ActiveArrays,
    AddToGrid,
    BeginSearch,
    FetchFromGrid,
    NextInDir(Dir8),
}

const TASK_COUNT: usize = 6 + 8;

impl Task {
    fn index(self) -> usize {
        match self {
            Task::TargetSize => 0,
            Task::Normalize => 1,
            Task::ActiveArrays => 2,
            Task::AddToGrid => 3,
            Task::BeginSearch => 4,
            Task::FetchFromGrid => 5,
            Task::NextInDir(d) => 6 + d.index(),
        }
    }

    fn from_index(idx: usize) -> Option<Task> {
        Some(match idx {
            0 => Task::TargetSize,
            1 => Task::Normalize,
            2 => Task::ActiveArrays,
            3 => Task::AddToGrid,
            4 => Task::BeginSearch,
            5 => Task::FetchFromGrid,
            i if i < TASK_COUNT => Task::NextInDir(Dir8::from_index(i - 6)?),
            _ => return None,
        })
    }
}

/// The incremental hotspot index.
#[derive(Debug, Default)]
pub struct HotspotMap {
    pub(crate) points: Vec<TrackedPoint>,
    to_normalize: BitSet,
    requested_arrays: BitSet,
    active_arrays: BitSet,
    grid: Vec<Vec<u16>>,
    fetch_cells: Vec<(usize, usize)>,
    candidates: Vec<u16>,
    link_maps: FxHashMap<u16, Vec<HotspotLinkNode>>,
    edge_maps: FxHashMap<u16, MenuEdgeMap>,
    next_in_dir: [u16; 8],

    last_target: Size,
    last_ui_scale: f64,
    last_cursor_pos: (i32, i32),
    norm_cursor: (i32, i32),

    new_tasks: BitSet,
    current_task: Option<Task>,
    progress: usize,

    /// Base jump distance in pixels (from the profile, UI-scaled).
    base_jump_px: f64,
    base_jump: i32,
    max_jump: i32,
    max_jump_sq: u32,
    max_deviation_sq: u32,
    best_penalty: u32,
}

impl HotspotMap {
    /// Builds the index for the map's current hotspot set; everything is
    /// scheduled for (re)computation.
    #[must_use]
    pub fn new(map: &InputMap, target: Size, ui_scale: f64) -> Self {
        let mut this = Self {
            points: vec![TrackedPoint::default(); map.hotspots.hotspot_count()],
            grid: vec![Vec::new(); GRID_SIZE * GRID_SIZE],
            last_target: target,
            last_ui_scale: ui_scale,
            ..Self::default()
        };
        this.new_tasks = BitSet::with_capacity(TASK_COUNT);
        this.post_all_tasks();
        this
    }

    fn post_all_tasks(&mut self) {
        for i in 0..TASK_COUNT {
            self.new_tasks.set(i);
        }
    }

    fn post_search_tasks(&mut self) {
        self.new_tasks.set(Task::BeginSearch.index());
        for d in Dir8::ALL {
            self.new_tasks.set(Task::NextInDir(d).index());
        }
    }

    /// Requests a different set of enabled hotspot arrays.
    pub fn set_enabled_arrays(&mut self, arrays: &BitSet) {
        if self.requested_arrays != *arrays {
            self.requested_arrays = arrays.clone();
            self.new_tasks.set(Task::ActiveArrays.index());
        }
    }

    #[must_use]
    pub fn enabled_arrays(&self) -> &BitSet {
        &self.requested_arrays
    }

    /// Applies profile-driven changes: a new default jump distance and any
    /// moved hotspots. Consumes the map's changed-hotspot bits.
    pub fn load_profile_changes(&mut self, map: &mut InputMap, default_jump_px: f64) {
        let new_base = (default_jump_px * self.last_ui_scale).max(0.0);
        if (new_base - self.base_jump_px).abs() > f64::EPSILON {
            self.base_jump_px = new_base;
            self.post_all_tasks();
        }

        if self.points.len() != map.hotspots.hotspot_count() {
            self.points
                .resize(map.hotspots.hotspot_count(), TrackedPoint::default());
            self.post_all_tasks();
        }

        // Drop link/edge caches for menus whose shape changed.
        for menu_idx in 0..map.menu_count() {
            let id = MenuId(menu_idx as u16);
            let key = id.0;
            let count = map.menu_item_count(id);
            let changed = map.menu(id).is_some_and(|m| m.hotspots_changed);
            if let Some(nodes) = self.link_maps.get(&key) {
                if nodes.len() != count.max(1) || changed {
                    self.link_maps.remove(&key);
                }
            }
            if let Some(edges) = self.edge_maps.get(&key) {
                if edges.item_count != count || changed {
                    self.edge_maps.remove(&key);
                }
            }
            if changed {
                if let Some(menu) = map.menu_mut(id) {
                    menu.hotspots_changed = false;
                }
            }
        }

        if map.hotspots.changed.any() {
            self.to_normalize.union_with(&map.hotspots.changed);
            self.to_normalize.reset(0);
            self.to_normalize.reset(HOTSPOT_LAST_CURSOR_POS.index());
            map.hotspots.changed.clear();
            self.new_tasks.set(Task::Normalize.index());
            self.new_tasks.set(Task::AddToGrid.index());
            self.post_search_tasks();
        }
        if map.hotspots.array_resized {
            map.hotspots.array_resized = false;
            self.new_tasks.set(Task::ActiveArrays.index());
            self.new_tasks.set(Task::AddToGrid.index());
            self.post_search_tasks();
        }
    }

    /// One cooperative tick: detect state changes, then run one task step.
    pub fn update(&mut self, map: &InputMap, target: Size, ui_scale: f64) {
        if target != self.last_target || (ui_scale - self.last_ui_scale).abs() > f64::EPSILON {
            if (ui_scale - self.last_ui_scale).abs() > f64::EPSILON && self.last_ui_scale > 0.0 {
                self.base_jump_px = self.base_jump_px / self.last_ui_scale * ui_scale;
            }
            self.last_target = target;
            self.last_ui_scale = ui_scale;
            self.post_all_tasks();
        }

        let cursor = map.hotspots.hotspot(HOTSPOT_LAST_CURSOR_POS);
        let pos = cursor.resolve(self.last_target);
        if (pos.x, pos.y) != self.last_cursor_pos
            || self.new_tasks.test(Task::TargetSize.index())
        {
            self.last_cursor_pos = (pos.x, pos.y);
            let scale = self.last_target.max_axis();
            self.norm_cursor = (
                i32::from(normalize(pos.x, scale)),
                i32::from(normalize(pos.y, scale)),
            );
            self.post_search_tasks();
        }

        self.process_tasks(map);
    }

    /// The chosen hotspot for a direction from the last completed search
    /// (0 = none).
    #[must_use]
    pub fn found_in_dir(&self, dir: Dir8) -> HotspotId {
        HotspotId(self.next_in_dir[dir.index()])
    }

    /// Synchronously answers "next hotspot in direction": the other seven
    /// directional tasks are parked, prerequisites run to completion, and
    /// the parked tasks are restored afterwards.
    pub fn next_hotspot_in_dir(&mut self, map: &InputMap, dir: Dir8) -> HotspotId {
        if self.points.is_empty() || self.requested_arrays.none() {
            return HotspotId(0);
        }
        let mut parked = BitSet::with_capacity(TASK_COUNT);
        for d in Dir8::ALL {
            if d != dir && self.new_tasks.test(Task::NextInDir(d).index()) {
                self.new_tasks.reset(Task::NextInDir(d).index());
                parked.set(Task::NextInDir(d).index());
            }
        }
        while self.current_task.is_some() || self.new_tasks.any() {
            self.process_tasks(map);
        }
        self.new_tasks.union_with(&parked);
        HotspotId(self.next_in_dir[dir.index()])
    }

    /// The link-map node for a menu item (built on first use).
    pub fn menu_link_node(&mut self, map: &InputMap, menu: MenuId, item: usize) -> HotspotLinkNode {
        self.force_normalized(map);
        links::menu_link_node(self, map, menu, item)
    }

    /// The item nearest `default_item` on a menu's directional edge.
    pub fn edge_menu_item(
        &mut self,
        map: &InputMap,
        menu: MenuId,
        dir: Dir4,
        default_item: usize,
    ) -> usize {
        self.force_normalized(map);
        links::edge_menu_item(self, map, menu, dir, default_item)
    }

    /// Drives the task loop until every pending normalization is done.
    fn force_normalized(&mut self, map: &InputMap) {
        while self.new_tasks.test(Task::Normalize.index())
            || self.current_task == Some(Task::Normalize)
            || self.new_tasks.test(Task::TargetSize.index())
            || self.current_task == Some(Task::TargetSize)
        {
            self.process_tasks(map);
        }
    }

    pub(crate) fn link_maps_mut(
        &mut self,
    ) -> (&mut FxHashMap<u16, Vec<HotspotLinkNode>>, &[TrackedPoint]) {
        (&mut self.link_maps, &self.points)
    }

    pub(crate) fn edge_maps_mut(&mut self) -> (&mut FxHashMap<u16, MenuEdgeMap>, &[TrackedPoint]) {
        (&mut self.edge_maps, &self.points)
    }

    // ── Task pump ───────────────────────────────────────────────────

    fn process_tasks(&mut self, map: &InputMap) {
        // A new task at equal-or-higher priority preempts the current one,
        // which is re-posted rather than aborted.
        if let Some(first) = self.new_tasks.first_set() {
            let current_idx = self.current_task.map_or(TASK_COUNT, Task::index);
            if first <= current_idx {
                if let Some(current) = self.current_task {
                    self.new_tasks.set(current.index());
                }
                self.current_task = Task::from_index(first);
                self.progress = 0;
                self.new_tasks.reset(first);
            }
        }
        match self.current_task {
            None => {}
            Some(Task::TargetSize) => self.task_target_size(),
            Some(Task::Normalize) => self.task_normalize(map),
            Some(Task::ActiveArrays) => self.task_active_arrays(map),
            Some(Task::AddToGrid) => self.task_add_to_grid(),
            Some(Task::BeginSearch) => self.task_begin_search(),
            Some(Task::FetchFromGrid) => self.task_fetch_from_grid(),
            Some(Task::NextInDir(dir)) => self.task_next_in_dir(dir),
        }
    }

    fn task_target_size(&mut self) {
        let scale = self.last_target.max_axis().max(1);
        let base_px = self.base_jump_px;
        let deviation_px = base_px * DEVIATION_RADIUS_MULT;
        let to_norm = |px: f64| (px * f64::from(NORMALIZED_MAX) / f64::from(scale)) as i32;
        self.base_jump = to_norm(base_px);
        let deviation = to_norm(deviation_px);
        self.max_jump = self.base_jump + deviation;
        self.max_jump_sq = (i64::from(self.max_jump) * i64::from(self.max_jump))
            .min(i64::from(u32::MAX)) as u32;
        self.max_deviation_sq =
            (i64::from(deviation) * i64::from(deviation)).min(i64::from(u32::MAX)) as u32;

        // Everything must renormalize against the new scale.
        self.to_normalize.clear();
        self.to_normalize.set_first(self.points.len());
        self.to_normalize.reset(0);
        self.to_normalize.reset(HOTSPOT_LAST_CURSOR_POS.index());
        self.current_task = None;
    }

    fn task_normalize(&mut self, map: &InputMap) {
        match self.to_normalize.first_set() {
            Some(id) if id < self.points.len() => {
                let hotspot = map.hotspots.hotspot(HotspotId(id as u16));
                let pos = hotspot.resolve(self.last_target);
                let scale = self.last_target.max_axis();
                if scale > 0 {
                    self.points[id].x = normalize(pos.x, scale);
                    self.points[id].y = normalize(pos.y, scale);
                }
                self.to_normalize.reset(id);
                trace!("normalized hotspot {id} to {}x{}", self.points[id].x, self.points[id].y);
            }
            _ => self.current_task = None,
        }
    }

    fn task_active_arrays(&mut self, map: &InputMap) {
        let count = map.hotspots.array_count();
        while self.progress < count {
            let array_idx = self.progress;
            self.progress += 1;
            let requested = self.requested_arrays.test(array_idx);
            let active = self.active_arrays.test(array_idx);
            if requested == active {
                continue;
            }
            let Some(array) = map.hotspots.array(array_idx) else {
                continue;
            };
            let first = if array.has_anchor {
                array.anchor_idx as usize
            } else {
                array.anchor_idx as usize + 1
            };
            let last = array.anchor_idx as usize + array.size as usize;
            for id in first..=last {
                if let Some(point) = self.points.get_mut(id) {
                    point.enabled = requested;
                }
            }
            self.active_arrays.assign(array_idx, requested);
            self.new_tasks.set(Task::AddToGrid.index());
            self.post_search_tasks();
            return;
        }
        self.current_task = None;
    }

    fn task_add_to_grid(&mut self) {
        if self.progress == 0 {
            for cell in &mut self.grid {
                cell.clear();
            }
        }
        while self.progress < self.points.len() {
            let id = self.progress;
            self.progress += 1;
            if !self.points[id].enabled {
                continue;
            }
            let gx = usize::from(self.points[id].x) >> GRID_SHIFT;
            let gy = usize::from(self.points[id].y) >> GRID_SHIFT;
            self.grid[gy * GRID_SIZE + gx].push(id as u16);
            return;
        }
        self.current_task = None;
    }

    fn task_begin_search(&mut self) {
        if self.progress == 0 {
            // Restarts every time the cursor moves, so the first step is as
            // small as possible.
            self.candidates.clear();
            self.fetch_cells.clear();
            self.next_in_dir = [0; 8];
            self.progress += 1;
            return;
        }
        let clamp_norm = |v: i32| v.clamp(0, NORMALIZED_MAX);
        let min_gx = (clamp_norm(self.norm_cursor.0 - self.max_jump) as usize) >> GRID_SHIFT;
        let min_gy = (clamp_norm(self.norm_cursor.1 - self.max_jump) as usize) >> GRID_SHIFT;
        let max_gx = (clamp_norm(self.norm_cursor.0 + self.max_jump) as usize) >> GRID_SHIFT;
        let max_gy = (clamp_norm(self.norm_cursor.1 + self.max_jump) as usize) >> GRID_SHIFT;
        for gx in min_gx..=max_gx {
            for gy in min_gy..=max_gy {
                self.fetch_cells.push((gx, gy));
            }
        }
        self.current_task = None;
        self.new_tasks.set(Task::FetchFromGrid.index());
    }

    fn task_fetch_from_grid(&mut self) {
        if self.progress >= self.fetch_cells.len() {
            self.current_task = None;
            return;
        }
        let (gx, gy) = self.fetch_cells[self.progress];
        let min_jump_sq = (MIN_JUMP_DIST * MIN_JUMP_DIST) as u32;
        for &id in &self.grid[gy * GRID_SIZE + gx] {
            let point = self.points[usize::from(id)];
            let dx = (i32::from(point.x) - self.norm_cursor.0).unsigned_abs();
            let dy = (i32::from(point.y) - self.norm_cursor.1).unsigned_abs();
            let dist_sq = dx * dx + dy * dy;
            if dist_sq >= min_jump_sq && dist_sq < self.max_jump_sq {
                self.candidates.push(id);
            }
        }
        self.progress += 1;
        if self.progress >= self.fetch_cells.len() {
            self.current_task = None;
        }
    }

    fn task_next_in_dir(&mut self, dir: Dir8) {
        if self.progress == 0 {
            self.best_penalty = u32::MAX;
        }
        while self.progress < self.candidates.len() {
            let id = self.candidates[self.progress];
            self.progress += 1;
            let point = self.points[usize::from(id)];
            let dx = i32::from(point.x) - self.norm_cursor.0;
            let dy = i32::from(point.y) - self.norm_cursor.1;

            let in_allowed_dir = match dir {
                Dir8::Left => dx < 0,
                Dir8::Right => dx > 0,
                Dir8::Up => dy < 0,
                Dir8::Down => dy > 0,
                Dir8::UpLeft => dx < 0 && dy < 0,
                Dir8::UpRight => dx > 0 && dy < 0,
                Dir8::DownLeft => dx < 0 && dy > 0,
                Dir8::DownRight => dx > 0 && dy > 0,
            };
            if !in_allowed_dir {
                continue;
            }

            // Chess-board distances: a 10x10 diagonal step counts as 10,
            // not 14, so diagonals compete fairly with cardinals.
            let dir_dist = match dir {
                Dir8::Left => -dx,
                Dir8::Right => dx,
                Dir8::Up => -dy,
                Dir8::Down => dy,
                Dir8::UpLeft => (-dx - dy) / 2,
                Dir8::UpRight => (dx - dy) / 2,
                Dir8::DownLeft => (-dx + dy) / 2,
                Dir8::DownRight => (dx + dy) / 2,
            };
            if dir_dist <= 0 {
                continue;
            }
            let perp_dist = match dir {
                Dir8::Left | Dir8::Right => dy.abs(),
                Dir8::Up | Dir8::Down => dx.abs(),
                Dir8::UpLeft => (dx - dy).abs() / 2,
                Dir8::UpRight => (dx + dy).abs() / 2,
                Dir8::DownLeft => (-dx - dy).abs() / 2,
                Dir8::DownRight => (dy - dx).abs() / 2,
            };

            // Straight-line candidates always beat wide ones: their penalty
            // is bare distance, wide penalties start at max_jump.
            if perp_dist <= MAX_PERP_FOR_STRAIGHT {
                if (dir_dist as u32) < self.best_penalty {
                    self.next_in_dir[dir.index()] = id;
                    self.best_penalty = dir_dist as u32;
                }
                continue;
            }

            let off_dir = f64::from(dir_dist - self.base_jump);
            let off_perp = f64::from(perp_dist) * PERP_PENALTY_MULT;
            let dist_sq_from_base = (off_dir * off_dir + off_perp * off_perp) as u32;
            if dist_sq_from_base > self.max_deviation_sq {
                continue;
            }
            let penalty = self.max_jump as u32 + dist_sq_from_base;
            if penalty < self.best_penalty {
                self.next_in_dir[dir.index()] = id;
                self.best_penalty = penalty;
            }
            // Wide-bucket work is the expensive part; yield after one.
            return;
        }
        self.current_task = None;
    }
}
