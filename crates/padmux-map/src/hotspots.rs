//! Hotspot arrays: contiguous groups of hotspots with a shared anchor,
//! loaded from the `[Hotspots]` profile section.
//!
//! A property key selects an array (`Bar`), a single element (`Bar5`), or a
//! range (`Bar3-7`). Values are `X[,Y][,WxH][*scale]` where each coordinate
//! is `A%+B` (anchor percent plus pixel offset) or a bare offset. Ranges
//! derive positions from the anchor (or the previous element) plus a stored
//! delta scaled by the array's offset scale. An empty value invalidates a
//! range, shrinking the array until the property is restored.

use padmux_core::{BitSet, Coord, FIRST_USER_HOTSPOT, Hotspot, HotspotId};

use crate::error_log::ErrorLog;

/// One declared index range inside an array.
#[derive(Debug, Clone, Default)]
pub struct HotspotRange {
    /// First covered element (1-based within the array).
    pub first: u16,
    pub count: u16,
    pub x_offset: i16,
    pub y_offset: i16,
    /// Width/height exactly as specified (0 = inherit the anchor's).
    pub width: u16,
    pub height: u16,
    pub own_x_anchor: bool,
    pub own_y_anchor: bool,
    /// Each element offsets from the previous one instead of the anchor.
    pub offset_from_prev: bool,
    /// Invalidated by an empty property value; restorable later.
    pub removed: bool,
}

impl HotspotRange {
    #[must_use]
    pub fn last(&self) -> u16 {
        self.first + self.count - 1
    }
}

/// A named, contiguous block of hotspots.
#[derive(Debug, Clone, Default)]
pub struct HotspotArray {
    pub name: String,
    pub has_anchor: bool,
    /// Global index of the anchor hotspot; element N lives at
    /// `anchor_idx + N`.
    pub anchor_idx: u16,
    /// Current size (last non-invalidated element index).
    pub size: u16,
    pub max_size: u16,
    pub offset_scale: f32,
    pub ranges: Vec<HotspotRange>,
}

impl HotspotArray {
    /// Global hotspot index of element `n` (1-based).
    #[must_use]
    pub fn element(&self, n: u16) -> usize {
        self.anchor_idx as usize + n as usize
    }
}

/// Splits a trailing index or `-range` suffix off a property key.
///
/// Returns `(base, start, end, is_range)`; `end == 0` means the key has no
/// index at all (an anchor property).
#[must_use]
pub fn fetch_range_suffix(name: &str) -> (&str, u16, u16, bool) {
    let bytes = name.as_bytes();
    let digits_end = bytes.len();
    let mut digits_start = digits_end;
    while digits_start > 0 && bytes[digits_start - 1].is_ascii_digit() {
        digits_start -= 1;
    }
    if digits_start == digits_end || digits_start == 0 {
        return (name, 0, 0, false);
    }
    let end: u16 = name[digits_start..].parse().unwrap_or(0);
    if end == 0 {
        return (name, 0, 0, false);
    }
    // Check for "<digits>-" preceding: a full range.
    if bytes[digits_start - 1] == b'-' {
        let mut first_start = digits_start - 1;
        while first_start > 0 && bytes[first_start - 1].is_ascii_digit() {
            first_start -= 1;
        }
        if first_start < digits_start - 1 && first_start > 0 {
            if let Ok(start) = name[first_start..digits_start - 1].parse::<u16>() {
                if start > 0 && start <= end {
                    return (&name[..first_start], start, end, true);
                }
            }
        }
    }
    (&name[..digits_start], end, end, false)
}

/// Parses one coordinate: `A%`, `A%+B`, `A%-B`, or a bare pixel offset.
/// Advances `pos` past what was consumed.
fn parse_coord(text: &str, pos: &mut usize) -> Option<Coord> {
    let (first, consumed) = parse_number(&text[*pos..])?;
    *pos += consumed;
    let bytes = text.as_bytes();
    if *pos < text.len() && bytes[*pos] == b'%' {
        *pos += 1;
        let anchor = ((first * 65536.0 / 100.0).round().clamp(0.0, 65535.0)) as u16;
        let mut offset = 0.0;
        if *pos < text.len() && (bytes[*pos] == b'+' || bytes[*pos] == b'-') {
            let negative = bytes[*pos] == b'-';
            *pos += 1;
            let (value, consumed) = parse_number(&text[*pos..])?;
            *pos += consumed;
            offset = if negative { -value } else { value };
        }
        Some(Coord::new(
            anchor,
            offset.round().clamp(-32768.0, 32767.0) as i16,
        ))
    } else {
        Some(Coord::new(0, first.round().clamp(-32768.0, 32767.0) as i16))
    }
}

/// Parses an unsigned decimal number with optional fraction.
fn parse_number(text: &str) -> Option<(f64, usize)> {
    let mut end = 0;
    let bytes = text.as_bytes();
    let mut seen_dot = false;
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => end += 1,
            b'.' if !seen_dot => {
                seen_dot = true;
                end += 1;
            }
            _ => break,
        }
    }
    if end == 0 {
        return None;
    }
    text[..end].parse().ok().map(|v| (v, end))
}

/// A fully parsed hotspot description value.
#[derive(Debug, Default)]
struct ParsedDesc {
    hotspot: Hotspot,
    offset_scale: f64,
}

fn parse_desc(text: &str) -> Option<ParsedDesc> {
    // Whitespace is insignificant anywhere in a description.
    let text: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let text = text.as_str();
    let bytes = text.as_bytes();
    let mut out = ParsedDesc::default();
    let mut pos = 0;

    out.hotspot.x = parse_coord(text, &mut pos)?;
    if pos < text.len() && matches!(bytes[pos], b',' | b'x' | b'X') {
        pos += 1;
        out.hotspot.y = parse_coord(text, &mut pos)?;
    }
    if pos < text.len() && bytes[pos] == b',' {
        pos += 1;
        let (w, consumed) = parse_number(&text[pos..])?;
        pos += consumed;
        out.hotspot.w = (w.round().clamp(0.0, 65535.0)) as u16;
        if pos < text.len() && matches!(bytes[pos], b',' | b'x' | b'X') {
            pos += 1;
            let (h, consumed) = parse_number(&text[pos..])?;
            pos += consumed;
            out.hotspot.h = (h.round().clamp(0.0, 65535.0)) as u16;
        }
    }
    if pos < text.len() && bytes[pos] == b'*' {
        pos += 1;
        let (scale, consumed) = parse_number(&text[pos..])?;
        pos += consumed;
        out.offset_scale = scale;
    }
    if pos != text.len() {
        return None;
    }
    Some(out)
}

/// All hotspots plus the arrays that structure them.
#[derive(Debug, Default)]
pub struct HotspotStore {
    hotspots: Vec<Hotspot>,
    arrays: Vec<HotspotArray>,
    /// Hotspots whose position changed since last consumed.
    pub changed: BitSet,
    /// Hotspots currently invalidated (queried as zero).
    pub invalidated: BitSet,
    /// Set when any array's size changed.
    pub array_resized: bool,
}

impl HotspotStore {
    /// An empty store with the reserved special hotspot slots.
    #[must_use]
    pub fn new() -> Self {
        Self {
            hotspots: vec![Hotspot::default(); FIRST_USER_HOTSPOT],
            ..Self::default()
        }
    }

    #[must_use]
    pub fn hotspot_count(&self) -> usize {
        self.hotspots.len()
    }

    #[must_use]
    pub fn array_count(&self) -> usize {
        self.arrays.len()
    }

    #[must_use]
    pub fn array(&self, idx: usize) -> Option<&HotspotArray> {
        self.arrays.get(idx)
    }

    /// The hotspot's position, or the zero hotspot when invalidated.
    #[must_use]
    pub fn hotspot(&self, id: HotspotId) -> Hotspot {
        if self.invalidated.test(id.index()) {
            return Hotspot::default();
        }
        self.hotspots.get(id.index()).copied().unwrap_or_default()
    }

    /// Writes one of the special slots (cursor tracking).
    pub fn set_special_hotspot(&mut self, id: HotspotId, hotspot: Hotspot) {
        if id.index() < FIRST_USER_HOTSPOT {
            self.hotspots[id.index()] = hotspot;
        }
    }

    /// Array index by case-insensitive name.
    #[must_use]
    pub fn array_id(&self, name: &str) -> Option<usize> {
        self.arrays
            .iter()
            .position(|a| a.name.eq_ignore_ascii_case(name))
    }

    /// Resolves a hotspot name: an array anchor name, an indexed element
    /// (`Bar5`), or a special name.
    #[must_use]
    pub fn hotspot_id(&self, name: &str) -> Option<HotspotId> {
        match name.to_ascii_lowercase().as_str() {
            "lastcursorpos" => return Some(padmux_core::HOTSPOT_LAST_CURSOR_POS),
            "mouselookstart" => return Some(padmux_core::HOTSPOT_MOUSE_LOOK_START),
            "mousehidden" => return Some(padmux_core::HOTSPOT_MOUSE_HIDDEN),
            _ => {}
        }
        let (base, start, end, is_range) = fetch_range_suffix(name);
        if is_range {
            return None;
        }
        let array = &self.arrays[self.array_id(base)?];
        if end == 0 {
            if array.has_anchor {
                return Some(HotspotId(array.anchor_idx));
            }
            return None;
        }
        if start == 0 || start > array.max_size {
            return None;
        }
        Some(HotspotId(array.element(start) as u16))
    }

    /// First pass: registers the array/range structure for one property key.
    pub fn declare_key(&mut self, key: &str, errors: &mut ErrorLog) {
        let (base, start, end, is_range) = fetch_range_suffix(key);
        let base = base.to_string();
        let array_idx = match self.array_id(&base) {
            Some(i) => i,
            None => {
                self.arrays.push(HotspotArray {
                    name: base.clone(),
                    offset_scale: 1.0,
                    ..HotspotArray::default()
                });
                self.arrays.len() - 1
            }
        };
        let array = &mut self.arrays[array_idx];
        if end == 0 {
            array.has_anchor = true;
            return;
        }

        let new_range = HotspotRange {
            first: start,
            count: end - start + 1,
            offset_from_prev: is_range,
            own_x_anchor: !is_range,
            own_y_anchor: !is_range,
            ..HotspotRange::default()
        };
        let insert_at = array
            .ranges
            .partition_point(|r| r.first < new_range.first);
        if insert_at > 0 && array.ranges[insert_at - 1].last() >= new_range.first {
            errors.push(format!("hotspot '{key}' overlaps another hotspot/range"));
            return;
        }
        if insert_at < array.ranges.len() && new_range.last() >= array.ranges[insert_at].first {
            errors.push(format!("hotspot '{key}' overlaps another hotspot/range"));
            return;
        }
        array.ranges.insert(insert_at, new_range);
        let last = array.ranges.last().expect("just inserted").last();
        array.max_size = last;
        array.size = last;
    }

    /// Second pass: allocates contiguous hotspot slots for every array,
    /// verifying range coverage is gapless from 1.
    pub fn allocate(&mut self, errors: &mut ErrorLog) {
        for array in &mut self.arrays {
            let mut expected = 1u16;
            let mut keep = array.ranges.len();
            for (i, range) in array.ranges.iter().enumerate() {
                if range.first != expected {
                    errors.push(format!(
                        "hotspot array '{}' is missing '{}{}'",
                        array.name, array.name, expected
                    ));
                    array.max_size = expected - 1;
                    array.size = expected - 1;
                    keep = i;
                    break;
                }
                expected = range.last() + 1;
            }
            array.ranges.truncate(keep);

            array.anchor_idx = if array.has_anchor {
                let idx = self.hotspots.len() as u16;
                self.hotspots.push(Hotspot::default());
                idx
            } else {
                (self.hotspots.len() - 1) as u16
            };
            self.hotspots
                .resize(self.hotspots.len() + array.max_size as usize, Hotspot::default());
        }
    }

    /// Applies a `[Hotspots]` property value, recomputing dependents.
    #[allow(clippy::too_many_lines)]
    pub fn apply_property(&mut self, key: &str, value: &str, errors: &mut ErrorLog) {
        let (base, start, end, _is_range) = fetch_range_suffix(key);
        let Some(array_idx) = self.array_id(base) else {
            return;
        };
        let is_anchor = end == 0;

        let is_empty_value = value.trim().is_empty();
        let mut parsed = Hotspot::default();
        let mut offset_scale = 0.0f64;
        if !is_empty_value {
            match parse_desc(value) {
                Some(desc) => {
                    parsed = desc.hotspot;
                    offset_scale = desc.offset_scale;
                    if offset_scale != 0.0
                        && (!is_anchor || self.arrays[array_idx].ranges.is_empty())
                    {
                        errors.push(format!(
                            "hotspot '{key}': only array anchors may specify an offset scale"
                        ));
                        offset_scale = 0.0;
                    }
                }
                None => {
                    errors.push(format!("hotspot '{key}': cannot parse description '{value}'"));
                }
            }
        }

        let array = &mut self.arrays[array_idx];
        let mut scan_from: usize;
        if is_anchor {
            let anchor = array.anchor_idx as usize;
            if self.invalidated.test(anchor) != is_empty_value {
                self.invalidated.assign(anchor, is_empty_value);
                self.changed.set(anchor);
            }
            if self.hotspots[anchor] == parsed
                && (offset_scale == 0.0 || (offset_scale as f32) == array.offset_scale)
            {
                return;
            }
            self.hotspots[anchor] = parsed;
            self.changed.set(anchor);
            if offset_scale != 0.0 {
                array.offset_scale = offset_scale as f32;
            }
            scan_from = 0;
        } else {
            let count = end - start + 1;
            let Some(range_idx) = array
                .ranges
                .iter()
                .position(|r| r.first == start && r.last() == end && r.count == count)
            else {
                return;
            };

            // Record exactly what was specified so inheritance is known,
            // then default the working copy to the anchor's size.
            {
                let range = &mut array.ranges[range_idx];
                range.width = parsed.w;
                range.height = parsed.h;
            }
            if parsed.w == 0 && parsed.h == 0 && !is_empty_value {
                let anchor = &self.hotspots[array.anchor_idx as usize];
                parsed.w = anchor.w;
                parsed.h = anchor.h;
            }

            let (single, offset_from_prev) = {
                let range = &array.ranges[range_idx];
                (range.count == 1, range.offset_from_prev)
            };
            if single && !offset_from_prev {
                let slot = array.element(start);
                if self.invalidated.test(slot) != is_empty_value {
                    self.invalidated.assign(slot, is_empty_value);
                    self.changed.set(slot);
                }
                let range = &mut array.ranges[range_idx];
                range.own_x_anchor = parsed.x.anchor != 0 || !array.has_anchor;
                range.own_y_anchor = parsed.y.anchor != 0 || !array.has_anchor;
                if range.own_x_anchor && range.own_y_anchor && self.hotspots[slot] == parsed {
                    return;
                }
                self.hotspots[slot] = parsed;
                self.changed.set(slot);
            }

            {
                let own_x = array.ranges[range_idx].own_x_anchor;
                let own_y = array.ranges[range_idx].own_y_anchor;
                let range = &mut array.ranges[range_idx];
                range.x_offset = if own_x { 0 } else { parsed.x.offset };
                range.y_offset = if own_y { 0 } else { parsed.y.offset };
            }
            scan_from = if array.ranges[range_idx].own_x_anchor
                && array.ranges[range_idx].own_y_anchor
            {
                range_idx + 1
            } else {
                range_idx
            };

            // An empty value removes the range, shortening the array until
            // the property is written back with a real value.
            if is_empty_value {
                array.ranges[range_idx].removed = true;
            }
            if array.ranges[range_idx].removed {
                if !is_empty_value {
                    array.ranges[range_idx].removed = false;
                }
                array.size = 0;
                for range in &array.ranges {
                    if range.removed {
                        break;
                    }
                    array.size = range.last();
                }
                self.array_resized = true;
                // Elements up to the new size become valid again; the rest
                // are invalidated.
                for n in 1..=array.max_size {
                    let slot = array.element(n);
                    let should_invalidate = n > array.size;
                    if self.invalidated.test(slot) != should_invalidate {
                        self.invalidated.assign(slot, should_invalidate);
                        self.changed.set(slot);
                    }
                }
            }
        }

        // Walk ranges in order, recomputing every element that derives its
        // position from the anchor or its predecessor.
        let mut range_affected = true;
        while scan_from < array.ranges.len() && (range_affected || is_anchor) {
            let range = array.ranges[scan_from].clone();
            if !range_affected && range.offset_from_prev {
                range_affected = false;
                scan_from += 1;
                continue;
            }
            range_affected = false;
            if range.own_x_anchor && range.own_y_anchor && range.width != 0 && range.height != 0 {
                scan_from += 1;
                continue;
            }
            for n in range.first..=range.last() {
                let slot = array.element(n);
                let mut new_value = Hotspot::default();
                if !self.invalidated.test(slot) {
                    let base_slot = if range.offset_from_prev {
                        slot - 1
                    } else if array.has_anchor {
                        array.anchor_idx as usize
                    } else {
                        0
                    };
                    let base_spot = self.hotspots[base_slot];
                    if range.own_x_anchor {
                        new_value.x = self.hotspots[slot].x;
                    } else {
                        new_value.x = Coord::new(
                            base_spot.x.anchor,
                            (f64::from(base_spot.x.offset)
                                + f64::from(range.x_offset) * f64::from(array.offset_scale))
                            .round()
                            .clamp(-32768.0, 32767.0) as i16,
                        );
                    }
                    if range.own_y_anchor {
                        new_value.y = self.hotspots[slot].y;
                    } else {
                        new_value.y = Coord::new(
                            base_spot.y.anchor,
                            (f64::from(base_spot.y.offset)
                                + f64::from(range.y_offset) * f64::from(array.offset_scale))
                            .round()
                            .clamp(-32768.0, 32767.0) as i16,
                        );
                    }
                    new_value.w = if range.width != 0 {
                        range.width
                    } else {
                        base_spot.w
                    };
                    new_value.h = if range.height != 0 {
                        range.height
                    } else {
                        base_spot.h
                    };
                }
                if new_value != self.hotspots[slot] {
                    range_affected = true;
                    self.hotspots[slot] = new_value;
                    self.changed.set(slot);
                }
            }
            scan_from += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(props: &[(&str, &str)]) -> (HotspotStore, ErrorLog) {
        let mut store = HotspotStore::new();
        let mut errors = ErrorLog::new();
        for (key, _) in props {
            store.declare_key(key, &mut errors);
        }
        store.allocate(&mut errors);
        for (key, value) in props {
            store.apply_property(key, value, &mut errors);
        }
        (store, errors)
    }

    #[test]
    fn test_range_suffix_forms() {
        assert_eq!(fetch_range_suffix("Bar"), ("Bar", 0, 0, false));
        assert_eq!(fetch_range_suffix("Bar5"), ("Bar", 5, 5, false));
        assert_eq!(fetch_range_suffix("Bar3-7"), ("Bar", 3, 7, true));
        // A lone dash without leading digits is not a range.
        assert_eq!(fetch_range_suffix("Bar-7"), ("Bar-", 7, 7, false));
    }

    #[test]
    fn test_anchor_and_single_element() {
        let (store, errors) = store_with(&[
            ("Slot", "50%+0, 50%+0, 32x32"),
            ("Slot1", "10%+5, 20%-3"),
        ]);
        assert!(errors.is_empty());
        let anchor = store.hotspot_id("Slot").unwrap();
        let one = store.hotspot_id("Slot1").unwrap();
        let a = store.hotspot(anchor);
        assert_eq!(a.x.anchor, 0x8000);
        assert_eq!((a.w, a.h), (32, 32));
        let h = store.hotspot(one);
        assert_eq!(h.x.offset, 5);
        assert_eq!(h.y.offset, -3);
        // Size defaults to the anchor's.
        assert_eq!((h.w, h.h), (32, 32));
    }

    #[test]
    fn test_range_offsets_chain_from_anchor() {
        let (store, errors) = store_with(&[
            ("Bar", "50%+0, 10%+0, 24x24"),
            ("Bar1-3", "30, 0"),
        ]);
        assert!(errors.is_empty());
        // Each element adds 30px in X over the previous one.
        let h1 = store.hotspot(store.hotspot_id("Bar1").unwrap());
        let h2 = store.hotspot(store.hotspot_id("Bar2").unwrap());
        let h3 = store.hotspot(store.hotspot_id("Bar3").unwrap());
        assert_eq!(h1.x.offset, 30);
        assert_eq!(h2.x.offset, 60);
        assert_eq!(h3.x.offset, 90);
        assert_eq!(h1.x.anchor, 0x8000);
        assert_eq!(h3.w, 24);
    }

    #[test]
    fn test_offset_scale_multiplies_deltas() {
        let (store, errors) = store_with(&[
            ("Bar", "0%+0, 0%+0, 8x8 *2"),
            ("Bar1-2", "10, 4"),
        ]);
        assert!(errors.is_empty());
        let h1 = store.hotspot(store.hotspot_id("Bar1").unwrap());
        let h2 = store.hotspot(store.hotspot_id("Bar2").unwrap());
        assert_eq!(h1.x.offset, 20);
        assert_eq!(h2.x.offset, 40);
        assert_eq!(h1.y.offset, 8);
    }

    #[test]
    fn test_missing_range_truncates_array() {
        let mut store = HotspotStore::new();
        let mut errors = ErrorLog::new();
        store.declare_key("Gap", &mut errors);
        store.declare_key("Gap1-2", &mut errors);
        store.declare_key("Gap5-6", &mut errors);
        store.allocate(&mut errors);
        assert!(!errors.is_empty());
        let id = store.array_id("Gap").unwrap();
        assert_eq!(store.array(id).unwrap().max_size, 2);
    }

    #[test]
    fn test_overlapping_range_rejected() {
        let mut store = HotspotStore::new();
        let mut errors = ErrorLog::new();
        store.declare_key("Lap1-4", &mut errors);
        store.declare_key("Lap3-6", &mut errors);
        assert!(!errors.is_empty());
        let id = store.array_id("Lap").unwrap();
        assert_eq!(store.array(id).unwrap().ranges.len(), 1);
    }

    #[test]
    fn test_range_invalidation_and_restore() {
        let props: [(&str, &str); 3] = [
            ("Bar", "50%+0, 50%+0, 16x16"),
            ("Bar1-4", "20, 0"),
            ("Bar5", "50%+0, 50%+0"),
        ];
        let (mut store, mut errors) = store_with(&props);
        let id = store.array_id("Bar").unwrap();
        assert_eq!(store.array(id).unwrap().size, 5);

        // Emptying Bar5 shrinks the array to 4.
        store.apply_property("Bar5", "", &mut errors);
        assert_eq!(store.array(id).unwrap().size, 4);
        assert!(store.array_resized);
        let b5 = store.hotspot_id("Bar5").unwrap();
        assert_eq!(store.hotspot(b5), Hotspot::default());

        // Restoring the property restores the size.
        store.apply_property("Bar5", "50%+0, 50%+0", &mut errors);
        assert_eq!(store.array(id).unwrap().size, 5);
        assert_ne!(store.hotspot(b5), Hotspot::default());
    }

    #[test]
    fn test_mid_range_invalidation_shrinks_to_prefix() {
        let (mut store, mut errors) = store_with(&[
            ("Bar", "50%+0, 50%+0, 16x16"),
            ("Bar1-2", "20, 0"),
            ("Bar3", "10%+0, 10%+0"),
            ("Bar4-6", "0, 20"),
        ]);
        let id = store.array_id("Bar").unwrap();
        assert_eq!(store.array(id).unwrap().size, 6);
        store.apply_property("Bar3", "", &mut errors);
        // Size drops to the last range before the removed one.
        assert_eq!(store.array(id).unwrap().size, 2);
        // Elements past the cut read as zero.
        let b5 = store.hotspot_id("Bar5").unwrap();
        assert_eq!(store.hotspot(b5), Hotspot::default());
    }

    #[test]
    fn test_anchor_move_recomputes_dependents() {
        let (mut store, mut errors) = store_with(&[
            ("Bar", "0%+100, 0%+100, 8x8"),
            ("Bar1-2", "10, 0"),
        ]);
        store.changed.clear();
        store.apply_property("Bar", "0%+200, 0%+100, 8x8", &mut errors);
        let h2 = store.hotspot(store.hotspot_id("Bar2").unwrap());
        assert_eq!(h2.x.offset, 220);
        // Both elements were marked changed.
        assert!(store.changed.count() >= 2);
    }

    #[test]
    fn test_special_names_resolve() {
        let store = HotspotStore::new();
        assert_eq!(
            store.hotspot_id("LastCursorPos"),
            Some(padmux_core::HOTSPOT_LAST_CURSOR_POS)
        );
        assert!(store.hotspot_id("NoSuchSpot").is_none());
    }
}
