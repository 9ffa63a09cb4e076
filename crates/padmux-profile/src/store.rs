//! The in-memory section/property store.

use rustc_hash::FxHashMap;
use std::path::Path;
use tracing::warn;

use crate::ProfileError;
use crate::ini;

/// One profile property.
///
/// `value` is what the getters return (post variable expansion). `pattern`
/// is the raw text before expansion. `file_value` is what was last persisted
/// to disk; [`Profile::save_changes_to_file`] flushes only properties whose
/// `value` differs from it and that were marked savable.
#[derive(Debug, Clone, Default)]
pub struct Property {
    pub value: String,
    pub pattern: String,
    pub file_value: String,
    pub savable: bool,
}

/// A named section: insertion-ordered properties with case-insensitive keys.
#[derive(Debug, Clone, Default)]
pub struct Section {
    pub name: String,
    props: Vec<(String, Property)>,
    index: FxHashMap<String, usize>,
}

impl Section {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            props: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    /// Looks up a property by case-insensitive key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Property> {
        self.index
            .get(&key.to_ascii_lowercase())
            .map(|&i| &self.props[i].1)
    }

    fn get_mut_or_add(&mut self, key: &str) -> &mut Property {
        let lower = key.to_ascii_lowercase();
        let idx = match self.index.get(&lower) {
            Some(&i) => i,
            None => {
                self.props.push((key.to_string(), Property::default()));
                let i = self.props.len() - 1;
                self.index.insert(lower, i);
                i
            }
        };
        &mut self.props[idx].1
    }

    /// Iterates `(key, property)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Property)> {
        self.props.iter().map(|(k, p)| (k.as_str(), p))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.props.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }
}

/// Map of section name to the set of property keys changed since the last
/// [`Profile::clear_changed_sections`].
pub type ChangedSections = FxHashMap<String, Vec<String>>;

/// The whole profile: sections in insertion order plus the variable table.
#[derive(Debug, Default)]
pub struct Profile {
    sections: Vec<Section>,
    index: FxHashMap<String, usize>,
    variables: Vec<(String, String)>,
    changed: ChangedSections,
}

impl Profile {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses profile text, replacing current contents.
    ///
    /// # Errors
    /// Returns [`ProfileError::Syntax`] on a malformed line.
    pub fn load_from_str(&mut self, text: &str) -> Result<(), ProfileError> {
        *self = Self::default();
        ini::parse_into(self, text)?;
        self.load_variable_section();
        self.expand_all();
        Ok(())
    }

    /// Reads and parses a profile file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(&mut self, path: &Path) -> Result<(), ProfileError> {
        let text = std::fs::read_to_string(path).map_err(ProfileError::Read)?;
        self.load_from_str(&text)
    }

    /// Section index by case-insensitive name, if present.
    #[must_use]
    pub fn section_id(&self, name: &str) -> Option<usize> {
        self.index.get(&name.to_ascii_lowercase()).copied()
    }

    #[must_use]
    pub fn section(&self, id: usize) -> Option<&Section> {
        self.sections.get(id)
    }

    #[must_use]
    pub fn section_by_name(&self, name: &str) -> Option<&Section> {
        self.section_id(name).map(|i| &self.sections[i])
    }

    #[must_use]
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Indices of sections whose name starts with `prefix` (case-insensitive),
    /// in insertion order.
    #[must_use]
    pub fn sections_with_prefix(&self, prefix: &str) -> Vec<usize> {
        let prefix = prefix.to_ascii_lowercase();
        self.sections
            .iter()
            .enumerate()
            .filter(|(_, s)| s.name.to_ascii_lowercase().starts_with(&prefix))
            .map(|(i, _)| i)
            .collect()
    }

    /// The expanded string value of a property, or `default` when absent.
    #[must_use]
    pub fn get_str(&self, section: &str, key: &str, default: &str) -> String {
        self.section_by_name(section)
            .and_then(|s| s.get(key))
            .map_or_else(|| default.to_string(), |p| p.value.clone())
    }

    #[must_use]
    pub fn get_int(&self, section: &str, key: &str, default: i32) -> i32 {
        self.section_by_name(section)
            .and_then(|s| s.get(key))
            .and_then(|p| p.value.trim().parse().ok())
            .unwrap_or(default)
    }

    #[must_use]
    pub fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        let v = self.get_str(section, key, "");
        match v.trim().to_ascii_lowercase().as_str() {
            "" => default,
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        }
    }

    #[must_use]
    pub fn get_float(&self, section: &str, key: &str, default: f64) -> f64 {
        self.section_by_name(section)
            .and_then(|s| s.get(key))
            .and_then(|p| p.value.trim().parse().ok())
            .unwrap_or(default)
    }

    /// Sets a property value, recording it in the changed-sections map.
    ///
    /// A no-op when the value matches the current one. With `save_to_file`
    /// false the new value applies in memory but will never be flushed.
    pub fn set_str(&mut self, section: &str, key: &str, value: &str, save_to_file: bool) {
        let sid = self.get_or_add_section(section);
        let expanded = expand(value, &self.variables);
        let prop = self.sections[sid].get_mut_or_add(key);
        if prop.value == expanded && prop.pattern == value {
            return;
        }
        prop.pattern = value.to_string();
        prop.value = expanded;
        prop.savable = prop.savable || save_to_file;
        let section_name = self.sections[sid].name.clone();
        let keys = self.changed.entry(section_name).or_default();
        if !keys.iter().any(|k| k.eq_ignore_ascii_case(key)) {
            keys.push(key.to_string());
        }
    }

    /// Sets a property only when it is currently missing or empty.
    pub fn set_new_str(&mut self, section: &str, key: &str, value: &str) {
        let existing = self
            .section_by_name(section)
            .and_then(|s| s.get(key))
            .map(|p| p.value.clone());
        if existing.as_deref().is_none_or(str::is_empty) {
            self.set_str(section, key, value, true);
        }
    }

    /// Internal: inserts a property exactly as read from a file.
    pub(crate) fn insert_from_file(&mut self, section: &str, key: &str, raw: &str) {
        let sid = self.get_or_add_section(section);
        if self.sections[sid].get(key).is_some() {
            warn!(
                "duplicate property [{}] {} - keeping the later value",
                section, key
            );
        }
        let prop = self.sections[sid].get_mut_or_add(key);
        prop.pattern = raw.to_string();
        prop.file_value = raw.to_string();
        prop.savable = true;
        // Expanded after all sections load, once variables are known.
        prop.value = raw.to_string();
    }

    fn get_or_add_section(&mut self, name: &str) -> usize {
        let lower = name.to_ascii_lowercase();
        match self.index.get(&lower) {
            Some(&i) => i,
            None => {
                self.sections.push(Section::new(name));
                let i = self.sections.len() - 1;
                self.index.insert(lower, i);
                i
            }
        }
    }

    // ── Variables ───────────────────────────────────────────────────

    fn load_variable_section(&mut self) {
        if let Some(sec) = self.section_by_name("Variables") {
            self.variables = sec
                .iter()
                .map(|(k, p)| (k.to_string(), p.pattern.clone()))
                .collect();
        }
    }

    /// ID of a variable by case-insensitive name, if declared.
    #[must_use]
    pub fn variable_id(&self, name: &str) -> Option<usize> {
        self.variables
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))
    }

    #[must_use]
    pub fn variable_name(&self, id: usize) -> Option<&str> {
        self.variables.get(id).map(|(n, _)| n.as_str())
    }

    #[must_use]
    pub fn variable_value(&self, id: usize) -> Option<&str> {
        self.variables.get(id).map(|(_, v)| v.as_str())
    }

    /// Changes (or declares) a variable and re-expands every property whose
    /// pattern references a variable.
    ///
    /// Temporary assignments apply in memory only and are not recorded in the
    /// changed-sections map.
    pub fn set_variable(&mut self, name: &str, value: &str, temporary: bool) {
        match self.variable_id(name) {
            Some(id) => self.variables[id].1 = value.to_string(),
            None => self.variables.push((name.to_string(), value.to_string())),
        }
        if !temporary {
            self.set_str("Variables", name, value, true);
        }
        self.expand_all();
    }

    /// Expands `$Name$` references in an arbitrary string.
    #[must_use]
    pub fn expand_vars(&self, text: &str) -> String {
        expand(text, &self.variables)
    }

    fn expand_all(&mut self) {
        let vars = std::mem::take(&mut self.variables);
        for section in &mut self.sections {
            for (_, prop) in &mut section.props {
                if prop.pattern.contains('$') {
                    prop.value = expand(&prop.pattern, &vars);
                } else {
                    prop.value = prop.pattern.clone();
                }
            }
        }
        self.variables = vars;
    }

    // ── Change tracking ─────────────────────────────────────────────

    /// Properties changed via [`set_str`](Self::set_str) since the last
    /// [`clear_changed_sections`](Self::clear_changed_sections).
    #[must_use]
    pub fn changed_sections(&self) -> &ChangedSections {
        &self.changed
    }

    pub fn clear_changed_sections(&mut self) {
        self.changed.clear();
    }

    /// Flushes savable, changed properties to the given path as INI text.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn save_changes_to_file(&mut self, path: &Path) -> Result<(), ProfileError> {
        let mut dirty = false;
        for section in &self.sections {
            for (_, prop) in &section.props {
                if prop.savable && prop.file_value != prop.pattern {
                    dirty = true;
                }
            }
        }
        if !dirty {
            return Ok(());
        }
        let text = ini::serialize(self);
        std::fs::write(path, text).map_err(ProfileError::Write)?;
        for section in &mut self.sections {
            for (_, prop) in &mut section.props {
                if prop.savable {
                    prop.file_value = prop.pattern.clone();
                }
            }
        }
        Ok(())
    }

    pub(crate) fn sections(&self) -> &[Section] {
        &self.sections
    }
}

/// Replaces `$Name$` references with variable values. Unknown names expand to
/// the empty string with a warning. A literal `$` with no closing `$` is left
/// alone.
fn expand(text: &str, variables: &[(String, String)]) -> String {
    if !text.contains('$') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('$') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('$') {
            Some(end) => {
                let name = &after[..end];
                match variables
                    .iter()
                    .find(|(n, _)| n.eq_ignore_ascii_case(name))
                {
                    Some((_, value)) => out.push_str(value),
                    None => warn!("unknown variable reference ${name}$"),
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push('$');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
[Variables]
Game = EverQuest

[System]
MaxKeyQueueTime = 1500
UseScanCodes = true

[Menu.Main]
Title = $Game$ Menu
Style = List
";

    fn sample_profile() -> Profile {
        let mut p = Profile::new();
        p.load_from_str(SAMPLE).expect("sample parses");
        p
    }

    #[test]
    fn test_typed_getters() {
        let p = sample_profile();
        assert_eq!(p.get_int("System", "MaxKeyQueueTime", 0), 1500);
        assert!(p.get_bool("System", "UseScanCodes", false));
        assert_eq!(p.get_str("System", "Missing", "x"), "x");
        assert_eq!(p.get_int("System", "UseScanCodes", 7), 7);
    }

    #[test]
    fn test_keys_are_case_insensitive() {
        let p = sample_profile();
        assert_eq!(p.get_int("system", "maxkeyqueuetime", 0), 1500);
        assert!(p.section_id("MENU.MAIN").is_some());
    }

    #[test]
    fn test_variable_expansion_on_load() {
        let p = sample_profile();
        assert_eq!(p.get_str("Menu.Main", "Title", ""), "EverQuest Menu");
    }

    #[test]
    fn test_variable_change_reexpands() {
        let mut p = sample_profile();
        p.set_variable("Game", "LOTRO", true);
        assert_eq!(p.get_str("Menu.Main", "Title", ""), "LOTRO Menu");
    }

    #[test]
    fn test_unknown_variable_expands_empty() {
        let mut p = Profile::new();
        p.load_from_str("[A]\nK = pre $Nope$ post\n").unwrap();
        assert_eq!(p.get_str("A", "K", ""), "pre  post");
    }

    #[test]
    fn test_set_str_tracks_changes() {
        let mut p = sample_profile();
        p.set_str("System", "MaxKeyQueueTime", "2000", true);
        let changed = p.changed_sections();
        assert_eq!(changed.len(), 1);
        assert_eq!(changed["System"], vec!["MaxKeyQueueTime".to_string()]);
        p.clear_changed_sections();
        assert!(p.changed_sections().is_empty());
    }

    #[test]
    fn test_set_str_same_value_is_noop() {
        let mut p = sample_profile();
        p.set_str("System", "MaxKeyQueueTime", "1500", true);
        assert!(p.changed_sections().is_empty());
    }

    #[test]
    fn test_set_new_str_only_fills_gaps() {
        let mut p = sample_profile();
        p.set_new_str("System", "MaxKeyQueueTime", "9999");
        assert_eq!(p.get_int("System", "MaxKeyQueueTime", 0), 1500);
        p.set_new_str("System", "Fresh", "7");
        assert_eq!(p.get_int("System", "Fresh", 0), 7);
    }

    #[test]
    fn test_prefix_query_insertion_order() {
        let mut p = Profile::new();
        p.load_from_str("[Menu.B]\nX=1\n[Other]\nX=1\n[Menu.A]\nX=1\n")
            .unwrap();
        let ids = p.sections_with_prefix("Menu.");
        let names: Vec<&str> = ids.iter().map(|&i| p.section(i).unwrap().name.as_str()).collect();
        assert_eq!(names, vec!["Menu.B", "Menu.A"]);
    }

    #[test]
    fn test_save_only_flushes_diffs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.ini");

        let mut p = sample_profile();
        // Nothing changed yet: no file should be produced.
        p.save_changes_to_file(&path).unwrap();
        assert!(!path.exists());

        p.set_str("System", "MaxKeyQueueTime", "250", true);
        p.save_changes_to_file(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("MaxKeyQueueTime = 250"));

        // A memory-only change must never be flushed.
        let mut q = Profile::new();
        q.load_from_str(&text).unwrap();
        q.set_str("System", "Hidden", "1", false);
        let path2 = dir.path().join("profile2.ini");
        q.save_changes_to_file(&path2).unwrap();
        assert!(!path2.exists());
    }

    #[test]
    fn test_duplicate_key_keeps_later_value() {
        let mut p = Profile::new();
        p.load_from_str("[A]\nK = first\nK = second\n").unwrap();
        assert_eq!(p.get_str("A", "K", ""), "second");
    }
}
