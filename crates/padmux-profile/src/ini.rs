//! INI reader/writer for the profile wire format.
//!
//! Grammar: `[Section]` headers, `Key = Value` properties, `;` or `#`
//! comments, blank lines. Keys and values are whitespace-trimmed. Properties
//! before any section header go into an unnamed root section.

use crate::ProfileError;
use crate::store::Profile;

/// Parses `text` into `profile`, preserving section and property order.
pub(crate) fn parse_into(profile: &mut Profile, text: &str) -> Result<(), ProfileError> {
    let mut section = String::new();
    for (line_no, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }
        if let Some(rest) = line.strip_prefix('[') {
            match rest.find(']') {
                Some(end) => {
                    section = rest[..end].trim().to_string();
                    continue;
                }
                None => {
                    return Err(ProfileError::Syntax {
                        line: line_no + 1,
                        text: raw.to_string(),
                    });
                }
            }
        }
        match line.split_once('=') {
            Some((key, value)) => {
                profile.insert_from_file(&section, key.trim(), value.trim());
            }
            None => {
                return Err(ProfileError::Syntax {
                    line: line_no + 1,
                    text: raw.to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Serializes the whole profile back to INI text.
pub(crate) fn serialize(profile: &Profile) -> String {
    let mut out = String::new();
    for section in profile.sections() {
        if section.is_empty() {
            continue;
        }
        if !section.name.is_empty() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push('[');
            out.push_str(&section.name);
            out.push_str("]\n");
        }
        for (key, prop) in section.iter() {
            out.push_str(key);
            out.push_str(" = ");
            out.push_str(&prop.pattern);
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comments_and_blanks_skipped() {
        let mut p = Profile::new();
        p.load_from_str("; comment\n\n# another\n[S]\nK = v\n").unwrap();
        assert_eq!(p.get_str("S", "K", ""), "v");
    }

    #[test]
    fn test_unterminated_header_is_error() {
        let mut p = Profile::new();
        let err = p.load_from_str("[Broken\n").unwrap_err();
        assert!(matches!(err, ProfileError::Syntax { line: 1, .. }));
    }

    #[test]
    fn test_bare_word_is_error() {
        let mut p = Profile::new();
        let err = p.load_from_str("[S]\nnot a property\n").unwrap_err();
        assert!(matches!(err, ProfileError::Syntax { line: 2, .. }));
    }

    #[test]
    fn test_values_may_contain_equals() {
        let mut p = Profile::new();
        p.load_from_str("[S]\nK = a = b\n").unwrap();
        assert_eq!(p.get_str("S", "K", ""), "a = b");
    }

    #[test]
    fn test_serialize_round_trips() {
        let mut p = Profile::new();
        p.load_from_str("[A]\nOne = 1\nTwo = 2\n[B]\nThree = 3\n").unwrap();
        let text = serialize(&p);
        let mut q = Profile::new();
        q.load_from_str(&text).unwrap();
        assert_eq!(q.get_int("A", "One", 0), 1);
        assert_eq!(q.get_int("A", "Two", 0), 2);
        assert_eq!(q.get_int("B", "Three", 0), 3);
    }
}
