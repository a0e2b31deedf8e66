use crate::warning::Warning;

/// Check a course name against the registrar format: 2-4 characters from
/// `A-Z`, `/` or space, a single space, three digits and an optional
/// trailing capital letter. `"CSCI 301"`, `"CSCI 497A"`, `"M/CS 435"`.
pub fn is_valid_course_name(name: &str) -> bool {
    if !name.is_ascii() {
        return false;
    }
    let bytes = name.as_bytes();

    // Strip the optional suffix letter, then the number must be the last 3 bytes
    let body = match bytes.last() {
        Some(b) if b.is_ascii_uppercase() => &bytes[..bytes.len() - 1],
        _ => bytes,
    };
    if body.len() < 6 {
        return false;
    }
    let (head, digits) = body.split_at(body.len() - 3);
    if !digits.iter().all(u8::is_ascii_digit) {
        return false;
    }

    let Some((&b' ', prefix)) = head.split_last() else {
        return false;
    };
    (2..=4).contains(&prefix.len())
        && prefix
            .iter()
            .all(|b| b.is_ascii_uppercase() || *b == b'/' || *b == b' ')
}

/// Trim, validate and de-duplicate requested course names, keeping the
/// first occurrence order. Invalid names are reported and skipped.
pub fn clean_course_names(names: &[String], warnings: &mut Vec<Warning>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::new();
    for raw in names {
        let name = raw.trim();
        if !is_valid_course_name(name) {
            warnings.push(Warning::InvalidCourseName {
                name: name.to_string(),
            });
            continue;
        }
        if !cleaned.iter().any(|n| n == name) {
            cleaned.push(name.to_string());
        }
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(is_valid_course_name("CSCI 301"));
        assert!(is_valid_course_name("CSCI 497A"));
        assert!(is_valid_course_name("EE 221"));
        assert!(is_valid_course_name("M/CS 435"));
        assert!(is_valid_course_name("C S 101"));
    }

    #[test]
    fn test_invalid_names() {
        assert!(!is_valid_course_name("csci 301"));
        assert!(!is_valid_course_name("CSCI301"));
        assert!(!is_valid_course_name("CSCI 30"));
        assert!(!is_valid_course_name("CSCI 3011"));
        assert!(!is_valid_course_name("C 301"));
        assert!(!is_valid_course_name("COMPS 301"));
        assert!(!is_valid_course_name("CSCI 301ab"));
        assert!(!is_valid_course_name(""));
        assert!(!is_valid_course_name("ÇSCI 301"));
    }

    #[test]
    fn test_clean_course_names_trims_and_dedupes() {
        let mut warnings = Vec::new();
        let names = vec![
            "  CSCI 301 ".to_string(),
            "MATH 204".to_string(),
            "CSCI 301".to_string(),
        ];
        let cleaned = clean_course_names(&names, &mut warnings);
        assert_eq!(cleaned, vec!["CSCI 301".to_string(), "MATH 204".to_string()]);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_clean_course_names_reports_invalid() {
        let mut warnings = Vec::new();
        let names = vec!["intro to cs".to_string(), "CSCI 301".to_string()];
        let cleaned = clean_course_names(&names, &mut warnings);
        assert_eq!(cleaned, vec!["CSCI 301".to_string()]);
        assert_eq!(
            warnings,
            vec![Warning::InvalidCourseName {
                name: "intro to cs".to_string()
            }]
        );
    }
}
