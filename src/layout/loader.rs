//! Layout file parser.
//!
//! Format (space-delimited, one field per line after the camera type):
//!
//! ```text
//! <cameraType>
//! <fieldName> <x> <y> <w> <h> [precision]
//! ```

use std::fs;
use std::path::Path;

use super::field::{FieldSpec, LayoutConfig, PixelRect};
use crate::error::BatchError;

/// Loads and parses a layout file.
pub fn load_layout(path: &Path) -> Result<LayoutConfig, BatchError> {
    if !path.exists() {
        return Err(BatchError::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path).map_err(|e| BatchError::ConfigMalformed {
        path: path.to_path_buf(),
        line: 0,
        reason: format!("unreadable: {}", e),
    })?;

    parse_layout(&content).map_err(|(line, reason)| BatchError::ConfigMalformed {
        path: path.to_path_buf(),
        line,
        reason,
    })
}

/// Parses layout text. On failure returns the 1-based line number and a reason.
pub fn parse_layout(content: &str) -> Result<LayoutConfig, (usize, String)> {
    let mut lines = content.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l));

    let camera_type = match lines.next() {
        Some(first) if !first.is_empty() => first.to_string(),
        _ => return Err((1, "missing camera type on first line".to_string())),
    };

    let mut fields = Vec::new();
    for (idx, line) in lines.enumerate() {
        // Only truly empty lines are skipped; whitespace-only lines must parse
        if line.is_empty() {
            continue;
        }
        // +2: 1-based, and the camera type occupies line 1
        let line_num = idx + 2;
        fields.push(parse_field_line(line).map_err(|reason| (line_num, reason))?);
    }

    Ok(LayoutConfig {
        camera_type,
        fields,
    })
}

fn parse_field_line(line: &str) -> Result<FieldSpec, String> {
    let tokens: Vec<&str> = line.split(' ').collect();
    if tokens.len() != 5 && tokens.len() != 6 {
        return Err(format!(
            "expected 5 or 6 tokens (name x y w h [precision]), got {}",
            tokens.len()
        ));
    }

    let rect = PixelRect {
        x: parse_number(tokens[1], "x")?,
        y: parse_number(tokens[2], "y")?,
        width: parse_number(tokens[3], "w")?,
        height: parse_number(tokens[4], "h")?,
    };
    let precision = match tokens.get(5) {
        Some(token) => Some(parse_number::<usize>(token, "precision")?),
        None => None,
    };

    Ok(FieldSpec::new(tokens[0], rect, precision))
}

/// Parses a plain run of ASCII digits. Signs are rejected, including `+`.
fn parse_number<T: std::str::FromStr>(token: &str, what: &str) -> Result<T, String> {
    let invalid = || format!("{} must be a non-negative integer, got '{}'", what, token);
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    token.parse::<T>().map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::field::FieldKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_parse_valid_layout() {
        let layout = parse_layout(
            "Bushnell Trophy Cam\n\
             date 10 20 200 40\n\
             time 220 20 150 40 6\n\
             temp 400 20 80 40\n",
        )
        .unwrap();

        assert_eq!(layout.camera_type, "Bushnell Trophy Cam");
        assert_eq!(layout.fields.len(), 3);

        let date = &layout.fields[0];
        assert_eq!(date.name, "date");
        assert_eq!(date.kind, FieldKind::Date);
        assert_eq!(
            date.rect,
            PixelRect {
                x: 10,
                y: 20,
                width: 200,
                height: 40
            }
        );
        assert_eq!(date.precision, None);

        assert_eq!(layout.fields[1].kind, FieldKind::Time);
        assert_eq!(layout.fields[1].precision, Some(6));
        assert_eq!(layout.fields[2].kind, FieldKind::Temperature);
    }

    #[test]
    fn test_parse_crlf_and_blank_lines() {
        let layout = parse_layout("Reconyx\r\n\r\npressure 1 2 3 4\r\n\r\n").unwrap();
        assert_eq!(layout.camera_type, "Reconyx");
        assert_eq!(layout.fields.len(), 1);
        assert_eq!(layout.fields[0].rect.height, 4);
    }

    #[test]
    fn test_camera_type_only() {
        let layout = parse_layout("Moultrie").unwrap();
        assert_eq!(layout.camera_type, "Moultrie");
        assert!(layout.fields.is_empty());
    }

    #[test]
    fn test_missing_camera_type() {
        assert_eq!(parse_layout("").unwrap_err().0, 1);
        assert_eq!(parse_layout("\ndate 1 2 3 4").unwrap_err().0, 1);
    }

    #[test]
    fn test_wrong_token_count() {
        let err = parse_layout("cam\ndate 1 2 3 4\ntime 1 2 3").unwrap_err();
        assert_eq!(err.0, 3);
        assert!(err.1.contains("got 4"));

        let err = parse_layout("cam\ndate 1 2 3 4 5 6").unwrap_err();
        assert_eq!(err.0, 2);
    }

    #[test]
    fn test_double_space_is_malformed() {
        // Tokens are split on single spaces
        assert!(parse_layout("cam\ndate 1  2 3 4").is_err());
    }

    #[test]
    fn test_non_numeric_token_rejected() {
        let err = parse_layout("cam\ndate 1 two 3 4").unwrap_err();
        assert_eq!(err.0, 2);
        assert!(err.1.contains("'two'"));

        assert!(parse_layout("cam\ndate 1 2 3 4 x").is_err());
        assert!(parse_layout("cam\ndate -1 2 3 4").is_err());
    }

    #[test]
    fn test_whitespace_only_line_is_malformed() {
        let err = parse_layout("cam\n   \ndate 1 2 3 4\n").unwrap_err();
        assert_eq!(err.0, 2);
    }

    #[test]
    fn test_plus_sign_rejected() {
        let err = parse_layout("cam\ndate +1 2 3 4").unwrap_err();
        assert_eq!(err.0, 2);
        assert!(err.1.contains("'+1'"));

        assert!(parse_layout("cam\ndate 1 2 3 4 +6").is_err());
    }

    #[test]
    fn test_load_layout_from_file() {
        let file = create_test_config("cam\ntemperature 5 5 50 20 4\n");
        let layout = load_layout(file.path()).unwrap();
        assert_eq!(layout.fields[0].precision, Some(4));
    }

    #[test]
    fn test_load_layout_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_layout(&dir.path().join("missing.txt")).unwrap_err();
        assert!(matches!(err, BatchError::ConfigNotFound { .. }));
    }

    #[test]
    fn test_load_layout_malformed() {
        let file = create_test_config("cam\ndate 1 2 3\n");
        let err = load_layout(file.path()).unwrap_err();
        match err {
            BatchError::ConfigMalformed { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
