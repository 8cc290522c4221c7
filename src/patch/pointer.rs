use super::apply::PatchError;

/// Escape a single key for use inside a JSON pointer.
pub fn escape_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

fn unescape_token(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

pub(crate) fn join(base: &str, token: &str) -> String {
    format!("{base}/{}", escape_token(token))
}

/// Split a pointer into unescaped reference tokens; the empty pointer addresses the root.
pub(crate) fn parse(path: &str) -> Result<Vec<String>, PatchError> {
    if path.is_empty() {
        return Ok(Vec::new());
    }
    let Some(rest) = path.strip_prefix('/') else {
        return Err(PatchError::InvalidPointer {
            path: path.to_string(),
        });
    };
    Ok(rest.split('/').map(unescape_token).collect())
}

/// Parse an array index token, rejecting signs and leading zeros.
pub(crate) fn parse_index(token: &str, path: &str) -> Result<usize, PatchError> {
    let well_formed = !token.is_empty()
        && token.chars().all(|c| c.is_ascii_digit())
        && (token == "0" || !token.starts_with('0'));
    well_formed
        .then(|| token.parse::<usize>().ok())
        .flatten()
        .ok_or_else(|| PatchError::InvalidIndex {
            path: path.to_string(),
            token: token.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_and_parses_special_characters() {
        assert_eq!(escape_token("a/b~c"), "a~1b~0c");
        assert_eq!(join("/points", "+15550000001"), "/points/+15550000001");
        assert_eq!(parse("/a~1b/c~0d").unwrap(), vec!["a/b", "c~d"]);
        assert_eq!(parse("/~01").unwrap(), vec!["~1"]);
        assert!(parse("").unwrap().is_empty());
        assert!(parse("no-slash").is_err());
    }

    #[test]
    fn rejects_malformed_indexes() {
        assert_eq!(parse_index("0", "/a/0").unwrap(), 0);
        assert_eq!(parse_index("12", "/a/12").unwrap(), 12);
        assert!(parse_index("01", "/a/01").is_err());
        assert!(parse_index("-1", "/a/-1").is_err());
        assert!(parse_index("", "/a/").is_err());
    }
}
