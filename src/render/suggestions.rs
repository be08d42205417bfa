//! Theme suggestion generation.

use crate::constants::SUGGESTION_WILDCARD;

/// Build theme suggestions for `base` from qualifying `args`, most general first.
///
/// Each argument is stripped of `/`, `\` and NUL characters and its hyphens are
/// replaced by `delimiter`. A numeric argument yields a wildcard suggestion
/// (`prefix__%`) followed by the literal one, and does not become part of the
/// prefix for later arguments. Any other argument yields its literal suggestion
/// and extends the prefix.
///
/// ```rust
/// use drupalkit::render::suggestions;
///
/// assert_eq!(
///     suggestions(&["2", "teaser"], "node", "__"),
///     vec!["node__%", "node__2", "node__teaser"]
/// );
/// ```
pub fn suggestions<S: AsRef<str>>(args: &[S], base: &str, delimiter: &str) -> Vec<String> {
    let mut result = Vec::with_capacity(args.len() * 2);
    let mut prefix = base.to_string();

    for arg in args {
        let arg = sanitize(arg.as_ref(), delimiter);
        let numeric = is_integer(&arg);

        if numeric {
            result.push(format!("{prefix}{delimiter}{SUGGESTION_WILDCARD}"));
        }
        result.push(format!("{prefix}{delimiter}{arg}"));

        if !numeric {
            prefix = format!("{prefix}{delimiter}{arg}");
        }
    }

    result
}

fn sanitize(arg: &str, delimiter: &str) -> String {
    arg.chars()
        .filter(|c| !matches!(c, '/' | '\\' | '\0'))
        .collect::<String>()
        .replace('-', delimiter)
}

fn is_integer(arg: &str) -> bool {
    !arg.is_empty() && arg.parse::<i64>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_segment_does_not_extend_prefix() {
        assert_eq!(
            suggestions(&["2", "teaser"], "node", "__"),
            vec!["node__%", "node__2", "node__teaser"]
        );
    }

    #[test]
    fn test_prefix_grows_with_words() {
        assert_eq!(
            suggestions(&["article", "full"], "node", "__"),
            vec!["node__article", "node__article__full"]
        );
    }

    #[test]
    fn test_sanitizes_separators_and_hyphens() {
        assert_eq!(
            suggestions(&["admin/content", "edit-form"], "page", "__"),
            vec!["page__admincontent", "page__admincontent__edit__form"]
        );
        assert_eq!(suggestions(&["a\\b\0c"], "page", "__"), vec!["page__abc"]);
    }

    #[test]
    fn test_custom_delimiter_and_empty_args() {
        let args: [&str; 0] = [];
        assert!(suggestions(&args, "block", "__").is_empty());
        assert_eq!(
            suggestions(&["node", "7"], "page", "-"),
            vec!["page-node", "page-node-%", "page-node-7"]
        );
    }
}
