/// Write `values` into `out` with `f`, putting `separator` between the ones that wrote something.
pub fn separated_by<T, F>(
    out: &mut String,
    values: impl IntoIterator<Item = T>,
    mut f: F,
    separator: &str,
) where
    F: FnMut(&mut String, T),
{
    let mut len = out.len();
    for v in values {
        if out.len() > len {
            out.push_str(separator);
        }
        len = out.len();
        f(out, v);
    }
}

/// Longest prefix of `text` not exceeding `max` bytes that ends on a char boundary.
pub fn prefix_within(text: &str, max: usize) -> &str {
    let mut end = text.len().min(max);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[macro_export]
macro_rules! truncate_long {
    ($query:expr) => {
        format_args!(
            "{}{}",
            $crate::prefix_within(&$query, 497).trim_end(),
            if $query.len() > 497 { "..." } else { "" },
        )
    };
}

#[cfg(test)]
mod tests {
    use super::separated_by;

    #[test]
    fn separated() {
        let mut out = String::from("SELECT ");
        separated_by(&mut out, ["a", "", "b"], |out, v| out.push_str(v), ", ");
        assert_eq!(out, "SELECT a, b");
    }

    #[test]
    fn truncate() {
        let short = "SELECT 1";
        assert_eq!(format!("{}", truncate_long!(short)), "SELECT 1");
        let long = "x".repeat(600);
        let truncated = format!("{}", truncate_long!(long));
        assert_eq!(truncated.len(), 500);
        assert!(truncated.ends_with("..."));
        assert_eq!(super::prefix_within("aé", 2), "a");
    }
}
