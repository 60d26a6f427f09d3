/// Lower-case, hyphen-separated form of `name` for file names.
///
/// Runs of anything other than ASCII letters and digits collapse to a single
/// hyphen; leading and trailing hyphens are dropped.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Default Samurai"), "default-samurai");
        assert_eq!(slugify("  character (1) "), "character-1");
        assert_eq!(slugify("void-seeker"), "void-seeker");
        assert_eq!(slugify("!!!"), "");
    }
}
