//! Hashtag tokens embedded in task titles.
//!
//! A title such as `Buy milk #grocery-urgent` carries the tag `grocery`: the
//! word is stripped of its first `#` and cut at the first hyphen. Filters
//! compare that stem exactly (case-sensitive) against the selected tag.

/// Normalize a filter token: drop the first `#` and the first space.
pub fn normalize(token: &str) -> String {
    token.replacen('#', "", 1).replacen(' ', "", 1)
}

/// Stem of a single title word, if the word is a hashtag.
pub fn stem(word: &str) -> Option<String> {
    if !word.contains('#') {
        return None;
    }
    let cleaned = normalize(word);
    let stem = cleaned.split('-').next().unwrap_or_default();
    Some(stem.to_string())
}

/// Hashtag words of a title, in order of appearance, as written.
pub fn tags(title: &str) -> Vec<&str> {
    title.split(' ').filter(|word| word.contains('#')).collect()
}

/// Whether any hashtag in `title` matches the filter token.
pub fn matches(title: &str, filter: &str) -> bool {
    let wanted = normalize(filter);
    title
        .split(' ')
        .filter_map(stem)
        .any(|candidate| candidate == wanted)
}
