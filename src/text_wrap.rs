/// Greedy line breaking: keep appending words while the candidate line measures
/// strictly less than `max_width`, otherwise start a new line. A word that is
/// wider than `max_width` on its own still gets a line. Whitespace runs
/// collapse to single spaces; blank input yields no lines.
pub fn wrap_greedy<F>(text: &str, max_width: f32, measure: F) -> Vec<String>
where
    F: Fn(&str) -> f32,
{
    let mut words = text.split_whitespace();
    let Some(first) = words.next() else {
        return Vec::new();
    };

    let mut lines = Vec::new();
    let mut current = first.to_owned();
    for word in words {
        let candidate = format!("{current} {word}");
        if measure(&candidate) < max_width {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_owned()));
        }
    }
    lines.push(current);
    lines
}
