use std::collections::BTreeMap;

/// Tags emitted by the step-by-step reasoning prompt.
pub const THOUGHT_TAGS: &[&str] = &["THOUGHT", "REASONING", "ACTION", "NEXT"];

/// Tags emitted by the automation prompt.
pub const WORKFLOW_TAGS: &[&str] = &["WORKFLOW", "PARAMETERS", "EXECUTION", "VALIDATION"];

/// Parse tag-delimited model output into a field map.
///
/// Lines are trimmed and blank lines skipped. A line starting with one of
/// `tags` followed by a colon (case-sensitive) opens a new field keyed by the
/// lowercased tag, seeded with the rest of that line. Any other line continues
/// the current field, joined with `\n`. Text before the first tag is dropped.
///
/// Never fails: unparseable input yields an empty or partial map.
pub fn parse_tagged(text: &str, tags: &[&str]) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            continue;
        }

        match match_tag(line, tags) {
            Some((tag, rest)) => {
                if let Some((key, lines)) = current.take() {
                    fields.insert(key, lines.join("\n").trim().to_string());
                }
                current = Some((tag.to_lowercase(), vec![rest.trim()]));
            }
            None => {
                if let Some((_, lines)) = current.as_mut() {
                    lines.push(line);
                }
            }
        }
    }

    if let Some((key, lines)) = current {
        fields.insert(key, lines.join("\n").trim().to_string());
    }

    fields
}

fn match_tag<'a>(line: &'a str, tags: &[&'a str]) -> Option<(&'a str, &'a str)> {
    tags.iter().find_map(|tag| {
        line.strip_prefix(tag)
            .and_then(|rest| rest.strip_prefix(':'))
            .map(|rest| (*tag, rest))
    })
}
