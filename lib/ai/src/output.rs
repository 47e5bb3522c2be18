//! Cleanup of raw model text.

const FENCE: &str = "```";

/// Strips a surrounding Markdown code fence and whitespace from model output.
///
/// Text that is not fence-wrapped is only trimmed.
#[must_use]
pub fn clean_output(text: &str) -> String {
    let text = text.trim();
    if !text.starts_with(FENCE) || !text.ends_with(FENCE) {
        return text.to_string();
    }

    let mut lines: Vec<&str> = text.lines().collect();
    // The opening line always carries the fence, possibly with a language tag.
    lines.remove(0);
    if lines.last().is_some_and(|line| line.trim() == FENCE) {
        lines.pop();
    }

    lines.join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_trimmed() {
        assert_eq!(clean_output("  a cat on a mat \n"), "a cat on a mat");
    }

    #[test]
    fn fenced_block_is_unwrapped() {
        let raw = "```\nportrait of a fox, oil painting\n```";
        assert_eq!(clean_output(raw), "portrait of a fox, oil painting");
    }

    #[test]
    fn language_tag_line_is_dropped() {
        let raw = "\n```text\n  first line\nsecond line  \n```\n";
        assert_eq!(clean_output(raw), "first line\nsecond line");
    }

    #[test]
    fn fence_only_on_one_side_is_left_alone() {
        assert_eq!(clean_output("```rust\nfn main() {}"), "```rust\nfn main() {}");
    }

    #[test]
    fn single_line_fence_is_dropped_whole() {
        assert_eq!(clean_output("```inline```"), "");
        assert_eq!(clean_output("```"), "");
    }
}
