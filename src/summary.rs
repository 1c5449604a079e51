//! The all-cleared summary: every resolved worry with the comfort it got.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::models::ClearedWorry;

const WORRY_MARK: char = '☁';
const COMFORT_MARK: char = '♥';

/// Render the summary as plain text.
///
/// Example output:
/// ```text
/// 모든 걱정을 해결했어요!
/// 당신이 보낸 따뜻한 위로를 확인해보세요.
///
/// ☁ "exam"
///   ♥ "You prepared well."
/// ```
pub fn render_text(cleared: &[ClearedWorry], shared: bool) -> String {
    let mut output = String::from("모든 걱정을 해결했어요!\n");
    output.push_str(if shared {
        "친구의 걱정을 모두 위로해줬어요. 고마워요!\n"
    } else {
        "당신이 보낸 따뜻한 위로를 확인해보세요.\n"
    });

    for item in cleared {
        output.push('\n');
        output.push(WORRY_MARK);
        output.push_str(&format!(" \"{}\"\n", item.worry_text));
        output.push_str("  ");
        output.push(COMFORT_MARK);
        output.push_str(&format!(" \"{}\"\n", item.comfort_text));
    }
    output
}

pub fn to_json(cleared: &[ClearedWorry]) -> Result<String> {
    serde_json::to_string_pretty(cleared).context("Failed to serialize summary")
}

/// Write the summary to `path`: JSON for a `.json` extension, text otherwise.
pub fn export(cleared: &[ClearedWorry], shared: bool, path: &Path) -> Result<()> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let content = if is_json {
        to_json(cleared)?
    } else {
        render_text(cleared, shared)
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context("Failed to create export directory")?;
    }
    fs::write(path, content)
        .with_context(|| format!("Failed to write summary to {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cleared(worry: &str, comfort: &str) -> ClearedWorry {
        ClearedWorry {
            worry_text: worry.to_string(),
            comfort_text: comfort.to_string(),
        }
    }

    #[test]
    fn test_render_lists_every_pair_in_order() {
        let items = vec![cleared("exam", "you prepared"), cleared("rent", "it will work out")];
        let output = render_text(&items, false);

        let exam = output.find("☁ \"exam\"").unwrap();
        let rent = output.find("☁ \"rent\"").unwrap();
        assert!(exam < rent);
        assert!(output.contains("  ♥ \"it will work out\"\n"));
    }

    #[test]
    fn test_render_heading_depends_on_shared_view() {
        assert!(render_text(&[], true).contains("친구의 걱정"));
        assert!(!render_text(&[], false).contains("친구의 걱정"));
    }

    #[test]
    fn test_export_picks_format_from_extension() {
        let dir = tempfile::tempdir().unwrap();
        let items = vec![cleared("exam", "you prepared")];

        let json_path = dir.path().join("summary.json");
        export(&items, false, &json_path).unwrap();
        let parsed: Vec<ClearedWorry> =
            serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(parsed, items);

        let text_path = dir.path().join("summary.txt");
        export(&items, false, &text_path).unwrap();
        assert!(fs::read_to_string(&text_path).unwrap().contains("☁ \"exam\""));
    }
}
