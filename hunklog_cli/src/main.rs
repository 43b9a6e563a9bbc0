use std::fs;
use std::path::PathBuf;

use clap::Parser;
use hunklog_hunks::{
    DEFAULT_CONTEXT_LINES, HunkOptions, HunkStats, Span, SpanKind, build_stats, generate_hunks,
};
use similar::{ChangeTag, TextDiff};

#[derive(Debug, Parser)]
#[command(name = "hunk-diff")]
#[command(about = "Compare two files and print unified-diff hunks")]
struct Cli {
    old_file: PathBuf,
    new_file: PathBuf,

    /// Unchanged lines shown around each change; 0 disables context.
    #[arg(long, default_value_t = DEFAULT_CONTEXT_LINES)]
    context: usize,

    /// Print the hunk list as JSON instead of diff text.
    #[arg(long)]
    json: bool,

    /// Wrap the diff body in a collapsible changelog-style markdown block.
    #[arg(long)]
    markdown: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let old_text = fs::read_to_string(&cli.old_file)?;
    let new_text = fs::read_to_string(&cli.new_file)?;

    let spans = line_spans(&old_text, &new_text);
    let hunks = generate_hunks(&spans, HunkOptions::new(cli.context))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&hunks)?);
        return Ok(());
    }

    let mut body = String::new();
    for hunk in &hunks {
        hunk.write_to(&mut body);
    }

    if cli.markdown {
        let label = format!(
            "{} -> {}",
            cli.old_file.display(),
            cli.new_file.display()
        );
        print!("{}", collapse_block(&label, &body, build_stats(&hunks)));
    } else {
        print!("{body}");
    }

    Ok(())
}

/// Group the line diff's per-line changes into alternating spans.
fn line_spans(old: &str, new: &str) -> Vec<Span> {
    let diff = TextDiff::from_lines(old, new);
    let mut spans: Vec<Span> = Vec::new();

    for change in diff.iter_all_changes() {
        let kind = match change.tag() {
            ChangeTag::Equal => SpanKind::Equal,
            ChangeTag::Insert => SpanKind::Insert,
            ChangeTag::Delete => SpanKind::Delete,
        };
        match spans.last_mut() {
            Some(last) if last.kind == kind => last.text.push_str(change.value()),
            _ => spans.push(Span::new(kind, change.value())),
        }
    }

    spans
}

/// Changelog entry form: the diff body fenced as a `diff` code block inside a
/// collapsible section, with a one-line summary of the hunk list.
fn collapse_block(label: &str, body: &str, stats: HunkStats) -> String {
    let mut out = String::new();
    out.push_str("<details>\n");
    out.push_str(&format!("<summary>{label}</summary>\n\n"));
    out.push_str(&format!(
        "{} hunk(s), +{} -{} line(s)\n\n",
        stats.hunks, stats.inserted_lines, stats.deleted_lines
    ));
    out.push_str("```diff\n");
    out.push_str(body);
    out.push_str("```\n\n");
    out.push_str("</details>\n");
    out
}
