//! Interactive resolution of ambiguous mentions

use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Select};
use tracing::warn;
use weaver_core::{Analysis, Decision, Engine};
use weaver_parser::Span;

/// Ask the user about every pending candidate.
///
/// Returns the number of candidates that were linked. A prompt failure
/// (closed terminal, Esc) leaves that mention unlinked.
pub fn resolve_pending(engine: &Engine, analysis: &mut Analysis) -> usize {
    let pending: Vec<(String, Span, String, Vec<String>)> = analysis
        .pending()
        .filter_map(|(doc_id, scored)| match &scored.decision {
            Decision::AwaitingUser { shortlist } => Some((
                doc_id.to_string(),
                scored.candidate.span,
                scored.candidate.source_text.clone(),
                shortlist.iter().map(|t| t.document_id.clone()).collect(),
            )),
            _ => None,
        })
        .collect();

    if pending.is_empty() {
        return 0;
    }

    let theme = ColorfulTheme::default();
    let mut linked = 0;
    for (doc_id, span, text, choices) in pending {
        let line = engine
            .corpus()
            .get(&doc_id)
            .map(|d| d.line_of(span.start))
            .unwrap_or_default();
        println!("{} {}:{} \"{}\"", "?".yellow().bold(), doc_id, line, text);

        let mut items: Vec<&str> = choices.iter().map(String::as_str).collect();
        items.push("(leave unlinked)");

        let choice = match Select::with_theme(&theme)
            .with_prompt("Link to")
            .items(&items)
            .default(0)
            .interact_opt()
        {
            Ok(Some(index)) => choices.get(index).map(String::as_str),
            Ok(None) => None,
            Err(err) => {
                warn!(error = %err, "prompt failed; leaving mention unlinked");
                None
            }
        };

        if analysis.resolve(&doc_id, span, choice) && choice.is_some() {
            linked += 1;
        }
    }
    linked
}
