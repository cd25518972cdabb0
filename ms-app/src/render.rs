//! Plain-text rendering of dispatch results for the terminal.

use ms_llm::{Outcome, Provider, ResultMapping};
use std::fmt::Write;

pub fn outcome_line(provider: Provider, outcome: &Outcome) -> String {
    match outcome {
        Outcome::Success { data } => data.clone(),
        o if o.is_missing_credential() => format!(
            "API key missing; set it with `multisearch keys set {provider} <key>`"
        ),
        Outcome::Failure { error } => format!("Error: {error}"),
    }
}

/// One block per provider, in the fixed provider order.
pub fn results(results: &ResultMapping) -> String {
    let mut out = String::new();
    for provider in Provider::ALL {
        let Some(outcome) = results.get(&provider) else {
            continue;
        };
        let marker = if outcome.is_success() { "ok" } else { "error" };
        let _ = writeln!(out, "== {} [{marker}]", provider.display_name());
        let _ = writeln!(out, "{}", outcome_line(provider, outcome));
        out.push('\n');
    }
    out
}
