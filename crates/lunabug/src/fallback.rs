//! Local heuristic answers used when no hosted provider is available.

use crate::prompts::{LunaBugRequest, Mode};

struct Rule {
    needles: &'static [&'static str],
    advice: &'static str,
}

const RULES: &[Rule] = &[
    Rule {
        needles: &["undefined", "null", "cannot read propert"],
        advice: "A value is missing where the code expects an object. Check that the data \
                 has loaded before it is read, and guard optional fields.",
    },
    Rule {
        needles: &["econnrefused", "failed to fetch", "network", "timeout", "timed out"],
        advice: "The request never reached the server or took too long. Confirm the API is \
                 running, the base URL is correct and CORS allows this origin.",
    },
    Rule {
        needles: &["401", "unauthorized", "session"],
        advice: "The session is missing or expired. Log in again and make sure the \
                 Authorization header carries the bearer token.",
    },
    Rule {
        needles: &["403", "forbidden", "admin"],
        advice: "The caller is authenticated but not allowed to do this. Admin routes need \
                 an admin session or the x-admin-token header.",
    },
    Rule {
        needles: &["sql", "database", "relation", "constraint", "duplicate key"],
        advice: "The database rejected the operation. Check that migrations are applied and \
                 that the record does not violate a unique or foreign-key constraint.",
    },
    Rule {
        needles: &["json", "unexpected token", "parse"],
        advice: "A response or file was not valid JSON. Log the raw body and check the \
                 Content-Type the server returned.",
    },
];

const GENERIC_ADVICE: &str = "I could not reach an AI provider, so here is a checklist: \
    reproduce the issue, read the server logs for the matching request id, and narrow \
    the failing input down to the smallest case.";

/// Build a best-effort answer from keywords in the request.
pub fn respond(mode: Mode, request: &LunaBugRequest) -> String {
    let haystack = format!(
        "{} {} {}",
        request.message,
        request.error.as_deref().unwrap_or_default(),
        request.stack.as_deref().unwrap_or_default()
    )
    .to_lowercase();

    let matched: Vec<&str> = RULES
        .iter()
        .filter(|rule| rule.needles.iter().any(|n| haystack.contains(n)))
        .map(|rule| rule.advice)
        .collect();

    let body = if matched.is_empty() {
        GENERIC_ADVICE.to_string()
    } else {
        matched.join("\n\n")
    };

    match mode {
        Mode::Debug => format!("LunaBug offline analysis:\n\n{body}"),
        Mode::Ai | Mode::Chat => body,
    }
}
