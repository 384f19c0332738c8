//! Invocation-based machine selection
//!
//! Narrows the assembled machine set to the subset a given invocation cares
//! about. The invocation context is an explicit value, a plain token vector,
//! so selection is a pure function with no process-global state.

use regex::Regex;

/// Commands whose invocation narrows the machine set
const PROVISION_COMMANDS: [&str; 3] = ["up", "provision", "hostmanager"];

/// The provisioning tool's command and argument tokens
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    tokens: Vec<String>,
}

impl Invocation {
    pub fn new(tokens: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    /// The leading command token, if any
    pub fn command(&self) -> Option<&str> {
        self.tokens.first().map(String::as_str)
    }

    fn requests_provisioning(&self) -> bool {
        self.command()
            .is_some_and(|cmd| PROVISION_COMMANDS.contains(&cmd))
            || self.tokens.iter().any(|t| t == "--provision")
    }

    /// Argument tokens that may name machines
    ///
    /// Flag tokens are recognized by the `--` marker and are never treated as
    /// machine-name candidates.
    fn machine_args(&self) -> impl Iterator<Item = &str> {
        self.tokens
            .iter()
            .skip(1)
            .map(String::as_str)
            .filter(|t| !t.contains("--"))
    }
}

/// Select the machines relevant to `invocation` out of `candidates`
///
/// `candidates` is the ordered list of (machine name, autostart flag) pairs.
/// For provisioning invocations with explicit name or `/regex/` arguments,
/// the result holds the matching names in argument order (within one
/// argument, candidate order). If nothing matches and the command is `up`
/// with more than one candidate, the autostart subset is returned. Any other
/// invocation selects every candidate unchanged.
pub fn select(candidates: &[(String, bool)], invocation: &Invocation) -> Vec<String> {
    let names: Vec<String> = candidates.iter().map(|(name, _)| name.clone()).collect();

    if !invocation.requests_provisioning() {
        return names;
    }

    let mut matched: Vec<String> = Vec::new();
    for arg in invocation.machine_args() {
        for name in arg_matches(arg, &names) {
            if !matched.contains(&name) {
                matched.push(name);
            }
        }
    }

    let selected = if !matched.is_empty() {
        matched
    } else if invocation.command() == Some("up") && names.len() > 1 {
        candidates
            .iter()
            .filter(|(_, autostart)| *autostart)
            .map(|(name, _)| name.clone())
            .collect()
    } else {
        names
    };

    tracing::debug!(command = ?invocation.command(), ?selected, "machine selection");
    selected
}

/// Resolve one argument token as a literal name or `/regex/` pattern
///
/// A token delimited by forward slashes is a regular expression on its inner
/// body; anything else matches by equality. An unparseable regex body
/// matches nothing (same recoverable policy as group patterns).
fn arg_matches(arg: &str, names: &[String]) -> Vec<String> {
    if let Some(body) = regex_body(arg) {
        match Regex::new(body) {
            Ok(re) => names.iter().filter(|n| re.is_match(n)).cloned().collect(),
            Err(err) => {
                tracing::debug!(pattern = body, %err, "unparseable machine pattern");
                Vec::new()
            }
        }
    } else {
        names.iter().filter(|n| *n == arg).cloned().collect()
    }
}

fn regex_body(arg: &str) -> Option<&str> {
    if arg.len() > 2 && arg.starts_with('/') && arg.ends_with('/') {
        Some(&arg[1..arg.len() - 1])
    } else {
        None
    }
}
