use log::warn;
use regex::Regex;

/// A named pair of LaTeX delimiters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelimiterEnvironment {
    pub name: &'static str,
    pub open: &'static str,
    pub close: &'static str,
    /// Line breaks (`\\`) inside the span separate logical lines
    pub is_multiline: bool,
}

/// Recognized environments, in the order they are scanned.
/// The order feeds block numbering, so changing it changes ids.
pub const ENVIRONMENTS: [DelimiterEnvironment; 6] = [
    DelimiterEnvironment {
        name: "equation",
        open: r"\begin{equation}",
        close: r"\end{equation}",
        is_multiline: false,
    },
    DelimiterEnvironment {
        name: "equation*",
        open: r"\begin{equation*}",
        close: r"\end{equation*}",
        is_multiline: false,
    },
    DelimiterEnvironment {
        name: "eqnarray",
        open: r"\begin{eqnarray}",
        close: r"\end{eqnarray}",
        is_multiline: true,
    },
    DelimiterEnvironment {
        name: "eqnarray*",
        open: r"\begin{eqnarray*}",
        close: r"\end{eqnarray*}",
        is_multiline: true,
    },
    DelimiterEnvironment {
        name: "align",
        open: r"\begin{align}",
        close: r"\end{align}",
        is_multiline: true,
    },
    DelimiterEnvironment {
        name: "align*",
        open: r"\begin{align*}",
        close: r"\end{align*}",
        is_multiline: true,
    },
];

/// Finds the spans of one delimiter pair.
///
/// Delimiters are matched literally and non-greedily: each span runs from an
/// open marker to the first close marker after it. Spans are returned
/// verbatim, line breaks and surrounding whitespace included.
#[derive(Debug, Clone)]
pub struct EnvironmentMatcher {
    environment: DelimiterEnvironment,
    pattern: Regex,
}

impl EnvironmentMatcher {
    pub fn new(environment: DelimiterEnvironment) -> Result<Self, regex::Error> {
        let pattern = build_pattern(environment.open, environment.close)?;
        Ok(Self {
            environment,
            pattern,
        })
    }

    pub fn environment(&self) -> &DelimiterEnvironment {
        &self.environment
    }

    /// All non-overlapping spans in order of appearance
    pub fn find_spans<'t>(&self, text: &'t str) -> Vec<&'t str> {
        self.pattern
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str())
            .collect()
    }
}

fn build_pattern(open: &str, close: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(
        "(?s){}(.*?){}",
        regex::escape(open),
        regex::escape(close)
    ))
}

/// One-shot form of [`EnvironmentMatcher::find_spans`] for an arbitrary pair.
/// Never fails: an unusable pair yields no spans.
pub fn match_spans(text: &str, open: &str, close: &str) -> Vec<String> {
    match build_pattern(open, close) {
        Ok(pattern) => pattern
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .collect(),
        Err(e) => {
            warn!("Cannot match delimiters {:?}..{:?}: {}", open, close, e);
            Vec::new()
        }
    }
}
