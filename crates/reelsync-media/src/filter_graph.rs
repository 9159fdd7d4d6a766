//! Typed filter graph representation.
//!
//! Graphs are assembled from [`Filter`]s and [`FilterChain`]s and only
//! turned into FFmpeg's textual syntax by their `Display` impls, which apply
//! both levels of FFmpeg escaping to every option value.

use std::fmt;

/// One filter option, positional or `key=value`.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterArg {
    pub key: Option<String>,
    pub value: String,
}

/// A single filter such as `trim=start=0:end=5`.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub name: String,
    pub args: Vec<FilterArg>,
}

impl Filter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Add a `key=value` option.
    pub fn arg(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.args.push(FilterArg {
            key: Some(key.into()),
            value: value.to_string(),
        });
        self
    }

    /// Add a positional option.
    pub fn positional(mut self, value: impl ToString) -> Self {
        self.args.push(FilterArg {
            key: None,
            value: value.to_string(),
        });
        self
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for (i, arg) in self.args.iter().enumerate() {
            f.write_str(if i == 0 { "=" } else { ":" })?;
            if let Some(key) = &arg.key {
                write!(f, "{}=", key)?;
            }
            f.write_str(&escape_value(&arg.value))?;
        }
        Ok(())
    }
}

/// A linear chain of filters between labelled pads.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterChain {
    pub inputs: Vec<String>,
    pub filters: Vec<Filter>,
    pub outputs: Vec<String>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an input pad label, e.g. `0:v` or `v0`.
    pub fn input(mut self, label: impl Into<String>) -> Self {
        self.inputs.push(label.into());
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Add an output pad label.
    pub fn output(mut self, label: impl Into<String>) -> Self {
        self.outputs.push(label.into());
        self
    }
}

impl fmt::Display for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for label in &self.inputs {
            write!(f, "[{}]", label)?;
        }
        for (i, filter) in self.filters.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", filter)?;
        }
        for label in &self.outputs {
            write!(f, "[{}]", label)?;
        }
        Ok(())
    }
}

/// A complete graph of `;`-separated chains.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterGraph {
    pub chains: Vec<FilterChain>,
}

impl FilterGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chain(mut self, chain: FilterChain) -> Self {
        self.chains.push(chain);
        self
    }

    pub fn push(&mut self, chain: FilterChain) {
        self.chains.push(chain);
    }

    pub fn is_empty(&self) -> bool {
        self.chains.iter().all(|c| c.filters.is_empty())
    }
}

impl fmt::Display for FilterGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, chain) in self.chains.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write!(f, "{}", chain)?;
        }
        Ok(())
    }
}

/// Escape an option value for use inside a filter graph.
///
/// First the option level (`\`, `'`, `:`), then the graph level
/// (`\`, `'`, `[`, `]`, `,`, `;`).
pub fn escape_value(value: &str) -> String {
    let option_level = escape_chars(value, &['\\', '\'', ':']);
    escape_chars(&option_level, &['\\', '\'', '[', ']', ',', ';'])
}

fn escape_chars(value: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Format seconds for filter options.
pub fn secs(value: f64) -> String {
    format!("{:.3}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_display() {
        let f = Filter::new("trim").arg("start", secs(0.0)).arg("end", secs(5.0));
        assert_eq!(f.to_string(), "trim=start=0.000:end=5.000");
        assert_eq!(Filter::new("null").to_string(), "null");
        assert_eq!(Filter::new("scale").positional(1080).positional(-2).to_string(), "scale=1080:-2");
    }

    #[test]
    fn test_graph_display() {
        let graph = FilterGraph::new()
            .chain(
                FilterChain::new()
                    .input("0:v")
                    .filter(Filter::new("split").positional(2))
                    .output("bg")
                    .output("fg"),
            )
            .chain(
                FilterChain::new()
                    .input("bg")
                    .filter(Filter::new("boxblur").positional(12))
                    .output("bgb"),
            );
        assert_eq!(graph.to_string(), "[0:v]split=2[bg][fg];[bg]boxblur=12[bgb]");
    }

    #[test]
    fn test_escaping() {
        assert_eq!(escape_value("plain"), "plain");
        assert_eq!(escape_value("between(t,1.000,3.000)"), r"between(t\,1.000\,3.000)");
        assert_eq!(escape_value("C:/fonts/a.ttf"), r"C\\:/fonts/a.ttf");
        assert_eq!(escape_value("it's"), r"it\\\'s");
    }
}
