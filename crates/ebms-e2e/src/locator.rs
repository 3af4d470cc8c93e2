//! Locator abstraction for element selection.
//!
//! A [`Locator`] is a declarative description of how to find an element.
//! It is resolved lazily against whatever document the page currently
//! shows; nothing about the DOM is captured when it is built.

use crate::result::{E2eError, E2eResult};
use std::str::FromStr;
use std::time::Duration;

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    /// CSS selector (e.g., "table.users tbody tr")
    Css(String),
    /// ARIA role with an optional accessible name
    Role {
        /// Role name (button, link, textbox, ...)
        role: String,
        /// Accessible name filter
        name: Option<String>,
        /// Require the accessible name to match exactly
        exact: bool,
    },
    /// Form control associated with a `<label>` (or `aria-label`)
    Label(String),
    /// Text content selector
    Text(String),
    /// Test ID selector (data-testid attribute)
    TestId(String),
    /// Placeholder attribute selector
    Placeholder(String),
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create a role selector without a name filter
    #[must_use]
    pub fn role(role: impl Into<String>) -> Self {
        Self::Role {
            role: role.into(),
            name: None,
            exact: false,
        }
    }

    /// Create a role selector filtered by accessible name (substring match)
    #[must_use]
    pub fn role_named(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Role {
            role: role.into(),
            name: Some(name.into()),
            exact: false,
        }
    }

    /// Create a role selector filtered by exact accessible name
    #[must_use]
    pub fn role_exact(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Role {
            role: role.into(),
            name: Some(name.into()),
            exact: true,
        }
    }

    /// Create a label selector
    #[must_use]
    pub fn label(text: impl Into<String>) -> Self {
        Self::Label(text.into())
    }

    /// Create a text selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Create a test ID selector
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::TestId(id.into())
    }

    /// Create a placeholder selector
    #[must_use]
    pub fn placeholder(text: impl Into<String>) -> Self {
        Self::Placeholder(text.into())
    }

    /// Reject selectors with an empty body
    pub fn validate(&self) -> E2eResult<()> {
        let body = match self {
            Self::Css(s)
            | Self::Label(s)
            | Self::Text(s)
            | Self::TestId(s)
            | Self::Placeholder(s) => s.as_str(),
            Self::Role { role, name, .. } => {
                if name.as_deref().is_some_and(|n| n.trim().is_empty()) {
                    return Err(E2eError::InvalidSelector {
                        message: format!("empty accessible name in {self}"),
                    });
                }
                role.as_str()
            }
        };
        if body.trim().is_empty() {
            return Err(E2eError::InvalidSelector {
                message: format!("empty selector body in {self}"),
            });
        }
        Ok(())
    }

    /// JavaScript expression evaluating to an array of every match
    #[must_use]
    pub fn to_candidates_query(&self) -> String {
        match self {
            Self::Css(s) => query_all(s),
            Self::TestId(id) => query_all(&attribute_css("data-testid", id)),
            Self::Placeholder(p) => query_all(&attribute_css("placeholder", p)),
            Self::Text(t) => {
                let t = js_string(t);
                format!(
                    "Array.from(document.querySelectorAll('body *')).filter(el => el.textContent.includes({t}) && !Array.from(el.children).some(c => c.textContent.includes({t})))"
                )
            }
            Self::Label(l) => format!(
                "Array.from(document.querySelectorAll('label')).filter(l => l.textContent.trim().includes({text})).map(l => l.control || (l.htmlFor ? document.getElementById(l.htmlFor) : l.querySelector('input,select,textarea'))).filter(Boolean).concat({aria})",
                text = js_string(l),
                aria = query_all(&attribute_css("aria-label", l))
            ),
            Self::Role { role, name, exact } => {
                let base = query_all(&implicit_role_css(role));
                match name {
                    None => base,
                    Some(n) => {
                        let n = js_string(n);
                        let cmp = if *exact {
                            format!("=== {n}")
                        } else {
                            format!(".includes({n})")
                        };
                        format!(
                            "{base}.filter(el => ((el.getAttribute('aria-label') || el.textContent || el.value || '').trim()){cmp})"
                        )
                    }
                }
            }
        }
    }

    /// JavaScript expression evaluating to the first match or `null`
    #[must_use]
    pub fn to_query(&self) -> String {
        format!("({})[0] || null", self.to_candidates_query())
    }

    /// JavaScript expression evaluating to the number of matches
    #[must_use]
    pub fn to_count_query(&self) -> String {
        format!("({}).length", self.to_candidates_query())
    }
}

/// JSON string literal, valid as a JavaScript string
fn js_string(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

fn query_all(css: &str) -> String {
    format!("Array.from(document.querySelectorAll({}))", js_string(css))
}

/// `[name="value"]` with the value escaped as a CSS string
fn attribute_css(name: &str, value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("[{name}=\"{escaped}\"]")
}

/// Quote an accessible name; `"` and `\` are backslash-escaped
fn quote_name(name: &str) -> String {
    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push('"');
    for c in name.chars() {
        if matches!(c, '"' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Inverse of [`quote_name`]; `None` on a stray quote or dangling escape
fn unquote_name(quoted: &str) -> Option<String> {
    let inner = quoted.strip_prefix('"')?.strip_suffix('"')?;
    let mut name = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next()? {
                escaped @ ('"' | '\\') => name.push(escaped),
                _ => return None,
            },
            '"' => return None,
            other => name.push(other),
        }
    }
    Some(name)
}

fn implicit_role_css(role: &str) -> String {
    let implicit = match role {
        "button" => "button, input[type=submit], input[type=button]",
        "link" => "a[href]",
        "textbox" => {
            "input:not([type]), input[type=text], input[type=email], input[type=password], input[type=tel], input[type=search], textarea"
        }
        "heading" => "h1, h2, h3, h4, h5, h6",
        "checkbox" => "input[type=checkbox]",
        "combobox" => "select",
        "table" => "table",
        "row" => "tr",
        "cell" => "td",
        "navigation" => "nav",
        _ => "",
    };
    if implicit.is_empty() {
        format!("[role={role}]")
    } else {
        format!("{implicit}, [role={role}]")
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Css(s) => write!(f, "css={s}"),
            Self::Role { role, name, exact } => match name {
                None => write!(f, "role={role}"),
                Some(n) if *exact => write!(f, "role={role}[name={}s]", quote_name(n)),
                Some(n) => write!(f, "role={role}[name={}]", quote_name(n)),
            },
            Self::Label(s) => write!(f, "label={s}"),
            Self::Text(s) => write!(f, "text={s}"),
            Self::TestId(s) => write!(f, "testid={s}"),
            Self::Placeholder(s) => write!(f, "placeholder={s}"),
        }
    }
}

impl FromStr for Selector {
    type Err = E2eError;

    /// Parse the `engine=body` form produced by `Display`.
    /// Strings without a known engine prefix are treated as CSS.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let selector = match s.split_once('=') {
            Some(("css", body)) => Self::Css(body.to_string()),
            Some(("label", body)) => Self::Label(body.to_string()),
            Some(("text", body)) => Self::Text(body.to_string()),
            Some(("testid", body)) => Self::TestId(body.to_string()),
            Some(("placeholder", body)) => Self::Placeholder(body.to_string()),
            Some(("role", body)) => parse_role(body)?,
            _ => Self::Css(s.to_string()),
        };
        selector.validate()?;
        Ok(selector)
    }
}

fn parse_role(body: &str) -> E2eResult<Selector> {
    let Some((role, rest)) = body.split_once('[') else {
        return Ok(Selector::role(body));
    };
    let malformed = || E2eError::InvalidSelector {
        message: format!("malformed role selector 'role={body}'"),
    };
    let rest = rest.strip_suffix(']').ok_or_else(malformed)?;
    let value = rest.strip_prefix("name=").ok_or_else(malformed)?;
    let (value, exact) = match value.strip_suffix('s') {
        Some(v) if v.ends_with('"') => (v, true),
        _ => (value, false),
    };
    let name = unquote_name(value).ok_or_else(malformed)?;
    Ok(Selector::Role {
        role: role.to_string(),
        name: Some(name),
        exact,
    })
}

/// A locator for finding an element, with an optional wait override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    selector: Selector,
    timeout: Option<Duration>,
}

impl Locator {
    /// Create a locator from a selector
    #[must_use]
    pub const fn new(selector: Selector) -> Self {
        Self {
            selector,
            timeout: None,
        }
    }

    /// Parse a locator from selector text, failing on malformed input
    pub fn parse(selector: &str) -> E2eResult<Self> {
        Ok(Self::new(selector.parse()?))
    }

    /// Override the wait timeout for this locator
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Get the selector
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Get the timeout override
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl From<Selector> for Locator {
    fn from(selector: Selector) -> Self {
        Self::new(selector)
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.selector.fmt(f)
    }
}
