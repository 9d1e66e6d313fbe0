#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde_json::{Value, json};
use sitewalk_common::observability::{LogConfig, LogFormat};
use sitewalk_common::{SessionError, SinkError};
use sitewalk_config::{RunMode, SitewalkConfig};
use sitewalk_explore::recorder::OutputSink;
use sitewalk_explore::session::{BrowserSession, Query, ScriptArg, SessionResult};

static INIT_PATH: OnceLock<std::path::PathBuf> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "sitewalk-tests",
            emit_stderr: true,
            format: if std::env::var("SITEWALK_LOG_FORMAT")
                .map(|raw| raw.trim().eq_ignore_ascii_case("json"))
                .unwrap_or(false)
            {
                LogFormat::Json
            } else {
                LogFormat::Text
            },
            default_filter: "debug".to_string(),
            log_dir: Some(std::env::temp_dir().join("sitewalk-tests")),
        };

        sitewalk_common::observability::init_logging(config).unwrap_or_default()
    });
}

/// Configuration for a run against the scripted site.
pub fn test_config(mode: RunMode, base: &str, targets: &[&str]) -> SitewalkConfig {
    let mut config = SitewalkConfig::default();
    config.run.mode = mode;
    config.run.base_location = base.to_string();
    config.run.targets = targets.iter().map(|t| t.to_string()).collect();
    config.output.snapshots = false;
    config
}

// ---------------------------------------------------------------------------
// Scripted document
// ---------------------------------------------------------------------------

/// A node of a scripted page.
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<Node>,
    pub hidden: bool,
    pub disabled: bool,
    pub native_click_fails: bool,
    pub script_click_fails: bool,
    pub hover_fails: bool,
    pub navigates_to: Option<String>,
    pub closes_on_click: bool,
    pub closes_window_on_click: bool,
}

pub fn el(tag: &str) -> Node {
    Node {
        tag: tag.to_string(),
        ..Node::default()
    }
}

impl Node {
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.retain(|(n, _)| n != name);
        self.attrs.push((name.to_string(), value.to_string()));
        self
    }

    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    pub fn class(self, class: &str) -> Self {
        self.attr("class", class)
    }

    pub fn href(self, href: &str) -> Self {
        self.attr("href", href)
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn native_click_fails(mut self) -> Self {
        self.native_click_fails = true;
        self
    }

    pub fn script_click_fails(mut self) -> Self {
        self.script_click_fails = true;
        self
    }

    pub fn hover_fails(mut self) -> Self {
        self.hover_fails = true;
        self
    }

    pub fn navigates(mut self, location: &str) -> Self {
        self.navigates_to = Some(location.to_string());
        self
    }

    pub fn closes_on_click(mut self) -> Self {
        self.closes_on_click = true;
        self
    }

    /// Clicking closes the window, so the location can no longer be read.
    pub fn closes_window_on_click(mut self) -> Self {
        self.closes_window_on_click = true;
        self
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn remove(&mut self, name: &str) {
        self.attrs.retain(|(n, _)| n != name);
    }

    fn text_content(&self) -> String {
        let mut parts = vec![self.text.trim().to_string()];
        parts.extend(self.children.iter().map(Node::text_content));
        parts.retain(|p| !p.is_empty());
        parts.join(" ")
    }

    fn describe(&self) -> String {
        match (self.get("id"), self.get("class")) {
            (Some(id), _) => format!("#{id}"),
            (None, Some(class)) => format!(".{class}"),
            _ => format!("{}:{}", self.tag, self.text_content()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Page {
    pub title: String,
    pub nodes: Vec<Node>,
    /// Successive document heights reported while scrolling.
    pub heights: Vec<u64>,
}

/// Handle into the scripted document; stale once the document is replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockElement {
    generation: u64,
    path: Vec<usize>,
}

/// Everything the engine did to the session, in order.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    pub navigations: Vec<String>,
    pub queries: Vec<String>,
    /// `(element, mechanism)` for every click that took effect.
    pub clicks: Vec<(String, &'static str)>,
    pub hovers: Vec<String>,
    pub scripts: Vec<String>,
}

impl Journal {
    pub fn clicked(&self) -> Vec<String> {
        self.clicks.iter().map(|(what, _)| what.clone()).collect()
    }

    pub fn navigations_to(&self, location: &str) -> usize {
        self.navigations.iter().filter(|n| *n == location).count()
    }
}

#[derive(Default)]
struct State {
    pages: HashMap<String, Page>,
    location: Option<String>,
    generation: u64,
    document: Vec<Node>,
    scroll_step: usize,
    window_closed: bool,
    journal: Journal,
}

impl State {
    fn load(&mut self, location: &str) {
        let page = self.pages.get(location).cloned().unwrap_or_default();
        self.document = page.nodes;
        self.location = Some(location.to_string());
        self.generation += 1;
        self.scroll_step = 0;
    }

    fn node(&self, element: &MockElement) -> SessionResult<&Node> {
        if element.generation != self.generation {
            return Err(SessionError::StaleReference);
        }
        node_at(&self.document, &element.path).ok_or(SessionError::StaleReference)
    }

    fn node_mut(&mut self, element: &MockElement) -> SessionResult<&mut Node> {
        if element.generation != self.generation {
            return Err(SessionError::StaleReference);
        }
        node_at_mut(&mut self.document, &element.path).ok_or(SessionError::StaleReference)
    }

    fn activate(&mut self, element: &MockElement, mechanism: &'static str) -> SessionResult<()> {
        let node = self.node_mut(element)?;
        let describe = node.describe();
        let target = node.navigates_to.clone();
        if node.closes_on_click {
            node.hidden = true;
        }
        if node.closes_window_on_click {
            self.window_closed = true;
        }
        self.journal.clicks.push((describe, mechanism));
        if let Some(target) = target {
            self.load(&target);
        }
        Ok(())
    }

    fn height(&self) -> u64 {
        let heights = self
            .location
            .as_ref()
            .and_then(|l| self.pages.get(l))
            .map(|p| p.heights.clone())
            .unwrap_or_default();
        match heights.len() {
            0 => 1000,
            n => heights[self.scroll_step.min(n - 1)],
        }
    }
}

fn node_at<'a>(nodes: &'a [Node], path: &[usize]) -> Option<&'a Node> {
    let (first, rest) = path.split_first()?;
    let node = nodes.get(*first)?;
    if rest.is_empty() {
        Some(node)
    } else {
        node_at(&node.children, rest)
    }
}

fn node_at_mut<'a>(nodes: &'a mut [Node], path: &[usize]) -> Option<&'a mut Node> {
    let (first, rest) = path.split_first()?;
    let node = nodes.get_mut(*first)?;
    if rest.is_empty() {
        Some(node)
    } else {
        node_at_mut(&mut node.children, rest)
    }
}

type Visited<'a> = (Vec<usize>, &'a Node, Vec<&'a Node>);

fn walk<'a>(
    nodes: &'a [Node],
    path: &mut Vec<usize>,
    ancestors: &mut Vec<&'a Node>,
    out: &mut Vec<Visited<'a>>,
) {
    for (index, node) in nodes.iter().enumerate() {
        path.push(index);
        out.push((path.clone(), node, ancestors.clone()));
        ancestors.push(node);
        walk(&node.children, path, ancestors, out);
        ancestors.pop();
        path.pop();
    }
}

// ---------------------------------------------------------------------------
// Query matching: the CSS and XPath subset the cascades compile to
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum Test {
    Id(String),
    Class(String),
    Has(String),
    Equals(String, String),
    Contains(String, String),
    Checked,
}

#[derive(Debug)]
struct Compound {
    tag: Option<String>,
    tests: Vec<Test>,
}

fn is_ident(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn unquote(value: &str) -> String {
    let value = value.trim();
    let inner = if (value.starts_with('\'') && value.ends_with('\''))
        || (value.starts_with('"') && value.ends_with('"'))
    {
        &value[1..value.len() - 1]
    } else {
        value
    };
    inner.replace("\\'", "'").replace("\\\\", "\\")
}

fn parse_compound(source: &str) -> Compound {
    let chars: Vec<char> = source.chars().collect();
    let mut i = 0;
    let ident = |i: &mut usize| {
        let start = *i;
        while *i < chars.len() && is_ident(chars[*i]) {
            *i += 1;
        }
        chars[start..*i].iter().collect::<String>()
    };
    let tag = match chars.first() {
        Some(c) if is_ident(*c) || *c == '*' => {
            if *c == '*' {
                i += 1;
                None
            } else {
                Some(ident(&mut i))
            }
        }
        _ => None,
    };
    let mut tests = Vec::new();
    while i < chars.len() {
        match chars[i] {
            '#' => {
                i += 1;
                tests.push(Test::Id(ident(&mut i)));
            }
            '.' => {
                i += 1;
                tests.push(Test::Class(ident(&mut i)));
            }
            ':' => {
                i += 1;
                if ident(&mut i) == "checked" {
                    tests.push(Test::Checked);
                }
            }
            '[' => {
                let start = i + 1;
                let mut end = start;
                let mut quote = None;
                while end < chars.len() {
                    let c = chars[end];
                    match quote {
                        Some(q) if c == q && chars[end - 1] != '\\' => quote = None,
                        Some(_) => {}
                        None if c == '\'' || c == '"' => quote = Some(c),
                        None if c == ']' => break,
                        None => {}
                    }
                    end += 1;
                }
                let body: String = chars[start..end].iter().collect();
                i = end + 1;
                if let Some((name, value)) = body.split_once("*=") {
                    tests.push(Test::Contains(name.to_string(), unquote(value)));
                } else if let Some((name, value)) = body.split_once('=') {
                    tests.push(Test::Equals(name.to_string(), unquote(value)));
                } else {
                    tests.push(Test::Has(body));
                }
            }
            _ => i += 1,
        }
    }
    Compound { tag, tests }
}

fn compound_matches(compound: &Compound, node: &Node) -> bool {
    if let Some(tag) = &compound.tag {
        if !node.tag.eq_ignore_ascii_case(tag) {
            return false;
        }
    }
    compound.tests.iter().all(|test| match test {
        Test::Id(id) => node.get("id") == Some(id.as_str()),
        Test::Class(class) => node
            .get("class")
            .is_some_and(|c| c.split_whitespace().any(|t| t == class)),
        Test::Has(name) => node.get(name).is_some(),
        Test::Equals(name, value) => node.get(name) == Some(value.as_str()),
        Test::Contains(name, value) => node.get(name).is_some_and(|v| v.contains(value.as_str())),
        Test::Checked => node.get("selected").is_some(),
    })
}

/// Split `css` on top-level commas and whitespace, outside brackets.
fn split_outside_brackets(css: &str, separator: fn(char) -> bool) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0;
    for c in css.chars() {
        match c {
            '[' => depth += 1,
            ']' => depth -= 1,
            _ => {}
        }
        if depth == 0 && separator(c) {
            if !current.trim().is_empty() {
                parts.push(current.trim().to_string());
            }
            current.clear();
        } else {
            current.push(c);
        }
    }
    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

fn css_matches(css: &str, node: &Node, ancestors: &[&Node]) -> bool {
    split_outside_brackets(css, |c| c == ',').iter().any(|selector| {
        let chain: Vec<Compound> = split_outside_brackets(selector, char::is_whitespace)
            .iter()
            .map(|s| parse_compound(s))
            .collect();
        let Some((last, rest)) = chain.split_last() else {
            return false;
        };
        if !compound_matches(last, node) {
            return false;
        }
        let mut remaining = rest.iter().rev().peekable();
        for ancestor in ancestors.iter().rev() {
            match remaining.peek() {
                Some(compound) if compound_matches(compound, ancestor) => {
                    remaining.next();
                }
                Some(_) => {}
                None => break,
            }
        }
        remaining.peek().is_none()
    })
}

fn xpath_matches(expr: &str, node: &Node) -> bool {
    static STEP: OnceLock<Regex> = OnceLock::new();
    static NEEDLE: OnceLock<Regex> = OnceLock::new();
    let step = STEP.get_or_init(|| Regex::new(r"^//([A-Za-z0-9*]+)\[(.*)\]$").unwrap());
    let needle =
        NEEDLE.get_or_init(|| Regex::new(r#"contains\(\., (?:'([^']*)'|"([^"]*)")\)"#).unwrap());
    let text = node.text_content();
    expr.split(" | ").any(|part| {
        let Some(caps) = step.captures(part.trim()) else {
            return false;
        };
        let tag = &caps[1];
        if tag != "*" && !node.tag.eq_ignore_ascii_case(tag) {
            return false;
        }
        needle.captures_iter(&caps[2]).any(|n| {
            let wanted = n.get(1).or_else(|| n.get(2)).map(|m| m.as_str()).unwrap_or("");
            text.contains(wanted)
        })
    })
}

fn query_matches(query: &Query, node: &Node, ancestors: &[&Node]) -> bool {
    match query {
        Query::Css(css) => css_matches(css, node, ancestors),
        Query::XPath(expr) => xpath_matches(expr, node),
    }
}

// ---------------------------------------------------------------------------
// The session
// ---------------------------------------------------------------------------

/// In-memory [`BrowserSession`] over scripted pages. Clones share state.
#[derive(Clone, Default)]
pub struct MockSession {
    state: Arc<Mutex<State>>,
}

impl MockSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, location: &str, nodes: Vec<Node>) -> Self {
        self.page_with(
            location,
            Page {
                title: location.to_string(),
                nodes,
                heights: Vec::new(),
            },
        )
    }

    pub fn page_with(self, location: &str, page: Page) -> Self {
        self.state
            .lock()
            .unwrap()
            .pages
            .insert(location.to_string(), page);
        self
    }

    /// Load `location` without recording a navigation.
    pub fn open(&self, location: &str) {
        self.state.lock().unwrap().load(location);
    }

    pub fn journal(&self) -> Journal {
        self.state.lock().unwrap().journal.clone()
    }

    pub fn clear_journal(&self) {
        self.state.lock().unwrap().journal = Journal::default();
    }

    pub fn location(&self) -> Option<String> {
        self.state.lock().unwrap().location.clone()
    }

    /// Handles for every node matching `css`, for driving components directly.
    pub fn handles(&self, css: &str) -> Vec<MockElement> {
        let state = self.state.lock().unwrap();
        let mut out = Vec::new();
        walk(&state.document, &mut Vec::new(), &mut Vec::new(), &mut out);
        out.into_iter()
            .filter(|(_, node, ancestors)| css_matches(css, node, ancestors))
            .map(|(path, _, _)| MockElement {
                generation: state.generation,
                path,
            })
            .collect()
    }

    pub fn handle(&self, css: &str) -> MockElement {
        self.handles(css)
            .into_iter()
            .next()
            .unwrap_or_else(|| panic!("no node matches {css}"))
    }

    fn with<T>(&self, f: impl FnOnce(&mut State) -> SessionResult<T>) -> SessionResult<T> {
        f(&mut self.state.lock().unwrap())
    }
}

#[async_trait]
impl BrowserSession for MockSession {
    type Element = MockElement;

    async fn navigate(&self, location: &str) -> SessionResult<()> {
        self.with(|state| {
            state.journal.navigations.push(location.to_string());
            if !state.pages.contains_key(location) {
                return Err(SessionError::Navigation {
                    location: location.to_string(),
                    reason: "unknown location".to_string(),
                });
            }
            state.load(location);
            Ok(())
        })
    }

    async fn wait_ready(&self, _timeout: Duration) -> SessionResult<()> {
        self.with(|state| match state.location {
            Some(_) => Ok(()),
            None => Err(SessionError::Unavailable("nothing loaded".to_string())),
        })
    }

    async fn current_location(&self) -> SessionResult<String> {
        self.with(|state| {
            if state.window_closed {
                return Err(SessionError::Unavailable("no such window".into()));
            }
            Ok(state
                .location
                .clone()
                .unwrap_or_else(|| "about:blank".to_string()))
        })
    }

    async fn page_title(&self) -> SessionResult<String> {
        self.with(|state| {
            Ok(state
                .location
                .as_ref()
                .and_then(|l| state.pages.get(l))
                .map(|p| p.title.clone())
                .unwrap_or_default())
        })
    }

    async fn page_source(&self) -> SessionResult<String> {
        self.with(|state| {
            let body: Vec<String> = state.document.iter().map(Node::text_content).collect();
            Ok(format!("<html><body>{}</body></html>", body.join("\n")))
        })
    }

    async fn screenshot(&self) -> SessionResult<Vec<u8>> {
        Ok(vec![0x89, b'P', b'N', b'G'])
    }

    async fn find(
        &self,
        query: &Query,
        scope: Option<&Self::Element>,
    ) -> SessionResult<Vec<Self::Element>> {
        self.with(|state| {
            state.journal.queries.push(query.to_string());
            let generation = state.generation;
            let mut out = Vec::new();
            match scope {
                None => walk(&state.document, &mut Vec::new(), &mut Vec::new(), &mut out),
                Some(scope) => {
                    let root = state.node(scope)?;
                    let mut ancestors = Vec::new();
                    for depth in 1..=scope.path.len() {
                        if let Some(a) = node_at(&state.document, &scope.path[..depth]) {
                            ancestors.push(a);
                        }
                    }
                    let mut path = scope.path.clone();
                    walk(&root.children, &mut path, &mut ancestors, &mut out);
                }
            }
            Ok(out
                .into_iter()
                .filter(|(_, node, ancestors)| query_matches(query, node, ancestors))
                .map(|(path, _, _)| MockElement { generation, path })
                .collect())
        })
    }

    async fn run_script(
        &self,
        code: &str,
        args: Vec<ScriptArg<Self::Element>>,
    ) -> SessionResult<Value> {
        self.with(|state| {
            state.journal.scripts.push(code.to_string());
            let target = match args.first() {
                Some(ScriptArg::Element(element)) => Some(element.clone()),
                _ => None,
            };
            if code.contains("arguments[0].click()") {
                let element = target.ok_or_else(|| SessionError::Script("no element".into()))?;
                if state.node(&element)?.script_click_fails {
                    return Err(SessionError::Script("click handler threw".into()));
                }
                state.activate(&element, "script")?;
                return Ok(Value::Null);
            }
            if code.contains("arguments[0].focus()") {
                let element = target.ok_or_else(|| SessionError::Script("no element".into()))?;
                state.node(&element)?;
                return Ok(Value::Null);
            }
            if code.contains("window.scrollTo(0, document.body.scrollHeight)") {
                state.scroll_step += 1;
                return Ok(Value::Null);
            }
            if code.contains("document.body.scrollHeight") {
                return Ok(json!(state.height()));
            }
            if code.contains("getElementsByTagName('*').length") {
                let mut out = Vec::new();
                walk(&state.document, &mut Vec::new(), &mut Vec::new(), &mut out);
                return Ok(json!(out.len()));
            }
            Ok(Value::Null)
        })
    }

    async fn tag_name(&self, element: &Self::Element) -> SessionResult<String> {
        self.with(|state| Ok(state.node(element)?.tag.clone()))
    }

    async fn text(&self, element: &Self::Element) -> SessionResult<String> {
        self.with(|state| Ok(state.node(element)?.text_content()))
    }

    async fn attribute(
        &self,
        element: &Self::Element,
        name: &str,
    ) -> SessionResult<Option<String>> {
        self.with(|state| Ok(state.node(element)?.get(name).map(str::to_string)))
    }

    async fn is_displayed(&self, element: &Self::Element) -> SessionResult<bool> {
        self.with(|state| Ok(!state.node(element)?.hidden))
    }

    async fn is_enabled(&self, element: &Self::Element) -> SessionResult<bool> {
        self.with(|state| Ok(!state.node(element)?.disabled))
    }

    async fn click(&self, element: &Self::Element) -> SessionResult<()> {
        self.with(|state| {
            let node = state.node(element)?;
            if node.native_click_fails {
                return Err(SessionError::Interaction(
                    "element click intercepted".into(),
                ));
            }
            state.activate(element, "native")
        })
    }

    async fn hover(&self, element: &Self::Element) -> SessionResult<()> {
        self.with(|state| {
            let node = state.node(element)?;
            if node.hover_fails {
                return Err(SessionError::Interaction("move target out of bounds".into()));
            }
            let describe = node.describe();
            state.journal.hovers.push(describe);
            Ok(())
        })
    }

    async fn clear(&self, element: &Self::Element) -> SessionResult<()> {
        self.with(|state| {
            state.node_mut(element)?.remove("value");
            Ok(())
        })
    }

    async fn type_text(&self, element: &Self::Element, text: &str) -> SessionResult<()> {
        self.with(|state| {
            let node = state.node_mut(element)?;
            let typed = format!("{}{text}", node.get("value").unwrap_or(""));
            node.attrs.retain(|(n, _)| n != "value");
            node.attrs.push(("value".to_string(), typed));
            Ok(())
        })
    }

    async fn select_index(&self, element: &Self::Element, index: usize) -> SessionResult<()> {
        self.with(|state| {
            let node = state.node_mut(element)?;
            if index >= node.children.len() {
                return Err(SessionError::Interaction(format!("no option {index}")));
            }
            for (i, option) in node.children.iter_mut().enumerate() {
                option.remove("selected");
                if i == index {
                    option.attrs.push(("selected".to_string(), "true".to_string()));
                }
            }
            Ok(())
        })
    }
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// Keeps every appended row; clones share storage.
#[derive(Clone, Default)]
pub struct MemorySink {
    rows: Arc<Mutex<Vec<Vec<String>>>>,
}

impl MemorySink {
    pub fn rows(&self) -> Vec<Vec<String>> {
        self.rows.lock().unwrap().clone()
    }

    /// Values of column `index` across all rows.
    pub fn column(&self, index: usize) -> Vec<String> {
        self.rows().into_iter().map(|r| r[index].clone()).collect()
    }
}

impl OutputSink for MemorySink {
    fn append(&mut self, fields: &[String]) -> Result<(), SinkError> {
        self.rows.lock().unwrap().push(fields.to_vec());
        Ok(())
    }
}

/// Rejects every row.
pub struct FailingSink;

impl OutputSink for FailingSink {
    fn append(&mut self, _fields: &[String]) -> Result<(), SinkError> {
        Err(SinkError::Io(std::io::Error::other("disk full")))
    }
}
