use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

pub type Params = HashMap<String, String>;

type HandlerFuture = Pin<Box<dyn Future<Output = String> + Send>>;

pub type Handler = Box<dyn Fn(Params) -> HandlerFuture + Send + Sync>;

enum Segment {
    Literal(String),
    Param(String),
}

pub struct Pattern {
    raw: String,
    segments: Vec<Segment>,
}

impl Pattern {
    pub fn parse(raw: &str) -> Self {
        let segments = raw
            .split('/')
            .map(|part| match part.strip_prefix(':') {
                Some(name) => Segment::Param(name.to_owned()),
                None => Segment::Literal(part.to_owned()),
            })
            .collect();
        Pattern {
            raw: raw.to_owned(),
            segments,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    // Matching is segment-by-segment with no backtracking: a pattern only
    // matches paths with exactly as many `/`-separated segments, and a
    // param segment accepts anything, the empty string included.
    pub fn matches(&self, path: &str) -> bool {
        let mut segments = self.segments.iter();
        let mut parts = path.split('/');
        loop {
            match (segments.next(), parts.next()) {
                (Some(Segment::Literal(lit)), Some(part)) if lit == part => {}
                (Some(Segment::Param(_)), Some(_)) => {}
                (None, None) => return true,
                _ => return false,
            }
        }
    }

    pub fn extract(&self, path: &str) -> Params {
        self.segments
            .iter()
            .zip(path.split('/'))
            .filter_map(|(segment, part)| match segment {
                Segment::Param(name) => Some((name.clone(), part.to_owned())),
                Segment::Literal(_) => None,
            })
            .collect()
    }
}

struct RouteEntry {
    pattern: Pattern,
    handler: Handler,
}

#[derive(Default)]
pub struct Router {
    entries: Vec<RouteEntry>,
}

impl Router {
    pub fn get<H, Fut>(&mut self, pattern: &str, handler: H)
    where
        H: Fn(Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = String> + Send + 'static,
    {
        let pattern = Pattern::parse(pattern);
        let handler: Handler = Box::new(move |params| Box::pin(handler(params)));
        // Re-registering a pattern swaps the handler in place, keeping the
        // entry's position and so its precedence.
        match self
            .entries
            .iter_mut()
            .find(|entry| entry.pattern.raw() == pattern.raw())
        {
            Some(entry) => entry.handler = handler,
            None => self.entries.push(RouteEntry { pattern, handler }),
        }
    }

    /// Returns the first registered route whose pattern matches, along with
    /// the params it binds.
    pub fn lookup(&self, path: &str) -> Option<(Params, &Handler)> {
        self.entries
            .iter()
            .find(|entry| entry.pattern.matches(path))
            .map(|entry| (entry.pattern.extract(path), &entry.handler))
    }
}
