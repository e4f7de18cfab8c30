//! Event and effect model shared by the controllers
//!
//! Each controller is a reducer: it receives an [`Event`], updates its own
//! state and returns the [`Effect`]s the host has to carry out (HTTP
//! requests, inline notices, rendered views, navigation and history
//! updates). Controllers never perform I/O themselves.

use crate::error::Result;
use crate::notice::Notice;
use serde::Serialize;

/// Server collaborator a request is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    /// Rendered changes-table fragment
    Table,
    /// Comparison results matrix
    Comparison,
    /// Timeline series
    Timeline,
}

/// An outbound request: endpoint plus flat query parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Request {
    pub endpoint: Endpoint,
    pub query: Vec<(String, String)>,
}

impl Request {
    pub fn new(endpoint: Endpoint, query: Vec<(String, String)>) -> Self {
        Self { endpoint, query }
    }

    /// Form-encoded query string (without the leading `?`)
    pub fn query_string(&self) -> String {
        encode_query(&self.query)
    }
}

/// Form-encode a list of parameters
pub fn encode_query(params: &[(String, String)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter())
        .finish()
}

/// Input to a controller
#[derive(Debug, Clone, PartialEq)]
pub enum Event<S, P, I> {
    /// The user changed one or more controls
    SelectionChanged(S),
    /// A server response arrived
    DataLoaded(P),
    /// Re-render from the current selection and cached data
    RenderRequested,
    /// Controller-specific gesture (click, hover, URL navigation)
    Interaction(I),
}

/// Side effect requested by a controller
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "effect", content = "value", rename_all = "snake_case")]
pub enum Effect<V> {
    /// Issue a request; the response comes back as `DataLoaded`
    Fetch(Request),
    /// Replace a widget's content with an inline message
    Notice(Notice),
    /// Hand a derived view to the drawing layer
    Render(V),
    /// Leave the page for another URL
    Navigate(String),
    /// Record a new URL state in the navigation history
    PushUrl(String),
}

impl<V> Effect<V> {
    pub fn is_fetch(&self) -> bool {
        matches!(self, Effect::Fetch(_))
    }
}

/// Shorthand for a controller's event type
pub type ControllerEvent<C> = Event<
    <C as Controller>::Selection,
    <C as Controller>::Payload,
    <C as Controller>::Interaction,
>;

/// A page controller: a pure reducer from events to effects
pub trait Controller {
    /// Typed state of the input controls
    type Selection;
    /// Decoded server response
    type Payload: Send + 'static;
    /// Controller-specific user gestures
    type Interaction;
    /// Output handed to the drawing layer
    type View;

    /// Apply an event and return the effects it causes
    fn update(&mut self, event: ControllerEvent<Self>) -> Vec<Effect<Self::View>>;

    /// Decode a raw response body from this controller's endpoint
    fn decode(body: &str) -> Result<Self::Payload>;
}
